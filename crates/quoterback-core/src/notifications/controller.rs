//! Cancel-then-arm rescheduling, test sends and delivery handling.
//!
//! The controller keeps no scheduling state between calls apart from the
//! last permission answer; everything durable lives in the engine's stores.
//! Two overlapping reschedules are not serialized: whichever arms last wins.

use chrono::{Local, NaiveDateTime};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use super::{NotificationContent, NotificationDispatcher, PendingNotification, PermissionStatus};
use crate::engine::QuoteEngine;
use crate::error::{CoreError, Result};
use crate::settings::Cadence;
use crate::storage::NotificationsConfig;
use crate::trigger::{TriggerScheduler, TriggerSpec};

/// A notification the controller handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    pub notification_id: String,
    pub quote_id: String,
    /// `None` for immediate (test) sends.
    pub trigger: Option<TriggerSpec>,
}

pub struct NotificationController<D: NotificationDispatcher> {
    dispatcher: D,
    config: NotificationsConfig,
    scheduler: TriggerScheduler,
    permission: PermissionStatus,
    rng: Pcg64Mcg,
}

impl<D: NotificationDispatcher> NotificationController<D> {
    pub fn new(dispatcher: D, config: NotificationsConfig) -> Self {
        Self::with_rng(dispatcher, config, Pcg64Mcg::from_entropy())
    }

    /// Controller with a caller-provided generator, for reproducible picks.
    pub fn with_rng(dispatcher: D, config: NotificationsConfig, rng: Pcg64Mcg) -> Self {
        Self {
            dispatcher,
            config,
            scheduler: TriggerScheduler,
            permission: PermissionStatus::Undetermined,
            rng,
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn permission(&self) -> PermissionStatus {
        self.permission
    }

    /// Ask the dispatcher for permission and remember the answer. A denial
    /// suppresses scheduling until this is called again.
    pub fn request_permission(&mut self) -> PermissionStatus {
        self.permission = match self.dispatcher.request_permission(&self.config.channel_id) {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("permission request failed: {e}");
                PermissionStatus::Denied
            }
        };
        if self.permission != PermissionStatus::Granted {
            tracing::info!("notification permission not granted");
        }
        self.permission
    }

    fn ensure_permission(&mut self) -> Result<()> {
        if self.permission == PermissionStatus::Undetermined {
            self.request_permission();
        }
        match self.permission {
            PermissionStatus::Granted => Ok(()),
            _ => Err(CoreError::PermissionDenied),
        }
    }

    /// Cancel every armed quote notification. Failures are logged only.
    pub fn cancel(&mut self) {
        match self.dispatcher.cancel_all(&self.config.identifier) {
            Ok(()) => tracing::debug!("cancelled scheduled quote notifications"),
            Err(e) => tracing::error!("failed to cancel scheduled notifications: {e}"),
        }
    }

    /// Notifications currently armed in the dispatcher.
    pub fn pending(&self) -> Result<Vec<PendingNotification>> {
        self.dispatcher.pending().map_err(dispatcher_error)
    }

    /// Cancel the armed notification and arm a fresh one for the current
    /// settings, using the local clock.
    pub fn reschedule(&mut self, engine: &QuoteEngine) -> Result<Scheduled> {
        self.reschedule_at(engine, Local::now().naive_local())
    }

    /// [`reschedule`](Self::reschedule) as seen from the wall-clock `now`.
    pub fn reschedule_at(&mut self, engine: &QuoteEngine, now: NaiveDateTime) -> Result<Scheduled> {
        let settings = engine.settings().settings();
        let (hour, minute) = settings.notification_hour_minute();
        let trigger = self
            .scheduler
            .compute(hour, minute, settings.notification_cadence, now);
        self.arm(engine, trigger)
    }

    /// Stale notifications are cancelled even when permission is missing.
    fn arm(&mut self, engine: &QuoteEngine, trigger: TriggerSpec) -> Result<Scheduled> {
        self.cancel();
        self.ensure_permission()?;

        let quote = engine.select_quote(&mut self.rng).ok_or_else(|| {
            tracing::error!("no quote available for notification");
            CoreError::NoQuoteAvailable
        })?;

        let content = NotificationContent::for_quote(&self.config.title, quote);
        let notification_id = self
            .dispatcher
            .schedule(Some(&self.config.identifier), &content, Some(&trigger))
            .map_err(dispatcher_error)?;

        tracing::info!(
            notification_id = %notification_id,
            quote_id = %quote.id,
            ?trigger,
            "notification scheduled"
        );
        Ok(Scheduled {
            notification_id,
            quote_id: quote.id.clone(),
            trigger: Some(trigger),
        })
    }

    /// Deliver a quote immediately and count it as used.
    pub fn send_test_notification(&mut self, engine: &mut QuoteEngine) -> Result<Scheduled> {
        self.ensure_permission()?;

        let quote = engine.select_quote(&mut self.rng).ok_or_else(|| {
            tracing::error!("no quote available for test notification");
            CoreError::NoQuoteAvailable
        })?;
        let mut content = NotificationContent::for_quote(&self.config.test_title, quote);
        content.data.is_test = true;
        let quote_id = quote.id.clone();

        let notification_id = self
            .dispatcher
            .schedule(None, &content, None)
            .map_err(dispatcher_error)?;
        engine.usage_mut().increment_usage(&quote_id);

        tracing::info!(notification_id = %notification_id, quote_id = %quote_id, "test notification sent");
        Ok(Scheduled {
            notification_id,
            quote_id,
            trigger: None,
        })
    }

    /// Handle a delivery at the local clock's current time.
    pub fn on_received(
        &mut self,
        engine: &mut QuoteEngine,
        content: &NotificationContent,
    ) -> Option<Result<Scheduled>> {
        self.on_received_at(engine, content, Local::now().naive_local())
    }

    /// Handle a delivery reported by the dispatcher at `now`.
    ///
    /// Counts the delivered quote as used. Every-other-day notifications are
    /// one-shot, so a non-test delivery under that cadence re-arms the next
    /// one two days on; the outcome of that re-arm is returned.
    pub fn on_received_at(
        &mut self,
        engine: &mut QuoteEngine,
        content: &NotificationContent,
        now: NaiveDateTime,
    ) -> Option<Result<Scheduled>> {
        match content.quote_id() {
            Some(quote_id) => {
                tracing::debug!("notification received for quote {quote_id}");
                engine.usage_mut().increment_usage(quote_id);
            }
            None => tracing::debug!("notification received without quote id"),
        }

        let settings = engine.settings().settings();
        if content.data.is_test || settings.notification_cadence != Cadence::EveryOtherDay {
            return None;
        }

        let (hour, minute) = settings.notification_hour_minute();
        let trigger = self.scheduler.rearm(
            hour,
            minute,
            Cadence::EveryOtherDay,
            now,
            now.date(),
        );
        let outcome = self.arm(engine, trigger);
        if let Err(e) = &outcome {
            tracing::error!("failed to re-arm every-other-day notification: {e}");
        }
        Some(outcome)
    }

    /// Handle a tap on a notification. Counts the quote as used and returns
    /// its id so the host can navigate to it.
    pub fn on_response(
        &mut self,
        engine: &mut QuoteEngine,
        content: &NotificationContent,
    ) -> Option<String> {
        let quote_id = content.quote_id()?;
        tracing::debug!("notification tapped for quote {quote_id}");
        engine.usage_mut().increment_usage(quote_id);
        Some(quote_id.to_string())
    }
}

fn dispatcher_error(e: super::DispatchError) -> CoreError {
    tracing::error!("dispatcher call failed: {e}");
    CoreError::Dispatcher {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Quote, QuoteCatalog};
    use crate::notifications::{DispatcherCall, MemoryDispatcher};
    use crate::settings::local_time_today;
    use crate::storage::{Config, MemoryStore};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn engine_with(catalog: QuoteCatalog) -> QuoteEngine {
        QuoteEngine::initialize(Arc::new(MemoryStore::new()), Arc::new(catalog), &Config::default())
    }

    fn controller(permission: PermissionStatus) -> NotificationController<MemoryDispatcher> {
        NotificationController::with_rng(
            MemoryDispatcher::new(permission),
            NotificationsConfig::default(),
            Pcg64Mcg::seed_from_u64(11),
        )
    }

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn reschedule_cancels_before_arming() {
        let engine = engine_with(QuoteCatalog::bundled());
        let mut ctl = controller(PermissionStatus::Granted);

        for _ in 0..3 {
            ctl.reschedule_at(&engine, morning()).unwrap();
        }

        let calls: Vec<&DispatcherCall> = ctl
            .dispatcher()
            .calls()
            .iter()
            .filter(|c| !matches!(c, DispatcherCall::RequestPermission))
            .collect();
        assert_eq!(calls.len(), 6);
        for pair in calls.chunks(2) {
            assert!(matches!(pair[0], DispatcherCall::CancelAll(id) if id == "daily-quote-notification"));
            assert!(matches!(pair[1], DispatcherCall::Schedule { .. }));
        }
        assert_eq!(ctl.pending().unwrap().len(), 1);
    }

    #[test]
    fn scheduled_content_carries_quote() {
        let engine = engine_with(QuoteCatalog::bundled());
        let mut ctl = controller(PermissionStatus::Granted);
        let scheduled = ctl.reschedule_at(&engine, morning()).unwrap();

        let pending = ctl.pending().unwrap();
        let content = &pending[0].content;
        let quote = engine.catalog().get(&scheduled.quote_id).unwrap();
        assert_eq!(content.title, "Your Daily Quote");
        assert_eq!(content.body, quote.notification_body());
        assert_eq!(content.quote_id(), Some(quote.id.as_str()));
        assert!(!content.data.is_test);
        assert_eq!(pending[0].trigger, scheduled.trigger);
    }

    #[test]
    fn denied_permission_suppresses_scheduling() {
        let engine = engine_with(QuoteCatalog::bundled());
        let mut ctl = controller(PermissionStatus::Denied);

        assert!(matches!(
            ctl.reschedule_at(&engine, morning()),
            Err(CoreError::PermissionDenied)
        ));
        assert!(matches!(
            ctl.reschedule_at(&engine, morning()),
            Err(CoreError::PermissionDenied)
        ));
        // Asked once, then not again until the host re-requests.
        let requests = ctl
            .dispatcher()
            .calls()
            .iter()
            .filter(|c| matches!(c, DispatcherCall::RequestPermission))
            .count();
        assert_eq!(requests, 1);
        assert!(!ctl
            .dispatcher()
            .calls()
            .iter()
            .any(|c| matches!(c, DispatcherCall::Schedule { .. })));

        ctl.dispatcher_mut().set_permission(PermissionStatus::Granted);
        assert_eq!(ctl.request_permission(), PermissionStatus::Granted);
        assert!(ctl.reschedule_at(&engine, morning()).is_ok());
    }

    #[test]
    fn revoked_permission_still_cancels_armed_notification() {
        let engine = engine_with(QuoteCatalog::bundled());
        let mut ctl = controller(PermissionStatus::Granted);
        ctl.reschedule_at(&engine, morning()).unwrap();
        assert_eq!(ctl.pending().unwrap().len(), 1);

        ctl.dispatcher_mut().set_permission(PermissionStatus::Denied);
        assert_eq!(ctl.request_permission(), PermissionStatus::Denied);
        assert!(matches!(
            ctl.reschedule_at(&engine, morning()),
            Err(CoreError::PermissionDenied)
        ));
        assert!(ctl.pending().unwrap().is_empty());
    }

    #[test]
    fn empty_catalog_skips_cycle() {
        let engine = engine_with(QuoteCatalog::from_quotes(Vec::new()));
        let mut ctl = controller(PermissionStatus::Granted);
        assert!(matches!(
            ctl.reschedule_at(&engine, morning()),
            Err(CoreError::NoQuoteAvailable)
        ));
        assert!(ctl.pending().unwrap().is_empty());
    }

    #[test]
    fn dispatcher_failure_is_reported() {
        let engine = engine_with(QuoteCatalog::bundled());
        let mut ctl = controller(PermissionStatus::Granted);
        ctl.dispatcher_mut().set_fail_schedule(true);
        assert!(matches!(
            ctl.reschedule_at(&engine, morning()),
            Err(CoreError::Dispatcher { .. })
        ));
    }

    #[test]
    fn test_send_counts_usage() {
        let mut engine = engine_with(QuoteCatalog::from_quotes(vec![Quote::new("only", "t", "a")]));
        let mut ctl = controller(PermissionStatus::Granted);

        let sent = ctl.send_test_notification(&mut engine).unwrap();
        assert_eq!(sent.quote_id, "only");
        assert!(sent.trigger.is_none());
        assert_eq!(engine.usage().usage_count("only"), 1);

        let delivered = ctl.dispatcher().delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].title, "Test Notification");
        assert!(delivered[0].data.is_test);
        assert!(ctl.pending().unwrap().is_empty());
    }

    #[test]
    fn failed_test_send_does_not_count() {
        let mut engine = engine_with(QuoteCatalog::from_quotes(vec![Quote::new("only", "t", "a")]));
        let mut ctl = controller(PermissionStatus::Granted);
        ctl.dispatcher_mut().set_fail_schedule(true);
        assert!(ctl.send_test_notification(&mut engine).is_err());
        assert_eq!(engine.usage().usage_count("only"), 0);
    }

    #[test]
    fn received_and_tapped_count_usage() {
        let mut engine = engine_with(QuoteCatalog::bundled());
        let mut ctl = controller(PermissionStatus::Granted);
        let quote = engine.catalog().get("q-001").unwrap().clone();
        let content = NotificationContent::for_quote("Your Daily Quote", &quote);

        assert!(ctl.on_received_at(&mut engine, &content, morning()).is_none());
        assert_eq!(ctl.on_response(&mut engine, &content).as_deref(), Some("q-001"));
        assert_eq!(engine.usage().usage_count("q-001"), 2);

        let blank = NotificationContent {
            title: "other".into(),
            body: String::new(),
            data: Default::default(),
        };
        assert!(ctl.on_response(&mut engine, &blank).is_none());
    }

    #[test]
    fn every_other_day_delivery_rearms_two_days_out() {
        let mut engine = engine_with(QuoteCatalog::bundled());
        engine
            .settings_mut()
            .set_notification_cadence(Cadence::EveryOtherDay);
        engine
            .settings_mut()
            .set_notification_time(local_time_today(9, 0).unwrap());
        let mut ctl = controller(PermissionStatus::Granted);

        let delivered_at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let first = ctl.reschedule_at(&engine, delivered_at - chrono::Duration::hours(1)).unwrap();
        let quote = engine.catalog().get(&first.quote_id).unwrap().clone();
        let content = NotificationContent::for_quote("Your Daily Quote", &quote);

        let rearmed = ctl
            .on_received_at(&mut engine, &content, delivered_at)
            .expect("every-other-day delivery must re-arm")
            .unwrap();
        assert_eq!(
            rearmed.trigger,
            Some(TriggerSpec::OneShotOffset {
                seconds_from_now: 48 * 3600
            })
        );
        assert_eq!(ctl.pending().unwrap().len(), 1);
        assert_eq!(engine.usage().usage_count(&quote.id), 1);
    }

    #[test]
    fn test_delivery_does_not_rearm() {
        let mut engine = engine_with(QuoteCatalog::bundled());
        engine
            .settings_mut()
            .set_notification_cadence(Cadence::EveryOtherDay);
        let mut ctl = controller(PermissionStatus::Granted);
        let quote = engine.catalog().get("q-002").unwrap().clone();
        let mut content = NotificationContent::for_quote("Test Notification", &quote);
        content.data.is_test = true;

        assert!(ctl.on_received_at(&mut engine, &content, morning()).is_none());
        assert!(ctl.dispatcher().calls().is_empty());
    }
}
