//! Cadence to dispatcher trigger translation.
//!
//! Daily and weekly cadences map onto repeating calendar triggers. The
//! dispatcher has no two-day repeat, so every-other-day becomes a one-shot
//! offset to the next occurrence; whoever receives that delivery must arm
//! the following one (see
//! [`NotificationController::on_received`](crate::notifications::NotificationController::on_received)).
//!
//! All arithmetic is on local wall-clock time.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::settings::Cadence;

/// When the dispatcher should fire a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TriggerSpec {
    /// Every day at `hour:minute`.
    Daily { hour: u32, minute: u32 },
    /// Every week on `weekday` (1 = Sunday .. 7 = Saturday) at `hour:minute`.
    Weekly { weekday: u32, hour: u32, minute: u32 },
    /// Once, `seconds_from_now` seconds after arming.
    OneShotOffset {
        #[serde(rename = "secondsFromNow")]
        seconds_from_now: i64,
    },
}

impl TriggerSpec {
    pub fn repeats(&self) -> bool {
        !matches!(self, TriggerSpec::OneShotOffset { .. })
    }

    /// Next wall-clock instant this trigger fires, as seen from `now`.
    ///
    /// `None` for a weekly trigger whose weekday is outside 1..=7.
    pub fn next_fire(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            TriggerSpec::Daily { hour, minute } => Some(next_occurrence(hour, minute, now)),
            TriggerSpec::Weekly {
                weekday,
                hour,
                minute,
            } => {
                let first = next_occurrence(hour, minute, now);
                (0..7)
                    .map(|offset| first + Duration::days(offset))
                    .find(|at| at.weekday().number_from_sunday() == weekday)
            }
            TriggerSpec::OneShotOffset { seconds_from_now } => {
                Some(now + Duration::seconds(seconds_from_now))
            }
        }
    }
}

fn wall_time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN)
}

/// Today at `hour:minute` if that is still ahead of `now`, else tomorrow.
pub fn next_occurrence(hour: u32, minute: u32, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(wall_time(hour, minute));
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

fn offset_to(target: NaiveDateTime, now: NaiveDateTime) -> TriggerSpec {
    TriggerSpec::OneShotOffset {
        seconds_from_now: (target - now).num_seconds().max(1),
    }
}

/// Computes the trigger for a cadence.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerScheduler;

impl TriggerScheduler {
    /// Trigger for the first delivery after `now`.
    ///
    /// Weekly triggers repeat on the weekday of `now`.
    pub fn compute(&self, hour: u32, minute: u32, cadence: Cadence, now: NaiveDateTime) -> TriggerSpec {
        match cadence {
            Cadence::Daily => TriggerSpec::Daily { hour, minute },
            Cadence::Weekly => TriggerSpec::Weekly {
                weekday: now.weekday().number_from_sunday(),
                hour,
                minute,
            },
            Cadence::EveryOtherDay => offset_to(next_occurrence(hour, minute, now), now),
        }
    }

    /// Trigger for the delivery following one that fired on `last_fired`.
    ///
    /// Every-other-day lands two days after `last_fired`, skipping ahead in
    /// two-day steps if that moment has already passed. Other cadences
    /// repeat on their own and are computed as in [`compute`](Self::compute).
    pub fn rearm(
        &self,
        hour: u32,
        minute: u32,
        cadence: Cadence,
        now: NaiveDateTime,
        last_fired: NaiveDate,
    ) -> TriggerSpec {
        if cadence != Cadence::EveryOtherDay {
            return self.compute(hour, minute, cadence, now);
        }

        let mut target = last_fired.and_time(wall_time(hour, minute)) + Duration::days(2);
        while target <= now {
            target += Duration::days(2);
        }
        offset_to(target, now)
    }
}
