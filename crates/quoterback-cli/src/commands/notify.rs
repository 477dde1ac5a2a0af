use clap::Subcommand;
use quoterback_core::{NotificationContent, PermissionStatus};

use crate::app::{print_outcome, App};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Ask for notification permission
    Permission,
    /// Cancel and re-arm the quote notification for the current settings
    Schedule,
    /// Send a quote right now
    Test,
    /// List armed notifications
    Pending,
    /// Cancel every armed quote notification
    Cancel,
    /// Simulate delivery of an armed notification (the first one if no id)
    Deliver { id: Option<String> },
    /// Simulate tapping a notification for a quote
    Tap { quote_id: String },
}

pub fn run(app: &mut App, action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        NotifyAction::Permission => {
            let status = app.notifier.request_permission();
            let label = match status {
                PermissionStatus::Granted => "granted",
                PermissionStatus::Denied => "denied",
                PermissionStatus::Undetermined => "undetermined",
            };
            println!("permission {label}");
        }
        NotifyAction::Schedule => app.reschedule(),
        NotifyAction::Test => {
            let outcome = app.notifier.send_test_notification(&mut app.engine);
            print_outcome(&outcome);
        }
        NotifyAction::Pending => {
            let pending = app.notifier.pending()?;
            println!("{}", serde_json::to_string_pretty(&pending)?);
        }
        NotifyAction::Cancel => {
            app.notifier.cancel();
            println!("cancelled");
        }
        NotifyAction::Deliver { id } => {
            let Some(content) = app
                .notifier
                .dispatcher_mut()
                .fire(id.as_deref())
                .map_err(|e| e.to_string())?
            else {
                return Err("no armed notification to deliver".into());
            };
            println!("[{}] {}", content.title, content.body);
            if let Some(outcome) = app.notifier.on_received(&mut app.engine, &content) {
                print_outcome(&outcome);
            }
        }
        NotifyAction::Tap { quote_id } => {
            let quote = app
                .engine
                .catalog()
                .get(&quote_id)
                .ok_or_else(|| format!("quote not found: {quote_id}"))?;
            let content = NotificationContent::for_quote("", quote);
            if let Some(id) = app.notifier.on_response(&mut app.engine, &content) {
                println!("opened quote {id}");
            }
        }
    }
    Ok(())
}
