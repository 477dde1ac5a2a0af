use clap::Subcommand;
use quoterback_core::settings::local_time_today;
use quoterback_core::Cadence;

use crate::app::App;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current preferences
    Show,
    /// Set the notification time (HH:MM, local time)
    Time { time: String },
    /// Set the cadence: daily, everyOtherDay or weekly
    Cadence { cadence: String },
    /// Select or deselect a background theme
    Theme { theme: String },
    /// Add or remove an author filter
    Author { author: String },
    /// Add or remove a topic filter
    Topic { topic: String },
    /// Add or remove a mood filter
    Mood { mood: String },
    /// Remove all author, topic and mood filters
    ClearFilters,
    /// Restore default preferences
    Reset,
}

fn parse_hh_mm(value: &str) -> Result<(u32, u32), String> {
    let (h, m) = value
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got '{value}'"))?;
    let hour: u32 = h.trim().parse().map_err(|_| format!("invalid hour: {h}"))?;
    let minute: u32 = m.trim().parse().map_err(|_| format!("invalid minute: {m}"))?;
    if hour > 23 || minute > 59 {
        return Err(format!("time out of range: {value}"));
    }
    Ok((hour, minute))
}

pub fn run(app: &mut App, action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let settings = app.engine.settings_mut();
    match action {
        SettingsAction::Show => {
            let current = settings.settings();
            let (hour, minute) = current.notification_hour_minute();
            println!("{}", serde_json::to_string_pretty(current)?);
            println!("local time: {hour:02}:{minute:02}");
            if !current.has_content_filters() {
                println!("content filters: none, every author, topic and mood is eligible");
            }
            return Ok(());
        }
        SettingsAction::Time { time } => {
            let (hour, minute) = parse_hh_mm(&time)?;
            let at = local_time_today(hour, minute).ok_or("time does not exist today")?;
            settings.set_notification_time(at);
        }
        SettingsAction::Cadence { cadence } => {
            let cadence: Cadence = cadence.parse()?;
            settings.set_notification_cadence(cadence);
        }
        SettingsAction::Theme { theme } => {
            let before = settings.settings().theme_backgrounds.clone();
            if settings.toggle_theme_background(&theme).theme_backgrounds == before {
                eprintln!("at least one theme must stay selected");
            }
        }
        SettingsAction::Author { author } => {
            settings.toggle_notification_author(&author);
        }
        SettingsAction::Topic { topic } => {
            settings.toggle_notification_topic(&topic);
        }
        SettingsAction::Mood { mood } => {
            settings.toggle_notification_mood(&mood);
        }
        SettingsAction::ClearFilters => {
            settings.clear_notification_filters();
        }
        SettingsAction::Reset => {
            settings.reset();
        }
    }

    app.report_save_failures();
    app.reschedule();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hh_mm() {
        assert_eq!(parse_hh_mm("07:05"), Ok((7, 5)));
        assert_eq!(parse_hh_mm("23:59"), Ok((23, 59)));
        assert!(parse_hh_mm("24:00").is_err());
        assert!(parse_hh_mm("9").is_err());
        assert!(parse_hh_mm("ab:cd").is_err());
    }
}
