pub mod config;
pub mod favorites;
pub mod notify;
pub mod quote;
pub mod settings;
pub mod usage;

use quoterback_core::Quote;

/// Print quotes either as pretty JSON or one per line.
pub(crate) fn print_quotes(quotes: &[&Quote], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(quotes)?);
    } else {
        for quote in quotes {
            println!("{}  {}", quote.id, quote.notification_body());
        }
    }
    Ok(())
}
