use clap::Subcommand;

use crate::app::App;

#[derive(Subcommand)]
pub enum UsageAction {
    /// Show usage counts, most used first
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Show the usage count of one quote
    Get { id: String },
    /// Forget all usage history
    Reset,
}

pub fn run(app: &mut App, action: UsageAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UsageAction::Show { json } => {
            let usage = app.engine.usage().all();
            if json {
                println!("{}", serde_json::to_string_pretty(usage)?);
            } else {
                let mut rows: Vec<(&String, &u64)> = usage.iter().collect();
                rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                for (id, count) in rows {
                    println!("{count:>5}  {id}");
                }
            }
        }
        UsageAction::Get { id } => {
            println!("{}", app.engine.usage().usage_count(&id));
        }
        UsageAction::Reset => {
            app.engine.usage_mut().reset_usage();
            println!("usage history cleared");
            app.reschedule();
        }
    }
    Ok(())
}
