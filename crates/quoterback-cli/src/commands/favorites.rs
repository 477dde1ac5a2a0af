use clap::Subcommand;

use super::print_quotes;
use crate::app::App;

#[derive(Subcommand)]
pub enum FavoritesAction {
    /// List favorite quotes
    List {
        #[arg(long)]
        json: bool,
    },
    /// Add a quote to favorites
    Add { id: String },
    /// Remove a quote from favorites
    Remove { id: String },
    /// Flip a quote's favorite state
    Toggle { id: String },
}

pub fn run(app: &mut App, action: FavoritesAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        FavoritesAction::List { json } => {
            print_quotes(&app.engine.favorite_quotes(), json)?;
            return Ok(());
        }
        FavoritesAction::Add { id } => {
            if app.engine.catalog().get(&id).is_none() {
                return Err(format!("quote not found: {id}").into());
            }
            if app.engine.favorites_mut().add(&id) {
                println!("added {id}");
            } else {
                println!("{id} is already a favorite");
            }
        }
        FavoritesAction::Remove { id } => {
            if app.engine.favorites_mut().remove(&id) {
                println!("removed {id}");
            } else {
                println!("{id} is not a favorite");
            }
        }
        FavoritesAction::Toggle { id } => {
            let now = app.engine.favorites_mut().toggle(&id);
            println!("{id}: {}", if now { "favorite" } else { "not a favorite" });
        }
    }
    app.report_save_failures();
    Ok(())
}
