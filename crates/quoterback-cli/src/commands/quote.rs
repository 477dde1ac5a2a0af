use clap::Subcommand;
use rand::SeedableRng;

use super::print_quotes;
use crate::app::App;

#[derive(Subcommand)]
pub enum QuoteAction {
    /// Preview the quote the next notification would use
    Next {
        #[arg(long)]
        json: bool,
    },
    /// Show the least-used pool the next pick is drawn from
    Pool {
        #[arg(long)]
        json: bool,
    },
    /// Show one quote
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Print a random quote from the whole catalog
    Random,
    /// Search by author, topic or mood (case-insensitive)
    Search {
        #[arg(long, conflicts_with_all = ["topic", "mood"])]
        author: Option<String>,
        #[arg(long, conflicts_with = "mood")]
        topic: Option<String>,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List the authors, topics and moods available as filters
    Filters,
}

pub fn run(app: &mut App, action: QuoteAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = &app.engine;
    match action {
        QuoteAction::Next { json } => {
            let mut rng = rand_pcg::Pcg64Mcg::from_entropy();
            match engine.select_quote(&mut rng) {
                Some(quote) => print_quotes(&[quote], json)?,
                None => return Err("no quote available".into()),
            }
        }
        QuoteAction::Pool { json } => {
            let pool = engine
                .selection()
                .pool(engine.catalog(), engine.settings().settings(), engine.usage());
            print_quotes(&pool, json)?;
        }
        QuoteAction::Show { id, json } => match engine.catalog().get(&id) {
            Some(quote) => print_quotes(&[quote], json)?,
            None => return Err(format!("quote not found: {id}").into()),
        },
        QuoteAction::Random => {
            let mut rng = rand_pcg::Pcg64Mcg::from_entropy();
            if let Some(quote) = engine.catalog().random(&mut rng) {
                print_quotes(&[quote], false)?;
            }
        }
        QuoteAction::Search {
            author,
            topic,
            mood,
            json,
        } => {
            let found = match (author, topic, mood) {
                (Some(author), _, _) => engine.catalog().by_author(&author),
                (_, Some(topic), _) => engine.catalog().by_topic(&topic),
                (_, _, Some(mood)) => engine.catalog().by_mood(&mood),
                _ => return Err("pass one of --author, --topic or --mood".into()),
            };
            print_quotes(&found, json)?;
        }
        QuoteAction::Filters => {
            let catalog = engine.catalog();
            let join = |items: std::collections::BTreeSet<&str>| {
                items.into_iter().collect::<Vec<_>>().join(", ")
            };
            println!("authors: {}", join(catalog.authors()));
            println!("topics:  {}", join(catalog.topics()));
            println!("moods:   {}", join(catalog.moods()));
        }
    }
    Ok(())
}
