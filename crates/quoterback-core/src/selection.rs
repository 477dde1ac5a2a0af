//! Quote selection for notifications.
//!
//! Narrows the catalog by the user's author/topic/mood filters and selected
//! themes, then picks uniformly among the least-used survivors. If the
//! filters leave nothing, every filter is dropped at once and the whole
//! catalog is used instead.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{Quote, QuoteCatalog};
use crate::settings::Settings;
use crate::usage::UsageTracker;

/// Default size of the least-used window.
pub const DEFAULT_LEAST_USED_LIMIT: usize = 5;

/// User-facing theme tag to quote background style. Several themes share a
/// style; themes missing here do not restrict selection.
const THEME_STYLES: &[(&str, &str)] = &[
    ("nature", "nature"),
    ("space", "abstract"),
    ("architecture", "urban"),
    ("art", "abstract"),
    ("urban", "urban"),
    ("vintage", "minimal"),
    ("black & white", "minimal"),
    ("blackAndWhite", "minimal"),
    ("textures", "abstract"),
    ("minimalist", "minimal"),
];

/// Background style for a theme tag, if the theme is mapped.
pub fn background_style_for_theme(theme: &str) -> Option<&'static str> {
    THEME_STYLES
        .iter()
        .find(|(tag, _)| *tag == theme)
        .map(|(_, style)| *style)
}

/// Allowed background styles for a set of selected themes.
pub fn allowed_styles(themes: &BTreeSet<String>) -> BTreeSet<&'static str> {
    themes
        .iter()
        .filter_map(|t| background_style_for_theme(t))
        .collect()
}

/// Outcome of the filter cascade.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    pub quotes: Vec<&'a Quote>,
    /// True when the filters matched nothing and the full catalog was used.
    pub fell_back: bool,
}

/// Filter cascade plus usage-weighted pick.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    least_used_limit: usize,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_LEAST_USED_LIMIT)
    }
}

impl SelectionEngine {
    pub fn new(least_used_limit: usize) -> Self {
        Self {
            least_used_limit: least_used_limit.max(1),
        }
    }

    pub fn least_used_limit(&self) -> usize {
        self.least_used_limit
    }

    /// Apply the author, topic, mood and theme filters in that order.
    pub fn candidates<'a>(&self, catalog: &'a QuoteCatalog, settings: &Settings) -> Candidates<'a> {
        let mut quotes: Vec<&Quote> = catalog.quotes().iter().collect();

        let authors = &settings.notification_authors;
        if !authors.is_empty() {
            quotes.retain(|q| authors.contains(&q.author));
        }

        let topics = &settings.notification_topics;
        if !topics.is_empty() {
            quotes.retain(|q| !q.topics.is_disjoint(topics));
        }

        let moods = &settings.notification_moods;
        if !moods.is_empty() {
            quotes.retain(|q| !q.moods.is_disjoint(moods));
        }

        let styles = allowed_styles(&settings.theme_backgrounds);
        if !styles.is_empty() {
            quotes.retain(|q| styles.contains(q.background_style.as_str()));
        }

        if quotes.is_empty() {
            tracing::debug!("no quotes match the current filters, using all quotes");
            return Candidates {
                quotes: catalog.quotes().iter().collect(),
                fell_back: true,
            };
        }

        Candidates {
            quotes,
            fell_back: false,
        }
    }

    /// Least-used subset of the filtered candidates, ascending by usage.
    pub fn pool<'a>(
        &self,
        catalog: &'a QuoteCatalog,
        settings: &Settings,
        usage: &UsageTracker,
    ) -> Vec<&'a Quote> {
        let candidates = self.candidates(catalog, settings);
        usage.least_used(&candidates.quotes, self.least_used_limit)
    }

    /// Pick one quote, or `None` when the catalog is empty.
    pub fn select<'a, R: Rng + ?Sized>(
        &self,
        catalog: &'a QuoteCatalog,
        settings: &Settings,
        usage: &UsageTracker,
        rng: &mut R,
    ) -> Option<&'a Quote> {
        let pool = self.pool(catalog, settings, usage);
        pool.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, USAGE_KEY};
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;
    use serde_json::json;
    use std::sync::Arc;

    fn catalog() -> QuoteCatalog {
        QuoteCatalog::from_quotes(vec![
            Quote::new("n1", "t", "Lao Tzu")
                .with_topics(["nature", "patience"])
                .with_moods(["calm"])
                .with_background_style("nature"),
            Quote::new("u1", "t", "Jane Jacobs")
                .with_topics(["cities"])
                .with_moods(["hopeful"])
                .with_background_style("urban"),
            Quote::new("m1", "t", "Lao Tzu")
                .with_topics(["simplicity"])
                .with_moods(["calm"])
                .with_background_style("minimal"),
            Quote::new("a1", "t", "Carl Sagan")
                .with_topics(["science"])
                .with_moods(["reflective"])
                .with_background_style("abstract"),
        ])
    }

    fn settings_with_themes(themes: &[&str]) -> Settings {
        Settings {
            theme_backgrounds: themes.iter().map(|t| t.to_string()).collect(),
            ..Settings::default()
        }
    }

    fn ids(quotes: &[&Quote]) -> Vec<String> {
        quotes.iter().map(|q| q.id.clone()).collect()
    }

    fn empty_usage() -> UsageTracker {
        UsageTracker::load(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn theme_mapping_is_many_to_one() {
        assert_eq!(background_style_for_theme("space"), Some("abstract"));
        assert_eq!(background_style_for_theme("art"), Some("abstract"));
        assert_eq!(background_style_for_theme("gradient"), None);

        let themes: BTreeSet<String> = ["space", "textures", "gradient"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(allowed_styles(&themes), BTreeSet::from(["abstract"]));
    }

    #[test]
    fn themes_restrict_background_style() {
        let engine = SelectionEngine::default();
        let catalog = catalog();
        let settings = settings_with_themes(&["architecture", "minimalist"]);
        let found = engine.candidates(&catalog, &settings);
        assert!(!found.fell_back);
        assert_eq!(ids(&found.quotes), ["u1", "m1"]);
    }

    #[test]
    fn unmapped_themes_do_not_filter() {
        let engine = SelectionEngine::default();
        let catalog = catalog();
        let settings = settings_with_themes(&["gradient"]);
        assert_eq!(engine.candidates(&catalog, &settings).quotes.len(), 4);
    }

    #[test]
    fn filters_compose() {
        let engine = SelectionEngine::default();
        let catalog = catalog();
        let mut settings = settings_with_themes(&["nature", "vintage", "urban"]);
        settings.notification_authors.insert("Lao Tzu".to_string());
        settings.notification_moods.insert("calm".to_string());
        assert_eq!(ids(&engine.candidates(&catalog, &settings).quotes), ["n1", "m1"]);

        settings.notification_topics.insert("simplicity".to_string());
        assert_eq!(ids(&engine.candidates(&catalog, &settings).quotes), ["m1"]);
    }

    #[test]
    fn empty_result_falls_back_to_whole_catalog() {
        let engine = SelectionEngine::default();
        let catalog = catalog();
        let mut settings = settings_with_themes(&["nature"]);
        settings.notification_authors.insert("Carl Sagan".to_string());

        let found = engine.candidates(&catalog, &settings);
        assert!(found.fell_back);
        assert_eq!(ids(&found.quotes), ["n1", "u1", "m1", "a1"]);
    }

    #[test]
    fn empty_catalog_selects_nothing() {
        let engine = SelectionEngine::default();
        let catalog = QuoteCatalog::from_quotes(Vec::new());
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        assert!(engine
            .select(&catalog, &Settings::default(), &empty_usage(), &mut rng)
            .is_none());
    }

    #[test]
    fn pool_prefers_least_used() {
        let mem = Arc::new(MemoryStore::with_values([(
            USAGE_KEY,
            json!({"n1": 3, "u1": 1, "m1": 0, "a1": 2}),
        )]));
        let usage = UsageTracker::load(mem);
        let engine = SelectionEngine::new(2);
        let catalog = catalog();
        let settings = settings_with_themes(&["gradient"]);

        assert_eq!(ids(&engine.pool(&catalog, &settings, &usage)), ["m1", "u1"]);

        let mut rng = Pcg64Mcg::seed_from_u64(42);
        for _ in 0..50 {
            let picked = engine.select(&catalog, &settings, &usage, &mut rng).unwrap();
            assert!(picked.id == "m1" || picked.id == "u1");
        }
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(SelectionEngine::new(0).least_used_limit(), 1);
    }
}
