//! Listing filters. Filtering always precedes ranking: the predicate is
//! applied store-side, then the chosen strategy orders the survivors.

use serde::{Deserialize, Serialize};

/// The four named sort strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    #[default]
    Newest,
    Trending,
    TopRated,
    MostPopular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierFilter {
    Regular,
    Premium,
    #[default]
    All,
}

impl TierFilter {
    /// `all` means no tier predicate; the others bind as a SQL parameter.
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            TierFilter::Regular => Some("regular"),
            TierFilter::Premium => Some("premium"),
            TierFilter::All => None,
        }
    }
}

/// Filter set for idea listings. Published + approved is implicit and
/// always applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeaFilters {
    pub category: Option<String>,
    #[serde(default)]
    pub tier: TierFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_strategy_defaults_to_newest() {
        assert_eq!(SortStrategy::default(), SortStrategy::Newest);
    }

    #[test]
    fn test_sort_strategy_parses_snake_case() {
        let s: SortStrategy = serde_json::from_str("\"most_popular\"").unwrap();
        assert_eq!(s, SortStrategy::MostPopular);
        let s: SortStrategy = serde_json::from_str("\"top_rated\"").unwrap();
        assert_eq!(s, SortStrategy::TopRated);
    }

    #[test]
    fn test_tier_all_binds_nothing() {
        assert_eq!(TierFilter::All.as_param(), None);
        assert_eq!(TierFilter::Premium.as_param(), Some("premium"));
    }
}
