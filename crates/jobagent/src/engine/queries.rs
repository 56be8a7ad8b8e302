//! Search query planning.

/// One search query against a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub title: String,
    pub location: String,
}

/// Enumerates the cartesian product of target titles and locations in
/// configured title-then-location order. The per-cycle application cap is
/// enforced by the runner between queries.
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    titles: Vec<String>,
    locations: Vec<String>,
}

impl QueryPlanner {
    pub fn new(titles: Vec<String>, locations: Vec<String>) -> Self {
        Self { titles, locations }
    }

    pub fn queries(&self) -> impl Iterator<Item = SearchQuery> + '_ {
        self.titles.iter().flat_map(move |title| {
            self.locations.iter().map(move |location| SearchQuery {
                title: title.clone(),
                location: location.clone(),
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() || self.locations.is_empty()
    }
}
