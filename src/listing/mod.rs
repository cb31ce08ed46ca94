//! List Views
//!
//! Filtering and sorting for the in-memory lists shown by the client:
//! community posts, saved essays, admin users and transactions.
//!
//! A [`ListQuery`] combines a case-insensitive substring search on the
//! record's title, any number of facet filters (all must match) and an
//! optional [`SortKey`]. When sorting, pinned records always come first.
//! Applying the same query to its own output returns the same records.

mod catalog;
mod records;

pub use catalog::Catalog;
pub use records::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A record that can appear in a list view
pub trait Listable {
    /// Field the free-text search looks at
    fn title(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    /// Counter used by [`SortKey::Popular`]
    fn popularity(&self) -> u64 {
        0
    }

    fn is_pinned(&self) -> bool {
        false
    }

    /// `needle` is already lower-cased
    fn matches_text(&self, needle: &str) -> bool {
        self.title().to_lowercase().contains(needle)
    }
}

/// A record that can be narrowed by facet values of type `F`
pub trait Faceted<F> {
    fn has_facet(&self, facet: &F) -> bool;
}

/// Sort order for a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Newest first
    #[default]
    Recent,
    /// Highest counter first
    Popular,
}

impl FromStr for SortKey {
    type Err = UnknownFacet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(SortKey::Recent),
            "popular" => Ok(SortKey::Popular),
            other => Err(UnknownFacet {
                kind: "sort order",
                value: other.to_string(),
            }),
        }
    }
}

/// Search, facet and sort settings for one list
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F> {
    search: String,
    facets: Vec<F>,
    sort: Option<SortKey>,
}

impl<F> Default for ListQuery<F> {
    fn default() -> Self {
        Self {
            search: String::new(),
            facets: Vec::new(),
            sort: None,
        }
    }
}

impl<F> ListQuery<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the free-text search
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into().trim().to_lowercase();
        self
    }

    /// Builder method: require a facet value
    pub fn facet(mut self, facet: F) -> Self {
        self.facets.push(facet);
        self
    }

    /// Builder method: require a facet value when one is given ("all" is `None`)
    pub fn facet_opt(self, facet: Option<F>) -> Self {
        match facet {
            Some(facet) => self.facet(facet),
            None => self,
        }
    }

    /// Builder method: sort the result
    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    /// Whether `item` passes the search and every facet
    pub fn matches<T>(&self, item: &T) -> bool
    where
        T: Listable + Faceted<F>,
    {
        (self.search.is_empty() || item.matches_text(&self.search))
            && self.facets.iter().all(|facet| item.has_facet(facet))
    }

    /// Filter and sort `items`, leaving the input untouched
    pub fn apply<T>(&self, items: &[T]) -> Vec<T>
    where
        T: Listable + Faceted<F> + Clone,
    {
        let mut result: Vec<T> = items
            .iter()
            .filter(|item| self.matches(*item))
            .cloned()
            .collect();

        if let Some(key) = self.sort {
            sort_records(&mut result, key);
        }

        tracing::debug!(
            total = items.len(),
            matched = result.len(),
            search = %self.search,
            "List filtered"
        );
        result
    }
}

/// Sort with pinned records first, then by `key` descending
pub fn sort_records<T: Listable>(items: &mut [T], key: SortKey) {
    items.sort_by(|a, b| {
        b.is_pinned().cmp(&a.is_pinned()).then_with(|| match key {
            SortKey::Recent => b.created_at().cmp(&a.created_at()),
            SortKey::Popular => b.popularity().cmp(&a.popularity()),
        })
    });
}

/// Parse an optional facet parameter where missing or "all" means no filter
pub fn parse_facet<F>(value: Option<&str>) -> Result<Option<F>, UnknownFacet>
where
    F: FromStr<Err = UnknownFacet>,
{
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}
