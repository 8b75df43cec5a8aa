use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Named query parameters for a board's search endpoint.
///
/// A parameter whose value is `None` is declared but unset: it is omitted
/// from built request targets. Parameters keep their declaration order so
/// the same spec always produces the same target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    params: Vec<(String, Option<String>)>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter with a value.
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, Some(value.to_string()));
        self
    }

    /// Declare a parameter that is omitted until a value is set.
    pub fn unset(mut self, key: &str) -> Self {
        self.set(key, None);
        self
    }

    /// Return a copy with `key` set to `value`, leaving `self` untouched.
    pub fn with(&self, key: &str, value: Option<String>) -> Self {
        let mut derived = self.clone();
        derived.set(key, value);
        derived
    }

    /// Set `key` in place, appending it if it was not declared yet.
    pub fn set(&mut self, key: &str, value: Option<String>) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.params.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// All parameters that carry a value, in declaration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Append every set parameter to `base`, form-encoded.
    ///
    /// Errors if `base` cannot carry a query (e.g. `data:` URLs).
    pub fn to_url(&self, base: &Url) -> Result<Url, AppError> {
        if base.cannot_be_a_base() {
            return Err(AppError::InvalidQuery(format!(
                "{base} cannot carry query parameters"
            )));
        }
        let mut url = base.clone();
        if self.pairs().next().is_some() {
            url.query_pairs_mut().extend_pairs(self.pairs());
        }
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Page geometry of a board's search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Listings per search page.
    pub page_size: u32,
    /// Upper bound on pages fetched per run.
    pub max_pages: u32,
}

impl Pagination {
    pub fn new(page_size: u32, max_pages: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            max_pages,
        }
    }

    /// Derive the page cap from a cap on total results, rounding down.
    ///
    /// Example: 22 results per page with a 200 result cap allows 9 pages.
    pub fn from_result_cap(page_size: u32, max_results: u32) -> Self {
        let page_size = page_size.max(1);
        Self::new(page_size, max_results / page_size)
    }

    /// `ceil(total / page_size)`, silently clamped to `max_pages`.
    pub fn page_count(&self, total_results: u64) -> u32 {
        let pages = total_results.div_ceil(u64::from(self.page_size));
        pages.min(u64::from(self.max_pages)) as u32
    }

    /// Zero-based offset of the first result on a 1-based `page`.
    pub fn offset(&self, page: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

// ---------------------------------------------------------------------------
// Search terms
// ---------------------------------------------------------------------------

/// Which part of a listing the search terms are matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    Title,
    TitleAndDescription,
}

/// A free-text search to be mapped onto a board's query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTerms {
    pub terms: String,
    #[serde(default)]
    pub scope: SearchScope,
    /// Require every term to match instead of any of them.
    #[serde(default)]
    pub must_include_every_term: bool,
}

impl SearchTerms {
    pub fn new(terms: impl Into<String>) -> Self {
        Self {
            terms: terms.into(),
            scope: SearchScope::Title,
            must_include_every_term: false,
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_every_term(mut self, every: bool) -> Self {
        self.must_include_every_term = every;
        self
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// Opaque identifier of one listing within a board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ListingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ListingId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Fields every assembled record carries.
pub const REQUIRED_FIELDS: [&str; 3] = ["title", "description", "url"];

/// Flat field-name → value record for one listing.
///
/// Field order is insertion order; re-inserting a key replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingRecord {
    fields: Vec<(String, String)>,
}

impl ListingRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a record with the two fields every extractor must supply.
    pub fn titled(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new()
            .field("title", title)
            .field("description", description)
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Layer `self` over `base`: keys from `base` come first, values from
    /// `self` win.
    pub fn over(self, base: ListingRecord) -> ListingRecord {
        let mut merged = base;
        for (key, value) in self.fields {
            merged.insert(&key, value);
        }
        merged
    }

    /// Required fields this record lacks.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|key| !self.contains(key))
            .collect()
    }
}

/// Final run artifact: one record per listing, keyed by identifier.
///
/// Rows keep insertion order; columns are the union of record keys in
/// order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    rows: Vec<(ListingId, ListingRecord)>,
    index: HashMap<ListingId, usize>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, replacing and returning any previous record for `id`.
    pub fn insert(&mut self, id: ListingId, record: ListingRecord) -> Option<ListingRecord> {
        match self.index.get(&id) {
            Some(&pos) => Some(std::mem::replace(&mut self.rows[pos].1, record)),
            None => {
                self.index.insert(id.clone(), self.rows.len());
                self.rows.push((id, record));
                None
            }
        }
    }

    pub fn get(&self, id: &ListingId) -> Option<&ListingRecord> {
        self.index.get(id).map(|&pos| &self.rows[pos].1)
    }

    pub fn contains(&self, id: &ListingId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ListingId> {
        self.rows.iter().map(|(id, _)| id)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&ListingId, &ListingRecord)> {
        self.rows.iter().map(|(id, record)| (id, record))
    }

    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for (_, record) in &self.rows {
            for (key, _) in record.iter() {
                if !columns.contains(&key) {
                    columns.push(key);
                }
            }
        }
        columns
    }
}

impl FromIterator<(ListingId, ListingRecord)> for ResultTable {
    fn from_iter<I: IntoIterator<Item = (ListingId, ListingRecord)>>(iter: I) -> Self {
        let mut table = ResultTable::new();
        for (id, record) in iter {
            table.insert(id, record);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Caller-facing status
// ---------------------------------------------------------------------------

/// `{status, message}` body handed back to a caller that did not get a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn no_results() -> Self {
        Self {
            status: false,
            message: "No jobs found for that query".to_string(),
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        let message = match err {
            AppError::Blocked { board, marker, .. } => format!(
                "{board} is blocking automated requests ({marker} challenge); try again later"
            ),
            other => other.to_string(),
        };
        Self {
            status: false,
            message,
        }
    }
}
