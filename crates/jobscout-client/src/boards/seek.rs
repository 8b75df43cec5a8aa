use jobscout_core::document::PageDocument;
use jobscout_core::error::AppError;
use jobscout_core::models::{ListingId, ListingRecord, Pagination, QuerySpec, SearchTerms};
use jobscout_core::traits::{JobBoard, PageParam};
use serde_json::Value;
use url::Url;

use super::{parse_count, parse_url};

const SITE_URL: &str = "https://www.seek.com.au";
const PAGE_SIZE: u32 = 22;
const RESULT_CAP: u32 = 200;

/// Query key holding the search keywords. Seek takes them in the path,
/// so the key never reaches the query string.
pub const KEYWORDS: &str = "keywords";

const REDUX_PREFIX: &str = "window.SEEK_REDUX_DATA = ";

/// Results-page JSON key → record column.
const SUMMARY_FIELDS: [(&str, &str); 11] = [
    ("/listingDate", "listingDate"),
    ("/title", "title"),
    ("/teaser", "short_description"),
    ("/bulletPoints", "bulletpoints"),
    ("/advertiser/description", "company"),
    ("/location", "location"),
    ("/area", "area"),
    ("/workType", "contract_type"),
    ("/classification/description", "category"),
    ("/subClassification/description", "subcategory"),
    ("/salary", "salary"),
];

/// seek.com.au keyword search.
///
/// Most fields come from the state blob embedded in each results page;
/// detail pages only add the description.
#[derive(Debug, Clone, Copy, Default)]
pub struct Seek;

impl Seek {
    fn jobs(&self, doc: &PageDocument) -> Result<Vec<Value>, AppError> {
        let script = doc
            .first("script[data-automation=server-state]")?
            .ok_or_else(|| AppError::ExtractionError("seek server state missing".to_string()))?;
        let source: String = script.text().collect();

        let line = source
            .lines()
            .map(str::trim)
            .find(|line| line.contains("SEEK_REDUX_DATA"))
            .ok_or_else(|| AppError::ExtractionError("SEEK_REDUX_DATA not assigned".to_string()))?;
        let json = undefined_to_null(line.trim_start_matches(REDUX_PREFIX).trim_end_matches(';'));

        let state: Value = serde_json::from_str(&json)?;
        match state.pointer("/results/results/jobs") {
            Some(Value::Array(jobs)) => Ok(jobs.clone()),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(AppError::ExtractionError(format!(
                "seek jobs is not a list: {other}"
            ))),
        }
    }

    fn summaries(&self, doc: &PageDocument) -> Result<Vec<(ListingId, ListingRecord)>, AppError> {
        Ok(self
            .jobs(doc)?
            .iter()
            .filter_map(|job| {
                let id = ListingId::from(value_text(job.get("id")?));
                let record = SUMMARY_FIELDS
                    .iter()
                    .fold(ListingRecord::new(), |record, (pointer, column)| {
                        let value = job.pointer(pointer).map(value_text).unwrap_or_default();
                        record.field(column, value)
                    });
                Some((id, record))
            })
            .collect())
    }
}

impl JobBoard for Seek {
    fn name(&self) -> &str {
        "seek"
    }

    fn pagination(&self) -> Pagination {
        Pagination::from_result_cap(PAGE_SIZE, RESULT_CAP)
    }

    fn query(&self) -> QuerySpec {
        QuerySpec::new().unset(KEYWORDS).param("page", 1)
    }

    fn apply_search(&self, query: QuerySpec, search: &SearchTerms) -> QuerySpec {
        query.with(KEYWORDS, Some(search.terms.clone()))
    }

    fn page_param(&self) -> PageParam {
        PageParam::Index("page")
    }

    fn search_base(&self, query: &QuerySpec) -> Result<Url, AppError> {
        let keywords = query
            .get(KEYWORDS)
            .map(slugify)
            .filter(|slug| !slug.is_empty())
            .ok_or_else(|| AppError::InvalidQuery("seek needs search keywords".to_string()))?;
        let mut url = parse_url(SITE_URL)?;
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidQuery(format!("{SITE_URL} cannot take a path")))?
            .clear()
            .push(&format!("{keywords}-jobs"));
        Ok(url)
    }

    fn search_url(&self, query: &QuerySpec, page: u32) -> Result<Url, AppError> {
        let paged = self
            .page_param()
            .apply(query, page, &self.pagination())
            .with(KEYWORDS, None);
        paged.to_url(&self.search_base(query)?)
    }

    fn listing_url(&self, id: &ListingId) -> Result<Url, AppError> {
        parse_url(&format!("{SITE_URL}/job/{id}"))
    }

    fn no_results_markers(&self) -> &[&str] {
        &["Sorry, we couldn't find anything."]
    }

    fn result_count(&self, doc: &PageDocument) -> Result<u64, AppError> {
        parse_count(&doc.require_text("strong[data-automation=totalJobsCount]")?)
    }

    fn listing_ids(&self, doc: &PageDocument) -> Result<Vec<ListingId>, AppError> {
        Ok(self.summaries(doc)?.into_iter().map(|(id, _)| id).collect())
    }

    fn listing_summaries(
        &self,
        doc: &PageDocument,
    ) -> Result<Vec<(ListingId, ListingRecord)>, AppError> {
        self.summaries(doc)
    }

    fn page_listings(
        &self,
        doc: &PageDocument,
    ) -> Result<(Vec<ListingId>, Vec<(ListingId, ListingRecord)>), AppError> {
        let summaries = self.summaries(doc)?;
        let ids = summaries.iter().map(|(id, _)| id.clone()).collect();
        Ok((ids, summaries))
    }

    fn extract_fields(
        &self,
        doc: &PageDocument,
        _id: &ListingId,
    ) -> Result<ListingRecord, AppError> {
        let description = doc.require_text("div[data-automation=jobAdDetails]")?;
        Ok(ListingRecord::new().field("description", description))
    }
}

/// `"Aged Care  nurse"` → `"aged-care-nurse"`.
fn slugify(keywords: &str) -> String {
    keywords
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Rewrite bare `undefined` tokens to `null`, leaving string contents alone.
fn undefined_to_null(source: &str) -> String {
    const TOKEN: &str = "undefined";

    let mut out = String::with_capacity(source.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = source;

    while let Some(c) = rest.chars().next() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if c == '"' {
            in_string = true;
        } else if rest.starts_with(TOKEN) {
            let boundary = !rest[TOKEN.len()..]
                .starts_with(|n: char| n.is_alphanumeric() || n == '_' || n == '$');
            let standalone = !out
                .ends_with(|p: char| p.is_alphanumeric() || p == '_' || p == '$');
            if boundary && standalone {
                out.push_str("null");
                rest = &rest[TOKEN.len()..];
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Flatten a JSON scalar (or list of scalars) into a cell value.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}
