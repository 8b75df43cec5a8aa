use jobscout_core::document::{PageDocument, descendant_texts};
use jobscout_core::error::AppError;
use jobscout_core::models::{ListingId, ListingRecord, Pagination, QuerySpec, SearchScope, SearchTerms};
use jobscout_core::traits::{JobBoard, PageParam};
use url::Url;

use super::{parse_count, parse_url, pattern};

const SEARCH_URL: &str = "https://au.indeed.com/jobs";
const VIEW_URL: &str = "https://au.indeed.com/viewjob";
const PAGE_SIZE: u32 = 50;
const RESULT_CAP: u32 = 500;

/// au.indeed.com advanced search.
///
/// Pages are addressed by result offset (`start`), not page number.
#[derive(Debug, Clone, Copy, Default)]
pub struct Indeed;

impl JobBoard for Indeed {
    fn name(&self) -> &str {
        "indeed"
    }

    fn pagination(&self) -> Pagination {
        Pagination::from_result_cap(PAGE_SIZE, RESULT_CAP)
    }

    fn query(&self) -> QuerySpec {
        QuerySpec::new()
            .param("psf", "advsrch")
            .param("from", "advancedsearch")
            .unset("as_and") // all of these terms
            .unset("as_phr") // exact phrase
            .unset("as_any") // at least one of these
            .unset("as_not") // none of these
            .unset("as_ttl") // in title
            .unset("as_cmp") // from company
            .unset("jt") // fulltime | parttime | casual | contract
            .param("limit", PAGE_SIZE)
            .param("start", 0)
    }

    fn apply_search(&self, query: QuerySpec, search: &SearchTerms) -> QuerySpec {
        let key = match (search.scope, search.must_include_every_term) {
            (SearchScope::Title, _) => "as_ttl",
            (SearchScope::TitleAndDescription, true) => "as_and",
            (SearchScope::TitleAndDescription, false) => "as_any",
        };
        query.with(key, Some(search.terms.clone()))
    }

    fn page_param(&self) -> PageParam {
        PageParam::Offset("start")
    }

    fn search_base(&self, _query: &QuerySpec) -> Result<Url, AppError> {
        parse_url(SEARCH_URL)
    }

    fn listing_url(&self, id: &ListingId) -> Result<Url, AppError> {
        let mut url = parse_url(VIEW_URL)?;
        url.query_pairs_mut().append_pair("jk", id.as_str());
        Ok(url)
    }

    fn blocked_markers(&self) -> &[&str] {
        &["hCaptcha"]
    }

    fn no_results_markers(&self) -> &[&str] {
        &["did not match any jobs"]
    }

    fn result_count(&self, doc: &PageDocument) -> Result<u64, AppError> {
        let raw = doc.require_text("div#searchCountPages")?.replace(',', "");
        let pages = pattern(r"^Page (\d*) of (\d*) jobs")?;
        let total = pages
            .captures(raw.trim())
            .and_then(|caps| caps.get(2))
            .ok_or_else(|| AppError::ExtractionError(format!("unexpected count text '{raw}'")))?;
        parse_count(total.as_str())
    }

    fn listing_ids(&self, doc: &PageDocument) -> Result<Vec<ListingId>, AppError> {
        let job_anchor = pattern("^job_")?;
        Ok(doc
            .with_attr_matching("a", "id", &job_anchor)?
            .into_iter()
            .filter_map(|el| el.value().attr("data-jk"))
            .map(ListingId::from)
            .collect())
    }

    fn extract_fields(
        &self,
        doc: &PageDocument,
        _id: &ListingId,
    ) -> Result<ListingRecord, AppError> {
        let title = doc
            .first_text("h1.jobsearch-JobInfoHeader-title")?
            .unwrap_or_default();
        let description = doc.require_text("div#jobDescriptionText")?;

        let (employer, location) = match doc.first("div.jobsearch-CompanyInfoContainer")? {
            Some(company) => {
                let mut names = descendant_texts(company, "a")?;
                if names.is_empty() {
                    names = descendant_texts(company, "div.jobsearch-InlineCompanyRating")?;
                }
                let employer = names.into_iter().next().unwrap_or_default();
                let location =
                    descendant_texts(company, "div.jobsearch-JobInfoHeader-subtitle div:not([class])")?
                        .join(" ");
                (employer, location)
            }
            None => (String::new(), String::new()),
        };

        let (employment_type, salary) = match doc.first("div.jobsearch-JobMetadataHeader-item")? {
            Some(item) => split_metadata(descendant_texts(item, "span")?),
            None => (String::new(), String::new()),
        };

        Ok(ListingRecord::titled(title, description)
            .field("employer", employer)
            .field("location", location)
            .field("employment_type", employment_type)
            .field("salary", salary))
    }
}

/// `(employment_type, salary)` from the metadata header spans.
///
/// One span is a salary when it mentions `$`; two spans are salary then
/// employment type.
fn split_metadata(spans: Vec<String>) -> (String, String) {
    match spans.as_slice() {
        [only] if only.contains('$') => (String::new(), only.clone()),
        [only] => (only.clone(), String::new()),
        [salary, kind] => (kind.replace('-', "").trim().to_string(), salary.clone()),
        _ => (String::new(), String::new()),
    }
}
