use jobscout_core::document::{PageDocument, descendant_texts};
use jobscout_core::error::AppError;
use jobscout_core::export::ID_COLUMN;
use jobscout_core::models::{ListingId, ListingRecord, Pagination, QuerySpec, SearchScope, SearchTerms};
use jobscout_core::traits::{JobBoard, PageParam};
use url::Url;

use super::{parse_count, parse_url, pattern};

const SEARCH_URL: &str = "https://www.adzuna.com.au/search";
const DETAILS_URL: &str = "https://www.adzuna.com.au/details";
const PAGE_SIZE: u32 = 50;
const RESULT_CAP: u32 = 500;

/// Columns the engine and the export own; detail rows may not claim them.
const RESERVED_COLUMNS: [&str; 4] = [ID_COLUMN, "title", "description", "url"];

/// adzuna.com.au advanced search.
#[derive(Debug, Clone, Copy, Default)]
pub struct Adzuna;

impl JobBoard for Adzuna {
    fn name(&self) -> &str {
        "adzuna"
    }

    fn pagination(&self) -> Pagination {
        Pagination::from_result_cap(PAGE_SIZE, RESULT_CAP)
    }

    fn query(&self) -> QuerySpec {
        QuerySpec::new()
            .param("adv", 1)
            .unset("qwd") // all of these words
            .unset("qph") // exact phrase
            .unset("qor") // any of these words
            .unset("qxl") // none of these words
            .unset("qtl") // in title
            .unset("sf") // salary from
            .unset("st") // salary to
            .unset("cty") // permanent | contract
            .unset("cti") // full_time | part_time
            .param("w", "Australia")
            .param("pp", PAGE_SIZE)
            .param("sb", "date")
            .param("sd", "down")
            .param("page", 1)
    }

    fn apply_search(&self, query: QuerySpec, search: &SearchTerms) -> QuerySpec {
        let key = match (search.scope, search.must_include_every_term) {
            (SearchScope::Title, _) => "qtl",
            (SearchScope::TitleAndDescription, true) => "qwd",
            (SearchScope::TitleAndDescription, false) => "qor",
        };
        query.with(key, Some(search.terms.clone()))
    }

    fn page_param(&self) -> PageParam {
        PageParam::Index("page")
    }

    fn search_base(&self, _query: &QuerySpec) -> Result<Url, AppError> {
        parse_url(SEARCH_URL)
    }

    fn listing_url(&self, id: &ListingId) -> Result<Url, AppError> {
        parse_url(&format!("{DETAILS_URL}/{id}"))
    }

    fn no_results_markers(&self) -> &[&str] {
        &["No results found"]
    }

    fn result_count(&self, doc: &PageDocument) -> Result<u64, AppError> {
        parse_count(&doc.require_text("div.ui-search-heading span")?)
    }

    fn listing_ids(&self, doc: &PageDocument) -> Result<Vec<ListingId>, AppError> {
        let digits = pattern(r"^\d+$")?;
        Ok(doc
            .with_attr_matching("div.ui-search-results div", "data-aid", &digits)?
            .into_iter()
            .filter_map(|el| el.value().attr("data-aid"))
            .map(ListingId::from)
            .collect())
    }

    fn extract_fields(
        &self,
        doc: &PageDocument,
        _id: &ListingId,
    ) -> Result<ListingRecord, AppError> {
        let mut record =
            ListingRecord::titled(doc.require_text("h1")?, doc.require_text("section.text-sm")?);

        // Free-form detail table: each row becomes its own column.
        for row in doc.select("table tr")? {
            let headers = descendant_texts(row, "th")?;
            let values = descendant_texts(row, "td")?;
            if let (Some(header), Some(value)) = (headers.first(), values.first()) {
                let column = header.replace(':', "");
                let column = column.trim();
                if column.is_empty() {
                    continue;
                }
                if RESERVED_COLUMNS.iter().any(|r| r.eq_ignore_ascii_case(column)) {
                    record.insert(&format!("detail_{column}"), value.as_str());
                } else {
                    record.insert(column, value.as_str());
                }
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobscout_core::traits::PageSignal;

    #[test]
    fn test_default_query_omits_unset_keys() {
        let board = Adzuna;
        let url = board.search_url(&board.query(), 3).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.adzuna.com.au/search?adv=1&w=Australia&pp=50&sb=date&sd=down&page=3"
        );
    }

    #[test]
    fn test_page_limit_from_result_cap() {
        assert_eq!(Adzuna.pagination(), Pagination::new(50, 10));
        assert_eq!(Adzuna.pagination().page_count(10_000), 10);
    }

    #[test]
    fn test_apply_search_picks_key_by_scope() {
        let board = Adzuna;
        let title = board.apply_search(board.query(), &SearchTerms::new("rust"));
        assert_eq!(title.get("qtl"), Some("rust"));
        assert_eq!(title.get("qwd"), None);

        let all = board.apply_search(
            board.query(),
            &SearchTerms::new("rust tokio")
                .with_scope(SearchScope::TitleAndDescription)
                .with_every_term(true),
        );
        assert_eq!(all.get("qwd"), Some("rust tokio"));

        let any = board.apply_search(
            board.query(),
            &SearchTerms::new("rust tokio").with_scope(SearchScope::TitleAndDescription),
        );
        assert_eq!(any.get("qor"), Some("rust tokio"));
    }

    #[test]
    fn test_search_page_lookups() {
        let doc = PageDocument::parse(
            200,
            r#"<div class="ui-search-heading"><h1>Jobs</h1><span>1,204</span></div>
               <div class="ui-search-results">
                 <div data-aid="4471">a</div>
                 <div data-aid="ad-banner">skip</div>
                 <div data-aid="4480">b</div>
               </div>
               <div data-aid="9999">outside results</div>"#,
        );
        assert_eq!(Adzuna.result_count(&doc).unwrap(), 1204);
        let ids: Vec<_> = Adzuna
            .listing_ids(&doc)
            .unwrap()
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, ["4471", "4480"]);
    }

    #[test]
    fn test_detail_table_becomes_columns() {
        let doc = PageDocument::parse(
            200,
            r#"<h1>Support Worker</h1>
               <section class="text-sm"> Help people. </section>
               <table>
                 <tr><th>Location:</th><td> Darwin, NT </td></tr>
                 <tr><th>Contract type:</th><td>Permanent</td></tr>
               </table>"#,
        );
        let record = Adzuna.extract_fields(&doc, &"4471".into()).unwrap();
        assert_eq!(record.get("title"), Some("Support Worker"));
        assert_eq!(record.get("description"), Some("Help people."));
        assert_eq!(record.get("Location"), Some("Darwin, NT"));
        assert_eq!(record.get("Contract type"), Some("Permanent"));
    }

    #[test]
    fn test_detail_rows_cannot_shadow_reserved_columns() {
        let doc = PageDocument::parse(
            200,
            r#"<h1>Support Worker</h1>
               <section class="text-sm">Help people.</section>
               <table>
                 <tr><th>ID:</th><td>REF-88</td></tr>
                 <tr><th>Title</th><td>Senior</td></tr>
               </table>"#,
        );
        let record = Adzuna.extract_fields(&doc, &"4471".into()).unwrap();
        assert_eq!(record.get("title"), Some("Support Worker"));
        assert_eq!(record.get("detail_ID"), Some("REF-88"));
        assert_eq!(record.get("detail_Title"), Some("Senior"));
        assert!(!record.contains("ID"));

        let mut table = jobscout_core::models::ResultTable::new();
        table.insert("4471".into(), record);
        let csv = jobscout_core::export::to_csv_string(&table).unwrap();
        assert!(csv.lines().next().unwrap().contains("detail_ID"));
        assert!(csv.contains("REF-88"));
    }

    #[test]
    fn test_missing_description_fails() {
        let doc = PageDocument::parse(200, "<h1>Support Worker</h1>");
        assert!(matches!(
            Adzuna.extract_fields(&doc, &"1".into()),
            Err(AppError::ExtractionError(_))
        ));
    }

    #[test]
    fn test_no_results_marker() {
        let doc = PageDocument::parse(200, "<p>No results found for xyzzy</p>");
        assert_eq!(Adzuna.classify(&doc), PageSignal::NoResults);
    }
}
