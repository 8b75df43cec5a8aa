use jobscout_core::EngineConfig;
use jobscout_core::engine::SearchEngine;
use jobscout_core::testutil::MockTransport;
use jobscout_core::traits::JobBoard;

pub fn engine<B: JobBoard>(board: B, transport: MockTransport) -> SearchEngine<B, MockTransport> {
    SearchEngine::new(board, transport, EngineConfig::default().with_concurrency(4))
}

pub fn adzuna_results(total: u64, ids: &[&str]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| format!(r#"<div data-aid="{id}"><h2>Job {id}</h2></div>"#))
        .collect();
    format!(
        r#"<html><body>
            <div class="ui-search-heading"><h1>Search results</h1><span>{total}</span></div>
            <div class="ui-search-results">{cards}</div>
        </body></html>"#
    )
}

pub fn adzuna_detail(title: &str, description: &str, rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(th, td)| format!("<tr><th>{th}:</th><td>{td}</td></tr>"))
        .collect();
    format!(
        r#"<html><body>
            <h1>{title}</h1>
            <section class="text-sm">{description}</section>
            <table>{rows}</table>
        </body></html>"#
    )
}

pub fn indeed_results(total: u64, keys: &[&str]) -> String {
    let anchors: String = keys
        .iter()
        .map(|jk| format!(r#"<a id="job_{jk}" data-jk="{jk}">Job {jk}</a>"#))
        .collect();
    format!(
        r#"<html><body>
            <div id="searchCountPages">Page 1 of {total} jobs</div>
            {anchors}
        </body></html>"#
    )
}

pub fn indeed_detail(title: &str, description: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="jobsearch-JobInfoHeader-title">{title}</h1>
            <div id="jobDescriptionText">{description}</div>
        </body></html>"#
    )
}

/// Seek results page with one state entry per `(id, title)`.
pub fn seek_results(total: u64, jobs: &[(&str, &str)]) -> String {
    let entries: Vec<String> = jobs
        .iter()
        .map(|(id, title)| {
            format!(
                r#"{{"id":"{id}","title":"{title}","teaser":"Teaser {id}","bulletPoints":[],"advertiser":{{"description":"Employer {id}"}},"location":"Melbourne","workType":"Full Time"}}"#
            )
        })
        .collect();
    format!(
        r#"<html><body>
            <strong data-automation="totalJobsCount">{total}</strong>
            <script data-automation="server-state">
                window.SEEK_REDUX_DATA = {{"results":{{"results":{{"jobs":[{}]}}}}}};
            </script>
        </body></html>"#,
        entries.join(",")
    )
}

pub fn seek_detail(description: &str) -> String {
    format!(r#"<html><body><div data-automation="jobAdDetails">{description}</div></body></html>"#)
}
