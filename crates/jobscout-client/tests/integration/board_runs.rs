use jobscout_client::{Adzuna, Indeed, Seek};
use jobscout_core::error::AppError;
use jobscout_core::export::to_csv_string;
use jobscout_core::models::{ListingId, SearchScope, SearchTerms, StatusResponse};
use jobscout_core::testutil::{MockReporter, MockTransport};
use jobscout_core::traits::{JobBoard, RawResponse};

use crate::integration::common::*;

fn url<B: JobBoard>(board: &B, terms: &SearchTerms, page: u32) -> String {
    let query = board.apply_search(board.query(), terms);
    board.search_url(&query, page).unwrap().to_string()
}

fn listing<B: JobBoard>(board: &B, id: &str) -> String {
    board.listing_url(&ListingId::from(id)).unwrap().to_string()
}

#[tokio::test]
async fn adzuna_run_collects_table_and_exports() -> anyhow::Result<()> {
    let board = Adzuna;
    let terms = SearchTerms::new("aboriginal");
    let transport = MockTransport::new()
        .route(&url(&board, &terms, 1), RawResponse::ok(adzuna_results(60, &["101", "102"])))
        .route(&url(&board, &terms, 2), RawResponse::ok(adzuna_results(60, &["102", "103"])))
        .route(
            &listing(&board, "101"),
            RawResponse::ok(adzuna_detail("Ranger", "Look after country", &[("Location", "Katherine")])),
        )
        .route(&listing(&board, "102"), RawResponse::new(500, "Internal server error"))
        .route(
            &listing(&board, "103"),
            RawResponse::ok(adzuna_detail("Tutor", "Teach", &[("Company", "NT Schools")])),
        );

    let report = engine(board, transport.clone())
        .search(&terms, &MockReporter::new())
        .await?;

    assert_eq!(report.page_count, 2);
    assert_eq!(report.listings_seen, 3);
    assert_eq!(report.absent, 1);
    assert_eq!(transport.request_count(&listing(&board, "102")), 1);

    let csv = to_csv_string(&report.table)?;
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines[0], "id,title,description,Location,url,Company");
    assert_eq!(
        lines[1],
        "101,Ranger,Look after country,Katherine,https://www.adzuna.com.au/details/101,"
    );
    assert_eq!(
        lines[2],
        "103,Tutor,Teach,,https://www.adzuna.com.au/details/103,NT Schools"
    );
    Ok(())
}

#[tokio::test]
async fn adzuna_no_results_marker_short_circuits() -> anyhow::Result<()> {
    let board = Adzuna;
    let terms = SearchTerms::new("xyzzy");
    let transport = MockTransport::new().route(
        &url(&board, &terms, 1),
        RawResponse::ok("<html><body><h2>No results found</h2></body></html>"),
    );

    let report = engine(board, transport.clone())
        .search(&terms, &MockReporter::new())
        .await?;

    assert!(report.is_no_results());
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(
        serde_json::to_value(StatusResponse::no_results())?,
        serde_json::json!({"status": false, "message": "No jobs found for that query"})
    );
    Ok(())
}

#[tokio::test]
async fn indeed_pages_by_offset() -> anyhow::Result<()> {
    let board = Indeed;
    let terms = SearchTerms::new("nurse")
        .with_scope(SearchScope::TitleAndDescription)
        .with_every_term(true);
    let transport = MockTransport::new()
        .route(&url(&board, &terms, 1), RawResponse::ok(indeed_results(75, &["aa", "bb"])))
        .route(&url(&board, &terms, 2), RawResponse::ok(indeed_results(75, &["cc"])))
        .route(&listing(&board, "aa"), RawResponse::ok(indeed_detail("RN", "Ward work")))
        .route(&listing(&board, "bb"), RawResponse::ok(indeed_detail("EN", "Clinic work")))
        .route(&listing(&board, "cc"), RawResponse::ok(indeed_detail("AIN", "Aged care")));

    let report = engine(board, transport.clone())
        .search(&terms, &MockReporter::new())
        .await?;

    assert_eq!(report.table.len(), 3);
    let requested = transport.requests();
    assert!(requested.iter().any(|u| u.contains("as_and=nurse") && u.contains("start=0")));
    assert!(requested.iter().any(|u| u.contains("start=50")));
    assert!(!requested.iter().any(|u| u.contains("start=100")));

    let row = report.table.get(&"cc".into()).unwrap();
    assert_eq!(row.get("url"), Some("https://au.indeed.com/viewjob?jk=cc"));
    assert_eq!(row.get("employer"), Some(""));
    Ok(())
}

#[tokio::test]
async fn indeed_captcha_aborts_with_blocked_status() {
    let board = Indeed;
    let terms = SearchTerms::new("nurse");
    let transport = MockTransport::new().route(
        &url(&board, &terms, 1),
        RawResponse::new(403, "<html><body><div id='h'>hCaptcha</div></body></html>"),
    );
    let reporter = MockReporter::new();

    let err = engine(board, transport.clone())
        .search(&terms, &reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Blocked { ref marker, .. } if marker.as_str() == "hCaptcha"));
    assert_eq!(transport.requests().len(), 1);

    let status = StatusResponse::from_error(&err);
    assert!(!status.status);
    assert!(status.message.contains("indeed is blocking automated requests"));
}

#[tokio::test]
async fn seek_merges_state_summaries_with_detail_description() -> anyhow::Result<()> {
    let board = Seek;
    let terms = SearchTerms::new("youth worker");
    let transport = MockTransport::new()
        .route(
            &url(&board, &terms, 1),
            RawResponse::ok(seek_results(2, &[("501", "Youth Worker"), ("502", "Case Worker")])),
        )
        .route(&listing(&board, "501"), RawResponse::ok(seek_detail("Support teens")))
        .route(&listing(&board, "502"), RawResponse::ok(seek_detail("Manage cases")));

    let report = engine(board, transport.clone())
        .search(&terms, &MockReporter::new())
        .await?;

    assert_eq!(
        transport.requests()[0],
        "https://www.seek.com.au/youth-worker-jobs?page=1"
    );
    let row = report.table.get(&"502".into()).unwrap();
    assert_eq!(row.get("title"), Some("Case Worker"));
    assert_eq!(row.get("company"), Some("Employer 502"));
    assert_eq!(row.get("description"), Some("Manage cases"));
    assert_eq!(row.get("url"), Some("https://www.seek.com.au/job/502"));
    Ok(())
}

#[tokio::test]
async fn seek_missing_listing_is_skipped() -> anyhow::Result<()> {
    let board = Seek;
    let terms = SearchTerms::new("chef");
    let transport = MockTransport::new()
        .route(
            &url(&board, &terms, 1),
            RawResponse::ok(seek_results(2, &[("1", "Chef"), ("2", "Cook")])),
        )
        .route(&listing(&board, "1"), RawResponse::ok(seek_detail("Cook things")));

    let report = engine(board, transport)
        .search(&terms, &MockReporter::new())
        .await?;

    assert_eq!(report.absent, 1);
    let ids: Vec<_> = report.table.ids().map(ListingId::as_str).collect();
    assert_eq!(ids, ["1"]);
    Ok(())
}
