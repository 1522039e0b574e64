//! Integration tests for the HTTP navigation surface
//!
//! These tests use wiremock to serve a paged listing with a block pager,
//! per-row edit and gallery pages, and drive `HtmlSession` through it both
//! directly and under the traversal controller.

use page_sweep::checkpoint::{CheckpointStore, FsSnapshotStore, SnapshotNames, SnapshotStore};
use page_sweep::config::{ColumnLayout, SelectorConfig, SurfaceConfig};
use page_sweep::record::{Featured, Record};
use page_sweep::surface::{
    HtmlSession, PageNavigator, PlainTextSummarizer, RowExtractor, SurfaceError,
};
use page_sweep::traversal::{ControllerSettings, RetryPolicy, TraversalController};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGES: u32 = 7;
const BLOCK: u32 = 3;
const ROWS_PER_PAGE: u32 = 2;

fn page_path(page: u32) -> String {
    if page == 1 {
        "/items".to_string()
    } else {
        format!("/items/{}", page)
    }
}

/// Pager panel showing the block of `page`, with a » link to the next block
fn pager(page: u32) -> String {
    let first = (page - 1) / BLOCK * BLOCK + 1;
    let last = (first + BLOCK - 1).min(PAGES);

    let mut html = String::from(r#"<div id="ctl00_ContentPlaceHolderBody_PanelDataListPaging">"#);
    for n in first..=last {
        if n == page {
            html.push_str(&format!(r#"<span class="PagingLinkCurrent">{}</span>"#, n));
        } else {
            html.push_str(&format!(
                r#"<a class="PagingLink" href="{}">{}</a>"#,
                page_path(n),
                n
            ));
        }
    }
    if last < PAGES {
        html.push_str(&format!(
            r#"<a class="PagingLink" href="{}">»</a>"#,
            page_path(last + 1)
        ));
    }
    html.push_str("</div>");
    html
}

fn listing_row(id: u32) -> String {
    let featured = if id % 2 == 1 { " checked" } else { "" };
    format!(
        r#"<tr>
          <td><input type="checkbox" name="sel"></td>
          <td><a href="/edit/R{id}" title="Edit item">Edit</a></td>
          <td>R{id}</td>
          <td>Item   R{id}</td>
          <td>Furniture</td>
          <td><a href="/media/R{id}">2</a></td>
          <td>€{price}</td>
          <td><input type="checkbox" disabled{featured}></td>
          <td><select><option>Active</option><option selected>Sold</option></select></td>
          <td>01/0{page}/2025</td>
        </tr>"#,
        id = id,
        price = id * 10,
        featured = featured,
        page = (id + 1) / 2,
    )
}

fn listing_page(page: u32) -> String {
    let rows: String = (1..=ROWS_PER_PAGE)
        .map(|r| listing_row((page - 1) * ROWS_PER_PAGE + r))
        .collect();

    format!(
        r#"<html><head><title>Items</title></head><body>
        <table class="gridView">
          <tr><th></th><th></th><th>ID</th><th>Name</th><th>Category</th>
              <th>Pictures</th><th>Price</th><th>Featured</th><th>Status</th><th>Updated</th></tr>
          {}
        </table>
        {}
        </body></html>"#,
        rows,
        pager(page)
    )
}

const EDIT_PAGE: &str = r#"<html><body>
    <form>
      <textarea name="ctl00$ContentPlaceHolderBody$txtdesc">&lt;p&gt;Solid &lt;b&gt;oak&lt;/b&gt; table&lt;/p&gt;</textarea>
    </form>
    </body></html>"#;

const MEDIA_PAGE: &str = r#"<html><body>
    <div id="ctl00_ContentPlaceHolderBody_ReorderList1">
      <ul>
        <li><a target="_blank" href="http://cdn.example.com/1.jpg">1</a></li>
        <li><a target="_blank" href="https://cdn.example.com/2.jpg">2</a></li>
      </ul>
    </div>
    </body></html>"#;

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

/// Starts a server with every listing page, edit view and gallery mounted
async fn start_listing() -> MockServer {
    let mock_server = MockServer::start().await;

    for page in 1..=PAGES {
        Mock::given(method("GET"))
            .and(path(page_path(page)))
            .respond_with(html(listing_page(page)))
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path_regex(r"^/edit/R\d+$"))
        .respond_with(html(EDIT_PAGE.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/media/R\d+$"))
        .respond_with(html(MEDIA_PAGE.to_string()))
        .mount(&mock_server)
        .await;

    mock_server
}

fn surface_config(listing_url: String) -> SurfaceConfig {
    SurfaceConfig {
        listing_url,
        timeout_secs: 5,
        user_agent: "page-sweep/test".to_string(),
        summary_max_chars: 200,
        selectors: SelectorConfig::default(),
        columns: ColumnLayout::default(),
    }
}

fn session_for(mock_server: &MockServer) -> HtmlSession {
    let config = surface_config(format!("{}/items", mock_server.uri()));
    HtmlSession::new(&config).expect("Failed to build session")
}

#[tokio::test]
async fn test_navigates_within_and_across_pager_blocks() {
    let mock_server = start_listing().await;
    let mut session = session_for(&mock_server);

    // nothing loaded yet
    assert_eq!(session.current_page().await.unwrap(), None);

    assert_eq!(session.go_to(2).await.unwrap(), Some(2));
    assert_eq!(session.visible_pages().await.unwrap(), vec![1, 2, 3]);

    // page 5 is not linked from the first block
    assert_eq!(session.go_to(5).await.unwrap(), Some(2));

    assert!(session.advance_block().await.unwrap());
    assert_eq!(session.current_page().await.unwrap(), Some(4));
    assert_eq!(session.visible_pages().await.unwrap(), vec![4, 5, 6]);

    assert_eq!(session.go_to(5).await.unwrap(), Some(5));
    assert!(session.has_next().await.unwrap());

    assert!(session.advance_block().await.unwrap());
    assert_eq!(session.current_page().await.unwrap(), Some(7));
    assert!(!session.has_next().await.unwrap());
    assert!(!session.advance_block().await.unwrap());
}

#[tokio::test]
async fn test_extracts_rows_of_current_page() {
    let mock_server = start_listing().await;
    let mut session = session_for(&mock_server);

    session.go_to(2).await.unwrap();
    let rows = session.rows_of_current_page().await.unwrap();

    // the header row has no td cells
    assert_eq!(rows.len(), 2);

    let row = &rows[0];
    assert_eq!(row.position, 1);
    assert_eq!(row.cells.len(), 10);
    assert_eq!(row.cells[0], "No");
    assert_eq!(row.cells[2], "R3");
    assert_eq!(row.cells[3], "Item R3");
    assert_eq!(row.cells[7], "Yes");
    assert_eq!(row.cells[8], "Sold");
    assert_eq!(rows[1].cells[7], "No");

    assert_eq!(
        row.detail_link.as_deref(),
        Some(format!("{}/edit/R3", mock_server.uri()).as_str())
    );
    assert_eq!(
        row.media_link.as_deref(),
        Some(format!("{}/media/R3", mock_server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_detail_view_leaves_listing_until_restored() {
    let mock_server = start_listing().await;
    let mut session = session_for(&mock_server);

    session.go_to(3).await.unwrap();
    let rows = session.rows_of_current_page().await.unwrap();

    let detail = session
        .open_detail(&rows[0])
        .await
        .unwrap()
        .expect("row has detail links");
    assert_eq!(
        detail.media,
        vec![
            "http://cdn.example.com/1.jpg".to_string(),
            "https://cdn.example.com/2.jpg".to_string(),
        ]
    );
    assert_eq!(
        detail.description_markup.as_deref(),
        Some("<p>Solid <b>oak</b> table</p>")
    );

    // the session now shows the edit view
    assert_eq!(session.current_page().await.unwrap(), None);
    assert!(session.rows_of_current_page().await.is_err());
    // the pager of the last listing is still known
    assert_eq!(session.visible_pages().await.unwrap(), vec![1, 2, 3]);

    assert_eq!(session.go_to(3).await.unwrap(), Some(3));
    assert_eq!(session.rows_of_current_page().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let mut session = session_for(&mock_server);
    let result = session.go_to(1).await;

    assert!(matches!(
        result,
        Err(SurfaceError::Status { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_full_sweep_over_http() {
    let mock_server = start_listing().await;
    let dir = TempDir::new().unwrap();

    let settings = ControllerSettings {
        layout: ColumnLayout::default(),
        policy: RetryPolicy::new(3, 3, Duration::ZERO),
        page_delay: Duration::ZERO,
    };

    let mut controller = TraversalController::new(
        session_for(&mock_server),
        Box::new(PlainTextSummarizer::new(200)),
        CheckpointStore::new(
            FsSnapshotStore::new(dir.path()),
            SnapshotNames::new("items"),
            5,
        ),
        settings,
        CancellationToken::new(),
    );

    let report = controller.run(1, None).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.stats.pages_visited, PAGES);
    assert_eq!(report.last_page, Some(PAGES));
    assert_eq!(report.total_records, (PAGES * ROWS_PER_PAGE) as usize);
    // every edit view moved the session off the listing
    assert_eq!(report.stats.drift_corrections, (PAGES * ROWS_PER_PAGE) as usize);

    let store = FsSnapshotStore::new(dir.path());
    let records: Vec<Record> =
        serde_json::from_slice(&store.read("items_all.json").unwrap()).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.identity.as_str()).collect();
    let expected: Vec<String> = (1..=PAGES * ROWS_PER_PAGE).map(|i| format!("R{}", i)).collect();
    assert_eq!(ids, expected);

    let first = &records[0];
    assert_eq!(first.name, "Item R1");
    assert_eq!(first.featured, Featured::Yes);
    assert_eq!(first.status, "Sold");
    assert_eq!(first.description_summary.as_deref(), Some("Solid oak table"));
    assert_eq!(
        first.image_links,
        vec![
            "https://cdn.example.com/1.jpg".to_string(),
            "https://cdn.example.com/2.jpg".to_string(),
        ]
    );

    let chunk: Vec<Record> =
        serde_json::from_slice(&store.read("items_backup_final.json").unwrap()).unwrap();
    assert_eq!(chunk.len(), 4);
    assert_eq!(chunk[0].identity, "R11");

    assert!(store.read("items_backup_5.json").is_ok());
    assert!(store.read("items_backup_10.json").is_ok());

    let csv = String::from_utf8(store.read("items_all.csv").unwrap()).unwrap();
    assert!(csv.starts_with("ID,Name,"));
    assert_eq!(csv.lines().count(), 15);
}
