//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full mirror cycle end-to-end.

use comic_mirror::config::Config;
use comic_mirror::crawler::{run_crawl, Coordinator};
use comic_mirror::state::CrawlState;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wraps header and article markup in the site's page skeleton
fn article_page(header: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><meta charset="UTF-8"></head><body>
        <section class="container"><div class="content-wrap"><div class="content">
            <header class="article-header">{}</header>
            <article class="article-content">{}</article>
        </div></div></section></body></html>"#,
        header, content
    )
}

fn main_page(base_url: &str) -> String {
    article_page(
        &format!(
            r#"<h1 class="article-title">示例</h1>
               <ul class="article-meta"><li>分类:漫画</li><li>更新时间:2023-04-01</li></ul>
               <div class="c-img"><img src="{}/cover.jpg"></div>
               <p class="dis">Mirrored in tests.</p>"#,
            base_url
        ),
        r#"<p><img src="/img/1.jpg"></p>
           <div class="article-paging">
               <a class="post-page-numbers" href="page2.html">2</a>
           </div>"#,
    )
}

fn second_page() -> String {
    article_page("", r#"<p><img src="/img/2.jpg"></p>"#)
}

/// Mounts the two-page, two-image entry on the mock server
async fn mount_entry(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/123.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(main_page(&server.uri())))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(second_page()))
        .mount(server)
        .await;

    for image in ["/img/1.jpg", "/img/2.jpg"] {
        Mock::given(method("GET"))
            .and(path(image))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(image.as_bytes().to_vec()))
            .mount(server)
            .await;
    }
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(url: &str, root: &Path) -> Config {
    let mut config = Config::new(url);
    config.output.root_path = root.display().to_string();
    config.fetch.timeout = 5;
    config.fetch.max_retry_times = 0;
    config.fetch.retry_base_delay = 1;
    config
}

/// Paths requested from the server so far, in arrival order
async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.as_ref().display(), e))
}

#[tokio::test]
async fn test_full_mirror_of_one_entry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_entry(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let main_url = format!("{}/123.html", base_url);
    let report = run_crawl(create_test_config(&main_url, dir.path()))
        .await
        .expect("crawl should succeed");

    assert_eq!(report.entry_number, 123);
    assert_eq!(report.title, "示例");
    assert_eq!(report.pages_total, 2);
    assert_eq!(report.images_total, 2);
    assert_eq!(report.images_downloaded, 2);
    assert!(report.is_complete());

    let root = dir.path().join("shili");
    assert_eq!(report.entry_root, root);

    // Metadata file
    let metadata = read(root.join("meta/base"));
    let lines: Vec<&str> = metadata.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "title: 示例");
    assert_eq!(lines[1], format!("url: {}", main_url));
    assert_eq!(lines[2], format!("cover: {}/cover.jpg", base_url));
    assert_eq!(lines[3], "description: Mirrored in tests.");
    assert_eq!(lines[4], "last-modified: 2023-04-01");

    // Page manifest
    let main_manifest = read(root.join("content/main"));
    let lines: Vec<&str> = main_manifest.lines().collect();
    assert_eq!(
        lines,
        vec![
            format!("{} 123.html", root.join("pages/123.html").display()),
            format!("{} page2.html", root.join("pages/page2.html").display()),
        ]
    );

    // Per-page image manifests
    assert_eq!(
        read(root.join("content/123")).trim_end(),
        root.join("images/img/1.jpg").display().to_string()
    );
    assert_eq!(
        read(root.join("content/page2")).trim_end(),
        root.join("images/img/2.jpg").display().to_string()
    );

    // Cached artifacts
    assert_eq!(read(root.join("pages/page2.html")), second_page());
    assert_eq!(read(root.join("images/img/1.jpg")), "/img/1.jpg");
    assert_eq!(read(root.join("images/img/2.jpg")), "/img/2.jpg");
}

#[tokio::test]
async fn test_second_run_makes_no_requests() {
    let mock_server = MockServer::start().await;
    mount_entry(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let main_url = format!("{}/123.html", mock_server.uri());
    run_crawl(create_test_config(&main_url, dir.path()))
        .await
        .unwrap();

    let root = dir.path().join("shili");
    let files = ["meta/base", "content/main", "content/123", "content/page2"];
    let first: Vec<String> = files.iter().map(|f| read(root.join(f))).collect();
    let requests_after_first = requested_paths(&mock_server).await.len();
    assert_eq!(requests_after_first, 4);

    let report = run_crawl(create_test_config(&main_url, dir.path()))
        .await
        .unwrap();

    let new_requests: Vec<String> = requested_paths(&mock_server)
        .await
        .into_iter()
        .skip(requests_after_first)
        .collect();
    assert!(new_requests.is_empty(), "unexpected requests: {:?}", new_requests);

    assert_eq!(report.title, "示例");
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(report.pages_cached, 2);
    assert_eq!(report.images_cached, 2);
    assert_eq!(report.images_downloaded, 0);

    let second: Vec<String> = files.iter().map(|f| read(root.join(f))).collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_zero_byte_artifacts_are_fetched_again() {
    let mock_server = MockServer::start().await;
    mount_entry(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let main_url = format!("{}/123.html", mock_server.uri());
    run_crawl(create_test_config(&main_url, dir.path()))
        .await
        .unwrap();

    let root = dir.path().join("shili");
    std::fs::write(root.join("pages/page2.html"), b"").unwrap();
    std::fs::write(root.join("images/img/2.jpg"), b"").unwrap();
    let requests_after_first = requested_paths(&mock_server).await.len();

    let report = run_crawl(create_test_config(&main_url, dir.path()))
        .await
        .unwrap();

    let mut new_requests: Vec<String> = requested_paths(&mock_server)
        .await
        .into_iter()
        .skip(requests_after_first)
        .collect();
    new_requests.sort();
    assert_eq!(new_requests, vec!["/img/2.jpg", "/page2.html"]);

    assert_eq!(report.cache.repaired, 2);
    assert_eq!(report.images_downloaded, 1);
    assert_eq!(report.images_cached, 1);
    assert_eq!(read(root.join("images/img/2.jpg")), "/img/2.jpg");
    assert_eq!(read(root.join("pages/page2.html")), second_page());
}

#[tokio::test]
async fn test_zero_byte_main_page_is_fetched_again() {
    let mock_server = MockServer::start().await;
    mount_entry(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let main_url = format!("{}/123.html", mock_server.uri());
    run_crawl(create_test_config(&main_url, dir.path()))
        .await
        .unwrap();

    let root = dir.path().join("shili");
    std::fs::write(root.join("pages/123.html"), b"").unwrap();
    let requests_after_first = requested_paths(&mock_server).await.len();

    let report = run_crawl(create_test_config(&main_url, dir.path()))
        .await
        .unwrap();

    let new_requests: Vec<String> = requested_paths(&mock_server)
        .await
        .into_iter()
        .skip(requests_after_first)
        .collect();
    assert_eq!(new_requests, vec!["/123.html".to_string()]);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.cache.repaired, 1);
    assert_eq!(read(root.join("pages/123.html")), main_page(&mock_server.uri()));
}

#[tokio::test]
async fn test_failed_units_do_not_abort_the_crawl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/123.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(main_page(&mock_server.uri())))
        .mount(&mock_server)
        .await;

    // Sub-page and image are missing
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let main_url = format!("{}/123.html", mock_server.uri());
    let report = run_crawl(create_test_config(&main_url, dir.path()))
        .await
        .expect("partial failures should not abort the crawl");

    assert_eq!(report.failed_pages().count(), 1);
    assert_eq!(report.failed_images().count(), 1);
    assert!(report
        .failures
        .iter()
        .any(|f| f.url.ends_with("/page2.html") && f.stage == CrawlState::FetchingPages));

    let root = dir.path().join("shili");
    assert_eq!(read(root.join("content/main")).lines().count(), 2);
    assert!(!root.join("content/page2").exists());
    assert!(!root.join("images/img/1.jpg").exists());
}

#[tokio::test]
async fn test_transient_image_failure_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_entry(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let main_url = format!("{}/123.html", mock_server.uri());
    let mut config = create_test_config(&main_url, dir.path());
    config.fetch.max_retry_times = 2;

    let report = run_crawl(config).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.images_downloaded, 2);
    let image_requests = requested_paths(&mock_server)
        .await
        .into_iter()
        .filter(|p| p == "/img/1.jpg")
        .count();
    assert_eq!(image_requests, 2);
}

#[tokio::test]
async fn test_invalid_entry_url_makes_no_requests() {
    let mock_server = MockServer::start().await;
    mount_entry(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/chapter.html", mock_server.uri()), dir.path());
    let mut coordinator = Coordinator::new(config).unwrap();

    let err = coordinator.run().await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(coordinator.state(), CrawlState::Failed);
    assert!(requested_paths(&mock_server).await.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_main_page_failure_aborts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let main_url = format!("{}/123.html", mock_server.uri());
    let mut coordinator = Coordinator::new(create_test_config(&main_url, dir.path())).unwrap();

    assert!(coordinator.run().await.is_err());
    assert_eq!(coordinator.state(), CrawlState::Failed);
    assert_eq!(requested_paths(&mock_server).await.len(), 1);
}

#[tokio::test]
async fn test_debug_mode_needs_no_network() {
    let dir = TempDir::new().unwrap();
    // Nothing listens on this port
    let mut config = create_test_config("http://127.0.0.1:9/42.html", dir.path());
    config.fetch.debug = true;

    let report = run_crawl(config).await.unwrap();

    assert_eq!(report.entry_number, 42);
    assert!(report.is_complete());
    let root = dir.path().join("lixianshili");
    assert_eq!(read(root.join("meta/base")).lines().count(), 5);
    assert!(root.join("images/canned/001.jpg").is_file());
    assert!(root.join("images/canned/002.jpg").is_file());
}
