//! Integration tests for the crawler
//!
//! These tests use wiremock to serve small sites and run full crawl sessions
//! end-to-end against a temporary output directory.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_gleaner::config::Config;
use sumi_gleaner::crawler::{asset_file_name, AssetEvent, AssetKind, AssetOutcome};
use sumi_gleaner::url::url_key;
use sumi_gleaner::{CrawlEngine, CrawlState, GleanError, SessionRegistry};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing under `root`
fn create_test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.output.root_dir = root.display().to_string();
    config.crawler.pause_poll_interval_ms = 20;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.contact_url = "https://example.com/contact".to_string();
    config
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

async fn mount_page_once(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_never(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html_page("x", ""), "text/html"))
        .expect(0)
        .mount(server)
        .await;
}

/// Collects `on_log` lines for later assertions
fn log_sink() -> (Arc<Mutex<Vec<String>>>, impl Fn(String) + Send + Sync) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    (lines, move |line: String| sink.lock().unwrap().push(line))
}

fn content_dir(root: &Path, session: &str) -> PathBuf {
    root.join(session).join("content")
}

/// Same server, but addressed by a host name that is out of the seed's scope
fn other_host(uri: &str) -> String {
    uri.replace("127.0.0.1", "localhost")
}

#[tokio::test]
async fn test_depth_one_stays_on_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page_once(
        &server,
        "/",
        html_page(
            "Home",
            r#"<a href="/a">A</a> <a href="http://other.invalid/x">Elsewhere</a>"#,
        ),
    )
    .await;
    mount_page_once(&server, "/a", html_page("A", r#"<a href="/b">B</a>"#)).await;
    mount_never(&server, "/b").await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();

    let summary = engine
        .start("s1", &base, 1, |_| {}, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.state, CrawlState::Completed);
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.pages_saved, 2);
    assert_eq!(engine.state(), CrawlState::Completed);
    assert_eq!(
        std::fs::read_dir(content_dir(dir.path(), "s1")).unwrap().count(),
        2
    );
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seed() {
    let server = MockServer::start().await;

    mount_page_once(&server, "/", html_page("Home", r#"<a href="/a">A</a>"#)).await;
    mount_never(&server, "/a").await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();

    let summary = engine
        .start("s1", &server.uri(), 0, |_| {}, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.pages_visited, 1);
}

#[tokio::test]
async fn test_page_linked_repeatedly_fetched_once() {
    let server = MockServer::start().await;

    mount_page_once(
        &server,
        "/",
        html_page(
            "Home",
            r#"<a href="/a">A</a> <a href="/a/">A again</a> <a href="/b?ref=home">B</a>"#,
        ),
    )
    .await;
    mount_page_once(&server, "/a", html_page("A", r#"<a href="/b#top">B</a>"#)).await;
    mount_page_once(&server, "/b", html_page("B", r#"<a href="/">Home</a>"#)).await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();

    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&progress);

    let summary = engine
        .start(
            "s1",
            &server.uri(),
            3,
            |_| {},
            move |count| seen.lock().unwrap().push(count),
        )
        .await
        .unwrap();

    assert_eq!(summary.pages_visited, 3);
    assert_eq!(*progress.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_output_files_and_content_format() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        "<html><head><title>Welcome</title>\
         <meta name=\"description\" content=\"The front page\"></head>\
         <body><nav><a href=\"/menu\">Menu</a></nav>\
         <h1>Hello</h1><p>Some <strong>bold</strong> text</p>\
         <img src=\"/logo.png\"><a href=\"/report.pdf\">Report</a>\
         <script>var x = 1;</script></body></html>"
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/png"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();

    let summary = engine
        .start("site", &base, 0, |_| {}, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.images_downloaded, 1);
    assert_eq!(summary.documents_downloaded, 1);

    let session_dir = dir.path().join("site");
    let content_file = session_dir
        .join("content")
        .join(format!("{}.md", url_key(&base)));
    let content = std::fs::read_to_string(&content_file).unwrap();

    assert!(content.starts_with("# Welcome\n\n**Description:** The front page\n\n**URL:** "));
    assert!(content.contains("\n\n---\n\n"));
    assert!(content.contains("# Hello"));
    assert!(content.contains("**bold**"));
    assert!(!content.contains("Menu"));
    assert!(!content.contains("var x"));

    let image = session_dir
        .join("images")
        .join(asset_file_name(&format!("{}/logo.png", base), AssetKind::Image));
    assert_eq!(std::fs::read(image).unwrap(), vec![1u8, 2, 3]);

    let document = session_dir.join("documents").join(asset_file_name(
        &format!("{}/report.pdf", base),
        AssetKind::Document,
    ));
    assert!(document.exists());
}

#[tokio::test]
async fn test_nav_links_are_followed() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html_page("Home", r#"<nav><a href="/menu">Menu</a></nav><p>Body</p>"#),
    )
    .await;
    mount_page_once(&server, "/menu", html_page("Menu", "<p>Menu page</p>")).await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();

    let summary = engine
        .start("s1", &server.uri(), 1, |_| {}, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.pages_visited, 2);
}

#[tokio::test]
async fn test_external_document_downloaded_but_external_page_not_followed() {
    let server = MockServer::start().await;
    let external = other_host(&server.uri());

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &format!(
                r#"<a href="{0}/paper.pdf">Paper</a> <a href="{0}/page">Page</a>"#,
                external
            ),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"pdf".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;
    mount_never(&server, "/page").await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();

    let summary = engine
        .start("s1", &server.uri(), 2, |_| {}, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.documents_downloaded, 1);
}

#[tokio::test]
async fn test_failed_pages_do_not_abort_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            r#"<a href="/broken">Broken</a> <a href="/data.json">Data</a> <a href="/good">Good</a>"#,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;
    mount_page(&server, "/good", html_page("Good", "<p>ok</p>")).await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();
    let (logs, on_log) = log_sink();

    let summary = engine
        .start("s1", &server.uri(), 1, on_log, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.state, CrawlState::Completed);
    assert_eq!(summary.pages_visited, 4);
    assert_eq!(summary.pages_saved, 2);
    assert_eq!(summary.page_failures, 2);
    assert!(logs
        .lock()
        .unwrap()
        .iter()
        .any(|line| line.contains("Failed to fetch") && line.contains("/broken")));
}

#[tokio::test]
async fn test_stop_from_progress_callback() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html_page("Home", r#"<img src="/pic.png"><a href="/a">A</a> <a href="/b">B</a>"#),
    )
    .await;
    mount_never(&server, "/pic.png").await;
    mount_never(&server, "/a").await;
    mount_never(&server, "/b").await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();
    let control = engine.control();
    let (logs, on_log) = log_sink();

    let summary = engine
        .start("s1", &server.uri(), 2, on_log, move |count| {
            if count == 1 {
                control.stop();
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.state, CrawlState::Stopped);
    assert_eq!(engine.state(), CrawlState::Stopped);
    assert_eq!(summary.pages_visited, 1);

    let logs = logs.lock().unwrap();
    assert!(logs.iter().any(|line| line.contains("stopped")));
    assert!(!logs.iter().any(|line| line.contains("complete")));
}

#[tokio::test]
async fn test_pause_then_resume_completes() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", r#"<a href="/a">A</a>"#)).await;
    mount_page_once(&server, "/a", html_page("A", "")).await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();
    let control = engine.control();
    let observed = Arc::new(Mutex::new(None));
    let observed_in_task = Arc::clone(&observed);

    let summary = engine
        .start("s1", &server.uri(), 1, |_| {}, move |count| {
            if count == 1 {
                control.pause();
                let control = control.clone();
                let observed = Arc::clone(&observed_in_task);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(150)).await;
                    *observed.lock().unwrap() = Some(control.state());
                    control.resume();
                });
            }
        })
        .await
        .unwrap();

    assert_eq!(*observed.lock().unwrap(), Some(CrawlState::Paused));
    assert_eq!(summary.state, CrawlState::Completed);
    assert_eq!(summary.pages_visited, 2);
}

#[tokio::test]
async fn test_stop_while_paused() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", r#"<a href="/a">A</a>"#)).await;
    mount_never(&server, "/a").await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();
    let control = engine.control();

    let summary = engine
        .start("s1", &server.uri(), 1, |_| {}, move |count| {
            if count == 1 {
                control.pause();
                let control = control.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    control.stop();
                });
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.state, CrawlState::Stopped);
    assert_eq!(summary.pages_visited, 1);
}

#[tokio::test]
async fn test_registry_stops_session_by_id() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", r#"<a href="/a">A</a>"#)).await;
    mount_never(&server, "/a").await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();
    let registry = Arc::new(SessionRegistry::new());
    registry.register("job-1", &engine);
    assert!(!registry.stop("job-2"));

    let handle = Arc::clone(&registry);
    let summary = engine
        .start("job-1", &server.uri(), 1, |_| {}, move |count| {
            if count == 1 {
                assert!(handle.stop("job-1"));
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.state, CrawlState::Stopped);
    assert_eq!(registry.state("job-1"), Some(CrawlState::Stopped));
    assert!(registry.unregister("job-1"));
}

#[tokio::test]
async fn test_partial_success_when_content_write_fails() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", r#"<a href="/a">A</a>"#)).await;
    mount_page(&server, "/a", html_page("A", "")).await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();
    let content = content_dir(dir.path(), "s1");
    let (logs, on_log) = log_sink();

    let summary = engine
        .start("s1", &server.uri(), 1, on_log, move |count| {
            if count == 2 {
                std::fs::remove_dir_all(&content).unwrap();
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.state, CrawlState::Completed);
    assert_eq!(summary.pages_saved, 1);
    assert!(logs
        .lock()
        .unwrap()
        .iter()
        .any(|line| line.contains("partial")));
}

#[tokio::test]
async fn test_session_failure_without_pages_is_start_failed() {
    let server = MockServer::start().await;
    mount_never(&server, "/").await;

    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let engine = CrawlEngine::new(&create_test_config(&blocker)).unwrap();
    let result = engine.start("s1", &server.uri(), 1, |_| {}, |_| {}).await;

    match result {
        Err(GleanError::StartFailed { session, .. }) => assert_eq!(session, "s1"),
        other => panic!("expected StartFailed, got {:?}", other.map(|s| s.state)),
    }
    assert_eq!(engine.state(), CrawlState::Failed);
}

#[tokio::test]
async fn test_page_limit_ends_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            r#"<a href="/a">A</a> <a href="/b">B</a> <a href="/c">C</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/a", html_page("A", "")).await;
    mount_never(&server, "/b").await;
    mount_never(&server, "/c").await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.max_pages = Some(2);
    let engine = CrawlEngine::new(&config).unwrap();
    let (logs, on_log) = log_sink();

    let summary = engine
        .start("s1", &server.uri(), 1, on_log, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.state, CrawlState::Completed);
    assert_eq!(summary.pages_visited, 2);
    assert!(logs
        .lock()
        .unwrap()
        .iter()
        .any(|line| line.contains("Page limit of 2")));
}

#[tokio::test]
async fn test_page_limit_not_reported_for_duplicate_links() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html_page("Home", r#"<a href="/a">A</a> <a href="/a/">A again</a>"#),
    )
    .await;
    mount_page_once(&server, "/a", html_page("A", "")).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.max_pages = Some(2);
    let engine = CrawlEngine::new(&config).unwrap();
    let (logs, on_log) = log_sink();

    let summary = engine
        .start("s1", &server.uri(), 1, on_log, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.state, CrawlState::Completed);
    assert_eq!(summary.pages_visited, 2);
    assert!(!logs
        .lock()
        .unwrap()
        .iter()
        .any(|line| line.contains("Page limit")));
}

#[tokio::test]
async fn test_asset_hook_sees_failed_download() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", r#"<img src="/missing.png">"#)).await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let events: Arc<Mutex<Vec<AssetEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let engine = CrawlEngine::new(&create_test_config(dir.path()))
        .unwrap()
        .with_asset_hook(Arc::new(move |event: &AssetEvent| {
            sink.lock().unwrap().push(event.clone())
        }));

    let summary = engine
        .start("s1", &server.uri(), 0, |_| {}, |_| {})
        .await
        .unwrap();

    assert_eq!(summary.pages_saved, 1);
    assert_eq!(summary.asset_failures, 1);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, AssetKind::Image);
    assert_eq!(
        events[0].outcome,
        AssetOutcome::Failed {
            reason: "HTTP 404".to_string()
        }
    );
}

#[tokio::test]
async fn test_rerun_resets_session_and_reuses_assets() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", r#"<img src="/logo.png"><a href="/a">A</a>"#))
        .await;
    mount_page(&server, "/a", html_page("A", "")).await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9u8; 4], "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = CrawlEngine::new(&create_test_config(dir.path())).unwrap();

    let first = engine
        .start("s1", &server.uri(), 1, |_| {}, |_| {})
        .await
        .unwrap();
    let second = engine
        .start("s1", &server.uri(), 1, |_| {}, |_| {})
        .await
        .unwrap();

    assert_eq!(first.pages_visited, 2);
    assert_eq!(second.pages_visited, 2);
    assert_eq!(first.images_downloaded, 1);
    assert_eq!(second.images_downloaded, 0);
    assert_eq!(second.assets_present, 1);
    assert_eq!(
        std::fs::read_dir(content_dir(dir.path(), "s1")).unwrap().count(),
        2
    );
}
