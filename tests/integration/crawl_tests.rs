//! Integration tests for the crawler
//!
//! The first group uses wiremock to create mock HTTP servers and test the full
//! crawl cycle end-to-end through the reqwest fetcher; wiremock's call-count
//! expectations check that each URL is requested exactly once. The second group
//! crawls an in-memory link graph to exercise the worker pool: exactly-once
//! fetching under contention, termination, pause/resume and stop.

use async_trait::async_trait;
use crawlscope::config::{Config, ScopeConfig, SpiderConfig, UserAgentConfig};
use crawlscope::crawler::{CrawlStatus, Crawler, Fetcher};
use crawlscope::extract::DefaultExtractor;
use crawlscope::resource::{Resource, ResponseMeta};
use crawlscope::{CrawlTask, FetchError, ParameterHandlingMode, RunState};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from the given seed
fn create_test_config(seed: &str) -> Config {
    Config {
        spider: SpiderConfig {
            max_depth: 5,
            worker_count: 4,
            request_timeout_secs: 5,
            parse_robots_txt: false,
            parse_sitemap_xml: false,
            ..SpiderConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        scope: ScopeConfig {
            seeds: vec![seed.to_string()],
            always_in_scope: vec![],
            skip_urls: vec![],
        },
    }
}

/// Runs a crawl to completion, collecting every streamed task
async fn run_to_completion(crawler: &Crawler) -> (Vec<CrawlTask>, CrawlStatus) {
    let mut handle = crawler.start().await.expect("Failed to start crawl");
    let mut tasks = Vec::new();
    while let Some(task) = handle.next_task().await {
        tasks.push(task);
    }
    let status = handle.wait().await.expect("Crawl failed");
    (tasks, status)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body, "text/html")
}

fn urls(tasks: &[CrawlTask]) -> HashSet<String> {
    tasks.iter().map(|task| task.url.clone()).collect()
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Mock index page with one absolute and one relative link
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><body>
            <a href="{}/page1">Page 1</a>
            <a href="page2">Page 2</a>
            </body></html>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    // page1 links back home and to page2
    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(
            r#"<html><body><a href="/">Home</a><a href="/page2#section">2</a></body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html("<html><body>Content 2</body></html>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url));
    let crawler = Crawler::from_config(&config).expect("Failed to create crawler");
    let (tasks, status) = run_to_completion(&crawler).await;

    let expected: HashSet<String> = ["/", "/page1", "/page2"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();
    assert_eq!(urls(&tasks), expected);
    assert_eq!(status.fetched, 3);
    assert_eq!(status.errors, 0);
    assert_eq!(status.state, RunState::Stopped);
}

#[tokio::test]
async fn test_redirect_location_is_crawled() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/old">old</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<p>moved here</p>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url));
    let crawler = Crawler::from_config(&config).unwrap();
    let (tasks, _) = run_to_completion(&crawler).await;

    let new = tasks
        .iter()
        .find(|task| task.url == format!("{}/new", base_url))
        .expect("redirect target not discovered");
    assert_eq!(new.parent.as_deref(), Some(format!("{}/old", base_url).as_str()));
    assert_eq!(new.depth, 2);
}

#[tokio::test]
async fn test_robots_and_sitemap_seed_discovery() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>nothing linked</p>".to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("User-agent: *\nDisallow: /admin/\n", "text/plain"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(format!(
                    r#"<?xml version="1.0"?><urlset><url><loc>{}/from-sitemap</loc></url></urlset>"#,
                    base_url
                ), "application/xml"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/"))
        .respond_with(html("<p>admin</p>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/from-sitemap"))
        .respond_with(html("<p>listed</p>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.spider.parse_robots_txt = true;
    config.spider.parse_sitemap_xml = true;

    let crawler = Crawler::from_config(&config).unwrap();
    let (tasks, status) = run_to_completion(&crawler).await;

    let found = urls(&tasks);
    assert!(found.contains(&format!("{}/admin/", base_url)));
    assert!(found.contains(&format!("{}/from-sitemap", base_url)));
    assert_eq!(status.fetched, 5);
}

#[tokio::test]
async fn test_binary_responses_not_mined() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/blob.bin">blob</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blob.bin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/secret">looks like a link</a>"#, "application/octet-stream"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/secret"))
        .respond_with(html(String::new()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url));
    let crawler = Crawler::from_config(&config).unwrap();
    let (_, status) = run_to_completion(&crawler).await;

    assert_eq!(status.fetched, 2);
    assert_eq!(status.filtered, 1);
}

#[tokio::test]
async fn test_skip_patterns_and_scope() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/app"))
        .respond_with(html(
            r#"<a href="app/logout">out</a><a href="app/home">home</a><a href="/outside">x</a>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/app/home"))
        .respond_with(html(String::new()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/app/logout"))
        .respond_with(html(String::new()))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/outside"))
        .respond_with(html(String::new()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/app", base_url));
    config.scope.skip_urls = vec!["logout".to_string()];

    let crawler = Crawler::from_config(&config).unwrap();
    let (_, status) = run_to_completion(&crawler).await;

    assert_eq!(status.excluded, 1);
    assert_eq!(status.out_of_scope, 1);
    assert_eq!(status.fetched, 2);
}

#[tokio::test]
async fn test_ignore_value_collapses_query_variants() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/search?q=1">1</a><a href="/search?q=2">2</a><a href="/search?q=3&q=4">3</a>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    // The first variant is requested as written; the others share its identity
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "1"))
        .respond_with(html(String::new()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(String::new()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", base_url));
    config.spider.parameter_handling = ParameterHandlingMode::IgnoreValue;

    let crawler = Crawler::from_config(&config).unwrap();
    let (tasks, status) = run_to_completion(&crawler).await;

    let search = tasks
        .iter()
        .find(|task| task.url == format!("{}/search?q", base_url))
        .expect("query variants not discovered");
    assert_eq!(search.target, format!("{}/search?q=1", base_url));
    assert_eq!(status.fetched, 2);
    assert_eq!(status.errors, 0);
}

/// Builds a version 2 `.git/index` listing `paths`
fn git_index(paths: &[&str]) -> Vec<u8> {
    let mut data = b"DIRC".to_vec();
    data.extend_from_slice(&2u32.to_be_bytes());
    data.extend_from_slice(&(paths.len() as u32).to_be_bytes());
    for entry in paths {
        let start = data.len();
        data.extend_from_slice(&[0u8; 60]);
        data.extend_from_slice(&(entry.len() as u16).to_be_bytes());
        data.extend_from_slice(entry.as_bytes());
        data.resize(start + ((62 + entry.len() + 8) & !7), 0);
    }
    data
}

#[tokio::test]
async fn test_exposed_git_index_is_mined() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/.git/index">index</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/.git/index"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(git_index(&["config.php.bak", "admin/panel.php"]))
                .insert_header("content-type", "application/octet-stream"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/config.php.bak"))
        .respond_with(ResponseTemplate::new(200).set_body_string("secret"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/panel.php"))
        .respond_with(html(String::new()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url));
    let crawler = Crawler::from_config(&config).unwrap();
    let (tasks, status) = run_to_completion(&crawler).await;

    let found = urls(&tasks);
    assert!(found.contains(&format!("{}/config.php.bak", base_url)));
    assert!(found.contains(&format!("{}/admin/panel.php", base_url)));
    assert_eq!(status.fetched, 4);
}

#[tokio::test]
async fn test_server_errors_are_fetched_not_failed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/broken">b</a><a href="/gone">g</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    // "/gone" is not mounted, wiremock answers 404

    let config = create_test_config(&format!("{}/", base_url));
    let crawler = Crawler::from_config(&config).unwrap();
    let (_, status) = run_to_completion(&crawler).await;

    assert_eq!(status.fetched, 3);
    assert_eq!(status.errors, 0);
}

// ---------------------------------------------------------------------------
// In-memory link graph
// ---------------------------------------------------------------------------

const GRAPH_ROOT: &str = "http://graph.test/";

/// Serves a generated link graph: node 0 is the root, node `i` lives at `/n/i`
struct GraphFetcher {
    nodes: usize,
    edges: fn(usize, usize) -> Vec<usize>,
    delay: Duration,
    counts: Mutex<HashMap<String, usize>>,
}

impl GraphFetcher {
    fn new(nodes: usize, edges: fn(usize, usize) -> Vec<usize>) -> Self {
        Self {
            nodes,
            edges,
            delay: Duration::ZERO,
            counts: Mutex::new(HashMap::new()),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn url(node: usize) -> String {
        if node == 0 {
            GRAPH_ROOT.to_string()
        } else {
            format!("{}n/{}", GRAPH_ROOT, node)
        }
    }

    fn node(url: &str) -> Option<usize> {
        if url == GRAPH_ROOT {
            return Some(0);
        }
        url.strip_prefix(GRAPH_ROOT)?
            .strip_prefix("n/")?
            .parse()
            .ok()
    }

    fn counts(&self) -> HashMap<String, usize> {
        self.counts.lock().unwrap().clone()
    }

    fn total(&self) -> usize {
        self.counts.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for GraphFetcher {
    async fn fetch(&self, url: &str) -> Result<Resource, FetchError> {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let node = Self::node(url)
            .filter(|node| *node < self.nodes)
            .ok_or_else(|| FetchError::Connect {
                url: url.to_string(),
                message: "unknown node".to_string(),
            })?;

        let body: String = (self.edges)(node, self.nodes)
            .into_iter()
            .map(|target| format!(r#"<a href="{}">{}</a>"#, Self::url(target), target))
            .collect();

        Ok(Resource::get(
            url,
            ResponseMeta::new(200, "text/html", body),
        ))
    }
}

fn graph_config(workers: u32) -> Config {
    let mut config = create_test_config(GRAPH_ROOT);
    config.spider.worker_count = workers;
    config.spider.max_depth = 0;
    config
}

fn graph_crawler(config: &Config, fetcher: Arc<GraphFetcher>) -> Crawler {
    Crawler::new(config, fetcher, Arc::new(DefaultExtractor::default())).unwrap()
}

/// Dense graph with many duplicate and back links
fn tangled(node: usize, nodes: usize) -> Vec<usize> {
    vec![
        (node + 1) % nodes,
        (node * 7 + 3) % nodes,
        (node * 13 + 5) % nodes,
        node / 2,
        0,
    ]
}

/// Unbounded chain
fn chain(node: usize, _nodes: usize) -> Vec<usize> {
    vec![node + 1]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_reachable_url_fetched_exactly_once() {
    const NODES: usize = 300;

    for workers in [1, 4, 16] {
        let fetcher = Arc::new(GraphFetcher::new(NODES, tangled));
        let crawler = graph_crawler(&graph_config(workers), fetcher.clone());

        let (tasks, status) = tokio::time::timeout(
            Duration::from_secs(30),
            run_to_completion(&crawler),
        )
        .await
        .expect("crawl did not terminate");

        let counts = fetcher.counts();
        assert_eq!(counts.len(), NODES, "workers = {}", workers);
        assert!(
            counts.values().all(|count| *count == 1),
            "a URL was fetched more than once with {} workers",
            workers
        );

        let expected: HashSet<String> = (0..NODES).map(GraphFetcher::url).collect();
        assert_eq!(urls(&tasks), expected);
        assert_eq!(tasks.len(), NODES);
        assert_eq!(status.fetched, NODES as u64);
        assert_eq!(status.discovered, NODES as u64);
        assert_eq!(status.pending, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_max_depth_bounds_graph() {
    let fetcher = Arc::new(GraphFetcher::new(1_000, chain));
    let mut config = graph_config(4);
    config.spider.max_depth = 3;

    let crawler = graph_crawler(&config, fetcher.clone());
    let (tasks, status) = run_to_completion(&crawler).await;

    assert_eq!(tasks.iter().map(|task| task.depth).max(), Some(3));
    assert_eq!(fetcher.total(), 4);
    assert_eq!(status.depth_limited, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pause_holds_workers_until_resume() {
    let fetcher = Arc::new(GraphFetcher::new(60, tangled).with_delay(Duration::from_millis(5)));
    let crawler = graph_crawler(&graph_config(4), fetcher.clone());

    let mut handle = crawler.start().await.unwrap();
    let controller = handle.controller();

    // Let the crawl get going
    handle.next_task().await.unwrap();
    handle.next_task().await.unwrap();
    assert!(controller.pause());
    assert_eq!(controller.state(), RunState::Paused);

    // In-flight fetches finish, then nothing moves
    tokio::time::sleep(Duration::from_millis(100)).await;
    let before = controller.status().fetched;
    tokio::time::sleep(Duration::from_millis(150)).await;
    let after = controller.status().fetched;
    assert_eq!(before, after);
    assert!(after < 60);

    assert!(controller.resume());
    while handle.next_task().await.is_some() {}
    let status = handle.wait().await.unwrap();

    assert_eq!(status.fetched, 60);
    assert!(fetcher.counts().values().all(|count| *count == 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_ends_run_without_draining() {
    let fetcher = Arc::new(GraphFetcher::new(500, tangled).with_delay(Duration::from_millis(10)));
    let crawler = graph_crawler(&graph_config(2), fetcher.clone());

    let mut handle = crawler.start().await.unwrap();
    let controller = handle.controller();

    handle.next_task().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(controller.stop());
    assert!(!controller.stop());

    let status = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("stop did not end the run")
        .unwrap();

    assert_eq!(status.state, RunState::Stopped);
    assert!(status.fetched < 500);
    assert!(status.pending > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_max_duration_stops_unbounded_crawl() {
    let fetcher = Arc::new(GraphFetcher::new(usize::MAX, chain).with_delay(Duration::from_millis(5)));
    let mut config = graph_config(2);
    config.spider.max_duration_secs = 1;

    let crawler = graph_crawler(&config, fetcher);
    let (_, status) = tokio::time::timeout(Duration::from_secs(10), run_to_completion(&crawler))
        .await
        .expect("time limit did not end the run");

    assert_eq!(status.state, RunState::Stopped);
    assert!(status.fetched > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fetch_errors_do_not_stop_workers() {
    // Every odd node is missing
    fn with_holes(node: usize, nodes: usize) -> Vec<usize> {
        if node == 0 {
            (1..nodes).collect()
        } else {
            Vec::new()
        }
    }

    struct HoleyFetcher(GraphFetcher);

    #[async_trait]
    impl Fetcher for HoleyFetcher {
        async fn fetch(&self, url: &str) -> Result<Resource, FetchError> {
            match GraphFetcher::node(url) {
                Some(node) if node % 2 == 1 => Err(FetchError::Timeout {
                    url: url.to_string(),
                }),
                _ => self.0.fetch(url).await,
            }
        }
    }

    let fetcher = Arc::new(HoleyFetcher(GraphFetcher::new(21, with_holes)));
    let crawler =
        Crawler::new(&graph_config(3), fetcher, Arc::new(DefaultExtractor::default())).unwrap();
    let (tasks, status) = run_to_completion(&crawler).await;

    assert_eq!(tasks.len(), 21);
    assert_eq!(status.errors, 10);
    assert_eq!(status.fetched, 11);
}
