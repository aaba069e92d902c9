//! Integration tests for the crawler
//!
//! Most tests drive the coordinator over a deterministic in-memory web. The
//! last one runs the default HTTP and HTML collaborators against a wiremock
//! server end-to-end.

mod fixtures;

use fixtures::{addr, config, coordinator, settings, FixtureWeb};
use linkweave::config::CrawlerConfig;
use linkweave::crawler::{run_crawl, ProcessResult, ResumeFrom, Worker, WorkerPolicy};
use linkweave::output::{export_sqlite, StopReason};
use linkweave::state::FailureKind;
use linkweave::{CheckpointManager, CrawlSession};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scenario() -> Arc<FixtureWeb> {
    Arc::new(FixtureWeb::new(&[
        ("A", &["B", "C"]),
        ("B", &["C"]),
        ("C", &[]),
    ]))
}

#[tokio::test]
async fn test_scenario_skips_dead_ends_by_default() {
    let dir = TempDir::new().unwrap();
    let web = scenario();
    let config = config("A", settings(3, 1), dir.path());
    let mut coordinator = coordinator(&web, &config, &ResumeFrom::Fresh);

    let report = coordinator.run().await.unwrap();
    let snapshot = coordinator.session().snapshot();

    assert_eq!(snapshot.id_registry.get(&addr("A")), Some(&0));
    assert_eq!(snapshot.id_registry.get(&addr("B")), Some(&1));
    assert_eq!(snapshot.id_registry.get(&addr("C")), Some(&2));
    assert_eq!(snapshot.next_id, 3);

    let mut expected = BTreeMap::new();
    expected.insert(0, vec![1, 2]);
    expected.insert(1, vec![2]);
    assert_eq!(snapshot.graph, expected);
    assert_eq!(snapshot.nodes.keys().copied().collect::<Vec<_>>(), vec![0, 1]);

    assert!(snapshot.frontier.is_empty());
    assert!(snapshot.visited.contains(&addr("C")));
    assert_eq!(report.stop_reason, StopReason::FrontierExhausted);
    assert_eq!(report.nodes_fetched, 2);
    assert_eq!(report.errors, 0);
}

#[tokio::test]
async fn test_scenario_records_dead_ends_when_enabled() {
    let dir = TempDir::new().unwrap();
    let web = scenario();
    let crawler = CrawlerConfig {
        record_dead_ends: true,
        ..settings(3, 1)
    };
    let config = config("A", crawler, dir.path());
    let mut coordinator = coordinator(&web, &config, &ResumeFrom::Fresh);

    let report = coordinator.run().await.unwrap();
    let snapshot = coordinator.session().snapshot();

    let mut expected = BTreeMap::new();
    expected.insert(0, vec![1, 2]);
    expected.insert(1, vec![2]);
    expected.insert(2, vec![]);
    assert_eq!(snapshot.graph, expected);
    assert_eq!(snapshot.nodes.len(), 3);
    assert!(snapshot.frontier.is_empty());
    assert_eq!(report.stop_reason, StopReason::NodeLimit);
}

/// Every page links to every other page
fn clique(size: usize) -> Vec<(String, Vec<String>)> {
    let names: Vec<String> = (0..size).map(|i| format!("p{}", i)).collect();
    names
        .iter()
        .map(|name| {
            let links = names.iter().filter(|n| *n != name).cloned().collect();
            (name.clone(), links)
        })
        .collect()
}

fn web_from(pages: &[(String, Vec<String>)]) -> FixtureWeb {
    let mut web = FixtureWeb::default();
    for (name, links) in pages {
        let links: Vec<&str> = links.iter().map(String::as_str).collect();
        web.add_page(name, "{}", &links);
    }
    web
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_address_fetched_at_most_once_under_concurrency() {
    let dir = TempDir::new().unwrap();
    let web = Arc::new(web_from(&clique(30)).with_delay(Duration::from_millis(2)));
    let config = config("p0", settings(1000, 8), dir.path());
    let mut coordinator = coordinator(&web, &config, &ResumeFrom::Fresh);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.nodes_fetched, 30);
    assert_eq!(report.registered_ids, 30);
    assert_eq!(web.total_fetches(), 30);
    assert!(web.fetch_counts().values().all(|&count| count == 1));

    // Ids are a bijection onto 0..30
    let snapshot = coordinator.session().snapshot();
    let ids: HashSet<u64> = snapshot.id_registry.values().copied().collect();
    assert_eq!(ids, (0..30).collect());
    assert!(snapshot.graph.values().all(|targets| targets.len() == 29));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_process_of_same_address() {
    let web = Arc::new(FixtureWeb::new(&[("A", &["B"])]).with_delay(Duration::from_millis(5)));
    let session = Arc::new(CrawlSession::fresh(addr("A")));
    let worker = Worker::new(
        session.clone(),
        fixtures::collaborators(&web),
        WorkerPolicy::default(),
    );

    let mut handles = Vec::new();
    for _ in 0..16 {
        let worker = worker.clone();
        handles.push(tokio::spawn(async move { worker.process(&addr("A")).await }));
    }

    let mut fetched = 0;
    for handle in handles {
        match handle.await.unwrap() {
            ProcessResult::Fetched { .. } => fetched += 1,
            ProcessResult::Skipped => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    assert_eq!(fetched, 1);
    assert_eq!(web.fetches_of("A"), 1);
    assert_eq!(session.node_count(), 1);
}

#[tokio::test]
async fn test_stops_at_node_limit_with_many_workers() {
    let dir = TempDir::new().unwrap();
    let web = Arc::new(web_from(&clique(40)));
    let config = config("p0", settings(12, 8), dir.path());
    let mut coordinator = coordinator(&web, &config, &ResumeFrom::Fresh);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::NodeLimit);
    assert_eq!(report.nodes_fetched, 12);
    assert_eq!(web.total_fetches(), 12);
}

#[tokio::test]
async fn test_failures_are_isolated_and_keyed_by_address() {
    let dir = TempDir::new().unwrap();
    let mut web = FixtureWeb::default();
    web.add_page("A", "{}", &["B", "C", "D", "E"]);
    web.add_status("B", 500);
    web.add_page("C", "-", &["E"]);
    web.add_page("D", "{}", &["A"]);
    // E is missing entirely
    let web = Arc::new(web);

    let config = config("A", settings(100, 2), dir.path());
    let mut coordinator = coordinator(&web, &config, &ResumeFrom::Fresh);
    let report = coordinator.run().await.unwrap();
    let session = coordinator.session();

    assert_eq!(report.nodes_fetched, 2);
    assert_eq!(report.errors, 3);

    let b = session.errors().get(&addr("B")).unwrap();
    assert_eq!(b.kind, FailureKind::Fetch);
    assert!(b.message.contains("500"));
    assert_eq!(
        session.errors().get(&addr("C")).unwrap().kind,
        FailureKind::Extract
    );
    assert!(session.errors().get(&addr("E")).is_some());
    assert!(session.errors().get("url").is_none());

    // Failed addresses keep their ids as link targets but own no node
    let b_id = session.registry().get(&addr("B")).unwrap();
    assert!(!session.nodes().contains(b_id));
}

#[tokio::test]
async fn test_final_checkpoint_matches_session() {
    let dir = TempDir::new().unwrap();
    let web = scenario();
    let config = config("A", settings(3, 2), dir.path());
    let mut coordinator = coordinator(&web, &config, &ResumeFrom::Fresh);

    let report = coordinator.run().await.unwrap();
    let handle = report.final_checkpoint.unwrap();

    let manager = CheckpointManager::new(dir.path(), linkweave::url::AddressScheme::http()).unwrap();
    let loaded = manager.load(&handle).unwrap();
    assert_eq!(loaded, coordinator.session().snapshot());
}

#[tokio::test]
async fn test_wiremock_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    let page = |title: &str, links: &[&str]| {
        let anchors: String = links
            .iter()
            .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
            .collect();
        format!(
            r#"<html><head><title>{t}</title>
            <script type="application/ld+json">{{"name":"{t}"}}</script>
            </head><body>{anchors}</body></html>"#,
            t = title,
            anchors = anchors
        )
    };

    let routes = [
        ("/wiki/A", page("A", &["/wiki/B", "/wiki/C", "/wiki/Talk:A", "/about"])),
        ("/wiki/B", page("B", &["/wiki/C#History", "/wiki/A"])),
        ("/wiki/C", page("C", &[])),
    ];
    for (route, body) in routes {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("content-type", "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = linkweave::Config::default();
    config.crawler.seed_url = format!("{}/wiki/A", base);
    config.crawler.worker_count = 2;
    config.checkpoint.directory = dir.path().join("checkpoints").display().to_string();
    config.scope.link_prefix = Some(format!("{}/wiki/", base));
    config.scope.skip_namespaced = true;

    let report = run_crawl(&config, &ResumeFrom::Fresh).await.unwrap();
    assert_eq!(report.nodes_fetched, 2);
    assert_eq!(report.registered_ids, 3);
    assert_eq!(report.stop_reason, StopReason::FrontierExhausted);

    let manager = CheckpointManager::new(&config.checkpoint.directory, linkweave::url::AddressScheme::http())
        .unwrap();
    let (_, snapshot) = manager.load_latest().unwrap();

    let a = format!("{}/wiki/A", base);
    let b = format!("{}/wiki/B", base);
    let c = format!("{}/wiki/C", base);
    assert_eq!(snapshot.id_registry.get(&a), Some(&0));
    assert_eq!(snapshot.graph.get(&0), Some(&vec![1, 2]));
    assert_eq!(snapshot.graph.get(&1), Some(&vec![2, 0]));
    assert_eq!(snapshot.id_registry.get(&b), Some(&1));
    assert_eq!(snapshot.id_registry.get(&c), Some(&2));
    assert_eq!(
        snapshot.nodes.get(&0).unwrap().payload_str(),
        Some(r#"{"name":"A"}"#)
    );

    let db = dir.path().join("graph.db");
    let summary = export_sqlite(&snapshot, &db).unwrap();
    assert_eq!(summary.nodes, 3);
    assert_eq!(summary.edges, 4);
}
