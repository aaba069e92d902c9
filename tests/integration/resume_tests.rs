//! Integration tests for checkpoint and resume
//!
//! A crawl that is stopped and resumed must end in the same state as one
//! that ran without interruption.

mod fixtures;

use fixtures::{addr, address_graph, config, coordinator, settings, FixtureWeb};
use linkweave::config::CrawlerConfig;
use linkweave::crawler::ResumeFrom;
use linkweave::output::StopReason;
use linkweave::url::AddressScheme;
use linkweave::CheckpointManager;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A binary tree of pages `n1..=n31`; leaves and every fifth page link back to the root
fn tree_web() -> FixtureWeb {
    let mut web = FixtureWeb::default();
    for i in 1..=31u32 {
        let mut links = Vec::new();
        for child in [2 * i, 2 * i + 1] {
            if child <= 31 {
                links.push(format!("n{}", child));
            }
        }
        if i % 5 == 0 || links.is_empty() {
            links.push("n1".to_string());
        }
        let links: Vec<&str> = links.iter().map(String::as_str).collect();
        web.add_page(&format!("n{}", i), &format!("{{\"n\":{}}}", i), &links);
    }
    web
}

#[tokio::test]
async fn test_resume_matches_uninterrupted_run() {
    // Uninterrupted reference run
    let full_dir = TempDir::new().unwrap();
    let web = Arc::new(tree_web());
    let full_config = config("n1", settings(20, 1), full_dir.path());
    let mut full = coordinator(&web, &full_config, &ResumeFrom::Fresh);
    full.run().await.unwrap();
    let expected = full.session().snapshot();

    // Same crawl stopped at 7 nodes, then resumed up to 20
    let dir = TempDir::new().unwrap();
    let web = Arc::new(tree_web());
    let first_config = config("n1", settings(7, 1), dir.path());
    let mut first = coordinator(&web, &first_config, &ResumeFrom::Fresh);
    let report = first.run().await.unwrap();
    assert_eq!(report.stop_reason, StopReason::NodeLimit);
    assert_eq!(report.nodes_fetched, 7);

    let second_config = config("n1", settings(20, 1), dir.path());
    let mut second = coordinator(&web, &second_config, &ResumeFrom::Latest);
    let report = second.run().await.unwrap();
    assert_eq!(report.nodes_fetched, 20);
    assert_eq!(report.nodes_fetched_this_run, 13);

    let resumed = second.session().snapshot();
    assert_eq!(resumed, expected);

    // Nothing was fetched twice across the two runs
    assert!(web.fetch_counts().values().all(|&count| count == 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_mid_crawl_then_resume_completes_graph() {
    let full_dir = TempDir::new().unwrap();
    let reference = Arc::new(tree_web());
    let full_config = config("n1", settings(1000, 4), full_dir.path());
    let mut full = coordinator(&reference, &full_config, &ResumeFrom::Fresh);
    full.run().await.unwrap();
    let expected = address_graph(&full.session().snapshot());
    assert_eq!(expected.len(), 31);

    let dir = TempDir::new().unwrap();
    let web = Arc::new(tree_web().with_delay(Duration::from_millis(3)));
    let crawl_config = config("n1", settings(1000, 4), dir.path());

    let mut first = coordinator(&web, &crawl_config, &ResumeFrom::Fresh);
    web.shutdown_after(10, first.shutdown_handle());
    let report = first.run().await.unwrap();
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert!(report.nodes_fetched < 31);
    assert!(report.frontier_remaining > 0);

    let mut second = coordinator(&web, &crawl_config, &ResumeFrom::Latest);
    let report = second.run().await.unwrap();
    assert_eq!(report.stop_reason, StopReason::FrontierExhausted);

    let resumed = second.session().snapshot();
    assert_eq!(address_graph(&resumed), expected);
    assert!(resumed.frontier.is_empty());

    // Workers in flight at shutdown finished before the final checkpoint
    assert_eq!(web.total_fetches(), 31);
}

#[tokio::test]
async fn test_resume_falls_back_past_corrupt_checkpoint() {
    let dir = TempDir::new().unwrap();
    let web = Arc::new(tree_web());
    let crawl_config = config(
        "n1",
        CrawlerConfig {
            checkpoint_interval: 3,
            ..settings(9, 1)
        },
        dir.path(),
    );

    let mut first = coordinator(&web, &crawl_config, &ResumeFrom::Fresh);
    first.run().await.unwrap();

    let manager = CheckpointManager::new(dir.path(), AddressScheme::http()).unwrap();
    let handles = manager.list().unwrap();
    // Periodic checkpoints at 3, 6 and 9 nodes, then the final one
    assert_eq!(handles.len(), 4);

    let newest = handles.last().unwrap();
    let text = fs::read_to_string(&newest.path).unwrap();
    fs::write(&newest.path, &text[..text.len() / 2]).unwrap();

    let (handle, snapshot) = manager.load_latest().unwrap();
    assert_eq!(handle.sequence_number, handles[2].sequence_number);
    assert_eq!(snapshot.node_count(), 9);

    // A resumed session writes after the newest file, never over it
    let resume_config = config("n1", settings(11, 1), dir.path());
    let mut second = coordinator(&web, &resume_config, &ResumeFrom::Latest);
    let report = second.run().await.unwrap();
    assert_eq!(report.nodes_fetched, 11);
    assert_eq!(report.nodes_fetched_this_run, 2);
    assert_eq!(
        report.final_checkpoint.unwrap().sequence_number,
        newest.sequence_number + 1
    );

    let n11 = second.session().registry().get(&addr("n11")).unwrap();
    assert!(second.session().nodes().contains(n11));
}

#[tokio::test]
async fn test_explicit_checkpoint_resume() {
    let dir = TempDir::new().unwrap();
    let web = Arc::new(tree_web());
    let crawl_config = config(
        "n1",
        CrawlerConfig {
            checkpoint_interval: 2,
            ..settings(6, 1)
        },
        dir.path(),
    );

    let mut first = coordinator(&web, &crawl_config, &ResumeFrom::Fresh);
    first.run().await.unwrap();

    let manager = CheckpointManager::new(dir.path(), AddressScheme::http()).unwrap();
    let first_checkpoint = manager.list().unwrap()[0].clone();
    let loaded = manager.load(&first_checkpoint).unwrap();
    assert_eq!(loaded.node_count(), 2);

    let mut resumed = coordinator(
        &web,
        &crawl_config,
        &ResumeFrom::Checkpoint(first_checkpoint.path.clone()),
    );
    assert_eq!(resumed.session().node_count(), 2);
    let report = resumed.run().await.unwrap();
    assert_eq!(report.nodes_fetched, 6);
}
