mod common;

use common::*;
use std::sync::atomic::AtomicUsize;
use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use vrepo_core::{DiscoveryObserver, DiscoveryReport, VirtualRepository};
use vrepo_plugin::{Asset, Repository, StaticProxy};

fn fisheries() -> VirtualRepository {
    virtual_repository(vec![
        repository(
            "r1",
            table(),
            &[("t-1", "catches"), ("t-2", "landings"), ("t-3", "effort")],
        ),
        repository("r2", codelist(), &[("cl-1", "species"), ("cl-2", "areas")]),
    ])
}

#[test]
fn test_end_to_end_discovery() {
    let vr = fisheries();

    let news = vr
        .discover([table(), codelist()])
        .over(named(&vr, &["r1", "r2"]))
        .blocking();

    assert_eq!(news, 5);
    assert_eq!(vr.size(), 5);
    assert_eq!(vr.lookup_type(&table()).len(), 3);
    assert_eq!(vr.lookup_type(&codelist()).len(), 2);

    let asset = vr.lookup("t-2").unwrap();
    assert_eq!(asset.name(), "landings");
    assert_eq!(asset.repository().map(|r| r.name()), Some("r1"));

    let partition = vr.lookup_types(&[table(), codelist(), sdmx_codelist()]);
    assert_eq!(partition.len(), 3);
    assert!(partition[&sdmx_codelist()].is_empty());

    vr.shutdown();
}

#[test]
fn test_rediscovery_is_idempotent() {
    let vr = fisheries();

    let first = vr.discover([table(), codelist()]).report_blocking();
    assert_eq!(first.news, 5);
    assert_eq!(first.refreshed, 0);

    let second = vr.discover([table(), codelist()]).report_blocking();
    assert_eq!(second.news, 0);
    assert_eq!(second.refreshed, 5);
    assert_eq!(vr.size(), 5);

    vr.shutdown();
}

#[test]
fn test_news_and_refreshed_partition_received() {
    let vr = virtual_repository(vec![
        // "a" twice within one task: staged once.
        repository("dup", table(), &[("a", "first"), ("a", "second"), ("b", "other")]),
        repository("overlap", table(), &[("b", "overlapping"), ("c", "third")]),
    ]);

    let report = vr.discover([table()]).report_blocking();
    assert_eq!(report.completed, 2);
    assert_eq!(report.received, 4);
    assert_eq!(report.news + report.refreshed, report.received);
    assert_eq!(report.news, 3);
    assert_eq!(vr.lookup("a").map(|a| a.name().to_string()).as_deref(), Some("second"));

    vr.shutdown();
}

#[test]
fn test_lookup_follows_the_lattice() {
    let vr = virtual_repository(vec![repository(
        "sdmx",
        sdmx_codelist(),
        &[("cl-1", "species")],
    )]);

    // Requesting the supertype reaches repositories reading the subtype.
    assert_eq!(vr.discover([codelist()]).blocking(), 1);

    assert_eq!(vr.lookup_type(&codelist()).len(), 1);
    assert_eq!(vr.lookup_type(&sdmx_codelist()).len(), 1);
    assert!(vr.lookup_type(&table()).is_empty());
    assert_eq!(vr.lookup_type(&vrepo_api::AssetType::any()).len(), 1);

    let partition = vr.lookup_types(&[codelist(), sdmx_codelist()]);
    assert!(partition[&codelist()].is_empty());
    assert_eq!(partition[&sdmx_codelist()].len(), 1);

    vr.shutdown();
}

#[test]
fn test_discovery_is_restricted_to_given_repositories() {
    let vr = virtual_repository(vec![
        repository("r1", table(), &[("t-1", "catches")]),
        repository("r2", table(), &[("t-2", "landings")]),
        delayed_repository("r3", table(), &[("t-3", "effort")], Duration::from_millis(50)),
    ]);

    let report = vr
        .discover([table()])
        .over(named(&vr, &["r1"]))
        .timeout(Duration::from_secs(1))
        .report_blocking();

    assert_eq!(report.submitted, 1);
    assert_eq!(report.news, 1);
    let stats = vr.stats();
    assert_eq!(stats.total_assets, 1);
    assert_eq!(stats.by_repository.keys().collect::<Vec<_>>(), vec!["r1"]);

    vr.shutdown();
}

#[test]
fn test_idle_timeout_returns_promptly() {
    let (browser, release) = GatedBrowser::new(table());
    let gated = Repository::new(
        "stuck",
        StaticProxy::new()
            .with_browser(browser)
            .with_reader(csv_reader(table(), Arc::new(AtomicUsize::new(0)))),
    )
    .unwrap();
    let vr = virtual_repository(vec![gated]);

    let started = Instant::now();
    let report = vr
        .discover([table()])
        .timeout(Duration::ZERO)
        .report_blocking();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(report.news, 0);
    assert_eq!(report.submitted, 1);
    assert_eq!(report.abandoned, 1);

    // The abandoned task finishes, but its result is never merged.
    release.send(()).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert!(vr.lookup("late").is_none());

    vr.shutdown();
}

#[test]
fn test_idle_timeout_restarts_on_every_completion() {
    let vr = virtual_repository(vec![
        delayed_repository("early", table(), &[("t-1", "catches")], Duration::from_millis(300)),
        delayed_repository("middle", table(), &[("t-2", "landings")], Duration::from_millis(600)),
        delayed_repository("late", table(), &[("t-3", "effort")], Duration::from_millis(900)),
    ]);

    // Each gap between completions is 300ms, under the idle timeout, even
    // though the round as a whole runs past it.
    let report = vr
        .discover([table()])
        .timeout(Duration::from_millis(450))
        .report_blocking();

    assert_eq!(report.completed, 3);
    assert_eq!(report.abandoned, 0);
    assert_eq!(report.news, 3);
    assert!(report.elapsed > Duration::from_millis(450));
    assert!(vr.lookup("t-3").is_some());

    vr.shutdown();
}

#[test]
fn test_same_id_last_merge_wins() {
    let vr = virtual_repository(vec![
        repository("A", table(), &[("x", "Alpha")]),
        delayed_repository("B", table(), &[("x", "Beta")], Duration::from_millis(300)),
    ]);

    let report = vr.discover([table()]).report_blocking();

    assert_eq!(report.news, 1);
    assert_eq!(report.refreshed, 1);
    assert_eq!(vr.size(), 1);
    let x = vr.lookup("x").unwrap();
    assert_eq!(x.name(), "Beta");
    assert_eq!(x.repository().map(|r| r.name()), Some("B"));

    vr.shutdown();
}

#[test]
fn test_failing_repository_contributes_nothing() {
    let vr = virtual_repository(vec![
        failing_repository("down", table()),
        repository("up", table(), &[("t-1", "catches"), ("t-2", "landings")]),
    ]);

    let report = vr.discover([table()]).report_blocking();
    assert_eq!(report.completed, 2);
    assert_eq!(report.news, 2);
    assert_eq!(report.abandoned, 0);

    vr.shutdown();
}

#[test]
fn test_ineligible_repository_is_skipped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let codelists = Repository::new(
        "codelists",
        StaticProxy::new()
            .with_browser(listing(codelist(), &[("cl-1", "species")], Arc::clone(&calls), Duration::ZERO))
            .with_reader(csv_reader(codelist(), Arc::new(AtomicUsize::new(0)))),
    )
    .unwrap();
    let vr = virtual_repository(vec![
        codelists,
        repository("tables", table(), &[("t-1", "catches")]),
    ]);

    let report = vr.discover([table()]).report_blocking();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.submitted, 1);
    assert_eq!(report.news, 1);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);

    // No type at all means every type.
    assert_eq!(vr.discover([]).blocking(), 1);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    vr.shutdown();
}

struct Recorder {
    seen: Mutex<Vec<(String, usize)>>,
    done: Mutex<std::sync::mpsc::Sender<DiscoveryReport>>,
}

impl DiscoveryObserver for Recorder {
    fn on_next(&self, repository: &str, assets: &[Arc<Asset>]) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((repository.to_string(), assets.len()));
        }
    }

    fn on_completed(&self, report: &DiscoveryReport) {
        if let Ok(done) = self.done.lock() {
            let _ = done.send(report.clone());
        }
    }
}

#[test]
fn test_observer_is_notified_per_task_and_once_at_the_end() {
    let vr = fisheries();
    let (tx, rx) = channel();
    let recorder = Arc::new(Recorder {
        seen: Mutex::new(Vec::new()),
        done: Mutex::new(tx),
    });

    let _handle = vr
        .discover([table(), codelist()])
        .notifying(Arc::clone(&recorder) as Arc<dyn DiscoveryObserver>);

    let report = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(report.news, 5);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    let mut seen = recorder.seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec![("r1".to_string(), 3), ("r2".to_string(), 2)]);

    vr.shutdown();
}

#[tokio::test]
async fn test_discovery_from_async_context() {
    let vr = fisheries();

    let handle = vr.discover([table()]).without_blocking();
    assert_eq!(handle.await.unwrap(), 3);

    assert_eq!(vr.discover([table(), codelist()]).run().await, 2);

    let report = vr.discover([codelist()]).report().await;
    assert_eq!(report.refreshed, 2);
    assert_eq!(vr.size(), 5);
}

#[test]
fn test_report_serializes() {
    let vr = fisheries();
    let report = vr.discover([table()]).report_blocking();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["news"], 3);
    assert_eq!(json["submitted"], 1);
    assert!(json["elapsed"].is_u64());

    vr.shutdown();
}
