#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vrepo_api::{AssetType, BoxError};
use vrepo_core::{VirtualRepository, VrConfig};
use vrepo_plugin::{
    Asset, Browser, FnBrowser, FnReader, FnWriter, Reader, Repository, RepositoryProxy,
    StaticProxy, Writer,
};

/// Raw CSV text.
#[derive(Debug, Clone, PartialEq)]
pub struct Csv(pub String);

/// Parsed CSV rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Rows(pub Vec<String>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowCount(pub usize);

pub fn table() -> AssetType {
    AssetType::new("table")
}

pub fn codelist() -> AssetType {
    AssetType::new("codelist")
}

pub fn sdmx_codelist() -> AssetType {
    AssetType::specializing("sdmx/codelist", [codelist()])
}

pub fn config() -> VrConfig {
    VrConfig::default()
        .with_worker_threads(2)
        .with_discovery_idle_timeout(Duration::from_secs(5))
        .with_transfer_timeout(Duration::from_secs(5))
        .with_shutdown_grace(Duration::from_millis(200))
}

/// Browser returning fresh assets with the given (id, name) pairs on every call.
pub fn listing(
    asset_type: AssetType,
    entries: &[(&str, &str)],
    calls: Arc<AtomicUsize>,
    delay: Duration,
) -> impl Browser + 'static {
    let entries: Vec<(String, String)> = entries
        .iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect();
    FnBrowser::new(move |_types: &[AssetType]| {
        calls.fetch_add(1, Ordering::SeqCst);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(entries
            .iter()
            .map(|(id, name)| Asset::new(asset_type.clone(), id.clone(), name.clone()))
            .collect())
    })
}

/// Reader serving the asset name as CSV text.
pub fn csv_reader(asset_type: AssetType, calls: Arc<AtomicUsize>) -> impl Reader + 'static {
    FnReader::new(asset_type, move |asset: &Asset| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Csv(format!("id,name\n{},{}", asset.id(), asset.name())))
    })
}

/// Repository of `asset_type` listing `entries`, readable as CSV.
pub fn repository(name: &str, asset_type: AssetType, entries: &[(&str, &str)]) -> Repository {
    delayed_repository(name, asset_type, entries, Duration::ZERO)
}

pub fn delayed_repository(
    name: &str,
    asset_type: AssetType,
    entries: &[(&str, &str)],
    delay: Duration,
) -> Repository {
    let proxy = StaticProxy::new()
        .with_browser(listing(
            asset_type.clone(),
            entries,
            Arc::new(AtomicUsize::new(0)),
            delay,
        ))
        .with_reader(csv_reader(asset_type, Arc::new(AtomicUsize::new(0))));
    Repository::new(name, proxy).unwrap()
}

pub fn failing_repository(name: &str, asset_type: AssetType) -> Repository {
    let proxy = StaticProxy::new()
        .with_browser(FnBrowser::new(|_| Err::<Vec<Asset>, BoxError>("service unavailable".into())))
        .with_reader(csv_reader(asset_type, Arc::new(AtomicUsize::new(0))));
    Repository::new(name, proxy).unwrap()
}

/// A browser that blocks until released (or for at most ten seconds).
pub struct GatedBrowser {
    gate: Mutex<Receiver<()>>,
    asset_type: AssetType,
}

impl GatedBrowser {
    pub fn new(asset_type: AssetType) -> (Self, Sender<()>) {
        let (tx, rx) = channel();
        (
            Self {
                gate: Mutex::new(rx),
                asset_type,
            },
            tx,
        )
    }
}

impl Browser for GatedBrowser {
    fn discover(&self, _types: &[AssetType]) -> Result<Vec<Asset>, BoxError> {
        let gate = self.gate.lock().map_err(|_| "gate poisoned")?;
        let _ = gate.recv_timeout(Duration::from_secs(10));
        Ok(vec![Asset::new(self.asset_type.clone(), "late", "never merged")])
    }
}

/// Writer recording every published row set.
pub fn recording_writer(
    asset_type: AssetType,
    published: Arc<Mutex<Vec<(String, Csv)>>>,
) -> impl Writer + 'static {
    FnWriter::new(asset_type, move |asset: &Asset, csv: Csv| {
        published
            .lock()
            .map_err(|_| "recorder poisoned")?
            .push((asset.id().to_string(), csv));
        Ok(())
    })
}

/// A proxy counting calls to its shutdown hook.
pub struct CountingProxy {
    pub inner: StaticProxy,
    pub shutdowns: Arc<AtomicUsize>,
}

impl RepositoryProxy for CountingProxy {
    fn browser(&self) -> Option<Arc<dyn Browser>> {
        self.inner.browser()
    }

    fn readers(&self) -> Option<Vec<Arc<dyn Reader>>> {
        self.inner.readers()
    }

    fn writers(&self) -> Option<Vec<Arc<dyn Writer>>> {
        self.inner.writers()
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn virtual_repository(repositories: Vec<Repository>) -> VirtualRepository {
    let mut builder = VirtualRepository::builder().with_config(config());
    for repository in repositories {
        builder = builder.with_repository(repository);
    }
    builder.build().unwrap()
}

pub fn named(vr: &VirtualRepository, names: &[&str]) -> Vec<Arc<Repository>> {
    names
        .iter()
        .filter_map(|name| vr.repositories().lookup(name).cloned())
        .collect()
}
