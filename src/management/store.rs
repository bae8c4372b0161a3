use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{Res, config, error::Error, types::Provider, warning};

pub const PROVIDER_KEY: &str = "provider";

pub fn verifier_key(provider: Provider) -> String {
    format!("verifier:{}", provider)
}

pub fn started_at_key(provider: Provider) -> String {
    format!("started_at:{}", provider)
}

/// Small key-value store that outlives the redirect to the provider and back.
#[async_trait]
pub trait FlowStore: Send + Sync {
    async fn get(&self, key: &str) -> Res<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Res<()>;
    async fn remove(&self, key: &str) -> Res<()>;
}

#[derive(Debug, Default)]
pub struct MemoryFlowStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryFlowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStore for MemoryFlowStore {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Res<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Res<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Flow state kept as one JSON object on disk.
///
/// Every operation reads the file fresh, so separate processes (`login` and a
/// later `resume`) see each other's writes. A file that no longer parses is
/// an error for reads; writes and removals start over from an empty map so
/// `reset` can always recover.
pub struct FileFlowStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileFlowStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// `<data_local_dir>/pickmytunes/state/flow.json`
    pub fn default_location() -> Self {
        let mut path = config::data_dir();
        path.push("state/flow.json");
        Self::new(path)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_all(&self) -> Res<BTreeMap<String, String>> {
        if !self.path.is_file() {
            return Ok(BTreeMap::new());
        }

        let json = async_fs::read_to_string(&self.path).await?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&json).map_err(|e| {
            Error::Store(format!("Cannot parse {}: {}", self.path.display(), e))
        })
    }

    /// Entries to modify, and whether the file was unreadable and must be
    /// rewritten.
    async fn read_for_update(&self) -> Res<(BTreeMap<String, String>, bool)> {
        match self.read_all().await {
            Ok(entries) => Ok((entries, false)),
            Err(Error::Store(msg)) => {
                warning!("{}. Starting with empty flow state.", msg);
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Res<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json =
            serde_json::to_string_pretty(entries).map_err(|e| Error::Store(e.to_string()))?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl FlowStore for FileFlowStore {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Res<()> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.read_for_update().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Res<()> {
        let _guard = self.lock.lock().await;
        let (mut entries, recovered) = self.read_for_update().await?;
        if entries.remove(key).is_some() || recovered {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}
