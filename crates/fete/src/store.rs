use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use fete_core::config::{StorageBackend, StorageConfig};
use fete_core::paths::{safe_join, FetePaths};
use fete_protocol::store::{BudgetRecord, SavePayload, StoreReceipt, StoredEvent, TaskRecord};
use fs2::FileExt as _;
use reqwest::header::{HeaderMap, HeaderValue};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Storage collaborator that persists a saved plan.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn save(&self, payload: &SavePayload) -> anyhow::Result<StoreReceipt>;
}

pub fn open_store(config: &StorageConfig, paths: &FetePaths) -> anyhow::Result<Box<dyn EventStore>> {
    match config.backend {
        StorageBackend::File => Ok(Box::new(FileStore::new(paths))),
        StorageBackend::Http => {
            let token = match config.token_env.as_deref() {
                Some(var) => Some(
                    std::env::var(var).map_err(|_| anyhow!("{var} environment variable not set"))?,
                ),
                None => None,
            };
            Ok(Box::new(HttpStore::new(config.url.clone(), token)?))
        }
    }
}

/// Writes one JSON record per event under the events dir.
#[derive(Debug, Clone)]
pub struct FileStore {
    events_dir: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    pub fn new(paths: &FetePaths) -> Self {
        Self {
            events_dir: paths.events_dir.clone(),
            lock_path: paths.lock_path.clone(),
        }
    }

    pub async fn list(&self) -> anyhow::Result<Vec<StoredEvent>> {
        let mut ids = match self.event_ids() {
            Ok(ids) => ids,
            Err(err) if is_not_found(&err) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        ids.sort_unstable();

        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            events.push(self.load(&id.to_string()).await?);
        }
        Ok(events)
    }

    pub async fn load(&self, id: &str) -> anyhow::Result<StoredEvent> {
        let path = self.event_path(id)?;
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(anyhow!("event not found: {}", id.trim()));
            }
            Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
        };
        serde_json::from_str(&data).with_context(|| format!("parse {}", path.display()))
    }

    /// Removes one saved event.
    pub async fn delete(&self, id: &str) -> anyhow::Result<()> {
        let path = self.event_path(id)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(anyhow!("event not found: {}", id.trim()));
        }

        let lock_file = open_lock(&self.lock_path)?;
        lock_file
            .lock_exclusive()
            .with_context(|| format!("lock {}", self.lock_path.display()))?;

        let result = match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(anyhow!("event not found: {}", id.trim()))
            }
            Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
        };

        let _ = lock_file.unlock();
        result?;

        tracing::info!(event_id = %id.trim(), "event deleted");
        Ok(())
    }

    async fn write_next(&self, payload: &SavePayload) -> anyhow::Result<StoredEvent> {
        let next_id = self.event_ids()?.into_iter().max().unwrap_or(0) + 1;

        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("format timestamp")?;

        let event = StoredEvent {
            id: next_id.to_string(),
            created_at,
            event_classification: payload.full_plan.event_classification.clone(),
            selected_options: payload.selected_options.clone(),
            tasks: payload.timeline.iter().map(TaskRecord::from).collect(),
            budget: payload
                .budget_breakdown
                .iter()
                .map(BudgetRecord::from)
                .collect(),
            full_plan: payload.full_plan.clone(),
        };

        let dest = self.event_path(&event.id)?;
        let tmp = dest.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(&event).context("serialize event")?;

        tokio::fs::write(&tmp, &data)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &dest)
            .await
            .with_context(|| format!("rename {} -> {}", tmp.display(), dest.display()))?;

        Ok(event)
    }

    fn event_ids(&self) -> anyhow::Result<Vec<u64>> {
        let entries = std::fs::read_dir(&self.events_dir)
            .with_context(|| format!("read {}", self.events_dir.display()))?;

        let mut ids = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn event_path(&self, id: &str) -> anyhow::Result<PathBuf> {
        let id = id.trim().trim_end_matches(".json");
        safe_join(&self.events_dir, &format!("{id}.json"))
            .map_err(|e| anyhow!("invalid event id {id:?}: {e}"))
    }
}

#[async_trait]
impl EventStore for FileStore {
    async fn save(&self, payload: &SavePayload) -> anyhow::Result<StoreReceipt> {
        tokio::fs::create_dir_all(&self.events_dir)
            .await
            .with_context(|| format!("create events dir: {}", self.events_dir.display()))?;

        let lock_file = open_lock(&self.lock_path)?;
        lock_file
            .lock_exclusive()
            .with_context(|| format!("lock {}", self.lock_path.display()))?;

        let result = self.write_next(payload).await;

        let _ = lock_file.unlock();
        let event = result?;

        tracing::info!(
            event_id = %event.id,
            tasks = event.tasks.len(),
            budget_items = event.budget.len(),
            "event saved"
        );

        Ok(StoreReceipt {
            success: true,
            event_id: Some(event.id),
            tasks_saved: Some(event.tasks.len() as u32),
            budget_items_saved: Some(event.budget.len() as u32),
            error: None,
        })
    }
}

fn open_lock(path: &Path) -> anyhow::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("open lock file: {}", path.display()))
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

/// Posts the payload to a remote endpoint and reads back a `StoreReceipt`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(url: String, token: Option<String>) -> anyhow::Result<Self> {
        if url.trim().is_empty() {
            return Err(anyhow!("missing storage url"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .user_agent(format!("fete/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            client,
            url,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }
}

#[async_trait]
impl EventStore for HttpStore {
    async fn save(&self, payload: &SavePayload) -> anyhow::Result<StoreReceipt> {
        let mut req = self.client.post(&self.url).json(payload);
        if let Some(token) = self.token.as_deref() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.context("send save request")?;
        let status = resp.status();
        let text = resp.text().await.context("read save response")?;

        if !status.is_success() {
            // Stores report failures as a receipt; fall back to the raw body.
            if let Ok(receipt) = serde_json::from_str::<StoreReceipt>(&text) {
                if receipt.error.is_some() {
                    return Ok(StoreReceipt {
                        success: false,
                        ..receipt
                    });
                }
            }
            return Err(anyhow!("storage error ({status}): {text}"));
        }

        serde_json::from_str(&text).context("parse store receipt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fete_core::paths::{compute_paths, PathInputs};
    use fete_protocol::PlanResponse;
    use serde_json::json;

    fn store(dir: &Path) -> FileStore {
        FileStore::new(&compute_paths(PathInputs {
            home_dir: dir.to_path_buf(),
            xdg_config_home: None,
            fete_dir_override: Some(dir.join("fete")),
        }))
    }

    fn payload() -> SavePayload {
        let plan: PlanResponse = serde_json::from_value(json!({
            "plan": {"event_type": "professional_gathering"}
        }))
        .unwrap();
        SavePayload {
            selected_options: Default::default(),
            timeline: vec![],
            budget_breakdown: vec![],
            full_plan: plan,
        }
    }

    #[tokio::test]
    async fn delete_removes_only_the_named_event() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&payload()).await.unwrap();
        store.save(&payload()).await.unwrap();

        store.delete("1").await.unwrap();

        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["2".to_owned()]);

        let receipt = store.save(&payload()).await.unwrap();
        assert_eq!(receipt.event_id.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn delete_unknown_event_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let err = store.delete("7").await.unwrap_err();
        assert_eq!(err.to_string(), "event not found: 7");
        assert!(store.delete("../x").await.is_err());
    }
}
