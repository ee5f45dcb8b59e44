//! Raw AI responses kept under the plans dir so they can be reopened.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use fete_core::paths::FetePaths;
use fete_core::response::parse_plan_text;
use fete_protocol::PlanResponse;
use time::macros::format_description;
use time::OffsetDateTime;

/// Writes `raw` to `<plans_dir>/<timestamp>.json` and returns the path.
pub async fn store_raw(paths: &FetePaths, raw: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(&paths.plans_dir)
        .await
        .with_context(|| format!("create plans dir: {}", paths.plans_dir.display()))?;

    let stamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .context("format plan timestamp")?;

    let mut path = paths.plans_dir.join(format!("{stamp}.json"));
    let mut n = 1;
    while tokio::fs::try_exists(&path).await.unwrap_or(false) {
        n += 1;
        path = paths.plans_dir.join(format!("{stamp}-{n}.json"));
    }

    write_atomic(&path, raw).await?;
    tracing::info!(path = %path.display(), "plan stored");
    Ok(path)
}

/// Reads a stored response, accepting either a bare plan or a fenced reply.
pub async fn load(path: &Path) -> Result<PlanResponse> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read plan: {}", path.display()))?;
    parse_plan_text(&text).with_context(|| format!("parse plan: {}", path.display()))
}

async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("plan.json");
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, contents)
        .await
        .with_context(|| format!("write temp plan: {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
