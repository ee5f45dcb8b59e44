use anyhow::{Context as _, Result};
use fete_core::config::ConfigFile;
use fete_core::paths::FetePaths;

/// Reads `config.toml`; a missing file yields the defaults.
pub async fn load(paths: &FetePaths) -> Result<ConfigFile> {
    let path = &paths.config_file;
    match tokio::fs::read_to_string(path).await {
        Ok(s) => {
            let cfg: ConfigFile = toml::from_str(&s).context("parse config.toml")?;
            cfg.validate().context("validate config.toml")?;
            tracing::debug!(path = %path.display(), "config loaded");
            Ok(cfg)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(err) => Err(err).with_context(|| format!("read config: {}", path.display())),
    }
}
