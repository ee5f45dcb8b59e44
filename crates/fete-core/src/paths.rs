use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInputs {
    pub home_dir: PathBuf,
    pub xdg_config_home: Option<PathBuf>,
    pub fete_dir_override: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetePaths {
    pub base_dir: PathBuf,

    pub log_path: PathBuf,
    pub lock_path: PathBuf,

    /// Raw AI responses, one JSON file per generated plan.
    pub plans_dir: PathBuf,
    /// Saved events written by the file store.
    pub events_dir: PathBuf,

    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

pub fn compute_paths(inputs: PathInputs) -> FetePaths {
    let base_dir = inputs
        .fete_dir_override
        .clone()
        .unwrap_or_else(|| inputs.home_dir.join(".fete"));

    let config_base = match inputs.fete_dir_override {
        Some(ref override_dir) => override_dir.join("config"),
        None => inputs
            .xdg_config_home
            .unwrap_or_else(|| inputs.home_dir.join(".config"))
            .join("fete"),
    };

    FetePaths {
        log_path: base_dir.join("fete.log"),
        lock_path: base_dir.join("events.lock"),
        plans_dir: base_dir.join("plans"),
        events_dir: base_dir.join("events"),

        config_file: config_base.join("config.toml"),

        base_dir,
        config_dir: config_base,
    }
}

#[derive(Debug, Error)]
pub enum SafeJoinError {
    #[error("path segment is empty")]
    Empty,
    #[error("path segment is not a normal component: {segment:?}")]
    NotNormal { segment: String },
}

pub fn safe_join(base: &Path, segment: &str) -> Result<PathBuf, SafeJoinError> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Err(SafeJoinError::Empty);
    }

    let segment_path = Path::new(segment);
    if segment_path.is_absolute() {
        return Err(SafeJoinError::NotNormal {
            segment: segment.to_owned(),
        });
    }

    let mut components = segment_path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (Some(std::path::Component::Normal(_)), None) => Ok(base.join(segment)),
        _ => Err(SafeJoinError::NotNormal {
            segment: segment.to_owned(),
        }),
    }
}
