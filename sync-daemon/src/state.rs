//! Engine state persistence.
//!
//! The state file is JSON. It is written to a sibling temp file first and
//! then renamed over the old one.

use crate::error::{DaemonError, Result};
use std::path::Path;
use sync_core::EngineState;

/// Load engine state from `path`.
///
/// A missing file yields an empty state (first run).
pub async fn load_state(path: &Path) -> Result<EngineState> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No state file, starting fresh");
            return Ok(EngineState::new());
        }
        Err(e) => return Err(state_error(path, e)),
    };

    let state = serde_json::from_str(&contents).map_err(|e| state_error(path, e))?;
    tracing::info!(path = %path.display(), "Loaded engine state");
    Ok(state)
}

/// Save engine state to `path`.
pub async fn save_state(path: &Path, state: &EngineState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).map_err(|e| state_error(path, e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    tracing::debug!(path = %path.display(), "Saved engine state");
    Ok(())
}

fn state_error(path: &Path, e: impl std::fmt::Display) -> DaemonError {
    DaemonError::State {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sync_core::SyncCursor;
    use sync_types::{RawRecord, ResourceType};
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_is_empty_state() {
        let temp = TempDir::new().unwrap();
        let state = load_state(&temp.path().join("state.json")).await.unwrap();
        assert_eq!(state, EngineState::new());
    }

    #[tokio::test]
    async fn saved_state_loads_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("state.json");

        let mut state = EngineState::new();
        let calls = state.resource_mut(ResourceType::Call);
        calls.cursor = SyncCursor::with_total_seen(12);
        calls.active.observe(
            RawRecord::from_json(
                ResourceType::Call,
                json!({"sid": "CA1", "status": "in-progress"}),
            )
            .unwrap(),
        );
        save_state(&path, &state).await.unwrap();

        let loaded = load_state(&path).await.unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.total_seen(ResourceType::Call), 12);
        assert_eq!(loaded.active_count(ResourceType::Call), 1);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_state_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            load_state(&path).await,
            Err(DaemonError::State { .. })
        ));
    }
}
