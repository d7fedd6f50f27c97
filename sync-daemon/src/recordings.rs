//! Recording audio downloads.
//!
//! Registered as a dependent action on recordings: once a recording row is
//! inserted, its audio is fetched into the output directory as
//! `{sid}.{ext}`. Existing files are left alone.

use crate::api::HttpFetcher;
use crate::config::RecordingFormat;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use sync_client::{ActionError, DependentAction};
use sync_types::{PersistedRecord, Sid};
use tracing::{debug, info};

/// Downloads recording audio after the recording is persisted.
#[derive(Debug, Clone)]
pub struct RecordingDownloader {
    api: HttpFetcher,
    output_dir: PathBuf,
    format: RecordingFormat,
}

impl RecordingDownloader {
    /// Create a downloader writing into `output_dir`.
    pub fn new(api: HttpFetcher, output_dir: impl Into<PathBuf>, format: RecordingFormat) -> Self {
        Self {
            api,
            output_dir: output_dir.into(),
            format,
        }
    }

    /// Local path of a recording's audio.
    pub fn file_path(&self, sid: &Sid) -> PathBuf {
        recording_path(&self.output_dir, sid, self.format)
    }
}

/// `{dir}/{sid}.{ext}`
pub fn recording_path(dir: &Path, sid: &Sid, format: RecordingFormat) -> PathBuf {
    dir.join(format!("{sid}.{}", format.extension()))
}

#[async_trait]
impl DependentAction for RecordingDownloader {
    fn name(&self) -> &str {
        "recording-download"
    }

    async fn on_persisted(&self, record: &PersistedRecord) -> Result<(), ActionError> {
        let sid = record.sid();
        let path = self.file_path(sid);
        if tokio::fs::try_exists(&path).await? {
            debug!(%sid, path = %path.display(), "Recording already downloaded");
            return Ok(());
        }

        let media = self.api.media_path(sid, self.format.extension());
        let bytes = self
            .api
            .get_bytes(&media)
            .await
            .map_err(|e| ActionError::Remote(e.to_string()))?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        // Write then rename so a crash never leaves a truncated file that
        // would be skipped next time.
        let partial = path.with_extension("part");
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        info!(%sid, bytes = bytes.len(), path = %path.display(), "Recording downloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountConfig;
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use sync_types::{LocalId, RawRecord, ResolvedRecord, ResourceType};
    use tempfile::TempDir;

    fn persisted(sid: &str) -> PersistedRecord {
        let raw = RawRecord::from_json(ResourceType::Recording, json!({"sid": sid})).unwrap();
        PersistedRecord {
            local_id: LocalId::new(1),
            record: ResolvedRecord {
                resource_type: ResourceType::Recording,
                raw,
                parents: Vec::new(),
            },
        }
    }

    async fn serve(hits: Arc<AtomicUsize>) -> String {
        let app = Router::new()
            .route(
                "/2010-04-01/Accounts/AC123/Recordings/RE1.wav",
                get(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        b"RIFF....WAVE".to_vec()
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn downloader(base_url: &str, dir: &Path) -> RecordingDownloader {
        let account = AccountConfig {
            sid: "AC123".into(),
            auth_token: Some("secret".into()),
            base_url: base_url.into(),
            ..AccountConfig::default()
        };
        let api = HttpFetcher::new(&account, 50).unwrap();
        RecordingDownloader::new(api, dir, RecordingFormat::Wav)
    }

    #[test]
    fn path_uses_sid_and_extension() {
        let path = recording_path(Path::new("/data"), &Sid::new("RE1"), RecordingFormat::Mp3);
        assert_eq!(path, PathBuf::from("/data/RE1.mp3"));
    }

    #[tokio::test]
    async fn downloads_audio_into_output_dir() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(hits.clone()).await;
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("recordings");
        let action = downloader(&base, &dir);

        action.on_persisted(&persisted("RE1")).await.unwrap();

        let written = std::fs::read(dir.join("RE1.wav")).unwrap();
        assert_eq!(written, b"RIFF....WAVE");
        assert!(!dir.join("RE1.part").exists());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn existing_file_is_not_downloaded_again() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(hits.clone()).await;
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("RE1.wav"), b"old").unwrap();
        let action = downloader(&base, temp.path());

        action.on_persisted(&persisted("RE1")).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(temp.path().join("RE1.wav")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn missing_audio_is_remote_error() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(hits).await;
        let temp = TempDir::new().unwrap();
        let action = downloader(&base, temp.path());

        let result = action.on_persisted(&persisted("RE404")).await;

        assert!(matches!(result, Err(ActionError::Remote(_))));
        assert!(!temp.path().join("RE404.wav").exists());
    }
}
