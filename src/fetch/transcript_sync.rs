use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::{Config, Source};
use crate::storage::{ObjectStore, episode_id_of, find_episode};

use super::Fetch;

/// Reconciles the transcript bucket with local transcript files:
///
/// ```text
/// remote transcript   local transcript   remote newer | action
/// yes                 no                 -            | download
/// yes                 yes                yes          | download (overwrite)
/// yes                 yes                no           | delete remote + audio
/// no                  -                  -            | nothing (job pending)
/// ```
///
/// A remote transcript older than the local copy was already imported on a
/// previous run, so it and its source audio are retired from the store.
pub struct TranscriptFetcher<'a> {
    config: &'a Config,
    store: &'a dyn ObjectStore,
}

enum SyncAction {
    Download,
    Overwrite,
    Retire,
}

impl<'a> TranscriptFetcher<'a> {
    pub fn new(config: &'a Config, store: &'a dyn ObjectStore) -> Self {
        Self { config, store }
    }

    async fn retire(&self, transcript_bucket: &str, key: &str, episode_id: &str) -> Result<()> {
        info!(
            "Deleting previously imported transcript for episode {} {}",
            episode_id, key
        );
        self.store.delete(transcript_bucket, key).await?;

        if let Some(audio_bucket) = self.config.audio_bucket.as_deref() {
            if let Some(audio_key) = find_episode(self.store, audio_bucket, episode_id).await? {
                self.store.delete(audio_bucket, &audio_key).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Fetch for TranscriptFetcher<'_> {
    async fn fetch(&self, _source: &Source) -> Result<bool> {
        let Some(transcript_bucket) = self.config.transcript_bucket.as_deref() else {
            warn!("No transcript bucket is configured");
            return Ok(false);
        };

        for object in self.store.list(transcript_bucket).await? {
            if !object.key.ends_with(".json") {
                // Not a transcript payload.
                continue;
            }
            let episode_id = episode_id_of(&object.key).to_string();
            let local_path = self.config.transcript_path(&episode_id, true)?;

            let action = if local_path.is_file() {
                let modified = std::fs::metadata(&local_path)
                    .and_then(|m| m.modified())
                    .with_context(|| format!("No modification time for {local_path:?}"))?;
                if object.last_modified > DateTime::<Utc>::from(modified) {
                    SyncAction::Overwrite
                } else {
                    SyncAction::Retire
                }
            } else {
                SyncAction::Download
            };

            match action {
                SyncAction::Download | SyncAction::Overwrite => {
                    info!(
                        "Getting transcript for episode {} from {} to {:?}",
                        episode_id, object.key, local_path
                    );
                    self.store
                        .download(transcript_bucket, &object.key, &local_path)
                        .await?;
                }
                SyncAction::Retire => {
                    self.retire(transcript_bucket, &object.key, &episode_id)
                        .await?;
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsStore;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_new_transcript_is_downloaded_then_retired() {
        let episodes = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let work = tempdir().unwrap();

        let config = Config::from_value(json!({
            "episode-folder": episodes.path().to_string_lossy(),
            "transcript-bucket": "transcripts",
            "audio-bucket": "audio",
        }))
        .unwrap();
        let store = FsStore::new(store_dir.path());

        // Seed a remote transcript and its source audio.
        let payload = work.path().join("512.json");
        std::fs::write(&payload, "{}").unwrap();
        store.upload("transcripts", "512.json", &payload).await.unwrap();
        let audio = work.path().join("512.m4a");
        std::fs::write(&audio, "x").unwrap();
        store.upload("audio", "512.m4a", &audio).await.unwrap();

        let fetcher = TranscriptFetcher::new(&config, &store);
        let source = Source::default();

        // First run downloads the transcript.
        assert!(fetcher.fetch(&source).await.unwrap());
        let local = episodes.path().join("512/transcript.json");
        assert!(local.is_file());

        // Second run sees the local copy is at least as new and retires the
        // remote transcript and audio.
        assert!(fetcher.fetch(&source).await.unwrap());
        assert!(store.list("transcripts").await.unwrap().is_empty());
        assert!(store.list("audio").await.unwrap().is_empty());
        assert!(local.is_file());
    }

    #[tokio::test]
    async fn test_non_transcript_objects_are_ignored() {
        let episodes = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let work = tempdir().unwrap();

        let config = Config::from_value(json!({
            "episode-folder": episodes.path().to_string_lossy(),
            "transcript-bucket": "transcripts",
        }))
        .unwrap();
        let store = FsStore::new(store_dir.path());

        let stray = work.path().join("notes.txt");
        std::fs::write(&stray, "not a transcript").unwrap();
        store.upload("transcripts", "notes.txt", &stray).await.unwrap();

        let fetcher = TranscriptFetcher::new(&config, &store);
        assert!(fetcher.fetch(&Source::default()).await.unwrap());
        assert_eq!(store.list("transcripts").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_bucket_config_reports_unprocessed() {
        let episodes = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let config = Config::from_value(json!({
            "episode-folder": episodes.path().to_string_lossy(),
        }))
        .unwrap();
        let store = FsStore::new(store_dir.path());

        let fetcher = TranscriptFetcher::new(&config, &store);
        assert!(!fetcher.fetch(&Source::default()).await.unwrap());
    }
}
