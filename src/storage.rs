use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A listed object in a bucket.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// Flat-namespace object storage holding episode audio and transcripts.
///
/// The cloud provider's SDK is an external collaborator; the pipeline only
/// needs these four operations, so it codes against this seam and tests run
/// against the filesystem implementation.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list(&self, bucket: &str) -> Result<Vec<StoredObject>>;
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<()>;
    async fn upload(&self, bucket: &str, key: &str, src: &Path) -> Result<()>;
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;
}

/// Episode id of an object key: the file name up to its first dot
/// (`000.json` and `000.m4a` both belong to episode `000`).
pub fn episode_id_of(key: &str) -> &str {
    let name = key.rsplit('/').next().unwrap_or(key);
    name.split('.').next().unwrap_or(name)
}

/// Key of the object for `episode_id` in `bucket`, ignoring the extension,
/// or `None` if the episode has no object there.
pub async fn find_episode(
    store: &dyn ObjectStore,
    bucket: &str,
    episode_id: &str,
) -> Result<Option<String>> {
    let objects = store.list(bucket).await?;
    Ok(objects
        .into_iter()
        .map(|o| o.key)
        .find(|key| episode_id_of(key) == episode_id))
}

/// Filesystem-backed [`ObjectStore`]: each bucket is a directory under the
/// configured store folder.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn list(&self, bucket: &str) -> Result<Vec<StoredObject>> {
        let dir = self.root.join(bucket);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to list bucket directory: {dir:?}"))?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .with_context(|| format!("No modification time for {:?}", entry.path()))?;
            objects.push(StoredObject {
                key: entry.file_name().to_string_lossy().into_owned(),
                last_modified: DateTime::<Utc>::from(modified),
            });
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let src = self.object_path(bucket, key);
        tokio::fs::copy(&src, dest)
            .await
            .with_context(|| format!("Failed to download {bucket}/{key} to {dest:?}"))?;
        Ok(())
    }

    async fn upload(&self, bucket: &str, key: &str, src: &Path) -> Result<()> {
        let dest = self.object_path(bucket, key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create bucket directory: {parent:?}"))?;
        }
        tokio::fs::copy(src, &dest)
            .await
            .with_context(|| format!("Failed to upload {src:?} to {bucket}/{key}"))?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to delete {bucket}/{key}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_episode_id_of() {
        assert_eq!(episode_id_of("000.json"), "000");
        assert_eq!(episode_id_of("512.m4a"), "512");
        assert_eq!(episode_id_of("archive/512.tar.gz"), "512");
        assert_eq!(episode_id_of("noextension"), "noextension");
    }

    #[tokio::test]
    async fn test_fs_store_round_trip() {
        let store_dir = tempdir().unwrap();
        let work_dir = tempdir().unwrap();
        let store = FsStore::new(store_dir.path());

        let src = work_dir.path().join("512.json");
        std::fs::write(&src, "{}").unwrap();
        store.upload("transcripts", "512.json", &src).await.unwrap();

        let listed = store.list("transcripts").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "512.json");

        let dest = work_dir.path().join("copy.json");
        store
            .download("transcripts", "512.json", &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "{}");

        store.delete("transcripts", "512.json").await.unwrap();
        assert!(store.list("transcripts").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_episode_ignores_extension() {
        let store_dir = tempdir().unwrap();
        let work_dir = tempdir().unwrap();
        let store = FsStore::new(store_dir.path());

        let src = work_dir.path().join("a");
        std::fs::write(&src, "x").unwrap();
        store.upload("audio", "512.m4a", &src).await.unwrap();

        assert_eq!(
            find_episode(&store, "audio", "512").await.unwrap(),
            Some("512.m4a".to_string())
        );
        assert_eq!(find_episode(&store, "audio", "513").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_missing_bucket_is_empty() {
        let store_dir = tempdir().unwrap();
        let store = FsStore::new(store_dir.path());
        assert!(store.list("nothing").await.unwrap().is_empty());
    }
}
