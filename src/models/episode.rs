use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_yaml::{Mapping, Value};
use tracing::info;

/// One episode's data file: an open key-value record persisted as YAML at
/// `<episode-folder>/<id>/episode.yaml`.
///
/// Fields are deliberately untyped; each feed source contributes its own keys
/// and later imports must preserve keys they don't know about.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpisodeRecord {
    fields: Mapping,
}

impl EpisodeRecord {
    pub fn new(id: &str) -> Self {
        let mut record = Self::default();
        record.set_str("id", id);
        record
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn set_str(&mut self, key: &str, value: &str) {
        self.fields
            .insert(Value::from(key), Value::from(value.to_string()));
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.fields.insert(Value::from(key), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// String-sequence field, e.g. the interviewee names.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.fields
            .get(key)
            .and_then(Value::as_sequence)
            .map(|seq| {
                seq.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_list(&mut self, key: &str, values: &[String]) {
        let seq: Vec<Value> = values.iter().map(|v| Value::from(v.clone())).collect();
        self.fields.insert(Value::from(key), Value::from(seq));
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read episode data file: {path:?}"))?;
        let fields: Mapping = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse episode data file: {path:?}"))?;
        Ok(Self { fields })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(&self.fields).context("Failed to serialize episode data")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write episode data file: {path:?}"))?;
        Ok(())
    }

    /// Merge `incoming` over `stored`: incoming values overwrite stored ones
    /// key by key, stored keys absent from the incoming record are preserved.
    pub fn merge_update(stored: &Self, incoming: &Self) -> Self {
        let mut merged = stored.clone();
        for (key, value) in &incoming.fields {
            merged.fields.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Create or update this episode's data file under `episode_folder`.
    ///
    /// Only primary sources create new files; secondary sources update
    /// existing ones. Returns whether the episode is new or changed, which
    /// lets `only-new` imports stop at the first already-known episode.
    ///
    /// ```text
    /// exists  changed  primary | write  return
    /// no      -        no      | no     true
    /// no      -        yes     | yes    true
    /// yes     no       -       | no     false
    /// yes     yes      -       | yes    true
    /// ```
    pub fn update_datafile(&self, episode_folder: &Path, is_primary: bool) -> Result<bool> {
        let Some(id) = self.id() else {
            bail!("episode record has no id: {:?}", self.fields);
        };
        let data_dir = episode_folder.join(id);
        let data_path = data_dir.join("episode.yaml");

        if data_path.is_file() {
            let stored = Self::load(&data_path)?;
            let merged = Self::merge_update(&stored, self);
            let changed = merged != stored;
            if changed {
                info!("Updating {:?}", data_path);
                merged.save(&data_path)?;
            } else {
                info!("No changes to {:?}", data_path);
            }
            Ok(changed)
        } else if is_primary {
            info!("Creating {:?}", data_path);
            std::fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create episode directory: {data_dir:?}"))?;
            self.save(&data_path)?;
            Ok(true)
        } else {
            info!("Missing {:?}", data_path);
            Ok(true)
        }
    }
}
