use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "podforge.json";

/// Pipeline configuration, resolved once at startup and passed by reference
/// into each component; nothing mutates it afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Root directory for per-episode data files.
    #[serde(default = "default_episode_folder")]
    pub episode_folder: PathBuf,
    #[serde(default = "default_audio_prefix")]
    pub audio_prefix: String,
    #[serde(default = "default_transcript_prefix")]
    pub transcript_prefix: String,
    /// Maximum audio uploads submitted for transcription per import run.
    #[serde(default = "default_transcribe_max")]
    pub transcribe_max: usize,
    /// Root directory for the filesystem object store.
    #[serde(default = "default_store_folder")]
    pub store_folder: PathBuf,
    #[serde(default)]
    pub audio_bucket: Option<String>,
    #[serde(default)]
    pub transcript_bucket: Option<String>,
    /// Filler words stripped from rendered transcripts. Empty disables.
    #[serde(default)]
    pub ums: Vec<String>,
    #[serde(default)]
    pub defaults: RosterDefaults,
    /// Per-episode interviewee overrides.
    #[serde(default)]
    pub episodes: Vec<EpisodeOverride>,
    /// Data sources with their display names, in declaration order. Sources
    /// run in the order the configuration lists them, so an operator can
    /// sequence an import before the transcript sync.
    #[serde(
        default,
        deserialize_with = "sources_in_order",
        serialize_with = "sources_as_map"
    )]
    pub source: Vec<(String, Source)>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RosterDefaults {
    /// Interviewer name(s); these take the leading roster ordinals.
    #[serde(default)]
    pub interviewer: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EpisodeOverride {
    pub episodeid: String,
    #[serde(default)]
    pub interviewee: Vec<String>,
}

/// One configured data source. `kind` selects the fetcher variant.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Source {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Feed URL (rss, youtube-rss).
    #[serde(default)]
    pub url: Option<String>,
    /// Lookup id (itunes).
    #[serde(default)]
    pub id: Option<u64>,
    /// Uploads playlist id (youtube-api).
    #[serde(default)]
    pub channel: Option<String>,
    /// Whether this source may create episode data files. Resolved during
    /// config finalization; `None` never survives `Config::load`.
    #[serde(default)]
    pub primary: Option<bool>,
    /// Stop importing at the first already-known episode.
    #[serde(default = "default_true")]
    pub only_new: bool,
    #[serde(default)]
    pub ignore: bool,
}

impl Source {
    pub fn primary(&self) -> bool {
        self.primary.unwrap_or(false)
    }
}

impl Config {
    /// Load configuration from the inline command-line JSON and/or the config
    /// file. The inline value overwrites the file value, recursively per key.
    /// With `skip_file` only the inline value is used.
    pub fn load(
        inline: Option<&str>,
        config_file: Option<&Path>,
        skip_file: bool,
    ) -> Result<Self> {
        let inline_value = match inline {
            Some(json) => serde_json::from_str(json)
                .context("Failed to parse command line configuration as JSON")?,
            None => Value::Object(Default::default()),
        };

        let merged = if skip_file {
            inline_value
        } else {
            let path = config_file
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            if path.is_file() {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read configuration file: {path:?}"))?;
                let mut file_value: Value = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse configuration file: {path:?}"))?;
                merge_values(&mut file_value, &inline_value);
                file_value
            } else if config_file.is_some() {
                bail!("Config file not found: {path:?}");
            } else {
                inline_value
            }
        };

        Self::from_value(merged)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let mut config: Config =
            serde_json::from_value(value).context("Invalid configuration")?;
        config.finalize()?;
        Ok(config)
    }

    fn finalize(&mut self) -> Result<()> {
        if self.episode_folder.is_relative() {
            let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
            self.episode_folder = cwd.join(&self.episode_folder);
        }

        // If no source declares `primary`, all sources are primary; otherwise
        // undeclared sources are not.
        let any_declared = self.source.iter().any(|(_, s)| s.primary.is_some());
        for (_, source) in &mut self.source {
            if source.primary.is_none() {
                source.primary = Some(!any_declared);
            }
        }
        Ok(())
    }

    /// Configured source by its display name.
    pub fn source_named(&self, name: &str) -> Option<&Source> {
        self.source
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Per-episode interviewee override, if configured. Duplicate entries for
    /// the same episode are a configuration mistake; the first wins.
    pub fn interviewees_for(&self, episode_id: &str) -> Option<&[String]> {
        let mut matches = self.episodes.iter().filter(|e| e.episodeid == episode_id);
        let first = matches.next()?;
        if matches.next().is_some() {
            warn!("Duplicate episode configuration for {}", episode_id);
        }
        Some(&first.interviewee)
    }

    /// Local path of the transcript payload for an episode, optionally
    /// creating the episode directory.
    pub fn transcript_path(&self, episode_id: &str, create: bool) -> Result<PathBuf> {
        let dir = self.episode_folder.join(episode_id);
        if create && !dir.is_dir() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create episode directory: {dir:?}"))?;
        }
        Ok(dir.join("transcript.json"))
    }
}

/// Deserialize the source table keeping the configuration file's key order
/// (the JSON layer is built with `preserve_order`, so the map arrives in
/// declaration order).
fn sources_in_order<'de, D>(deserializer: D) -> Result<Vec<(String, Source)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SourceMapVisitor;

    impl<'de> Visitor<'de> for SourceMapVisitor {
        type Value = Vec<(String, Source)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of data sources")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut sources = Vec::new();
            while let Some(entry) = map.next_entry()? {
                sources.push(entry);
            }
            Ok(sources)
        }
    }

    deserializer.deserialize_map(SourceMapVisitor)
}

fn sources_as_map<S>(sources: &[(String, Source)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(sources.iter().map(|(name, source)| (name, source)))
}

/// Recursively merge `enhancer` into `target`: objects merge per key, any
/// other value in the enhancer overwrites the target's.
pub fn merge_values(target: &mut Value, enhancer: &Value) {
    match (target, enhancer) {
        (Value::Object(target_map), Value::Object(enhancer_map)) => {
            for (key, value) in enhancer_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_values(existing, value);
                    }
                    _ => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, enhancer) => *target = enhancer.clone(),
    }
}

fn default_episode_folder() -> PathBuf {
    PathBuf::from("episode")
}

fn default_audio_prefix() -> String {
    "episode".to_string()
}

fn default_transcript_prefix() -> String {
    "transcript".to_string()
}

fn default_transcribe_max() -> usize {
    1
}

fn default_store_folder() -> PathBuf {
    PathBuf::from("store")
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_values_recursive_overwrite() {
        let mut target = json!({
            "episode-folder": "episode",
            "defaults": {"interviewer": ["Host"]},
            "source": {"main": {"type": "rss", "url": "https://a.example/feed"}}
        });
        let enhancer = json!({
            "defaults": {"interviewer": ["Other Host"]},
            "source": {"main": {"only-new": false}}
        });
        merge_values(&mut target, &enhancer);

        assert_eq!(target["episode-folder"], "episode");
        assert_eq!(target["defaults"]["interviewer"][0], "Other Host");
        assert_eq!(target["source"]["main"]["type"], "rss");
        assert_eq!(target["source"]["main"]["only-new"], false);
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_value(json!({})).unwrap();
        assert!(config.episode_folder.is_absolute());
        assert!(config.episode_folder.ends_with("episode"));
        assert_eq!(config.audio_prefix, "episode");
        assert_eq!(config.transcript_prefix, "transcript");
        assert_eq!(config.transcribe_max, 1);
        assert!(config.ums.is_empty());
    }

    #[test]
    fn test_primary_defaults_to_true_when_none_declared() {
        let config = Config::from_value(json!({
            "source": {
                "a": {"type": "rss"},
                "b": {"type": "itunes"}
            }
        }))
        .unwrap();
        assert!(config.source_named("a").unwrap().primary());
        assert!(config.source_named("b").unwrap().primary());
    }

    #[test]
    fn test_primary_defaults_to_false_when_any_declared() {
        let config = Config::from_value(json!({
            "source": {
                "a": {"type": "rss", "primary": true},
                "b": {"type": "itunes"}
            }
        }))
        .unwrap();
        assert!(config.source_named("a").unwrap().primary());
        assert!(!config.source_named("b").unwrap().primary());
    }

    #[test]
    fn test_sources_run_in_declaration_order() {
        let config = Config::from_value(json!({
            "source": {
                "zebra-feed": {"type": "rss"},
                "apple-lookup": {"type": "itunes"},
                "sync": {"type": "transcript"}
            }
        }))
        .unwrap();

        let names: Vec<&str> = config.source.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zebra-feed", "apple-lookup", "sync"]);
    }

    #[test]
    fn test_interviewee_override_lookup() {
        let config = Config::from_value(json!({
            "episodes": [
                {"episodeid": "500", "interviewee": ["Jane Doe"]},
            ]
        }))
        .unwrap();
        assert_eq!(
            config.interviewees_for("500"),
            Some(&["Jane Doe".to_string()][..])
        );
        assert_eq!(config.interviewees_for("501"), None);
    }
}
