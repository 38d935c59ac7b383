use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use roxmltree::Node;
use tracing::{debug, info, warn};

use crate::config::{Config, Source};
use crate::models::episode::EpisodeRecord;
use crate::storage::{ObjectStore, find_episode};
use crate::text;

use super::{Fetch, http};

const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";

/// Podcast RSS source: records the audio, episode, and artwork URLs per
/// episode and submits new episodes' audio for transcription.
pub struct RssFetcher<'a> {
    config: &'a Config,
    store: &'a dyn ObjectStore,
    client: Client,
}

impl<'a> RssFetcher<'a> {
    pub fn new(config: &'a Config, store: &'a dyn ObjectStore) -> Self {
        Self {
            config,
            store,
            client: Client::new(),
        }
    }

    pub async fn extract_episodes(&self, feed: &str, source: &Source) -> Result<()> {
        let doc = roxmltree::Document::parse(feed).context("Failed to parse RSS feed")?;
        let channel = doc
            .root_element()
            .children()
            .find(|n| n.has_tag_name("channel"))
            .context("RSS feed has no channel element")?;

        info!("Extracting episodes from RSS feed");
        if source.only_new {
            info!("Importing new episodes from RSS");
        } else {
            info!("Importing all episodes from RSS");
        }

        let mut transcribed = 0usize;
        for item in channel.children().filter(|n| n.has_tag_name("item")) {
            let Some(title) = child_text(&item, "title") else {
                continue;
            };
            let episode_no = text::episode_no(title.trim());
            if episode_no == 0 {
                continue;
            }
            let episode_id = episode_no.to_string();

            let mut episode = EpisodeRecord::new(&episode_id);
            let audio_url = item
                .children()
                .find(|n| n.has_tag_name("enclosure"))
                .and_then(|n| n.attribute("url"))
                .map(str::to_string);
            if let Some(url) = &audio_url {
                episode.set_str("rssAudioUrl", url);
            }
            if let Some(link) = child_text(&item, "link") {
                episode.set_str("rssEpisodeUrl", link.trim());
            }
            if let Some(image) = item
                .children()
                .find(|n| n.has_tag_name((ITUNES_NS, "image")))
                .and_then(|n| n.attribute("href"))
            {
                episode.set_str("rssImageUrl", image);
            }

            if episode.update_datafile(&self.config.episode_folder, source.primary())? {
                if source.only_new {
                    if let Some(url) = &audio_url {
                        self.initiate_transcription(&episode_id, url, &mut transcribed)
                            .await?;
                    }
                }
            } else if source.only_new {
                info!("Done importing from RSS");
                break;
            }
        }
        Ok(())
    }

    /// Upload a new episode's audio so the external transcription job picks
    /// it up. Skipped when a transcript already exists locally or remotely,
    /// when the audio was already uploaded, or when the per-run upload limit
    /// is reached. A surviving local transcript with a deleted episode data
    /// file means the data file was removed to force recreation, not that
    /// the transcript should be regenerated.
    async fn initiate_transcription(
        &self,
        episode_id: &str,
        audio_url: &str,
        transcribed: &mut usize,
    ) -> Result<()> {
        let (Some(audio_bucket), Some(transcript_bucket)) = (
            self.config.audio_bucket.as_deref(),
            self.config.transcript_bucket.as_deref(),
        ) else {
            return Ok(());
        };

        if self.config.transcript_path(episode_id, false)?.is_file() {
            return Ok(());
        }
        if find_episode(self.store, transcript_bucket, episode_id)
            .await?
            .is_some()
        {
            return Ok(());
        }
        if find_episode(self.store, audio_bucket, episode_id)
            .await?
            .is_some()
        {
            return Ok(());
        }
        if *transcribed >= self.config.transcribe_max {
            debug!(
                "Transcription limit reached; not uploading episode {}",
                episode_id
            );
            return Ok(());
        }

        let filename = format!("{episode_id}{}", text::audio_extension(audio_url));
        let path = std::env::temp_dir().join(&filename);
        if http::download_to_file(&self.client, audio_url, &path).await? {
            self.store.upload(audio_bucket, &filename, &path).await?;
            *transcribed += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl Fetch for RssFetcher<'_> {
    async fn fetch(&self, source: &Source) -> Result<bool> {
        let Some(url) = source.url.as_deref() else {
            warn!("Source is missing required property 'url'");
            return Ok(false);
        };
        let Some(feed) = http::fetch_text(&self.client, url).await? else {
            return Ok(false);
        };
        self.extract_episodes(&feed, source).await?;
        Ok(true)
    }
}

fn child_text<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsStore;
    use serde_json::json;
    use tempfile::tempdir;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>The Show</title>
    <item>
      <title>#513 Kim Lee: Sequels</title>
      <link>https://pods.example/513</link>
      <enclosure url="https://cdn.example/513.m4a" type="audio/mp4"/>
      <itunes:image href="https://cdn.example/art/513.jpg"/>
    </item>
    <item>
      <title>Channel trailer</title>
      <link>https://pods.example/trailer</link>
    </item>
    <item>
      <title>#512 Jane Doe: On testing</title>
      <link>https://pods.example/512</link>
      <enclosure url="https://cdn.example/512.m4a" type="audio/mp4"/>
      <itunes:image href="https://cdn.example/art/512.jpg"/>
    </item>
  </channel>
</rss>"#;

    fn config(episode_folder: &std::path::Path) -> Config {
        Config::from_value(json!({
            "episode-folder": episode_folder.to_string_lossy(),
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_extract_episodes_records_urls() {
        let episodes = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let config = config(episodes.path());
        let store = FsStore::new(store_dir.path());
        let fetcher = RssFetcher::new(&config, &store);

        let source = Source {
            kind: Some("rss".to_string()),
            primary: Some(true),
            only_new: false,
            ..Default::default()
        };
        fetcher.extract_episodes(FEED, &source).await.unwrap();

        let episode = EpisodeRecord::load(&episodes.path().join("513/episode.yaml")).unwrap();
        assert_eq!(
            episode.get_str("rssAudioUrl"),
            Some("https://cdn.example/513.m4a")
        );
        assert_eq!(
            episode.get_str("rssEpisodeUrl"),
            Some("https://pods.example/513")
        );
        assert_eq!(
            episode.get_str("rssImageUrl"),
            Some("https://cdn.example/art/513.jpg")
        );

        // The trailer has no episode number and is skipped.
        assert!(episodes.path().join("512/episode.yaml").is_file());
        assert_eq!(std::fs::read_dir(episodes.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_secondary_source_does_not_create() {
        let episodes = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let config = config(episodes.path());
        let store = FsStore::new(store_dir.path());
        let fetcher = RssFetcher::new(&config, &store);

        let source = Source {
            kind: Some("rss".to_string()),
            primary: Some(false),
            only_new: false,
            ..Default::default()
        };
        fetcher.extract_episodes(FEED, &source).await.unwrap();
        assert_eq!(std::fs::read_dir(episodes.path()).unwrap().count(), 0);
    }
}
