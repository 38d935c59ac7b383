//! Feed fetchers: one variant per configured source type.

pub mod http;
pub mod itunes;
pub mod rss;
pub mod transcript_sync;
pub mod youtube_api;
pub mod youtube_rss;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{Config, Source};
use crate::models::episode::EpisodeRecord;
use crate::storage::ObjectStore;
use crate::text;

/// A data-source fetcher. Returns whether the source was actually processed;
/// a source that is misconfigured (missing its URL, say) reports `false`
/// rather than failing the import run.
#[async_trait]
pub trait Fetch {
    async fn fetch(&self, source: &Source) -> Result<bool>;
}

/// Run every configured source in turn. A failing source is logged and the
/// rest of the batch continues.
pub async fn fetch_all(config: &Config, store: &dyn ObjectStore) -> Result<()> {
    for (name, source) in &config.source {
        if let Err(err) = fetch_source(name, source, config, store).await {
            warn!("Data source '{}' failed: {:#}", name, err);
        }
    }
    Ok(())
}

/// Dispatch one source to the fetcher variant selected by its `type` tag.
pub async fn fetch_source(
    name: &str,
    source: &Source,
    config: &Config,
    store: &dyn ObjectStore,
) -> Result<()> {
    let Some(kind) = source.kind.as_deref() else {
        warn!("Data source '{}' is missing the 'type'", name);
        return Ok(());
    };
    if source.ignore {
        debug!("Ignoring data source '{}'", name);
        return Ok(());
    }

    info!("Fetching from data source '{}' ({})", name, kind);
    let processed = match kind {
        "rss" => rss::RssFetcher::new(config, store).fetch(source).await?,
        "youtube-rss" => {
            youtube_rss::YoutubeRssFetcher::new(config)
                .fetch(source)
                .await?
        }
        "youtube-api" => {
            youtube_api::YoutubeApiFetcher::new(config)
                .fetch(source)
                .await?
        }
        "itunes" => itunes::ItunesFetcher::new(config).fetch(source).await?,
        "transcript" => {
            transcript_sync::TranscriptFetcher::new(config, store)
                .fetch(source)
                .await?
        }
        other => {
            warn!("Invalid data source type for source '{}': {}", name, other);
            return Ok(());
        }
    };

    if !processed {
        warn!("Data source '{}' was not processed", name);
    }
    Ok(())
}

/// Episode record shared by the two YouTube sources: full metadata derived
/// from the video title, published date, and description.
pub(crate) fn video_episode(
    episode_no: u32,
    title: &str,
    published: &str,
    description: &str,
    video_id: &str,
    image_url: Option<&str>,
) -> EpisodeRecord {
    let mut episode = EpisodeRecord::new(&episode_no.to_string());
    episode.set_str("title", title);
    // `published` arrives as RFC 3339; the date is its first ten characters.
    episode.set_str("published", published.get(..10).unwrap_or(published));

    let shownotes = text::trim_shownotes(description);
    episode.set_str("filename", &text::normalise_filename(title));
    episode.set_str("excerpt", &text::make_summary(&shownotes));
    episode.set_str("shownotes", &shownotes);
    episode.set_str("youtubeid", video_id);
    if let Some(url) = image_url {
        episode.set_str("image", &text::normalise_image_url(url));
    }
    episode.set_list("interviewee", &text::speakers_from_title(title));
    episode
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_episode_fields() {
        let episode = video_episode(
            512,
            "#512 Jane Doe: On testing",
            "2023-10-16T18:00:00+00:00",
            "A talk about tests.\nSecond line.",
            "dQw4w9WgXcQ",
            Some("https://i9.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"),
        );

        assert_eq!(episode.id(), Some("512"));
        assert_eq!(episode.get_str("published"), Some("2023-10-16"));
        assert_eq!(episode.get_str("youtubeid"), Some("dQw4w9WgXcQ"));
        assert_eq!(episode.get_str("excerpt"), Some("A talk about tests."));
        assert_eq!(
            episode.get_str("image"),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
        );
        assert_eq!(episode.get_list("interviewee"), vec!["Jane Doe"]);
    }
}
