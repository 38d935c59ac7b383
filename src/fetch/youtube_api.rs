use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{Config, Source};
use crate::text;

use super::{Fetch, video_episode};

const PLAYLIST_ITEMS_URL: &str = "https://www.googleapis.com/youtube/v3/playlistItems";

/// YouTube Data API v3 source: pages through a channel's uploads playlist.
/// Used for backfill, since the Atom feed only serves recent entries.
pub struct YoutubeApiFetcher<'a> {
    config: &'a Config,
    client: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    published_at: String,
    #[serde(default)]
    description: String,
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl<'a> YoutubeApiFetcher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    async fn fetch_page(
        &self,
        playlist_id: &str,
        api_key: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemsResponse> {
        let mut request = self.client.get(PLAYLIST_ITEMS_URL).query(&[
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", "50"),
            ("key", api_key),
        ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .context("Failed to request YouTube API")?;
        if !response.status().is_success() {
            bail!("YouTube API error: {}", response.status());
        }
        response
            .json()
            .await
            .context("Failed to parse YouTube API response")
    }

    /// Record the episodes on one response page. Returns whether the last
    /// processed episode was new or changed, which drives `only-new` paging.
    fn extract_page(&self, page: &PlaylistItemsResponse, source: &Source) -> Result<bool> {
        let mut new_episode = true;
        for item in &page.items {
            let title = item.snippet.title.trim();
            let episode_no = text::episode_no(title);
            if episode_no == 0 {
                continue;
            }

            let episode = video_episode(
                episode_no,
                title,
                &item.snippet.published_at,
                &item.snippet.description,
                &item.snippet.resource_id.video_id,
                item.snippet.thumbnails.maxres.as_ref().map(|t| t.url.as_str()),
            );
            new_episode = episode.update_datafile(&self.config.episode_folder, source.primary())?;
            if source.only_new && !new_episode {
                info!("Done importing from YouTube API");
                break;
            }
        }
        Ok(new_episode)
    }
}

#[async_trait]
impl Fetch for YoutubeApiFetcher<'_> {
    async fn fetch(&self, source: &Source) -> Result<bool> {
        let Some(channel) = source.channel.as_deref() else {
            warn!("Source is missing required property 'channel'");
            return Ok(false);
        };
        let api_key = std::env::var("GOOGLE_API_KEY")
            .context("Define environment variable: GOOGLE_API_KEY")?;

        info!("Download episodes for channel {} via YouTube API", channel);
        if !source.only_new {
            info!("Importing all episodes");
        }

        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .fetch_page(channel, &api_key, page_token.as_deref())
                .await?;
            let new_episode = self.extract_page(&page, source)?;

            page_token = match page.next_page_token {
                Some(token) if !source.only_new || new_episode => Some(token),
                _ => break,
            };
        }
        Ok(true)
    }
}
