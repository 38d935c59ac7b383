use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{Config, Source};
use crate::models::episode::EpisodeRecord;
use crate::text;

use super::Fetch;

/// iTunes lookup source: episode pages from the public lookup endpoint.
/// Descriptions arrive as HTML, unlike the YouTube sources.
pub struct ItunesFetcher<'a> {
    config: &'a Config,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Vec<LookupItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupItem {
    #[serde(default)]
    wrapper_type: String,
    track_name: Option<String>,
    description: Option<String>,
    artwork_url600: Option<String>,
    track_view_url: Option<String>,
}

impl<'a> ItunesFetcher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn extract_episodes(&self, response: &LookupResponse, source: &Source) -> Result<()> {
        info!("Extracting episodes from itunes feed");
        for item in &response.results {
            if item.wrapper_type != "podcastEpisode" {
                continue;
            }
            let Some(title) = item.track_name.as_deref() else {
                continue;
            };
            let episode_no = text::episode_no(title);
            if episode_no == 0 {
                continue;
            }

            let mut episode = EpisodeRecord::new(&episode_no.to_string());
            if source.primary() {
                let shownotes =
                    text::trim_shownotes_html(item.description.as_deref().unwrap_or("").trim());
                episode.set_str("title", title);
                episode.set_str("filename", &text::normalise_filename(title));
                episode.set_str("excerpt", &text::make_summary(&shownotes));
                episode.set_str("shownotes", &shownotes);
                if let Some(image) = &item.artwork_url600 {
                    episode.set_str("image", image);
                }
                episode.set_list("interviewee", &text::speakers_from_title(title));
            }
            if let Some(url) = &item.track_view_url {
                episode.set_str("itunesEpisodeUrl", url);
            }

            if !episode.update_datafile(&self.config.episode_folder, source.primary())?
                && source.only_new
            {
                info!("Done importing from itunes");
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Fetch for ItunesFetcher<'_> {
    async fn fetch(&self, source: &Source) -> Result<bool> {
        let Some(id) = source.id else {
            warn!("Source is missing required property 'id'");
            return Ok(false);
        };

        let url = format!(
            "https://itunes.apple.com/lookup?id={id}&media=podcast&entity=podcastEpisode&limit=200"
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to request itunes lookup")?;
        if !response.status().is_success() {
            warn!("HTTP request status {} from url {}", response.status(), url);
            return Ok(false);
        }
        let lookup: LookupResponse = response
            .json()
            .await
            .context("Failed to parse itunes lookup response")?;

        self.extract_episodes(&lookup, source)?;
        Ok(true)
    }
}
