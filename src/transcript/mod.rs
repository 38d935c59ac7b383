//! Transcript reconciliation: raw speech-service payload to
//! speaker-attributed, filler-free transcript text.

pub mod assembler;
pub mod fillers;
pub mod render;
pub mod segments;

pub use assembler::{Line, assemble};
pub use fillers::FillerFilter;
pub use render::{format_elapsed, render};
pub use segments::{SpeakerStartIndex, build_speaker_index, parse_speaker_ordinal};

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::error::TranscriptError;
use crate::models::episode::EpisodeRecord;
use crate::models::roster::SpeakerRoster;
use crate::models::transcribe::TranscriptionResult;

/// Convert one transcription payload to transcript text.
///
/// The whole conversion is a pure, single-pass transformation owning its own
/// accumulators; any failure abandons this transcript without partial output.
pub fn transcript_to_text(
    json: &str,
    roster: &SpeakerRoster,
    fillers: &FillerFilter,
) -> Result<String, TranscriptError> {
    let payload = TranscriptionResult::from_json(json)?;
    let index = build_speaker_index(&payload.results.speaker_labels)?;
    let lines = assemble(&payload.results.items, &index)?;
    render(&lines, roster, fillers)
}

/// Convert the downloaded transcript for one episode, writing
/// `transcript.md` next to the payload and recording its path in the episode
/// data file. Returns the output path, or `None` when the episode has no
/// transcript payload yet.
pub fn convert_episode(config: &Config, episode_id: &str) -> Result<Option<PathBuf>> {
    let transcript_path = config.transcript_path(episode_id, false)?;
    if !transcript_path.is_file() {
        return Ok(None);
    }

    let episode_path = config
        .episode_folder
        .join(episode_id)
        .join("episode.yaml");
    let mut episode = EpisodeRecord::load(&episode_path)?;

    // Explicit per-episode configuration beats names parsed from the title.
    let interviewees = match config.interviewees_for(episode_id) {
        Some(configured) => configured.to_vec(),
        None => episode.get_list("interviewee"),
    };
    let roster = SpeakerRoster::build(episode_id, &config.defaults.interviewer, &interviewees);
    let fillers = FillerFilter::new(&config.ums)?;

    info!("Converting transcript file: {:?}", transcript_path);
    let json = std::fs::read_to_string(&transcript_path)
        .with_context(|| format!("Failed to read transcript: {transcript_path:?}"))?;
    let text = transcript_to_text(&json, &roster, &fillers)
        .with_context(|| format!("Failed to convert transcript for episode {episode_id}"))?;

    let output_path = transcript_path.with_file_name("transcript.md");
    std::fs::write(&output_path, text)
        .with_context(|| format!("Failed to write transcript text: {output_path:?}"))?;

    episode.set_str("transcript", &output_path.to_string_lossy());
    episode.save(&episode_path)?;

    Ok(Some(output_path))
}
