use thiserror::Error;

/// Errors that abort processing of a single transcript.
///
/// Each carries the detail an operator needs to fix the upstream data or the
/// configuration. A transcript with unresolved speaker attribution would
/// mislabel dialogue, so no partial output is produced.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// A spoken item has no entry in the speaker segment index.
    #[error("no speaker segment for item at start time {start_time}")]
    SpeakerIndexMiss { start_time: String },

    /// A spoken item arrived without a start time.
    #[error("spoken item {content:?} has no start time")]
    MissingStartTime { content: String },

    /// A start time could not be parsed as seconds.
    #[error("unparseable start time {start_time:?}")]
    BadStartTime { start_time: String },

    /// A diarization label did not carry an integer ordinal suffix.
    #[error("malformed speaker label {label:?}")]
    MalformedSpeakerLabel { label: String },

    /// A speaker ordinal has no roster entry for this episode.
    #[error(
        "speaker ordinal {ordinal} out of range for episode {episode_id} (roster has {roster_len} names)"
    )]
    SpeakerOutOfRange {
        ordinal: u32,
        roster_len: usize,
        episode_id: String,
    },

    #[error("failed to parse transcription payload")]
    Payload(#[from] serde_json::Error),

    #[error("invalid filler word pattern")]
    FillerPattern(#[from] regex::Error),
}
