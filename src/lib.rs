pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod pages;
pub mod storage;
pub mod text;
pub mod transcript;

pub use config::{Config, Source, DEFAULT_CONFIG_FILE};
pub use error::TranscriptError;
pub use fetch::{fetch_all, fetch_source, Fetch};
pub use models::{EpisodeRecord, SpeakerRoster, TranscriptionResult};
pub use storage::{FsStore, ObjectStore, StoredObject};
pub use transcript::{
    assemble, build_speaker_index, convert_episode, transcript_to_text, FillerFilter, Line,
    SpeakerStartIndex,
};
