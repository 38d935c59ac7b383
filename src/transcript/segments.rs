use std::collections::HashMap;

use crate::error::TranscriptError;
use crate::models::transcribe::SpeakerLabels;

/// Start-time to speaker-ordinal index built from the diarization payload.
///
/// Keys are the raw wire start-time strings, so lookups are exact matches
/// against the same strings carried by the item stream.
pub type SpeakerStartIndex = HashMap<String, u32>;

/// Build the lookup from every segment item's start time to its speaker
/// ordinal. Duplicate start times are last-write-wins; they are not expected
/// in well-formed input but must not fail.
pub fn build_speaker_index(labels: &SpeakerLabels) -> Result<SpeakerStartIndex, TranscriptError> {
    let mut index = SpeakerStartIndex::new();
    for segment in &labels.segments {
        for item in &segment.items {
            let ordinal = parse_speaker_ordinal(&item.speaker_label)?;
            index.insert(item.start_time.clone(), ordinal);
        }
    }
    Ok(index)
}

/// Extract the integer ordinal from a diarization label, e.g. `spk_2` -> 2.
pub fn parse_speaker_ordinal(label: &str) -> Result<u32, TranscriptError> {
    label
        .rsplit('_')
        .next()
        .and_then(|suffix| suffix.parse().ok())
        .ok_or_else(|| TranscriptError::MalformedSpeakerLabel {
            label: label.to_string(),
        })
}
