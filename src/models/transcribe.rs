use serde::{Deserialize, Serialize};

/// Root payload from the speech transcription service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptionResult {
    pub results: TranscriptionResults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptionResults {
    /// Word and punctuation items in stream order.
    pub items: Vec<TranscriptItem>,
    /// Diarization output, timed independently of `items`.
    pub speaker_labels: SpeakerLabels,
}

/// One recognized item: a spoken word or a punctuation mark.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Start offset in seconds, as the wire string. Absent on punctuation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Recognition alternatives, best first.
    pub alternatives: Vec<ItemAlternative>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Pronunciation,
    Punctuation,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemAlternative {
    pub content: String,
}

impl TranscriptItem {
    /// Text of the best recognition alternative.
    pub fn content(&self) -> &str {
        self.alternatives
            .first()
            .map(|a| a.content.as_str())
            .unwrap_or("")
    }
}

/// Diarization section: segments of per-item speaker assignments.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeakerLabels {
    pub segments: Vec<SpeakerSegment>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeakerSegment {
    pub items: Vec<SegmentItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SegmentItem {
    pub start_time: String,
    /// Diarization-assigned identity, e.g. `spk_0`.
    pub speaker_label: String,
}

impl TranscriptionResult {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
