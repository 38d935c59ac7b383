use std::cmp::Ordering;

use crate::error::TranscriptError;
use crate::models::transcribe::{ItemKind, TranscriptItem};
use crate::transcript::segments::SpeakerStartIndex;

/// One contiguous utterance by a single speaker.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub speaker: u32,
    pub text: String,
    /// Start of the utterance in seconds.
    pub time: f64,
}

/// Merge the item stream against the speaker index into speaker-grouped
/// lines, returned in chronological order.
///
/// The item stream and the diarization segments are timed independently and
/// share only the start-time key space, so each spoken item is attributed by
/// exact lookup. A missing entry means the payload is internally inconsistent
/// and the whole transcript is abandoned; attributing the item blindly would
/// mislabel dialogue.
pub fn assemble(
    items: &[TranscriptItem],
    index: &SpeakerStartIndex,
) -> Result<Vec<Line>, TranscriptError> {
    let mut lines: Vec<Line> = Vec::new();
    let mut speaker: Option<u32> = None;
    let mut text = String::new();
    let mut time = 0.0f64;

    for item in items {
        match item.kind {
            // Punctuation attaches to the current line with no space.
            ItemKind::Punctuation => text.push_str(item.content()),
            ItemKind::Pronunciation => {
                let start =
                    item.start_time
                        .as_deref()
                        .ok_or_else(|| TranscriptError::MissingStartTime {
                            content: item.content().to_string(),
                        })?;
                let current =
                    *index
                        .get(start)
                        .ok_or_else(|| TranscriptError::SpeakerIndexMiss {
                            start_time: start.to_string(),
                        })?;

                if speaker != Some(current) {
                    // Speaker turn: close out the accumulated line. Skipped
                    // only before the first spoken item.
                    if let Some(prev) = speaker {
                        lines.push(Line {
                            speaker: prev,
                            text: std::mem::take(&mut text),
                            time,
                        });
                    }
                    text = item.content().to_string();
                    speaker = Some(current);
                    time = parse_seconds(start)?;
                } else {
                    text.push(' ');
                    text.push_str(item.content());
                }
            }
        }
    }

    // Flush the final line. An empty item stream yields no lines.
    if let Some(prev) = speaker {
        lines.push(Line {
            speaker: prev,
            text,
            time,
        });
    }

    // Lines accumulate in arrival order; output order is chronological,
    // stable for equal times.
    lines.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));

    Ok(lines)
}

fn parse_seconds(start_time: &str) -> Result<f64, TranscriptError> {
    start_time
        .parse()
        .map_err(|_| TranscriptError::BadStartTime {
            start_time: start_time.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transcribe::ItemAlternative;

    fn spoken(content: &str, start: &str) -> TranscriptItem {
        TranscriptItem {
            kind: ItemKind::Pronunciation,
            start_time: Some(start.to_string()),
            alternatives: vec![ItemAlternative {
                content: content.to_string(),
            }],
        }
    }

    fn punct(content: &str) -> TranscriptItem {
        TranscriptItem {
            kind: ItemKind::Punctuation,
            start_time: None,
            alternatives: vec![ItemAlternative {
                content: content.to_string(),
            }],
        }
    }

    fn index(entries: &[(&str, u32)]) -> SpeakerStartIndex {
        entries
            .iter()
            .map(|(time, speaker)| (time.to_string(), *speaker))
            .collect()
    }

    #[test]
    fn test_speaker_change_splits_lines() {
        let items = vec![spoken("Hi", "0.1"), punct("."), spoken("Bye", "1.0")];
        let lines = assemble(&items, &index(&[("0.1", 0), ("1.0", 1)])).unwrap();

        assert_eq!(
            lines,
            vec![
                Line {
                    speaker: 0,
                    text: "Hi.".to_string(),
                    time: 0.1
                },
                Line {
                    speaker: 1,
                    text: "Bye".to_string(),
                    time: 1.0
                },
            ]
        );
    }

    #[test]
    fn test_same_speaker_accumulates_with_spaces() {
        let items = vec![
            spoken("How", "0.1"),
            spoken("are", "0.5"),
            spoken("you", "0.9"),
            punct("?"),
        ];
        let lines = assemble(&items, &index(&[("0.1", 0), ("0.5", 0), ("0.9", 0)])).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "How are you?");
        assert_eq!(lines[0].time, 0.1);
    }

    #[test]
    fn test_output_is_chronological() {
        // Speaker turns arriving out of time order still render sorted.
        let items = vec![
            spoken("later", "10.0"),
            spoken("earlier", "2.0"),
            spoken("middle", "5.0"),
        ];
        let lines = assemble(
            &items,
            &index(&[("10.0", 0), ("2.0", 1), ("5.0", 2)]),
        )
        .unwrap();

        let times: Vec<f64> = lines.iter().map(|l| l.time).collect();
        assert_eq!(times, vec![2.0, 5.0, 10.0]);
        for pair in lines.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
    }

    #[test]
    fn test_lines_partition_the_spoken_content() {
        let items = vec![
            spoken("a", "0.1"),
            punct(","),
            spoken("b", "0.5"),
            spoken("c", "1.0"),
            punct("."),
            spoken("d", "2.0"),
        ];
        let lines = assemble(
            &items,
            &index(&[("0.1", 0), ("0.5", 0), ("1.0", 1), ("2.0", 0)]),
        )
        .unwrap();

        let rebuilt: String = lines
            .iter()
            .flat_map(|l| l.text.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rebuilt, "a, b c. d");
    }

    #[test]
    fn test_empty_item_stream() {
        let lines = assemble(&[], &SpeakerStartIndex::new()).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_index_miss_is_fatal_and_names_the_time() {
        let items = vec![spoken("Hi", "0.1"), spoken("there", "7.7")];
        let err = assemble(&items, &index(&[("0.1", 0)])).unwrap_err();
        match err {
            TranscriptError::SpeakerIndexMiss { start_time } => assert_eq!(start_time, "7.7"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_spoken_item_without_start_time_is_fatal() {
        let mut item = spoken("Hi", "0.1");
        item.start_time = None;
        assert!(assemble(&[item], &SpeakerStartIndex::new()).is_err());
    }
}
