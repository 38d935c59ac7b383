use crate::error::TranscriptError;

/// Ordered speaker names for one episode.
///
/// Ordinal 0 (and any further leading slots) belong to the configured
/// interviewer names; the remaining slots are the interviewees. Built once
/// per rendering pass and read-only afterwards.
#[derive(Debug, Clone)]
pub struct SpeakerRoster {
    episode_id: String,
    names: Vec<String>,
}

impl SpeakerRoster {
    /// Assemble the roster from the interviewer defaults and the episode's
    /// interviewee names. Callers decide interviewee precedence: an explicit
    /// per-episode configuration entry wins over names parsed from the title.
    pub fn build(episode_id: &str, interviewer: &[String], interviewees: &[String]) -> Self {
        let mut names = Vec::with_capacity(interviewer.len() + interviewees.len());
        names.extend_from_slice(interviewer);
        names.extend_from_slice(interviewees);
        Self {
            episode_id: episode_id.to_string(),
            names,
        }
    }

    /// Display name for a diarization ordinal. An ordinal beyond the roster
    /// is a diarization/configuration mismatch the operator must fix, not
    /// something to paper over with a default name.
    pub fn resolve(&self, ordinal: u32) -> Result<&str, TranscriptError> {
        self.names
            .get(ordinal as usize)
            .map(|name| name.as_str())
            .ok_or_else(|| TranscriptError::SpeakerOutOfRange {
                ordinal,
                roster_len: self.names.len(),
                episode_id: self.episode_id.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_interviewer_takes_ordinal_zero() {
        let roster = names(&["Ricardo"]);
        let guests = names(&["Jane Doe", "John Smith"]);
        let roster = SpeakerRoster::build("512", &roster, &guests);

        assert_eq!(roster.resolve(0).unwrap(), "Ricardo");
        assert_eq!(roster.resolve(1).unwrap(), "Jane Doe");
        assert_eq!(roster.resolve(2).unwrap(), "John Smith");
    }

    #[test]
    fn test_out_of_range_names_ordinal_and_episode() {
        let roster = SpeakerRoster::build("512", &names(&["Ricardo"]), &names(&["Jane", "Kim"]));
        let err = roster.resolve(5).unwrap_err();
        match err {
            TranscriptError::SpeakerOutOfRange {
                ordinal,
                roster_len,
                episode_id,
            } => {
                assert_eq!(ordinal, 5);
                assert_eq!(roster_len, 3);
                assert_eq!(episode_id, "512");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
