use regex::{Captures, Regex};

use crate::error::TranscriptError;

/// Removes configured filler words ("um", "uh", ...) from transcript lines.
///
/// Two phases, mirroring how fillers appear in speech:
///
/// 1. A sentence-initial pass, repeated over all fillers until a full pass
///    removes nothing. The fixed point makes the result independent of filler
///    ordering and handles adjacent fillers ("Um er um er ha" collapses
///    fully). Removing a sentence-initial filler up-cases the next word.
/// 2. A residual pass that drops remaining mid-sentence occurrences without
///    touching capitalization.
///
/// Every rule strictly shortens the text, so the length check is a sound
/// convergence test. The overall transform is idempotent.
pub struct FillerFilter {
    rules: Vec<FillerRules>,
}

struct FillerRules {
    /// Filler at the very start of the text, followed by a word.
    leading: Regex,
    /// Filler after sentence-ending punctuation, followed by a word.
    sentence: Regex,
    /// Filler flanked by commas.
    comma_flanked: Regex,
    /// Any remaining standalone occurrence.
    residual: Regex,
}

impl FillerRules {
    fn compile(filler: &str) -> Result<Self, regex::Error> {
        let word = regex::escape(filler);
        Ok(Self {
            leading: Regex::new(&format!("(?i)^{word},? ([A-Za-z0-9])"))?,
            sentence: Regex::new(&format!("(?i)([.?!:]) {word},? ([A-Za-z0-9])"))?,
            comma_flanked: Regex::new(&format!("(?i), {word},"))?,
            residual: Regex::new(&format!("(?i) {word},?( )"))?,
        })
    }

    /// One application of the sentence-initial rules over the whole text.
    fn strip_sentence_initial(&self, text: &str) -> String {
        let text = self
            .leading
            .replace(text, |caps: &Captures| upper_first(&caps[1]));
        let text = self.sentence.replace_all(&text, |caps: &Captures| {
            format!("{} {}", &caps[1], upper_first(&caps[2]))
        });
        self.comma_flanked.replace_all(&text, ",").into_owned()
    }

    /// Drop standalone occurrences. The trailing space is part of the match
    /// (there is no lookahead), so adjacent fillers need repeated passes.
    fn strip_residual(&self, text: &str) -> String {
        let mut text = text.to_string();
        loop {
            let replaced = self.residual.replace_all(&text, "${1}");
            if replaced == text {
                return text;
            }
            text = replaced.into_owned();
        }
    }
}

impl FillerFilter {
    /// Compile the rule set for the configured filler words. An empty list
    /// yields a no-op filter.
    pub fn new(fillers: &[String]) -> Result<Self, TranscriptError> {
        let rules = fillers
            .iter()
            .map(|f| FillerRules::compile(f))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn is_noop(&self) -> bool {
        self.rules.is_empty()
    }

    /// Remove filler words from `text`. Leading and trailing whitespace of
    /// the result is left for the caller to manage.
    pub fn normalize(&self, text: &str) -> String {
        if self.rules.is_empty() {
            return text.to_string();
        }

        let mut text = text.to_string();

        // Sentence-initial pass to a fixed point over all fillers.
        let mut old_len = text.len() + 1;
        while text.len() < old_len {
            old_len = text.len();
            for rule in &self.rules {
                text = rule.strip_sentence_initial(&text);
            }
        }

        for rule in &self.rules {
            text = rule.strip_residual(&text);
        }

        text
    }
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(fillers: &[&str]) -> FillerFilter {
        let fillers: Vec<String> = fillers.iter().map(|f| f.to_string()).collect();
        FillerFilter::new(&fillers).unwrap()
    }

    #[test]
    fn test_leading_filler_capitalizes_next_word() {
        assert_eq!(filter(&["um"]).normalize("Um ha"), "Ha");
        assert_eq!(
            filter(&["um"]).normalize("Um, that, that's a good question"),
            "That, that's a good question"
        );
    }

    #[test]
    fn test_mid_sentence_fillers() {
        let f = filter(&["um"]);
        assert_eq!(f.normalize("Ho um hum"), "Ho hum");
        assert_eq!(f.normalize("Ho, um, hum"), "Ho, hum");
        assert_eq!(f.normalize("Ho, um, um, hum"), "Ho, hum");
        assert_eq!(f.normalize("So yeah, Um so, one of the"), "So yeah, so, one of the");
    }

    #[test]
    fn test_filler_after_sentence_punctuation() {
        assert_eq!(
            filter(&["um"]).normalize("knowledge. Um, yeah, "),
            "knowledge. Yeah, "
        );
    }

    #[test]
    fn test_multiple_fillers() {
        assert_eq!(
            filter(&["um", "uh"])
                .normalize("Um, and I think I'm not sure, uh, we could ask legal um, practitioners"),
            "And I think I'm not sure, we could ask legal practitioners"
        );
    }

    #[test]
    fn test_adjacent_fillers_collapse_fully() {
        assert_eq!(filter(&["um", "er"]).normalize("Um er um er ha"), "Ha");
    }

    #[test]
    fn test_word_boundary_discipline() {
        let f = filter(&["um"]);
        assert_eq!(f.normalize("Umbrella weather"), "Umbrella weather");
        assert_eq!(f.normalize("a yummy plum pie"), "a yummy plum pie");
    }

    #[test]
    fn test_empty_filler_list_is_noop() {
        let f = filter(&[]);
        assert!(f.is_noop());
        assert_eq!(f.normalize("Um ha"), "Um ha");
    }

    #[test]
    fn test_idempotent() {
        let f = filter(&["um", "uh", "er"]);
        for text in [
            "Um ha",
            "Ho, um, hum",
            "Um er um er ha",
            "Um, and I think I'm not sure, uh, we could ask legal um, practitioners",
            "no fillers here at all",
        ] {
            let once = f.normalize(text);
            assert_eq!(f.normalize(&once), once, "not idempotent for {text:?}");
        }
    }

    #[test]
    fn test_order_independent() {
        let texts = [
            "Um er um er ha",
            "Ho, um, er, hum",
            "knowledge. Um, er, yeah, ",
        ];
        for text in texts {
            let forward = filter(&["um", "er"]).normalize(text);
            let reverse = filter(&["er", "um"]).normalize(text);
            assert_eq!(forward, reverse, "order-dependent for {text:?}");
        }
    }
}
