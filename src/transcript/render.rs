use crate::error::TranscriptError;
use crate::models::roster::SpeakerRoster;
use crate::transcript::assembler::Line;
use crate::transcript::fillers::FillerFilter;

/// Format assembled lines as the transcript text block appended to a page.
///
/// One paragraph per speaker turn: an elapsed-time tag, the resolved speaker
/// name, and the normalized utterance. Lines are expected in chronological
/// order (the assembler's output contract).
pub fn render(
    lines: &[Line],
    roster: &SpeakerRoster,
    fillers: &FillerFilter,
) -> Result<String, TranscriptError> {
    let mut out = String::new();
    for line in lines {
        let name = roster.resolve(line.speaker)?;
        out.push_str("<time>");
        out.push_str(&format_elapsed(line.time));
        out.push_str("</time> ");
        out.push_str(name);
        out.push_str(": ");
        out.push_str(&fillers.normalize(&line.text));
        out.push_str("\n\n");
    }
    Ok(out)
}

/// Elapsed seconds as `H:MM:SS`, rounded to the nearest second.
pub fn format_elapsed(seconds: f64) -> String {
    let total = seconds.round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
