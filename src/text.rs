//! Text extraction and normalization rules shared by the feed fetchers.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;

macro_rules! static_regex {
    ($name:ident, $pattern:literal) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("static regex"));
    };
}

/// Episode numbers for titles that never carried the `#NNN` form correctly.
/// Data corrections, not configuration.
const EPISODE_NO_FIXES: &[(&str, u32)] = &[
    ("#482 Lauren Brent", 483),
    ("731 ", 731),
    ("744 ", 744),
];

static_regex!(EPISODE_NO, r"^#([0-9]+)");

/// Episode number from a title of the form `#NNN ...`, or 0 when the title
/// is not an episode.
pub fn episode_no(title: &str) -> u32 {
    for (prefix, number) in EPISODE_NO_FIXES {
        if title.starts_with(prefix) {
            return *number;
        }
    }
    EPISODE_NO
        .captures(title)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

static_regex!(TITLE_EPISODE_PREFIX, r"^#[0-9]+ ");
static_regex!(NAME_SEPARATOR, r" *[,&] *");

/// Speaker names extracted from an episode title.
///
/// The name list is the text before the first top-level delimiter: a
/// space-flanked hyphen when it precedes any colon (the spaces avoid
/// matching hyphenated names), otherwise the first colon. The remainder
/// splits on comma or ampersand.
pub fn speakers_from_title(title: &str) -> Vec<String> {
    let title = TITLE_EPISODE_PREFIX.replace(title, "");
    let title = title.as_ref();

    let hyphen = title.find(" - ");
    let colon = title.find(':');
    let head = match (hyphen, colon) {
        (Some(h), Some(c)) if h < c => &title[..h],
        (Some(h), None) => &title[..h],
        (_, Some(c)) => &title[..c],
        (None, None) => title,
    };

    NAME_SEPARATOR
        .split(head)
        .map(str::to_string)
        .collect()
}

static_regex!(NF_PUNCTUATION, r"[!,.?]");
static_regex!(NF_SPECIALS, r"[^A-Za-z0-9- ]");

/// URL-friendly file name from a title: punctuation to spaces, special
/// characters removed, spaces to hyphens.
pub fn normalise_filename(title: &str) -> String {
    let title = NF_PUNCTUATION.replace_all(title, " ");
    let title = NF_SPECIALS.replace_all(&title, "");
    title.trim().replace(' ', "-")
}

static_regex!(IMG_SUBDOMAIN, r"^(https://i)[0-9]+(\.ytimg\.com/)");
static_regex!(IMG_HQDEFAULT, r"^(https://i\.ytimg\.com/vi/[^/]+)/hqdefault\.jpg$");

/// Stabilize thumbnail URLs: collapse numbered load-balancing subdomains so
/// re-imports don't see spurious changes, and upgrade the RSS feed's
/// `hqdefault.jpg` to `maxresdefault.jpg`.
pub fn normalise_image_url(url: &str) -> String {
    let url = IMG_SUBDOMAIN.replace(url, "${1}${2}");
    IMG_HQDEFAULT
        .replace(&url, "${1}/maxresdefault.jpg")
        .into_owned()
}

static_regex!(DATE_WEEKDAY, r"^[A-Za-z]+, *");
static_regex!(DATE_ZONE, r" *[A-Z]+$");
static_regex!(DATE_TIME, r" *[0-9][0-9]:[0-9][0-9]:[0-9][0-9]$");

/// `Mon, 16 Oct 2023 18:00:00 GMT` (weekday, time and zone optional) to
/// `2023-10-16`.
pub fn normalise_date(date: &str) -> Result<String> {
    let date = DATE_WEEKDAY.replace(date, "");
    let date = DATE_ZONE.replace(&date, "");
    let date = DATE_TIME.replace(&date, "");

    let parsed = NaiveDate::parse_from_str(date.trim(), "%d %b %Y")
        .with_context(|| format!("Unrecognized date format: {date:?}"))?;
    Ok(parsed.format("%Y-%m-%d").to_string())
}

// The "Support the channel" block was appended to show notes in a few
// vintages, each with a different final link.
static_regex!(
    SUPPORT_V3,
    r"(?s)------------------Support the channel------------.*enlites\.com/\n"
);
static_regex!(
    SUPPORT_V2,
    r"(?s)------------------Support the channel------------.*anchor\.fm/thedissenter\n"
);
static_regex!(
    SUPPORT_V1,
    r"(?s)------------------Support the channel------------.*twitter\.com/TheDissenterYT\n"
);
static_regex!(LEADING_BLANK, r"^[\n]*");
static_regex!(CREDITS, r"(?s)[-]*\nA HUGE THANK YOU.*$");
static_regex!(DASH_RULE, r"\n *-[-]+ *\n");
static_regex!(SINGLE_BREAK, r"([^\n])\n([^\n])");

/// Clean plain-text show notes from the video description: support blocks
/// and credits removed, dash runs become horizontal rules, single line
/// breaks get trailing double spaces so Markdown keeps them.
pub fn trim_shownotes(shownotes: &str) -> String {
    let shownotes = SUPPORT_V3.replace_all(shownotes, "");
    let shownotes = SUPPORT_V2.replace_all(&shownotes, "");
    let shownotes = SUPPORT_V1.replace_all(&shownotes, "");
    let shownotes = LEADING_BLANK.replace(&shownotes, "");
    let shownotes = CREDITS.replace_all(&shownotes, "");
    let shownotes = DASH_RULE.replace_all(&shownotes, "\n\n---\n\n");
    SINGLE_BREAK
        .replace_all(&shownotes, "${1}  \n${2}")
        .into_owned()
}

static_regex!(
    HTML_SUPPORT_V3,
    r"(?s)<p>------------------Support the channel------------</p>.*enlites\.com/</a></p>\n"
);
static_regex!(
    HTML_SUPPORT_V2,
    r"(?s)<p>------------------Support the channel------------</p>.*anchor\.fm/thedissenter</a></p>\n"
);
static_regex!(
    HTML_SUPPORT_V1,
    r"(?s)<p>------------------Support the channel------------</p>.*twitter\.com/TheDissenterYT</a></p>\n"
);
static_regex!(HTML_LEADING_BLANK, r"^<p>[ -\u{A0}]*</p>\n");
static_regex!(HTML_LEADING_BR, r"^<p><br></p>\n");
static_regex!(HTML_LEADING_NEWLINE, r"^\n");
static_regex!(HTML_CREDITS_LINK, r#"(?s)<p><a href="">A HUGE THANK YOU.*$"#);
static_regex!(HTML_CREDITS, r"(?s)<p>A HUGE THANK YOU.*$");
static_regex!(HTML_TRAILING_BLANK, r"(?s)<p>[ -]*</p>\n$");
static_regex!(TRAILING_NEWLINES, r"\n\n$");

/// HTML variant of [`trim_shownotes`], for descriptions delivered as markup.
pub fn trim_shownotes_html(shownotes: &str) -> String {
    let shownotes = HTML_SUPPORT_V3.replace_all(shownotes, "");
    let shownotes = HTML_SUPPORT_V2.replace_all(&shownotes, "");
    let shownotes = HTML_SUPPORT_V1.replace_all(&shownotes, "");
    let shownotes = HTML_LEADING_BLANK.replace(&shownotes, "");
    let shownotes = HTML_LEADING_BR.replace(&shownotes, "");
    let shownotes = HTML_LEADING_NEWLINE.replace(&shownotes, "");
    let shownotes = HTML_CREDITS_LINK.replace_all(&shownotes, "");
    let shownotes = HTML_CREDITS.replace_all(&shownotes, "");
    let shownotes = HTML_TRAILING_BLANK.replace_all(&shownotes, "");
    TRAILING_NEWLINES.replace(&shownotes, "\n").into_owned()
}

static_regex!(AUDIO_EXT, r"\.[a-z0-9]+$");

/// Audio file extension from a download URL, `.mp3` when the URL carries
/// none.
pub fn audio_extension(url: &str) -> &str {
    AUDIO_EXT.find(url).map(|m| m.as_str()).unwrap_or(".mp3")
}

static_regex!(RECORDED_ON, r"^RECORDED ON.*\n");
static_regex!(FIRST_LINE, r"(?s)\n.*$");
static_regex!(HTML_TAG, r"(?s)<[^>]+>");

/// One-line excerpt: the first real line of the show notes, tags stripped.
/// Trailing whitespace is dropped; [`trim_shownotes`] leaves two spaces
/// before each line break and those must not leak into the excerpt.
pub fn make_summary(shownotes: &str) -> String {
    let summary = RECORDED_ON.replace(shownotes, "");
    let summary = FIRST_LINE.replace(&summary, "");
    HTML_TAG.replace_all(&summary, "").trim_end().to_string()
}
