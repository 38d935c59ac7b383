use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};
use tracing::{info, warn};

use crate::models::episode::EpisodeRecord;

/// Render every episode data file under `episode_folder` into a markdown
/// page in `output`. Episodes that fail to render are logged and skipped so
/// one bad data file does not sink the whole site build.
pub fn create_pages(episode_folder: &Path, output: &Path) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output folder {output:?}"))?;

    let entries = std::fs::read_dir(episode_folder)
        .with_context(|| format!("Failed to read episode folder {episode_folder:?}"))?;
    for entry in entries {
        let datafile = entry?.path().join("episode.yaml");
        if !datafile.is_file() {
            continue;
        }
        if let Err(err) = create_page(&datafile, output) {
            warn!("Skipping page for {:?}: {:#}", datafile, err);
        }
    }
    Ok(())
}

fn create_page(datafile: &Path, output: &Path) -> Result<()> {
    let episode = EpisodeRecord::load(datafile)?;

    let field = |name: &str| {
        episode
            .get_str(name)
            .with_context(|| format!("Episode data is missing '{name}'"))
    };

    let published = NaiveDate::parse_from_str(field("published")?, "%Y-%m-%d")
        .context("Episode has an unparseable publish date")?;

    let mut front_matter = Mapping::new();
    front_matter.insert("title".into(), field("title")?.into());
    front_matter.insert("id".into(), field("id")?.into());
    front_matter.insert(
        "publishDate".into(),
        published.format("%Y-%m-%d").to_string().into(),
    );
    front_matter.insert("excerpt".into(), field("excerpt")?.into());
    front_matter.insert("youtubeid".into(), field("youtubeid")?.into());
    front_matter.insert("image".into(), field("image")?.into());
    front_matter.insert("draft".into(), Value::Bool(false));

    let shownotes = field("shownotes")?;
    let mut page = format!(
        "---\n{}---\n",
        serde_yaml::to_string(&front_matter).context("Failed to serialise front matter")?
    );

    match episode.get_str("transcript") {
        None => page.push_str(shownotes),
        Some(transcript_path) => {
            page.push_str("<a name=\"top\"></a>[Jump to transcript](#transcript)\n");
            page.push_str("## Show notes\n");
            page.push_str(shownotes);
            page.push('\n');
            page.push_str("[Back to top](#top)\n");
            page.push_str("<a name=\"transcript\"></a>\n");
            page.push_str("## Transcript\n");
            match std::fs::read_to_string(transcript_path) {
                Ok(transcript) => page.push_str(&transcript),
                Err(err) => warn!("Failed to read transcript {}: {}", transcript_path, err),
            }
            page.push_str("[Back to top](#top)\n");
        }
    }

    let page_path = output.join(format!("{}.md", field("filename")?));
    info!("Writing {:?}", page_path);
    std::fs::write(&page_path, page)
        .with_context(|| format!("Failed to write page {page_path:?}"))?;
    Ok(())
}
