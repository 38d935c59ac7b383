use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use podforge::{Config, FsStore, ObjectStore, fetch_all};

#[derive(Parser)]
#[command(name = "podforge")]
#[command(author, version, about = "Podcast metadata and transcript pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import episode metadata from the configured data sources
    Import {
        /// Inline configuration (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Configuration file
        #[arg(short = 'f', long)]
        configfile: Option<PathBuf>,

        /// Use only the inline configuration, ignoring any config file
        #[arg(short, long)]
        r#override: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Convert downloaded transcription payloads to transcript text
    Transcript {
        /// Inline configuration (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Configuration file
        #[arg(short = 'f', long)]
        configfile: Option<PathBuf>,

        /// Use only the inline configuration, ignoring any config file
        #[arg(short, long)]
        r#override: bool,

        /// Convert a single episode instead of all pending ones
        #[arg(short, long)]
        episode: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Render episode data files into markdown pages
    Pages {
        /// Inline configuration (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Configuration file
        #[arg(short = 'f', long)]
        configfile: Option<PathBuf>,

        /// Use only the inline configuration, ignoring any config file
        #[arg(short, long)]
        r#override: bool,

        /// Output directory for the generated pages
        #[arg(short = 'u', long)]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Upload one episode's audio for transcription
    Upload {
        /// Inline configuration (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Configuration file
        #[arg(short = 'f', long)]
        configfile: Option<PathBuf>,

        /// Use only the inline configuration, ignoring any config file
        #[arg(short, long)]
        r#override: bool,

        /// Audio URL to upload
        #[arg(short = 'l', long)]
        url: String,

        /// Episode id the audio belongs to
        #[arg(short, long)]
        episode: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            config,
            configfile,
            r#override,
            verbose,
        } => {
            setup_logging(verbose);
            let config = Config::load(config.as_deref(), configfile.as_deref(), r#override)?;
            run_import(&config).await
        }
        Commands::Transcript {
            config,
            configfile,
            r#override,
            episode,
            verbose,
        } => {
            setup_logging(verbose);
            let config = Config::load(config.as_deref(), configfile.as_deref(), r#override)?;
            run_transcript(&config, episode.as_deref())
        }
        Commands::Pages {
            config,
            configfile,
            r#override,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            let config = Config::load(config.as_deref(), configfile.as_deref(), r#override)?;
            podforge::pages::create_pages(&config.episode_folder, &output)
        }
        Commands::Upload {
            config,
            configfile,
            r#override,
            url,
            episode,
            verbose,
        } => {
            setup_logging(verbose);
            let config = Config::load(config.as_deref(), configfile.as_deref(), r#override)?;
            run_upload(&config, &url, &episode).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn run_import(config: &Config) -> Result<()> {
    let store = FsStore::new(&config.store_folder);
    fetch_all(config, &store).await
}

/// Convert one episode's transcript, or every episode with a pending
/// transcription payload. One bad payload does not stop the batch.
fn run_transcript(config: &Config, episode: Option<&str>) -> Result<()> {
    if let Some(episode_id) = episode {
        match podforge::transcript::convert_episode(config, episode_id)? {
            Some(path) => info!("Wrote transcript {:?}", path),
            None => warn!("Episode {} has no transcription payload", episode_id),
        }
        return Ok(());
    }

    let entries = std::fs::read_dir(&config.episode_folder).with_context(|| {
        format!(
            "Failed to read episode folder {:?}",
            config.episode_folder
        )
    })?;
    for entry in entries {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let episode_id = entry.file_name().to_string_lossy().into_owned();
        match podforge::transcript::convert_episode(config, &episode_id) {
            Ok(Some(path)) => info!("Wrote transcript {:?}", path),
            Ok(None) => {}
            Err(err) => warn!("Episode {} failed to convert: {:#}", episode_id, err),
        }
    }
    Ok(())
}

async fn run_upload(config: &Config, url: &str, episode_id: &str) -> Result<()> {
    let Some(audio_bucket) = config.audio_bucket.as_deref() else {
        bail!("No audio bucket is configured");
    };
    let store = FsStore::new(&config.store_folder);

    let filename = format!("{episode_id}{}", podforge::text::audio_extension(url));
    let path = std::env::temp_dir().join(&filename);
    let client = reqwest::Client::new();
    if !podforge::fetch::http::download_to_file(&client, url, &path).await? {
        bail!("Failed to download audio from {url}");
    }
    store.upload(audio_bucket, &filename, &path).await?;
    info!("Uploaded {} for episode {}", filename, episode_id);
    Ok(())
}
