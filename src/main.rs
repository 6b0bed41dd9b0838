use archive_puller::archive::{DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE};
use archive_puller::cli::{
    PullOptions, clean_snapshot, pull_archive, sample_archive, split_snapshot,
};
use archive_puller::storage::DEFAULT_CHUNK_SIZE;
use archive_puller::transform::DEFAULT_SENTINEL;
use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SNAPSHOT: &str = "trump_tweets.json";

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Archive Puller: walk a search-backed tweet archive page by page into a local JSON snapshot
#[derive(Parser)]
#[command(name = "puller", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source endpoint settings and credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every record from the archive into a snapshot file
    Pull {
        /// Snapshot file to write
        #[arg(short, long, default_value = DEFAULT_SNAPSHOT)]
        output: PathBuf,

        /// Records requested per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..=10_000))]
        page_size: u64,

        /// Pause between pages, in milliseconds
        #[arg(long, default_value_t = DEFAULT_PAGE_DELAY.as_millis() as u64)]
        delay_ms: u64,

        /// Save a resumable checkpoint every N pages
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        checkpoint_every: Option<u64>,

        /// Continue from the checkpoint left by an aborted pull
        #[arg(long, requires = "checkpoint_every")]
        resume: bool,

        /// Drop records whose text is exactly "<p></p>" before saving
        #[arg(long)]
        drop_empty: bool,
    },

    /// Remove entries whose "text" field equals the empty-text marker
    Clean {
        /// Input snapshot file
        #[arg(long = "in", default_value = DEFAULT_SNAPSHOT)]
        input: PathBuf,

        /// Output snapshot file (default: overwrite the input atomically)
        #[arg(long = "out")]
        output: Option<PathBuf>,

        /// Text value to remove
        #[arg(long, default_value = DEFAULT_SENTINEL)]
        empty_text: String,
    },

    /// Slice a snapshot into chunk files plus a manifest.json for static hosting
    Split {
        /// Input snapshot file
        #[arg(long = "in", default_value = DEFAULT_SNAPSHOT)]
        input: PathBuf,

        /// Directory to write chunks into
        #[arg(long = "out-dir", default_value = "tweets")]
        output_dir: PathBuf,

        /// Records per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
        chunk_size: u64,
    },

    /// Fetch a few records to check credentials and field names
    Sample {
        /// Number of records to fetch
        #[arg(short, long, default_value_t = 5)]
        size: usize,

        /// Only match records where field=value (e.g. isRetweet=false)
        #[arg(short, long)]
        term: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::from_filename(&cli.env);

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if let Err(e) = dotenv {
        log::debug!("No settings loaded from {}: {}", cli.env.bright_black(), e);
    }

    match cli.command {
        Commands::Pull {
            output,
            page_size,
            delay_ms,
            checkpoint_every,
            resume,
            drop_empty,
        } => {
            let options = PullOptions {
                output,
                page_size: page_size as usize,
                delay: Duration::from_millis(delay_ms),
                checkpoint_every: checkpoint_every.map(|n| n as usize),
                resume,
                drop_empty,
            };
            pull_archive(&options).await?;
        }
        Commands::Clean {
            input,
            output,
            empty_text,
        } => {
            clean_snapshot(&input, output.as_deref(), &empty_text)?;
        }
        Commands::Split {
            input,
            output_dir,
            chunk_size,
        } => {
            split_snapshot(&input, &output_dir, chunk_size as usize)?;
        }
        Commands::Sample { size, term } => {
            let response = sample_archive(size, term.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
