mod content;
mod context;
mod feed;
mod issues;
mod snapshot;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "voices-cli")]
#[command(about = "Independent Voices content pipeline command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Latest content and lean aggregation
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
    /// Feed discovery
    Feed {
        #[command(subcommand)]
        command: FeedCommands,
    },
    /// Channel page resolution
    Channel {
        #[command(subcommand)]
        command: ChannelCommands,
    },
    /// Key-issues generation and inspection
    Issues {
        #[command(subcommand)]
        command: IssuesCommands,
    },
    /// Batch updates to the commentator snapshot
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ContentCommands {
    /// Fetch latest video and article per commentator through the cache
    Latest {
        /// Only this commentator id
        #[arg(long)]
        id: Option<String>,
    },
    /// Recent blog articles grouped by lean
    Aggregate,
}

#[derive(Debug, Subcommand)]
enum FeedCommands {
    /// Find the working feed for a site and print its newest items
    Locate {
        url: String,
        #[arg(long, default_value_t = voices_feeds::DEFAULT_MAX_ITEMS)]
        max_items: usize,
    },
}

#[derive(Debug, Subcommand)]
enum ChannelCommands {
    /// Resolve a channel page URL to its channel id
    Resolve { url: String },
}

#[derive(Debug, Subcommand)]
enum IssuesCommands {
    /// Run the generation job once
    Generate,
    /// Print the stored key-issues document
    Show,
}

#[derive(Debug, Subcommand)]
enum SnapshotCommands {
    /// Scrape channel ids for entries that lack one
    PopulateChannelIds,
    /// Refresh subscriber and follower counts
    UpdateFollowers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = voices_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Content { command }) => match command {
            ContentCommands::Latest { id } => {
                content::run_latest(&config, id.as_deref()).await?;
            }
            ContentCommands::Aggregate => content::run_aggregate(&config).await?,
        },
        Some(Commands::Feed {
            command: FeedCommands::Locate { url, max_items },
        }) => feed::run_locate(&config, &url, max_items).await?,
        Some(Commands::Channel {
            command: ChannelCommands::Resolve { url },
        }) => feed::run_resolve_channel(&config, &url).await?,
        Some(Commands::Issues { command }) => match command {
            IssuesCommands::Generate => issues::run_generate(&config).await?,
            IssuesCommands::Show => issues::run_show(&config).await?,
        },
        Some(Commands::Snapshot { command }) => match command {
            SnapshotCommands::PopulateChannelIds => {
                snapshot::run_populate_channel_ids(&config).await?;
            }
            SnapshotCommands::UpdateFollowers => snapshot::run_update_followers(&config).await?,
        },
        None => println!("voices-cli ready; see --help for commands"),
    }

    Ok(())
}
