use clap::{Parser, Subcommand};
use anyhow::Result;

mod cli;

#[derive(Parser)]
#[command(name = "pocket-pick")]
#[command(about = "Pick a random Pocket favorite and sweep out dead links", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(long, global = true, help = "Log deletions instead of sending them")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Check favorites for dead links and delete them")]
    CheckDeadLink {
        #[arg(
            long,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..),
            help = "Number of concurrent link checkers"
        )]
        workers: Option<usize>,

        #[arg(
            long,
            value_parser = clap::value_parser!(u64).range(1..),
            help = "Per-request timeout in seconds"
        )]
        timeout: Option<u64>,

        #[arg(long = "skip", help = "Item id to leave alone (repeatable)")]
        skip: Vec<String>,
    },

    #[command(about = "Delete articles by item id or url")]
    Delete {
        #[arg(required = true, help = "Item ids or article urls")]
        targets: Vec<String>,
    },

    #[command(about = "Print the read url of a random favorite")]
    Pick,

    #[command(about = "Show version information")]
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    pocket_pick::logging::init_logging(cli.verbose);

    let config = cli::Config {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::CheckDeadLink { workers, timeout, skip } => {
            let options = cli::SweepOptions { workers, timeout, skip };
            cli::check_dead_link(options, &config).await?;
        }
        Commands::Delete { targets } => {
            cli::delete(targets, &config).await?;
        }
        Commands::Pick => {
            cli::pick(&config).await?;
        }
        Commands::Version => {
            cli::version();
        }
    }

    Ok(())
}
