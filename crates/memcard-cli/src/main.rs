mod cmd_config;
mod cmd_init;
mod cmd_schema;
mod cmd_split;
mod cmd_verify;
mod config;

use clap::{Parser, Subcommand};
use cmd_config::ConfigCmd;
use config::{ChunkOverrides, Overrides};
use memcard_store::ProjectPaths;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "memcard",
    version,
    about = "Chunk role-play transcripts into memory card skeletons and validate filled cards"
)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write memcard.json and a starter schema.yaml
    Init,
    /// Chunk new transcript content and write or reconcile record skeletons
    Split {
        #[command(flatten)]
        paths: Overrides,
        #[command(flatten)]
        chunking: ChunkOverrides,
    },
    /// Validate filled records against the schema
    Verify {
        #[command(flatten)]
        paths: Overrides,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
        /// Also report optional fields that are still empty
        #[arg(long)]
        report_unfilled_optional: bool,
    },
    /// Load the schema and print its field tree
    Schema {
        #[command(flatten)]
        paths: Overrides,
        /// Print an empty record skeleton instead of the tree
        #[arg(long)]
        skeleton: bool,
    },
    /// Read or write project config (memcard.json)
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = match cli.root {
        Some(r) => r,
        None => std::env::current_dir()?,
    };
    let paths = ProjectPaths::discover(root);

    let ok = match cli.cmd {
        Command::Init => cmd_init::execute(&paths).map(|()| true)?,
        Command::Split { paths: o, chunking } => cmd_split::execute(&paths, &o, &chunking)?,
        Command::Verify {
            paths: o,
            json,
            report_unfilled_optional,
        } => cmd_verify::execute(&paths, &o, json, report_unfilled_optional)?,
        Command::Schema { paths: o, skeleton } => {
            cmd_schema::execute(&paths, &o, skeleton).map(|()| true)?
        }
        Command::Config { cmd } => cmd_config::run(cmd, &paths).map(|()| true)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
