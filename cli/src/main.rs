use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rig_framework_cli::{cmd_build, cmd_hash, cmd_reorder, cmd_template, cmd_validate};

#[derive(Parser, Debug)]
#[command(name = "rig-framework", version, about = "Build and inspect rig projects")]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a project for structural problems and parent loops.
    Validate {
        /// Project JSON.
        project: PathBuf,
    },
    /// Build a project into an in-memory scene and print its snapshot.
    Build {
        /// Project JSON.
        project: PathBuf,

        /// Last stage to build: proxy, skeleton or rig.
        #[arg(long, default_value = "rig")]
        stage: String,

        /// Write the snapshot here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the SHA-256 fingerprint of a project.
    Hash {
        /// Project JSON.
        project: PathBuf,
    },
    /// Reorder modules so each follows the module it attaches to.
    Reorder {
        /// Project JSON.
        project: PathBuf,

        /// Output path (defaults to rewriting the input).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a starter biped project.
    Template {
        /// Project name.
        #[arg(long, default_value = "biped")]
        name: String,

        /// Output path.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = match cli.cmd {
        Command::Validate { project } => cmd_validate(&project)?,
        Command::Build { project, stage, out } => cmd_build(&project, &stage, out.as_deref())?,
        Command::Hash { project } => cmd_hash(&project)?,
        Command::Reorder { project, out } => cmd_reorder(&project, out.as_deref())?,
        Command::Template { name, out } => cmd_template(&name, out.as_deref())?,
    };
    println!("{}", output);
    Ok(())
}
