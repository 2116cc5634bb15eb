use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use taskdeck::{
    cli::{self, RootCommand},
    db,
    logging::init_logging,
};

#[derive(Parser, Debug)]
#[command(
    name = "taskdeck",
    about = "Project task board with status columns and drag-style moves",
    version = env!("TASKDECK_BUILD_VERSION"),
    author
)]
struct Cli {
    /// Database file; defaults to the per-user data directory.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: RootCommand,
}

fn main() -> Result<()> {
    if let Err(err) = init_logging() {
        eprintln!("warning: failed to initialize logging: {err}");
    }

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(db::default_db_path);

    let code = cli::run(&db_path, cli.command, cli.json, cli.quiet);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
