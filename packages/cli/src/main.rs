mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, edit, history, info, new_timeline, pull, push, ApplyArgs, EditArgs, HistoryArgs,
    InfoArgs, NewArgs, PullArgs, PushArgs,
};
use tracing_subscriber::EnvFilter;

/// Splice CLI - inspect, edit and sync OTIO timelines
#[derive(Parser, Debug)]
#[command(name = "splice")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty timeline document
    New(NewArgs),

    /// Summarize a timeline document
    Info(InfoArgs),

    /// Apply mutations from a JSON file to a timeline document
    Apply(ApplyArgs),

    /// Apply mutations from a JSON file to a timeline on the server
    Edit(EditArgs),

    /// Upload a timeline document to the server
    Push(PushArgs),

    /// Download a timeline from the server
    Pull(PullArgs),

    /// List a timeline's checkpoints on the server
    History(HistoryArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::New(args) => new_timeline(args, &cwd),
            Command::Info(args) => info(args),
            Command::Apply(args) => apply(args),
            Command::Edit(args) => edit(args, &cwd),
            Command::Push(args) => push(args, &cwd),
            Command::Pull(args) => pull(args, &cwd),
            Command::History(args) => history(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
