use super::apply::read_mutations;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use splice_editor::{EditOutcome, RemoteAuthority, Session};
use splice_timeline::Timeline;
use splice_workspace::{Config, HttpAuthority};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Server URL, overriding remoteUrl from splice.config.json
    #[arg(long, env = "SPLICE_REMOTE")]
    pub remote: Option<String>,
}

#[derive(Args, Debug)]
pub struct PushArgs {
    /// Timeline document (.otio)
    pub file: PathBuf,

    /// Timeline id on the server
    #[arg(short, long)]
    pub timeline: String,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[derive(Args, Debug)]
pub struct PullArgs {
    /// Timeline id on the server
    #[arg(short, long)]
    pub timeline: String,

    /// Fetch this version instead of the head
    #[arg(long)]
    pub version: Option<u64>,

    /// Where to write the document
    #[arg(short, long, default_value = "timeline.otio")]
    pub output: PathBuf,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Timeline id on the server
    #[arg(short, long)]
    pub timeline: String,

    /// Mark this version as approved before listing
    #[arg(long)]
    pub approve: Option<u64>,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// JSON file holding one mutation or an array of them
    pub mutations: PathBuf,

    /// Timeline id on the server
    #[arg(short, long)]
    pub timeline: String,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

fn connect(args: &RemoteArgs, cwd: &Path) -> Result<HttpAuthority> {
    connect_with(args, &Config::load(cwd)?)
}

fn connect_with(args: &RemoteArgs, config: &Config) -> Result<HttpAuthority> {
    let url = args.remote.clone().unwrap_or_else(|| config.remote_url());
    Ok(HttpAuthority::new(url, config.author_name.as_str())?)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread().enable_all().build()?)
}

/// Upload a local document as the new head; creates the timeline if needed
pub fn push(args: PushArgs, cwd: &Path) -> Result<()> {
    let document = Timeline::load(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let authority = connect(&args.remote, cwd)?;

    println!(
        "⬆️  {} {} to {}",
        "Pushing".green().bold(),
        args.file.display(),
        authority.base_url()
    );
    let committed = runtime()?.block_on(authority.replace(&args.timeline, document, None))?;

    println!(
        "   {} {} is now at version {}",
        "✓".green(),
        args.timeline,
        committed.checkpoint.version
    );
    Ok(())
}

pub fn pull(args: PullArgs, cwd: &Path) -> Result<()> {
    let authority = connect(&args.remote, cwd)?;

    println!("⬇️  {} {} from {}", "Pulling".green().bold(), args.timeline, authority.base_url());
    let snapshot = runtime()?.block_on(authority.fetch(&args.timeline, args.version))?;
    snapshot
        .document
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "   {} version {} → {}",
        "✓".green(),
        snapshot.version,
        args.output.display()
    );
    Ok(())
}

/// Commit mutations one by one through an editing session on the server
pub fn edit(args: EditArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let authority = Arc::new(connect_with(&args.remote, &config)?);
    let mutations = read_mutations(&args.mutations)?;

    println!(
        "✂️  {} {} mutation(s) to {}",
        "Editing".green().bold(),
        mutations.len(),
        args.timeline
    );

    runtime()?.block_on(async {
        let session = Session::open(args.timeline.as_str(), authority, config.session_config())
            .await
            .with_context(|| format!("Failed to open {}", args.timeline))?;

        let mut result = Ok(());
        for (index, mutation) in mutations.into_iter().enumerate() {
            let name = mutation.name();
            let description = mutation.describe();
            match session.edit(mutation).await {
                Ok(EditOutcome::Remote { version, .. }) => {
                    println!("   {} {} (version {})", "✓".green(), description, version);
                }
                Ok(EditOutcome::Local { .. }) => {
                    println!("   {} {} (not committed)", "!".yellow(), description);
                }
                Err(e) => {
                    let context = format!("Mutation {} ({}) failed", index, name);
                    result = Err(anyhow::Error::from(e).context(context));
                    break;
                }
            }
        }

        let pending = session.reconciler().lock().await.store().local_edit_counter();
        session.close().await;
        result?;
        if pending > 0 {
            bail!("Lost connection to the server; {} edit(s) were not committed", pending);
        }
        Ok(())
    })
}

pub fn history(args: HistoryArgs, cwd: &Path) -> Result<()> {
    let authority = connect(&args.remote, cwd)?;
    let runtime = runtime()?;

    if let Some(version) = args.approve {
        runtime.block_on(authority.approve(&args.timeline, version))?;
        println!("   {} approved version {}", "✓".green(), version);
    }

    let checkpoints = runtime.block_on(authority.checkpoints(&args.timeline))?;
    println!("📜 {} ({} checkpoints)", args.timeline.bold(), checkpoints.len());
    for checkpoint in checkpoints.iter().rev() {
        let approved = if checkpoint.is_approved { "✓".green() } else { " ".normal() };
        println!(
            "   {} {:>4}  {}  {}  {}",
            approved,
            checkpoint.version,
            checkpoint.created_at.format("%Y-%m-%d %H:%M:%S"),
            checkpoint.created_by.cyan(),
            checkpoint.description
        );
    }
    Ok(())
}
