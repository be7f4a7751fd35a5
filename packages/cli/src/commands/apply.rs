use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use splice_editor::Mutation;
use splice_timeline::Timeline;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Timeline document (.otio)
    pub file: PathBuf,

    /// JSON file holding one mutation or an array of them
    pub mutations: PathBuf,

    /// Where to write the result (defaults to overwriting the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Validate without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn apply(args: ApplyArgs) -> Result<()> {
    let mut timeline = Timeline::load(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let mutations = read_mutations(&args.mutations)?;

    println!("✂️  {} {} mutation(s)", "Applying".green().bold(), mutations.len());
    for (index, mutation) in mutations.iter().enumerate() {
        timeline = mutation
            .apply(&timeline)
            .with_context(|| format!("Mutation {} ({}) failed", index, mutation.name()))?;
        println!("   {} {}", "✓".green(), mutation.describe());
    }

    if args.dry_run {
        println!();
        println!("   {}", "Dry run, nothing written".yellow());
        return Ok(());
    }

    let output = args.output.unwrap_or(args.file);
    timeline
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!();
    println!("✨ {} {}", "Wrote".green().bold(), output.display());
    Ok(())
}

pub(crate) fn read_mutations(path: &Path) -> Result<Vec<Mutation>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let mutations = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(mutations)
}
