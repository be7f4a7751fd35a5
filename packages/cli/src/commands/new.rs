use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use splice_timeline::{RationalTime, Timeline};
use splice_workspace::Config;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Where to write the empty timeline
    pub file: PathBuf,

    /// Timeline name (defaults to the file stem)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Frame rate, overriding defaultRate from splice.config.json
    #[arg(short, long)]
    pub rate: Option<f64>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn new_timeline(args: NewArgs, cwd: &Path) -> Result<()> {
    if args.file.exists() && !args.force {
        bail!("{} already exists (pass --force to overwrite)", args.file.display());
    }

    let config = Config::load(cwd)?;
    let rate = args.rate.unwrap_or(config.default_rate);
    RationalTime::try_new(0.0, rate)?;

    let name = args
        .name
        .or_else(|| args.file.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "Untitled".to_string());

    Timeline::new(name.as_str(), rate)
        .save(&args.file)
        .with_context(|| format!("Failed to write {}", args.file.display()))?;

    println!("🎬 {} {} at {} fps", "Created".green().bold(), name, rate);
    Ok(())
}
