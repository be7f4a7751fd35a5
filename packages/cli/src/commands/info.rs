use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use splice_timeline::{
    collect_asset_ids, effective_rate, item_duration, timeline_duration, track_duration, Composable,
    Timeline, TrackItem,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Timeline document (.otio)
    pub file: PathBuf,

    /// List every item on each track
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn info(args: InfoArgs) -> Result<()> {
    let timeline = Timeline::load(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let rate = effective_rate(&timeline);
    let duration = timeline_duration(&timeline).rescaled_to(rate);

    println!("🎬 {}", timeline.name.bold());
    println!("   Rate:     {} fps", rate);
    println!("   Duration: {} ({} frames)", duration.to_timecode(), duration.to_frames());
    println!();

    for (index, child) in timeline.tracks.children.iter().enumerate() {
        match child {
            Composable::Track(track) => {
                println!(
                    "   {} {} {} [{}] {}",
                    format!("#{}", index).dimmed(),
                    track.kind.to_string().cyan(),
                    track.name,
                    track.children.len(),
                    track_duration(track).rescaled_to(rate).to_timecode()
                );
                if args.verbose {
                    for (i, item) in track.children.iter().enumerate() {
                        print_item(i, item, rate);
                    }
                }
            }
            Composable::Stack(stack) => {
                let label = format!("#{}", index);
                println!("   {} {} {}", label.dimmed(), "Stack".magenta(), stack.name);
            }
        }
    }

    let assets = collect_asset_ids(&timeline);
    if !assets.is_empty() {
        println!();
        println!("   Assets: {}", assets.join(", "));
    }

    Ok(())
}

fn print_item(index: usize, item: &TrackItem, rate: f64) {
    let label = match item {
        TrackItem::Clip(_) => "clip".green(),
        TrackItem::Gap(_) => "gap".dimmed(),
        TrackItem::Transition(_) => "transition".yellow(),
        TrackItem::Stack(_) => "stack".magenta(),
    };
    println!(
        "       {:>3} {} {} {}",
        index,
        label,
        item.name(),
        item_duration(item).rescaled_to(rate).to_timecode()
    );
}
