//! Read-only traversal helpers shared by the mutation engine and external
//! consumers (layout, render manifests). Nothing here mutates a document.

use crate::schema::{
    Clip, Composable, Gap, MediaReference, Stack, Timeline, Track, TrackItem, Transition,
};
use crate::time::{RationalTime, TimeRange};
use std::collections::HashSet;

/// Rate used when a document carries no discoverable rate at all
pub const DEFAULT_RATE: f64 = 24.0;

/// Visitor pattern for walking a timeline immutably
///
/// Default implementations walk the whole tree, descending into nested
/// stacks. Override a `visit_*` method to act on a node; call the matching
/// `walk_*` function from the override to keep descending.
pub trait Visitor: Sized {
    fn visit_timeline(&mut self, timeline: &Timeline) {
        walk_timeline(self, timeline);
    }

    fn visit_stack(&mut self, stack: &Stack) {
        walk_stack(self, stack);
    }

    fn visit_track(&mut self, track: &Track) {
        walk_track(self, track);
    }

    fn visit_item(&mut self, item: &TrackItem) {
        walk_item(self, item);
    }

    fn visit_clip(&mut self, clip: &Clip) {
        walk_clip(self, clip);
    }

    fn visit_gap(&mut self, _gap: &Gap) {}

    fn visit_transition(&mut self, _transition: &Transition) {}

    fn visit_media_reference(&mut self, _reference: &MediaReference) {}
}

pub fn walk_timeline<V: Visitor>(visitor: &mut V, timeline: &Timeline) {
    visitor.visit_stack(&timeline.tracks);
}

pub fn walk_stack<V: Visitor>(visitor: &mut V, stack: &Stack) {
    for child in &stack.children {
        match child {
            Composable::Track(track) => visitor.visit_track(track),
            Composable::Stack(nested) => visitor.visit_stack(nested),
        }
    }
}

pub fn walk_track<V: Visitor>(visitor: &mut V, track: &Track) {
    for item in &track.children {
        visitor.visit_item(item);
    }
}

pub fn walk_item<V: Visitor>(visitor: &mut V, item: &TrackItem) {
    match item {
        TrackItem::Clip(clip) => visitor.visit_clip(clip),
        TrackItem::Gap(gap) => visitor.visit_gap(gap),
        TrackItem::Transition(transition) => visitor.visit_transition(transition),
        TrackItem::Stack(stack) => visitor.visit_stack(stack),
    }
}

pub fn walk_clip<V: Visitor>(visitor: &mut V, clip: &Clip) {
    visitor.visit_media_reference(&clip.media_reference);
}

/// Duration of a single track item.
///
/// A Transition reports `in_offset + out_offset`, but that value is overlap
/// and is never accumulated into a track's duration.
pub fn item_duration(item: &TrackItem) -> RationalTime {
    match item {
        TrackItem::Clip(clip) => clip.source_range.duration,
        TrackItem::Gap(gap) => gap.source_range.duration,
        TrackItem::Transition(transition) => transition.in_offset + transition.out_offset,
        TrackItem::Stack(stack) => stack_duration(stack),
    }
}

/// Sum of non-Transition children, unless `source_range` overrides it
pub fn track_duration(track: &Track) -> RationalTime {
    if let Some(range) = &track.source_range {
        return range.duration;
    }

    track
        .children
        .iter()
        .filter(|item| !item.is_transition())
        .map(item_duration)
        .reduce(|total, duration| total + duration)
        .unwrap_or(RationalTime::zero(DEFAULT_RATE))
}

/// Longest child, unless `source_range` overrides it
pub fn stack_duration(stack: &Stack) -> RationalTime {
    if let Some(range) = &stack.source_range {
        return range.duration;
    }

    stack
        .children
        .iter()
        .map(composable_duration)
        .max_by(|a, b| a.compare(b))
        .unwrap_or(RationalTime::zero(DEFAULT_RATE))
}

pub fn composable_duration(child: &Composable) -> RationalTime {
    match child {
        Composable::Track(track) => track_duration(track),
        Composable::Stack(stack) => stack_duration(stack),
    }
}

pub fn timeline_duration(timeline: &Timeline) -> RationalTime {
    stack_duration(&timeline.tracks)
}

/// Rate in force for a document: `metadata.default_rate`, else the first
/// rate found on any item, else [`DEFAULT_RATE`].
pub fn effective_rate(timeline: &Timeline) -> f64 {
    if let Some(rate) = timeline.default_rate() {
        return rate;
    }

    let mut finder = RateFinder { rate: None };
    finder.visit_timeline(timeline);
    finder.rate.unwrap_or(DEFAULT_RATE)
}

struct RateFinder {
    rate: Option<f64>,
}

impl RateFinder {
    fn offer(&mut self, rate: f64) {
        if self.rate.is_none() && rate.is_finite() && rate > 0.0 {
            self.rate = Some(rate);
        }
    }
}

impl Visitor for RateFinder {
    fn visit_item(&mut self, item: &TrackItem) {
        if self.rate.is_some() {
            return;
        }
        walk_item(self, item);
    }

    fn visit_clip(&mut self, clip: &Clip) {
        self.offer(clip.source_range.duration.rate);
    }

    fn visit_gap(&mut self, gap: &Gap) {
        self.offer(gap.source_range.duration.rate);
    }

    fn visit_transition(&mut self, transition: &Transition) {
        self.offer(transition.in_offset.rate);
    }
}

/// Position of the item at `index` on its track's own time axis.
///
/// Items start where the preceding non-Transition items end. A Transition
/// straddles the cut it sits on: it starts `in_offset` before the cut.
pub fn item_range_in_track(track: &Track, index: usize) -> Option<TimeRange> {
    let item = track.children.get(index)?;
    let duration = item_duration(item);

    let cut = track.children[..index]
        .iter()
        .filter(|preceding| !preceding.is_transition())
        .map(item_duration)
        .fold(RationalTime::zero(duration.rate), |total, d| total + d);

    let start_time = match item {
        TrackItem::Transition(transition) => cut - transition.in_offset,
        _ => cut,
    };

    Some(TimeRange::new(start_time, duration))
}

/// Every external asset id referenced anywhere in the document, in
/// first-seen order without duplicates
pub fn collect_asset_ids(timeline: &Timeline) -> Vec<String> {
    let mut collector = AssetCollector::default();
    collector.visit_timeline(timeline);
    collector.ids
}

#[derive(Default)]
struct AssetCollector {
    seen: HashSet<String>,
    ids: Vec<String>,
}

impl Visitor for AssetCollector {
    fn visit_media_reference(&mut self, reference: &MediaReference) {
        if let Some(asset_id) = reference.asset_id() {
            if self.seen.insert(asset_id.to_string()) {
                self.ids.push(asset_id.to_string());
            }
        }
    }
}
