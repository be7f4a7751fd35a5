//! # Timeline Document Model
//!
//! The recursive, schema-tagged entity tree:
//!
//! ```text
//! Timeline
//!   └─ tracks: Stack
//!        └─ children: [Track | Stack]
//!             └─ Track.children: [Clip | Gap | Transition | Stack]
//! ```
//!
//! Every polymorphic position is a closed enum discriminated on the wire by
//! an `OTIO_SCHEMA` tag. Each entity is owned by exactly one parent; there are
//! no back references.

use crate::error::{TimeError, TimelineError};
use crate::time::{RationalTime, TimeRange};
use crate::traverse::{walk_timeline, Visitor};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Free-form metadata attached to an entity
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key holding the document's canonical rate
pub const DEFAULT_RATE_KEY: &str = "default_rate";

/// Root document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "OTIO_SCHEMA", rename = "Timeline.1")]
pub struct Timeline {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_start_time: Option<RationalTime>,
    #[serde(serialize_with = "serialize_root_stack")]
    pub tracks: Stack,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Timeline {
    /// Empty timeline whose canonical rate is `rate`
    pub fn new(name: impl Into<String>, rate: f64) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(DEFAULT_RATE_KEY.to_string(), serde_json::json!(rate));

        Self {
            name: name.into(),
            global_start_time: None,
            tracks: Stack::new("tracks"),
            metadata,
        }
    }

    /// The `metadata.default_rate` entry, if present and positive
    pub fn default_rate(&self) -> Option<f64> {
        self.metadata
            .get(DEFAULT_RATE_KEY)
            .and_then(|v| v.as_f64())
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// Top-level tracks, skipping nested stacks
    pub fn top_level_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.children.iter().filter_map(|c| match c {
            Composable::Track(track) => Some(track),
            Composable::Stack(_) => None,
        })
    }

    /// Parse a document and reject any time value with a non-positive rate
    pub fn from_json(json: &str) -> Result<Self, TimelineError> {
        let timeline: Timeline = serde_json::from_str(json)?;
        timeline.validate_times()?;
        Ok(timeline)
    }

    /// Fail on the first time value with a non-positive or non-finite rate
    pub fn validate(&self) -> Result<(), TimeError> {
        self.validate_times()
    }

    pub fn to_json(&self) -> Result<String, TimelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, TimelineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), TimelineError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    fn validate_times(&self) -> Result<(), TimeError> {
        let mut checker = TimeChecker { error: None };
        checker.visit_timeline(self);
        match checker.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// The root stack sits in a plain field, so it carries its own tag. Nested
/// stacks get theirs from [`Composable`] and [`TrackItem`].
fn serialize_root_stack<S>(stack: &Stack, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    #[derive(Serialize)]
    #[serde(tag = "OTIO_SCHEMA")]
    enum Tagged<'a> {
        #[serde(rename = "Stack.1")]
        Stack(&'a Stack),
    }

    Tagged::Stack(stack).serialize(serializer)
}

/// Records the first invalid time value found in a document
struct TimeChecker {
    error: Option<TimeError>,
}

impl TimeChecker {
    fn check(&mut self, time: &RationalTime) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = RationalTime::try_new(time.value, time.rate) {
            self.error = Some(e);
        }
    }

    fn check_range(&mut self, range: &TimeRange) {
        self.check(&range.start_time);
        self.check(&range.duration);
    }
}

impl Visitor for TimeChecker {
    fn visit_timeline(&mut self, timeline: &Timeline) {
        if let Some(start) = &timeline.global_start_time {
            self.check(start);
        }
        walk_timeline(self, timeline);
    }

    fn visit_stack(&mut self, stack: &Stack) {
        if let Some(range) = &stack.source_range {
            self.check_range(range);
        }
        crate::traverse::walk_stack(self, stack);
    }

    fn visit_track(&mut self, track: &Track) {
        if let Some(range) = &track.source_range {
            self.check_range(range);
        }
        crate::traverse::walk_track(self, track);
    }

    fn visit_clip(&mut self, clip: &Clip) {
        self.check_range(&clip.source_range);
    }

    fn visit_gap(&mut self, gap: &Gap) {
        self.check_range(&gap.source_range);
    }

    fn visit_transition(&mut self, transition: &Transition) {
        self.check(&transition.in_offset);
        self.check(&transition.out_offset);
    }
}

/// Child of a Stack: a Track or another nested Stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "OTIO_SCHEMA")]
pub enum Composable {
    #[serde(rename = "Track.1")]
    Track(Track),

    #[serde(rename = "Stack.1")]
    Stack(Stack),
}

impl Composable {
    pub fn name(&self) -> &str {
        match self {
            Composable::Track(track) => &track.name,
            Composable::Stack(stack) => &stack.name,
        }
    }

    pub fn schema_name(&self) -> &'static str {
        match self {
            Composable::Track(_) => "Track",
            Composable::Stack(_) => "Stack",
        }
    }
}

/// Nested composition grouping tracks (or further stacks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub name: String,
    /// Overrides the computed duration when present (nested trims)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_range: Option<TimeRange>,
    #[serde(default)]
    pub children: Vec<Composable>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_range: None,
            children: Vec::new(),
            effects: Vec::new(),
            markers: Vec::new(),
            metadata: Metadata::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Video => f.write_str("Video"),
            TrackKind::Audio => f.write_str("Audio"),
        }
    }
}

/// Ordered sequence of track items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub kind: TrackKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_range: Option<TimeRange>,
    #[serde(default)]
    pub children: Vec<TrackItem>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            name: name.into(),
            kind,
            source_range: None,
            children: Vec::new(),
            effects: Vec::new(),
            markers: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TrackItem>) -> Self {
        self.children = children;
        self
    }
}

/// Item placed on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "OTIO_SCHEMA")]
pub enum TrackItem {
    #[serde(rename = "Clip.2")]
    Clip(Clip),

    #[serde(rename = "Gap.1")]
    Gap(Gap),

    #[serde(rename = "Transition.1")]
    Transition(Transition),

    #[serde(rename = "Stack.1")]
    Stack(Stack),
}

impl TrackItem {
    pub fn name(&self) -> &str {
        match self {
            TrackItem::Clip(clip) => &clip.name,
            TrackItem::Gap(gap) => &gap.name,
            TrackItem::Transition(transition) => &transition.name,
            TrackItem::Stack(stack) => &stack.name,
        }
    }

    /// Variant name used in error reports
    pub fn schema_name(&self) -> &'static str {
        match self {
            TrackItem::Clip(_) => "Clip",
            TrackItem::Gap(_) => "Gap",
            TrackItem::Transition(_) => "Transition",
            TrackItem::Stack(_) => "Stack",
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, TrackItem::Transition(_))
    }

    /// Markers list, if this variant carries one
    pub fn markers(&self) -> Option<&Vec<Marker>> {
        match self {
            TrackItem::Clip(clip) => Some(&clip.markers),
            TrackItem::Gap(gap) => Some(&gap.markers),
            TrackItem::Stack(stack) => Some(&stack.markers),
            TrackItem::Transition(_) => None,
        }
    }

    pub fn markers_mut(&mut self) -> Option<&mut Vec<Marker>> {
        match self {
            TrackItem::Clip(clip) => Some(&mut clip.markers),
            TrackItem::Gap(gap) => Some(&mut gap.markers),
            TrackItem::Stack(stack) => Some(&mut stack.markers),
            TrackItem::Transition(_) => None,
        }
    }

    /// Effects list, if this variant carries one
    pub fn effects(&self) -> Option<&Vec<Effect>> {
        match self {
            TrackItem::Clip(clip) => Some(&clip.effects),
            TrackItem::Gap(gap) => Some(&gap.effects),
            TrackItem::Stack(stack) => Some(&stack.effects),
            TrackItem::Transition(_) => None,
        }
    }

    pub fn effects_mut(&mut self) -> Option<&mut Vec<Effect>> {
        match self {
            TrackItem::Clip(clip) => Some(&mut clip.effects),
            TrackItem::Gap(gap) => Some(&mut gap.effects),
            TrackItem::Stack(stack) => Some(&mut stack.effects),
            TrackItem::Transition(_) => None,
        }
    }
}

/// A segment of source media placed on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    pub source_range: TimeRange,
    pub media_reference: MediaReference,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Clip {
    pub fn new(
        name: impl Into<String>,
        media_reference: MediaReference,
        source_range: TimeRange,
    ) -> Self {
        Self {
            name: name.into(),
            source_range,
            media_reference,
            effects: Vec::new(),
            markers: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Clip referencing an external asset by id
    pub fn from_asset(
        name: impl Into<String>,
        asset_id: impl Into<String>,
        source_range: TimeRange,
    ) -> Self {
        Self::new(
            name,
            MediaReference::External {
                asset_id: asset_id.into(),
                available_range: None,
            },
            source_range,
        )
    }
}

/// Explicit placeholder of fixed duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    #[serde(default)]
    pub name: String,
    pub source_range: TimeRange,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Gap {
    pub fn new(duration: RationalTime) -> Self {
        Self {
            name: String::new(),
            source_range: TimeRange::new(RationalTime::zero(duration.rate), duration),
            effects: Vec::new(),
            markers: Vec::new(),
            metadata: Metadata::new(),
        }
    }
}

/// Overlap between the two neighbouring items; adds no screen time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(default)]
    pub name: String,
    pub transition_type: String,
    pub in_offset: RationalTime,
    pub out_offset: RationalTime,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Transition {
    pub fn new(
        transition_type: impl Into<String>,
        in_offset: RationalTime,
        out_offset: RationalTime,
    ) -> Self {
        Self {
            name: String::new(),
            transition_type: transition_type.into(),
            in_offset,
            out_offset,
            metadata: Metadata::new(),
        }
    }
}

/// Where a clip's media comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "OTIO_SCHEMA")]
pub enum MediaReference {
    #[serde(rename = "ExternalReference.1")]
    External {
        asset_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        available_range: Option<TimeRange>,
    },

    #[serde(rename = "GeneratorReference.1")]
    Generator {
        generator_kind: String,
        #[serde(default)]
        parameters: Metadata,
    },

    #[serde(rename = "MissingReference.1")]
    Missing {
        #[serde(default)]
        name: String,
    },
}

impl MediaReference {
    pub fn asset_id(&self) -> Option<&str> {
        match self {
            MediaReference::External { asset_id, .. } => Some(asset_id),
            MediaReference::Generator { .. } | MediaReference::Missing { .. } => None,
        }
    }
}

/// Effect applied to an item; all variants share the `effect_name` space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "OTIO_SCHEMA")]
pub enum Effect {
    #[serde(rename = "Effect.1")]
    Generic {
        #[serde(default)]
        name: String,
        effect_name: String,
        #[serde(default)]
        metadata: Metadata,
    },

    #[serde(rename = "LinearTimeWarp.1")]
    LinearTimeWarp {
        #[serde(default)]
        name: String,
        time_scalar: f64,
        #[serde(default)]
        metadata: Metadata,
    },

    #[serde(rename = "FreezeFrame.1")]
    FreezeFrame {
        #[serde(default)]
        name: String,
        #[serde(default)]
        metadata: Metadata,
    },
}

impl Effect {
    pub fn effect_name(&self) -> &str {
        match self {
            Effect::Generic { effect_name, .. } => effect_name,
            Effect::LinearTimeWarp { .. } => "LinearTimeWarp",
            Effect::FreezeFrame { .. } => "FreezeFrame",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Effect::Generic { name, .. }
            | Effect::LinearTimeWarp { name, .. }
            | Effect::FreezeFrame { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarkerColor {
    #[default]
    Red,
    Pink,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Magenta,
    Black,
    White,
}

/// Annotation over a range of an item's time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "OTIO_SCHEMA", rename = "Marker.2")]
pub struct Marker {
    #[serde(default)]
    pub name: String,
    pub marked_range: TimeRange,
    #[serde(default)]
    pub color: MarkerColor,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Marker {
    pub fn new(name: impl Into<String>, marked_range: TimeRange, color: MarkerColor) -> Self {
        Self {
            name: name.into(),
            marked_range,
            color,
            metadata: Metadata::new(),
        }
    }
}
