//! # Timeline Mutations
//!
//! Structural edit operations on timeline documents.
//!
//! ## Design Principles
//!
//! 1. **Pure**: `apply` takes a snapshot and returns a new one; the input is
//!    never touched, and a failure never leaves a partial edit behind
//! 2. **Validated**: every operation checks bounds and variants first and
//!    reports a typed [`MutationError`]
//! 3. **Wire-ready**: a `Mutation` serializes to the request body the remote
//!    authority accepts, so both sides run the same code
//!
//! ## Addressing
//!
//! `track_index` indexes the root stack's children. Items are addressed by
//! their position in the track. An index naming a nested Stack where a Track
//! is required is a [`MutationError::SchemaMismatch`].

use crate::ops;
use serde::{Deserialize, Serialize};
use splice_timeline::{Effect, Marker, MediaReference, RationalTime, TimeRange, Timeline, TrackKind};
use std::fmt;
use thiserror::Error;

/// Structural edits (one variant per operation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert a track at `index`, or append when absent
    AddTrack {
        #[serde(default)]
        name: Option<String>,
        kind: TrackKind,
        #[serde(default)]
        index: Option<usize>,
    },

    RemoveTrack {
        track_index: usize,
    },

    RenameTrack {
        track_index: usize,
        name: String,
    },

    /// `order` must be a permutation of `0..n`
    ReorderTracks {
        order: Vec<usize>,
    },

    ClearTrack {
        track_index: usize,
    },

    /// Insert a clip for `asset_id`; appends when `index` is absent or out of range
    AddClip {
        track_index: usize,
        asset_id: String,
        source_range: TimeRange,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        index: Option<usize>,
    },

    RemoveClip {
        track_index: usize,
        clip_index: usize,
    },

    TrimClip {
        track_index: usize,
        clip_index: usize,
        source_range: TimeRange,
    },

    RenameClip {
        track_index: usize,
        clip_index: usize,
        name: String,
    },

    ReplaceClipMedia {
        track_index: usize,
        clip_index: usize,
        media_reference: MediaReference,
    },

    /// Cut a clip in two, `offset` frames after its start
    SplitClip {
        track_index: usize,
        clip_index: usize,
        offset: RationalTime,
    },

    /// Shift which source media is shown without changing the footprint
    SlipClip {
        track_index: usize,
        clip_index: usize,
        offset: RationalTime,
    },

    MoveClip {
        from_track: usize,
        from_index: usize,
        to_track: usize,
        to_index: usize,
    },

    AddGap {
        track_index: usize,
        duration: RationalTime,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        index: Option<usize>,
    },

    RemoveGap {
        track_index: usize,
        gap_index: usize,
    },

    /// Offsets default to half a second's worth of frames
    AddTransition {
        track_index: usize,
        position: usize,
        transition_type: String,
        #[serde(default)]
        in_offset: Option<RationalTime>,
        #[serde(default)]
        out_offset: Option<RationalTime>,
    },

    /// Absent fields are left unchanged
    ModifyTransition {
        track_index: usize,
        transition_index: usize,
        #[serde(default)]
        transition_type: Option<String>,
        #[serde(default)]
        in_offset: Option<RationalTime>,
        #[serde(default)]
        out_offset: Option<RationalTime>,
    },

    RemoveTransition {
        track_index: usize,
        transition_index: usize,
    },

    /// Wrap items `[start, end)` in a new Stack
    NestItems {
        track_index: usize,
        start: usize,
        end: usize,
        name: String,
    },

    FlattenStack {
        track_index: usize,
        stack_index: usize,
    },

    /// `item_index = None` targets the track itself
    AddMarker {
        track_index: usize,
        #[serde(default)]
        item_index: Option<usize>,
        marker: Marker,
    },

    RemoveMarker {
        track_index: usize,
        #[serde(default)]
        item_index: Option<usize>,
        marker_index: usize,
    },

    AddEffect {
        track_index: usize,
        #[serde(default)]
        item_index: Option<usize>,
        effect: Effect,
    },

    RemoveEffect {
        track_index: usize,
        #[serde(default)]
        item_index: Option<usize>,
        effect_index: usize,
    },

    /// Wholesale substitution; only the sync path issues this
    ReplaceTimeline {
        document: Box<Timeline>,
    },
}

/// Which collection an out-of-range index pointed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Track,
    Item,
    Marker,
    Effect,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Track => "track",
            Collection::Item => "item",
            Collection::Marker => "marker",
            Collection::Effect => "effect",
        };
        f.write_str(name)
    }
}

/// Structural failures. None of these modify the document.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationError {
    #[error("{collection} index {index} out of range (length {len})")]
    IndexOutOfRange {
        collection: Collection,
        index: usize,
        len: usize,
    },

    #[error("expected {expected} at index {index}, found {found}")]
    SchemaMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("transition cannot be placed at position {position}: {reason}")]
    InvalidTransitionPlacement { position: usize, reason: String },

    #[error("invalid nest range {start}..{end} for track of length {len}")]
    InvalidNestRange { start: usize, end: usize, len: usize },

    #[error("{order:?} is not a permutation of 0..{len}")]
    InvalidPermutation { order: Vec<usize>, len: usize },

    #[error("{schema} has no {field} field")]
    UnsupportedField { schema: String, field: String },

    #[error("split offset {offset} must fall strictly inside (0, {duration})")]
    InvalidSplitOffset { offset: f64, duration: f64 },

    #[error("duration must be at least one frame, got {value}")]
    InvalidDuration { value: f64 },

    #[error("invalid time {value} at rate {rate}")]
    InvalidTime { value: f64, rate: f64 },
}

impl Mutation {
    /// Apply to a snapshot, returning the edited copy
    pub fn apply(&self, doc: &Timeline) -> Result<Timeline, MutationError> {
        tracing::debug!(op = self.name(), "applying mutation");

        match self {
            Mutation::AddTrack { name, kind, index } => {
                ops::tracks::add_track(doc, name.as_deref(), *kind, *index)
            }
            Mutation::RemoveTrack { track_index } => ops::tracks::remove_track(doc, *track_index),
            Mutation::RenameTrack { track_index, name } => {
                ops::tracks::rename_track(doc, *track_index, name)
            }
            Mutation::ReorderTracks { order } => ops::tracks::reorder_tracks(doc, order),
            Mutation::ClearTrack { track_index } => ops::tracks::clear_track(doc, *track_index),

            Mutation::AddClip {
                track_index,
                asset_id,
                source_range,
                name,
                index,
            } => ops::clips::add_clip(
                doc,
                *track_index,
                asset_id,
                *source_range,
                name.as_deref(),
                *index,
            ),
            Mutation::RemoveClip { track_index, clip_index } => {
                ops::clips::remove_clip(doc, *track_index, *clip_index)
            }
            Mutation::TrimClip {
                track_index,
                clip_index,
                source_range,
            } => ops::clips::trim_clip(doc, *track_index, *clip_index, *source_range),
            Mutation::RenameClip {
                track_index,
                clip_index,
                name,
            } => ops::clips::rename_clip(doc, *track_index, *clip_index, name),
            Mutation::ReplaceClipMedia {
                track_index,
                clip_index,
                media_reference,
            } => ops::clips::replace_clip_media(doc, *track_index, *clip_index, media_reference),
            Mutation::SplitClip {
                track_index,
                clip_index,
                offset,
            } => ops::clips::split_clip(doc, *track_index, *clip_index, *offset),
            Mutation::SlipClip {
                track_index,
                clip_index,
                offset,
            } => ops::clips::slip_clip(doc, *track_index, *clip_index, *offset),
            Mutation::MoveClip {
                from_track,
                from_index,
                to_track,
                to_index,
            } => ops::clips::move_clip(doc, *from_track, *from_index, *to_track, *to_index),

            Mutation::AddGap {
                track_index,
                duration,
                name,
                index,
            } => ops::gaps::add_gap(doc, *track_index, *duration, name.as_deref(), *index),
            Mutation::RemoveGap { track_index, gap_index } => {
                ops::gaps::remove_gap(doc, *track_index, *gap_index)
            }

            Mutation::AddTransition {
                track_index,
                position,
                transition_type,
                in_offset,
                out_offset,
            } => ops::transitions::add_transition(
                doc,
                *track_index,
                *position,
                transition_type,
                *in_offset,
                *out_offset,
            ),
            Mutation::ModifyTransition {
                track_index,
                transition_index,
                transition_type,
                in_offset,
                out_offset,
            } => ops::transitions::modify_transition(
                doc,
                *track_index,
                *transition_index,
                transition_type.as_deref(),
                *in_offset,
                *out_offset,
            ),
            Mutation::RemoveTransition {
                track_index,
                transition_index,
            } => ops::transitions::remove_transition(doc, *track_index, *transition_index),

            Mutation::NestItems {
                track_index,
                start,
                end,
                name,
            } => ops::nesting::nest_items(doc, *track_index, *start, *end, name),
            Mutation::FlattenStack {
                track_index,
                stack_index,
            } => ops::nesting::flatten_stack(doc, *track_index, *stack_index),

            Mutation::AddMarker {
                track_index,
                item_index,
                marker,
            } => ops::annotations::add_marker(doc, *track_index, *item_index, marker),
            Mutation::RemoveMarker {
                track_index,
                item_index,
                marker_index,
            } => ops::annotations::remove_marker(doc, *track_index, *item_index, *marker_index),
            Mutation::AddEffect {
                track_index,
                item_index,
                effect,
            } => ops::annotations::add_effect(doc, *track_index, *item_index, effect),
            Mutation::RemoveEffect {
                track_index,
                item_index,
                effect_index,
            } => ops::annotations::remove_effect(doc, *track_index, *item_index, *effect_index),

            Mutation::ReplaceTimeline { document } => Ok(document.as_ref().clone()),
        }
    }

    /// Validate without keeping the result
    pub fn validate(&self, doc: &Timeline) -> Result<(), MutationError> {
        self.apply(doc).map(|_| ())
    }

    /// Operation name as used in remote routes (`split-clip`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddTrack { .. } => "add-track",
            Mutation::RemoveTrack { .. } => "remove-track",
            Mutation::RenameTrack { .. } => "rename-track",
            Mutation::ReorderTracks { .. } => "reorder-tracks",
            Mutation::ClearTrack { .. } => "clear-track",
            Mutation::AddClip { .. } => "add-clip",
            Mutation::RemoveClip { .. } => "remove-clip",
            Mutation::TrimClip { .. } => "trim-clip",
            Mutation::RenameClip { .. } => "rename-clip",
            Mutation::ReplaceClipMedia { .. } => "replace-clip-media",
            Mutation::SplitClip { .. } => "split-clip",
            Mutation::SlipClip { .. } => "slip-clip",
            Mutation::MoveClip { .. } => "move-clip",
            Mutation::AddGap { .. } => "add-gap",
            Mutation::RemoveGap { .. } => "remove-gap",
            Mutation::AddTransition { .. } => "add-transition",
            Mutation::ModifyTransition { .. } => "modify-transition",
            Mutation::RemoveTransition { .. } => "remove-transition",
            Mutation::NestItems { .. } => "nest-items",
            Mutation::FlattenStack { .. } => "flatten-stack",
            Mutation::AddMarker { .. } => "add-marker",
            Mutation::RemoveMarker { .. } => "remove-marker",
            Mutation::AddEffect { .. } => "add-effect",
            Mutation::RemoveEffect { .. } => "remove-effect",
            Mutation::ReplaceTimeline { .. } => "replace-timeline",
        }
    }

    /// Short human description, recorded on checkpoints
    pub fn describe(&self) -> String {
        match self {
            Mutation::AddTrack { name, kind, .. } => match name {
                Some(name) => format!("Add {} track \"{}\"", kind, name),
                None => format!("Add {} track", kind),
            },
            Mutation::RemoveTrack { track_index } => format!("Remove track {}", track_index),
            Mutation::RenameTrack { track_index, name } => {
                format!("Rename track {} to \"{}\"", track_index, name)
            }
            Mutation::ReorderTracks { order } => format!("Reorder tracks to {:?}", order),
            Mutation::ClearTrack { track_index } => format!("Clear track {}", track_index),
            Mutation::AddClip {
                track_index, asset_id, ..
            } => format!("Add clip for {} on track {}", asset_id, track_index),
            Mutation::RemoveClip {
                track_index,
                clip_index,
            } => format!("Remove clip {} from track {}", clip_index, track_index),
            Mutation::TrimClip {
                track_index,
                clip_index,
                ..
            } => format!("Trim clip {} on track {}", clip_index, track_index),
            Mutation::RenameClip {
                track_index,
                clip_index,
                name,
            } => format!("Rename clip {} on track {} to \"{}\"", clip_index, track_index, name),
            Mutation::ReplaceClipMedia {
                track_index,
                clip_index,
                ..
            } => format!("Replace media of clip {} on track {}", clip_index, track_index),
            Mutation::SplitClip {
                track_index,
                clip_index,
                offset,
            } => format!("Split clip {} on track {} at {}", clip_index, track_index, offset),
            Mutation::SlipClip {
                track_index,
                clip_index,
                offset,
            } => format!("Slip clip {} on track {} by {}", clip_index, track_index, offset),
            Mutation::MoveClip {
                from_track,
                from_index,
                to_track,
                to_index,
            } => format!("Move item {}:{} to {}:{}", from_track, from_index, to_track, to_index),
            Mutation::AddGap { track_index, duration, .. } => {
                format!("Add {} gap on track {}", duration, track_index)
            }
            Mutation::RemoveGap { track_index, gap_index } => {
                format!("Remove gap {} from track {}", gap_index, track_index)
            }
            Mutation::AddTransition {
                track_index,
                position,
                transition_type,
                ..
            } => format!("Add {} at {} on track {}", transition_type, position, track_index),
            Mutation::ModifyTransition {
                track_index,
                transition_index,
                ..
            } => format!("Modify transition {} on track {}", transition_index, track_index),
            Mutation::RemoveTransition {
                track_index,
                transition_index,
            } => format!("Remove transition {} from track {}", transition_index, track_index),
            Mutation::NestItems {
                track_index,
                start,
                end,
                name,
            } => format!("Nest items {}..{} on track {} as \"{}\"", start, end, track_index, name),
            Mutation::FlattenStack {
                track_index,
                stack_index,
            } => format!("Flatten stack {} on track {}", stack_index, track_index),
            Mutation::AddMarker { marker, .. } => format!("Add marker \"{}\"", marker.name),
            Mutation::RemoveMarker { marker_index, .. } => {
                format!("Remove marker {}", marker_index)
            }
            Mutation::AddEffect { effect, .. } => format!("Add effect {}", effect.effect_name()),
            Mutation::RemoveEffect { effect_index, .. } => {
                format!("Remove effect {}", effect_index)
            }
            Mutation::ReplaceTimeline { .. } => "Replace timeline".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::SplitClip {
            track_index: 0,
            clip_index: 2,
            offset: RationalTime::new(40.0, 24.0),
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: Mutation = serde_json::from_str(&json).unwrap();

        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_optional_params_default_when_absent() {
        let json = r#"{ "op": "add_track", "kind": "Audio" }"#;
        let mutation: Mutation = serde_json::from_str(json).unwrap();
        assert_eq!(
            mutation,
            Mutation::AddTrack {
                name: None,
                kind: TrackKind::Audio,
                index: None
            }
        );
    }

    #[test]
    fn test_route_name_matches_serde_tag() {
        let mutation = Mutation::ModifyTransition {
            track_index: 0,
            transition_index: 1,
            transition_type: None,
            in_offset: None,
            out_offset: None,
        };
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json["op"], "modify_transition");
        assert_eq!(mutation.name(), "modify-transition");
    }

    #[test]
    fn test_error_serializes_with_kind() {
        let error = MutationError::IndexOutOfRange {
            collection: Collection::Track,
            index: 3,
            len: 1,
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "index_out_of_range");
        assert_eq!(json["collection"], "track");
        assert_eq!(error.to_string(), "track index 3 out of range (length 1)");
    }

    #[test]
    fn test_validation_leaves_document_alone() {
        let doc = Timeline::new("x", 24.0);
        let mutation = Mutation::RemoveTrack { track_index: 0 };
        assert!(mutation.validate(&doc).is_err());
        assert_eq!(doc, Timeline::new("x", 24.0));
    }
}
