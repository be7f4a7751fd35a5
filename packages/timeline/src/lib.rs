//! # Splice Timeline
//!
//! Document model for a non-linear video editing timeline.
//!
//! - [`time`]: exact rational timestamps and ranges
//! - [`schema`]: the schema-tagged entity tree rooted at [`Timeline`]
//! - [`traverse`]: side-effect-free traversal (durations, rates, assets)
//!
//! Documents are plain values. Editing happens elsewhere (`splice-editor`),
//! always producing a new `Timeline` rather than mutating one in place.

pub mod error;
pub mod schema;
pub mod time;
pub mod traverse;

pub use error::{TimeError, TimelineError};
pub use schema::{
    Clip, Composable, Effect, Gap, MarkerColor, Marker, MediaReference, Metadata, Stack, Timeline,
    Track, TrackItem, TrackKind, Transition, DEFAULT_RATE_KEY,
};
pub use time::{RationalTime, TimeRange};
pub use traverse::{
    collect_asset_ids, composable_duration, effective_rate, item_duration, item_range_in_track,
    stack_duration, timeline_duration, track_duration, Visitor, DEFAULT_RATE,
};
