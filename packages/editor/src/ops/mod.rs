//! Pure edit functions, one per operation.
//!
//! Every function takes a snapshot by reference and returns a fresh
//! `Timeline`. The input is cloned before any change, so a failure part-way
//! through an operation only discards the scratch copy.

pub mod annotations;
pub mod clips;
pub mod gaps;
pub mod nesting;
pub mod tracks;
pub mod transitions;

use crate::mutations::{Collection, MutationError};
use splice_timeline::{Clip, Composable, RationalTime, TimeRange, Timeline, Track, TrackItem};

/// Clone `doc`, run `edit` against one of its tracks, return the copy
pub(crate) fn edit_track<F>(
    doc: &Timeline,
    track_index: usize,
    edit: F,
) -> Result<Timeline, MutationError>
where
    F: FnOnce(&mut Track) -> Result<(), MutationError>,
{
    let mut next = doc.clone();
    edit(track_mut(&mut next, track_index)?)?;
    Ok(next)
}

pub(crate) fn track_ref(doc: &Timeline, track_index: usize) -> Result<&Track, MutationError> {
    let len = doc.tracks.children.len();
    match doc.tracks.children.get(track_index) {
        Some(Composable::Track(track)) => Ok(track),
        Some(other) => Err(schema_mismatch(track_index, "Track", other.schema_name())),
        None => Err(out_of_range(Collection::Track, track_index, len)),
    }
}

pub(crate) fn track_mut(
    doc: &mut Timeline,
    track_index: usize,
) -> Result<&mut Track, MutationError> {
    let len = doc.tracks.children.len();
    match doc.tracks.children.get_mut(track_index) {
        Some(Composable::Track(track)) => Ok(track),
        Some(other) => Err(schema_mismatch(track_index, "Track", other.schema_name())),
        None => Err(out_of_range(Collection::Track, track_index, len)),
    }
}

pub(crate) fn item_ref(track: &Track, index: usize) -> Result<&TrackItem, MutationError> {
    track
        .children
        .get(index)
        .ok_or_else(|| out_of_range(Collection::Item, index, track.children.len()))
}

pub(crate) fn item_mut(track: &mut Track, index: usize) -> Result<&mut TrackItem, MutationError> {
    let len = track.children.len();
    track
        .children
        .get_mut(index)
        .ok_or_else(|| out_of_range(Collection::Item, index, len))
}

pub(crate) fn clip_ref(track: &Track, index: usize) -> Result<&Clip, MutationError> {
    match item_ref(track, index)? {
        TrackItem::Clip(clip) => Ok(clip),
        other => Err(schema_mismatch(index, "Clip", other.schema_name())),
    }
}

pub(crate) fn clip_mut(track: &mut Track, index: usize) -> Result<&mut Clip, MutationError> {
    match item_mut(track, index)? {
        TrackItem::Clip(clip) => Ok(clip),
        other => Err(schema_mismatch(index, "Clip", other.schema_name())),
    }
}

/// Fail unless the item at `index` is the `expected` variant
pub(crate) fn expect_item(
    track: &Track,
    index: usize,
    expected: &str,
) -> Result<(), MutationError> {
    let item = item_ref(track, index)?;
    if item.schema_name() == expected {
        Ok(())
    } else {
        Err(schema_mismatch(index, expected, item.schema_name()))
    }
}

/// Rates must be positive and values finite
pub(crate) fn check_time(time: &RationalTime) -> Result<(), MutationError> {
    RationalTime::try_new(time.value, time.rate)
        .map(|_| ())
        .map_err(|_| MutationError::InvalidTime {
            value: time.value,
            rate: time.rate,
        })
}

pub(crate) fn check_range(range: &TimeRange) -> Result<(), MutationError> {
    check_time(&range.start_time)?;
    check_time(&range.duration)
}

/// Clips and gaps must span at least one frame
pub(crate) fn check_duration(duration: &RationalTime) -> Result<(), MutationError> {
    check_time(duration)?;
    if duration.value >= 1.0 {
        Ok(())
    } else {
        Err(MutationError::InvalidDuration { value: duration.value })
    }
}

pub(crate) fn out_of_range(collection: Collection, index: usize, len: usize) -> MutationError {
    MutationError::IndexOutOfRange { collection, index, len }
}

pub(crate) fn schema_mismatch(index: usize, expected: &str, found: &str) -> MutationError {
    MutationError::SchemaMismatch {
        index,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
