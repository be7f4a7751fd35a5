use super::{
    check_duration, check_range, check_time, clip_mut, clip_ref, edit_track, expect_item,
    out_of_range, track_mut, track_ref,
};
use crate::mutations::{Collection, MutationError};
use splice_timeline::{
    Clip, Composable, MediaReference, RationalTime, TimeRange, Timeline, Track, TrackItem,
    TrackKind,
};

/// Insert a clip referencing `asset_id`.
///
/// On a timeline with no tracks, asking for track 0 first creates a video
/// track. An absent or out-of-range `index` appends.
pub fn add_clip(
    doc: &Timeline,
    track_index: usize,
    asset_id: &str,
    source_range: TimeRange,
    name: Option<&str>,
    index: Option<usize>,
) -> Result<Timeline, MutationError> {
    check_range(&source_range)?;
    check_duration(&source_range.duration)?;

    let mut next = doc.clone();
    if next.tracks.children.is_empty() && track_index == 0 {
        next.tracks
            .children
            .push(Composable::Track(Track::new("Video 1", TrackKind::Video)));
    }

    let track = track_mut(&mut next, track_index)?;
    let len = track.children.len();
    let at = index.filter(|&i| i <= len).unwrap_or(len);

    let clip = Clip::from_asset(name.unwrap_or(asset_id), asset_id, source_range);
    track.children.insert(at, TrackItem::Clip(clip));
    Ok(next)
}

pub fn remove_clip(
    doc: &Timeline,
    track_index: usize,
    clip_index: usize,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        expect_item(track, clip_index, "Clip")?;
        track.children.remove(clip_index);
        Ok(())
    })
}

/// Replace the clip's `source_range` wholesale
pub fn trim_clip(
    doc: &Timeline,
    track_index: usize,
    clip_index: usize,
    source_range: TimeRange,
) -> Result<Timeline, MutationError> {
    check_range(&source_range)?;
    check_duration(&source_range.duration)?;

    edit_track(doc, track_index, |track| {
        clip_mut(track, clip_index)?.source_range = source_range;
        Ok(())
    })
}

pub fn rename_clip(
    doc: &Timeline,
    track_index: usize,
    clip_index: usize,
    name: &str,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        clip_mut(track, clip_index)?.name = name.to_string();
        Ok(())
    })
}

pub fn replace_clip_media(
    doc: &Timeline,
    track_index: usize,
    clip_index: usize,
    media_reference: &MediaReference,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        clip_mut(track, clip_index)?.media_reference = media_reference.clone();
        Ok(())
    })
}

/// Replace one clip with two that share every field but `source_range`.
///
/// `offset` is measured from the clip's start and must satisfy
/// `0 < offset < duration` at the clip's rate. The two durations always sum
/// to the original.
pub fn split_clip(
    doc: &Timeline,
    track_index: usize,
    clip_index: usize,
    offset: RationalTime,
) -> Result<Timeline, MutationError> {
    check_time(&offset)?;

    edit_track(doc, track_index, |track| {
        let clip = clip_ref(track, clip_index)?;
        let range = clip.source_range;
        let offset = offset.rescaled_to(range.duration.rate);

        if !(offset.value > 0.0 && offset.value < range.duration.value) {
            return Err(MutationError::InvalidSplitOffset {
                offset: offset.value,
                duration: range.duration.value,
            });
        }

        let mut head = clip.clone();
        let mut tail = clip.clone();
        head.source_range = TimeRange::new(range.start_time, offset);
        tail.source_range = TimeRange::new(range.start_time + offset, range.duration - offset);

        track.children[clip_index] = TrackItem::Clip(head);
        track.children.insert(clip_index + 1, TrackItem::Clip(tail));
        Ok(())
    })
}

/// Shift the clip's source start by `offset`; the duration is unchanged
pub fn slip_clip(
    doc: &Timeline,
    track_index: usize,
    clip_index: usize,
    offset: RationalTime,
) -> Result<Timeline, MutationError> {
    check_time(&offset)?;

    edit_track(doc, track_index, |track| {
        let clip = clip_mut(track, clip_index)?;
        clip.source_range.start_time = clip.source_range.start_time + offset;
        Ok(())
    })
}

/// Move an item between (or within) tracks.
///
/// The item is removed first. When moving later within the same track the
/// removal shifts the target down, so `to_index` is reduced by one. The
/// result is clamped into the destination's bounds.
pub fn move_clip(
    doc: &Timeline,
    from_track: usize,
    from_index: usize,
    to_track: usize,
    to_index: usize,
) -> Result<Timeline, MutationError> {
    track_ref(doc, to_track)?;

    let mut next = doc.clone();
    let source = track_mut(&mut next, from_track)?;
    if from_index >= source.children.len() {
        return Err(out_of_range(Collection::Item, from_index, source.children.len()));
    }
    let item = source.children.remove(from_index);

    let mut target = to_index;
    if from_track == to_track && from_index < to_index {
        target -= 1;
    }

    let destination = track_mut(&mut next, to_track)?;
    let target = target.min(destination.children.len());
    destination.children.insert(target, item);

    Ok(next)
}
