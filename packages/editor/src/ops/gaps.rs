use super::{check_duration, edit_track, expect_item};
use crate::mutations::MutationError;
use splice_timeline::{Gap, RationalTime, Timeline, TrackItem};

/// Insert a fixed-duration placeholder; an absent or out-of-range `index` appends
pub fn add_gap(
    doc: &Timeline,
    track_index: usize,
    duration: RationalTime,
    name: Option<&str>,
    index: Option<usize>,
) -> Result<Timeline, MutationError> {
    check_duration(&duration)?;

    edit_track(doc, track_index, |track| {
        let mut gap = Gap::new(duration);
        if let Some(name) = name {
            gap.name = name.to_string();
        }

        let len = track.children.len();
        let at = index.filter(|&i| i <= len).unwrap_or(len);
        track.children.insert(at, TrackItem::Gap(gap));
        Ok(())
    })
}

pub fn remove_gap(
    doc: &Timeline,
    track_index: usize,
    gap_index: usize,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        expect_item(track, gap_index, "Gap")?;
        track.children.remove(gap_index);
        Ok(())
    })
}
