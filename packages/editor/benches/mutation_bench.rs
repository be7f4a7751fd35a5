use criterion::{black_box, criterion_group, criterion_main, Criterion};
use splice_editor::timeline::{RationalTime, TimeRange, Timeline, TrackKind};
use splice_editor::Mutation;

fn long_timeline(tracks: usize, clips: usize) -> Timeline {
    let mut doc = Timeline::new("bench", 24.0);
    for _ in 0..tracks {
        doc = Mutation::AddTrack {
            name: None,
            kind: TrackKind::Video,
            index: None,
        }
        .apply(&doc)
        .unwrap();
    }
    for track_index in 0..tracks {
        for i in 0..clips {
            doc = Mutation::AddClip {
                track_index,
                asset_id: format!("asset-{}", i),
                source_range: TimeRange::from_frames(0.0, 48.0, 24.0),
                name: None,
                index: None,
            }
            .apply(&doc)
            .unwrap();
        }
    }
    doc
}

fn split_in_small_timeline(c: &mut Criterion) {
    let doc = long_timeline(2, 20);
    let split = Mutation::SplitClip {
        track_index: 1,
        clip_index: 10,
        offset: RationalTime::new(12.0, 24.0),
    };

    c.bench_function("split_clip_2x20", |b| b.iter(|| split.apply(black_box(&doc))));
}

fn split_in_large_timeline(c: &mut Criterion) {
    let doc = long_timeline(8, 500);
    let split = Mutation::SplitClip {
        track_index: 7,
        clip_index: 250,
        offset: RationalTime::new(12.0, 24.0),
    };

    c.bench_function("split_clip_8x500", |b| b.iter(|| split.apply(black_box(&doc))));
}

fn nest_and_flatten(c: &mut Criterion) {
    let doc = long_timeline(4, 200);
    let nest = Mutation::NestItems {
        track_index: 0,
        start: 50,
        end: 150,
        name: "group".into(),
    };
    let flatten = Mutation::FlattenStack {
        track_index: 0,
        stack_index: 50,
    };

    c.bench_function("nest_then_flatten_4x200", |b| {
        b.iter(|| {
            let nested = nest.apply(black_box(&doc)).unwrap();
            flatten.apply(&nested)
        })
    });
}

criterion_group!(benches, split_in_small_timeline, split_in_large_timeline, nest_and_flatten);
criterion_main!(benches);
