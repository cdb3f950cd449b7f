use chaos_paint::{
    enums::GameView,
    game::vote::{first_max_index, VoteTally},
    server::jsons::{Event, Message, Painting, ViewState},
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

fn gallery_event() -> Event {
    let results = (0..8)
        .map(|i| Painting {
            prompt: format!("prompt {}", i),
            graphics: json!({ "lines": (0..64).map(|n| [n, n * 2, n * 3, n * 4]).collect::<Vec<_>>() }),
            backdrop: "canvas".into(),
            winner: i == 3,
            ..Default::default()
        })
        .collect();
    Event::ChangeView(ViewState {
        view: GameView::Gallery,
        results,
        ..Default::default()
    })
}

fn bench_codec(c: &mut Criterion) {
    let event = gallery_event();
    let text = event.encode().unwrap();

    c.bench_function("encode_gallery_view", |b| {
        b.iter(|| black_box(&event).encode().unwrap())
    });
    c.bench_function("decode_gallery_view", |b| {
        b.iter(|| Message::decode(black_box(&text)).unwrap())
    });
    c.bench_function("decode_vote_command", |b| {
        b.iter(|| Message::decode(black_box(r#"{"type":"vote-command","option":"star4"}"#)).unwrap())
    });
}

fn bench_vote(c: &mut Criterion) {
    let scores: Vec<u32> = (0..64).map(|i| (i * 7919) % 13).collect();
    c.bench_function("first_max_index_64", |b| {
        b.iter(|| first_max_index(black_box(&scores)))
    });

    c.bench_function("prompt_vote_tally", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| {
            let mut tally = VoteTally::with_jitter(3, &mut rng);
            for option in [0, 2, 1, 2, 0, 2] {
                tally.cast(option);
            }
            black_box(tally.winner())
        })
    });
}

criterion_group!(benches, bench_codec, bench_vote);
criterion_main!(benches);
