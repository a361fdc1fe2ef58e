//! Criterion benchmarks for the RAS frame codec.
//!
//! Measures encode and decode latency for the message types that dominate a
//! remote-desktop session: pointer and keyboard input upstream, PNG
//! rectangles downstream.
//!
//! Run with:
//! ```bash
//! cargo bench --package ras-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ras_core::protocol::{
    buttons, decode_message, encode_message, KeyboardEventMessage, Message, MouseEventMessage,
    PngMessage, Role,
};

// ── Message fixtures ──────────────────────────────────────────────────────────

fn make_key_event() -> Message {
    Message::KeyboardEvent(KeyboardEventMessage {
        down: true,
        key: 0x61,
    })
}

fn make_mouse_event() -> Message {
    Message::MouseEvent(MouseEventMessage {
        buttons: buttons::PRIMARY,
        x: 960,
        y: 540,
    })
}

fn make_text() -> Message {
    Message::Text("clipboard contents ".repeat(16))
}

fn make_png(size: usize) -> Message {
    Message::Png(PngMessage {
        x: 0,
        y: 0,
        width: 64,
        height: 64,
        img: vec![0xAB; size],
    })
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

/// Benchmarks `decode_message` for client-originated input as the server sees it.
fn bench_decode_inbound(c: &mut Criterion) {
    let messages: &[(&str, Message)] = &[
        ("KeyboardEvent", make_key_event()),
        ("MouseEvent", make_mouse_event()),
        ("Text", make_text()),
    ];

    let mut group = c.benchmark_group("decode_inbound");
    for (name, msg) in messages {
        let frame = encode_message(Role::Client, msg).expect("encode must succeed for setup");
        group.bench_with_input(BenchmarkId::new("msg", name), &frame, |b, frame| {
            b.iter(|| decode_message(Role::Server, black_box(frame)).expect("decode must succeed"))
        });
    }
    group.finish();
}

/// Benchmarks `encode_message` for PNG rectangles of increasing size.
fn bench_encode_png(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_png");
    for size in [1_024usize, 16_384, 262_144] {
        let msg = make_png(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &msg, |b, msg| {
            b.iter(|| encode_message(Role::Server, black_box(msg)).expect("encode must succeed"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode_inbound, bench_encode_png);
criterion_main!(benches);
