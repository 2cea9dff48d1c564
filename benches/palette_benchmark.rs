//! Palette benchmark: Measure per-update palette conversion.
//!
//! Runs on every palette change (damage flashes, pickups), so it must stay
//! well under a microsecond and allocation-free.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use framebridge::video::{Palette, PaletteLayout, PALETTE_BYTES};
use framebridge::{Bridge, NullHost};

fn ramp() -> [u8; PALETTE_BYTES] {
    let mut raw = [0u8; PALETTE_BYTES];
    for (i, byte) in raw.iter_mut().enumerate() {
        *byte = (i * 7 % 256) as u8;
    }
    raw
}

fn bench_encode(c: &mut Criterion) {
    let palette = Palette::from_raw(&ramp());
    let mut group = c.benchmark_group("palette_encode");

    for layout in [
        PaletteLayout::Rgb,
        PaletteLayout::Bgr,
        PaletteLayout::Rgba,
        PaletteLayout::Bgra,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{layout:?}")),
            &layout,
            |b, &layout| b.iter(|| black_box(&palette).encode(black_box(layout))),
        );
    }

    group.finish();
}

fn bench_set_palette(c: &mut Criterion) {
    let raw = ramp();
    let mut bridge = Bridge::new(NullHost::new().with_layout(PaletteLayout::Bgra));
    bridge.init_graphics(320, 200).unwrap();

    c.bench_function("bridge_set_palette", |b| {
        b.iter(|| bridge.set_palette(black_box(&raw)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_set_palette);
criterion_main!(benches);
