//! Criterion benchmarks for romsprite critical paths
//!
//! Benchmarks the operations run once per tile or per pose:
//! - Tile: planar 4bpp decoding and tilemap record unpacking
//! - Rasterize: tilemaps against VRAM into an indexed canvas
//! - Palette: index to RGBA resolution
//! - Address space: LoROM translation and word reads

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::Rgba;
use romsprite::canvas::{apply_palette, canvas_from_raw_data, BoundingBox};
use romsprite::testing::RomBuilder;
use romsprite::tile::{Tile, TilemapEntry};
use romsprite::vram::{DmaWrites, VramTiles};

// =============================================================================
// Test Data Generators
// =============================================================================

/// Deterministic pseudo-random tile bytes.
fn make_tile_data(tiles: usize) -> Vec<u8> {
    (0..tiles * 32).map(|i| (i * 37 % 251) as u8).collect()
}

/// VRAM with `tiles` consecutive tiles starting at slot 0.
fn make_vram(tiles: usize) -> VramTiles {
    let mut writes = DmaWrites::new();
    writes.insert(0, make_tile_data(tiles));
    VramTiles::from_writes([&writes])
}

/// A grid of big entries around the origin, like a full Samus pose.
fn make_tilemaps(count: usize) -> Vec<TilemapEntry> {
    (0..count)
        .map(|i| {
            let x = (i % 4) as i32 * 16 - 32;
            let y = (i / 4) as i32 * 16 - 32;
            TilemapEntry::new(x, y, (i * 2) as u16, 2, 2)
                .big(true)
                .flipped(i % 3 == 0, i % 2 == 0)
        })
        .collect()
}

// =============================================================================
// Tile Benchmarks
// =============================================================================

fn bench_tile(c: &mut Criterion) {
    let mut group = c.benchmark_group("tile");
    let data = make_tile_data(256);

    group.throughput(Throughput::Elements(256));
    group.bench_function("decode_4bpp_256", |b| {
        b.iter(|| {
            for chunk in data.chunks(32) {
                black_box(Tile::from_4bpp(black_box(chunk)));
            }
        })
    });

    let records: Vec<[u16; 3]> = make_tilemaps(64)
        .iter()
        .filter_map(|entry| entry.compile().ok())
        .collect();
    group.bench_function("decompile_64", |b| {
        b.iter(|| {
            for record in &records {
                black_box(TilemapEntry::decompile(black_box(*record)));
            }
        })
    });

    group.finish();
}

// =============================================================================
// Rasterize Benchmarks
// =============================================================================

fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");
    let vram = make_vram(0x200);
    let bbox = BoundingBox::new(-32, -32, 32, 32);

    for count in [4usize, 16, 32] {
        let tilemaps = make_tilemaps(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("pose", count), &tilemaps, |b, tilemaps| {
            b.iter(|| canvas_from_raw_data(black_box(tilemaps), black_box(&vram), bbox))
        });
    }

    group.bench_function("vram_from_writes_512", |b| {
        let mut writes = DmaWrites::new();
        writes.insert(0, make_tile_data(0x200));
        b.iter(|| VramTiles::from_writes([black_box(&writes)]))
    });

    group.finish();
}

// =============================================================================
// Palette Benchmarks
// =============================================================================

fn bench_palette(c: &mut Criterion) {
    let vram = make_vram(0x200);
    let canvas = canvas_from_raw_data(&make_tilemaps(16), &vram, BoundingBox::new(-32, -32, 32, 32));
    let palette: Vec<Rgba<u8>> = (0..15).map(|i| Rgba([i * 16, 0, 255 - i * 16, 255])).collect();

    c.bench_function("apply_palette_64x64", |b| {
        b.iter(|| apply_palette(black_box(&canvas), black_box(&palette)))
    });
}

// =============================================================================
// Address Space Benchmarks
// =============================================================================

fn bench_rom(c: &mut Criterion) {
    let rom = RomBuilder::lorom(0x200000).build();

    c.bench_function("read_words_16", |b| b.iter(|| rom.read_words(black_box(0x9B9400), 16)));
    c.bench_function("snes_to_pc", |b| b.iter(|| rom.snes_to_pc(black_box(0x92808D))));
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(benches, bench_tile, bench_rasterize, bench_palette, bench_rom);

criterion_main!(benches);
