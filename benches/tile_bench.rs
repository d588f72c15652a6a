use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tilecalc::buffer::ElementType;
use tilecalc::composite::{composite, CompositeMethod, CompositeParams};
use tilecalc::geometry::raster::{classify_area, touched_cells};
use tilecalc::{Geometry, Tile, TileBuffer, ValidRange, TILE_SIZE};

fn make_tile(ty: ElementType, bands: usize, seed: usize) -> TileBuffer {
    let mut buf = TileBuffer::create(ty, TILE_SIZE, TILE_SIZE, bands, None).unwrap();
    for band in 0..bands {
        for row in 0..TILE_SIZE {
            for col in 0..TILE_SIZE {
                let v = ((row * TILE_SIZE + col + seed * 7 + band) % 250) as f64;
                buf.set_value(band, row, col, v).unwrap();
            }
        }
    }
    buf
}

fn origin_tile() -> Tile {
    Tile::new(6, 32, 16).unwrap()
}

fn bench_binary_ops(c: &mut Criterion) {
    for ty in [ElementType::Byte, ElementType::Int32, ElementType::Float32] {
        let a = make_tile(ty, 3, 1);
        let b = make_tile(ty, 3, 2);
        let valid = ValidRange::new(1.0, 240.0);

        c.bench_function(&format!("add_{}_3band", ty.name()), |bench| {
            bench.iter(|| black_box(a.add(&b, valid, 0.0).unwrap()));
        });
        c.bench_function(&format!("div_{}_3band", ty.name()), |bench| {
            bench.iter(|| black_box(a.div(&b, valid, 0.0).unwrap()));
        });
    }
}

fn bench_scalar_ops(c: &mut Criterion) {
    let src = make_tile(ElementType::UInt16, 4, 3);
    c.bench_function("mul_const_uint16_4band", |bench| {
        bench.iter(|| {
            let mut buf = src.clone();
            buf.mul_const(1.5, 0.0).unwrap();
            black_box(buf)
        });
    });
}

fn bench_composite(c: &mut Criterion) {
    for &n in &[4usize, 16, 64] {
        let tiles: Vec<TileBuffer> = (0..n).map(|i| make_tile(ElementType::Int16, 1, i)).collect();
        let refs: Vec<&TileBuffer> = tiles.iter().collect();

        for method in [CompositeMethod::Max, CompositeMethod::Average] {
            let params = CompositeParams::new(method, ValidRange::new(1.0, 240.0), -1.0);
            c.bench_function(&format!("composite_{method:?}_{n}_tiles"), |bench| {
                bench.iter(|| black_box(composite(&refs, &params).unwrap()));
            });
        }
    }

    // Float sums sort samples per pixel
    let tiles: Vec<TileBuffer> = (0..16).map(|i| make_tile(ElementType::Float32, 1, i)).collect();
    let refs: Vec<&TileBuffer> = tiles.iter().collect();
    let params = CompositeParams::new(CompositeMethod::Sum, ValidRange::all(), 0.0);
    c.bench_function("composite_sum_float32_16_tiles", |bench| {
        bench.iter(|| black_box(composite(&refs, &params).unwrap()));
    });
}

fn bench_rasterize(c: &mut Criterion) {
    let tile = origin_tile();
    let square = Geometry::from_wkt("POLYGON((0.5 -0.5, 4 -0.5, 4 -4, 0.5 -4, 0.5 -0.5))").unwrap();
    let disc = Geometry::from_wkt("POINT(2.8 -2.8)")
        .unwrap()
        .buffer(2.0, 64)
        .unwrap();
    let road = Geometry::from_wkt("LINESTRING(-1 -0.3, 1.2 -2.1, 3.3 -1.4, 6.0 -5.2)").unwrap();

    c.bench_function("classify_square", |bench| {
        bench.iter(|| black_box(classify_area(&square, &tile).unwrap()));
    });
    c.bench_function("classify_buffered_point_64", |bench| {
        bench.iter(|| black_box(classify_area(&disc, &tile).unwrap()));
    });
    c.bench_function("touched_cells_linestring", |bench| {
        bench.iter(|| black_box(touched_cells(&road, &tile)));
    });

    let src = make_tile(ElementType::Byte, 3, 0);
    c.bench_function("clip_by_geometry_3band", |bench| {
        bench.iter(|| black_box(src.clip_by_geometry(&square, &tile, 0.0).unwrap()));
    });
}

fn bench_for_each_pixel(c: &mut Criterion) {
    let src = make_tile(ElementType::Int16, 4, 5);
    c.bench_function("for_each_pixel_ndvi", |bench| {
        bench.iter(|| {
            black_box(
                src.for_each_pixel(
                    &|b: &[f64], _: usize| (b[3] - b[2]) / (b[3] + b[2] + 1.0),
                    ElementType::Float32,
                )
                .unwrap(),
            )
        });
    });
}

fn bench_thread_scaling(c: &mut Criterion) {
    // Average of 32 tiles with different pool sizes
    let tiles: Vec<TileBuffer> = (0..32).map(|i| make_tile(ElementType::UInt16, 2, i)).collect();
    let refs: Vec<&TileBuffer> = tiles.iter().collect();
    let params = CompositeParams::new(CompositeMethod::Average, ValidRange::new(1.0, 240.0), 0.0);

    for &threads in &[1, 2, 4, 8] {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();

        c.bench_function(&format!("composite_threads_{threads}_average_32"), |bench| {
            bench.iter(|| black_box(pool.install(|| composite(&refs, &params).unwrap())));
        });
    }
}

criterion_group!(
    benches,
    bench_binary_ops,
    bench_scalar_ops,
    bench_composite,
    bench_rasterize,
    bench_for_each_pixel,
    bench_thread_scaling
);
criterion_main!(benches);
