use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use gabor_cache::StaticAssets;
use gabor_core::{ProvidedConfig, StimulusConfig, resolve};
use gabor_render::PreparedStimulus;
use pprof::criterion::{Output, PProfProfiler};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn config(json: &str) -> StimulusConfig {
    let provided: ProvidedConfig = serde_json::from_str(json).expect("config json");
    resolve(&provided).expect("config")
}

pub fn bench_prepare(c: &mut Criterion) {
    let mut g = c.benchmark_group("prepare");
    g.sample_size(30);

    let plain = config(r#"{"stimulus":{"size":400,"rotation":30},"fixationCross":{}}"#);
    g.bench_function("grating_400", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(0);
            PreparedStimulus::prepare(black_box(plain.clone()), &mut rng).unwrap()
        })
    });

    let noise = config(r#"{"stimulus":{"size":200},"background":{"type":"noise"}}"#);
    g.bench_function("noise_200x100", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(0);
            PreparedStimulus::prepare(black_box(noise.clone()), &mut rng).unwrap()
        })
    });

    g.finish();
}

pub fn bench_refresh(c: &mut Criterion) {
    let mut g = c.benchmark_group("refresh");
    g.sample_size(60);

    let mut rng = StdRng::seed_from_u64(1);
    let prepared = PreparedStimulus::prepare(
        config(r#"{"stimulus":{"size":400,"rotation":45},"background":{"type":"noise","frameCount":10,"fps":60}}"#),
        &mut rng,
    )
    .unwrap();
    let assets = StaticAssets::new();

    g.bench_function("compose_noise_frame", |b| {
        b.iter_batched(
            || prepared.build_scene().unwrap(),
            |mut scene| {
                scene.on_refresh(black_box(0.0), &assets, &mut rng);
                scene
            },
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = bench_prepare, bench_refresh
}
criterion_main!(benches);
