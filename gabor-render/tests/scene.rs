use gabor_cache::StaticAssets;
use gabor_core::{ProvidedConfig, StimulusConfig, resolve};
use gabor_render::{PreparedStimulus, Scene};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

fn config(json: &str) -> StimulusConfig {
    let provided: ProvidedConfig = serde_json::from_str(json).expect("valid json");
    resolve(&provided).expect("valid config")
}

fn refresh_for(scene: &mut Scene, ms: f64, rng: &mut StdRng) -> usize {
    let assets = StaticAssets::new();
    let mut redraws = 0;
    let mut t = 0.0;
    while t <= ms {
        if scene.on_refresh(t, &assets, rng) {
            redraws += 1;
        }
        t += 1000.0 / 60.0;
    }
    redraws
}

#[test]
fn noise_frames_are_generated_once_and_shared() {
    let mut rng = StdRng::seed_from_u64(11);
    let prepared = PreparedStimulus::prepare(
        config(r#"{"stimulus":{"size":32},"background":{"type":"noise","frameCount":6}}"#),
        &mut rng,
    )
    .unwrap();
    assert_eq!(prepared.noise_frames().len(), 6);

    let first = prepared.build_scene().unwrap();
    let second = prepared.build_scene().unwrap();
    assert!(first.background().is_animating());
    assert!(second.background().is_animating());

    let clone = prepared.clone();
    assert!(
        prepared
            .noise_frames()
            .iter()
            .zip(clone.noise_frames())
            .all(|(a, b)| Arc::ptr_eq(a, b))
    );
}

#[test]
fn noise_background_cycles_at_its_own_rate() {
    let mut rng = StdRng::seed_from_u64(5);
    let prepared = PreparedStimulus::prepare(
        config(r#"{"stimulus":{"size":24},"background":{"type":"noise","frameCount":4,"fps":15}}"#),
        &mut rng,
    )
    .unwrap();
    let mut scene = prepared.build_scene().unwrap();
    let redraws = refresh_for(&mut scene, 1000.0, &mut rng);
    assert!((14..=16).contains(&redraws), "redraws = {redraws}");
}

#[test]
fn noise_defaults_to_every_fifth_refresh() {
    let mut rng = StdRng::seed_from_u64(6);
    let prepared = PreparedStimulus::prepare(
        config(r#"{"stimulus":{"size":24},"background":{"type":"noise","frameCount":4}}"#),
        &mut rng,
    )
    .unwrap();
    let mut scene = prepared.build_scene().unwrap();
    let redraws = refresh_for(&mut scene, 1000.0, &mut rng);
    assert!((11..=13).contains(&redraws), "redraws = {redraws}");
}

#[test]
fn stopped_background_no_longer_redraws() {
    let mut rng = StdRng::seed_from_u64(5);
    let prepared = PreparedStimulus::prepare(
        config(r#"{"stimulus":{"size":24},"background":{"type":"noise","frameCount":4}}"#),
        &mut rng,
    )
    .unwrap();
    let mut scene = prepared.build_scene().unwrap();
    let flag = scene.background_stop_flag().expect("noise cycles");
    flag.stop();
    assert_eq!(refresh_for(&mut scene, 500.0, &mut rng), 0);
}

#[test]
fn rotation_turns_stripes() {
    let mut rng = StdRng::seed_from_u64(0);
    let upright = PreparedStimulus::prepare(
        config(r#"{"stimulus":{"size":100,"density":3},"aperture":{"radius":50,"blur":0}}"#),
        &mut rng,
    )
    .unwrap()
    .build_scene()
    .unwrap();
    let turned = PreparedStimulus::prepare(
        config(
            r#"{"stimulus":{"size":100,"density":3,"rotation":90},"aperture":{"radius":50,"blur":0}}"#,
        ),
        &mut rng,
    )
    .unwrap()
    .build_scene()
    .unwrap();

    let grey = |scene: &Scene, x: u32, y: u32| scene.surface().pixel(x, y).unwrap().red() as i32;
    // Upright stripes are horizontal: constant along a row.
    assert_eq!(grey(&upright, 40, 35), grey(&upright, 60, 35));
    // A quarter turn makes them vertical: constant along a column.
    assert!((grey(&turned, 35, 40) - grey(&turned, 35, 60)).abs() <= 2);
    // Column 35 of the turned grating is row 64 of the upright one.
    assert!((grey(&turned, 35, 50) - grey(&upright, 50, 64)).abs() <= 2);
}

#[test]
fn hidden_scene_stays_blank_while_background_would_change() {
    let mut rng = StdRng::seed_from_u64(1);
    let prepared = PreparedStimulus::prepare(
        config(r#"{"stimulus":{"size":16},"background":{"type":"noise","frameCount":3,"fps":60}}"#),
        &mut rng,
    )
    .unwrap();
    let mut scene = prepared.build_scene().unwrap();
    scene.set_visible(false);
    refresh_for(&mut scene, 200.0, &mut rng);
    assert!(scene.surface().pixels().iter().all(|p| p.alpha() == 0));
}

#[test]
fn unset_aperture_is_resolved_when_the_mask_is_built() {
    let mut rng = StdRng::seed_from_u64(0);
    let sentinel = PreparedStimulus::prepare(
        config(r#"{"stimulus":{"size":80},"aperture":{"radius":-1,"blur":-1}}"#),
        &mut rng,
    )
    .unwrap();
    let omitted =
        PreparedStimulus::prepare(config(r#"{"stimulus":{"size":80}}"#), &mut rng).unwrap();

    assert_eq!(sentinel.config().aperture.radius, -1.0);
    assert_eq!(sentinel.grating().data(), omitted.grating().data());
    // size / 4 radius: the center is visible, a corner is not.
    assert!(sentinel.grating().pixel(40, 40).unwrap().alpha() > 200);
    assert_eq!(sentinel.grating().pixel(0, 0).unwrap().alpha(), 0);
}
