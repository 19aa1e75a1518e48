use std::sync::Arc;

use interframe_frame_model::{format_key, FrameDescriptor, FrameGeometry, FrameRect};
use interframe_processing_core::{
    interpolate, sharpen, FrameCache, FrameInterpolator, InterpolationMode, SharedFrameCache,
    SharpenConfig,
};

fn texture(x: i64, y: i64) -> u8 {
    let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= h >> 29;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 32;
    (h & 0xff) as u8
}

/// BGRA frame whose texture is displaced by `shift` pixels.
fn synthetic_frame(
    width: u32,
    height: u32,
    frame_number: f64,
    shift: (i64, i64),
    timestamp_micros: u64,
) -> FrameDescriptor {
    let geometry = FrameGeometry::new(width, height, width as usize * 4, 4);
    let mut data = vec![0u8; geometry.required_bytes()];
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let v = texture(x - shift.0, y - shift.1);
            let o = geometry.offset(x as usize, y as usize);
            data[o..o + 4].copy_from_slice(&[255 - v, v, v / 3 + 40, 255]);
        }
    }
    FrameDescriptor::new("scene.mp4", frame_number, geometry, data)
        .expect("synthetic frame should be valid")
        .with_sequence(frame_number as u32, 300, 30.0)
        .with_timestamp_micros(timestamp_micros)
}

#[test]
fn full_hd_halfway_blend_scenario() {
    let a = synthetic_frame(1920, 1080, 30.0, (0, 0), 1_000_000);
    let b = synthetic_frame(1920, 1080, 60.0, (5, 3), 2_000_000);
    let roi = FrameRect::new(800, 400, 320, 280);

    let result = interpolate(&a, &b, 0.5, roi, InterpolationMode::Blend).unwrap();

    let blended = result.blended.expect("blend mode returns a blended frame");
    let shifted = result.shifted;
    for frame in [&blended, &shifted] {
        assert_eq!(frame.frame_number(), 45.0);
        assert_eq!(frame.key(), format_key("scene.mp4", 45.0, false));
        assert_eq!(frame.key(), "scene.mp4-45.000000");
        assert_eq!(frame.geometry(), a.geometry());
        assert_eq!(frame.line_stride(), 1920 * 4);
        assert_eq!(frame.total_bytes(), a.total_bytes());
        assert_eq!(frame.timestamp_micros, 1_500_000);
        assert_eq!(frame.timestamp_millis(), 1_500);
        assert_eq!(frame.total_frames, 300);
    }

    assert!(result.motion.valid);
    assert_eq!(result.motion.dt_micros, 1_000_000);
    assert!((result.motion.dx - 5.0).abs() < 0.3, "dx={}", result.motion.dx);
    assert!((result.motion.dy - 3.0).abs() < 0.3, "dy={}", result.motion.dy);
}

#[test]
fn cache_round_trip_with_sharpening() {
    let mut cache = FrameCache::new();
    cache.insert(synthetic_frame(160, 120, 0.0, (0, 0), 0));
    cache.insert(synthetic_frame(160, 120, 1.0, (2, 1), 33_333));

    let a = cache.lookup(&format_key("scene.mp4", 0.0, false)).unwrap();
    let b = cache.lookup(&format_key("scene.mp4", 1.0, false)).unwrap();
    let pristine_a = a.data().to_vec();

    let interpolator = FrameInterpolator::new();
    let roi = FrameRect::centered(80, 60, 64, 48);
    let mut result = interpolator
        .interpolate(&a, &b, 0.25, roi, InterpolationMode::ShiftOnly)
        .unwrap();
    assert!(result.blended.is_none());

    sharpen(&mut result.shifted, &SharpenConfig::default());
    let key = result.shifted.key().to_string();
    assert_eq!(key, "scene.mp4-0.250000");
    cache.insert(result.shifted);

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.keys().next(), Some(key.as_str()));
    assert_eq!(cache.lookup(a.key()).unwrap().data(), &pristine_a[..]);
}

#[test]
fn sharpening_a_cached_alias_leaves_cache_intact() {
    let cache = SharedFrameCache::default();
    cache.insert(synthetic_frame(32, 32, 7.0, (0, 0), 0));

    let cached = cache.lookup("scene.mp4-7.000000").unwrap();
    let snapshot = cached.data().to_vec();
    let mut working = FrameDescriptor::clone(&cached);
    sharpen(&mut working, &SharpenConfig::new(1.5));

    assert_ne!(working.data(), &snapshot[..]);
    assert_eq!(
        cache.lookup("scene.mp4-7.000000").unwrap().data(),
        &snapshot[..]
    );
}

#[test]
fn parallel_jobs_share_one_cache() {
    let a = Arc::new(synthetic_frame(96, 64, 0.0, (0, 0), 0));
    let b = Arc::new(synthetic_frame(96, 64, 1.0, (3, 0), 40_000));
    let cache = SharedFrameCache::default();

    let handles: Vec<_> = (1..8)
        .map(|step| {
            let (a, b, cache) = (Arc::clone(&a), Arc::clone(&b), cache.clone());
            std::thread::spawn(move || {
                let pct = step as f64 / 8.0;
                let roi = FrameRect::new(24, 16, 48, 32);
                let result = interpolate(&a, &b, pct, roi, InterpolationMode::Blend).unwrap();
                cache.insert(result.blended.unwrap());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 7);
    for step in 1..8 {
        let key = format_key("scene.mp4", step as f64 / 8.0, false);
        assert!(cache.lookup(&key).is_some(), "missing {key}");
    }
}
