//! Behavioral masking: per-field noise injection for avatar frames
//!
//! Each field (position, rotation, voice, gesture) draws its own noise from
//! the caller's RNG, scaled by the intensity for that field's tier. A field
//! whose intensity is zero is copied untouched, so tier `None` is an exact
//! identity.

use crate::level::PrivacyLevel;
use crate::types::{BehavioralFrame, FieldLevels, Gesture, Position, Rotation, Voice};
use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use rand::Rng;
use std::f64::consts::PI;

/// Noise intensities for one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseProfile {
    /// Max per-axis offset
    pub position: f64,
    /// Max perturbation angle as a fraction of π
    pub rotation: f64,
    pub gesture: f64,
    pub voice: f64,
}

impl NoiseProfile {
    pub fn for_level(level: PrivacyLevel) -> Self {
        let (position, rotation, gesture, voice) = match level {
            PrivacyLevel::None => (0.0, 0.0, 0.0, 0.0),
            PrivacyLevel::Light => (0.2, 0.1, 0.2, 0.2),
            PrivacyLevel::Medium => (0.5, 0.3, 0.5, 0.5),
            PrivacyLevel::Heavy => (1.0, 0.6, 0.8, 0.8),
            PrivacyLevel::Complete => (2.0, 1.0, 1.0, 1.0),
        };
        Self {
            position,
            rotation,
            gesture,
            voice,
        }
    }
}

/// Mask a frame at a single tier for every field
///
/// A trusted viewer gets an unmodified copy.
pub fn mask<R>(frame: &BehavioralFrame, level: PrivacyLevel, trusted: bool, rng: &mut R) -> BehavioralFrame
where
    R: Rng + ?Sized,
{
    mask_fields(frame, &FieldLevels::uniform(level), trusted, rng)
}

/// Mask a frame with an individual tier per field
pub fn mask_fields<R>(
    frame: &BehavioralFrame,
    levels: &FieldLevels,
    trusted: bool,
    rng: &mut R,
) -> BehavioralFrame
where
    R: Rng + ?Sized,
{
    let mut masked = frame.clone();
    if trusted {
        return masked;
    }

    let position = NoiseProfile::for_level(levels.position).position;
    if position > 0.0 {
        perturb_position(&mut masked.position, position, rng);
    }

    let rotation = NoiseProfile::for_level(levels.rotation).rotation;
    if rotation > 0.0 {
        masked.rotation = perturb_rotation(&masked.rotation, rotation, rng);
    }

    let voice = NoiseProfile::for_level(levels.voice).voice;
    if voice > 0.0 {
        if let Some(v) = masked.voice.as_mut() {
            perturb_voice(v, voice, rng);
        }
    }

    let gesture = NoiseProfile::for_level(levels.gesture).gesture;
    if gesture > 0.0 {
        for g in &mut masked.gestures {
            perturb_gesture(g, gesture, rng);
        }
    }

    tracing::trace!(
        position = %levels.position,
        rotation = %levels.rotation,
        voice = %levels.voice,
        gesture = %levels.gesture,
        "Frame masked"
    );

    masked
}

/// Uniform draw from [-1, 1]
fn jitter<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(-1.0f64..=1.0)
}

/// Offset each axis by up to `intensity` in either direction
pub fn perturb_position<R: Rng + ?Sized>(position: &mut Position, intensity: f64, rng: &mut R) {
    position.x += jitter(rng) * intensity;
    position.y += jitter(rng) * intensity;
    position.z += jitter(rng) * intensity;
}

/// Uniformly distributed unit axis, by rejection sampling in the unit ball
pub(crate) fn random_axis<R: Rng + ?Sized>(rng: &mut R) -> Unit<Vector3<f64>> {
    loop {
        let v = Vector3::new(jitter(rng), jitter(rng), jitter(rng));
        let norm = v.norm();
        if norm > 1e-6 && norm <= 1.0 {
            return Unit::new_normalize(v);
        }
    }
}

/// Rotate by a random axis and an angle in `[0, intensity * π]`
///
/// The perturbation is composed on the right (`original ⊗ perturbation`) and
/// the product renormalized.
pub fn perturb_rotation<R: Rng + ?Sized>(rotation: &Rotation, intensity: f64, rng: &mut R) -> Rotation {
    let axis = random_axis(rng);
    let angle = rng.gen_range(0.0..=intensity * PI);
    let perturbation = UnitQuaternion::from_axis_angle(&axis, angle);

    let original = Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z);
    let composed = UnitQuaternion::new_normalize(original * perturbation.into_inner());

    Rotation {
        x: composed.i,
        y: composed.j,
        z: composed.k,
        w: composed.w,
    }
}

/// Shift frequencies, amplitudes, pitch and timbre in place
///
/// Amplitudes stay non-negative and timbre stays in `[0, 1]`.
pub fn perturb_voice<R: Rng + ?Sized>(voice: &mut Voice, intensity: f64, rng: &mut R) {
    for freq in &mut voice.frequency {
        *freq += jitter(rng) * intensity * 100.0;
    }
    for amp in &mut voice.amplitude {
        *amp = (*amp + jitter(rng) * intensity).max(0.0);
    }
    voice.pitch += jitter(rng) * intensity * 50.0;
    voice.timbre = (voice.timbre + jitter(rng) * intensity).clamp(0.0, 1.0);
}

/// Shift gesture intensity and speed in place
///
/// Intensity stays in `[0, 1]` and speed at or above 0.1. Joint rotations
/// are perturbed at half the gesture intensity.
pub fn perturb_gesture<R: Rng + ?Sized>(gesture: &mut Gesture, intensity: f64, rng: &mut R) {
    gesture.intensity = (gesture.intensity + jitter(rng) * intensity).clamp(0.0, 1.0);
    gesture.speed = (gesture.speed + jitter(rng) * intensity).max(0.1);

    for rotation in gesture.joint_rotations.values_mut() {
        *rotation = perturb_rotation(rotation, intensity * 0.5, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_frame() -> BehavioralFrame {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        BehavioralFrame::new(Position::new(10.5, 2.0, -3.2), Rotation::new(0.0, half, 0.0, half))
            .with_voice(Voice {
                frequency: vec![110.0, 220.0, 440.0],
                amplitude: vec![0.05, 0.5, 0.9],
                pitch: 180.0,
                timbre: 0.95,
            })
            .with_gesture(
                Gesture::new("wave", 0.9, 0.15).with_joint("elbow", Rotation::identity()),
            )
            .with_gesture(Gesture::new("nod", 0.1, 1.0))
    }

    fn to_unit(rotation: &Rotation) -> UnitQuaternion<f64> {
        UnitQuaternion::new_normalize(Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z))
    }

    #[test]
    fn test_noise_table() {
        assert_eq!(
            NoiseProfile::for_level(PrivacyLevel::None),
            NoiseProfile { position: 0.0, rotation: 0.0, gesture: 0.0, voice: 0.0 }
        );
        assert_eq!(
            NoiseProfile::for_level(PrivacyLevel::Medium),
            NoiseProfile { position: 0.5, rotation: 0.3, gesture: 0.5, voice: 0.5 }
        );
        assert_eq!(
            NoiseProfile::for_level(PrivacyLevel::Complete),
            NoiseProfile { position: 2.0, rotation: 1.0, gesture: 1.0, voice: 1.0 }
        );
    }

    #[test]
    fn test_noise_grows_with_level() {
        for pair in PrivacyLevel::ALL.windows(2) {
            let lo = NoiseProfile::for_level(pair[0]);
            let hi = NoiseProfile::for_level(pair[1]);
            assert!(lo.position < hi.position);
            assert!(lo.rotation < hi.rotation);
            assert!(lo.gesture < hi.gesture);
            assert!(lo.voice < hi.voice);
        }
    }

    #[test]
    fn test_trusted_viewer_gets_exact_copy() {
        let frame = sample_frame();
        let mut rng = StdRng::seed_from_u64(1);
        for level in PrivacyLevel::ALL {
            assert_eq!(mask(&frame, level, true, &mut rng), frame);
        }
    }

    #[test]
    fn test_level_none_is_identity_for_everyone() {
        let frame = sample_frame();
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(mask(&frame, PrivacyLevel::None, false, &mut rng), frame);
        assert_eq!(mask(&frame, PrivacyLevel::None, true, &mut rng), frame);
    }

    #[test]
    fn test_complete_position_noise_is_bounded() {
        let frame = sample_frame();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let masked = mask(&frame, PrivacyLevel::Complete, false, &mut rng);
            assert!((masked.position.x - 10.5).abs() <= 2.0);
            assert!((masked.position.y - 2.0).abs() <= 2.0);
            assert!((masked.position.z + 3.2).abs() <= 2.0);
        }
    }

    #[test]
    fn test_untrusted_complete_changes_frame() {
        let frame = sample_frame();
        let mut rng = StdRng::seed_from_u64(3);
        let masked = mask(&frame, PrivacyLevel::Complete, false, &mut rng);
        assert_ne!(masked.position, frame.position);
        assert_ne!(masked.rotation, frame.rotation);
    }

    #[test]
    fn test_same_seed_same_output() {
        let frame = sample_frame();
        let a = mask(&frame, PrivacyLevel::Heavy, false, &mut StdRng::seed_from_u64(42));
        let b = mask(&frame, PrivacyLevel::Heavy, false, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rotation_composes_perturbation_on_the_right() {
        let rotation = Rotation::new(0.2, -0.4, 0.1, (1.0f64 - 0.04 - 0.16 - 0.01).sqrt());
        let masked = perturb_rotation(&rotation, 0.6, &mut StdRng::seed_from_u64(5));

        let mut replay = StdRng::seed_from_u64(5);
        let axis = random_axis(&mut replay);
        let angle = replay.gen_range(0.0..=0.6 * PI);
        let expected = to_unit(&rotation) * UnitQuaternion::from_axis_angle(&axis, angle);

        assert!((masked.w - expected.w).abs() < 1e-12);
        assert!((masked.x - expected.i).abs() < 1e-12);
        assert!((masked.y - expected.j).abs() < 1e-12);
        assert!((masked.z - expected.k).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_angle_bounded_by_intensity() {
        let frame = sample_frame();
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let masked = mask(&frame, PrivacyLevel::Light, false, &mut rng);
            let angle = to_unit(&frame.rotation).angle_to(&to_unit(&masked.rotation));
            assert!(angle <= 0.1 * PI + 1e-9, "seed {} angle {}", seed, angle);
        }
    }

    #[test]
    fn test_voice_and_gesture_clamps_hold() {
        let frame = sample_frame();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let masked = mask(&frame, PrivacyLevel::Complete, false, &mut rng);

            let voice = masked.voice.as_ref().unwrap();
            assert!(voice.amplitude.iter().all(|a| *a >= 0.0));
            assert!((0.0..=1.0).contains(&voice.timbre));
            for (before, after) in frame.voice.as_ref().unwrap().frequency.iter().zip(&voice.frequency) {
                assert!((after - before).abs() <= 100.0);
            }
            assert!((voice.pitch - 180.0).abs() <= 50.0);

            for gesture in &masked.gestures {
                assert!((0.0..=1.0).contains(&gesture.intensity));
                assert!(gesture.speed >= 0.1);
                for joint in gesture.joint_rotations.values() {
                    assert!((joint.norm() - 1.0).abs() < 1e-6);
                }
            }
            assert_eq!(masked.gestures[0].name, "wave");
        }
    }

    #[test]
    fn test_missing_voice_stays_missing() {
        let frame = BehavioralFrame::new(Position::default(), Rotation::identity());
        let masked = mask(&frame, PrivacyLevel::Complete, false, &mut StdRng::seed_from_u64(8));
        assert!(masked.voice.is_none());
        assert!(masked.gestures.is_empty());
    }

    #[test]
    fn test_per_field_levels_only_touch_selected_fields() {
        let frame = sample_frame();
        let levels = FieldLevels {
            position: PrivacyLevel::Complete,
            ..FieldLevels::default()
        };
        let masked = mask_fields(&frame, &levels, false, &mut StdRng::seed_from_u64(9));

        assert_ne!(masked.position, frame.position);
        assert_eq!(masked.rotation, frame.rotation);
        assert_eq!(masked.voice, frame.voice);
        assert_eq!(masked.gestures, frame.gestures);
    }

    #[test]
    fn test_mask_does_not_alias_input() {
        let frame = sample_frame();
        let mut masked = mask(&frame, PrivacyLevel::None, true, &mut StdRng::seed_from_u64(10));
        masked.gestures[0].name.push_str("-edited");
        assert_eq!(frame.gestures[0].name, "wave");
    }

    proptest! {
        #[test]
        fn prop_masked_rotation_stays_unit(
            x in -1.0f64..1.0,
            y in -1.0f64..1.0,
            z in -1.0f64..1.0,
            w in -1.0f64..1.0,
            level in 0u8..5,
            seed in any::<u64>(),
        ) {
            let norm = (x * x + y * y + z * z + w * w).sqrt();
            prop_assume!(norm > 1e-3);
            let rotation = Rotation::new(x / norm, y / norm, z / norm, w / norm);
            let frame = BehavioralFrame::new(Position::default(), rotation);
            let level = PrivacyLevel::from_u8(level).unwrap();

            let masked = mask(&frame, level, false, &mut StdRng::seed_from_u64(seed));
            prop_assert!((masked.rotation.norm() - 1.0).abs() < 1e-6);
        }
    }
}
