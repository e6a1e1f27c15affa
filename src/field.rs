//! The orbiting body field.
//!
//! Each body orbits a fixed home point in the XY plane, is pushed away from
//! the pointer when it comes within the repel radius, and follows the
//! resulting target through an exponential smoothing filter. Bodies do not
//! interact with each other.
//!
//! # Per-frame update
//!
//! For a body at `current` with home `h`:
//!
//! 1. `target = h + (sin(t·speed + phase), cos(t·speed + phase), 0) · orbit_radius`
//! 2. with `d = |current.xy - pointer.xy|`, if `d < repel_radius` the target XY
//!    is pushed by `(current.xy - pointer.xy) / max(d, 0.1) · (R - d) / R · strength`
//! 3. `current = lerp(current, target, factor)`
//!
//! Repulsion uses the smoothed `current` position from the previous frame,
//! not the target, so the push lags one frame behind the pointer.
//!
//! The whole field also floats as a group: [`FloatMotion`] bobs it along Y
//! and sways it about all three axes. That motion only affects rendering;
//! the simulation and the repulsion stay in field space.

use glam::{EulerRot, Quat, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::FieldConfig;
use crate::smoothing::SmoothingMode;

/// Distance floor used when normalizing the repulsion direction.
pub const MIN_REPEL_DISTANCE: f32 = 0.1;

/// One simulated body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatedBody {
    /// Orbit center; fixed after creation.
    pub home: Vec3,
    /// Smoothed, rendered position.
    pub current: Vec3,
    pub phase: f32,
    /// Orbit angular speed in radians per second.
    pub angular_speed: f32,
    pub orbit_radius: f32,
    /// Uniform render scale.
    pub scale: f32,
    /// Multiplier on the per-axis rotation rates.
    pub rotation_speed: f32,
}

impl AnimatedBody {
    /// Orbit position at `elapsed` seconds, before repulsion.
    #[inline]
    pub fn orbit_target(&self, elapsed: f32) -> Vec3 {
        let angle = elapsed * self.angular_speed + self.phase;
        Vec3::new(
            self.home.x + angle.sin() * self.orbit_radius,
            self.home.y + angle.cos() * self.orbit_radius,
            self.home.z,
        )
    }

    /// Euler angles (XYZ) at `elapsed` seconds. Stateless, not smoothed.
    #[inline]
    pub fn rotation(&self, elapsed: f32, rates: Vec3) -> Vec3 {
        rates * (elapsed * self.rotation_speed)
    }
}

/// Linear-falloff planar repulsion away from the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repulsion {
    pub radius: f32,
    pub strength: f32,
}

impl Repulsion {
    /// `1` at the pointer, falling linearly to `0` at `radius` and beyond.
    #[inline]
    pub fn falloff(&self, distance: f32) -> f32 {
        if distance < self.radius {
            (self.radius - distance) / self.radius
        } else {
            0.0
        }
    }

    /// Offset added to a body's target XY given its current position.
    #[inline]
    pub fn offset(&self, current: Vec3, pointer: Vec3) -> Vec2 {
        let away = current.truncate() - pointer.truncate();
        let distance = away.length();
        let force = self.falloff(distance);
        if force <= 0.0 {
            return Vec2::ZERO;
        }
        away / distance.max(MIN_REPEL_DISTANCE) * force * self.strength
    }
}

/// Slow group bob and sway applied to every body's rendered transform.
///
/// With `a = t / 4 * speed` the group is offset by `sin(a) / 10 * float_intensity`
/// along Y and rotated (XYZ) by `(cos(a) / 8, sin(a) / 8, sin(a) / 20) * rotation_intensity`.
/// The motion repeats every `8π / speed` seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatMotion {
    pub speed: f32,
    pub rotation_intensity: f32,
    pub float_intensity: f32,
}

impl Default for FloatMotion {
    fn default() -> Self {
        Self {
            speed: 2.0,
            rotation_intensity: 0.8,
            float_intensity: 0.8,
        }
    }
}

impl FloatMotion {
    /// No motion at all.
    pub const STILL: Self = Self {
        speed: 0.0,
        rotation_intensity: 0.0,
        float_intensity: 0.0,
    };

    #[inline]
    fn angle(&self, elapsed: f32) -> f32 {
        elapsed / 4.0 * self.speed
    }

    /// Group translation at `elapsed` seconds.
    pub fn offset(&self, elapsed: f32) -> Vec3 {
        Vec3::new(0.0, self.angle(elapsed).sin() / 10.0 * self.float_intensity, 0.0)
    }

    /// Group Euler angles (XYZ) at `elapsed` seconds.
    pub fn euler(&self, elapsed: f32) -> Vec3 {
        let (sin, cos) = self.angle(elapsed).sin_cos();
        Vec3::new(cos / 8.0, sin / 8.0, sin / 20.0) * self.rotation_intensity
    }

    pub fn rotation(&self, elapsed: f32) -> Quat {
        let e = self.euler(elapsed);
        Quat::from_euler(EulerRot::XYZ, e.x, e.y, e.z)
    }

    /// Seconds per full cycle; `None` when the motion is frozen.
    pub fn period(&self) -> Option<f32> {
        (self.speed != 0.0).then(|| 8.0 * std::f32::consts::PI / self.speed.abs())
    }
}

/// Fixed-size collection of bodies advanced once per frame.
#[derive(Clone, Debug)]
pub struct ParticleField {
    bodies: Vec<AnimatedBody>,
    repulsion: Repulsion,
    smoothing: f32,
    mode: SmoothingMode,
    rotation_rates: Vec3,
    float: FloatMotion,
}

impl ParticleField {
    /// Build a field from config, seeded by `config.seed` when set.
    pub fn new(config: &FieldConfig, mode: SmoothingMode) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, mode, &mut rng)
    }

    /// Build a field drawing every random attribute from `rng`.
    pub fn with_rng<R: Rng>(config: &FieldConfig, mode: SmoothingMode, rng: &mut R) -> Self {
        let bodies = (0..config.count)
            .map(|_| {
                let home = sample_in_box(rng, config.bounds);
                let angular_speed = config.speed.sample(rng);
                let scale = config.scale.sample(rng);
                let phase = config.phase.sample(rng);
                let orbit_radius = config.orbit_radius.sample(rng);
                let rotation_speed = config.rotation_speed.sample(rng);
                // Start somewhere else in the box so bodies fly in to their orbits.
                let current = sample_in_box(rng, config.bounds);
                AnimatedBody {
                    home,
                    current,
                    phase,
                    angular_speed,
                    orbit_radius,
                    scale,
                    rotation_speed,
                }
            })
            .collect();
        Self::from_bodies(bodies, config, mode)
    }

    /// Build a field from explicit bodies; only the dynamics come from `config`.
    pub fn from_bodies(bodies: Vec<AnimatedBody>, config: &FieldConfig, mode: SmoothingMode) -> Self {
        log::debug!("particle field with {} bodies", bodies.len());
        Self {
            bodies,
            repulsion: Repulsion {
                radius: config.repel_radius,
                strength: config.repel_strength,
            },
            smoothing: config.smoothing,
            mode,
            rotation_rates: config.rotation_rates,
            float: config.float,
        }
    }

    /// Advance every body by one frame.
    ///
    /// Deterministic in `(elapsed, dt, pointer)` and the previous positions.
    pub fn step(&mut self, elapsed: f32, dt: f32, pointer: Vec3) {
        let factor = self.mode.factor(self.smoothing, dt);
        let repulsion = self.repulsion;
        for body in &mut self.bodies {
            let target = Self::target_for(body, repulsion, elapsed, pointer);
            body.current = body.current.lerp(target, factor);
        }
    }

    /// Target a body is pulled toward this frame, repulsion included.
    pub fn target(&self, index: usize, elapsed: f32, pointer: Vec3) -> Vec3 {
        Self::target_for(&self.bodies[index], self.repulsion, elapsed, pointer)
    }

    #[inline]
    fn target_for(body: &AnimatedBody, repulsion: Repulsion, elapsed: f32, pointer: Vec3) -> Vec3 {
        let mut target = body.orbit_target(elapsed);
        let push = repulsion.offset(body.current, pointer);
        target.x += push.x;
        target.y += push.y;
        target
    }

    pub fn bodies(&self) -> &[AnimatedBody] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn repulsion(&self) -> Repulsion {
        self.repulsion
    }

    pub fn rotation_rates(&self) -> Vec3 {
        self.rotation_rates
    }

    pub fn float(&self) -> FloatMotion {
        self.float
    }
}

/// Uniform point in the box `[-extent/2, extent/2)`.
fn sample_in_box<R: Rng>(rng: &mut R, extent: Vec3) -> Vec3 {
    Vec3::new(
        (rng.gen::<f32>() - 0.5) * extent.x,
        (rng.gen::<f32>() - 0.5) * extent.y,
        (rng.gen::<f32>() - 0.5) * extent.z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FAR_AWAY: Vec3 = Vec3::new(1.0e4, 1.0e4, 0.0);

    fn seeded(count: usize, seed: u64) -> ParticleField {
        let config = FieldConfig {
            count,
            seed: Some(seed),
            ..FieldConfig::default()
        };
        ParticleField::new(&config, SmoothingMode::Fixed)
    }

    fn body_at(home: Vec3) -> AnimatedBody {
        AnimatedBody {
            home,
            current: home,
            phase: 0.0,
            angular_speed: 0.0,
            orbit_radius: 0.0,
            scale: 0.3,
            rotation_speed: 0.004,
        }
    }

    #[test]
    fn bodies_stay_in_configured_box() {
        let field = seeded(200, 1);
        let config = FieldConfig::default();
        for body in field.bodies() {
            assert!(body.home.abs().cmple(config.bounds * 0.5).all(), "{:?}", body.home);
            assert!(body.current.abs().cmple(config.bounds * 0.5).all());
            assert!((0.05..0.20).contains(&body.angular_speed));
            assert!((2.0..7.0).contains(&body.orbit_radius));
            assert!((0.1..0.5).contains(&body.scale));
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = seeded(40, 42);
        let b = seeded(40, 42);
        assert_eq!(a.bodies(), b.bodies());
        assert_ne!(a.bodies(), seeded(40, 43).bodies());
    }

    #[test]
    fn orbit_keeps_home_depth() {
        let mut body = body_at(Vec3::new(1.0, 2.0, -3.0));
        body.orbit_radius = 5.0;
        body.angular_speed = 0.1;
        for i in 0..10 {
            let target = body.orbit_target(i as f32 * 0.7);
            assert_eq!(target.z, -3.0);
            let planar = (target - body.home).truncate().length();
            assert!((planar - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn converges_monotonically_without_repulsion() {
        let mut field = seeded(40, 7);
        let elapsed = 3.0;
        for _ in 0..50 {
            let before: Vec<f32> = (0..field.len())
                .map(|i| field.bodies()[i].current.distance(field.target(i, elapsed, FAR_AWAY)))
                .collect();
            field.step(elapsed, 1.0 / 60.0, FAR_AWAY);
            for (i, d0) in before.iter().enumerate() {
                let d1 = field.bodies()[i].current.distance(field.target(i, elapsed, FAR_AWAY));
                assert!(d1 < *d0, "body {i}: {d1} !< {d0}");
            }
        }
    }

    #[test]
    fn per_frame_displacement_is_bounded_by_factor() {
        let mut field = seeded(40, 11);
        let pointer = Vec3::ZERO;
        let elapsed = 1.0;
        let before: Vec<(Vec3, Vec3)> = (0..field.len())
            .map(|i| (field.bodies()[i].current, field.target(i, elapsed, pointer)))
            .collect();
        field.step(elapsed, 1.0 / 60.0, pointer);
        for (i, (current, target)) in before.into_iter().enumerate() {
            let moved = field.bodies()[i].current.distance(current);
            assert!(moved <= current.distance(target) * 0.03 + 1e-4);
        }
    }

    #[test]
    fn repulsion_zero_at_boundary_and_pointer_coincident_is_finite() {
        let repulsion = Repulsion { radius: 8.0, strength: 4.0 };
        assert_eq!(repulsion.falloff(8.0), 0.0);
        assert_eq!(repulsion.falloff(0.0), 1.0);
        assert_eq!(repulsion.offset(Vec3::new(8.0, 0.0, 0.0), Vec3::ZERO), Vec2::ZERO);

        let at_pointer = repulsion.offset(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert!(at_pointer.is_finite());
        assert_eq!(at_pointer, Vec2::ZERO);

        // Below the distance floor the push shrinks instead of blowing up.
        let tiny = repulsion.offset(Vec3::new(0.01, 0.0, 0.0), Vec3::ZERO);
        assert!(tiny.x > 0.0 && tiny.x < 4.0);
    }

    #[test]
    fn repulsion_ignores_depth() {
        let repulsion = Repulsion { radius: 8.0, strength: 4.0 };
        let shallow = repulsion.offset(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO);
        let deep = repulsion.offset(Vec3::new(3.0, 0.0, -40.0), Vec3::ZERO);
        assert_eq!(shallow, deep);
    }

    #[test]
    fn pointer_pushes_resting_body_outward() {
        let config = FieldConfig::default();
        let home = Vec3::new(2.0, 1.0, 0.5);
        let mut field =
            ParticleField::from_bodies(vec![body_at(home)], &config, SmoothingMode::Fixed);
        for frame in 1..=100 {
            field.step(frame as f32 / 60.0, 1.0 / 60.0, Vec3::ZERO);
        }
        let current = field.bodies()[0].current;
        assert!(current.length() > home.length());
        assert_eq!(current.z, home.z);
        // Pushed along the ray from the pointer through the home point.
        let dir = current.truncate().normalize();
        assert!(dir.abs_diff_eq(home.truncate().normalize(), 1e-4));
    }

    #[test]
    fn rotation_is_linear_in_time() {
        let body = body_at(Vec3::ZERO);
        let rates = Vec3::new(10.0, 15.0, 5.0);
        assert_eq!(body.rotation(0.0, rates), Vec3::ZERO);
        let r = body.rotation(2.0, rates);
        assert!((r - Vec3::new(0.08, 0.12, 0.04)).abs().max_element() < 1e-6);
    }

    #[test]
    fn float_motion_amplitude_and_period() {
        let float = FloatMotion::default();
        let period = float.period().unwrap();
        assert!((period - 4.0 * std::f32::consts::PI).abs() < 1e-5);

        // Peak bob a quarter cycle in: sin = 1.
        let peak = float.offset(period / 4.0);
        assert!((peak.y - 0.08).abs() < 1e-6);
        assert_eq!(peak.x, 0.0);
        assert_eq!(peak.z, 0.0);

        let start = float.euler(0.0);
        assert!(start.abs_diff_eq(Vec3::new(0.1, 0.0, 0.0), 1e-6));
        let quarter = float.euler(period / 4.0);
        assert!(quarter.abs_diff_eq(Vec3::new(0.0, 0.1, 0.04), 1e-6));

        for t in [0.3f32, 2.0, 7.5] {
            assert!(float.offset(t + period).abs_diff_eq(float.offset(t), 1e-5));
            assert!(float.euler(t + period).abs_diff_eq(float.euler(t), 1e-5));
        }
    }

    #[test]
    fn still_float_is_identity() {
        let still = FloatMotion::STILL;
        assert_eq!(still.period(), None);
        assert_eq!(still.offset(3.0), Vec3::ZERO);
        assert!(still.rotation(3.0).abs_diff_eq(Quat::IDENTITY, 1e-7));
    }

    #[test]
    fn field_carries_configured_float() {
        let config = FieldConfig {
            count: 3,
            seed: Some(1),
            float: FloatMotion {
                speed: 1.0,
                ..FloatMotion::default()
            },
            ..FieldConfig::default()
        };
        let field = ParticleField::new(&config, SmoothingMode::Fixed);
        assert_eq!(field.float().speed, 1.0);
    }

    proptest! {
        #[test]
        fn falloff_strictly_decreases_inside_radius(a in 0.0f32..8.0, b in 0.0f32..8.0) {
            prop_assume!((a - b).abs() > 1e-3);
            let repulsion = Repulsion { radius: 8.0, strength: 4.0 };
            let (near, far) = if a < b { (a, b) } else { (b, a) };
            prop_assert!(repulsion.falloff(near) > repulsion.falloff(far));
        }

        #[test]
        fn falloff_vanishes_outside_radius(d in 8.0f32..1.0e6) {
            let repulsion = Repulsion { radius: 8.0, strength: 4.0 };
            prop_assert_eq!(repulsion.falloff(d), 0.0);
        }

        #[test]
        fn rotation_is_periodic_per_axis(t in 0.0f32..100.0, speed in 0.001f32..0.005) {
            let mut body = body_at(Vec3::ZERO);
            body.rotation_speed = speed;
            let rates = Vec3::new(10.0, 15.0, 5.0);
            let now = body.rotation(t, rates);
            for axis in 0..3 {
                let period = std::f32::consts::TAU / (rates[axis] * speed);
                let later = body.rotation(t + period, rates);
                let turns = (later[axis] - now[axis]) / std::f32::consts::TAU;
                prop_assert!((turns - 1.0).abs() < 1e-3, "axis {} turns {}", axis, turns);
            }
        }
    }
}
