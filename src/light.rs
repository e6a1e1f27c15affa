//! Ambient plus a single pointer-following point light.

use glam::Vec3;

use crate::config::{LightConfig, Rgb};

/// Destination for the point light position.
pub trait LightSink {
    fn set_light_position(&mut self, position: Vec3);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: Rgb,
    pub intensity: f32,
    /// Contribution falls linearly to zero at this range.
    pub distance: f32,
    pub position: Vec3,
}

/// The scene's lights. Only the point light position changes per frame.
#[derive(Clone, Debug)]
pub struct LightRig {
    ambient: f32,
    point: PointLight,
    z_offset: f32,
}

impl LightRig {
    pub fn new(config: &LightConfig) -> Self {
        Self {
            ambient: config.ambient,
            point: PointLight {
                color: config.color,
                intensity: config.intensity,
                distance: config.distance,
                position: Vec3::new(0.0, 0.0, config.z_offset),
            },
            z_offset: config.z_offset,
        }
    }

    /// Move the point light in front of the pointer and report it to `sink`.
    pub fn follow<S: LightSink + ?Sized>(&mut self, pointer_world: Vec3, sink: &mut S) {
        self.point.position = pointer_world + Vec3::Z * self.z_offset;
        sink.set_light_position(self.point.position);
    }

    pub fn ambient(&self) -> f32 {
        self.ambient
    }

    pub fn point(&self) -> &PointLight {
        &self.point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<Vec3>);

    impl LightSink for Recorder {
        fn set_light_position(&mut self, position: Vec3) {
            self.0.push(position);
        }
    }

    #[test]
    fn light_sits_in_front_of_pointer() {
        let mut rig = LightRig::new(&LightConfig::default());
        let mut sink = Recorder::default();
        rig.follow(Vec3::new(3.0, -1.0, 0.0), &mut sink);
        assert_eq!(sink.0, vec![Vec3::new(3.0, -1.0, 2.0)]);
        assert_eq!(rig.point().position, Vec3::new(3.0, -1.0, 2.0));
        assert_eq!(rig.ambient(), 0.4);
        assert_eq!(rig.point().intensity, 2.0);
    }
}
