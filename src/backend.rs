//! Render backend seam.
//!
//! The scene only talks to the outside world through [`InstanceSink`],
//! [`UniformSink`] and [`LightSink`]. The windowed host implements them on
//! its GPU renderer; [`HeadlessBackend`] records everything in memory so the
//! whole scene can run without a GPU.

use glam::Vec3;

use crate::instances::{InstanceBuffer, InstanceSink, InstanceTransform};
use crate::light::LightSink;
use crate::uniforms::{UniformBlock, UniformSink, UniformValue};

/// Everything a frame tick writes to.
pub trait SceneBackend: InstanceSink + UniformSink + LightSink {}

impl<T: InstanceSink + UniformSink + LightSink + ?Sized> SceneBackend for T {}

/// In-memory backend that records every write.
#[derive(Clone, Debug)]
pub struct HeadlessBackend {
    instances: InstanceBuffer,
    uniforms: UniformBlock,
    light_position: Option<Vec3>,
    uniform_sets: u64,
    light_sets: u64,
}

impl HeadlessBackend {
    pub fn new(capacity: u32) -> Self {
        Self {
            instances: InstanceBuffer::new(capacity),
            uniforms: UniformBlock::new(),
            light_position: None,
            uniform_sets: 0,
            light_sets: 0,
        }
    }

    pub fn instances(&self) -> &InstanceBuffer {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut InstanceBuffer {
        &mut self.instances
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    /// Last position reported for the point light.
    pub fn light_position(&self) -> Option<Vec3> {
        self.light_position
    }

    /// Total writes of any kind: instance slots, uniforms and light moves.
    pub fn total_writes(&self) -> u64 {
        self.instances.writes() + self.instances.dirty_marks() + self.uniform_sets + self.light_sets
    }
}

impl InstanceSink for HeadlessBackend {
    fn write_instance(&mut self, index: u32, transform: &InstanceTransform) {
        self.instances.write_instance(index, transform);
    }

    fn mark_instances_dirty(&mut self) {
        self.instances.mark_instances_dirty();
    }
}

impl UniformSink for HeadlessBackend {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.set_uniform(name, value);
        self.uniform_sets += 1;
    }
}

impl LightSink for HeadlessBackend {
    fn set_light_position(&mut self, position: Vec3) {
        self.light_position = Some(position);
        self.light_sets += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_backend<B: SceneBackend + ?Sized>(_: &B) {}

    #[test]
    fn headless_counts_every_write() {
        let mut backend = HeadlessBackend::new(2);
        assert_backend(&backend);
        assert_eq!(backend.total_writes(), 0);

        let transform = InstanceTransform {
            position: Vec3::ONE,
            scale: 1.0,
            rotation: Vec3::ZERO,
        };
        backend.write_instance(1, &transform);
        backend.mark_instances_dirty();
        backend.set_uniform("time", UniformValue::F32(0.5));
        backend.set_light_position(Vec3::Z);

        assert_eq!(backend.total_writes(), 4);
        assert_eq!(backend.light_position(), Some(Vec3::Z));
        assert_eq!(backend.uniform("time"), Some(&UniformValue::F32(0.5)));
        assert!(backend.instances().is_dirty());
    }
}
