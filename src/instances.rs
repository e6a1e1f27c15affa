//! Per-body instance transforms and the batched instance buffer.
//!
//! [`InstanceWriter`] turns each body into an [`InstanceTransform`], writes it
//! into its fixed slot through an [`InstanceSink`], and marks the sink dirty
//! once per frame in [`flush`](InstanceWriter::flush).

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::field::ParticleField;

/// Rigid transform with uniform scale and XYZ Euler rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub scale: f32,
    /// Euler angles in radians, applied in XYZ order.
    pub rotation: Vec3,
}

impl InstanceTransform {
    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }
}

/// GPU layout of one instance: a column-major model matrix.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}

impl From<&InstanceTransform> for InstanceRaw {
    fn from(transform: &InstanceTransform) -> Self {
        Self {
            model: transform.model_matrix().to_cols_array_2d(),
        }
    }
}

/// Destination for instance transforms, typically a GPU staging buffer.
pub trait InstanceSink {
    /// Store `transform` in slot `index`.
    fn write_instance(&mut self, index: u32, transform: &InstanceTransform);

    /// Signal that instance data must be re-uploaded before the next draw.
    fn mark_instances_dirty(&mut self);
}

/// Writes body transforms into a fixed-capacity sink.
#[derive(Clone, Debug)]
pub struct InstanceWriter {
    capacity: u32,
    pending: bool,
    written_this_frame: u32,
    flushes: u64,
}

impl InstanceWriter {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            pending: false,
            written_this_frame: 0,
            flushes: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of times the sink has been marked dirty.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Write one slot.
    ///
    /// An index at or beyond capacity is a contract violation: it panics in
    /// debug builds and is dropped with an error log in release builds.
    pub fn write<S: InstanceSink + ?Sized>(&mut self, sink: &mut S, index: u32, transform: &InstanceTransform) {
        debug_assert!(
            index < self.capacity,
            "instance index {index} out of range for capacity {}",
            self.capacity
        );
        if index >= self.capacity {
            log::error!("dropping instance write {index}: capacity is {}", self.capacity);
            return;
        }
        sink.write_instance(index, transform);
        self.pending = true;
        self.written_this_frame += 1;
    }

    /// Write every body of `field` at `elapsed` seconds into slots `0..len`.
    ///
    /// Each transform is expressed in the field's floating group frame.
    pub fn write_field<S: InstanceSink + ?Sized>(&mut self, sink: &mut S, field: &ParticleField, elapsed: f32) {
        let rates = field.rotation_rates();
        let float = field.float();
        let group_rotation = float.rotation(elapsed);
        let group_offset = float.offset(elapsed);
        for (index, body) in field.bodies().iter().enumerate() {
            let local = body.rotation(elapsed, rates);
            let rotation = group_rotation * Quat::from_euler(EulerRot::XYZ, local.x, local.y, local.z);
            let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
            let transform = InstanceTransform {
                position: group_offset + group_rotation * body.current,
                scale: body.scale,
                rotation: Vec3::new(x, y, z),
            };
            self.write(sink, index as u32, &transform);
        }
    }

    /// Mark the sink dirty once for everything written since the last flush.
    ///
    /// Returns the number of slots written; `0` means nothing was marked.
    pub fn flush<S: InstanceSink + ?Sized>(&mut self, sink: &mut S) -> u32 {
        let written = self.written_this_frame;
        if self.pending {
            sink.mark_instances_dirty();
            self.flushes += 1;
        }
        self.pending = false;
        self.written_this_frame = 0;
        written
    }
}

/// CPU-side instance storage with a dirty flag.
///
/// Serves as the staging area the GPU renderer uploads from, and as a
/// recording sink for headless runs.
#[derive(Clone, Debug)]
pub struct InstanceBuffer {
    slots: Vec<InstanceRaw>,
    dirty: bool,
    writes: u64,
    dirty_marks: u64,
}

impl InstanceBuffer {
    pub fn new(capacity: u32) -> Self {
        Self {
            slots: vec![InstanceRaw::zeroed(); capacity as usize],
            dirty: false,
            writes: 0,
            dirty_marks: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn slots(&self) -> &[InstanceRaw] {
        &self.slots
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.slots)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, returning whether it was set.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Total slot writes since creation.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Total dirty marks since creation.
    pub fn dirty_marks(&self) -> u64 {
        self.dirty_marks
    }
}

impl InstanceSink for InstanceBuffer {
    fn write_instance(&mut self, index: u32, transform: &InstanceTransform) {
        if let Some(slot) = self.slots.get_mut(index as usize) {
            *slot = InstanceRaw::from(transform);
            self.writes += 1;
        }
    }

    fn mark_instances_dirty(&mut self) {
        self.dirty = true;
        self.dirty_marks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::field::{AnimatedBody, FloatMotion};
    use crate::smoothing::SmoothingMode;

    fn field(count: usize) -> ParticleField {
        let config = FieldConfig {
            count,
            seed: Some(5),
            ..FieldConfig::default()
        };
        ParticleField::new(&config, SmoothingMode::Fixed)
    }

    fn still_field(count: usize) -> ParticleField {
        let config = FieldConfig {
            count,
            seed: Some(5),
            float: FloatMotion::STILL,
            ..FieldConfig::default()
        };
        ParticleField::new(&config, SmoothingMode::Fixed)
    }

    fn translation(slot: &InstanceRaw) -> Vec3 {
        Vec3::new(slot.model[3][0], slot.model[3][1], slot.model[3][2])
    }

    #[test]
    fn instance_raw_is_a_plain_matrix() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 64);
    }

    #[test]
    fn model_matrix_places_and_scales() {
        let transform = InstanceTransform {
            position: Vec3::new(1.0, -2.0, 3.0),
            scale: 0.25,
            rotation: Vec3::ZERO,
        };
        let m = transform.model_matrix();
        assert!(m.transform_point3(Vec3::ZERO).abs_diff_eq(transform.position, 1e-6));
        assert!(m.transform_vector3(Vec3::X).abs_diff_eq(Vec3::new(0.25, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn rotation_applies_x_then_y_then_z_intrinsic() {
        let transform = InstanceTransform {
            position: Vec3::ZERO,
            scale: 1.0,
            rotation: Vec3::new(0.3, -0.7, 1.1),
        };
        let expected = Mat4::from_rotation_x(0.3) * Mat4::from_rotation_y(-0.7) * Mat4::from_rotation_z(1.1);
        assert!(transform.model_matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn one_flush_per_frame_regardless_of_body_count() {
        for count in [1usize, 40, 300] {
            let field = field(count);
            let mut writer = InstanceWriter::new(count as u32);
            let mut buffer = InstanceBuffer::new(count as u32);

            writer.write_field(&mut buffer, &field, 1.0);
            assert_eq!(buffer.dirty_marks(), 0, "no upload before flush");
            assert_eq!(writer.flush(&mut buffer), count as u32);
            assert_eq!(buffer.dirty_marks(), 1);
            assert_eq!(buffer.writes(), count as u64);

            // A second flush with nothing new written does not re-mark.
            assert_eq!(writer.flush(&mut buffer), 0);
            assert_eq!(buffer.dirty_marks(), 1);
        }
    }

    #[test]
    fn slots_follow_body_positions() {
        let field = still_field(8);
        let mut writer = InstanceWriter::new(8);
        let mut buffer = InstanceBuffer::new(8);
        writer.write_field(&mut buffer, &field, 0.0);
        writer.flush(&mut buffer);
        for (slot, body) in buffer.slots().iter().zip(field.bodies()) {
            assert!(translation(slot).abs_diff_eq(body.current, 1e-5));
        }
        assert!(buffer.take_dirty());
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn floating_group_wraps_every_body() {
        let field = field(6);
        let float = field.float();
        let rates = field.rotation_rates();
        let mut writer = InstanceWriter::new(6);
        let mut buffer = InstanceBuffer::new(6);

        for elapsed in [0.0f32, 1.7, 3.1] {
            writer.write_field(&mut buffer, &field, elapsed);
            writer.flush(&mut buffer);
            let group = Mat4::from_rotation_translation(float.rotation(elapsed), float.offset(elapsed));
            for (slot, body) in buffer.slots().iter().zip(field.bodies()) {
                let local = InstanceTransform {
                    position: body.current,
                    scale: body.scale,
                    rotation: body.rotation(elapsed, rates),
                };
                let expected = group * local.model_matrix();
                let got = Mat4::from_cols_array_2d(&slot.model);
                assert!(got.abs_diff_eq(expected, 1e-4), "t={elapsed}\n{got}\n{expected}");
            }
        }
    }

    #[test]
    fn field_bobs_by_float_amplitude() {
        // One body parked at the group origin only sees the bob.
        let body = AnimatedBody {
            home: Vec3::ZERO,
            current: Vec3::ZERO,
            phase: 0.0,
            angular_speed: 0.0,
            orbit_radius: 0.0,
            scale: 0.2,
            rotation_speed: 0.0,
        };
        let field = ParticleField::from_bodies(vec![body], &FieldConfig::default(), SmoothingMode::Fixed);
        let period = field.float().period().unwrap();
        let mut writer = InstanceWriter::new(1);
        let mut buffer = InstanceBuffer::new(1);

        let mut sample = |t: f32| {
            writer.write_field(&mut buffer, &field, t);
            translation(&buffer.slots()[0])
        };
        assert!(sample(0.0).abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!(sample(period / 4.0).abs_diff_eq(Vec3::new(0.0, 0.08, 0.0), 1e-5));
        assert!(sample(3.0 * period / 4.0).abs_diff_eq(Vec3::new(0.0, -0.08, 0.0), 1e-5));
        assert!(sample(period + 1.0).abs_diff_eq(sample(1.0), 1e-5));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "out of range"))]
    fn out_of_range_write_is_a_contract_violation() {
        let mut writer = InstanceWriter::new(2);
        let mut buffer = InstanceBuffer::new(2);
        let transform = InstanceTransform {
            position: Vec3::ZERO,
            scale: 1.0,
            rotation: Vec3::ZERO,
        };
        writer.write(&mut buffer, 2, &transform);
        // Release builds drop the write.
        assert_eq!(buffer.writes(), 0);
    }
}
