//! Named uniform values and the ordered uniform block they are packed into.
//!
//! The scene pushes values by name through [`UniformSink`]. The GPU renderer
//! keeps a [`UniformBlock`] whose declaration order defines both the WGSL
//! struct (see [`UniformBlock::to_wgsl_struct`]) and the byte layout uploaded
//! each frame, so the two can never disagree.

use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Uniform names shared by the scene and the shaders.
pub mod names {
    pub const VIEW_PROJ: &str = "view_proj";
    pub const SPHERE_MODEL: &str = "sphere_model";
    pub const CLOUD_MODEL: &str = "cloud_model";
    pub const LIGHT_POSITION: &str = "light_position";
    pub const LIGHT_INTENSITY: &str = "light_intensity";
    pub const LIGHT_COLOR: &str = "light_color";
    pub const LIGHT_DISTANCE: &str = "light_distance";
    pub const BODY_COLOR: &str = "body_color";
    pub const AMBIENT: &str = "ambient";
    pub const SPHERE_COLOR: &str = "sphere_color";
    pub const TIME: &str = "time";
    pub const CLOUD_COLOR: &str = "cloud_color";
    pub const BODY_EMISSIVE: &str = "body_emissive";
    pub const POINTER: &str = "pointer";
    pub const BODY_OPACITY: &str = "body_opacity";
    pub const CLOUD_OPACITY: &str = "cloud_opacity";
}

/// Supported uniform value types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// Get the WGSL type name for this value.
    pub fn wgsl_type(&self) -> &'static str {
        match self {
            UniformValue::F32(_) => "f32",
            UniformValue::Vec2(_) => "vec2<f32>",
            UniformValue::Vec3(_) => "vec3<f32>",
            UniformValue::Vec4(_) => "vec4<f32>",
            UniformValue::Mat4(_) => "mat4x4<f32>",
        }
    }

    /// WGSL uniform address-space alignment.
    pub fn align(&self) -> usize {
        match self {
            UniformValue::F32(_) => 4,
            UniformValue::Vec2(_) => 8,
            UniformValue::Vec3(_) | UniformValue::Vec4(_) | UniformValue::Mat4(_) => 16,
        }
    }

    /// Write this value to a byte buffer, without trailing padding.
    pub fn write_bytes(&self, buf: &mut Vec<u8>) {
        match self {
            UniformValue::F32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            UniformValue::Vec2(v) => buf.extend_from_slice(bytemuck::bytes_of(v)),
            // 12 bytes; a following scalar may sit in the vec3's trailing slot.
            UniformValue::Vec3(v) => buf.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec4(v) => buf.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Mat4(m) => buf.extend_from_slice(bytemuck::cast_slice(&m.to_cols_array())),
        }
    }

    fn same_kind(&self, other: &UniformValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// Destination for named uniform updates.
pub trait UniformSink {
    fn set_uniform(&mut self, name: &str, value: UniformValue);
}

/// Ordered collection of named uniforms with a fixed GPU layout.
#[derive(Clone, Debug, Default)]
pub struct UniformBlock {
    /// Order matters for the WGSL struct layout.
    values: Vec<(String, UniformValue)>,
    indices: HashMap<String, usize>,
}

impl UniformBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new uniform to the layout, or overwrite an existing one.
    pub fn declare<V: Into<UniformValue>>(mut self, name: &str, value: V) -> Self {
        self.insert(name, value.into());
        self
    }

    fn insert(&mut self, name: &str, value: UniformValue) {
        if let Some(&idx) = self.indices.get(name) {
            self.values[idx].1 = value;
        } else {
            let idx = self.values.len();
            self.values.push((name.to_string(), value));
            self.indices.insert(name.to_string(), idx);
        }
    }

    /// Update a declared uniform.
    ///
    /// Returns `false`, leaving the layout untouched, when `name` is not
    /// declared or `value` has a different type than the declaration.
    pub fn update(&mut self, name: &str, value: UniformValue) -> bool {
        match self.indices.get(name) {
            Some(&idx) if self.values[idx].1.same_kind(&value) => {
                self.values[idx].1 = value;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.indices.get(name).map(|&idx| &self.values[idx].1)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// WGSL struct declaration matching [`to_bytes`](Self::to_bytes).
    pub fn to_wgsl_struct(&self, struct_name: &str) -> String {
        let fields = self
            .values
            .iter()
            .map(|(name, value)| format!("    {}: {},", name, value.wgsl_type()))
            .collect::<Vec<_>>()
            .join("\n");
        format!("struct {struct_name} {{\n{fields}\n}};\n")
    }

    /// Serialize all values to bytes for GPU upload, padded to 16 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.values.len() * 16);
        for (_, value) in &self.values {
            let align = value.align();
            while buf.len() % align != 0 {
                buf.push(0);
            }
            value.write_bytes(&mut buf);
        }
        while buf.len() % 16 != 0 {
            buf.push(0);
        }
        buf
    }

    pub fn byte_size(&self) -> usize {
        self.to_bytes().len()
    }

    /// Byte offset of a declared uniform within [`to_bytes`](Self::to_bytes).
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let mut offset = 0usize;
        for (n, value) in &self.values {
            let align = value.align();
            offset = offset.div_ceil(align) * align;
            if n == name {
                return Some(offset);
            }
            let mut scratch = Vec::new();
            value.write_bytes(&mut scratch);
            offset += scratch.len();
        }
        None
    }
}

impl UniformSink for UniformBlock {
    /// Record values as given, appending names not seen before.
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.insert(name, value);
    }
}
