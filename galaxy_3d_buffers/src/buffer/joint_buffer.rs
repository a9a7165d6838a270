/// Joint buffer - skinning matrices bound as a constant buffer.
///
/// Capacity and offset count joints, each joint being a 3x4 row-major
/// affine matrix (48 bytes). Joint buffers are created empty and filled
/// by a discard update.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::buffer::buffer_view::{BufferKind, BufferView};
use crate::graphics_device::BufferBindFlags;

/// Size in bytes of one joint matrix
pub const JOINT_MAT_SIZE: u64 = std::mem::size_of::<JointMat>() as u64;

// ===== JOINT MATRIX =====

/// 3x4 affine joint matrix, three rows of four floats
///
/// The translation sits in the last column, the implicit fourth row is (0, 0, 0, 1).
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct JointMat {
    pub rows: [[f32; 4]; 3],
}

impl JointMat {
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    pub fn from_rows(rows: [[f32; 4]; 3]) -> Self {
        Self { rows }
    }

    /// Keep the first three rows of an affine matrix
    pub fn from_mat4(m: Mat4) -> Self {
        Self {
            rows: [m.row(0).to_array(), m.row(1).to_array(), m.row(2).to_array()],
        }
    }

    pub fn rows(&self) -> &[[f32; 4]; 3] {
        &self.rows
    }

    /// Expand back to a full 4x4 matrix
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&[
            [self.rows[0][0], self.rows[1][0], self.rows[2][0], 0.0],
            [self.rows[0][1], self.rows[1][1], self.rows[2][1], 0.0],
            [self.rows[0][2], self.rows[1][2], self.rows[2][2], 0.0],
            [self.rows[0][3], self.rows[1][3], self.rows[2][3], 1.0],
        ])
    }
}

impl Default for JointMat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ===== JOINT KIND =====

/// Marker for joint buffer views
#[derive(Debug, Clone, Copy)]
pub struct JointKind;

impl BufferKind for JointKind {
    const NAME: &'static str = "joint";
    const SOURCE: &'static str = "galaxy3d::JointBuffer";
    const BIND: BufferBindFlags = BufferBindFlags::CONSTANT;
    const ELEMENT_SIZE: u64 = JOINT_MAT_SIZE;
    const UNIT: &'static str = "joints";
    const SEED_AT_CREATION: bool = false;
    const REFERENCE_REQUIRES_UNMAPPED_SOURCE: bool = true;

    type Element = JointMat;

    fn alloc_size(count: usize) -> u64 {
        count as u64 * JOINT_MAT_SIZE
    }
}

/// Joint buffer view; capacity and offset are in joints
pub type JointBuffer = BufferView<JointKind>;

impl JointBuffer {
    /// Number of joints addressed by the view
    pub fn num_joints(&self) -> usize {
        self.capacity()
    }
}

#[cfg(test)]
#[path = "joint_buffer_tests.rs"]
mod tests;
