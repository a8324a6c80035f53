// SPDX-License-Identifier: GPL-3.0-only

//! Row-major 4x4 projection matrix

use serde::{Deserialize, Serialize};

/// Row-major 4x4 matrix (`m[row][col]`), OpenGL clip-space conventions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matrix4([[f64; 4]; 4]);

impl Matrix4 {
    pub const IDENTITY: Matrix4 = Matrix4([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self(rows)
    }

    /// Off-axis perspective projection for the volume `[l, r] x [b, t] x [near, far]`
    ///
    /// Same layout as `glFrustum`: camera looks down -Z, clip z in [-1, 1].
    pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        let rl = right - left;
        let tb = top - bottom;
        let fnr = far - near;

        Self([
            [2.0 * near / rl, 0.0, (right + left) / rl, 0.0],
            [0.0, 2.0 * near / tb, (top + bottom) / tb, 0.0],
            [0.0, 0.0, -(far + near) / fnr, -2.0 * far * near / fnr],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[row][col]
    }

    pub fn rows(&self) -> &[[f64; 4]; 4] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|v| v.is_finite())
    }

    /// Row-major f32 array
    pub fn to_row_major_f32(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for (i, v) in self.0.iter().flatten().enumerate() {
            out[i] = *v as f32;
        }
        out
    }

    /// Column-major f32 array, the layout WGSL/GLSL `mat4x4` uniforms expect
    pub fn to_column_major_f32(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = self.0[row][col] as f32;
            }
        }
        out
    }

    /// Transform a homogeneous point
    pub fn transform(&self, v: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (row, o) in self.0.iter().zip(out.iter_mut()) {
            *o = row.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
        }
        out
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frustum_maps_near_corners_to_ndc() {
        let (l, r, b, t, n, f) = (-0.02, 0.01, -0.005, 0.015, 0.01, 100.0);
        let m = Matrix4::frustum(l, r, b, t, n, f);

        // Bottom-left corner on the near plane lands on (-1, -1, -1)
        let clip = m.transform([l, b, -n, 1.0]);
        let ndc = [clip[0] / clip[3], clip[1] / clip[3], clip[2] / clip[3]];
        assert!((ndc[0] + 1.0).abs() < 1e-9);
        assert!((ndc[1] + 1.0).abs() < 1e-9);
        assert!((ndc[2] + 1.0).abs() < 1e-9);

        // Top-right corner on the far plane lands on (1, 1, 1)
        let s = f / n;
        let clip = m.transform([r * s, t * s, -f, 1.0]);
        let ndc = [clip[0] / clip[3], clip[1] / clip[3], clip[2] / clip[3]];
        assert!((ndc[0] - 1.0).abs() < 1e-9);
        assert!((ndc[1] - 1.0).abs() < 1e-9);
        assert!((ndc[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_column_major_layout() {
        let m = Matrix4::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let cm = m.to_column_major_f32();
        // m32 = -1 sits in column 2, row 3
        assert_eq!(cm[2 * 4 + 3], -1.0);
        assert_eq!(m.to_row_major_f32()[3 * 4 + 2], -1.0);
    }
}
