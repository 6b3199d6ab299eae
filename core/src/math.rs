//! Math type aliases and helper functions.
//!
//! All rendering math is `f32`. Parameter blocks store plain arrays, so the
//! helpers here convert between `nalgebra` vectors and `[f32; N]`.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Extract the translation column of an affine 4x4 matrix.
pub fn mat4_translation(m: &Mat4) -> Vec3 {
    Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// Convert a 2D vector to a `[x, y]` array.
pub fn vec2_to_array(v: Vec2) -> [f32; 2] {
    [v.x, v.y]
}

/// Convert a 3D vector to a `[x, y, z]` array.
pub fn vec3_to_array(v: Vec3) -> [f32; 3] {
    [v.x, v.y, v.z]
}

/// Convert a 4D vector to a `[x, y, z, w]` array.
pub fn vec4_to_array(v: Vec4) -> [f32; 4] {
    [v.x, v.y, v.z, v.w]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_round_trip() {
        let m = mat4_from_translation(Vec3::new(1.0, -2.0, 3.5));
        assert_eq!(mat4_translation(&m), Vec3::new(1.0, -2.0, 3.5));
    }

    #[test]
    fn test_identity_has_no_translation() {
        assert_eq!(mat4_translation(&Mat4::identity()), Vec3::zeros());
    }

    #[test]
    fn test_array_conversions() {
        assert_eq!(vec2_to_array(Vec2::new(0.25, 0.5)), [0.25, 0.5]);
        assert_eq!(vec3_to_array(Vec3::new(1.0, 2.0, 3.0)), [1.0, 2.0, 3.0]);
        assert_eq!(
            vec4_to_array(Vec4::new(1.0, 2.0, 3.0, 4.0)),
            [1.0, 2.0, 3.0, 4.0]
        );
    }
}
