//! Affine matrix construction and composition
//!
//! Matrices are glam `Mat4` values. glam stores columns, so the translation of
//! a 2D transform sits in storage elements 12 and 13: the same bytes that a
//! row-vector API (D3D9) reads as `_41`/`_42`. One matrix therefore uploads
//! unchanged to either backend.
//!
//! Points are transformed as column vectors (`m * p`). Every matrix built
//! here keeps the perspective row at `(0, 0, 0, 1)`.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// 4x4 affine transform in homogeneous coordinates.
pub type Matrix = Mat4;

/// Build a combined scale + translate transform
///
/// Scale sits on the diagonal and the translation in the last storage row, so
/// the scale applies before the translation.
pub fn build_transform(tx: f32, ty: f32, sx: f32, sy: f32) -> Matrix {
    Mat4::from_cols(
        Vec4::new(sx, 0.0, 0.0, 0.0),
        Vec4::new(0.0, sy, 0.0, 0.0),
        Vec4::Z,
        Vec4::new(tx, ty, 0.0, 1.0),
    )
}

pub fn identity() -> Matrix {
    Mat4::IDENTITY
}

/// Rotation about the z axis, `[cos, -sin; sin, cos]` in the upper-left block
pub fn build_rotation(radians: f32) -> Matrix {
    let (sin, cos) = radians.sin_cos();
    Mat4::from_cols(
        Vec4::new(cos, sin, 0.0, 0.0),
        Vec4::new(-sin, cos, 0.0, 0.0),
        Vec4::Z,
        Vec4::W,
    )
}

/// Compose two transforms: `result[i][j] = Σk a[k][j] * b[i][k]`
///
/// Indices are `[row][column]`. The result applies `a` to a point first and
/// `b` second. Both operands are taken by value, so the result may be written
/// back over either of them.
pub fn multiply(a: Matrix, b: Matrix) -> Matrix {
    b * a
}

/// Transform a 2D point (z = 0, w = 1).
pub fn transform_point(m: &Matrix, x: f32, y: f32) -> Vec2 {
    m.transform_point3(Vec3::new(x, y, 0.0)).truncate()
}

/// Storage order expected by both GPU backends.
pub fn to_device_array(m: &Matrix) -> [f32; 16] {
    m.to_cols_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-5;

    fn approx_eq(a: &Matrix, b: &Matrix) -> bool {
        a.abs_diff_eq(*b, EPS)
    }

    fn sample() -> Matrix {
        multiply(build_rotation(0.7), build_transform(12.0, -3.5, 2.0, 0.5))
    }

    #[test]
    fn test_build_transform_maps_origin_and_unit_x() {
        for &(tx, ty, s) in &[(0.0, 0.0, 1.0), (10.0, 20.0, 2.0), (-4.0, 7.5, 0.25)] {
            let m = build_transform(tx, ty, s, s);
            assert_eq!(transform_point(&m, 0.0, 0.0), Vec2::new(tx, ty));
            assert_eq!(transform_point(&m, 1.0, 0.0), Vec2::new(tx + s, ty));
        }
    }

    #[test]
    fn test_translation_in_last_storage_row() {
        let raw = to_device_array(&build_transform(30.0, 40.0, 2.0, 3.0));
        assert_eq!(raw[0], 2.0);
        assert_eq!(raw[5], 3.0);
        assert_eq!(raw[12], 30.0);
        assert_eq!(raw[13], 40.0);
        assert_eq!(raw[15], 1.0);
    }

    #[test]
    fn test_identity_is_neutral() {
        let m = sample();
        assert_eq!(multiply(identity(), m), m);
        assert_eq!(multiply(m, identity()), m);
    }

    #[test]
    fn test_rotation_zero_is_identity() {
        assert!(approx_eq(&build_rotation(0.0), &identity()));
    }

    #[test]
    fn test_rotation_inverse() {
        for &theta in &[0.3, 1.0, PI, -2.5] {
            let m = multiply(build_rotation(theta), build_rotation(-theta));
            assert!(approx_eq(&m, &identity()), "theta = {}", theta);
        }
    }

    #[test]
    fn test_rotation_counter_clockwise() {
        let p = transform_point(&build_rotation(FRAC_PI_2), 10.0, 0.0);
        assert!(p.abs_diff_eq(Vec2::new(0.0, 10.0), 1e-4));
    }

    #[test]
    fn test_multiply_index_convention() {
        let a = sample();
        let b = multiply(build_transform(5.0, 6.0, 3.0, 3.0), build_rotation(-0.4));
        let r = multiply(a, b);

        for i in 0..4 {
            for j in 0..4 {
                let expected: f32 = (0..4).map(|k| a.row(k)[j] * b.row(i)[k]).sum();
                assert!((r.row(i)[j] - expected).abs() < EPS, "[{}][{}]", i, j);
            }
        }
    }

    #[test]
    fn test_multiply_applies_first_operand_first() {
        // Translate, then rotate a quarter turn about the origin.
        let m = multiply(build_transform(10.0, 0.0, 1.0, 1.0), build_rotation(FRAC_PI_2));
        let p = transform_point(&m, 0.0, 0.0);
        assert!(p.abs_diff_eq(Vec2::new(0.0, 10.0), 1e-4));
    }

    #[test]
    fn test_perspective_row_fixed() {
        let m = multiply(sample(), build_rotation(1.3));
        assert_eq!(m.row(3), Vec4::W);
    }
}
