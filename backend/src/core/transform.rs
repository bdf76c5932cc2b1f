//! Transform math
//!
//! Poses are stored as position / rotation / scale triples. Rotations are Euler
//! angles in degrees applied in XYZ order (X first), i.e. `R = Rz * Ry * Rx`
//! with column vectors.
//!
//! [`Affine`] is the evaluated form (3x3 linear part + translation) used to
//! compose parent/child transforms and to compute joint orientation frames.

use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

// ============================================================================
// Vector3
// ============================================================================

/// Three-component vector
///
/// Serialized as a JSON array `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);
    pub const ONE: Vector3 = Vector3::new(1.0, 1.0, 1.0);
    pub const X: Vector3 = Vector3::new(1.0, 0.0, 0.0);
    pub const Y: Vector3 = Vector3::new(0.0, 1.0, 0.0);
    pub const Z: Vector3 = Vector3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero-length vector
    pub fn normalized(self) -> Option<Vector3> {
        let len = self.length();
        if len < EPSILON {
            None
        } else {
            Some(self.scale(1.0 / len))
        }
    }

    pub fn add(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(self, factor: f64) -> Vector3 {
        Vector3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Linear interpolation: `t = 0` gives `self`, `t = 1` gives `other`
    pub fn lerp(self, other: Vector3, t: f64) -> Vector3 {
        self.add(other.sub(self).scale(t))
    }

    /// Component-wise comparison within `tolerance`
    pub fn approx_eq(self, other: Vector3, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }

    /// Copy with the given components replaced
    pub fn with(self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Vector3 {
        Vector3::new(x.unwrap_or(self.x), y.unwrap_or(self.y), z.unwrap_or(self.z))
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(value: [f64; 3]) -> Self {
        Vector3::new(value[0], value[1], value[2])
    }
}

impl From<Vector3> for [f64; 3] {
    fn from(value: Vector3) -> Self {
        [value.x, value.y, value.z]
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Position, rotation (Euler XYZ degrees) and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector3,
    pub rotation: Vector3,
    pub scale: Vector3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vector3::ZERO,
        rotation: Vector3::ZERO,
        scale: Vector3::ONE,
    };

    pub fn new(position: Vector3, rotation: Vector3, scale: Vector3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_position(position: Vector3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Evaluate into an affine matrix (`T * R * S`)
    pub fn to_affine(&self) -> Affine {
        let rotation = Matrix3::from_euler_xyz(self.rotation);
        Affine {
            linear: rotation.mul(&Matrix3::from_scale(self.scale)),
            translation: self.position,
        }
    }

    pub fn approx_eq(&self, other: &Transform, tolerance: f64) -> bool {
        self.position.approx_eq(other.position, tolerance)
            && self.rotation.approx_eq(other.rotation, tolerance)
            && self.scale.approx_eq(other.scale, tolerance)
    }
}

// ============================================================================
// Matrix3 / Affine
// ============================================================================

/// Row-major 3x3 matrix acting on column vectors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3 {
    pub m: [[f64; 3]; 3],
}

impl Matrix3 {
    pub const IDENTITY: Matrix3 = Matrix3 {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Build from three column vectors
    pub fn from_columns(c0: Vector3, c1: Vector3, c2: Vector3) -> Self {
        Matrix3 {
            m: [[c0.x, c1.x, c2.x], [c0.y, c1.y, c2.y], [c0.z, c1.z, c2.z]],
        }
    }

    pub fn column(&self, index: usize) -> Vector3 {
        Vector3::new(self.m[0][index], self.m[1][index], self.m[2][index])
    }

    pub fn from_scale(scale: Vector3) -> Self {
        Matrix3 {
            m: [[scale.x, 0.0, 0.0], [0.0, scale.y, 0.0], [0.0, 0.0, scale.z]],
        }
    }

    /// Rotation matrix for Euler XYZ angles in degrees
    pub fn from_euler_xyz(degrees: Vector3) -> Self {
        let (sa, ca) = degrees.x.to_radians().sin_cos();
        let (sb, cb) = degrees.y.to_radians().sin_cos();
        let (sc, cc) = degrees.z.to_radians().sin_cos();
        let rx = Matrix3 {
            m: [[1.0, 0.0, 0.0], [0.0, ca, -sa], [0.0, sa, ca]],
        };
        let ry = Matrix3 {
            m: [[cb, 0.0, sb], [0.0, 1.0, 0.0], [-sb, 0.0, cb]],
        };
        let rz = Matrix3 {
            m: [[cc, -sc, 0.0], [sc, cc, 0.0], [0.0, 0.0, 1.0]],
        };
        rz.mul(&ry).mul(&rx)
    }

    /// Euler XYZ angles (degrees) of a pure rotation matrix
    pub fn to_euler_xyz(&self) -> Vector3 {
        let m = &self.m;
        let sy = (-m[2][0]).clamp(-1.0, 1.0);
        let (x, y, z) = if sy.abs() < 1.0 - 1e-12 {
            (m[2][1].atan2(m[2][2]), sy.asin(), m[1][0].atan2(m[0][0]))
        } else {
            // Gimbal lock: fold X into Z
            (0.0, sy.asin(), (-m[0][1]).atan2(m[1][1]))
        };
        Vector3::new(
            clean_angle(x.to_degrees()),
            clean_angle(y.to_degrees()),
            clean_angle(z.to_degrees()),
        )
    }

    pub fn mul(&self, other: &Matrix3) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[r][k] * other.m[k][c]).sum();
            }
        }
        Matrix3 { m: out }
    }

    pub fn mul_vec(&self, v: Vector3) -> Vector3 {
        Vector3::new(
            self.m[0][0] * v.x + self.m[0][1] * v.y + self.m[0][2] * v.z,
            self.m[1][0] * v.x + self.m[1][1] * v.y + self.m[1][2] * v.z,
            self.m[2][0] * v.x + self.m[2][1] * v.y + self.m[2][2] * v.z,
        )
    }

    pub fn transpose(&self) -> Matrix3 {
        let m = &self.m;
        Matrix3 {
            m: [
                [m[0][0], m[1][0], m[2][0]],
                [m[0][1], m[1][1], m[2][1]],
                [m[0][2], m[1][2], m[2][2]],
            ],
        }
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse, or `None` for a singular matrix (e.g. zero scale)
    pub fn inverse(&self) -> Option<Matrix3> {
        let det = self.determinant();
        if det.abs() < EPSILON {
            return None;
        }
        let m = &self.m;
        let inv_det = 1.0 / det;
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        Some(Matrix3 {
            m: [
                [
                    cof(1, 2, 1, 2) * inv_det,
                    -cof(0, 2, 1, 2) * inv_det,
                    cof(0, 1, 1, 2) * inv_det,
                ],
                [
                    -cof(1, 2, 0, 2) * inv_det,
                    cof(0, 2, 0, 2) * inv_det,
                    -cof(0, 1, 0, 2) * inv_det,
                ],
                [
                    cof(1, 2, 0, 1) * inv_det,
                    -cof(0, 2, 0, 1) * inv_det,
                    cof(0, 1, 0, 1) * inv_det,
                ],
            ],
        })
    }
}

/// Evaluated transform: `p' = linear * p + translation`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub linear: Matrix3,
    pub translation: Vector3,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        linear: Matrix3::IDENTITY,
        translation: Vector3::ZERO,
    };

    /// `self * child`: apply `child` first, then `self`
    pub fn compose(&self, child: &Affine) -> Affine {
        Affine {
            linear: self.linear.mul(&child.linear),
            translation: self.linear.mul_vec(child.translation).add(self.translation),
        }
    }

    pub fn inverse(&self) -> Option<Affine> {
        let linear = self.linear.inverse()?;
        Some(Affine {
            linear,
            translation: linear.mul_vec(self.translation).scale(-1.0),
        })
    }

    /// Decompose into position / rotation / scale, ignoring shear
    pub fn decompose(&self) -> Transform {
        let c0 = self.linear.column(0);
        let c1 = self.linear.column(1);
        let c2 = self.linear.column(2);
        let mut scale = Vector3::new(c0.length(), c1.length(), c2.length());
        if self.linear.determinant() < 0.0 {
            scale.x = -scale.x;
        }
        let axis = |c: Vector3, s: f64, fallback: Vector3| {
            if s.abs() < EPSILON {
                fallback
            } else {
                c.scale(1.0 / s)
            }
        };
        let rotation = Matrix3::from_columns(
            axis(c0, scale.x, Vector3::X),
            axis(c1, scale.y, Vector3::Y),
            axis(c2, scale.z, Vector3::Z),
        );
        Transform {
            position: clean_vector(self.translation),
            rotation: rotation.to_euler_xyz(),
            scale: clean_vector(scale),
        }
    }
}

/// Build a rotation frame that points `aim_axis` along `aim` with `up_axis` as
/// close as possible to `up`
///
/// Returns Euler XYZ degrees. If `aim` and `up` are parallel an alternate up
/// vector is chosen so the frame stays well defined. Returns `None` if the
/// local axes are parallel or `aim` has zero length.
pub fn aim_rotation(aim: Vector3, up: Vector3, aim_axis: Vector3, up_axis: Vector3) -> Option<Vector3> {
    let aim = aim.normalized()?;
    let aim_axis = aim_axis.normalized()?;
    let up_axis = up_axis.normalized()?;
    let local_side = aim_axis.cross(up_axis).normalized()?;
    let local_up = local_side.cross(aim_axis);

    let side = match aim.cross(up).normalized() {
        Some(side) => side,
        None => {
            let alternate = if aim.cross(Vector3::Z).length() > EPSILON {
                Vector3::Z
            } else {
                Vector3::X
            };
            aim.cross(alternate).normalized()?
        }
    };
    let world_up = side.cross(aim);

    let world = Matrix3::from_columns(aim, world_up, side);
    let local = Matrix3::from_columns(aim_axis, local_up, local_side);
    Some(world.mul(&local.transpose()).to_euler_xyz())
}

fn clean_angle(value: f64) -> f64 {
    let rounded = (value * 1e9).round() / 1e9;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn clean_vector(v: Vector3) -> Vector3 {
    Vector3::new(clean_angle(v.x), clean_angle(v.y), clean_angle(v.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    #[test]
    fn test_euler_round_trip() {
        let angles = Vector3::new(30.0, -45.0, 60.0);
        let back = Matrix3::from_euler_xyz(angles).to_euler_xyz();
        assert!(back.approx_eq(angles, TOL), "{:?}", back);
    }

    #[test]
    fn test_euler_gimbal_lock_still_reproduces_matrix() {
        let angles = Vector3::new(10.0, 90.0, 20.0);
        let m = Matrix3::from_euler_xyz(angles);
        let back = Matrix3::from_euler_xyz(m.to_euler_xyz());
        for r in 0..3 {
            for c in 0..3 {
                assert!((m.m[r][c] - back.m[r][c]).abs() < TOL);
            }
        }
    }

    #[test]
    fn test_compose_and_inverse() {
        let parent = Transform::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 90.0, 0.0),
            Vector3::ONE,
        )
        .to_affine();
        let child = Transform::from_position(Vector3::new(1.0, 0.0, 0.0)).to_affine();
        let world = parent.compose(&child);
        // +X rotated 90 degrees about Y points to -Z
        assert!(world.translation.approx_eq(Vector3::new(1.0, 2.0, 2.0), TOL));

        let local = parent.inverse().unwrap().compose(&world);
        assert!(local.decompose().approx_eq(&Transform::from_position(Vector3::X), TOL));
    }

    #[test]
    fn test_decompose_keeps_scale() {
        let t = Transform::new(
            Vector3::new(0.0, 5.0, 0.0),
            Vector3::new(0.0, 0.0, 45.0),
            Vector3::new(2.0, 2.0, 2.0),
        );
        assert!(t.to_affine().decompose().approx_eq(&t, TOL));
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let flat = Transform::new(Vector3::ZERO, Vector3::ZERO, Vector3::new(1.0, 0.0, 1.0));
        assert!(flat.to_affine().inverse().is_none());
    }

    #[test]
    fn test_aim_rotation_points_axis_at_target() {
        let rotation = aim_rotation(Vector3::Y, Vector3::Z, Vector3::X, Vector3::Y).unwrap();
        let m = Matrix3::from_euler_xyz(rotation);
        assert!(m.mul_vec(Vector3::X).approx_eq(Vector3::Y, TOL));
    }

    #[test]
    fn test_aim_rotation_identity_when_already_aligned() {
        let rotation = aim_rotation(Vector3::X, Vector3::Y, Vector3::X, Vector3::Y).unwrap();
        assert!(rotation.approx_eq(Vector3::ZERO, TOL));
    }

    #[test]
    fn test_aim_rotation_parallel_up_uses_fallback() {
        let rotation = aim_rotation(Vector3::Y, Vector3::Y, Vector3::X, Vector3::Y).unwrap();
        let m = Matrix3::from_euler_xyz(rotation);
        assert!(m.mul_vec(Vector3::X).approx_eq(Vector3::Y, TOL));
    }

    #[test]
    fn test_vector_serializes_as_array() {
        let json = serde_json::to_string(&Vector3::new(1.0, 2.5, -3.0)).unwrap();
        assert_eq!(json, "[1.0,2.5,-3.0]");
        let back: Vector3 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Vector3::new(1.0, 2.5, -3.0));
    }
}
