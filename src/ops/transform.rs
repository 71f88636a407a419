//!
//! Affine transformations that can be applied to native meshes, for instance to bake an object
//! offset into the vertex positions before conversion.
//!

use math::{Matrix3, Matrix4, Point3, Vector3};

pub trait Transform {
    /// Transform the object by the given affine matrix.
    ///
    /// Positions are transformed as points. Directions like normals are transformed by the
    /// inverse transpose of the linear part and renormalized.
    fn transform(&mut self, mtx: &Matrix4<f32>);
}

pub trait Transformed
where
    Self: Sized,
{
    /// Return a transformed version of `self`.
    fn transformed(self, mtx: &Matrix4<f32>) -> Self;
}

impl<S> Transformed for S
where
    S: Transform + Sized,
{
    fn transformed(mut self, mtx: &Matrix4<f32>) -> Self {
        self.transform(mtx);
        self
    }
}

/// Transform a single position by an affine matrix.
#[inline]
pub fn transform_point(mtx: &Matrix4<f32>, p: [f32; 3]) -> [f32; 3] {
    let p = mtx.transform_point(&Point3::from(p));
    [p.x, p.y, p.z]
}

/// The matrix that maps directions like normals under the affine transform `mtx`.
///
/// Falls back to the linear part itself when it is singular.
pub fn normal_matrix(mtx: &Matrix4<f32>) -> Matrix3<f32> {
    let linear: Matrix3<f32> = mtx.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}

/// Transform a direction by a normal matrix, keeping it unit length when possible.
#[inline]
pub fn transform_normal(nml_mtx: &Matrix3<f32>, n: [f32; 3]) -> [f32; 3] {
    let v = nml_mtx * Vector3::from(n);
    let v = v.try_normalize(0.0).unwrap_or(v);
    v.into()
}
