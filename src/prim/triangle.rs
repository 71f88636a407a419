use math::{RealField, Scalar, Vector3};
use std::ops::{Mul, Sub};

/// Generic triangle with three points
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle<T: Scalar>(pub Vector3<T>, pub Vector3<T>, pub Vector3<T>);

impl<T: Scalar> Triangle<T> {
    /// Build a Triangle from a triplet of indices.
    #[inline]
    pub fn from_indexed_slice<V: Into<[T; 3]> + Clone>(
        indices: &[usize; 3],
        slice: &[V],
    ) -> Triangle<T> {
        Triangle(
            slice[indices[0]].clone().into().into(),
            slice[indices[1]].clone().into().into(),
            slice[indices[2]].clone().into().into(),
        )
    }

    /// Build a new triangle from an array of vertex positions.
    #[inline]
    pub fn new([a, b, c]: [[T; 3]; 3]) -> Self {
        Triangle(a.into(), b.into(), c.into())
    }
}

impl<T> Triangle<T>
where
    T: Scalar + Copy + Mul<Output = T> + Sub<Output = T>,
{
    /// Compute the area weighted normal of this triangle. This is the standard way to compute the
    /// normal and the area of the triangle.
    ///
    /// Note the area of the triangle is half of the norm of this vector.
    #[inline]
    pub fn area_normal(&self) -> [T; 3] {
        let (a, b, c) = (&self.0, &self.1, &self.2);
        let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ]
    }
}

impl<T: RealField + Copy> Triangle<T> {
    /// Unit normal of this triangle, or `None` if the triangle is degenerate.
    #[inline]
    pub fn normal(&self) -> Option<Vector3<T>> {
        let e1 = self.1 - self.0;
        let e2 = self.2 - self.0;
        e1.cross(&e2).try_normalize(T::zero())
    }
}
