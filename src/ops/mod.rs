pub mod transform;

pub use transform::*;

use crate::bbox::BBox;

pub trait Empty {
    /// Construct an empty object.
    fn empty() -> Self;
    /// Check if this object is empty.
    fn is_empty(&self) -> bool;
}

pub trait Contains<RHS = Self> {
    /// Check if this object contains another.
    fn contains(&self, obj: RHS) -> bool;
}

pub trait Absorb<RHS = Self> {
    type Output;

    /// Absorb another object.
    /// For example if a = [-1, 2] and b = [3, 4] is are closed intervals,
    /// then a.absorb(b) == [-1 4].
    fn absorb(self, rhs: RHS) -> Self::Output;
}

/// Intersection trait, describes the intersection operation between two objects.
pub trait Intersect<RHS = Self> {
    type Output;

    /// Intersect on one object with another, producing the resulting intersection.
    /// For example if [-1, 2] and [0, 4] are two closed intervals, then their
    /// intersection is a closed interval [0, 2].
    fn intersect(self, rhs: RHS) -> Self::Output;

    /// Check if this object intersects another.
    fn intersects(self, rhs: RHS) -> bool;
}

pub trait BoundingBox<T> {
    /// Compute the bounding box of this object.
    fn bounding_box(&self) -> BBox<T>;
}
