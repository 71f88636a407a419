//!
//! Closed intervals on the real line. In this crate they mostly describe time ranges over which
//! some piece of native mesh data is known not to change.
//!

use crate::ops::*;
use num_traits::Float;

/// Enum for accessing the endpoints of an interval.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum EndPoint {
    Lower,
    Upper,
}

/// Interval from a to b that contains both endponts,
/// where a <= b on the floating point line.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct ClosedInterval<T> {
    /// The lower limit of the interval
    pub a: T,
    /// The upper limit of the interval
    pub b: T,
}

impl<T: PartialOrd + PartialEq + Copy> ClosedInterval<T> {
    pub fn new(a: T, b: T) -> ClosedInterval<T> {
        assert!(a <= b); // we shouldn't be creating empty intervals this way
        ClosedInterval { a, b }
    }

    /// The interval containing the single point `x`.
    pub fn instant(x: T) -> ClosedInterval<T> {
        ClosedInterval { a: x, b: x }
    }

    pub fn endpoint(&self, which: EndPoint) -> T {
        match which {
            EndPoint::Lower => self.a,
            EndPoint::Upper => self.b,
        }
    }
}

impl<T: Float> ClosedInterval<T> {
    /// The interval covering the entire real line.
    ///
    /// # Examples
    /// ```
    /// use scenemesh::interval::ClosedInterval;
    /// use scenemesh::ops::Contains;
    ///
    /// let forever = ClosedInterval::<f64>::forever();
    /// assert!(forever.contains(-1.0e12));
    /// assert!(forever.contains(1.0e12));
    /// ```
    pub fn forever() -> ClosedInterval<T> {
        ClosedInterval {
            a: T::neg_infinity(),
            b: T::infinity(),
        }
    }
}

impl<T: Float> Default for ClosedInterval<T> {
    /// Create an empty interval.
    /// The choice of enpoints here is arbitrary as long as b < a.
    fn default() -> Self {
        ClosedInterval::empty()
    }
}

impl<T: Float> Empty for ClosedInterval<T> {
    #[inline]
    fn empty() -> Self {
        ClosedInterval {
            a: T::infinity(),
            b: T::neg_infinity(),
        }
    }
    #[inline]
    fn is_empty(&self) -> bool {
        self.a > self.b
    }
}

impl<T: PartialOrd> Contains<T> for ClosedInterval<T> {
    #[inline]
    fn contains(&self, x: T) -> bool {
        self.a <= x && x <= self.b
    }
}

impl<T: Float> Absorb<T> for ClosedInterval<T> {
    type Output = Self;

    #[inline]
    fn absorb(self, x: T) -> Self {
        ClosedInterval {
            a: T::min(x, self.a),
            b: T::max(x, self.b),
        }
    }
}

impl<T: Float> Intersect<Self> for ClosedInterval<T> {
    type Output = Self;

    #[inline]
    fn intersect(self, interval: Self) -> Self {
        ClosedInterval {
            a: T::max(self.a, interval.a),
            b: T::min(self.b, interval.b),
        }
    }

    #[inline]
    fn intersects(self, interval: Self) -> bool {
        !(self.b < interval.a || self.a > interval.b)
    }
}
