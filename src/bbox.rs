use crate::interval::{ClosedInterval, EndPoint};
use crate::ops::*;
use num_traits::Float;

/// General purpose axis aligned bounding box structure.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BBox<T> {
    interval_x: ClosedInterval<T>,
    interval_y: ClosedInterval<T>,
    interval_z: ClosedInterval<T>,
}

impl<T: Float> BBox<T> {
    /// Construct a bounding box containing points `minb` and `maxb`.
    /// # Examples
    /// ```
    /// # use scenemesh::bbox::*;
    /// let min_p = [0.0; 3];
    /// let max_p = [1.5, 0.5, 1.0];
    /// let sample_box = BBox::<f32>::new(min_p, max_p);
    ///
    /// assert_eq!(sample_box.min_corner(), min_p);
    /// assert_eq!(sample_box.max_corner(), max_p);
    /// ```
    pub fn new(minb: [T; 3], maxb: [T; 3]) -> Self {
        let mut empty_bbox = BBox::empty();
        empty_bbox.absorb(minb).absorb(maxb);
        empty_bbox
    }

    /// Construct the smallest box containing all the given points.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a [T; 3]>,
        T: 'a,
    {
        let mut bbox = BBox::empty();
        for &p in points {
            bbox.absorb(p);
        }
        bbox
    }

    pub fn min_corner(&self) -> [T; 3] {
        self.corner(EndPoint::Lower)
    }

    pub fn max_corner(&self) -> [T; 3] {
        self.corner(EndPoint::Upper)
    }

    fn corner(&self, which: EndPoint) -> [T; 3] {
        [
            self.interval_x.endpoint(which),
            self.interval_y.endpoint(which),
            self.interval_z.endpoint(which),
        ]
    }

    /// The box as a `[min, max]` pair, the layout used by scene extents.
    ///
    /// An empty box collapses to the origin.
    pub fn extent(&self) -> [[T; 3]; 2] {
        if self.is_empty() {
            [[T::zero(); 3]; 2]
        } else {
            [self.min_corner(), self.max_corner()]
        }
    }
}

impl<T: Float> Empty for BBox<T> {
    fn empty() -> Self {
        BBox {
            interval_x: ClosedInterval::empty(),
            interval_y: ClosedInterval::empty(),
            interval_z: ClosedInterval::empty(),
        }
    }
    fn is_empty(&self) -> bool {
        self.interval_x.is_empty() || self.interval_y.is_empty() || self.interval_z.is_empty()
    }
}

impl<'a, T: Float, P> Absorb<P> for &'a mut BBox<T>
where
    P: Into<[T; 3]>,
{
    type Output = &'a mut BBox<T>;

    fn absorb(self, p: P) -> Self::Output {
        let p = p.into();
        self.interval_x = self.interval_x.absorb(p[0]);
        self.interval_y = self.interval_y.absorb(p[1]);
        self.interval_z = self.interval_z.absorb(p[2]);
        self
    }
}
