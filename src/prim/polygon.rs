//!
//! Helpers for planar polygons given as index loops into a vertex position array.
//!

use super::Triangle;
use math::{Vector2, Vector3};

/// Compute the (unnormalized) normal of the polygon with Newell's method.
///
/// The length of the returned vector is twice the area of the planar projection of the polygon.
pub fn newell_normal(points: &[[f32; 3]], face: &[usize]) -> Vector3<f32> {
    let mut n = Vector3::zeros();
    for (i, &cur) in face.iter().enumerate() {
        let next = face[(i + 1) % face.len()];
        let a = points[cur];
        let b = points[next];
        n.x += (a[1] - b[1]) * (a[2] + b[2]);
        n.y += (a[2] - b[2]) * (a[0] + b[0]);
        n.z += (a[0] - b[0]) * (a[1] + b[1]);
    }
    n
}

fn corner_triangle(points: &[[f32; 3]], face: &[usize], i: usize) -> Triangle<f32> {
    let n = face.len();
    Triangle::new([
        points[face[(i + n - 1) % n]],
        points[face[i]],
        points[face[(i + 1) % n]],
    ])
}

/// Check that every corner of the polygon turns the same way around its normal.
///
/// Degenerate polygons (zero area) are reported convex since there is nothing to split.
pub fn is_convex(points: &[[f32; 3]], face: &[usize]) -> bool {
    if face.len() <= 3 {
        return true;
    }
    let n = newell_normal(points, face);
    if n.norm_squared() == 0.0 {
        return true;
    }
    (0..face.len()).all(|i| {
        let turn = Vector3::from(corner_triangle(points, face, i).area_normal());
        turn.dot(&n) >= -f32::EPSILON * n.norm()
    })
}

/// Check that the plane of every corner is aligned with the polygon plane.
///
/// `threshold` is the smallest accepted cosine between a corner normal and the face normal.
pub fn is_planar(points: &[[f32; 3]], face: &[usize], threshold: f32) -> bool {
    if face.len() <= 3 {
        return true;
    }
    let Some(n) = newell_normal(points, face).try_normalize(0.0) else {
        return true;
    };
    (0..face.len()).all(|i| match corner_triangle(points, face, i).normal() {
        // Reflex corners of a planar polygon point the opposite way.
        Some(corner_n) => corner_n.dot(&n).abs() >= threshold,
        None => true,
    })
}

fn project(points: &[[f32; 3]], face: &[usize], n: &Vector3<f32>) -> Vec<Vector2<f32>> {
    // Drop the dominant axis of the normal.
    let axis = n.iamax();
    let (u, v) = match axis {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    face.iter()
        .map(|&vtx| Vector2::new(points[vtx][u], points[vtx][v]))
        .collect()
}

#[inline]
fn cross2(a: &Vector2<f32>, b: &Vector2<f32>, c: &Vector2<f32>) -> f32 {
    (b - a).perp(&(c - b))
}

fn in_triangle(p: &Vector2<f32>, a: &Vector2<f32>, b: &Vector2<f32>, c: &Vector2<f32>, orient: f32) -> bool {
    cross2(a, b, p) * orient >= 0.0 && cross2(b, c, p) * orient >= 0.0 && cross2(c, a, p) * orient >= 0.0
}

/// Split a polygon into triangles by ear clipping.
///
/// The returned triangles hold positions within `face` (not vertex indices) and keep the
/// winding of the input polygon.
pub fn ear_clip(points: &[[f32; 3]], face: &[usize]) -> Vec<[usize; 3]> {
    let n = face.len();
    if n < 3 {
        return Vec::new();
    }
    if n == 3 {
        return vec![[0, 1, 2]];
    }

    let normal = newell_normal(points, face);
    let proj = project(points, face, &normal);
    let area2: f32 = (0..n).map(|i| proj[i].perp(&proj[(i + 1) % n])).sum();
    let orient = if area2 < 0.0 { -1.0 } else { 1.0 };

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut tris = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let (ia, ib, ic) = (remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]);
            let (a, b, c) = (&proj[ia], &proj[ib], &proj[ic]);
            if cross2(a, b, c) * orient <= 0.0 {
                return false;
            }
            remaining
                .iter()
                .filter(|&&j| j != ia && j != ib && j != ic)
                .all(|&j| !in_triangle(&proj[j], a, b, c, orient))
        });

        // Degenerate input has no proper ear; clip the first corner and carry on.
        let i = ear.unwrap_or(0);
        tris.push([remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]]);
        remaining.remove(i);
    }
    tris.push([remaining[0], remaining[1], remaining[2]]);
    tris
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    fn l_shape() -> Vec<[f32; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
        ]
    }

    #[test]
    fn newell_normal_of_unit_square() {
        let pts = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let n = newell_normal(&pts, &[0, 1, 2, 3]);
        assert_relative_eq!(n.z, 2.0);
        assert!(is_convex(&pts, &[0, 1, 2, 3]));
        assert!(is_planar(&pts, &[0, 1, 2, 3], 1.0 - f32::EPSILON));
    }

    #[test]
    fn concave_polygon_is_detected_and_clipped() {
        let pts = l_shape();
        let face = [0, 1, 2, 3, 4, 5];
        assert!(!is_convex(&pts, &face));
        // Reflex corners do not make a flat polygon non-planar.
        assert!(is_planar(&pts, &face, 1.0 - f32::EPSILON));

        let tris = ear_clip(&pts, &face);
        assert_eq!(tris.len(), 4);
        let area: f32 = tris
            .iter()
            .map(|t| {
                let tri = Triangle::new([pts[face[t[0]]], pts[face[t[1]]], pts[face[t[2]]]]);
                0.5 * Vector3::from(tri.area_normal()).norm()
            })
            .sum();
        assert_relative_eq!(area, 3.0, epsilon = 1e-5);
        // Winding is preserved.
        for t in &tris {
            let tri = Triangle::new([pts[face[t[0]]], pts[face[t[1]]], pts[face[t[2]]]]);
            assert!(tri.area_normal()[2] > 0.0);
        }
    }

    #[test]
    fn folded_quad_is_not_planar() {
        let pts = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.0, 1.0, 0.0]];
        assert!(!is_planar(&pts, &[0, 1, 2, 3], 1.0 - f32::EPSILON));
    }
}
