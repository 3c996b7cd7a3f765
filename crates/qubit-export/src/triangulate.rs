//! Ear-clipping triangulation of simple layout polygons
//!
//! Only the polygon's own vertices are used: every triangle corner is an
//! input vertex, and a polygon with V vertices always yields V - 2 triangles.
//! Triangles come out counter-clockwise as (previous, tip, next) whatever
//! the input winding.

use crate::error::{ExportError, Result};
use crate::geometry::{orientation, Polygon, Vertex};

/// One triangle patch cut from a polygon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self { vertices: [a, b, c] }
    }

    pub fn signed_area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        orientation(a, b, c) / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }
}

/// Split a simple polygon into triangles covering exactly its interior
pub fn triangulate(polygon: &Polygon) -> Result<Vec<Triangle>> {
    let points = polygon.vertices();
    if points.len() < 3 {
        return Err(ExportError::invalid_polygon(format!(
            "triangulation needs at least 3 vertices, got {}",
            points.len()
        )));
    }
    if !polygon.is_finite() {
        return Err(ExportError::invalid_polygon("non-finite coordinate"));
    }
    if let Some((a, b)) = polygon.self_intersection() {
        return Err(ExportError::invalid_polygon(format!(
            "edges {} and {} cross each other",
            a, b
        )));
    }

    // Work on vertex indices, walked counter-clockwise
    let mut ring: Vec<usize> = (0..points.len()).collect();
    if polygon.signed_area() < 0.0 {
        ring.reverse();
    }

    let mut triangles = Vec::with_capacity(points.len() - 2);
    while ring.len() > 3 {
        let clip = match (0..ring.len()).find(|&i| is_ear(points, &ring, i)) {
            Some(i) => i,
            None => {
                let i = (0..ring.len())
                    .find(|&i| turn(points, &ring, i) == Turn::Straight)
                    .ok_or_else(|| ExportError::invalid_polygon("no ear left to clip"))?;
                tracing::warn!(
                    "Clipping collinear vertex {} as a zero-area triangle",
                    ring[i]
                );
                i
            }
        };

        let (prev, tip, next) = corners(&ring, clip);
        triangles.push(Triangle::new(points[prev], points[tip], points[next]));
        ring.remove(clip);
    }
    triangles.push(Triangle::new(
        points[ring[0]],
        points[ring[1]],
        points[ring[2]],
    ));

    Ok(triangles)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Left,
    Straight,
    Right,
}

fn corners(ring: &[usize], i: usize) -> (usize, usize, usize) {
    let m = ring.len();
    (ring[(i + m - 1) % m], ring[i], ring[(i + 1) % m])
}

fn turn(points: &[Vertex], ring: &[usize], i: usize) -> Turn {
    let (prev, tip, next) = corners(ring, i);
    let (a, b, c) = (points[prev], points[tip], points[next]);
    let cross = orientation(a, b, c);
    let tolerance = 1e-12 * (b - a).norm() * (c - b).norm();

    if cross > tolerance {
        Turn::Left
    } else if cross < -tolerance {
        Turn::Right
    } else {
        Turn::Straight
    }
}

/// Convex corner whose triangle holds no other remaining vertex.
///
/// Vertices sitting exactly on a corner are skipped so the bridge vertices
/// of keyhole polygons do not block their own ears.
fn is_ear(points: &[Vertex], ring: &[usize], i: usize) -> bool {
    if turn(points, ring, i) != Turn::Left {
        return false;
    }

    let (prev, tip, next) = corners(ring, i);
    let (a, b, c) = (points[prev], points[tip], points[next]);

    !ring
        .iter()
        .filter(|&&j| j != prev && j != tip && j != next)
        .map(|&j| points[j])
        .filter(|p| *p != a && *p != b && *p != c)
        .any(|p| {
            orientation(a, b, p) >= 0.0 && orientation(b, c, p) >= 0.0 && orientation(c, a, p) >= 0.0
        })
}
