//! Polygon types handed over by the layout layer, and conductor grouping

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::LengthUnit;

/// A single layout vertex (x, y) in layout units
pub type Vertex = Point2<f64>;

/// Simple 2-D polygon, implicitly closed (last vertex connects to the first)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<[f64; 2]>", into = "Vec<[f64; 2]>")]
pub struct Polygon {
    vertices: Vec<Vertex>,
}

impl From<Vec<[f64; 2]>> for Polygon {
    fn from(coords: Vec<[f64; 2]>) -> Self {
        Self::new(coords.into_iter().map(|[x, y]| Vertex::new(x, y)).collect())
    }
}

impl From<Polygon> for Vec<[f64; 2]> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices.iter().map(|v| [v.x, v.y]).collect()
    }
}

impl Polygon {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// Build from plain coordinate pairs
    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Vertex::new(x, y)).collect())
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.vertices.iter().all(|v| v.x.is_finite() && v.y.is_finite())
    }

    /// Shoelace area, positive for counter-clockwise winding
    pub fn signed_area(&self) -> f64 {
        self.edges()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f64>()
            / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Boundary edges in order, including the closing edge back to the first vertex
    pub fn edges(&self) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Uniformly scale every coordinate about the origin
    pub fn scaled(&self, factor: f64) -> Polygon {
        Polygon::new(
            self.vertices
                .iter()
                .map(|v| Vertex::new(v.x * factor, v.y * factor))
                .collect(),
        )
    }

    /// First pair of non-adjacent edges that properly cross each other.
    ///
    /// Touching or collinear-overlapping edges are not reported, so keyhole
    /// polygons (holes joined to the outline by a zero-width bridge) pass.
    pub fn self_intersection(&self) -> Option<(usize, usize)> {
        let n = self.vertices.len();
        if n < 4 {
            return None;
        }
        let edge = |i: usize| (self.vertices[i], self.vertices[(i + 1) % n]);

        for i in 0..n {
            let (a, b) = edge(i);
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (c, d) = edge(j);
                if segments_cross(a, b, c, d) {
                    return Some((i, j));
                }
            }
        }
        None
    }
}

/// Twice the signed area of triangle (a, b, c); positive when counter-clockwise
pub(crate) fn orientation(a: Vertex, b: Vertex, c: Vertex) -> f64 {
    (b - a).perp(&(c - a))
}

fn segments_cross(a: Vertex, b: Vertex, c: Vertex, d: Vertex) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);
    o1 * o2 < 0.0 && o3 * o4 < 0.0
}

/// Label given to the polygon at `index` when the caller supplies no name
pub fn default_label(index: usize) -> String {
    format!("Polygon{}", index + 1)
}

/// Relative permittivity assumed when none is given (vacuum / air)
pub const DEFAULT_PERMITTIVITY: f64 = 1.0;

/// One solver entity: every polygon sharing a label
#[derive(Debug, Clone, PartialEq)]
pub struct Conductor<'a> {
    pub name: String,
    pub permittivity: f64,
    pub polygons: Vec<&'a Polygon>,
}

/// Resolve one label per polygon, defaulting to `Polygon{n}`
pub fn resolve_labels(polygons: &[Polygon], names: Option<&[String]>) -> Result<Vec<String>> {
    match names {
        Some(names) => {
            check_len("names", polygons.len(), names.len())?;
            Ok(names.to_vec())
        }
        None => Ok((0..polygons.len()).map(default_label).collect()),
    }
}

/// Group polygons into conductors by label, in order of first appearance
pub fn group_conductors<'a>(
    polygons: &'a [Polygon],
    names: Option<&[String]>,
    permittivities: Option<&[f64]>,
) -> Result<Vec<Conductor<'a>>> {
    let labels = resolve_labels(polygons, names)?;
    if let Some(eps) = permittivities {
        check_len("permittivities", polygons.len(), eps.len())?;
    }

    let mut conductors: Vec<Conductor<'a>> = Vec::new();
    for (index, (polygon, label)) in polygons.iter().zip(labels).enumerate() {
        let permittivity = permittivities
            .map(|eps| eps[index])
            .unwrap_or(DEFAULT_PERMITTIVITY);

        match conductors.iter_mut().find(|c| c.name == label) {
            Some(existing) => {
                if existing.permittivity != permittivity {
                    tracing::warn!(
                        "Conductor {} already has permittivity {}, ignoring {} from polygon {}",
                        label,
                        existing.permittivity,
                        permittivity,
                        index
                    );
                }
                existing.polygons.push(polygon);
            }
            None => conductors.push(Conductor {
                name: label,
                permittivity,
                polygons: vec![polygon],
            }),
        }
    }

    Ok(conductors)
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(ExportError::LengthMismatch {
            what,
            expected,
            found,
        })
    }
}

/// Flat polygon list as produced by the layout layer (JSON input of the CLI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonScene {
    /// Length unit of every coordinate in the scene
    #[serde(default)]
    pub unit: LengthUnit,
    pub polygons: Vec<SceneEntry>,
}

/// One polygon of a scene, with its optional conductor label and permittivity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permittivity: Option<f64>,
    pub vertices: Polygon,
}

impl PolygonScene {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn polygons(&self) -> Vec<Polygon> {
        self.polygons.iter().map(|e| e.vertices.clone()).collect()
    }

    /// Labels for every entry, or `None` when no entry is named
    pub fn names(&self) -> Option<Vec<String>> {
        if self.polygons.iter().all(|e| e.name.is_none()) {
            return None;
        }
        Some(
            self.polygons
                .iter()
                .enumerate()
                .map(|(i, e)| e.name.clone().unwrap_or_else(|| default_label(i)))
                .collect(),
        )
    }

    /// Permittivities for every entry, or `None` when no entry sets one
    pub fn permittivities(&self, fallback: f64) -> Option<Vec<f64>> {
        if self.polygons.iter().all(|e| e.permittivity.is_none()) {
            return None;
        }
        Some(
            self.polygons
                .iter()
                .map(|e| e.permittivity.unwrap_or(fallback))
                .collect(),
        )
    }

    /// Convert every coordinate to `target` units
    pub fn rescaled(&self, target: LengthUnit) -> PolygonScene {
        let factor = self.unit.scale_to(&target);
        PolygonScene {
            unit: target,
            polygons: self
                .polygons
                .iter()
                .map(|e| SceneEntry {
                    vertices: e.vertices.scaled(factor),
                    ..e.clone()
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::from_coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
    }

    #[test]
    fn test_signed_area_follows_winding() {
        let ccw = unit_square();
        assert!((ccw.signed_area() - 1.0).abs() < 1e-12);
        assert!(ccw.is_counter_clockwise());

        let cw = Polygon::from_coords(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        assert!((cw.signed_area() + 1.0).abs() < 1e-12);
        assert!((cw.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_edges_close_the_ring() {
        let edges: Vec<_> = unit_square().edges().collect();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[3], (Vertex::new(0.0, 1.0), Vertex::new(0.0, 0.0)));
    }

    #[test]
    fn test_bowtie_is_self_intersecting() {
        let bowtie = Polygon::from_coords(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)]);
        assert_eq!(bowtie.self_intersection(), Some((0, 2)));
        assert_eq!(unit_square().self_intersection(), None);
    }

    #[test]
    fn test_keyhole_is_not_self_intersecting() {
        // 4x4 square with a 2x2 hole joined along y = 1
        let keyhole = Polygon::from_coords(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (3.0, 3.0),
            (3.0, 1.0),
            (1.0, 1.0),
            (0.0, 1.0),
        ]);
        assert_eq!(keyhole.self_intersection(), None);
        assert!((keyhole.area() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_json_is_coordinate_pairs() {
        let polygon: Polygon = serde_json::from_str("[[0, 0], [2.5, 0], [2.5, 1]]").unwrap();
        assert_eq!(polygon.len(), 3);
        assert_eq!(polygon.vertices()[1], Vertex::new(2.5, 0.0));
        assert_eq!(
            serde_json::to_string(&polygon).unwrap(),
            "[[0.0,0.0],[2.5,0.0],[2.5,1.0]]"
        );
    }

    #[test]
    fn test_default_labels_are_one_based() {
        let polygons = vec![unit_square(), unit_square(), unit_square()];
        let conductors = group_conductors(&polygons, None, None).unwrap();
        let names: Vec<_> = conductors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Polygon1", "Polygon2", "Polygon3"]);
        assert!(conductors.iter().all(|c| c.permittivity == 1.0));
    }

    #[test]
    fn test_shared_label_groups_polygons() {
        let polygons = vec![unit_square(), unit_square().scaled(2.0), unit_square()];
        let names = vec!["ground".to_string(), "island".to_string(), "ground".to_string()];
        let conductors = group_conductors(&polygons, Some(names.as_slice()), Some(&[11.7, 1.0, 4.0][..])).unwrap();

        assert_eq!(conductors.len(), 2);
        assert_eq!(conductors[0].name, "ground");
        assert_eq!(conductors[0].polygons.len(), 2);
        assert_eq!(conductors[0].permittivity, 11.7);
        assert_eq!(conductors[1].name, "island");
    }

    #[test]
    fn test_repeated_calls_do_not_accumulate_labels() {
        let polygons = vec![unit_square()];
        for _ in 0..3 {
            assert_eq!(resolve_labels(&polygons, None).unwrap(), ["Polygon1"]);
        }
    }

    #[test]
    fn test_mismatched_names_are_rejected() {
        let polygons = vec![unit_square(), unit_square()];
        let names = vec!["only".to_string()];
        let err = group_conductors(&polygons, Some(names.as_slice()), None).unwrap_err();
        assert!(matches!(
            err,
            ExportError::LengthMismatch {
                what: "names",
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_parse_scene() {
        let json = r#"{
            "unit": "nm",
            "polygons": [
                {"name": "pad", "permittivity": 6.2, "vertices": [[0, 0], [1000, 0], [1000, 2000]]},
                {"vertices": [[0, 0], [500, 0], [500, 500], [0, 500]]}
            ]
        }"#;

        let scene = PolygonScene::from_json(json).unwrap();
        assert_eq!(scene.unit, LengthUnit::Nanometer);
        assert_eq!(scene.names().unwrap(), ["pad", "Polygon2"]);
        assert_eq!(scene.permittivities(1.0).unwrap(), [6.2, 1.0]);

        let um = scene.rescaled(LengthUnit::Micrometer);
        assert_eq!(um.unit, LengthUnit::Micrometer);
        assert!((um.polygons[0].vertices.vertices()[2].y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unnamed_scene_has_no_names() {
        let scene = PolygonScene::from_json(r#"{"polygons": [{"vertices": [[0, 0], [1, 0], [0, 1]]}]}"#).unwrap();
        assert_eq!(scene.unit, LengthUnit::Micrometer);
        assert!(scene.names().is_none());
        assert!(scene.permittivities(1.0).is_none());
    }
}
