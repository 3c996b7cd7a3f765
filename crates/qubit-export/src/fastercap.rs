//! FasterCap capacitance decks
//!
//! Two flavours share one naming convention (`{base}_FasterCap_{n}.txt`):
//! - 3-D: each conductor is a set of flat triangle patches at one elevation
//! - 2-D: each conductor outline is a chain of segments in its own `File`
//!   block, referenced from the header together with its permittivity
//!
//! Polygons sharing a name form one conductor.

use minijinja::context;
use serde::Serialize;

use crate::allocate::{Allocation, FileAllocator};
use crate::deck::{fixed4, natural, rounded4, Deck, DeckFormat};
use crate::error::{ExportError, Result};
use crate::geometry::{group_conductors, Polygon, Vertex};
use crate::triangulate::triangulate;
use crate::CapacitanceConfig;

const FASTERCAP_3D_TEMPLATE: &str = "\
*0 {{ stem }}\n\
*Fast(er)Cap input file to calculate capacitance of polygon\n\
\n\
{% for conductor in conductors %}\n\
\n\
*G {{ conductor.name }}\t|3D coordinates of the three vertices of the triangle T patch\n\
\n\
{% for patch in conductor.patches %}\n\
T {{ conductor.name }}\t{{ patch }}\n\
{% endfor %}\n\
{% endfor %}";

const FASTERCAP_2D_TEMPLATE: &str = "\
* 2D {{ stem }}\n\
* Fast(er)Cap 2D input file to calculate capacitance between polygons\n\
\n\
{% for conductor in conductors %}\n\
C {{ conductor.name }}\t{{ conductor.permittivity }}\t0.0\t0.0\n\
{% endfor %}\n\
\n\
End\n\
\n\
***Start of the geometry files\n\
{% for conductor in conductors %}\n\
File {{ conductor.name }}\n\
\n\
*G {{ conductor.name }}\t|2D coordinates of the two points of the S segment\n\
\n\
{% for segment in conductor.segments %}\n\
S {{ conductor.name }}\t{{ segment }}\n\
{% endfor %}\n\
End\n\
{% endfor %}";

#[derive(Debug, Serialize)]
struct PatchGroup {
    name: String,
    patches: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SegmentGroup {
    name: String,
    permittivity: String,
    segments: Vec<String>,
}

fn patch_vertex(v: Vertex, elevation: &str) -> String {
    format!("{}\t{}\t{}", fixed4(v.x), rounded4(v.y), elevation)
}

fn segment_line(from: Vertex, to: Vertex) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        fixed4(from.x),
        fixed4(from.y),
        fixed4(to.x),
        fixed4(to.y)
    )
}

/// Render a 3-D FasterCap deck, triangulating every polygon
pub fn render_fastercap_3d(
    stem: &str,
    polygons: &[Polygon],
    names: Option<&[String]>,
    config: &CapacitanceConfig,
) -> Result<Deck> {
    let elevation = natural(config.elevation);
    let mut groups = Vec::new();

    for conductor in group_conductors(polygons, names, None)? {
        let mut patches = Vec::new();
        for polygon in &conductor.polygons {
            for triangle in triangulate(polygon)? {
                let corners: Vec<String> = triangle
                    .vertices
                    .iter()
                    .map(|&v| patch_vertex(v, &elevation))
                    .collect();
                patches.push(corners.join("\t"));
            }
        }
        groups.push(PatchGroup {
            name: conductor.name,
            patches,
        });
    }

    Deck::render(
        DeckFormat::FasterCap3d,
        FASTERCAP_3D_TEMPLATE,
        context! {
            stem => stem,
            conductors => groups,
        },
    )
}

/// Render a 2-D FasterCap deck; outlines are emitted as closed segment chains
pub fn render_fastercap_2d(
    stem: &str,
    polygons: &[Polygon],
    names: Option<&[String]>,
    permittivities: Option<&[f64]>,
) -> Result<Deck> {
    let mut groups = Vec::new();

    for conductor in group_conductors(polygons, names, permittivities)? {
        let mut segments = Vec::new();
        for polygon in &conductor.polygons {
            if polygon.is_empty() || !polygon.is_finite() {
                return Err(ExportError::invalid_polygon(format!(
                    "{} needs at least one finite vertex",
                    conductor.name
                )));
            }
            segments.extend(polygon.edges().map(|(a, b)| segment_line(a, b)));
        }
        groups.push(SegmentGroup {
            name: conductor.name,
            permittivity: natural(conductor.permittivity),
            segments,
        });
    }

    Deck::render(
        DeckFormat::FasterCap2d,
        FASTERCAP_2D_TEMPLATE,
        context! {
            stem => stem,
            conductors => groups,
        },
    )
}

/// Write a 3-D FasterCap deck to the first free `{base}_FasterCap_{n}.txt`
pub fn write_fastercap_3d(
    base: &str,
    polygons: &[Polygon],
    names: Option<&[String]>,
    config: &CapacitanceConfig,
) -> Result<Allocation> {
    let allocator = FileAllocator::new(base, DeckFormat::FasterCap3d.name_pattern())?;
    allocator.write_new(|stem| {
        render_fastercap_3d(stem, polygons, names, config).map(Deck::into_string)
    })
}

/// Write a 2-D FasterCap deck to the first free `{base}_FasterCap_{n}.txt`
pub fn write_fastercap_2d(
    base: &str,
    polygons: &[Polygon],
    names: Option<&[String]>,
    permittivities: Option<&[f64]>,
) -> Result<Allocation> {
    let allocator = FileAllocator::new(base, DeckFormat::FasterCap2d.name_pattern())?;
    allocator.write_new(|stem| {
        render_fastercap_2d(stem, polygons, names, permittivities).map(Deck::into_string)
    })
}
