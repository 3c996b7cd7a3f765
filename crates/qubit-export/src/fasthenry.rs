//! FastHenry inductance decks
//!
//! Every polygon outline becomes a closed chain of nodes joined by segments
//! ("elongations"). Node `nQB_{P}_{i}` is vertex `i` of polygon `P`; the
//! chain is closed by an extra node `nQB_{P}_{N}` placed on the first vertex,
//! so element `eQB_{P}_{i}` always runs from node `i` to node `i + 1` of the
//! same polygon.

use minijinja::context;
use serde::Serialize;

use crate::allocate::{Allocation, FileAllocator};
use crate::deck::{natural, Deck, DeckFormat};
use crate::error::{ExportError, Result};
use crate::geometry::{resolve_labels, Polygon};
use crate::InductanceConfig;

const FASTHENRY_TEMPLATE: &str = "\
**New Element - {{ stem }}:\n\
\n\
* Default units\n\
.units {{ units }}\n\
* Default height, width and discretization\n\
.default nwinc={{ nwinc }} nhinc={{ nhinc }} h={{ height }} w={{ width }}\n\
{% for polygon in polygons %}\n\
\n\
*{{ polygon.label }} Nodes:\n\
{% for node in polygon.nodes %}\n\
{{ node.id }} {{ node.x }} {{ node.y }}\n\
{% endfor %}\n\
*{{ polygon.label }} Elongations:\n\
{% for element in polygon.elements %}\n\
{{ element.id }} {{ element.from }} {{ element.to }}\n\
{% endfor %}\n\
{% endfor %}\n\
\n\
.End\n";

#[derive(Debug, Serialize)]
struct NodeChain {
    label: String,
    nodes: Vec<NodeLine>,
    elements: Vec<ElementLine>,
}

#[derive(Debug, Serialize)]
struct NodeLine {
    id: String,
    x: String,
    y: String,
}

#[derive(Debug, Serialize)]
struct ElementLine {
    id: String,
    from: String,
    to: String,
}

fn node_id(polygon: usize, vertex: usize) -> String {
    format!("nQB_{}_{}", polygon, vertex)
}

fn element_id(polygon: usize, vertex: usize) -> String {
    format!("eQB_{}_{}", polygon, vertex)
}

fn node_chain(index: usize, label: String, polygon: &Polygon) -> Result<NodeChain> {
    let vertices = polygon.vertices();
    let first = vertices.first().ok_or_else(|| {
        ExportError::invalid_polygon(format!("{} has no vertices", label))
    })?;
    if !polygon.is_finite() {
        return Err(ExportError::invalid_polygon(format!(
            "{} has a non-finite coordinate",
            label
        )));
    }

    let mut nodes: Vec<NodeLine> = vertices
        .iter()
        .enumerate()
        .map(|(i, v)| NodeLine {
            id: node_id(index, i),
            x: natural(v.x),
            y: natural(v.y),
        })
        .collect();
    nodes.push(NodeLine {
        id: node_id(index, vertices.len()),
        x: natural(first.x),
        y: natural(first.y),
    });

    let elements = (0..vertices.len())
        .map(|i| ElementLine {
            id: element_id(index, i),
            from: node_id(index, i),
            to: node_id(index, i + 1),
        })
        .collect();

    Ok(NodeChain {
        label,
        nodes,
        elements,
    })
}

/// Render a FastHenry deck whose header names `stem`
pub fn render_fasthenry(
    stem: &str,
    polygons: &[Polygon],
    names: Option<&[String]>,
    config: &InductanceConfig,
) -> Result<Deck> {
    let units = config.units.fasthenry_keyword().ok_or_else(|| {
        ExportError::InvalidParameter(format!("FastHenry has no unit keyword for {:?}", config.units))
    })?;

    let labels = resolve_labels(polygons, names)?;
    let chains = polygons
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(index, (polygon, label))| node_chain(index, label, polygon))
        .collect::<Result<Vec<_>>>()?;

    Deck::render(
        DeckFormat::FastHenry,
        FASTHENRY_TEMPLATE,
        context! {
            stem => stem,
            units => units,
            nwinc => config.width_discretization,
            nhinc => config.height_discretization,
            height => natural(config.line_height),
            width => natural(config.line_width),
            polygons => chains,
        },
    )
}

/// Write a FastHenry deck to the first free `{base}{n}.txt`
pub fn write_fasthenry(
    base: &str,
    polygons: &[Polygon],
    names: Option<&[String]>,
    config: &InductanceConfig,
) -> Result<Allocation> {
    let allocator = FileAllocator::new(base, DeckFormat::FastHenry.name_pattern())?;
    allocator.write_new(|stem| {
        render_fasthenry(stem, polygons, names, config).map(Deck::into_string)
    })
}
