// THEORY:
// The annotation emitter describes what the pipeline saw as a flat list of drawing
// primitives. It is debug-only and purely derivative: it reads the products of the
// other stages and never feeds anything back into scoring. The primitives are
// owned values, so a renderer holds a snapshot, not a view into pipeline state.
//
// Emission order is the paint order (later draws over earlier):
// interior grid lines, cell point labels, target centre, motion dots, hit ring,
// hit label.

use crate::core_modules::grid_geometry::{GRID_DIVISIONS, GridArea};
use crate::core_modules::hit_resolver::HitEvent;
use crate::core_modules::motion_detector::MotionPixelSet;
use crate::core_modules::target_locator::Target;
use serde::{Deserialize, Serialize};

const TARGET_CENTER_RADIUS: f64 = 5.0;
const MOTION_DOT_RADIUS: f64 = 2.0;
const CELL_LABEL_OFFSET: (f64, f64) = (-10.0, 10.0);
const HIT_LABEL_OFFSET: f64 = 20.0;

/// Semantic colour of a primitive. Renderers map it with `rgba`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorToken {
    GridLine,
    CellLabel,
    TargetCenter,
    MotionPixel,
    HitMarker,
}

impl ColorToken {
    /// `[r, g, b, a]`, alpha in 0..=255.
    pub fn rgba(self) -> [u8; 4] {
        match self {
            ColorToken::GridLine => [255, 255, 0, 178],
            ColorToken::CellLabel => [255, 255, 0, 255],
            ColorToken::TargetCenter => [0, 0, 255, 255],
            ColorToken::MotionPixel => [255, 0, 0, 77],
            ColorToken::HitMarker => [0, 255, 0, 255],
        }
    }

    pub fn is_translucent(self) -> bool {
        self.rgba()[3] < u8::MAX
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: ColorToken,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        color: ColorToken,
        filled: bool,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: ColorToken,
    },
}

impl Annotation {
    pub fn color(&self) -> ColorToken {
        match self {
            Annotation::Line { color, .. }
            | Annotation::Circle { color, .. }
            | Annotation::Text { color, .. } => *color,
        }
    }
}

/// A run of consecutive primitives that are all translucent or all opaque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintLayer<'a> {
    pub translucent: bool,
    pub annotations: &'a [Annotation],
}

/// Splits an emitted list into paint layers, in emission order. A renderer blends
/// each translucent layer as a whole before drawing the next one, so later
/// primitives still cover earlier ones.
pub fn paint_layers(annotations: &[Annotation]) -> impl Iterator<Item = PaintLayer<'_>> {
    annotations
        .chunk_by(|a, b| a.color().is_translucent() == b.color().is_translucent())
        .map(|run| PaintLayer {
            translucent: run[0].color().is_translucent(),
            annotations: run,
        })
}

/// Builds the debug overlay for one frame cycle.
pub fn emit_annotations(
    located: Option<(&Target, &GridArea)>,
    motion: &MotionPixelSet,
    hit: Option<&HitEvent>,
    hit_marker_radius: f64,
) -> Vec<Annotation> {
    let mut annotations = Vec::with_capacity(4 + GRID_DIVISIONS * GRID_DIVISIONS + motion.len() + 3);

    if let Some((target, grid)) = located {
        push_grid(&mut annotations, grid);
        annotations.push(Annotation::Circle {
            x: target.center_x,
            y: target.center_y,
            radius: TARGET_CENTER_RADIUS,
            color: ColorToken::TargetCenter,
            filled: true,
        });
    }

    annotations.extend(motion.points().iter().map(|p| Annotation::Circle {
        x: p.x as f64,
        y: p.y as f64,
        radius: MOTION_DOT_RADIUS,
        color: ColorToken::MotionPixel,
        filled: true,
    }));

    if let Some(hit) = hit {
        annotations.push(Annotation::Circle {
            x: hit.centroid_x,
            y: hit.centroid_y,
            radius: hit_marker_radius,
            color: ColorToken::HitMarker,
            filled: false,
        });
        annotations.push(Annotation::Text {
            x: hit.centroid_x + HIT_LABEL_OFFSET,
            y: hit.centroid_y,
            text: format!("+{}", hit.points),
            color: ColorToken::HitMarker,
        });
    }

    annotations
}

fn push_grid(annotations: &mut Vec<Annotation>, grid: &GridArea) {
    for i in 1..GRID_DIVISIONS {
        let x = grid.min_x + i as f64 * grid.cell_width();
        annotations.push(Annotation::Line {
            x1: x,
            y1: grid.min_y,
            x2: x,
            y2: grid.max_y,
            color: ColorToken::GridLine,
        });
        let y = grid.min_y + i as f64 * grid.cell_height();
        annotations.push(Annotation::Line {
            x1: grid.min_x,
            y1: y,
            x2: grid.max_x,
            y2: y,
            color: ColorToken::GridLine,
        });
    }

    for cell in GridArea::cells() {
        let (x, y) = grid.cell_center(cell);
        annotations.push(Annotation::Text {
            x: x + CELL_LABEL_OFFSET.0,
            y: y + CELL_LABEL_OFFSET.1,
            text: cell.points().to_string(),
            color: ColorToken::CellLabel,
        });
    }
}
