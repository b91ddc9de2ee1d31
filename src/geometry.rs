use crate::entity::{Drawing, Entity, Point3, Vec2};
use crate::error::NestError;
use crate::units::Unit;
use serde::{Deserialize, Serialize};

/// Coordinates are rounded to this many decimal places after scaling so
/// repeated scale/unscale cycles do not accumulate drift.
const SCALE_PRECISION: i32 = 6;

pub fn round_coord(value: f64) -> f64 {
    let factor = 10f64.powi(SCALE_PRECISION);
    (value * factor).round() / factor
}

/// Axis-aligned extent of a drawing, in working units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// A drawing rescaled to millimeters, ready for packing.
#[derive(Debug, Clone)]
pub struct NormalizedDrawing {
    pub entities: Vec<Entity>,
    pub bbox: BoundingBox,
    pub units: Unit,
    pub scale_factor: f64,
}

struct Extent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Extent {
    fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    fn add_point(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }
}

/// Computes the bounding box over all entities.
///
/// Entities that carry no 2D extent are skipped; an empty entity list, or a
/// list in which nothing contributed, is a parse failure.
pub fn bounding_box(entities: &[Entity]) -> Result<BoundingBox, NestError> {
    if entities.is_empty() {
        return Err(NestError::ParseFailure(
            "drawing contains no entities".to_string(),
        ));
    }

    let mut extent = Extent::new();
    for entity in entities {
        match entity {
            Entity::Line { start, end } => {
                extent.add_point(start.x, start.y);
                extent.add_point(end.x, end.y);
            }
            Entity::Circle { center, radius } | Entity::Arc { center, radius, .. } => {
                extent.add_point(center.x - radius, center.y - radius);
                extent.add_point(center.x + radius, center.y + radius);
            }
            Entity::Polyline { vertices, .. } => {
                for v in vertices {
                    extent.add_point(v.x, v.y);
                }
            }
            Entity::Spline { control_points, .. } => {
                for p in control_points {
                    extent.add_point(p.x, p.y);
                }
            }
            Entity::Ellipse {
                center,
                major_axis,
                axis_ratio,
            } => {
                // Conservative extent: the major-axis length bounds both
                // semi-axes since the axis ratio is <= 1.
                let r = (major_axis.x.powi(2) + major_axis.y.powi(2)).sqrt()
                    * axis_ratio.abs().max(1.0);
                extent.add_point(center.x - r, center.y - r);
                extent.add_point(center.x + r, center.y + r);
            }
            Entity::Point { position }
            | Entity::Text { position, .. }
            | Entity::MText { position, .. } => {
                extent.add_point(position.x, position.y);
            }
        }
    }

    if extent.is_empty() {
        return Err(NestError::ParseFailure(
            "drawing contains no measurable geometry".to_string(),
        ));
    }

    Ok(BoundingBox {
        width: (extent.max_x - extent.min_x).abs(),
        height: (extent.max_y - extent.min_y).abs(),
        min_x: extent.min_x,
        min_y: extent.min_y,
        max_x: extent.max_x,
        max_y: extent.max_y,
    })
}

fn scale_point(p: &Point3, factor: f64) -> Point3 {
    Point3 {
        x: round_coord(p.x * factor),
        y: round_coord(p.y * factor),
        z: round_coord(p.z * factor),
    }
}

/// Returns a new entity list with every length multiplied by `factor`.
/// Angles, axis ratios, knots and closed flags are dimensionless and pass
/// through unchanged.
pub fn scale_entities(entities: &[Entity], factor: f64) -> Vec<Entity> {
    entities
        .iter()
        .map(|entity| match entity {
            Entity::Line { start, end } => Entity::Line {
                start: scale_point(start, factor),
                end: scale_point(end, factor),
            },
            Entity::Circle { center, radius } => Entity::Circle {
                center: scale_point(center, factor),
                radius: round_coord(radius * factor),
            },
            Entity::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => Entity::Arc {
                center: scale_point(center, factor),
                radius: round_coord(radius * factor),
                start_angle: *start_angle,
                end_angle: *end_angle,
            },
            Entity::Polyline { vertices, closed } => Entity::Polyline {
                vertices: vertices.iter().map(|v| scale_point(v, factor)).collect(),
                closed: *closed,
            },
            Entity::Spline {
                control_points,
                knots,
                closed,
            } => Entity::Spline {
                control_points: control_points
                    .iter()
                    .map(|p| scale_point(p, factor))
                    .collect(),
                knots: knots.clone(),
                closed: *closed,
            },
            Entity::Ellipse {
                center,
                major_axis,
                axis_ratio,
            } => Entity::Ellipse {
                center: scale_point(center, factor),
                major_axis: Vec2 {
                    x: round_coord(major_axis.x * factor),
                    y: round_coord(major_axis.y * factor),
                },
                axis_ratio: *axis_ratio,
            },
            Entity::Point { position } => Entity::Point {
                position: scale_point(position, factor),
            },
            Entity::Text {
                position,
                text,
                height,
            } => Entity::Text {
                position: scale_point(position, factor),
                text: text.clone(),
                height: height.map(|h| round_coord(h * factor)),
            },
            Entity::MText {
                position,
                text,
                height,
            } => Entity::MText {
                position: scale_point(position, factor),
                text: text.clone(),
                height: height.map(|h| round_coord(h * factor)),
            },
        })
        .collect()
}

/// Normalization pipeline: detect units (header first, raw-extent heuristic
/// as fallback), rescale to millimeters, compute the final bounding box.
pub fn normalize(drawing: &Drawing) -> Result<NormalizedDrawing, NestError> {
    let mut units = Unit::detect_from_header(&drawing.header);

    if units == Unit::Unspecified {
        let raw = bounding_box(&drawing.entities)?;
        units = Unit::detect_from_dimensions(raw.width, raw.height);
    }

    let scale_factor = Unit::scale_factor(units, Unit::Millimeters);
    let entities = scale_entities(&drawing.entities, scale_factor);
    let bbox = bounding_box(&entities)?;

    tracing::debug!(
        units = units.name(),
        scale_factor,
        width = bbox.width,
        height = bbox.height,
        "normalized drawing"
    );

    Ok(NormalizedDrawing {
        entities,
        bbox,
        units,
        scale_factor,
    })
}
