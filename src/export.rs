use crate::entity::{Entity, Point3};
use crate::geometry;
use crate::transform;
use crate::types::{Part, Sheet};
use crate::units::Unit;

const DEFAULT_TEXT_HEIGHT: f64 = 2.5;

/// Builds DXF text as a flat list of group-code/value pairs, the way the
/// format is actually framed on the wire.
pub struct DxfWriter {
    lines: Vec<String>,
    units: Unit,
}

impl DxfWriter {
    pub fn new(units: Unit) -> Self {
        let mut writer = Self {
            lines: Vec::new(),
            units,
        };
        writer.write_header();
        writer.write_tables();
        writer.begin_entities();
        writer
    }

    fn pair(&mut self, code: i32, value: impl ToString) {
        self.lines.push(code.to_string());
        self.lines.push(value.to_string());
    }

    fn write_header(&mut self) {
        self.pair(0, "SECTION");
        self.pair(2, "HEADER");

        self.pair(9, "$ACADVER");
        self.pair(1, "AC1032");

        self.pair(9, "$INSUNITS");
        self.pair(70, self.units.insunits_code());

        // 0 = English, 1 = metric.
        self.pair(9, "$MEASUREMENT");
        self.pair(70, if self.units.is_metric() { 1 } else { 0 });

        self.pair(9, "$LUNITS");
        self.pair(70, 2); // decimal format
        self.pair(9, "$LUPREC");
        self.pair(70, 4);

        self.pair(9, "$DIMSCALE");
        self.pair(40, "1.0");

        self.pair(9, "$LIMMIN");
        self.pair(10, "0.0");
        self.pair(20, "0.0");
        self.pair(9, "$LIMMAX");
        self.pair(10, "1000.0");
        self.pair(20, "1000.0");

        self.pair(9, "$DIMLFAC");
        self.pair(40, "1.0");
        self.pair(9, "$DIMALTF");
        self.pair(40, "25.4");

        self.pair(0, "ENDSEC");
    }

    fn write_tables(&mut self) {
        self.pair(0, "SECTION");
        self.pair(2, "TABLES");
        self.pair(0, "TABLE");
        self.pair(2, "LAYER");
        self.pair(70, 1);
        self.pair(0, "LAYER");
        self.pair(2, 0);
        self.pair(70, 0);
        self.pair(62, 7);
        self.pair(6, "CONTINUOUS");
        self.pair(0, "ENDTAB");
        self.pair(0, "ENDSEC");
    }

    fn begin_entities(&mut self) {
        self.pair(0, "SECTION");
        self.pair(2, "ENTITIES");
    }

    pub fn add_entities(&mut self, entities: &[Entity]) {
        for entity in entities {
            self.add_entity(entity);
        }
    }

    pub fn add_entity(&mut self, entity: &Entity) {
        match entity {
            Entity::Line { start, end } => self.add_line(start, end),
            Entity::Circle { center, radius } => self.add_circle(center, *radius),
            Entity::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => self.add_arc(center, *radius, *start_angle, *end_angle),
            Entity::Polyline { vertices, .. } => {
                if vertices.len() < 2 {
                    tracing::warn!(
                        vertex_count = vertices.len(),
                        "skipping degenerate polyline"
                    );
                    return;
                }
                self.add_polyline(vertices);
            }
            Entity::Spline {
                control_points,
                knots,
                ..
            } => {
                if control_points.is_empty() {
                    tracing::warn!("skipping spline without control points");
                    return;
                }
                self.add_spline(control_points, knots);
            }
            Entity::Ellipse {
                center,
                major_axis,
                axis_ratio,
            } => {
                self.pair(0, "ELLIPSE");
                self.pair(8, 0);
                self.pair(10, center.x);
                self.pair(20, center.y);
                self.pair(11, major_axis.x);
                self.pair(21, major_axis.y);
                self.pair(40, *axis_ratio);
                self.pair(41, "0.0");
                self.pair(42, std::f64::consts::TAU);
            }
            Entity::Point { position } => {
                self.pair(0, "POINT");
                self.pair(8, 0);
                self.pair(10, position.x);
                self.pair(20, position.y);
            }
            Entity::Text {
                position,
                text,
                height,
            } => self.add_text("TEXT", position, text, *height),
            Entity::MText {
                position,
                text,
                height,
            } => self.add_text("MTEXT", position, text, *height),
        }
    }

    fn add_line(&mut self, start: &Point3, end: &Point3) {
        self.pair(0, "LINE");
        self.pair(8, 0);
        self.pair(10, start.x);
        self.pair(20, start.y);
        self.pair(11, end.x);
        self.pair(21, end.y);
    }

    fn add_circle(&mut self, center: &Point3, radius: f64) {
        self.pair(0, "CIRCLE");
        self.pair(8, 0);
        self.pair(10, center.x);
        self.pair(20, center.y);
        self.pair(40, radius);
    }

    fn add_arc(&mut self, center: &Point3, radius: f64, start_angle: f64, end_angle: f64) {
        self.pair(0, "ARC");
        self.pair(8, 0);
        self.pair(10, center.x);
        self.pair(20, center.y);
        self.pair(40, radius);
        self.pair(50, start_angle);
        self.pair(51, end_angle);
    }

    fn add_polyline(&mut self, vertices: &[Point3]) {
        self.pair(0, "POLYLINE");
        self.pair(8, 0);
        self.pair(66, 1);
        self.pair(70, 1);
        for vertex in vertices {
            self.pair(0, "VERTEX");
            self.pair(8, 0);
            self.pair(10, vertex.x);
            self.pair(20, vertex.y);
        }
        self.pair(0, "SEQEND");
    }

    fn add_spline(&mut self, control_points: &[Point3], knots: &[f64]) {
        self.pair(0, "SPLINE");
        self.pair(8, 0);
        self.pair(70, 8); // rational
        self.pair(71, 3); // cubic
        self.pair(72, control_points.len());
        self.pair(73, control_points.len() + 4);
        for knot in knots {
            self.pair(40, *knot);
        }
        for pt in control_points {
            self.pair(10, pt.x);
            self.pair(20, pt.y);
            self.pair(30, pt.z);
        }
    }

    fn add_text(&mut self, kind: &str, position: &Point3, text: &str, height: Option<f64>) {
        self.pair(0, kind);
        self.pair(8, 0);
        self.pair(10, position.x);
        self.pair(20, position.y);
        self.pair(40, height.unwrap_or(DEFAULT_TEXT_HEIGHT));
        self.pair(1, text);
    }

    /// Closed rectangle outline (sheet boundary, geometry-less parts).
    pub fn add_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let vertices = [
            Point3::new(x, y),
            Point3::new(x + width, y),
            Point3::new(x + width, y + height),
            Point3::new(x, y + height),
            Point3::new(x, y),
        ];
        self.add_polyline(&vertices);
    }

    pub fn finish(mut self) -> String {
        self.pair(0, "ENDSEC");

        // Empty BLOCKS section for reader compatibility.
        self.pair(0, "SECTION");
        self.pair(2, "BLOCKS");
        self.pair(0, "ENDSEC");

        self.pair(0, "SECTION");
        self.pair(2, "OBJECTS");
        self.pair(0, "DICTIONARY");
        self.pair(5, "C");
        self.pair(100, "AcDbDictionary");
        self.pair(3, "ACAD_GROUP");
        self.pair(350, "D");
        self.pair(0, "ENDSEC");

        self.pair(0, "EOF");
        self.lines.join("\n")
    }
}

/// Serializes one packed sheet back into DXF text.
///
/// All geometry is emitted in a single unit system: the source unit of the
/// first placed part that carries geometry (millimeters when none does).
/// Each item's entities are transformed to their placement in millimeters,
/// then rescaled by the inverse of that unit's factor. Parts supplied
/// without geometry are emitted as their bounding rectangle.
pub fn export_sheet(sheet: &Sheet, parts: &[Part]) -> String {
    let export_units = sheet
        .items
        .iter()
        .filter_map(|item| parts.get(item.part_index))
        .find(|part| !part.entities.is_empty())
        .map(|part| part.units)
        .unwrap_or(Unit::Millimeters);
    let inverse_factor = 1.0 / Unit::scale_factor(export_units, Unit::Millimeters);

    let mut writer = DxfWriter::new(export_units);
    writer.add_rect(
        0.0,
        0.0,
        geometry::round_coord(sheet.width * inverse_factor),
        geometry::round_coord(sheet.height * inverse_factor),
    );

    for item in &sheet.items {
        let Some(part) = parts.get(item.part_index) else {
            tracing::warn!(part = %item.part, "placed item references unknown part");
            continue;
        };

        if part.entities.is_empty() {
            writer.add_rect(
                geometry::round_coord(item.x * inverse_factor),
                geometry::round_coord(item.y * inverse_factor),
                geometry::round_coord(item.width * inverse_factor),
                geometry::round_coord(item.height * inverse_factor),
            );
            continue;
        }

        let placed = transform::transform_entities(
            &part.entities,
            item.x - part.min_x,
            item.y - part.min_y,
            item.rotation,
            item.mirrored,
        );
        let rescaled = geometry::scale_entities(&placed, inverse_factor);
        writer.add_entities(&rescaled);
    }

    writer.finish()
}
