use serde::{Deserialize, Serialize};

/// A 3D coordinate. Flat-part drawings are effectively 2D; `z` is carried
/// through untouched so round-tripped files keep their original values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// A 2D direction vector (ellipse major axis).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// A parsed geometric primitive.
///
/// The tag values and field names form the JSON contract with the external
/// DXF parser; `LWPOLYLINE` arrives as a [`Entity::Polyline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Entity {
    Line {
        start: Point3,
        end: Point3,
    },
    Circle {
        center: Point3,
        radius: f64,
    },
    Arc {
        center: Point3,
        radius: f64,
        #[serde(rename = "startAngle")]
        start_angle: f64,
        #[serde(rename = "endAngle")]
        end_angle: f64,
    },
    #[serde(alias = "LWPOLYLINE")]
    Polyline {
        vertices: Vec<Point3>,
        #[serde(default)]
        closed: bool,
    },
    Spline {
        #[serde(rename = "controlPoints")]
        control_points: Vec<Point3>,
        #[serde(default)]
        knots: Vec<f64>,
        #[serde(default)]
        closed: bool,
    },
    Ellipse {
        center: Point3,
        #[serde(rename = "majorAxis")]
        major_axis: Vec2,
        #[serde(rename = "axisRatio")]
        axis_ratio: f64,
    },
    Point {
        position: Point3,
    },
    Text {
        position: Point3,
        text: String,
        #[serde(default)]
        height: Option<f64>,
    },
    MText {
        position: Point3,
        text: String,
        #[serde(default)]
        height: Option<f64>,
    },
}

/// Header metadata relevant to unit detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "$INSUNITS", default)]
    pub insunits: Option<i32>,
    #[serde(rename = "$MEASUREMENT", default)]
    pub measurement: Option<i32>,
}

/// A parsed drawing as handed over by the external DXF parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drawing {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub entities: Vec<Entity>,
}
