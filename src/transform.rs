use crate::entity::{Entity, Point3, Vec2};

/// Applies a placement transform to a cloned entity list.
///
/// Each point goes through mirror (negate x), then rotation (CCW), then
/// translation — in exactly that order. Reversing mirror and rotation
/// misplaces any part that uses both.
pub fn transform_entities(
    entities: &[Entity],
    offset_x: f64,
    offset_y: f64,
    rotation_deg: i32,
    mirrored: bool,
) -> Vec<Entity> {
    entities
        .iter()
        .map(|entity| match entity {
            Entity::Line { start, end } => Entity::Line {
                start: transform_point(start, offset_x, offset_y, rotation_deg, mirrored),
                end: transform_point(end, offset_x, offset_y, rotation_deg, mirrored),
            },
            Entity::Circle { center, radius } => Entity::Circle {
                center: transform_point(center, offset_x, offset_y, rotation_deg, mirrored),
                radius: *radius,
            },
            Entity::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let (start_angle, end_angle) = if rotation_deg != 0 {
                    (
                        (start_angle + rotation_deg as f64).rem_euclid(360.0),
                        (end_angle + rotation_deg as f64).rem_euclid(360.0),
                    )
                } else {
                    (*start_angle, *end_angle)
                };
                Entity::Arc {
                    center: transform_point(center, offset_x, offset_y, rotation_deg, mirrored),
                    radius: *radius,
                    start_angle,
                    end_angle,
                }
            }
            Entity::Polyline { vertices, closed } => Entity::Polyline {
                vertices: vertices
                    .iter()
                    .map(|v| transform_point(v, offset_x, offset_y, rotation_deg, mirrored))
                    .collect(),
                closed: *closed,
            },
            Entity::Spline {
                control_points,
                knots,
                closed,
            } => Entity::Spline {
                control_points: control_points
                    .iter()
                    .map(|p| transform_point(p, offset_x, offset_y, rotation_deg, mirrored))
                    .collect(),
                knots: knots.clone(),
                closed: *closed,
            },
            Entity::Ellipse {
                center,
                major_axis,
                axis_ratio,
            } => Entity::Ellipse {
                center: transform_point(center, offset_x, offset_y, rotation_deg, mirrored),
                // Direction vector: mirrored and rotated, never translated.
                major_axis: transform_vector(major_axis, rotation_deg, mirrored),
                axis_ratio: *axis_ratio,
            },
            Entity::Point { position } => Entity::Point {
                position: transform_point(position, offset_x, offset_y, rotation_deg, mirrored),
            },
            Entity::Text {
                position,
                text,
                height,
            } => Entity::Text {
                position: transform_point(position, offset_x, offset_y, rotation_deg, mirrored),
                text: text.clone(),
                height: *height,
            },
            Entity::MText {
                position,
                text,
                height,
            } => Entity::MText {
                position: transform_point(position, offset_x, offset_y, rotation_deg, mirrored),
                text: text.clone(),
                height: *height,
            },
        })
        .collect()
}

fn transform_point(
    point: &Point3,
    offset_x: f64,
    offset_y: f64,
    rotation_deg: i32,
    mirrored: bool,
) -> Point3 {
    let mut x = point.x;
    let mut y = point.y;

    if mirrored {
        x = -x;
    }

    if rotation_deg != 0 {
        let radians = (rotation_deg as f64).to_radians();
        let (sin, cos) = radians.sin_cos();
        let rotated_x = x * cos - y * sin;
        y = x * sin + y * cos;
        x = rotated_x;
    }

    Point3 {
        x: x + offset_x,
        y: y + offset_y,
        z: point.z,
    }
}

fn transform_vector(vector: &Vec2, rotation_deg: i32, mirrored: bool) -> Vec2 {
    let mut x = vector.x;
    let mut y = vector.y;

    if mirrored {
        x = -x;
    }

    if rotation_deg != 0 {
        let radians = (rotation_deg as f64).to_radians();
        let (sin, cos) = radians.sin_cos();
        let rotated_x = x * cos - y * sin;
        y = x * sin + y * cos;
        x = rotated_x;
    }

    Vec2 { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_translation_only() {
        let entities = vec![Entity::Point {
            position: Point3::new(1.0, 2.0),
        }];
        let out = transform_entities(&entities, 10.0, 20.0, 0, false);
        match &out[0] {
            Entity::Point { position } => {
                assert_close(position.x, 11.0);
                assert_close(position.y, 22.0);
            }
            other => panic!("expected point, got {other:?}"),
        }
    }

    #[test]
    fn test_rotation_90_ccw() {
        let entities = vec![Entity::Point {
            position: Point3::new(1.0, 0.0),
        }];
        let out = transform_entities(&entities, 0.0, 0.0, 90, false);
        match &out[0] {
            Entity::Point { position } => {
                assert_close(position.x, 0.0);
                assert_close(position.y, 1.0);
            }
            other => panic!("expected point, got {other:?}"),
        }
    }

    #[test]
    fn test_mirror_then_rotate_order() {
        // Mirror (1,0) -> (-1,0), then rotate 90 CCW -> (0,-1).
        // Rotating first then mirroring would give (0,1) instead.
        let entities = vec![Entity::Point {
            position: Point3::new(1.0, 0.0),
        }];
        let out = transform_entities(&entities, 0.0, 0.0, 90, true);
        match &out[0] {
            Entity::Point { position } => {
                assert_close(position.x, 0.0);
                assert_close(position.y, -1.0);
            }
            other => panic!("expected point, got {other:?}"),
        }
    }

    #[test]
    fn test_arc_angles_shift_with_rotation() {
        let entities = vec![Entity::Arc {
            center: Point3::new(0.0, 0.0),
            radius: 5.0,
            start_angle: 300.0,
            end_angle: 350.0,
        }];
        let out = transform_entities(&entities, 0.0, 0.0, 90, false);
        match &out[0] {
            Entity::Arc {
                start_angle,
                end_angle,
                ..
            } => {
                assert_close(*start_angle, 30.0);
                assert_close(*end_angle, 80.0);
            }
            other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn test_circle_radius_untouched() {
        let entities = vec![Entity::Circle {
            center: Point3::new(2.0, 3.0),
            radius: 7.5,
        }];
        let out = transform_entities(&entities, 5.0, 5.0, 90, true);
        match &out[0] {
            Entity::Circle { center, radius } => {
                assert_close(*radius, 7.5);
                // (2,3) mirror -> (-2,3), rotate 90 -> (-3,-2), translate.
                assert_close(center.x, 2.0);
                assert_close(center.y, 3.0);
            }
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn test_ellipse_axis_rotates_without_translation() {
        let entities = vec![Entity::Ellipse {
            center: Point3::new(0.0, 0.0),
            major_axis: Vec2 { x: 4.0, y: 0.0 },
            axis_ratio: 0.5,
        }];
        let out = transform_entities(&entities, 100.0, 100.0, 90, false);
        match &out[0] {
            Entity::Ellipse {
                center, major_axis, ..
            } => {
                assert_close(center.x, 100.0);
                assert_close(center.y, 100.0);
                assert_close(major_axis.x, 0.0);
                assert_close(major_axis.y, 4.0);
            }
            other => panic!("expected ellipse, got {other:?}"),
        }
    }

    #[test]
    fn test_original_untouched() {
        let entities = vec![Entity::Point {
            position: Point3::new(1.0, 1.0),
        }];
        let _ = transform_entities(&entities, 50.0, 50.0, 90, true);
        match &entities[0] {
            Entity::Point { position } => {
                assert_close(position.x, 1.0);
                assert_close(position.y, 1.0);
            }
            other => panic!("expected point, got {other:?}"),
        }
    }
}
