use serde::{Deserialize, Serialize};

/// One candidate footprint for a part placement.
///
/// Only 0 and 90 degree rotations are generated: at any other angle the
/// axis-aligned bounding box only grows, so there is no packing benefit in
/// this rectangular model. Mirroring never changes the footprint, it only
/// changes how the geometry is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub width: f64,
    pub height: f64,
    pub rotation: i32,
    pub mirrored: bool,
}

/// Enumerates the distinct orientations for a bounding box under the
/// allowed transforms. Distinct by (rotation, mirrored); at most four.
pub fn generate(
    width: f64,
    height: f64,
    allow_rotation: bool,
    allow_mirroring: bool,
) -> Vec<Orientation> {
    let mut orientations = vec![Orientation {
        width,
        height,
        rotation: 0,
        mirrored: false,
    }];

    if allow_rotation {
        orientations.push(Orientation {
            width: height,
            height: width,
            rotation: 90,
            mirrored: false,
        });
    }

    if allow_mirroring {
        let mirrored: Vec<Orientation> = orientations
            .iter()
            .map(|o| Orientation {
                mirrored: true,
                ..*o
            })
            .collect();
        orientations.extend(mirrored);
    }

    orientations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_orientation_only() {
        let orientations = generate(100.0, 50.0, false, false);
        assert_eq!(orientations.len(), 1);
        assert_eq!(orientations[0].width, 100.0);
        assert_eq!(orientations[0].height, 50.0);
        assert_eq!(orientations[0].rotation, 0);
        assert!(!orientations[0].mirrored);
    }

    #[test]
    fn test_rotation_swaps_footprint() {
        let orientations = generate(100.0, 50.0, true, false);
        assert_eq!(orientations.len(), 2);
        assert_eq!(orientations[1].width, 50.0);
        assert_eq!(orientations[1].height, 100.0);
        assert_eq!(orientations[1].rotation, 90);
    }

    #[test]
    fn test_mirroring_doubles_set_without_new_footprints() {
        let orientations = generate(100.0, 50.0, true, true);
        assert_eq!(orientations.len(), 4);
        for o in &orientations[2..] {
            assert!(o.mirrored);
        }
        // Mirrored variants keep the footprint of their source orientation.
        assert_eq!(orientations[2].width, orientations[0].width);
        assert_eq!(orientations[3].width, orientations[1].width);
    }

    #[test]
    fn test_no_duplicate_keys() {
        let orientations = generate(80.0, 80.0, true, true);
        for i in 0..orientations.len() {
            for j in (i + 1)..orientations.len() {
                let a = &orientations[i];
                let b = &orientations[j];
                assert!(a.rotation != b.rotation || a.mirrored != b.mirrored);
            }
        }
    }
}
