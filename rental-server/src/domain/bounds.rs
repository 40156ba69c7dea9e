use super::error::DomainError;
use super::post::{validate_latitude, validate_longitude};

/// Map viewport. `west > east` means the viewport crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MapBounds {
    pub(crate) south: f64,
    pub(crate) west: f64,
    pub(crate) north: f64,
    pub(crate) east: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LongitudeRange {
    pub(crate) min: f64,
    pub(crate) max: f64,
}

impl MapBounds {
    pub(crate) fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, DomainError> {
        validate_latitude("south", south)?;
        validate_latitude("north", north)?;
        validate_longitude("west", west)?;
        validate_longitude("east", east)?;
        if south > north {
            return Err(DomainError::invalid("south", "must be <= north"));
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    pub(crate) fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// One range for a regular viewport, two when it wraps past 180°.
    pub(crate) fn longitude_ranges(&self) -> Vec<LongitudeRange> {
        if self.crosses_antimeridian() {
            vec![
                LongitudeRange {
                    min: self.west,
                    max: 180.0,
                },
                LongitudeRange {
                    min: -180.0,
                    max: self.east,
                },
            ]
        } else {
            vec![LongitudeRange {
                min: self.west,
                max: self.east,
            }]
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, latitude: f64, longitude: f64) -> bool {
        if latitude < self.south || latitude > self.north {
            return false;
        }
        self.longitude_ranges()
            .iter()
            .any(|range| longitude >= range.min && longitude <= range.max)
    }
}

#[cfg(test)]
mod tests {
    use super::MapBounds;
    use crate::domain::error::DomainError;

    #[test]
    fn regular_viewport_has_single_range() {
        let bounds = MapBounds::new(50.0, 10.0, 55.0, 15.0).expect("valid bounds");
        assert!(!bounds.crosses_antimeridian());
        assert_eq!(bounds.longitude_ranges().len(), 1);
        assert!(bounds.contains(52.5, 13.4));
        assert!(!bounds.contains(52.5, 16.0));
    }

    #[test]
    fn antimeridian_viewport_is_split() {
        let bounds = MapBounds::new(-20.0, 170.0, 10.0, -170.0).expect("valid bounds");
        assert!(bounds.crosses_antimeridian());

        let ranges = bounds.longitude_ranges();
        assert_eq!(ranges.len(), 2);
        assert!(bounds.contains(0.0, 175.0));
        assert!(bounds.contains(0.0, -175.0));
        assert!(!bounds.contains(0.0, 0.0));
    }

    #[test]
    fn inverted_latitude_is_rejected() {
        let err = MapBounds::new(10.0, 0.0, 5.0, 1.0).expect_err("south > north");
        assert!(matches!(err, DomainError::InvalidInput { field: "south", .. }));
    }

    #[test]
    fn out_of_range_longitude_is_rejected() {
        assert!(MapBounds::new(0.0, -181.0, 1.0, 1.0).is_err());
    }
}
