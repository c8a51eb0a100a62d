use cityscape_common::ConfigurationError;
use serde::{Deserialize, Serialize};

use crate::layout::GridLayout;

/// Largest accepted building count (columns * rows).
pub const MAX_BUILDINGS: u32 = 65_536;

/// Upper bound on any single length (lot, street, building height).
pub const MAX_LENGTH: f32 = 1.0e5;

/// Smallest accepted building footprint edge or height.
pub const MIN_DIMENSION: f32 = 1.0e-3;

/// A building edge must span at least this many f32 ulps at the grid rim.
const PRECISION_ULPS: f32 = 4.0;

/// Closed interval of floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    fn check_positive(&self, field: &'static str) -> Result<(), ConfigurationError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min <= 0.0 || self.min > self.max
        {
            return Err(ConfigurationError::InvalidRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Parameters for one city generation. Consumed once by [`crate::generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfiguration {
    /// Blocks along X.
    pub columns: u32,
    /// Blocks along Z.
    pub rows: u32,
    /// Edge length of a building lot.
    pub block_size: f32,
    /// Gap between neighbouring lots.
    pub street_width: f32,
    /// Building width/depth range; must fit within `block_size`.
    pub footprint: Range,
    pub height: Range,
    /// 0 = uniform heights, 1 = strong skyline peaking at the grid centre.
    pub downtown_bias: f32,
    pub seed: u64,
}

impl Default for CityConfiguration {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 16,
            block_size: 16.0,
            street_width: 6.0,
            footprint: Range::new(8.0, 15.0),
            height: Range::new(8.0, 120.0),
            downtown_bias: 0.6,
            seed: 42,
        }
    }
}

impl CityConfiguration {
    /// Default configuration on a `columns` x `rows` grid.
    pub fn grid(columns: u32, rows: u32, seed: u64) -> Self {
        Self {
            columns,
            rows,
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigurationError::EmptyGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if self.columns as u64 * self.rows as u64 > MAX_BUILDINGS as u64 {
            return Err(ConfigurationError::GridTooLarge {
                columns: self.columns,
                rows: self.rows,
                max: MAX_BUILDINGS,
            });
        }
        if !self.block_size.is_finite() || self.block_size <= 0.0 {
            return Err(ConfigurationError::OutOfBounds {
                field: "block_size",
                value: self.block_size,
                min: f32::MIN_POSITIVE,
            });
        }
        if !self.street_width.is_finite() || self.street_width < 0.0 {
            return Err(ConfigurationError::OutOfBounds {
                field: "street_width",
                value: self.street_width,
                min: 0.0,
            });
        }
        self.footprint.check_positive("footprint")?;
        self.height.check_positive("height")?;
        for (field, value) in [
            ("block_size", self.block_size),
            ("street_width", self.street_width),
            ("height", self.height.max),
        ] {
            if value > MAX_LENGTH {
                return Err(ConfigurationError::AboveLimit {
                    field,
                    value,
                    max: MAX_LENGTH,
                });
            }
        }
        for (field, value) in [("footprint", self.footprint.min), ("height", self.height.min)] {
            if value < MIN_DIMENSION {
                return Err(ConfigurationError::OutOfBounds {
                    field,
                    value,
                    min: MIN_DIMENSION,
                });
            }
        }
        // Lot centres far from the origin must still resolve the narrowest building.
        let rim = GridLayout::from_config(self).extent().max_element();
        let resolvable = rim * f32::EPSILON * PRECISION_ULPS;
        if self.footprint.min <= resolvable {
            return Err(ConfigurationError::OutOfBounds {
                field: "footprint",
                value: self.footprint.min,
                min: resolvable,
            });
        }
        if self.footprint.max > self.block_size {
            return Err(ConfigurationError::FootprintExceedsBlock {
                footprint: self.footprint.max,
                block: self.block_size,
            });
        }
        if !(0.0..=1.0).contains(&self.downtown_bias) {
            return Err(ConfigurationError::InvalidRange {
                field: "downtown_bias",
                min: self.downtown_bias,
                max: 1.0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CityConfiguration::default().validate().is_ok());
    }

    #[test]
    fn rejects_empty_grid() {
        let cfg = CityConfiguration::grid(0, 4, 1);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::EmptyGrid { columns: 0, rows: 4 })
        ));
    }

    #[test]
    fn rejects_oversized_grid() {
        let cfg = CityConfiguration::grid(1024, 1024, 1);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_inverted_and_degenerate_ranges() {
        let cfg = CityConfiguration {
            height: Range::new(50.0, 10.0),
            ..CityConfiguration::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::InvalidRange { field: "height", .. })
        ));

        let cfg = CityConfiguration {
            footprint: Range::new(0.0, 4.0),
            ..CityConfiguration::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = CityConfiguration {
            height: Range::new(f32::NAN, 4.0),
            ..CityConfiguration::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_footprint_wider_than_block() {
        let cfg = CityConfiguration {
            footprint: Range::new(4.0, 20.0),
            ..CityConfiguration::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::FootprintExceedsBlock { .. })
        ));
    }

    #[test]
    fn rejects_unrepresentable_lot_sizes() {
        let huge = CityConfiguration {
            block_size: 1e9,
            street_width: 0.0,
            footprint: Range::new(1.0, 1.0),
            ..CityConfiguration::grid(4, 4, 42)
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigurationError::AboveLimit { field: "block_size", .. })
        ));

        let near_max = CityConfiguration {
            block_size: f32::MAX,
            ..huge.clone()
        };
        assert!(near_max.validate().is_err());

        let tall = CityConfiguration {
            height: Range::new(10.0, 1e7),
            ..CityConfiguration::default()
        };
        assert!(matches!(
            tall.validate(),
            Err(ConfigurationError::AboveLimit { field: "height", .. })
        ));

        // Within the length caps, but the grid rim cannot resolve a 1-unit building.
        let wide = CityConfiguration {
            block_size: 1e5,
            street_width: 1e5,
            footprint: Range::new(1.0, 2.0),
            ..CityConfiguration::grid(256, 256, 42)
        };
        assert!(matches!(
            wide.validate(),
            Err(ConfigurationError::OutOfBounds { field: "footprint", .. })
        ));

        let sliver = CityConfiguration {
            footprint: Range::new(1e-6, 4.0),
            ..CityConfiguration::default()
        };
        assert!(matches!(
            sliver.validate(),
            Err(ConfigurationError::OutOfBounds { field: "footprint", .. })
        ));
    }

    #[test]
    fn largest_accepted_grid_keeps_default_buildings() {
        let cfg = CityConfiguration::grid(MAX_BUILDINGS, 1, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_bias() {
        let cfg = CityConfiguration {
            downtown_bias: 1.5,
            ..CityConfiguration::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn deserializes_partial_json_over_defaults() {
        let cfg: CityConfiguration =
            serde_json::from_str(r#"{"columns":4,"rows":4,"seed":42}"#).unwrap();
        assert_eq!(cfg.columns, 4);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.block_size, CityConfiguration::default().block_size);
        assert_eq!(cfg.height, CityConfiguration::default().height);
    }
}
