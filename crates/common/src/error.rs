/// Rejected city or texture parameters.
///
/// Raised before any state is mutated: a renderer that receives one keeps
/// drawing its previous city and atlas.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("city grid must be at least 1x1, got {columns}x{rows}")]
    EmptyGrid { columns: u32, rows: u32 },
    #[error("city grid {columns}x{rows} exceeds the {max} building limit")]
    GridTooLarge { columns: u32, rows: u32, max: u32 },
    #[error("texture count must be in 1..={max}, got {count}")]
    InvalidTextureCount { count: u32, max: u32 },
    #[error("a city needs at least one texture to index")]
    ZeroTextureCount,
    #[error("texture size must be a power of two in {min}..={max}, got {size}")]
    InvalidTextureSize { size: u32, min: u32, max: u32 },
    #[error("{field}: invalid range [{min}, {max}]")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{field} must be a finite value >= {min}, got {value}")]
    OutOfBounds {
        field: &'static str,
        value: f32,
        min: f32,
    },
    #[error("{field} must be at most {max}, got {value}")]
    AboveLimit {
        field: &'static str,
        value: f32,
        max: f32,
    },
    #[error("building footprint up to {footprint} does not fit a {block} block")]
    FootprintExceedsBlock { footprint: f32, block: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let e = ConfigurationError::EmptyGrid {
            columns: 0,
            rows: 3,
        };
        assert!(e.to_string().contains("0x3"));

        let e = ConfigurationError::InvalidTextureCount { count: 0, max: 256 };
        assert!(e.to_string().contains("got 0"));

        let e = ConfigurationError::AboveLimit {
            field: "block_size",
            value: 1e9,
            max: 1e5,
        };
        assert!(e.to_string().starts_with("block_size must be at most"));
    }
}
