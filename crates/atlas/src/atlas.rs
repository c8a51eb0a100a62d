use cityscape_common::{ConfigurationError, Fingerprint, SplitMix64};
use serde::{Deserialize, Serialize};

use crate::facade::{FacadeImage, FacadeStyle};

/// Upper bound on atlas layers; matches the default GPU texture-array limit.
pub const MAX_TEXTURES: u32 = 256;
pub const MIN_TEXTURE_SIZE: u32 = 16;
pub const MAX_TEXTURE_SIZE: u32 = 1024;

/// Atlas parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Number of facade textures.
    pub count: u32,
    /// Edge length of each texture in pixels (power of two).
    pub size: u32,
    /// Base seed; combined with the revision so each regeneration differs.
    pub seed: u64,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            count: 8,
            size: 128,
            seed: 42,
        }
    }
}

impl AtlasConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.count == 0 || self.count > MAX_TEXTURES {
            return Err(ConfigurationError::InvalidTextureCount {
                count: self.count,
                max: MAX_TEXTURES,
            });
        }
        if !self.size.is_power_of_two()
            || !(MIN_TEXTURE_SIZE..=MAX_TEXTURE_SIZE).contains(&self.size)
        {
            return Err(ConfigurationError::InvalidTextureSize {
                size: self.size,
                min: MIN_TEXTURE_SIZE,
                max: MAX_TEXTURE_SIZE,
            });
        }
        Ok(())
    }
}

/// An immutable set of facade textures.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureAtlas {
    revision: u64,
    size: u32,
    images: Vec<FacadeImage>,
}

impl TextureAtlas {
    /// Synthesize an atlas. Pure: same config and revision, same pixels.
    pub fn synthesize(config: &AtlasConfig, revision: u64) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let _span =
            tracing::debug_span!("synthesize_atlas", count = config.count, revision).entered();

        let images = (0..config.count)
            .map(|index| {
                let mut rng = SplitMix64::keyed(config.seed, &[revision, index as u64]);
                // Cycle styles so small atlases still show every layout.
                let style = FacadeStyle::ALL[index as usize % FacadeStyle::ALL.len()];
                FacadeImage::synthesize(config.size, style, &mut rng)
            })
            .collect();

        Ok(Self {
            revision,
            size: config.size,
            images,
        })
    }

    /// Number of textures. Building texture indices must be below this.
    pub fn len(&self) -> u32 {
        self.images.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Edge length of every image in pixels.
    pub fn texture_size(&self) -> u32 {
        self.size
    }

    pub fn images(&self) -> &[FacadeImage] {
        &self.images
    }

    /// Fingerprint over every pixel of every layer.
    pub fn fingerprint(&self) -> u64 {
        let mut fp = Fingerprint::new();
        fp.write_u64(self.size as u64);
        for image in &self.images {
            fp.write(image.pixels());
        }
        fp.finish()
    }
}

/// Owns the atlas parameters and hands out fresh atlases on demand.
///
/// Regenerating with an unchanged count keeps every existing building
/// texture index valid. Changing the count requires the city to be
/// regenerated before the new atlas is drawn.
#[derive(Debug, Clone)]
pub struct TextureAtlasManager {
    config: AtlasConfig,
    revision: u64,
}

impl TextureAtlasManager {
    pub fn new(config: AtlasConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            config,
            revision: 0,
        })
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn count(&self) -> u32 {
        self.config.count
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The atlas for the current revision, without advancing it.
    pub fn current(&self) -> Result<TextureAtlas, ConfigurationError> {
        TextureAtlas::synthesize(&self.config, self.revision)
    }

    /// Produce a new atlas with fresh variations.
    ///
    /// `count` of `None` keeps the current count. On error the manager is
    /// left unchanged.
    pub fn regenerate(&mut self, count: Option<u32>) -> Result<TextureAtlas, ConfigurationError> {
        let config = AtlasConfig {
            count: count.unwrap_or(self.config.count),
            ..self.config
        };
        let revision = self.revision + 1;
        let atlas = TextureAtlas::synthesize(&config, revision)?;

        if config.count != self.config.count {
            tracing::info!(
                old = self.config.count,
                new = config.count,
                "texture count changed; city must be regenerated"
            );
        }
        tracing::info!(count = config.count, revision, "regenerated texture atlas");

        self.config = config;
        self.revision = revision;
        Ok(atlas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> AtlasConfig {
        AtlasConfig {
            count: 4,
            size: 32,
            seed: 7,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AtlasConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_and_oversized_counts() {
        let zero = AtlasConfig { count: 0, ..small() };
        assert!(matches!(
            zero.validate(),
            Err(ConfigurationError::InvalidTextureCount { count: 0, .. })
        ));
        let huge = AtlasConfig {
            count: MAX_TEXTURES + 1,
            ..small()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn rejects_bad_texture_sizes() {
        for size in [0, 8, 48, 2048] {
            let cfg = AtlasConfig { size, ..small() };
            assert!(
                matches!(
                    cfg.validate(),
                    Err(ConfigurationError::InvalidTextureSize { .. })
                ),
                "size {size} accepted"
            );
        }
    }

    #[test]
    fn synthesis_is_deterministic() {
        let a = TextureAtlas::synthesize(&small(), 3).unwrap();
        let b = TextureAtlas::synthesize(&small(), 3).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a, b);
    }

    #[test]
    fn atlas_has_requested_shape() {
        let atlas = TextureAtlas::synthesize(&small(), 0).unwrap();
        assert_eq!(atlas.len(), 4);
        assert_eq!(atlas.texture_size(), 32);
        assert!(atlas.images().iter().all(|img| img.size() == 32));
    }

    #[test]
    fn small_atlas_shows_every_style() {
        let atlas = TextureAtlas::synthesize(&AtlasConfig { count: 3, ..small() }, 0).unwrap();
        for style in FacadeStyle::ALL {
            assert!(atlas.images().iter().any(|img| img.style() == style));
        }
    }

    #[test]
    fn regenerate_produces_new_variations_at_same_count() {
        let mut mgr = TextureAtlasManager::new(small()).unwrap();
        let first = mgr.current().unwrap();
        let second = mgr.regenerate(None).unwrap();
        assert_eq!(second.len(), first.len());
        assert_eq!(second.revision(), 1);
        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn regenerate_with_new_count() {
        let mut mgr = TextureAtlasManager::new(small()).unwrap();
        let atlas = mgr.regenerate(Some(5)).unwrap();
        assert_eq!(atlas.len(), 5);
        assert_eq!(mgr.count(), 5);
    }

    #[test]
    fn failed_regenerate_leaves_manager_untouched() {
        let mut mgr = TextureAtlasManager::new(small()).unwrap();
        assert!(mgr.regenerate(Some(0)).is_err());
        assert_eq!(mgr.count(), 4);
        assert_eq!(mgr.revision(), 0);
    }
}
