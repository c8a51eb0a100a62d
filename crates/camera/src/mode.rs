use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Camera behaviour. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AutocamMode {
    /// User is steering; no autonomous update.
    Manual,
    /// Autocam switched off; behaves exactly like `Manual`.
    #[default]
    Off,
    /// Circle the city at a fixed radius and height, looking at the centre.
    Orbit,
    /// Follow a figure-eight path low over the rooftops.
    FlyThrough,
    /// Wander with smooth random turns, staying over the city.
    RandomWalk,
    /// Hover above the centre and turn in place.
    Spin,
}

impl AutocamMode {
    pub const ALL: [AutocamMode; 6] = [
        Self::Manual,
        Self::Off,
        Self::Orbit,
        Self::FlyThrough,
        Self::RandomWalk,
        Self::Spin,
    ];

    /// Modes that move the camera by themselves.
    pub const AUTONOMOUS: [AutocamMode; 4] =
        [Self::Orbit, Self::FlyThrough, Self::RandomWalk, Self::Spin];

    /// Mode entered by the first toggle when none was used before.
    pub const DEFAULT_AUTONOMOUS: AutocamMode = Self::Orbit;

    pub fn is_autonomous(self) -> bool {
        !matches!(self, Self::Manual | Self::Off)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Off => "Off",
            Self::Orbit => "Orbit",
            Self::FlyThrough => "Fly through",
            Self::RandomWalk => "Random walk",
            Self::Spin => "Spin",
        }
    }

    /// Stable lowercase identifier, accepted by [`FromStr`].
    pub fn slug(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Off => "off",
            Self::Orbit => "orbit",
            Self::FlyThrough => "fly-through",
            Self::RandomWalk => "random-walk",
            Self::Spin => "spin",
        }
    }
}

impl fmt::Display for AutocamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown autocam mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for AutocamMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|m| m.slug().replace('-', "") == wanted)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_and_manual_are_not_autonomous() {
        assert!(!AutocamMode::Off.is_autonomous());
        assert!(!AutocamMode::Manual.is_autonomous());
        for m in AutocamMode::AUTONOMOUS {
            assert!(m.is_autonomous());
        }
    }

    #[test]
    fn parses_slugs_and_display_names() {
        for m in AutocamMode::ALL {
            assert_eq!(m.slug().parse::<AutocamMode>().unwrap(), m);
            assert_eq!(m.name().parse::<AutocamMode>().unwrap(), m);
        }
        assert_eq!("FlyThrough".parse::<AutocamMode>().unwrap(), AutocamMode::FlyThrough);
        assert!("hover".parse::<AutocamMode>().is_err());
    }

    #[test]
    fn every_mode_has_a_distinct_name() {
        let names: std::collections::HashSet<_> =
            AutocamMode::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), AutocamMode::ALL.len());
    }
}
