//! Quality tiers and the capture parameters they resolve to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named capture quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// 720p at 30 fps.
    Standard,
    /// 1080p at 60 fps.
    #[default]
    High,
    /// 2160p at 60 fps.
    Ultra,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [Self::Standard, Self::High, Self::Ultra];

    /// Parse a tier name. Any name other than the exact lowercase tier names
    /// maps to [`QualityTier::High`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "standard" => Self::Standard,
            "ultra" => Self::Ultra,
            _ => Self::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }

    /// Human-readable label for settings lists.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Standard (720p)",
            Self::High => "High (1080p)",
            Self::Ultra => "Ultra (4K)",
        }
    }

    pub fn profile(&self) -> QualityProfile {
        resolve(*self)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete capture parameters for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualityProfile {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl fmt::Display for QualityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.frame_rate)
    }
}

/// Resolve a tier to its capture parameters.
pub fn resolve(tier: QualityTier) -> QualityProfile {
    match tier {
        QualityTier::Standard => QualityProfile {
            width: 1280,
            height: 720,
            frame_rate: 30,
        },
        QualityTier::High => QualityProfile {
            width: 1920,
            height: 1080,
            frame_rate: 60,
        },
        QualityTier::Ultra => QualityProfile {
            width: 3840,
            height: 2160,
            frame_rate: 60,
        },
    }
}

/// Resolve a tier given by name; total over all strings.
pub fn resolve_named(name: &str) -> QualityProfile {
    resolve(QualityTier::from_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixed_profiles() {
        assert_eq!(resolve(QualityTier::Standard).to_string(), "1280x720@30");
        assert_eq!(resolve(QualityTier::High).to_string(), "1920x1080@60");
        assert_eq!(resolve(QualityTier::Ultra).to_string(), "3840x2160@60");
    }

    #[test]
    fn near_miss_names_fall_back_to_high() {
        assert_eq!(QualityTier::from_name("Ultra"), QualityTier::High);
        assert_eq!(QualityTier::from_name(" standard"), QualityTier::High);
        assert_eq!(resolve_named("4k"), resolve(QualityTier::High));
    }

    #[test]
    fn names_round_trip() {
        for tier in QualityTier::ALL {
            assert_eq!(QualityTier::from_name(tier.as_str()), tier);
            assert_eq!(resolve_named(tier.as_str()), resolve(tier));
        }
    }

    proptest! {
        #[test]
        fn unknown_names_resolve_to_high(name in "\\PC*") {
            let known = ["standard", "high", "ultra"];
            prop_assume!(!known.contains(&name.as_str()));
            prop_assert_eq!(resolve_named(&name), resolve(QualityTier::High));
        }
    }
}
