// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio quality tiers requested by users.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Requested audio quality, lowest to highest.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Quality {
    #[default]
    #[strum(to_string = "standard", serialize = "low")]
    Standard,
    #[strum(to_string = "high")]
    High,
    #[strum(to_string = "lossless")]
    Lossless,
    #[strum(to_string = "hires")]
    HiRes,
}

impl Quality {
    /// Parses a quality token; `low` is an alias for `standard`.
    pub fn parse(token: &str) -> Option<Self> {
        token.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_qualities_parse() {
        for q in ["hires", "lossless", "high", "standard"] {
            let parsed = Quality::parse(q).expect("valid quality");
            assert_eq!(parsed.to_string(), q);
        }
        assert_eq!(Quality::parse("HiRes"), Some(Quality::HiRes));
    }

    #[test]
    fn low_maps_to_standard() {
        assert_eq!(Quality::parse("low"), Some(Quality::Standard));
    }

    #[test]
    fn invalid_qualities_rejected() {
        for q in ["invalid", "unknown", ""] {
            assert_eq!(Quality::parse(q), None, "{q:?}");
        }
    }

    #[test]
    fn ordering_is_low_to_high() {
        assert!(Quality::Standard < Quality::High);
        assert!(Quality::Lossless < Quality::HiRes);
    }
}
