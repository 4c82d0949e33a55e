//! Fidelity tiers: fixed simplification and quantization presets.

use crate::error::PipelineError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Named output fidelity. Each tier maps to a fixed parameter pair so the
/// same tier always produces the same artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FidelityTier {
    /// Tier `1`: keeps nearly every vertex.
    Fine,
    /// Tier `10`.
    #[default]
    Medium,
    /// Tier `100`: smallest output.
    Coarse,
}

/// Parameters a tier resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierParams {
    /// Minimum Visvalingam effective area (square degrees) a point needs to survive.
    pub min_weight: f64,
    /// Number of grid cells per axis in the quantized output.
    pub quantization: u32,
}

const FINE: TierParams = TierParams {
    min_weight: 1e-7,
    quantization: 1_000_000,
};
const MEDIUM: TierParams = TierParams {
    min_weight: 1e-6,
    quantization: 100_000,
};
const COARSE: TierParams = TierParams {
    min_weight: 1e-5,
    quantization: 10_000,
};

impl FidelityTier {
    pub const ALL: [FidelityTier; 3] = [Self::Fine, Self::Medium, Self::Coarse];

    pub fn params(self) -> TierParams {
        match self {
            Self::Fine => FINE,
            Self::Medium => MEDIUM,
            Self::Coarse => COARSE,
        }
    }

    /// Canonical name as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Fine => "1",
            Self::Medium => "10",
            Self::Coarse => "100",
        }
    }
}

impl fmt::Display for FidelityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FidelityTier {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "fine" => Ok(Self::Fine),
            "10" | "medium" => Ok(Self::Medium),
            "100" | "coarse" => Ok(Self::Coarse),
            other => Err(PipelineError::Configuration(format!(
                "unknown fidelity tier '{other}' (expected one of 1, 10, 100)"
            ))),
        }
    }
}

impl Serialize for FidelityTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names_and_aliases() {
        assert_eq!("1".parse::<FidelityTier>().unwrap(), FidelityTier::Fine);
        assert_eq!("medium".parse::<FidelityTier>().unwrap(), FidelityTier::Medium);
        assert_eq!("100".parse::<FidelityTier>().unwrap(), FidelityTier::Coarse);
    }

    #[test]
    fn test_unknown_tier_is_configuration_error() {
        let err = "5".parse::<FidelityTier>().unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(ref m) if m.contains("'5'")));
    }

    #[test]
    fn test_coarser_tiers_drop_more() {
        let [fine, medium, coarse] = FidelityTier::ALL.map(FidelityTier::params);
        assert!(fine.min_weight < medium.min_weight && medium.min_weight < coarse.min_weight);
        assert!(fine.quantization > medium.quantization && medium.quantization > coarse.quantization);
    }
}
