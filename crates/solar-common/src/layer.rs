//! Layer identifiers for the Solar API data layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SolarError;

/// One of the six visualizations that can be derived from a data-layers response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerId {
    /// Roof presence.
    Mask,
    /// Digital surface model (elevation in meters).
    Dsm,
    /// Aerial imagery.
    Rgb,
    /// Annual solar flux (kWh/kW/year).
    AnnualFlux,
    /// Monthly solar flux, one band per month.
    MonthlyFlux,
    /// Hourly shade, one raster per month with per-day bit flags.
    HourlyShade,
}

impl LayerId {
    pub const ALL: [LayerId; 6] = [
        LayerId::Mask,
        LayerId::Dsm,
        LayerId::Rgb,
        LayerId::AnnualFlux,
        LayerId::MonthlyFlux,
        LayerId::HourlyShade,
    ];

    /// Wire name used by clients and the Solar API sample code.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerId::Mask => "mask",
            LayerId::Dsm => "dsm",
            LayerId::Rgb => "rgb",
            LayerId::AnnualFlux => "annualFlux",
            LayerId::MonthlyFlux => "monthlyFlux",
            LayerId::HourlyShade => "hourlyShade",
        }
    }

    /// Comma separated list of every valid id, for error messages.
    pub fn valid_ids() -> String {
        Self::ALL
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Layers that render a sequence of frames meant to be played back.
    pub fn is_animated(&self) -> bool {
        matches!(self, LayerId::MonthlyFlux | LayerId::HourlyShade)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerId {
    type Err = SolarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| SolarError::InvalidLayer {
                requested: s.to_string(),
                valid: Self::valid_ids(),
            })
    }
}
