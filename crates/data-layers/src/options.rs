//! Presentation flags for rendering a layer.

use serde::{Deserialize, Serialize};
use solar_common::{LayerId, SolarError, SolarResult};

/// How a layer should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Make everything outside the building footprint transparent.
    pub show_mask_only: bool,
    /// Month for hourly shade, 0-based (January = 0).
    pub month: u32,
    /// Day of month for hourly shade, 1-based.
    pub day: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_mask_only: false,
            month: 0,
            day: 14,
        }
    }
}

impl RenderOptions {
    /// The presentation a layer opens with.
    ///
    /// Flux and shade layers are masked to the roof; hourly shade starts in
    /// April.
    pub fn defaults_for(id: LayerId) -> Self {
        Self {
            show_mask_only: matches!(
                id,
                LayerId::AnnualFlux | LayerId::MonthlyFlux | LayerId::HourlyShade
            ),
            month: if id == LayerId::HourlyShade { 3 } else { 0 },
            day: 14,
        }
    }

    /// Check `month` and `day` for hourly shade rendering.
    pub fn validate_date(&self) -> SolarResult<()> {
        if self.month > 11 {
            return Err(SolarError::invalid_parameter(
                "month",
                format!("must be 0..=11, got {}", self.month),
            ));
        }
        if !(1..=31).contains(&self.day) {
            return Err(SolarError::invalid_parameter(
                "day",
                format!("must be 1..=31, got {}", self.day),
            ));
        }
        Ok(())
    }
}
