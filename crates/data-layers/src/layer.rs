//! Assembled layers and their rendering.

use renderer::palette::presets;
use renderer::{composite_rgb, render_palette, Palette, PixelBuffer, ValueRange};
use serde::Serialize;
use solar_common::{GeoBoundingBox, LayerId, RasterImage, SolarError, SolarResult};

use crate::options::RenderOptions;
use crate::shade::sun_raster;
use crate::urls::HOURLY_SHADE_MONTHS;

/// Annual flux range in kWh/kW/year.
pub const ANNUAL_FLUX_RANGE: (f64, f64) = (0.0, 1800.0);
/// Monthly flux range in kWh/kW/month.
pub const MONTHLY_FLUX_RANGE: (f64, f64) = (0.0, 200.0);

const MONTHS: usize = 12;
const HOURS: usize = 24;

/// Color ramp and end labels shown next to a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub colors: Palette,
    pub min: String,
    pub max: String,
}

impl Legend {
    fn new(anchors: &[&str], min: impl Into<String>, max: impl Into<String>) -> SolarResult<Self> {
        Ok(Self {
            colors: Palette::from_hex(anchors)?,
            min: min.into(),
            max: max.into(),
        })
    }
}

/// Rasters a layer renders from, beyond the mask.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerData {
    Mask,
    Dsm {
        elevation: RasterImage,
        range: ValueRange,
    },
    Rgb {
        imagery: RasterImage,
    },
    AnnualFlux {
        flux: RasterImage,
    },
    MonthlyFlux {
        flux: RasterImage,
    },
    /// One 24-band raster per month, January first.
    HourlyShade {
        months: Vec<RasterImage>,
    },
}

/// A fetched data layer, ready to render any number of times.
///
/// Layers hold every raster they need, so rendering does no I/O and can be
/// repeated with different [`RenderOptions`].
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    bounds: GeoBoundingBox,
    legend: Option<Legend>,
    mask: RasterImage,
    data: LayerData,
}

impl Layer {
    /// Roof mask drawn with the binary palette.
    pub fn mask(mask: RasterImage) -> SolarResult<Self> {
        let legend = Legend::new(presets::BINARY, "No roof", "Roof")?;
        Ok(Self::build(LayerId::Mask, mask, Some(legend), LayerData::Mask))
    }

    /// Surface model drawn with the rainbow palette over its own value range.
    pub fn dsm(mask: RasterImage, elevation: RasterImage) -> SolarResult<Self> {
        let range = ValueRange::of_samples(elevation.band(0)?)?;
        let legend = Legend::new(
            presets::RAINBOW,
            format!("{:.1} m", range.min()),
            format!("{:.1} m", range.max()),
        )?;
        Ok(Self::build(
            LayerId::Dsm,
            mask,
            Some(legend),
            LayerData::Dsm { elevation, range },
        ))
    }

    /// Aerial imagery, composited directly.
    pub fn rgb(mask: RasterImage, imagery: RasterImage) -> SolarResult<Self> {
        require_bands("rgb", &imagery, 3)?;
        Ok(Self::build(LayerId::Rgb, mask, None, LayerData::Rgb { imagery }))
    }

    pub fn annual_flux(mask: RasterImage, flux: RasterImage) -> SolarResult<Self> {
        let legend = Legend::new(presets::IRON, "Shady", "Sunny")?;
        Ok(Self::build(
            LayerId::AnnualFlux,
            mask,
            Some(legend),
            LayerData::AnnualFlux { flux },
        ))
    }

    pub fn monthly_flux(mask: RasterImage, flux: RasterImage) -> SolarResult<Self> {
        require_bands("monthly flux", &flux, MONTHS)?;
        let legend = Legend::new(presets::IRON, "Shady", "Sunny")?;
        Ok(Self::build(
            LayerId::MonthlyFlux,
            mask,
            Some(legend),
            LayerData::MonthlyFlux { flux },
        ))
    }

    pub fn hourly_shade(mask: RasterImage, months: Vec<RasterImage>) -> SolarResult<Self> {
        if months.len() != HOURLY_SHADE_MONTHS {
            return Err(SolarError::invalid_parameter(
                "hourlyShadeUrls",
                format!("expected {} rasters, got {}", HOURLY_SHADE_MONTHS, months.len()),
            ));
        }
        for month in &months {
            require_bands("hourly shade", month, HOURS)?;
        }
        let legend = Legend::new(presets::SUNLIGHT, "Shade", "Sun")?;
        Ok(Self::build(
            LayerId::HourlyShade,
            mask,
            Some(legend),
            LayerData::HourlyShade { months },
        ))
    }

    fn build(id: LayerId, mask: RasterImage, legend: Option<Legend>, data: LayerData) -> Self {
        Self {
            id,
            bounds: mask.bounds(),
            legend,
            mask,
            data,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Geographic extent, taken from the mask.
    pub fn bounds(&self) -> GeoBoundingBox {
        self.bounds
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }

    pub fn mask_raster(&self) -> &RasterImage {
        &self.mask
    }

    pub fn data(&self) -> &LayerData {
        &self.data
    }

    /// Number of images [`render`](Self::render) returns.
    pub fn frame_count(&self) -> usize {
        match self.data {
            LayerData::MonthlyFlux { .. } => MONTHS,
            LayerData::HourlyShade { .. } => HOURS,
            _ => 1,
        }
    }

    /// Draw the layer.
    ///
    /// Returns one image for static layers, twelve (one per month) for
    /// monthly flux and twenty-four (one per hour of `options.day` in
    /// `options.month`) for hourly shade.
    pub fn render(&self, options: &RenderOptions) -> SolarResult<Vec<PixelBuffer>> {
        let mask = options.show_mask_only.then_some(&self.mask);

        match &self.data {
            LayerData::Mask => Ok(vec![render_palette(
                &self.mask,
                self.colors()?,
                ValueRange::unit(),
                mask,
                0,
            )?]),
            LayerData::Dsm { elevation, range } => Ok(vec![render_palette(
                elevation,
                self.colors()?,
                *range,
                mask,
                0,
            )?]),
            LayerData::Rgb { imagery } => Ok(vec![composite_rgb(imagery, mask)?]),
            LayerData::AnnualFlux { flux } => {
                let range = ValueRange::new(ANNUAL_FLUX_RANGE.0, ANNUAL_FLUX_RANGE.1)?;
                Ok(vec![render_palette(flux, self.colors()?, range, mask, 0)?])
            }
            LayerData::MonthlyFlux { flux } => {
                let range = ValueRange::new(MONTHLY_FLUX_RANGE.0, MONTHLY_FLUX_RANGE.1)?;
                let colors = self.colors()?;
                (0..MONTHS)
                    .map(|month| render_palette(flux, colors, range, mask, month))
                    .collect()
            }
            LayerData::HourlyShade { months } => {
                options.validate_date()?;
                let hourly = &months[options.month as usize];
                let colors = self.colors()?;
                (0..HOURS)
                    .map(|hour| {
                        let sun = sun_raster(hourly, hour, options.day)?;
                        render_palette(&sun, colors, ValueRange::unit(), mask, 0)
                    })
                    .collect()
            }
        }
    }

    fn colors(&self) -> SolarResult<&Palette> {
        self.legend.as_ref().map(|l| &l.colors).ok_or_else(|| {
            SolarError::invalid_parameter("layer", format!("{} has no palette", self.id))
        })
    }
}

fn require_bands(what: &str, raster: &RasterImage, bands: usize) -> SolarResult<()> {
    if raster.band_count() < bands {
        return Err(SolarError::decode(format!(
            "{} raster has {} bands, expected {}",
            what,
            raster.band_count(),
            bands
        )));
    }
    Ok(())
}
