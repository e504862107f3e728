//! Writing rendered frames and the layer manifest to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use data_layers::{Layer, Legend, RenderOptions};
use renderer::PixelBuffer;
use serde::Serialize;
use solar_common::{GeoBoundingBox, LayerId};
use tracing::{debug, info};

/// Name of the manifest written next to the frames.
pub const MANIFEST_FILE: &str = "layer.json";

/// Contents of `layer.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerManifest {
    pub id: LayerId,
    pub bounds: GeoBoundingBox,
    pub animated: bool,
    pub options: RenderOptions,
    /// Frame file names in render order.
    pub frames: Vec<String>,
    pub legend: Option<LegendManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendManifest {
    /// `#rrggbb` per palette entry.
    pub colors: Vec<String>,
    pub min: String,
    pub max: String,
}

impl From<&Legend> for LegendManifest {
    fn from(legend: &Legend) -> Self {
        Self {
            colors: legend.colors.colors().iter().map(|c| c.to_hex()).collect(),
            min: legend.min.clone(),
            max: legend.max.clone(),
        }
    }
}

/// `frame_00.png`, `frame_01.png`, ...
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:02}.png", index)
}

/// Write every frame as PNG plus `layer.json` into `dir`, creating it if needed.
pub fn write_layer(
    dir: &Path,
    layer: &Layer,
    options: &RenderOptions,
    frames: &[PixelBuffer],
) -> Result<LayerManifest> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut names = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let name = frame_file_name(index);
        let png = frame
            .to_png()
            .with_context(|| format!("Failed to encode frame {}", index))?;
        let path = dir.join(&name);
        std::fs::write(&path, &png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(file = %name, size = png.len(), "Wrote frame");
        names.push(name);
    }

    let manifest = LayerManifest {
        id: layer.id(),
        bounds: layer.bounds(),
        animated: layer.id().is_animated(),
        options: *options,
        frames: names,
        legend: layer.legend().map(LegendManifest::from),
    };

    let path: PathBuf = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(
        dir = %dir.display(),
        frames = manifest.frames.len(),
        "Wrote layer"
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_common::RasterImage;

    fn mask_layer() -> Layer {
        let bounds = GeoBoundingBox::new(37.4221, 37.4217, -122.0839, -122.0843).unwrap();
        let mask = RasterImage::new(2, 2, vec![vec![0.0, 1.0, 1.0, 0.0]], bounds).unwrap();
        Layer::mask(mask).unwrap()
    }

    #[test]
    fn test_frame_file_names() {
        assert_eq!(frame_file_name(0), "frame_00.png");
        assert_eq!(frame_file_name(23), "frame_23.png");
    }

    #[test]
    fn test_write_layer() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("mask");
        let layer = mask_layer();
        let options = RenderOptions::defaults_for(LayerId::Mask);
        let frames = layer.render(&options).unwrap();

        let manifest = write_layer(&out, &layer, &options, &frames).unwrap();
        assert_eq!(manifest.frames, vec!["frame_00.png".to_string()]);
        assert!(!manifest.animated);

        let png = std::fs::read(out.join("frame_00.png")).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(json["id"], "mask");
        assert_eq!(json["bounds"]["north"], 37.4221);
        assert_eq!(json["options"]["showMaskOnly"], false);

        let legend = &json["legend"];
        assert_eq!(legend["min"], "No roof");
        assert_eq!(legend["max"], "Roof");
        assert_eq!(legend["colors"].as_array().unwrap().len(), 256);
        assert!(legend["colors"][0].as_str().unwrap().starts_with('#'));
    }
}
