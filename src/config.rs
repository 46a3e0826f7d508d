//! Static map configuration: view bounds, render panes and the layer list.
//!
//! The default configuration is compiled in. A TOML file with the same
//! shape can replace it at startup; nothing changes it afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// z-index for layers without a pane
pub const OVERLAY_Z_INDEX: i32 = 400;

/// Deepest supported zoom; beyond it projected pixels leave the i32 range
pub const ZOOM_LIMIT: f64 = 22.0;

/// Which encoding rules apply to a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Choropleth of shelter-cost burden
    ShelterCost,
    /// Outline-only administrative boundaries
    Boundary,
    /// Party-colored markers sized by renter share
    PartyPoints,
    /// Style by geometry only
    #[default]
    Plain,
}

/// One configured dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: String,
    pub name: String,
    /// Data file, relative to the data directory
    pub source: PathBuf,
    #[serde(default)]
    pub kind: LayerKind,
    /// Attribute driving numeric classification
    pub value_field: String,
    /// Attribute holding the party code
    #[serde(default)]
    pub party_field: Option<String>,
    #[serde(default)]
    pub pane: Option<String>,
    /// Layer is hidden below this zoom level
    #[serde(default)]
    pub min_zoom: Option<f64>,
    #[serde(default = "default_true")]
    pub default_visible: bool,
}

fn default_true() -> bool {
    true
}

/// Named draw-order slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pane {
    pub name: String,
    pub z_index: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

/// Everything the map needs at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub title: String,
    pub initial_center: Center,
    pub initial_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    #[serde(default)]
    pub panes: Vec<Pane>,
    pub layers: Vec<LayerDescriptor>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no layers configured")]
    NoLayers,
    #[error("duplicate layer id `{0}`")]
    DuplicateLayer(String),
    #[error("max_zoom {0} is above the supported limit of 22")]
    MaxZoomTooDeep(f64),
    #[error("min_zoom {min} is above max_zoom {max}")]
    ZoomRange { min: f64, max: f64 },
    #[error("layer `{layer}` refers to unknown pane `{pane}`")]
    UnknownPane { layer: String, pane: String },
}

impl Default for MapConfig {
    fn default() -> Self {
        let pane = |name: &str, z_index| Pane { name: name.to_string(), z_index };

        Self {
            title: "Renter Housing Cost Burden".to_string(),
            initial_center: Center { lat: 43.765, lon: -79.205 },
            initial_zoom: 12.0,
            min_zoom: 11.0,
            max_zoom: 19.0,
            panes: vec![
                pane("rirPane", 200),
                pane("wardPane", 300),
                pane("rentersPane", 400),
                pane("mppPane", 450),
            ],
            layers: vec![
                LayerDescriptor {
                    id: "ward-points".to_string(),
                    name: "MPP Parties".to_string(),
                    source: PathBuf::from("ward-points.geojson"),
                    kind: LayerKind::PartyPoints,
                    value_field: "mpp_renter_pct".to_string(),
                    party_field: Some("offices-all_Party".to_string()),
                    pane: Some("rentersPane".to_string()),
                    min_zoom: Some(12.0),
                    default_visible: true,
                },
                LayerDescriptor {
                    id: "wards".to_string(),
                    name: "Wards".to_string(),
                    source: PathBuf::from("percent-renters_poly.geojson"),
                    kind: LayerKind::Boundary,
                    value_field: "AREA_NA13".to_string(),
                    party_field: None,
                    pane: None,
                    min_zoom: None,
                    default_visible: true,
                },
                LayerDescriptor {
                    id: "rir".to_string(),
                    name: "Renter Households Spending 30%+ on Shelter".to_string(),
                    source: PathBuf::from("shelter-costs-above-30-pct.geojson"),
                    kind: LayerKind::ShelterCost,
                    value_field: "pct_above_30".to_string(),
                    party_field: None,
                    pane: Some("rirPane".to_string()),
                    min_zoom: None,
                    default_visible: true,
                },
            ],
        }
    }
}

impl MapConfig {
    /// Read and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: MapConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.layers.is_empty() {
            return Err(ConfigError::NoLayers);
        }
        if self.max_zoom.is_nan() || self.max_zoom > ZOOM_LIMIT {
            return Err(ConfigError::MaxZoomTooDeep(self.max_zoom));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::ZoomRange { min: self.min_zoom, max: self.max_zoom });
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id.as_str()) {
                return Err(ConfigError::DuplicateLayer(layer.id.clone()));
            }
            if let Some(pane) = &layer.pane {
                if !self.panes.iter().any(|p| &p.name == pane) {
                    return Err(ConfigError::UnknownPane {
                        layer: layer.id.clone(),
                        pane: pane.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn layer(&self, id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Draw order for a layer: its pane's z-index, or the overlay default
    pub fn z_index(&self, layer: &LayerDescriptor) -> i32 {
        layer
            .pane
            .as_deref()
            .and_then(|name| self.panes.iter().find(|p| p.name == name))
            .map(|p| p.z_index)
            .unwrap_or(OVERLAY_Z_INDEX)
    }
}
