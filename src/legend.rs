//! Legend model built from the classification tables.
//!
//! `build_legend` is a pure function of the configuration and the current
//! visibility state. Callers rebuild the whole legend after any change.

use crate::config::{LayerDescriptor, LayerKind};
use crate::style::{Rgb, PARTY_COLORS, RENTER_RADII, SHELTER_COST_COLORS};
use crate::visibility::VisibilityCoordinator;

pub const PARTY_CAPTION: &str =
    "Circle colour = MPP party; circle size & number = % of households that rent.";

/// Checkbox bound to a layer's user intent
#[derive(Debug, Clone, PartialEq)]
pub struct LegendToggle {
    pub layer_id: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegendKey {
    Swatch(Rgb),
    /// Marker diameter in screen pixels
    Size(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: &'static str,
    pub key: LegendKey,
}

/// Legend block for one loaded layer
#[derive(Debug, Clone, PartialEq)]
pub struct LegendSection {
    pub toggle: LegendToggle,
    pub caption: Option<&'static str>,
    pub entries: Vec<LegendEntry>,
}

impl LegendSection {
    pub fn swatches(&self) -> impl Iterator<Item = (&'static str, Rgb)> + '_ {
        self.entries.iter().filter_map(|e| match e.key {
            LegendKey::Swatch(color) => Some((e.label, color)),
            LegendKey::Size(_) => None,
        })
    }

    pub fn sizes(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().filter_map(|e| match e.key {
            LegendKey::Size(diameter) => Some((e.label, diameter)),
            LegendKey::Swatch(_) => None,
        })
    }
}

/// One section per loaded layer, in configuration order
pub fn build_legend(layers: &[LayerDescriptor], visibility: &VisibilityCoordinator) -> Vec<LegendSection> {
    layers
        .iter()
        .filter(|layer| visibility.contains(&layer.id))
        .map(|layer| section_for(layer, visibility.user_enabled(&layer.id)))
        .collect()
}

fn section_for(layer: &LayerDescriptor, checked: bool) -> LegendSection {
    let toggle = LegendToggle {
        layer_id: layer.id.clone(),
        label: layer.name.clone(),
        checked,
    };

    let (caption, entries) = match layer.kind {
        LayerKind::ShelterCost => (None, shelter_cost_entries()),
        LayerKind::PartyPoints => (Some(PARTY_CAPTION), party_entries()),
        LayerKind::Boundary | LayerKind::Plain => (None, Vec::new()),
    };

    LegendSection { toggle, caption, entries }
}

fn shelter_cost_entries() -> Vec<LegendEntry> {
    SHELTER_COST_COLORS
        .rows
        .iter()
        .map(|row| LegendEntry {
            label: row.label,
            key: LegendKey::Swatch(row.output),
        })
        .collect()
}

fn party_entries() -> Vec<LegendEntry> {
    let colors = PARTY_COLORS.entries.iter().map(|entry| LegendEntry {
        label: entry.label,
        key: LegendKey::Swatch(entry.output),
    });
    let sizes = RENTER_RADII.rows.iter().map(|row| LegendEntry {
        label: row.label,
        key: LegendKey::Size(row.output * 2.0),
    });
    colors.chain(sizes).collect()
}
