//! Per-layer visibility: user intent AND an optional zoom gate.
//!
//! The coordinator holds state only. Every transition is returned as a
//! [`RenderSignal`] for the caller to apply to whatever draws the layers.

use crate::config::LayerDescriptor;
use std::collections::BTreeMap;
use tracing::debug;

/// Instruction for the renderer after an effective-state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderSignal {
    Add(String),
    Remove(String),
}

/// Visibility inputs for one layer plus the last applied result
#[derive(Debug, Clone, PartialEq)]
pub struct LayerVisibility {
    pub user_enabled: bool,
    /// Always true for layers without a zoom gate
    pub zoom_gate_passed: bool,
    min_zoom: Option<f64>,
    shown: bool,
}

impl LayerVisibility {
    pub fn effective(&self) -> bool {
        self.user_enabled && self.zoom_gate_passed
    }

    /// State last pushed to the renderer
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    fn gate(min_zoom: Option<f64>, zoom: f64) -> bool {
        min_zoom.map_or(true, |min| zoom >= min)
    }
}

/// Visibility state for every loaded layer
#[derive(Debug, Default)]
pub struct VisibilityCoordinator {
    layers: BTreeMap<String, LayerVisibility>,
}

impl VisibilityCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a freshly loaded layer.
    ///
    /// The zoom gate is evaluated against `zoom`, so a gated layer loaded
    /// while zoomed out starts hidden. Registering twice changes nothing.
    pub fn register(&mut self, layer: &LayerDescriptor, zoom: f64) -> Option<RenderSignal> {
        if self.layers.contains_key(&layer.id) {
            debug!(layer = %layer.id, "layer already registered");
            return None;
        }

        self.layers.insert(
            layer.id.clone(),
            LayerVisibility {
                user_enabled: layer.default_visible,
                zoom_gate_passed: LayerVisibility::gate(layer.min_zoom, zoom),
                min_zoom: layer.min_zoom,
                shown: false,
            },
        );
        self.apply(&layer.id)
    }

    /// User switched a layer on or off
    pub fn toggle(&mut self, layer_id: &str, enabled: bool) -> Option<RenderSignal> {
        let Some(state) = self.layers.get_mut(layer_id) else {
            debug!(layer = layer_id, "toggle for unknown layer ignored");
            return None;
        };
        state.user_enabled = enabled;
        self.apply(layer_id)
    }

    /// Map zoom changed; only gated layers are re-evaluated
    pub fn zoom_changed(&mut self, zoom: f64) -> Vec<RenderSignal> {
        let gated: Vec<String> = self
            .layers
            .iter_mut()
            .filter_map(|(id, state)| {
                let min = state.min_zoom?;
                state.zoom_gate_passed = zoom >= min;
                Some(id.clone())
            })
            .collect();

        gated.iter().filter_map(|id| self.apply(id)).collect()
    }

    /// Push the effective state if it differs from what is shown
    fn apply(&mut self, layer_id: &str) -> Option<RenderSignal> {
        let state = self.layers.get_mut(layer_id)?;
        let effective = state.effective();
        if effective == state.shown {
            return None;
        }
        state.shown = effective;

        let signal = if effective {
            RenderSignal::Add(layer_id.to_string())
        } else {
            RenderSignal::Remove(layer_id.to_string())
        };
        debug!(?signal, "visibility changed");
        Some(signal)
    }

    pub fn get(&self, layer_id: &str) -> Option<&LayerVisibility> {
        self.layers.get(layer_id)
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
    }

    /// User intent for a layer; false for layers not loaded
    pub fn user_enabled(&self, layer_id: &str) -> bool {
        self.layers.get(layer_id).is_some_and(|s| s.user_enabled)
    }

    pub fn is_shown(&self, layer_id: &str) -> bool {
        self.layers.get(layer_id).is_some_and(|s| s.shown)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
