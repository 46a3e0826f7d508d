//! Map session: the context object tying loads, visibility and the legend
//! to a drawing surface.

use crate::config::{LayerDescriptor, MapConfig};
use crate::data::{Feature, LayerLoad, Shape};
use crate::legend::{build_legend, LegendSection};
use crate::popup::select_popup_content;
use crate::style::{classify, StyleDescriptor};
use crate::visibility::{RenderSignal, VisibilityCoordinator};
use tracing::{debug, info, warn};

/// A feature ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct StyledFeature {
    pub shape: Shape,
    pub style: StyleDescriptor,
    pub popup: String,
}

/// Whatever draws the layers
pub trait MapSurface {
    /// Hand over a loaded layer; it stays hidden until `add_layer`
    fn upload(&mut self, layer: &LayerDescriptor, z_index: i32, features: Vec<StyledFeature>);
    fn add_layer(&mut self, layer_id: &str);
    fn remove_layer(&mut self, layer_id: &str);
    fn has_layer(&self, layer_id: &str) -> bool;
    fn current_zoom(&self) -> f64;
}

/// Classify every feature of a layer and attach its popup text
pub fn style_features(features: Vec<Feature>, layer: &LayerDescriptor) -> Vec<StyledFeature> {
    features
        .into_iter()
        .map(|feature| StyledFeature {
            style: classify(&feature, layer),
            popup: select_popup_content(&feature),
            shape: feature.shape,
        })
        .collect()
}

/// A layer whose data source failed
#[derive(Debug, Clone, PartialEq)]
pub struct FailedLayer {
    pub layer_id: String,
    pub reason: String,
}

pub struct MapSession {
    config: MapConfig,
    visibility: VisibilityCoordinator,
    failed: Vec<FailedLayer>,
}

impl MapSession {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            visibility: VisibilityCoordinator::new(),
            failed: Vec::new(),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.config.layers
    }

    pub fn visibility(&self) -> &VisibilityCoordinator {
        &self.visibility
    }

    pub fn failed_layers(&self) -> &[FailedLayer] {
        &self.failed
    }

    /// Layers still waiting on their data source
    pub fn pending_count(&self) -> usize {
        self.config
            .layers
            .iter()
            .filter(|layer| !self.visibility.contains(&layer.id) && !self.is_failed(&layer.id))
            .count()
    }

    fn is_failed(&self, layer_id: &str) -> bool {
        self.failed.iter().any(|f| f.layer_id == layer_id)
    }

    /// A layer's data arrived (or failed)
    pub fn on_layer_loaded(&mut self, load: LayerLoad, surface: &mut impl MapSurface) {
        let LayerLoad { layer_id, result } = load;

        let Some(layer) = self.config.layer(&layer_id) else {
            warn!(layer = %layer_id, "data arrived for unconfigured layer");
            return;
        };
        if self.visibility.contains(&layer_id) || self.is_failed(&layer_id) {
            debug!(layer = %layer_id, "duplicate load ignored");
            return;
        }

        match result {
            Ok(features) => {
                info!(layer = %layer_id, features = features.len(), "layer loaded");
                let styled = style_features(features, layer);
                surface.upload(layer, self.config.z_index(layer), styled);

                if let Some(signal) = self.visibility.register(layer, surface.current_zoom()) {
                    apply_signal(surface, &signal);
                }
            }
            Err(err) => {
                warn!(layer = %layer_id, error = %err, "layer failed to load");
                self.failed.push(FailedLayer {
                    layer_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    /// User switched a layer's checkbox
    pub fn on_toggle(&mut self, layer_id: &str, enabled: bool, surface: &mut impl MapSurface) {
        if let Some(signal) = self.visibility.toggle(layer_id, enabled) {
            apply_signal(surface, &signal);
        }
    }

    /// Flip the checkbox of the n-th legend section (0-based)
    pub fn toggle_legend_entry(&mut self, index: usize, surface: &mut impl MapSurface) {
        let Some(section) = self.legend().into_iter().nth(index) else {
            return;
        };
        self.on_toggle(&section.toggle.layer_id, !section.toggle.checked, surface);
    }

    /// Surface zoom level changed
    pub fn on_zoom(&mut self, zoom: f64, surface: &mut impl MapSurface) {
        for signal in self.visibility.zoom_changed(zoom) {
            apply_signal(surface, &signal);
        }
    }

    pub fn legend(&self) -> Vec<LegendSection> {
        build_legend(&self.config.layers, &self.visibility)
    }
}

fn apply_signal(surface: &mut impl MapSurface, signal: &RenderSignal) {
    match signal {
        RenderSignal::Add(id) => {
            if !surface.has_layer(id) {
                surface.add_layer(id);
            }
        }
        RenderSignal::Remove(id) => {
            if surface.has_layer(id) {
                surface.remove_layer(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AttrValue, Attributes};
    use crate::error::LoadError;
    use std::collections::HashSet;
    use std::path::PathBuf;

    /// Records every call made by the session
    #[derive(Default)]
    struct RecordingSurface {
        zoom: f64,
        uploaded: Vec<(String, i32, usize)>,
        shown: HashSet<String>,
        calls: Vec<String>,
    }

    impl RecordingSurface {
        fn at_zoom(zoom: f64) -> Self {
            Self { zoom, ..Default::default() }
        }
    }

    impl MapSurface for RecordingSurface {
        fn upload(&mut self, layer: &LayerDescriptor, z_index: i32, features: Vec<StyledFeature>) {
            self.uploaded.push((layer.id.clone(), z_index, features.len()));
        }
        fn add_layer(&mut self, layer_id: &str) {
            self.shown.insert(layer_id.to_string());
            self.calls.push(format!("add {layer_id}"));
        }
        fn remove_layer(&mut self, layer_id: &str) {
            self.shown.remove(layer_id);
            self.calls.push(format!("remove {layer_id}"));
        }
        fn has_layer(&self, layer_id: &str) -> bool {
            self.shown.contains(layer_id)
        }
        fn current_zoom(&self) -> f64 {
            self.zoom
        }
    }

    fn point(pct: f64, party: &str) -> Feature {
        let attrs: Attributes = [
            ("mpp_renter_pct", AttrValue::Number(pct)),
            ("offices-all_Party", AttrValue::Text(party.to_string())),
        ]
        .into_iter()
        .collect();
        Feature::new(Shape::Points(vec![(-79.2, 43.77)]), attrs)
    }

    fn ok(layer_id: &str, features: Vec<Feature>) -> LayerLoad {
        LayerLoad {
            layer_id: layer_id.to_string(),
            result: Ok(features),
        }
    }

    fn failed(layer_id: &str) -> LayerLoad {
        LayerLoad {
            layer_id: layer_id.to_string(),
            result: Err(LoadError::Io {
                path: PathBuf::from("missing.geojson"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
        }
    }

    #[test]
    fn test_gated_layer_appears_after_zoom_in() {
        let mut session = MapSession::new(MapConfig::default());
        let mut surface = RecordingSurface::at_zoom(11.0);

        session.on_layer_loaded(ok("ward-points", vec![point(55.0, "NDP")]), &mut surface);
        assert_eq!(surface.uploaded, vec![("ward-points".to_string(), 400, 1)]);
        assert!(surface.calls.is_empty());

        surface.zoom = 12.0;
        session.on_zoom(12.0, &mut surface);
        session.on_zoom(12.0, &mut surface);
        assert_eq!(surface.calls, vec!["add ward-points"]);
    }

    #[test]
    fn test_failed_layer_has_no_legend_and_no_upload() {
        let mut session = MapSession::new(MapConfig::default());
        let mut surface = RecordingSurface::at_zoom(12.0);

        session.on_layer_loaded(failed("rir"), &mut surface);
        session.on_layer_loaded(ok("wards", Vec::new()), &mut surface);

        assert_eq!(session.failed_layers().len(), 1);
        assert_eq!(session.failed_layers()[0].layer_id, "rir");
        assert_eq!(
            session.failed_layers()[0].reason,
            "failed to read missing.geojson: not found"
        );
        assert_eq!(surface.uploaded.len(), 1);
        assert_eq!(surface.calls, vec!["add wards"]);

        let legend = session.legend();
        assert_eq!(legend.len(), 1);
        assert_eq!(legend[0].toggle.layer_id, "wards");
        assert_eq!(session.pending_count(), 1);
    }

    #[test]
    fn test_toggle_twice_sends_one_signal() {
        let mut session = MapSession::new(MapConfig::default());
        let mut surface = RecordingSurface::at_zoom(12.0);
        session.on_layer_loaded(ok("wards", Vec::new()), &mut surface);

        session.on_toggle("wards", false, &mut surface);
        session.on_toggle("wards", false, &mut surface);
        assert_eq!(surface.calls, vec!["add wards", "remove wards"]);
        assert!(!session.legend()[0].toggle.checked);
    }

    #[test]
    fn test_toggle_legend_entry_flips_checkbox() {
        let mut session = MapSession::new(MapConfig::default());
        let mut surface = RecordingSurface::at_zoom(12.0);
        session.on_layer_loaded(ok("rir", Vec::new()), &mut surface);
        session.on_layer_loaded(ok("wards", Vec::new()), &mut surface);

        // Legend order is config order: wards, rir
        session.toggle_legend_entry(1, &mut surface);
        assert!(!surface.has_layer("rir"));
        assert!(surface.has_layer("wards"));

        session.toggle_legend_entry(1, &mut surface);
        assert!(surface.has_layer("rir"));

        // Out of range does nothing
        session.toggle_legend_entry(7, &mut surface);
        assert_eq!(surface.calls.len(), 4);
    }

    #[test]
    fn test_duplicate_and_unknown_loads_are_ignored() {
        let mut session = MapSession::new(MapConfig::default());
        let mut surface = RecordingSurface::at_zoom(12.0);

        session.on_layer_loaded(ok("wards", Vec::new()), &mut surface);
        session.on_layer_loaded(ok("wards", Vec::new()), &mut surface);
        session.on_layer_loaded(ok("nope", Vec::new()), &mut surface);

        assert_eq!(surface.uploaded.len(), 1);
        assert_eq!(session.legend().len(), 1);
    }

    #[test]
    fn test_style_features_classifies_and_builds_popups() {
        let config = MapConfig::default();
        let layer = config.layer("ward-points").unwrap();
        let styled = style_features(vec![point(55.0, "NDP")], layer);
        let marker = styled[0].style.as_marker().unwrap();
        assert_eq!(marker.radius, 50.0);
        assert_eq!(styled[0].popup, "MPP party: NDP");
    }
}
