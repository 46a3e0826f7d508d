use crate::ui;
use ratatui::layout::Rect;
use std::sync::mpsc::Receiver;
use tracing::debug;
use tui_choropleth::config::MapConfig;
use tui_choropleth::data::LayerLoad;
use tui_choropleth::map::{MapRenderer, Viewport};
use tui_choropleth::session::MapSession;

/// Application state
pub struct App {
    pub session: MapSession,
    pub map_renderer: MapRenderer,
    pub should_quit: bool,
    /// Text of the open popup, if any
    pub popup: Option<String>,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Whether the current left press has moved (drag, not click)
    dragged: bool,
    /// Inner map rectangle in terminal cells
    map_area: Rect,
}

impl App {
    pub fn new(config: MapConfig, width: u16, height: u16) -> Self {
        let viewport = Viewport::new(
            config.initial_center.lon,
            config.initial_center.lat,
            config.initial_zoom.round(),
            0,
            0,
        )
        .with_zoom_range(config.min_zoom, config.max_zoom);

        let mut app = Self {
            session: MapSession::new(config),
            map_renderer: MapRenderer::new(viewport),
            should_quit: false,
            popup: None,
            last_mouse: None,
            dragged: false,
            map_area: Rect::default(),
        };
        app.resize(width, height);
        app
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.map_area = ui::map_inner(Rect::new(0, 0, width, height));
        // Braille gives 2x4 resolution per character
        self.map_renderer.viewport.width = self.map_area.width as usize * 2;
        self.map_renderer.viewport.height = self.map_area.height as usize * 4;
    }

    /// Hand every finished background load to the session
    pub fn drain_loads(&mut self, loads: &Receiver<LayerLoad>) -> usize {
        let mut count = 0;
        while let Ok(load) = loads.try_recv() {
            self.session.on_layer_loaded(load, &mut self.map_renderer);
            count += 1;
        }
        count
    }

    /// Notify the session if the integer zoom moved away from `before`
    fn after_zoom(&mut self, before: f64) {
        let zoom = self.map_renderer.viewport.zoom;
        if zoom != before {
            debug!(from = before, to = zoom, "zoom changed");
            self.session.on_zoom(zoom, &mut self.map_renderer);
        }
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.map_renderer.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        let before = self.map_renderer.viewport.zoom;
        self.map_renderer.viewport.zoom_in();
        self.after_zoom(before);
    }

    pub fn zoom_out(&mut self) {
        let before = self.map_renderer.viewport.zoom;
        self.map_renderer.viewport.zoom_out();
        self.after_zoom(before);
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let Some((px, py)) = self.screen_to_dot(col, row) else {
            return;
        };
        let before = self.map_renderer.viewport.zoom;
        self.map_renderer.viewport.zoom_in_at(px, py);
        self.after_zoom(before);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let Some((px, py)) = self.screen_to_dot(col, row) else {
            return;
        };
        let before = self.map_renderer.viewport.zoom;
        self.map_renderer.viewport.zoom_out_at(px, py);
        self.after_zoom(before);
    }

    /// Back to the configured center and zoom
    pub fn reset_view(&mut self) {
        let config = self.session.config();
        let (lon, lat, zoom) = (
            config.initial_center.lon,
            config.initial_center.lat,
            config.initial_zoom,
        );
        let before = self.map_renderer.viewport.zoom;
        self.map_renderer.viewport.set_view(lon, lat, zoom);
        self.after_zoom(before);
    }

    /// Flip the n-th legend checkbox (0-based)
    pub fn toggle_layer(&mut self, index: usize) {
        self.session.toggle_legend_entry(index, &mut self.map_renderer);
    }

    /// Open the popup of the feature under a screen cell, or close it
    pub fn click(&mut self, col: u16, row: u16) {
        self.popup = self
            .screen_to_dot(col, row)
            .and_then(|(px, py)| self.map_renderer.feature_at(px, py))
            .map(|feature| feature.popup.clone());
    }

    /// Esc closes the popup first, then quits
    pub fn escape(&mut self) {
        if self.popup.take().is_none() {
            self.quit();
        }
    }

    pub fn press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((x, y));
    }

    /// Mouse released: a press without movement is a click
    pub fn release(&mut self, col: u16, row: u16) {
        if self.last_mouse.is_some() && !self.dragged {
            self.click(col, row);
        }
        self.last_mouse = None;
        self.dragged = false;
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Centre of the dot block under a terminal cell, if it is on the map
    fn screen_to_dot(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        if col < area.x || row < area.y || col >= area.x + area.width || row >= area.y + area.height {
            return None;
        }
        let px = (col - area.x) as i32 * 2 + 1;
        let py = (row - area.y) as i32 * 4 + 2;
        Some((px, py))
    }

    pub fn zoom_level(&self) -> String {
        format!("z{:.0}", self.map_renderer.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let vp = &self.map_renderer.viewport;
        format!(
            "{:.3}°{}, {:.3}°{}",
            vp.center_lat.abs(),
            if vp.center_lat >= 0.0 { "N" } else { "S" },
            vp.center_lon.abs(),
            if vp.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// "loading 2 | failed 1", empty when everything arrived
    pub fn load_status(&self) -> String {
        let pending = self.session.pending_count();
        let failed = self.session.failed_layers().len();
        let mut parts = Vec::new();
        if pending > 0 {
            parts.push(format!("loading {pending}"));
        }
        if failed > 0 {
            parts.push(format!("failed {failed}"));
        }
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tui_choropleth::data::{AttrValue, Attributes, Feature, Shape};
    use tui_choropleth::session::MapSurface;

    fn ward_point() -> Feature {
        let attrs: Attributes = [
            ("mpp_renter_pct", AttrValue::Number(45.0)),
            ("offices-all_Party", AttrValue::Text("PC".to_string())),
            ("mpp_party", AttrValue::Text("PC".to_string())),
        ]
        .into_iter()
        .collect();
        Feature::new(Shape::Points(vec![(-79.205, 43.765)]), attrs)
    }

    fn app_with_loads(config: MapConfig, loads: Vec<LayerLoad>) -> App {
        let mut app = App::new(config, 120, 40);
        let (tx, rx) = mpsc::channel();
        let sent = loads.len();
        for load in loads {
            tx.send(load).unwrap();
        }
        assert_eq!(app.drain_loads(&rx), sent);
        app
    }

    #[test]
    fn test_zoom_out_hides_gated_layer() {
        let load = LayerLoad {
            layer_id: "ward-points".to_string(),
            result: Ok(vec![ward_point()]),
        };
        let mut app = app_with_loads(MapConfig::default(), vec![load]);
        assert!(app.map_renderer.has_layer("ward-points"));

        app.zoom_out();
        assert_eq!(app.map_renderer.viewport.zoom, 11.0);
        assert!(!app.map_renderer.has_layer("ward-points"));

        // Clamped at min zoom: no change, no event
        app.zoom_out();
        assert!(!app.map_renderer.has_layer("ward-points"));

        app.reset_view();
        assert!(app.map_renderer.has_layer("ward-points"));
    }

    #[test]
    fn test_click_opens_popup_and_escape_closes_it() {
        let load = LayerLoad {
            layer_id: "ward-points".to_string(),
            result: Ok(vec![ward_point()]),
        };
        let mut app = app_with_loads(MapConfig::default(), vec![load]);

        // Viewport center sits under the middle of the map area
        let inner = app.map_area;
        let col = inner.x + inner.width / 2;
        let row = inner.y + inner.height / 2;
        app.press(col, row);
        app.release(col, row);
        assert_eq!(app.popup.as_deref(), Some("MPP party: PC"));

        app.escape();
        assert!(app.popup.is_none());
        assert!(!app.should_quit);
        app.escape();
        assert!(app.should_quit);
    }

    #[test]
    fn test_drag_does_not_click() {
        let mut app = App::new(MapConfig::default(), 120, 40);
        let before = app.map_renderer.viewport.center_lon;
        app.press(50, 20);
        app.handle_drag(45, 20);
        app.release(45, 20);
        assert!(app.popup.is_none());
        assert!(app.map_renderer.viewport.center_lon > before);
    }

    #[test]
    fn test_load_status() {
        let app = App::new(MapConfig::default(), 120, 40);
        assert_eq!(app.load_status(), "loading 3");
    }
}
