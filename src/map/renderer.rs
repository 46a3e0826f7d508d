use crate::braille::BrailleCanvas;
use crate::config::LayerDescriptor;
use crate::data::Shape;
use crate::map::geometry::{
    draw_circle, draw_line, draw_thick_line, fill_polygon, point_in_rings, segment_distance,
};
use crate::map::projection::Viewport;
use crate::map::spatial::{BBox, FeatureGrid};
use crate::session::{MapSurface, StyledFeature};
use crate::style::{MarkerStyle, Rgb, StyleDescriptor, VectorStyle};
use glam::DVec2;
use std::collections::HashSet;
use tracing::debug;

/// Screen-pixel marker sizes to braille dots
pub const MARKER_SCALE: f64 = 0.1;

/// Hit tolerance for lines, in dots
const LINE_HIT_PX: f64 = 2.0;

/// Grid query slop around the cursor, in dots (covers the widest marker)
const HIT_SLOP_PX: f64 = 8.0;

/// Index cell size in degrees
const GRID_CELL_DEG: f64 = 0.01;

/// Text drawn over the map at a character position
#[derive(Clone, Debug, PartialEq)]
pub struct MapLabel {
    pub col: u16,
    pub row: u16,
    pub text: String,
    /// Background of the marker under the label
    pub fill: Rgb,
}

/// One rendered frame
pub struct MapFrame {
    pub canvas: BrailleCanvas,
    pub labels: Vec<MapLabel>,
}

struct RenderLayer {
    id: String,
    z_index: i32,
    /// Upload sequence, breaks z-index ties
    seq: usize,
    features: Vec<StyledFeature>,
    grid: FeatureGrid,
}

/// Draws uploaded layers that are currently added to the map
pub struct MapRenderer {
    pub viewport: Viewport,
    layers: Vec<RenderLayer>,
    shown: HashSet<String>,
    next_seq: usize,
}

impl MapRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            layers: Vec::new(),
            shown: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Check if any layer has been uploaded
    pub fn has_data(&self) -> bool {
        !self.layers.is_empty()
    }

    /// Shown layers, bottom to top
    fn shown_layers(&self) -> impl DoubleEndedIterator<Item = &RenderLayer> + '_ {
        self.layers.iter().filter(|layer| self.shown.contains(&layer.id))
    }

    /// Render shown layers onto a canvas of `width` x `height` characters
    pub fn render(&self, width: usize, height: usize) -> MapFrame {
        let mut canvas = BrailleCanvas::new(width, height);
        let mut labels = Vec::new();

        for layer in self.shown_layers() {
            for feature in &layer.features {
                self.draw_shape(&mut canvas, &mut labels, &feature.shape, &feature.style);
            }
        }

        MapFrame { canvas, labels }
    }

    fn draw_shape(&self, canvas: &mut BrailleCanvas, labels: &mut Vec<MapLabel>, shape: &Shape, style: &StyleDescriptor) {
        match (shape, style) {
            (Shape::Points(points), StyleDescriptor::Marker(marker)) => {
                for &(lon, lat) in points {
                    self.draw_marker(canvas, labels, lon, lat, marker);
                }
            }
            (Shape::Points(points), StyleDescriptor::Vector(vector)) => {
                for &(lon, lat) in points {
                    let (px, py) = self.viewport.project(lon, lat);
                    if self.viewport.is_visible(px, py) {
                        draw_circle(canvas, px, py, 1, vector.stroke);
                    }
                }
            }
            (Shape::Lines(lines), StyleDescriptor::Vector(vector)) => {
                for line in lines {
                    self.stroke_path(canvas, line, vector, false);
                }
            }
            (Shape::Polygons(polygons), StyleDescriptor::Vector(vector)) => {
                for rings in polygons {
                    self.draw_polygon(canvas, rings, vector);
                }
            }
            (Shape::Collection(shapes), _) => {
                for child in shapes {
                    self.draw_shape(canvas, labels, child, style);
                }
            }
            // Marker styles only apply to points
            (Shape::Lines(_) | Shape::Polygons(_), StyleDescriptor::Marker(_)) | (Shape::Empty, _) => {}
        }
    }

    fn draw_marker(&self, canvas: &mut BrailleCanvas, labels: &mut Vec<MapLabel>, lon: f64, lat: f64, marker: &MarkerStyle) {
        let (px, py) = self.viewport.project(lon, lat);
        if !self.viewport.is_visible(px, py) {
            return;
        }

        let radius = marker_radius_px(marker);
        draw_circle(canvas, px, py, radius, marker.fill);

        // Center label on the marker (convert braille coords to char coords)
        let Some(text) = marker.label.as_deref().filter(|t| !t.is_empty()) else {
            return;
        };
        if px < 0 || py < 0 {
            return;
        }
        let half = (text.chars().count() / 2) as i32;
        let col = px / 2 - half;
        if col >= 0 {
            labels.push(MapLabel {
                col: col as u16,
                row: (py / 4) as u16,
                text: text.to_string(),
                fill: marker.fill,
            });
        }
    }

    fn project_ring(&self, ring: &[(f64, f64)]) -> Vec<DVec2> {
        ring.iter().map(|&(lon, lat)| self.viewport.project_f(lon, lat)).collect()
    }

    fn draw_polygon(&self, canvas: &mut BrailleCanvas, rings: &[Vec<(f64, f64)>], style: &VectorStyle) {
        let projected: Vec<Vec<DVec2>> = rings.iter().map(|r| self.project_ring(r)).collect();

        // Cull polygons entirely off screen
        let (min, max) = projected.iter().flatten().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        if !self
            .viewport
            .line_might_be_visible((min.x as i32, min.y as i32), (max.x as i32, max.y as i32))
        {
            return;
        }

        fill_polygon(canvas, &projected, style.fill_color(), style.fill_opacity);
        for ring in rings {
            self.stroke_path(canvas, ring, style, true);
        }
    }

    /// Draw a path with viewport culling
    fn stroke_path(&self, canvas: &mut BrailleCanvas, path: &[(f64, f64)], style: &VectorStyle, closed: bool) {
        if path.len() < 2 || style.weight <= 0.0 || style.opacity <= 0.0 {
            return;
        }

        let points: Vec<(i32, i32)> = path
            .iter()
            .map(|&(lon, lat)| self.viewport.project(lon, lat))
            .collect();
        let closing = if closed { Some((points[points.len() - 1], points[0])) } else { None };

        for (p0, p1) in points.windows(2).map(|w| (w[0], w[1])).chain(closing) {
            if !self.viewport.line_might_be_visible(p0, p1) {
                continue;
            }
            if style.weight >= 2.0 {
                draw_thick_line(canvas, p0.0, p0.1, p1.0, p1.1, style.stroke);
            } else {
                draw_line(canvas, p0.0, p0.1, p1.0, p1.1, style.stroke);
            }
        }
    }

    /// Topmost shown feature under a canvas dot
    pub fn feature_at(&self, px: i32, py: i32) -> Option<&StyledFeature> {
        let (lon, lat) = self.viewport.unproject(px, py);
        let tolerance = self.viewport.degrees_per_pixel() * HIT_SLOP_PX;
        let query = BBox::around(lon, lat, tolerance);
        let cursor = DVec2::new(px as f64, py as f64);

        for layer in self.shown_layers().rev() {
            let candidates = layer.grid.query(&query);
            for &idx in candidates.iter().rev() {
                let feature = &layer.features[idx];
                if self.hit(cursor, &feature.shape, &feature.style) {
                    return Some(feature);
                }
            }
        }
        None
    }

    fn hit(&self, cursor: DVec2, shape: &Shape, style: &StyleDescriptor) -> bool {
        match shape {
            Shape::Points(points) => {
                let radius = match style {
                    StyleDescriptor::Marker(marker) => marker_radius_px(marker) as f64,
                    StyleDescriptor::Vector(_) => 1.0,
                };
                points
                    .iter()
                    .any(|&(lon, lat)| self.viewport.project_f(lon, lat).distance(cursor) <= radius + 0.5)
            }
            Shape::Lines(lines) => lines.iter().any(|line| {
                let projected = self.project_ring(line);
                projected
                    .windows(2)
                    .any(|w| segment_distance(cursor, w[0], w[1]) <= LINE_HIT_PX)
            }),
            Shape::Polygons(polygons) => polygons.iter().any(|rings| {
                let projected: Vec<Vec<DVec2>> = rings.iter().map(|r| self.project_ring(r)).collect();
                point_in_rings(cursor, &projected)
            }),
            Shape::Collection(shapes) => shapes.iter().any(|s| self.hit(cursor, s, style)),
            Shape::Empty => false,
        }
    }
}

fn marker_radius_px(marker: &MarkerStyle) -> i32 {
    ((marker.radius * MARKER_SCALE).round() as i32).max(1)
}

impl MapSurface for MapRenderer {
    fn upload(&mut self, layer: &LayerDescriptor, z_index: i32, features: Vec<StyledFeature>) {
        self.layers.retain(|l| l.id != layer.id);

        let grid = FeatureGrid::build(
            features.iter().map(|f| f.shape.bbox().map(BBox::from_tuple)),
            GRID_CELL_DEG,
        );
        let seq = self.next_seq;
        self.next_seq += 1;

        debug!(layer = %layer.id, z_index, features = features.len(), "layer uploaded");
        self.layers.push(RenderLayer {
            id: layer.id.clone(),
            z_index,
            seq,
            features,
            grid,
        });
        self.layers.sort_by_key(|l| (l.z_index, l.seq));
    }

    fn add_layer(&mut self, layer_id: &str) {
        self.shown.insert(layer_id.to_string());
    }

    fn remove_layer(&mut self, layer_id: &str) {
        self.shown.remove(layer_id);
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        self.shown.contains(layer_id)
    }

    fn current_zoom(&self) -> f64 {
        self.viewport.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::style::DEFAULT_MARKER;

    const CENTER: (f64, f64) = (-79.205, 43.765);

    fn renderer() -> MapRenderer {
        // 40x20 characters = 80x80 dots
        MapRenderer::new(Viewport::new(CENTER.0, CENTER.1, 12.0, 80, 80))
    }

    fn square_around(lon: f64, lat: f64, half: f64, style: StyleDescriptor, popup: &str) -> StyledFeature {
        let ring = vec![
            (lon - half, lat - half),
            (lon + half, lat - half),
            (lon + half, lat + half),
            (lon - half, lat + half),
            (lon - half, lat - half),
        ];
        StyledFeature {
            shape: Shape::Polygons(vec![vec![ring]]),
            style,
            popup: popup.to_string(),
        }
    }

    fn fill_style(color: u32) -> StyleDescriptor {
        StyleDescriptor::Vector(VectorStyle {
            stroke: Rgb::hex(0xffffff),
            weight: 1.0,
            opacity: 1.0,
            fill: Some(Rgb::hex(color)),
            fill_opacity: 1.0,
        })
    }

    fn layer(id: &str) -> LayerDescriptor {
        MapConfig::default().layer(id).unwrap().clone()
    }

    #[test]
    fn test_uploaded_layer_hidden_until_added() {
        let mut r = renderer();
        r.upload(&layer("rir"), 200, vec![square_around(CENTER.0, CENTER.1, 0.01, fill_style(0x69399a), "a")]);
        assert!(r.has_data());
        assert!(!r.has_layer("rir"));
        assert!(r.render(40, 20).canvas.rows().flatten().all(|c| c.is_empty()));

        r.add_layer("rir");
        let frame = r.render(40, 20);
        assert_eq!(frame.canvas.cell(20, 10).unwrap().color, Some(Rgb::hex(0x69399a)));

        r.remove_layer("rir");
        assert!(r.render(40, 20).canvas.rows().flatten().all(|c| c.is_empty()));
    }

    #[test]
    fn test_higher_z_index_draws_on_top() {
        let mut r = renderer();
        r.upload(&layer("wards"), 400, vec![square_around(CENTER.0, CENTER.1, 0.01, fill_style(0x00ff00), "top")]);
        r.upload(&layer("rir"), 200, vec![square_around(CENTER.0, CENTER.1, 0.01, fill_style(0x0000ff), "bottom")]);
        r.add_layer("wards");
        r.add_layer("rir");

        let frame = r.render(40, 20);
        assert_eq!(frame.canvas.cell(20, 10).unwrap().color, Some(Rgb::hex(0x00ff00)));
        assert_eq!(r.feature_at(40, 40).map(|f| f.popup.as_str()), Some("top"));

        r.remove_layer("wards");
        assert_eq!(r.feature_at(40, 40).map(|f| f.popup.as_str()), Some("bottom"));
        assert!(r.feature_at(2, 2).is_none());
    }

    #[test]
    fn test_marker_label_is_centred() {
        let mut r = renderer();
        let marker = StyledFeature {
            shape: Shape::Points(vec![CENTER]),
            style: StyleDescriptor::Marker(MarkerStyle {
                fill: Rgb::hex(0xf37021),
                radius: 50.0,
                label: Some("55%".to_string()),
            }),
            popup: "MPP party: NDP".to_string(),
        };
        r.upload(&layer("ward-points"), 400, vec![marker]);
        r.add_layer("ward-points");

        let frame = r.render(40, 20);
        assert_eq!(
            frame.labels,
            vec![MapLabel { col: 19, row: 10, text: "55%".to_string(), fill: Rgb::hex(0xf37021) }]
        );
        assert!(r.feature_at(43, 40).is_some());
        assert!(r.feature_at(60, 40).is_none());
    }

    #[test]
    fn test_reupload_replaces_layer() {
        let mut r = renderer();
        let point = |popup: &str| StyledFeature {
            shape: Shape::Points(vec![CENTER]),
            style: StyleDescriptor::Marker(DEFAULT_MARKER),
            popup: popup.to_string(),
        };
        r.upload(&layer("wards"), 400, vec![point("old")]);
        r.upload(&layer("wards"), 400, vec![point("new")]);
        r.add_layer("wards");
        assert_eq!(r.feature_at(40, 40).map(|f| f.popup.as_str()), Some("new"));
    }

    #[test]
    fn test_current_zoom_follows_viewport() {
        let mut r = renderer();
        assert_eq!(r.current_zoom(), 12.0);
        r.viewport.zoom_in();
        assert_eq!(r.current_zoom(), 13.0);
    }
}
