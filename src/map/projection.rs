use crate::config::ZOOM_LIMIT;
use glam::DVec2;
use std::f64::consts::PI;

/// Braille pixels per Web-Mercator tile edge
pub const TILE_SIZE: f64 = 64.0;

const MAX_LAT: f64 = 85.0;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Integer zoom level, as in slippy-map tiles
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Normalized Web-Mercator position in [0, 1]²
fn mercator(lon: f64, lat: f64) -> DVec2 {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    DVec2::new(
        (lon + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

fn inverse_mercator(p: DVec2) -> (f64, f64) {
    let lon = p.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * p.y)).sinh().atan().to_degrees();
    (lon, lat)
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            min_zoom: 0.0,
            max_zoom: ZOOM_LIMIT,
            width,
            height,
        }
    }

    /// Restrict zoom to `[min, max]`, clamping the current level
    pub fn with_zoom_range(mut self, min: f64, max: f64) -> Self {
        self.min_zoom = min;
        self.max_zoom = max;
        self.zoom = self.zoom.clamp(min, max);
        self
    }

    /// World size in pixels at the current zoom
    fn scale(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    fn center_px(&self) -> DVec2 {
        mercator(self.center_lon, self.center_lat) * self.scale()
    }

    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64) / 2.0
    }

    /// Jump to a center and zoom
    pub fn set_view(&mut self, lon: f64, lat: f64, zoom: f64) {
        self.center_lon = lon;
        self.center_lat = lat.clamp(-MAX_LAT, MAX_LAT);
        self.zoom = zoom.round().clamp(self.min_zoom, self.max_zoom);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let target = self.center_px() + DVec2::new(dx as f64, dy as f64);
        let (lon, lat) = inverse_mercator(target / self.scale());

        // Wrap longitude
        self.center_lon = if lon > 180.0 {
            lon - 360.0
        } else if lon < -180.0 {
            lon + 360.0
        } else {
            lon
        };
        self.center_lat = lat.clamp(-MAX_LAT, MAX_LAT);
    }

    /// Zoom in one level
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1.0).min(self.max_zoom);
    }

    /// Zoom out one level
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - 1.0).max(self.min_zoom);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -1.0);
    }

    /// Change zoom by `delta` levels, keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let new_zoom = (self.zoom + delta).clamp(self.min_zoom, self.max_zoom);
        if new_zoom == self.zoom {
            return;
        }

        let (lon, lat) = self.unproject(px, py);
        self.zoom = new_zoom;

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let world = DVec2::new(px as f64, py as f64) - self.half_size() + self.center_px();
        inverse_mercator(world / self.scale())
    }

    /// Project to sub-pixel screen coordinates
    pub fn project_f(&self, lon: f64, lat: f64) -> DVec2 {
        mercator(lon, lat) * self.scale() - self.center_px() + self.half_size()
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = self.project_f(lon, lat).round();
        (p.x as i32, p.y as i32)
    }

    /// Degrees of longitude covered by one pixel
    pub fn degrees_per_pixel(&self) -> f64 {
        360.0 / self.scale()
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10
            && px < self.width as i32 + 10
            && py >= -10
            && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0
            && min_x < self.width as i32
            && max_y >= 0
            && min_y < self.height as i32
    }
}
