use crate::braille::BrailleCanvas;
use crate::style::Rgb;
use glam::DVec2;

/// Ordered-dither thresholds for one braille cell (2x4 dots), in eighths
const DITHER: [[u8; 4]; 2] = [[0, 4, 2, 6], [5, 1, 7, 3]];

/// Whether a dot is lit at the given coverage in [0, 1]
#[inline]
pub fn dither_on(x: i32, y: i32, coverage: f64) -> bool {
    let threshold = DITHER[x.rem_euclid(2) as usize][y.rem_euclid(4) as usize] as f64;
    coverage * 8.0 > threshold
}

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y, color);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a thicker line (strokes of weight 2 and up)
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) {
    draw_line(canvas, x0, y0, x1, y1, color);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1, color);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1, color);
}

/// Draw a filled circle
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32, color: Rgb) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy, color);
            }
        }
    }
}

/// Scanline fill of a polygon (even-odd rule across all rings),
/// lighting dots by ordered dither at `coverage`.
/// Only rows and columns inside the canvas are visited.
pub fn fill_polygon(canvas: &mut BrailleCanvas, rings: &[Vec<DVec2>], color: Rgb, coverage: f64) {
    if coverage <= 0.0 {
        return;
    }

    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    if !min_y.is_finite() {
        return;
    }

    let width = canvas.pixel_width() as i32;
    let y_start = (min_y.floor() as i32).max(0);
    let y_end = (max_y.ceil() as i32).min(canvas.pixel_height() as i32 - 1);

    let mut crossings: Vec<f64> = Vec::new();
    for y in y_start..=y_end {
        // Sample at the dot center
        let sy = y as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            let mut prev = ring[ring.len() - 1];
            for &cur in ring {
                if (prev.y <= sy) != (cur.y <= sy) {
                    let t = (sy - prev.y) / (cur.y - prev.y);
                    crossings.push(prev.x + t * (cur.x - prev.x));
                }
                prev = cur;
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for span in crossings.chunks_exact(2) {
            let x_start = ((span[0] - 0.5).ceil() as i32).max(0);
            let x_end = ((span[1] - 0.5).floor() as i32).min(width - 1);
            for x in x_start..=x_end {
                if dither_on(x, y, coverage) {
                    canvas.set_pixel_signed(x, y, color);
                }
            }
        }
    }
}

/// Even-odd point-in-polygon test across rings
pub fn point_in_rings(point: DVec2, rings: &[Vec<DVec2>]) -> bool {
    let mut inside = false;
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let mut prev = ring[ring.len() - 1];
        for &cur in ring {
            if (prev.y <= point.y) != (cur.y <= point.y) {
                let t = (point.y - prev.y) / (cur.y - prev.y);
                if point.x < prev.x + t * (cur.x - prev.x) {
                    inside = !inside;
                }
            }
            prev = cur;
        }
    }
    inside
}

/// Distance from a point to a segment
pub fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
