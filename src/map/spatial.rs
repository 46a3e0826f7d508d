use std::collections::HashMap;

/// Geographic bounding box in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BBox {
    pub fn from_tuple((min_lon, min_lat, max_lon, max_lat): (f64, f64, f64, f64)) -> Self {
        Self { min_lon, min_lat, max_lon, max_lat }
    }

    /// Square box of half-width `radius` around a point
    pub fn around(lon: f64, lat: f64, radius: f64) -> Self {
        Self {
            min_lon: lon - radius,
            min_lat: lat - radius,
            max_lon: lon + radius,
            max_lat: lat + radius,
        }
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }
}

/// Bounding-box index over one layer's features.
/// A feature is filed under every cell its box overlaps, so lookups never
/// miss a feature but may return extra candidates; callers do the exact
/// hit test.
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    boxes: Vec<Option<BBox>>,
    cell_size: f64,
}

impl FeatureGrid {
    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Build from per-feature boxes; `None` marks a feature without geometry
    pub fn build(boxes: impl IntoIterator<Item = Option<BBox>>, cell_size: f64) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
            boxes: boxes.into_iter().collect(),
            cell_size,
        };

        for idx in 0..grid.boxes.len() {
            let Some(bbox) = grid.boxes[idx] else { continue };
            let min_cell = grid.to_cell(bbox.min_lon, bbox.min_lat);
            let max_cell = grid.to_cell(bbox.max_lon, bbox.max_lat);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Indices of features whose box intersects `query`, ascending, no duplicates
    pub fn query(&self, query: &BBox) -> Vec<usize> {
        let min_cell = self.to_cell(query.min_lon, query.min_lat);
        let max_cell = self.to_cell(query.max_lon, query.max_lat);

        let mut results = Vec::new();
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend(
                        indices
                            .iter()
                            .copied()
                            .filter(|&i| self.boxes[i].is_some_and(|b| b.intersects(query))),
                    );
                }
            }
        }
        results.sort_unstable();
        results.dedup();
        results
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_finds_overlapping_boxes_once() {
        let boxes = vec![
            Some(BBox::from_tuple((-79.30, 43.70, -79.10, 43.85))), // spans many cells
            Some(BBox::around(-79.25, 43.77, 0.001)),
            None,
            Some(BBox::around(-80.50, 44.50, 0.001)),
        ];
        let grid = FeatureGrid::build(boxes, 0.01);
        assert_eq!(grid.len(), 4);

        let hits = grid.query(&BBox::around(-79.25, 43.77, 0.002));
        assert_eq!(hits, vec![0, 1]);

        let far = grid.query(&BBox::around(-80.50, 44.50, 0.002));
        assert_eq!(far, vec![3]);
    }

    #[test]
    fn test_empty_grid() {
        let grid = FeatureGrid::build(Vec::new(), 0.01);
        assert!(grid.is_empty());
        assert!(grid.query(&BBox::around(0.0, 0.0, 1.0)).is_empty());
    }
}
