use std::fmt;

/// A lon/lat coordinate
pub type LonLat = (f64, f64);

/// A ring or line of coordinates
pub type LineString = Vec<LonLat>;

/// Geometry kinds the classification rules distinguish
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryFamily {
    Point,
    Line,
    Polygon,
    /// Geometry collections and features without geometry
    Other,
}

/// Feature geometry in lon/lat, grouped by family
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Points(Vec<LonLat>),
    Lines(Vec<LineString>),
    /// Each polygon is a list of rings, exterior first
    Polygons(Vec<Vec<LineString>>),
    Collection(Vec<Shape>),
    Empty,
}

impl Shape {
    pub fn family(&self) -> GeometryFamily {
        match self {
            Shape::Points(_) => GeometryFamily::Point,
            Shape::Lines(_) => GeometryFamily::Line,
            Shape::Polygons(_) => GeometryFamily::Polygon,
            Shape::Collection(_) | Shape::Empty => GeometryFamily::Other,
        }
    }

    /// Bounding box as (min_lon, min_lat, max_lon, max_lat)
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        self.for_each_coord(&mut |(lon, lat)| {
            bounds = Some(match bounds {
                None => (lon, lat, lon, lat),
                Some((a, b, c, d)) => (a.min(lon), b.min(lat), c.max(lon), d.max(lat)),
            });
        });
        bounds
    }

    fn for_each_coord(&self, f: &mut impl FnMut(LonLat)) {
        match self {
            Shape::Points(points) => points.iter().copied().for_each(&mut *f),
            Shape::Lines(lines) => lines.iter().flatten().copied().for_each(&mut *f),
            Shape::Polygons(polys) => polys.iter().flatten().flatten().copied().for_each(&mut *f),
            Shape::Collection(shapes) => {
                for shape in shapes {
                    shape.for_each_coord(f);
                }
            }
            Shape::Empty => {}
        }
    }
}

/// Scalar attribute value
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// Numeric reading of the value.
    ///
    /// Text is trimmed and parsed; empty text, null, booleans and
    /// non-finite numbers are not numeric.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            AttrValue::Number(n) => *n,
            AttrValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                s.parse::<f64>().ok()?
            }
            AttrValue::Null | AttrValue::Bool(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Whether the value counts as "set" for display purposes
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Null => false,
            AttrValue::Bool(b) => *b,
            AttrValue::Number(n) => *n != 0.0 && !n.is_nan(),
            AttrValue::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => f.write_str("null"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            AttrValue::Number(n) => write!(f, "{n}"),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&serde_json::Value> for AttrValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttrValue::Null,
            serde_json::Value::Bool(b) => AttrValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(AttrValue::Number).unwrap_or(AttrValue::Null),
            serde_json::Value::String(s) => AttrValue::Text(s.clone()),
            // Nested values are kept as their JSON text
            other => AttrValue::Text(other.to_string()),
        }
    }
}

/// Feature attributes in source order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes(Vec<(String, AttrValue)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AttrValue) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Numeric reading of `key`, `None` when missing or not numeric
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttrValue::as_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, AttrValue)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

/// One geographic feature, read-only once loaded
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub shape: Shape,
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(shape: Shape, attributes: Attributes) -> Self {
        Self { shape, attributes }
    }

    pub fn family(&self) -> GeometryFamily {
        self.shape.family()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_coercion() {
        assert_eq!(AttrValue::Number(45.0).as_number(), Some(45.0));
        assert_eq!(AttrValue::Text(" 31.6 ".into()).as_number(), Some(31.6));
        assert_eq!(AttrValue::Text("".into()).as_number(), None);
        assert_eq!(AttrValue::Text("n/a".into()).as_number(), None);
        assert_eq!(AttrValue::Text("NaN".into()).as_number(), None);
        assert_eq!(AttrValue::Null.as_number(), None);
        assert_eq!(AttrValue::Bool(true).as_number(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!AttrValue::Null.is_truthy());
        assert!(!AttrValue::Text(String::new()).is_truthy());
        assert!(!AttrValue::Number(0.0).is_truthy());
        assert!(AttrValue::Text("Ward 21".into()).is_truthy());
    }

    #[test]
    fn test_display_drops_integer_fraction() {
        assert_eq!(AttrValue::Number(45.0).to_string(), "45");
        assert_eq!(AttrValue::Number(31.6).to_string(), "31.6");
        assert_eq!(AttrValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_attributes_keep_source_order() {
        let attrs: Attributes = [
            ("b", AttrValue::Number(1.0)),
            ("a", AttrValue::Number(2.0)),
            ("b", AttrValue::Number(3.0)),
        ]
        .into_iter()
        .collect();
        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(attrs.number("b"), Some(3.0));
    }

    #[test]
    fn test_shape_bbox_and_family() {
        let shape = Shape::Polygons(vec![vec![vec![(0.0, 0.0), (2.0, 1.0), (1.0, 3.0)]]]);
        assert_eq!(shape.family(), GeometryFamily::Polygon);
        assert_eq!(shape.bbox(), Some((0.0, 0.0, 2.0, 3.0)));
        assert_eq!(Shape::Empty.bbox(), None);
    }
}
