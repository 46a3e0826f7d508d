mod feature;

pub use feature::{AttrValue, Attributes, Feature, GeometryFamily, LineString, LonLat, Shape};

use crate::config::LayerDescriptor;
use crate::error::LoadError;
use geojson::{GeoJson, Geometry, Position, Value};
use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use tracing::{debug, info};

/// Result of one background layer load
#[derive(Debug)]
pub struct LayerLoad {
    pub layer_id: String,
    pub result: Result<Vec<Feature>, LoadError>,
}

/// Start loading every layer on the rayon pool.
///
/// Each layer sends exactly one message when done; arrival order is
/// whatever order the loads finish in.
pub fn spawn_loads(layers: &[LayerDescriptor], data_dir: &Path) -> Receiver<LayerLoad> {
    let (tx, rx) = mpsc::channel();

    for layer in layers {
        let tx = tx.clone();
        let layer_id = layer.id.clone();
        let path = data_dir.join(&layer.source);

        rayon::spawn(move || {
            debug!(layer = %layer_id, path = %path.display(), "loading layer");
            let result = load_layer(&path);
            // Receiver gone means the app is shutting down
            let _ = tx.send(LayerLoad { layer_id, result });
        });
    }

    rx
}

/// Read a GeoJSON file into features
pub fn load_layer(path: &Path) -> Result<Vec<Feature>, LoadError> {
    let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let json: serde_json::Value =
        simd_json::serde::from_slice(&mut bytes).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let geojson = GeoJson::from_json_value(json).map_err(|source| LoadError::GeoJson {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    let features = features_from_geojson(geojson);
    info!(path = %path.display(), features = features.len(), "loaded GeoJSON");
    Ok(features)
}

/// Flatten any GeoJSON object into features
pub fn features_from_geojson(geojson: GeoJson) -> Vec<Feature> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().map(convert_feature).collect(),
        GeoJson::Feature(f) => vec![convert_feature(f)],
        GeoJson::Geometry(geometry) => vec![Feature::new(convert_geometry(Some(&geometry)), Attributes::new())],
    }
}

fn convert_feature(feature: geojson::Feature) -> Feature {
    let attributes = feature
        .properties
        .iter()
        .flatten()
        .map(|(key, value)| (key.clone(), AttrValue::from(value)))
        .collect();

    Feature::new(convert_geometry(feature.geometry.as_ref()), attributes)
}

fn convert_geometry(geometry: Option<&Geometry>) -> Shape {
    let Some(geometry) = geometry else {
        return Shape::Empty;
    };

    match &geometry.value {
        Value::Point(coords) => Shape::Points(lonlat(coords).into_iter().collect()),
        Value::MultiPoint(points) => Shape::Points(points.iter().filter_map(|p| lonlat(p)).collect()),
        Value::LineString(coords) => Shape::Lines(vec![line(coords)]),
        Value::MultiLineString(lines) => Shape::Lines(lines.iter().map(|l| line(l)).collect()),
        Value::Polygon(rings) => Shape::Polygons(vec![rings.iter().map(|r| line(r)).collect()]),
        Value::MultiPolygon(polygons) => Shape::Polygons(
            polygons
                .iter()
                .map(|rings| rings.iter().map(|r| line(r)).collect())
                .collect(),
        ),
        Value::GeometryCollection(geometries) => {
            Shape::Collection(geometries.iter().map(|g| convert_geometry(Some(g))).collect())
        }
    }
}

fn lonlat(position: &Position) -> Option<LonLat> {
    match position.as_slice() {
        [lon, lat, ..] => Some((*lon, *lat)),
        _ => None,
    }
}

fn line(coords: &[Position]) -> LineString {
    coords.iter().filter_map(lonlat).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const WARDS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "AREA_NA13": "Scarborough North", "pct_above_30": 45.2, "code": null },
                "geometry": { "type": "Polygon", "coordinates": [[[-79.3, 43.8], [-79.2, 43.8], [-79.2, 43.7], [-79.3, 43.8]]] }
            },
            {
                "type": "Feature",
                "properties": { "mpp_renter_pct": "55", "offices-all_Party": "NDP" },
                "geometry": { "type": "Point", "coordinates": [-79.25, 43.77] }
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": null
            }
        ]
    }"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_feature_collection() {
        let file = write_temp(WARDS);
        let features = load_layer(file.path()).unwrap();
        assert_eq!(features.len(), 3);

        assert_eq!(features[0].family(), GeometryFamily::Polygon);
        assert_eq!(features[0].attributes.number("pct_above_30"), Some(45.2));
        assert_eq!(features[0].attributes.get("code"), Some(&AttrValue::Null));
        let keys: Vec<&str> = features[0].attributes.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["AREA_NA13", "pct_above_30", "code"]);

        assert_eq!(features[1].shape, Shape::Points(vec![(-79.25, 43.77)]));
        assert_eq!(features[1].attributes.number("mpp_renter_pct"), Some(55.0));

        assert_eq!(features[2].family(), GeometryFamily::Other);
        assert!(features[2].attributes.is_empty());
    }

    #[test]
    fn test_bare_geometry_becomes_one_feature() {
        let file = write_temp(r#"{ "type": "LineString", "coordinates": [[0, 0], [1, 1]] }"#);
        let features = load_layer(file.path()).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].family(), GeometryFamily::Line);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_layer(Path::new("/definitely/not/here.geojson")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(err.path(), Path::new("/definitely/not/here.geojson"));
    }

    #[test]
    fn test_invalid_json_is_json_error() {
        let file = write_temp("{ not json");
        assert!(matches!(load_layer(file.path()), Err(LoadError::Json { .. })));
    }

    #[test]
    fn test_non_geojson_is_geojson_error() {
        let file = write_temp(r#"{ "type": "Nonsense" }"#);
        assert!(matches!(load_layer(file.path()), Err(LoadError::GeoJson { .. })));
    }

    #[test]
    fn test_spawn_loads_reports_each_layer_independently() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shelter-costs-above-30-pct.geojson"), WARDS).unwrap();

        let mut config = crate::config::MapConfig::default();
        config.layers.retain(|l| l.id == "rir" || l.id == "wards");
        let rx = spawn_loads(&config.layers, dir.path());

        let mut loads: Vec<LayerLoad> = (0..2)
            .map(|_| rx.recv_timeout(Duration::from_secs(10)).unwrap())
            .collect();
        loads.sort_by(|a, b| a.layer_id.cmp(&b.layer_id));

        assert_eq!(loads[0].layer_id, "rir");
        assert_eq!(loads[0].result.as_ref().unwrap().len(), 3);
        assert_eq!(loads[1].layer_id, "wards");
        assert!(loads[1].result.is_err());
    }
}
