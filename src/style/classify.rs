use super::scale::{PARTY_COLORS, RENTER_RADII, SHELTER_COST_COLORS};
use super::{to_fixed, MarkerStyle, Rgb, StyleDescriptor, VectorStyle};
use crate::config::{LayerDescriptor, LayerKind};
use crate::data::{Feature, GeometryFamily};

/// Marker for points in layers without point rules
pub const DEFAULT_MARKER: MarkerStyle = MarkerStyle {
    fill: Rgb::hex(0x747575),
    radius: 6.0,
    label: None,
};

/// Map a feature to its style. Pure: same input, same output.
pub fn classify(feature: &Feature, layer: &LayerDescriptor) -> StyleDescriptor {
    let family = feature.family();

    match (layer.kind, family) {
        (LayerKind::ShelterCost, GeometryFamily::Polygon) => {
            let value = feature.attributes.number(&layer.value_field);
            StyleDescriptor::Vector(VectorStyle {
                stroke: Rgb::hex(0xffffff),
                weight: 1.0,
                opacity: 0.7,
                fill: Some(*SHELTER_COST_COLORS.lookup(value)),
                fill_opacity: 0.8,
            })
        }
        (LayerKind::Boundary, GeometryFamily::Polygon) => StyleDescriptor::Vector(VectorStyle {
            stroke: Rgb::hex(0x000000),
            weight: 2.0,
            opacity: 1.0,
            fill: None,
            fill_opacity: 0.0,
        }),
        (LayerKind::PartyPoints, GeometryFamily::Point) => {
            StyleDescriptor::Marker(party_marker(feature, layer))
        }
        _ => fallback_style(family),
    }
}

fn party_marker(feature: &Feature, layer: &LayerDescriptor) -> MarkerStyle {
    let attrs = &feature.attributes;

    // Codes may arrive as numbers in some exports; compare their text form
    let party = layer
        .party_field
        .as_deref()
        .and_then(|field| attrs.get(field))
        .filter(|value| value.is_truthy())
        .map(|value| value.to_string());
    let fill = *PARTY_COLORS.lookup(party.as_deref());

    let value = attrs.number(&layer.value_field);
    let radius = *RENTER_RADII.lookup(value);
    let label = value.map(|v| format!("{}%", to_fixed(v, 0))).unwrap_or_default();

    MarkerStyle {
        fill,
        radius,
        label: Some(label),
    }
}

/// Style by geometry family alone
fn fallback_style(family: GeometryFamily) -> StyleDescriptor {
    match family {
        GeometryFamily::Point => StyleDescriptor::Marker(DEFAULT_MARKER),
        GeometryFamily::Line => StyleDescriptor::Vector(VectorStyle {
            stroke: Rgb::hex(0xff851b),
            weight: 3.0,
            opacity: 0.9,
            fill: None,
            fill_opacity: 0.0,
        }),
        GeometryFamily::Polygon => StyleDescriptor::Vector(VectorStyle {
            stroke: Rgb::hex(0x2ecc40),
            weight: 1.0,
            opacity: 1.0,
            fill: Some(Rgb::hex(0x2ecc40)),
            fill_opacity: 0.2,
        }),
        GeometryFamily::Other => StyleDescriptor::Vector(VectorStyle {
            stroke: Rgb::hex(0x666666),
            weight: 1.0,
            opacity: 1.0,
            fill: Some(Rgb::hex(0x999999)),
            fill_opacity: 0.3,
        }),
    }
}
