use crate::data::{AttrValue, Attributes, Feature};
use crate::style::to_fixed;

const NAME_FIELDS: [&str; 2] = ["AREA_NA13", "name"];
const SHELTER_COST_FIELD: &str = "30_pct_plus_inc";
const RENTERS_FIELD: &str = "pct_renters";
const PARTY_FIELDS: [&str; 2] = ["mpp_party", "offices-all_Party"];

/// Popup text for a feature, one line per recognised field.
///
/// Falls back to every attribute as `key: value`.
pub fn select_popup_content(feature: &Feature) -> String {
    let attrs = &feature.attributes;
    let mut lines = Vec::new();

    if let Some(name) = first_truthy(attrs, &NAME_FIELDS) {
        lines.push(name.to_string());
    }

    if let Some(value) = attrs.get(SHELTER_COST_FIELD).filter(|v| !v.is_null()) {
        lines.push(format!(
            "Renter households spending ≥30% of income: {}%",
            one_decimal(value)
        ));
    }

    if let Some(value) = attrs.get(RENTERS_FIELD).filter(|v| !v.is_null()) {
        lines.push(format!("Renter households: {}%", one_decimal(value)));
    }

    if let Some(party) = first_truthy(attrs, &PARTY_FIELDS) {
        lines.push(format!("MPP party: {party}"));
    }

    if lines.is_empty() {
        if attrs.is_empty() {
            return "No attributes".to_string();
        }
        lines = attrs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    }

    lines.join("\n")
}

fn first_truthy<'a>(attrs: &'a Attributes, keys: &[&str]) -> Option<&'a AttrValue> {
    keys.iter()
        .filter_map(|key| attrs.get(key))
        .find(|value| value.is_truthy())
}

/// One decimal place, or the raw value when it is not numeric
fn one_decimal(value: &AttrValue) -> String {
    match value.as_number() {
        Some(n) => to_fixed(n, 1),
        None => value.to_string(),
    }
}
