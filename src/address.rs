// 🏠 Address Display - human-readable composite used in messages and as match key

/// Shown when every address part is blank
pub const UNKNOWN_ADDRESS: &str = "Unknown address";

/// Build "{street}, {city}, {state} {zip}" with blank parts dropped
///
/// The unit suffix (" Unit {unit}") is appended last, even to
/// `Unknown address`. Callers pass trimmed values.
pub fn build_address_display(street: &str, city: &str, state: &str, zip: &str, unit: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !street.is_empty() {
        parts.push(street.to_string());
    }

    let city_state = [city, state]
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    let city_state_zip = if zip.is_empty() {
        city_state
    } else {
        format!("{} {}", city_state, zip).trim().to_string()
    };
    if !city_state_zip.is_empty() {
        parts.push(city_state_zip);
    }

    let mut result = parts.join(", ");
    if result.trim().is_empty() {
        result = UNKNOWN_ADDRESS.to_string();
    }
    if !unit.is_empty() {
        result.push_str(" Unit ");
        result.push_str(unit);
    }
    result
}
