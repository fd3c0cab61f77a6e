/// Places types that mark a venue as being in front of a station.
const STATION_TYPES: &[&str] = &["train_station", "subway_station", "transit_station"];

/// Maps Places `types` to a market-power archetype key, when one is implied.
///
/// Roadside, suburban and residential sites cannot be told apart from Places
/// types alone and are left to the caller.
#[must_use]
pub fn infer_archetype(types: &[String]) -> Option<&'static str> {
    if types.iter().any(|t| t == "shopping_mall") {
        return Some("shopping_mall");
    }
    if types.iter().any(|t| STATION_TYPES.contains(&t.as_str())) {
        return Some("station_front");
    }
    None
}
