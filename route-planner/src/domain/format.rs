//! Display formatting for addresses, distances and travel times.

use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;

/// Components kept from a geocoded address.
const MAX_ADDRESS_PARTS: usize = 3;

/// Shorten a geocoder's full address for display.
///
/// Brazilian postal codes (`NNNNN-NNN`) are removed, components naming a
/// region or the country are dropped, and the first three remaining
/// components are kept.
///
/// ```
/// use route_planner::domain::format_address;
///
/// let full = "Rua Abreu Sodré, Centro, Maricá, Região Metropolitana do Rio de Janeiro, \
///             Rio de Janeiro, 24900-000, Brasil";
/// assert_eq!(format_address(full), "Rua Abreu Sodré, Centro, Maricá");
/// ```
pub fn format_address(address: &str) -> String {
    let stripped = strip_postal_codes(address);
    let parts: Vec<&str> = stripped
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let kept: Vec<&str> = parts
        .iter()
        .copied()
        .filter(|p| !is_region(p) && !p.eq_ignore_ascii_case("brasil"))
        .collect();

    let chosen = if kept.is_empty() { &parts } else { &kept };
    chosen
        .iter()
        .take(MAX_ADDRESS_PARTS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{5}-\d{3}\b").unwrap());
static REGION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)regi[aã]o").unwrap());

fn is_region(part: &str) -> bool {
    REGION.is_match(part)
}

/// Remove every standalone `NNNNN-NNN` token.
fn strip_postal_codes(s: &str) -> String {
    POSTAL_CODE.replace_all(s, "").trim().to_string()
}

/// `"850 m"` below a kilometre, `"1.2 km"` above.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{} m", meters.round())
    }
}

/// `"25 min"`, `"2h"` or `"1h 5min"`.
pub fn format_travel_time(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    if minutes < 60 {
        return format!("{minutes} min");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest > 0 {
        format!("{hours}h {rest}min")
    } else {
        format!("{hours}h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_drops_postal_code_region_and_country() {
        let full = "Avenida Roberto Silveira, Flamengo, Maricá, Região Geográfica Imediata do Rio de Janeiro, 24900-000, Brasil";
        assert_eq!(
            format_address(full),
            "Avenida Roberto Silveira, Flamengo, Maricá"
        );
    }

    #[test]
    fn address_keeps_short_input() {
        assert_eq!(format_address("Praia de Itaipuaçu"), "Praia de Itaipuaçu");
        assert_eq!(format_address(""), "");
    }

    #[test]
    fn address_falls_back_when_everything_is_filtered() {
        assert_eq!(format_address("Brasil"), "Brasil");
    }

    #[test]
    fn postal_code_must_stand_alone() {
        assert_eq!(strip_postal_codes("X24900-000"), "X24900-000");
        assert_eq!(strip_postal_codes("24900-0001"), "24900-0001");
        assert_eq!(strip_postal_codes("CEP 24900-000"), "CEP");
        assert_eq!(strip_postal_codes("Maricá 24900-000, RJ"), "Maricá , RJ");
    }

    #[test]
    fn region_matches_with_or_without_accent() {
        assert!(is_region("Região Metropolitana do Rio de Janeiro"));
        assert!(is_region("REGIÃO DOS LAGOS"));
        assert!(is_region("Regiao Sudeste"));
        assert!(!is_region("Registro"));
    }

    #[test]
    fn distances() {
        assert_eq!(format_distance(42.4), "42 m");
        assert_eq!(format_distance(999.6), "1000 m");
        assert_eq!(format_distance(1000.0), "1.0 km");
        assert_eq!(format_distance(12_345.0), "12.3 km");
    }

    #[test]
    fn travel_times() {
        assert_eq!(format_travel_time(Duration::minutes(0)), "0 min");
        assert_eq!(format_travel_time(Duration::minutes(59)), "59 min");
        assert_eq!(format_travel_time(Duration::minutes(120)), "2h");
        assert_eq!(format_travel_time(Duration::minutes(65)), "1h 5min");
    }
}
