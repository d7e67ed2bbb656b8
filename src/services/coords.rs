//! Coordinate text parsing.
//!
//! Source tables carry coordinates in several shapes: plain decimal degrees
//! (sometimes with a comma decimal separator), degree-minute-second text
//! (`1°16'N`, `103-50E`, `51 57 00 N`), decimal with a hemisphere suffix
//! (`4.05 E`), and longitudes on a 0–360° scale. Everything normalizes to
//! signed decimal degrees, longitude in [-180, 180].

use once_cell::sync::Lazy;
use regex::Regex;

static DMS_COMPACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(\d+)[\-\s°]?(\d+)?(?:[\-\s']?(\d+(?:\.\d+)?))?\s*([NSEW])\s*$"#)
        .expect("DMS compact regex")
});

static DMS_SYMBOL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(\d+)\s*°\s*(\d+)?\s*'?\s*(?:(\d+(?:\.\d+)?)\s*"?)?\s*([NSEW])\s*$"#)
        .expect("DMS symbol regex")
});

static HEMISPHERE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*([0-9.+\-: °'"/]+)\s*([NSEW])\s*$"#).expect("hemisphere regex")
});

/// Parse degree-minute-second text into signed decimal degrees.
///
/// Accepts `1°16'N`, `103-50E`, `51 57 12.5 N` and similar. Returns `None`
/// when the text does not look like DMS at all.
pub fn parse_dms(token: &str) -> Option<f64> {
    let s = token
        .trim()
        .to_uppercase()
        .replace('º', "°")
        .replace('’', "'")
        .replace('”', "\"");
    let caps = DMS_COMPACT.captures(&s).or_else(|| DMS_SYMBOL.captures(&s))?;

    let deg: f64 = caps.get(1)?.as_str().parse().ok()?;
    let mins: f64 = caps
        .get(2)
        .map(|m| m.as_str().parse().unwrap_or(0.0))
        .unwrap_or(0.0);
    let secs: f64 = caps
        .get(3)
        .map(|m| m.as_str().parse().unwrap_or(0.0))
        .unwrap_or(0.0);
    let hemi = caps.get(4)?.as_str();

    let dec = deg + mins / 60.0 + secs / 3600.0;
    Some(if hemi == "S" || hemi == "W" { -dec } else { dec })
}

/// Parse a coordinate in any supported text form into decimal degrees.
///
/// Tries hemisphere-suffixed decimal, DMS, then plain decimal. Returns
/// `None` for empty or unparseable text — callers decide whether that is
/// a dropped row or a hard error.
pub fn parse_coordinate(val: &str) -> Option<f64> {
    let s = val.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = HEMISPHERE_SUFFIX.captures(s) {
        let num = caps.get(1)?.as_str();
        let hemi = caps.get(2)?.as_str().to_uppercase();
        // Dash- and space-separated DMS ("103-50E", "51 57 30 N") also land
        // in this branch, so a failed plain-decimal parse falls through to
        // the DMS parser instead of rejecting the value.
        let d = if num.contains('°') || num.contains('\'') {
            parse_dms(&format!("{}{}", num, hemi))
        } else {
            num.trim()
                .parse::<f64>()
                .ok()
                .or_else(|| parse_dms(&format!("{}{}", num, hemi)))
        }?;
        return Some(if hemi == "S" || hemi == "W" {
            -d.abs()
        } else {
            d.abs()
        });
    }

    if s.contains('°') || s.contains('\'') {
        return parse_dms(s);
    }

    s.parse::<f64>().ok()
}

/// Parse a gazetteer coordinate cell: decimal with a possible comma decimal
/// separator (`51,95`), falling back to DMS.
pub fn parse_gazetteer_coordinate(val: &str) -> Option<f64> {
    static COMMA_DECIMAL: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(\d),(\d)").expect("comma decimal regex"));
    let s = COMMA_DECIMAL.replace_all(val.trim(), "${1}.${2}").to_string();
    s.parse::<f64>().ok().or_else(|| parse_dms(&s))
}

/// Wrap a 0–360° longitude into [-180, 180]. Values below -180 are invalid.
pub fn normalize_lon_360(lon: f64) -> Option<f64> {
    if lon > 180.0 {
        Some(lon - 360.0)
    } else if lon < -180.0 {
        None
    } else {
        Some(lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_parse_dms_symbol_form() {
        assert!(close(parse_dms("1°16'N").unwrap(), 1.0 + 16.0 / 60.0));
        assert!(close(parse_dms("103°50'E").unwrap(), 103.0 + 50.0 / 60.0));
    }

    #[test]
    fn test_parse_dms_dash_form() {
        assert!(close(parse_dms("103-50E").unwrap(), 103.8333));
        assert!(close(parse_dms("51-57S").unwrap(), -51.95));
    }

    #[test]
    fn test_parse_dms_with_seconds() {
        assert!(close(
            parse_dms("51 57 30 N").unwrap(),
            51.0 + 57.0 / 60.0 + 30.0 / 3600.0
        ));
    }

    #[test]
    fn test_parse_dms_rejects_plain_decimal() {
        assert_eq!(parse_dms("51.95"), None);
    }

    #[test]
    fn test_parse_coordinate_decimal() {
        assert!(close(parse_coordinate("51.95").unwrap(), 51.95));
        assert!(close(parse_coordinate("-4.05").unwrap(), -4.05));
    }

    #[test]
    fn test_parse_coordinate_hemisphere_suffix() {
        assert!(close(parse_coordinate("4.05 W").unwrap(), -4.05));
        assert!(close(parse_coordinate("4.05 E").unwrap(), 4.05));
        // Hemisphere overrides any sign in the number
        assert!(close(parse_coordinate("-4.05 S").unwrap(), -4.05));
    }

    #[test]
    fn test_parse_coordinate_dms() {
        assert!(close(parse_coordinate("1°16'N").unwrap(), 1.2667));
    }

    #[test]
    fn test_parse_coordinate_dash_form_dms() {
        assert!(close(parse_coordinate("103-50E").unwrap(), 103.8333));
        assert!(close(parse_coordinate("51-57S").unwrap(), -51.95));
    }

    #[test]
    fn test_parse_coordinate_space_form_dms() {
        assert!(close(parse_coordinate("51 57 30 N").unwrap(), 51.9583));
    }

    #[test]
    fn test_parse_coordinate_garbage() {
        assert_eq!(parse_coordinate("not a coordinate"), None);
        assert_eq!(parse_coordinate(""), None);
    }

    #[test]
    fn test_parse_gazetteer_coordinate_comma_decimal() {
        assert!(close(parse_gazetteer_coordinate("51,95").unwrap(), 51.95));
    }

    #[test]
    fn test_parse_gazetteer_coordinate_dms_fallback() {
        assert!(close(
            parse_gazetteer_coordinate("103-50E").unwrap(),
            103.8333
        ));
    }

    #[test]
    fn test_normalize_lon_360() {
        assert!(close(normalize_lon_360(350.0).unwrap(), -10.0));
        assert!(close(normalize_lon_360(179.5).unwrap(), 179.5));
        assert_eq!(normalize_lon_360(-200.0), None);
    }
}
