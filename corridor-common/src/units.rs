//! Parsing of OSM-style quantity strings.
//!
//! Width/length tags come in many shapes (`"12m"`, `"40 ft"`, `"16'3\""`,
//! `"5mi"`, bare numbers); speed tags mix km/h and mph and carry sentinel
//! words like `none`. Mappers are inconsistent, so parsing is permissive.

/// Parse a length string into meters.
///
/// Accepted forms: feet-and-inches (`16'3"`), number plus unit
/// (`m`/`km`/`mi`/`ft`/`in` and long spellings), and bare numbers (assumed
/// meters). Unparseable input yields `0.0` so that a garbage width tag
/// degrades to "no width" rather than aborting a whole analysis run.
pub fn length_meters(raw: &str) -> f64 {
    let s = raw.trim().to_ascii_lowercase();

    if let Some(v) = feet_inches(&s) {
        return v;
    }

    if let Some((num, unit)) = number_with_unit(&s) {
        let factor = match unit {
            "m" | "meter" | "meters" => Some(1.0),
            "km" | "kilometer" | "kilometre" => Some(1000.0),
            "mi" | "mile" | "miles" => Some(1609.344),
            "ft" | "feet" => Some(0.3048),
            "in" | "inch" | "inches" => Some(0.0254),
            _ => None,
        };
        if let Some(f) = factor {
            return num * f;
        }
    }

    s.parse::<f64>().unwrap_or(0.0)
}

/// Parse a maxspeed tag into km/h.
///
/// Returns `None` for absent values and for the OSM sentinels `none`,
/// `unlimited` and `signals`. A trailing `mph` converts the value.
pub fn speed_kmh(raw: &str) -> Option<f64> {
    let s = raw.trim().to_ascii_lowercase();
    if matches!(s.as_str(), "" | "none" | "unlimited" | "signals") {
        return None;
    }

    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits = &s[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: f64 = digits[..end].parse().ok()?;

    if s.contains("mph") {
        Some(value * 1.60934)
    } else {
        Some(value)
    }
}

/// `16'3"` style: integer feet, apostrophe, integer inches.
fn feet_inches(s: &str) -> Option<f64> {
    let (feet, rest) = leading_integer(s)?;
    let rest = rest.trim_start().strip_prefix('\'')?;
    let (inches, _) = leading_integer(rest.trim_start())?;
    Some(feet * 0.3048 + inches * 0.0254)
}

fn leading_integer(s: &str) -> Option<(f64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// `([\d.]+)\s*([a-z]+)` equivalent: number, optional whitespace, unit word.
fn number_with_unit(s: &str) -> Option<(f64, &str)> {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let num: f64 = s[..end].parse().ok()?;
    let rest = s[end..].trim_start();
    let unit_end = rest
        .find(|c: char| !c.is_ascii_lowercase())
        .unwrap_or(rest.len());
    if unit_end == 0 {
        return None;
    }
    Some((num, &rest[..unit_end]))
}
