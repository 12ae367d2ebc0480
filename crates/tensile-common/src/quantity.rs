//! Kubernetes resource-quantity arithmetic
//!
//! Gang-scheduling sizing needs to sum container resource requests
//! across a whole topology. Quantities are normalized to integer
//! milli-units (1 CPU = 1000, 1 byte = 1000) so that `100m` CPU and
//! fractional values like `0.5` sum without floating-point drift.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::Error;

/// Binary suffixes, largest first so formatting picks the coarsest exact unit
const BINARY_SUFFIXES: &[(&str, i64)] = &[
    ("Ei", 1 << 60),
    ("Pi", 1 << 50),
    ("Ti", 1 << 40),
    ("Gi", 1 << 30),
    ("Mi", 1 << 20),
    ("Ki", 1 << 10),
];

/// Decimal suffixes (k8s also accepts SI units)
const DECIMAL_SUFFIXES: &[(&str, i64)] = &[
    ("E", 1_000_000_000_000_000_000),
    ("P", 1_000_000_000_000_000),
    ("T", 1_000_000_000_000),
    ("G", 1_000_000_000),
    ("M", 1_000_000),
    ("k", 1_000),
];

/// Parse a Kubernetes quantity string into milli-units.
///
/// Accepts `100m`, `1`, `0.5`, binary suffixes (`128Mi`, `1Gi`) and
/// decimal suffixes (`1k`, `2G`).
pub fn parse_milli(value: &str) -> Result<i64, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::quantity(value, "quantity cannot be empty"));
    }

    if let Some(stripped) = value.strip_suffix('m') {
        return stripped
            .parse::<i64>()
            .map_err(|_| Error::quantity(value, "invalid milli quantity"));
    }

    for (suffix, factor) in BINARY_SUFFIXES.iter().chain(DECIMAL_SUFFIXES) {
        if let Some(stripped) = value.strip_suffix(suffix) {
            let units = stripped
                .parse::<i64>()
                .map_err(|_| Error::quantity(value, "invalid suffixed quantity"))?;
            return units
                .checked_mul(*factor)
                .and_then(|v| v.checked_mul(1000))
                .ok_or_else(|| Error::quantity(value, "quantity overflows"));
        }
    }

    if let Ok(units) = value.parse::<i64>() {
        return units
            .checked_mul(1000)
            .ok_or_else(|| Error::quantity(value, "quantity overflows"));
    }

    // Fractional plain values like "0.5" CPUs
    let fractional = value
        .parse::<f64>()
        .map_err(|_| Error::quantity(value, "not a recognized quantity"))?;
    if !fractional.is_finite() || fractional < 0.0 {
        return Err(Error::quantity(value, "not a recognized quantity"));
    }
    Ok((fractional * 1000.0).round() as i64)
}

/// Format milli-units back into a canonical quantity string.
///
/// Whole units render bare (`102`) or with the coarsest exact binary
/// suffix (`3Gi`); sub-unit values keep the `m` suffix (`2500m`).
pub fn format_milli(milli: i64) -> String {
    if milli % 1000 != 0 {
        return format!("{milli}m");
    }
    let units = milli / 1000;
    for (suffix, factor) in BINARY_SUFFIXES {
        if units != 0 && units % factor == 0 {
            return format!("{}{}", units / factor, suffix);
        }
    }
    units.to_string()
}

/// Add a quantity string into a per-resource running total.
pub fn accumulate(
    totals: &mut BTreeMap<String, i64>,
    resource: &str,
    quantity: &Quantity,
) -> Result<(), Error> {
    let milli = parse_milli(&quantity.0)?;
    let entry = totals.entry(resource.to_string()).or_insert(0);
    *entry = entry
        .checked_add(milli)
        .ok_or_else(|| Error::quantity(&quantity.0, "sum overflows"))?;
    Ok(())
}

/// Convert per-resource milli totals into a Kubernetes resource list.
pub fn to_resource_list(totals: &BTreeMap<String, i64>) -> BTreeMap<String, Quantity> {
    totals
        .iter()
        .map(|(name, milli)| (name.clone(), Quantity(format_milli(*milli))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cpu_quantities() {
        assert_eq!(parse_milli("100m").unwrap(), 100);
        assert_eq!(parse_milli("1").unwrap(), 1000);
        assert_eq!(parse_milli("0.5").unwrap(), 500);
        assert_eq!(parse_milli("102").unwrap(), 102_000);
    }

    #[test]
    fn parse_memory_quantities() {
        assert_eq!(parse_milli("1Ki").unwrap(), 1024 * 1000);
        assert_eq!(parse_milli("128Mi").unwrap(), 128 * (1 << 20) * 1000);
        assert_eq!(parse_milli("1Gi").unwrap(), (1 << 30) * 1000);
        assert_eq!(parse_milli("1k").unwrap(), 1_000_000);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_milli("").is_err());
        assert!(parse_milli("abc").is_err());
        assert!(parse_milli("10Xi").is_err());
        assert!(parse_milli("-0.5x").is_err());
    }

    #[test]
    fn format_whole_units_bare() {
        assert_eq!(format_milli(102_000), "102");
        assert_eq!(format_milli(1000), "1");
        assert_eq!(format_milli(0), "0");
    }

    #[test]
    fn format_sub_unit_as_milli() {
        assert_eq!(format_milli(2500), "2500m");
        assert_eq!(format_milli(100), "100m");
    }

    #[test]
    fn format_binary_suffix() {
        assert_eq!(format_milli((3 * (1i64 << 30)) * 1000), "3Gi");
        assert_eq!(format_milli((1536 * (1i64 << 20)) * 1000), "1536Mi");
    }

    #[test]
    fn accumulate_sums_per_resource() {
        let mut totals = BTreeMap::new();
        accumulate(&mut totals, "cpu", &Quantity("1".to_string())).unwrap();
        accumulate(&mut totals, "cpu", &Quantity("500m".to_string())).unwrap();
        accumulate(&mut totals, "memory", &Quantity("1Gi".to_string())).unwrap();

        let list = to_resource_list(&totals);
        assert_eq!(list["cpu"].0, "1500m");
        assert_eq!(list["memory"].0, "1Gi");
    }

    #[test]
    fn parse_and_format_roundtrip_sum() {
        // 100 trainer nodes at 1 CPU plus two initializer containers at 1 CPU
        let mut totals = BTreeMap::new();
        for _ in 0..100 {
            accumulate(&mut totals, "cpu", &Quantity("1".to_string())).unwrap();
        }
        accumulate(&mut totals, "cpu", &Quantity("2".to_string())).unwrap();
        assert_eq!(to_resource_list(&totals)["cpu"].0, "102");
    }
}
