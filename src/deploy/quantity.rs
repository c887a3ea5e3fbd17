//! Resource quantity parsing
//!
//! Memory sizes use binary units ("40m" is 40 MiB), CPU values are plain
//! nano-CPU integers.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*) ?([kKmMgGtTpP])?[iI]?[bB]?$").expect("size pattern is valid")
});

const KIB: f64 = 1024.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuantityError {
    #[error("invalid quantity '{value}': {reason}")]
    InvalidQuantity { value: String, reason: String },
}

impl QuantityError {
    fn invalid(value: &str, reason: impl Into<String>) -> Self {
        QuantityError::InvalidQuantity {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

fn unit_multiplier(prefix: Option<&str>) -> f64 {
    match prefix.map(|p| p.to_ascii_lowercase()).as_deref() {
        Some("k") => KIB,
        Some("m") => KIB.powi(2),
        Some("g") => KIB.powi(3),
        Some("t") => KIB.powi(4),
        Some("p") => KIB.powi(5),
        _ => 1.0,
    }
}

/// Parse a human-readable memory size ("512", "40m", "1.5GiB") into bytes.
pub fn parse_memory_size(text: &str) -> Result<i64, QuantityError> {
    let caps = SIZE_PATTERN
        .captures(text)
        .ok_or_else(|| QuantityError::invalid(text, "expected a number with an optional unit"))?;

    let number = &caps[1];
    let size: f64 = number
        .parse()
        .map_err(|_| QuantityError::invalid(text, format!("'{}' is not a number", number)))?;

    let unit = caps.get(2).map(|m| m.as_str());
    let bytes = size * unit_multiplier(unit);
    if !bytes.is_finite() || bytes >= i64::MAX as f64 {
        return Err(QuantityError::invalid(text, "size does not fit in 64 bits"));
    }
    Ok(bytes as i64)
}

/// Parse a base-10 CPU quantity in nano-CPU units.
pub fn parse_cpu_quantity(text: &str) -> Result<i64, QuantityError> {
    text.parse::<i64>()
        .map_err(|e| QuantityError::invalid(text, e.to_string()))
}
