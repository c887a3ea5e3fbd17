//! Resource requirements
//!
//! Each memory/CPU hint is parsed on its own. A hint that fails to parse is
//! dropped with a diagnostic; it never fails the deployment.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::quantity::{parse_cpu_quantity, parse_memory_size, QuantityError};
use super::request::FunctionResources;
use super::spec::{ResourceRequirements, Resources};

fn parse_field(
    field: String,
    value: Option<&str>,
    parse: fn(&str) -> Result<i64, QuantityError>,
    diagnostics: &mut Diagnostics,
) -> Option<i64> {
    let value = value.filter(|v| !v.is_empty())?;
    match parse(value) {
        Ok(parsed) => Some(parsed),
        Err(QuantityError::InvalidQuantity { reason, .. }) => {
            diagnostics.push(Diagnostic::InvalidQuantity {
                field,
                value: value.to_string(),
                reason,
            });
            None
        }
    }
}

/// Build one group; `None` unless at least one field parsed.
fn build_group(
    group: &str,
    hints: &FunctionResources,
    diagnostics: &mut Diagnostics,
) -> Option<Resources> {
    let resources = Resources {
        memory_bytes: parse_field(
            format!("{}.memory", group),
            hints.memory.as_deref(),
            parse_memory_size,
            diagnostics,
        ),
        nano_cpus: parse_field(
            format!("{}.cpu", group),
            hints.cpu.as_deref(),
            parse_cpu_quantity,
            diagnostics,
        ),
    };

    (resources.memory_bytes.is_some() || resources.nano_cpus.is_some()).then_some(resources)
}

/// Convert request limits/requests into orchestrator resources.
///
/// Returns `None` when neither group was supplied, so the orchestrator
/// applies its own defaults.
pub fn build_resources(
    limits: Option<&FunctionResources>,
    requests: Option<&FunctionResources>,
    diagnostics: &mut Diagnostics,
) -> Option<ResourceRequirements> {
    if limits.is_none() && requests.is_none() {
        return None;
    }

    Some(ResourceRequirements {
        limits: limits.and_then(|l| build_group("limits", l, diagnostics)),
        reservations: requests.and_then(|r| build_group("requests", r, diagnostics)),
    })
}
