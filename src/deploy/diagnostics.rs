//! Non-fatal findings absorbed while compiling a deployment
//!
//! Each diagnostic is also emitted as a `warn!` event when recorded, so the
//! list and the log always agree.

use std::fmt;

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Diagnostic {
    /// A resource field could not be parsed and was dropped
    InvalidQuantity {
        field: String,
        value: String,
        reason: String,
    },

    /// The default network could not be looked up; no network was attached
    NetworkLookupFailed { reason: String },

    /// The scale label was not an integer; the default replica count was kept
    InvalidScaleLabel { value: String, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InvalidQuantity {
                field,
                value,
                reason,
            } => write!(f, "error parsing {} '{}': {}", field, value, reason),
            Diagnostic::NetworkLookupFailed { reason } => {
                write!(f, "error querying networks: {}", reason)
            }
            Diagnostic::InvalidScaleLabel { value, reason } => {
                write!(f, "invalid scale label '{}': {}", value, reason)
            }
        }
    }
}

/// Ordered collection of diagnostics for one compile
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::InvalidQuantity {
            field: "limits.cpu".to_string(),
            value: "lots".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert_eq!(
            d.to_string(),
            "error parsing limits.cpu 'lots': invalid digit found in string"
        );
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut first = Diagnostics::new();
        first.push(Diagnostic::NetworkLookupFailed {
            reason: "timeout".to_string(),
        });

        let mut second = Diagnostics::new();
        second.push(Diagnostic::InvalidScaleLabel {
            value: "two".to_string(),
            reason: "not a number".to_string(),
        });

        first.extend(second);
        assert_eq!(first.len(), 2);
        assert!(matches!(
            first.iter().next(),
            Some(Diagnostic::NetworkLookupFailed { .. })
        ));
    }

    #[test]
    fn test_serialize_tagged() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::NetworkLookupFailed {
            reason: "down".to_string(),
        });
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"kind": "network-lookup-failed", "reason": "down"}])
        );
    }
}
