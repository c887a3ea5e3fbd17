//! Default network lookup
//!
//! When a request names no network, the first network carrying the function
//! label is used. A failed lookup is absorbed; the service is then created
//! without a network attachment.

use super::diagnostics::{Diagnostic, Diagnostics};
use crate::orchestrator::{NetworkSummary, Orchestrator};

/// Pick the first network by listing order.
pub fn select_network(networks: &[NetworkSummary]) -> Option<String> {
    networks.first().map(|n| n.name.clone())
}

/// Query the orchestrator for networks carrying `label`.
pub async fn resolve_network(
    orchestrator: &dyn Orchestrator,
    label: &str,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    match orchestrator.list_networks(label).await {
        Ok(networks) => select_network(&networks),
        Err(e) => {
            diagnostics.push(Diagnostic::NetworkLookupFailed {
                reason: e.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::MockOrchestrator;

    #[test]
    fn test_select_first_network() {
        let networks = vec![
            NetworkSummary {
                id: "1".to_string(),
                name: "func_functions".to_string(),
            },
            NetworkSummary {
                id: "2".to_string(),
                name: "other".to_string(),
            },
        ];
        assert_eq!(select_network(&networks), Some("func_functions".to_string()));
        assert_eq!(select_network(&[]), None);
    }

    #[tokio::test]
    async fn test_resolve_uses_label_filter() {
        let mock = MockOrchestrator::new().with_network("func_functions");
        let mut diagnostics = Diagnostics::new();

        let network = resolve_network(&mock, "openfaas=true", &mut diagnostics).await;

        assert_eq!(network.as_deref(), Some("func_functions"));
        assert_eq!(mock.network_queries(), vec!["openfaas=true"]);
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_no_matching_network() {
        let mock = MockOrchestrator::new();
        let mut diagnostics = Diagnostics::new();
        assert_eq!(resolve_network(&mock, "openfaas=true", &mut diagnostics).await, None);
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_absorbed() {
        let mock = MockOrchestrator::new().with_failing_networks();
        let mut diagnostics = Diagnostics::new();

        let network = resolve_network(&mock, "openfaas=true", &mut diagnostics).await;

        assert_eq!(network, None);
        assert!(matches!(
            diagnostics.iter().next(),
            Some(Diagnostic::NetworkLookupFailed { .. })
        ));
    }
}
