//! Label and annotation merging
//!
//! Service labels come from three places: the fixed system labels, the
//! user's labels and the user's annotations (stored under a reserved
//! prefix). User labels may overwrite system labels; an annotation may never
//! overwrite anything.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::{DeployConfig, LEGACY_FUNCTION_LABEL};

/// Merged labels, keyed uniquely
pub type LabelSet = BTreeMap<String, String>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabelError {
    #[error("key {key} can not be used as a label as it clashes with annotation {prefixed}")]
    AnnotationConflict { key: String, prefixed: String },
}

/// Merge system labels, user labels and prefixed annotations.
pub fn build_labels(
    service: &str,
    labels: Option<&IndexMap<String, String>>,
    annotations: Option<&IndexMap<String, String>>,
    config: &DeployConfig,
) -> Result<LabelSet, LabelError> {
    let mut merged = LabelSet::new();
    merged.insert(config.function_label.clone(), service.to_string());
    merged.insert(LEGACY_FUNCTION_LABEL.to_string(), "true".to_string());

    for (key, value) in labels.into_iter().flatten() {
        merged.insert(key.clone(), value.clone());
    }

    for (key, value) in annotations.into_iter().flatten() {
        let prefixed = format!("{}{}", config.annotation_prefix, key);
        if merged.contains_key(&prefixed) {
            return Err(LabelError::AnnotationConflict {
                key: key.clone(),
                prefixed,
            });
        }
        merged.insert(prefixed, value.clone());
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_system_labels_only() {
        let labels = build_labels("figlet", None, None, &DeployConfig::default()).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels["com.openfaas.function"], "figlet");
        assert_eq!(labels["function"], "true");
    }

    #[test]
    fn test_union_of_sources() {
        let user = map(&[("team", "a"), ("tier", "web")]);
        let annotations = map(&[("topic", "orders"), ("owner", "ops")]);

        let labels =
            build_labels("fn", Some(&user), Some(&annotations), &DeployConfig::default()).unwrap();

        assert_eq!(labels.len(), 2 + 2 + 2);
        assert_eq!(labels["team"], "a");
        assert_eq!(labels["com.openfaas.annotations.topic"], "orders");
        assert_eq!(labels["com.openfaas.annotations.owner"], "ops");
    }

    #[test]
    fn test_user_label_overwrites_system_label() {
        let user = map(&[("function", "false")]);
        let labels = build_labels("fn", Some(&user), None, &DeployConfig::default()).unwrap();
        assert_eq!(labels["function"], "false");
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_annotation_conflicts_with_label() {
        let user = map(&[("com.openfaas.annotations.topic", "x")]);
        let annotations = map(&[("topic", "y")]);

        let result = build_labels("fn", Some(&user), Some(&annotations), &DeployConfig::default());
        assert_eq!(
            result,
            Err(LabelError::AnnotationConflict {
                key: "topic".to_string(),
                prefixed: "com.openfaas.annotations.topic".to_string(),
            })
        );
    }

    #[test]
    fn test_custom_prefix() {
        let config = DeployConfig {
            annotation_prefix: "ann/".to_string(),
            ..Default::default()
        };
        let annotations = map(&[("topic", "y")]);
        let labels = build_labels("fn", None, Some(&annotations), &config).unwrap();
        assert_eq!(labels["ann/topic"], "y");
    }

    #[test]
    fn test_annotation_with_system_label_collision() {
        // Prefix chosen so the prefixed key lands on a system label
        let config = DeployConfig {
            annotation_prefix: String::new(),
            ..Default::default()
        };
        let annotations = map(&[("function", "x")]);
        let result = build_labels("fn", None, Some(&annotations), &config);
        assert!(matches!(result, Err(LabelError::AnnotationConflict { .. })));
    }
}
