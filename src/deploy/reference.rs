//! Container image references
//!
//! Implements the docker reference grammar closely enough to normalize a
//! user-supplied image name and find the registry index it belongs to:
//!
//! ```text
//! reference  := name [ ":" tag ] [ "@" digest ]
//! name       := [domain "/"] path-component ["/" path-component]*
//! domain     := domain-component ["." domain-component]* [":" port]
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Registry host used when a reference names none
pub const DEFAULT_DOMAIN: &str = "docker.io";

const LEGACY_DEFAULT_DOMAIN: &str = "index.docker.io";
const OFFICIAL_REPO_PREFIX: &str = "library/";
const NAME_TOTAL_LENGTH_MAX: usize = 255;

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let domain_component = r"(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])";
    let domain = format!(r"{dc}(?:\.{dc})*(?::[0-9]+)?", dc = domain_component);
    let path_component = r"[a-z0-9]+(?:(?:[._]|__|[-]*)[a-z0-9]+)*";
    let name = format!(r"(?:{domain}/)?{pc}(?:/{pc})*", domain = domain, pc = path_component);
    let tag = r"[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}";
    let digest = r"[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9A-Fa-f]{32,}";
    Regex::new(&format!(r"^({name})(?::({tag}))?(?:@({digest}))?$"))
        .expect("reference pattern is valid")
});

static HEX_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{64}$").expect("hex id pattern is valid"));

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("invalid reference format: '{0}'")]
    InvalidFormat(String),

    #[error("repository name must be lowercase: '{0}'")]
    NameNotLowercase(String),

    #[error("repository name must not be more than 255 characters")]
    NameTooLong,

    #[error("repository name must be canonical: '{0}'")]
    NameNotCanonical(String),

    #[error("invalid repository name '{0}': cannot be a 64-byte hexadecimal string")]
    HexName(String),
}

/// A parsed, normalized image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    domain: String,
    path: String,
    tag: Option<String>,
    digest: Option<String>,
}

/// Split off the registry host. The first component only counts as a host
/// when it looks like one (has a dot or port, or is "localhost").
fn split_domain(name: &str) -> (String, String) {
    let (domain, remainder) = match name.split_once('/') {
        Some((first, rest))
            if first.contains(['.', ':'])
                || first == "localhost"
                || first.to_lowercase() != first =>
        {
            (first.to_string(), rest.to_string())
        }
        _ => (DEFAULT_DOMAIN.to_string(), name.to_string()),
    };

    let domain = if domain == LEGACY_DEFAULT_DOMAIN {
        DEFAULT_DOMAIN.to_string()
    } else {
        domain
    };

    let remainder = if domain == DEFAULT_DOMAIN && !remainder.contains('/') {
        format!("{}{}", OFFICIAL_REPO_PREFIX, remainder)
    } else {
        remainder
    };

    (domain, remainder)
}

impl ImageReference {
    /// Parse a reference, filling in the default registry and the `library/`
    /// namespace for official images.
    pub fn parse_normalized(text: &str) -> Result<Self, ReferenceError> {
        if HEX_ID_PATTERN.is_match(text) {
            return Err(ReferenceError::HexName(text.to_string()));
        }

        let (domain, remainder) = split_domain(text);

        let remote_name = remainder
            .split_once(':')
            .map(|(name, _)| name)
            .unwrap_or(&remainder);
        if remote_name.to_lowercase() != remote_name {
            return Err(ReferenceError::NameNotLowercase(text.to_string()));
        }

        let full = format!("{}/{}", domain, remainder);
        let caps = REFERENCE_PATTERN
            .captures(&full)
            .ok_or_else(|| ReferenceError::InvalidFormat(text.to_string()))?;

        let name = &caps[1];
        if name.len() > NAME_TOTAL_LENGTH_MAX {
            return Err(ReferenceError::NameTooLong);
        }

        let path = name
            .strip_prefix(&domain)
            .and_then(|p| p.strip_prefix('/'))
            .ok_or_else(|| ReferenceError::InvalidFormat(text.to_string()))?;

        Ok(Self {
            domain,
            path: path.to_string(),
            tag: caps.get(2).map(|m| m.as_str().to_string()),
            digest: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }

    /// Parse a reference that must already be in its fully-qualified form.
    pub fn parse_canonical(text: &str) -> Result<Self, ReferenceError> {
        let reference = Self::parse_normalized(text)?;
        if reference.to_string() != text {
            return Err(ReferenceError::NameNotCanonical(text.to_string()));
        }
        Ok(reference)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Repository name including the domain, without tag or digest
    pub fn name(&self) -> String {
        format!("{}/{}", self.domain, self.path)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.path)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str =
        "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_normalize_official_image() {
        let r = ImageReference::parse_normalized("nginx").unwrap();
        assert_eq!(r.domain(), "docker.io");
        assert_eq!(r.path(), "library/nginx");
        assert_eq!(r.tag(), None);
        assert_eq!(r.to_string(), "docker.io/library/nginx");
    }

    #[test]
    fn test_normalize_user_image_with_tag() {
        let r = ImageReference::parse_normalized("alice/fn:0.1").unwrap();
        assert_eq!(r.name(), "docker.io/alice/fn");
        assert_eq!(r.tag(), Some("0.1"));
    }

    #[test]
    fn test_private_registry_with_port() {
        let text = format!("registry.example.com:5000/team/fn:1.0@{}", DIGEST);
        let r = ImageReference::parse_normalized(&text).unwrap();
        assert_eq!(r.domain(), "registry.example.com:5000");
        assert_eq!(r.path(), "team/fn");
        assert_eq!(r.tag(), Some("1.0"));
        assert_eq!(r.digest(), Some(DIGEST));
        assert_eq!(r.to_string(), text);
    }

    #[test]
    fn test_localhost_domain() {
        let r = ImageReference::parse_normalized("localhost/fn").unwrap();
        assert_eq!(r.domain(), "localhost");
        assert_eq!(r.path(), "fn");
    }

    #[test]
    fn test_legacy_index_domain() {
        let r = ImageReference::parse_normalized("index.docker.io/alice/fn").unwrap();
        assert_eq!(r.domain(), "docker.io");
        assert!(ImageReference::parse_canonical("index.docker.io/alice/fn").is_err());
    }

    #[test]
    fn test_canonical() {
        assert!(ImageReference::parse_canonical("docker.io/alice/fn").is_ok());
        assert!(ImageReference::parse_canonical("docker.io/alice/fn:latest").is_ok());
        assert_eq!(
            ImageReference::parse_canonical("docker.io/fn"),
            Err(ReferenceError::NameNotCanonical("docker.io/fn".to_string()))
        );
        assert!(ImageReference::parse_canonical("alice/fn").is_err());
    }

    #[test]
    fn test_uppercase_rejected() {
        assert!(matches!(
            ImageReference::parse_normalized("docker.io/Alice/fn"),
            Err(ReferenceError::NameNotLowercase(_))
        ));
    }

    #[test]
    fn test_invalid_formats() {
        for input in ["", "docker.io/alice//fn", "alice/fn:", "alice/-fn", "alice/fn@sha256:abc"] {
            assert!(
                ImageReference::parse_normalized(input).is_err(),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_non_ascii_tag_rejected() {
        assert!(matches!(
            ImageReference::parse_canonical("docker.io/alice/fn:ünï"),
            Err(ReferenceError::InvalidFormat(_))
        ));
        assert!(ImageReference::parse_normalized("alice/fn:ünï").is_err());
    }

    #[test]
    fn test_hex_name_rejected() {
        let id = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert!(matches!(
            ImageReference::parse_normalized(id),
            Err(ReferenceError::HexName(_))
        ));
    }

    #[test]
    fn test_name_too_long() {
        let long = format!("docker.io/alice/{}", "a".repeat(260));
        assert_eq!(
            ImageReference::parse_normalized(&long),
            Err(ReferenceError::NameTooLong)
        );
    }
}
