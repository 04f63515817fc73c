//! Origin and frame gating for inbound requests.
//!
//! The gate is a pure predicate: no side effects, and a denial is terminal
//! for that request. Subframes never reach the credential store, and only
//! `https` origins are serviced. A policy may additionally pin the bridge to
//! an explicit set of origins, since any page loaded in the surface could
//! otherwise drive the host's ceremonies.

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

/// Reasons the origin gate refuses a request.
///
/// The `Display` strings are the exact wire failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OriginDenied {
    /// The request came from an embedded subframe.
    #[error("Requests from subframes are not supported")]
    Subframe,
    /// The origin has no scheme, or its scheme is not `https`.
    #[error("WebAuthn not permitted for current URL")]
    InsecureScheme,
    /// The origin is not on the configured allowlist. Deliberately shares
    /// the insecure-scheme wire message so the page cannot probe the
    /// allowlist.
    #[error("WebAuthn not permitted for current URL")]
    UnknownOrigin,
}

/// Which origins may drive the bridge.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    /// When set, only these origins (scheme://host\[:port\] form) are
    /// admitted. When `None`, any https main-frame origin is admitted.
    allowed_origins: Option<HashSet<String>>,
}

impl OriginPolicy {
    /// A policy admitting any https main-frame origin.
    #[must_use]
    pub const fn allow_any_https() -> Self {
        Self {
            allowed_origins: None,
        }
    }

    /// A policy admitting only the given origins, e.g.
    /// `"https://example.com"`. The https and main-frame checks still apply.
    #[must_use]
    pub fn allow_listed<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: Some(origins.into_iter().map(Into::into).collect()),
        }
    }

    /// Decides whether a request from `source_origin` may proceed.
    ///
    /// # Errors
    ///
    /// Returns the denial reason when the request is from a subframe, from a
    /// non-https or unparseable origin, or from an origin not on the
    /// allowlist.
    pub fn admit(&self, source_origin: &str, is_main_frame: bool) -> Result<(), OriginDenied> {
        if !is_main_frame {
            return Err(OriginDenied::Subframe);
        }
        let Ok(origin) = Url::parse(source_origin) else {
            // No parseable scheme at all.
            return Err(OriginDenied::InsecureScheme);
        };
        if origin.scheme() != "https" {
            return Err(OriginDenied::InsecureScheme);
        }
        if let Some(allowed) = &self.allowed_origins {
            let origin = origin.origin().ascii_serialization();
            if !allowed.contains(&origin) {
                return Err(OriginDenied::UnknownOrigin);
            }
        }
        Ok(())
    }
}
