//! Normalized request metadata consumed from the (excluded) HTTP layer.

use serde::{Deserialize, Serialize};

/// Connection-level addressing data as seen by the transport layer.
///
/// Header values are passed through verbatim; empty strings and the literal
/// `"unknown"` (any case) are treated as absent, matching common proxy
/// behavior for `X-Forwarded-For`, `Proxy-Client-IP` and `WL-Proxy-Client-IP`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub forwarded_for: Option<String>,
    pub proxy_client_ip: Option<String>,
    pub wl_proxy_client_ip: Option<String>,
    /// Transport-layer peer address, always present.
    pub peer_addr: String,
}

impl ConnectionInfo {
    pub fn direct(peer_addr: impl Into<String>) -> Self {
        Self {
            peer_addr: peer_addr.into(),
            ..Self::default()
        }
    }

    /// Resolve the originating client IP.
    ///
    /// Preference order: forwarded-for chain (first hop only), then the
    /// proxy-specific headers, finally the transport peer address. When the
    /// forwarded-for value is a comma-separated chain, only the first entry
    /// is trusted as the origin.
    pub fn client_ip(&self) -> String {
        let candidates = [
            self.forwarded_for.as_deref(),
            self.proxy_client_ip.as_deref(),
            self.wl_proxy_client_ip.as_deref(),
        ];

        for candidate in candidates.into_iter().flatten() {
            let trimmed = candidate.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
                continue;
            }
            return match trimmed.split_once(',') {
                Some((first, _)) => first.trim().to_string(),
                None => trimmed.to_string(),
            };
        }

        self.peer_addr.clone()
    }
}

/// Normalized metadata for one security-relevant request.
///
/// Produced by the HTTP layer before any core operation runs; the core never
/// touches raw requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub source_ip: String,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(source_ip: impl Into<String>, user_agent: Option<String>) -> Self {
        Self {
            source_ip: source_ip.into(),
            user_agent,
        }
    }

    /// Build a context from raw connection data, applying IP resolution.
    pub fn from_connection(conn: &ConnectionInfo, user_agent: Option<String>) -> Self {
        Self {
            source_ip: conn.client_ip(),
            user_agent,
        }
    }
}
