//! Run configuration
//!
//! This module handles:
//! - Validation of the raw command-line values
//! - Normalisation of the node API URL
//! - Timing parameters for node requests and the confirmation poll

use log::info;
use std::time::Duration;
use url::Url;

use crate::error::{CancellerError, Result};

/// Default node REST API URL
pub const DEFAULT_NODE_URL: &str = "http://localhost:6869";

/// Scheme used when the node URL does not name one
pub const DEFAULT_URL_SCHEME: &str = "http";

/// Interval between transaction status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timeout applied to each individual HTTP request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration of a single cancellation run
#[derive(Clone, Debug)]
pub struct CancellerConfig {
    /// Node REST API base URL, normalised and without a trailing slash
    pub node_url: String,
    /// Base58 encoded account secret key
    pub account_sk: String,
    /// Base58 encoded public key that overrides the derived one
    pub account_pk: Option<String>,
    /// Build and sign transactions without broadcasting them
    pub dry_run: bool,
    /// Delay between transaction status polls
    pub poll_interval: Duration,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl CancellerConfig {
    /// Validate raw CLI values and build a configuration
    pub fn new(node_url: &str, account_sk: &str, account_pk: Option<&str>, dry_run: bool) -> Result<Self> {
        if is_blank_or_split(node_url) {
            return Err(CancellerError::InvalidParameters(format!(
                "Invalid node's URL '{}'",
                node_url
            )));
        }
        if is_blank_or_split(account_sk) {
            return Err(CancellerError::InvalidParameters(
                "Invalid account private key".to_string(),
            ));
        }

        let account_pk = match account_pk.map(str::trim) {
            None | Some("") => {
                info!("No different account public key is given");
                None
            }
            Some(pk) if pk.split_whitespace().count() > 1 => {
                return Err(CancellerError::InvalidParameters(format!(
                    "Invalid account public key '{}'",
                    pk
                )));
            }
            Some(pk) => Some(pk.to_string()),
        };

        Ok(Self {
            node_url: normalize_node_url(node_url)?,
            account_sk: account_sk.trim().to_string(),
            account_pk,
            dry_run,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }
}

fn is_blank_or_split(value: &str) -> bool {
    value.split_whitespace().count() != 1
}

/// Normalise a node URL, defaulting the scheme to `http`
///
/// `localhost:6869` and `//localhost:6869` both become `http://localhost:6869`.
/// Only `http` and `https` are accepted.
pub fn normalize_node_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else if let Some(rest) = raw.strip_prefix("//") {
        format!("{}://{}", DEFAULT_URL_SCHEME, rest)
    } else {
        format!("{}://{}", DEFAULT_URL_SCHEME, raw)
    };

    let url = Url::parse(&candidate).map_err(|e| {
        CancellerError::InvalidParameters(format!("Invalid node's URL '{}': {}", raw, e))
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CancellerError::InvalidParameters(format!(
                "Unsupported URL scheme '{}'",
                other
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(CancellerError::InvalidParameters(format!(
            "Invalid node's URL '{}': missing host",
            raw
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}
