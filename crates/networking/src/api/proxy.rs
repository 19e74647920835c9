//! Proxy call: resolve the target, announce it, relay it, render the result

use crate::http::RelayClient;
use relay_core::{OutputSink, OutputValue};
use tracing::{debug, warn};

/// A user-supplied base/path pair resolved against the page origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Effective base sent to the relay
    pub base: String,
    /// Path sent to the relay, unchanged from user input
    pub path: String,
    /// What the `Calling …` line shows
    pub display: String,
}

/// Resolve the effective call target.
///
/// An empty base with an absolute-URL path means the path itself is the
/// target; an empty base with a relative path defaults to `origin`.
/// A non-empty base is used as given, with no shape validation.
pub fn resolve_target(base: &str, path: &str, origin: &str) -> ResolvedTarget {
    let base = base.trim();
    let path = path.trim();

    if base.is_empty() {
        if path.starts_with("http://") || path.starts_with("https://") {
            ResolvedTarget {
                base: path.to_string(),
                path: path.to_string(),
                display: path.to_string(),
            }
        } else {
            ResolvedTarget {
                base: origin.to_string(),
                path: path.to_string(),
                display: format!("{}{}", origin, path),
            }
        }
    } else {
        ResolvedTarget {
            base: base.to_string(),
            path: path.to_string(),
            display: format!("{}{}", base, path),
        }
    }
}

/// Run one proxy call end to end.
///
/// Renders `Calling <target>` to the feed panel, then the relay's JSON
/// response (or an `Error: …` line on network/parse failure) to the API
/// panel. Failures never reach the caller.
pub async fn invoke_call(
    client: &RelayClient,
    base: &str,
    path: &str,
    output: &dyn OutputSink,
    api_output: &dyn OutputSink,
) {
    let target = resolve_target(base, path, client.server_base());
    output.render(&OutputValue::text(format!("Calling {}", target.display)), false);

    match client.call(&target.base, &target.path).await {
        Ok(data) => {
            debug!("Proxy call to {} succeeded", target.display);
            api_output.render(&OutputValue::json(data), false);
        }
        Err(e) => {
            warn!("Proxy call to {} failed: {}", target.display, e);
            api_output.render(&OutputValue::text(format!("Error: {}", e)), false);
        }
    }
}
