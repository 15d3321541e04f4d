//! Platform implementations of the capability traits.
//!
//! - [`StdFilesystem`]: real std::fs operations
//! - [`ReqwestHealthClient`]: real HTTP via reqwest
//!
//! The SQLite candidate store lives in [`crate::seed`].

use crate::traits::*;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

// ===========================================================================
// Filesystem – wraps std::fs
// ===========================================================================

pub struct StdFilesystem;

impl FilesystemOps for StdFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> CapResult<String> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CapError::PermissionDenied(format!("cannot read {}: {}", path.display(), e))
            }
            _ => CapError::Io(e),
        })
    }
}

// ===========================================================================
// Health client – wraps reqwest
// ===========================================================================

static CRYPTO_PROVIDER: Once = Once::new();

/// reqwest is built without a bundled rustls provider; install ring once.
fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

pub struct ReqwestHealthClient {
    client: reqwest::Client,
}

impl ReqwestHealthClient {
    pub fn new() -> CapResult<Self> {
        install_crypto_provider();
        // Health probes target loopback; a system proxy would mask refusals.
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| CapError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HealthClient for ReqwestHealthClient {
    async fn get_status(&self, url: &str, timeout: Duration) -> CapResult<u16> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e, timeout))?;
        Ok(resp.status().as_u16())
    }
}

fn classify_request_error(url: &str, err: &reqwest::Error, timeout: Duration) -> CapError {
    if err.is_timeout() {
        return CapError::Timeout(timeout.as_millis() as u64);
    }
    if is_connection_refused(err) {
        return CapError::ConnectionRefused(url.to_string());
    }
    CapError::Network(error_chain(err))
}

fn is_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = e.source();
    }
    false
}

/// Render an error with its sources, e.g. `error sending request: dns error: ...`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(e) = source {
        let msg = e.to_string();
        if !parts.iter().any(|p| p.contains(&msg)) {
            parts.push(msg);
        }
        source = e.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Wrapper(std::io::Error);

    impl std::fmt::Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("client error (Connect)")
        }
    }

    impl std::error::Error for Wrapper {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_refused_found_in_source_chain() {
        let err = Wrapper(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert!(is_connection_refused(&err));

        let err = Wrapper(std::io::Error::from(std::io::ErrorKind::TimedOut));
        assert!(!is_connection_refused(&err));
    }

    #[test]
    fn test_error_chain_joins_sources() {
        let err = Wrapper(std::io::Error::new(
            std::io::ErrorKind::Other,
            "failed to lookup address",
        ));
        assert_eq!(
            error_chain(&err),
            "client error (Connect): failed to lookup address"
        );
    }

    #[test]
    fn test_std_filesystem_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{}").unwrap();

        let fs = StdFilesystem;
        assert!(fs.exists(&path));
        assert_eq!(fs.read_to_string(&path).unwrap(), "{}");
        assert!(!fs.exists(&dir.path().join("missing.json")));
        assert!(matches!(
            fs.read_to_string(&dir.path().join("missing.json")),
            Err(CapError::Io(_))
        ));
    }
}
