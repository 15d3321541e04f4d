//! Probe context – holds capability trait objects, settings and the
//! environment snapshot for one doctor run.

use crate::config::DiagnosticConfig;
use crate::platform::{ReqwestHealthClient, StdFilesystem};
use crate::traits::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variables captured once, up front.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Read `names` from the process environment. Unset or non-UTF-8
    /// variables are left out.
    pub fn capture<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vars = names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                std::env::var(name).ok().map(|v| (name.to_string(), v))
            })
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Central context passed to every probe step.
///
/// Callers (CLI / tests) choose the capability implementations, the
/// project root and the environment snapshot instead of the steps reading
/// ambient process state.
pub struct ProbeContext {
    fs: Box<dyn FilesystemOps>,
    http: Box<dyn HealthClient>,
    pub config: DiagnosticConfig,
    pub root: PathBuf,
    pub env: EnvSnapshot,
}

impl ProbeContext {
    pub fn new(
        fs: Box<dyn FilesystemOps>,
        http: Box<dyn HealthClient>,
        config: DiagnosticConfig,
        root: PathBuf,
        env: EnvSnapshot,
    ) -> Self {
        Self {
            fs,
            http,
            config,
            root,
            env,
        }
    }

    /// Create a context with real platform implementations, capturing the
    /// variables the environment step needs from the current process.
    pub fn default_platform(config: DiagnosticConfig, root: PathBuf) -> CapResult<Self> {
        let env = EnvSnapshot::capture(config.environment.watched_vars());
        Ok(Self::new(
            Box::new(StdFilesystem),
            Box::new(ReqwestHealthClient::new()?),
            config,
            root,
            env,
        ))
    }

    pub fn fs(&self) -> &dyn FilesystemOps {
        self.fs.as_ref()
    }

    pub fn http(&self) -> &dyn HealthClient {
        self.http.as_ref()
    }

    /// Resolve a project-relative path against the root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(Path::new(relative))
    }
}
