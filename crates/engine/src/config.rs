//! Doctor settings. Every field has a default so partial config files work.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticConfig {
    /// Paths, relative to the project root, that must exist.
    pub required_files: Vec<String>,
    /// Project descriptor holding the `scripts` table.
    pub manifest: String,
    pub required_scripts: Vec<String>,
    pub ports: Vec<u16>,
    pub host: String,
    pub health_path: String,
    pub port_timeout_ms: u64,
    pub server: ServerConfig,
    pub environment: EnvironmentConfig,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            required_files: vec![
                "server/index.ts".into(),
                "client/index.html".into(),
                "client/src/main.tsx".into(),
                "client/src/App.tsx".into(),
                "package.json".into(),
            ],
            manifest: "package.json".into(),
            required_scripts: vec!["dev".into(), "dev:frontend".into()],
            ports: vec![3000, 5000, 5173, 8080],
            host: "localhost".into(),
            health_path: "/api/health".into(),
            port_timeout_ms: 2_000,
            server: ServerConfig::default(),
            environment: EnvironmentConfig::default(),
        }
    }
}

impl DiagnosticConfig {
    pub fn port_timeout(&self) -> Duration {
        Duration::from_millis(self.port_timeout_ms)
    }

    pub fn health_url(&self, port: u16) -> String {
        format!("http://{}:{}{}", self.host, port, self.health_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Shell command line that starts the dev server.
    pub command: String,
    pub timeout_ms: u64,
    /// Grace period for collecting trailing output once the trial is decided.
    pub drain_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "npm run dev".into(),
            timeout_ms: 10_000,
            drain_ms: 500,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_millis(self.drain_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Port the server falls back to when `PORT` is unset.
    pub default_port: u16,
    /// Variable whose presence identifies the hosting platform.
    pub platform_marker: String,
    pub platform_name: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            default_port: 5000,
            platform_marker: "REPL_ID".into(),
            platform_name: "Replit".into(),
        }
    }
}

impl EnvironmentConfig {
    /// Names of every variable the environment step reads.
    pub fn watched_vars(&self) -> Vec<String> {
        vec![
            "NODE_ENV".to_string(),
            "PORT".to_string(),
            self.platform_marker.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = DiagnosticConfig::default();
        assert_eq!(c.ports, vec![3000, 5000, 5173, 8080]);
        assert_eq!(c.port_timeout(), Duration::from_secs(2));
        assert_eq!(c.server.timeout(), Duration::from_secs(10));
        assert_eq!(c.health_url(5173), "http://localhost:5173/api/health");
        assert_eq!(c.required_files.len(), 5);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let c: DiagnosticConfig = serde_yaml::from_str("ports: [4000]\nserver:\n  timeout_ms: 250\n")
            .expect("should parse");
        assert_eq!(c.ports, vec![4000]);
        assert_eq!(c.server.timeout_ms, 250);
        assert_eq!(c.server.command, "npm run dev");
        assert_eq!(c.health_path, "/api/health");
    }
}
