use crate::config::EnvironmentConfig;
use crate::context::EnvSnapshot;
use crate::traits::ProgressSink;
use crate::types::{EnvVarReading, EnvironmentReport, PlatformDetection, ProgressEvent};

/// Read the runtime variables and the platform marker from `env`.
/// Purely observational.
pub fn inspect_environment(
    env: &EnvSnapshot,
    config: &EnvironmentConfig,
    sink: &mut dyn ProgressSink,
) -> EnvironmentReport {
    let reading = |name: &str, fallback: String| EnvVarReading {
        name: name.to_string(),
        value: env.get(name).map(str::to_string),
        fallback,
    };

    let report = EnvironmentReport {
        vars: vec![
            reading("NODE_ENV", "not set".to_string()),
            reading(
                "PORT",
                format!("not set (will default to {})", config.default_port),
            ),
        ],
        platform: PlatformDetection {
            platform: config.platform_name.clone(),
            marker: config.platform_marker.clone(),
            id: env.get(&config.platform_marker).map(str::to_string),
        },
    };
    sink.emit(ProgressEvent::EnvironmentInspected(&report));
    report
}
