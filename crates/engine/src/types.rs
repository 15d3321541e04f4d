use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Run envelope – the stable output contract for `--json`
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub command: String,
    pub target: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub timing_ms: TimingInfo,
    /// Command-specific payload (doctor report, single step result, seed summary).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Warn,
    Fail,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    PermissionDenied,
    IoError,
    NetworkError,
    Timeout,
    StorageError,
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        f.write_str(&s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimingInfo {
    pub total: u64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub steps: HashMap<String, u64>,
}

// ---------------------------------------------------------------------------
// Probe step results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Files,
    Scripts,
    Ports,
    Server,
    Environment,
    Diagnosis,
}

impl Step {
    pub fn key(self) -> &'static str {
        match self {
            Step::Files => "files",
            Step::Scripts => "scripts",
            Step::Ports => "ports",
            Step::Server => "server",
            Step::Environment => "environment",
            Step::Diagnosis => "diagnosis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCheck {
    pub path: String,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ManifestCheck {
    Parsed {
        scripts: BTreeMap<String, String>,
        /// Required scripts that are absent or empty.
        missing: Vec<String>,
    },
    Unreadable {
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    Occupied,
    Available,
    Unknown,
}

impl std::fmt::Display for PortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PortStatus::Occupied => "occupied",
            PortStatus::Available => "available",
            PortStatus::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortProbe {
    pub port: u16,
    pub status: PortStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// How the dev-server trial ended. Exactly one variant per trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrialOutcome {
    /// `code` is `None` when the process was terminated by a signal.
    Exited { code: Option<i32> },
    SpawnFailed { message: String },
    TimedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTrial {
    pub command: String,
    pub outcome: TrialOutcome,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVarReading {
    pub name: String,
    pub value: Option<String>,
    /// Text shown when the variable is unset.
    pub fallback: String,
}

impl EnvVarReading {
    pub fn display(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDetection {
    pub platform: String,
    pub marker: String,
    pub id: Option<String>,
}

impl PlatformDetection {
    pub fn detected(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub vars: Vec<EnvVarReading>,
    pub platform: PlatformDetection,
}

// ---------------------------------------------------------------------------
// Diagnosis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnosis {
    MissingFiles { files: Vec<String> },
    StartupError { message: String },
    NonZeroExit { code: i32 },
    StartedWithIssues,
    Healthy,
}

impl Diagnosis {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnosis::MissingFiles { .. }
            | Diagnosis::StartupError { .. }
            | Diagnosis::NonZeroExit { .. } => Severity::Critical,
            Diagnosis::StartedWithIssues => Severity::Warning,
            Diagnosis::Healthy => Severity::Ok,
        }
    }

    pub fn headline(&self) -> String {
        match self {
            Diagnosis::MissingFiles { files } => {
                format!("Missing required files: {}", files.join(", "))
            }
            Diagnosis::StartupError { message } => format!("Server startup error: {}", message),
            Diagnosis::NonZeroExit { code } => format!("Server exited with code {}", code),
            Diagnosis::StartedWithIssues => "Server started but may have issues".to_string(),
            Diagnosis::Healthy => "Server appears to start correctly".to_string(),
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Diagnosis::MissingFiles { .. } => "Need to create missing files first",
            Diagnosis::StartupError { .. } => "Fix server configuration issues",
            Diagnosis::NonZeroExit { .. } => "Check server logs above for specific errors",
            Diagnosis::StartedWithIssues => "Check if server is binding to correct host/port",
            Diagnosis::Healthy => "Issue may be with frontend or port configuration",
        }
    }

    pub fn status(&self) -> Status {
        match self.severity() {
            Severity::Ok => Status::Pass,
            Severity::Warning => Status::Warn,
            Severity::Critical => Status::Fail,
        }
    }
}

/// A follow-up action. `number` is fixed per action, so the always-present
/// actions keep their numbers whether or not "create missing files" is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub number: u8,
    pub action: String,
}

// ---------------------------------------------------------------------------
// Full report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    pub files: Vec<FileCheck>,
    pub missing_files: Vec<String>,
    pub manifest: ManifestCheck,
    pub ports: Vec<PortProbe>,
    pub server: ServerTrial,
    pub environment: EnvironmentReport,
    pub diagnosis: Diagnosis,
    pub recommendations: Vec<Recommendation>,
}

// ---------------------------------------------------------------------------
// Progress events
// ---------------------------------------------------------------------------

/// Emitted to a [`crate::traits::ProgressSink`] as the doctor runs.
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    StepStarted(Step),
    FileChecked(&'a FileCheck),
    ScriptListed { name: &'a str, command: &'a str },
    ScriptMissing(&'a str),
    ManifestUnreadable { error: &'a str },
    PortProbed(&'a PortProbe),
    TrialOutput { stream: OutputStream, chunk: &'a str },
    TrialFinished(&'a TrialOutcome),
    EnvironmentInspected(&'a EnvironmentReport),
    Diagnosed(&'a Diagnosis),
    Recommendations(&'a [Recommendation]),
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate a new run ID (UUIDv4).
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Build a RunResult shell with the given status (caller fills in data).
pub fn result_with_status(
    command: &str,
    target: &str,
    run_id: &str,
    status: Status,
    timing: TimingInfo,
) -> RunResult {
    RunResult {
        run_id: run_id.to_string(),
        command: command.to_string(),
        target: target.to_string(),
        status,
        error: None,
        timing_ms: timing,
        data: None,
    }
}

/// Build an error RunResult.
pub fn result_err(
    command: &str,
    target: &str,
    run_id: &str,
    total_ms: u64,
    code: ErrorCode,
    message: impl Into<String>,
) -> RunResult {
    RunResult {
        run_id: run_id.to_string(),
        command: command.to_string(),
        target: target.to_string(),
        status: Status::Error,
        error: Some(ErrorInfo {
            code,
            message: message.into(),
        }),
        timing_ms: TimingInfo {
            total: total_ms,
            steps: HashMap::new(),
        },
        data: None,
    }
}
