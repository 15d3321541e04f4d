//! Test doubles shared by the unit tests.

use crate::config::DiagnosticConfig;
use crate::context::{EnvSnapshot, ProbeContext};
use crate::platform::StdFilesystem;
use crate::traits::*;
use crate::types::ProgressEvent;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records a short label per event, in arrival order.
#[derive(Default)]
pub struct RecordingSink {
    pub labels: Vec<&'static str>,
}

impl RecordingSink {
    pub fn count(&self, label: &str) -> usize {
        self.labels.iter().filter(|l| **l == label).count()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| *l == label)
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&mut self, event: ProgressEvent<'_>) {
        let label = match event {
            ProgressEvent::StepStarted(_) => "step",
            ProgressEvent::FileChecked(_) => "file",
            ProgressEvent::ScriptListed { .. } => "script",
            ProgressEvent::ScriptMissing(_) => "script_missing",
            ProgressEvent::ManifestUnreadable { .. } => "manifest_unreadable",
            ProgressEvent::PortProbed(_) => "port",
            ProgressEvent::TrialOutput { .. } => "trial_output",
            ProgressEvent::TrialFinished(_) => "trial_finished",
            ProgressEvent::EnvironmentInspected(_) => "environment",
            ProgressEvent::Diagnosed(_) => "diagnosis",
            ProgressEvent::Recommendations(_) => "recommendations",
        };
        self.labels.push(label);
    }
}

/// Health client with canned answers per port. Ports without an answer
/// refuse the connection.
#[derive(Default)]
pub struct FakeHealth {
    answers: Mutex<HashMap<u16, CapResult<u16>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, port: u16, answer: CapResult<u16>) -> Self {
        self.answers.lock().unwrap().insert(port, answer);
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl HealthClient for FakeHealth {
    async fn get_status(&self, url: &str, _timeout: Duration) -> CapResult<u16> {
        self.calls.lock().unwrap().push(url.to_string());
        let port = url
            .rsplit(':')
            .next()
            .and_then(|rest| rest.split('/').next())
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or_default();
        self.answers
            .lock()
            .unwrap()
            .remove(&port)
            .unwrap_or_else(|| Err(CapError::ConnectionRefused(url.to_string())))
    }
}

pub fn context_with_health(root: &Path, health: FakeHealth) -> ProbeContext {
    ProbeContext::new(
        Box::new(StdFilesystem),
        Box::new(health),
        DiagnosticConfig::default(),
        root.to_path_buf(),
        EnvSnapshot::default(),
    )
}

pub fn context_for(root: &Path) -> ProbeContext {
    context_with_health(root, FakeHealth::new())
}
