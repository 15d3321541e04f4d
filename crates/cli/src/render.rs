//! Human-readable console output for doctor runs.

use crate::logging::Redactor;
use engine::traits::ProgressSink;
use engine::types::*;
use std::io::Write;

/// Renders progress events as they arrive.
pub struct ConsoleReporter<W> {
    out: W,
    manifest: String,
    redactor: Redactor,
    scripts_listed: bool,
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W, manifest: impl Into<String>, redactor: Redactor) -> Self {
        Self {
            out,
            manifest: manifest.into(),
            redactor,
            scripts_listed: false,
        }
    }

    pub fn banner(&mut self) {
        self.line("STARTUP DIAGNOSTIC CHECK");
        self.line("========================");
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl AsRef<str>) {
        let _ = writeln!(self.out, "{}", text.as_ref());
    }

    fn step_title(&self, step: Step) -> String {
        match step {
            Step::Files => "Checking file structure...".to_string(),
            Step::Scripts => format!("Checking {} scripts...", self.manifest),
            Step::Ports => "Checking port availability...".to_string(),
            Step::Server => "Testing server startup...".to_string(),
            Step::Environment => "Checking environment...".to_string(),
            Step::Diagnosis => "DIAGNOSIS\n=========".to_string(),
        }
    }
}

impl<W: Write + Send> ProgressSink for ConsoleReporter<W> {
    fn emit(&mut self, event: ProgressEvent<'_>) {
        match event {
            ProgressEvent::StepStarted(step) => {
                let title = self.step_title(step);
                self.line("");
                self.line(title);
            }
            ProgressEvent::FileChecked(check) => {
                if check.exists {
                    self.line(format!("[ OK ] {} exists", check.path));
                } else {
                    self.line(format!("[MISS] {} MISSING", check.path));
                }
            }
            ProgressEvent::ScriptListed { name, command } => {
                if !self.scripts_listed {
                    self.scripts_listed = true;
                    self.line("Available scripts:");
                }
                self.line(format!("  {}: {}", name, command));
            }
            ProgressEvent::ScriptMissing(name) => {
                self.line(format!("[MISS] Missing \"{}\" script", name));
            }
            ProgressEvent::ManifestUnreadable { error } => {
                self.line(format!("[FAIL] {}", error));
            }
            ProgressEvent::PortProbed(probe) => {
                let detail = match (probe.http_status, &probe.detail) {
                    (Some(code), _) => format!(" (HTTP {})", code),
                    (None, Some(detail)) => format!(" ({})", detail),
                    (None, None) => String::new(),
                };
                self.line(format!("Port {}: {}{}", probe.port, probe.status, detail));
            }
            ProgressEvent::TrialOutput { stream, chunk } => {
                let tag = match stream {
                    OutputStream::Stdout => "STDOUT",
                    OutputStream::Stderr => "STDERR",
                };
                let redacted = self.redactor.redact(chunk.trim_end()).into_owned();
                for l in redacted.lines() {
                    self.line(format!("{}: {}", tag, l));
                }
            }
            ProgressEvent::TrialFinished(outcome) => match outcome {
                TrialOutcome::Exited { code: Some(code) } => {
                    self.line(format!("Server process exited with code: {}", code));
                }
                TrialOutcome::Exited { code: None } => {
                    self.line("Server process exited without a code (terminated by signal)");
                }
                TrialOutcome::SpawnFailed { message } => {
                    self.line(format!("Server process error: {}", message));
                }
                TrialOutcome::TimedOut => {
                    self.line("Server still running at timeout; stopped it");
                }
            },
            ProgressEvent::EnvironmentInspected(report) => {
                for var in &report.vars {
                    self.line(format!("{}: {}", var.name, var.display()));
                }
                let platform = &report.platform;
                match &platform.id {
                    Some(id) => {
                        self.line(format!("[ OK ] Running in {} environment", platform.platform));
                        self.line(format!("{}: {}", platform.marker, id));
                    }
                    None => {
                        self.line(format!("[INFO] Not in {} environment", platform.platform));
                    }
                }
            }
            ProgressEvent::Diagnosed(diagnosis) => {
                let tag = match diagnosis.severity() {
                    Severity::Critical => "[CRIT]",
                    Severity::Warning => "[WARN]",
                    Severity::Ok => "[ OK ]",
                };
                let prefix = if diagnosis.severity() == Severity::Critical {
                    "CRITICAL: "
                } else {
                    ""
                };
                self.line(format!("{} {}{}", tag, prefix, diagnosis.headline()));
                self.line(format!("   -> {}", diagnosis.hint()));
            }
            ProgressEvent::Recommendations(actions) => {
                self.line("");
                self.line("RECOMMENDED ACTIONS:");
                for r in actions {
                    self.line(format!("{}. {}", r.number, r.action));
                }
            }
        }
    }
}

/// One-line summary for single-step checks and seeding.
pub fn print_summary(r: &RunResult) {
    let status = match r.status {
        Status::Pass => "PASS",
        Status::Warn => "WARN",
        Status::Fail => "FAIL",
        Status::Error => "ERROR",
    };
    println!();
    println!("[{}] {} {} ({}ms)", status, r.command, r.target, r.timing_ms.total);
    if let Some(ref err) = r.error {
        println!("  error:  {} – {}", err.code, err.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedactionConfig;

    fn reporter() -> ConsoleReporter<Vec<u8>> {
        ConsoleReporter::new(
            Vec::new(),
            "package.json",
            Redactor::from_config(&RedactionConfig::default()),
        )
    }

    fn output(r: ConsoleReporter<Vec<u8>>) -> String {
        String::from_utf8(r.into_inner()).unwrap()
    }

    #[test]
    fn test_port_lines() {
        let mut r = reporter();
        r.emit(ProgressEvent::PortProbed(&PortProbe {
            port: 3000,
            status: PortStatus::Available,
            http_status: None,
            detail: Some("Connection refused".into()),
        }));
        r.emit(ProgressEvent::PortProbed(&PortProbe {
            port: 5000,
            status: PortStatus::Occupied,
            http_status: Some(200),
            detail: None,
        }));
        assert_eq!(
            output(r),
            "Port 3000: available (Connection refused)\nPort 5000: occupied (HTTP 200)\n"
        );
    }

    #[test]
    fn test_scripts_header_printed_once() {
        let mut r = reporter();
        r.emit(ProgressEvent::ScriptListed { name: "dev", command: "tsx server/index.ts" });
        r.emit(ProgressEvent::ScriptListed { name: "build", command: "vite build" });
        r.emit(ProgressEvent::ScriptMissing("dev:frontend"));
        assert_eq!(
            output(r),
            "Available scripts:\n  dev: tsx server/index.ts\n  build: vite build\n[MISS] Missing \"dev:frontend\" script\n"
        );
    }

    #[test]
    fn test_trial_output_is_split_and_redacted() {
        let mut r = reporter();
        r.emit(ProgressEvent::TrialOutput {
            stream: OutputStream::Stderr,
            chunk: "connecting to postgres://u:p@db/x\nfailed\n",
        });
        assert_eq!(
            output(r),
            "STDERR: connecting to postgres://***@db/x\nSTDERR: failed\n"
        );
    }

    #[test]
    fn test_diagnosis_and_recommendations() {
        let mut r = reporter();
        r.emit(ProgressEvent::Diagnosed(&Diagnosis::StartedWithIssues));
        let actions = vec![Recommendation {
            number: 3,
            action: "Check that preview is pointing to the correct port".to_string(),
        }];
        r.emit(ProgressEvent::Recommendations(&actions));
        assert_eq!(
            output(r),
            "[WARN] Server started but may have issues\n   -> Check if server is binding to correct host/port\n\nRECOMMENDED ACTIONS:\n3. Check that preview is pointing to the correct port\n"
        );
    }

    #[test]
    fn test_critical_prefix() {
        let mut r = reporter();
        r.emit(ProgressEvent::Diagnosed(&Diagnosis::NonZeroExit { code: 1 }));
        assert!(output(r).starts_with("[CRIT] CRITICAL: Server exited with code 1\n"));
    }
}
