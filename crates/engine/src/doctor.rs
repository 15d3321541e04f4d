//! Doctor – run every startup check in order and derive a diagnosis.

use crate::context::ProbeContext;
use crate::diagnosis::{diagnose, recommendations};
use crate::probes::{self, files::missing_paths};
use crate::traits::ProgressSink;
use crate::types::*;
use std::collections::HashMap;
use std::time::Instant;

/// Run the full doctor and wrap the report in a RunResult.
pub async fn run_doctor(ctx: &ProbeContext, sink: &mut dyn ProgressSink) -> RunResult {
    let run_id = new_run_id();
    let start = Instant::now();

    let (report, steps) = gather_report(ctx, sink).await;

    let timing = TimingInfo {
        total: start.elapsed().as_millis() as u64,
        steps,
    };
    let mut r = result_with_status("doctor", "project", &run_id, report.diagnosis.status(), timing);
    r.data = Some(serde_json::to_value(&report).unwrap_or_default());
    r
}

/// Execute steps 1–7 strictly in sequence. Nothing here can fail; every
/// step folds its errors into its own result.
pub async fn gather_report(
    ctx: &ProbeContext,
    sink: &mut dyn ProgressSink,
) -> (DoctorReport, HashMap<String, u64>) {
    let mut steps = HashMap::new();

    sink.emit(ProgressEvent::StepStarted(Step::Files));
    let t0 = Instant::now();
    let files = probes::check_files(ctx, sink);
    let missing_files = missing_paths(&files);
    steps.insert(Step::Files.key().into(), t0.elapsed().as_millis() as u64);

    sink.emit(ProgressEvent::StepStarted(Step::Scripts));
    let t1 = Instant::now();
    let manifest = probes::check_manifest(ctx, sink);
    steps.insert(Step::Scripts.key().into(), t1.elapsed().as_millis() as u64);

    sink.emit(ProgressEvent::StepStarted(Step::Ports));
    let t2 = Instant::now();
    let ports = probes::scan_ports(ctx, sink).await;
    steps.insert(Step::Ports.key().into(), t2.elapsed().as_millis() as u64);

    sink.emit(ProgressEvent::StepStarted(Step::Server));
    let t3 = Instant::now();
    let server = probes::run_server_trial(&ctx.config.server, &ctx.root, sink).await;
    steps.insert(Step::Server.key().into(), t3.elapsed().as_millis() as u64);

    sink.emit(ProgressEvent::StepStarted(Step::Environment));
    let t4 = Instant::now();
    let environment = probes::inspect_environment(&ctx.env, &ctx.config.environment, sink);
    steps.insert(Step::Environment.key().into(), t4.elapsed().as_millis() as u64);

    sink.emit(ProgressEvent::StepStarted(Step::Diagnosis));
    let diagnosis = diagnose(&missing_files, &server);
    match diagnosis.severity() {
        Severity::Critical => tracing::warn!(diagnosis = %diagnosis.headline(), "critical diagnosis"),
        _ => tracing::info!(diagnosis = %diagnosis.headline(), "diagnosis"),
    }
    sink.emit(ProgressEvent::Diagnosed(&diagnosis));

    let recommendations =
        recommendations(&missing_files, ctx.config.environment.default_port);
    sink.emit(ProgressEvent::Recommendations(&recommendations));

    let report = DoctorReport {
        files,
        missing_files,
        manifest,
        ports,
        server,
        environment,
        diagnosis,
        recommendations,
    };
    (report, steps)
}

/// Run a single step on its own. `Step::Diagnosis` needs every other
/// step's result, so it runs the full doctor.
pub async fn run_check(step: Step, ctx: &ProbeContext, sink: &mut dyn ProgressSink) -> RunResult {
    let run_id = new_run_id();
    let start = Instant::now();
    if step != Step::Diagnosis {
        sink.emit(ProgressEvent::StepStarted(step));
    }

    let (status, data) = match step {
        Step::Files => {
            let files = probes::check_files(ctx, sink);
            let status = if missing_paths(&files).is_empty() {
                Status::Pass
            } else {
                Status::Fail
            };
            (status, serde_json::to_value(&files))
        }
        Step::Scripts => {
            let manifest = probes::check_manifest(ctx, sink);
            let status = match &manifest {
                ManifestCheck::Parsed { missing, .. } if missing.is_empty() => Status::Pass,
                ManifestCheck::Parsed { .. } => Status::Warn,
                ManifestCheck::Unreadable { .. } => Status::Fail,
            };
            (status, serde_json::to_value(&manifest))
        }
        Step::Ports => {
            let ports = probes::scan_ports(ctx, sink).await;
            (Status::Pass, serde_json::to_value(&ports))
        }
        Step::Server => {
            let server = probes::run_server_trial(&ctx.config.server, &ctx.root, sink).await;
            let status = diagnose(&[], &server).status();
            (status, serde_json::to_value(&server))
        }
        Step::Environment => {
            let env = probes::inspect_environment(&ctx.env, &ctx.config.environment, sink);
            (Status::Pass, serde_json::to_value(&env))
        }
        Step::Diagnosis => return run_doctor(ctx, sink).await,
    };

    let timing = TimingInfo {
        total: start.elapsed().as_millis() as u64,
        steps: HashMap::new(),
    };
    let mut r = result_with_status("check", step.key(), &run_id, status, timing);
    r.data = Some(data.unwrap_or_default());
    r
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::DiagnosticConfig;
    use crate::context::{EnvSnapshot, ProbeContext};
    use crate::platform::StdFilesystem;
    use crate::testing::{FakeHealth, RecordingSink};
    use std::path::Path;

    fn scaffold_project(root: &Path, skip: &[&str]) {
        for file in DiagnosticConfig::default().required_files {
            if skip.contains(&file.as_str()) {
                continue;
            }
            let path = root.join(&file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            let body = if file == "package.json" {
                r#"{"scripts": {"dev": "tsx server/index.ts", "dev:frontend": "vite"}}"#
            } else {
                ""
            };
            std::fs::write(path, body).unwrap();
        }
    }

    fn context(root: &Path, server_command: &str, timeout_ms: u64) -> ProbeContext {
        let mut config = DiagnosticConfig::default();
        config.server.command = server_command.to_string();
        config.server.timeout_ms = timeout_ms;
        config.server.drain_ms = 100;
        ProbeContext::new(
            Box::new(StdFilesystem),
            Box::new(FakeHealth::new()),
            config,
            root.to_path_buf(),
            EnvSnapshot::default(),
        )
    }

    #[tokio::test]
    async fn test_complete_project_with_hanging_server_warns() {
        let dir = tempfile::tempdir().unwrap();
        scaffold_project(dir.path(), &[]);
        let ctx = context(dir.path(), "exec sleep 30", 300);
        let mut sink = RecordingSink::default();

        let (report, steps) = gather_report(&ctx, &mut sink).await;

        assert!(report.missing_files.is_empty());
        match &report.manifest {
            ManifestCheck::Parsed { missing, .. } => assert!(missing.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
        assert!(report
            .ports
            .iter()
            .all(|p| p.status == PortStatus::Available));
        assert_eq!(report.server.outcome, TrialOutcome::TimedOut);
        assert_eq!(report.diagnosis, Diagnosis::StartedWithIssues);
        assert_eq!(
            report.diagnosis.headline(),
            "Server started but may have issues"
        );
        assert!(!report
            .recommendations
            .iter()
            .any(|r| r.action == "Create missing files"));
        assert_eq!(steps.len(), 5);
    }

    #[tokio::test]
    async fn test_missing_file_overrides_healthy_server() {
        let dir = tempfile::tempdir().unwrap();
        scaffold_project(dir.path(), &["client/index.html"]);
        let ctx = context(dir.path(), "exit 0", 5_000);

        let (report, _) = gather_report(&ctx, &mut RecordingSink::default()).await;

        assert_eq!(report.server.outcome, TrialOutcome::Exited { code: Some(0) });
        assert_eq!(
            report.diagnosis,
            Diagnosis::MissingFiles {
                files: vec!["client/index.html".into()]
            }
        );
        assert_eq!(report.recommendations[0].action, "Create missing files");
    }

    #[tokio::test]
    async fn test_bad_manifest_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        scaffold_project(dir.path(), &[]);
        std::fs::write(dir.path().join("package.json"), "{not json").unwrap();
        let ctx = context(dir.path(), "exit 0", 5_000);
        let mut sink = RecordingSink::default();

        let (report, _) = gather_report(&ctx, &mut sink).await;

        assert!(matches!(report.manifest, ManifestCheck::Unreadable { .. }));
        let unreadable = sink.position("manifest_unreadable").unwrap();
        let first_port = sink.position("port").unwrap();
        assert!(unreadable < first_port);
        assert_eq!(sink.count("port"), 4);
        assert_eq!(report.diagnosis, Diagnosis::Healthy);
    }

    #[tokio::test]
    async fn test_run_doctor_envelope() {
        let dir = tempfile::tempdir().unwrap();
        scaffold_project(dir.path(), &[]);
        let ctx = context(dir.path(), "exit 4", 5_000);

        let r = run_doctor(&ctx, &mut RecordingSink::default()).await;

        assert_eq!(r.command, "doctor");
        assert_eq!(r.status, Status::Fail);
        let data = r.data.unwrap();
        assert_eq!(data["diagnosis"]["kind"], "non_zero_exit");
        assert_eq!(data["diagnosis"]["code"], 4);
        assert_eq!(data["server"]["outcome"]["kind"], "exited");
    }

    #[tokio::test]
    async fn test_single_file_check() {
        let dir = tempfile::tempdir().unwrap();
        scaffold_project(dir.path(), &["server/index.ts"]);
        let ctx = context(dir.path(), "exit 0", 5_000);
        let mut sink = RecordingSink::default();

        let r = run_check(Step::Files, &ctx, &mut sink).await;

        assert_eq!(r.target, "files");
        assert_eq!(r.status, Status::Fail);
        assert_eq!(r.data.unwrap()[0]["exists"], false);
        assert_eq!(sink.count("port"), 0);
    }
}
