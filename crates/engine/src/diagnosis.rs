//! Diagnosis table and remediation list.

use crate::types::{Diagnosis, Recommendation, ServerTrial, TrialOutcome};

/// Derive the single diagnosis from the accumulated results.
///
/// Checked in priority order: missing files, startup error, non-zero exit,
/// timeout, healthy. An exit without a code (signal) is not a non-zero exit.
pub fn diagnose(missing_files: &[String], trial: &ServerTrial) -> Diagnosis {
    if !missing_files.is_empty() {
        return Diagnosis::MissingFiles {
            files: missing_files.to_vec(),
        };
    }
    match &trial.outcome {
        TrialOutcome::SpawnFailed { message } => Diagnosis::StartupError {
            message: message.clone(),
        },
        TrialOutcome::Exited { code: Some(code) } if *code != 0 => {
            Diagnosis::NonZeroExit { code: *code }
        }
        TrialOutcome::TimedOut => Diagnosis::StartedWithIssues,
        TrialOutcome::Exited { .. } => Diagnosis::Healthy,
    }
}

/// Fixed follow-up actions numbered 1 to 4; action 1 ("create missing
/// files") only appears when some are missing.
pub fn recommendations(missing_files: &[String], default_port: u16) -> Vec<Recommendation> {
    let fixed = [
        "Create missing files".to_string(),
        "Ensure both backend (npm run dev) and frontend (npm run dev:frontend) are running"
            .to_string(),
        "Check that preview is pointing to the correct port".to_string(),
        format!(
            "Try accessing http://localhost:{} directly if possible",
            default_port
        ),
    ];
    let skip = usize::from(missing_files.is_empty());
    fixed
        .into_iter()
        .zip(1u8..)
        .skip(skip)
        .map(|(action, number)| Recommendation { number, action })
        .collect()
}
