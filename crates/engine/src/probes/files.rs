use crate::context::ProbeContext;
use crate::traits::ProgressSink;
use crate::types::{FileCheck, ProgressEvent};

/// Test each required path for existence, in configured order.
pub fn check_files(ctx: &ProbeContext, sink: &mut dyn ProgressSink) -> Vec<FileCheck> {
    ctx.config
        .required_files
        .iter()
        .map(|path| {
            let check = FileCheck {
                path: path.clone(),
                exists: ctx.fs().exists(&ctx.resolve(path)),
            };
            if !check.exists {
                tracing::debug!(path = %path, "required file missing");
            }
            sink.emit(ProgressEvent::FileChecked(&check));
            check
        })
        .collect()
}

/// Paths of the checks that came back missing.
pub fn missing_paths(checks: &[FileCheck]) -> Vec<String> {
    checks
        .iter()
        .filter(|c| !c.exists)
        .map(|c| c.path.clone())
        .collect()
}
