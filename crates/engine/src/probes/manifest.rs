use crate::context::ProbeContext;
use crate::traits::ProgressSink;
use crate::types::{ManifestCheck, ProgressEvent};
use serde_json::Value;
use std::collections::BTreeMap;

/// Read the manifest's `scripts` table and flag required scripts that are
/// absent. Read and parse failures become [`ManifestCheck::Unreadable`].
pub fn check_manifest(ctx: &ProbeContext, sink: &mut dyn ProgressSink) -> ManifestCheck {
    let path = ctx.resolve(&ctx.config.manifest);
    let parsed = ctx
        .fs()
        .read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|text| parse_scripts(&text));

    let scripts = match parsed {
        Ok(scripts) => scripts,
        Err(error) => {
            let error = format!("Error reading {}: {}", ctx.config.manifest, error);
            tracing::warn!(manifest = %path.display(), %error, "manifest unreadable");
            sink.emit(ProgressEvent::ManifestUnreadable { error: &error });
            return ManifestCheck::Unreadable { error };
        }
    };

    for (name, command) in &scripts {
        sink.emit(ProgressEvent::ScriptListed { name, command });
    }

    let missing: Vec<String> = ctx
        .config
        .required_scripts
        .iter()
        .filter(|name| scripts.get(*name).map_or(true, |cmd| cmd.is_empty()))
        .cloned()
        .collect();
    for name in &missing {
        sink.emit(ProgressEvent::ScriptMissing(name));
    }

    ManifestCheck::Parsed { scripts, missing }
}

/// Extract `scripts` as name → command. A document that is not a JSON
/// object is an error. A missing or non-object `scripts` key yields an
/// empty table; only string entries count as declared scripts.
pub fn parse_scripts(text: &str) -> Result<BTreeMap<String, String>, String> {
    let doc: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let Some(doc) = doc.as_object() else {
        return Err(format!("expected a JSON object, found {}", kind(&doc)));
    };
    let Some(table) = doc.get("scripts").and_then(Value::as_object) else {
        return Ok(BTreeMap::new());
    };
    Ok(table
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|cmd| (k.clone(), cmd.to_string())))
        .collect())
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
