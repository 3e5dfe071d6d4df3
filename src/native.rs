//! Node bridge for the stub generator.

use napi_derive::napi;

use crate::companion::{DirectoryResolver, NoCompanion, ScriptResolver};
use crate::descriptor::ClassDescriptor;
use crate::generator::{GeneratorOptions, StubGenerator};
use crate::invoke::{Receiver, SnapshotReceiver};

#[derive(Debug, Clone)]
#[napi(object)]
pub struct NativeStubOutput {
    pub code: String,
    pub fingerprint: String,
    pub diagnostics: Vec<String>,
}

#[napi]
pub fn stub_bridge() -> String {
    "StubGen Native Bridge Connected".to_string()
}

/// Generate a binding module from a JSON class descriptor.
///
/// `snapshot_json` maps getter names to captured property values;
/// `companion_dir` is searched for `<SimpleName>.js`.
#[napi]
pub fn generate_stub_native(
    descriptor_json: serde_json::Value,
    channel_name: String,
    namespace: String,
    snapshot_json: Option<serde_json::Value>,
    options_json: Option<serde_json::Value>,
    companion_dir: Option<String>,
) -> napi::Result<NativeStubOutput> {
    let descriptor = ClassDescriptor::from_value(descriptor_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    let options: GeneratorOptions = match options_json {
        Some(json) => serde_json::from_value(json)
            .map_err(|e| napi::Error::from_reason(format!("Invalid options: {}", e)))?,
        None => GeneratorOptions::default(),
    };

    let snapshot = snapshot_json
        .map(SnapshotReceiver::from_value)
        .transpose()
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    let directory = companion_dir.map(DirectoryResolver::new);
    let resolver: &dyn ScriptResolver = match &directory {
        Some(dir) => dir,
        None => &NoCompanion,
    };

    let output = StubGenerator::new(&descriptor)
        .with_options(options)
        .with_resolver(resolver)
        .generate(
            &channel_name,
            &namespace,
            snapshot.as_ref().map(|s| s as &dyn Receiver),
        );

    Ok(NativeStubOutput {
        fingerprint: output.fingerprint(),
        diagnostics: output
            .diagnostics
            .into_iter()
            .map(|d| {
                if d.member.is_empty() {
                    d.message
                } else {
                    format!("{}: {}", d.member, d.message)
                }
            })
            .collect(),
        code: output.code,
    })
}
