//! Stub Generator Module
//!
//! Assembles the script module for one native class: one stub per member
//! in descriptor order, the optional companion script, and the trailing
//! `Extension.create(...)` call that carries constructor or catch-all
//! handling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::companion::{simple_name, NoCompanion, ScriptResolver};
use crate::descriptor::{is_identifier_name, ClassDescriptor, Member, MemberKind};
use crate::error::GenerateError;
use crate::invoke::{invoke, Receiver};
use crate::method::MethodStubBuilder;
use crate::value::{quote_js_string, serialize_value};
use crate::verify::verify_module;

/// Forwards every call to the class's catch-all `function` member.
pub const CATCH_ALL_STUB: &str =
    "function(){return arguments.callee.function.apply(arguments.callee, arguments);}";

/// Stands in for an initial value that could not be serialized.
pub const FAILED_VALUE_PLACEHOLDER: &str = "undefined";

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS / OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorOptions {
    /// Expression the method stubs invoke through.
    pub receiver: String,
    /// Name of the boundary-crossing call on the receiver.
    pub invoke_method: String,
    /// Runtime object providing `create` and `defineProperty`.
    pub extension_object: String,
    /// Re-parse the module after generation and report syntax errors.
    pub verify_output: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            receiver: "this".to_string(),
            invoke_method: "invoke".to_string(),
            extension_object: "Extension".to_string(),
            verify_output: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Member the diagnostic is about; empty for module-level problems.
    pub member: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubOutput {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl StubOutput {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// SHA-256 of the module text, for golden files and bundle resource names.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.code.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

pub struct StubGenerator<'a> {
    descriptor: &'a ClassDescriptor,
    options: GeneratorOptions,
    resolver: &'a dyn ScriptResolver,
}

impl<'a> StubGenerator<'a> {
    pub fn new(descriptor: &'a ClassDescriptor) -> Self {
        Self {
            descriptor,
            options: GeneratorOptions::default(),
            resolver: &NoCompanion,
        }
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_resolver(mut self, resolver: &'a dyn ScriptResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Generate the module for `channel_name` (a script expression) under
    /// `namespace`. `instance` supplies live property values when present.
    pub fn generate(
        &self,
        channel_name: &str,
        namespace: &str,
        instance: Option<&dyn Receiver>,
    ) -> StubOutput {
        let ext = self.options.extension_object.as_str();
        let methods = MethodStubBuilder::new(&self.options.receiver, &self.options.invoke_method);
        let mut diagnostics = Vec::new();

        let mut code = String::from("(function(exports) {\n");
        for member in self.descriptor.members() {
            match &member.kind {
                MemberKind::Method { selector } => {
                    code.push_str(&format!(
                        "{} = {};\n",
                        export_target(&member.name),
                        methods.build(&member.name, selector)
                    ));
                }
                MemberKind::Property { readonly, .. } => {
                    let value = self.initial_value(member, instance, &mut diagnostics);
                    code.push_str(&format!(
                        "{}.defineProperty(exports, {}, {}, {});\n",
                        ext,
                        quote_js_string(&member.name),
                        value,
                        !readonly
                    ));
                }
            }
        }

        if let Some(script) = self.resolver.resolve(self.descriptor.class_name()) {
            code.push_str(&script);
        }

        code.push_str(&format!(
            "\n}})({}.create({}, {}",
            ext,
            channel_name,
            quote_js_string(namespace)
        ));
        if let Some(constructor) = self.descriptor.constructor() {
            code.push_str(", ");
            code.push_str(&methods.build("+", constructor));
            code.push_str(", true");
        } else if self.descriptor.has_catch_all() {
            code.push_str(", ");
            code.push_str(CATCH_ALL_STUB);
        }
        code.push_str("));\n");

        if self.options.verify_output {
            if let Err(GenerateError::InvalidOutput(errors)) = verify_module(&code) {
                for message in errors {
                    eprintln!(
                        "[StubGen] {} produced invalid script: {}",
                        simple_name(self.descriptor.class_name()),
                        message
                    );
                    diagnostics.push(Diagnostic {
                        member: String::new(),
                        message,
                    });
                }
            }
        }

        StubOutput { code, diagnostics }
    }

    fn initial_value(
        &self,
        member: &Member,
        instance: Option<&dyn Receiver>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let MemberKind::Property {
            getter: Some(getter),
            ..
        } = &member.kind
        else {
            return "undefined".to_string();
        };
        let Some(value) = invoke(instance, getter, &[]) else {
            return "undefined".to_string();
        };

        match serialize_value(&value) {
            Ok(literal) => literal,
            Err(e) => {
                eprintln!(
                    "[StubGen] Failed to serialize initial value of {}.{}: {}",
                    simple_name(self.descriptor.class_name()),
                    member.name,
                    e
                );
                diagnostics.push(Diagnostic {
                    member: member.name.clone(),
                    message: e.to_string(),
                });
                FAILED_VALUE_PLACEHOLDER.to_string()
            }
        }
    }
}

/// `exports.name` for plain identifiers, `exports['name']` otherwise.
fn export_target(name: &str) -> String {
    if is_identifier_name(name) {
        format!("exports.{}", name)
    } else {
        format!("exports[{}]", quote_js_string(name))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH
// ═══════════════════════════════════════════════════════════════════════════════

pub struct BindingRequest<'a> {
    pub descriptor: &'a ClassDescriptor,
    pub channel_name: String,
    pub namespace: String,
    pub instance: Option<&'a dyn Receiver>,
}

/// Generate many independent modules on the rayon pool; output order
/// follows request order.
pub fn generate_all(
    requests: &[BindingRequest<'_>],
    options: &GeneratorOptions,
    resolver: &dyn ScriptResolver,
) -> Vec<StubOutput> {
    requests
        .par_iter()
        .map(|request| {
            StubGenerator::new(request.descriptor)
                .with_options(options.clone())
                .with_resolver(resolver)
                .generate(&request.channel_name, &request.namespace, request.instance)
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
