//! # Binding Stub Generator
//!
//! Emits the script half of a native extension: given the introspected
//! surface of a native class, produce a module whose members proxy every
//! call across the native/script boundary.
//!
//! ## Output Contract
//!
//! ```text
//! (function(exports) {
//! exports.<method> = function(<params>) { this.invoke('<method>', [<params>]); };
//! Extension.defineProperty(exports, '<property>', <initial>, <writable>);
//! <companion script>
//! })(Extension.create(<channel>, '<namespace>'[, <constructor stub>, true | <catch-all stub>]));
//! ```
//!
//! 1. **Member Order**: members appear exactly in descriptor enumeration order.
//!    Output is byte-identical for the same descriptor and instance snapshot.
//!
//! 2. **Parameters**: one parameter per selector slot. Unnamed slots are named
//!    `__<index>`. A trailing `_Promise` slot is dropped and the stub returns a
//!    `Promise` settled through a `{resolve, reject}` argument.
//!
//! 3. **Properties**: writable flag is the negation of read-only. Without a live
//!    instance the initial value is `undefined`.
//!
//! 4. **Leniency**: a value that cannot be serialized never aborts generation; it
//!    is reported on [`StubOutput::diagnostics`] and emitted as `undefined`.
//!
//! 5. **Fail Fast**: a malformed descriptor is rejected when the
//!    [`ClassDescriptor`] is built, before any text is produced.

mod companion;
mod descriptor;
mod error;
mod generator;
mod invoke;
mod method;
#[cfg(feature = "napi")]
mod native;
mod value;
mod verify;

#[cfg(test)]
mod generator_tests;

pub use companion::{simple_name, DirectoryResolver, MapResolver, NoCompanion, ScriptResolver};
pub use descriptor::{
    ClassDescriptor, ClassDescriptorBuilder, Member, MemberKind, SelectorShape, CATCH_ALL_MEMBER,
    PROMISE_SENTINEL,
};
pub use error::{GenerateError, SerializeError};
pub use generator::{
    generate_all, BindingRequest, Diagnostic, GeneratorOptions, StubGenerator, StubOutput,
    CATCH_ALL_STUB,
};
pub use invoke::{invoke, Receiver, SnapshotReceiver};
pub use method::MethodStubBuilder;
#[cfg(feature = "napi")]
pub use native::{generate_stub_native, stub_bridge};
pub use value::{quote_js_string, serialize_value, NativeValue};
pub use verify::{verify_module, DefinedProperty, ExportedFunction, ModuleShape};
