//! Method Stub Builder
//!
//! Emits the script proxy for one native method. The parameter list is
//! derived from the selector shape alone; a trailing promise sentinel turns
//! the stub into a promise-returning wrapper that hands the native side a
//! resolve/reject pair.

use crate::descriptor::{SelectorShape, PROMISE_SENTINEL};
use crate::value::quote_js_string;

/// Locals and globals the promise wrapper relies on.
const PROMISE_WRAPPER_NAMES: [&str; 4] = ["_this", "resolve", "reject", "Promise"];

pub struct MethodStubBuilder<'a> {
    receiver: &'a str,
    invoke_method: &'a str,
}

impl Default for MethodStubBuilder<'static> {
    fn default() -> Self {
        Self::new("this", "invoke")
    }
}

impl<'a> MethodStubBuilder<'a> {
    pub fn new(receiver: &'a str, invoke_method: &'a str) -> Self {
        Self {
            receiver,
            invoke_method,
        }
    }

    pub fn build(&self, name: &str, selector: &SelectorShape) -> String {
        let mut params = selector.param_names();
        let is_promise = params.last().map(String::as_str) == Some(PROMISE_SENTINEL);
        if is_promise {
            params.pop();
        }
        self.rename_wrapper_collisions(&mut params, is_promise);

        let list = params.join(", ");
        let name = quote_js_string(name);

        if is_promise {
            let separator = if list.is_empty() { "" } else { ", " };
            format!(
                "function({list}) {{\n    var _this = {receiver};\n    return new Promise(function(resolve, reject) {{\n        _this.{invoke}({name}, [{list}{separator}{{'resolve': resolve, 'reject': reject}}]);\n    }});\n}}",
                receiver = self.receiver,
                invoke = self.invoke_method,
            )
        } else {
            format!(
                "function({list}) {{ {receiver}.{invoke}({name}, [{list}]); }}",
                receiver = self.receiver,
                invoke = self.invoke_method,
            )
        }
    }

    /// Names the stub body binds or reads itself; a parameter with one of
    /// these names would shadow it.
    fn wrapper_names(&self, is_promise: bool) -> Vec<&str> {
        let mut names = Vec::new();
        let root = self
            .receiver
            .split(['.', '[', '('])
            .next()
            .unwrap_or(self.receiver)
            .trim();
        if !root.is_empty() {
            names.push(root);
        }
        if is_promise {
            names.extend(PROMISE_WRAPPER_NAMES);
        }
        names
    }

    /// Rename colliding parameters to `__<index>`, adding `_` until the name is free.
    fn rename_wrapper_collisions(&self, params: &mut [String], is_promise: bool) {
        let reserved = self.wrapper_names(is_promise);
        for index in 0..params.len() {
            if !reserved.contains(&params[index].as_str()) {
                continue;
            }
            let mut candidate = format!("__{}", index);
            while reserved.contains(&candidate.as_str())
                || params.iter().any(|p| *p == candidate)
            {
                candidate.push('_');
            }
            params[index] = candidate;
        }
    }
}
