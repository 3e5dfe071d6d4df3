//! End-to-end tests for generated modules.
//!
//! Every module produced here is parsed back with the verifier, so each test
//! also checks that the output is valid script.

#[cfg(test)]
mod tests {
    use crate::companion::MapResolver;
    use crate::descriptor::{ClassDescriptor, SelectorShape};
    use crate::generator::{generate_all, BindingRequest, GeneratorOptions, StubGenerator};
    use crate::invoke::{Receiver, SnapshotReceiver};
    use crate::value::NativeValue;
    use crate::verify::verify_module;

    fn echo_descriptor() -> ClassDescriptor {
        ClassDescriptor::builder("demo.Echo")
            .method("echo", "jsfunc_echo::message:")
            .method("fetch", "jsfunc_fetch::url:_Promise:")
            .property_with_getter("prefix", false, Some("prefix"))
            .property_with_getter("version", true, Some("version"))
            .property("lastMessage", false)
            .build()
            .unwrap()
    }

    fn echo_snapshot() -> SnapshotReceiver {
        SnapshotReceiver::new()
            .with("prefix", NativeValue::String("echo: ".to_string()))
            .with("version", NativeValue::Float(1.5))
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // SCENARIOS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_two_unnamed_slots() {
        let descriptor = ClassDescriptor::builder("Calc")
            .method("add:with:", SelectorShape::unnamed(2))
            .build()
            .unwrap();
        let output = StubGenerator::new(&descriptor).generate("channel", "calc", None);

        assert!(output.code.contains(
            "exports['add:with:'] = function(__0, __1) { this.invoke('add:with:', [__0, __1]); };"
        ));
        let shape = verify_module(&output.code).unwrap();
        assert_eq!(shape.function("add:with:").unwrap().params, vec!["__0", "__1"]);
    }

    #[test]
    fn test_full_module_text() {
        let descriptor = echo_descriptor();
        let snapshot = echo_snapshot();
        let output = StubGenerator::new(&descriptor).generate("channel", "echo", Some(&snapshot));

        let expected = "(function(exports) {\n\
exports.echo = function(__0, message) { this.invoke('echo', [__0, message]); };\n\
exports.fetch = function(__0, url) {\n    var _this = this;\n    return new Promise(function(resolve, reject) {\n        _this.invoke('fetch', [__0, url, {'resolve': resolve, 'reject': reject}]);\n    });\n};\n\
Extension.defineProperty(exports, 'prefix', 'echo: ', true);\n\
Extension.defineProperty(exports, 'version', 1.5, false);\n\
Extension.defineProperty(exports, 'lastMessage', undefined, true);\n\
\n})(Extension.create(channel, 'echo'));\n";
        assert_eq!(output.code, expected);
        assert!(!output.has_diagnostics());
    }

    #[test]
    fn test_promise_method_forwards_settlers() {
        let descriptor = ClassDescriptor::builder("Net")
            .method("load", SelectorShape::from_slots(["", "_Promise"]))
            .build()
            .unwrap();
        let output = StubGenerator::new(&descriptor).generate("channel", "net", None);

        assert!(output.code.contains("var _this = this;"));
        assert!(output.code.contains("return new Promise(function(resolve, reject) {"));
        assert!(output
            .code
            .contains("_this.invoke('load', [__0, {'resolve': resolve, 'reject': reject}]);"));

        let shape = verify_module(&output.code).unwrap();
        assert_eq!(shape.function("load").unwrap().params, vec!["__0"]);
    }

    #[test]
    fn test_constructor_extends_create_call() {
        let descriptor = ClassDescriptor::builder("Echo")
            .method("echo", "jsfunc_echo::message:")
            .method("function", "jsfunc_function:")
            .constructor("initFromJavaScript::prefix:")
            .build()
            .unwrap();
        let output = StubGenerator::new(&descriptor).generate("channel", "echo", None);

        assert!(output.code.ends_with(
            "})(Extension.create(channel, 'echo', function(__0, prefix) { this.invoke('+', [__0, prefix]); }, true));\n"
        ));
        let shape = verify_module(&output.code).unwrap();
        assert_eq!(shape.create_extras.len(), 2);
        assert_eq!(shape.create_extras[1], "true");
    }

    #[test]
    fn test_catch_all_without_constructor() {
        let descriptor = ClassDescriptor::builder("Dispatcher")
            .method("function", "jsfunc_function::")
            .build()
            .unwrap();
        let output = StubGenerator::new(&descriptor).generate("channel", "dispatch", None);

        assert!(output.code.ends_with(
            "Extension.create(channel, 'dispatch', function(){return arguments.callee.function.apply(arguments.callee, arguments);}));\n"
        ));
        let shape = verify_module(&output.code).unwrap();
        assert_eq!(shape.create_extras.len(), 1);
        assert_eq!(shape.function("function").unwrap().params.len(), 1);
    }

    #[test]
    fn test_no_extra_create_arguments_by_default() {
        let output = StubGenerator::new(&echo_descriptor()).generate("channel", "echo", None);
        let shape = verify_module(&output.code).unwrap();
        assert!(shape.create_extras.is_empty());
    }

    #[test]
    fn test_mapping_property_serializes_as_json() {
        let descriptor = ClassDescriptor::builder("Screen")
            .property_with_getter("size", true, Some("size"))
            .build()
            .unwrap();
        let snapshot = SnapshotReceiver::new().with(
            "size",
            NativeValue::Object(vec![
                ("height".to_string(), NativeValue::Int(480)),
                ("width".to_string(), NativeValue::Int(640)),
            ]),
        );
        let output = StubGenerator::new(&descriptor).generate("channel", "screen", Some(&snapshot));

        let shape = verify_module(&output.code).unwrap();
        let size = shape.property("size").unwrap();
        assert_eq!(
            size.initial,
            serde_json::json!({ "height": 480, "width": 640 }).to_string()
        );
        assert!(!size.writable);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // PROPERTIES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_param_count_tracks_promise_sentinel() {
        let selectors = [
            "jsfunc_a",
            "jsfunc_b::",
            "jsfunc_c::x:",
            "jsfunc_d:_Promise:",
            "jsfunc_e::_Promise:",
            "jsfunc_f:with:in:_Promise:",
        ];
        let mut builder = ClassDescriptor::builder("Shapes");
        for (i, selector) in selectors.iter().enumerate() {
            builder = builder.method(format!("m{}", i), *selector);
        }
        let descriptor = builder.build().unwrap();
        let output = StubGenerator::new(&descriptor).generate("channel", "shapes", None);
        let shape = verify_module(&output.code).unwrap();

        for (i, selector) in selectors.iter().enumerate() {
            let parsed = SelectorShape::parse(selector);
            let expected = if parsed.is_promise() {
                parsed.len() - 1
            } else {
                parsed.len()
            };
            let stub = shape.function(&format!("m{}", i)).unwrap();
            assert_eq!(stub.params.len(), expected, "selector {}", selector);
            assert!(!stub.params.iter().any(|p| p == "_Promise"));
            assert!(stub.forwards_params_intact(), "selector {}", selector);
        }
    }

    #[test]
    fn test_slot_labels_never_shadow_stub_locals() {
        let descriptor = ClassDescriptor::builder("Loader")
            .method("load", "jsfunc_load::resolve:_Promise:")
            .method("settle", "jsfunc_settle:_this:reject:Promise:_Promise:")
            .method("send", "jsfunc_send:self:resolve:")
            .build()
            .unwrap();
        for receiver in ["this", "self"] {
            let options = GeneratorOptions {
                receiver: receiver.to_string(),
                ..GeneratorOptions::default()
            };
            let output = StubGenerator::new(&descriptor)
                .with_options(options)
                .generate("channel", "loader", None);
            let shape = verify_module(&output.code).unwrap();

            for name in ["load", "settle", "send"] {
                let stub = shape.function(name).unwrap();
                assert!(stub.forwards_params_intact(), "{} with receiver {}", name, receiver);
                assert!(!stub.params.iter().any(|p| p == receiver));
            }
            assert_eq!(shape.function("load").unwrap().params, vec!["__0", "__1"]);
            assert_eq!(shape.function("settle").unwrap().params, vec!["__0", "__1", "__2"]);
        }
    }

    #[test]
    fn test_writable_flag_negates_readonly() {
        let output = StubGenerator::new(&echo_descriptor()).generate("channel", "echo", None);
        let shape = verify_module(&output.code).unwrap();

        assert!(shape.property("prefix").unwrap().writable);
        assert!(!shape.property("version").unwrap().writable);
        assert!(shape.property("lastMessage").unwrap().writable);
    }

    #[test]
    fn test_no_instance_means_undefined() {
        let output = StubGenerator::new(&echo_descriptor()).generate("channel", "echo", None);
        let shape = verify_module(&output.code).unwrap();

        assert_eq!(shape.properties.len(), 3);
        assert!(shape.properties.iter().all(|p| p.initial == "undefined"));
    }

    #[test]
    fn test_regeneration_is_byte_identical() {
        let descriptor = echo_descriptor();
        let snapshot = echo_snapshot();
        let generator = StubGenerator::new(&descriptor);

        let first = generator.generate("channel", "echo", Some(&snapshot));
        let second = generator.generate("channel", "echo", Some(&snapshot));
        assert_eq!(first.code, second.code);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_member_order_follows_descriptor() {
        let descriptor = ClassDescriptor::builder("Ordered")
            .property("zeta", false)
            .method("beta", "jsfunc_beta")
            .property("alpha", true)
            .build()
            .unwrap();
        let code = StubGenerator::new(&descriptor)
            .generate("channel", "ordered", None)
            .code;

        let zeta = code.find("'zeta'").unwrap();
        let beta = code.find("exports.beta").unwrap();
        let alpha = code.find("'alpha'").unwrap();
        assert!(zeta < beta && beta < alpha);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // LENIENCY & ESCAPING
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_unserializable_value_does_not_block_generation() {
        let descriptor = ClassDescriptor::builder("Broken")
            .property_with_getter("view", true, Some("view"))
            .property_with_getter("title", false, Some("title"))
            .build()
            .unwrap();
        let snapshot = SnapshotReceiver::new()
            .with("view", NativeValue::Opaque("<UIView: 0x1>".to_string()))
            .with("title", NativeValue::String("ok".to_string()));
        let output = StubGenerator::new(&descriptor).generate("channel", "broken", Some(&snapshot));

        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].member, "view");

        let shape = verify_module(&output.code).unwrap();
        assert_eq!(shape.property("view").unwrap().initial, "undefined");
        assert_eq!(shape.property("title").unwrap().initial, "'ok'");
    }

    #[test]
    fn test_hostile_strings_stay_valid_script() {
        let descriptor = ClassDescriptor::builder("Quotes")
            .property_with_getter("text", false, Some("text"))
            .property_with_getter("failure", true, Some("failure"))
            .build()
            .unwrap();
        let snapshot = SnapshotReceiver::new()
            .with(
                "text",
                NativeValue::String("it's\n'); alert(1); ('".to_string()),
            )
            .with(
                "failure",
                NativeValue::Error("Error Domain=x Code=1 'bad'\n".to_string()),
            );
        let output =
            StubGenerator::new(&descriptor).generate("channel", "it's", Some(&snapshot));

        let shape = verify_module(&output.code).unwrap();
        assert_eq!(shape.properties.len(), 2);
        assert!(output.code.contains("Extension.create(channel, 'it\\'s')"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // COLLABORATORS & OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_companion_script_is_appended() {
        let descriptor = echo_descriptor();
        let resolver =
            MapResolver::new().with("Echo", "exports.echoTwice = function(m) { exports.echo(m); exports.echo(m); };");
        let output = StubGenerator::new(&descriptor)
            .with_resolver(&resolver)
            .generate("channel", "echo", None);

        let companion = output.code.find("exports.echoTwice").unwrap();
        let last_member = output.code.find("'lastMessage'").unwrap();
        let create = output.code.find("Extension.create").unwrap();
        assert!(last_member < companion && companion < create);

        let shape = verify_module(&output.code).unwrap();
        assert_eq!(shape.function("echoTwice").unwrap().params, vec!["m"]);
    }

    #[test]
    fn test_custom_options() {
        let options = GeneratorOptions {
            receiver: "self".to_string(),
            invoke_method: "invokeNative".to_string(),
            extension_object: "bridge".to_string(),
            verify_output: true,
        };
        let output = StubGenerator::new(&echo_descriptor())
            .with_options(options)
            .generate("channel", "echo", None);

        assert!(output
            .code
            .contains("exports.echo = function(__0, message) { self.invokeNative('echo', [__0, message]); };"));
        assert!(output.code.contains("bridge.defineProperty(exports, 'prefix', undefined, true);"));
        assert!(output.code.contains("})(bridge.create(channel, 'echo'));"));
        assert!(!output.has_diagnostics());
    }

    #[test]
    fn test_verify_output_reports_broken_companion() {
        let descriptor = echo_descriptor();
        let resolver = MapResolver::new().with("Echo", "exports.broken = function( {");
        let options = GeneratorOptions {
            verify_output: true,
            ..GeneratorOptions::default()
        };
        let output = StubGenerator::new(&descriptor)
            .with_options(options)
            .with_resolver(&resolver)
            .generate("channel", "echo", None);

        assert!(output.has_diagnostics());
        assert!(output.diagnostics.iter().all(|d| d.member.is_empty()));
    }

    #[test]
    fn test_generate_all_keeps_request_order() {
        let echo = echo_descriptor();
        let calc = ClassDescriptor::builder("Calc")
            .method("add", "jsfunc_add:::")
            .build()
            .unwrap();
        let snapshot = echo_snapshot();
        let requests = vec![
            BindingRequest {
                descriptor: &calc,
                channel_name: "calcChannel".to_string(),
                namespace: "calc".to_string(),
                instance: None,
            },
            BindingRequest {
                descriptor: &echo,
                channel_name: "echoChannel".to_string(),
                namespace: "echo".to_string(),
                instance: Some(&snapshot as &dyn Receiver),
            },
        ];

        let outputs = generate_all(&requests, &GeneratorOptions::default(), &MapResolver::new());
        assert_eq!(outputs.len(), 2);
        assert!(outputs[0].code.contains("Extension.create(calcChannel, 'calc')"));
        assert!(outputs[1].code.contains("'echo: '"));

        let single = StubGenerator::new(&echo).generate("echoChannel", "echo", Some(&snapshot));
        assert_eq!(outputs[1].code, single.code);
    }

    #[test]
    fn test_descriptor_json_end_to_end() {
        let descriptor = ClassDescriptor::from_json(
            r#"{
                "className": "demo/Echo",
                "members": [
                    {"name": "echo", "kind": "method", "selector": "jsfunc_echo::message:"},
                    {"name": "prefix", "kind": "property", "readonly": false, "getter": "prefix"}
                ],
                "constructor": "initFromJavaScript:"
            }"#,
        )
        .unwrap();
        let snapshot =
            SnapshotReceiver::from_value(serde_json::json!({ "prefix": "> " })).unwrap();
        let output = StubGenerator::new(&descriptor).generate("ch", "echo", Some(&snapshot));

        let shape = verify_module(&output.code).unwrap();
        assert_eq!(shape.property("prefix").unwrap().initial, "'> '");
        assert_eq!(
            shape.create_extras,
            vec!["function() { this.invoke('+', []); }", "true"]
        );
    }
}
