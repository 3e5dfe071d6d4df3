//! Class Descriptor Module
//!
//! The introspected surface of one native class: an ordered member list,
//! the method/property split, read-only flags, the constructor selector and
//! the catch-all member. This is the input contract of the stub generator.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;

use crate::error::GenerateError;

/// Reserved trailing slot name that switches a method into promise mode.
pub const PROMISE_SENTINEL: &str = "_Promise";

/// Member name that marks the generic catch-all invocation entry point.
pub const CATCH_ALL_MEMBER: &str = "function";

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();

    /// Words that are legal property names but never legal parameter names.
    static ref RESERVED_WORDS: HashSet<&'static str> = [
        "arguments", "await", "break", "case", "catch", "class", "const", "continue",
        "debugger", "default", "delete", "do", "else", "enum", "eval", "export",
        "extends", "false", "finally", "for", "function", "if", "implements", "import",
        "in", "instanceof", "interface", "let", "new", "null", "package", "private",
        "protected", "public", "return", "static", "super", "switch", "this", "throw",
        "true", "try", "typeof", "var", "void", "while", "with", "yield",
    ]
    .into_iter()
    .collect();
}

/// True when `name` can follow a `.` in a member access.
pub(crate) fn is_identifier_name(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// True when `name` can be declared as a function parameter.
pub(crate) fn is_binding_identifier(name: &str) -> bool {
    is_identifier_name(name) && !RESERVED_WORDS.contains(name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTOR SHAPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered argument slots of a method. `None` is a slot without an external name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub struct SelectorShape {
    slots: Vec<Option<String>>,
}

impl SelectorShape {
    /// Parse the reflection form of a selector, e.g. `jsfunc_echo::message:`.
    ///
    /// The leading component is the selector base and carries no parameter;
    /// everything after the final `:` is discarded. Each component in between
    /// is one slot, an empty component being an unnamed slot.
    pub fn parse(text: &str) -> Self {
        let mut components: Vec<&str> = text.split(':').collect();
        if components.len() < 2 {
            return Self::default();
        }
        components.remove(0);
        components.pop();

        Self::from_slots(components)
    }

    /// Build a shape from slot labels; an empty label is an unnamed slot.
    pub fn from_slots<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let slots = labels
            .into_iter()
            .map(|label| {
                let label = label.as_ref();
                (!label.is_empty()).then(|| label.to_string())
            })
            .collect();
        Self { slots }
    }

    /// A shape of `count` unnamed slots.
    pub fn unnamed(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    pub fn slots(&self) -> &[Option<String>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Script parameter names, one per slot.
    ///
    /// Slots without a usable identifier get the positional name `__<index>`.
    pub fn param_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Some(name) if is_binding_identifier(name) => name.clone(),
                _ => format!("__{}", index),
            })
            .collect()
    }

    /// Whether the final slot is the promise sentinel.
    pub fn is_promise(&self) -> bool {
        self.param_names().last().map(String::as_str) == Some(PROMISE_SENTINEL)
    }

    fn check_unique(&self, member: &str) -> Result<(), GenerateError> {
        let mut seen = HashSet::new();
        for name in self.param_names() {
            if !seen.insert(name.clone()) {
                return Err(GenerateError::DuplicateSlot {
                    member: member.to_string(),
                    slot: name,
                });
            }
        }
        Ok(())
    }
}

impl From<String> for SelectorShape {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<&str> for SelectorShape {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMBERS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MemberKind {
    Method {
        selector: SelectorShape,
    },
    Property {
        #[serde(default)]
        readonly: bool,
        /// Accessor handle handed to the invocation collaborator.
        #[serde(default)]
        getter: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(flatten)]
    pub kind: MemberKind,
}

impl Member {
    pub fn is_method(&self) -> bool {
        matches!(self.kind, MemberKind::Method { .. })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASS DESCRIPTOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    class_name: String,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    constructor: Option<SelectorShape>,
}

/// Immutable description of one native class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct ClassDescriptor {
    class_name: String,
    members: Vec<Member>,
    constructor: Option<SelectorShape>,
}

impl TryFrom<RawDescriptor> for ClassDescriptor {
    type Error = GenerateError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        Self::new(raw.class_name, raw.members, raw.constructor)
    }
}

impl ClassDescriptor {
    pub fn new(
        class_name: impl Into<String>,
        members: Vec<Member>,
        constructor: Option<SelectorShape>,
    ) -> Result<Self, GenerateError> {
        let class_name = class_name.into();
        if class_name.trim().is_empty() {
            return Err(GenerateError::EmptyClassName);
        }

        let mut seen = HashSet::new();
        for member in &members {
            if member.name.is_empty() {
                return Err(GenerateError::EmptyMemberName { class: class_name });
            }
            if !seen.insert(member.name.as_str()) {
                return Err(GenerateError::DuplicateMember {
                    class: class_name.clone(),
                    member: member.name.clone(),
                });
            }
            if let MemberKind::Method { selector } = &member.kind {
                selector.check_unique(&member.name)?;
            }
        }
        if let Some(selector) = &constructor {
            selector.check_unique("+")?;
        }

        Ok(Self {
            class_name,
            members,
            constructor,
        })
    }

    pub fn builder(class_name: impl Into<String>) -> ClassDescriptorBuilder {
        ClassDescriptorBuilder {
            class_name: class_name.into(),
            members: Vec::new(),
            constructor: None,
        }
    }

    /// Parse the JSON form produced by a reflection adapter.
    pub fn from_json(json: &str) -> Result<Self, GenerateError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, GenerateError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Members in enumeration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.member(name).is_some_and(Member::is_method)
    }

    pub fn constructor(&self) -> Option<&SelectorShape> {
        self.constructor.as_ref()
    }

    pub fn has_catch_all(&self) -> bool {
        self.has_method(CATCH_ALL_MEMBER)
    }
}

pub struct ClassDescriptorBuilder {
    class_name: String,
    members: Vec<Member>,
    constructor: Option<SelectorShape>,
}

impl ClassDescriptorBuilder {
    pub fn method(mut self, name: impl Into<String>, selector: impl Into<SelectorShape>) -> Self {
        self.members.push(Member {
            name: name.into(),
            kind: MemberKind::Method {
                selector: selector.into(),
            },
        });
        self
    }

    /// A property without a getter; its initial value is always `undefined`.
    pub fn property(self, name: impl Into<String>, readonly: bool) -> Self {
        self.property_with_getter(name, readonly, None::<String>)
    }

    pub fn property_with_getter(
        mut self,
        name: impl Into<String>,
        readonly: bool,
        getter: Option<impl Into<String>>,
    ) -> Self {
        self.members.push(Member {
            name: name.into(),
            kind: MemberKind::Property {
                readonly,
                getter: getter.map(Into::into),
            },
        });
        self
    }

    pub fn constructor(mut self, selector: impl Into<SelectorShape>) -> Self {
        self.constructor = Some(selector.into());
        self
    }

    pub fn build(self) -> Result<ClassDescriptor, GenerateError> {
        ClassDescriptor::new(self.class_name, self.members, self.constructor)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
