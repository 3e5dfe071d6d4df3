//! Output Verifier
//!
//! Parses a generated module with oxc and reads back the surface it
//! promises: exported function stubs with their arity and forwarded
//! arguments, defined properties with their writability, and the arguments of
//! the trailing `create` call.

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFunction {
    pub name: String,
    pub params: Vec<String>,
    /// Source text of each element of the argument array handed to the
    /// first two-argument call in the body.
    pub forwarded: Vec<String>,
    /// Names the body binds again (`var` declarations and inner function
    /// parameters) or constructs with `new`.
    pub inner_names: Vec<String>,
}

impl ExportedFunction {
    /// True when every parameter reaches the forwarded array by position and
    /// no parameter is shadowed by, or shadows, a name the body relies on.
    pub fn forwards_params_intact(&self) -> bool {
        self.forwarded.len() >= self.params.len()
            && self.params.iter().zip(&self.forwarded).all(|(p, f)| p == f)
            && !self.params.iter().any(|p| self.inner_names.contains(p))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinedProperty {
    pub name: String,
    /// Source text of the initial value argument.
    pub initial: String,
    pub writable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleShape {
    pub functions: Vec<ExportedFunction>,
    pub properties: Vec<DefinedProperty>,
    /// Source text of every `create(...)` argument past channel and namespace.
    pub create_extras: Vec<String>,
}

impl ModuleShape {
    pub fn function(&self, name: &str) -> Option<&ExportedFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&DefinedProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Parse `code` as a classic script and extract its [`ModuleShape`].
pub fn verify_module(code: &str) -> Result<ModuleShape, GenerateError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, code, source_type).parse();

    if !ret.errors.is_empty() {
        return Err(GenerateError::InvalidOutput(
            ret.errors.iter().map(|e| e.to_string()).collect(),
        ));
    }

    let mut collector = ShapeCollector {
        source: code,
        shape: ModuleShape::default(),
    };
    collector.visit_program(&ret.program);
    Ok(collector.shape)
}

struct ShapeCollector<'s> {
    source: &'s str,
    shape: ModuleShape,
}

impl ShapeCollector<'_> {
    fn text(&self, node: &impl GetSpan) -> String {
        let span = node.span();
        self.source[span.start as usize..span.end as usize].to_string()
    }

    fn export_name(target: &AssignmentTarget) -> Option<String> {
        match target {
            AssignmentTarget::StaticMemberExpression(member) if is_exports(&member.object) => {
                Some(member.property.name.to_string())
            }
            AssignmentTarget::ComputedMemberExpression(member) if is_exports(&member.object) => {
                match &member.expression {
                    Expression::StringLiteral(lit) => Some(lit.value.to_string()),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn is_exports(expr: &Expression) -> bool {
    matches!(expr, Expression::Identifier(id) if id.name == "exports")
}

impl<'a> Visit<'a> for ShapeCollector<'_> {
    fn visit_assignment_expression(&mut self, expr: &AssignmentExpression<'a>) {
        if let (Some(name), Expression::FunctionExpression(func)) =
            (Self::export_name(&expr.left), &expr.right)
        {
            let params = func
                .params
                .items
                .iter()
                .map(|param| self.text(&param.pattern))
                .collect();
            let mut body = BodyCollector {
                source: self.source,
                forwarded: None,
                inner_names: Vec::new(),
            };
            if let Some(function_body) = &func.body {
                body.visit_function_body(function_body);
            }
            self.shape.functions.push(ExportedFunction {
                name,
                params,
                forwarded: body.forwarded.unwrap_or_default(),
                inner_names: body.inner_names,
            });
        }
        walk::walk_assignment_expression(self, expr);
    }

    fn visit_call_expression(&mut self, expr: &CallExpression<'a>) {
        if let Expression::StaticMemberExpression(callee) = &expr.callee {
            match callee.property.name.as_str() {
                "defineProperty" if expr.arguments.len() == 4 => {
                    if let (Argument::StringLiteral(name), Argument::BooleanLiteral(writable)) =
                        (&expr.arguments[1], &expr.arguments[3])
                    {
                        let initial = self.text(&expr.arguments[2]);
                        self.shape.properties.push(DefinedProperty {
                            name: name.value.to_string(),
                            initial,
                            writable: writable.value,
                        });
                    }
                }
                "create" => {
                    self.shape.create_extras = expr
                        .arguments
                        .iter()
                        .skip(2)
                        .map(|arg| self.text(arg))
                        .collect();
                }
                _ => {}
            }
        }
        walk::walk_call_expression(self, expr);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STUB BODY
// ═══════════════════════════════════════════════════════════════════════════════

struct BodyCollector<'s> {
    source: &'s str,
    forwarded: Option<Vec<String>>,
    inner_names: Vec<String>,
}

impl<'a> Visit<'a> for BodyCollector<'_> {
    fn visit_call_expression(&mut self, expr: &CallExpression<'a>) {
        if self.forwarded.is_none() && expr.arguments.len() == 2 {
            if let Argument::ArrayExpression(array) = &expr.arguments[1] {
                self.forwarded = Some(
                    array
                        .elements
                        .iter()
                        .map(|element| {
                            let span = element.span();
                            self.source[span.start as usize..span.end as usize].to_string()
                        })
                        .collect(),
                );
            }
        }
        walk::walk_call_expression(self, expr);
    }

    fn visit_variable_declarator(&mut self, decl: &VariableDeclarator<'a>) {
        if let BindingPattern::BindingIdentifier(id) = &decl.id {
            self.inner_names.push(id.name.to_string());
        }
        walk::walk_variable_declarator(self, decl);
    }

    fn visit_formal_parameter(&mut self, param: &FormalParameter<'a>) {
        if let BindingPattern::BindingIdentifier(id) = &param.pattern {
            self.inner_names.push(id.name.to_string());
        }
        walk::walk_formal_parameter(self, param);
    }

    fn visit_new_expression(&mut self, expr: &NewExpression<'a>) {
        if let Expression::Identifier(id) = &expr.callee {
            self.inner_names.push(id.name.to_string());
        }
        walk::walk_new_expression(self, expr);
    }
}
