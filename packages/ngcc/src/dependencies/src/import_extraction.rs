//! Enumerate the module specifiers a source file imports.

use crate::ngtsc::file_system::AbsoluteFsPath;
use once_cell::sync::Lazy;
use oxc_allocator::Allocator;
use oxc_ast::ast::{self, Argument, Expression, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;

static IMPORT_OR_REEXPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\b(?:import|export)\b[\s\S]*?["']"#).unwrap());

static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\brequire\s*\(\s*["']"#).unwrap());

/// The module syntax a dependency host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportSyntax {
    /// `import`/`export ... from` statements, value imports only.
    Esm,
    /// `require()` calls anywhere in the file, including the UMD wrapper and factory.
    Umd,
    /// `require()` calls outside of function bodies.
    CommonJs,
    /// Every `import`/`export ... from` statement of a `.d.ts` file, type-only ones included.
    Dts,
}

impl ImportSyntax {
    /// Whether `contents` cannot contain any import this syntax recognises.
    pub fn can_skip(&self, contents: &str) -> bool {
        match self {
            ImportSyntax::Esm | ImportSyntax::Dts => !IMPORT_OR_REEXPORT.is_match(contents),
            ImportSyntax::Umd | ImportSyntax::CommonJs => !REQUIRE_CALL.is_match(contents),
        }
    }

    fn source_type(&self, path: &AbsoluteFsPath) -> SourceType {
        let source_type = SourceType::from_path(path.as_path()).unwrap_or_default();
        match self {
            ImportSyntax::Esm => source_type.with_module(true),
            ImportSyntax::Dts => source_type.with_typescript(true).with_module(true),
            ImportSyntax::Umd | ImportSyntax::CommonJs => source_type.with_module(false),
        }
    }
}

/// Parse `contents` and return its import specifiers in source order.
pub fn extract_imports(syntax: ImportSyntax, path: &AbsoluteFsPath, contents: &str) -> Vec<String> {
    if syntax.can_skip(contents) {
        return Vec::new();
    }

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, contents, syntax.source_type(path)).parse();

    match syntax {
        ImportSyntax::Esm | ImportSyntax::Dts => {
            let include_types = syntax == ImportSyntax::Dts;
            ret.program
                .body
                .iter()
                .filter_map(|stmt| module_specifier(stmt, include_types))
                .collect()
        }
        ImportSyntax::Umd | ImportSyntax::CommonJs => {
            let mut collector = RequireCallCollector {
                descend_into_functions: syntax == ImportSyntax::Umd,
                specifiers: Vec::new(),
            };
            collector.visit_statements(&ret.program.body);
            collector.specifiers
        }
    }
}

fn module_specifier(stmt: &Statement<'_>, include_types: bool) -> Option<String> {
    match stmt {
        Statement::ImportDeclaration(decl) => (include_types || decl.import_kind.is_value())
            .then(|| decl.source.value.to_string()),
        Statement::ExportNamedDeclaration(decl) => {
            if include_types || decl.export_kind.is_value() {
                decl.source.as_ref().map(|s| s.value.to_string())
            } else {
                None
            }
        }
        Statement::ExportAllDeclaration(decl) => (include_types || decl.export_kind.is_value())
            .then(|| decl.source.value.to_string()),
        Statement::TSImportEqualsDeclaration(decl) if include_types => {
            match &decl.module_reference {
                ast::TSModuleReference::ExternalModuleReference(reference) => {
                    Some(reference.expression.value.to_string())
                }
                _ => None,
            }
        }
        _ => None,
    }
}

struct RequireCallCollector {
    descend_into_functions: bool,
    specifiers: Vec<String>,
}

impl RequireCallCollector {
    fn visit_statements(&mut self, stmts: &[Statement<'_>]) {
        for stmt in stmts {
            self.visit_statement(stmt);
        }
    }

    fn visit_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::ExpressionStatement(s) => self.visit_expression(&s.expression),
            Statement::BlockStatement(s) => self.visit_statements(&s.body),
            Statement::IfStatement(s) => {
                self.visit_expression(&s.test);
                self.visit_statement(&s.consequent);
                if let Some(alt) = &s.alternate {
                    self.visit_statement(alt);
                }
            }
            Statement::ReturnStatement(s) => {
                if let Some(arg) = &s.argument {
                    self.visit_expression(arg);
                }
            }
            Statement::VariableDeclaration(s) => self.visit_variable_declaration(s),
            Statement::FunctionDeclaration(f) => {
                if self.descend_into_functions {
                    if let Some(body) = &f.body {
                        self.visit_statements(&body.statements);
                    }
                }
            }
            _ => {}
        }
    }

    fn visit_variable_declaration(&mut self, decl: &ast::VariableDeclaration<'_>) {
        for declarator in &decl.declarations {
            if let Some(init) = &declarator.init {
                self.visit_expression(init);
            }
        }
    }

    fn visit_expression(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::CallExpression(call) => self.visit_call_expression(call),
            Expression::AssignmentExpression(e) => self.visit_expression(&e.right),
            Expression::SequenceExpression(e) => {
                for ex in &e.expressions {
                    self.visit_expression(ex);
                }
            }
            Expression::ParenthesizedExpression(e) => self.visit_expression(&e.expression),
            Expression::ConditionalExpression(e) => {
                self.visit_expression(&e.test);
                self.visit_expression(&e.consequent);
                self.visit_expression(&e.alternate);
            }
            Expression::LogicalExpression(e) => {
                self.visit_expression(&e.left);
                self.visit_expression(&e.right);
            }
            Expression::UnaryExpression(e) => self.visit_expression(&e.argument),
            Expression::StaticMemberExpression(e) => self.visit_expression(&e.object),
            Expression::ObjectExpression(e) => {
                for prop in &e.properties {
                    if let ast::ObjectPropertyKind::ObjectProperty(prop) = prop {
                        self.visit_expression(&prop.value);
                    }
                }
            }
            Expression::FunctionExpression(e) => {
                if self.descend_into_functions {
                    if let Some(body) = &e.body {
                        self.visit_statements(&body.statements);
                    }
                }
            }
            Expression::ArrowFunctionExpression(e) => {
                if self.descend_into_functions {
                    self.visit_statements(&e.body.statements);
                }
            }
            _ => {}
        }
    }

    fn visit_call_expression(&mut self, call: &ast::CallExpression<'_>) {
        if let Expression::Identifier(ident) = &call.callee {
            if ident.name.as_str() == "require" {
                if let Some(Argument::StringLiteral(lit)) = call.arguments.first() {
                    self.specifiers.push(lit.value.to_string());
                }
                return;
            }
        }

        // The UMD wrapper is an IIFE whose factory is passed as an argument.
        self.visit_expression(&call.callee);
        for arg in &call.arguments {
            if let Some(expr) = arg.as_expression() {
                self.visit_expression(expr);
            }
        }
    }
}
