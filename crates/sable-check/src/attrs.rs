//! Attribute well-formedness checking.
//!
//! The checker only validates attributes; their semantic effect belongs to
//! downstream passes. `export` and `import` are function-shaped, `intern`
//! names a symbol for the runtime.

use std::collections::HashMap;

use sable_ast::{Attr, AttrKind, DeclId, DeclKind, ExprKind, Lit};
use sable_diag::{Category, Diagnostic, Sink};
use sable_types::TypeKind;

use crate::TypeChecker;

/// Shape of an accepted attribute argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrArg {
    String,
    Integer,
    Path,
}

/// Built-in functions an `import(cc = "builtin")` may name.
const BUILTINS: &[&str] = &[
    "alignof", "bitcast", "insert", "select", "sizeof", "undef", "fabs", "copysign", "signbit",
    "round", "ceil", "floor", "fmin", "fmax", "cos", "sin", "tan", "sqrt", "cbrt", "pow", "exp",
    "exp2", "log", "log2", "log10", "isnan", "isfinite",
];

impl<S: Sink> TypeChecker<'_, S> {
    pub(crate) fn check_decl_attrs(&mut self, id: DeclId) {
        if !self.attrs_checked.insert(id) {
            return;
        }
        let attrs = self.ast.decl(id).attrs.clone();
        for attr in &attrs {
            match attr.name.as_str() {
                "export" | "import" => self.check_linkage_attr(id, attr),
                "intern" => {
                    self.check_attr_args(attr, &[("name", AttrArg::String)]);
                }
                _ => self.invalid_attr(attr.span, &attr.name),
            }
        }
    }

    fn check_linkage_attr(&mut self, id: DeclId, attr: &Attr) {
        let is_import = attr.name == "import";
        match &self.ast.decl(id).kind {
            DeclKind::Fn(decl) => {
                let decl = decl.clone();
                let span = self.ast.decl(id).span;
                let body = match &self.ast.expr(decl.lambda).kind {
                    ExprKind::Lambda(lambda) => lambda.body,
                    _ => None,
                };
                if is_import {
                    if self.check_attr_args(
                        attr,
                        &[("cc", AttrArg::String), ("name", AttrArg::String)],
                    ) {
                        let name = attr
                            .find("name")
                            .and_then(Attr::string_value)
                            .unwrap_or(&decl.name)
                            .to_string();
                        if let Some(cc_attr) = attr.find("cc") {
                            let cc_span = cc_attr.span;
                            match cc_attr.string_value() {
                                Some("builtin") => {
                                    if !BUILTINS.contains(&name.as_str()) {
                                        self.plain_error(
                                            Category::InvalidAttribute,
                                            span,
                                            "unsupported built-in function".to_string(),
                                        );
                                    }
                                }
                                Some("C") | Some("device") | None => {}
                                Some(cc) => {
                                    let message =
                                        format!("invalid calling convention '{cc}'");
                                    self.plain_error(
                                        Category::InvalidAttribute,
                                        cc_span,
                                        message,
                                    );
                                }
                            }
                        }
                    }
                    if body.is_some() {
                        self.plain_error(
                            Category::InvalidAttribute,
                            span,
                            "imported functions cannot have a body".to_string(),
                        );
                    }
                } else {
                    let decl_type = self.result.decl_type(id);
                    let is_fn_type = decl_type
                        .map(|ty| matches!(self.table.kind(ty), TypeKind::Fn { .. }))
                        .unwrap_or(false);
                    if !is_fn_type {
                        self.plain_error(
                            Category::InvalidAttribute,
                            span,
                            "polymorphic functions cannot be exported".to_string(),
                        );
                    } else if decl_type.map(|ty| self.table.order(ty)).unwrap_or(0) > 1 {
                        self.plain_error(
                            Category::InvalidAttribute,
                            span,
                            "higher-order functions cannot be exported".to_string(),
                        );
                    } else if body.is_none() {
                        self.plain_error(
                            Category::InvalidAttribute,
                            span,
                            "exported functions must have a body".to_string(),
                        );
                    } else {
                        self.check_attr_args(attr, &[("name", AttrArg::String)]);
                    }
                }
            }
            DeclKind::Static(decl) => {
                let top_level = decl.top_level;
                if is_import {
                    self.plain_error(
                        Category::InvalidAttribute,
                        attr.span,
                        format!("attribute '{}' is only valid for function declarations", attr.name),
                    );
                }
                if !top_level {
                    self.plain_error(
                        Category::InvalidAttribute,
                        attr.span,
                        format!("attribute '{}' is only valid for top level declarations", attr.name),
                    );
                }
            }
            _ => {
                let message = if is_import {
                    format!("attribute '{}' is only valid for function declarations", attr.name)
                } else {
                    format!(
                        "attribute '{}' is only valid for function and static declarations",
                        attr.name
                    )
                };
                self.plain_error(Category::InvalidAttribute, attr.span, message);
            }
        }
    }

    /// Validate the argument list of a named attribute: no redeclarations,
    /// no unknown names, and literal kinds as declared.
    fn check_attr_args(&mut self, attr: &Attr, accepted: &[(&str, AttrArg)]) -> bool {
        let AttrKind::Named(args) = &attr.kind else {
            self.plain_error(
                Category::InvalidAttribute,
                attr.span,
                format!("malformed '{}' attribute", attr.name),
            );
            return false;
        };
        let mut seen: HashMap<&str, &Attr> = HashMap::new();
        for arg in args {
            if let Some(previous) = seen.insert(arg.name.as_str(), arg) {
                let diag = Diagnostic::error(
                    Category::InvalidAttribute,
                    format!("redeclaration of attribute '{}'", arg.name),
                )
                .at(self.loc(arg.span))
                .with_note_at(self.loc(previous.span), "previously declared here");
                self.emit(diag);
                return false;
            }
        }
        for arg in args {
            let Some((_, kind)) = accepted.iter().find(|(name, _)| *name == arg.name) else {
                self.plain_error(
                    Category::InvalidAttribute,
                    arg.span,
                    format!("unsupported attribute '{}'", arg.name),
                );
                return false;
            };
            let matches_kind = match (&arg.kind, kind) {
                (AttrKind::Lit(Lit::Str(_)), AttrArg::String) => true,
                (AttrKind::Lit(Lit::Int(_)), AttrArg::Integer) => true,
                (AttrKind::Path(_), AttrArg::Path) => true,
                _ => false,
            };
            if !matches_kind {
                self.plain_error(
                    Category::InvalidAttribute,
                    arg.span,
                    format!("malformed '{}' attribute", arg.name),
                );
                return false;
            }
        }
        true
    }
}
