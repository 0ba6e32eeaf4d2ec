//! Bidirectional type checking and inference for Sable.
//!
//! This crate implements:
//! - `infer`/`check` for every syntactic category (expressions, patterns,
//!   syntactic types, declarations)
//! - the typing side of path resolution, including local type-argument
//!   inference at call sites
//! - implicit coercions: reference dereference, subtype widening, and
//!   summoning of implicit parameters
//!
//! The checker never mutates the AST. Node types live in dense node-id side
//! tables with single-assignment enforcement; inserted implicit casts and
//! summoned arguments are recorded in [`CheckResult`] the same way, so the
//! tree plus the result describe the fully elaborated program.

mod attrs;
mod decls;
mod exprs;
mod filters;
mod generics;
mod pats;
mod paths;

#[cfg(test)]
mod checker_tests;

use std::collections::{HashMap, HashSet};

use sable_ast::{Ast, DeclId, ExprId, ExprKind, Lit, PatId, PathId, PrimTy, Span, TypeExprId};
use sable_diag::{Category, Diagnostic, Severity, Sink, SourceLocation, style};
use sable_types::{TypeBounds, TypeId, TypeKind, TypeTable};

pub use sable_diag::Diagnostics;

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Caller-facing knobs. The checker itself has no other configuration
/// surface; no environment variables influence its semantics.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Stop reporting (but keep counting) errors past this limit.
    pub max_errors: Option<usize>,
    /// Emit warnings in addition to errors.
    pub warnings: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            max_errors: None,
            warnings: true,
        }
    }
}

/// One slot of a call argument rebuilt for implicit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSlot {
    /// An argument the caller wrote, by its expression.
    Given(ExprId),
    /// A value summoned for an implicit position, at this type.
    Summon(TypeId),
}

/// Elaboration record for a checked path.
#[derive(Debug, Clone)]
pub struct PathInfo {
    pub ty: TypeId,
    pub is_value: bool,
    pub is_ctor: bool,
    /// Type of the path after each segment.
    pub seg_types: Vec<TypeId>,
    /// Explicit plus inferred type arguments, per segment.
    pub type_args: Vec<Vec<TypeId>>,
    /// Member index resolved for each segment (enum options, module members).
    pub indices: Vec<Option<usize>>,
}

/// Everything the checker learned about the tree, keyed by node id.
///
/// Inserted implicit casts and summons live here instead of being spliced
/// into the AST: `casts` holds the chain of implicit-cast targets applied
/// after evaluating an expression, `summons` marks unit expressions replaced
/// by a summoned value, and `arg_plans` records how a call argument was
/// reshaped around implicit parameters.
#[derive(Debug, Default)]
pub struct CheckResult {
    expr_types: Vec<Option<TypeId>>,
    pat_types: Vec<Option<TypeId>>,
    decl_types: Vec<Option<TypeId>>,
    type_expr_types: Vec<Option<TypeId>>,
    casts: HashMap<ExprId, Vec<TypeId>>,
    summons: HashMap<ExprId, TypeId>,
    arg_plans: HashMap<ExprId, Vec<ArgSlot>>,
    paths: HashMap<PathId, PathInfo>,
    /// Resolved enum variant for record expressions and patterns.
    expr_variants: HashMap<ExprId, usize>,
    pat_variants: HashMap<PatId, usize>,
    written: HashSet<ExprId>,
}

impl CheckResult {
    fn with_capacity(ast: &Ast) -> Self {
        Self {
            expr_types: vec![None; ast.exprs.len()],
            pat_types: vec![None; ast.pats.len()],
            decl_types: vec![None; ast.decls.len()],
            type_expr_types: vec![None; ast.type_exprs.len()],
            ..Self::default()
        }
    }

    /// The synthesized type of an expression, before implicit casts.
    pub fn expr_type(&self, id: ExprId) -> Option<TypeId> {
        self.expr_types[id.index()]
    }

    /// The type of an expression after its implicit-cast chain.
    pub fn coerced_expr_type(&self, id: ExprId) -> Option<TypeId> {
        match self.casts.get(&id).and_then(|chain| chain.last()) {
            Some(&ty) => Some(ty),
            None => self.expr_type(id),
        }
    }

    pub fn pat_type(&self, id: PatId) -> Option<TypeId> {
        self.pat_types[id.index()]
    }

    pub fn decl_type(&self, id: DeclId) -> Option<TypeId> {
        self.decl_types[id.index()]
    }

    pub fn type_expr_type(&self, id: TypeExprId) -> Option<TypeId> {
        self.type_expr_types[id.index()]
    }

    /// The implicit-cast chain applied to an expression, outermost last.
    pub fn casts(&self, id: ExprId) -> &[TypeId] {
        self.casts.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The summoned type replacing a unit expression, if any.
    pub fn summon(&self, id: ExprId) -> Option<TypeId> {
        self.summons.get(&id).copied()
    }

    /// The reshaped argument plan of a call argument, if any.
    pub fn arg_plan(&self, id: ExprId) -> Option<&[ArgSlot]> {
        self.arg_plans.get(&id).map(Vec::as_slice)
    }

    pub fn path_info(&self, id: PathId) -> Option<&PathInfo> {
        self.paths.get(&id)
    }

    pub fn expr_variant(&self, id: ExprId) -> Option<usize> {
        self.expr_variants.get(&id).copied()
    }

    pub fn pat_variant(&self, id: PatId) -> Option<usize> {
        self.pat_variants.get(&id).copied()
    }

    /// Whether the expression is the target of a write.
    pub fn is_written(&self, id: ExprId) -> bool {
        self.written.contains(&id)
    }
}

/// Mutability and address space stripped off a reference or pointer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AddrInfo {
    pub is_mut: bool,
    pub addr_space: u32,
}

// ---------------------------------------------------------------------------
// The checker
// ---------------------------------------------------------------------------

/// Single-threaded, synchronous checker for one resolved module tree.
pub struct TypeChecker<'a, S: Sink = Diagnostics> {
    pub(crate) ast: &'a Ast,
    pub table: TypeTable,
    sink: S,
    opts: CheckOptions,
    errors: usize,
    result: CheckResult,
    /// Declarations currently being inferred; re-entry means an
    /// uninferable recursion.
    in_progress: HashSet<DeclId>,
    /// Declarations whose attributes were already validated.
    attrs_checked: HashSet<DeclId>,
}

impl<'a, S: Sink> TypeChecker<'a, S> {
    pub fn new(ast: &'a Ast, opts: CheckOptions, sink: S) -> Self {
        Self {
            ast,
            table: TypeTable::new(),
            sink,
            opts,
            errors: 0,
            result: CheckResult::with_capacity(ast),
            in_progress: HashSet::new(),
            attrs_checked: HashSet::new(),
        }
    }

    /// Check a whole module tree. Returns true iff no error was reported.
    pub fn check_module(&mut self, root: DeclId) -> bool {
        self.infer_decl(root);
        self.errors == 0
    }

    pub fn result(&self) -> &CheckResult {
        &self.result
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (TypeTable, CheckResult, S) {
        (self.table, self.result, self.sink)
    }

    // -- Node type slots ----------------------------------------------------

    pub(crate) fn set_expr_type(&mut self, id: ExprId, ty: TypeId) {
        let slot = &mut self.result.expr_types[id.index()];
        assert!(slot.is_none(), "expression node checked twice");
        *slot = Some(ty);
    }

    pub(crate) fn set_pat_type(&mut self, id: PatId, ty: TypeId) {
        let slot = &mut self.result.pat_types[id.index()];
        assert!(slot.is_none(), "pattern node checked twice");
        *slot = Some(ty);
    }

    pub(crate) fn set_decl_type(&mut self, id: DeclId, ty: TypeId) {
        let slot = &mut self.result.decl_types[id.index()];
        assert!(slot.is_none(), "declaration checked twice");
        *slot = Some(ty);
    }

    pub(crate) fn set_type_expr_type(&mut self, id: TypeExprId, ty: TypeId) {
        let slot = &mut self.result.type_expr_types[id.index()];
        assert!(slot.is_none(), "type annotation checked twice");
        *slot = Some(ty);
    }

    /// The type an expression produces at its use site, following the
    /// implicit-cast chain.
    pub(crate) fn effective_expr_type(&self, id: ExprId) -> Option<TypeId> {
        self.result.coerced_expr_type(id)
    }

    pub(crate) fn push_cast(&mut self, id: ExprId, target: TypeId) {
        self.result.casts.entry(id).or_default().push(target);
    }

    // -- Recursion guard ----------------------------------------------------

    pub(crate) fn enter_decl(&mut self, decl: DeclId) -> bool {
        if !self.in_progress.insert(decl) {
            let span = self.ast.decl(decl).span;
            self.emit(
                Diagnostic::error(
                    Category::RecursiveDecl,
                    "cannot infer type for recursive declaration",
                )
                .at(self.loc(span)),
            );
            return false;
        }
        true
    }

    pub(crate) fn exit_decl(&mut self, decl: DeclId) {
        self.in_progress.remove(&decl);
    }

    // -- Diagnostics --------------------------------------------------------

    pub(crate) fn loc(&self, span: Span) -> SourceLocation {
        SourceLocation {
            file_id: span.file.0,
            start: span.start,
            end: span.end,
        }
    }

    pub(crate) fn emit(&mut self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => {
                self.errors += 1;
                if let Some(max) = self.opts.max_errors {
                    if self.errors > max {
                        return;
                    }
                }
            }
            Severity::Warning if !self.opts.warnings => return,
            _ => {}
        }
        self.sink.report(diag);
    }

    /// Secondary errors about the poison type are suppressed.
    pub(crate) fn should_report(&self, ty: TypeId) -> bool {
        !self.table.contains_error(ty)
    }

    pub(crate) fn incompatible_types(
        &mut self,
        span: Span,
        ty: TypeId,
        expected: TypeId,
    ) -> TypeId {
        if self.should_report(expected) && self.should_report(ty) {
            let message = format!(
                "expected type '{}', but got type '{}'",
                self.table.display(expected),
                self.table.display(ty)
            );
            self.emit(Diagnostic::error(Category::TypeMismatch, message).at(self.loc(span)));
        }
        self.table.type_error()
    }

    pub(crate) fn incompatible_type(
        &mut self,
        span: Span,
        msg: &str,
        expected: TypeId,
    ) -> TypeId {
        if self.should_report(expected) {
            let message = format!(
                "expected type '{}', but got {}",
                self.table.display(expected),
                msg
            );
            self.emit(Diagnostic::error(Category::ContextMismatch, message).at(self.loc(span)));
        }
        self.table.type_error()
    }

    pub(crate) fn type_expected(&mut self, span: Span, ty: TypeId, name: &str) -> TypeId {
        if self.should_report(ty) {
            let message = format!("expected {} type, but got '{}'", name, self.table.display(ty));
            self.emit(Diagnostic::error(Category::KindMismatch, message).at(self.loc(span)));
        }
        self.table.type_error()
    }

    pub(crate) fn unknown_member(&mut self, span: Span, user_ty: TypeId, member: &str) -> TypeId {
        let owner = self.table.display(user_ty).to_string();
        let message = if owner.is_empty() {
            format!("no member '{member}' in top-level module")
        } else {
            format!("no member '{member}' in '{owner}'")
        };
        self.emit(Diagnostic::error(Category::UnknownMember, message).at(self.loc(span)));
        self.table.type_error()
    }

    pub(crate) fn cannot_infer(&mut self, span: Span, msg: &str) -> TypeId {
        self.emit(
            Diagnostic::error(Category::CannotInfer, format!("cannot infer type for {msg}"))
                .at(self.loc(span)),
        );
        self.table.type_error()
    }

    pub(crate) fn unreachable_code(&mut self, before: Span, first: Span, last: Span) -> TypeId {
        let diag = Diagnostic::error(Category::UnreachableCode, "unreachable code")
            .at(self.loc(first.merge(last)))
            .with_note_at(self.loc(before), "after this statement");
        self.emit(diag);
        self.table.type_error()
    }

    pub(crate) fn mutable_expected(&mut self, span: Span) -> TypeId {
        self.emit(
            Diagnostic::error(Category::MutableExpected, "mutable expression expected")
                .at(self.loc(span)),
        );
        self.table.type_error()
    }

    pub(crate) fn bad_arguments(
        &mut self,
        span: Span,
        msg: &str,
        count: usize,
        expected: usize,
    ) -> TypeId {
        let message = format!("expected {expected} argument(s) in {msg}, but got {count}");
        self.emit(Diagnostic::error(Category::ArityMismatch, message).at(self.loc(span)));
        self.table.type_error()
    }

    pub(crate) fn invalid_cast(&mut self, span: Span, ty: TypeId, expected: TypeId) -> TypeId {
        if self.should_report(ty) && self.should_report(expected) {
            let message = format!(
                "invalid cast from '{}' to '{}'",
                self.table.display(ty),
                self.table.display(expected)
            );
            self.emit(Diagnostic::error(Category::InvalidCast, message).at(self.loc(span)));
        }
        self.table.type_error()
    }

    pub(crate) fn invalid_simd(&mut self, span: Span, elem: TypeId) -> TypeId {
        if self.should_report(elem) {
            let message = format!(
                "expected primitive type for simd type component, but got '{}'",
                self.table.display(elem)
            );
            self.emit(Diagnostic::error(Category::InvalidSimd, message).at(self.loc(span)));
        }
        self.table.type_error()
    }

    pub(crate) fn invalid_ptrn(&mut self, span: Span, must_be_trivial: bool) {
        let diag = if must_be_trivial {
            Diagnostic::error(
                Category::Refutability,
                "irrefutable (always matching) pattern expected",
            )
            .at(self.loc(span))
            .with_note(format!(
                "use {} or {} {} to match patterns that can fail",
                style::keyword("match"),
                style::keyword("if"),
                style::keyword("let")
            ))
        } else {
            Diagnostic::error(Category::Refutability, "refutable pattern expected")
                .at(self.loc(span))
                .with_note(format!(
                    "use {} or {} to match patterns that always match",
                    style::keyword("match"),
                    style::keyword("let")
                ))
        };
        self.emit(diag);
    }

    pub(crate) fn invalid_constraint(
        &mut self,
        span: Span,
        var: TypeId,
        type_arg: Option<TypeId>,
        bounds: TypeBounds,
    ) {
        let var_name = self.table.display(var).to_string();
        let mut diag = match type_arg {
            Some(arg) => Diagnostic::error(
                Category::TypeArgConstraint,
                format!(
                    "invalid type argument '{}' for type variable '{}'",
                    self.table.display(arg),
                    var_name
                ),
            ),
            None => Diagnostic::error(
                Category::TypeArgConstraint,
                format!("cannot infer type argument for type variable '{var_name}'"),
            ),
        }
        .at(self.loc(span));
        let lower_kind = self.table.kind(bounds.lower);
        let bound_left =
            !matches!(lower_kind, TypeKind::Bottom | TypeKind::Error);
        let bound_right = !matches!(self.table.kind(bounds.upper), TypeKind::Top);
        if bound_left && bound_right {
            diag = diag.with_note(format!(
                "type constraint '{} <: {} <: {}' is not satisfiable",
                self.table.display(bounds.lower),
                var_name,
                self.table.display(bounds.upper)
            ));
        } else if bound_left || bound_right {
            let (rel, bound) = if bound_left {
                (">:", bounds.lower)
            } else {
                ("<:", bounds.upper)
            };
            diag = diag.with_note(format!(
                "type constraint '{} {} {}' is not satisfiable",
                var_name,
                rel,
                self.table.display(bound)
            ));
        }
        self.emit(diag);
    }

    pub(crate) fn invalid_attr(&mut self, span: Span, name: &str) {
        self.emit(
            Diagnostic::error(Category::InvalidAttribute, format!("invalid attribute '{name}'"))
                .at(self.loc(span)),
        );
    }

    pub(crate) fn unsized_type(&mut self, span: Span, ty: TypeId) {
        let message = format!("type '{}' is recursive and not sized", self.table.display(ty));
        self.emit(Diagnostic::error(Category::UnsizedType, message).at(self.loc(span)));
    }

    pub(crate) fn warn(&mut self, span: Span, msg: &str) {
        self.emit(Diagnostic::warning(Category::NoEffect, msg).at(self.loc(span)));
    }

    pub(crate) fn plain_error(&mut self, category: Category, span: Span, msg: String) -> TypeId {
        self.emit(Diagnostic::error(category, msg).at(self.loc(span)));
        self.table.type_error()
    }

    // -- Reference helpers --------------------------------------------------

    pub(crate) fn remove_ref(&self, ty: TypeId) -> (Option<AddrInfo>, TypeId) {
        match *self.table.kind(ty) {
            TypeKind::Ref {
                pointee,
                is_mut,
                addr_space,
            } => (
                Some(AddrInfo {
                    is_mut,
                    addr_space,
                }),
                pointee,
            ),
            _ => (None, ty),
        }
    }

    pub(crate) fn remove_ptr(&self, ty: TypeId) -> (Option<AddrInfo>, TypeId) {
        match *self.table.kind(ty) {
            TypeKind::Ptr {
                pointee,
                is_mut,
                addr_space,
            } => (
                Some(AddrInfo {
                    is_mut,
                    addr_space,
                }),
                pointee,
            ),
            _ => (None, ty),
        }
    }

    // -- Coercions ----------------------------------------------------------

    /// Strip a top-level reference off an expression's type, recording an
    /// implicit cast for the dereference.
    pub(crate) fn deref(&mut self, expr: ExprId) -> TypeId {
        let ty = self.infer_expr(expr);
        let (ref_info, inner) = self.remove_ref(ty);
        if ref_info.is_some() {
            self.push_cast(expr, inner);
        }
        inner
    }

    pub(crate) fn is_unit_expr(&self, expr: ExprId) -> bool {
        matches!(&self.ast.expr(expr).kind, ExprKind::Tuple(args) if args.is_empty())
    }

    fn tuple_with_implicits(&self, ty: TypeId) -> Option<Vec<TypeId>> {
        match self.table.kind(ty) {
            TypeKind::Tuple(elems) if !elems.is_empty() => elems
                .iter()
                .any(|&e| matches!(self.table.kind(e), TypeKind::ImplicitParam(_)))
                .then(|| elems.clone()),
            _ => None,
        }
    }

    /// Make an expression fit an expected type, inserting implicit casts,
    /// summons, and argument reshaping as needed.
    pub(crate) fn coerce(&mut self, expr: ExprId, expected: TypeId) -> TypeId {
        if let TypeKind::ImplicitParam(underlying) = *self.table.kind(expected) {
            // Only the unit value can be coerced into a summon.
            if self.is_unit_expr(expr) {
                self.result.summons.insert(expr, underlying);
                if self.result.expr_type(expr).is_none() {
                    self.set_expr_type(expr, underlying);
                }
                return underlying;
            }
        } else if let Some(elems) = self.tuple_with_implicits(expected) {
            return self.coerce_with_implicits(expr, expected, elems);
        }

        let ty = match self.effective_expr_type(expr) {
            Some(ty) => ty,
            None => self.check_expr(expr, expected),
        };
        if ty != expected {
            if self.table.subtype(ty, expected) {
                self.push_cast(expr, expected);
                return expected;
            }
            let span = self.ast.expr(expr).span;
            return self.incompatible_types(span, ty, expected);
        }
        ty
    }

    /// Rebuild a call argument as a tuple, zipping given values to
    /// positions and summoning the missing implicit ones.
    fn coerce_with_implicits(
        &mut self,
        expr: ExprId,
        expected: TypeId,
        elems: Vec<TypeId>,
    ) -> TypeId {
        let span = self.ast.expr(expr).span;
        let given: Option<Vec<ExprId>> = match &self.ast.expr(expr).kind {
            ExprKind::Tuple(args) => Some(args.clone()),
            _ => None,
        };
        if let Some(args) = &given {
            if args.len() > elems.len() {
                self.bad_arguments(span, "arguments", args.len(), elems.len());
            }
        }
        let mut slots = Vec::with_capacity(elems.len());
        for (i, &elem) in elems.iter().enumerate() {
            let given_expr = match &given {
                None if i == 0 && !self.is_unit_expr(expr) => Some(expr),
                Some(args) if i < args.len() => Some(args[i]),
                _ => None,
            };
            if let Some(arg) = given_expr {
                self.coerce(arg, elem);
                slots.push(ArgSlot::Given(arg));
                continue;
            }
            if let TypeKind::ImplicitParam(underlying) = *self.table.kind(elem) {
                slots.push(ArgSlot::Summon(underlying));
                continue;
            }
            self.bad_arguments(span, "non-implicit arguments", i, elems.len());
        }
        self.result.arg_plans.insert(expr, slots);
        if self.result.expr_type(expr).is_none() {
            self.set_expr_type(expr, expected);
        }
        expected
    }

    /// Coercion variant used while preparing generic-call arguments: enter
    /// same-arity tuples so literals default in context, commit only when
    /// the expected type has no free variables.
    pub(crate) fn try_coerce(&mut self, expr: ExprId, expected: TypeId) -> TypeId {
        if let TypeKind::Tuple(elems) = self.table.kind(expected) {
            let elems = elems.clone();
            if let ExprKind::Tuple(args) = &self.ast.expr(expr).kind {
                if args.len() == elems.len() {
                    let args = args.clone();
                    let mut arg_types = Vec::with_capacity(args.len());
                    for (&arg, &elem) in args.iter().zip(elems.iter()) {
                        arg_types.push(self.try_coerce(arg, elem));
                    }
                    let ty = self.table.tuple_type(arg_types);
                    if self.result.expr_type(expr).is_none() {
                        self.set_expr_type(expr, ty);
                    }
                    return ty;
                }
            }
        }
        if self.table.has_type_vars(expected) {
            self.deref(expr)
        } else {
            self.coerce(expr, expected)
        }
    }

    /// Dereference two branch expressions, join their types, and coerce
    /// both to the join. An incompatible pair is reported at `second`.
    pub(crate) fn join_branches(&mut self, first: ExprId, second: ExprId) -> TypeId {
        let first_ty = self.deref(first);
        let second_ty = self.deref(second);
        let joined = self.table.join(first_ty, second_ty);
        if joined == self.table.top_type() {
            let span = self.ast.expr(second).span;
            return self.incompatible_types(span, second_ty, first_ty);
        }
        self.coerce(first, joined);
        self.coerce(second, joined);
        joined
    }

    /// Require `ty <: expected`, reporting an error otherwise.
    pub(crate) fn expect(&mut self, span: Span, ty: TypeId, expected: TypeId) -> TypeId {
        if !self.table.subtype(ty, expected) {
            return self.incompatible_types(span, ty, expected);
        }
        ty
    }

    // -- Literals -----------------------------------------------------------

    /// Defaults used when a literal carries no type annotation.
    pub(crate) fn infer_lit(&mut self, lit: &Lit) -> TypeId {
        match lit {
            Lit::Int(_) => self.table.prim_type(PrimTy::I32),
            Lit::Float(_) => self.table.prim_type(PrimTy::F64),
            Lit::Bool(_) => self.table.bool_type(),
            Lit::Char(_) => self.table.prim_type(PrimTy::U8),
            // Null-terminated byte array.
            Lit::Str(s) => {
                let u8_ty = self.table.prim_type(PrimTy::U8);
                self.table
                    .sized_array_type(u8_ty, s.len() as u64 + 1, false)
            }
        }
    }

    pub(crate) fn check_lit(&mut self, span: Span, lit: &Lit, expected: TypeId) -> TypeId {
        if matches!(self.table.kind(expected), TypeKind::NoRet) {
            return self.infer_lit(lit);
        }
        match lit {
            Lit::Int(_) => {
                if !self.table.is_int_or_float_type(expected) {
                    return self.incompatible_type(span, "integer literal", expected);
                }
                expected
            }
            Lit::Float(_) => {
                if !self.table.is_float_type(expected) {
                    return self.incompatible_type(span, "floating point literal", expected);
                }
                expected
            }
            Lit::Bool(_) => {
                if !self.table.is_bool_type(expected) {
                    return self.incompatible_type(span, "boolean literal", expected);
                }
                expected
            }
            Lit::Char(_) => {
                if !self.table.is_prim(expected, PrimTy::U8) {
                    return self.incompatible_type(span, "character literal", expected);
                }
                expected
            }
            Lit::Str(_) => {
                let ty = self.infer_lit(lit);
                if !self.table.subtype(ty, expected) {
                    return self.incompatible_type(span, "string literal", expected);
                }
                ty
            }
        }
    }

    // -- Write tracking -----------------------------------------------------

    /// Mark an expression (and the l-value it projects from) written-to.
    pub(crate) fn write_to(&mut self, expr: ExprId) {
        self.result.written.insert(expr);
        match &self.ast.expr(expr).kind {
            ExprKind::Proj { base, .. } => self.write_to(*base),
            ExprKind::Filtered { expr: inner, .. } => self.write_to(*inner),
            ExprKind::Ascribe { expr: inner, .. } => self.write_to(*inner),
            ExprKind::Unary {
                op: sable_ast::UnOp::Deref,
                arg,
            } => self.write_to(*arg),
            _ => {}
        }
    }
}
