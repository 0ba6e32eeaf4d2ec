//! `infer`/`check` for expressions.
//!
//! Each rule mirrors the bidirectional discipline: `check` is used when an
//! expectation exists and falls back to `infer` plus a subtype test; `infer`
//! synthesizes a type with literal defaulting. Branching constructs try to
//! be smarter than plain defaulting when one side is an unannotated literal.

use sable_ast::{
    Arm, BinOp, Cond, ExprId, ExprKind, Lambda, Lit, ProjField, RecordBase, Span, Stmt, StmtKind,
    UnOp,
};
use sable_diag::{Category, Diagnostic, Sink, style};
use sable_types::{TypeId, TypeKind};

use crate::TypeChecker;

impl<S: Sink> TypeChecker<'_, S> {
    /// Synthesize the type of an expression. Already-visited nodes return
    /// their recorded (coerced) type.
    pub fn infer_expr(&mut self, id: ExprId) -> TypeId {
        if let Some(ty) = self.effective_expr_type(id) {
            return ty;
        }
        let ty = self.infer_expr_kind(id);
        if self.result().expr_type(id).is_none() {
            self.set_expr_type(id, ty);
        }
        ty
    }

    /// Check an expression against an expected type. Visiting a node twice
    /// is a checker bug, not a user error.
    pub fn check_expr(&mut self, id: ExprId, expected: TypeId) -> TypeId {
        assert!(
            self.result().expr_type(id).is_none(),
            "expression node checked twice"
        );
        let ty = self.check_expr_kind(id, expected);
        if self.result().expr_type(id).is_none() {
            self.set_expr_type(id, ty);
        }
        ty
    }

    fn infer_expr_kind(&mut self, id: ExprId) -> TypeId {
        let span = self.ast.expr(id).span;
        match &self.ast.expr(id).kind {
            ExprKind::Lit(lit) => {
                let lit = lit.clone();
                self.infer_lit(&lit)
            }
            ExprKind::Path(path) => self.infer_path(*path, true, None),
            ExprKind::Tuple(args) => {
                let args = args.clone();
                let mut elem_types = Vec::with_capacity(args.len());
                for &arg in &args {
                    elem_types.push(self.deref(arg));
                }
                self.table.tuple_type(elem_types)
            }
            ExprKind::Array { elems, is_simd } => {
                let (elems, is_simd) = (elems.clone(), *is_simd);
                if elems.is_empty() {
                    return self.cannot_infer(span, "array expression");
                }
                let elem_type = self.deref(elems[0]);
                for &elem in &elems[1..] {
                    self.coerce(elem, elem_type);
                }
                self.finish_array(span, elem_type, elems.len() as u64, is_simd)
            }
            ExprKind::Repeat {
                elem,
                count,
                is_simd,
            } => {
                let (elem, count, is_simd) = (*elem, *count, *is_simd);
                let elem_type = self.deref(elem);
                self.finish_array(span, elem_type, count, is_simd)
            }
            ExprKind::Record { base, fields } => {
                let (base, fields) = (*base, fields.clone());
                let ty = match base {
                    RecordBase::Update(expr) => self.deref(expr),
                    RecordBase::Path(path) => self.infer_path(path, false, None),
                };
                let Some((struct_ty, _)) = self.table.match_struct_app(ty) else {
                    let base_span = match base {
                        RecordBase::Update(expr) => self.ast.expr(expr).span,
                        RecordBase::Path(path) => self.ast.path(path).span,
                    };
                    return self.type_expected(base_span, ty, "record-like structure");
                };
                if self.table.struct_def(struct_ty).is_tuple_like {
                    return self.type_expected(span, ty, "record-like structure");
                }
                let has_base = matches!(base, RecordBase::Update(_));
                self.check_field_inits(span, ty, &fields, "expression", has_base, true);
                let (result, variant) = self.record_result_type(ty);
                if let Some(index) = variant {
                    self.result.expr_variants.insert(id, index);
                }
                result
            }
            ExprKind::Proj { base, field } => {
                let (base, field) = (*base, field.clone());
                self.infer_proj(span, base, &field)
            }
            ExprKind::Lambda(lambda) => {
                let lambda = lambda.clone();
                self.infer_lambda(span, &lambda)
            }
            ExprKind::Block { stmts, last_semi } => {
                let (stmts, last_semi) = (stmts.clone(), *last_semi);
                if stmts.is_empty() {
                    return self.table.unit_type();
                }
                let mut last_ty = self.table.unit_type();
                for stmt in &stmts {
                    last_ty = self.infer_stmt(stmt);
                }
                self.check_stmt_flow(span, &stmts, last_semi);
                if last_semi {
                    self.table.unit_type()
                } else {
                    last_ty
                }
            }
            ExprKind::Call { callee, arg } => {
                let (callee, arg) = (*callee, *arg);
                self.infer_call(callee, arg)
            }
            ExprKind::If {
                cond,
                then_expr,
                else_expr,
            } => {
                let (cond, then_expr, else_expr) = (*cond, *then_expr, *else_expr);
                self.infer_if(cond, then_expr, else_expr)
            }
            ExprKind::Match { scrutinee, arms } => {
                let (scrutinee, arms) = (*scrutinee, arms.clone());
                self.check_match(span, scrutinee, &arms, None)
            }
            ExprKind::While { cond, body } => {
                let (cond, body) = (*cond, *body);
                self.check_cond(cond);
                // Checking (not inferring) the body rejects `while true { break }`
                // masquerading as a diverging loop.
                let unit = self.table.unit_type();
                self.coerce(body, unit)
            }
            ExprKind::For { call } => {
                let call = *call;
                self.infer_expr(call)
            }
            ExprKind::Break { loop_expr } => {
                let loop_expr = *loop_expr;
                self.infer_jump(span, loop_expr, "break expression", true)
            }
            ExprKind::Continue { loop_expr } => {
                let loop_expr = *loop_expr;
                self.infer_jump(span, loop_expr, "continue expression", false)
            }
            ExprKind::Return { lambda } => {
                let lambda = *lambda;
                self.infer_return(span, lambda)
            }
            ExprKind::Unary { op, arg } => {
                let (op, arg) = (*op, *arg);
                self.infer_unary(span, op, arg)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let (op, lhs, rhs) = (*op, *lhs, *rhs);
                self.infer_binary(op, lhs, rhs)
            }
            ExprKind::Cast { expr, target } => {
                let (expr, target) = (*expr, *target);
                self.infer_cast(span, expr, target)
            }
            ExprKind::Ascribe { expr, ty } => {
                let (expr, ty) = (*expr, *ty);
                let annotated = self.infer_type_expr(ty);
                self.coerce(expr, annotated)
            }
            ExprKind::Summon { ty } => match *ty {
                Some(ty) => self.infer_type_expr(ty),
                None => {
                    self.emit(
                        Diagnostic::error(
                            Category::CannotInfer,
                            "summoning a value without a type",
                        )
                        .at(self.loc(span)),
                    );
                    self.table.type_error()
                }
            },
            ExprKind::Filtered { filter, expr } => {
                let (filter, expr) = (*filter, *expr);
                if let Some(filter) = filter {
                    self.check_filter(filter);
                }
                self.infer_expr(expr)
            }
            ExprKind::Error => self.table.type_error(),
        }
    }

    fn check_expr_kind(&mut self, id: ExprId, expected: TypeId) -> TypeId {
        let span = self.ast.expr(id).span;
        match &self.ast.expr(id).kind {
            ExprKind::Lit(lit) => {
                let lit = lit.clone();
                self.check_lit(span, &lit, expected)
            }
            ExprKind::Tuple(args) => {
                let args = args.clone();
                let TypeKind::Tuple(elems) = self.table.kind(expected) else {
                    return self.incompatible_type(span, "tuple expression", expected);
                };
                let elems = elems.clone();
                if args.len() != elems.len() {
                    return self.bad_arguments(span, "tuple expression", args.len(), elems.len());
                }
                for (&arg, &elem) in args.iter().zip(elems.iter()) {
                    self.coerce(arg, elem);
                }
                expected
            }
            ExprKind::Array { elems, is_simd } => {
                let (elems, is_simd) = (elems.clone(), *is_simd);
                self.check_array(
                    span,
                    "array expression",
                    expected,
                    elems.len() as u64,
                    is_simd,
                    |checker, elem_type| {
                        for &elem in &elems {
                            checker.coerce(elem, elem_type);
                        }
                    },
                )
            }
            ExprKind::Repeat {
                elem,
                count,
                is_simd,
            } => {
                let (elem, count, is_simd) = (*elem, *count, *is_simd);
                self.check_array(
                    span,
                    "array expression",
                    expected,
                    count,
                    is_simd,
                    |checker, elem_type| {
                        checker.coerce(elem, elem_type);
                    },
                )
            }
            ExprKind::Lambda(lambda) => {
                let lambda = lambda.clone();
                self.check_lambda(id, span, &lambda, expected)
            }
            ExprKind::Block { stmts, last_semi } => {
                let (stmts, last_semi) = (stmts.clone(), *last_semi);
                self.check_block(span, &stmts, last_semi, expected)
            }
            ExprKind::If {
                cond,
                then_expr,
                else_expr,
            } => {
                let (cond, then_expr, else_expr) = (*cond, *then_expr, *else_expr);
                self.check_cond(cond);
                if let Some(else_expr) = else_expr {
                    self.coerce(then_expr, expected);
                    self.coerce(else_expr, expected)
                } else {
                    let unit = self.table.unit_type();
                    self.coerce(then_expr, unit);
                    self.coerce(then_expr, expected)
                }
            }
            ExprKind::Match { scrutinee, arms } => {
                let (scrutinee, arms) = (*scrutinee, arms.clone());
                self.check_match(span, scrutinee, &arms, Some(expected))
            }
            ExprKind::Unary { op, arg } => {
                let (op, arg) = (*op, *arg);
                match op {
                    UnOp::Plus | UnOp::Minus if self.table.is_int_or_float_type(expected) => {
                        self.coerce(arg, expected);
                    }
                    UnOp::Not
                        if self.table.is_int_type(expected)
                            || self.table.is_bool_type(expected) =>
                    {
                        self.coerce(arg, expected);
                    }
                    _ => {}
                }
                let ty = self.infer_unary(span, op, arg);
                self.expect(span, ty, expected)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let (op, lhs, rhs) = (*op, *lhs, *rhs);
                let fits = match op.without_assign() {
                    _ if op.is_assign() => false,
                    BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
                        self.table.is_int_or_float_type(expected)
                    }
                    BinOp::Shl | BinOp::Shr => self.table.is_int_type(expected),
                    BinOp::And | BinOp::Or | BinOp::Xor => {
                        self.table.is_int_type(expected) || self.table.is_bool_type(expected)
                    }
                    _ => false,
                };
                if fits {
                    self.coerce(lhs, expected);
                    self.coerce(rhs, expected);
                }
                let ty = self.infer_binary(op, lhs, rhs);
                self.expect(span, ty, expected)
            }
            ExprKind::Summon { ty } => match *ty {
                Some(ty) => {
                    let got = self.infer_type_expr(ty);
                    if !self.table.subtype(expected, got) {
                        return self.incompatible_types(span, got, expected);
                    }
                    got
                }
                None => expected,
            },
            _ => {
                // Default: synthesize, then require a subtype of the
                // expectation.
                let ty = self.infer_expr_kind(id);
                if self.result().expr_type(id).is_none() {
                    self.set_expr_type(id, ty);
                }
                self.expect(span, ty, expected)
            }
        }
    }

    // -- Arrays -------------------------------------------------------------

    fn finish_array(&mut self, span: Span, elem_type: TypeId, count: u64, is_simd: bool) -> TypeId {
        if is_simd && !matches!(self.table.kind(elem_type), TypeKind::Prim(_)) {
            return self.invalid_simd(span, elem_type);
        }
        self.table.sized_array_type(elem_type, count, is_simd)
    }

    fn check_array(
        &mut self,
        span: Span,
        msg: &str,
        expected: TypeId,
        count: u64,
        is_simd: bool,
        check_elems: impl FnOnce(&mut Self, TypeId),
    ) -> TypeId {
        // An array literal may also satisfy a pointer-to-array expectation;
        // the widening cast is inserted by the caller's coercion.
        let (_, stripped) = self.remove_ptr(expected);
        let (elem_type, expected_size, expected_simd) = match *self.table.kind(stripped) {
            TypeKind::SizedArray {
                elem,
                size,
                is_simd,
            } => (elem, Some(size), is_simd),
            TypeKind::UnsizedArray { elem } => (elem, None, false),
            _ => return self.incompatible_type(span, msg, expected),
        };
        if expected_simd != is_simd {
            let msg = if is_simd {
                format!("simd {msg}")
            } else {
                format!("non-simd {msg}")
            };
            return self.incompatible_type(span, &msg, expected);
        }
        if is_simd && !matches!(self.table.kind(elem_type), TypeKind::Prim(_)) {
            return self.invalid_simd(span, elem_type);
        }
        check_elems(self, elem_type);
        if let Some(size) = expected_size {
            if size != count {
                self.plain_error(
                    Category::ArityMismatch,
                    span,
                    format!("expected {size} array element(s), but got {count}"),
                );
                return self.table.type_error();
            }
        }
        self.table.sized_array_type(elem_type, count, is_simd)
    }

    // -- Projection ---------------------------------------------------------

    fn infer_proj(&mut self, span: Span, base: ExprId, field: &ProjField) -> TypeId {
        let (ref_info, mut base_ty) = {
            let ty = self.infer_expr(base);
            self.remove_ref(ty)
        };
        let (ptr_info, pointee) = self.remove_ptr(base_ty);
        if ptr_info.is_some() {
            // The projection offset must apply to the pointer, not to the
            // reference to the pointer.
            if ref_info.is_some() {
                self.deref(base);
            }
            base_ty = pointee;
        }

        let struct_app = self.table.match_struct_app(base_ty);
        let result = match field {
            ProjField::Name(name) => {
                let Some((struct_ty, _)) = struct_app else {
                    let base_span = self.ast.expr(base).span;
                    return self.type_expected(base_span, base_ty, "structure");
                };
                let Some(index) = self.table.struct_def(struct_ty).find_field(name) else {
                    return self.unknown_member(span, struct_ty, name);
                };
                self.table.member_type(base_ty, index)
            }
            ProjField::Index(index) => {
                let index = *index;
                match self.table.kind(base_ty) {
                    TypeKind::Tuple(elems) => {
                        let elems = elems.clone();
                        if index >= elems.len() {
                            return self.plain_error(
                                Category::ArityMismatch,
                                span,
                                format!("invalid tuple element index '{index}'"),
                            );
                        }
                        elems[index]
                    }
                    _ => {
                        let tuple_like = struct_app
                            .as_ref()
                            .is_some_and(|(s, _)| self.table.struct_def(*s).is_tuple_like);
                        if !tuple_like {
                            let base_span = self.ast.expr(base).span;
                            return self.type_expected(
                                base_span,
                                base_ty,
                                "tuple or tuple-like structure",
                            );
                        }
                        if index >= self.table.member_count(base_ty) {
                            return self.plain_error(
                                Category::ArityMismatch,
                                span,
                                format!("invalid tuple element index '{index}'"),
                            );
                        }
                        self.table.member_type(base_ty, index)
                    }
                }
            }
        };

        match (ptr_info, ref_info) {
            (Some(addr), _) | (None, Some(addr)) => {
                self.table.ref_type(result, addr.is_mut, addr.addr_space)
            }
            (None, None) => result,
        }
    }

    // -- Lambdas ------------------------------------------------------------

    fn infer_lambda(&mut self, span: Span, lambda: &Lambda) -> TypeId {
        let param_type = self.infer_pat(lambda.param);
        if let Some(filter) = lambda.filter {
            self.check_filter(filter);
        }
        let mut body_type = lambda.ret_ty.map(|ret| self.infer_type_expr(ret));
        if let Some(body) = lambda.body {
            body_type = Some(match body_type {
                Some(ret) => {
                    self.coerce(body, ret);
                    ret
                }
                None => self.deref(body),
            });
        }
        self.check_refutability(lambda.param, true);
        match body_type {
            Some(body_type) => self.table.fn_type(param_type, body_type),
            None => self.cannot_infer(span, "function"),
        }
    }

    fn check_lambda(
        &mut self,
        id: ExprId,
        span: Span,
        lambda: &Lambda,
        expected: TypeId,
    ) -> TypeId {
        let TypeKind::Fn { dom, codom } = *self.table.kind(expected) else {
            return self.incompatible_type(span, "function", expected);
        };
        let param_type = self.check_pat(lambda.param, dom);
        let body_type = match lambda.ret_ty {
            Some(ret) => {
                let ty = self.infer_type_expr(ret);
                if ty != codom {
                    let ret_span = self.ast.type_expr(ret).span;
                    self.incompatible_types(ret_span, ty, codom)
                } else {
                    ty
                }
            }
            None => codom,
        };
        self.check_refutability(lambda.param, true);
        // Record the lambda's type before entering the body, in case
        // `return` appears in it.
        let fn_type = self.table.fn_type(param_type, body_type);
        self.set_expr_type(id, fn_type);
        if let Some(body) = lambda.body {
            self.coerce(body, body_type);
        }
        if let Some(filter) = lambda.filter {
            self.check_filter(filter);
        }
        fn_type
    }

    // -- Blocks -------------------------------------------------------------

    fn infer_stmt(&mut self, stmt: &Stmt) -> TypeId {
        match stmt.kind {
            StmtKind::Decl(decl) => {
                self.infer_decl(decl);
                self.table.unit_type()
            }
            StmtKind::Expr(expr) => self.deref(expr),
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt, expected: TypeId) -> TypeId {
        match stmt.kind {
            StmtKind::Decl(decl) => {
                self.infer_decl(decl);
                let unit = self.table.unit_type();
                self.expect(stmt.span, unit, expected)
            }
            StmtKind::Expr(expr) => self.coerce(expr, expected),
        }
    }

    fn check_block(
        &mut self,
        span: Span,
        stmts: &[Stmt],
        last_semi: bool,
        expected: TypeId,
    ) -> TypeId {
        if stmts.is_empty() {
            if !self.table.is_unit_type(expected) {
                return self.incompatible_type(span, "empty block expression", expected);
            }
            return expected;
        }
        for stmt in &stmts[..stmts.len() - 1] {
            self.infer_stmt(stmt);
        }
        let last = stmts.last().expect("non-empty block");
        let last_type = if last_semi {
            self.infer_stmt(last)
        } else {
            self.check_stmt(last, expected)
        };
        self.check_stmt_flow(span, stmts, last_semi);
        if last_semi && !self.table.is_unit_type(expected) {
            if self.should_report(expected) {
                let message = format!(
                    "expected type '{}', but got block expression terminated by semicolon",
                    self.table.display(expected)
                );
                self.emit(
                    Diagnostic::error(Category::ContextMismatch, message)
                        .at(self.loc(span))
                        .with_note("removing the last semicolon may solve this issue"),
                );
            }
            return self.table.type_error();
        }
        if last_semi {
            expected
        } else {
            last_type
        }
    }

    fn stmt_is_jumping(&self, stmt: &Stmt) -> bool {
        match stmt.kind {
            StmtKind::Decl(_) => false,
            StmtKind::Expr(expr) => {
                self.result().expr_type(expr) == Some(self.table.no_ret_type())
            }
        }
    }

    /// Flag unreachable statements and pure statements with no effect.
    fn check_stmt_flow(&mut self, span: Span, stmts: &[Stmt], last_semi: bool) {
        for i in 0..stmts.len() - 1 {
            if self.stmt_is_jumping(&stmts[i]) {
                let last = stmts.last().expect("non-empty block").span;
                self.unreachable_code(stmts[i].span, stmts[i + 1].span, last);
            } else if let StmtKind::Expr(expr) = stmts[i].kind {
                if !self.ast.has_side_effect(expr) {
                    self.warn(stmts[i].span, "statement with no effect");
                }
            }
        }
        let last = stmts.last().expect("non-empty block");
        if last_semi && self.stmt_is_jumping(last) {
            self.unreachable_code(last.span, last.span.at_end(), span.at_end());
        }
    }

    // -- Calls --------------------------------------------------------------

    /// Unwrap a filter wrapper to find a path callee.
    fn callee_path(&self, mut expr: ExprId) -> Option<(ExprId, sable_ast::PathId)> {
        if let ExprKind::Filtered { expr: inner, .. } = self.ast.expr(expr).kind {
            expr = inner;
        }
        match self.ast.expr(expr).kind {
            ExprKind::Path(path) => Some((expr, path)),
            _ => None,
        }
    }

    fn infer_call(&mut self, callee: ExprId, arg: ExprId) -> TypeId {
        // Give the path resolver the argument, so that missing type
        // arguments can be inferred from it.
        if let Some((path_expr, path)) = self.callee_path(callee) {
            if self.result().expr_type(path_expr).is_none() {
                let ty = self.infer_path(path, true, Some(arg));
                self.set_expr_type(path_expr, ty);
            }
        }

        let (ref_info, callee_type) = {
            let ty = self.infer_expr(callee);
            self.remove_ref(ty)
        };
        if let TypeKind::Fn { dom, codom } = *self.table.kind(callee_type) {
            self.coerce(callee, callee_type);
            self.coerce(arg, dom);
            return codom;
        }

        // Pointers to arrays and plain arrays are indexable by call syntax.
        let (ptr_info, pointee) = self.remove_ptr(callee_type);
        let base_type = if ptr_info.is_some() {
            if ref_info.is_some() {
                // Compute the offset on the pointer, not on the reference.
                self.coerce(callee, callee_type);
            }
            pointee
        } else {
            callee_type
        };
        let elem = match *self.table.kind(base_type) {
            TypeKind::SizedArray { elem, .. } | TypeKind::UnsizedArray { elem } => elem,
            _ => {
                let span = self.ast.expr(callee).span;
                return self.type_expected(span, callee_type, "function, array or constructor");
            }
        };
        let index_type = self.deref(arg);
        if !self.table.is_int_type(index_type) {
            let span = self.ast.expr(arg).span;
            return self.type_expected(span, index_type, "integer");
        }
        match ptr_info.or(ref_info) {
            Some(addr) => self.table.ref_type(elem, addr.is_mut, addr.addr_space),
            None => elem,
        }
    }

    // -- Conditionals and loops ---------------------------------------------

    fn check_cond(&mut self, cond: Cond) {
        match cond {
            Cond::Bool(expr) => {
                let bool_ty = self.table.bool_type();
                self.coerce(expr, bool_ty);
            }
            Cond::Let { pat, scrutinee } => {
                self.infer_pat_with_init(pat, scrutinee);
                self.check_refutability(pat, false);
            }
        }
    }

    /// Detect an unannotated integer/floating-point literal, looking
    /// through unary signs and single-expression blocks. Returns the
    /// literal's float-ness.
    fn untyped_lit(&self, mut expr: ExprId) -> Option<bool> {
        loop {
            match &self.ast.expr(expr).kind {
                ExprKind::Unary {
                    op: UnOp::Plus | UnOp::Minus,
                    arg,
                } => expr = *arg,
                ExprKind::Block { stmts, last_semi } if !last_semi && stmts.len() == 1 => {
                    match stmts[0].kind {
                        StmtKind::Expr(inner) => expr = inner,
                        StmtKind::Decl(_) => return None,
                    }
                }
                _ => break,
            }
        }
        match &self.ast.expr(expr).kind {
            ExprKind::Lit(Lit::Int(_)) => Some(false),
            ExprKind::Lit(Lit::Float(_)) => Some(true),
            _ => None,
        }
    }

    /// Whether an expression's type cannot be determined without context,
    /// as in `(2 * 4) + x`.
    fn is_untyped(&self, expr: ExprId) -> bool {
        if let ExprKind::Binary { op, lhs, rhs } = &self.ast.expr(expr).kind {
            if !op.is_assign() {
                return self.is_untyped(*lhs) && self.is_untyped(*rhs);
            }
        }
        self.untyped_lit(expr).is_some()
    }

    fn infer_if(
        &mut self,
        cond: Cond,
        then_expr: ExprId,
        else_expr: Option<ExprId>,
    ) -> TypeId {
        self.check_cond(cond);
        let Some(else_expr) = else_expr else {
            let unit = self.table.unit_type();
            return self.coerce(then_expr, unit);
        };
        // Joining both branches would default their literals too early, so
        // bias an unannotated literal branch toward the other branch's
        // type: `if c { 1 } else { u }` takes u's type, and two literal
        // branches prefer float when either side is a float.
        let lit_then = self.untyped_lit(then_expr);
        let lit_else = self.untyped_lit(else_expr);
        match (lit_then, lit_else) {
            (Some(then_is_float), Some(_)) => {
                if then_is_float {
                    let ty = self.deref(then_expr);
                    self.coerce(else_expr, ty);
                } else {
                    let ty = self.deref(else_expr);
                    self.coerce(then_expr, ty);
                }
            }
            (Some(_), None) => {
                let else_type = self.deref(else_expr);
                if self.table.is_int_or_float_type(else_type) {
                    self.coerce(then_expr, else_type);
                }
            }
            (None, Some(_)) => {
                let then_type = self.deref(then_expr);
                if self.table.is_int_or_float_type(then_type) {
                    self.coerce(else_expr, then_type);
                }
            }
            (None, None) => {}
        }
        self.join_branches(else_expr, then_expr)
    }

    fn check_match(
        &mut self,
        span: Span,
        scrutinee: ExprId,
        arms: &[Arm],
        expected: Option<TypeId>,
    ) -> TypeId {
        let arg_type = self.deref(scrutinee);
        if let Some(expected) = expected {
            let mut ty = expected;
            for arm in arms {
                self.check_pat(arm.pat, arg_type);
                ty = self.coerce(arm.body, ty);
            }
            return ty;
        }
        // Without an expectation, dereference every arm and join their
        // types; an incompatible arm is reported at that arm.
        let mut ty: Option<TypeId> = None;
        for arm in arms {
            self.check_pat(arm.pat, arg_type);
            let body_type = self.deref(arm.body);
            ty = Some(match ty {
                Some(ty) => {
                    let joined = self.table.join(ty, body_type);
                    if joined == self.table.top_type() {
                        let arm_span = self.ast.expr(arm.body).span;
                        self.incompatible_types(arm_span, body_type, ty)
                    } else {
                        joined
                    }
                }
                None => body_type,
            });
        }
        let Some(ty) = ty else {
            return self.cannot_infer(span, "match expression");
        };
        if !self.table.is_error(ty) {
            for arm in arms {
                self.coerce(arm.body, ty);
            }
        }
        ty
    }

    fn infer_jump(
        &mut self,
        span: Span,
        loop_expr: Option<ExprId>,
        msg: &str,
        is_break: bool,
    ) -> TypeId {
        let Some(loop_expr) = loop_expr else {
            return self.cannot_infer(span, msg);
        };
        let domain = match &self.ast.expr(loop_expr).kind {
            ExprKind::While { .. } => Some(self.table.unit_type()),
            ExprKind::For { call } => self.for_jump_domain(*call, is_break),
            _ => None,
        };
        match domain {
            Some(domain) => self.table.cn_type(domain),
            None => self.cannot_infer(span, msg),
        }
    }

    /// Reach into a for-loop's desugared call to type `break`/`continue`.
    ///
    /// `for p in f(args) { body }` arrives as `Call(Call(f, |p| body), args)`
    /// with `f : fn (fn P -> B) -> (fn A -> R)`; break continues with `R`,
    /// continue with `B`. Any other shape yields `None`.
    fn for_jump_domain(&self, call: ExprId, is_break: bool) -> Option<TypeId> {
        let ExprKind::Call { callee, .. } = self.ast.expr(call).kind else {
            return None;
        };
        let ExprKind::Call { callee: f, .. } = self.ast.expr(callee).kind else {
            return None;
        };
        let f_type = self.result().expr_type(f)?;
        let TypeKind::Fn { dom, codom } = *self.table.kind(f_type) else {
            return None;
        };
        let reached = if is_break { codom } else { dom };
        match *self.table.kind(reached) {
            TypeKind::Fn { codom, .. } => Some(codom),
            _ => None,
        }
    }

    fn infer_return(&mut self, span: Span, lambda: Option<ExprId>) -> TypeId {
        if let Some(lambda) = lambda {
            let mut codom = match self.result().expr_type(lambda).map(|t| self.table.kind(t)) {
                Some(TypeKind::Fn { codom, .. }) => Some(*codom),
                _ => None,
            };
            if codom.is_none() {
                // The enclosing function may still be under inference; its
                // return annotation is enough context.
                if let ExprKind::Lambda(lam) = &self.ast.expr(lambda).kind {
                    codom = lam.ret_ty.and_then(|ret| self.result().type_expr_type(ret));
                }
            }
            if let Some(codom) = codom {
                return self.table.cn_type(codom);
            }
        }
        let mut diag = Diagnostic::error(
            Category::CannotInfer,
            format!("cannot infer the type of {}", style::keyword("return")),
        )
        .at(self.loc(span));
        if let Some(lambda) = lambda {
            let lambda_span = self.ast.expr(lambda).span;
            diag = diag.with_note_at(
                self.loc(lambda_span),
                "try annotating the return type of this function",
            );
        }
        self.emit(diag);
        self.table.type_error()
    }

    // -- Operators ----------------------------------------------------------

    fn simd_elem(&self, ty: TypeId) -> TypeId {
        match *self.table.kind(ty) {
            TypeKind::SizedArray {
                elem,
                is_simd: true,
                ..
            } => elem,
            _ => ty,
        }
    }

    fn infer_unary(&mut self, span: Span, op: UnOp, arg: ExprId) -> TypeId {
        let (ref_info, arg_type) = {
            let ty = self.infer_expr(arg);
            self.remove_ref(ty)
        };
        let arg_span = self.ast.expr(arg).span;
        let is_mut_ref = ref_info.map(|r| r.is_mut).unwrap_or(false);
        if !is_mut_ref && (op == UnOp::AddrOfMut || op.is_inc() || op.is_dec()) {
            return self.mutable_expected(arg_span);
        }
        if matches!(op, UnOp::Plus | UnOp::Minus | UnOp::Not) {
            // Dereference the operand.
            self.coerce(arg, arg_type);
        }
        match op {
            UnOp::AddrOf => {
                let Some(addr) = ref_info else {
                    return self.type_expected(arg_span, arg_type, "addressable");
                };
                return self.table.ptr_type(arg_type, false, addr.addr_space);
            }
            UnOp::AddrOfMut => {
                self.write_to(arg);
                let addr_space = ref_info.map(|r| r.addr_space).unwrap_or(0);
                return self.table.ptr_type(arg_type, true, addr_space);
            }
            UnOp::Deref => {
                self.coerce(arg, arg_type);
                if let TypeKind::Ptr {
                    pointee,
                    is_mut,
                    addr_space,
                } = *self.table.kind(arg_type)
                {
                    return self.table.ref_type(pointee, is_mut, addr_space);
                }
                if self.should_report(arg_type) {
                    self.plain_error(
                        Category::KindMismatch,
                        span,
                        format!(
                            "cannot dereference non-pointer type '{}'",
                            self.table.display(arg_type)
                        ),
                    );
                }
                return self.table.type_error();
            }
            _ => {}
        }
        let prim = self.simd_elem(arg_type);
        if !matches!(self.table.kind(prim), TypeKind::Prim(_)) {
            return self.type_expected(arg_span, arg_type, "primitive or simd");
        }
        match op {
            UnOp::Plus | UnOp::Minus => {
                if !self.table.is_int_or_float_type(prim) {
                    return self.type_expected(arg_span, arg_type, "integer or floating-point");
                }
            }
            UnOp::Not => {
                if !self.table.is_int_type(prim) && !self.table.is_bool_type(prim) {
                    return self.type_expected(arg_span, arg_type, "integer or boolean");
                }
            }
            UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec => {
                self.write_to(arg);
                if !self.table.is_int_type(prim) {
                    return self.type_expected(arg_span, arg_type, "integer");
                }
            }
            UnOp::AddrOf | UnOp::AddrOfMut | UnOp::Deref => unreachable!(),
        }
        arg_type
    }

    fn infer_binary(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId) -> TypeId {
        let lhs_span = self.ast.expr(lhs).span;
        let mut left_ref = None;
        let (left_type, right_type);
        if op.is_logic() {
            let bool_ty = self.table.bool_type();
            left_type = self.coerce(lhs, bool_ty);
            right_type = self.coerce(rhs, bool_ty);
        } else if !op.is_assign() && self.is_untyped(lhs) {
            // `1 + x` types the right-hand side first and pulls the
            // literal toward it.
            right_type = self.deref(rhs);
            left_type = self.coerce(lhs, right_type);
        } else {
            let (r, ty) = {
                let ty = self.infer_expr(lhs);
                self.remove_ref(ty)
            };
            left_ref = r;
            left_type = ty;
            right_type = self.coerce(rhs, left_type);
        }

        if op != BinOp::Assign {
            let prim = self.simd_elem(left_type);
            if !matches!(self.table.kind(prim), TypeKind::Prim(_)) {
                return self.type_expected(lhs_span, left_type, "primitive or simd");
            }
            match op.without_assign() {
                BinOp::Add
                | BinOp::Sub
                | BinOp::Mul
                | BinOp::Div
                | BinOp::Rem
                | BinOp::CmpLt
                | BinOp::CmpGt
                | BinOp::CmpLe
                | BinOp::CmpGe => {
                    if !self.table.is_int_or_float_type(prim) {
                        return self.type_expected(
                            lhs_span,
                            left_type,
                            "integer or floating-point",
                        );
                    }
                }
                BinOp::CmpEq | BinOp::CmpNe => {}
                BinOp::Shl | BinOp::Shr => {
                    if !self.table.is_int_type(prim) {
                        return self.type_expected(lhs_span, left_type, "integer");
                    }
                }
                // Already handled by the coercion to bool above.
                BinOp::LogicAnd | BinOp::LogicOr => {}
                BinOp::And | BinOp::Or | BinOp::Xor => {
                    if !self.table.is_int_type(prim) && !self.table.is_bool_type(prim) {
                        return self.type_expected(lhs_span, left_type, "integer or boolean");
                    }
                }
                _ => unreachable!("assignment stripped above"),
            }
        }
        if op.is_assign() {
            self.write_to(lhs);
            if !left_ref.map(|r| r.is_mut).unwrap_or(false) {
                return self.mutable_expected(lhs_span);
            }
            return self.table.unit_type();
        }
        self.coerce(lhs, left_type);
        if op.is_cmp() {
            let bool_ty = self.table.bool_type();
            // Comparisons on SIMD values compare lane-wise.
            if let TypeKind::SizedArray {
                size,
                is_simd: true,
                ..
            } = *self.table.kind(left_type)
            {
                return self.table.sized_array_type(bool_ty, size, true);
            }
            return bool_ty;
        }
        right_type
    }

    // -- Casts --------------------------------------------------------------

    fn infer_cast(&mut self, span: Span, expr: ExprId, target: sable_ast::TypeExprId) -> TypeId {
        let expected = self.infer_type_expr(target);
        let ty = self.deref(expr);
        if ty == expected {
            self.warn(span, "cast source and destination types are identical");
            return expected;
        }
        let mut allow_ptr = false;
        let mut allow_int = false;
        let mut allow_float = false;
        if matches!(self.table.kind(expected), TypeKind::Ptr { .. }) {
            allow_ptr = true;
            allow_int = true;
        } else if self.table.is_int_type(expected) {
            allow_ptr = true;
            allow_int = true;
            allow_float = true;
        } else if self.table.is_float_type(expected) {
            allow_int = true;
            allow_float = true;
        }
        if allow_ptr && matches!(self.table.kind(ty), TypeKind::Ptr { .. }) {
            return expected;
        }
        if allow_int && self.table.is_int_type(ty) {
            return expected;
        }
        if allow_float && self.table.is_float_type(ty) {
            return expected;
        }
        self.invalid_cast(span, ty, expected)
    }
}
