//! Tests for the bidirectional checker.
//!
//! Each test constructs a resolved AST by hand and checks the types the
//! checker assigns (or the diagnostics it reports). This is verbose but
//! precise — we know exactly what we are testing, without a parser or name
//! resolver in the loop.

use sable_ast::*;
use sable_diag::{Category, Diagnostics};
use sable_types::{TypeId, TypeKind};

use crate::{ArgSlot, CheckOptions, TypeChecker};

// ---------------------------------------------------------------------------
// AST construction helpers
// ---------------------------------------------------------------------------

fn s() -> Span {
    Span::new(FileId(0), 0, 1)
}

struct B {
    ast: Ast,
}

impl B {
    fn new() -> Self {
        Self { ast: Ast::new() }
    }

    fn lit_int(&mut self, value: u64) -> ExprId {
        self.ast.alloc_expr(ExprKind::Lit(Lit::Int(value)), s())
    }

    fn lit_float(&mut self, value: f64) -> ExprId {
        self.ast.alloc_expr(ExprKind::Lit(Lit::Float(value)), s())
    }

    fn lit_bool(&mut self, value: bool) -> ExprId {
        self.ast.alloc_expr(ExprKind::Lit(Lit::Bool(value)), s())
    }

    fn unit(&mut self) -> ExprId {
        self.ast.alloc_expr(ExprKind::Tuple(Vec::new()), s())
    }

    fn tuple(&mut self, elems: Vec<ExprId>) -> ExprId {
        self.ast.alloc_expr(ExprKind::Tuple(elems), s())
    }

    fn prim(&mut self, tag: PrimTy) -> TypeExprId {
        self.ast.alloc_type_expr(TypeExprKind::Prim(tag), s())
    }

    fn unit_ty(&mut self) -> TypeExprId {
        self.ast.alloc_type_expr(TypeExprKind::Tuple(Vec::new()), s())
    }

    fn seg(name: &str, args: Vec<TypeExprId>) -> PathSeg {
        PathSeg {
            name: SegName::Ident(name.to_string()),
            type_args: args,
            span: s(),
        }
    }

    fn path(&mut self, start: Option<DeclId>, segs: Vec<PathSeg>) -> PathId {
        self.ast.alloc_path(Path {
            start_decl: start,
            segs,
            span: s(),
        })
    }

    fn path1(&mut self, start: DeclId, name: &str) -> PathId {
        let segs = vec![Self::seg(name, Vec::new())];
        self.path(Some(start), segs)
    }

    fn path_expr(&mut self, start: DeclId, name: &str) -> ExprId {
        let path = self.path1(start, name);
        self.ast.alloc_expr(ExprKind::Path(path), s())
    }

    fn ty_path(&mut self, start: DeclId, name: &str) -> TypeExprId {
        let path = self.path1(start, name);
        self.ast.alloc_type_expr(TypeExprKind::Path(path), s())
    }

    fn binding(&mut self, name: &str, is_mut: bool) -> DeclId {
        self.ast.alloc_decl(
            DeclKind::Binding {
                name: name.to_string(),
                is_mut,
            },
            s(),
        )
    }

    fn bind_pat(&mut self, decl: DeclId) -> PatId {
        self.ast.alloc_pat(PatKind::Binding { decl, sub: None }, s())
    }

    /// Fresh `name` binding plus its pattern.
    fn named_pat(&mut self, name: &str) -> (DeclId, PatId) {
        let decl = self.binding(name, false);
        (decl, self.bind_pat(decl))
    }

    fn ascribe(&mut self, pat: PatId, ty: TypeExprId) -> PatId {
        self.ast.alloc_pat(PatKind::Ascribe { pat: Some(pat), ty }, s())
    }

    fn tuple_pat(&mut self, elems: Vec<PatId>) -> PatId {
        self.ast.alloc_pat(PatKind::Tuple(elems), s())
    }

    fn let_decl(&mut self, pat: PatId, init: Option<ExprId>) -> DeclId {
        self.ast.alloc_decl(DeclKind::Let { pat, init }, s())
    }

    fn expr_stmt(expr: ExprId) -> Stmt {
        Stmt {
            kind: StmtKind::Expr(expr),
            span: s(),
        }
    }

    fn decl_stmt(decl: DeclId) -> Stmt {
        Stmt {
            kind: StmtKind::Decl(decl),
            span: s(),
        }
    }

    fn block(&mut self, stmts: Vec<Stmt>, last_semi: bool) -> ExprId {
        self.ast.alloc_expr(ExprKind::Block { stmts, last_semi }, s())
    }

    fn lambda(
        &mut self,
        param: PatId,
        ret_ty: Option<TypeExprId>,
        body: Option<ExprId>,
    ) -> ExprId {
        self.ast.alloc_expr(
            ExprKind::Lambda(Lambda {
                param,
                ret_ty,
                filter: None,
                body,
            }),
            s(),
        )
    }

    fn fn_decl(&mut self, name: &str, type_params: Vec<DeclId>, lambda: ExprId) -> DeclId {
        self.ast.alloc_decl(
            DeclKind::Fn(FnDecl {
                name: name.to_string(),
                type_params,
                lambda,
            }),
            s(),
        )
    }

    /// `fn name() ... { body }` with a unit parameter.
    fn simple_fn(&mut self, name: &str, ret_ty: Option<TypeExprId>, body: ExprId) -> DeclId {
        let param = self.tuple_pat(Vec::new());
        let lambda = self.lambda(param, ret_ty, Some(body));
        self.fn_decl(name, Vec::new(), lambda)
    }

    fn type_param(&mut self, name: &str) -> DeclId {
        self.ast.alloc_decl(
            DeclKind::TypeParam {
                name: name.to_string(),
            },
            s(),
        )
    }

    fn field(&mut self, name: &str, ty: TypeExprId) -> DeclId {
        self.ast.alloc_decl(
            DeclKind::Field {
                name: name.to_string(),
                ty,
                init: None,
            },
            s(),
        )
    }

    fn struct_decl(
        &mut self,
        name: &str,
        type_params: Vec<DeclId>,
        fields: Vec<DeclId>,
        is_tuple_like: bool,
    ) -> DeclId {
        self.ast.alloc_decl(
            DeclKind::Struct(StructDecl {
                name: name.to_string(),
                type_params,
                fields,
                is_tuple_like,
            }),
            s(),
        )
    }

    fn enum_decl(
        &mut self,
        name: &str,
        type_params: Vec<DeclId>,
        variants: Vec<(&str, VariantShape)>,
    ) -> DeclId {
        let variant_ids: Vec<DeclId> = variants
            .into_iter()
            .map(|(variant_name, shape)| {
                self.ast.alloc_decl(
                    DeclKind::Variant(VariantDecl {
                        name: variant_name.to_string(),
                        shape,
                        parent: None,
                    }),
                    s(),
                )
            })
            .collect();
        let decl = self.ast.alloc_decl(
            DeclKind::Enum(EnumDecl {
                name: name.to_string(),
                type_params,
                variants: variant_ids.clone(),
            }),
            s(),
        );
        for variant in variant_ids {
            if let DeclKind::Variant(v) = &mut self.ast.decls[variant.index()].kind {
                v.parent = Some(decl);
            }
        }
        decl
    }

    fn static_decl(
        &mut self,
        name: &str,
        is_mut: bool,
        ty: Option<TypeExprId>,
        init: Option<ExprId>,
    ) -> DeclId {
        self.ast.alloc_decl(
            DeclKind::Static(StaticDecl {
                name: name.to_string(),
                is_mut,
                ty,
                init,
                group: Vec::new(),
                top_level: true,
            }),
            s(),
        )
    }

    fn module(&mut self, name: &str, decls: Vec<DeclId>) -> DeclId {
        self.ast.alloc_decl(
            DeclKind::Mod(ModDecl {
                name: name.to_string(),
                decls,
                parent: None,
            }),
            s(),
        )
    }

    fn call(&mut self, callee: ExprId, arg: ExprId) -> ExprId {
        self.ast.alloc_expr(ExprKind::Call { callee, arg }, s())
    }

    fn binary(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.ast.alloc_expr(ExprKind::Binary { op, lhs, rhs }, s())
    }

    fn unary(&mut self, op: UnOp, arg: ExprId) -> ExprId {
        self.ast.alloc_expr(ExprKind::Unary { op, arg }, s())
    }

    fn proj(&mut self, base: ExprId, name: &str) -> ExprId {
        self.ast.alloc_expr(
            ExprKind::Proj {
                base,
                field: ProjField::Name(name.to_string()),
            },
            s(),
        )
    }
}

fn run(ast: &Ast, root: DeclId) -> TypeChecker<'_> {
    let mut checker = TypeChecker::new(ast, CheckOptions::default(), Diagnostics::new());
    checker.check_module(root);
    checker
}

fn prim_id(checker: &mut TypeChecker<'_>, tag: PrimTy) -> TypeId {
    checker.table.prim_type(tag)
}

fn categories(checker: &TypeChecker<'_>) -> Vec<Category> {
    checker
        .sink()
        .diagnostics()
        .iter()
        .map(|d| d.category)
        .collect()
}

// ---------------------------------------------------------------------------
// Literals and lets
// ---------------------------------------------------------------------------

#[test]
fn literal_defaults() {
    let mut b = B::new();
    let (x, x_pat) = b.named_pat("x");
    let one = b.lit_int(1);
    let let_x = b.let_decl(x_pat, Some(one));
    let (y, y_pat) = b.named_pat("y");
    let half = b.lit_float(0.5);
    let let_y = b.let_decl(y_pat, Some(half));
    let (z, z_pat) = b.named_pat("z");
    let yes = b.lit_bool(true);
    let let_z = b.let_decl(z_pat, Some(yes));
    let body = b.block(
        vec![B::decl_stmt(let_x), B::decl_stmt(let_y), B::decl_stmt(let_z)],
        true,
    );
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_ty = prim_id(&mut checker, PrimTy::I32);
    let f64_ty = prim_id(&mut checker, PrimTy::F64);
    let bool_ty = prim_id(&mut checker, PrimTy::Bool);
    assert_eq!(checker.result().decl_type(x), Some(i32_ty));
    assert_eq!(checker.result().decl_type(y), Some(f64_ty));
    assert_eq!(checker.result().decl_type(z), Some(bool_ty));
}

#[test]
fn tuple_let_splits_elementwise() {
    // let (a, c: u64) = (1, 2);
    let mut b = B::new();
    let (a, a_pat) = b.named_pat("a");
    let (c, c_pat_inner) = b.named_pat("c");
    let u64_ty = b.prim(PrimTy::U64);
    let c_pat = b.ascribe(c_pat_inner, u64_ty);
    let pat = b.tuple_pat(vec![a_pat, c_pat]);
    let one = b.lit_int(1);
    let two = b.lit_int(2);
    let init = b.tuple(vec![one, two]);
    let let_decl = b.let_decl(pat, Some(init));
    let body = b.block(vec![B::decl_stmt(let_decl)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    let u64_id = prim_id(&mut checker, PrimTy::U64);
    assert_eq!(checker.result().decl_type(a), Some(i32_id));
    assert_eq!(checker.result().decl_type(c), Some(u64_id));
    // The annotated element propagated into the literal.
    assert_eq!(checker.result().expr_type(two), Some(u64_id));
}

#[test]
fn let_pattern_must_be_irrefutable() {
    let mut b = B::new();
    let pat = b.ast.alloc_pat(PatKind::Lit(Lit::Int(1)), s());
    let one = b.lit_int(1);
    let let_decl = b.let_decl(pat, Some(one));
    let body = b.block(vec![B::decl_stmt(let_decl)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::Refutability]);
}

#[test]
fn condition_pattern_must_be_refutable() {
    // while let w = 1 { } — the pattern always matches.
    let mut b = B::new();
    let (_, w_pat) = b.named_pat("w");
    let one = b.lit_int(1);
    let body = b.block(Vec::new(), false);
    let while_expr = b.ast.alloc_expr(
        ExprKind::While {
            cond: Cond::Let {
                pat: w_pat,
                scrutinee: one,
            },
            body,
        },
        s(),
    );
    let fn_body = b.block(vec![B::expr_stmt(while_expr)], true);
    let main = b.simple_fn("main", None, fn_body);
    let root = b.module("", vec![main]);

    let checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::Refutability]);
}

// ---------------------------------------------------------------------------
// Smart literal inference
// ---------------------------------------------------------------------------

#[test]
fn smart_literal_defaulting_in_generic_call() {
    // fn foo[T](x: T, y: u64) = x; foo(1, 2)
    let mut b = B::new();
    let t = b.type_param("T");
    let (x, x_pat_inner) = b.named_pat("x");
    let t_ty = b.ty_path(t, "T");
    let x_pat = b.ascribe(x_pat_inner, t_ty);
    let (_, y_pat_inner) = b.named_pat("y");
    let u64_ty = b.prim(PrimTy::U64);
    let y_pat = b.ascribe(y_pat_inner, u64_ty);
    let param = b.tuple_pat(vec![x_pat, y_pat]);
    let body = b.path_expr(x, "x");
    let lambda = b.lambda(param, None, Some(body));
    let foo = b.fn_decl("foo", vec![t], lambda);

    let callee_path = b.path1(foo, "foo");
    let callee = b.ast.alloc_expr(ExprKind::Path(callee_path), s());
    let one = b.lit_int(1);
    let two = b.lit_int(2);
    let arg = b.tuple(vec![one, two]);
    let call = b.call(callee, arg);
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(call));
    let main_body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, main_body);
    let root = b.module("", vec![foo, main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    let u64_id = prim_id(&mut checker, PrimTy::U64);
    // foo instantiated at T = i32; the second literal went straight to u64.
    assert_eq!(checker.result().decl_type(r), Some(i32_id));
    assert_eq!(checker.result().expr_type(one), Some(i32_id));
    assert_eq!(checker.result().expr_type(two), Some(u64_id));
    let info = checker.result().path_info(callee_path).expect("path info");
    assert_eq!(info.type_args[0], vec![i32_id]);
}

#[test]
fn if_else_biases_literal_toward_known_branch() {
    // let u: u64 = 0; let r = if true { 1 } else { u };
    let mut b = B::new();
    let (u, u_pat_inner) = b.named_pat("u");
    let u64_ty = b.prim(PrimTy::U64);
    let u_pat = b.ascribe(u_pat_inner, u64_ty);
    let zero = b.lit_int(0);
    let let_u = b.let_decl(u_pat, Some(zero));

    let cond = b.lit_bool(true);
    let one = b.lit_int(1);
    let u_ref = b.path_expr(u, "u");
    let if_expr = b.ast.alloc_expr(
        ExprKind::If {
            cond: Cond::Bool(cond),
            then_expr: one,
            else_expr: Some(u_ref),
        },
        s(),
    );
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(if_expr));
    let body = b.block(vec![B::decl_stmt(let_u), B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let u64_id = prim_id(&mut checker, PrimTy::U64);
    assert_eq!(checker.result().decl_type(r), Some(u64_id));
    assert_eq!(checker.result().expr_type(one), Some(u64_id));
}

#[test]
fn if_else_two_literals_prefer_float() {
    let mut b = B::new();
    let cond = b.lit_bool(true);
    let half = b.lit_float(0.5);
    let one = b.lit_int(1);
    let if_expr = b.ast.alloc_expr(
        ExprKind::If {
            cond: Cond::Bool(cond),
            then_expr: half,
            else_expr: Some(one),
        },
        s(),
    );
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(if_expr));
    let body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let f64_id = prim_id(&mut checker, PrimTy::F64);
    assert_eq!(checker.result().decl_type(r), Some(f64_id));
    assert_eq!(checker.result().expr_type(one), Some(f64_id));
}

#[test]
fn untyped_left_operand_takes_right_type() {
    // let v: u64 = 3; let w = 1 + v;
    let mut b = B::new();
    let (v, v_pat_inner) = b.named_pat("v");
    let u64_ty = b.prim(PrimTy::U64);
    let v_pat = b.ascribe(v_pat_inner, u64_ty);
    let three = b.lit_int(3);
    let let_v = b.let_decl(v_pat, Some(three));

    let one = b.lit_int(1);
    let v_ref = b.path_expr(v, "v");
    let sum = b.binary(BinOp::Add, one, v_ref);
    let (w, w_pat) = b.named_pat("w");
    let let_w = b.let_decl(w_pat, Some(sum));
    let body = b.block(vec![B::decl_stmt(let_v), B::decl_stmt(let_w)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let u64_id = prim_id(&mut checker, PrimTy::U64);
    assert_eq!(checker.result().decl_type(w), Some(u64_id));
    assert_eq!(checker.result().expr_type(one), Some(u64_id));
}

// ---------------------------------------------------------------------------
// References, projections, addressing
// ---------------------------------------------------------------------------

/// `struct S { a: i32, b: i32 }` plus `let mut s = S { a: 1, b: 2 };`.
fn mutable_struct_binding(b: &mut B) -> (DeclId, DeclId, DeclId) {
    let i32_a = b.prim(PrimTy::I32);
    let i32_b = b.prim(PrimTy::I32);
    let field_a = b.field("a", i32_a);
    let field_b = b.field("b", i32_b);
    let s_decl = b.struct_decl("S", Vec::new(), vec![field_a, field_b], false);

    let s_binding = b.binding("s", true);
    let s_pat = b.bind_pat(s_binding);
    let record_path = b.path1(s_decl, "S");
    let one = b.lit_int(1);
    let two = b.lit_int(2);
    let record = b.ast.alloc_expr(
        ExprKind::Record {
            base: RecordBase::Path(record_path),
            fields: vec![
                FieldInit {
                    name: "a".to_string(),
                    expr: one,
                    span: s(),
                },
                FieldInit {
                    name: "b".to_string(),
                    expr: two,
                    span: s(),
                },
            ],
        },
        s(),
    );
    let let_s = b.let_decl(s_pat, Some(record));
    (s_decl, s_binding, let_s)
}

#[test]
fn projection_through_mutable_binding() {
    // let mut s = S { a: 1, b: 2 }; s.a = 3; &s.a; &mut s.a;
    let mut b = B::new();
    let (_, s_binding, let_s) = mutable_struct_binding(&mut b);

    let s_ref1 = b.path_expr(s_binding, "s");
    let proj1 = b.proj(s_ref1, "a");
    let three = b.lit_int(3);
    let assign = b.binary(BinOp::Assign, proj1, three);

    let s_ref2 = b.path_expr(s_binding, "s");
    let proj2 = b.proj(s_ref2, "a");
    let addr = b.unary(UnOp::AddrOf, proj2);
    let (p, p_pat) = b.named_pat("p");
    let let_p = b.let_decl(p_pat, Some(addr));

    let s_ref3 = b.path_expr(s_binding, "s");
    let proj3 = b.proj(s_ref3, "a");
    let addr_mut = b.unary(UnOp::AddrOfMut, proj3);
    let (q, q_pat) = b.named_pat("q");
    let let_q = b.let_decl(q_pat, Some(addr_mut));

    let body = b.block(
        vec![
            B::decl_stmt(let_s),
            B::expr_stmt(assign),
            B::decl_stmt(let_p),
            B::decl_stmt(let_q),
        ],
        true,
    );
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    let ref_mut_i32 = checker.table.ref_type(i32_id, true, 0);
    let ptr_i32 = checker.table.ptr_type(i32_id, false, 0);
    let ptr_mut_i32 = checker.table.ptr_type(i32_id, true, 0);
    let unit = checker.table.unit_type();

    // The projection is an l-value over the mutable binding.
    assert_eq!(checker.result().expr_type(proj1), Some(ref_mut_i32));
    assert_eq!(checker.result().expr_type(assign), Some(unit));
    assert_eq!(checker.result().decl_type(p), Some(ptr_i32));
    assert_eq!(checker.result().decl_type(q), Some(ptr_mut_i32));
    // &mut marks the location written-to.
    assert!(checker.result().is_written(proj3));
    assert!(!checker.result().is_written(proj2));
}

#[test]
fn assignment_requires_mutable_binding() {
    let mut b = B::new();
    let (x, x_pat) = b.named_pat("x");
    let one = b.lit_int(1);
    let let_x = b.let_decl(x_pat, Some(one));
    let x_ref = b.path_expr(x, "x");
    let two = b.lit_int(2);
    let assign = b.binary(BinOp::Assign, x_ref, two);
    let body = b.block(vec![B::decl_stmt(let_x), B::expr_stmt(assign)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::MutableExpected]);
}

#[test]
fn reference_deref_inserts_implicit_cast() {
    // static X: i32 = 1; fn f() -> i32 { X }
    let mut b = B::new();
    let i32_ty = b.prim(PrimTy::I32);
    let one = b.lit_int(1);
    let x = b.static_decl("X", false, Some(i32_ty), Some(one));
    let x_ref = b.path_expr(x, "X");
    let body = b.block(vec![B::expr_stmt(x_ref)], false);
    let i32_ret = b.prim(PrimTy::I32);
    let f = b.simple_fn("f", Some(i32_ret), body);
    let root = b.module("", vec![x, f]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    let ref_i32 = checker.table.ref_type(i32_id, false, 0);
    // The path keeps its l-value type; the value use inserts the cast.
    assert_eq!(checker.result().expr_type(x_ref), Some(ref_i32));
    assert_eq!(checker.result().casts(x_ref), &[i32_id]);
    assert_eq!(checker.result().coerced_expr_type(x_ref), Some(i32_id));
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn unreachable_code_after_return() {
    // fn foo() -> i32 { return 0; let x = 1; x }
    let mut b = B::new();
    let param = b.tuple_pat(Vec::new());
    let i32_ret = b.prim(PrimTy::I32);
    let lambda = b.ast.alloc_expr(
        ExprKind::Lambda(Lambda {
            param,
            ret_ty: Some(i32_ret),
            filter: None,
            body: None,
        }),
        s(),
    );

    let ret = b.ast.alloc_expr(ExprKind::Return { lambda: Some(lambda) }, s());
    let zero = b.lit_int(0);
    let ret_call = b.call(ret, zero);
    let (x, x_pat) = b.named_pat("x");
    let one = b.lit_int(1);
    let let_x = b.let_decl(x_pat, Some(one));
    let x_ref = b.path_expr(x, "x");
    let body = b.block(
        vec![B::expr_stmt(ret_call), B::decl_stmt(let_x), B::expr_stmt(x_ref)],
        false,
    );
    if let ExprKind::Lambda(l) = &mut b.ast.exprs[lambda.index()].kind {
        l.body = Some(body);
    }
    let foo = b.fn_decl("foo", Vec::new(), lambda);
    let root = b.module("", vec![foo]);

    let mut checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::UnreachableCode]);
    // The function still types.
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    let unit = checker.table.unit_type();
    let fn_ty = checker.table.fn_type(unit, i32_id);
    assert_eq!(checker.result().decl_type(foo), Some(fn_ty));
    let no_ret = checker.table.no_ret_type();
    assert_eq!(checker.result().expr_type(ret_call), Some(no_ret));
}

#[test]
fn match_arms_join() {
    let mut b = B::new();
    let (x, x_pat) = b.named_pat("x");
    let seven = b.lit_int(7);
    let let_x = b.let_decl(x_pat, Some(seven));
    let x_ref = b.path_expr(x, "x");
    let zero_pat = b.ast.alloc_pat(PatKind::Lit(Lit::Int(0)), s());
    let ten = b.lit_int(10);
    let wild = b.ast.alloc_pat(PatKind::Wildcard, s());
    let twenty = b.lit_int(20);
    let match_expr = b.ast.alloc_expr(
        ExprKind::Match {
            scrutinee: x_ref,
            arms: vec![
                Arm {
                    pat: zero_pat,
                    body: ten,
                    span: s(),
                },
                Arm {
                    pat: wild,
                    body: twenty,
                    span: s(),
                },
            ],
        },
        s(),
    );
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(match_expr));
    let body = b.block(vec![B::decl_stmt(let_x), B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    assert_eq!(checker.result().decl_type(r), Some(i32_id));
}

#[test]
fn break_and_continue_types_in_for() {
    // fn range(body: fn i32 -> ()) -> fn (i32, i32) -> u64;
    // for i in range(0, 10) { if true { break(5) } else { continue(()) } }
    let mut b = B::new();
    let i32_dom = b.prim(PrimTy::I32);
    let unit_codom = b.unit_ty();
    let body_fn_ty = b.ast.alloc_type_expr(
        TypeExprKind::Fn {
            dom: i32_dom,
            codom: Some(unit_codom),
        },
        s(),
    );
    let (_, body_pat_inner) = b.named_pat("body");
    let range_param = b.ascribe(body_pat_inner, body_fn_ty);
    let i32_lo = b.prim(PrimTy::I32);
    let i32_hi = b.prim(PrimTy::I32);
    let args_ty = b
        .ast
        .alloc_type_expr(TypeExprKind::Tuple(vec![i32_lo, i32_hi]), s());
    let u64_ret = b.prim(PrimTy::U64);
    let range_ret = b.ast.alloc_type_expr(
        TypeExprKind::Fn {
            dom: args_ty,
            codom: Some(u64_ret),
        },
        s(),
    );
    let range_lambda = b.lambda(range_param, Some(range_ret), None);
    let range = b.fn_decl("range", Vec::new(), range_lambda);

    let for_expr = b.ast.alloc_expr(ExprKind::For { call: ExprId(0) }, s());
    let break_expr = b.ast.alloc_expr(
        ExprKind::Break {
            loop_expr: Some(for_expr),
        },
        s(),
    );
    let five = b.lit_int(5);
    let break_call = b.call(break_expr, five);
    let then_block = b.block(vec![B::expr_stmt(break_call)], false);
    let continue_expr = b.ast.alloc_expr(
        ExprKind::Continue {
            loop_expr: Some(for_expr),
        },
        s(),
    );
    let cont_arg = b.unit();
    let cont_call = b.call(continue_expr, cont_arg);
    let else_block = b.block(vec![B::expr_stmt(cont_call)], false);
    let cond = b.lit_bool(true);
    let if_expr = b.ast.alloc_expr(
        ExprKind::If {
            cond: Cond::Bool(cond),
            then_expr: then_block,
            else_expr: Some(else_block),
        },
        s(),
    );
    let loop_body = b.block(vec![B::expr_stmt(if_expr)], false);
    let (_, i_pat) = b.named_pat("i");
    let body_lambda = b.lambda(i_pat, None, Some(loop_body));
    let range_path = b.path_expr(range, "range");
    let inner_call = b.call(range_path, body_lambda);
    let zero = b.lit_int(0);
    let ten = b.lit_int(10);
    let bounds = b.tuple(vec![zero, ten]);
    let outer_call = b.call(inner_call, bounds);
    b.ast.exprs[for_expr.index()].kind = ExprKind::For { call: outer_call };

    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(for_expr));
    let body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![range, main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let u64_id = prim_id(&mut checker, PrimTy::U64);
    let unit = checker.table.unit_type();
    let cn_u64 = checker.table.cn_type(u64_id);
    let cn_unit = checker.table.cn_type(unit);
    // break continues the loop call's result, continue the body's result.
    assert_eq!(checker.result().expr_type(break_expr), Some(cn_u64));
    assert_eq!(checker.result().expr_type(continue_expr), Some(cn_unit));
    assert_eq!(checker.result().decl_type(r), Some(u64_id));
}

// ---------------------------------------------------------------------------
// Generic calls
// ---------------------------------------------------------------------------

/// `fn id[T](x: T) -> T = x;`
fn id_fn(b: &mut B) -> DeclId {
    let t = b.type_param("T");
    let (x, x_pat_inner) = b.named_pat("x");
    let t_param_ty = b.ty_path(t, "T");
    let param = b.ascribe(x_pat_inner, t_param_ty);
    let t_ret_ty = b.ty_path(t, "T");
    let body = b.path_expr(x, "x");
    let lambda = b.lambda(param, Some(t_ret_ty), Some(body));
    b.fn_decl("id", vec![t], lambda)
}

#[test]
fn codomain_variance_picks_lower_bound() {
    // id(true) infers T = bool.
    let mut b = B::new();
    let id = id_fn(&mut b);
    let callee = b.path_expr(id, "id");
    let arg = b.lit_bool(true);
    let call = b.call(callee, arg);
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(call));
    let body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![id, main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let bool_id = prim_id(&mut checker, PrimTy::Bool);
    assert_eq!(checker.result().decl_type(r), Some(bool_id));
}

#[test]
fn explicit_type_argument_coerces_literal() {
    // id[u8](1) instantiates at u8 and pulls the literal to u8.
    let mut b = B::new();
    let id = id_fn(&mut b);
    let u8_ty = b.prim(PrimTy::U8);
    let segs = vec![B::seg("id", vec![u8_ty])];
    let path = b.path(Some(id), segs);
    let callee = b.ast.alloc_expr(ExprKind::Path(path), s());
    let one = b.lit_int(1);
    let call = b.call(callee, one);
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(call));
    let body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![id, main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let u8_id = prim_id(&mut checker, PrimTy::U8);
    assert_eq!(checker.result().decl_type(r), Some(u8_id));
    assert_eq!(checker.result().expr_type(one), Some(u8_id));
}

#[test]
fn missing_type_arguments_without_call_are_rejected() {
    // Referencing id without type arguments and without a call.
    let mut b = B::new();
    let id = id_fn(&mut b);
    let id_ref = b.path_expr(id, "id");
    let (_, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(id_ref));
    let body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![id, main]);

    let checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::ArityMismatch]);
}

// ---------------------------------------------------------------------------
// Nominal types
// ---------------------------------------------------------------------------

#[test]
fn recursive_struct_needs_indirection() {
    // struct L { next: L } is unsized; struct M { next: &M } is fine.
    let mut b = B::new();
    let l_placeholder = b.binding("placeholder", false);
    let l_field_ty = b.ty_path(l_placeholder, "L");
    let l_field = b.field("next", l_field_ty);
    let l = b.struct_decl("L", Vec::new(), vec![l_field], false);
    if let TypeExprKind::Path(p) = &b.ast.type_exprs[l_field_ty.index()].kind {
        b.ast.paths[p.index()].start_decl = Some(l);
    }

    let m_path_ty = {
        let m_placeholder = b.binding("placeholder2", false);
        b.ty_path(m_placeholder, "M")
    };
    let m_ptr_ty = b.ast.alloc_type_expr(
        TypeExprKind::Ptr {
            pointee: m_path_ty,
            is_mut: false,
            addr_space: 0,
        },
        s(),
    );
    let m_field = b.field("next", m_ptr_ty);
    let m = b.struct_decl("M", Vec::new(), vec![m_field], false);
    if let TypeExprKind::Path(p) = &b.ast.type_exprs[m_path_ty.index()].kind {
        b.ast.paths[p.index()].start_decl = Some(m);
    }

    let root = b.module("", vec![l, m]);
    let checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::UnsizedType]);
    let message = &checker.sink().diagnostics()[0].message;
    assert!(message.contains("'L' is recursive and not sized"), "{message}");
}

#[test]
fn enum_constructors_and_patterns() {
    // enum Opt[T] { None, Some(T) }
    let mut b = B::new();
    let t = b.type_param("T");
    let t_ty = b.ty_path(t, "T");
    let opt = b.enum_decl(
        "Opt",
        vec![t],
        vec![("None", VariantShape::Unit), ("Some", VariantShape::Tuple(t_ty))],
    );

    // let o = Opt[i32]::Some(5);
    let i32_arg = b.prim(PrimTy::I32);
    let some_segs = vec![B::seg("Opt", vec![i32_arg]), B::seg("Some", Vec::new())];
    let some_path = b.path(Some(opt), some_segs);
    let some_ctor = b.ast.alloc_expr(ExprKind::Path(some_path), s());
    let five = b.lit_int(5);
    let some_call = b.call(some_ctor, five);
    let (o, o_pat) = b.named_pat("o");
    let let_o = b.let_decl(o_pat, Some(some_call));

    // match o { Opt[i32]::Some(p) => p, Opt[i32]::None => 0 }
    let o_ref = b.path_expr(o, "o");
    let i32_arg2 = b.prim(PrimTy::I32);
    let pat_some_segs = vec![B::seg("Opt", vec![i32_arg2]), B::seg("Some", Vec::new())];
    let pat_some_path = b.path(Some(opt), pat_some_segs);
    let (p, p_pat) = b.named_pat("p");
    let some_pat = b.ast.alloc_pat(
        PatKind::Ctor {
            path: pat_some_path,
            arg: Some(p_pat),
        },
        s(),
    );
    let p_ref = b.path_expr(p, "p");
    let i32_arg3 = b.prim(PrimTy::I32);
    let pat_none_segs = vec![B::seg("Opt", vec![i32_arg3]), B::seg("None", Vec::new())];
    let pat_none_path = b.path(Some(opt), pat_none_segs);
    let none_pat = b.ast.alloc_pat(
        PatKind::Ctor {
            path: pat_none_path,
            arg: None,
        },
        s(),
    );
    let zero = b.lit_int(0);
    let match_expr = b.ast.alloc_expr(
        ExprKind::Match {
            scrutinee: o_ref,
            arms: vec![
                Arm {
                    pat: some_pat,
                    body: p_ref,
                    span: s(),
                },
                Arm {
                    pat: none_pat,
                    body: zero,
                    span: s(),
                },
            ],
        },
        s(),
    );
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(match_expr));
    let body = b.block(vec![B::decl_stmt(let_o), B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![opt, main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    let opt_ty = checker.result().decl_type(opt).expect("enum type");
    let opt_i32 = checker.table.type_app(opt_ty, vec![i32_id]);
    assert_eq!(checker.result().decl_type(o), Some(opt_i32));
    assert_eq!(checker.result().decl_type(r), Some(i32_id));
    assert_eq!(checker.result().decl_type(p), Some(i32_id));
    assert_eq!(checker.result().pat_variant(some_pat), Some(1));
    assert_eq!(checker.result().pat_variant(none_pat), Some(0));
}

#[test]
fn tuple_like_constructor_is_a_function() {
    // struct P(i32, i32); let v = P(1, 2);
    let mut b = B::new();
    let f0_ty = b.prim(PrimTy::I32);
    let f1_ty = b.prim(PrimTy::I32);
    let f0 = b.field("0", f0_ty);
    let f1 = b.field("1", f1_ty);
    let p_decl = b.struct_decl("P", Vec::new(), vec![f0, f1], true);

    let ctor = b.path_expr(p_decl, "P");
    let one = b.lit_int(1);
    let two = b.lit_int(2);
    let arg = b.tuple(vec![one, two]);
    let call = b.call(ctor, arg);
    let (v, v_pat) = b.named_pat("v");
    let let_v = b.let_decl(v_pat, Some(call));
    let body = b.block(vec![B::decl_stmt(let_v)], true);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![p_decl, main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let p_ty = checker.result().decl_type(p_decl).expect("struct type");
    assert_eq!(checker.result().decl_type(v), Some(p_ty));
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    let dom = checker.table.tuple_type(vec![i32_id, i32_id]);
    let ctor_ty = checker.table.fn_type(dom, p_ty);
    assert_eq!(checker.result().expr_type(ctor), Some(ctor_ty));
}

// ---------------------------------------------------------------------------
// Implicit parameters
// ---------------------------------------------------------------------------

#[test]
fn implicit_parameters_are_summoned() {
    // fn g(a: i32, implicit b: bool) -> i32 = a; g(5)
    let mut b = B::new();
    let (a, a_pat_inner) = b.named_pat("a");
    let i32_ty = b.prim(PrimTy::I32);
    let a_pat = b.ascribe(a_pat_inner, i32_ty);
    let (_, b_pat_inner) = b.named_pat("b");
    let bool_ty = b.prim(PrimTy::Bool);
    let b_ascribed = b.ascribe(b_pat_inner, bool_ty);
    let b_pat = b.ast.alloc_pat(
        PatKind::Implicit {
            underlying: b_ascribed,
        },
        s(),
    );
    let param = b.tuple_pat(vec![a_pat, b_pat]);
    let body = b.path_expr(a, "a");
    let i32_ret = b.prim(PrimTy::I32);
    let lambda = b.lambda(param, Some(i32_ret), Some(body));
    let g = b.fn_decl("g", Vec::new(), lambda);

    let callee = b.path_expr(g, "g");
    let five = b.lit_int(5);
    let call = b.call(callee, five);
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(call));
    let main_body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, main_body);
    let root = b.module("", vec![g, main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    let bool_id = prim_id(&mut checker, PrimTy::Bool);
    assert_eq!(checker.result().decl_type(r), Some(i32_id));
    // The single given argument fills slot 0; slot 1 is summoned.
    assert_eq!(
        checker.result().arg_plan(five),
        Some(&[ArgSlot::Given(five), ArgSlot::Summon(bool_id)][..])
    );
}

#[test]
fn unit_argument_summons_an_implicit_parameter() {
    // fn h(implicit c: bool) -> bool = c; h(())
    let mut b = B::new();
    let (c, c_pat_inner) = b.named_pat("c");
    let bool_ty = b.prim(PrimTy::Bool);
    let c_ascribed = b.ascribe(c_pat_inner, bool_ty);
    let param = b.ast.alloc_pat(
        PatKind::Implicit {
            underlying: c_ascribed,
        },
        s(),
    );
    let body = b.path_expr(c, "c");
    let bool_ret = b.prim(PrimTy::Bool);
    let lambda = b.lambda(param, Some(bool_ret), Some(body));
    let h = b.fn_decl("h", Vec::new(), lambda);

    let callee = b.path_expr(h, "h");
    let arg = b.unit();
    let call = b.call(callee, arg);
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(call));
    let main_body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, main_body);
    let root = b.module("", vec![h, main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let bool_id = prim_id(&mut checker, PrimTy::Bool);
    assert_eq!(checker.result().decl_type(r), Some(bool_id));
    assert_eq!(checker.result().summon(arg), Some(bool_id));
}

// ---------------------------------------------------------------------------
// Arrays, casts, filters
// ---------------------------------------------------------------------------

#[test]
fn array_indexing_by_call() {
    // static ARR: [i32 * 4] = [1, 2, 3, 4]; fn f() -> i32 { ARR(0) }
    let mut b = B::new();
    let i32_elem = b.prim(PrimTy::I32);
    let arr_ty = b.ast.alloc_type_expr(
        TypeExprKind::SizedArray {
            elem: i32_elem,
            size: 4,
            is_simd: false,
        },
        s(),
    );
    let elems: Vec<ExprId> = (1..=4).map(|n| b.lit_int(n)).collect();
    let arr_init = b.ast.alloc_expr(
        ExprKind::Array {
            elems,
            is_simd: false,
        },
        s(),
    );
    let arr = b.static_decl("ARR", false, Some(arr_ty), Some(arr_init));

    let arr_ref = b.path_expr(arr, "ARR");
    let zero = b.lit_int(0);
    let index = b.call(arr_ref, zero);
    let body = b.block(vec![B::expr_stmt(index)], false);
    let i32_ret = b.prim(PrimTy::I32);
    let f = b.simple_fn("f", Some(i32_ret), body);
    let root = b.module("", vec![arr, f]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    let ref_i32 = checker.table.ref_type(i32_id, false, 0);
    // Indexing an l-value array yields an l-value element.
    assert_eq!(checker.result().expr_type(index), Some(ref_i32));
    assert_eq!(checker.result().coerced_expr_type(index), Some(i32_id));
}

#[test]
fn cast_rules() {
    // x as f64 is fine for i32; bool as f64 is not.
    let mut b = B::new();
    let (x, x_pat_inner) = b.named_pat("x");
    let i32_ty = b.prim(PrimTy::I32);
    let x_pat = b.ascribe(x_pat_inner, i32_ty);
    let seven = b.lit_int(7);
    let let_x = b.let_decl(x_pat, Some(seven));
    let x_ref = b.path_expr(x, "x");
    let f64_target = b.prim(PrimTy::F64);
    let good = b
        .ast
        .alloc_expr(ExprKind::Cast { expr: x_ref, target: f64_target }, s());
    let (_, g_pat) = b.named_pat("g");
    let let_g = b.let_decl(g_pat, Some(good));

    let yes = b.lit_bool(true);
    let f64_target2 = b.prim(PrimTy::F64);
    let bad = b
        .ast
        .alloc_expr(ExprKind::Cast { expr: yes, target: f64_target2 }, s());
    let (_, h_pat) = b.named_pat("h");
    let let_h = b.let_decl(h_pat, Some(bad));

    let body = b.block(
        vec![B::decl_stmt(let_x), B::decl_stmt(let_g), B::decl_stmt(let_h)],
        true,
    );
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::InvalidCast]);
    let f64_id = prim_id(&mut checker, PrimTy::F64);
    assert_eq!(checker.result().expr_type(good), Some(f64_id));
}

#[test]
fn filter_rejects_short_circuit() {
    let mut b = B::new();
    let lhs = b.lit_bool(true);
    let rhs = b.lit_bool(false);
    let filter = b.binary(BinOp::LogicAnd, lhs, rhs);
    let param = b.tuple_pat(Vec::new());
    let one = b.lit_int(1);
    let lambda = b.ast.alloc_expr(
        ExprKind::Lambda(Lambda {
            param,
            ret_ty: None,
            filter: Some(filter),
            body: Some(one),
        }),
        s(),
    );
    let f = b.fn_decl("f", Vec::new(), lambda);
    let root = b.module("", vec![f]);

    let checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::ContextMismatch]);
    let notes = &checker.sink().diagnostics()[0].notes;
    assert!(notes.iter().any(|n| n.message.contains("use '&' instead of '&&'")));
}

// ---------------------------------------------------------------------------
// Declarations, modules, attributes
// ---------------------------------------------------------------------------

#[test]
fn mutually_recursive_statics_are_reported() {
    let mut b = B::new();
    let y_path = b.path(None, vec![B::seg("Y", Vec::new())]);
    let y_ref = b.ast.alloc_expr(ExprKind::Path(y_path), s());
    let x = b.static_decl("X", false, None, Some(y_ref));
    let x_path = b.path1(x, "X");
    let x_ref = b.ast.alloc_expr(ExprKind::Path(x_path), s());
    let y = b.static_decl("Y", false, None, Some(x_ref));
    b.ast.paths[y_path.index()].start_decl = Some(y);
    let root = b.module("", vec![x, y]);

    let checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::RecursiveDecl]);
}

#[test]
fn module_member_paths() {
    // mod inner { fn h() -> i32 = 1 }  ...  inner::h(())
    let mut b = B::new();
    let one = b.lit_int(1);
    let i32_ret = b.prim(PrimTy::I32);
    let h = b.simple_fn("h", Some(i32_ret), one);
    let inner = b.module("inner", vec![h]);

    let segs = vec![B::seg("inner", Vec::new()), B::seg("h", Vec::new())];
    let h_path = b.path(Some(inner), segs);
    let callee = b.ast.alloc_expr(ExprKind::Path(h_path), s());
    let arg = b.unit();
    let call = b.call(callee, arg);
    let (r, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(call));
    let main_body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, main_body);
    let root = b.module("", vec![inner, main]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let i32_id = prim_id(&mut checker, PrimTy::I32);
    assert_eq!(checker.result().decl_type(r), Some(i32_id));
    let info = checker.result().path_info(h_path).expect("path info");
    assert!(info.is_value);
    assert_eq!(info.indices[1], Some(0));
}

#[test]
fn unknown_module_member_is_reported() {
    let mut b = B::new();
    let one = b.lit_int(1);
    let i32_ret = b.prim(PrimTy::I32);
    let h = b.simple_fn("h", Some(i32_ret), one);
    let inner = b.module("inner", vec![h]);
    let segs = vec![B::seg("inner", Vec::new()), B::seg("missing", Vec::new())];
    let bad_path = b.path(Some(inner), segs);
    let bad_ref = b.ast.alloc_expr(ExprKind::Path(bad_path), s());
    let (_, r_pat) = b.named_pat("r");
    let let_r = b.let_decl(r_pat, Some(bad_ref));
    let main_body = b.block(vec![B::decl_stmt(let_r)], true);
    let main = b.simple_fn("main", None, main_body);
    let root = b.module("", vec![inner, main]);

    let checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::UnknownMember]);
}

#[test]
fn export_attribute_validation() {
    let mut b = B::new();
    let one = b.lit_int(1);
    let i32_ret = b.prim(PrimTy::I32);
    let good = b.simple_fn("exported", Some(i32_ret), one);
    b.ast.decls[good.index()].attrs.push(Attr {
        name: "export".to_string(),
        kind: AttrKind::Named(Vec::new()),
        span: s(),
    });

    let generic = id_fn(&mut b);
    b.ast.decls[generic.index()].attrs.push(Attr {
        name: "export".to_string(),
        kind: AttrKind::Named(Vec::new()),
        span: s(),
    });

    let root = b.module("", vec![good, generic]);
    let checker = run(&b.ast, root);
    assert_eq!(categories(&checker), vec![Category::InvalidAttribute]);
    let message = &checker.sink().diagnostics()[0].message;
    assert!(message.contains("polymorphic"), "{message}");
}

#[test]
fn statement_with_no_effect_warns() {
    let mut b = B::new();
    let one = b.lit_int(1);
    let two = b.lit_int(2);
    let body = b.block(vec![B::expr_stmt(one), B::expr_stmt(two)], false);
    let main = b.simple_fn("main", None, body);
    let root = b.module("", vec![main]);

    let checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    assert_eq!(checker.sink().warning_count(), 1);
    assert_eq!(categories(&checker), vec![Category::NoEffect]);
}

#[test]
fn type_alias_applications_expand() {
    // type Pair[T] = (T, T); fn f(p: Pair[u8]) -> u8 = p.0  (via tuple index)
    let mut b = B::new();
    let t = b.type_param("T");
    let t_ref1 = b.ty_path(t, "T");
    let t_ref2 = b.ty_path(t, "T");
    let pair_body = b
        .ast
        .alloc_type_expr(TypeExprKind::Tuple(vec![t_ref1, t_ref2]), s());
    let alias = b.ast.alloc_decl(
        DeclKind::TypeAlias {
            name: "Pair".to_string(),
            type_params: vec![t],
            aliased: pair_body,
        },
        s(),
    );

    let (p, p_pat_inner) = b.named_pat("p");
    let u8_arg = b.prim(PrimTy::U8);
    let segs = vec![B::seg("Pair", vec![u8_arg])];
    let pair_path = b.path(Some(alias), segs);
    let pair_u8 = b.ast.alloc_type_expr(TypeExprKind::Path(pair_path), s());
    let param = b.ascribe(p_pat_inner, pair_u8);
    let p_ref = b.path_expr(p, "p");
    let first = b.ast.alloc_expr(
        ExprKind::Proj {
            base: p_ref,
            field: ProjField::Index(0),
        },
        s(),
    );
    let u8_ret = b.prim(PrimTy::U8);
    let lambda = b.lambda(param, Some(u8_ret), Some(first));
    let f = b.fn_decl("f", Vec::new(), lambda);
    let root = b.module("", vec![alias, f]);

    let mut checker = run(&b.ast, root);
    assert_eq!(checker.error_count(), 0);
    let u8_id = prim_id(&mut checker, PrimTy::U8);
    let pair_ty = checker.table.tuple_type(vec![u8_id, u8_id]);
    // The alias application interned as a plain tuple.
    assert_eq!(checker.result().type_expr_type(pair_u8), Some(pair_ty));
    assert!(!matches!(
        checker.table.kind(pair_ty),
        TypeKind::App { .. }
    ));
}
