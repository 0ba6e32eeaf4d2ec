//! `infer` for declarations and syntactic type annotations.
//!
//! Declaration inference is demand-driven: paths force the declarations
//! they land on, and a re-entry guard turns uninferable value recursion
//! into a diagnostic instead of a stack overflow. Nominal types register
//! themselves in the table before their members are walked, so recursive
//! aggregates resolve; sizedness is verified once a module is complete.

use sable_ast::{
    DeclId, DeclKind, EnumDecl, ExprId, ExprKind, FnDecl, ModDecl, PatId, PatKind, StaticDecl,
    StructDecl, TypeExprId, TypeExprKind, VariantShape,
};
use sable_diag::{Category, Sink};
use sable_types::{FieldDef, OptionDef, TypeId, TypeKind};

use crate::TypeChecker;

impl<S: Sink> TypeChecker<'_, S> {
    pub fn infer_decl(&mut self, id: DeclId) -> TypeId {
        if let Some(ty) = self.result.decl_type(id) {
            return ty;
        }
        let ty = self.infer_decl_kind(id);
        if self.result.decl_type(id).is_none() {
            self.set_decl_type(id, ty);
        }
        self.check_decl_attrs(id);
        ty
    }

    fn infer_decl_kind(&mut self, id: DeclId) -> TypeId {
        let span = self.ast.decl(id).span;
        match &self.ast.decl(id).kind {
            DeclKind::Binding { .. } => self.cannot_infer(span, "binding"),
            DeclKind::Let { pat, init } => {
                let (pat, init) = (*pat, *init);
                match init {
                    Some(init) => self.infer_pat_with_init(pat, init),
                    None => self.infer_pat(pat),
                };
                self.check_refutability(pat, true);
                self.table.unit_type()
            }
            DeclKind::Fn(decl) => {
                let decl = decl.clone();
                self.infer_fn_decl(id, &decl)
            }
            DeclKind::TypeParam { name } => {
                let name = name.clone();
                self.table.type_var(id, name)
            }
            DeclKind::Static(decl) => {
                let decl = decl.clone();
                self.infer_static_decl(id, &decl)
            }
            DeclKind::Struct(decl) => {
                let decl = decl.clone();
                self.infer_struct_decl(id, &decl)
            }
            DeclKind::Field { ty, init, .. } => {
                let (ty, init) = (*ty, *init);
                let field_type = self.infer_type_expr(ty);
                if let Some(init) = init {
                    self.coerce(init, field_type);
                    if !self.ast.is_constant(init) {
                        let init_span = self.ast.expr(init).span;
                        self.plain_error(
                            Category::ContextMismatch,
                            init_span,
                            "only constants are allowed as default field values".to_string(),
                        );
                    }
                }
                field_type
            }
            DeclKind::Enum(decl) => {
                let decl = decl.clone();
                self.infer_enum_decl(id, &decl)
            }
            DeclKind::Variant(decl) => {
                let shape = decl.shape.clone();
                self.infer_variant_decl(id, &shape)
            }
            DeclKind::TypeAlias {
                name,
                type_params,
                aliased,
            } => {
                let (name, type_params, aliased) = (name.clone(), type_params.clone(), *aliased);
                if !self.enter_decl(id) {
                    return self.table.type_error();
                }
                let ty = if type_params.is_empty() {
                    // Non-polymorphic aliases expand immediately.
                    self.infer_type_expr(aliased)
                } else {
                    let params: Vec<TypeId> = type_params
                        .iter()
                        .map(|&param| self.infer_decl(param))
                        .collect();
                    let alias = self.table.alias_type(id, name, params);
                    self.set_decl_type(id, alias);
                    let body = self.infer_type_expr(aliased);
                    self.table.set_alias_body(alias, body);
                    alias
                };
                self.exit_decl(id);
                ty
            }
            DeclKind::Mod(decl) => {
                let decl = decl.clone();
                self.infer_mod_decl(id, &decl)
            }
            DeclKind::Use { path } => {
                let path = *path;
                if !self.enter_decl(id) {
                    return self.table.type_error();
                }
                let path_ty = self.infer_path(path, false, None);
                self.exit_decl(id);
                if !matches!(self.table.kind(path_ty), TypeKind::Mod(_)) {
                    let path_span = self.ast.path(path).span;
                    return self.type_expected(path_span, path_ty, "module");
                }
                path_ty
            }
            DeclKind::Implicit { ty, value } => {
                let (ty, value) = (*ty, *value);
                match ty {
                    Some(ty) => {
                        let annotated = self.infer_type_expr(ty);
                        self.coerce(value, annotated);
                        annotated
                    }
                    None => self.infer_expr(value),
                }
            }
            DeclKind::Error => self.table.type_error(),
        }
    }

    /// Infer a pattern from its initializer, treating same-arity tuple
    /// sides element-wise so annotations such as `let (x, y: i64) = (1, 2);`
    /// narrow only their own element.
    pub(crate) fn infer_pat_with_init(&mut self, pat: PatId, init: ExprId) -> TypeId {
        match (&self.ast.pat(pat).kind, &self.ast.expr(init).kind) {
            (PatKind::Tuple(pats), ExprKind::Tuple(exprs)) if pats.len() == exprs.len() => {
                let (pats, exprs) = (pats.clone(), exprs.clone());
                let mut elem_types = Vec::with_capacity(pats.len());
                for (&p, &e) in pats.iter().zip(exprs.iter()) {
                    elem_types.push(self.infer_pat_with_init(p, e));
                }
                let ty = self.table.tuple_type(elem_types);
                if self.result.pat_type(pat).is_none() {
                    self.set_pat_type(pat, ty);
                }
                if self.result.expr_type(init).is_none() {
                    self.set_expr_type(init, ty);
                }
                ty
            }
            (PatKind::Ascribe { .. }, _) => {
                let annotated = self.infer_pat(pat);
                self.coerce(init, annotated)
            }
            _ => {
                let init_type = self.deref(init);
                self.check_pat(pat, init_type)
            }
        }
    }

    fn infer_fn_decl(&mut self, id: DeclId, decl: &FnDecl) -> TypeId {
        let forall = if decl.type_params.is_empty() {
            None
        } else {
            let params: Vec<TypeId> = decl
                .type_params
                .iter()
                .map(|&param| self.infer_decl(param))
                .collect();
            Some(self.table.forall_type(id, decl.name.clone(), params))
        };
        if !self.enter_decl(id) {
            return self.table.type_error();
        }

        let ExprKind::Lambda(lambda) = &self.ast.expr(decl.lambda).kind else {
            self.exit_decl(id);
            return self.table.type_error();
        };
        let lambda = lambda.clone();

        let fn_type = if let Some(ret) = lambda.ret_ty {
            let param_type = self.infer_pat(lambda.param);
            let ret_type = self.infer_type_expr(ret);
            let fn_type = self.table.fn_type(param_type, ret_type);
            if let Some(filter) = lambda.filter {
                self.check_filter(filter);
            }
            self.check_refutability(lambda.param, true);
            fn_type
        } else {
            self.infer_expr(decl.lambda)
        };

        // Record the declaration's type right away, so that `return` and
        // recursive calls inside the body have context.
        let ty = forall.unwrap_or(fn_type);
        self.set_decl_type(id, ty);
        if self.result.expr_type(decl.lambda).is_none() {
            self.set_expr_type(decl.lambda, fn_type);
        }
        if let Some(forall) = forall {
            self.table.set_forall_body(forall, fn_type);
        }
        if lambda.ret_ty.is_some() {
            if let Some(body) = lambda.body {
                if let TypeKind::Fn { codom, .. } = *self.table.kind(fn_type) {
                    self.coerce(body, codom);
                }
            }
        }
        self.exit_decl(id);
        ty
    }

    fn infer_static_decl(&mut self, id: DeclId, decl: &StaticDecl) -> TypeId {
        if !self.enter_decl(id) {
            return self.table.type_error();
        }
        let span = self.ast.decl(id).span;
        let value_type = match (decl.ty, decl.init) {
            (Some(ty), init) => {
                let annotated = self.infer_type_expr(ty);
                if let Some(init) = init {
                    self.coerce(init, annotated);
                }
                annotated
            }
            (None, Some(init)) => self.deref(init),
            (None, None) => {
                self.exit_decl(id);
                return self.cannot_infer(span, "static variable");
            }
        };
        if let Some(init) = decl.init {
            if !self.ast.is_constant(init) {
                let init_span = self.ast.expr(init).span;
                self.plain_error(
                    Category::ContextMismatch,
                    init_span,
                    "only constants are allowed as static variable initializers".to_string(),
                );
            }
        }
        // Members of the associated alias group must agree on the type.
        for &other in &decl.group {
            if let DeclKind::Static(other_decl) = &self.ast.decl(other).kind {
                if let Some(other_ty) = other_decl.ty {
                    let annotated = self.infer_type_expr(other_ty);
                    let other_span = self.ast.type_expr(other_ty).span;
                    self.expect(other_span, annotated, value_type);
                }
            }
        }
        self.exit_decl(id);
        self.table.ref_type(value_type, decl.is_mut, 0)
    }

    fn infer_struct_decl(&mut self, id: DeclId, decl: &StructDecl) -> TypeId {
        let params: Vec<TypeId> = decl
            .type_params
            .iter()
            .map(|&param| self.infer_decl(param))
            .collect();
        let struct_type =
            self.table
                .struct_type(id, decl.name.clone(), params, decl.is_tuple_like);
        // Register the type before walking the fields, so recursive
        // mentions resolve; sizedness is checked at module level.
        self.set_decl_type(id, struct_type);
        let mut fields = Vec::with_capacity(decl.fields.len());
        for &field in &decl.fields {
            let ty = self.infer_decl(field);
            let name = self.ast.decl_name(field).unwrap_or("").to_string();
            fields.push(FieldDef { name, ty });
        }
        self.table.set_struct_fields(struct_type, fields);
        struct_type
    }

    fn infer_enum_decl(&mut self, id: DeclId, decl: &EnumDecl) -> TypeId {
        let params: Vec<TypeId> = decl
            .type_params
            .iter()
            .map(|&param| self.infer_decl(param))
            .collect();
        let enum_type = self.table.enum_type(id, decl.name.clone(), params);
        self.set_decl_type(id, enum_type);
        let mut options = Vec::with_capacity(decl.variants.len());
        for &variant in &decl.variants {
            let ty = self.infer_decl(variant);
            let name = self.ast.decl_name(variant).unwrap_or("").to_string();
            let struct_ty = match &self.ast.decl(variant).kind {
                DeclKind::Variant(v) if matches!(v.shape, VariantShape::Record(_)) => Some(ty),
                _ => None,
            };
            options.push(OptionDef {
                name,
                ty,
                struct_ty,
            });
        }
        self.table.set_enum_options(enum_type, options);
        for (index, &variant) in decl.variants.iter().enumerate() {
            if let DeclKind::Variant(v) = &self.ast.decl(variant).kind {
                if matches!(v.shape, VariantShape::Record(_)) {
                    if let Some(struct_ty) = self.result.decl_type(variant) {
                        self.table.set_variant_origin(struct_ty, enum_type, index);
                    }
                }
            }
        }
        enum_type
    }

    fn infer_variant_decl(&mut self, id: DeclId, shape: &VariantShape) -> TypeId {
        match shape {
            VariantShape::Unit => self.table.unit_type(),
            VariantShape::Tuple(param) => self.infer_type_expr(*param),
            VariantShape::Record(field_decls) => {
                let name = self.ast.decl_name(id).unwrap_or("").to_string();
                let parent_params = match &self.ast.decl(id).kind {
                    DeclKind::Variant(v) => v.parent,
                    _ => None,
                }
                .map(|parent| match &self.ast.decl(parent).kind {
                    DeclKind::Enum(e) => e
                        .type_params
                        .iter()
                        .map(|&param| self.infer_decl(param))
                        .collect(),
                    _ => Vec::new(),
                })
                .unwrap_or_default();
                let struct_type = self.table.struct_type(id, name, parent_params, false);
                self.set_decl_type(id, struct_type);
                let mut fields = Vec::with_capacity(field_decls.len());
                for &field in field_decls {
                    let ty = self.infer_decl(field);
                    let field_name = self.ast.decl_name(field).unwrap_or("").to_string();
                    fields.push(FieldDef {
                        name: field_name,
                        ty,
                    });
                }
                self.table.set_struct_fields(struct_type, fields);
                struct_type
            }
        }
    }

    fn infer_mod_decl(&mut self, id: DeclId, decl: &ModDecl) -> TypeId {
        for &child in &decl.decls {
            self.infer_decl(child);
        }
        // Aggregates must be sized once the whole module is known.
        for &child in &decl.decls {
            if matches!(
                self.ast.decl(child).kind,
                DeclKind::Struct(_) | DeclKind::Enum(_)
            ) {
                if let Some(ty) = self.result.decl_type(child) {
                    if !self.table.is_sized(ty) {
                        let child_span = self.ast.decl(child).span;
                        self.unsized_type(child_span, ty);
                    }
                }
            }
        }
        self.table.mod_type(id, decl.name.clone())
    }

    // -- Syntactic types ----------------------------------------------------

    pub fn infer_type_expr(&mut self, id: TypeExprId) -> TypeId {
        if let Some(ty) = self.result.type_expr_type(id) {
            return ty;
        }
        let ty = self.infer_type_expr_kind(id);
        if self.result.type_expr_type(id).is_none() {
            self.set_type_expr_type(id, ty);
        }
        ty
    }

    fn infer_type_expr_kind(&mut self, id: TypeExprId) -> TypeId {
        let span = self.ast.type_expr(id).span;
        match &self.ast.type_expr(id).kind {
            TypeExprKind::Prim(tag) => self.table.prim_type(*tag),
            TypeExprKind::Tuple(elems) => {
                let elems = elems.clone();
                let elem_types = elems
                    .iter()
                    .map(|&elem| self.infer_type_expr(elem))
                    .collect();
                self.table.tuple_type(elem_types)
            }
            TypeExprKind::SizedArray {
                elem,
                size,
                is_simd,
            } => {
                let (elem, size, is_simd) = (*elem, *size, *is_simd);
                let elem_type = self.infer_type_expr(elem);
                if is_simd && !matches!(self.table.kind(elem_type), TypeKind::Prim(_)) {
                    return self.invalid_simd(span, elem_type);
                }
                self.table.sized_array_type(elem_type, size, is_simd)
            }
            TypeExprKind::UnsizedArray { elem } => {
                let elem = *elem;
                let elem_type = self.infer_type_expr(elem);
                let array = self.table.unsized_array_type(elem_type);
                let ptr = self.table.ptr_type(array, false, 0);
                let message = format!(
                    "unsized array types cannot be used directly; use '{}' instead",
                    self.table.display(ptr)
                );
                self.plain_error(Category::KindMismatch, span, message)
            }
            TypeExprKind::Ptr {
                pointee,
                is_mut,
                addr_space,
            } => {
                let (pointee, is_mut, addr_space) = (*pointee, *is_mut, *addr_space);
                // An unsized array is legal exactly here, behind a pointer.
                let pointee_type = match &self.ast.type_expr(pointee).kind {
                    TypeExprKind::UnsizedArray { elem } => {
                        let elem = *elem;
                        let elem_type = self.infer_type_expr(elem);
                        self.table.unsized_array_type(elem_type)
                    }
                    _ => self.infer_type_expr(pointee),
                };
                self.table.ptr_type(pointee_type, is_mut, addr_space)
            }
            TypeExprKind::Fn { dom, codom } => {
                let (dom, codom) = (*dom, *codom);
                let dom_type = self.infer_type_expr(dom);
                match codom {
                    Some(codom) => {
                        let codom_type = self.infer_type_expr(codom);
                        self.table.fn_type(dom_type, codom_type)
                    }
                    None => self.table.cn_type(dom_type),
                }
            }
            TypeExprKind::Path(path) => self.infer_path(*path, false, None),
            TypeExprKind::Error => self.table.type_error(),
        }
    }
}
