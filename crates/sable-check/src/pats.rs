//! `infer`/`check` for patterns, and refutability classification.
//!
//! Patterns use the inverted subtype relation: the expected type is the
//! type of the expression the pattern destructures, and must be a subtype
//! of the pattern's own type, which may expose a narrower shape.

use sable_ast::{DeclKind, FieldPat, PatId, PatKind, Span};
use sable_diag::{Category, Sink};
use sable_types::{TypeId, TypeKind};

use crate::TypeChecker;

impl<S: Sink> TypeChecker<'_, S> {
    pub fn infer_pat(&mut self, id: PatId) -> TypeId {
        if let Some(ty) = self.result.pat_type(id) {
            return ty;
        }
        let ty = self.infer_pat_kind(id);
        if self.result.pat_type(id).is_none() {
            self.set_pat_type(id, ty);
        }
        ty
    }

    pub fn check_pat(&mut self, id: PatId, expected: TypeId) -> TypeId {
        assert!(
            self.result.pat_type(id).is_none(),
            "pattern node checked twice"
        );
        let ty = self.check_pat_kind(id, expected);
        if self.result.pat_type(id).is_none() {
            self.set_pat_type(id, ty);
        }
        ty
    }

    fn infer_pat_kind(&mut self, id: PatId) -> TypeId {
        let span = self.ast.pat(id).span;
        match &self.ast.pat(id).kind {
            PatKind::Binding { decl, sub } => {
                let (decl, sub) = (*decl, *sub);
                match sub {
                    Some(sub) => {
                        let ty = self.infer_pat(sub);
                        self.bind_decl(decl, ty)
                    }
                    None => self.infer_decl(decl),
                }
            }
            PatKind::Wildcard => self.cannot_infer(span, "pattern"),
            PatKind::Lit(lit) => {
                let lit = lit.clone();
                let ty = self.infer_lit(&lit);
                self.forbid_float_pattern(span, ty)
            }
            PatKind::Tuple(elems) => {
                let elems = elems.clone();
                let mut elem_types = Vec::with_capacity(elems.len());
                for &elem in &elems {
                    elem_types.push(self.infer_pat(elem));
                }
                self.table.tuple_type(elem_types)
            }
            PatKind::Array { elems, is_simd } => {
                let (elems, is_simd) = (elems.clone(), *is_simd);
                if elems.is_empty() {
                    return self.cannot_infer(span, "array pattern");
                }
                let mut elem_type = self.infer_pat(elems[0]);
                for &elem in &elems[1..] {
                    elem_type = self.check_pat(elem, elem_type);
                }
                if is_simd && !matches!(self.table.kind(elem_type), TypeKind::Prim(_)) {
                    return self.invalid_simd(span, elem_type);
                }
                self.table
                    .sized_array_type(elem_type, elems.len() as u64, is_simd)
            }
            PatKind::Record {
                path,
                fields,
                has_etc,
            } => {
                let (path, fields, has_etc) = (*path, fields.clone(), *has_etc);
                let path_ty = self.infer_path(path, false, None);
                let Some((struct_ty, _)) = self.table.match_struct_app(path_ty) else {
                    let path_span = self.ast.path(path).span;
                    return self.type_expected(path_span, path_ty, "structure");
                };
                if self.table.struct_def(struct_ty).is_tuple_like {
                    let path_span = self.ast.path(path).span;
                    return self.type_expected(path_span, path_ty, "structure");
                }
                self.check_field_pats(span, path_ty, &fields, has_etc);
                let (result, variant) = self.record_result_type(path_ty);
                if let Some(index) = variant {
                    self.result.pat_variants.insert(id, index);
                }
                result
            }
            PatKind::Ctor { path, arg } => {
                let (path, arg) = (*path, *arg);
                self.infer_ctor_pat(id, span, path, arg)
            }
            PatKind::Ascribe { pat, ty } => {
                let (pat, ty) = (*pat, *ty);
                let annotated = self.infer_type_expr(ty);
                match pat {
                    Some(pat) => self.check_pat(pat, annotated),
                    None => annotated,
                }
            }
            PatKind::Implicit { underlying } => {
                let underlying = *underlying;
                let ty = self.infer_pat(underlying);
                self.table.implicit_param_type(ty)
            }
            PatKind::Error => self.table.type_error(),
        }
    }

    fn check_pat_kind(&mut self, id: PatId, expected: TypeId) -> TypeId {
        let span = self.ast.pat(id).span;
        match &self.ast.pat(id).kind {
            PatKind::Binding { decl, sub } => {
                let (decl, sub) = (*decl, *sub);
                let is_mut = matches!(
                    self.ast.decl(decl).kind,
                    DeclKind::Binding { is_mut: true, .. }
                );
                // Mutable bindings denote storage locations.
                let bound = if is_mut {
                    self.table.ref_type(expected, true, 0)
                } else {
                    expected
                };
                self.bind_decl(decl, bound);
                if let Some(sub) = sub {
                    self.check_pat(sub, expected);
                }
                expected
            }
            PatKind::Wildcard => expected,
            PatKind::Lit(lit) => {
                let lit = lit.clone();
                let ty = self.check_lit(span, &lit, expected);
                self.forbid_float_pattern(span, ty)
            }
            PatKind::Tuple(elems) => {
                let elems = elems.clone();
                let TypeKind::Tuple(expected_elems) = self.table.kind(expected) else {
                    return self.incompatible_type(span, "tuple pattern", expected);
                };
                let expected_elems = expected_elems.clone();
                if elems.len() != expected_elems.len() {
                    return self.bad_arguments(
                        span,
                        "tuple pattern",
                        elems.len(),
                        expected_elems.len(),
                    );
                }
                for (&elem, &elem_ty) in elems.iter().zip(expected_elems.iter()) {
                    self.check_pat(elem, elem_ty);
                }
                expected
            }
            PatKind::Array { elems, is_simd } => {
                let (elems, is_simd) = (elems.clone(), *is_simd);
                self.check_array_pat(span, expected, &elems, is_simd)
            }
            PatKind::Implicit { underlying } => {
                let underlying = *underlying;
                let ty = self.check_pat(underlying, expected);
                self.table.implicit_param_type(ty)
            }
            _ => {
                // Inverted default: the scrutinee type must be a subtype of
                // the pattern's type.
                let ty = self.infer_pat_kind(id);
                if self.result.pat_type(id).is_none() {
                    self.set_pat_type(id, ty);
                }
                if !self.table.subtype(expected, ty) {
                    return self.incompatible_types(span, ty, expected);
                }
                ty
            }
        }
    }

    /// Set the type of the binding declaration behind an identifier pattern.
    fn bind_decl(&mut self, decl: sable_ast::DeclId, ty: TypeId) -> TypeId {
        if self.result.decl_type(decl).is_none() {
            self.set_decl_type(decl, ty);
        }
        ty
    }

    fn forbid_float_pattern(&mut self, span: Span, ty: TypeId) -> TypeId {
        if self.table.is_float_type(ty) {
            return self.type_expected(span, ty, "integer, boolean, or string");
        }
        ty
    }

    fn infer_ctor_pat(
        &mut self,
        id: PatId,
        span: Span,
        path: sable_ast::PathId,
        arg: Option<PatId>,
    ) -> TypeId {
        let path_ty = self.infer_path(path, true, None);
        if self.table.is_error(path_ty) {
            return path_ty;
        }
        let is_ctor = self
            .result
            .path_info(path)
            .map(|info| info.is_ctor)
            .unwrap_or(false);
        if !is_ctor {
            let path_span = self.ast.path(path).span;
            return self.plain_error(
                Category::KindMismatch,
                path_span,
                "structure or enumeration constructor expected".to_string(),
            );
        }
        let variant_index = self
            .result
            .path_info(path)
            .and_then(|info| info.indices.last().copied().flatten());

        let nullary_struct = self
            .table
            .match_struct_app(path_ty)
            .is_some_and(|(s, _)| {
                let def = self.table.struct_def(s);
                def.is_tuple_like && def.fields.is_empty()
            });
        if nullary_struct || self.table.match_enum_app(path_ty).is_some() {
            if let Some(index) = variant_index {
                self.result.pat_variants.insert(id, index);
            }
            if arg.is_some() {
                return self.plain_error(
                    Category::ArityMismatch,
                    span,
                    "constructor takes no argument".to_string(),
                );
            }
            return path_ty;
        }
        if let TypeKind::Fn { dom, codom } = *self.table.kind(path_ty) {
            let Some(arg) = arg else {
                return self.plain_error(
                    Category::ArityMismatch,
                    span,
                    "missing arguments to enumeration or structure constructor".to_string(),
                );
            };
            self.check_pat(arg, dom);
            if self.table.match_enum_app(codom).is_some() {
                if let Some(index) = variant_index {
                    self.result.pat_variants.insert(id, index);
                }
            }
            return codom;
        }
        let path_span = self.ast.path(path).span;
        self.type_expected(path_span, path_ty, "enumeration or structure")
    }

    fn check_array_pat(
        &mut self,
        span: Span,
        expected: TypeId,
        elems: &[PatId],
        is_simd: bool,
    ) -> TypeId {
        let (_, stripped) = self.remove_ptr(expected);
        let (elem_type, expected_size, expected_simd) = match *self.table.kind(stripped) {
            TypeKind::SizedArray {
                elem,
                size,
                is_simd,
            } => (elem, Some(size), is_simd),
            TypeKind::UnsizedArray { elem } => (elem, None, false),
            _ => return self.incompatible_type(span, "array pattern", expected),
        };
        if expected_simd != is_simd {
            let msg = if is_simd {
                "simd array pattern"
            } else {
                "non-simd array pattern"
            };
            return self.incompatible_type(span, msg, expected);
        }
        if is_simd && !matches!(self.table.kind(elem_type), TypeKind::Prim(_)) {
            return self.invalid_simd(span, elem_type);
        }
        for &elem in elems {
            self.check_pat(elem, elem_type);
        }
        if let Some(size) = expected_size {
            if size != elems.len() as u64 {
                self.plain_error(
                    Category::ArityMismatch,
                    span,
                    format!("expected {size} array element(s), but got {}", elems.len()),
                );
                return self.table.type_error();
            }
        }
        self.table
            .sized_array_type(elem_type, elems.len() as u64, is_simd)
    }

    // -- Refutability -------------------------------------------------------

    /// Whether a pattern matches every value of its type.
    pub(crate) fn pat_is_trivial(&self, id: PatId) -> bool {
        match &self.ast.pat(id).kind {
            PatKind::Binding { sub, .. } => sub.map_or(true, |sub| self.pat_is_trivial(sub)),
            PatKind::Wildcard => true,
            PatKind::Lit(_) => false,
            PatKind::Tuple(elems) => elems.iter().all(|&e| self.pat_is_trivial(e)),
            PatKind::Array { elems, .. } => elems.iter().all(|&e| self.pat_is_trivial(e)),
            PatKind::Record { path, fields, .. } => {
                self.path_covers_type(*path) && fields.iter().all(|f| self.pat_is_trivial(f.pat))
            }
            PatKind::Ctor { path, arg } => {
                self.path_covers_type(*path) && arg.map_or(true, |arg| self.pat_is_trivial(arg))
            }
            PatKind::Ascribe { pat, .. } => pat.map_or(true, |pat| self.pat_is_trivial(pat)),
            PatKind::Implicit { underlying } => self.pat_is_trivial(*underlying),
            PatKind::Error => true,
        }
    }

    /// A constructor pattern covers its type when it does not select one
    /// option among several.
    fn path_covers_type(&self, path: sable_ast::PathId) -> bool {
        let Some(info) = self.result.path_info(path) else {
            return true;
        };
        let ty = info.ty;
        // Constructors type as `fn member -> T` when applied.
        let target = match *self.table.kind(ty) {
            TypeKind::Fn { codom, .. } => codom,
            _ => ty,
        };
        let enum_ty = self
            .table
            .match_enum_app(target)
            .map(|(e, _)| e)
            .or_else(|| {
                self.table
                    .match_struct_app(target)
                    .and_then(|(s, _)| self.table.struct_def(s).origin.map(|o| o.enum_ty))
            });
        match enum_ty {
            Some(enum_ty) => self.table.enum_def(enum_ty).options.len() == 1,
            None => true,
        }
    }

    pub(crate) fn check_refutability(&mut self, pat: PatId, must_be_trivial: bool) {
        if must_be_trivial != self.pat_is_trivial(pat) {
            let span = self.ast.pat(pat).span;
            self.invalid_ptrn(span, must_be_trivial);
        }
    }

    // -- Record fields ------------------------------------------------------

    pub(crate) fn check_field_pats(
        &mut self,
        span: Span,
        record_ty: TypeId,
        fields: &[FieldPat],
        has_etc: bool,
    ) {
        let (struct_ty, _) = self
            .table
            .match_struct_app(record_ty)
            .expect("caller matched a structure");
        let count = self.table.struct_def(struct_ty).fields.len();
        let mut seen = vec![false; count];
        for field in fields {
            let Some(index) = self.table.struct_def(struct_ty).find_field(&field.name) else {
                self.unknown_member(field.span, struct_ty, &field.name);
                return;
            };
            if seen[index] {
                self.plain_error(
                    Category::ArityMismatch,
                    span,
                    format!("field '{}' specified more than once", field.name),
                );
                return;
            }
            seen[index] = true;
            let member = self.table.member_type(record_ty, index);
            self.check_pat(field.pat, member);
        }
        if !has_etc {
            for (index, seen) in seen.iter().enumerate() {
                if !seen {
                    let name = self.table.struct_def(struct_ty).fields[index].name.clone();
                    self.plain_error(
                        Category::ArityMismatch,
                        span,
                        format!("missing field '{name}' in structure pattern"),
                    );
                }
            }
        }
    }

    /// Record expressions over an enum option produce the enum type.
    pub(crate) fn record_result_type(&mut self, record_ty: TypeId) -> (TypeId, Option<usize>) {
        let (struct_ty, args) = self.table.peel_app(record_ty);
        let Some(origin) = self.table.struct_def(struct_ty).origin else {
            return (record_ty, None);
        };
        let result = if args.is_empty() {
            origin.enum_ty
        } else {
            self.table.type_app(origin.enum_ty, args)
        };
        (result, Some(origin.index))
    }

    /// Shared with record expressions: resolve each named field once and
    /// coerce its initializer to the member type.
    pub(crate) fn check_field_inits(
        &mut self,
        span: Span,
        record_ty: TypeId,
        fields: &[sable_ast::FieldInit],
        msg: &str,
        has_etc: bool,
        accept_defaults: bool,
    ) {
        let (struct_ty, _) = self
            .table
            .match_struct_app(record_ty)
            .expect("caller matched a structure");
        let count = self.table.struct_def(struct_ty).fields.len();
        let mut seen = vec![false; count];
        for field in fields {
            let Some(index) = self.table.struct_def(struct_ty).find_field(&field.name) else {
                self.unknown_member(field.span, struct_ty, &field.name);
                return;
            };
            if seen[index] {
                self.plain_error(
                    Category::ArityMismatch,
                    span,
                    format!("field '{}' specified more than once", field.name),
                );
                return;
            }
            seen[index] = true;
            let member = self.table.member_type(record_ty, index);
            self.coerce(field.expr, member);
        }
        if !has_etc {
            for (index, seen) in seen.iter().enumerate() {
                if *seen {
                    continue;
                }
                if accept_defaults && self.struct_field_has_default(struct_ty, index) {
                    continue;
                }
                let name = self.table.struct_def(struct_ty).fields[index].name.clone();
                self.plain_error(
                    Category::ArityMismatch,
                    span,
                    format!("missing field '{name}' in structure {msg}"),
                );
            }
        }
    }

    /// Whether a struct field declaration carries a default initializer.
    fn struct_field_has_default(&self, struct_ty: TypeId, index: usize) -> bool {
        let decl = self.table.struct_def(struct_ty).decl;
        let field_decl = match &self.ast.decl(decl).kind {
            DeclKind::Struct(sd) => sd.fields.get(index).copied(),
            DeclKind::Variant(vd) => match &vd.shape {
                sable_ast::VariantShape::Record(fields) => fields.get(index).copied(),
                _ => None,
            },
            _ => None,
        };
        matches!(
            field_decl.map(|f| &self.ast.decl(f).kind),
            Some(DeclKind::Field { init: Some(_), .. })
        )
    }
}
