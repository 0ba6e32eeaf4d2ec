//! Typing side of path resolution.
//!
//! Walks a resolved path segment by segment: applies (or infers) type
//! arguments, turns tuple-like constructors into functions, and performs
//! member lookup through modules and enums. The classification of the final
//! segment (value / type / constructor) is matched against what the use
//! site expects.

use sable_ast::{DeclId, DeclKind, ExprId, PathId, TypeExprId};
use sable_diag::{Category, Sink};
use sable_types::{TypeId, TypeKind};

use crate::{PathInfo, TypeChecker};

impl<S: Sink> TypeChecker<'_, S> {
    /// Infer the type a path denotes. `value_expected` selects between the
    /// value and type namespaces of the final segment; `arg` is the call
    /// argument used to infer missing type arguments, when one is at hand.
    pub(crate) fn infer_path(
        &mut self,
        path: PathId,
        value_expected: bool,
        arg: Option<ExprId>,
    ) -> TypeId {
        let info = self.infer_path_inner(path, value_expected, arg);
        let ty = info.ty;
        self.result.paths.insert(path, info);
        ty
    }

    fn error_info(&self) -> PathInfo {
        PathInfo {
            ty: self.table.type_error(),
            is_value: false,
            is_ctor: false,
            seg_types: Vec::new(),
            type_args: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn infer_path_inner(
        &mut self,
        path_id: PathId,
        value_expected: bool,
        arg: Option<ExprId>,
    ) -> PathInfo {
        let ast = self.ast;
        let path = ast.path(path_id);
        let span = path.span;
        // Name resolution already reported unresolved starts.
        let Some(start_decl) = path.start_decl else {
            return self.error_info();
        };

        let seg_count = path.segs.len();
        let mut info = PathInfo {
            ty: self.table.type_error(),
            is_value: seg_count == 1 && ast.decl_is_value(start_decl),
            is_ctor: ast.decl_is_ctor(start_decl),
            seg_types: Vec::with_capacity(seg_count),
            type_args: vec![Vec::new(); seg_count],
            indices: vec![None; seg_count],
        };

        let mut ty = if path.segs[0].is_super() {
            let name = ast.decl_name(start_decl).unwrap_or("").to_string();
            self.table.mod_type(start_decl, name)
        } else {
            self.infer_decl(start_decl)
        };

        for i in 0..seg_count {
            let seg = &ast.path(path_id).segs[i];

            // Apply explicit type arguments, inferring the rest from the
            // call argument on the last segment of a generic function.
            if let Some(params) = self.generic_params(ty) {
                let is_forall = matches!(self.table.kind(ty), TypeKind::Forall(_));
                let can_infer =
                    is_forall && arg.is_some() && i == seg_count - 1 && seg.type_args.len() < params.len();
                if seg.type_args.len() == params.len() || can_infer {
                    let explicit: Vec<TypeExprId> = seg.type_args.clone();
                    let mut type_args: Vec<Option<TypeId>> = vec![None; params.len()];
                    for (k, &te) in explicit.iter().enumerate() {
                        type_args[k] = Some(self.infer_type_expr(te));
                    }
                    if explicit.len() != params.len() {
                        let dom = match self.forall_fn(ty) {
                            Some((dom, _)) => dom,
                            None => return self.error_info_at(info, i),
                        };
                        let arg_type = self.try_coerce(arg.expect("guarded above"), dom);
                        if !self.infer_type_args(span, ty, arg_type, &mut type_args) {
                            return self.error_info_at(info, i);
                        }
                    }
                    let args: Vec<TypeId> = type_args
                        .into_iter()
                        .map(|a| a.unwrap_or_else(|| self.table.type_error()))
                        .collect();
                    info.type_args[i] = args.clone();
                    ty = if is_forall {
                        self.table.instantiate_forall(ty, &args)
                    } else {
                        self.table.type_app(ty, args)
                    };
                } else {
                    let seg_span = self.ast.path(path_id).segs[i].span;
                    self.plain_error(
                        Category::ArityMismatch,
                        seg_span,
                        format!(
                            "expected {} type argument(s), but got {}",
                            params.len(),
                            seg.type_args.len()
                        ),
                    );
                    return self.error_info_at(info, i);
                }
            } else if !seg.type_args.is_empty() {
                let seg_span = self.ast.path(path_id).segs[i].span;
                self.plain_error(
                    Category::ArityMismatch,
                    seg_span,
                    "type arguments are not allowed here".to_string(),
                );
                return self.error_info_at(info, i);
            }
            info.seg_types.push(ty);

            // A tuple-like structure constructor is used as a function.
            if info.is_ctor && value_expected {
                if let Some((struct_ty, _)) = self.table.match_struct_app(ty) {
                    if self.table.struct_def(struct_ty).is_tuple_like {
                        let count = self.table.member_count(ty);
                        if count > 0 {
                            let mut members = Vec::with_capacity(count);
                            for m in 0..count {
                                members.push(self.table.member_type(ty, m));
                            }
                            let dom = if count == 1 {
                                members[0]
                            } else {
                                self.table.tuple_type(members)
                            };
                            ty = self.table.fn_type(dom, ty);
                        }
                        info.is_value = true;
                    }
                }
            }

            // Look the next segment up inside the current object.
            if i != seg_count - 1 {
                let next = &self.ast.path(path_id).segs[i + 1];
                let next_span = next.span;
                if next.is_super() {
                    let TypeKind::Mod(mod_decl) = *self.table.kind(ty) else {
                        self.plain_error(
                            Category::KindMismatch,
                            next_span,
                            "'super' can only be used on modules".to_string(),
                        );
                        return self.error_info_at(info, i);
                    };
                    let DeclKind::Mod(md) = &self.ast.decl(mod_decl).kind else {
                        return self.error_info_at(info, i);
                    };
                    let Some(parent) = md.parent else {
                        self.plain_error(
                            Category::UnknownMember,
                            next_span,
                            "module has no parent".to_string(),
                        );
                        return self.error_info_at(info, i);
                    };
                    let name = self.ast.decl_name(parent).unwrap_or("").to_string();
                    ty = self.table.mod_type(parent, name);
                    info.is_value = false;
                    info.is_ctor = false;
                } else if let Some((enum_ty, _)) = self.table.match_enum_app(ty) {
                    let name = next.ident().unwrap_or("");
                    let seg_span = self.ast.path(path_id).segs[i].span;
                    let Some(index) = self.table.enum_def(enum_ty).find_option(name) else {
                        self.unknown_member(seg_span, enum_ty, name);
                        return self.error_info_at(info, i);
                    };
                    info.indices[i + 1] = Some(index);
                    let option_struct = self.table.enum_def(enum_ty).options[index].struct_ty;
                    if let Some(struct_ty) = option_struct {
                        // Record-shaped options expose their structure type.
                        let (_, args) = self.table.peel_app(ty);
                        ty = if args.is_empty() {
                            struct_ty
                        } else {
                            self.table.type_app(struct_ty, args)
                        };
                        info.is_value = false;
                        info.is_ctor = true;
                    } else {
                        let member = self.table.member_type(ty, index);
                        ty = if self.table.is_unit_type(member) {
                            ty
                        } else {
                            self.table.fn_type(member, ty)
                        };
                        info.is_value = true;
                        info.is_ctor = true;
                    }
                } else if let TypeKind::Mod(mod_decl) = *self.table.kind(ty) {
                    let name = next.ident().unwrap_or("");
                    let Some((index, member)) = self.find_mod_member(mod_decl, name) else {
                        self.unknown_member(next_span, ty, name);
                        return self.error_info_at(info, i);
                    };
                    info.indices[i + 1] = Some(index);
                    // Modules are typed lazily so walking into one does not
                    // force its whole contents.
                    ty = if matches!(self.ast.decl(member).kind, DeclKind::Mod(_)) {
                        let member_name = self.ast.decl_name(member).unwrap_or("").to_string();
                        self.table.mod_type(member, member_name)
                    } else {
                        self.infer_decl(member)
                    };
                    info.is_value = self.ast.decl_is_value(member);
                    info.is_ctor = self.ast.decl_is_ctor(member);
                } else {
                    let seg_span = self.ast.path(path_id).segs[i].span;
                    self.type_expected(seg_span, ty, "module or enum");
                    return self.error_info_at(info, i);
                }
            }
        }

        if info.is_value != value_expected {
            let path_display = self.ast.path(path_id).to_string();
            self.plain_error(
                Category::ContextMismatch,
                span,
                format!(
                    "{} expected, but got '{}'",
                    if value_expected { "value" } else { "type" },
                    path_display
                ),
            );
            return self.error_info_at(info, seg_count - 1);
        }
        info.ty = ty;
        info
    }

    /// Poison a partially-resolved path, keeping what was learned so far.
    fn error_info_at(&self, mut info: PathInfo, _seg: usize) -> PathInfo {
        info.ty = self.table.type_error();
        info
    }

    /// The type parameters a generic type expects, if it is generic.
    fn generic_params(&self, ty: TypeId) -> Option<Vec<TypeId>> {
        let params = match self.table.kind(ty) {
            TypeKind::Struct(_) => &self.table.struct_def(ty).params,
            TypeKind::Enum(_) => &self.table.enum_def(ty).params,
            TypeKind::Alias(_) => &self.table.alias_def(ty).params,
            TypeKind::Forall(_) => &self.table.forall_def(ty).params,
            _ => return None,
        };
        (!params.is_empty()).then(|| params.clone())
    }

    /// The domain and codomain of a forall's function body.
    pub(crate) fn forall_fn(&self, forall: TypeId) -> Option<(TypeId, TypeId)> {
        let body = self.table.forall_def(forall).body?;
        match *self.table.kind(body) {
            TypeKind::Fn { dom, codom } => Some((dom, codom)),
            _ => None,
        }
    }

    /// Resolve a named member of a module declaration.
    fn find_mod_member(&self, mod_decl: DeclId, name: &str) -> Option<(usize, DeclId)> {
        let DeclKind::Mod(md) = &self.ast.decl(mod_decl).kind else {
            return None;
        };
        md.decls
            .iter()
            .enumerate()
            .find(|(_, &d)| self.ast.decl_name(d) == Some(name))
            .map(|(index, &d)| (index, d))
    }

}
