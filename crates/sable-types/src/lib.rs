//! Semantic types and the hash-consed type table for Sable.
//!
//! Types are interned: structurally equal non-nominal types share one
//! [`TypeId`], so type equality is id equality. Nominal types (structs,
//! enums, aliases, foralls, modules) are identified by the declaration that
//! introduced them. The table also owns the whole type algebra: subtyping,
//! join, variance, bounds, substitution, order and sizedness.
//!
//! These are semantic types, distinct from the syntactic annotations in
//! `sable-ast`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use sable_ast::{DeclId, PrimTy};

// ---------------------------------------------------------------------------
// Type ids and kinds
// ---------------------------------------------------------------------------

/// Index of an interned type. Equality of ids is type equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The shape of an interned type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Prim(PrimTy),
    /// The empty tuple is the canonical unit type.
    Tuple(Vec<TypeId>),
    SizedArray {
        elem: TypeId,
        size: u64,
        is_simd: bool,
    },
    /// Only legal behind a pointer.
    UnsizedArray {
        elem: TypeId,
    },
    Ptr {
        pointee: TypeId,
        is_mut: bool,
        addr_space: u32,
    },
    /// Internal l-value marker; never the type of a value position.
    Ref {
        pointee: TypeId,
        is_mut: bool,
        addr_space: u32,
    },
    Fn {
        dom: TypeId,
        codom: TypeId,
    },
    /// `!`, subtype of every type.
    NoRet,
    /// Poison; suppresses downstream diagnostics.
    Error,
    /// Bound by a type-parameter declaration.
    Var(DeclId),
    /// Universal quantification owned by a function declaration.
    Forall(DeclId),
    Struct(DeclId),
    Enum(DeclId),
    Alias(DeclId),
    Mod(DeclId),
    /// Application of a struct or enum; alias applications are expanded
    /// eagerly and never interned.
    App {
        applied: TypeId,
        args: Vec<TypeId>,
    },
    /// Summon a value of the underlying type at this position.
    ImplicitParam(TypeId),
    /// Join marker for incompatible types.
    Top,
    /// Bounds marker below every type.
    Bottom,
}

// ---------------------------------------------------------------------------
// Variance and bounds
// ---------------------------------------------------------------------------

/// How a type variable occurs inside a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    /// Does not occur.
    Constant,
    Covariant,
    Contravariant,
    Invariant,
}

/// Interval constraint on a type variable, produced by matching a function
/// domain against an argument type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeBounds {
    pub lower: TypeId,
    pub upper: TypeId,
}

/// Occurrence polarity during variance/bounds walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Covariant,
    Contravariant,
    Invariant,
}

impl Polarity {
    fn flip(self) -> Polarity {
        match self {
            Polarity::Covariant => Polarity::Contravariant,
            Polarity::Contravariant => Polarity::Covariant,
            Polarity::Invariant => Polarity::Invariant,
        }
    }
}

// ---------------------------------------------------------------------------
// Nominal registries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeId,
}

/// Where a struct type came from when it models a record-shaped enum option.
#[derive(Debug, Clone, Copy)]
pub struct VariantOrigin {
    pub enum_ty: TypeId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub decl: DeclId,
    pub name: String,
    pub params: Vec<TypeId>,
    pub fields: Vec<FieldDef>,
    pub is_tuple_like: bool,
    pub origin: Option<VariantOrigin>,
}

impl StructDef {
    pub fn find_field(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct OptionDef {
    pub name: String,
    /// The member type: unit for unit options, the parameter type for
    /// tuple-shaped options, the variant struct type for record options.
    pub ty: TypeId,
    /// Set for record-shaped options.
    pub struct_ty: Option<TypeId>,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub decl: DeclId,
    pub name: String,
    pub params: Vec<TypeId>,
    pub options: Vec<OptionDef>,
}

impl EnumDef {
    pub fn find_option(&self, name: &str) -> Option<usize> {
        self.options.iter().position(|o| o.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct AliasDef {
    pub decl: DeclId,
    pub name: String,
    pub params: Vec<TypeId>,
    pub body: Option<TypeId>,
}

#[derive(Debug, Clone)]
pub struct ForallDef {
    pub decl: DeclId,
    pub name: String,
    pub params: Vec<TypeId>,
    pub body: Option<TypeId>,
}

// ---------------------------------------------------------------------------
// Type table
// ---------------------------------------------------------------------------

/// Canonicalizing store for every type of a checker session.
pub struct TypeTable {
    kinds: Vec<TypeKind>,
    interned: HashMap<TypeKind, TypeId>,
    unit: TypeId,
    no_ret: TypeId,
    error: TypeId,
    top: TypeId,
    bottom: TypeId,
    structs: HashMap<TypeId, StructDef>,
    enums: HashMap<TypeId, EnumDef>,
    aliases: HashMap<TypeId, AliasDef>,
    foralls: HashMap<TypeId, ForallDef>,
    var_names: HashMap<TypeId, String>,
    mod_names: HashMap<TypeId, String>,
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            kinds: Vec::new(),
            interned: HashMap::new(),
            unit: TypeId(0),
            no_ret: TypeId(0),
            error: TypeId(0),
            top: TypeId(0),
            bottom: TypeId(0),
            structs: HashMap::new(),
            enums: HashMap::new(),
            aliases: HashMap::new(),
            foralls: HashMap::new(),
            var_names: HashMap::new(),
            mod_names: HashMap::new(),
        };
        table.unit = table.intern(TypeKind::Tuple(Vec::new()));
        table.no_ret = table.intern(TypeKind::NoRet);
        table.error = table.intern(TypeKind::Error);
        table.top = table.intern(TypeKind::Top);
        table.bottom = table.intern(TypeKind::Bottom);
        table
    }

    fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        let id = TypeId(self.kinds.len() as u32);
        self.kinds.push(kind.clone());
        self.interned.insert(kind, id);
        id
    }

    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.kinds[ty.index()]
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // -- Constructors -------------------------------------------------------

    pub fn prim_type(&mut self, tag: PrimTy) -> TypeId {
        self.intern(TypeKind::Prim(tag))
    }

    pub fn bool_type(&mut self) -> TypeId {
        self.prim_type(PrimTy::Bool)
    }

    pub fn unit_type(&self) -> TypeId {
        self.unit
    }

    pub fn tuple_type(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.intern(TypeKind::Tuple(elems))
    }

    pub fn sized_array_type(&mut self, elem: TypeId, size: u64, is_simd: bool) -> TypeId {
        self.intern(TypeKind::SizedArray {
            elem,
            size,
            is_simd,
        })
    }

    pub fn unsized_array_type(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKind::UnsizedArray { elem })
    }

    pub fn ptr_type(&mut self, pointee: TypeId, is_mut: bool, addr_space: u32) -> TypeId {
        self.intern(TypeKind::Ptr {
            pointee,
            is_mut,
            addr_space,
        })
    }

    pub fn ref_type(&mut self, pointee: TypeId, is_mut: bool, addr_space: u32) -> TypeId {
        self.intern(TypeKind::Ref {
            pointee,
            is_mut,
            addr_space,
        })
    }

    pub fn fn_type(&mut self, dom: TypeId, codom: TypeId) -> TypeId {
        self.intern(TypeKind::Fn { dom, codom })
    }

    /// Continuation type `cn T = fn T -> !`.
    pub fn cn_type(&mut self, dom: TypeId) -> TypeId {
        let no_ret = self.no_ret;
        self.fn_type(dom, no_ret)
    }

    pub fn no_ret_type(&self) -> TypeId {
        self.no_ret
    }

    pub fn type_error(&self) -> TypeId {
        self.error
    }

    pub fn top_type(&self) -> TypeId {
        self.top
    }

    pub fn bottom_type(&self) -> TypeId {
        self.bottom
    }

    pub fn implicit_param_type(&mut self, underlying: TypeId) -> TypeId {
        self.intern(TypeKind::ImplicitParam(underlying))
    }

    pub fn type_var(&mut self, decl: DeclId, name: impl Into<String>) -> TypeId {
        let id = self.intern(TypeKind::Var(decl));
        self.var_names.entry(id).or_insert_with(|| name.into());
        id
    }

    pub fn forall_type(
        &mut self,
        decl: DeclId,
        name: impl Into<String>,
        params: Vec<TypeId>,
    ) -> TypeId {
        let id = self.intern(TypeKind::Forall(decl));
        self.foralls.entry(id).or_insert_with(|| ForallDef {
            decl,
            name: name.into(),
            params,
            body: None,
        });
        id
    }

    /// Register the monomorphic body of a forall once the owning function
    /// signature is known.
    pub fn set_forall_body(&mut self, forall: TypeId, body: TypeId) {
        let def = self.foralls.get_mut(&forall).expect("not a forall type");
        def.body = Some(body);
    }

    pub fn forall_def(&self, forall: TypeId) -> &ForallDef {
        self.foralls.get(&forall).expect("not a forall type")
    }

    pub fn struct_type(
        &mut self,
        decl: DeclId,
        name: impl Into<String>,
        params: Vec<TypeId>,
        is_tuple_like: bool,
    ) -> TypeId {
        let id = self.intern(TypeKind::Struct(decl));
        self.structs.entry(id).or_insert_with(|| StructDef {
            decl,
            name: name.into(),
            params,
            fields: Vec::new(),
            is_tuple_like,
            origin: None,
        });
        id
    }

    pub fn set_struct_fields(&mut self, ty: TypeId, fields: Vec<FieldDef>) {
        let def = self.structs.get_mut(&ty).expect("not a struct type");
        def.fields = fields;
    }

    pub fn set_variant_origin(&mut self, ty: TypeId, enum_ty: TypeId, index: usize) {
        let def = self.structs.get_mut(&ty).expect("not a struct type");
        def.origin = Some(VariantOrigin { enum_ty, index });
    }

    pub fn struct_def(&self, ty: TypeId) -> &StructDef {
        self.structs.get(&ty).expect("not a struct type")
    }

    pub fn enum_type(
        &mut self,
        decl: DeclId,
        name: impl Into<String>,
        params: Vec<TypeId>,
    ) -> TypeId {
        let id = self.intern(TypeKind::Enum(decl));
        self.enums.entry(id).or_insert_with(|| EnumDef {
            decl,
            name: name.into(),
            params,
            options: Vec::new(),
        });
        id
    }

    pub fn set_enum_options(&mut self, ty: TypeId, options: Vec<OptionDef>) {
        let def = self.enums.get_mut(&ty).expect("not an enum type");
        def.options = options;
    }

    pub fn enum_def(&self, ty: TypeId) -> &EnumDef {
        self.enums.get(&ty).expect("not an enum type")
    }

    pub fn alias_type(
        &mut self,
        decl: DeclId,
        name: impl Into<String>,
        params: Vec<TypeId>,
    ) -> TypeId {
        let id = self.intern(TypeKind::Alias(decl));
        self.aliases.entry(id).or_insert_with(|| AliasDef {
            decl,
            name: name.into(),
            params,
            body: None,
        });
        id
    }

    pub fn set_alias_body(&mut self, ty: TypeId, body: TypeId) {
        let def = self.aliases.get_mut(&ty).expect("not an alias type");
        def.body = Some(body);
    }

    pub fn alias_def(&self, ty: TypeId) -> &AliasDef {
        self.aliases.get(&ty).expect("not an alias type")
    }

    pub fn mod_type(&mut self, decl: DeclId, name: impl Into<String>) -> TypeId {
        let id = self.intern(TypeKind::Mod(decl));
        self.mod_names.entry(id).or_insert_with(|| name.into());
        id
    }

    /// Apply a generic user type. Alias applications are substituted
    /// immediately; aliases never survive interning as applications.
    pub fn type_app(&mut self, applied: TypeId, args: Vec<TypeId>) -> TypeId {
        if let TypeKind::Alias(_) = self.kind(applied) {
            let (params, body) = {
                let def = self.alias_def(applied);
                (def.params.clone(), def.body)
            };
            let Some(body) = body else {
                return self.error;
            };
            let map = replace_map(&params, &args);
            return self.replace(body, &map);
        }
        self.intern(TypeKind::App { applied, args })
    }

    // -- Classification helpers ---------------------------------------------

    pub fn is_prim(&self, ty: TypeId, tag: PrimTy) -> bool {
        matches!(self.kind(ty), TypeKind::Prim(t) if *t == tag)
    }

    pub fn is_int_type(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Prim(
                PrimTy::I8
                    | PrimTy::I16
                    | PrimTy::I32
                    | PrimTy::I64
                    | PrimTy::U8
                    | PrimTy::U16
                    | PrimTy::U32
                    | PrimTy::U64
            )
        )
    }

    pub fn is_float_type(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Prim(PrimTy::F32 | PrimTy::F64))
    }

    pub fn is_int_or_float_type(&self, ty: TypeId) -> bool {
        self.is_int_type(ty) || self.is_float_type(ty)
    }

    pub fn is_bool_type(&self, ty: TypeId) -> bool {
        self.is_prim(ty, PrimTy::Bool)
    }

    pub fn is_unit_type(&self, ty: TypeId) -> bool {
        ty == self.unit
    }

    pub fn is_error(&self, ty: TypeId) -> bool {
        ty == self.error
    }

    pub fn is_simd_type(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::SizedArray { is_simd: true, .. })
    }

    /// Strip one application layer: `(nominal, args)`, with empty args for
    /// a bare nominal type.
    pub fn peel_app(&self, ty: TypeId) -> (TypeId, Vec<TypeId>) {
        match self.kind(ty) {
            TypeKind::App { applied, args } => (*applied, args.clone()),
            _ => (ty, Vec::new()),
        }
    }

    /// Match a struct type or an application of one.
    pub fn match_struct_app(&self, ty: TypeId) -> Option<(TypeId, Vec<TypeId>)> {
        let (nominal, args) = self.peel_app(ty);
        matches!(self.kind(nominal), TypeKind::Struct(_)).then_some((nominal, args))
    }

    /// Match an enum type or an application of one.
    pub fn match_enum_app(&self, ty: TypeId) -> Option<(TypeId, Vec<TypeId>)> {
        let (nominal, args) = self.peel_app(ty);
        matches!(self.kind(nominal), TypeKind::Enum(_)).then_some((nominal, args))
    }

    // -- Members ------------------------------------------------------------

    /// Number of members of a nominal type or an application of one.
    pub fn member_count(&self, ty: TypeId) -> usize {
        let (nominal, _) = self.peel_app(ty);
        match self.kind(nominal) {
            TypeKind::Struct(_) => self.struct_def(nominal).fields.len(),
            TypeKind::Enum(_) => self.enum_def(nominal).options.len(),
            _ => 0,
        }
    }

    /// Member type at `index`, with type arguments substituted when `ty`
    /// is an application.
    pub fn member_type(&mut self, ty: TypeId, index: usize) -> TypeId {
        let (nominal, args) = self.peel_app(ty);
        let (params, raw) = match self.kind(nominal) {
            TypeKind::Struct(_) => {
                let def = self.struct_def(nominal);
                (def.params.clone(), def.fields[index].ty)
            }
            TypeKind::Enum(_) => {
                let def = self.enum_def(nominal);
                (def.params.clone(), def.options[index].ty)
            }
            _ => return self.error,
        };
        if args.is_empty() {
            return raw;
        }
        let map = replace_map(&params, &args);
        self.replace(raw, &map)
    }

    // -- Subtyping and join -------------------------------------------------

    /// Algorithmic subtyping. Reflexive and transitive, not symmetric.
    pub fn subtype(&self, ty: TypeId, other: TypeId) -> bool {
        if ty == other {
            return true;
        }
        match self.kind(ty) {
            // ! and the bounds marker are below every type.
            TypeKind::NoRet | TypeKind::Bottom => return true,
            // ref U <= T if U <= T
            TypeKind::Ref { pointee, .. } => return self.subtype(*pointee, other),
            // Implicit-parameter wrappers are transparent for subtyping.
            TypeKind::ImplicitParam(underlying) => return self.subtype(*underlying, other),
            _ => {}
        }
        match self.kind(other) {
            TypeKind::Top => return true,
            TypeKind::ImplicitParam(underlying) => return self.subtype(ty, *underlying),
            _ => {}
        }
        if let TypeKind::Ptr {
            pointee: other_pointee,
            is_mut: other_mut,
            addr_space: other_space,
        } = *self.kind(other)
        {
            // No chained pointer covariance.
            if matches!(self.kind(other_pointee), TypeKind::Ptr { .. }) {
                return false;
            }
            // U <= &T if U <= T
            if !other_mut && self.subtype(ty, other_pointee) {
                return true;
            }
            if let TypeKind::Ptr {
                pointee,
                is_mut,
                addr_space,
            } = *self.kind(ty)
            {
                // &U <= &T and &mut U <= &T if U <= T; mutability may only
                // be dropped, never gained.
                if addr_space == other_space && (is_mut || !other_mut) {
                    return self.subtype(pointee, other_pointee);
                }
            }
        }
        // [T * N] <= [T]
        if let TypeKind::UnsizedArray { elem: other_elem } = *self.kind(other) {
            if let TypeKind::SizedArray { elem, is_simd, .. } = *self.kind(ty) {
                return elem == other_elem && !is_simd;
            }
        }
        false
    }

    /// Least upper bound in the subtype lattice, or `Top` when the two
    /// types are incompatible.
    pub fn join(&self, ty: TypeId, other: TypeId) -> TypeId {
        if self.subtype(ty, other) {
            other
        } else if self.subtype(other, ty) {
            ty
        } else {
            self.top
        }
    }

    // -- Containment and free variables -------------------------------------

    /// Structural containment; nominal types count only by identity.
    pub fn contains(&self, ty: TypeId, needle: TypeId) -> bool {
        if ty == needle {
            return true;
        }
        match self.kind(ty) {
            TypeKind::Tuple(elems) => elems.iter().any(|&e| self.contains(e, needle)),
            TypeKind::SizedArray { elem, .. } | TypeKind::UnsizedArray { elem } => {
                self.contains(*elem, needle)
            }
            TypeKind::Ptr { pointee, .. } | TypeKind::Ref { pointee, .. } => {
                self.contains(*pointee, needle)
            }
            TypeKind::Fn { dom, codom } => {
                self.contains(*dom, needle) || self.contains(*codom, needle)
            }
            TypeKind::App { applied, args } => {
                self.contains(*applied, needle)
                    || args.iter().any(|&a| self.contains(a, needle))
            }
            TypeKind::ImplicitParam(underlying) => self.contains(*underlying, needle),
            _ => false,
        }
    }

    pub fn contains_error(&self, ty: TypeId) -> bool {
        self.contains(ty, self.error)
    }

    /// Whether any type variable occurs in `ty`.
    pub fn has_type_vars(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Var(_) => true,
            TypeKind::Tuple(elems) => elems.iter().any(|&e| self.has_type_vars(e)),
            TypeKind::SizedArray { elem, .. } | TypeKind::UnsizedArray { elem } => {
                self.has_type_vars(*elem)
            }
            TypeKind::Ptr { pointee, .. } | TypeKind::Ref { pointee, .. } => {
                self.has_type_vars(*pointee)
            }
            TypeKind::Fn { dom, codom } => {
                self.has_type_vars(*dom) || self.has_type_vars(*codom)
            }
            TypeKind::App { args, .. } => args.iter().any(|&a| self.has_type_vars(a)),
            TypeKind::ImplicitParam(underlying) => self.has_type_vars(*underlying),
            _ => false,
        }
    }

    // -- Substitution -------------------------------------------------------

    /// Structure-preserving substitution of type variables.
    pub fn replace(&mut self, ty: TypeId, map: &HashMap<TypeId, TypeId>) -> TypeId {
        if map.is_empty() {
            return ty;
        }
        match self.kind(ty).clone() {
            TypeKind::Var(_) => map.get(&ty).copied().unwrap_or(ty),
            TypeKind::Tuple(elems) => {
                let elems = elems.iter().map(|&e| self.replace(e, map)).collect();
                self.tuple_type(elems)
            }
            TypeKind::SizedArray {
                elem,
                size,
                is_simd,
            } => {
                let elem = self.replace(elem, map);
                self.sized_array_type(elem, size, is_simd)
            }
            TypeKind::UnsizedArray { elem } => {
                let elem = self.replace(elem, map);
                self.unsized_array_type(elem)
            }
            TypeKind::Ptr {
                pointee,
                is_mut,
                addr_space,
            } => {
                let pointee = self.replace(pointee, map);
                self.ptr_type(pointee, is_mut, addr_space)
            }
            TypeKind::Ref {
                pointee,
                is_mut,
                addr_space,
            } => {
                let pointee = self.replace(pointee, map);
                self.ref_type(pointee, is_mut, addr_space)
            }
            TypeKind::Fn { dom, codom } => {
                let dom = self.replace(dom, map);
                let codom = self.replace(codom, map);
                self.fn_type(dom, codom)
            }
            TypeKind::App { applied, args } => {
                let args = args.iter().map(|&a| self.replace(a, map)).collect();
                self.type_app(applied, args)
            }
            TypeKind::ImplicitParam(underlying) => {
                let underlying = self.replace(underlying, map);
                self.implicit_param_type(underlying)
            }
            _ => ty,
        }
    }

    /// Instantiate a forall at the given type arguments.
    pub fn instantiate_forall(&mut self, forall: TypeId, args: &[TypeId]) -> TypeId {
        let (params, body) = {
            let def = self.forall_def(forall);
            (def.params.clone(), def.body)
        };
        let Some(body) = body else {
            return self.error;
        };
        debug_assert_eq!(params.len(), args.len());
        let map = replace_map(&params, args);
        self.replace(body, &map)
    }

    // -- Variance -----------------------------------------------------------

    /// Map each type variable occurring in `ty` to its variance.
    /// Variables that do not occur are absent (constant).
    pub fn variance(&self, ty: TypeId, covariant: bool) -> BTreeMap<TypeId, Variance> {
        let mut map = BTreeMap::new();
        let polarity = if covariant {
            Polarity::Covariant
        } else {
            Polarity::Contravariant
        };
        self.variance_into(ty, polarity, &mut map);
        map
    }

    fn variance_into(&self, ty: TypeId, polarity: Polarity, map: &mut BTreeMap<TypeId, Variance>) {
        match self.kind(ty) {
            TypeKind::Var(_) => {
                let observed = match polarity {
                    Polarity::Covariant => Variance::Covariant,
                    Polarity::Contravariant => Variance::Contravariant,
                    Polarity::Invariant => Variance::Invariant,
                };
                map.entry(ty)
                    .and_modify(|v| {
                        if *v != observed {
                            *v = Variance::Invariant;
                        }
                    })
                    .or_insert(observed);
            }
            TypeKind::Tuple(elems) => {
                for &elem in elems {
                    self.variance_into(elem, polarity, map);
                }
            }
            TypeKind::SizedArray { elem, .. } | TypeKind::UnsizedArray { elem } => {
                self.variance_into(*elem, polarity, map);
            }
            TypeKind::Ptr {
                pointee, is_mut, ..
            }
            | TypeKind::Ref {
                pointee, is_mut, ..
            } => {
                // Covariant under reads, invariant under mutable access.
                let polarity = if *is_mut { Polarity::Invariant } else { polarity };
                self.variance_into(*pointee, polarity, map);
            }
            TypeKind::Fn { dom, codom } => {
                self.variance_into(*dom, polarity.flip(), map);
                self.variance_into(*codom, polarity, map);
            }
            TypeKind::App { args, .. } => {
                // Nominal types are invariant in their parameters.
                for &arg in args {
                    self.variance_into(arg, Polarity::Invariant, map);
                }
            }
            TypeKind::ImplicitParam(underlying) => {
                self.variance_into(*underlying, polarity, map);
            }
            _ => {}
        }
    }

    // -- Bounds -------------------------------------------------------------

    /// Derive `[lower, upper]` intervals for every type variable of a
    /// function domain by matching it against an argument type. Variables
    /// without usable constraints keep `[Bottom, Top]`.
    pub fn bounds(&self, dom: TypeId, arg: TypeId) -> BTreeMap<TypeId, TypeBounds> {
        let mut map = BTreeMap::new();
        // The domain is a negative position of the function type, so the
        // walk starts contravariant; a variable at the top level therefore
        // receives a lower bound (see the local type inference rules).
        self.bounds_into(dom, Some(arg), Polarity::Contravariant, &mut map);
        map
    }

    fn bounds_into(
        &self,
        dom: TypeId,
        arg: Option<TypeId>,
        polarity: Polarity,
        map: &mut BTreeMap<TypeId, TypeBounds>,
    ) {
        // Arguments never carry a surface reference by the time inference
        // runs, but strip one defensively so matching stays structural.
        let arg = arg.map(|a| match self.kind(a) {
            TypeKind::Ref { pointee, .. } => *pointee,
            _ => a,
        });
        match self.kind(dom) {
            TypeKind::Var(_) => {
                let bottom = self.bottom;
                let top = self.top;
                let entry = map.entry(dom).or_insert(TypeBounds {
                    lower: bottom,
                    upper: top,
                });
                if let Some(arg) = arg {
                    match polarity {
                        Polarity::Contravariant => entry.lower = self.join(entry.lower, arg),
                        Polarity::Covariant => entry.upper = self.meet_upper(entry.upper, arg),
                        Polarity::Invariant => {
                            entry.lower = self.join(entry.lower, arg);
                            entry.upper = self.meet_upper(entry.upper, arg);
                        }
                    }
                }
            }
            TypeKind::Tuple(elems) => {
                let parts: Vec<Option<TypeId>> = match arg.map(|a| self.kind(a)) {
                    Some(TypeKind::Tuple(args)) if args.len() == elems.len() => {
                        args.iter().map(|&a| Some(a)).collect()
                    }
                    _ => vec![None; elems.len()],
                };
                for (&elem, part) in elems.iter().zip(parts) {
                    self.bounds_into(elem, part, polarity, map);
                }
            }
            TypeKind::SizedArray { elem, .. } | TypeKind::UnsizedArray { elem } => {
                let part = match arg.map(|a| self.kind(a)) {
                    Some(
                        TypeKind::SizedArray { elem: a, .. } | TypeKind::UnsizedArray { elem: a },
                    ) => Some(*a),
                    _ => None,
                };
                self.bounds_into(*elem, part, polarity, map);
            }
            TypeKind::Ptr {
                pointee, is_mut, ..
            } => {
                let polarity = if *is_mut { Polarity::Invariant } else { polarity };
                match arg.map(|a| self.kind(a)) {
                    Some(TypeKind::Ptr { pointee: a, .. }) => {
                        self.bounds_into(*pointee, Some(*a), polarity, map)
                    }
                    // T <= &U lets a plain value match a constant pointer.
                    _ if !is_mut => self.bounds_into(*pointee, arg, polarity, map),
                    _ => self.bounds_into(*pointee, None, polarity, map),
                }
            }
            TypeKind::Ref {
                pointee, is_mut, ..
            } => {
                let polarity = if *is_mut { Polarity::Invariant } else { polarity };
                self.bounds_into(*pointee, arg, polarity, map);
            }
            TypeKind::Fn { dom: d, codom: c } => match arg.map(|a| self.kind(a)) {
                Some(TypeKind::Fn {
                    dom: ad,
                    codom: ac,
                }) => {
                    let (ad, ac) = (*ad, *ac);
                    self.bounds_into(*d, Some(ad), polarity.flip(), map);
                    self.bounds_into(*c, Some(ac), polarity, map);
                }
                _ => {
                    self.bounds_into(*d, None, polarity.flip(), map);
                    self.bounds_into(*c, None, polarity, map);
                }
            },
            TypeKind::App { applied, args } => {
                let parts: Vec<Option<TypeId>> = match arg.map(|a| self.kind(a)) {
                    Some(TypeKind::App {
                        applied: a,
                        args: arg_args,
                    }) if a == applied && arg_args.len() == args.len() => {
                        arg_args.iter().map(|&a| Some(a)).collect()
                    }
                    _ => vec![None; args.len()],
                };
                for (&param, part) in args.iter().zip(parts) {
                    self.bounds_into(param, part, Polarity::Invariant, map);
                }
            }
            TypeKind::ImplicitParam(underlying) => {
                self.bounds_into(*underlying, arg, polarity, map);
            }
            _ => {}
        }
    }

    /// Tighten an upper bound: greatest lower bound of the two, `Bottom`
    /// when they are incomparable.
    fn meet_upper(&self, upper: TypeId, other: TypeId) -> TypeId {
        if self.subtype(other, upper) {
            other
        } else if self.subtype(upper, other) {
            upper
        } else {
            self.bottom
        }
    }

    // -- Order --------------------------------------------------------------

    /// Maximum function-arrow nesting depth. First-order values are 0.
    pub fn order(&self, ty: TypeId) -> usize {
        let mut seen = HashSet::new();
        self.order_rec(ty, &mut seen)
    }

    fn order_rec(&self, ty: TypeId, seen: &mut HashSet<TypeId>) -> usize {
        match self.kind(ty) {
            TypeKind::Fn { dom, codom } => {
                1 + self.order_rec(*dom, seen).max(self.order_rec(*codom, seen))
            }
            TypeKind::Tuple(elems) => elems
                .iter()
                .map(|&e| self.order_rec(e, seen))
                .max()
                .unwrap_or(0),
            TypeKind::SizedArray { elem, .. } | TypeKind::UnsizedArray { elem } => {
                self.order_rec(*elem, seen)
            }
            TypeKind::Ptr { pointee, .. } | TypeKind::Ref { pointee, .. } => {
                self.order_rec(*pointee, seen)
            }
            TypeKind::Struct(_) | TypeKind::Enum(_) | TypeKind::App { .. } => {
                if !seen.insert(ty) {
                    return 0;
                }
                let (nominal, _) = self.peel_app(ty);
                let members: Vec<TypeId> = match self.kind(nominal) {
                    TypeKind::Struct(_) => self
                        .struct_def(nominal)
                        .fields
                        .iter()
                        .map(|f| f.ty)
                        .collect(),
                    TypeKind::Enum(_) => self
                        .enum_def(nominal)
                        .options
                        .iter()
                        .map(|o| o.ty)
                        .collect(),
                    _ => Vec::new(),
                };
                members
                    .into_iter()
                    .map(|m| self.order_rec(m, seen))
                    .max()
                    .unwrap_or(0)
            }
            TypeKind::Forall(_) => self
                .foralls
                .get(&ty)
                .and_then(|def| def.body)
                .map(|body| self.order_rec(body, seen))
                .unwrap_or(0),
            TypeKind::ImplicitParam(underlying) => self.order_rec(*underlying, seen),
            _ => 0,
        }
    }

    // -- Sizedness ----------------------------------------------------------

    /// A type is sized unless a nominal aggregate reaches back to itself
    /// without going through a pointer.
    pub fn is_sized(&self, ty: TypeId) -> bool {
        let mut seen = HashSet::new();
        self.is_sized_rec(ty, &mut seen)
    }

    fn is_sized_rec(&self, ty: TypeId, seen: &mut HashSet<TypeId>) -> bool {
        match self.kind(ty) {
            TypeKind::Tuple(elems) => elems.iter().all(|&e| self.is_sized_rec(e, seen)),
            TypeKind::SizedArray { elem, .. } | TypeKind::UnsizedArray { elem } => {
                self.is_sized_rec(*elem, seen)
            }
            // Indirection breaks recursion.
            TypeKind::Ptr { .. } | TypeKind::Ref { .. } => true,
            TypeKind::Fn { dom, codom } => {
                self.is_sized_rec(*dom, seen) && self.is_sized_rec(*codom, seen)
            }
            TypeKind::Struct(_) | TypeKind::Enum(_) => {
                if !seen.insert(ty) {
                    return false;
                }
                let members: Vec<TypeId> = match self.kind(ty) {
                    TypeKind::Struct(_) => {
                        self.struct_def(ty).fields.iter().map(|f| f.ty).collect()
                    }
                    _ => self.enum_def(ty).options.iter().map(|o| o.ty).collect(),
                };
                let sized = members.into_iter().all(|m| self.is_sized_rec(m, seen));
                seen.remove(&ty);
                sized
            }
            TypeKind::App { applied, args } => {
                self.is_sized_rec(*applied, seen)
                    && args.iter().all(|&a| self.is_sized_rec(a, seen))
            }
            TypeKind::ImplicitParam(underlying) => self.is_sized_rec(*underlying, seen),
            _ => true,
        }
    }

    // -- Display ------------------------------------------------------------

    pub fn display(&self, ty: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { table: self, ty }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a substitution map from parallel parameter/argument lists.
pub fn replace_map(params: &[TypeId], args: &[TypeId]) -> HashMap<TypeId, TypeId> {
    params.iter().copied().zip(args.iter().copied()).collect()
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Human-readable rendering of an interned type.
pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    ty: TypeId,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.table;
        match t.kind(self.ty) {
            TypeKind::Prim(tag) => write!(f, "{tag}"),
            TypeKind::Tuple(elems) => {
                f.write_str("(")?;
                for (i, &elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", t.display(elem))?;
                }
                f.write_str(")")
            }
            TypeKind::SizedArray {
                elem,
                size,
                is_simd,
            } => {
                if *is_simd {
                    write!(f, "simd[{} * {}]", t.display(*elem), size)
                } else {
                    write!(f, "[{} * {}]", t.display(*elem), size)
                }
            }
            TypeKind::UnsizedArray { elem } => write!(f, "[{}]", t.display(*elem)),
            TypeKind::Ptr {
                pointee,
                is_mut,
                addr_space,
            } => {
                f.write_str("&")?;
                if *addr_space != 0 {
                    write!(f, "addrspace({addr_space}) ")?;
                }
                if *is_mut {
                    f.write_str("mut ")?;
                }
                write!(f, "{}", t.display(*pointee))
            }
            TypeKind::Ref {
                pointee, is_mut, ..
            } => {
                if *is_mut {
                    write!(f, "ref mut {}", t.display(*pointee))
                } else {
                    write!(f, "ref {}", t.display(*pointee))
                }
            }
            TypeKind::Fn { dom, codom } => {
                write!(f, "fn {} -> {}", t.display(*dom), t.display(*codom))
            }
            TypeKind::NoRet => f.write_str("!"),
            TypeKind::Error => f.write_str("<error>"),
            TypeKind::Var(_) => {
                f.write_str(t.var_names.get(&self.ty).map(String::as_str).unwrap_or("_"))
            }
            TypeKind::Forall(_) => {
                let def = t.forall_def(self.ty);
                f.write_str("fn[")?;
                for (i, &param) in def.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", t.display(param))?;
                }
                f.write_str("]")?;
                match def.body.map(|b| t.kind(b)) {
                    Some(TypeKind::Fn { dom, codom }) => {
                        write!(f, " {} -> {}", t.display(*dom), t.display(*codom))
                    }
                    _ => f.write_str(" ?"),
                }
            }
            TypeKind::Struct(_) => f.write_str(&t.struct_def(self.ty).name),
            TypeKind::Enum(_) => f.write_str(&t.enum_def(self.ty).name),
            TypeKind::Alias(_) => f.write_str(&t.alias_def(self.ty).name),
            TypeKind::Mod(_) => f.write_str(
                t.mod_names
                    .get(&self.ty)
                    .map(String::as_str)
                    .unwrap_or("<module>"),
            ),
            TypeKind::App { applied, args } => {
                write!(f, "{}[", t.display(*applied))?;
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", t.display(arg))?;
                }
                f.write_str("]")
            }
            TypeKind::ImplicitParam(underlying) => {
                write!(f, "implicit {}", t.display(*underlying))
            }
            TypeKind::Top => f.write_str("<top>"),
            TypeKind::Bottom => f.write_str("<bottom>"),
        }
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
