//! AST node definitions and source spans for Sable.
//!
//! This crate defines the abstract syntax tree consumed by the semantic
//! analysis core. Nodes are arena-allocated in an [`Ast`] and referred to by
//! typed ids, so that later passes can attach information in dense side
//! tables instead of mutating the tree. Every node carries a [`Span`].
//!
//! The tree arrives here already name-resolved: each [`Path`] has a
//! `start_decl` link, and `return`/`break`/`continue` carry back-links to
//! their enclosing lambda or loop.

use std::fmt;

/// Identifies a source file in the compilation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// A byte offset range within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub file: FileId,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Create a span that covers both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        debug_assert_eq!(
            self.file, other.file,
            "cannot merge spans from different files"
        );
        Span {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// A zero-length span at the end of this one.
    pub fn at_end(self) -> Span {
        Span {
            file: self.file,
            start: self.end,
            end: self.end,
        }
    }

    /// A synthetic span for compiler-generated nodes.
    pub fn synthetic() -> Self {
        Self {
            file: FileId(u32::MAX),
            start: 0,
            end: 0,
        }
    }
}

/// A value paired with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

// ---------------------------------------------------------------------------
// Node ids
// ---------------------------------------------------------------------------

macro_rules! node_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

node_id!(
    /// Index of an expression in the [`Ast`] arena.
    ExprId
);
node_id!(
    /// Index of a pattern in the [`Ast`] arena.
    PatId
);
node_id!(
    /// Index of a syntactic type annotation in the [`Ast`] arena.
    TypeExprId
);
node_id!(
    /// Index of a declaration in the [`Ast`] arena.
    DeclId
);
node_id!(
    /// Index of a path in the [`Ast`] arena.
    PathId
);

// ---------------------------------------------------------------------------
// Literals and primitive type tags
// ---------------------------------------------------------------------------

/// A literal value. Integer literals store the unsigned magnitude; unary
/// minus stays a separate node so that `-128: i8` can be range-checked
/// downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Int(u64),
    Float(f64),
    Bool(bool),
    Char(u8),
    Str(String),
}

impl Lit {
    pub fn is_int(&self) -> bool {
        matches!(self, Lit::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Lit::Float(_))
    }
}

/// Primitive type tags, shared between syntactic annotations and the
/// semantic type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimTy {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl PrimTy {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimTy::Bool => "bool",
            PrimTy::I8 => "i8",
            PrimTy::I16 => "i16",
            PrimTy::I32 => "i32",
            PrimTy::I64 => "i64",
            PrimTy::U8 => "u8",
            PrimTy::U16 => "u16",
            PrimTy::U32 => "u32",
            PrimTy::U64 => "u64",
            PrimTy::F32 => "f32",
            PrimTy::F64 => "f64",
        }
    }
}

impl fmt::Display for PrimTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// A dotted/double-colon path with per-segment type-argument lists.
///
/// Name resolution fills `start_decl` before checking; a `None` start means
/// resolution already failed and the checker poisons the path silently.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub start_decl: Option<DeclId>,
    pub segs: Vec<PathSeg>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathSeg {
    pub name: SegName,
    pub type_args: Vec<TypeExprId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegName {
    Ident(String),
    Super,
}

impl PathSeg {
    pub fn is_super(&self) -> bool {
        matches!(self.name, SegName::Super)
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.name {
            SegName::Ident(name) => Some(name),
            SegName::Super => None,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segs.iter().enumerate() {
            if i > 0 {
                f.write_str("::")?;
            }
            match &seg.name {
                SegName::Ident(name) => f.write_str(name)?,
                SegName::Super => f.write_str("super")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Lit(Lit),
    Path(PathId),
    /// `(a, b, c)`; the empty tuple is the unit value.
    Tuple(Vec<ExprId>),
    Array {
        elems: Vec<ExprId>,
        is_simd: bool,
    },
    /// `[elem; count]`.
    Repeat {
        elem: ExprId,
        count: u64,
        is_simd: bool,
    },
    /// `S { a: 1, b: 2 }` or functional update `e .{ a: 1 }`.
    Record {
        base: RecordBase,
        fields: Vec<FieldInit>,
    },
    /// `e.field` or `e.0`.
    Proj {
        base: ExprId,
        field: ProjField,
    },
    Lambda(Lambda),
    Block {
        stmts: Vec<Stmt>,
        last_semi: bool,
    },
    /// Call with a single argument; multiple arguments arrive as a tuple.
    Call {
        callee: ExprId,
        arg: ExprId,
    },
    If {
        cond: Cond,
        then_expr: ExprId,
        else_expr: Option<ExprId>,
    },
    Match {
        scrutinee: ExprId,
        arms: Vec<Arm>,
    },
    While {
        cond: Cond,
        body: ExprId,
    },
    /// A `for` loop, pre-desugared by the parser into
    /// `Call { callee: Call { callee: f, arg: lambda }, arg: args }`.
    For {
        call: ExprId,
    },
    Break {
        loop_expr: Option<ExprId>,
    },
    Continue {
        loop_expr: Option<ExprId>,
    },
    Return {
        lambda: Option<ExprId>,
    },
    Unary {
        op: UnOp,
        arg: ExprId,
    },
    Binary {
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// `e as T`.
    Cast {
        expr: ExprId,
        target: TypeExprId,
    },
    /// `e : T`.
    Ascribe {
        expr: ExprId,
        ty: TypeExprId,
    },
    /// `summon[T]`; the synthesized form used for implicit parameters has
    /// no annotation and gets its type from the call site.
    Summon {
        ty: Option<TypeExprId>,
    },
    /// `@(filter) e`, constraining partial evaluation of a callee.
    Filtered {
        filter: Option<ExprId>,
        expr: ExprId,
    },
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordBase {
    Path(PathId),
    Update(ExprId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    pub name: String,
    pub expr: ExprId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjField {
    Name(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub param: PatId,
    pub ret_ty: Option<TypeExprId>,
    pub filter: Option<ExprId>,
    /// Absent for imported (bodyless) functions.
    pub body: Option<ExprId>,
}

/// Condition of an `if`/`while`: either a boolean expression or a
/// refutable `let` binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Bool(ExprId),
    Let { pat: PatId, scrutinee: ExprId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub pat: PatId,
    pub body: ExprId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtKind {
    Decl(DeclId),
    Expr(ExprId),
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Minus,
    Not,
    /// `&e`.
    AddrOf,
    /// `&mut e`.
    AddrOfMut,
    /// `*e`.
    Deref,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnOp {
    pub fn is_inc(self) -> bool {
        matches!(self, UnOp::PreInc | UnOp::PostInc)
    }

    pub fn is_dec(self) -> bool {
        matches!(self, UnOp::PreDec | UnOp::PostDec)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Plus => "+",
            UnOp::Minus => "-",
            UnOp::Not => "!",
            UnOp::AddrOf => "&",
            UnOp::AddrOfMut => "&mut",
            UnOp::Deref => "*",
            UnOp::PreInc | UnOp::PostInc => "++",
            UnOp::PreDec | UnOp::PostDec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    LogicAnd,
    LogicOr,
    CmpEq,
    CmpNe,
    CmpLt,
    CmpGt,
    CmpLe,
    CmpGe,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    OrAssign,
    XorAssign,
}

impl BinOp {
    /// Whether this operator writes to its left operand.
    pub fn is_assign(self) -> bool {
        matches!(
            self,
            BinOp::Assign
                | BinOp::AddAssign
                | BinOp::SubAssign
                | BinOp::MulAssign
                | BinOp::DivAssign
                | BinOp::RemAssign
                | BinOp::ShlAssign
                | BinOp::ShrAssign
                | BinOp::AndAssign
                | BinOp::OrAssign
                | BinOp::XorAssign
        )
    }

    /// The arithmetic part of a compound assignment; `Assign` for `=`.
    pub fn without_assign(self) -> BinOp {
        match self {
            BinOp::AddAssign => BinOp::Add,
            BinOp::SubAssign => BinOp::Sub,
            BinOp::MulAssign => BinOp::Mul,
            BinOp::DivAssign => BinOp::Div,
            BinOp::RemAssign => BinOp::Rem,
            BinOp::ShlAssign => BinOp::Shl,
            BinOp::ShrAssign => BinOp::Shr,
            BinOp::AndAssign => BinOp::And,
            BinOp::OrAssign => BinOp::Or,
            BinOp::XorAssign => BinOp::Xor,
            other => other,
        }
    }

    pub fn is_cmp(self) -> bool {
        matches!(
            self,
            BinOp::CmpEq | BinOp::CmpNe | BinOp::CmpLt | BinOp::CmpGt | BinOp::CmpLe | BinOp::CmpGe
        )
    }

    pub fn is_logic(self) -> bool {
        matches!(self, BinOp::LogicAnd | BinOp::LogicOr)
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Pat {
    pub kind: PatKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatKind {
    /// `x` or `mut x` or `x as sub`; the binding declaration is what paths
    /// resolve to.
    Binding {
        decl: DeclId,
        sub: Option<PatId>,
    },
    Wildcard,
    Lit(Lit),
    Tuple(Vec<PatId>),
    Array {
        elems: Vec<PatId>,
        is_simd: bool,
    },
    Record {
        path: PathId,
        fields: Vec<FieldPat>,
        has_etc: bool,
    },
    Ctor {
        path: PathId,
        arg: Option<PatId>,
    },
    /// `p : T`; the pattern part may be omitted.
    Ascribe {
        pat: Option<PatId>,
        ty: TypeExprId,
    },
    /// `implicit p`, declaring an implicit parameter.
    Implicit {
        underlying: PatId,
    },
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPat {
    pub name: String,
    pub pat: PatId,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Syntactic types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    Prim(PrimTy),
    Tuple(Vec<TypeExprId>),
    SizedArray {
        elem: TypeExprId,
        size: u64,
        is_simd: bool,
    },
    UnsizedArray {
        elem: TypeExprId,
    },
    Ptr {
        pointee: TypeExprId,
        is_mut: bool,
        addr_space: u32,
    },
    /// `fn dom -> codom`; a `None` codomain is the no-return marker `!`,
    /// making this a continuation type.
    Fn {
        dom: TypeExprId,
        codom: Option<TypeExprId>,
    },
    Path(PathId),
    Error,
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
    pub attrs: Vec<Attr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// Introduced by an identifier pattern; the target of value paths.
    Binding {
        name: String,
        is_mut: bool,
    },
    Let {
        pat: PatId,
        init: Option<ExprId>,
    },
    Fn(FnDecl),
    TypeParam {
        name: String,
    },
    Static(StaticDecl),
    Struct(StructDecl),
    Field {
        name: String,
        ty: TypeExprId,
        init: Option<ExprId>,
    },
    Enum(EnumDecl),
    Variant(VariantDecl),
    TypeAlias {
        name: String,
        type_params: Vec<DeclId>,
        aliased: TypeExprId,
    },
    Mod(ModDecl),
    Use {
        path: PathId,
    },
    /// `implicit [: T] = value`, registering a summonable value.
    Implicit {
        ty: Option<TypeExprId>,
        value: ExprId,
    },
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub type_params: Vec<DeclId>,
    /// Points at an [`ExprKind::Lambda`] node.
    pub lambda: ExprId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticDecl {
    pub name: String,
    pub is_mut: bool,
    pub ty: Option<TypeExprId>,
    pub init: Option<ExprId>,
    /// Associated alias group: statics whose annotated types must agree
    /// with this one.
    pub group: Vec<DeclId>,
    pub top_level: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub type_params: Vec<DeclId>,
    pub fields: Vec<DeclId>,
    pub is_tuple_like: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub type_params: Vec<DeclId>,
    pub variants: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDecl {
    pub name: String,
    pub shape: VariantShape,
    /// The owning enum declaration.
    pub parent: Option<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariantShape {
    Unit,
    Tuple(TypeExprId),
    Record(Vec<DeclId>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModDecl {
    pub name: String,
    pub decls: Vec<DeclId>,
    pub parent: Option<DeclId>,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub kind: AttrKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrKind {
    Named(Vec<Attr>),
    Lit(Lit),
    Path(PathId),
}

impl Attr {
    pub fn find(&self, name: &str) -> Option<&Attr> {
        match &self.kind {
            AttrKind::Named(args) => args.iter().find(|a| a.name == name),
            _ => None,
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.kind {
            AttrKind::Lit(Lit::Str(s)) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Owns every node of a resolved module tree.
#[derive(Debug, Default)]
pub struct Ast {
    pub exprs: Vec<Expr>,
    pub pats: Vec<Pat>,
    pub type_exprs: Vec<TypeExpr>,
    pub decls: Vec<Decl>,
    pub paths: Vec<Path>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { kind, span });
        id
    }

    pub fn alloc_pat(&mut self, kind: PatKind, span: Span) -> PatId {
        let id = PatId(self.pats.len() as u32);
        self.pats.push(Pat { kind, span });
        id
    }

    pub fn alloc_type_expr(&mut self, kind: TypeExprKind, span: Span) -> TypeExprId {
        let id = TypeExprId(self.type_exprs.len() as u32);
        self.type_exprs.push(TypeExpr { kind, span });
        id
    }

    pub fn alloc_decl(&mut self, kind: DeclKind, span: Span) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl {
            kind,
            span,
            attrs: Vec::new(),
        });
        id
    }

    pub fn alloc_path(&mut self, path: Path) -> PathId {
        let id = PathId(self.paths.len() as u32);
        self.paths.push(path);
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn pat(&self, id: PatId) -> &Pat {
        &self.pats[id.index()]
    }

    pub fn type_expr(&self, id: TypeExprId) -> &TypeExpr {
        &self.type_exprs[id.index()]
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn path(&self, id: PathId) -> &Path {
        &self.paths[id.index()]
    }

    /// The user-visible name of a declaration, if it has one.
    pub fn decl_name(&self, id: DeclId) -> Option<&str> {
        match &self.decl(id).kind {
            DeclKind::Binding { name, .. }
            | DeclKind::TypeParam { name }
            | DeclKind::Field { name, .. }
            | DeclKind::TypeAlias { name, .. } => Some(name),
            DeclKind::Fn(decl) => Some(&decl.name),
            DeclKind::Static(decl) => Some(&decl.name),
            DeclKind::Struct(decl) => Some(&decl.name),
            DeclKind::Enum(decl) => Some(&decl.name),
            DeclKind::Variant(decl) => Some(&decl.name),
            DeclKind::Mod(decl) => Some(&decl.name),
            DeclKind::Let { .. }
            | DeclKind::Use { .. }
            | DeclKind::Implicit { .. }
            | DeclKind::Error => None,
        }
    }

    /// Whether a path landing on this declaration names a value.
    pub fn decl_is_value(&self, id: DeclId) -> bool {
        matches!(
            self.decl(id).kind,
            DeclKind::Binding { .. }
                | DeclKind::Static(_)
                | DeclKind::Fn(_)
                | DeclKind::Implicit { .. }
        )
    }

    /// Whether this declaration introduces a constructor.
    pub fn decl_is_ctor(&self, id: DeclId) -> bool {
        matches!(self.decl(id).kind, DeclKind::Struct(_) | DeclKind::Variant(_))
    }

    /// Whether evaluating this expression can have a side effect.
    /// Used to flag statements with no effect.
    pub fn has_side_effect(&self, id: ExprId) -> bool {
        match &self.expr(id).kind {
            ExprKind::Lit(_) | ExprKind::Path(_) | ExprKind::Lambda(_) | ExprKind::Error => false,
            ExprKind::Tuple(elems) => elems.iter().any(|&e| self.has_side_effect(e)),
            ExprKind::Array { elems, .. } => elems.iter().any(|&e| self.has_side_effect(e)),
            ExprKind::Repeat { elem, .. } => self.has_side_effect(*elem),
            ExprKind::Record { base, fields } => {
                let base_effect = match base {
                    RecordBase::Path(_) => false,
                    RecordBase::Update(expr) => self.has_side_effect(*expr),
                };
                base_effect || fields.iter().any(|f| self.has_side_effect(f.expr))
            }
            ExprKind::Proj { base, .. } => self.has_side_effect(*base),
            ExprKind::Ascribe { expr, .. } | ExprKind::Cast { expr, .. } => {
                self.has_side_effect(*expr)
            }
            ExprKind::Unary { op, arg } => {
                matches!(
                    op,
                    UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec
                ) || self.has_side_effect(*arg)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                op.is_assign() || self.has_side_effect(*lhs) || self.has_side_effect(*rhs)
            }
            // Calls, loops, jumps, summons and blocks are conservatively
            // treated as effectful.
            _ => true,
        }
    }

    /// Whether this expression is a compile-time constant (a literal tree).
    pub fn is_constant(&self, id: ExprId) -> bool {
        match &self.expr(id).kind {
            ExprKind::Lit(_) => true,
            ExprKind::Tuple(elems) => elems.iter().all(|&e| self.is_constant(e)),
            ExprKind::Array { elems, .. } => elems.iter().all(|&e| self.is_constant(e)),
            ExprKind::Repeat { elem, .. } => self.is_constant(*elem),
            ExprKind::Record { base, fields } => {
                matches!(base, RecordBase::Path(_))
                    && fields.iter().all(|f| self.is_constant(f.expr))
            }
            ExprKind::Unary {
                op: UnOp::Plus | UnOp::Minus,
                arg,
            } => self.is_constant(*arg),
            ExprKind::Ascribe { expr, .. } => self.is_constant(*expr),
            // Unit-variant constructors are constant; applied constructors
            // are constant when their argument is.
            ExprKind::Path(_) => true,
            ExprKind::Call { callee, arg } => {
                let callee_is_path = matches!(self.expr(*callee).kind, ExprKind::Path(_));
                callee_is_path && self.is_constant(*arg)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(FileId(0), 0, 1)
    }

    #[test]
    fn span_merge_covers_both() {
        let a = Span::new(FileId(0), 4, 9);
        let b = Span::new(FileId(0), 1, 6);
        assert_eq!(a.merge(b), Span::new(FileId(0), 1, 9));
    }

    #[test]
    fn assignment_operators_strip_to_arithmetic() {
        assert_eq!(BinOp::AddAssign.without_assign(), BinOp::Add);
        assert_eq!(BinOp::ShlAssign.without_assign(), BinOp::Shl);
        assert_eq!(BinOp::Assign.without_assign(), BinOp::Assign);
        assert!(BinOp::Assign.is_assign());
        assert!(!BinOp::Add.is_assign());
    }

    #[test]
    fn constant_trees() {
        let mut ast = Ast::new();
        let one = ast.alloc_expr(ExprKind::Lit(Lit::Int(1)), span());
        let neg = ast.alloc_expr(
            ExprKind::Unary {
                op: UnOp::Minus,
                arg: one,
            },
            span(),
        );
        let pair = ast.alloc_expr(ExprKind::Tuple(vec![one, neg]), span());
        assert!(ast.is_constant(pair));

        let call = {
            let block = ast.alloc_expr(
                ExprKind::Block {
                    stmts: vec![],
                    last_semi: false,
                },
                span(),
            );
            ast.alloc_expr(
                ExprKind::Call {
                    callee: block,
                    arg: one,
                },
                span(),
            )
        };
        assert!(!ast.is_constant(call));
    }

    #[test]
    fn effect_analysis() {
        let mut ast = Ast::new();
        let one = ast.alloc_expr(ExprKind::Lit(Lit::Int(1)), span());
        let two = ast.alloc_expr(ExprKind::Lit(Lit::Int(2)), span());
        let add = ast.alloc_expr(
            ExprKind::Binary {
                op: BinOp::Add,
                lhs: one,
                rhs: two,
            },
            span(),
        );
        assert!(!ast.has_side_effect(add));
        let assign = ast.alloc_expr(
            ExprKind::Binary {
                op: BinOp::Assign,
                lhs: one,
                rhs: two,
            },
            span(),
        );
        assert!(ast.has_side_effect(assign));
    }
}
