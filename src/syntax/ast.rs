//! Syntax tree types for the recognized TypeScript subset.
//!
//! The generator never type-checks or executes the target project; it only
//! needs to recognize the declaration and expression shapes that type/schema
//! resolution dispatches on. Those shapes are modeled as closed enums so the
//! resolvers can match exhaustively instead of sniffing node kinds at runtime.
//! Anything outside the subset parses to [`TypeExpr::Unknown`] /
//! [`Expr::Unknown`] and degrades downstream.

/// A parsed source module: the ordered list of top-level items.
#[derive(Debug, Clone, Default)]
pub struct SourceModule {
    pub items: Vec<Item>,
}

/// One top-level item with its export flag and attached leading comment block.
#[derive(Debug, Clone)]
pub struct Item {
    /// Whether the declaration carries an `export` modifier.
    pub exported: bool,
    /// The raw text of the comment block immediately above the declaration,
    /// if any. Joined lines, comment markers preserved.
    pub doc: Option<String>,
    pub decl: Decl,
}

/// Top-level declaration forms the resolvers care about.
#[derive(Debug, Clone)]
pub enum Decl {
    Interface(InterfaceDecl),
    TypeAlias(TypeAliasDecl),
    Enum(EnumDecl),
    Const(ConstDecl),
    Function(FunctionDecl),
}

/// `interface Name extends A, B { ... }`
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Vec<String>,
    pub members: Vec<Member>,
}

/// One named member of an interface or inline object type.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub optional: bool,
    pub ty: TypeExpr,
    /// Trailing same-line `// comment`, used as the property description.
    pub comment: Option<String>,
}

/// `type Name = ...`
#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: String,
    pub ty: TypeExpr,
}

/// `enum Name { A, B = "b", C = 3 }`
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<LiteralValue>,
}

/// `const name = <expr>` (also `let`/`var`). The initializer carries the
/// builder-DSL call chain when the constant is a schema declaration.
#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub name: String,
    pub init: Option<Expr>,
}

/// `function name(...) { ... }` — only the name is of interest: route
/// handlers are discovered by their exported binding name.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
}

/// The recognized type-expression subset.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `string`, `number`, `boolean`, `null`, ...
    Keyword(KeywordType),
    /// A (possibly generic) type reference: `User`, `Array<T>`, `Pick<T, K>`.
    /// Qualified names keep their dots (`z.infer`).
    Named { name: String, args: Vec<TypeExpr> },
    /// A literal type: `"active"`, `42`, `true`.
    Literal(LiteralValue),
    /// `T[]`
    Array(Box<TypeExpr>),
    /// `A | B | C`
    Union(Vec<TypeExpr>),
    /// `A & B`
    Intersection(Vec<TypeExpr>),
    /// An inline object type: `{ a: string; b?: number }`
    Object(Vec<Member>),
    /// `[A, B]`
    Tuple(Vec<TypeExpr>),
    /// `typeof someValue` — used by inferred-alias detection.
    TypeQuery(String),
    /// Anything outside the subset. Resolves to an untyped object schema.
    Unknown,
}

/// Primitive keyword types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordType {
    String,
    Number,
    Boolean,
    BigInt,
    Null,
    Undefined,
    Any,
    Unknown,
    Void,
    Object,
    Never,
}

/// Literal values shared by literal types, enum initializers and call
/// arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

/// The recognized expression subset — just enough to interpret builder-DSL
/// chains and their arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Literal(LiteralValue),
    /// `/pattern/flags` — only the pattern is kept.
    Regex(String),
    /// `callee(args)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `obj.prop`
    Member { obj: Box<Expr>, prop: String },
    /// `{ key: value, ... }` in declaration order.
    Object(Vec<(String, Expr)>),
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `(...) => <expr>`; a block-bodied arrow degrades to `Unknown`.
    Arrow(Box<Expr>),
    Unknown,
}

impl Expr {
    /// The identifier name, if this expression is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }
}

impl Decl {
    /// The declared name, used when building symbol tables.
    pub fn name(&self) -> &str {
        match self {
            Decl::Interface(d) => &d.name,
            Decl::TypeAlias(d) => &d.name,
            Decl::Enum(d) => &d.name,
            Decl::Const(d) => &d.name,
            Decl::Function(d) => &d.name,
        }
    }
}
