// AST (Abstract Syntax Tree) definitions for the shading language

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: Arc<str>,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: Arc<str>, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Built-in types a declaration can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Void,
    Bool,
    Int,
    Float,
    Vec2f,
    Vec3f,
    Vec4f,
    Vec2i,
    Vec3i,
    Vec4i,
    Mat3,
    Mat4,
    Buffer,
    Sampler2D,
}

/// Handle into a [`StructTable`](crate::parser::link::StructTable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructId(pub usize);

/// Type half of a declaration
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationType {
    Primitive(PrimitiveType),
    Struct(StructReference),
}

/// A declaration whose type names a user struct.
///
/// `resolved` stays empty after parsing; the linking pass may set it once.
#[derive(Debug, Clone, PartialEq)]
pub struct StructReference {
    pub name: String,
    pub resolved: OnceLock<StructId>,
}

impl StructReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolved: OnceLock::new(),
        }
    }

    pub fn resolved(&self) -> Option<StructId> {
        self.resolved.get().copied()
    }
}

/// Storage qualifier written in front of a declaration's type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationQualifier {
    In,
    Out,
    ReadOnly,
}

/// `[const] [qualifier] type name[count]`, optionally with an inline struct body.
///
/// `element_count` is `0` for an unsized array, `1` for a scalar and the
/// array length otherwise. Function return declarations have an empty name.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationNode {
    pub is_const: bool,
    pub qualifier: Option<DeclarationQualifier>,
    pub ty: DeclarationType,
    pub name: String,
    pub element_count: u32,
    pub body: Option<Vec<DeclarationNode>>,
    pub location: SourceLocation,
}

impl DeclarationNode {
    pub fn is_struct(&self) -> bool {
        matches!(self.ty, DeclarationType::Struct(_))
    }

    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self.ty {
            DeclarationType::Primitive(p) => Some(p),
            DeclarationType::Struct(_) => None,
        }
    }

    pub fn struct_reference(&self) -> Option<&StructReference> {
        match &self.ty {
            DeclarationType::Struct(r) => Some(r),
            DeclarationType::Primitive(_) => None,
        }
    }
}

/// Which stage a named scope belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutDirection {
    In,
    Out,
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentDirection {
    In,
    Out,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Multiplicative
    Mul,
    Div,
    Mod,
    // Additive
    Add,
    Sub,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleNode {
    pub path: String,
    pub statements: Vec<Node>,
}

impl ModuleNode {
    /// The first stage scope of the given kind, if any
    pub fn stage(&self, stage: Stage) -> Option<&NamedScopeNode> {
        self.statements.iter().find_map(|node| match node {
            Node::NamedScope(scope) if scope.stage == stage => Some(scope),
            _ => None,
        })
    }
}

/// `include "name";` kept unresolved; `file` is the including module's path
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeNode {
    pub file: String,
    pub name: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefineNode {
    pub name: String,
    pub value: String,
    pub location: SourceLocation,
}

/// Field order determines memory layout
#[derive(Debug, Clone, PartialEq)]
pub struct StructNode {
    pub name: String,
    pub fields: Vec<DeclarationNode>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub tags: FxHashMap<String, String>,
    pub direction: LayoutDirection,
    pub read_only: bool,
    pub declaration: DeclarationNode,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushConstantNode {
    pub tags: FxHashMap<String, String>,
    pub fields: Vec<DeclarationNode>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionArgumentNode {
    pub direction: ArgumentDirection,
    pub declaration: DeclarationNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub name: String,
    pub return_declaration: DeclarationNode,
    pub arguments: Vec<FunctionArgumentNode>,
    pub body: ScopeNode,
    pub location: SourceLocation,
}

/// `vertex { ... }` / `fragment { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct NamedScopeNode {
    pub stage: Stage,
    pub statements: Vec<Node>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeNode {
    pub statements: Vec<Node>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstNode {
    pub declaration: DeclarationNode,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnNode {
    pub expression: Option<Box<Node>>,
    pub location: SourceLocation,
}

/// `for (initial; condition; update) { body }`; empty clauses are `None`
#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    pub initial: Option<Box<Node>>,
    pub condition: Option<Box<Node>>,
    pub update: Option<Box<Node>>,
    pub body: ScopeNode,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    If(Box<IfNode>),
    Scope(ScopeNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    pub condition: Box<Node>,
    pub then_scope: ScopeNode,
    pub else_branch: Option<ElseBranch>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignNode {
    pub target: Box<Node>,
    pub value: Box<Node>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOpNode {
    pub op: BinaryOp,
    pub left: Box<Node>,
    pub right: Box<Node>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NegateNode {
    pub expression: Box<Node>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncrementNode {
    pub target: Box<Node>,
    pub is_pre: bool,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecrementNode {
    pub target: Box<Node>,
    pub is_pre: bool,
    pub location: SourceLocation,
}

/// Parenthesized sub-expression
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceNode {
    pub expression: Box<Node>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteralNode {
    pub expressions: Vec<Node>,
    pub location: SourceLocation,
}

/// `left.right`
#[derive(Debug, Clone, PartialEq)]
pub struct AccessNode {
    pub left: Box<Node>,
    pub right: Box<Node>,
    pub location: SourceLocation,
}

/// `left[index]`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexNode {
    pub left: Box<Node>,
    pub index: Box<Node>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallNode {
    pub callee: IdentifierNode,
    pub arguments: Vec<Node>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierNode {
    pub name: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntLiteralNode {
    pub value: i64,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatLiteralNode {
    pub value: f64,
    pub location: SourceLocation,
}

/// AST nodes that can appear wherever the grammar allows "a statement" or
/// "an expression"
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // Module-level items
    Include(IncludeNode),
    Define(DefineNode),
    Struct(StructNode),
    Layout(LayoutNode),
    PushConstant(PushConstantNode),
    Function(FunctionNode),
    NamedScope(NamedScopeNode),

    // Statements
    Declaration(DeclarationNode),
    Scope(ScopeNode),
    Const(ConstNode),
    Return(ReturnNode),
    For(ForNode),
    If(IfNode),

    // Expressions
    Assign(AssignNode),
    BinaryOp(BinaryOpNode),
    Negate(NegateNode),
    Increment(IncrementNode),
    Decrement(DecrementNode),
    Precedence(PrecedenceNode),
    ArrayLiteral(ArrayLiteralNode),
    Access(AccessNode),
    Index(IndexNode),
    Call(CallNode),
    Identifier(IdentifierNode),
    IntLiteral(IntLiteralNode),
    FloatLiteral(FloatLiteralNode),
}

/// Discriminant of every node kind, including the ones that only appear as
/// typed children ([`ModuleNode`], [`FunctionArgumentNode`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Module,
    Include,
    Define,
    Struct,
    Declaration,
    StructDeclaration,
    Layout,
    PushConstant,
    Function,
    FunctionArgument,
    NamedScope,
    Scope,
    Const,
    Return,
    For,
    If,
    Assign,
    BinaryOp,
    Negate,
    Increment,
    Decrement,
    Precedence,
    ArrayLiteral,
    Access,
    Index,
    Call,
    Identifier,
    IntLiteral,
    FloatLiteral,
}

/// Borrowed view of any node in the tree, used by tree walkers.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Module(&'a ModuleNode),
    Include(&'a IncludeNode),
    Define(&'a DefineNode),
    Struct(&'a StructNode),
    Declaration(&'a DeclarationNode),
    Layout(&'a LayoutNode),
    PushConstant(&'a PushConstantNode),
    Function(&'a FunctionNode),
    FunctionArgument(&'a FunctionArgumentNode),
    NamedScope(&'a NamedScopeNode),
    Scope(&'a ScopeNode),
    Const(&'a ConstNode),
    Return(&'a ReturnNode),
    For(&'a ForNode),
    If(&'a IfNode),
    Assign(&'a AssignNode),
    BinaryOp(&'a BinaryOpNode),
    Negate(&'a NegateNode),
    Increment(&'a IncrementNode),
    Decrement(&'a DecrementNode),
    Precedence(&'a PrecedenceNode),
    ArrayLiteral(&'a ArrayLiteralNode),
    Access(&'a AccessNode),
    Index(&'a IndexNode),
    Call(&'a CallNode),
    Identifier(&'a IdentifierNode),
    IntLiteral(&'a IntLiteralNode),
    FloatLiteral(&'a FloatLiteralNode),
}

impl Node {
    pub fn as_node_ref(&self) -> NodeRef<'_> {
        match self {
            Node::Include(n) => NodeRef::Include(n),
            Node::Define(n) => NodeRef::Define(n),
            Node::Struct(n) => NodeRef::Struct(n),
            Node::Layout(n) => NodeRef::Layout(n),
            Node::PushConstant(n) => NodeRef::PushConstant(n),
            Node::Function(n) => NodeRef::Function(n),
            Node::NamedScope(n) => NodeRef::NamedScope(n),
            Node::Declaration(n) => NodeRef::Declaration(n),
            Node::Scope(n) => NodeRef::Scope(n),
            Node::Const(n) => NodeRef::Const(n),
            Node::Return(n) => NodeRef::Return(n),
            Node::For(n) => NodeRef::For(n),
            Node::If(n) => NodeRef::If(n),
            Node::Assign(n) => NodeRef::Assign(n),
            Node::BinaryOp(n) => NodeRef::BinaryOp(n),
            Node::Negate(n) => NodeRef::Negate(n),
            Node::Increment(n) => NodeRef::Increment(n),
            Node::Decrement(n) => NodeRef::Decrement(n),
            Node::Precedence(n) => NodeRef::Precedence(n),
            Node::ArrayLiteral(n) => NodeRef::ArrayLiteral(n),
            Node::Access(n) => NodeRef::Access(n),
            Node::Index(n) => NodeRef::Index(n),
            Node::Call(n) => NodeRef::Call(n),
            Node::Identifier(n) => NodeRef::Identifier(n),
            Node::IntLiteral(n) => NodeRef::IntLiteral(n),
            Node::FloatLiteral(n) => NodeRef::FloatLiteral(n),
        }
    }

    pub fn tag(&self) -> NodeTag {
        self.as_node_ref().tag()
    }

    pub fn children(&self) -> Vec<NodeRef<'_>> {
        self.as_node_ref().children()
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.as_node_ref().location()
    }
}

impl<'a> NodeRef<'a> {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeRef::Module(_) => NodeTag::Module,
            NodeRef::Include(_) => NodeTag::Include,
            NodeRef::Define(_) => NodeTag::Define,
            NodeRef::Struct(_) => NodeTag::Struct,
            NodeRef::Declaration(d) if d.is_struct() => NodeTag::StructDeclaration,
            NodeRef::Declaration(_) => NodeTag::Declaration,
            NodeRef::Layout(_) => NodeTag::Layout,
            NodeRef::PushConstant(_) => NodeTag::PushConstant,
            NodeRef::Function(_) => NodeTag::Function,
            NodeRef::FunctionArgument(_) => NodeTag::FunctionArgument,
            NodeRef::NamedScope(_) => NodeTag::NamedScope,
            NodeRef::Scope(_) => NodeTag::Scope,
            NodeRef::Const(_) => NodeTag::Const,
            NodeRef::Return(_) => NodeTag::Return,
            NodeRef::For(_) => NodeTag::For,
            NodeRef::If(_) => NodeTag::If,
            NodeRef::Assign(_) => NodeTag::Assign,
            NodeRef::BinaryOp(_) => NodeTag::BinaryOp,
            NodeRef::Negate(_) => NodeTag::Negate,
            NodeRef::Increment(_) => NodeTag::Increment,
            NodeRef::Decrement(_) => NodeTag::Decrement,
            NodeRef::Precedence(_) => NodeTag::Precedence,
            NodeRef::ArrayLiteral(_) => NodeTag::ArrayLiteral,
            NodeRef::Access(_) => NodeTag::Access,
            NodeRef::Index(_) => NodeTag::Index,
            NodeRef::Call(_) => NodeTag::Call,
            NodeRef::Identifier(_) => NodeTag::Identifier,
            NodeRef::IntLiteral(_) => NodeTag::IntLiteral,
            NodeRef::FloatLiteral(_) => NodeTag::FloatLiteral,
        }
    }

    /// Immediate children in source order.
    ///
    /// A struct declaration's resolved struct is a handle, not a child.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        fn nodes(list: &[Node]) -> impl Iterator<Item = NodeRef<'_>> {
            list.iter().map(Node::as_node_ref)
        }
        fn declarations(list: &[DeclarationNode]) -> impl Iterator<Item = NodeRef<'_>> {
            list.iter().map(NodeRef::Declaration)
        }

        match *self {
            NodeRef::Module(m) => nodes(&m.statements).collect(),
            NodeRef::NamedScope(s) => nodes(&s.statements).collect(),
            NodeRef::Scope(s) => nodes(&s.statements).collect(),
            NodeRef::Struct(s) => declarations(&s.fields).collect(),
            NodeRef::PushConstant(p) => declarations(&p.fields).collect(),
            NodeRef::Declaration(d) => match &d.body {
                Some(body) => declarations(body).collect(),
                None => Vec::new(),
            },
            NodeRef::Layout(l) => vec![NodeRef::Declaration(&l.declaration)],
            NodeRef::Function(f) => {
                let mut children = vec![NodeRef::Declaration(&f.return_declaration)];
                children.extend(f.arguments.iter().map(NodeRef::FunctionArgument));
                children.push(NodeRef::Scope(&f.body));
                children
            }
            NodeRef::FunctionArgument(a) => vec![NodeRef::Declaration(&a.declaration)],
            NodeRef::Const(c) => vec![NodeRef::Declaration(&c.declaration)],
            NodeRef::Return(r) => r.expression.iter().map(|e| e.as_node_ref()).collect(),
            NodeRef::For(f) => {
                let mut children: Vec<NodeRef<'a>> = [&f.initial, &f.condition, &f.update]
                    .into_iter()
                    .flatten()
                    .map(|clause| clause.as_node_ref())
                    .collect();
                children.push(NodeRef::Scope(&f.body));
                children
            }
            NodeRef::If(i) => {
                let mut children = vec![i.condition.as_node_ref(), NodeRef::Scope(&i.then_scope)];
                match &i.else_branch {
                    Some(ElseBranch::If(chained)) => children.push(NodeRef::If(chained)),
                    Some(ElseBranch::Scope(scope)) => children.push(NodeRef::Scope(scope)),
                    None => {}
                }
                children
            }
            NodeRef::Assign(a) => vec![a.target.as_node_ref(), a.value.as_node_ref()],
            NodeRef::BinaryOp(b) => vec![b.left.as_node_ref(), b.right.as_node_ref()],
            NodeRef::Negate(n) => vec![n.expression.as_node_ref()],
            NodeRef::Increment(n) => vec![n.target.as_node_ref()],
            NodeRef::Decrement(n) => vec![n.target.as_node_ref()],
            NodeRef::Precedence(p) => vec![p.expression.as_node_ref()],
            NodeRef::ArrayLiteral(a) => nodes(&a.expressions).collect(),
            NodeRef::Access(a) => vec![a.left.as_node_ref(), a.right.as_node_ref()],
            NodeRef::Index(i) => vec![i.left.as_node_ref(), i.index.as_node_ref()],
            NodeRef::Call(c) => {
                let mut children = vec![NodeRef::Identifier(&c.callee)];
                children.extend(nodes(&c.arguments));
                children
            }
            NodeRef::Include(_)
            | NodeRef::Define(_)
            | NodeRef::Identifier(_)
            | NodeRef::IntLiteral(_)
            | NodeRef::FloatLiteral(_) => Vec::new(),
        }
    }

    /// Get the source location of this node (modules have none)
    pub fn location(&self) -> Option<&'a SourceLocation> {
        let location = match *self {
            NodeRef::Module(_) => return None,
            NodeRef::FunctionArgument(a) => &a.declaration.location,
            NodeRef::Include(n) => &n.location,
            NodeRef::Define(n) => &n.location,
            NodeRef::Struct(n) => &n.location,
            NodeRef::Declaration(n) => &n.location,
            NodeRef::Layout(n) => &n.location,
            NodeRef::PushConstant(n) => &n.location,
            NodeRef::Function(n) => &n.location,
            NodeRef::NamedScope(n) => &n.location,
            NodeRef::Scope(n) => &n.location,
            NodeRef::Const(n) => &n.location,
            NodeRef::Return(n) => &n.location,
            NodeRef::For(n) => &n.location,
            NodeRef::If(n) => &n.location,
            NodeRef::Assign(n) => &n.location,
            NodeRef::BinaryOp(n) => &n.location,
            NodeRef::Negate(n) => &n.location,
            NodeRef::Increment(n) => &n.location,
            NodeRef::Decrement(n) => &n.location,
            NodeRef::Precedence(n) => &n.location,
            NodeRef::ArrayLiteral(n) => &n.location,
            NodeRef::Access(n) => &n.location,
            NodeRef::Index(n) => &n.location,
            NodeRef::Call(n) => &n.location,
            NodeRef::Identifier(n) => &n.location,
            NodeRef::IntLiteral(n) => &n.location,
            NodeRef::FloatLiteral(n) => &n.location,
        };
        Some(location)
    }
}
