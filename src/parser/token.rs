//! Token kinds and the two token shapes that flow through the front end
//!
//! - [`RawToken`]: a coarse lexeme produced by the raw lexer. Its kind is not
//!   stored; it is looked up in the keyword table on demand.
//! - [`Token`]: a typed token produced by the retokenizer and consumed by the
//!   parser.
//!
//! Both implement [`Lexeme`] so that [`TokenBuffer`](super::buffer::TokenBuffer)
//! can be shared by every stage.

use super::ast::{PrimitiveType, SourceLocation};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

/// All token kinds known to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Punctuation
    OpenParen,    // (
    CloseParen,   // )
    OpenBrace,    // {
    CloseBrace,   // }
    OpenBracket,  // [
    CloseBracket, // ]
    Comma,        // ,
    StatementEnd, // ;
    Access,       // .
    Assign,       // =

    // Arithmetic
    OpAdd,      // +
    OpSubtract, // -
    OpMultiply, // *
    OpDivide,   // /
    OpMod,      // %

    // Comparison
    OpEqual,        // ==
    OpNotEqual,     // !=
    OpLess,         // <
    OpLessEqual,    // <=
    OpGreater,      // >
    OpGreaterEqual, // >=

    // Logical
    OpAnd, // &&
    OpOr,  // ||
    OpNot, // !

    // Increment/Decrement
    OpIncrement, // ++
    OpDecrement, // --

    // Halves of && and ||; never reach the parser on their own
    Ampersand, // &
    Pipe,      // |

    // Keywords
    VertexScope,
    FragmentScope,
    Layout,
    PushConstant,
    Include,
    Define,
    Const,
    TypeStruct,
    DataIn,
    DataOut,
    ReadOnly,
    Uniform,
    Return,
    For,
    If,
    Else,

    // Primitive types
    TypeVoid,
    TypeBoolean,
    TypeInt,
    TypeFloat,
    TypeVec2f,
    TypeVec3f,
    TypeVec4f,
    TypeVec2i,
    TypeVec3i,
    TypeVec4i,
    TypeMat3,
    TypeMat4,
    TypeBuffer,
    TypeSampler2D,

    // Literals and names
    StringLiteral,
    Identifier,
    Unknown,

    // Synthesized by the retokenizer
    Function,
    ReturnArity,
    DeclarationCount,
}

impl TokenKind {
    pub fn is_open(self) -> bool {
        matches!(
            self,
            TokenKind::OpenParen | TokenKind::OpenBrace | TokenKind::OpenBracket
        )
    }

    pub fn is_close(self) -> bool {
        matches!(
            self,
            TokenKind::CloseParen | TokenKind::CloseBrace | TokenKind::CloseBracket
        )
    }

    /// The primitive type this keyword names, if it is a type keyword
    pub fn primitive_type(self) -> Option<PrimitiveType> {
        let ty = match self {
            TokenKind::TypeVoid => PrimitiveType::Void,
            TokenKind::TypeBoolean => PrimitiveType::Bool,
            TokenKind::TypeInt => PrimitiveType::Int,
            TokenKind::TypeFloat => PrimitiveType::Float,
            TokenKind::TypeVec2f => PrimitiveType::Vec2f,
            TokenKind::TypeVec3f => PrimitiveType::Vec3f,
            TokenKind::TypeVec4f => PrimitiveType::Vec4f,
            TokenKind::TypeVec2i => PrimitiveType::Vec2i,
            TokenKind::TypeVec3i => PrimitiveType::Vec3i,
            TokenKind::TypeVec4i => PrimitiveType::Vec4i,
            TokenKind::TypeMat3 => PrimitiveType::Mat3,
            TokenKind::TypeMat4 => PrimitiveType::Mat4,
            TokenKind::TypeBuffer => PrimitiveType::Buffer,
            TokenKind::TypeSampler2D => PrimitiveType::Sampler2D,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_type(self) -> bool {
        self.primitive_type().is_some()
    }

    /// Operator and punctuation kinds, the only ones that may be merged into
    /// multi-character operators
    pub fn is_symbol(self) -> bool {
        matches!(
            self,
            TokenKind::OpenParen
                | TokenKind::CloseParen
                | TokenKind::OpenBrace
                | TokenKind::CloseBrace
                | TokenKind::OpenBracket
                | TokenKind::CloseBracket
                | TokenKind::Comma
                | TokenKind::StatementEnd
                | TokenKind::Access
                | TokenKind::Assign
                | TokenKind::OpAdd
                | TokenKind::OpSubtract
                | TokenKind::OpMultiply
                | TokenKind::OpDivide
                | TokenKind::OpMod
                | TokenKind::OpEqual
                | TokenKind::OpNotEqual
                | TokenKind::OpLess
                | TokenKind::OpLessEqual
                | TokenKind::OpGreater
                | TokenKind::OpGreaterEqual
                | TokenKind::OpAnd
                | TokenKind::OpOr
                | TokenKind::OpNot
                | TokenKind::OpIncrement
                | TokenKind::OpDecrement
                | TokenKind::Ampersand
                | TokenKind::Pipe
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical spelling for keywords and operators, a description otherwise
        match self {
            TokenKind::StringLiteral => write!(f, "string literal"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Unknown => write!(f, "name or number"),
            TokenKind::Function => write!(f, "function header"),
            TokenKind::ReturnArity => write!(f, "return arity"),
            TokenKind::DeclarationCount => write!(f, "element count"),
            kind => match keyword_for(*kind) {
                Some(text) => write!(f, "'{}'", text),
                None => write!(f, "{:?}", kind),
            },
        }
    }
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("(", TokenKind::OpenParen),
    (")", TokenKind::CloseParen),
    ("{", TokenKind::OpenBrace),
    ("}", TokenKind::CloseBrace),
    ("[", TokenKind::OpenBracket),
    ("]", TokenKind::CloseBracket),
    (",", TokenKind::Comma),
    (";", TokenKind::StatementEnd),
    (".", TokenKind::Access),
    ("=", TokenKind::Assign),
    ("+", TokenKind::OpAdd),
    ("-", TokenKind::OpSubtract),
    ("*", TokenKind::OpMultiply),
    ("/", TokenKind::OpDivide),
    ("%", TokenKind::OpMod),
    ("==", TokenKind::OpEqual),
    ("!=", TokenKind::OpNotEqual),
    ("<", TokenKind::OpLess),
    ("<=", TokenKind::OpLessEqual),
    (">", TokenKind::OpGreater),
    (">=", TokenKind::OpGreaterEqual),
    ("&&", TokenKind::OpAnd),
    ("||", TokenKind::OpOr),
    ("!", TokenKind::OpNot),
    ("++", TokenKind::OpIncrement),
    ("--", TokenKind::OpDecrement),
    ("&", TokenKind::Ampersand),
    ("|", TokenKind::Pipe),
    ("vertex", TokenKind::VertexScope),
    ("@Vertex", TokenKind::VertexScope),
    ("fragment", TokenKind::FragmentScope),
    ("@Fragment", TokenKind::FragmentScope),
    ("layout", TokenKind::Layout),
    ("push_constant", TokenKind::PushConstant),
    ("include", TokenKind::Include),
    ("#define", TokenKind::Define),
    ("const", TokenKind::Const),
    ("struct", TokenKind::TypeStruct),
    ("in", TokenKind::DataIn),
    ("out", TokenKind::DataOut),
    ("readonly", TokenKind::ReadOnly),
    ("uniform", TokenKind::Uniform),
    ("return", TokenKind::Return),
    ("for", TokenKind::For),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("void", TokenKind::TypeVoid),
    ("bool", TokenKind::TypeBoolean),
    ("int", TokenKind::TypeInt),
    ("float", TokenKind::TypeFloat),
    ("vec2", TokenKind::TypeVec2f),
    ("float2", TokenKind::TypeVec2f),
    ("vec3", TokenKind::TypeVec3f),
    ("float3", TokenKind::TypeVec3f),
    ("vec4", TokenKind::TypeVec4f),
    ("float4", TokenKind::TypeVec4f),
    ("ivec2", TokenKind::TypeVec2i),
    ("int2", TokenKind::TypeVec2i),
    ("ivec3", TokenKind::TypeVec3i),
    ("int3", TokenKind::TypeVec3i),
    ("ivec4", TokenKind::TypeVec4i),
    ("int4", TokenKind::TypeVec4i),
    ("mat3", TokenKind::TypeMat3),
    ("mat4", TokenKind::TypeMat4),
    ("buffer", TokenKind::TypeBuffer),
    ("sampler2D", TokenKind::TypeSampler2D),
];

static KEYWORD_TABLE: OnceLock<FxHashMap<&'static str, TokenKind>> = OnceLock::new();

fn keyword_table() -> &'static FxHashMap<&'static str, TokenKind> {
    KEYWORD_TABLE.get_or_init(|| KEYWORDS.iter().copied().collect())
}

/// Look up the token kind spelled by `text`, if it is a keyword or operator
pub fn keyword_kind(text: &str) -> Option<TokenKind> {
    keyword_table().get(text).copied()
}

/// First spelling of a keyword kind (used for diagnostics)
pub fn keyword_for(kind: TokenKind) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(_, k)| *k == kind)
        .map(|(text, _)| *text)
}

/// Anything that can live in a [`TokenBuffer`](super::buffer::TokenBuffer)
pub trait Lexeme {
    fn kind(&self) -> TokenKind;
    fn text(&self) -> &str;
    fn location(&self) -> &SourceLocation;
}

/// A coarse lexeme from the raw lexer
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub text: String,
    pub location: SourceLocation,
}

impl RawToken {
    pub fn new(text: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            text: text.into(),
            location,
        }
    }
}

impl Lexeme for RawToken {
    fn kind(&self) -> TokenKind {
        if self.text.starts_with('\'') {
            return TokenKind::StringLiteral;
        }
        keyword_kind(&self.text).unwrap_or(TokenKind::Unknown)
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn location(&self) -> &SourceLocation {
        &self.location
    }
}

/// A typed token from the retokenizer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            location,
        }
    }

    /// Keep the raw token's text and location, with its looked-up kind
    pub fn from_raw(raw: RawToken) -> Self {
        let kind = raw.kind();
        Self::with_kind(kind, raw)
    }

    /// Keep the raw token's text and location under an explicit kind
    pub fn with_kind(kind: TokenKind, raw: RawToken) -> Self {
        Self {
            kind,
            lexeme: raw.text,
            location: raw.location,
        }
    }
}

impl Lexeme for Token {
    fn kind(&self) -> TokenKind {
        self.kind
    }

    fn text(&self) -> &str {
        &self.lexeme
    }

    fn location(&self) -> &SourceLocation {
        &self.location
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier | TokenKind::Unknown | TokenKind::StringLiteral => {
                write!(f, "{} '{}'", self.kind, self.lexeme)
            }
            TokenKind::Function | TokenKind::ReturnArity | TokenKind::DeclarationCount => {
                write!(f, "{} {}", self.kind, self.lexeme)
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}
