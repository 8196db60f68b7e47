//! Node type tags and category membership.
//!
//! Тег в сыром payload совпадает с `as_str()`, в сообщениях об ошибках
//! используется Pascal-имя (`name()`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_node_types {
    ($($variant:ident => $tag:literal),* $(,)?) => {
        /// Every tag the front end can emit, abstract categories included.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum NodeType {
            $($variant),*
        }

        impl NodeType {
            pub const ALL: &'static [NodeType] = &[$(NodeType::$variant),*];

            /// Tag string as it appears in `RawNode.node_type`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(NodeType::$variant => $tag),*
                }
            }

            /// Pascal-case kind name, e.g. `MemberAccess`.
            pub fn name(self) -> &'static str {
                match self {
                    $(NodeType::$variant => stringify!($variant)),*
                }
            }
        }

        impl FromStr for NodeType {
            type Err = UnknownTag;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(NodeType::$variant),)*
                    _ => Err(UnknownTag(s.to_string())),
                }
            }
        }
    };
}

define_node_types! {
    Program => "program",
    Comment => "comment",
    CommentGroup => "comment_group",
    FieldArgument => "field_argument",
    Expr => "expr",
    Binary => "binary",
    Unary => "unary",
    Cond => "cond",
    Ident => "ident",
    Call => "call",
    If => "if",
    MemberAccess => "member_access",
    Paren => "paren",
    Index => "index",
    Match => "match",
    Range => "range",
    Identity => "identity",
    TmpVar => "tmp_var",
    Import => "import",
    Cast => "cast",
    Available => "available",
    SpecifyOrder => "specify_order",
    ExplicitError => "explicit_error",
    IoOperation => "io_operation",
    OrCond => "or_cond",
    BadExpr => "bad_expr",
    Stmt => "stmt",
    Loop => "loop",
    IndentBlock => "indent_block",
    ScopedStatement => "scoped_statement",
    MatchBranch => "match_branch",
    UnionCandidate => "union_candidate",
    Return => "return",
    Break => "break",
    Continue => "continue",
    Assert => "assert",
    ImplicitYield => "implicit_yield",
    Metadata => "metadata",
    Type => "type",
    IntType => "int_type",
    FloatType => "float_type",
    IdentType => "ident_type",
    IntLiteralType => "int_literal_type",
    StrLiteralType => "str_literal_type",
    RegexLiteralType => "regex_literal_type",
    VoidType => "void_type",
    BoolType => "bool_type",
    ArrayType => "array_type",
    FunctionType => "function_type",
    StructType => "struct_type",
    StructUnionType => "struct_union_type",
    UnionType => "union_type",
    RangeType => "range_type",
    EnumType => "enum_type",
    MetaType => "meta_type",
    OptionalType => "optional_type",
    GenericType => "generic_type",
    Literal => "literal",
    IntLiteral => "int_literal",
    BoolLiteral => "bool_literal",
    StrLiteral => "str_literal",
    RegexLiteral => "regex_literal",
    CharLiteral => "char_literal",
    TypeLiteral => "type_literal",
    SpecialLiteral => "special_literal",
    Member => "member",
    Field => "field",
    Format => "format",
    State => "state",
    Enum => "enum",
    EnumMember => "enum_member",
    Function => "function",
}

/// Tag string that names no node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTag(pub String);

impl fmt::Display for UnknownTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node type: {}", self.0)
    }
}

impl std::error::Error for UnknownTag {}

/// Abstract node categories. `Literal` is a sub-category of `Expr`,
/// `Member` of `Stmt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Expr,
    Stmt,
    Type,
    Literal,
    Member,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Expr => "Expr",
            Category::Stmt => "Stmt",
            Category::Type => "Type",
            Category::Literal => "Literal",
            Category::Member => "Member",
        }
    }
}

/// What a reference field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expect {
    /// Any node.
    Node,
    Category(Category),
    Kind(NodeType),
}

impl Expect {
    pub const EXPR: Expect = Expect::Category(Category::Expr);
    pub const STMT: Expect = Expect::Category(Category::Stmt);
    pub const TYPE: Expect = Expect::Category(Category::Type);
    pub const LITERAL: Expect = Expect::Category(Category::Literal);
    pub const MEMBER: Expect = Expect::Category(Category::Member);
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expect::Node => write!(f, "Node"),
            Expect::Category(c) => write!(f, "{}", c.name()),
            Expect::Kind(k) => write!(f, "{}", k.name()),
        }
    }
}

impl NodeType {
    /// Abstract tags are valid strings but never name an allocatable node.
    pub fn is_concrete(self) -> bool {
        !matches!(
            self,
            NodeType::Expr | NodeType::Stmt | NodeType::Type | NodeType::Literal | NodeType::Member
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            NodeType::Literal
                | NodeType::IntLiteral
                | NodeType::BoolLiteral
                | NodeType::StrLiteral
                | NodeType::RegexLiteral
                | NodeType::CharLiteral
                | NodeType::TypeLiteral
                | NodeType::SpecialLiteral
        )
    }

    pub fn is_expr(self) -> bool {
        self.is_literal()
            || matches!(
                self,
                NodeType::Expr
                    | NodeType::Binary
                    | NodeType::Unary
                    | NodeType::Cond
                    | NodeType::Ident
                    | NodeType::Call
                    | NodeType::If
                    | NodeType::MemberAccess
                    | NodeType::Paren
                    | NodeType::Index
                    | NodeType::Match
                    | NodeType::Range
                    | NodeType::Identity
                    | NodeType::TmpVar
                    | NodeType::Import
                    | NodeType::Cast
                    | NodeType::Available
                    | NodeType::SpecifyOrder
                    | NodeType::ExplicitError
                    | NodeType::IoOperation
                    | NodeType::OrCond
                    | NodeType::BadExpr
            )
    }

    pub fn is_member(self) -> bool {
        matches!(
            self,
            NodeType::Member
                | NodeType::Field
                | NodeType::Format
                | NodeType::State
                | NodeType::Enum
                | NodeType::EnumMember
                | NodeType::Function
        )
    }

    pub fn is_stmt(self) -> bool {
        self.is_member()
            || matches!(
                self,
                NodeType::Stmt
                    | NodeType::Loop
                    | NodeType::IndentBlock
                    | NodeType::ScopedStatement
                    | NodeType::MatchBranch
                    | NodeType::UnionCandidate
                    | NodeType::Return
                    | NodeType::Break
                    | NodeType::Continue
                    | NodeType::Assert
                    | NodeType::ImplicitYield
                    | NodeType::Metadata
            )
    }

    pub fn is_type(self) -> bool {
        matches!(
            self,
            NodeType::Type
                | NodeType::IntType
                | NodeType::FloatType
                | NodeType::IdentType
                | NodeType::IntLiteralType
                | NodeType::StrLiteralType
                | NodeType::RegexLiteralType
                | NodeType::VoidType
                | NodeType::BoolType
                | NodeType::ArrayType
                | NodeType::FunctionType
                | NodeType::StructType
                | NodeType::StructUnionType
                | NodeType::UnionType
                | NodeType::RangeType
                | NodeType::EnumType
                | NodeType::MetaType
                | NodeType::OptionalType
                | NodeType::GenericType
        )
    }

    pub fn in_category(self, category: Category) -> bool {
        match category {
            Category::Expr => self.is_expr(),
            Category::Stmt => self.is_stmt(),
            Category::Type => self.is_type(),
            Category::Literal => self.is_literal(),
            Category::Member => self.is_member(),
        }
    }

    /// Whether a node of this type may be stored in a field expecting `expect`.
    pub fn satisfies(self, expect: Expect) -> bool {
        match expect {
            Expect::Node => true,
            Expect::Category(c) => self.in_category(c),
            Expect::Kind(k) => self == k,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for ty in NodeType::ALL {
            assert_eq!(ty.as_str().parse::<NodeType>(), Ok(*ty));
            let json = serde_json::to_string(ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
        }
        assert_eq!(NodeType::ALL.len(), 72);
        assert_eq!(NodeType::ALL.iter().filter(|t| t.is_concrete()).count(), 67);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "not_a_real_kind".parse::<NodeType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown node type: not_a_real_kind");
    }

    #[test]
    fn categories_nest() {
        assert!(NodeType::IntLiteral.is_expr());
        assert!(NodeType::IntLiteral.is_literal());
        assert!(NodeType::Field.is_stmt());
        assert!(NodeType::Field.is_member());
        assert!(!NodeType::Format.is_expr());
        assert!(!NodeType::Program.is_stmt());
        assert!(NodeType::StructType.satisfies(Expect::TYPE));
        assert!(NodeType::StructType.satisfies(Expect::Kind(NodeType::StructType)));
        assert!(!NodeType::UnionType.satisfies(Expect::Kind(NodeType::StructType)));
        assert!(NodeType::Comment.satisfies(Expect::Node));
    }

    #[test]
    fn every_concrete_kind_except_roots_has_a_category() {
        for ty in NodeType::ALL.iter().filter(|t| t.is_concrete()) {
            let categorized = ty.is_expr() || ty.is_stmt() || ty.is_type();
            let standalone = matches!(
                ty,
                NodeType::Program | NodeType::Comment | NodeType::CommentGroup | NodeType::FieldArgument
            );
            assert!(categorized != standalone, "{}", ty);
        }
    }
}
