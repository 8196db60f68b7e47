//! Concrete node structs and the closed [`NodeKind`] sum over them.
//!
//! Reference fields hold [`NodeId`]/[`ScopeId`] handles into the owning
//! [`super::Ast`]; no node owns another.

use super::enums::*;
use super::kind::NodeType;
use super::{NodeId, ScopeId};
use crate::core::position::Loc;

/// Fields shared by every expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExprBase {
    pub expr_type: Option<NodeId>,
    pub constant_level: ConstantLevel,
}

/// Fields shared by every type node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeBase {
    pub is_explicit: bool,
    pub non_dynamic_allocation: bool,
    pub bit_alignment: BitAlignment,
    pub bit_size: Option<u64>,
}

/// Fields shared by every declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberBase {
    pub belong: Option<NodeId>,
    pub belong_struct: Option<NodeId>,
    pub ident: Option<NodeId>,
}

// --- root and standalone ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub struct_type: Option<NodeId>,
    pub elements: Vec<NodeId>,
    pub global_scope: Option<ScopeId>,
    pub metadata: Vec<NodeId>,
    pub endian: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentGroup {
    pub comments: Vec<NodeId>,
}

/// Bracketed arguments of a field: `x :u8(align: 8, peek: true)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldArgument {
    pub raw_arguments: Option<NodeId>,
    pub end_loc: Loc,
    pub collected_arguments: Vec<NodeId>,
    pub arguments: Vec<NodeId>,
    pub assigns: Vec<NodeId>,
    pub alignment: Option<NodeId>,
    pub alignment_value: Option<u64>,
    pub sub_byte_length: Option<NodeId>,
    pub sub_byte_begin: Option<NodeId>,
    pub peek: Option<NodeId>,
    pub peek_value: Option<u64>,
    pub type_map: Option<NodeId>,
    pub metadata: Vec<NodeId>,
}

// --- expressions ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binary {
    pub expr_base: ExprBase,
    pub op: BinaryOp,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unary {
    pub expr_base: ExprBase,
    pub op: UnaryOp,
    pub expr: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cond {
    pub expr_base: ExprBase,
    pub cond: Option<NodeId>,
    pub then: Option<NodeId>,
    pub els_loc: Loc,
    pub els: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ident {
    pub expr_base: ExprBase,
    pub ident: String,
    pub usage: IdentUsage,
    /// The node this identifier resolves to or defines.
    pub base: Option<NodeId>,
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Call {
    pub expr_base: ExprBase,
    pub callee: Option<NodeId>,
    pub raw_arguments: Option<NodeId>,
    pub arguments: Vec<NodeId>,
    pub end_loc: Loc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct If {
    pub expr_base: ExprBase,
    pub struct_union_type: Option<NodeId>,
    pub cond_scope: Option<ScopeId>,
    pub cond: Option<NodeId>,
    pub then: Option<NodeId>,
    pub els: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberAccess {
    pub expr_base: ExprBase,
    pub target: Option<NodeId>,
    pub member: Option<NodeId>,
    pub base: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paren {
    pub expr_base: ExprBase,
    pub expr: Option<NodeId>,
    pub end_loc: Loc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    pub expr_base: ExprBase,
    pub expr: Option<NodeId>,
    pub index: Option<NodeId>,
    pub end_loc: Loc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Match {
    pub expr_base: ExprBase,
    pub struct_union_type: Option<NodeId>,
    pub cond_scope: Option<ScopeId>,
    pub cond: Option<NodeId>,
    pub branch: Vec<NodeId>,
    pub trial_match: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    pub expr_base: ExprBase,
    pub op: BinaryOp,
    pub start: Option<NodeId>,
    pub end: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    pub expr_base: ExprBase,
    pub expr: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TmpVar {
    pub expr_base: ExprBase,
    pub tmp_var: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Import {
    pub expr_base: ExprBase,
    pub path: String,
    pub base: Option<NodeId>,
    pub import_desc: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cast {
    pub expr_base: ExprBase,
    pub base: Option<NodeId>,
    pub arguments: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Available {
    pub expr_base: ExprBase,
    pub base: Option<NodeId>,
    pub target: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecifyOrder {
    pub expr_base: ExprBase,
    pub base: Option<NodeId>,
    pub order_type: OrderType,
    pub order: Option<NodeId>,
    pub order_value: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplicitError {
    pub expr_base: ExprBase,
    pub base: Option<NodeId>,
    pub message: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IoOperation {
    pub expr_base: ExprBase,
    pub base: Option<NodeId>,
    pub method: IoMethod,
    pub arguments: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrCond {
    pub expr_base: ExprBase,
    pub base: Option<NodeId>,
    pub conds: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BadExpr {
    pub expr_base: ExprBase,
    pub content: String,
    pub bad_expr: Option<NodeId>,
}

// --- statements ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loop {
    pub cond_scope: Option<ScopeId>,
    pub init: Option<NodeId>,
    pub cond: Option<NodeId>,
    pub step: Option<NodeId>,
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndentBlock {
    pub struct_type: Option<NodeId>,
    pub elements: Vec<NodeId>,
    pub scope: Option<ScopeId>,
    pub metadata: Vec<NodeId>,
    pub type_map: Option<NodeId>,
    pub block_traits: BlockTrait,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopedStatement {
    pub struct_type: Option<NodeId>,
    pub statement: Option<NodeId>,
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchBranch {
    pub belong: Option<NodeId>,
    pub cond: Option<NodeId>,
    pub sym_loc: Loc,
    pub then: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnionCandidate {
    pub cond: Option<NodeId>,
    pub field: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Return {
    pub expr: Option<NodeId>,
    pub related_function: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Break {
    pub related_loop: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Continue {
    pub related_loop: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assert {
    pub cond: Option<NodeId>,
    pub is_io_related: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImplicitYield {
    pub expr: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub base: Option<NodeId>,
    pub name: String,
    pub values: Vec<NodeId>,
}

// --- types ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntType {
    pub type_base: TypeBase,
    pub endian: Endian,
    pub is_signed: bool,
    pub is_common_supported: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatType {
    pub type_base: TypeBase,
    pub endian: Endian,
    pub is_common_supported: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentType {
    pub type_base: TypeBase,
    pub import_ref: Option<NodeId>,
    pub ident: Option<NodeId>,
    pub base: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntLiteralType {
    pub type_base: TypeBase,
    pub base: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrLiteralType {
    pub type_base: TypeBase,
    pub base: Option<NodeId>,
    pub strong_ref: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegexLiteralType {
    pub type_base: TypeBase,
    pub base: Option<NodeId>,
    pub strong_ref: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoidType {
    pub type_base: TypeBase,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolType {
    pub type_base: TypeBase,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayType {
    pub type_base: TypeBase,
    pub end_loc: Loc,
    pub element_type: Option<NodeId>,
    pub length: Option<NodeId>,
    pub length_value: Option<u64>,
    pub is_bytes: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionType {
    pub type_base: TypeBase,
    pub return_type: Option<NodeId>,
    pub parameters: Vec<NodeId>,
}

/// Layout of a format body. `fields` is in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructType {
    pub type_base: TypeBase,
    pub fields: Vec<NodeId>,
    pub base: Option<NodeId>,
    pub recursive: bool,
    pub fixed_header_size: u64,
    pub fixed_tail_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructUnionType {
    pub type_base: TypeBase,
    pub cond: Option<NodeId>,
    pub conds: Vec<NodeId>,
    pub structs: Vec<NodeId>,
    pub base: Option<NodeId>,
    pub union_fields: Vec<NodeId>,
    pub exhaustive: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnionType {
    pub type_base: TypeBase,
    pub cond: Option<NodeId>,
    pub candidates: Vec<NodeId>,
    pub base_type: Option<NodeId>,
    pub common_type: Option<NodeId>,
    pub member_candidates: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeType {
    pub type_base: TypeBase,
    pub base_type: Option<NodeId>,
    pub range: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumType {
    pub type_base: TypeBase,
    pub base: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaType {
    pub type_base: TypeBase,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionalType {
    pub type_base: TypeBase,
    pub base_type: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericType {
    pub type_base: TypeBase,
    pub belong: Option<NodeId>,
}

// --- literals ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntLiteral {
    pub expr_base: ExprBase,
    /// Source spelling; may exceed 64 bits.
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolLiteral {
    pub expr_base: ExprBase,
    pub value: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrLiteral {
    pub expr_base: ExprBase,
    pub value: String,
    pub length: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegexLiteral {
    pub expr_base: ExprBase,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharLiteral {
    pub expr_base: ExprBase,
    pub value: String,
    pub code: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeLiteral {
    pub expr_base: ExprBase,
    pub type_literal: Option<NodeId>,
    pub end_loc: Loc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialLiteral {
    pub expr_base: ExprBase,
    pub kind: SpecialLiteralKind,
}

// --- members ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Field {
    pub member_base: MemberBase,
    pub colon_loc: Loc,
    pub is_state_variable: bool,
    pub field_type: Option<NodeId>,
    pub arguments: Option<NodeId>,
    pub offset_bit: Option<u64>,
    pub offset_recent: u64,
    pub tail_offset_bit: Option<u64>,
    pub tail_offset_recent: u64,
    pub bit_alignment: BitAlignment,
    pub eventual_bit_alignment: BitAlignment,
    pub follow: Follow,
    pub eventual_follow: Follow,
    pub next: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Format {
    pub member_base: MemberBase,
    pub body: Option<NodeId>,
    pub encode_fn: Option<NodeId>,
    pub decode_fn: Option<NodeId>,
    pub cast_fns: Vec<NodeId>,
    pub depends: Vec<NodeId>,
    pub state_variables: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub member_base: MemberBase,
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enum {
    pub member_base: MemberBase,
    pub scope: Option<ScopeId>,
    pub colon_loc: Loc,
    pub base_type: Option<NodeId>,
    pub members: Vec<NodeId>,
    pub enum_type: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumMember {
    pub member_base: MemberBase,
    pub raw_expr: Option<NodeId>,
    pub value: Option<NodeId>,
    pub str_literal: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Function {
    pub member_base: MemberBase,
    pub parameters: Vec<NodeId>,
    pub return_type: Option<NodeId>,
    pub body: Option<NodeId>,
    pub func_type: Option<NodeId>,
    pub is_cast: bool,
}

/// Typed access to one concrete variant of [`NodeKind`].
pub trait NodeVariant: Sized {
    const NODE_TYPE: NodeType;

    fn from_kind(kind: &NodeKind) -> Option<&Self>;
}

macro_rules! node_kinds {
    ($($variant:ident),* $(,)?) => {
        /// Closed sum of every allocatable node kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum NodeKind {
            $($variant($variant)),*
        }

        impl NodeKind {
            pub fn node_type(&self) -> NodeType {
                match self {
                    $(NodeKind::$variant(_) => NodeType::$variant),*
                }
            }

            /// An empty instance for a tag, or `None` for abstract category tags.
            pub fn empty(ty: NodeType) -> Option<NodeKind> {
                match ty {
                    NodeType::Expr
                    | NodeType::Stmt
                    | NodeType::Type
                    | NodeType::Literal
                    | NodeType::Member => None,
                    $(NodeType::$variant => Some(NodeKind::$variant($variant::default()))),*
                }
            }
        }

        $(
            impl NodeVariant for $variant {
                const NODE_TYPE: NodeType = NodeType::$variant;

                fn from_kind(kind: &NodeKind) -> Option<&Self> {
                    match kind {
                        NodeKind::$variant(n) => Some(n),
                        _ => None,
                    }
                }
            }

            impl From<$variant> for NodeKind {
                fn from(n: $variant) -> Self {
                    NodeKind::$variant(n)
                }
            }
        )*
    };
}

node_kinds! {
    Program, Comment, CommentGroup, FieldArgument,
    Binary, Unary, Cond, Ident, Call, If, MemberAccess, Paren, Index, Match, Range,
    Identity, TmpVar, Import, Cast, Available, SpecifyOrder, ExplicitError,
    IoOperation, OrCond, BadExpr,
    Loop, IndentBlock, ScopedStatement, MatchBranch, UnionCandidate, Return, Break,
    Continue, Assert, ImplicitYield, Metadata,
    IntType, FloatType, IdentType, IntLiteralType, StrLiteralType, RegexLiteralType,
    VoidType, BoolType, ArrayType, FunctionType, StructType, StructUnionType,
    UnionType, RangeType, EnumType, MetaType, OptionalType, GenericType,
    IntLiteral, BoolLiteral, StrLiteral, RegexLiteral, CharLiteral, TypeLiteral,
    SpecialLiteral,
    Field, Format, State, Enum, EnumMember, Function,
}

impl NodeKind {
    pub fn expr_base(&self) -> Option<&ExprBase> {
        match self {
            NodeKind::Binary(n) => Some(&n.expr_base),
            NodeKind::Unary(n) => Some(&n.expr_base),
            NodeKind::Cond(n) => Some(&n.expr_base),
            NodeKind::Ident(n) => Some(&n.expr_base),
            NodeKind::Call(n) => Some(&n.expr_base),
            NodeKind::If(n) => Some(&n.expr_base),
            NodeKind::MemberAccess(n) => Some(&n.expr_base),
            NodeKind::Paren(n) => Some(&n.expr_base),
            NodeKind::Index(n) => Some(&n.expr_base),
            NodeKind::Match(n) => Some(&n.expr_base),
            NodeKind::Range(n) => Some(&n.expr_base),
            NodeKind::Identity(n) => Some(&n.expr_base),
            NodeKind::TmpVar(n) => Some(&n.expr_base),
            NodeKind::Import(n) => Some(&n.expr_base),
            NodeKind::Cast(n) => Some(&n.expr_base),
            NodeKind::Available(n) => Some(&n.expr_base),
            NodeKind::SpecifyOrder(n) => Some(&n.expr_base),
            NodeKind::ExplicitError(n) => Some(&n.expr_base),
            NodeKind::IoOperation(n) => Some(&n.expr_base),
            NodeKind::OrCond(n) => Some(&n.expr_base),
            NodeKind::BadExpr(n) => Some(&n.expr_base),
            NodeKind::IntLiteral(n) => Some(&n.expr_base),
            NodeKind::BoolLiteral(n) => Some(&n.expr_base),
            NodeKind::StrLiteral(n) => Some(&n.expr_base),
            NodeKind::RegexLiteral(n) => Some(&n.expr_base),
            NodeKind::CharLiteral(n) => Some(&n.expr_base),
            NodeKind::TypeLiteral(n) => Some(&n.expr_base),
            NodeKind::SpecialLiteral(n) => Some(&n.expr_base),
            _ => None,
        }
    }

    pub fn type_base(&self) -> Option<&TypeBase> {
        match self {
            NodeKind::IntType(n) => Some(&n.type_base),
            NodeKind::FloatType(n) => Some(&n.type_base),
            NodeKind::IdentType(n) => Some(&n.type_base),
            NodeKind::IntLiteralType(n) => Some(&n.type_base),
            NodeKind::StrLiteralType(n) => Some(&n.type_base),
            NodeKind::RegexLiteralType(n) => Some(&n.type_base),
            NodeKind::VoidType(n) => Some(&n.type_base),
            NodeKind::BoolType(n) => Some(&n.type_base),
            NodeKind::ArrayType(n) => Some(&n.type_base),
            NodeKind::FunctionType(n) => Some(&n.type_base),
            NodeKind::StructType(n) => Some(&n.type_base),
            NodeKind::StructUnionType(n) => Some(&n.type_base),
            NodeKind::UnionType(n) => Some(&n.type_base),
            NodeKind::RangeType(n) => Some(&n.type_base),
            NodeKind::EnumType(n) => Some(&n.type_base),
            NodeKind::MetaType(n) => Some(&n.type_base),
            NodeKind::OptionalType(n) => Some(&n.type_base),
            NodeKind::GenericType(n) => Some(&n.type_base),
            _ => None,
        }
    }

    pub fn member_base(&self) -> Option<&MemberBase> {
        match self {
            NodeKind::Field(n) => Some(&n.member_base),
            NodeKind::Format(n) => Some(&n.member_base),
            NodeKind::State(n) => Some(&n.member_base),
            NodeKind::Enum(n) => Some(&n.member_base),
            NodeKind::EnumMember(n) => Some(&n.member_base),
            NodeKind::Function(n) => Some(&n.member_base),
            _ => None,
        }
    }
}
