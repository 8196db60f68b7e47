/*!
# Graph reconstruction

Turns the flat raw arrays into a linked [`Ast`]:

1. allocation: one empty node per raw node, dispatched on its tag, and one
   empty scope per raw scope; indices line up one to one;
2. linking: every body field is read with a checked cast and every index is
   resolved against the fully allocated arena, so forward references work;
3. scope finalization: `prev`/`next`/`branch`/`ident`/`owner`;
4. root check: node 0 must be a `Program`.

Any failure aborts the whole build; a partial graph is never returned.
*/

mod body;

use serde::{Deserialize, Serialize};

use crate::ast_core::*;
use crate::core::errors::ReconstructError;
use crate::raw::{JsonAst, RawScope};
use body::BodyReader;

type Result<T> = std::result::Result<T, ReconstructError>;

/// Decoder knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Treat a body key that is absent (not `null`) as an error instead of
    /// reading it as null / empty / default.
    pub strict_fields: bool,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self { strict_fields: true }
    }
}

/// Reconstruct with default options.
pub fn ast2node(ast: &JsonAst) -> Result<Ast> {
    Reconstructor::new(DecodeOptions::default()).build(ast)
}

/// Configurable two-pass reconstructor.
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    options: DecodeOptions,
}

impl Reconstructor {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    pub fn build(&self, raw: &JsonAst) -> Result<Ast> {
        if raw.node.is_empty() {
            return Err(ReconstructError::MissingRoot);
        }

        // Проход 1: только аллокация, ни одна ссылка ещё не разрешается.
        let mut builder = AstBuilder::with_capacity(raw.node.len(), raw.scope.len());
        let mut types = Vec::with_capacity(raw.node.len());
        for (index, node) in raw.node.iter().enumerate() {
            let kind = node
                .node_type
                .parse::<NodeType>()
                .ok()
                .and_then(NodeKind::empty)
                .ok_or_else(|| ReconstructError::UnknownNodeType {
                    tag: node.node_type.clone(),
                    index,
                })?;
            types.push(kind.node_type());
            builder.push(node.loc, kind);
        }
        for _ in &raw.scope {
            builder.push_scope(Scope::default());
        }
        tracing::debug!("allocated {} nodes, {} scopes", types.len(), raw.scope.len());

        // Проход 2: связывание полей.
        for (index, node) in raw.node.iter().enumerate() {
            let reader = BodyReader::new(
                types[index].name(),
                index,
                &node.body,
                &types,
                raw.scope.len(),
                self.options.strict_fields,
            );
            if let Some(target) = builder.node_mut(NodeId(index as u32)) {
                link_node(&mut target.kind, &reader)?;
            }
        }
        tracing::debug!("linked {} nodes", types.len());

        for (index, scope) in raw.scope.iter().enumerate() {
            let linked = link_scope(index, scope, &types, raw.scope.len())?;
            if let Some(target) = builder.scope_mut(ScopeId(index as u32)) {
                *target = linked;
            }
        }
        tracing::debug!("linked {} scopes", raw.scope.len());

        builder.finish()
    }
}

fn link_scope(index: usize, raw: &RawScope, types: &[NodeType], scope_count: usize) -> Result<Scope> {
    let scope_ref = |field: &'static str, v: Option<u64>| -> Result<Option<ScopeId>> {
        v.map(|target| match usize::try_from(target) {
            Ok(i) if i < scope_count => Ok(ScopeId(i as u32)),
            _ => Err(ReconstructError::DanglingReference {
                owner: "Scope",
                field,
                index,
                target,
                len: scope_count,
            }),
        })
        .transpose()
    };
    let node_ref = |field: &'static str, target: u64, expect: Expect| -> Result<NodeId> {
        match usize::try_from(target) {
            Ok(i) if i < types.len() => {
                if types[i].satisfies(expect) {
                    Ok(NodeId(i as u32))
                } else {
                    Err(ReconstructError::TypeMismatch { owner: "Scope", field, index })
                }
            }
            _ => Err(ReconstructError::DanglingReference {
                owner: "Scope",
                field,
                index,
                target,
                len: types.len(),
            }),
        }
    };

    Ok(Scope {
        prev: scope_ref("prev", raw.prev)?,
        next: scope_ref("next", raw.next)?,
        branch: scope_ref("branch", raw.branch)?,
        ident: raw
            .ident
            .iter()
            .map(|&i| node_ref("ident", i, Expect::Kind(NodeType::Ident)))
            .collect::<Result<_>>()?,
        owner: raw.owner.map(|i| node_ref("owner", i, Expect::Node)).transpose()?,
        branch_root: raw.branch_root,
    })
}

const fn kind(ty: NodeType) -> Expect {
    Expect::Kind(ty)
}

/// Fill one allocated node from its body. Fields are read in schema order so
/// the first failing field is the one reported.
fn link_node(node: &mut NodeKind, r: &BodyReader<'_>) -> Result<()> {
    use NodeType as T;

    match node {
        NodeKind::Program(n) => {
            *n = Program {
                struct_type: r.node("struct_type", kind(T::StructType))?,
                elements: r.nodes("elements", Expect::Node)?,
                global_scope: r.scope("global_scope")?,
                metadata: r.nodes("metadata", kind(T::Metadata))?,
                endian: r.node("endian", kind(T::SpecifyOrder))?,
            }
        }
        NodeKind::Comment(n) => *n = Comment { comment: r.text("comment")? },
        NodeKind::CommentGroup(n) => {
            *n = CommentGroup { comments: r.nodes("comments", kind(T::Comment))? }
        }
        NodeKind::FieldArgument(n) => {
            *n = FieldArgument {
                raw_arguments: r.node("raw_arguments", Expect::EXPR)?,
                end_loc: r.loc("end_loc")?,
                collected_arguments: r.nodes("collected_arguments", Expect::EXPR)?,
                arguments: r.nodes("arguments", Expect::EXPR)?,
                assigns: r.nodes("assigns", kind(T::Binary))?,
                alignment: r.node("alignment", Expect::EXPR)?,
                alignment_value: r.opt_uint("alignment_value")?,
                sub_byte_length: r.node("sub_byte_length", Expect::EXPR)?,
                sub_byte_begin: r.node("sub_byte_begin", Expect::EXPR)?,
                peek: r.node("peek", Expect::EXPR)?,
                peek_value: r.opt_uint("peek_value")?,
                type_map: r.node("type_map", kind(T::TypeLiteral))?,
                metadata: r.nodes("metadata", kind(T::Metadata))?,
            }
        }

        NodeKind::Binary(n) => {
            *n = Binary {
                expr_base: r.expr_base()?,
                op: r.tag("op")?,
                left: r.node("left", Expect::EXPR)?,
                right: r.node("right", Expect::EXPR)?,
            }
        }
        NodeKind::Unary(n) => {
            *n = Unary {
                expr_base: r.expr_base()?,
                op: r.tag("op")?,
                expr: r.node("expr", Expect::EXPR)?,
            }
        }
        NodeKind::Cond(n) => {
            *n = Cond {
                expr_base: r.expr_base()?,
                cond: r.node("cond", Expect::EXPR)?,
                then: r.node("then", Expect::EXPR)?,
                els_loc: r.loc("els_loc")?,
                els: r.node("els", Expect::EXPR)?,
            }
        }
        NodeKind::Ident(n) => {
            *n = Ident {
                expr_base: r.expr_base()?,
                ident: r.text("ident")?,
                usage: r.tag("usage")?,
                base: r.node("base", Expect::Node)?,
                scope: r.scope("scope")?,
            }
        }
        NodeKind::Call(n) => {
            *n = Call {
                expr_base: r.expr_base()?,
                callee: r.node("callee", Expect::EXPR)?,
                raw_arguments: r.node("raw_arguments", Expect::EXPR)?,
                arguments: r.nodes("arguments", Expect::EXPR)?,
                end_loc: r.loc("end_loc")?,
            }
        }
        NodeKind::If(n) => {
            *n = If {
                expr_base: r.expr_base()?,
                struct_union_type: r.node("struct_union_type", kind(T::StructUnionType))?,
                cond_scope: r.scope("cond_scope")?,
                cond: r.node("cond", kind(T::Identity))?,
                then: r.node("then", kind(T::IndentBlock))?,
                els: r.node("els", Expect::Node)?,
            }
        }
        NodeKind::MemberAccess(n) => {
            *n = MemberAccess {
                expr_base: r.expr_base()?,
                target: r.node("target", Expect::EXPR)?,
                member: r.node("member", kind(T::Ident))?,
                base: r.node("base", kind(T::Ident))?,
            }
        }
        NodeKind::Paren(n) => {
            *n = Paren {
                expr_base: r.expr_base()?,
                expr: r.node("expr", Expect::EXPR)?,
                end_loc: r.loc("end_loc")?,
            }
        }
        NodeKind::Index(n) => {
            *n = Index {
                expr_base: r.expr_base()?,
                expr: r.node("expr", Expect::EXPR)?,
                index: r.node("index", Expect::EXPR)?,
                end_loc: r.loc("end_loc")?,
            }
        }
        NodeKind::Match(n) => {
            *n = Match {
                expr_base: r.expr_base()?,
                struct_union_type: r.node("struct_union_type", kind(T::StructUnionType))?,
                cond_scope: r.scope("cond_scope")?,
                cond: r.node("cond", kind(T::Identity))?,
                branch: r.nodes("branch", kind(T::MatchBranch))?,
                trial_match: r.flag("trial_match")?,
            }
        }
        NodeKind::Range(n) => {
            *n = Range {
                expr_base: r.expr_base()?,
                op: r.tag("op")?,
                start: r.node("start", Expect::EXPR)?,
                end: r.node("end", Expect::EXPR)?,
            }
        }
        NodeKind::Identity(n) => {
            *n = Identity { expr_base: r.expr_base()?, expr: r.node("expr", Expect::EXPR)? }
        }
        NodeKind::TmpVar(n) => {
            *n = TmpVar { expr_base: r.expr_base()?, tmp_var: r.uint("tmp_var")? }
        }
        NodeKind::Import(n) => {
            *n = Import {
                expr_base: r.expr_base()?,
                path: r.text("path")?,
                base: r.node("base", kind(T::Call))?,
                import_desc: r.node("import_desc", kind(T::Program))?,
            }
        }
        NodeKind::Cast(n) => {
            *n = Cast {
                expr_base: r.expr_base()?,
                base: r.node("base", kind(T::Call))?,
                arguments: r.nodes("arguments", Expect::EXPR)?,
            }
        }
        NodeKind::Available(n) => {
            *n = Available {
                expr_base: r.expr_base()?,
                base: r.node("base", kind(T::Call))?,
                target: r.node("target", Expect::EXPR)?,
            }
        }
        NodeKind::SpecifyOrder(n) => {
            *n = SpecifyOrder {
                expr_base: r.expr_base()?,
                base: r.node("base", kind(T::Binary))?,
                order_type: r.tag("order_type")?,
                order: r.node("order", Expect::EXPR)?,
                order_value: r.opt_uint("order_value")?,
            }
        }
        NodeKind::ExplicitError(n) => {
            *n = ExplicitError {
                expr_base: r.expr_base()?,
                base: r.node("base", kind(T::Call))?,
                message: r.node("message", kind(T::StrLiteral))?,
            }
        }
        NodeKind::IoOperation(n) => {
            *n = IoOperation {
                expr_base: r.expr_base()?,
                base: r.node("base", Expect::EXPR)?,
                method: r.tag("method")?,
                arguments: r.nodes("arguments", Expect::EXPR)?,
            }
        }
        NodeKind::OrCond(n) => {
            *n = OrCond {
                expr_base: r.expr_base()?,
                base: r.node("base", kind(T::Binary))?,
                conds: r.nodes("conds", Expect::EXPR)?,
            }
        }
        NodeKind::BadExpr(n) => {
            *n = BadExpr {
                expr_base: r.expr_base()?,
                content: r.text("content")?,
                bad_expr: r.node("bad_expr", Expect::EXPR)?,
            }
        }

        NodeKind::Loop(n) => {
            *n = Loop {
                cond_scope: r.scope("cond_scope")?,
                init: r.node("init", Expect::EXPR)?,
                cond: r.node("cond", Expect::EXPR)?,
                step: r.node("step", Expect::EXPR)?,
                body: r.node("body", kind(T::IndentBlock))?,
            }
        }
        NodeKind::IndentBlock(n) => {
            *n = IndentBlock {
                struct_type: r.node("struct_type", kind(T::StructType))?,
                elements: r.nodes("elements", Expect::Node)?,
                scope: r.scope("scope")?,
                metadata: r.nodes("metadata", kind(T::Metadata))?,
                type_map: r.node("type_map", kind(T::TypeLiteral))?,
                block_traits: r.tag("block_traits")?,
            }
        }
        NodeKind::ScopedStatement(n) => {
            *n = ScopedStatement {
                struct_type: r.node("struct_type", kind(T::StructType))?,
                statement: r.node("statement", Expect::Node)?,
                scope: r.scope("scope")?,
            }
        }
        NodeKind::MatchBranch(n) => {
            *n = MatchBranch {
                belong: r.node("belong", kind(T::Match))?,
                cond: r.node("cond", kind(T::Identity))?,
                sym_loc: r.loc("sym_loc")?,
                then: r.node("then", Expect::Node)?,
            }
        }
        NodeKind::UnionCandidate(n) => {
            *n = UnionCandidate {
                cond: r.node("cond", Expect::EXPR)?,
                field: r.node("field", kind(T::Field))?,
            }
        }
        NodeKind::Return(n) => {
            *n = Return {
                expr: r.node("expr", Expect::EXPR)?,
                related_function: r.node("related_function", kind(T::Function))?,
            }
        }
        NodeKind::Break(n) => *n = Break { related_loop: r.node("related_loop", kind(T::Loop))? },
        NodeKind::Continue(n) => {
            *n = Continue { related_loop: r.node("related_loop", kind(T::Loop))? }
        }
        NodeKind::Assert(n) => {
            *n = Assert {
                cond: r.node("cond", kind(T::Binary))?,
                is_io_related: r.flag("is_io_related")?,
            }
        }
        NodeKind::ImplicitYield(n) => *n = ImplicitYield { expr: r.node("expr", Expect::EXPR)? },
        NodeKind::Metadata(n) => {
            *n = Metadata {
                base: r.node("base", Expect::EXPR)?,
                name: r.text("name")?,
                values: r.nodes("values", Expect::EXPR)?,
            }
        }

        NodeKind::IntType(n) => {
            *n = IntType {
                type_base: r.type_base()?,
                endian: r.tag("endian")?,
                is_signed: r.flag("is_signed")?,
                is_common_supported: r.flag("is_common_supported")?,
            }
        }
        NodeKind::FloatType(n) => {
            *n = FloatType {
                type_base: r.type_base()?,
                endian: r.tag("endian")?,
                is_common_supported: r.flag("is_common_supported")?,
            }
        }
        NodeKind::IdentType(n) => {
            *n = IdentType {
                type_base: r.type_base()?,
                import_ref: r.node("import_ref", kind(T::MemberAccess))?,
                ident: r.node("ident", kind(T::Ident))?,
                base: r.node("base", Expect::TYPE)?,
            }
        }
        NodeKind::IntLiteralType(n) => {
            *n = IntLiteralType {
                type_base: r.type_base()?,
                base: r.node("base", kind(T::IntLiteral))?,
            }
        }
        NodeKind::StrLiteralType(n) => {
            *n = StrLiteralType {
                type_base: r.type_base()?,
                base: r.node("base", kind(T::StrLiteral))?,
                strong_ref: r.node("strong_ref", kind(T::StrLiteral))?,
            }
        }
        NodeKind::RegexLiteralType(n) => {
            *n = RegexLiteralType {
                type_base: r.type_base()?,
                base: r.node("base", kind(T::RegexLiteral))?,
                strong_ref: r.node("strong_ref", kind(T::RegexLiteral))?,
            }
        }
        NodeKind::VoidType(n) => *n = VoidType { type_base: r.type_base()? },
        NodeKind::BoolType(n) => *n = BoolType { type_base: r.type_base()? },
        NodeKind::MetaType(n) => *n = MetaType { type_base: r.type_base()? },
        NodeKind::ArrayType(n) => {
            *n = ArrayType {
                type_base: r.type_base()?,
                end_loc: r.loc("end_loc")?,
                element_type: r.node("element_type", Expect::TYPE)?,
                length: r.node("length", Expect::EXPR)?,
                length_value: r.opt_uint("length_value")?,
                is_bytes: r.flag("is_bytes")?,
            }
        }
        NodeKind::FunctionType(n) => {
            *n = FunctionType {
                type_base: r.type_base()?,
                return_type: r.node("return_type", Expect::TYPE)?,
                parameters: r.nodes("parameters", Expect::TYPE)?,
            }
        }
        NodeKind::StructType(n) => {
            *n = StructType {
                type_base: r.type_base()?,
                fields: r.nodes("fields", Expect::MEMBER)?,
                base: r.node("base", Expect::Node)?,
                recursive: r.flag("recursive")?,
                fixed_header_size: r.uint("fixed_header_size")?,
                fixed_tail_size: r.uint("fixed_tail_size")?,
            }
        }
        NodeKind::StructUnionType(n) => {
            *n = StructUnionType {
                type_base: r.type_base()?,
                cond: r.node("cond", Expect::EXPR)?,
                conds: r.nodes("conds", Expect::EXPR)?,
                structs: r.nodes("structs", kind(T::StructType))?,
                base: r.node("base", Expect::EXPR)?,
                union_fields: r.nodes("union_fields", kind(T::Field))?,
                exhaustive: r.flag("exhaustive")?,
            }
        }
        NodeKind::UnionType(n) => {
            *n = UnionType {
                type_base: r.type_base()?,
                cond: r.node("cond", Expect::EXPR)?,
                candidates: r.nodes("candidates", kind(T::UnionCandidate))?,
                base_type: r.node("base_type", kind(T::StructUnionType))?,
                common_type: r.node("common_type", Expect::TYPE)?,
                member_candidates: r.nodes("member_candidates", kind(T::Field))?,
            }
        }
        NodeKind::RangeType(n) => {
            *n = RangeType {
                type_base: r.type_base()?,
                base_type: r.node("base_type", Expect::TYPE)?,
                range: r.node("range", kind(T::Range))?,
            }
        }
        NodeKind::EnumType(n) => {
            *n = EnumType { type_base: r.type_base()?, base: r.node("base", kind(T::Enum))? }
        }
        NodeKind::OptionalType(n) => {
            *n = OptionalType {
                type_base: r.type_base()?,
                base_type: r.node("base_type", Expect::TYPE)?,
            }
        }
        NodeKind::GenericType(n) => {
            *n = GenericType {
                type_base: r.type_base()?,
                belong: r.node("belong", Expect::MEMBER)?,
            }
        }

        NodeKind::IntLiteral(n) => {
            *n = IntLiteral { expr_base: r.expr_base()?, value: r.text("value")? }
        }
        NodeKind::BoolLiteral(n) => {
            *n = BoolLiteral { expr_base: r.expr_base()?, value: r.flag("value")? }
        }
        NodeKind::StrLiteral(n) => {
            *n = StrLiteral {
                expr_base: r.expr_base()?,
                value: r.text("value")?,
                length: r.uint("length")?,
            }
        }
        NodeKind::RegexLiteral(n) => {
            *n = RegexLiteral { expr_base: r.expr_base()?, value: r.text("value")? }
        }
        NodeKind::CharLiteral(n) => {
            *n = CharLiteral {
                expr_base: r.expr_base()?,
                value: r.text("value")?,
                code: r.uint("code")?,
            }
        }
        NodeKind::TypeLiteral(n) => {
            *n = TypeLiteral {
                expr_base: r.expr_base()?,
                type_literal: r.node("type_literal", Expect::TYPE)?,
                end_loc: r.loc("end_loc")?,
            }
        }
        NodeKind::SpecialLiteral(n) => {
            *n = SpecialLiteral { expr_base: r.expr_base()?, kind: r.tag("kind")? }
        }

        NodeKind::Field(n) => {
            *n = Field {
                member_base: r.member_base()?,
                colon_loc: r.loc("colon_loc")?,
                is_state_variable: r.flag("is_state_variable")?,
                field_type: r.node("field_type", Expect::TYPE)?,
                arguments: r.node("arguments", kind(T::FieldArgument))?,
                offset_bit: r.opt_uint("offset_bit")?,
                offset_recent: r.uint("offset_recent")?,
                tail_offset_bit: r.opt_uint("tail_offset_bit")?,
                tail_offset_recent: r.uint("tail_offset_recent")?,
                bit_alignment: r.tag("bit_alignment")?,
                eventual_bit_alignment: r.tag("eventual_bit_alignment")?,
                follow: r.tag("follow")?,
                eventual_follow: r.tag("eventual_follow")?,
                next: r.node("next", kind(T::Field))?,
            }
        }
        NodeKind::Format(n) => {
            *n = Format {
                member_base: r.member_base()?,
                body: r.node("body", kind(T::IndentBlock))?,
                encode_fn: r.node("encode_fn", kind(T::Function))?,
                decode_fn: r.node("decode_fn", kind(T::Function))?,
                cast_fns: r.nodes("cast_fns", kind(T::Function))?,
                depends: r.nodes("depends", kind(T::IdentType))?,
                state_variables: r.nodes("state_variables", kind(T::Field))?,
            }
        }
        NodeKind::State(n) => {
            *n = State {
                member_base: r.member_base()?,
                body: r.node("body", kind(T::IndentBlock))?,
            }
        }
        NodeKind::Enum(n) => {
            *n = Enum {
                member_base: r.member_base()?,
                scope: r.scope("scope")?,
                colon_loc: r.loc("colon_loc")?,
                base_type: r.node("base_type", Expect::TYPE)?,
                members: r.nodes("members", kind(T::EnumMember))?,
                enum_type: r.node("enum_type", kind(T::EnumType))?,
            }
        }
        NodeKind::EnumMember(n) => {
            *n = EnumMember {
                member_base: r.member_base()?,
                raw_expr: r.node("raw_expr", Expect::EXPR)?,
                value: r.node("value", Expect::EXPR)?,
                str_literal: r.node("str_literal", kind(T::StrLiteral))?,
            }
        }
        NodeKind::Function(n) => {
            *n = Function {
                member_base: r.member_base()?,
                parameters: r.nodes("parameters", kind(T::Field))?,
                return_type: r.node("return_type", Expect::TYPE)?,
                body: r.node("body", kind(T::IndentBlock))?,
                func_type: r.node("func_type", kind(T::FunctionType))?,
                is_cast: r.flag("is_cast")?,
            }
        }
    }
    Ok(())
}
