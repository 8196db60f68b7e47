/*!
# Tree walking

Generic traversal over the node-to-node child relation. Each kind has a
fixed child order: `expr_type` first for expressions, then operands left to
right, then auxiliary lists, then nested blocks. Scope links and back links
(`Ident.base`, `Field.next`, `belong`, ...) are not children, so the child
relation is acyclic and no cycle guard is needed.

The canonical API is [`walk`]: visit a node, then its children, stopping as
soon as the visitor asks to.
*/

use crate::ast_core::*;

/// Контроль обхода.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    Continue,
    /// Do not descend into this node's children; siblings are still visited.
    SkipChildren,
    /// Abort the whole traversal.
    Stop,
}

/// Visitor API (enter/leave). `enter` decides whether to descend.
pub trait Visitor {
    fn enter(&mut self, _ast: &Ast, _id: NodeId, _node: &Node) -> VisitControl {
        VisitControl::Continue
    }

    /// Called after all children were visited; not called when aborted.
    fn leave(&mut self, _ast: &Ast, _id: NodeId, _node: &Node) {}
}

/// Walk `root` and its descendants. Returns `true` if not aborted.
pub fn walk<V: Visitor + ?Sized>(ast: &Ast, root: NodeId, visitor: &mut V) -> bool {
    fn inner<V: Visitor + ?Sized>(ast: &Ast, id: NodeId, vis: &mut V) -> bool {
        let node = ast.node(id);
        match vis.enter(ast, id, node) {
            VisitControl::Continue => {
                if !for_each_child(node, |c| inner(ast, c, vis)) {
                    return false;
                }
            }
            VisitControl::SkipChildren => {}
            VisitControl::Stop => return false,
        }
        vis.leave(ast, id, node);
        true
    }
    inner(ast, root, visitor)
}

struct FnVisitor<F>(F);

impl<F: FnMut(NodeId, &Node) -> bool> Visitor for FnVisitor<F> {
    fn enter(&mut self, _ast: &Ast, id: NodeId, node: &Node) -> VisitControl {
        if (self.0)(id, node) {
            VisitControl::Continue
        } else {
            VisitControl::Stop
        }
    }
}

/// Closure form of [`walk`]: return `false` to stop.
pub fn walk_fn<F>(ast: &Ast, root: NodeId, f: F) -> bool
where
    F: FnMut(NodeId, &Node) -> bool,
{
    walk(ast, root, &mut FnVisitor(f))
}

/// Node ids in visit order.
pub fn preorder(ast: &Ast, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    walk_fn(ast, root, |id, _| {
        out.push(id);
        true
    });
    out
}

/// Call `f` on every node after its children.
pub fn postorder_traverse<F>(ast: &Ast, root: NodeId, mut f: F)
where
    F: FnMut(NodeId, &Node),
{
    struct Post<F>(F);
    impl<F: FnMut(NodeId, &Node)> Visitor for Post<F> {
        fn leave(&mut self, _ast: &Ast, id: NodeId, node: &Node) {
            (self.0)(id, node)
        }
    }
    walk(ast, root, &mut Post(&mut f));
}

/// Direct children of `id` in walk order.
pub fn children(ast: &Ast, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    for_each_child(ast.node(id), |c| {
        out.push(c);
        true
    });
    out
}

fn one<F: FnMut(NodeId) -> bool>(id: Option<NodeId>, f: &mut F) -> bool {
    id.map_or(true, |id| f(id))
}

fn all<F: FnMut(NodeId) -> bool>(ids: &[NodeId], f: &mut F) -> bool {
    ids.iter().all(|&id| f(id))
}

/// Feed each child of `node` to `f` in walk order; stops and returns `false`
/// as soon as `f` does.
pub fn for_each_child<F: FnMut(NodeId) -> bool>(node: &Node, mut f: F) -> bool {
    let f = &mut f;
    match &node.kind {
        NodeKind::Program(n) => one(n.struct_type, f) && all(&n.elements, f),
        NodeKind::Comment(_) => true,
        NodeKind::CommentGroup(n) => all(&n.comments, f),
        NodeKind::FieldArgument(n) => {
            one(n.raw_arguments, f)
                && all(&n.arguments, f)
                && all(&n.assigns, f)
                && one(n.alignment, f)
                && one(n.sub_byte_length, f)
                && one(n.sub_byte_begin, f)
                && one(n.peek, f)
                && one(n.type_map, f)
                && all(&n.metadata, f)
        }

        NodeKind::Binary(n) => one(n.expr_base.expr_type, f) && one(n.left, f) && one(n.right, f),
        NodeKind::Unary(n) => one(n.expr_base.expr_type, f) && one(n.expr, f),
        NodeKind::Cond(n) => {
            one(n.expr_base.expr_type, f) && one(n.cond, f) && one(n.then, f) && one(n.els, f)
        }
        NodeKind::Ident(n) => one(n.expr_base.expr_type, f),
        NodeKind::Call(n) => {
            one(n.expr_base.expr_type, f)
                && one(n.callee, f)
                && one(n.raw_arguments, f)
                && all(&n.arguments, f)
        }
        NodeKind::If(n) => {
            one(n.expr_base.expr_type, f)
                && one(n.struct_union_type, f)
                && one(n.cond, f)
                && one(n.then, f)
                && one(n.els, f)
        }
        NodeKind::MemberAccess(n) => {
            one(n.expr_base.expr_type, f) && one(n.target, f) && one(n.member, f)
        }
        NodeKind::Paren(n) => one(n.expr_base.expr_type, f) && one(n.expr, f),
        NodeKind::Index(n) => one(n.expr_base.expr_type, f) && one(n.expr, f) && one(n.index, f),
        NodeKind::Match(n) => {
            one(n.expr_base.expr_type, f)
                && one(n.struct_union_type, f)
                && one(n.cond, f)
                && all(&n.branch, f)
        }
        NodeKind::Range(n) => one(n.expr_base.expr_type, f) && one(n.start, f) && one(n.end, f),
        NodeKind::Identity(n) => one(n.expr_base.expr_type, f) && one(n.expr, f),
        NodeKind::TmpVar(n) => one(n.expr_base.expr_type, f),
        NodeKind::Import(n) => {
            one(n.expr_base.expr_type, f) && one(n.base, f) && one(n.import_desc, f)
        }
        NodeKind::Cast(n) => one(n.expr_base.expr_type, f) && one(n.base, f) && all(&n.arguments, f),
        NodeKind::Available(n) => one(n.expr_base.expr_type, f) && one(n.base, f) && one(n.target, f),
        NodeKind::SpecifyOrder(n) => {
            one(n.expr_base.expr_type, f) && one(n.base, f) && one(n.order, f)
        }
        NodeKind::ExplicitError(n) => {
            one(n.expr_base.expr_type, f) && one(n.base, f) && one(n.message, f)
        }
        NodeKind::IoOperation(n) => {
            one(n.expr_base.expr_type, f) && one(n.base, f) && all(&n.arguments, f)
        }
        NodeKind::OrCond(n) => one(n.expr_base.expr_type, f) && one(n.base, f) && all(&n.conds, f),
        NodeKind::BadExpr(n) => one(n.expr_base.expr_type, f) && one(n.bad_expr, f),

        NodeKind::Loop(n) => one(n.init, f) && one(n.cond, f) && one(n.step, f) && one(n.body, f),
        NodeKind::IndentBlock(n) => {
            one(n.struct_type, f) && all(&n.elements, f) && one(n.type_map, f)
        }
        NodeKind::ScopedStatement(n) => one(n.struct_type, f) && one(n.statement, f),
        NodeKind::MatchBranch(n) => one(n.cond, f) && one(n.then, f),
        NodeKind::UnionCandidate(_) => true,
        NodeKind::Return(n) => one(n.expr, f),
        NodeKind::Break(_) | NodeKind::Continue(_) => true,
        NodeKind::Assert(n) => one(n.cond, f),
        NodeKind::ImplicitYield(n) => one(n.expr, f),
        NodeKind::Metadata(n) => one(n.base, f) && all(&n.values, f),

        NodeKind::IntType(_)
        | NodeKind::FloatType(_)
        | NodeKind::IntLiteralType(_)
        | NodeKind::VoidType(_)
        | NodeKind::BoolType(_)
        | NodeKind::MetaType(_)
        | NodeKind::EnumType(_)
        | NodeKind::GenericType(_) => true,
        NodeKind::IdentType(n) => one(n.import_ref, f) && one(n.ident, f),
        NodeKind::StrLiteralType(n) => one(n.strong_ref, f),
        NodeKind::RegexLiteralType(n) => one(n.strong_ref, f),
        NodeKind::ArrayType(n) => one(n.element_type, f) && one(n.length, f),
        NodeKind::FunctionType(n) => one(n.return_type, f) && all(&n.parameters, f),
        NodeKind::StructType(n) => all(&n.fields, f),
        NodeKind::StructUnionType(n) => {
            one(n.cond, f) && all(&n.conds, f) && all(&n.structs, f)
        }
        NodeKind::UnionType(n) => {
            all(&n.candidates, f) && one(n.common_type, f) && all(&n.member_candidates, f)
        }
        NodeKind::RangeType(n) => one(n.base_type, f),
        NodeKind::OptionalType(n) => one(n.base_type, f),

        NodeKind::IntLiteral(n) => one(n.expr_base.expr_type, f),
        NodeKind::BoolLiteral(n) => one(n.expr_base.expr_type, f),
        NodeKind::StrLiteral(n) => one(n.expr_base.expr_type, f),
        NodeKind::RegexLiteral(n) => one(n.expr_base.expr_type, f),
        NodeKind::CharLiteral(n) => one(n.expr_base.expr_type, f),
        NodeKind::TypeLiteral(n) => one(n.expr_base.expr_type, f) && one(n.type_literal, f),
        NodeKind::SpecialLiteral(n) => one(n.expr_base.expr_type, f),

        NodeKind::Field(n) => {
            one(n.member_base.ident, f) && one(n.field_type, f) && one(n.arguments, f)
        }
        NodeKind::Format(n) => one(n.member_base.ident, f) && one(n.body, f),
        NodeKind::State(n) => one(n.member_base.ident, f) && one(n.body, f),
        NodeKind::Enum(n) => {
            one(n.member_base.ident, f)
                && one(n.base_type, f)
                && all(&n.members, f)
                && one(n.enum_type, f)
        }
        NodeKind::EnumMember(n) => {
            one(n.member_base.ident, f)
                && one(n.raw_expr, f)
                && one(n.value, f)
                && one(n.str_literal, f)
        }
        NodeKind::Function(n) => {
            one(n.member_base.ident, f)
                && all(&n.parameters, f)
                && one(n.return_type, f)
                && one(n.body, f)
                && one(n.func_type, f)
        }
    }
}
