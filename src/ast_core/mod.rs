/*!
# AST core

Arena of linked nodes and scopes. Every cross reference is a [`NodeId`] or
[`ScopeId`] handle into one [`Ast`], which is the sole owner; back links
(`Ident.base`, `Scope.owner`, `Field.next`) are plain handles and may form
cycles. Once built an `Ast` is never mutated, so it can be shared across
threads by reference.
*/

use serde::Serialize;
use std::fmt;

use crate::core::errors::ReconstructError;
use crate::core::position::Loc;
use crate::walk::for_each_child;

pub mod enums;
pub mod kind;
pub mod nodes;
pub mod scope;

pub use enums::*;
pub use kind::{Category, Expect, NodeType, UnknownTag};
pub use nodes::*;
pub use scope::Scope;

/// Устойчивый идентификатор узла: индекс в массиве сырых узлов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Идентификатор scope: индекс в массиве сырых scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Узел: позиция в исходнике плюс конкретный вариант.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub loc: Loc,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(loc: Loc, kind: impl Into<NodeKind>) -> Self {
        Self { loc, kind: kind.into() }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn get<T: NodeVariant>(&self) -> Option<&T> {
        T::from_kind(&self.kind)
    }

    pub fn expr_base(&self) -> Option<&ExprBase> {
        self.kind.expr_base()
    }

    pub fn type_base(&self) -> Option<&TypeBase> {
        self.kind.type_base()
    }

    pub fn member_base(&self) -> Option<&MemberBase> {
        self.kind.member_base()
    }
}

/// Linked graph rooted at a `Program`.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    scopes: Vec<Scope>,
    root: NodeId,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root program. Construction guarantees the root is a `Program`.
    pub fn program(&self) -> &Program {
        match &self.node(self.root).kind {
            NodeKind::Program(p) => p,
            other => unreachable!("root is {:?}", other.node_type()),
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn try_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn try_scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    /// Typed view of a node, `None` if it is another kind.
    pub fn get<T: NodeVariant>(&self, id: NodeId) -> Option<&T> {
        self.try_node(id).and_then(|n| n.get::<T>())
    }

    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.node(id).node_type()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter().enumerate().map(|(i, s)| (ScopeId(i as u32), s))
    }

    /// Name of an `Ident`, or of the `ident` of a declaration.
    pub fn ident_name(&self, id: NodeId) -> Option<&str> {
        let node = self.try_node(id)?;
        if let Some(ident) = node.get::<Ident>() {
            return Some(&ident.ident);
        }
        let ident = node.member_base()?.ident?;
        self.get::<Ident>(ident).map(|i| i.ident.as_str())
    }
}

/// Построитель арены. Узлы добавляются в порядке индексов и могут
/// изменяться до `finish`.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
    scopes: Vec<Scope>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, scopes: usize) -> Self {
        Self { nodes: Vec::with_capacity(nodes), scopes: Vec::with_capacity(scopes) }
    }

    pub fn push(&mut self, loc: Loc, kind: impl Into<NodeKind>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(loc, kind));
        id
    }

    pub fn push_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.scopes.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Freeze the arena with node 0 as root; it must be a `Program`, and
    /// every child and scope link must point into the arena.
    pub fn finish(self) -> Result<Ast, ReconstructError> {
        match self.nodes.first() {
            Some(n) if n.node_type() == NodeType::Program => {}
            _ => return Err(ReconstructError::MissingRoot),
        }
        self.check_handles()?;
        Ok(Ast { nodes: self.nodes, scopes: self.scopes, root: NodeId(0) })
    }

    fn check_handles(&self) -> Result<(), ReconstructError> {
        let node_len = self.nodes.len();
        let scope_len = self.scopes.len();

        for (index, node) in self.nodes.iter().enumerate() {
            let mut dangling = None;
            for_each_child(node, |child| {
                if child.index() < node_len {
                    true
                } else {
                    dangling = Some(child);
                    false
                }
            });
            if let Some(child) = dangling {
                return Err(ReconstructError::DanglingReference {
                    owner: node.node_type().name(),
                    field: "child",
                    index,
                    target: u64::from(child.0),
                    len: node_len,
                });
            }
        }

        for (index, scope) in self.scopes.iter().enumerate() {
            let scope_links = [("prev", scope.prev), ("next", scope.next), ("branch", scope.branch)];
            for (field, link) in scope_links {
                if let Some(target) = link.filter(|s| s.index() >= scope_len) {
                    return Err(ReconstructError::DanglingReference {
                        owner: "Scope",
                        field,
                        index,
                        target: u64::from(target.0),
                        len: scope_len,
                    });
                }
            }
            let node_links = scope.ident.iter().map(|&id| ("ident", id)).chain(scope.owner.map(|id| ("owner", id)));
            for (field, target) in node_links {
                if target.index() >= node_len {
                    return Err(ReconstructError::DanglingReference {
                        owner: "Scope",
                        field,
                        index,
                        target: u64::from(target.0),
                        len: node_len,
                    });
                }
            }
        }
        Ok(())
    }
}
