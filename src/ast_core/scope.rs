//! Lexical scopes and lookups along their chains.

use super::nodes::Ident;
use super::{Ast, NodeId, ScopeId};

/// One link of a scope chain. `prev`/`next` chain sequential scopes,
/// `branch` opens an alternative chain (conditional members, match arms).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub prev: Option<ScopeId>,
    pub next: Option<ScopeId>,
    pub branch: Option<ScopeId>,
    /// Identifiers declared here, in declaration order.
    pub ident: Vec<NodeId>,
    pub owner: Option<NodeId>,
    pub branch_root: bool,
}

impl Ast {
    /// `id` followed by every scope reachable through `prev`.
    pub fn scope_chain(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![id];
        let mut cur = self.scope(id).prev;
        while let Some(prev) = cur {
            // stop on a prev cycle
            if chain.contains(&prev) || chain.len() > self.scope_count() {
                break;
            }
            chain.push(prev);
            cur = self.scope(prev).prev;
        }
        chain
    }

    /// Branch scopes hanging off `id`, nearest first.
    pub fn branches(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut cur = self.scope(id).branch;
        while let Some(b) = cur {
            if b == id || out.contains(&b) {
                break;
            }
            out.push(b);
            cur = self.scope(b).branch;
        }
        out
    }

    /// Closest declaration of `name` visible from `scope`: the latest
    /// declaration in `scope` itself, then the same in each `prev` scope.
    pub fn lookup_ident(&self, scope: ScopeId, name: &str) -> Option<NodeId> {
        self.scope_chain(scope).into_iter().find_map(|sid| {
            self.scope(sid)
                .ident
                .iter()
                .rev()
                .copied()
                .find(|&id| self.get::<Ident>(id).is_some_and(|i| i.ident == name))
        })
    }

    /// Scopes whose `owner` is `node`.
    pub fn scopes_owned_by(&self, node: NodeId) -> impl Iterator<Item = ScopeId> + '_ {
        self.scopes().filter(move |(_, s)| s.owner == Some(node)).map(|(id, _)| id)
    }
}
