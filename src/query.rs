//! Read-only helpers that code generators run over a linked [`Ast`].

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ast_core::*;
use crate::walk::{children, postorder_traverse, walk, VisitControl, Visitor};

/// Follow `Ident.base` through other identifiers and member accesses to
/// the defining identifier. The flag is set when the chain passed through
/// a `MemberAccess`.
pub fn lookup_base(ast: &Ast, ident: NodeId) -> (NodeId, bool) {
    let mut cur = ident;
    let mut via_member = false;
    let mut seen = HashSet::new();
    while seen.insert(cur) {
        let Some(base) = ast.get::<Ident>(cur).and_then(|i| i.base) else { break };
        match &ast.node(base).kind {
            NodeKind::Ident(_) => cur = base,
            NodeKind::MemberAccess(m) => match m.base {
                Some(b) => {
                    via_member = true;
                    cur = b;
                }
                None => break,
            },
            _ => break,
        }
    }
    (cur, via_member)
}

/// Member-category nodes among `elements`, order kept.
pub fn collect_members(ast: &Ast, elements: &[NodeId]) -> Vec<NodeId> {
    elements.iter().copied().filter(|&id| ast.node_type(id).is_member()).collect()
}

/// The `Format` a dependency (`IdentType`) refers to, via its struct type.
fn depended_format(ast: &Ast, dep: NodeId) -> Option<NodeId> {
    let ty = ast.get::<IdentType>(dep)?.base?;
    let format = ast.get::<StructType>(ty)?.base?;
    ast.get::<Format>(format).map(|_| format)
}

/// Every format reachable from the root, each placed after the formats it
/// depends on. Ties keep discovery order, fewer dependencies first.
pub fn formats_in_dependency_order(ast: &Ast) -> Vec<NodeId> {
    let mut formats = Vec::new();
    postorder_traverse(ast, ast.root(), |id, node| {
        if node.node_type() == NodeType::Format {
            formats.push(id);
        }
    });

    let deps: HashMap<NodeId, Vec<NodeId>> = formats
        .iter()
        .map(|&f| {
            let depends = ast.get::<Format>(f).map(|x| x.depends.as_slice()).unwrap_or(&[]);
            (f, depends.iter().filter_map(|&d| depended_format(ast, d)).collect())
        })
        .collect();
    formats.sort_by_key(|f| deps.get(f).map_or(0, Vec::len));

    fn visit(
        f: NodeId,
        deps: &HashMap<NodeId, Vec<NodeId>>,
        visited: &mut HashSet<NodeId>,
        out: &mut Vec<NodeId>,
    ) {
        if !visited.insert(f) {
            return;
        }
        for &d in deps.get(&f).into_iter().flatten() {
            visit(d, deps, visited, out);
        }
        out.push(f);
    }

    let mut visited = HashSet::new();
    let mut sorted = Vec::with_capacity(formats.len());
    for &f in &formats {
        visit(f, &deps, &mut visited, &mut sorted);
    }
    sorted
}

/// `..` with neither bound, possibly wrapped in `Identity`/`Paren`.
pub fn is_any_range(ast: &Ast, expr: NodeId) -> bool {
    match &ast.node(expr).kind {
        NodeKind::Range(r) => r.start.is_none() && r.end.is_none(),
        NodeKind::Identity(Identity { expr: Some(inner), .. })
        | NodeKind::Paren(Paren { expr: Some(inner), .. }) => is_any_range(ast, *inner),
        _ => false,
    }
}

/// One `config.xxx(...)` / `config.xxx = ...` entry of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramMetadata {
    pub name: String,
    pub values: Vec<NodeId>,
    /// Written as a call rather than an assignment.
    pub as_call: bool,
}

pub fn program_metadata(ast: &Ast) -> Vec<ProgramMetadata> {
    ast.program()
        .metadata
        .iter()
        .filter_map(|&m| ast.get::<Metadata>(m))
        .map(|m| ProgramMetadata {
            name: m.name.clone(),
            values: m.values.clone(),
            as_call: m.base.is_some_and(|b| ast.node_type(b) == NodeType::Call),
        })
        .collect()
}

/// Dotted path of a special literal member chain, e.g. `config.endian`.
pub fn config_path(ast: &Ast, expr: NodeId) -> Option<String> {
    match &ast.node(expr).kind {
        NodeKind::SpecialLiteral(l) => Some(l.kind.as_str().to_string()),
        NodeKind::MemberAccess(m) => {
            let prefix = config_path(ast, m.target?)?;
            let member = ast.get::<Ident>(m.member?)?;
            Some(format!("{}.{}", prefix, member.ident))
        }
        _ => None,
    }
}

/// Node counts per kind over everything reachable from the root. A node
/// listed by several parents is counted once.
pub fn node_type_histogram(ast: &Ast) -> BTreeMap<NodeType, usize> {
    struct Counter {
        seen: HashSet<NodeId>,
        counts: BTreeMap<NodeType, usize>,
    }

    impl Visitor for Counter {
        fn enter(&mut self, _ast: &Ast, id: NodeId, node: &Node) -> VisitControl {
            if !self.seen.insert(id) {
                return VisitControl::SkipChildren;
            }
            *self.counts.entry(node.node_type()).or_insert(0) += 1;
            VisitControl::Continue
        }
    }

    let mut counter = Counter { seen: HashSet::new(), counts: BTreeMap::new() };
    walk(ast, ast.root(), &mut counter);
    counter.counts
}

/// A node that is its own descendant through the child relation, if any.
/// Payloads with such a cycle reconstruct fine but cannot be walked.
pub fn find_child_cycle(ast: &Ast, root: NodeId) -> Option<NodeId> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; ast.node_count()];
    // (node, its children, next child to visit)
    let mut stack = vec![(root, children(ast, root), 0usize)];
    marks[root.index()] = Mark::InProgress;
    while let Some((id, kids, next)) = stack.last_mut() {
        let Some(&child) = kids.get(*next) else {
            marks[id.index()] = Mark::Done;
            stack.pop();
            continue;
        };
        *next += 1;
        match marks[child.index()] {
            Mark::InProgress => return Some(child),
            Mark::Done => {}
            Mark::Unvisited => {
                marks[child.index()] = Mark::InProgress;
                stack.push((child, children(ast, child), 0));
            }
        }
    }
    None
}

/// Whether `field` sits directly in the body of the format or state that
/// declares it (not in a nested conditional struct).
pub fn is_on_named_struct(ast: &Ast, field: NodeId) -> bool {
    let Some(f) = ast.get::<Field>(field) else { return false };
    let Some(owner) = f.member_base.belong else { return false };
    let body = match &ast.node(owner).kind {
        NodeKind::Format(x) => x.body,
        NodeKind::State(x) => x.body,
        _ => None,
    };
    let body_struct = body.and_then(|b| ast.get::<IndentBlock>(b)).and_then(|b| b.struct_type);
    body_struct.is_some() && body_struct == f.member_base.belong_struct
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::Loc;
    use pretty_assertions::assert_eq;

    fn ident(b: &mut AstBuilder, name: &str, base: Option<NodeId>) -> NodeId {
        b.push(Loc::default(), Ident { ident: name.into(), base, ..Default::default() })
    }

    #[test]
    fn lookup_base_through_member_access() {
        let mut b = AstBuilder::new();
        b.push(Loc::default(), Program::default());
        let def = ident(&mut b, "len", None);
        let access = b.push(Loc::default(), MemberAccess { base: Some(def), ..Default::default() });
        let via = ident(&mut b, "len", Some(access));
        let alias = ident(&mut b, "len", Some(via));
        let ast = b.finish().unwrap();
        assert_eq!(lookup_base(&ast, alias), (def, true));
        assert_eq!(lookup_base(&ast, def), (def, false));
    }

    #[test]
    fn lookup_base_stops_on_cycle() {
        let mut b = AstBuilder::new();
        b.push(Loc::default(), Program::default());
        let x = ident(&mut b, "x", None);
        let y = ident(&mut b, "y", Some(x));
        if let Some(n) = b.node_mut(x) {
            n.kind = Ident { ident: "x".into(), base: Some(y), ..Default::default() }.into();
        }
        let ast = b.finish().unwrap();
        let (end, via) = lookup_base(&ast, y);
        assert!(end == x || end == y);
        assert!(!via);
    }

    #[test]
    fn dependency_order_puts_dependencies_first() {
        // format A: b :B      format B: ...
        let mut b = AstBuilder::new();
        let root = b.push(Loc::default(), Program::default());
        let fmt_a = b.push(Loc::default(), Format::default());
        let fmt_b = b.push(Loc::default(), Format::default());
        let struct_b = b.push(Loc::default(), StructType { base: Some(fmt_b), ..Default::default() });
        let dep = b.push(Loc::default(), IdentType { base: Some(struct_b), ..Default::default() });
        if let Some(n) = b.node_mut(fmt_a) {
            n.kind = Format { depends: vec![dep], ..Default::default() }.into();
        }
        if let Some(n) = b.node_mut(root) {
            n.kind = Program { elements: vec![fmt_a, fmt_b], ..Default::default() }.into();
        }
        let ast = b.finish().unwrap();
        assert_eq!(formats_in_dependency_order(&ast), vec![fmt_b, fmt_a]);
    }

    #[test]
    fn any_range_through_wrappers() {
        let mut b = AstBuilder::new();
        b.push(Loc::default(), Program::default());
        let open = b.push(Loc::default(), Range::default());
        let paren = b.push(Loc::default(), Paren { expr: Some(open), ..Default::default() });
        let wrapped = b.push(Loc::default(), Identity { expr: Some(paren), ..Default::default() });
        let lit = b.push(Loc::default(), IntLiteral { value: "1".into(), ..Default::default() });
        let bounded = b.push(Loc::default(), Range { start: Some(lit), ..Default::default() });
        let ast = b.finish().unwrap();
        assert!(is_any_range(&ast, wrapped));
        assert!(!is_any_range(&ast, bounded));
        assert!(!is_any_range(&ast, lit));
    }

    #[test]
    fn config_paths_and_metadata() {
        let mut b = AstBuilder::new();
        let root = b.push(Loc::default(), Program::default());
        let cfg = b.push(Loc::default(), SpecialLiteral { kind: SpecialLiteralKind::Config, ..Default::default() });
        let member = ident(&mut b, "endian", None);
        let access = b.push(
            Loc::default(),
            MemberAccess { target: Some(cfg), member: Some(member), ..Default::default() },
        );
        let call = b.push(Loc::default(), Call { callee: Some(access), ..Default::default() });
        let value = b.push(Loc::default(), StrLiteral { value: "\"little\"".into(), ..Default::default() });
        let meta = b.push(
            Loc::default(),
            Metadata { base: Some(call), name: "config.endian".into(), values: vec![value] },
        );
        if let Some(n) = b.node_mut(root) {
            n.kind = Program { metadata: vec![meta], ..Default::default() }.into();
        }
        let ast = b.finish().unwrap();
        assert_eq!(config_path(&ast, access).as_deref(), Some("config.endian"));
        assert_eq!(config_path(&ast, member), None);
        assert_eq!(
            program_metadata(&ast),
            vec![ProgramMetadata { name: "config.endian".into(), values: vec![value], as_call: true }]
        );
    }

    #[test]
    fn members_and_histogram() {
        let mut b = AstBuilder::new();
        let root = b.push(Loc::default(), Program::default());
        let field = b.push(Loc::default(), Field::default());
        let comment = b.push(Loc::default(), Comment::default());
        let func = b.push(Loc::default(), Function::default());
        if let Some(n) = b.node_mut(root) {
            n.kind = Program { elements: vec![field, comment, func], ..Default::default() }.into();
        }
        let ast = b.finish().unwrap();
        assert_eq!(collect_members(&ast, &ast.program().elements), vec![field, func]);
        let h = node_type_histogram(&ast);
        assert_eq!(h.get(&NodeType::Field), Some(&1));
        assert_eq!(h.get(&NodeType::Program), Some(&1));
        assert_eq!(h.values().sum::<usize>(), 4);
    }

    #[test]
    fn histogram_counts_shared_nodes_once() {
        // the field is listed by both the body block and its struct type
        let mut b = AstBuilder::new();
        let root = b.push(Loc::default(), Program::default());
        let fmt = b.push(Loc::default(), Format::default());
        let block = b.push(Loc::default(), IndentBlock::default());
        let st = b.push(Loc::default(), StructType::default());
        let field = b.push(Loc::default(), Field::default());
        if let Some(n) = b.node_mut(st) {
            n.kind = StructType { fields: vec![field], ..Default::default() }.into();
        }
        if let Some(n) = b.node_mut(block) {
            n.kind = IndentBlock { struct_type: Some(st), elements: vec![field], ..Default::default() }.into();
        }
        if let Some(n) = b.node_mut(fmt) {
            n.kind = Format { body: Some(block), ..Default::default() }.into();
        }
        if let Some(n) = b.node_mut(root) {
            n.kind = Program { elements: vec![fmt], ..Default::default() }.into();
        }
        let ast = b.finish().unwrap();
        let h = node_type_histogram(&ast);
        assert_eq!(h.get(&NodeType::Field), Some(&1));
        assert_eq!(h.values().sum::<usize>(), ast.node_count());
    }

    #[test]
    fn child_cycle_detection() {
        let mut b = AstBuilder::new();
        let root = b.push(Loc::default(), Program::default());
        let paren = b.push(Loc::default(), Paren::default());
        let lit = b.push(Loc::default(), IntLiteral { value: "1".into(), ..Default::default() });
        let shared = b.push(Loc::default(), Binary { left: Some(lit), right: Some(lit), ..Default::default() });
        if let Some(n) = b.node_mut(root) {
            n.kind = Program { elements: vec![shared, paren, shared], ..Default::default() }.into();
        }
        let acyclic = b.finish().unwrap();
        assert_eq!(find_child_cycle(&acyclic, acyclic.root()), None);

        let mut b = AstBuilder::new();
        let root = b.push(Loc::default(), Program::default());
        let paren = b.push(Loc::default(), Paren::default());
        if let Some(n) = b.node_mut(paren) {
            n.kind = Paren { expr: Some(paren), ..Default::default() }.into();
        }
        if let Some(n) = b.node_mut(root) {
            n.kind = Program { elements: vec![paren], ..Default::default() }.into();
        }
        let cyclic = b.finish().unwrap();
        assert_eq!(find_child_cycle(&cyclic, cyclic.root()), Some(paren));
        // counting still terminates on the cyclic graph
        assert_eq!(node_type_histogram(&cyclic).get(&NodeType::Paren), Some(&1));
    }

    #[test]
    fn named_struct_membership() {
        let mut b = AstBuilder::new();
        b.push(Loc::default(), Program::default());
        let st = b.push(Loc::default(), StructType::default());
        let block = b.push(Loc::default(), IndentBlock { struct_type: Some(st), ..Default::default() });
        let fmt = b.push(Loc::default(), Format { body: Some(block), ..Default::default() });
        let field = b.push(
            Loc::default(),
            Field {
                member_base: MemberBase { belong: Some(fmt), belong_struct: Some(st), ident: None },
                ..Default::default()
            },
        );
        let nested = b.push(
            Loc::default(),
            Field { member_base: MemberBase { belong: Some(fmt), ..Default::default() }, ..Default::default() },
        );
        let ast = b.finish().unwrap();
        assert!(is_on_named_struct(&ast, field));
        assert!(!is_on_named_struct(&ast, nested));
    }
}
