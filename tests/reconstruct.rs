//! Интеграционные тесты восстановления графа из JSON payload

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use fmtast::ast_core::*;
use fmtast::query::{find_child_cycle, node_type_histogram};
use fmtast::walk::{preorder, walk_fn};
use fmtast::{parse_ast_str, AstError, AstFile, DecodeOptions, ReconstructError, Reconstructor};

fn loc(line: u64) -> Value {
    json!({"pos": {"begin": 0, "end": 0}, "file": 1, "line": line, "col": 1})
}

fn node(ty: &str, body: Value) -> Value {
    json!({"node_type": ty, "loc": loc(1), "body": body})
}

fn scope(prev: Option<u64>, ident: &[u64], owner: Option<u64>) -> Value {
    json!({
        "prev": prev,
        "next": null,
        "branch": null,
        "ident": ident,
        "owner": owner,
        "branch_root": false
    })
}

fn payload(nodes: Vec<Value>, scopes: Vec<Value>) -> Value {
    json!({
        "success": true,
        "files": ["test.bgn"],
        "ast": {"node": nodes, "scope": scopes},
        "error": null
    })
}

fn build_with(value: Value, options: DecodeOptions) -> Result<Ast, AstError> {
    let raw = AstFile::from_value(value, "test.json")?.into_json_ast()?;
    Ok(Reconstructor::new(options).build(&raw)?)
}

fn build(value: Value) -> Result<Ast, AstError> {
    build_with(value, DecodeOptions::default())
}

fn reconstruct_error(value: Value) -> ReconstructError {
    match build(value) {
        Err(AstError::Reconstruct(err)) => err,
        other => panic!("expected a reconstruction error, got {:?}", other.map(|a| a.node_count())),
    }
}

#[test]
fn end_to_end_program_with_global_scope() {
    let value = payload(
        vec![
            node("program", json!({"struct_type": 1, "elements": [2], "global_scope": 0})),
            node("struct_type", json!({"fields": [3]})),
            node("format", json!({"ident": null, "body": null})),
            node("field", json!({"ident": null, "field_type": null, "arguments": null})),
        ],
        vec![scope(None, &[], Some(0))],
    );
    let ast = build(value).unwrap();

    let root = ast.root();
    let program = ast.program();
    assert_eq!(program.struct_type, Some(NodeId(1)));
    assert_eq!(program.elements, vec![NodeId(2)]);
    assert_eq!(program.global_scope, Some(ScopeId(0)));

    let global = ast.scope(ScopeId(0));
    assert_eq!(global.owner, Some(root));
    assert_eq!(ast.node_type(global.owner.unwrap()), NodeType::Program);

    let st = ast.get::<StructType>(NodeId(1)).unwrap();
    assert_eq!(st.fields, vec![NodeId(3)]);
    let field = ast.get::<Field>(NodeId(3)).unwrap();
    assert_eq!(field.member_base.ident, None);
    assert_eq!(field.field_type, None);
    assert_eq!(ast.get::<Format>(NodeId(2)).unwrap().body, None);
}

#[test]
fn allocation_order_matches_raw_tags() {
    let tags = ["program", "format", "indent_block", "field", "int_type", "ident", "int_literal"];
    let value = payload(tags.iter().map(|t| node(t, json!({}))).collect(), vec![]);
    let ast = build(value).unwrap();
    assert_eq!(ast.node_count(), tags.len());
    for (i, tag) in tags.iter().enumerate() {
        assert_eq!(ast.node_type(NodeId(i as u32)).as_str(), *tag, "node {}", i);
    }
}

#[test]
fn forward_reference_resolves_to_later_node() {
    // the field at 1 names the format declared after it as its owner
    let value = payload(
        vec![
            node("program", json!({"elements": [2]})),
            node("field", json!({"belong": 2})),
            node("format", json!({"body": null})),
        ],
        vec![],
    );
    let ast = build(value).unwrap();
    let field = ast.get::<Field>(NodeId(1)).unwrap();
    assert_eq!(field.member_base.belong, Some(NodeId(2)));
    assert!(ast.get::<Format>(NodeId(2)).is_some());
}

#[test]
fn shared_node_is_one_arena_slot() {
    // the same field is listed by the struct type and the format body
    let value = payload(
        vec![
            node("program", json!({"elements": [1]})),
            node("format", json!({"body": 2})),
            node("indent_block", json!({"elements": [4], "struct_type": 3})),
            node("struct_type", json!({"fields": [4]})),
            node("field", json!({"belong": 1, "belong_struct": 3})),
        ],
        vec![],
    );
    let ast = build(value).unwrap();
    let block = ast.get::<IndentBlock>(NodeId(2)).unwrap();
    let st = ast.get::<StructType>(NodeId(3)).unwrap();
    assert_eq!(block.elements[0], st.fields[0]);
    assert_eq!(ast.node_count(), 5);
}

#[test]
fn histogram_counts_shared_field_once() {
    let value = payload(
        vec![
            node("program", json!({"elements": [1]})),
            node("format", json!({"body": 2})),
            node("indent_block", json!({"elements": [4], "struct_type": 3})),
            node("struct_type", json!({"fields": [4]})),
            node("field", json!({"belong": 1})),
        ],
        vec![],
    );
    let ast = build(value).unwrap();
    let histogram = node_type_histogram(&ast);
    assert_eq!(histogram.get(&NodeType::Field), Some(&1));
    assert_eq!(histogram.values().sum::<usize>(), 5);
}

#[test]
fn self_referencing_child_is_found() {
    let value = payload(
        vec![node("program", json!({"elements": [1]})), node("paren", json!({"expr": 1}))],
        vec![],
    );
    // reconstruction accepts it; walking would not terminate
    let ast = build(value).unwrap();
    assert_eq!(find_child_cycle(&ast, ast.root()), Some(NodeId(1)));
}

#[test]
fn wrong_category_is_field_addressed() {
    let value = payload(
        vec![
            node("program", json!({"elements": [1]})),
            node("binary", json!({"left": 2, "right": null})),
            node("format", json!({})),
        ],
        vec![],
    );
    let err = reconstruct_error(value);
    assert_eq!(err, ReconstructError::TypeMismatch { owner: "Binary", field: "left", index: 1 });
    assert_eq!(err.to_string(), "type mismatch at Binary::left");
}

#[test]
fn non_integer_index_is_type_mismatch() {
    let value = payload(
        vec![node("program", json!({"elements": ["1"]})), node("comment", json!({}))],
        vec![],
    );
    let err = reconstruct_error(value);
    assert_eq!(err.field_path().as_deref(), Some("Program::elements"));
}

#[test]
fn unknown_tag_is_rejected() {
    let value = payload(
        vec![node("program", json!({})), node("not_a_real_kind", json!({}))],
        vec![],
    );
    let err = reconstruct_error(value);
    assert_eq!(
        err,
        ReconstructError::UnknownNodeType { tag: "not_a_real_kind".into(), index: 1 }
    );
    assert!(err.to_string().starts_with("unknown node type"));
}

#[test]
fn abstract_tag_is_rejected() {
    let value = payload(vec![node("program", json!({})), node("expr", json!({}))], vec![]);
    assert!(matches!(reconstruct_error(value), ReconstructError::UnknownNodeType { index: 1, .. }));
}

#[test]
fn empty_node_array_is_missing_root() {
    let err = reconstruct_error(payload(vec![], vec![]));
    assert_eq!(err, ReconstructError::MissingRoot);
    assert_eq!(err.to_string(), "ast must be Program");
}

#[test]
fn non_program_root_is_missing_root() {
    let err = reconstruct_error(payload(vec![node("format", json!({}))], vec![]));
    assert_eq!(err, ReconstructError::MissingRoot);
}

#[test]
fn out_of_range_index_is_dangling() {
    let value = payload(vec![node("program", json!({"elements": [7]}))], vec![]);
    let err = reconstruct_error(value);
    assert_eq!(
        err,
        ReconstructError::DanglingReference {
            owner: "Program",
            field: "elements",
            index: 0,
            target: 7,
            len: 1,
        }
    );
}

#[test]
fn strict_mode_reports_absent_keys() {
    let nodes = vec![node("program", json!({"elements": [1]})), node("break", json!({}))];

    let lenient = build(payload(nodes.clone(), vec![])).unwrap();
    assert_eq!(lenient.get::<Break>(NodeId(1)).unwrap().related_loop, None);

    match build_with(payload(nodes, vec![]), DecodeOptions::strict()) {
        Err(AstError::Reconstruct(ReconstructError::MissingField { owner, field, index })) => {
            assert_eq!((owner, field, index), ("Program", "struct_type", 0));
        }
        other => panic!("unexpected result: {:?}", other.map(|a| a.node_count())),
    }
}

#[test]
fn strict_mode_accepts_explicit_nulls() {
    let value = payload(
        vec![
            node(
                "program",
                json!({
                    "struct_type": null,
                    "elements": [1],
                    "global_scope": null,
                    "metadata": [],
                    "endian": null
                }),
            ),
            node("break", json!({"related_loop": null})),
        ],
        vec![],
    );
    let ast = build_with(value, DecodeOptions::strict()).unwrap();
    assert_eq!(ast.node_count(), 2);
}

#[test]
fn scopes_link_and_resolve_identifiers() {
    let value = payload(
        vec![
            node("program", json!({"elements": [1, 2], "global_scope": 0})),
            node("ident", json!({"ident": "len", "usage": "define_variable", "scope": 0})),
            node("ident", json!({"ident": "data", "scope": 1})),
        ],
        vec![scope(None, &[1], Some(0)), scope(Some(0), &[2], Some(0))],
    );
    let ast = build(value).unwrap();
    assert_eq!(ast.scope_chain(ScopeId(1)), vec![ScopeId(1), ScopeId(0)]);
    assert_eq!(ast.lookup_ident(ScopeId(1), "len"), Some(NodeId(1)));
    assert_eq!(ast.lookup_ident(ScopeId(1), "data"), Some(NodeId(2)));
    assert_eq!(ast.lookup_ident(ScopeId(0), "data"), None);
    assert_eq!(ast.scopes_owned_by(ast.root()).count(), 2);
}

#[test]
fn scope_ident_must_be_ident() {
    let value = payload(
        vec![node("program", json!({})), node("format", json!({}))],
        vec![scope(None, &[1], None)],
    );
    let err = reconstruct_error(value);
    assert_eq!(err, ReconstructError::TypeMismatch { owner: "Scope", field: "ident", index: 0 });
}

#[test]
fn frontend_failure_is_surfaced() {
    let value = json!({
        "success": false,
        "files": ["bad.bgn"],
        "ast": null,
        "error": {"errs": [{
            "msg": "unexpected token",
            "file": "bad.bgn",
            "loc": loc(3),
            "src": "format A:",
            "warn": false
        }]}
    });
    match build(value) {
        Err(AstError::Frontend(err)) => {
            assert_eq!(err.error_count(), 1);
            assert!(err.to_string().starts_with("error: unexpected token\nbad.bgn:3:1:"));
        }
        other => panic!("unexpected result: {:?}", other.map(|a| a.node_count())),
    }
}

#[test]
fn shape_error_reports_line_and_excerpt() {
    let text = "{\n  \"success\": \"yes\",\n  \"files\": [],\n  \"ast\": null,\n  \"error\": null\n}";
    let err = match parse_ast_str(text, "shape.json", DecodeOptions::default()) {
        Err(AstError::Payload(err)) => err,
        other => panic!("unexpected result: {:?}", other.map(|(_, a)| a.node_count())),
    };
    assert_eq!(err.file, "shape.json");
    assert_eq!(err.line, 2);
    assert!(err.excerpt.contains("\"success\""));
    assert!(err.to_string().starts_with("error: invalid type"));
}

#[test]
fn ast_is_shared_across_threads() {
    let value = payload(
        vec![
            node("program", json!({"elements": [1, 3]})),
            node("binary", json!({"left": 2, "right": 2})),
            node("int_literal", json!({"value": "1"})),
            node("return", json!({"expr": 2})),
        ],
        vec![],
    );
    let ast = build(value).unwrap();
    let expected = preorder(&ast, ast.root());
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| preorder(&ast, ast.root()))).collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
    assert_eq!(expected.len(), 6);
}

#[test]
fn walk_stops_after_first_child() {
    let value = payload(
        vec![
            node("program", json!({"elements": [1, 2]})),
            node("comment", json!({"comment": "# a"})),
            node("comment", json!({"comment": "# b"})),
        ],
        vec![],
    );
    let ast = build(value).unwrap();
    let mut seen = Vec::new();
    let completed = walk_fn(&ast, ast.root(), |id, _| {
        seen.push(id);
        id == ast.root()
    });
    assert!(!completed);
    assert_eq!(seen, vec![NodeId(0), NodeId(1)]);
}
