/*!
# fmtast

AST core of a binary-format description compiler: decodes the front end's
flat JSON payload, rebuilds the typed, linked node graph from it and walks
that graph for code generators.

## Architecture

```text
fmtast
├── core         - positions, line index, error taxonomy
├── raw          - serde view of the JSON payloads (indices still unresolved)
├── ast_core     - node kinds, typed structs, arena (`Ast`), scopes
├── reconstruct  - two-pass raw -> linked graph (`ast2node`)
├── walk         - visitor with early abort, fixed child order
├── query        - read-only helpers used by generators
├── config       - TOML/YAML tool settings
└── cli_common   - logging and output for the `fmtast` binary
```

## Usage

```rust,no_run
use fmtast::{load_ast, walk_fn, DecodeOptions, NodeType};

let (files, ast) = load_ast("out/ast.json", DecodeOptions::default())?;
println!("{} source file(s)", files.len());

let mut fields = 0;
walk_fn(&ast, ast.root(), |_, node| {
    if node.node_type() == NodeType::Field {
        fields += 1;
    }
    true
});
# Ok::<(), fmtast::AstError>(())
```
*/

pub mod ast_core;
pub mod cli_common;
pub mod config;
pub mod core;
pub mod query;
pub mod raw;
pub mod reconstruct;
pub mod walk;

use std::path::Path;

pub use ast_core::{Ast, AstBuilder, Node, NodeId, NodeKind, NodeType, NodeVariant, Scope, ScopeId};
pub use config::ToolConfig;
pub use core::{AstError, ErrorLevel, LineIndex, Loc, PayloadError, Pos, ReconstructError};
pub use raw::{decode_ast_file, decode_generate_map, decode_token_file, AstFile, JsonAst, SrcError};
pub use reconstruct::{ast2node, DecodeOptions, Reconstructor};
pub use walk::{walk, walk_fn, VisitControl, Visitor};

/// Decode and reconstruct a payload held in memory.
///
/// Returns the payload's source file list next to the linked graph.
pub fn parse_ast_str(
    text: &str,
    file_name: &str,
    options: DecodeOptions,
) -> Result<(Vec<String>, Ast), AstError> {
    let file = decode_ast_file(text, file_name)?;
    let files = file.files.clone();
    let raw = file.into_json_ast()?;
    let ast = Reconstructor::new(options).build(&raw)?;
    tracing::debug!("{}: reconstructed {} nodes", file_name, ast.node_count());
    Ok((files, ast))
}

/// Read, decode and reconstruct a payload file.
pub fn load_ast<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<(Vec<String>, Ast), AstError> {
    let path = path.as_ref();
    let text = core::read_payload_file(path).map_err(|source| AstError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_ast_str(&text, &path.display().to_string(), options)
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn parse_minimal_program() {
        let text = json!({
            "success": true,
            "files": ["a.bgn"],
            "ast": {
                "node": [{
                    "node_type": "program",
                    "loc": {"pos": {"begin": 0, "end": 0}, "file": 1, "line": 1, "col": 1},
                    "body": {}
                }],
                "scope": []
            },
            "error": null
        })
        .to_string();
        let (files, ast) = parse_ast_str(&text, "a.json", DecodeOptions::default()).unwrap();
        assert_eq!(files, vec!["a.bgn".to_string()]);
        assert_eq!(ast.node_count(), 1);
        assert_eq!(ast.node_type(ast.root()), NodeType::Program);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_ast(dir.path().join("none.json"), DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, AstError::Io { .. }));
    }
}
