/*!
# Raw intermediate decoder

Typed view of the front end's JSON payloads, checked only for primitive
shape. Node bodies stay untyped maps and every cross reference is still a
plain integer index; resolving those is the job of [`crate::reconstruct`].
*/

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::core::errors::{AstError, ErrorLevel, PayloadError};
use crate::core::position::{LineIndex, Loc};

/// Top-level result of the front end for a parse request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstFile {
    pub success: bool,
    pub files: Vec<String>,
    pub ast: Option<JsonAst>,
    pub error: Option<SrcError>,
}

/// Flat node and scope arrays; every reference is an index into one of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonAst {
    pub node: Vec<RawNode>,
    pub scope: Vec<RawScope>,
}

/// One node in raw form. `node_type` keeps the tag as emitted so an unknown
/// tag is reported by the reconstructor with its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub node_type: String,
    pub loc: Loc,
    pub body: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScope {
    pub prev: Option<u64>,
    pub next: Option<u64>,
    pub branch: Option<u64>,
    pub ident: Vec<u64>,
    pub owner: Option<u64>,
    pub branch_root: bool,
}

/// Diagnostics reported by the front end instead of (or next to) an ast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrcError {
    pub errs: Vec<SrcErrorEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrcErrorEntry {
    pub msg: String,
    pub file: String,
    pub loc: Loc,
    pub src: String,
    pub warn: bool,
}

impl SrcErrorEntry {
    pub fn level(&self) -> ErrorLevel {
        ErrorLevel::from_warn_flag(self.warn)
    }
}

impl fmt::Display for SrcErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}\n{}:{}:{}:\n{}",
            self.level(),
            self.msg,
            self.file,
            self.loc.line,
            self.loc.col,
            self.src
        )
    }
}

impl SrcError {
    pub fn error_count(&self) -> usize {
        self.errs.iter().filter(|e| !e.warn).count()
    }

    pub fn warning_count(&self) -> usize {
        self.errs.iter().filter(|e| e.warn).count()
    }
}

impl fmt::Display for SrcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.errs.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTag {
    Indent,
    Space,
    Line,
    Punct,
    IntLiteral,
    BoolLiteral,
    StrLiteral,
    RegexLiteral,
    CharLiteral,
    Keyword,
    Ident,
    Comment,
    Error,
    Unknown,
}

impl TokenTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenTag::Indent => "indent",
            TokenTag::Space => "space",
            TokenTag::Line => "line",
            TokenTag::Punct => "punct",
            TokenTag::IntLiteral => "int_literal",
            TokenTag::BoolLiteral => "bool_literal",
            TokenTag::StrLiteral => "str_literal",
            TokenTag::RegexLiteral => "regex_literal",
            TokenTag::CharLiteral => "char_literal",
            TokenTag::Keyword => "keyword",
            TokenTag::Ident => "ident",
            TokenTag::Comment => "comment",
            TokenTag::Error => "error",
            TokenTag::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub tag: TokenTag,
    pub token: String,
    pub loc: Loc,
}

/// Lexer-level payload. Shares `Loc` and `SrcError` with [`AstFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFile {
    pub success: bool,
    pub files: Vec<String>,
    pub tokens: Option<Vec<Token>>,
    pub error: Option<SrcError>,
}

/// Generated-line to source-location map written next to generated code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateMapFile {
    pub structs: Vec<String>,
    pub line_map: Vec<LineMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMap {
    pub line: u64,
    pub loc: Loc,
}

impl GenerateMapFile {
    /// Source location recorded for a generated line, if any.
    pub fn loc_of_line(&self, line: u64) -> Option<Loc> {
        self.line_map.iter().find(|m| m.line == line).map(|m| m.loc)
    }
}

impl AstFile {
    /// Decode from an already parsed JSON value.
    pub fn from_value(value: Value, file_name: &str) -> Result<Self, PayloadError> {
        serde_json::from_value(value).map_err(|err| value_error(file_name, &err))
    }

    /// The raw arrays, or the reason the front end did not produce them.
    pub fn into_json_ast(self) -> Result<JsonAst, AstError> {
        match (self.success, self.ast, self.error) {
            (false, _, Some(error)) => Err(AstError::Frontend(error)),
            (_, Some(ast), _) => Ok(ast),
            (_, None, _) => Err(AstError::MissingAst),
        }
    }

    /// Name of the file a `Loc.file` index refers to.
    pub fn file_name(&self, loc: &Loc) -> Option<&str> {
        let index = usize::try_from(loc.file).ok()?;
        // front end numbers files from 1
        self.files.get(index.checked_sub(1)?).map(String::as_str)
    }
}

/// Decode an ast payload text.
pub fn decode_ast_file(text: &str, file_name: &str) -> Result<AstFile, PayloadError> {
    let file: AstFile = decode(text, file_name)?;
    if let Some(ast) = &file.ast {
        tracing::debug!(
            "decoded {}: {} raw nodes, {} raw scopes",
            file_name,
            ast.node.len(),
            ast.scope.len()
        );
    }
    Ok(file)
}

/// Decode a token payload text.
pub fn decode_token_file(text: &str, file_name: &str) -> Result<TokenFile, PayloadError> {
    decode(text, file_name)
}

/// Decode a generated-line map text.
pub fn decode_generate_map(text: &str, file_name: &str) -> Result<GenerateMapFile, PayloadError> {
    decode(text, file_name)
}

fn decode<T: DeserializeOwned>(text: &str, file_name: &str) -> Result<T, PayloadError> {
    serde_json::from_str(text).map_err(|err| text_error(text, file_name, &err))
}

fn text_error(text: &str, file_name: &str, err: &serde_json::Error) -> PayloadError {
    let index = LineIndex::new(text);
    // serde_json reports one-based lines and columns; column 0 means "before the first byte"
    let line = err.line().max(1);
    let column = err.column().max(1);
    PayloadError {
        file: file_name.to_string(),
        message: strip_position_suffix(&err.to_string()),
        offset: index.offset(line - 1, column - 1),
        line,
        column,
        excerpt: index.line_text(text, line - 1).to_string(),
        level: ErrorLevel::Error,
    }
}

fn value_error(file_name: &str, err: &serde_json::Error) -> PayloadError {
    PayloadError {
        file: file_name.to_string(),
        message: strip_position_suffix(&err.to_string()),
        offset: 0,
        line: 0,
        column: 0,
        excerpt: String::new(),
        level: ErrorLevel::Error,
    }
}

/// serde_json appends " at line L column C"; the position is carried separately.
fn strip_position_suffix(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(at) => message[..at].to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LOC: &str = r#"{"pos":{"begin":0,"end":1},"file":1,"line":1,"col":1}"#;

    #[test]
    fn decodes_minimal_ast_file() {
        let text = format!(
            r#"{{"success":true,"files":["a.bgn"],"ast":{{"node":[{{"node_type":"program","loc":{LOC},"body":{{}}}}],"scope":[{{"prev":null,"next":null,"branch":null,"ident":[],"owner":0,"branch_root":false}}]}},"error":null}}"#
        );
        let file = decode_ast_file(&text, "a.json").unwrap();
        let ast = file.clone().into_json_ast().unwrap();
        assert_eq!(ast.node.len(), 1);
        assert_eq!(ast.node[0].node_type, "program");
        assert_eq!(ast.scope[0].owner, Some(0));
        assert_eq!(file.file_name(&ast.node[0].loc), Some("a.bgn"));
    }

    #[test]
    fn non_integer_pos_is_a_shape_error_with_location() {
        let text = "{\"success\":true,\"files\":[],\n\"ast\":{\"node\":[{\"node_type\":\"program\",\"loc\":{\"pos\":{\"begin\":\"x\",\"end\":1},\"file\":1,\"line\":1,\"col\":1},\"body\":{}}],\"scope\":[]},\"error\":null}";
        let err = decode_ast_file(text, "bad.json").unwrap_err();
        assert_eq!(err.file, "bad.json");
        assert_eq!(err.line, 2);
        assert!(err.message.contains("invalid type"), "{}", err.message);
        assert!(err.excerpt.starts_with("\"ast\""));
        assert_eq!(err.level, ErrorLevel::Error);
        assert!(err.offset > text.find('\n').unwrap());
    }

    #[test]
    fn missing_required_scope_key_is_rejected() {
        let text = r#"{"success":true,"files":[],"ast":{"node":[],"scope":[{"prev":null}]},"error":null}"#;
        let err = decode_ast_file(text, "s.json").unwrap_err();
        assert!(err.message.contains("missing field `ident`"), "{}", err.message);
    }

    #[test]
    fn failed_parse_surfaces_front_end_errors() {
        let text = format!(
            r#"{{"success":false,"files":["a.bgn"],"ast":null,"error":{{"errs":[{{"msg":"unexpected token","file":"a.bgn","loc":{LOC},"src":"format A:","warn":false}},{{"msg":"unused","file":"a.bgn","loc":{LOC},"src":"x","warn":true}}]}}}}"#
        );
        let file = decode_ast_file(&text, "a.json").unwrap();
        match file.into_json_ast() {
            Err(AstError::Frontend(err)) => {
                assert_eq!(err.error_count(), 1);
                assert_eq!(err.warning_count(), 1);
                assert_eq!(
                    err.errs[0].to_string(),
                    "error: unexpected token\na.bgn:1:1:\nformat A:"
                );
                assert!(err.to_string().contains("warning: unused"));
            }
            other => panic!("expected front end error, got {other:?}"),
        }
    }

    #[test]
    fn decodes_token_file() {
        let text = format!(
            r#"{{"success":true,"files":["a.bgn"],"tokens":[{{"tag":"keyword","token":"format","loc":{LOC}}},{{"tag":"int_literal","token":"8","loc":{LOC}}}],"error":null}}"#
        );
        let file = decode_token_file(&text, "t.json").unwrap();
        let tokens = file.tokens.unwrap();
        assert_eq!(tokens[0].tag, TokenTag::Keyword);
        assert_eq!(tokens[1].tag, TokenTag::IntLiteral);
        assert_eq!(tokens[1].token, "8");
    }

    #[test]
    fn generate_map_lookup() {
        let text = format!(r#"{{"structs":["A"],"line_map":[{{"line":3,"loc":{LOC}}}]}}"#);
        let map = decode_generate_map(&text, "m.json").unwrap();
        assert_eq!(map.structs, vec!["A".to_string()]);
        assert!(map.loc_of_line(3).is_some());
        assert!(map.loc_of_line(4).is_none());
    }

    #[test]
    fn from_value_reports_shape_without_text_position() {
        let err = AstFile::from_value(serde_json::json!({"success": true}), "v.json").unwrap_err();
        assert_eq!(err.line, 0);
        assert!(err.message.contains("missing field"));
    }
}
