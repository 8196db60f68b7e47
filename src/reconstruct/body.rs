//! Checked reads from one raw node body.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::ast_core::{Expect, ExprBase, MemberBase, NodeId, NodeType, ScopeId, TypeBase};
use crate::core::errors::ReconstructError;
use crate::core::position::Loc;

type Result<T> = std::result::Result<T, ReconstructError>;

/// Field reader bound to one raw node: knows the owner kind and index for
/// error addresses and the allocated type of every node for reference checks.
pub(crate) struct BodyReader<'a> {
    owner: &'static str,
    index: usize,
    body: &'a Map<String, Value>,
    types: &'a [NodeType],
    scope_count: usize,
    strict: bool,
}

impl<'a> BodyReader<'a> {
    pub(crate) fn new(
        owner: &'static str,
        index: usize,
        body: &'a Map<String, Value>,
        types: &'a [NodeType],
        scope_count: usize,
        strict: bool,
    ) -> Self {
        Self { owner, index, body, types, scope_count, strict }
    }

    fn mismatch(&self, field: &'static str) -> ReconstructError {
        ReconstructError::TypeMismatch { owner: self.owner, field, index: self.index }
    }

    /// `None` for an absent (lenient) or `null` value.
    fn value(&self, field: &'static str) -> Result<Option<&'a Value>> {
        match self.body.get(field) {
            Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(v)),
            None if self.strict => Err(ReconstructError::MissingField {
                owner: self.owner,
                field,
                index: self.index,
            }),
            None => Ok(None),
        }
    }

    fn index_of(&self, field: &'static str, v: &Value, len: usize) -> Result<usize> {
        let target = v.as_u64().ok_or_else(|| self.mismatch(field))?;
        match usize::try_from(target) {
            Ok(i) if i < len => Ok(i),
            _ => Err(ReconstructError::DanglingReference {
                owner: self.owner,
                field,
                index: self.index,
                target,
                len,
            }),
        }
    }

    fn resolve(&self, field: &'static str, v: &Value, expect: Expect) -> Result<NodeId> {
        let i = self.index_of(field, v, self.types.len())?;
        if self.types[i].satisfies(expect) {
            Ok(NodeId(i as u32))
        } else {
            Err(self.mismatch(field))
        }
    }

    /// Single node reference.
    pub(crate) fn node(&self, field: &'static str, expect: Expect) -> Result<Option<NodeId>> {
        self.value(field)?.map(|v| self.resolve(field, v, expect)).transpose()
    }

    /// List of node references, order preserved.
    pub(crate) fn nodes(&self, field: &'static str, expect: Expect) -> Result<Vec<NodeId>> {
        let Some(v) = self.value(field)? else { return Ok(Vec::new()) };
        let items = v.as_array().ok_or_else(|| self.mismatch(field))?;
        items.iter().map(|item| self.resolve(field, item, expect)).collect()
    }

    pub(crate) fn scope(&self, field: &'static str) -> Result<Option<ScopeId>> {
        self.value(field)?
            .map(|v| self.index_of(field, v, self.scope_count).map(|i| ScopeId(i as u32)))
            .transpose()
    }

    pub(crate) fn flag(&self, field: &'static str) -> Result<bool> {
        match self.value(field)? {
            None => Ok(false),
            Some(v) => v.as_bool().ok_or_else(|| self.mismatch(field)),
        }
    }

    pub(crate) fn uint(&self, field: &'static str) -> Result<u64> {
        Ok(self.opt_uint(field)?.unwrap_or(0))
    }

    pub(crate) fn opt_uint(&self, field: &'static str) -> Result<Option<u64>> {
        self.value(field)?
            .map(|v| v.as_u64().ok_or_else(|| self.mismatch(field)))
            .transpose()
    }

    pub(crate) fn text(&self, field: &'static str) -> Result<String> {
        match self.value(field)? {
            None => Ok(String::new()),
            Some(v) => v.as_str().map(str::to_string).ok_or_else(|| self.mismatch(field)),
        }
    }

    pub(crate) fn loc(&self, field: &'static str) -> Result<Loc> {
        self.decode(field)
    }

    /// Enum or other serde value; absent means the type's default.
    pub(crate) fn tag<T: DeserializeOwned + Default>(&self, field: &'static str) -> Result<T> {
        self.decode(field)
    }

    fn decode<T: DeserializeOwned + Default>(&self, field: &'static str) -> Result<T> {
        match self.value(field)? {
            None => Ok(T::default()),
            Some(v) => T::deserialize(v).map_err(|_| self.mismatch(field)),
        }
    }

    pub(crate) fn expr_base(&self) -> Result<ExprBase> {
        Ok(ExprBase {
            expr_type: self.node("expr_type", Expect::TYPE)?,
            constant_level: self.tag("constant_level")?,
        })
    }

    pub(crate) fn type_base(&self) -> Result<TypeBase> {
        Ok(TypeBase {
            is_explicit: self.flag("is_explicit")?,
            non_dynamic_allocation: self.flag("non_dynamic_allocation")?,
            bit_alignment: self.tag("bit_alignment")?,
            bit_size: self.opt_uint("bit_size")?,
        })
    }

    pub(crate) fn member_base(&self) -> Result<MemberBase> {
        Ok(MemberBase {
            belong: self.node("belong", Expect::MEMBER)?,
            belong_struct: self.node("belong_struct", Expect::Kind(NodeType::StructType))?,
            ident: self.node("ident", Expect::Kind(NodeType::Ident))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("object expected"),
        }
    }

    const TYPES: &[NodeType] = &[NodeType::Program, NodeType::IntType, NodeType::Format];

    #[test]
    fn resolves_checked_references() {
        let b = body(json!({"left": 1, "right": null, "list": [1, 1]}));
        let r = BodyReader::new("Binary", 0, &b, TYPES, 0, false);
        assert_eq!(r.node("left", Expect::TYPE).unwrap(), Some(NodeId(1)));
        assert_eq!(r.node("right", Expect::EXPR).unwrap(), None);
        assert_eq!(r.nodes("list", Expect::Node).unwrap(), vec![NodeId(1), NodeId(1)]);
        assert_eq!(
            r.node("left", Expect::EXPR).unwrap_err().to_string(),
            "type mismatch at Binary::left"
        );
    }

    #[test]
    fn out_of_range_index_is_dangling() {
        let b = body(json!({"left": 7, "scope": 0}));
        let r = BodyReader::new("Binary", 3, &b, TYPES, 0, false);
        match r.node("left", Expect::Node).unwrap_err() {
            ReconstructError::DanglingReference { target, len, index, .. } => {
                assert_eq!((target, len, index), (7, 3, 3));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(r.scope("scope").is_err());
    }

    #[test]
    fn absent_keys_depend_on_strictness() {
        let b = body(json!({}));
        let lenient = BodyReader::new("Field", 0, &b, TYPES, 0, false);
        assert_eq!(lenient.flag("is_state_variable").unwrap(), false);
        assert_eq!(lenient.nodes("list", Expect::Node).unwrap(), Vec::<NodeId>::new());
        assert_eq!(lenient.loc("colon_loc").unwrap(), Loc::default());
        let strict = BodyReader::new("Field", 0, &b, TYPES, 0, true);
        assert_eq!(
            strict.flag("is_state_variable").unwrap_err().to_string(),
            "missing field Field::is_state_variable"
        );
    }

    #[test]
    fn wrong_primitive_shape_is_a_mismatch() {
        let b = body(json!({"flag": 1, "n": -1, "s": 2, "op": "??", "list": 3}));
        let r = BodyReader::new("Node", 0, &b, TYPES, 0, false);
        assert!(r.flag("flag").is_err());
        assert!(r.uint("n").is_err());
        assert!(r.text("s").is_err());
        assert!(r.tag::<crate::ast_core::BinaryOp>("op").is_err());
        assert!(r.nodes("list", Expect::Node).is_err());
    }
}
