//! Value enumerations carried on nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[default]
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    MinusSign,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::MinusSign => "-",
        }
    }
}

macro_rules! binary_ops {
    ($($variant:ident => $text:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum BinaryOp {
            #[default]
            $(#[serde(rename = $text)] $variant),*
        }

        impl BinaryOp {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(BinaryOp::$variant => $text),*
                }
            }
        }
    };
}

binary_ops! {
    Mul => "*",
    Div => "/",
    Mod => "%",
    LeftArithmeticShift => "<<<",
    RightArithmeticShift => ">>>",
    LeftLogicalShift => "<<",
    RightLogicalShift => ">>",
    BitAnd => "&",
    Add => "+",
    Sub => "-",
    BitOr => "|",
    BitXor => "^",
    Equal => "==",
    NotEqual => "!=",
    Less => "<",
    LessOrEq => "<=",
    Grater => ">",
    GraterOrEq => ">=",
    LogicalAnd => "&&",
    LogicalOr => "||",
    CondOp1 => "?",
    CondOp2 => ":",
    RangeExclusive => "..",
    RangeInclusive => "..=",
    Assign => "=",
    DefineAssign => ":=",
    ConstAssign => "::=",
    AddAssign => "+=",
    SubAssign => "-=",
    MulAssign => "*=",
    DivAssign => "/=",
    ModAssign => "%=",
    LeftLogicalShiftAssign => "<<=",
    RightLogicalShiftAssign => ">>=",
    LeftArithmeticShiftAssign => "<<<=",
    RightArithmeticShiftAssign => ">>>=",
    BitAndAssign => "&=",
    BitOrAssign => "|=",
    BitXorAssign => "^=",
    Comma => ",",
    InAssign => "in",
}

impl BinaryOp {
    pub fn is_assign(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::DefineAssign
                | BinaryOp::ConstAssign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
                | BinaryOp::LeftLogicalShiftAssign
                | BinaryOp::RightLogicalShiftAssign
                | BinaryOp::LeftArithmeticShiftAssign
                | BinaryOp::RightArithmeticShiftAssign
                | BinaryOp::BitAndAssign
                | BinaryOp::BitOrAssign
                | BinaryOp::BitXorAssign
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentUsage {
    #[default]
    Unknown,
    BadIdent,
    Reference,
    DefineVariable,
    DefineConst,
    DefineField,
    DefineFormat,
    DefineState,
    DefineEnum,
    DefineEnumMember,
    DefineFn,
    DefineCastFn,
    DefineArg,
    ReferenceType,
    ReferenceMember,
    ReferenceMemberType,
    MaybeType,
    ReferenceBuiltinFn,
}

impl IdentUsage {
    pub fn is_definition(self) -> bool {
        matches!(
            self,
            IdentUsage::DefineVariable
                | IdentUsage::DefineConst
                | IdentUsage::DefineField
                | IdentUsage::DefineFormat
                | IdentUsage::DefineState
                | IdentUsage::DefineEnum
                | IdentUsage::DefineEnumMember
                | IdentUsage::DefineFn
                | IdentUsage::DefineCastFn
                | IdentUsage::DefineArg
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endian {
    #[default]
    Unspec,
    Big,
    Little,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantLevel {
    #[default]
    Unknown,
    Constant,
    ImmutableVariable,
    Variable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitAlignment {
    #[default]
    ByteAligned,
    #[serde(rename = "bit_1")]
    Bit1,
    #[serde(rename = "bit_2")]
    Bit2,
    #[serde(rename = "bit_3")]
    Bit3,
    #[serde(rename = "bit_4")]
    Bit4,
    #[serde(rename = "bit_5")]
    Bit5,
    #[serde(rename = "bit_6")]
    Bit6,
    #[serde(rename = "bit_7")]
    Bit7,
    NotTarget,
    NotDecidable,
}

impl BitAlignment {
    /// Bits past the last byte boundary, when statically known.
    pub fn bit_offset(self) -> Option<u8> {
        match self {
            BitAlignment::ByteAligned => Some(0),
            BitAlignment::Bit1 => Some(1),
            BitAlignment::Bit2 => Some(2),
            BitAlignment::Bit3 => Some(3),
            BitAlignment::Bit4 => Some(4),
            BitAlignment::Bit5 => Some(5),
            BitAlignment::Bit6 => Some(6),
            BitAlignment::Bit7 => Some(7),
            BitAlignment::NotTarget | BitAlignment::NotDecidable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Follow {
    #[default]
    Unknown,
    End,
    Fixed,
    Constant,
    Normal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoMethod {
    #[default]
    Unspec,
    OutputPut,
    InputPeek,
    InputGet,
    InputBackward,
    InputOffset,
    InputBitOffset,
    InputRemain,
    InputSubrange,
    ConfigEndianLittle,
    ConfigEndianBig,
    ConfigEndianNative,
    ConfigBitOrderLsb,
    ConfigBitOrderMsb,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialLiteralKind {
    #[default]
    Input,
    Output,
    Config,
}

impl SpecialLiteralKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SpecialLiteralKind::Input => "input",
            SpecialLiteralKind::Output => "output",
            SpecialLiteralKind::Config => "config",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Byte,
    BitStream,
    BitMapping,
    BitBoth,
}

/// Integer bit set describing what a block contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockTrait(pub u64);

impl BlockTrait {
    pub const NONE: BlockTrait = BlockTrait(0);
    pub const FIXED_PRIMITIVE: BlockTrait = BlockTrait(1);
    pub const FIXED_FLOAT: BlockTrait = BlockTrait(1 << 1);
    pub const FIXED_ARRAY: BlockTrait = BlockTrait(1 << 2);
    pub const VARIABLE_ARRAY: BlockTrait = BlockTrait(1 << 3);
    pub const STRUCT: BlockTrait = BlockTrait(1 << 4);
    pub const CONDITIONAL: BlockTrait = BlockTrait(1 << 5);
    pub const STATIC_PEEK: BlockTrait = BlockTrait(1 << 6);
    pub const BIT_FIELD: BlockTrait = BlockTrait(1 << 7);
    pub const READ_STATE: BlockTrait = BlockTrait(1 << 8);
    pub const WRITE_STATE: BlockTrait = BlockTrait(1 << 9);
    pub const TERMINAL_PATTERN: BlockTrait = BlockTrait(1 << 10);
    pub const BIT_STREAM: BlockTrait = BlockTrait(1 << 11);
    pub const DYNAMIC_ORDER: BlockTrait = BlockTrait(1 << 12);
    pub const FULL_INPUT: BlockTrait = BlockTrait(1 << 13);
    pub const BACKWARD_INPUT: BlockTrait = BlockTrait(1 << 14);
    pub const MAGIC_VALUE: BlockTrait = BlockTrait(1 << 15);
    pub const ASSERTION: BlockTrait = BlockTrait(1 << 16);
    pub const EXPLICIT_ERROR: BlockTrait = BlockTrait(1 << 17);
    pub const PROCEDURAL: BlockTrait = BlockTrait(1 << 18);
    pub const FOR_LOOP: BlockTrait = BlockTrait(1 << 19);
    pub const LOCAL_VARIABLE: BlockTrait = BlockTrait(1 << 20);
    pub const DESCRIPTION_ONLY: BlockTrait = BlockTrait(1 << 21);
    pub const UNCOMMON_SIZE: BlockTrait = BlockTrait(1 << 22);
    pub const CONTROL_FLOW_CHANGE: BlockTrait = BlockTrait(1 << 23);

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, other: BlockTrait) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for BlockTrait {
    type Output = BlockTrait;

    fn bitor(self, rhs: BlockTrait) -> BlockTrait {
        BlockTrait(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_use_source_spelling() {
        let op: BinaryOp = serde_json::from_str("\"<<<=\"").unwrap();
        assert_eq!(op, BinaryOp::LeftArithmeticShiftAssign);
        assert!(op.is_assign());
        assert_eq!(BinaryOp::InAssign.as_str(), "in");
        let op: UnaryOp = serde_json::from_str("\"-\"").unwrap();
        assert_eq!(op, UnaryOp::MinusSign);
    }

    #[test]
    fn snake_case_enums() {
        let a: BitAlignment = serde_json::from_str("\"bit_3\"").unwrap();
        assert_eq!(a.bit_offset(), Some(3));
        let u: IdentUsage = serde_json::from_str("\"define_enum_member\"").unwrap();
        assert!(u.is_definition());
        let m: IoMethod = serde_json::from_str("\"config_bit_order_msb\"").unwrap();
        assert_eq!(m, IoMethod::ConfigBitOrderMsb);
        assert!(serde_json::from_str::<Endian>("\"middle\"").is_err());
    }

    #[test]
    fn block_traits_are_a_bit_set() {
        let t: BlockTrait = serde_json::from_str("48").unwrap();
        assert!(t.contains(BlockTrait::STRUCT));
        assert!(t.contains(BlockTrait::CONDITIONAL));
        assert!(!t.contains(BlockTrait::BIT_FIELD));
        assert_eq!(BlockTrait::STRUCT | BlockTrait::CONDITIONAL, t);
        assert_eq!(BlockTrait::CONTROL_FLOW_CHANGE.bits(), 8388608);
    }
}
