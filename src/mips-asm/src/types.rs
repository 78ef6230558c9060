use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of one instruction or `.word` in bytes
pub const WORD_SIZE: u32 = 4;

/// Number of general purpose registers
pub const REGISTER_COUNT: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    Add,
    Sub,
    Slt,
    Sltu,
    Mult,
    Multu,
    Div,
    Divu,
    Mfhi,
    Mflo,
    Lis,
    Lw,
    Sw,
    Beq,
    Bne,
    Jr,
    Jalr,
}

impl Opcode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Opcode::Add),
            "sub" => Some(Opcode::Sub),
            "slt" => Some(Opcode::Slt),
            "sltu" => Some(Opcode::Sltu),
            "mult" => Some(Opcode::Mult),
            "multu" => Some(Opcode::Multu),
            "div" => Some(Opcode::Div),
            "divu" => Some(Opcode::Divu),
            "mfhi" => Some(Opcode::Mfhi),
            "mflo" => Some(Opcode::Mflo),
            "lis" => Some(Opcode::Lis),
            "lw" => Some(Opcode::Lw),
            "sw" => Some(Opcode::Sw),
            "beq" => Some(Opcode::Beq),
            "bne" => Some(Opcode::Bne),
            "jr" => Some(Opcode::Jr),
            "jalr" => Some(Opcode::Jalr),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Slt => "slt",
            Opcode::Sltu => "sltu",
            Opcode::Mult => "mult",
            Opcode::Multu => "multu",
            Opcode::Div => "div",
            Opcode::Divu => "divu",
            Opcode::Mfhi => "mfhi",
            Opcode::Mflo => "mflo",
            Opcode::Lis => "lis",
            Opcode::Lw => "lw",
            Opcode::Sw => "sw",
            Opcode::Beq => "beq",
            Opcode::Bne => "bne",
            Opcode::Jr => "jr",
            Opcode::Jalr => "jalr",
        }
    }

    pub fn format(&self) -> InstructionFormat {
        match self {
            Opcode::Add | Opcode::Sub | Opcode::Slt | Opcode::Sltu => InstructionFormat::ThreeReg,
            Opcode::Mult | Opcode::Multu | Opcode::Div | Opcode::Divu => InstructionFormat::TwoReg,
            Opcode::Mfhi | Opcode::Mflo | Opcode::Lis | Opcode::Jr | Opcode::Jalr => {
                InstructionFormat::OneReg
            }
            Opcode::Lw | Opcode::Sw => InstructionFormat::Memory,
            Opcode::Beq | Opcode::Bne => InstructionFormat::Branch,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Operand shape of an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionFormat {
    /// `op $d, $s, $t`
    ThreeReg,
    /// `op $s, $t`
    TwoReg,
    /// `op $r`
    OneReg,
    /// `op $t, i($s)`
    Memory,
    /// `op $s, $t, i` or `op $s, $t, label`
    Branch,
}

/// Branch destination before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchTarget {
    /// Word offset from the following instruction, already range checked
    Offset(i32),
    Label(String),
}

/// `.word` operand before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordValue {
    Value(u32),
    Label(String),
}

/// One code word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    ThreeReg { opcode: Opcode, d: u8, s: u8, t: u8 },
    TwoReg { opcode: Opcode, s: u8, t: u8 },
    OneReg { opcode: Opcode, r: u8 },
    /// 16-bit field, already range checked
    Memory { opcode: Opcode, t: u8, offset: i32, s: u8 },
    Branch { opcode: Opcode, s: u8, t: u8, target: BranchTarget },
    Word(WordValue),
}

impl Instruction {
    /// Label this word refers to, if any
    pub fn label(&self) -> Option<&str> {
        match self {
            Instruction::Branch {
                target: BranchTarget::Label(label),
                ..
            } => Some(label),
            Instruction::Word(WordValue::Label(label)) => Some(label),
            _ => None,
        }
    }
}

/// Contents of one source line after its labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Instruction(Instruction),
    Import(String),
    Export(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub labels: Vec<String>,
    pub item: Option<Item>,
    pub line_number: usize,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Relocatable module with header and symbol table
    #[default]
    Merl,
    /// Code words only, loaded at address 0
    Raw,
}

#[derive(Debug, Clone, Default)]
pub struct AssemblerOptions {
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_round_trip_names() {
        for name in ["add", "sltu", "multu", "mflo", "lis", "sw", "bne", "jalr"] {
            assert_eq!(Opcode::from_str(name).map(|o| o.to_str()), Some(name));
        }
        assert_eq!(Opcode::from_str("ADD"), None);
        assert_eq!(Opcode::from_str("addi"), None);
    }

    #[test]
    fn test_formats() {
        assert_eq!(Opcode::Slt.format(), InstructionFormat::ThreeReg);
        assert_eq!(Opcode::Divu.format(), InstructionFormat::TwoReg);
        assert_eq!(Opcode::Jr.format(), InstructionFormat::OneReg);
        assert_eq!(Opcode::Lw.format(), InstructionFormat::Memory);
        assert_eq!(Opcode::Beq.format(), InstructionFormat::Branch);
    }
}
