//! MIPS Assembly Instruction Definitions
//!
//! This module defines the subset of the MIPS instruction set the code
//! generator emits, plus the assembler directives it relies on.

use std::fmt;

/// MIPS registers used by generated code
///
/// Only the registers with a fixed role in the calling convention appear
/// here; see [`crate::abi::CallingConvention`] for what each one holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R10,
    R11,
    R29,
    R30,
    R31,
}

impl Reg {
    pub fn number(&self) -> u8 {
        match self {
            Reg::R0 => 0,
            Reg::R1 => 1,
            Reg::R2 => 2,
            Reg::R3 => 3,
            Reg::R4 => 4,
            Reg::R5 => 5,
            Reg::R6 => 6,
            Reg::R7 => 7,
            Reg::R10 => 10,
            Reg::R11 => 11,
            Reg::R29 => 29,
            Reg::R30 => 30,
            Reg::R31 => 31,
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.number())
    }
}

/// Branch destination: a label or a raw word offset
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Label(String),
    Offset(i32),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Label(label) => write!(f, "{}", label),
            Target::Offset(offset) => write!(f, "{}", offset),
        }
    }
}

/// Operand of a `.word` directive
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    Value(i32),
    Label(String),
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Value(value) => write!(f, "{}", value),
            Word::Label(label) => write!(f, "{}", label),
        }
    }
}

/// MIPS Assembly Instructions
#[derive(Debug, Clone, PartialEq)]
pub enum AsmInst {
    // Arithmetic
    Add(Reg, Reg, Reg),           // rd = rs + rt
    Sub(Reg, Reg, Reg),           // rd = rs - rt
    Mult(Reg, Reg),               // hi:lo = rs * rt
    Div(Reg, Reg),                // lo = rs / rt, hi = rs % rt
    Mfhi(Reg),                    // rd = hi
    Mflo(Reg),                    // rd = lo
    Lis(Reg),                     // rd = next word, skip it

    // Comparison
    Slt(Reg, Reg, Reg),           // rd = (rs < rt) ? 1 : 0
    Sltu(Reg, Reg, Reg),          // rd = (rs < rt) ? 1 : 0 (unsigned)

    // Memory
    Lw(Reg, i32, Reg),            // rt = memory[rs + offset]
    Sw(Reg, i32, Reg),            // memory[rs + offset] = rt

    // Control flow
    Beq(Reg, Reg, Target),
    Bne(Reg, Reg, Target),
    Jr(Reg),
    Jalr(Reg),                    // $31 = pc, pc = rs

    // Directives
    Word(Word),
    Import(String),
    Label(String),
    Comment(String),

    /// An instruction with a trailing comment
    Annotated(Box<AsmInst>, String),
}

impl AsmInst {
    pub fn annotated(inst: AsmInst, comment: impl Into<String>) -> Self {
        AsmInst::Annotated(Box::new(inst), comment.into())
    }

    /// The instruction with every comment removed, or `None` for a comment line
    pub fn without_comments(&self) -> Option<&AsmInst> {
        match self {
            AsmInst::Comment(_) => None,
            AsmInst::Annotated(inst, _) => inst.without_comments(),
            other => Some(other),
        }
    }
}

impl fmt::Display for AsmInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmInst::Add(rd, rs, rt) => write!(f, "add {}, {}, {}", rd, rs, rt),
            AsmInst::Sub(rd, rs, rt) => write!(f, "sub {}, {}, {}", rd, rs, rt),
            AsmInst::Mult(rs, rt) => write!(f, "mult {}, {}", rs, rt),
            AsmInst::Div(rs, rt) => write!(f, "div {}, {}", rs, rt),
            AsmInst::Mfhi(rd) => write!(f, "mfhi {}", rd),
            AsmInst::Mflo(rd) => write!(f, "mflo {}", rd),
            AsmInst::Lis(rd) => write!(f, "lis {}", rd),

            AsmInst::Slt(rd, rs, rt) => write!(f, "slt {}, {}, {}", rd, rs, rt),
            AsmInst::Sltu(rd, rs, rt) => write!(f, "sltu {}, {}, {}", rd, rs, rt),

            AsmInst::Lw(rt, offset, rs) => write!(f, "lw {}, {}({})", rt, offset, rs),
            AsmInst::Sw(rt, offset, rs) => write!(f, "sw {}, {}({})", rt, offset, rs),

            AsmInst::Beq(rs, rt, target) => write!(f, "beq {}, {}, {}", rs, rt, target),
            AsmInst::Bne(rs, rt, target) => write!(f, "bne {}, {}, {}", rs, rt, target),
            AsmInst::Jr(rs) => write!(f, "jr {}", rs),
            AsmInst::Jalr(rs) => write!(f, "jalr {}", rs),

            AsmInst::Word(word) => write!(f, ".word {}", word),
            AsmInst::Import(name) => write!(f, ".import {}", name),
            AsmInst::Label(label) => write!(f, "{}:", label),
            AsmInst::Comment(text) => write!(f, "; {}", text),
            AsmInst::Annotated(inst, text) => write!(f, "{} ; {}", inst, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_display() {
        assert_eq!(format!("{}", Reg::R0), "$0");
        assert_eq!(format!("{}", Reg::R11), "$11");
        assert_eq!(format!("{}", Reg::R31), "$31");
    }

    #[test]
    fn test_instruction_display() {
        assert_eq!(format!("{}", AsmInst::Add(Reg::R3, Reg::R5, Reg::R3)), "add $3, $5, $3");
        assert_eq!(format!("{}", AsmInst::Mult(Reg::R3, Reg::R4)), "mult $3, $4");
        assert_eq!(format!("{}", AsmInst::Lw(Reg::R3, -4, Reg::R29)), "lw $3, -4($29)");
        assert_eq!(format!("{}", AsmInst::Sw(Reg::R31, -4, Reg::R30)), "sw $31, -4($30)");
        assert_eq!(
            format!("{}", AsmInst::Bne(Reg::R3, Reg::R0, Target::Offset(1))),
            "bne $3, $0, 1"
        );
        assert_eq!(
            format!("{}", AsmInst::Beq(Reg::R0, Reg::R0, Target::Label("Lfloop0".into()))),
            "beq $0, $0, Lfloop0"
        );
        assert_eq!(format!("{}", AsmInst::Word(Word::Value(-7))), ".word -7");
        assert_eq!(format!("{}", AsmInst::Word(Word::Label("wain".into()))), ".word wain");
        assert_eq!(format!("{}", AsmInst::Import("print".into())), ".import print");
        assert_eq!(format!("{}", AsmInst::Label("wain".into())), "wain:");
    }

    #[test]
    fn test_comments() {
        let inst = AsmInst::annotated(AsmInst::Lis(Reg::R4), "$4 holds 4");
        assert_eq!(inst.to_string(), "lis $4 ; $4 holds 4");
        assert_eq!(inst.without_comments(), Some(&AsmInst::Lis(Reg::R4)));
        assert_eq!(AsmInst::Comment("x".into()).without_comments(), None);
    }
}
