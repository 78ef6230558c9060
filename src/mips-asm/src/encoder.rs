use crate::error::AsmError;
use crate::types::{BranchTarget, Instruction, Opcode, WordValue};

/// Turns a resolved instruction into its 32-bit machine word
#[derive(Default)]
pub struct InstructionEncoder;

impl InstructionEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, instruction: &Instruction) -> Result<u32, AsmError> {
        let word = match instruction {
            Instruction::ThreeReg { opcode, d, s, t } => {
                reg(*s, 21) | reg(*t, 16) | reg(*d, 11) | function(*opcode)
            }
            Instruction::TwoReg { opcode, s, t } => reg(*s, 21) | reg(*t, 16) | function(*opcode),
            Instruction::OneReg { opcode, r } => match opcode {
                Opcode::Jr | Opcode::Jalr => reg(*r, 21) | function(*opcode),
                _ => reg(*r, 11) | function(*opcode),
            },
            Instruction::Memory { opcode, t, offset, s } => {
                primary(*opcode) | reg(*s, 21) | reg(*t, 16) | immediate(*offset)
            }
            Instruction::Branch { opcode, s, t, target } => match target {
                BranchTarget::Offset(offset) => {
                    primary(*opcode) | reg(*s, 21) | reg(*t, 16) | immediate(*offset)
                }
                BranchTarget::Label(label) => return Err(AsmError::Unresolved(label.clone())),
            },
            Instruction::Word(WordValue::Value(value)) => *value,
            Instruction::Word(WordValue::Label(label)) => {
                return Err(AsmError::Unresolved(label.clone()))
            }
        };
        Ok(word)
    }
}

fn reg(number: u8, shift: u32) -> u32 {
    (number as u32 & 0x1f) << shift
}

fn immediate(value: i32) -> u32 {
    value as u32 & 0xffff
}

/// Function field of register-format opcodes
fn function(opcode: Opcode) -> u32 {
    match opcode {
        Opcode::Add => 32,
        Opcode::Sub => 34,
        Opcode::Slt => 42,
        Opcode::Sltu => 43,
        Opcode::Mult => 24,
        Opcode::Multu => 25,
        Opcode::Div => 26,
        Opcode::Divu => 27,
        Opcode::Mfhi => 16,
        Opcode::Mflo => 18,
        Opcode::Lis => 20,
        Opcode::Jr => 8,
        Opcode::Jalr => 9,
        Opcode::Lw | Opcode::Sw | Opcode::Beq | Opcode::Bne => 0,
    }
}

/// Primary opcode bits of immediate-format opcodes
fn primary(opcode: Opcode) -> u32 {
    match opcode {
        Opcode::Lw => 0x8c00_0000,
        Opcode::Sw => 0xac00_0000,
        Opcode::Beq => 0x1000_0000,
        Opcode::Bne => 0x1400_0000,
        _ => 0,
    }
}
