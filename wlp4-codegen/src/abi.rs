//! WLP4 MIPS ABI Implementation
//!
//! This module fixes the register roles every piece of generated code relies
//! on and tracks the stack frame of the procedure currently being generated.

use crate::asm::{AsmInst, Reg};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use wlp4_common::WORD_SIZE;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbiError {
    #[error("no stack slot for '{name}' in procedure {procedure}")]
    MissingSlot { procedure: String, name: String },

    #[error("'{name}' already has a stack slot in procedure {procedure}")]
    DuplicateSlot { procedure: String, name: String },
}

/// WLP4 Calling Convention
///
/// Register Usage:
/// - $0: always zero
/// - $1, $2: entry arguments, and the argument of `new`, `delete` and `print`
/// - $3: accumulator, every expression leaves its value here
/// - $4: the word size
/// - $5: second operand, also holds call targets
/// - $6, $7: comparison temporaries
/// - $10: address of `print`
/// - $11: one, doubling as `true` and the null pointer
/// - $29, $30, $31: frame pointer, stack pointer, return address
///
/// The caller saves $29 and $31, pushes arguments left to right, and pops
/// them again after the call. The callee sets its frame pointer one word
/// below the last argument and resets the stack from it on return.
pub struct CallingConvention;

impl CallingConvention {
    pub const ZERO: Reg = Reg::R0;
    pub const ARG1: Reg = Reg::R1;
    pub const ARG2: Reg = Reg::R2;
    pub const ACC: Reg = Reg::R3;
    pub const WORD: Reg = Reg::R4;
    pub const SCRATCH: Reg = Reg::R5;
    pub const TEMP1: Reg = Reg::R6;
    pub const TEMP2: Reg = Reg::R7;
    pub const PRINT: Reg = Reg::R10;
    pub const ONE: Reg = Reg::R11;
    pub const FRAME_PTR: Reg = Reg::R29;
    pub const STACK_PTR: Reg = Reg::R30;
    pub const RETURN_ADDR: Reg = Reg::R31;

    /// Entry procedure label
    pub const ENTRY: &'static str = "wain";

    /// Runtime routines every program imports
    pub const INIT: &'static str = "init";
    pub const NEW: &'static str = "new";
    pub const DELETE: &'static str = "delete";
    pub const PRINT_ROUTINE: &'static str = "print";
    pub const IMPORTS: [&'static str; 4] = [Self::INIT, Self::NEW, Self::DELETE, Self::PRINT_ROUTINE];

    /// Value of the null pointer
    pub const NULL: i32 = 1;
}

/// Stack Frame Layout
///
/// Every slot is addressed from the frame pointer. Arguments pushed by the
/// caller sit above it at `n*4 .. 4`, locals below it at `0, -4, ...`. The
/// running offset follows every push and pop, so a local declared next is
/// bound to the slot its initial value is about to be pushed into.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    procedure: String,
    slots: BTreeMap<String, i32>,
    offset: i32,
}

impl Frame {
    pub fn new(procedure: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            slots: BTreeMap::new(),
            offset: 0,
        }
    }

    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    /// Current offset of the next free slot, relative to the frame pointer
    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn slots(&self) -> &BTreeMap<String, i32> {
        &self.slots
    }

    /// Bind the parameters the caller pushed, leftmost deepest
    pub fn bind_params<'a>(
        &mut self,
        names: impl ExactSizeIterator<Item = &'a str>,
    ) -> Result<(), AbiError> {
        self.offset = names.len() as i32 * WORD_SIZE;
        for name in names {
            self.bind(name)?;
            self.offset -= WORD_SIZE;
        }
        Ok(())
    }

    /// Bind a local to the slot the next push fills
    pub fn bind_local(&mut self, name: &str) -> Result<i32, AbiError> {
        self.bind(name)
    }

    fn bind(&mut self, name: &str) -> Result<i32, AbiError> {
        if self.slots.contains_key(name) {
            return Err(AbiError::DuplicateSlot {
                procedure: self.procedure.clone(),
                name: name.to_string(),
            });
        }
        debug!("{}: {} at offset {}", self.procedure, name, self.offset);
        self.slots.insert(name.to_string(), self.offset);
        Ok(self.offset)
    }

    pub fn slot(&self, name: &str) -> Result<i32, AbiError> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| AbiError::MissingSlot {
                procedure: self.procedure.clone(),
                name: name.to_string(),
            })
    }

    /// Store `reg` below the stack pointer and claim the word
    pub fn push(&mut self, reg: Reg) -> [AsmInst; 2] {
        self.offset -= WORD_SIZE;
        [
            AsmInst::annotated(
                AsmInst::Sw(reg, -WORD_SIZE, CallingConvention::STACK_PTR),
                format!("push {}", reg),
            ),
            AsmInst::Sub(
                CallingConvention::STACK_PTR,
                CallingConvention::STACK_PTR,
                CallingConvention::WORD,
            ),
        ]
    }

    /// Release the top word into `reg`
    pub fn pop(&mut self, reg: Reg) -> [AsmInst; 2] {
        self.offset += WORD_SIZE;
        [
            AsmInst::Add(
                CallingConvention::STACK_PTR,
                CallingConvention::STACK_PTR,
                CallingConvention::WORD,
            ),
            AsmInst::annotated(
                AsmInst::Lw(reg, -WORD_SIZE, CallingConvention::STACK_PTR),
                format!("pop {}", reg),
            ),
        ]
    }

    /// Account for `words` words popped without loading them
    pub fn release(&mut self, words: usize) {
        self.offset += words as i32 * WORD_SIZE;
    }
}
