//! Lowering of a checked WLP4 program to MIPS assembly
//!
//! Generation is a single forward walk. Each procedure gets a fresh
//! [`Frame`] that assigns stack slots as declarations are reached, and every
//! expression leaves its value in the accumulator. Nothing is written out
//! until the whole program has been generated.

mod expressions;
mod statements;

use crate::abi::{CallingConvention as CC, Frame};
use crate::asm::{AsmInst, Reg, Word};
use crate::emit::{emit_instructions, CodegenError, CodegenOptions};
use log::debug;
use wlp4_common::{Type, WORD_SIZE};
use wlp4_frontend::ast::{Body, Declaration, Initializer, Main, Procedure, Program};
use wlp4_frontend::semantic::ExprTyper;
use wlp4_frontend::{CheckedProgram, SymbolTable};

/// Generated code plus the frame layout chosen for every procedure
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub instructions: Vec<AsmInst>,
    /// In emission order, `wain` last
    pub frames: Vec<Frame>,
}

impl Assembly {
    pub fn frame(&self, procedure: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.procedure() == procedure)
    }

    pub fn to_text(&self, options: &CodegenOptions) -> String {
        emit_instructions(&self.instructions, options)
    }
}

/// Label of a procedure's first instruction
///
/// Ordinary procedures are prefixed so they can never clash with the
/// runtime imports or with control-flow labels.
pub fn procedure_label(name: &str) -> String {
    if name == CC::ENTRY {
        name.to_string()
    } else {
        format!("F{}", name)
    }
}

/// Per-procedure generation state
pub(crate) struct Context<'a> {
    name: &'a str,
    frame: Frame,
    typer: ExprTyper<'a>,
}

pub struct CodeGenerator<'a> {
    program: &'a Program,
    symbols: &'a SymbolTable,
    code: Vec<AsmInst>,
    frames: Vec<Frame>,
    /// Shared by every control-flow label in the unit
    labels: usize,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(checked: &'a CheckedProgram) -> Self {
        Self {
            program: &checked.program,
            symbols: &checked.symbols,
            code: Vec::new(),
            frames: Vec::new(),
            labels: 0,
        }
    }

    pub fn generate(mut self) -> Result<Assembly, CodegenError> {
        let program = self.program;
        self.prologue(&program.main);
        for procedure in &program.procedures {
            self.procedure(procedure)?;
        }
        self.main(&program.main)?;
        debug!(
            "generated {} instructions, {} labels",
            self.code.len(),
            self.labels
        );
        Ok(Assembly {
            instructions: self.code,
            frames: self.frames,
        })
    }

    pub(crate) fn emit(&mut self, inst: AsmInst) {
        self.code.push(inst);
    }

    pub(crate) fn emit_all(&mut self, insts: impl IntoIterator<Item = AsmInst>) {
        self.code.extend(insts);
    }

    pub(crate) fn comment(&mut self, text: impl Into<String>) {
        self.code.push(AsmInst::Comment(text.into()));
    }

    /// `lis reg` followed by the word to load
    pub(crate) fn load(&mut self, reg: Reg, word: Word) {
        self.emit(AsmInst::Lis(reg));
        self.emit(AsmInst::Word(word));
    }

    /// Call the routine whose address is in `$5` after loading `label` there
    pub(crate) fn jump_and_link(&mut self, label: &str) {
        self.load(CC::SCRATCH, Word::Label(label.to_string()));
        self.emit(AsmInst::Jalr(CC::SCRATCH));
    }

    /// Pop `count` argument words the caller pushed
    pub(crate) fn drop_words(&mut self, frame: &mut Frame, count: usize) {
        if count == 0 {
            return;
        }
        self.load(CC::SCRATCH, Word::Value(count as i32 * WORD_SIZE));
        self.emit(AsmInst::Add(CC::STACK_PTR, CC::STACK_PTR, CC::SCRATCH));
        frame.release(count);
    }

    /// A fresh suffix for one control-flow construct
    pub(crate) fn next_label_id(&mut self) -> usize {
        let id = self.labels;
        self.labels += 1;
        id
    }

    fn context(&self, name: &'a str) -> Result<Context<'a>, CodegenError> {
        Ok(Context {
            name,
            frame: Frame::new(name),
            typer: ExprTyper::new(self.symbols, name)?,
        })
    }

    fn prologue(&mut self, main: &Main) {
        let mut frame = Frame::new("prologue");
        self.comment("prologue");
        for name in CC::IMPORTS {
            self.emit(AsmInst::Import(name.to_string()));
        }
        self.emit(AsmInst::annotated(AsmInst::Lis(CC::WORD), "$4 holds the word size"));
        self.emit(AsmInst::Word(Word::Value(WORD_SIZE)));
        self.emit(AsmInst::annotated(AsmInst::Lis(CC::PRINT), "$10 holds the address of print"));
        self.emit(AsmInst::Word(Word::Label(CC::PRINT_ROUTINE.to_string())));
        self.emit(AsmInst::annotated(AsmInst::Lis(CC::ONE), "$11 holds one"));
        self.emit(AsmInst::Word(Word::Value(1)));
        self.emit(AsmInst::annotated(
            AsmInst::Sub(CC::FRAME_PTR, CC::STACK_PTR, CC::WORD),
            "set up frame pointer",
        ));

        // wain is called like any other procedure, with $1 and $2 as its arguments
        self.emit_all(frame.push(CC::RETURN_ADDR));
        self.emit_all(frame.push(CC::ARG1));
        self.emit_all(frame.push(CC::ARG2));
        self.jump_and_link(CC::ENTRY);
        self.drop_words(&mut frame, main.params().len());
        self.emit_all(frame.pop(CC::RETURN_ADDR));
        self.emit(AsmInst::Jr(CC::RETURN_ADDR));
    }

    fn procedure(&mut self, procedure: &'a Procedure) -> Result<(), CodegenError> {
        debug!("generating procedure {}", procedure.name);
        let mut cx = self.context(&procedure.name)?;
        self.comment(format!("procedure {}", procedure.name));
        self.emit(AsmInst::Label(procedure_label(&procedure.name)));
        self.emit(AsmInst::annotated(
            AsmInst::Sub(CC::FRAME_PTR, CC::STACK_PTR, CC::WORD),
            "set up frame pointer",
        ));
        cx.frame
            .bind_params(procedure.params.iter().map(|p| p.name.as_str()))?;
        self.body(&mut cx, &procedure.body)
    }

    fn main(&mut self, main: &'a Main) -> Result<(), CodegenError> {
        debug!("generating procedure {}", Main::NAME);
        let mut cx = self.context(Main::NAME)?;
        self.comment(format!("procedure {}", Main::NAME));
        self.emit(AsmInst::Label(procedure_label(Main::NAME)));

        // init expects the array length in $2, or 0 when wain takes two ints
        self.emit_all(cx.frame.push(CC::RETURN_ADDR));
        if main.first.ty == Type::Int {
            self.emit(AsmInst::Add(CC::ARG2, CC::ZERO, CC::ZERO));
        }
        self.jump_and_link(CC::INIT);
        self.emit_all(cx.frame.pop(CC::RETURN_ADDR));

        self.emit(AsmInst::annotated(
            AsmInst::Sub(CC::FRAME_PTR, CC::STACK_PTR, CC::WORD),
            "set up frame pointer",
        ));
        cx.frame
            .bind_params(main.params().into_iter().map(|p| p.name.as_str()))?;
        self.body(&mut cx, &main.body)
    }

    fn body(&mut self, cx: &mut Context<'a>, body: &Body) -> Result<(), CodegenError> {
        for declaration in &body.declarations {
            self.declaration(cx, declaration)?;
        }
        for statement in &body.statements {
            self.statement(cx, statement)?;
        }
        self.comment("return value");
        self.expr(cx, &body.ret)?;

        self.comment(format!("epilogue {}", cx.name));
        self.emit(AsmInst::annotated(
            AsmInst::Add(CC::STACK_PTR, CC::FRAME_PTR, CC::WORD),
            "release locals",
        ));
        self.emit(AsmInst::Jr(CC::RETURN_ADDR));
        self.frames.push(cx.frame.clone());
        Ok(())
    }

    fn declaration(
        &mut self,
        cx: &mut Context<'a>,
        declaration: &Declaration,
    ) -> Result<(), CodegenError> {
        let name = &declaration.dcl.name;
        let value = match declaration.init {
            Initializer::Num(value) => value,
            Initializer::Null => CC::NULL,
        };
        self.comment(format!("{} {}", declaration.dcl.ty, name));
        self.load(CC::SCRATCH, Word::Value(value));
        cx.frame.bind_local(name)?;
        self.emit_all(cx.frame.push(CC::SCRATCH));
        Ok(())
    }
}

/// Generate the assembly text for a checked program
pub fn generate(checked: &CheckedProgram, options: &CodegenOptions) -> Result<String, CodegenError> {
    let assembly = CodeGenerator::new(checked).generate()?;
    Ok(assembly.to_text(options))
}
