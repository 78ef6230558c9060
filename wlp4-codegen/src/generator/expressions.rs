//! Expression, lvalue and test lowering; every result ends up in `$3`

use super::{procedure_label, CodeGenerator, Context};
use crate::abi::CallingConvention as CC;
use crate::asm::{AsmInst, Reg, Target, Word};
use crate::emit::CodegenError;
use wlp4_common::Type;
use wlp4_frontend::ast::{BinaryOp, CompareOp, Expr, LValue, Test};

impl<'a> CodeGenerator<'a> {
    pub(crate) fn expr(&mut self, cx: &mut Context<'a>, expr: &Expr) -> Result<(), CodegenError> {
        match expr {
            Expr::Num(value) => self.load(CC::ACC, Word::Value(*value)),
            Expr::Null => self.emit(AsmInst::annotated(
                AsmInst::Add(CC::ACC, CC::ZERO, CC::ONE),
                "NULL",
            )),
            Expr::Id(name) => {
                let offset = cx.frame.slot(name)?;
                self.emit(AsmInst::annotated(
                    AsmInst::Lw(CC::ACC, offset, CC::FRAME_PTR),
                    format!("load {}", name),
                ));
            }
            Expr::AddressOf(lvalue) => self.address(cx, lvalue)?,
            Expr::Deref(inner) => {
                self.expr(cx, inner)?;
                self.emit(AsmInst::Lw(CC::ACC, 0, CC::ACC));
            }
            Expr::New(size) => self.new_array(cx, size)?,
            Expr::Call { name, args } => self.call(cx, name, args)?,
            Expr::Binary { op, lhs, rhs } => self.binary(cx, *op, lhs, rhs)?,
        }
        Ok(())
    }

    /// Address of an lvalue; `&*e` is just `e`
    pub(crate) fn address(&mut self, cx: &mut Context<'a>, lvalue: &LValue) -> Result<(), CodegenError> {
        match lvalue {
            LValue::Id(name) => {
                let offset = cx.frame.slot(name)?;
                self.comment(format!("address of {}", name));
                self.load(CC::ACC, Word::Value(offset));
                self.emit(AsmInst::Add(CC::ACC, CC::ACC, CC::FRAME_PTR));
            }
            LValue::Deref(inner) => self.expr(cx, inner)?,
        }
        Ok(())
    }

    /// Evaluate `lhs` into `$5` and `rhs` into `$3`
    fn operands(&mut self, cx: &mut Context<'a>, lhs: &Expr, rhs: &Expr) -> Result<(), CodegenError> {
        self.expr(cx, lhs)?;
        self.emit_all(cx.frame.push(CC::ACC));
        self.expr(cx, rhs)?;
        self.emit_all(cx.frame.pop(CC::SCRATCH));
        Ok(())
    }

    /// Scale an int operand to a byte distance
    fn scale(&mut self, reg: Reg) {
        self.emit(AsmInst::Mult(reg, CC::WORD));
        self.emit(AsmInst::annotated(AsmInst::Mflo(reg), "times the word size"));
    }

    fn binary(
        &mut self,
        cx: &mut Context<'a>,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(), CodegenError> {
        let left = cx.typer.type_of(lhs)?;
        let right = cx.typer.type_of(rhs)?;
        self.comment(format!("{} {} {}", left, op, right));
        self.operands(cx, lhs, rhs)?;

        let (acc, scratch) = (CC::ACC, CC::SCRATCH);
        match (op, left, right) {
            (BinaryOp::Add, _, _) => {
                match (left, right) {
                    (Type::IntPointer, Type::Int) => self.scale(acc),
                    (Type::Int, Type::IntPointer) => self.scale(scratch),
                    _ => {}
                }
                self.emit(AsmInst::Add(acc, scratch, acc));
            }
            (BinaryOp::Sub, Type::IntPointer, Type::IntPointer) => {
                self.emit(AsmInst::Sub(acc, scratch, acc));
                self.emit(AsmInst::Div(acc, CC::WORD));
                self.emit(AsmInst::annotated(AsmInst::Mflo(acc), "distance in words"));
            }
            (BinaryOp::Sub, _, _) => {
                if left.is_pointer() {
                    self.scale(acc);
                }
                self.emit(AsmInst::Sub(acc, scratch, acc));
            }
            (BinaryOp::Mul, _, _) => {
                self.emit(AsmInst::Mult(scratch, acc));
                self.emit(AsmInst::Mflo(acc));
            }
            (BinaryOp::Div, _, _) => {
                self.emit(AsmInst::Div(scratch, acc));
                self.emit(AsmInst::Mflo(acc));
            }
            (BinaryOp::Mod, _, _) => {
                self.emit(AsmInst::Div(scratch, acc));
                self.emit(AsmInst::Mfhi(acc));
            }
        }
        Ok(())
    }

    fn call(&mut self, cx: &mut Context<'a>, name: &str, args: &[Expr]) -> Result<(), CodegenError> {
        self.comment(format!("call {}", name));
        self.emit_all(cx.frame.push(CC::FRAME_PTR));
        self.emit_all(cx.frame.push(CC::RETURN_ADDR));
        for arg in args {
            self.expr(cx, arg)?;
            self.emit_all(cx.frame.push(CC::ACC));
        }
        self.jump_and_link(&procedure_label(name));
        self.drop_words(&mut cx.frame, args.len());
        self.emit_all(cx.frame.pop(CC::RETURN_ADDR));
        self.emit_all(cx.frame.pop(CC::FRAME_PTR));
        Ok(())
    }

    fn new_array(&mut self, cx: &mut Context<'a>, size: &Expr) -> Result<(), CodegenError> {
        self.comment("new int[]");
        self.emit_all(cx.frame.push(CC::ARG1));
        self.expr(cx, size)?;
        self.emit(AsmInst::annotated(
            AsmInst::Add(CC::ARG1, CC::ACC, CC::ZERO),
            "new takes the size in $1",
        ));
        self.emit_all(cx.frame.push(CC::RETURN_ADDR));
        self.jump_and_link(CC::NEW);
        self.emit_all(cx.frame.pop(CC::RETURN_ADDR));
        // new returns 0 on failure, which must read as NULL
        self.emit(AsmInst::Bne(CC::ACC, CC::ZERO, Target::Offset(1)));
        self.emit(AsmInst::Add(CC::ACC, CC::ONE, CC::ZERO));
        self.emit_all(cx.frame.pop(CC::ARG1));
        Ok(())
    }

    /// Leave 1 in `$3` when the test holds and 0 otherwise
    pub(crate) fn test(&mut self, cx: &mut Context<'a>, test: &Test) -> Result<(), CodegenError> {
        let ty = cx.typer.type_of(&test.lhs)?;
        self.comment(format!("{} {} {}", ty, test.op, ty));
        self.operands(cx, &test.lhs, &test.rhs)?;

        let less = |rd, rs, rt| match ty {
            Type::Int => AsmInst::Slt(rd, rs, rt),
            Type::IntPointer => AsmInst::Sltu(rd, rs, rt),
        };
        let (acc, scratch) = (CC::ACC, CC::SCRATCH);
        match test.op {
            CompareOp::Lt => self.emit(less(acc, scratch, acc)),
            CompareOp::Gt => self.emit(less(acc, acc, scratch)),
            CompareOp::Ge => {
                self.emit(less(acc, scratch, acc));
                self.emit(AsmInst::Sub(acc, CC::ONE, acc));
            }
            CompareOp::Le => {
                self.emit(less(acc, acc, scratch));
                self.emit(AsmInst::Sub(acc, CC::ONE, acc));
            }
            CompareOp::Ne | CompareOp::Eq => {
                self.emit(less(CC::TEMP1, acc, scratch));
                self.emit(less(CC::TEMP2, scratch, acc));
                self.emit(AsmInst::Add(acc, CC::TEMP1, CC::TEMP2));
                if test.op == CompareOp::Eq {
                    self.emit(AsmInst::Sub(acc, CC::ONE, acc));
                }
            }
        }
        Ok(())
    }
}
