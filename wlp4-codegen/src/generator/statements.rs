//! Statement lowering

use super::{CodeGenerator, Context};
use crate::abi::CallingConvention as CC;
use crate::asm::{AsmInst, Target};
use crate::emit::CodegenError;
use wlp4_frontend::ast::Statement;

impl<'a> CodeGenerator<'a> {
    /// Procedure-qualified control-flow label
    fn label(&self, procedure: &str, kind: &str, id: usize) -> String {
        format!("L{}{}{}", procedure, kind, id)
    }

    pub(crate) fn statement(
        &mut self,
        cx: &mut Context<'a>,
        statement: &Statement,
    ) -> Result<(), CodegenError> {
        match statement {
            Statement::Assign { target, value } => {
                self.comment("assignment");
                self.address(cx, target)?;
                self.emit_all(cx.frame.push(CC::ACC));
                self.expr(cx, value)?;
                self.emit_all(cx.frame.pop(CC::SCRATCH));
                self.emit(AsmInst::Sw(CC::ACC, 0, CC::SCRATCH));
            }
            Statement::If {
                test,
                then_branch,
                else_branch,
            } => {
                let id = self.next_label_id();
                let else_label = self.label(cx.name, "else", id);
                let end_label = self.label(cx.name, "endif", id);

                self.comment("if");
                self.test(cx, test)?;
                self.emit(AsmInst::Bne(CC::ACC, CC::ONE, Target::Label(else_label.clone())));
                for s in then_branch {
                    self.statement(cx, s)?;
                }
                self.emit(AsmInst::Beq(CC::ZERO, CC::ZERO, Target::Label(end_label.clone())));
                self.emit(AsmInst::Label(else_label));
                for s in else_branch {
                    self.statement(cx, s)?;
                }
                self.emit(AsmInst::Label(end_label));
            }
            Statement::While { test, body } => {
                let id = self.next_label_id();
                let loop_label = self.label(cx.name, "loop", id);
                let end_label = self.label(cx.name, "endWhile", id);

                self.comment("while");
                self.emit(AsmInst::Label(loop_label.clone()));
                self.test(cx, test)?;
                self.emit(AsmInst::Bne(CC::ACC, CC::ONE, Target::Label(end_label.clone())));
                for s in body {
                    self.statement(cx, s)?;
                }
                self.emit(AsmInst::Beq(CC::ZERO, CC::ZERO, Target::Label(loop_label)));
                self.emit(AsmInst::Label(end_label));
            }
            Statement::Println(expr) => {
                self.comment("println");
                self.emit_all(cx.frame.push(CC::ARG1));
                self.expr(cx, expr)?;
                self.emit(AsmInst::Add(CC::ARG1, CC::ACC, CC::ZERO));
                self.emit_all(cx.frame.push(CC::RETURN_ADDR));
                self.emit(AsmInst::Jalr(CC::PRINT));
                self.emit_all(cx.frame.pop(CC::RETURN_ADDR));
                self.emit_all(cx.frame.pop(CC::ARG1));
            }
            Statement::Delete(expr) => {
                let id = self.next_label_id();
                let skip_label = self.label(cx.name, "skipDelete", id);

                self.comment("delete []");
                self.expr(cx, expr)?;
                self.emit(AsmInst::annotated(
                    AsmInst::Beq(CC::ACC, CC::ONE, Target::Label(skip_label.clone())),
                    "never free NULL",
                ));
                self.emit(AsmInst::annotated(
                    AsmInst::Add(CC::ARG1, CC::ACC, CC::ZERO),
                    "delete takes the address in $1",
                ));
                self.emit_all(cx.frame.push(CC::RETURN_ADDR));
                self.jump_and_link(CC::DELETE);
                self.emit_all(cx.frame.pop(CC::RETURN_ADDR));
                self.emit(AsmInst::Label(skip_label));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::CodegenOptions;
    use crate::generator::CodeGenerator;
    use std::collections::HashSet;
    use wlp4_frontend::{Frontend, Grammar};

    fn labels(source: &str) -> Vec<String> {
        let grammar = Grammar::wlp4().unwrap();
        let checked = Frontend::analyze(source, &grammar).unwrap();
        CodeGenerator::new(&checked)
            .generate()
            .unwrap()
            .to_text(&CodegenOptions { comments: false })
            .lines()
            .filter_map(|l| l.strip_suffix(':').map(str::to_string))
            .collect()
    }

    #[test]
    fn test_labels_share_one_counter() {
        let found = labels(
            "int f(int* p) { if (p == NULL) { } else { delete [] p; } return 0; } \
             int wain(int a, int b) { while (a < b) { a = a + 1; } return f(NULL); }",
        );
        assert_eq!(
            found,
            vec!["Ff", "Lfelse0", "LfskipDelete1", "Lfendif0", "wain", "Lwainloop2", "LwainendWhile2"]
        );
    }

    #[test]
    fn test_nested_labels_are_unique() {
        let found = labels(
            "int wain(int a, int b) { \
               while (a < b) { if (a == 0) { while (b > 0) { b = b - 1; } } else { } a = a + 1; } \
               if (a != b) { } else { } \
               return a; }",
        );
        let unique: HashSet<&String> = found.iter().collect();
        assert_eq!(unique.len(), found.len());
        assert_eq!(found.len(), 1 + 2 * 4);
    }
}
