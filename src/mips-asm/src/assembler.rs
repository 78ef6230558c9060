use crate::encoder::InstructionEncoder;
use crate::error::AsmError;
use crate::merl::{words_to_bytes, Entry, MerlModule, HEADER_SIZE};
use crate::parser::Parser;
use crate::types::*;
use log::debug;
use std::collections::{BTreeSet, HashMap};

/// Symbols gathered by the first pass
#[derive(Debug, Default)]
struct AssemblerState {
    /// Label name to code index
    labels: HashMap<String, usize>,
    imports: BTreeSet<String>,
    /// Export name with the line that requested it
    exports: Vec<(String, usize)>,
}

pub struct MipsAssembler {
    parser: Parser,
    encoder: InstructionEncoder,
    options: AssemblerOptions,
}

impl MipsAssembler {
    pub fn new(options: AssemblerOptions) -> Self {
        Self {
            parser: Parser::new(),
            encoder: InstructionEncoder::new(),
            options,
        }
    }

    /// Assemble into a module; raw output carries an empty table
    pub fn assemble(&self, source: &str) -> Result<MerlModule, AsmError> {
        let lines = self.parser.parse_source(source)?;
        let state = self.first_pass(&lines)?;
        self.second_pass(&lines, &state)
    }

    pub fn assemble_to_bytes(&self, source: &str) -> Result<Vec<u8>, AsmError> {
        let module = self.assemble(source)?;
        Ok(match self.options.format {
            OutputFormat::Merl => module.to_bytes(),
            OutputFormat::Raw => words_to_bytes(&module.code),
        })
    }

    fn address(&self, index: usize) -> u32 {
        let base = match self.options.format {
            OutputFormat::Merl => HEADER_SIZE,
            OutputFormat::Raw => 0,
        };
        base.wrapping_add((index as u32).wrapping_mul(WORD_SIZE))
    }

    fn first_pass(&self, lines: &[ParsedLine]) -> Result<AssemblerState, AsmError> {
        let mut state = AssemblerState::default();
        let mut index = 0usize;

        for line in lines {
            for label in &line.labels {
                if state.labels.insert(label.clone(), index).is_some() {
                    return Err(AsmError::DuplicateLabel {
                        line: line.line_number,
                        label: label.clone(),
                    });
                }
                debug!("label {} = {:#x}", label, self.address(index));
            }

            match &line.item {
                Some(Item::Instruction(_)) => index += 1,
                Some(Item::Import(name)) => {
                    if self.options.format == OutputFormat::Raw {
                        return Err(AsmError::ImportInRaw {
                            line: line.line_number,
                        });
                    }
                    state.imports.insert(name.clone());
                }
                Some(Item::Export(name)) => state.exports.push((name.clone(), line.line_number)),
                None => {}
            }
        }

        if let Some((label, line)) = lines.iter().find_map(|line| {
            line.labels
                .iter()
                .find(|label| state.imports.contains(*label))
                .map(|label| (label.clone(), line.line_number))
        }) {
            return Err(AsmError::DuplicateLabel { line, label });
        }

        Ok(state)
    }

    fn second_pass(
        &self,
        lines: &[ParsedLine],
        state: &AssemblerState,
    ) -> Result<MerlModule, AsmError> {
        let merl = self.options.format == OutputFormat::Merl;
        let mut code = Vec::new();
        let mut table = Vec::new();

        let instructions = lines.iter().filter_map(|line| match &line.item {
            Some(Item::Instruction(inst)) => Some((line.line_number, inst)),
            _ => None,
        });
        for (index, (line, inst)) in instructions.enumerate() {
            let location = self.address(index);
            let resolved = match inst {
                Instruction::Branch {
                    opcode,
                    s,
                    t,
                    target: BranchTarget::Label(label),
                } => {
                    let target = self.branch_offset(state, line, index, label)?;
                    Instruction::Branch {
                        opcode: *opcode,
                        s: *s,
                        t: *t,
                        target: BranchTarget::Offset(target),
                    }
                }
                Instruction::Word(WordValue::Label(label)) => {
                    if let Some(&target) = state.labels.get(label) {
                        if merl {
                            table.push(Entry::Rel { location });
                        }
                        Instruction::Word(WordValue::Value(self.address(target)))
                    } else if state.imports.contains(label) {
                        table.push(Entry::Esr {
                            location,
                            name: label.clone(),
                        });
                        Instruction::Word(WordValue::Value(0))
                    } else {
                        return Err(AsmError::UndefinedLabel {
                            line,
                            label: label.clone(),
                        });
                    }
                }
                other => other.clone(),
            };
            code.push(self.encoder.encode(&resolved)?);
        }

        if merl {
            for (name, line) in &state.exports {
                let target = state.labels.get(name).ok_or_else(|| AsmError::UndefinedLabel {
                    line: *line,
                    label: name.clone(),
                })?;
                table.push(Entry::Esd {
                    location: self.address(*target),
                    name: name.clone(),
                });
            }
        }

        debug!("assembled {} words, {} table entries", code.len(), table.len());
        Ok(MerlModule::new(code, table))
    }

    fn branch_offset(
        &self,
        state: &AssemblerState,
        line: usize,
        index: usize,
        label: &str,
    ) -> Result<i32, AsmError> {
        let Some(&target) = state.labels.get(label) else {
            return Err(if state.imports.contains(label) {
                AsmError::BranchToImport {
                    line,
                    label: label.to_string(),
                }
            } else {
                AsmError::UndefinedLabel {
                    line,
                    label: label.to_string(),
                }
            });
        };
        let distance = target as i64 - index as i64 - 1;
        i32::try_from(distance)
            .ok()
            .filter(|d| (-32768..=32767).contains(d))
            .ok_or_else(|| AsmError::BranchOutOfRange {
                line,
                label: label.to_string(),
                distance,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn merl() -> MipsAssembler {
        MipsAssembler::new(AssemblerOptions::default())
    }

    fn raw() -> MipsAssembler {
        MipsAssembler::new(AssemblerOptions {
            format: OutputFormat::Raw,
        })
    }

    #[test]
    fn test_branch_offsets_count_from_next_word() {
        let module = raw()
            .assemble("top: add $1, $1, $1\nbne $1, $0, top\nbeq $0, $0, end\nadd $0, $0, $0\nend: jr $31")
            .unwrap();
        assert_eq!(module.code[1], 0x1420_fffe);
        assert_eq!(module.code[2], 0x1000_0001);
    }

    #[test]
    fn test_word_labels_are_relocated() {
        let module = merl().assemble("lis $5\n.word f\nf: jr $31").unwrap();
        assert_eq!(module.code[1], 12 + 8);
        assert_eq!(module.table, vec![Entry::Rel { location: 16 }]);

        let module = raw().assemble("lis $5\n.word f\nf: jr $31").unwrap();
        assert_eq!(module.code[1], 8);
        assert!(module.table.is_empty());
    }

    #[test]
    fn test_imports_and_exports() {
        let module = merl()
            .assemble(".import print\n.export f\nf: lis $5\n.word print\njalr $5")
            .unwrap();
        assert_eq!(
            module.table,
            vec![
                Entry::Esr {
                    location: 16,
                    name: "print".to_string()
                },
                Entry::Esd {
                    location: 12,
                    name: "f".to_string()
                },
            ]
        );
        assert_eq!(module.code[1], 0);
    }

    #[test]
    fn test_label_errors() {
        assert!(matches!(
            merl().assemble("a: jr $31\na: jr $31"),
            Err(AsmError::DuplicateLabel { line: 2, .. })
        ));
        assert!(matches!(
            merl().assemble(".word nowhere"),
            Err(AsmError::UndefinedLabel { line: 1, .. })
        ));
        assert!(matches!(
            merl().assemble(".import f\nbeq $0, $0, f"),
            Err(AsmError::BranchToImport { line: 2, .. })
        ));
        assert!(matches!(
            merl().assemble(".export g\njr $31"),
            Err(AsmError::UndefinedLabel { line: 1, .. })
        ));
        assert_eq!(
            raw().assemble(".import print"),
            Err(AsmError::ImportInRaw { line: 1 })
        );
    }

    #[test]
    fn test_branch_range() {
        let mut source = String::from("beq $0, $0, far\n");
        source.push_str(&"add $0, $0, $0\n".repeat(32768));
        source.push_str("far: jr $31\n");
        assert!(matches!(
            raw().assemble(&source),
            Err(AsmError::BranchOutOfRange { distance: 32768, .. })
        ));
    }

    #[test]
    fn test_bytes_follow_format() {
        let bytes = raw().assemble_to_bytes("jr $31").unwrap();
        assert_eq!(bytes, vec![0x03, 0xe0, 0x00, 0x08]);
        let bytes = merl().assemble_to_bytes("jr $31").unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[12..], &[0x03, 0xe0, 0x00, 0x08]);
    }
}
