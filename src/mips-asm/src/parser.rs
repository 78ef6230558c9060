use crate::error::AsmError;
use crate::types::{
    BranchTarget, Instruction, InstructionFormat, Item, Opcode, ParsedLine, WordValue,
    REGISTER_COUNT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Id(String),
    /// `name:`, colon stripped
    Label(String),
    /// `.name`, dot stripped
    Directive(String),
    Reg(i64),
    Int(i64),
    HexInt(i64),
    Comma,
    LParen,
    RParen,
}

#[derive(Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Parse every line that carries a label or an item
    pub fn parse_source(&self, source: &str) -> Result<Vec<ParsedLine>, AsmError> {
        let mut parsed = Vec::new();
        for (i, line) in source.lines().enumerate() {
            let parsed_line = self.parse_line(line, i + 1)?;
            if !parsed_line.labels.is_empty() || parsed_line.item.is_some() {
                parsed.push(parsed_line);
            }
        }
        Ok(parsed)
    }

    fn parse_line(&self, line: &str, line_number: usize) -> Result<ParsedLine, AsmError> {
        let tokens = self.tokenize(line, line_number)?;
        let label_count = tokens
            .iter()
            .take_while(|t| matches!(t, Token::Label(_)))
            .count();
        let labels = tokens[..label_count]
            .iter()
            .filter_map(|t| match t {
                Token::Label(name) => Some(name.clone()),
                _ => None,
            })
            .collect();

        let rest = &tokens[label_count..];
        let item = match rest.split_first() {
            None => None,
            Some((head, operands)) => Some(self.item(head, operands).map_err(|message| {
                AsmError::Syntax {
                    line: line_number,
                    text: line.trim().to_string(),
                    message,
                }
            })?),
        };

        Ok(ParsedLine {
            labels,
            item,
            line_number,
            raw: line.to_string(),
        })
    }

    fn item(&self, head: &Token, operands: &[Token]) -> Result<Item, String> {
        match head {
            Token::Id(name) => {
                let opcode =
                    Opcode::from_str(name).ok_or_else(|| format!("unknown instruction '{}'", name))?;
                self.instruction(opcode, operands)
                    .map(Item::Instruction)
                    .ok_or_else(|| format!("expected `{} {}`", opcode, usage(opcode.format())))
            }
            Token::Directive(name) => match (name.as_str(), operands) {
                ("word", [operand]) => word(operand)
                    .map(|w| Item::Instruction(Instruction::Word(w)))
                    .ok_or_else(|| "expected .word with an int, hex int or label".to_string()),
                ("import", [Token::Id(symbol)]) => Ok(Item::Import(symbol.clone())),
                ("export", [Token::Id(symbol)]) => Ok(Item::Export(symbol.clone())),
                ("word" | "import" | "export", _) => Err(format!("malformed .{}", name)),
                _ => Err(format!("unknown directive .{}", name)),
            },
            _ => Err("expected an opcode, label or directive".to_string()),
        }
    }

    fn instruction(&self, opcode: Opcode, operands: &[Token]) -> Option<Instruction> {
        use Token::{Comma, Id, LParen, RParen, Reg};

        match (opcode.format(), operands) {
            (InstructionFormat::ThreeReg, [Reg(d), Comma, Reg(s), Comma, Reg(t)]) => {
                Some(Instruction::ThreeReg {
                    opcode,
                    d: register(*d)?,
                    s: register(*s)?,
                    t: register(*t)?,
                })
            }
            (InstructionFormat::TwoReg, [Reg(s), Comma, Reg(t)]) => Some(Instruction::TwoReg {
                opcode,
                s: register(*s)?,
                t: register(*t)?,
            }),
            (InstructionFormat::OneReg, [Reg(r)]) => Some(Instruction::OneReg {
                opcode,
                r: register(*r)?,
            }),
            (InstructionFormat::Memory, [Reg(t), Comma, offset, LParen, Reg(s), RParen]) => {
                Some(Instruction::Memory {
                    opcode,
                    t: register(*t)?,
                    offset: immediate16(offset)?,
                    s: register(*s)?,
                })
            }
            (InstructionFormat::Branch, [Reg(s), Comma, Reg(t), Comma, target]) => {
                let target = match target {
                    Id(label) => BranchTarget::Label(label.clone()),
                    other => BranchTarget::Offset(immediate16(other)?),
                };
                Some(Instruction::Branch {
                    opcode,
                    s: register(*s)?,
                    t: register(*t)?,
                    target,
                })
            }
            _ => None,
        }
    }

    pub fn tokenize(&self, line: &str, line_number: usize) -> Result<Vec<Token>, AsmError> {
        let mut tokens = Vec::new();
        let mut chars = line.char_indices().peekable();
        let scanning = |start: usize| AsmError::Scanning {
            line: line_number,
            text: line[start..].trim().to_string(),
        };

        while let Some(&(start, ch)) = chars.peek() {
            match ch {
                ';' => break,
                c if c.is_whitespace() => {
                    chars.next();
                }
                ',' | '(' | ')' => {
                    chars.next();
                    tokens.push(match ch {
                        ',' => Token::Comma,
                        '(' => Token::LParen,
                        _ => Token::RParen,
                    });
                }
                '$' => {
                    chars.next();
                    let digits = take_while(&mut chars, |c| c.is_ascii_digit());
                    let number = digits.parse().map_err(|_| scanning(start))?;
                    tokens.push(Token::Reg(number));
                }
                '.' => {
                    chars.next();
                    let name = take_while(&mut chars, |c| c.is_ascii_alphabetic());
                    if name.is_empty() {
                        return Err(scanning(start));
                    }
                    tokens.push(Token::Directive(name));
                }
                c if c.is_ascii_alphabetic() => {
                    let name = take_while(&mut chars, |c| c.is_ascii_alphanumeric());
                    if chars.peek().map(|&(_, c)| c) == Some(':') {
                        chars.next();
                        tokens.push(Token::Label(name));
                    } else {
                        tokens.push(Token::Id(name));
                    }
                }
                c if c == '-' || c.is_ascii_digit() => {
                    let text = take_while(&mut chars, |c| c.is_ascii_alphanumeric() || c == '-');
                    tokens.push(number(&text).ok_or_else(|| scanning(start))?);
                }
                _ => return Err(scanning(start)),
            }
        }
        Ok(tokens)
    }
}

fn take_while(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    accept: impl Fn(char) -> bool,
) -> String {
    let mut out = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !accept(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

fn number(text: &str) -> Option<Token> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex.is_empty() || hex.len() > 8 {
            return None;
        }
        return i64::from_str_radix(hex, 16).ok().map(Token::HexInt);
    }
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().map(Token::Int)
}

fn usage(format: InstructionFormat) -> &'static str {
    match format {
        InstructionFormat::ThreeReg => "$d, $s, $t",
        InstructionFormat::TwoReg => "$s, $t",
        InstructionFormat::OneReg => "$r",
        InstructionFormat::Memory => "$t, i($s)",
        InstructionFormat::Branch => "$s, $t, i",
    }
}

fn register(number: i64) -> Option<u8> {
    u8::try_from(number).ok().filter(|r| *r < REGISTER_COUNT)
}

/// A signed 16-bit int or a hex int up to 0xffff
fn immediate16(token: &Token) -> Option<i32> {
    match *token {
        Token::Int(value) if (-32768..=32767).contains(&value) => Some(value as i32),
        Token::HexInt(value) if value <= 0xffff => Some(value as i32),
        _ => None,
    }
}

fn word(token: &Token) -> Option<WordValue> {
    match token {
        Token::Int(value) if (-(1i64 << 31)..=(u32::MAX as i64)).contains(value) => {
            Some(WordValue::Value(*value as u32))
        }
        Token::HexInt(value) if *value <= u32::MAX as i64 => Some(WordValue::Value(*value as u32)),
        Token::Id(label) => Some(WordValue::Label(label.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<ParsedLine> {
        Parser::new().parse_source(source).unwrap()
    }

    #[test]
    fn test_parse_three_registers() {
        let lines = parse("add $3, $5, $3 ; sum");
        assert_eq!(
            lines[0].item,
            Some(Item::Instruction(Instruction::ThreeReg {
                opcode: Opcode::Add,
                d: 3,
                s: 5,
                t: 3
            }))
        );
    }

    #[test]
    fn test_parse_memory_and_branch() {
        let lines = parse("lw $3, -4($29)\nbne $3, $0, 1\nbeq $0, $0, done");
        assert_eq!(
            lines[0].item,
            Some(Item::Instruction(Instruction::Memory {
                opcode: Opcode::Lw,
                t: 3,
                offset: -4,
                s: 29
            }))
        );
        assert_eq!(
            lines[1].item,
            Some(Item::Instruction(Instruction::Branch {
                opcode: Opcode::Bne,
                s: 3,
                t: 0,
                target: BranchTarget::Offset(1)
            }))
        );
        assert_eq!(lines[2].item.as_ref().and_then(|i| match i {
            Item::Instruction(inst) => inst.label(),
            _ => None,
        }), Some("done"));
    }

    #[test]
    fn test_labels_alone_and_stacked() {
        let lines = parse("a: b:\n\n; comment only\nc: jr $31");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].labels, vec!["a", "b"]);
        assert_eq!(lines[0].item, None);
        assert_eq!(lines[1].labels, vec!["c"]);
    }

    #[test]
    fn test_words_and_directives() {
        let lines = parse(".word -1\n.word 0xffffffff\n.word wain\n.import print\n.export f");
        let items: Vec<_> = lines.into_iter().filter_map(|l| l.item).collect();
        assert_eq!(
            items,
            vec![
                Item::Instruction(Instruction::Word(WordValue::Value(0xffff_ffff))),
                Item::Instruction(Instruction::Word(WordValue::Value(0xffff_ffff))),
                Item::Instruction(Instruction::Word(WordValue::Label("wain".to_string()))),
                Item::Import("print".to_string()),
                Item::Export("f".to_string()),
            ]
        );
    }

    #[test]
    fn test_range_errors() {
        let parser = Parser::new();
        assert!(parser.parse_source("lw $3, 32768($29)").is_err());
        assert!(parser.parse_source("beq $0, $0, 0x10000").is_err());
        assert!(parser.parse_source(".word 4294967296").is_err());
        assert!(parser.parse_source(".word -2147483649").is_err());
        assert!(parser.parse_source("add $32, $0, $0").is_err());
        assert!(parser.parse_source("lw $3, 0xffff($29)").is_ok());
    }

    #[test]
    fn test_syntax_errors_name_the_line() {
        let err = Parser::new().parse_source("add $1, $2, $3\nmult $1, $2, $3").unwrap_err();
        assert!(matches!(err, AsmError::Syntax { line: 2, .. }));
        let err = Parser::new().parse_source("add $1, $2, #").unwrap_err();
        assert_eq!(
            err,
            AsmError::Scanning {
                line: 1,
                text: "#".to_string()
            }
        );
    }
}
