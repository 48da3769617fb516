//! Assembler for 4-bit processor programs.
//!
//! Syntax:
//! ```text
//! // Comment (`;` also starts a comment)
//! STO 0x4, 0x5    // M[4] := 5
//! ADD 0x4 6       // commas are optional
//! NOT 0xF         // second operand defaults to 0
//! ```
//!
//! Operands are 4-bit values written in decimal or with a `0x`, `0b` or
//! `0o` prefix. There are no labels: the machine has no jumps.

use crate::cpu::decode::{Instruction, Opcode};
use crate::logic::Word4;
use thiserror::Error;

/// Assemble source code to a program.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)?;
    Ok(asm.output)
}

/// Assemble source code straight to 11-bit machine words.
pub fn assemble_words(source: &str) -> Result<Vec<u16>, AssemblerError> {
    Ok(assemble(source)?.iter().map(Instruction::encode).collect())
}

/// The assembler state.
struct Assembler {
    /// Output instructions.
    output: Vec<Instruction>,
}

impl Assembler {
    fn new() -> Self {
        Self { output: Vec::new() }
    }

    fn assemble(&mut self, source: &str) -> Result<(), AssemblerError> {
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }
        tracing::debug!(instructions = self.output.len(), "assembled program");
        Ok(())
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            return Ok(());
        }

        let parts: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();

        let Some(&mnemonic) = parts.first() else {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: "missing mnemonic".into(),
            });
        };
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
            AssemblerError::UnknownMnemonic {
                line: line_num,
                mnemonic: mnemonic.to_uppercase(),
            }
        })?;

        let addr = match parts.get(1) {
            Some(text) => parse_operand(text, line_num)?,
            None => {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("{opcode} requires an address operand"),
                })
            }
        };
        let imm = match parts.get(2) {
            Some(text) => parse_operand(text, line_num)?,
            None => Word4::ZERO,
        };
        if parts.len() > 3 {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("unexpected operand '{}'", parts[3]),
            });
        }

        self.output.push(Instruction::new(opcode, addr, imm));
        Ok(())
    }
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find("//"), line.find(';')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

fn parse_operand(operand: &str, line_num: usize) -> Result<Word4, AssemblerError> {
    let (digits, radix) = match operand.get(..2) {
        Some("0x" | "0X") => (&operand[2..], 16),
        Some("0b" | "0B") => (&operand[2..], 2),
        Some("0o" | "0O") => (&operand[2..], 8),
        _ => (operand, 10),
    };

    let value = u32::from_str_radix(digits, radix).map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("invalid numeric literal '{operand}'"),
    })?;

    u8::try_from(value)
        .ok()
        .and_then(|v| Word4::new(v).ok())
        .ok_or(AssemblerError::ValueOutOfRange { line: line_num, value })
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("value out of range on line {line}: {value} (operands are 0-15)")]
    ValueOutOfRange { line: usize, value: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(v: u8) -> Word4 {
        Word4::truncate(v)
    }

    #[test]
    fn test_assemble_reference_program() {
        let source = r#"
            // Reference program
            STO 0x4, 0x5
            ADD 0x4, 0x6
            STO 0x1, 0xF
            SUB 0x1, 0x7
            NOT 0xF, 0x0
        "#;

        let words = assemble_words(source).unwrap();
        assert_eq!(
            words,
            vec![0b00001000101, 0b00101000110, 0b00000011111, 0b01000010111, 0b11011110000]
        );
    }

    #[test]
    fn test_operand_forms() {
        let program = assemble("add 0b1010 12\nOR 0o7,0XF ; trailing\nNOT 3").unwrap();
        assert_eq!(
            program,
            vec![
                Instruction::new(Opcode::Add, w(10), w(12)),
                Instruction::new(Opcode::Or, w(7), w(15)),
                Instruction::new(Opcode::Not, w(3), w(0)),
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let program = assemble("\n// only a comment\n   ; another\nSTO 1, 2 // inline\n\n").unwrap();
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = assemble("STO 1, 2\nJMP 0x4").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UnknownMnemonic { line: 2, mnemonic: "JMP".into() }
        );
    }

    #[test]
    fn test_missing_operand() {
        let err = assemble("ADD").unwrap_err();
        assert!(matches!(err, AssemblerError::SyntaxError { line: 1, .. }));
    }

    #[test]
    fn test_out_of_range_operand() {
        assert_eq!(
            assemble("STO 0x10, 1").unwrap_err(),
            AssemblerError::ValueOutOfRange { line: 1, value: 16 }
        );
        assert_eq!(
            assemble("STO 1, 300").unwrap_err(),
            AssemblerError::ValueOutOfRange { line: 1, value: 300 }
        );
    }

    #[test]
    fn test_invalid_literal() {
        let err = assemble("STO 0xG, 1").unwrap_err();
        assert!(err.to_string().contains("invalid numeric literal"));
    }

    #[test]
    fn test_too_many_operands() {
        let err = assemble("STO 1, 2, 3").unwrap_err();
        assert!(matches!(err, AssemblerError::SyntaxError { line: 1, .. }));
    }
}
