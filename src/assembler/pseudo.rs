/*
Copyright 2026 The rv32asm Authors

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Expansion of every pseudo-instruction into the base instructions it
//! stands for. Each expansion mirrors the reference assembler's pseudo-op
//! table; `li`'s single-instruction fast path is the one place expansion
//! size depends on the operand's actual value rather than being fixed.

use std::collections::HashMap;

use crate::errors::AssemblerError;
use crate::expr::{Environment, Expression};
use crate::item::{
    BTypeInstruction, FenceInstruction, IJalrInstruction, ITypeInstruction, Instruction, Item,
    JTypeInstruction, Pseudo, PseudoInstruction, RegOperand, RTypeInstruction, UTypeInstruction,
};
use crate::line::Line;

const ZERO: RegOperand = RegOperand::Resolved(0);
const RA: RegOperand = RegOperand::Resolved(1);

fn imm_lit(value: i64) -> Expression {
    Expression::Arithmetic(value.to_string())
}

fn i_type(name: &'static str, rd: RegOperand, rs1: RegOperand, imm: Expression, line: &Line) -> Item {
    Item::Instruction(Instruction::I(ITypeInstruction { name, rd, rs1, imm, line: line.clone() }))
}

fn r_type(name: &'static str, rd: RegOperand, rs1: RegOperand, rs2: RegOperand, line: &Line) -> Item {
    Item::Instruction(Instruction::R(RTypeInstruction { name, rd, rs1, rs2, line: line.clone() }))
}

fn b_type(name: &'static str, rs1: RegOperand, rs2: RegOperand, imm: Expression, line: &Line) -> Item {
    Item::Instruction(Instruction::B(BTypeInstruction { name, rs1, rs2, imm, line: line.clone() }))
}

fn u_type(name: &'static str, rd: RegOperand, imm: Expression, line: &Line) -> Item {
    Item::Instruction(Instruction::U(UTypeInstruction { name, rd, imm, line: line.clone() }))
}

fn j_type(rd: RegOperand, imm: Expression, line: &Line) -> Item {
    Item::Instruction(Instruction::J(JTypeInstruction { rd, imm, line: line.clone() }))
}

fn jalr(rd: RegOperand, rs1: RegOperand, imm: Expression, line: &Line) -> Item {
    Item::Instruction(Instruction::IJalr(IJalrInstruction { rd, rs1, imm, is_auipc_jump: false, line: line.clone() }))
}

/// The `jalr` half of a `call`/`tail` expansion. Its immediate is evaluated
/// at its own position (the matching `auipc` plus 4), so resolution adds 4
/// back once the expression is evaluated.
fn jalr_auipc_jump(rd: RegOperand, rs1: RegOperand, imm: Expression, line: &Line) -> Item {
    Item::Instruction(Instruction::IJalr(IJalrInstruction { rd, rs1, imm, is_auipc_jump: true, line: line.clone() }))
}

/// Substitutes `RegOperand::Alias` fields inside a not-yet-expanded pseudo
/// instruction, mirroring `resolve_register_aliases_item`'s register-field
/// handling for the base instruction forms.
pub fn resolve_pseudo_registers(p: PseudoInstruction, constants: &HashMap<String, i64>) -> Result<PseudoInstruction, AssemblerError> {
    let line = p.line.clone();
    let resolve = |op: RegOperand| -> Result<RegOperand, AssemblerError> {
        match op {
            RegOperand::Resolved(r) => Ok(RegOperand::Resolved(r)),
            RegOperand::Alias(name) => {
                if let Some(r) = crate::registers::lookup_register(&name) {
                    return Ok(RegOperand::Resolved(r));
                }
                if let Some(&value) = constants.get(&name) {
                    if (0..32).contains(&value) {
                        return Ok(RegOperand::Resolved(value as u8));
                    }
                }
                Err(AssemblerError::UnknownName { line: line.clone(), reason: name })
            }
        }
    };

    let pseudo = match p.pseudo {
        Pseudo::Nop => Pseudo::Nop,
        Pseudo::Li { rd, imm } => Pseudo::Li { rd: resolve(rd)?, imm },
        Pseudo::Mv { rd, rs } => Pseudo::Mv { rd: resolve(rd)?, rs: resolve(rs)? },
        Pseudo::Not { rd, rs } => Pseudo::Not { rd: resolve(rd)?, rs: resolve(rs)? },
        Pseudo::Neg { rd, rs } => Pseudo::Neg { rd: resolve(rd)?, rs: resolve(rs)? },
        Pseudo::Seqz { rd, rs } => Pseudo::Seqz { rd: resolve(rd)?, rs: resolve(rs)? },
        Pseudo::Snez { rd, rs } => Pseudo::Snez { rd: resolve(rd)?, rs: resolve(rs)? },
        Pseudo::Sltz { rd, rs } => Pseudo::Sltz { rd: resolve(rd)?, rs: resolve(rs)? },
        Pseudo::Sgtz { rd, rs } => Pseudo::Sgtz { rd: resolve(rd)?, rs: resolve(rs)? },
        Pseudo::Beqz { rs, target } => Pseudo::Beqz { rs: resolve(rs)?, target },
        Pseudo::Bnez { rs, target } => Pseudo::Bnez { rs: resolve(rs)?, target },
        Pseudo::Blez { rs, target } => Pseudo::Blez { rs: resolve(rs)?, target },
        Pseudo::Bgez { rs, target } => Pseudo::Bgez { rs: resolve(rs)?, target },
        Pseudo::Bltz { rs, target } => Pseudo::Bltz { rs: resolve(rs)?, target },
        Pseudo::Bgtz { rs, target } => Pseudo::Bgtz { rs: resolve(rs)?, target },
        Pseudo::Bgt { rs1, rs2, target } => Pseudo::Bgt { rs1: resolve(rs1)?, rs2: resolve(rs2)?, target },
        Pseudo::Ble { rs1, rs2, target } => Pseudo::Ble { rs1: resolve(rs1)?, rs2: resolve(rs2)?, target },
        Pseudo::Bgtu { rs1, rs2, target } => Pseudo::Bgtu { rs1: resolve(rs1)?, rs2: resolve(rs2)?, target },
        Pseudo::Bleu { rs1, rs2, target } => Pseudo::Bleu { rs1: resolve(rs1)?, rs2: resolve(rs2)?, target },
        Pseudo::J { target } => Pseudo::J { target },
        Pseudo::Jal { target } => Pseudo::Jal { target },
        Pseudo::Jr { rs } => Pseudo::Jr { rs: resolve(rs)? },
        Pseudo::Jalr { rs } => Pseudo::Jalr { rs: resolve(rs)? },
        Pseudo::Ret => Pseudo::Ret,
        Pseudo::Call { target } => Pseudo::Call { target },
        Pseudo::Tail { target } => Pseudo::Tail { target },
        Pseudo::Fence => Pseudo::Fence,
    };

    Ok(PseudoInstruction { pseudo, line: p.line })
}

/// Expands one pseudo-instruction at `position` into its base-instruction
/// sequence. `env` carries constants and labels resolved so far, needed to
/// decide `li`'s fast path and to leave PC-relative targets as
/// `Expression::Offset` for later immediate resolution.
pub fn expand(p: PseudoInstruction, position: u32, env: &Environment) -> Result<Vec<Item>, AssemblerError> {
    let line = p.line;
    Ok(match p.pseudo {
        Pseudo::Nop => vec![i_type("addi", ZERO, ZERO, imm_lit(0), &line)],

        Pseudo::Li { rd, imm } => {
            let value = imm.eval(position, env, &line)?;
            if (-2048..2048).contains(&value) {
                vec![i_type("addi", rd, ZERO, imm_lit(value), &line)]
            } else {
                let hi = crate::expr::relocate_hi(value as i32) as i64;
                let lo = crate::expr::relocate_lo(value as i32) as i64;
                vec![
                    u_type("lui", rd.clone(), imm_lit(hi), &line),
                    i_type("addi", rd.clone(), rd, imm_lit(lo), &line),
                ]
            }
        }

        Pseudo::Mv { rd, rs } => vec![i_type("addi", rd, rs, imm_lit(0), &line)],
        Pseudo::Not { rd, rs } => vec![i_type("xori", rd, rs, imm_lit(-1), &line)],
        Pseudo::Neg { rd, rs } => vec![r_type("sub", rd, ZERO, rs, &line)],
        Pseudo::Seqz { rd, rs } => vec![i_type("sltiu", rd, rs, imm_lit(1), &line)],
        Pseudo::Snez { rd, rs } => vec![r_type("sltu", rd, ZERO, rs, &line)],
        Pseudo::Sltz { rd, rs } => vec![r_type("slt", rd, rs, ZERO, &line)],
        Pseudo::Sgtz { rd, rs } => vec![r_type("slt", rd, ZERO, rs, &line)],

        Pseudo::Beqz { rs, target } => vec![b_type("beq", rs, ZERO, target, &line)],
        Pseudo::Bnez { rs, target } => vec![b_type("bne", rs, ZERO, target, &line)],
        Pseudo::Blez { rs, target } => vec![b_type("bge", ZERO, rs, target, &line)],
        Pseudo::Bgez { rs, target } => vec![b_type("bge", rs, ZERO, target, &line)],
        Pseudo::Bltz { rs, target } => vec![b_type("blt", rs, ZERO, target, &line)],
        Pseudo::Bgtz { rs, target } => vec![b_type("blt", ZERO, rs, target, &line)],
        Pseudo::Bgt { rs1, rs2, target } => vec![b_type("blt", rs2, rs1, target, &line)],
        Pseudo::Ble { rs1, rs2, target } => vec![b_type("bge", rs2, rs1, target, &line)],
        Pseudo::Bgtu { rs1, rs2, target } => vec![b_type("bltu", rs2, rs1, target, &line)],
        Pseudo::Bleu { rs1, rs2, target } => vec![b_type("bgeu", rs2, rs1, target, &line)],

        Pseudo::J { target } => vec![j_type(ZERO, target, &line)],
        Pseudo::Jal { target } => vec![j_type(RA, target, &line)],
        Pseudo::Jr { rs } => vec![jalr(ZERO, rs, imm_lit(0), &line)],
        Pseudo::Jalr { rs } => vec![jalr(RA, rs, imm_lit(0), &line)],
        Pseudo::Ret => vec![jalr(ZERO, RA, imm_lit(0), &line)],

        // `call`/`tail` split into two instructions at two different
        // positions (auipc at `position`, jalr at `position + 4`). Each half
        // keeps the offset to the target as a live expression rather than a
        // pre-evaluated integer, so the `jalr`'s `%lo` is taken at its own
        // position (4 bytes past the `auipc`) instead of the `auipc`'s.
        // Immediate resolution then adds 4 back via `is_auipc_jump` to
        // recover the offset as measured from the `auipc`.
        Pseudo::Call { target } => {
            let hi = Expression::Hi(Box::new(target.clone()));
            let lo = Expression::Lo(Box::new(target));
            vec![u_type("auipc", RA, hi, &line), jalr_auipc_jump(RA, RA, lo, &line)]
        }
        Pseudo::Tail { target } => {
            let hi = Expression::Hi(Box::new(target.clone()));
            let lo = Expression::Lo(Box::new(target));
            let scratch = RegOperand::Resolved(6);
            vec![u_type("auipc", scratch.clone(), hi, &line), jalr_auipc_jump(ZERO, scratch, lo, &line)]
        }
        Pseudo::Fence => vec![Item::Instruction(Instruction::Fence(FenceInstruction { pred: 0b1111, succ: 0b1111, line: line.clone() }))],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::Line;

    #[test]
    fn li_small_value_is_single_addi() {
        let p = PseudoInstruction { pseudo: Pseudo::Li { rd: RegOperand::Resolved(5), imm: imm_lit(10) }, line: Line::synthetic("li t0, 10") };
        let env = Environment::default();
        let expanded = expand(p, 0, &env).unwrap();
        assert_eq!(expanded.len(), 1);
    }

    #[test]
    fn li_large_value_is_lui_addi_pair() {
        let p = PseudoInstruction { pseudo: Pseudo::Li { rd: RegOperand::Resolved(5), imm: imm_lit(0x12345) }, line: Line::synthetic("li t0, 0x12345") };
        let env = Environment::default();
        let expanded = expand(p, 0, &env).unwrap();
        assert_eq!(expanded.len(), 2);
    }

    #[test]
    fn nop_expands_to_addi_zero() {
        let p = PseudoInstruction { pseudo: Pseudo::Nop, line: Line::synthetic("nop") };
        let env = Environment::default();
        let expanded = expand(p, 0, &env).unwrap();
        assert_eq!(expanded.len(), 1);
    }

    #[test]
    fn bgt_swaps_operands_into_blt() {
        let p = PseudoInstruction {
            pseudo: Pseudo::Bgt { rs1: RegOperand::Resolved(5), rs2: RegOperand::Resolved(6), target: imm_lit(0) },
            line: Line::synthetic("bgt t0, t1, here"),
        };
        let env = Environment::default();
        let expanded = expand(p, 0, &env).unwrap();
        match &expanded[0] {
            Item::Instruction(Instruction::B(b)) => {
                assert_eq!(b.name, "blt");
                assert_eq!(b.rs1, RegOperand::Resolved(6));
                assert_eq!(b.rs2, RegOperand::Resolved(5));
            }
            _ => panic!("expected a B-type instruction"),
        }
    }
}
