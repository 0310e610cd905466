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

pub mod constants;
pub mod formats;

use crate::errors::AssemblerError;
use crate::item::{Compressed, Instruction};
use constants::*;

/// Dispatches a fully resolved instruction (every register concrete, every
/// immediate an `i64`) to its format encoder, producing the raw little-
/// endian bytes it lowers to. Any [`crate::errors::EncodeError`] raised by
/// the encoder is wrapped with the instruction's line here, since the
/// encoders themselves carry no position information.
pub fn encode_instruction(
    instruction: &Instruction,
    rd: Option<u8>,
    rs1: Option<u8>,
    rs2: Option<u8>,
    imm: Option<i64>,
) -> Result<Vec<u8>, AssemblerError> {
    let line = instruction.line().clone();
    let wrap32 = |res: Result<u32, _>| res.map(|w| w.to_le_bytes().to_vec());
    let wrap16 = |res: Result<u16, _>| res.map(|w| w.to_le_bytes().to_vec());

    let result = match instruction {
        Instruction::R(r) => {
            let (funct3, funct7) = r_type_funct(r.name).expect("r-type name resolved at parse time");
            wrap32(formats::r_type(OPCODE_OP, funct3, funct7, rd.unwrap(), rs1.unwrap(), rs2.unwrap()))
        }
        Instruction::I(i) => {
            if is_shift_imm(i.name) {
                let funct7 = shift_imm_funct7(i.name).unwrap();
                let (opcode, funct3) = i_type_opcode_funct(i.name).unwrap();
                wrap32(formats::shift_type(opcode, funct3, funct7, rd.unwrap(), rs1.unwrap(), imm.unwrap()))
            } else {
                let (opcode, funct3) = i_type_opcode_funct(i.name).expect("i-type name resolved at parse time");
                wrap32(formats::i_type(opcode, funct3, rd.unwrap(), rs1.unwrap(), imm.unwrap()))
            }
        }
        Instruction::IJalr(_) => wrap32(formats::ij_type(rd.unwrap(), rs1.unwrap(), imm.unwrap())),
        Instruction::Ie(ie) => {
            let field = ie_type_imm(ie.name).expect("ie-type name resolved at parse time");
            wrap32(formats::ie_type(field))
        }
        Instruction::S(s) => {
            let funct3 = s_type_funct3(s.name).expect("s-type name resolved at parse time");
            wrap32(formats::s_type(OPCODE_STORE, funct3, rs1.unwrap(), rs2.unwrap(), imm.unwrap()))
        }
        Instruction::B(b) => {
            let funct3 = b_type_funct3(b.name).expect("b-type name resolved at parse time");
            wrap32(formats::b_type(funct3, rs1.unwrap(), rs2.unwrap(), imm.unwrap()))
        }
        Instruction::U(u) => {
            let opcode = u_type_opcode(u.name).expect("u-type name resolved at parse time");
            wrap32(formats::u_type(opcode, rd.unwrap(), imm.unwrap()))
        }
        Instruction::J(_) => wrap32(formats::j_type(rd.unwrap(), imm.unwrap())),
        Instruction::Fence(f) => wrap32(formats::fence(f.pred, f.succ)),
        Instruction::A(a) => {
            let funct5 = a_type_funct5(a.name).expect("a-type name resolved at parse time");
            wrap32(formats::a_type(funct5, a.aq, a.rl, rd.unwrap(), rs1.unwrap(), rs2.unwrap()))
        }
        Instruction::Al(a) => wrap32(formats::al_type(0b00010, a.aq, a.rl, rd.unwrap(), rs1.unwrap())),
        Instruction::Pseudo(p) => {
            return Err(AssemblerError::Syntax {
                line,
                reason: format!("pseudo-instruction {:?} reached the encoder unexpanded", p.pseudo),
            });
        }
        Instruction::Compressed(c) => match c {
            Compressed::Cr { name, .. } => {
                let (_, funct4) = cr_funct(name).expect("cr name resolved at parse time");
                wrap16(formats::cr_type(name, funct4, rd.unwrap(), rs2.unwrap()))
            }
            Compressed::Ci { name, .. } => {
                if *name == "c.slli" {
                    wrap16(formats::ci_shift_type(rd.unwrap(), imm.unwrap()))
                } else {
                    let funct3 = ci_funct3(name).expect("ci name resolved at parse time");
                    wrap16(formats::ci_type(name, 0b01, funct3, rd.unwrap(), imm.unwrap()))
                }
            }
            Compressed::Cia { .. } => wrap16(formats::cia_type(imm.unwrap())),
            Compressed::Ciu { .. } => wrap16(formats::ciu_type(rd.unwrap(), imm.unwrap())),
            Compressed::Cil { .. } => wrap16(formats::cil_type(rd.unwrap(), imm.unwrap())),
            Compressed::Css { .. } => wrap16(formats::css_type(rs2.unwrap(), imm.unwrap())),
            Compressed::Ciw { .. } => wrap16(formats::ciw_type(rd.unwrap(), imm.unwrap())),
            Compressed::Cl { .. } => wrap16(formats::cl_type(rd.unwrap(), rs1.unwrap(), imm.unwrap())),
            Compressed::Cs { .. } => wrap16(formats::cs_type(rs1.unwrap(), rs2.unwrap(), imm.unwrap())),
            Compressed::Ca { name, .. } => {
                let funct2 = ca_funct(name).expect("ca name resolved at parse time");
                wrap16(formats::ca_type(funct2, rd.unwrap(), rs2.unwrap()))
            }
            Compressed::Cb { name, .. } => {
                if cb_is_shift_or_andi(name) {
                    let funct2 = match *name {
                        "c.srli" => 0b00,
                        "c.srai" => 0b01,
                        "c.andi" => 0b10,
                        _ => unreachable!(),
                    };
                    wrap16(formats::cbi_type(funct2, rd.unwrap(), imm.unwrap()))
                } else {
                    let funct3 = match *name {
                        "c.beqz" => 0b110,
                        "c.bnez" => 0b111,
                        _ => unreachable!(),
                    };
                    wrap16(formats::cb_type(funct3, rd.unwrap(), imm.unwrap()))
                }
            }
            Compressed::Cj { name, .. } => {
                let funct3 = cj_funct3(name).expect("cj name resolved at parse time");
                wrap16(formats::cj_type(funct3, imm.unwrap()))
            }
        },
    };

    result.map_err(|e| AssemblerError::from_encode_error(line, e))
}
