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

//! The ~25 structurally distinct format encoders: one function per wire
//! shape, each taking already-resolved integer fields and producing a raw
//! 32-bit word (or, for the compressed forms, a 16-bit halfword). No name
//! dispatch happens here — that's `assembler::encoder::mod`'s job; these
//! functions only know how to pack bits and which bits are illegal.

use crate::errors::EncodeError;

use super::constants::*;

fn bit(value: i64, n: u32) -> u32 {
    ((value >> n) & 1) as u32
}

fn bits(value: i64, hi: u32, lo: u32) -> u32 {
    let width = hi - lo + 1;
    let mask = (1i64 << width) - 1;
    ((value >> lo) & mask) as u32
}

fn check_signed(value: i64, bits: u32, what: &str) -> Result<(), EncodeError> {
    let max = (1i64 << (bits - 1)) - 1;
    let min = -(1i64 << (bits - 1));
    if value < min || value > max {
        return Err(EncodeError::RangeViolation(format!(
            "{what} {value} out of range for signed {bits}-bit field ({min}..={max})"
        )));
    }
    Ok(())
}

fn check_unsigned(value: i64, bits: u32, what: &str) -> Result<(), EncodeError> {
    let max = (1i64 << bits) - 1;
    if value < 0 || value > max {
        return Err(EncodeError::RangeViolation(format!(
            "{what} {value} out of range for unsigned {bits}-bit field (0..={max})"
        )));
    }
    Ok(())
}

fn check_aligned(value: i64, multiple: i64, what: &str) -> Result<(), EncodeError> {
    if value % multiple != 0 {
        return Err(EncodeError::RangeViolation(format!(
            "{what} {value} is not {multiple}-byte aligned"
        )));
    }
    Ok(())
}

fn reg(value: u8, what: &str) -> Result<u32, EncodeError> {
    if value > 31 {
        return Err(EncodeError::RangeViolation(format!("{what} x{value} is not a valid register")));
    }
    Ok(value as u32)
}

/// 3-bit compressed register field (`x8..x15` -> `0..7`).
fn creg(value: u8, what: &str) -> Result<u32, EncodeError> {
    if !(8..=15).contains(&value) {
        return Err(EncodeError::CompressedConstraint(format!(
            "{what} x{value} is outside the compressed register window x8-x15"
        )));
    }
    Ok((value - 8) as u32)
}

// ---------------------------------------------------------------------
// 32-bit base formats
// ---------------------------------------------------------------------

pub fn r_type(opcode: u32, funct3: u32, funct7: u32, rd: u8, rs1: u8, rs2: u8) -> Result<u32, EncodeError> {
    Ok((funct7 << 25) | (reg(rs2, "rs2")? << 20) | (reg(rs1, "rs1")? << 15) | (funct3 << 12) | (reg(rd, "rd")? << 7) | opcode)
}

pub fn i_type(opcode: u32, funct3: u32, rd: u8, rs1: u8, imm: i64) -> Result<u32, EncodeError> {
    check_signed(imm, 12, "immediate")?;
    let imm = (imm as u32) & 0xfff;
    Ok((imm << 20) | (reg(rs1, "rs1")? << 15) | (funct3 << 12) | (reg(rd, "rd")? << 7) | opcode)
}

pub fn shift_type(opcode: u32, funct3: u32, funct7: u32, rd: u8, rs1: u8, shamt: i64) -> Result<u32, EncodeError> {
    check_unsigned(shamt, 5, "shift amount")?;
    Ok((funct7 << 25) | ((shamt as u32) << 20) | (reg(rs1, "rs1")? << 15) | (funct3 << 12) | (reg(rd, "rd")? << 7) | opcode)
}

/// Same wire shape as [`i_type`], dedicated to JALR: the computed target
/// clears bit 0 at runtime, which is a property of execution, not encoding.
pub fn ij_type(rd: u8, rs1: u8, imm: i64) -> Result<u32, EncodeError> {
    i_type(OPCODE_JALR, 0b000, rd, rs1, imm)
}

pub fn ie_type(imm: u32) -> Result<u32, EncodeError> {
    Ok((imm << 20) | (0 << 15) | (0b000 << 12) | (0 << 7) | OPCODE_SYSTEM)
}

pub fn s_type(opcode: u32, funct3: u32, rs1: u8, rs2: u8, imm: i64) -> Result<u32, EncodeError> {
    check_signed(imm, 12, "immediate")?;
    let imm_hi = bits(imm, 11, 5);
    let imm_lo = bits(imm, 4, 0);
    Ok((imm_hi << 25) | (reg(rs2, "rs2")? << 20) | (reg(rs1, "rs1")? << 15) | (funct3 << 12) | (imm_lo << 7) | opcode)
}

pub fn b_type(funct3: u32, rs1: u8, rs2: u8, imm: i64) -> Result<u32, EncodeError> {
    check_signed(imm, 13, "branch offset")?;
    check_aligned(imm, 2, "branch offset")?;
    let imm12 = bit(imm, 12);
    let imm11 = bit(imm, 11);
    let imm10_5 = bits(imm, 10, 5);
    let imm4_1 = bits(imm, 4, 1);
    let field_hi = (imm12 << 6) | imm10_5;
    let field_lo = (imm4_1 << 1) | imm11;
    Ok((field_hi << 25) | (reg(rs2, "rs2")? << 20) | (reg(rs1, "rs1")? << 15) | (funct3 << 12) | (field_lo << 7) | OPCODE_BRANCH)
}

pub fn u_type(opcode: u32, rd: u8, imm: i64) -> Result<u32, EncodeError> {
    if !(-(1i64 << 19)..(1i64 << 20)).contains(&imm) {
        return Err(EncodeError::RangeViolation(format!(
            "upper immediate {imm} does not fit in 20 bits"
        )));
    }
    let imm = (imm as u32) & 0xfffff;
    Ok((imm << 12) | (reg(rd, "rd")? << 7) | opcode)
}

pub fn j_type(rd: u8, imm: i64) -> Result<u32, EncodeError> {
    check_signed(imm, 21, "jump offset")?;
    check_aligned(imm, 2, "jump offset")?;
    let imm20 = bit(imm, 20);
    let imm19_12 = bits(imm, 19, 12);
    let imm11 = bit(imm, 11);
    let imm10_1 = bits(imm, 10, 1);
    let field = (imm20 << 19) | (imm10_1 << 9) | (imm11 << 8) | imm19_12;
    Ok((field << 12) | (reg(rd, "rd")? << 7) | OPCODE_JAL)
}

pub fn fence(pred: u8, succ: u8) -> Result<u32, EncodeError> {
    check_unsigned(pred as i64, 4, "fence predecessor set")?;
    check_unsigned(succ as i64, 4, "fence successor set")?;
    Ok((0b0000 << 28) | ((pred as u32) << 24) | ((succ as u32) << 20) | OPCODE_FENCE)
}

pub fn a_type(funct5: u32, aq: bool, rl: bool, rd: u8, rs1: u8, rs2: u8) -> Result<u32, EncodeError> {
    Ok((funct5 << 27)
        | ((aq as u32) << 26)
        | ((rl as u32) << 25)
        | (reg(rs2, "rs2")? << 20)
        | (reg(rs1, "rs1")? << 15)
        | (0b010 << 12)
        | (reg(rd, "rd")? << 7)
        | OPCODE_AMO)
}

pub fn al_type(funct5: u32, aq: bool, rl: bool, rd: u8, rs1: u8) -> Result<u32, EncodeError> {
    Ok((funct5 << 27)
        | ((aq as u32) << 26)
        | ((rl as u32) << 25)
        | (0 << 20)
        | (reg(rs1, "rs1")? << 15)
        | (0b010 << 12)
        | (reg(rd, "rd")? << 7)
        | OPCODE_AMO)
}

// ---------------------------------------------------------------------
// 16-bit compressed formats
// ---------------------------------------------------------------------

fn require_reg_nonzero(value: u8, what: &str) -> Result<(), EncodeError> {
    if value == 0 {
        return Err(EncodeError::CompressedConstraint(format!("{what} must not be x0")));
    }
    Ok(())
}

fn require_imm_nonzero(value: i64, what: &str) -> Result<(), EncodeError> {
    if value == 0 {
        return Err(EncodeError::CompressedConstraint(format!("{what} must be nonzero")));
    }
    Ok(())
}

/// `name` selects the mnemonic-specific constraint: `c.jr`/`c.jalr` require
/// `rd_rs1 != 0`; `c.mv`/`c.add` require `rs2 != 0`.
pub fn cr_type(name: &str, funct4: u32, rd_rs1: u8, rs2: u8) -> Result<u16, EncodeError> {
    match name {
        "c.jr" | "c.jalr" => require_reg_nonzero(rd_rs1, "c.jr/c.jalr rd/rs1")?,
        "c.mv" | "c.add" => require_reg_nonzero(rs2, "c.mv/c.add rs2")?,
        _ => {}
    }
    let word = (funct4 << 12) | (reg(rd_rs1, "rd/rs1")? << 7) | (reg(rs2, "rs2")? << 2) | 0b10;
    Ok(word as u16)
}

/// `name` selects the mnemonic-specific constraint: `c.addi`/`c.li` require
/// `rd_rs1 != 0`; `c.addi` additionally requires `imm != 0`.
pub fn ci_type(name: &str, op: u32, funct3: u32, rd_rs1: u8, imm: i64) -> Result<u16, EncodeError> {
    check_signed(imm, 6, "immediate")?;
    if name == "c.addi" || name == "c.li" {
        require_reg_nonzero(rd_rs1, &format!("{name} rd/rs1"))?;
    }
    if name == "c.addi" {
        require_imm_nonzero(imm, "c.addi immediate")?;
    }
    let word = (funct3 << 13) | (bit(imm, 5) << 12) | (reg(rd_rs1, "rd/rs1")? << 7) | (bits(imm, 4, 0) << 2) | op;
    Ok(word as u16)
}

/// `c.slli` uses an unsigned shift amount rather than `c.addi`/`c.li`'s
/// signed immediate, but shares the CI wire shape. Both `rd_rs1` and the
/// shift amount must be nonzero.
pub fn ci_shift_type(rd_rs1: u8, shamt: i64) -> Result<u16, EncodeError> {
    check_unsigned(shamt, 6, "shift amount")?;
    require_reg_nonzero(rd_rs1, "c.slli rd/rs1")?;
    require_imm_nonzero(shamt, "c.slli shift amount")?;
    let word = (0b000 << 13) | (bit(shamt, 5) << 12) | (reg(rd_rs1, "rd/rs1")? << 7) | (bits(shamt, 4, 0) << 2) | 0b10;
    Ok(word as u16)
}

pub fn cia_type(imm: i64) -> Result<u16, EncodeError> {
    check_signed(imm, 10, "stack adjustment")?;
    check_aligned(imm, 16, "stack adjustment")?;
    if imm == 0 {
        return Err(EncodeError::CompressedConstraint("c.addi16sp immediate must be non-zero".to_string()));
    }
    let field = (bit(imm, 4) << 4) | (bit(imm, 6) << 3) | (bit(imm, 8) << 2) | (bit(imm, 7) << 1) | bit(imm, 5);
    let word = (0b011 << 13) | (bit(imm, 9) << 12) | (2 << 7) | (field << 2) | 0b01;
    Ok(word as u16)
}

pub fn ciu_type(rd: u8, imm: i64) -> Result<u16, EncodeError> {
    if rd == 0 || rd == 2 {
        return Err(EncodeError::CompressedConstraint("c.lui rd must not be x0 or x2".to_string()));
    }
    check_signed(imm, 18, "upper immediate")?;
    check_aligned(imm, 4096, "upper immediate")?;
    if imm == 0 {
        return Err(EncodeError::CompressedConstraint("c.lui immediate must be non-zero".to_string()));
    }
    let scaled = imm >> 12;
    let word = (0b011 << 13) | (bit(scaled, 5) << 12) | (reg(rd, "rd")? << 7) | (bits(scaled, 4, 0) << 2) | 0b01;
    Ok(word as u16)
}

pub fn cil_type(rd: u8, imm: i64) -> Result<u16, EncodeError> {
    if rd == 0 {
        return Err(EncodeError::CompressedConstraint("c.lwsp rd must not be x0".to_string()));
    }
    check_unsigned(imm, 8, "load offset")?;
    check_aligned(imm, 4, "load offset")?;
    let field = (bits(imm, 7, 6) << 3) | bits(imm, 4, 2);
    let word = (0b010 << 13) | (bit(imm, 5) << 12) | (reg(rd, "rd")? << 7) | (field << 2) | 0b10;
    Ok(word as u16)
}

pub fn css_type(rs2: u8, imm: i64) -> Result<u16, EncodeError> {
    check_unsigned(imm, 8, "store offset")?;
    check_aligned(imm, 4, "store offset")?;
    let field = (bits(imm, 5, 2) << 2) | bits(imm, 7, 6);
    let word = (0b110 << 13) | (field << 7) | (reg(rs2, "rs2")? << 2) | 0b10;
    Ok(word as u16)
}

pub fn ciw_type(rd: u8, imm: i64) -> Result<u16, EncodeError> {
    check_unsigned(imm, 10, "stack-relative offset")?;
    check_aligned(imm, 4, "stack-relative offset")?;
    if imm == 0 {
        return Err(EncodeError::CompressedConstraint("c.addi4spn immediate must be non-zero".to_string()));
    }
    let field = (bit(imm, 5) << 7)
        | (bit(imm, 4) << 6)
        | (bits(imm, 9, 6) << 2)
        | (bit(imm, 2) << 1)
        | bit(imm, 3);
    let word = (0b000 << 13) | (field << 5) | (creg(rd, "rd")? << 2) | 0b00;
    Ok(word as u16)
}

pub fn cl_type(rd: u8, rs1: u8, imm: i64) -> Result<u16, EncodeError> {
    check_unsigned(imm, 7, "load offset")?;
    check_aligned(imm, 4, "load offset")?;
    let hi = bits(imm, 5, 3);
    let lo = (bit(imm, 6) << 1) | bit(imm, 2);
    let word = (0b010 << 13) | (hi << 10) | (creg(rs1, "rs1")? << 7) | (lo << 5) | (creg(rd, "rd")? << 2) | 0b00;
    Ok(word as u16)
}

pub fn cs_type(rs1: u8, rs2: u8, imm: i64) -> Result<u16, EncodeError> {
    check_unsigned(imm, 7, "store offset")?;
    check_aligned(imm, 4, "store offset")?;
    let hi = bits(imm, 5, 3);
    let lo = (bit(imm, 6) << 1) | bit(imm, 2);
    let word = (0b110 << 13) | (hi << 10) | (creg(rs1, "rs1")? << 7) | (lo << 5) | (creg(rs2, "rs2")? << 2) | 0b00;
    Ok(word as u16)
}

pub fn ca_type(funct2: u32, rd_rs1: u8, rs2: u8) -> Result<u16, EncodeError> {
    let word = (0b100011 << 10) | (creg(rd_rs1, "rd/rs1")? << 7) | (funct2 << 5) | (creg(rs2, "rs2")? << 2) | 0b01;
    Ok(word as u16)
}

pub fn cb_type(funct3: u32, rd_rs1: u8, imm: i64) -> Result<u16, EncodeError> {
    check_signed(imm, 9, "branch offset")?;
    check_aligned(imm, 2, "branch offset")?;
    let field = (bit(imm, 8) << 7)
        | (bits(imm, 4, 3) << 5)
        | (bits(imm, 7, 6) << 3)
        | (bits(imm, 2, 1) << 1)
        | bit(imm, 5);
    let word = (funct3 << 13) | (creg(rd_rs1, "rd/rs1")? << 7) | (field << 2) | 0b01;
    Ok(word as u16)
}

/// Shares CB's quadrant but with a funct2 shift/andi selector instead of a
/// funct3-distinguished branch condition (`c.srli`/`c.srai`/`c.andi`).
pub fn cbi_type(funct2: u32, rd_rs1: u8, imm: i64) -> Result<u16, EncodeError> {
    check_signed(imm, 6, "immediate")?;
    let word = (0b100 << 13)
        | (bit(imm, 5) << 12)
        | (funct2 << 10)
        | (creg(rd_rs1, "rd/rs1")? << 7)
        | (bits(imm, 4, 0) << 2)
        | 0b01;
    Ok(word as u16)
}

pub fn cj_type(funct3: u32, imm: i64) -> Result<u16, EncodeError> {
    check_signed(imm, 12, "jump offset")?;
    check_aligned(imm, 2, "jump offset")?;
    let field = (bit(imm, 11) << 10)
        | (bit(imm, 4) << 9)
        | (bits(imm, 9, 8) << 7)
        | (bit(imm, 10) << 6)
        | (bit(imm, 6) << 5)
        | (bit(imm, 7) << 4)
        | (bits(imm, 3, 1) << 1)
        | bit(imm, 5);
    let word = (funct3 << 13) | (field << 2) | 0b01;
    Ok(word as u16)
}
