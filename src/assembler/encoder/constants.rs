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

//! Opcode / funct3 / funct7 / funct5 assignments for every RV32IMAC and C
//! mnemonic this crate encodes. Nothing here is a design choice: these are
//! the architecturally fixed bit patterns from the RISC-V base ISA and the
//! M/A/C extension specifications.

pub const OPCODE_LUI: u32 = 0b0110111;
pub const OPCODE_AUIPC: u32 = 0b0010111;
pub const OPCODE_JAL: u32 = 0b1101111;
pub const OPCODE_JALR: u32 = 0b1100111;
pub const OPCODE_BRANCH: u32 = 0b1100011;
pub const OPCODE_LOAD: u32 = 0b0000011;
pub const OPCODE_STORE: u32 = 0b0100011;
pub const OPCODE_OP_IMM: u32 = 0b0010011;
pub const OPCODE_OP: u32 = 0b0110011;
pub const OPCODE_FENCE: u32 = 0b0001111;
pub const OPCODE_SYSTEM: u32 = 0b1110011;
pub const OPCODE_AMO: u32 = 0b0101111;

/// `(funct3, funct7)` for a register-register `OP` or `OP-32` instruction.
pub fn r_type_funct(name: &str) -> Option<(u32, u32)> {
    Some(match name {
        "add" => (0b000, 0b0000000),
        "sub" => (0b000, 0b0100000),
        "sll" => (0b001, 0b0000000),
        "slt" => (0b010, 0b0000000),
        "sltu" => (0b011, 0b0000000),
        "xor" => (0b100, 0b0000000),
        "srl" => (0b101, 0b0000000),
        "sra" => (0b101, 0b0100000),
        "or" => (0b110, 0b0000000),
        "and" => (0b111, 0b0000000),
        "mul" => (0b000, 0b0000001),
        "mulh" => (0b001, 0b0000001),
        "mulhsu" => (0b010, 0b0000001),
        "mulhu" => (0b011, 0b0000001),
        "div" => (0b100, 0b0000001),
        "divu" => (0b101, 0b0000001),
        "rem" => (0b110, 0b0000001),
        "remu" => (0b111, 0b0000001),
        _ => return None,
    })
}

/// `(opcode, funct3)` for an `OP-IMM` or `LOAD` instruction. Shift-immediate
/// forms additionally need [`shift_imm_funct7`].
pub fn i_type_opcode_funct(name: &str) -> Option<(u32, u32)> {
    Some(match name {
        "addi" => (OPCODE_OP_IMM, 0b000),
        "slti" => (OPCODE_OP_IMM, 0b010),
        "sltiu" => (OPCODE_OP_IMM, 0b011),
        "xori" => (OPCODE_OP_IMM, 0b100),
        "ori" => (OPCODE_OP_IMM, 0b110),
        "andi" => (OPCODE_OP_IMM, 0b111),
        "slli" => (OPCODE_OP_IMM, 0b001),
        "srli" => (OPCODE_OP_IMM, 0b101),
        "srai" => (OPCODE_OP_IMM, 0b101),
        "lb" => (OPCODE_LOAD, 0b000),
        "lh" => (OPCODE_LOAD, 0b001),
        "lw" => (OPCODE_LOAD, 0b010),
        "lbu" => (OPCODE_LOAD, 0b100),
        "lhu" => (OPCODE_LOAD, 0b101),
        _ => return None,
    })
}

/// Shift instructions pack their type (logical vs arithmetic) into the
/// immediate's top 7 bits rather than a true funct7 field.
pub fn shift_imm_funct7(name: &str) -> Option<u32> {
    match name {
        "slli" => Some(0b0000000),
        "srli" => Some(0b0000000),
        "srai" => Some(0b0100000),
        _ => None,
    }
}

pub fn is_shift_imm(name: &str) -> bool {
    matches!(name, "slli" | "srli" | "srai")
}

pub fn s_type_funct3(name: &str) -> Option<u32> {
    match name {
        "sb" => Some(0b000),
        "sh" => Some(0b001),
        "sw" => Some(0b010),
        _ => None,
    }
}

pub fn b_type_funct3(name: &str) -> Option<u32> {
    match name {
        "beq" => Some(0b000),
        "bne" => Some(0b001),
        "blt" => Some(0b100),
        "bge" => Some(0b101),
        "bltu" => Some(0b110),
        "bgeu" => Some(0b111),
        _ => None,
    }
}

pub fn u_type_opcode(name: &str) -> Option<u32> {
    match name {
        "lui" => Some(OPCODE_LUI),
        "auipc" => Some(OPCODE_AUIPC),
        _ => None,
    }
}

/// `EBREAK`/`ECALL` differ only in the 12-bit immediate field.
pub fn ie_type_imm(name: &str) -> Option<u32> {
    match name {
        "ecall" => Some(0),
        "ebreak" => Some(1),
        _ => None,
    }
}

/// Funct5 field (bits 31:27) for an atomic memory operation.
pub fn a_type_funct5(name: &str) -> Option<u32> {
    Some(match name {
        "amoswap.w" => 0b00001,
        "amoadd.w" => 0b00000,
        "amoxor.w" => 0b00100,
        "amoand.w" => 0b01100,
        "amoor.w" => 0b01000,
        "amomin.w" => 0b10000,
        "amomax.w" => 0b10100,
        "amominu.w" => 0b11000,
        "amomaxu.w" => 0b11100,
        "sc.w" => 0b00011,
        _ => return None,
    })
}

pub fn is_lr_w(name: &str) -> bool {
    name == "lr.w"
}

pub fn is_sc_w(name: &str) -> bool {
    name == "sc.w"
}

/// `(funct3, funct4)` selecting `c.mv`/`c.add` within the CR format, or
/// `(funct3, funct4)` for `c.jr`/`c.jalr` (which share CR's wire shape with
/// `rs2 = 0`).
pub fn cr_funct(name: &str) -> Option<(u32, u32)> {
    Some(match name {
        "c.jr" => (0b100, 0b1000),
        "c.mv" => (0b100, 0b1000),
        "c.jalr" => (0b100, 0b1001),
        "c.add" => (0b100, 0b1001),
        _ => return None,
    })
}

pub fn ci_funct3(name: &str) -> Option<u32> {
    match name {
        "c.addi" => Some(0b000),
        "c.li" => Some(0b010),
        "c.slli" => Some(0b000),
        _ => None,
    }
}

pub fn ca_funct(name: &str) -> Option<u32> {
    match name {
        "c.sub" => Some(0b00),
        "c.xor" => Some(0b01),
        "c.or" => Some(0b10),
        "c.and" => Some(0b11),
        _ => None,
    }
}

pub fn cb_is_shift_or_andi(name: &str) -> bool {
    matches!(name, "c.srli" | "c.srai" | "c.andi")
}

pub fn cj_funct3(name: &str) -> Option<u32> {
    match name {
        "c.jal" => Some(0b001),
        "c.j" => Some(0b101),
        _ => None,
    }
}
