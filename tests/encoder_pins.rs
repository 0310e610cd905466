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

//! Pins the boundary cases for every instruction format: all-zero operands,
//! max register fields, min/max legal immediate, just-past-range on both
//! sides, misalignment, and the compressed-form register/immediate
//! constraints.

use std::path::Path;

use rv32asm::assemble;
use rv32asm::file_reader::MockFileReader;

fn assemble_source(source: &str) -> Vec<u8> {
    let mut reader = MockFileReader::default();
    reader.add_file("test.s", source);
    assemble(Path::new("test.s"), false, &reader).unwrap()
}

fn assemble_compressed(source: &str) -> Vec<u8> {
    let mut reader = MockFileReader::default();
    reader.add_file("test.s", source);
    assemble(Path::new("test.s"), true, &reader).unwrap()
}

fn assemble_err(source: &str) -> String {
    let mut reader = MockFileReader::default();
    reader.add_file("test.s", source);
    format!("{:#}", assemble(Path::new("test.s"), false, &reader).unwrap_err())
}

fn assemble_compressed_err(source: &str) -> String {
    let mut reader = MockFileReader::default();
    reader.add_file("test.s", source);
    format!("{:#}", assemble(Path::new("test.s"), true, &reader).unwrap_err())
}

// ---------------------------------------------------------------------
// R-type
// ---------------------------------------------------------------------

#[test]
fn r_type_all_zero_operands() {
    assert_eq!(assemble_source("add x0, x0, x0\n"), vec![0x33, 0x00, 0x00, 0x00]);
}

#[test]
fn r_type_max_registers() {
    // add x31, x31, x31: rs2=31<<20 | rs1=31<<15 | rd=31<<7 | opcode 0x33
    let word = (31u32 << 20) | (31u32 << 15) | (31u32 << 7) | 0x33;
    assert_eq!(assemble_source("add x31, x31, x31\n"), word.to_le_bytes().to_vec());
}

#[test]
fn shift_amount_boundaries() {
    assert_eq!(assemble_source("slli t0, t0, 31\n").len(), 4);
    assert!(assemble_err("slli t0, t0, 32\n").to_lowercase().contains("range"));
}

// ---------------------------------------------------------------------
// I-type
// ---------------------------------------------------------------------

#[test]
fn i_type_immediate_min_and_max() {
    assert_eq!(assemble_source("addi t0, t0, 2047\n").len(), 4);
    assert_eq!(assemble_source("addi t0, t0, -2048\n").len(), 4);
}

#[test]
fn i_type_immediate_just_past_range() {
    assert!(assemble_err("addi t0, t0, 2048\n").to_lowercase().contains("range"));
    assert!(assemble_err("addi t0, t0, -2049\n").to_lowercase().contains("range"));
}

// ---------------------------------------------------------------------
// S-type
// ---------------------------------------------------------------------

#[test]
fn s_type_all_zero_operands() {
    assert_eq!(assemble_source("sw x0, 0(x0)\n"), vec![0x23, 0x20, 0x00, 0x00]);
}

#[test]
fn s_type_immediate_just_past_range() {
    assert!(assemble_err("sw t0, 2048(sp)\n").to_lowercase().contains("range"));
    assert!(assemble_err("sw t0, -2049(sp)\n").to_lowercase().contains("range"));
}

// ---------------------------------------------------------------------
// B-type
// ---------------------------------------------------------------------

#[test]
fn b_type_max_legal_offset_both_directions() {
    // +4094 and -4096 are the largest 13-bit signed even offsets. A bare
    // integer token is a plain (non-PC-relative) immediate, so these are
    // exactly the values `b_type` sees.
    assert_eq!(assemble_source("beq t0, t1, 4094\n").len(), 4);
    assert_eq!(assemble_source("beq t0, t1, -4096\n").len(), 4);
}

#[test]
fn b_type_misaligned_offset_is_range_violation() {
    assert!(assemble_err("beq t0, t1, 3\n").to_lowercase().contains("aligned"));
}

// ---------------------------------------------------------------------
// U-type
// ---------------------------------------------------------------------

#[test]
fn u_type_immediate_min_and_max() {
    assert_eq!(assemble_source("lui t0, 0\n").len(), 4);
    assert_eq!(assemble_source("lui t0, 0xfffff\n").len(), 4);
}

#[test]
fn u_type_immediate_just_past_range() {
    assert!(assemble_err("lui t0, 0x100000\n").to_lowercase().contains("bits") || assemble_err("lui t0, 0x100000\n").to_lowercase().contains("range"));
}

// ---------------------------------------------------------------------
// J-type
// ---------------------------------------------------------------------

#[test]
fn j_type_misaligned_offset_is_range_violation() {
    assert!(assemble_err("jal x0, 5\n").to_lowercase().contains("aligned"));
}

#[test]
fn j_type_just_past_range_is_range_violation() {
    // 2^20 bytes is one past the largest representable signed 21-bit offset.
    assert!(assemble_err("jal x0, 0x100000\n").to_lowercase().contains("range"));
}

// ---------------------------------------------------------------------
// Atomics
// ---------------------------------------------------------------------

#[test]
fn atomic_default_ordering_bits_are_zero() {
    let bytes = assemble_source("amoadd.w t0, t1, t2\n");
    assert_eq!(bytes.len(), 4);
    assert_eq!(bytes[3] & 0b0000_0110, 0);
}

#[test]
fn atomic_with_explicit_ordering_bits() {
    let bytes = assemble_source("amoadd.w t0, t1, t2, 1, 1\n");
    assert_eq!((bytes[3] >> 1) & 0b11, 0b11);
}

#[test]
fn lr_w_takes_two_registers() {
    assert_eq!(assemble_source("lr.w t0, t1\n").len(), 4);
}

// ---------------------------------------------------------------------
// Fence / system
// ---------------------------------------------------------------------

#[test]
fn fence_default_is_full_barrier() {
    assert_eq!(assemble_source("fence\n"), assemble_source("fence 15, 15\n"));
}

#[test]
fn ecall_and_ebreak_differ_only_in_immediate() {
    let ecall = assemble_source("ecall\n");
    let ebreak = assemble_source("ebreak\n");
    assert_eq!(ecall.len(), 4);
    assert_eq!(ebreak.len(), 4);
    assert_ne!(ecall, ebreak);
}

// ---------------------------------------------------------------------
// Compressed constraint boundaries
// ---------------------------------------------------------------------

#[test]
fn c_lui_rejects_x0_and_x2() {
    assert!(assemble_compressed_err("c.lui x0, 0x1000\n").to_lowercase().contains("x0"));
    assert!(assemble_compressed_err("c.lui x2, 0x1000\n").to_lowercase().contains("x2"));
    assert_eq!(assemble_compressed("c.lui x1, 0x1000\n").len(), 2);
}

#[test]
fn c_lui_rejects_zero_immediate() {
    assert!(assemble_compressed_err("c.lui x1, 0\n").to_lowercase().contains("non-zero"));
}

#[test]
fn c_addi_rejects_zero_rd_and_zero_immediate() {
    assert!(assemble_compressed_err("c.addi x0, 1\n").to_lowercase().contains("x0"));
    assert!(assemble_compressed_err("c.addi x1, 0\n").to_lowercase().contains("nonzero"));
}

#[test]
fn c_jr_c_jalr_reject_x0() {
    assert!(assemble_compressed_err("c.jr x0\n").to_lowercase().contains("x0"));
    assert!(assemble_compressed_err("c.jalr x0\n").to_lowercase().contains("x0"));
}

#[test]
fn c_mv_c_add_reject_x0_rs2() {
    assert!(assemble_compressed_err("c.mv x1, x0\n").to_lowercase().contains("rs2"));
    assert!(assemble_compressed_err("c.add x1, x0\n").to_lowercase().contains("rs2"));
}

#[test]
fn c_lw_and_c_sw_reject_registers_outside_x8_x15() {
    assert!(assemble_compressed_err("c.lw x7, 0(x8)\n").to_lowercase().contains("x8-x15"));
    assert!(assemble_compressed_err("c.lw x8, 0(x7)\n").to_lowercase().contains("x8-x15"));
    assert_eq!(assemble_compressed("c.lw x8, 0(x8)\n").len(), 2);
    assert_eq!(assemble_compressed("c.lw x15, 4(x15)\n").len(), 2);
}

#[test]
fn c_addi4spn_rejects_zero_immediate() {
    assert!(assemble_compressed_err("c.addi4spn x8, 0\n").to_lowercase().contains("non-zero"));
    assert_eq!(assemble_compressed("c.addi4spn x8, 4\n").len(), 2);
}

#[test]
fn c_addi16sp_rejects_zero_and_misaligned_immediate() {
    assert!(assemble_compressed_err("c.addi16sp 0\n").to_lowercase().contains("non-zero"));
    assert!(assemble_compressed_err("c.addi16sp 8\n").to_lowercase().contains("16-byte"));
    assert_eq!(assemble_compressed("c.addi16sp 16\n").len(), 2);
}

#[test]
fn c_lwsp_rejects_zero_rd() {
    assert!(assemble_compressed_err("c.lwsp x0, 4\n").to_lowercase().contains("x0"));
    assert_eq!(assemble_compressed("c.lwsp x1, 4\n").len(), 2);
}

#[test]
fn c_slli_rejects_zero_rd_and_zero_shift() {
    assert!(assemble_compressed_err("c.slli x0, 1\n").to_lowercase().contains("x0"));
    assert!(assemble_compressed_err("c.slli x1, 0\n").to_lowercase().contains("nonzero"));
    assert_eq!(assemble_compressed("c.slli x1, 31\n").len(), 2);
}

#[test]
fn compressed_immediate_just_past_signed_six_bit_range() {
    assert_eq!(assemble_compressed("c.li x1, 31\n").len(), 2);
    assert_eq!(assemble_compressed("c.li x1, -32\n").len(), 2);
    assert!(assemble_compressed_err("c.li x1, 32\n").to_lowercase().contains("range"));
    assert!(assemble_compressed_err("c.li x1, -33\n").to_lowercase().contains("range"));
}
