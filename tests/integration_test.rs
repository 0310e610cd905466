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

#[test]
fn basic_addi_forms_all_spell_the_same_instruction() {
    let bytes = assemble_source("addi t0 zero 1\naddi t1, zero, 2\naddi(t2, zero, 3)\n");
    assert_eq!(
        bytes,
        vec![
            0x93, 0x02, 0x10, 0x00, // addi t0, zero, 1
            0x13, 0x03, 0x20, 0x00, // addi t1, zero, 2
            0x93, 0x03, 0x30, 0x00, // addi t2, zero, 3
        ]
    );
}

#[test]
fn constants_and_register_alias_resolve_before_encoding() {
    let source = "FOO = 42\nBAR = FOO * 2\nBAZ = BAR >> 1 & 0b11111\nIP = gp\naddi zero zero BAR\naddi s0 IP BAZ\n";
    let bytes = assemble_source(source);
    assert_eq!(
        bytes,
        vec![
            0x13, 0x00, 0x40, 0x05, // addi zero, zero, 84
            0x13, 0x84, 0xa1, 0x00, // addi s0, gp, 10
        ]
    );
}

#[test]
fn forward_and_backward_labels_resolve_to_pc_relative_offsets() {
    let source = "start:    addi t0 zero 42\n          jal zero end\nmiddle:   beq t0 zero main\n          addi t0 t0 -1\nend:      jal zero %offset middle\nmain:     addi zero zero 0\n";
    let bytes = assemble_source(source);
    assert_eq!(
        bytes,
        vec![
            0x93, 0x02, 0xa0, 0x02, // addi t0, zero, 42
            0x6f, 0x00, 0xc0, 0x00, // jal zero, end (+12)
            0x63, 0x86, 0x02, 0x00, // beq t0, zero, main (+12)
            0x93, 0x82, 0xf2, 0xff, // addi t0, t0, -1
            0x6f, 0xf0, 0x9f, 0xff, // jal zero, middle (-8)
            0x13, 0x00, 0x00, 0x00, // addi zero, zero, 0
        ]
    );
}

#[test]
fn data_directives_pack_byte_sequences() {
    let bytes = assemble_source("bytes 1 2 0x03 0b100 5 0x06 0b111 8\n");
    assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn align_pads_with_zeroes_to_the_next_boundary() {
    let bytes = assemble_source("addi zero zero 0\npack <B 42\nalign 4\naddi zero zero 0\n");
    assert_eq!(
        bytes,
        vec![0x13, 0x00, 0x00, 0x00, 0x2a, 0x00, 0x00, 0x00, 0x13, 0x00, 0x00, 0x00]
    );
}

#[test]
fn hi_lo_relocation_and_nested_position_agree_with_plain_label_lookup() {
    let source = "ADDR = 0x20000000\naddi zero zero 0\naddi zero zero 0\naddi zero zero 0\nmain:\n  lui  t0, %hi ADDR\n  addi t0 t0 %lo(ADDR)\n  addi t0 t0 main\n  lui  t0, %hi %position main ADDR\n  addi t0 t0 %lo(%position(main, ADDR))\n";
    let bytes = assemble_source(source);
    let tail = &bytes[bytes.len() - 20..];
    assert_eq!(
        tail,
        &[
            0xb7, 0x02, 0x00, 0x20, // lui t0, %hi(0x20000000)
            0x93, 0x82, 0x02, 0x00, // addi t0, t0, %lo(0x20000000) == 0
            0x93, 0x82, 0xc2, 0x00, // addi t0, t0, 12 (main's absolute position)
            0xb7, 0x02, 0x00, 0x20, // lui t0, %hi(0x2000000c)
            0x93, 0x82, 0xc2, 0x00, // addi t0, t0, %lo(0x2000000c) == 12
        ][..]
    );
}

#[test]
fn base_offset_and_whole_list_syntax_encode_the_same_load() {
    let base_offset = assemble_source("lw t0, 4(sp)\n");
    let whole_list = assemble_source("lw(t0, sp, 4)\n");
    assert_eq!(base_offset, whole_list);
}

#[test]
fn pseudo_li_expands_to_lui_plus_addi_for_large_immediates() {
    let bytes = assemble_source("li t0, 0x12345678\n");
    assert_eq!(bytes.len(), 8);
}

#[test]
fn pseudo_nop_and_real_addi_zero_are_identical() {
    assert_eq!(assemble_source("nop\n"), assemble_source("addi zero zero 0\n"));
}

#[test]
fn pseudo_branch_targets_accept_bare_labels_and_relocation_wrappers() {
    let bare = assemble_source("start:\nbeqz t0, start\n");
    let wrapped = assemble_source("start:\nbeqz t0, %offset(start)\n");
    assert_eq!(bare, wrapped);
}

#[test]
fn call_and_tail_each_expand_to_an_auipc_jalr_pair_with_correct_immediates() {
    // `target` sits 12 bytes past the `call`/`tail`'s own `auipc`, so
    // `%hi(target)` is 0 (the whole offset fits in the `jalr`'s 12-bit
    // immediate) and the `jalr`'s `%lo` must land on 12, not 8 — it is
    // evaluated 4 bytes further along than the `auipc`.
    let call = assemble_source("call target\nnop\ntarget:\n");
    assert_eq!(
        call,
        vec![
            0x97, 0x00, 0x00, 0x00, // auipc ra, 0
            0xe7, 0x80, 0xc0, 0x00, // jalr ra, ra, 12
            0x13, 0x00, 0x00, 0x00, // nop
        ]
    );

    let tail = assemble_source("tail target\nnop\ntarget:\n");
    assert_eq!(
        tail,
        vec![
            0x17, 0x03, 0x00, 0x00, // auipc t1, 0
            0x67, 0x00, 0xc3, 0x00, // jalr x0, t1, 12
            0x13, 0x00, 0x00, 0x00, // nop
        ]
    );
}

#[test]
fn call_immediate_fixup_rejects_the_auipc_jump_boundary() {
    // At an offset of exactly 2048 bytes from the `auipc`, the correct
    // `is_auipc_jump`-adjusted immediate (`relocate_lo(offset - 4) + 4`)
    // comes out to 2048 — one past the largest representable signed
    // 12-bit value — and must be rejected rather than silently wrapping
    // to some other in-range value.
    let padding = "nop\n".repeat(510);
    let source = format!("call target\n{padding}target:\n");
    let mut reader = MockFileReader::default();
    reader.add_file("test.s", &source);
    let err = assemble(Path::new("test.s"), false, &reader).unwrap_err();
    assert!(format!("{err:#}").to_lowercase().contains("range"));
}

#[test]
fn compression_pass_shrinks_eligible_instructions_and_shifts_labels() {
    let source = "start:\naddi t0 zero 1\njal zero start\n";
    let uncompressed = assemble_source(source);
    let compressed = assemble_compressed(source);
    assert!(compressed.len() < uncompressed.len());
}

#[test]
fn compressed_branch_target_is_pc_relative_like_its_real_counterpart() {
    let source = "main:\naddi t0 zero 0\nc.beqz t0 main\n";
    let bytes = assemble_compressed(source);
    // addi (4 bytes, survives compression since it has no compressed form
    // with an immediate of 0 that still needs all three operands spelled
    // out) followed by a 2-byte c.beqz.
    assert_eq!(bytes.len(), 6);
}

#[test]
fn undefined_label_is_reported_as_unknown_name() {
    let mut reader = MockFileReader::default();
    reader.add_file("test.s", "jal zero nowhere\n");
    let err = assemble(Path::new("test.s"), false, &reader).unwrap_err();
    assert!(err.to_string().contains("unknown name") || format!("{err:#}").contains("unknown name"));
}

#[test]
fn out_of_range_immediate_is_a_range_violation() {
    let mut reader = MockFileReader::default();
    reader.add_file("test.s", "addi t0 zero 4096\n");
    let err = assemble(Path::new("test.s"), false, &reader).unwrap_err();
    assert!(format!("{err:#}").to_lowercase().contains("range"));
}

#[test]
fn register_shadowing_a_constant_name_is_rejected() {
    let mut reader = MockFileReader::default();
    reader.add_file("test.s", "t0 = 5\naddi zero zero t0\n");
    assert!(assemble(Path::new("test.s"), false, &reader).is_err());
}

#[test]
fn missing_source_file_surfaces_the_read_error() {
    let reader = MockFileReader::default();
    assert!(assemble(Path::new("missing.s"), false, &reader).is_err());
}
