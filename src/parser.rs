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

//! Classifies one lexed line into a typed [`Item`]. Dispatch is a
//! straight-line chain of checks against the lowercased first token, in the
//! same priority order the mnemonic tables imply: labels and constants first
//! (they're recognizable from shape alone), then directives, then every
//! instruction family, with the bare pseudo-instruction names last.

use crate::errors::AssemblerError;
use crate::expr::Expression;
use crate::item::*;
use crate::lexer::LineTokens;
use crate::line::Line;
use crate::registers::{lookup_register, parse_int_literal};

const R_TYPE: &[&str] = &[
    "slli", "srli", "srai", "add", "sub", "sll", "slt", "sltu", "xor", "srl", "sra", "or", "and", "mul", "mulh",
    "mulhsu", "mulhu", "div", "divu", "rem", "remu",
];
const I_TYPE: &[&str] = &["lb", "lh", "lw", "lbu", "lhu", "addi", "slti", "sltiu", "xori", "ori", "andi"];
const S_TYPE: &[&str] = &["sb", "sh", "sw"];
const B_TYPE: &[&str] = &["beq", "bne", "blt", "bge", "bltu", "bgeu"];
const U_TYPE: &[&str] = &["lui", "auipc"];
const A_TYPE: &[&str] = &[
    "sc.w", "amoswap.w", "amoadd.w", "amoxor.w", "amoand.w", "amoor.w", "amomin.w", "amomax.w", "amominu.w",
    "amomaxu.w",
];
/// `c.mv`/`c.add` — both operands spelled out.
const CR_FULL: &[&str] = &["c.mv", "c.add"];
/// `c.jr`/`c.jalr` — single operand, `rs2` implicitly `x0`; folded into the
/// same CR wire shape as [`CR_FULL`] rather than a distinct item.
const CR_JUMP: &[&str] = &["c.jr", "c.jalr"];
const CI_TYPE: &[&str] = &["c.addi", "c.li", "c.slli"];
const CA_TYPE: &[&str] = &["c.sub", "c.xor", "c.or", "c.and"];
const CB_TYPE: &[&str] = &["c.srli", "c.srai", "c.andi", "c.beqz", "c.bnez"];
const CJ_TYPE: &[&str] = &["c.j", "c.jal"];
/// Instructions accepting the alternate `offset(base)` operand syntax.
const BASE_OFFSET: &[&str] = &["jalr", "lb", "lh", "lw", "lbu", "lhu", "sb", "sh", "sw", "c.lw", "c.sw"];
/// Bare pseudo-instruction names not already claimed by a real mnemonic
/// (`jal`, `jalr`, `fence` are pseudo-eligible too, but only via their own
/// 1/2-token short forms below, so they're absent here).
const PSEUDO_NAMES: &[&str] = &[
    "nop", "li", "mv", "not", "neg", "seqz", "snez", "sltz", "sgtz", "beqz", "bnez", "blez", "bgez", "bltz", "bgtz",
    "bgt", "ble", "bgtu", "bleu", "j", "jr", "ret", "call", "tail",
];

pub fn parse_item(lt: LineTokens) -> Result<Item, AssemblerError> {
    let line = lt.line;
    let tokens = lt.tokens;

    if tokens.len() == 1 && tokens[0].ends_with(':') {
        let name = tokens[0].trim_end_matches(':').to_string();
        return Ok(Item::Label(Label { name, line }));
    }
    if tokens.len() >= 3 && tokens[1] == "=" {
        let name = tokens[0].clone();
        let expr = parse_immediate(&tokens[2..], &line)?;
        return Ok(Item::Constant(Constant { name, expr, line }));
    }

    // `mnemonic(a, b, c)` wraps its whole operand list in parens (distinct
    // from the `offset ( base )` base+offset form, which never places `(`
    // immediately after the mnemonic). Strip the wrapper so both spellings
    // reach the same dispatch below.
    let tokens: Vec<String> = if tokens.len() >= 3 && tokens[1] == "(" && tokens.last().map(String::as_str) == Some(")") {
        let mut unwrapped = vec![tokens[0].clone()];
        unwrapped.extend(tokens[2..tokens.len() - 1].iter().cloned());
        unwrapped
    } else {
        tokens
    };

    let head = tokens[0].to_lowercase();

    if head == "string" {
        return Ok(Item::String(StringItem { value: tokens[1].as_bytes().to_vec(), line }));
    }
    if matches!(head.as_str(), "bytes" | "shorts" | "ints" | "longs" | "longlongs") {
        let width = sequence_width(&head);
        let values = tokens[1..].iter().map(|t| Expression::Arithmetic(t.clone())).collect();
        return Ok(Item::Sequence(Sequence { width, values, line }));
    }
    if head == "pack" {
        if tokens.len() < 3 {
            return Err(syntax(&line, "pack requires a format and an immediate"));
        }
        let widths = format_widths(&tokens[1], &line)?;
        let imm_tokens = &tokens[2..];
        if imm_tokens.len() != widths.len() {
            return Err(syntax(&line, "pack format/operand count mismatch"));
        }
        let elements = widths.into_iter().zip(imm_tokens.iter()).map(|(w, t)| (w, Expression::Arithmetic(t.clone()))).collect();
        return Ok(Item::Pack(Pack { elements, line }));
    }
    if matches!(head.as_str(), "db" | "dh" | "dw" | "dd") {
        let width = shorthand_width(&head);
        let values = tokens[1..].iter().map(|t| Expression::Arithmetic(t.clone())).collect();
        return Ok(Item::ShorthandPack(ShorthandPack { width, values, line }));
    }
    if head == "align" {
        if tokens.len() != 2 {
            return Err(syntax(&line, "align requires exactly one integer operand"));
        }
        let boundary = parse_int_literal(&tokens[1])
            .map_err(|_| AssemblerError::NonInteger { line: line.clone(), reason: tokens[1].clone() })?;
        return Ok(Item::Align(Align { boundary: boundary as u32, line }));
    }

    if head == "jalr" {
        return parse_jalr(&tokens, line);
    }
    if R_TYPE.contains(&head.as_str()) {
        if tokens.len() != 4 {
            return Err(syntax(&line, "r-type instructions require exactly 3 args"));
        }
        let name = intern(&head, R_TYPE);
        return Ok(instr(Instruction::R(RTypeInstruction {
            name,
            rd: parse_reg(&tokens[1]),
            rs1: parse_reg(&tokens[2]),
            rs2: parse_reg(&tokens[3]),
            line,
        })));
    }
    if I_TYPE.contains(&head.as_str()) {
        if tokens.len() == 2 {
            return parse_pseudo(&head, &tokens[1..], line);
        }
        let name = intern(&head, I_TYPE);
        let (rd, rs1, imm_tokens) = base_offset_or_plain(&head, &tokens, &line)?;
        let imm = parse_immediate(imm_tokens, &line)?;
        return Ok(instr(Instruction::I(ITypeInstruction { name, rd: parse_reg(rd), rs1: parse_reg(rs1), imm, line })));
    }
    if matches!(head.as_str(), "ecall" | "ebreak") {
        if tokens.len() != 1 {
            return Err(syntax(&line, "ecall/ebreak take no operands"));
        }
        let name = if head == "ecall" { "ecall" } else { "ebreak" };
        return Ok(instr(Instruction::Ie(IeTypeInstruction { name, line })));
    }
    if S_TYPE.contains(&head.as_str()) {
        let name = intern(&head, S_TYPE);
        let (rs1, rs2, imm_tokens) = store_operands(&head, &tokens, &line)?;
        let imm = parse_immediate(imm_tokens, &line)?;
        return Ok(instr(Instruction::S(STypeInstruction {
            name,
            rs1: parse_reg(rs1),
            rs2: parse_reg(rs2),
            imm,
            line,
        })));
    }
    if B_TYPE.contains(&head.as_str()) {
        if tokens.len() < 4 {
            return Err(syntax(&line, "b-type instructions require two registers and a target"));
        }
        let name = intern(&head, B_TYPE);
        let imm = parse_target(&tokens[3..], &line)?;
        return Ok(instr(Instruction::B(BTypeInstruction {
            name,
            rs1: parse_reg(&tokens[1]),
            rs2: parse_reg(&tokens[2]),
            imm,
            line,
        })));
    }
    if U_TYPE.contains(&head.as_str()) {
        if tokens.len() < 3 {
            return Err(syntax(&line, "u-type instructions require a destination and an immediate"));
        }
        let name = intern(&head, U_TYPE);
        let imm = parse_immediate(&tokens[2..], &line)?;
        return Ok(instr(Instruction::U(UTypeInstruction { name, rd: parse_reg(&tokens[1]), imm, line })));
    }
    if head == "jal" {
        return parse_jal(&tokens, line);
    }
    if head == "fence" {
        if tokens.len() == 1 {
            return parse_pseudo("fence", &[], line);
        }
        if tokens.len() != 3 {
            return Err(syntax(&line, "fence instructions require 0 or 2 args"));
        }
        // Source order is `fence succ, pred` even though the struct's own
        // field order is `pred` before `succ`.
        let succ = parse_fence_nibble(&tokens[1], &line)?;
        let pred = parse_fence_nibble(&tokens[2], &line)?;
        return Ok(instr(Instruction::Fence(FenceInstruction { pred, succ, line })));
    }
    if A_TYPE.contains(&head.as_str()) {
        return parse_atomic(&head, &tokens, line);
    }
    if head == "lr.w" {
        return parse_lr_w(&tokens, line);
    }
    if CR_FULL.contains(&head.as_str()) {
        if tokens.len() != 3 {
            return Err(syntax(&line, "cr-type instructions require exactly 2 args"));
        }
        let name = intern(&head, CR_FULL);
        return Ok(instr(Instruction::Compressed(Compressed::Cr {
            name,
            rd_rs1: parse_reg(&tokens[1]),
            rs2: parse_reg(&tokens[2]),
            line,
        })));
    }
    if CR_JUMP.contains(&head.as_str()) {
        if tokens.len() != 2 {
            return Err(syntax(&line, "compressed jump-register instructions require exactly 1 arg"));
        }
        let name = intern(&head, CR_JUMP);
        return Ok(instr(Instruction::Compressed(Compressed::Cr {
            name,
            rd_rs1: parse_reg(&tokens[1]),
            rs2: RegOperand::Resolved(0),
            line,
        })));
    }
    if CI_TYPE.contains(&head.as_str()) {
        if tokens.len() < 3 {
            return Err(syntax(&line, "compressed immediate instructions require a register and an immediate"));
        }
        let name = intern(&head, CI_TYPE);
        let imm = parse_immediate(&tokens[2..], &line)?;
        return Ok(instr(Instruction::Compressed(Compressed::Ci { name, rd_rs1: parse_reg(&tokens[1]), imm, line })));
    }
    if head == "c.lui" {
        if tokens.len() < 3 {
            return Err(syntax(&line, "c.lui requires a destination and an immediate"));
        }
        let imm = parse_immediate(&tokens[2..], &line)?;
        return Ok(instr(Instruction::Compressed(Compressed::Ciu { rd: parse_reg(&tokens[1]), imm, line })));
    }
    if head == "c.addi16sp" {
        if tokens.len() < 2 {
            return Err(syntax(&line, "c.addi16sp requires an immediate"));
        }
        let imm = parse_immediate(&tokens[1..], &line)?;
        return Ok(instr(Instruction::Compressed(Compressed::Cia { imm, line })));
    }
    if head == "c.lwsp" {
        if tokens.len() < 3 {
            return Err(syntax(&line, "c.lwsp requires a destination and an offset"));
        }
        let imm = parse_immediate(&tokens[2..], &line)?;
        return Ok(instr(Instruction::Compressed(Compressed::Cil { rd: parse_reg(&tokens[1]), imm, line })));
    }
    if head == "c.swsp" {
        if tokens.len() < 3 {
            return Err(syntax(&line, "c.swsp requires a source and an offset"));
        }
        let imm = parse_immediate(&tokens[2..], &line)?;
        return Ok(instr(Instruction::Compressed(Compressed::Css { rs2: parse_reg(&tokens[1]), imm, line })));
    }
    if head == "c.addi4spn" {
        if tokens.len() < 3 {
            return Err(syntax(&line, "c.addi4spn requires a destination and an immediate"));
        }
        let imm = parse_immediate(&tokens[2..], &line)?;
        return Ok(instr(Instruction::Compressed(Compressed::Ciw { rd: parse_reg(&tokens[1]), imm, line })));
    }
    if head == "c.lw" {
        let (rd, rs1, imm_tokens) = base_offset_or_plain(&head, &tokens, &line)?;
        let imm = parse_immediate(imm_tokens, &line)?;
        return Ok(instr(Instruction::Compressed(Compressed::Cl {
            rd: parse_reg(rd),
            rs1: parse_reg(rs1),
            imm,
            line,
        })));
    }
    if head == "c.sw" {
        let (rs1, rs2, imm_tokens) = store_operands(&head, &tokens, &line)?;
        let imm = parse_immediate(imm_tokens, &line)?;
        return Ok(instr(Instruction::Compressed(Compressed::Cs {
            rs1: parse_reg(rs1),
            rs2: parse_reg(rs2),
            imm,
            line,
        })));
    }
    if CA_TYPE.contains(&head.as_str()) {
        if tokens.len() != 3 {
            return Err(syntax(&line, "ca-type instructions require exactly 2 args"));
        }
        let name = intern(&head, CA_TYPE);
        return Ok(instr(Instruction::Compressed(Compressed::Ca {
            name,
            rd_rs1: parse_reg(&tokens[1]),
            rs2: parse_reg(&tokens[2]),
            line,
        })));
    }
    if CB_TYPE.contains(&head.as_str()) {
        if tokens.len() < 3 {
            return Err(syntax(&line, "compressed branch/shift instructions require a register and an immediate"));
        }
        let name = intern(&head, CB_TYPE);
        let imm = if matches!(name, "c.beqz" | "c.bnez") {
            parse_target(&tokens[2..], &line)?
        } else {
            parse_immediate(&tokens[2..], &line)?
        };
        return Ok(instr(Instruction::Compressed(Compressed::Cb { name, rd_rs1: parse_reg(&tokens[1]), imm, line })));
    }
    if CJ_TYPE.contains(&head.as_str()) {
        if tokens.len() < 2 {
            return Err(syntax(&line, "compressed jump instructions require an immediate"));
        }
        let name = intern(&head, CJ_TYPE);
        let imm = parse_target(&tokens[1..], &line)?;
        return Ok(instr(Instruction::Compressed(Compressed::Cj { name, imm, line })));
    }
    if PSEUDO_NAMES.contains(&head.as_str()) {
        return parse_pseudo(&head, &tokens[1..], line);
    }

    Err(syntax(&line, "invalid syntax"))
}

fn parse_jalr(tokens: &[String], line: Line) -> Result<Item, AssemblerError> {
    if tokens.len() == 2 {
        return parse_pseudo("jalr", &tokens[1..], line);
    }
    let (rd, rs1, imm_tokens) = base_offset_or_plain("jalr", tokens, &line)?;
    let imm = parse_immediate(imm_tokens, &line)?;
    Ok(instr(Instruction::IJalr(IJalrInstruction { rd: parse_reg(rd), rs1: parse_reg(rs1), imm, is_auipc_jump: false, line })))
}

fn parse_jal(tokens: &[String], line: Line) -> Result<Item, AssemblerError> {
    if tokens.len() == 2 {
        return parse_pseudo("jal", &tokens[1..], line);
    }
    if tokens.len() < 3 {
        return Err(syntax(&line, "jal requires a destination and a target"));
    }
    let imm = parse_target(&tokens[2..], &line)?;
    Ok(instr(Instruction::J(JTypeInstruction { rd: parse_reg(&tokens[1]), imm, line })))
}

fn parse_atomic(head: &str, tokens: &[String], line: Line) -> Result<Item, AssemblerError> {
    if tokens.len() != 4 && tokens.len() != 6 {
        return Err(syntax(&line, "invalid syntax for atomic instruction"));
    }
    let name = intern(head, A_TYPE);
    let (aq, rl) = parse_ordering(&tokens[4..], &line)?;
    Ok(instr(Instruction::A(ATypeInstruction {
        name,
        rd: parse_reg(&tokens[1]),
        rs1: parse_reg(&tokens[2]),
        rs2: parse_reg(&tokens[3]),
        aq,
        rl,
        line,
    })))
}

fn parse_lr_w(tokens: &[String], line: Line) -> Result<Item, AssemblerError> {
    if tokens.len() != 3 && tokens.len() != 5 {
        return Err(syntax(&line, "invalid syntax for atomic instruction"));
    }
    let (aq, rl) = parse_ordering(&tokens[3..], &line)?;
    Ok(instr(Instruction::Al(AlTypeInstruction { rd: parse_reg(&tokens[1]), rs1: parse_reg(&tokens[2]), aq, rl, line })))
}

fn parse_ordering(tokens: &[String], line: &Line) -> Result<(bool, bool), AssemblerError> {
    match tokens.len() {
        0 => Ok((false, false)),
        2 => Ok((parse_bit(&tokens[0], line)?, parse_bit(&tokens[1], line)?)),
        _ => Err(syntax(line, "invalid syntax for atomic instruction")),
    }
}

fn parse_bit(token: &str, line: &Line) -> Result<bool, AssemblerError> {
    match token {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(syntax(line, "atomic ordering bits must be 0 or 1")),
    }
}

fn parse_fence_nibble(token: &str, line: &Line) -> Result<u8, AssemblerError> {
    let value = parse_int_literal(token).map_err(|_| AssemblerError::NonInteger { line: line.clone(), reason: token.to_string() })?;
    if !(0..=15).contains(&value) {
        return Err(AssemblerError::RangeViolation { line: line.clone(), reason: format!("fence operand {value} out of range 0..15") });
    }
    Ok(value as u8)
}

/// Dispatches every bare pseudo-instruction name, including `jalr`/`jal`/
/// `fence`'s short forms which real-instruction dispatch above routes here.
fn parse_pseudo(name: &str, args: &[String], line: Line) -> Result<Item, AssemblerError> {
    let pseudo = match name {
        "nop" => {
            expect0(args, &line, "nop")?;
            Pseudo::Nop
        }
        "li" => {
            if args.len() < 2 {
                return Err(syntax(&line, "li requires a destination register and an immediate"));
            }
            Pseudo::Li { rd: parse_reg(&args[0]), imm: parse_immediate(&args[1..], &line)? }
        }
        "mv" => { let (rd, rs) = expect2(args, &line, "mv")?; Pseudo::Mv { rd: parse_reg(rd), rs: parse_reg(rs) } }
        "not" => { let (rd, rs) = expect2(args, &line, "not")?; Pseudo::Not { rd: parse_reg(rd), rs: parse_reg(rs) } }
        "neg" => { let (rd, rs) = expect2(args, &line, "neg")?; Pseudo::Neg { rd: parse_reg(rd), rs: parse_reg(rs) } }
        "seqz" => { let (rd, rs) = expect2(args, &line, "seqz")?; Pseudo::Seqz { rd: parse_reg(rd), rs: parse_reg(rs) } }
        "snez" => { let (rd, rs) = expect2(args, &line, "snez")?; Pseudo::Snez { rd: parse_reg(rd), rs: parse_reg(rs) } }
        "sltz" => { let (rd, rs) = expect2(args, &line, "sltz")?; Pseudo::Sltz { rd: parse_reg(rd), rs: parse_reg(rs) } }
        "sgtz" => { let (rd, rs) = expect2(args, &line, "sgtz")?; Pseudo::Sgtz { rd: parse_reg(rd), rs: parse_reg(rs) } }
        "beqz" => { let (rs, t) = branch1(args, &line, "beqz")?; Pseudo::Beqz { rs: parse_reg(rs), target: parse_target(t, &line)? } }
        "bnez" => { let (rs, t) = branch1(args, &line, "bnez")?; Pseudo::Bnez { rs: parse_reg(rs), target: parse_target(t, &line)? } }
        "blez" => { let (rs, t) = branch1(args, &line, "blez")?; Pseudo::Blez { rs: parse_reg(rs), target: parse_target(t, &line)? } }
        "bgez" => { let (rs, t) = branch1(args, &line, "bgez")?; Pseudo::Bgez { rs: parse_reg(rs), target: parse_target(t, &line)? } }
        "bltz" => { let (rs, t) = branch1(args, &line, "bltz")?; Pseudo::Bltz { rs: parse_reg(rs), target: parse_target(t, &line)? } }
        "bgtz" => { let (rs, t) = branch1(args, &line, "bgtz")?; Pseudo::Bgtz { rs: parse_reg(rs), target: parse_target(t, &line)? } }
        "bgt" => { let (a, b, t) = branch2(args, &line, "bgt")?; Pseudo::Bgt { rs1: parse_reg(a), rs2: parse_reg(b), target: parse_target(t, &line)? } }
        "ble" => { let (a, b, t) = branch2(args, &line, "ble")?; Pseudo::Ble { rs1: parse_reg(a), rs2: parse_reg(b), target: parse_target(t, &line)? } }
        "bgtu" => { let (a, b, t) = branch2(args, &line, "bgtu")?; Pseudo::Bgtu { rs1: parse_reg(a), rs2: parse_reg(b), target: parse_target(t, &line)? } }
        "bleu" => { let (a, b, t) = branch2(args, &line, "bleu")?; Pseudo::Bleu { rs1: parse_reg(a), rs2: parse_reg(b), target: parse_target(t, &line)? } }
        "j" => { if args.is_empty() { return Err(syntax(&line, "j requires a target")); } Pseudo::J { target: parse_target(args, &line)? } }
        "jal" => { if args.is_empty() { return Err(syntax(&line, "jal requires a target")); } Pseudo::Jal { target: parse_target(args, &line)? } }
        "jr" => { expect1(args, &line, "jr")?; Pseudo::Jr { rs: parse_reg(&args[0]) } }
        "jalr" => { expect1(args, &line, "jalr")?; Pseudo::Jalr { rs: parse_reg(&args[0]) } }
        "ret" => { expect0(args, &line, "ret")?; Pseudo::Ret }
        "call" => { if args.is_empty() { return Err(syntax(&line, "call requires a target")); } Pseudo::Call { target: parse_target(args, &line)? } }
        "tail" => { if args.is_empty() { return Err(syntax(&line, "tail requires a target")); } Pseudo::Tail { target: parse_target(args, &line)? } }
        "fence" => { expect0(args, &line, "fence")?; Pseudo::Fence }
        _ => return Err(syntax(&line, "invalid syntax")),
    };
    Ok(Item::Instruction(Instruction::Pseudo(PseudoInstruction { pseudo, line })))
}

/// Parses a full immediate-operand expression: `%position`, `%offset`,
/// `%hi`, `%lo` (each optionally parenthesized, and `%hi`/`%lo` nestable), or
/// a plain arithmetic sub-expression formed by rejoining the remaining
/// tokens with spaces.
fn parse_immediate(tokens: &[String], line: &Line) -> Result<Expression, AssemblerError> {
    if tokens.is_empty() {
        return Err(syntax(line, "missing immediate"));
    }
    let head = tokens[0].to_lowercase();
    match head.as_str() {
        "%position" => {
            if tokens.get(1).map(String::as_str) == Some("(") {
                if tokens.len() < 4 || tokens.last().map(String::as_str) != Some(")") {
                    return Err(syntax(line, "malformed %position"));
                }
                let reference = tokens[2].clone();
                let inner = tokens[3..tokens.len() - 1].join(" ");
                let inner = if inner.is_empty() { "0".to_string() } else { inner };
                Ok(Expression::Position(reference, Box::new(Expression::Arithmetic(inner))))
            } else {
                if tokens.len() < 2 {
                    return Err(syntax(line, "malformed %position"));
                }
                let reference = tokens[1].clone();
                let inner = tokens[2..].join(" ");
                let inner = if inner.is_empty() { "0".to_string() } else { inner };
                Ok(Expression::Position(reference, Box::new(Expression::Arithmetic(inner))))
            }
        }
        "%offset" => {
            if tokens.get(1).map(String::as_str) == Some("(") {
                if tokens.len() != 4 || tokens[3] != ")" {
                    return Err(syntax(line, "malformed %offset"));
                }
                Ok(Expression::Offset(tokens[2].clone()))
            } else {
                if tokens.len() != 2 {
                    return Err(syntax(line, "malformed %offset"));
                }
                Ok(Expression::Offset(tokens[1].clone()))
            }
        }
        "%hi" => Ok(Expression::Hi(Box::new(parse_immediate(strip_wrapper(tokens, line)?, line)?))),
        "%lo" => Ok(Expression::Lo(Box::new(parse_immediate(strip_wrapper(tokens, line)?, line)?))),
        _ => Ok(Expression::Arithmetic(tokens.join(" "))),
    }
}

/// Strips a `%hi`/`%lo` wrapper (and its parens, if present) leaving the
/// inner token slice to be recursively parsed.
fn strip_wrapper<'a>(tokens: &'a [String], line: &Line) -> Result<&'a [String], AssemblerError> {
    if tokens.get(1).map(String::as_str) == Some("(") {
        if tokens.len() < 3 || tokens.last().map(String::as_str) != Some(")") {
            return Err(syntax(line, "malformed relocation wrapper"));
        }
        Ok(&tokens[2..tokens.len() - 1])
    } else {
        if tokens.len() < 2 {
            return Err(syntax(line, "malformed relocation wrapper"));
        }
        Ok(&tokens[1..])
    }
}

/// Shared shape for `jalr`/load/`c.lw`: either `name rd rs1 imm` or the
/// `name rd offset ( rs1 )` base+offset form, selected by `tokens[3] == "("`.
fn base_offset_or_plain<'a>(head: &str, tokens: &'a [String], line: &Line) -> Result<(&'a str, &'a str, &'a [String]), AssemblerError> {
    if BASE_OFFSET.contains(&head) && tokens.len() > 3 && tokens[3] == "(" {
        if tokens.len() != 6 || tokens[5] != ")" {
            return Err(syntax(line, "malformed base+offset operand"));
        }
        Ok((tokens[1].as_str(), tokens[4].as_str(), std::slice::from_ref(&tokens[2])))
    } else {
        if tokens.len() < 3 {
            return Err(syntax(line, "instruction requires a destination, base register, and immediate"));
        }
        Ok((tokens[1].as_str(), tokens[2].as_str(), &tokens[3..]))
    }
}

/// Shared shape for `sb`/`sh`/`sw`/`c.sw`: either `name rs1 rs2 imm` or the
/// `name rs2 offset ( rs1 )` base+offset form (the value register comes
/// first in the parenthesized form, matching conventional RISC-V store
/// syntax `sw rs2, offset(rs1)`). Always returns `(rs1, rs2, imm_tokens)`.
fn store_operands<'a>(head: &str, tokens: &'a [String], line: &Line) -> Result<(&'a str, &'a str, &'a [String]), AssemblerError> {
    if BASE_OFFSET.contains(&head) && tokens.len() > 3 && tokens[3] == "(" {
        if tokens.len() != 6 || tokens[5] != ")" {
            return Err(syntax(line, "malformed base+offset operand"));
        }
        Ok((tokens[4].as_str(), tokens[1].as_str(), std::slice::from_ref(&tokens[2])))
    } else {
        if tokens.len() < 3 {
            return Err(syntax(line, "store instructions require a base register, a value register, and an immediate"));
        }
        Ok((tokens[1].as_str(), tokens[2].as_str(), &tokens[3..]))
    }
}

fn parse_reg(token: &str) -> RegOperand {
    match lookup_register(token) {
        Some(r) => RegOperand::Resolved(r),
        None => RegOperand::Alias(token.to_string()),
    }
}

/// A bare label reference becomes `%offset label`; a plain integer token is
/// used as a literal immediate. Mirrors the branch/jump dispatch's
/// integer-vs-name check in the reference implementation.
fn ref_expr(token: &str) -> Expression {
    if is_plain_int(token) {
        Expression::Arithmetic(token.to_string())
    } else {
        Expression::Offset(token.to_string())
    }
}

fn is_plain_int(token: &str) -> bool {
    token.parse::<i64>().is_ok()
}

/// Parses a branch/jump target: a single bare token goes through [`ref_expr`]
/// (plain integer literal vs. bare label, the latter becoming a PC-relative
/// `%offset`); anything longer is a full immediate expression, which may
/// itself start with `%offset`/`%hi`/`%lo` and must be parsed as such rather
/// than folded into `Expression::Arithmetic`.
fn parse_target(tokens: &[String], line: &Line) -> Result<Expression, AssemblerError> {
    if tokens.is_empty() {
        return Err(syntax(line, "missing branch/jump target"));
    }
    if tokens.len() == 1 {
        return Ok(ref_expr(&tokens[0]));
    }
    parse_immediate(tokens, line)
}

fn sequence_width(name: &str) -> Width {
    match name {
        "bytes" => Width::Byte,
        "shorts" => Width::Half,
        "ints" | "longs" => Width::Word,
        "longlongs" => Width::DWord,
        _ => unreachable!("caller filters to known sequence names"),
    }
}

fn shorthand_width(name: &str) -> Width {
    match name {
        "db" => Width::Byte,
        "dh" => Width::Half,
        "dw" => Width::Word,
        "dd" => Width::DWord,
        _ => unreachable!("caller filters to known shorthand names"),
    }
}

/// Resolves a `pack` format string (an optional `<`/`>` endianness marker
/// followed by one field-type character per packed value) to the list of
/// widths its fields need. Floating-point field characters aren't accepted:
/// every expression in this dialect is integer-valued.
fn format_widths(fmt: &str, line: &Line) -> Result<Vec<Width>, AssemblerError> {
    let body = fmt.trim_start_matches(['<', '>']);
    if body.is_empty() {
        return Err(syntax(line, "pack format has no fields"));
    }
    body.chars()
        .map(|c| match c {
            'b' | 'B' => Ok(Width::Byte),
            'h' | 'H' => Ok(Width::Half),
            'i' | 'I' => Ok(Width::Word),
            'q' | 'Q' => Ok(Width::DWord),
            other => Err(syntax(line, &format!("unsupported pack format character: {other}"))),
        })
        .collect()
}

fn intern(head: &str, table: &[&'static str]) -> &'static str {
    table.iter().copied().find(|n| *n == head).expect("caller already confirmed table membership")
}

fn instr(i: Instruction) -> Item {
    Item::Instruction(i)
}

fn syntax(line: &Line, reason: &str) -> AssemblerError {
    AssemblerError::Syntax { line: line.clone(), reason: reason.to_string() }
}

fn expect0(args: &[String], line: &Line, what: &str) -> Result<(), AssemblerError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(syntax(line, &format!("{what} takes no operands")))
    }
}

fn expect1<'a>(args: &'a [String], line: &Line, what: &str) -> Result<&'a str, AssemblerError> {
    if args.len() != 1 {
        return Err(syntax(line, &format!("{what} requires exactly 1 operand")));
    }
    Ok(&args[0])
}

fn expect2<'a>(args: &'a [String], line: &Line, what: &str) -> Result<(&'a str, &'a str), AssemblerError> {
    if args.len() != 2 {
        return Err(syntax(line, &format!("{what} requires exactly 2 operands")));
    }
    Ok((&args[0], &args[1]))
}

fn expect3<'a>(args: &'a [String], line: &Line, what: &str) -> Result<(&'a str, &'a str, &'a str), AssemblerError> {
    if args.len() != 3 {
        return Err(syntax(line, &format!("{what} requires exactly 3 operands")));
    }
    Ok((&args[0], &args[1], &args[2]))
}

/// Splits a single-register pseudo-branch's operands into `(rs, target_tokens)`.
/// The target may be a bare label/integer or a multi-token expression like
/// `%offset label`, so only the register prefix has fixed arity.
fn branch1<'a>(args: &'a [String], line: &Line, what: &str) -> Result<(&'a str, &'a [String]), AssemblerError> {
    if args.len() < 2 {
        return Err(syntax(line, &format!("{what} requires a register and a target")));
    }
    Ok((&args[0], &args[1..]))
}

/// Splits a two-register pseudo-branch's operands into `(rs1, rs2,
/// target_tokens)`.
fn branch2<'a>(args: &'a [String], line: &Line, what: &str) -> Result<(&'a str, &'a str, &'a [String]), AssemblerError> {
    if args.len() < 3 {
        return Err(syntax(line, &format!("{what} requires two registers and a target")));
    }
    Ok((&args[0], &args[1], &args[2..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_tokens;

    fn parse(text: &str) -> Item {
        let line = Line::synthetic(text);
        let lt = lex_tokens(&line).unwrap().unwrap();
        parse_item(lt).unwrap()
    }

    #[test]
    fn parses_label() {
        assert!(matches!(parse("start:"), Item::Label(l) if l.name == "start"));
    }

    #[test]
    fn parses_constant() {
        match parse("FOO = 42") {
            Item::Constant(c) => {
                assert_eq!(c.name, "FOO");
                assert_eq!(c.expr, Expression::Arithmetic("42".to_string()));
            }
            other => panic!("expected Constant, got {other:?}"),
        }
    }

    #[test]
    fn parses_r_type() {
        match parse("add t0 t1 t2") {
            Item::Instruction(Instruction::R(r)) => {
                assert_eq!(r.name, "add");
                assert_eq!(r.rd, RegOperand::Resolved(5));
                assert_eq!(r.rs1, RegOperand::Resolved(6));
                assert_eq!(r.rs2, RegOperand::Resolved(7));
            }
            other => panic!("expected R-type, got {other:?}"),
        }
    }

    #[test]
    fn parses_base_offset_load() {
        match parse("lw t0, 4(sp)") {
            Item::Instruction(Instruction::I(i)) => {
                assert_eq!(i.name, "lw");
                assert_eq!(i.rs1, RegOperand::Resolved(2));
                assert_eq!(i.imm, Expression::Arithmetic("4".to_string()));
            }
            other => panic!("expected I-type, got {other:?}"),
        }
    }

    #[test]
    fn parses_store_base_offset_with_value_register_first() {
        match parse("sw t1, 8(sp)") {
            Item::Instruction(Instruction::S(s)) => {
                assert_eq!(s.rs1, RegOperand::Resolved(2));
                assert_eq!(s.rs2, RegOperand::Resolved(6));
                assert_eq!(s.imm, Expression::Arithmetic("8".to_string()));
            }
            other => panic!("expected S-type, got {other:?}"),
        }
    }

    #[test]
    fn branch_to_label_becomes_offset() {
        match parse("beq t0 zero main") {
            Item::Instruction(Instruction::B(b)) => assert_eq!(b.imm, Expression::Offset("main".to_string())),
            other => panic!("expected B-type, got {other:?}"),
        }
    }

    #[test]
    fn branch_to_literal_stays_arithmetic() {
        match parse("beq t0 zero 12") {
            Item::Instruction(Instruction::B(b)) => assert_eq!(b.imm, Expression::Arithmetic("12".to_string())),
            other => panic!("expected B-type, got {other:?}"),
        }
    }

    #[test]
    fn fence_maps_first_token_to_succ() {
        match parse("fence 0b0001, 0b0010") {
            Item::Instruction(Instruction::Fence(f)) => {
                assert_eq!(f.succ, 0b0001);
                assert_eq!(f.pred, 0b0010);
            }
            other => panic!("expected Fence, got {other:?}"),
        }
    }

    #[test]
    fn bare_fence_is_pseudo() {
        match parse("fence") {
            Item::Instruction(Instruction::Pseudo(p)) => assert_eq!(p.pseudo, Pseudo::Fence),
            other => panic!("expected pseudo fence, got {other:?}"),
        }
    }

    #[test]
    fn jalr_two_tokens_is_pseudo() {
        match parse("jalr t0") {
            Item::Instruction(Instruction::Pseudo(p)) => {
                assert!(matches!(p.pseudo, Pseudo::Jalr { rs: RegOperand::Resolved(5) }));
            }
            other => panic!("expected pseudo jalr, got {other:?}"),
        }
    }

    #[test]
    fn jal_two_tokens_is_pseudo() {
        match parse("jal main") {
            Item::Instruction(Instruction::Pseudo(p)) => {
                assert!(matches!(p.pseudo, Pseudo::Jal { target: Expression::Offset(ref n) } if n == "main"));
            }
            other => panic!("expected pseudo jal, got {other:?}"),
        }
    }

    #[test]
    fn parses_hi_of_position() {
        let line = Line::synthetic("");
        let tokens: Vec<String> = "%hi %position main ADDR".split_whitespace().map(String::from).collect();
        let expr = parse_immediate(&tokens, &line).unwrap();
        match expr {
            Expression::Hi(inner) => match *inner {
                Expression::Position(reference, inner2) => {
                    assert_eq!(reference, "main");
                    assert_eq!(*inner2, Expression::Arithmetic("ADDR".to_string()));
                }
                other => panic!("expected Position, got {other:?}"),
            },
            other => panic!("expected Hi, got {other:?}"),
        }
    }

    #[test]
    fn parses_parenthesized_lo_of_position() {
        let line = Line::synthetic("");
        let tokens: Vec<String> = "%lo ( %position ( main ADDR ) )".split_whitespace().map(String::from).collect();
        let expr = parse_immediate(&tokens, &line).unwrap();
        assert!(matches!(expr, Expression::Lo(_)));
    }

    #[test]
    fn parses_cr_jump_with_implicit_rs2() {
        match parse("c.jr ra") {
            Item::Instruction(Instruction::Compressed(Compressed::Cr { name, rd_rs1, rs2, .. })) => {
                assert_eq!(name, "c.jr");
                assert_eq!(rd_rs1, RegOperand::Resolved(1));
                assert_eq!(rs2, RegOperand::Resolved(0));
            }
            other => panic!("expected Cr, got {other:?}"),
        }
    }

    #[test]
    fn parses_pack_directive() {
        match parse("pack <B 42") {
            Item::Pack(p) => {
                assert_eq!(p.elements, vec![(Width::Byte, Expression::Arithmetic("42".to_string()))]);
            }
            other => panic!("expected Pack, got {other:?}"),
        }
    }

    #[test]
    fn parses_sequence_directive() {
        match parse("bytes 1 2 0x03") {
            Item::Sequence(s) => {
                assert_eq!(s.width, Width::Byte);
                assert_eq!(s.values.len(), 3);
            }
            other => panic!("expected Sequence, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_mnemonic_is_syntax_error() {
        let line = Line::synthetic("bogus x0 x0 0");
        let lt = lex_tokens(&line).unwrap().unwrap();
        assert!(parse_item(lt).is_err());
    }

    #[test]
    fn parenthesized_whole_operand_list_matches_plain_form() {
        match parse("addi(t2, zero, 3)") {
            Item::Instruction(Instruction::I(i)) => {
                assert_eq!(i.name, "addi");
                assert_eq!(i.rd, RegOperand::Resolved(7));
                assert_eq!(i.rs1, RegOperand::Resolved(0));
                assert_eq!(i.imm, Expression::Arithmetic("3".to_string()));
            }
            other => panic!("expected I-type, got {other:?}"),
        }
    }

    #[test]
    fn position_with_omitted_inner_defaults_to_zero() {
        let line = Line::synthetic("");
        let tokens: Vec<String> = "%position main".split_whitespace().map(String::from).collect();
        match parse_immediate(&tokens, &line).unwrap() {
            Expression::Position(reference, inner) => {
                assert_eq!(reference, "main");
                assert_eq!(*inner, Expression::Arithmetic("0".to_string()));
            }
            other => panic!("expected Position, got {other:?}"),
        }
    }

    #[test]
    fn jal_accepts_multi_token_offset_target() {
        match parse("jal zero %offset middle") {
            Item::Instruction(Instruction::J(j)) => assert_eq!(j.imm, Expression::Offset("middle".to_string())),
            other => panic!("expected J-type, got {other:?}"),
        }
    }

    #[test]
    fn branch_accepts_multi_token_offset_target() {
        match parse("beq t0 zero %offset(main)") {
            Item::Instruction(Instruction::B(b)) => assert_eq!(b.imm, Expression::Offset("main".to_string())),
            other => panic!("expected B-type, got {other:?}"),
        }
    }

    #[test]
    fn compressed_branch_bare_label_is_pc_relative() {
        match parse("c.beqz t0 main") {
            Item::Instruction(Instruction::Compressed(Compressed::Cb { imm, .. })) => {
                assert_eq!(imm, Expression::Offset("main".to_string()));
            }
            other => panic!("expected Cb, got {other:?}"),
        }
    }

    #[test]
    fn compressed_andi_immediate_stays_arithmetic() {
        match parse("c.andi t0 5") {
            Item::Instruction(Instruction::Compressed(Compressed::Cb { imm, .. })) => {
                assert_eq!(imm, Expression::Arithmetic("5".to_string()));
            }
            other => panic!("expected Cb, got {other:?}"),
        }
    }

    #[test]
    fn compressed_jump_bare_label_is_pc_relative() {
        match parse("c.j main") {
            Item::Instruction(Instruction::Compressed(Compressed::Cj { imm, .. })) => {
                assert_eq!(imm, Expression::Offset("main".to_string()));
            }
            other => panic!("expected Cj, got {other:?}"),
        }
    }

    #[test]
    fn pseudo_beqz_accepts_multi_token_target() {
        match parse("beqz t0, %offset(main)") {
            Item::Instruction(Instruction::Pseudo(p)) => {
                assert!(matches!(p.pseudo, Pseudo::Beqz { target: Expression::Offset(ref n), .. } if n == "main"));
            }
            other => panic!("expected pseudo beqz, got {other:?}"),
        }
    }

    #[test]
    fn pseudo_call_accepts_multi_token_target() {
        match parse("call %offset main") {
            Item::Instruction(Instruction::Pseudo(p)) => {
                assert!(matches!(p.pseudo, Pseudo::Call { target: Expression::Offset(ref n) } if n == "main"));
            }
            other => panic!("expected pseudo call, got {other:?}"),
        }
    }
}
