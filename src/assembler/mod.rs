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

//! The resolution and lowering passes that turn a parsed `Item` stream into
//! a flat byte blob: constant/label resolution, register-alias resolution,
//! the optional compression transform, pseudo-instruction expansion,
//! immediate resolution, instruction encoding, and final data-directive
//! lowering. Each pass is a free function taking `&mut Vec<Item>` (or
//! producing a new one), run in the fixed order `lib::assemble` drives.

pub mod encoder;
pub mod pseudo;

use std::collections::HashMap;

use log::{debug, trace};

use crate::errors::AssemblerError;
use crate::expr::Environment;
use crate::item::{
    Align, Blob, Compressed, Instruction, Item, Pack, RegOperand, Sequence, ShorthandPack, Width,
};
use crate::registers::lookup_register;

/// Walks `items` computing each one's byte position, evaluating `Constant`
/// items against the running environment (constants only — register names
/// are not consulted, so a constant may not shadow a register), and
/// stripping `Constant` items from the output.
pub fn resolve_constants(items: Vec<Item>) -> Result<(Vec<Item>, HashMap<String, i64>), AssemblerError> {
    let mut env = Environment::default();
    let mut position: u32 = 0;
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        match item {
            Item::Constant(c) => {
                if lookup_register(&c.name).is_some() {
                    return Err(AssemblerError::RegisterShadow { line: c.line, name: c.name });
                }
                let value = c.expr.eval(position, &env, &c.line)?;
                env.constants.insert(c.name, value);
            }
            other => {
                position += item_size(&other);
                out.push(other);
            }
        }
    }

    trace!("resolve_constants: {} constants, {} items remain", env.constants.len(), out.len());
    Ok((out, env.constants))
}

/// Walks `items` tracking position, records every `Label`'s position, and
/// strips `Label` items from the output.
pub fn resolve_labels(items: Vec<Item>) -> (Vec<Item>, HashMap<String, u32>) {
    let mut labels = HashMap::new();
    let mut position: u32 = 0;
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        match item {
            Item::Label(l) => {
                labels.insert(l.name, position);
            }
            other => {
                position += item_size(&other);
                out.push(other);
            }
        }
    }

    trace!("resolve_labels: {} labels, {} items remain", labels.len(), out.len());
    (out, labels)
}

/// Resolves every `RegOperand::Alias` field against `constants`, replacing
/// it with the concrete index the alias names. An alias that isn't a known
/// register after constant substitution is an `UnknownName` error.
pub fn resolve_register_aliases(items: Vec<Item>, constants: &HashMap<String, i64>) -> Result<Vec<Item>, AssemblerError> {
    items.into_iter().map(|item| resolve_register_aliases_item(item, constants)).collect()
}

fn resolve_reg(op: RegOperand, constants: &HashMap<String, i64>, line: &crate::line::Line) -> Result<RegOperand, AssemblerError> {
    match op {
        RegOperand::Resolved(r) => Ok(RegOperand::Resolved(r)),
        RegOperand::Alias(name) => {
            if let Some(r) = lookup_register(&name) {
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
}

fn resolve_register_aliases_item(item: Item, constants: &HashMap<String, i64>) -> Result<Item, AssemblerError> {
    let Item::Instruction(instr) = item else { return Ok(item) };
    let line = instr.line().clone();
    let resolved = match instr {
        Instruction::R(mut i) => {
            i.rd = resolve_reg(i.rd, constants, &line)?;
            i.rs1 = resolve_reg(i.rs1, constants, &line)?;
            i.rs2 = resolve_reg(i.rs2, constants, &line)?;
            Instruction::R(i)
        }
        Instruction::I(mut i) => {
            i.rd = resolve_reg(i.rd, constants, &line)?;
            i.rs1 = resolve_reg(i.rs1, constants, &line)?;
            Instruction::I(i)
        }
        Instruction::IJalr(mut i) => {
            i.rd = resolve_reg(i.rd, constants, &line)?;
            i.rs1 = resolve_reg(i.rs1, constants, &line)?;
            Instruction::IJalr(i)
        }
        Instruction::Ie(i) => Instruction::Ie(i),
        Instruction::S(mut i) => {
            i.rs1 = resolve_reg(i.rs1, constants, &line)?;
            i.rs2 = resolve_reg(i.rs2, constants, &line)?;
            Instruction::S(i)
        }
        Instruction::B(mut i) => {
            i.rs1 = resolve_reg(i.rs1, constants, &line)?;
            i.rs2 = resolve_reg(i.rs2, constants, &line)?;
            Instruction::B(i)
        }
        Instruction::U(mut i) => {
            i.rd = resolve_reg(i.rd, constants, &line)?;
            Instruction::U(i)
        }
        Instruction::J(mut i) => {
            i.rd = resolve_reg(i.rd, constants, &line)?;
            Instruction::J(i)
        }
        Instruction::Fence(i) => Instruction::Fence(i),
        Instruction::A(mut i) => {
            i.rd = resolve_reg(i.rd, constants, &line)?;
            i.rs1 = resolve_reg(i.rs1, constants, &line)?;
            i.rs2 = resolve_reg(i.rs2, constants, &line)?;
            Instruction::A(i)
        }
        Instruction::Al(mut i) => {
            i.rd = resolve_reg(i.rd, constants, &line)?;
            i.rs1 = resolve_reg(i.rs1, constants, &line)?;
            Instruction::Al(i)
        }
        Instruction::Pseudo(p) => Instruction::Pseudo(pseudo::resolve_pseudo_registers(p, constants)?),
        Instruction::Compressed(c) => Instruction::Compressed(resolve_compressed_registers(c, constants, &line)?),
    };
    Ok(Item::Instruction(resolved))
}

fn resolve_compressed_registers(c: Compressed, constants: &HashMap<String, i64>, line: &crate::line::Line) -> Result<Compressed, AssemblerError> {
    Ok(match c {
        Compressed::Cr { name, rd_rs1, rs2, line: l } => Compressed::Cr {
            name,
            rd_rs1: resolve_reg(rd_rs1, constants, line)?,
            rs2: resolve_reg(rs2, constants, line)?,
            line: l,
        },
        Compressed::Ci { name, rd_rs1, imm, line: l } => {
            Compressed::Ci { name, rd_rs1: resolve_reg(rd_rs1, constants, line)?, imm, line: l }
        }
        Compressed::Cia { imm, line: l } => Compressed::Cia { imm, line: l },
        Compressed::Ciu { rd, imm, line: l } => Compressed::Ciu { rd: resolve_reg(rd, constants, line)?, imm, line: l },
        Compressed::Cil { rd, imm, line: l } => Compressed::Cil { rd: resolve_reg(rd, constants, line)?, imm, line: l },
        Compressed::Css { rs2, imm, line: l } => Compressed::Css { rs2: resolve_reg(rs2, constants, line)?, imm, line: l },
        Compressed::Ciw { rd, imm, line: l } => Compressed::Ciw { rd: resolve_reg(rd, constants, line)?, imm, line: l },
        Compressed::Cl { rd, rs1, imm, line: l } => Compressed::Cl {
            rd: resolve_reg(rd, constants, line)?,
            rs1: resolve_reg(rs1, constants, line)?,
            imm,
            line: l,
        },
        Compressed::Cs { rs1, rs2, imm, line: l } => Compressed::Cs {
            rs1: resolve_reg(rs1, constants, line)?,
            rs2: resolve_reg(rs2, constants, line)?,
            imm,
            line: l,
        },
        Compressed::Ca { name, rd_rs1, rs2, line: l } => Compressed::Ca {
            name,
            rd_rs1: resolve_reg(rd_rs1, constants, line)?,
            rs2: resolve_reg(rs2, constants, line)?,
            line: l,
        },
        Compressed::Cb { name, rd_rs1, imm, line: l } => {
            Compressed::Cb { name, rd_rs1: resolve_reg(rd_rs1, constants, line)?, imm, line: l }
        }
        Compressed::Cj { name, imm, line: l } => Compressed::Cj { name, imm, line: l },
    })
}

/// The byte size of an item at its *current* representation (pseudo
/// instructions use their pessimistic size until expanded).
fn item_size(item: &Item) -> u32 {
    match item {
        Item::Instruction(i) => i.size(),
        Item::Blob(b) => b.bytes.len() as u32,
        Item::String(s) => s.value.len() as u32,
        Item::Sequence(s) => s.width.bytes() as u32 * s.values.len() as u32,
        Item::Pack(p) => p.elements.iter().map(|(w, _)| w.bytes() as u32).sum(),
        Item::ShorthandPack(p) => p.width.bytes() as u32 * p.values.len() as u32,
        Item::Align(_) => 0, // true size depends on current position; approximated during sizing passes
        Item::Constant(_) | Item::Label(_) => 0,
    }
}

/// Rewrites a plain `jal` into `c.j`/`c.jal` whenever the branch
/// offset fits in 12 signed bits. Only `jal` is transformed — the
/// chosen RV32IMAC subset of compression targets.
/// When a replacement shrinks an item from 4 to 2 bytes, every label with a
/// position strictly greater than the replaced item's position shifts down
/// by 2 to stay correct.
pub fn transform_compressible(
    items: Vec<Item>,
    constants: &HashMap<String, i64>,
    labels: &mut HashMap<String, u32>,
) -> Result<Vec<Item>, AssemblerError> {
    let env = Environment { constants: constants.clone(), labels: labels.clone() };
    let mut position: u32 = 0;
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let size_before = item_size(&item);
        let new_item = match item {
            Item::Instruction(Instruction::J(j)) if j.rd.resolved() == Some(0) || j.rd.resolved() == Some(1) => {
                let offset = j.imm.eval(position, &env, &j.line)?;
                let name = if j.rd.resolved() == Some(0) { "c.j" } else { "c.jal" };
                if (-2048..2048).contains(&offset) {
                    Item::Instruction(Instruction::Compressed(Compressed::Cj { name, imm: j.imm, line: j.line }))
                } else {
                    Item::Instruction(Instruction::J(j))
                }
            }
            other => other,
        };

        let size_after = item_size(&new_item);
        if size_after < size_before {
            let shrink = size_before - size_after;
            for label_pos in labels.values_mut() {
                if *label_pos > position {
                    *label_pos -= shrink;
                }
            }
        }
        position += size_after;
        out.push(new_item);
    }

    debug!("transform_compressible: {} items", out.len());
    Ok(out)
}

/// Expands every `Pseudo` item into its base-instruction sequence.
/// `li` may expand to a single `addi` (4 bytes) instead of its pessimistic
/// `lui`+`addi` (8 bytes); when that happens every later label shifts down
/// by 4, exactly like the compression transform's shrink handling.
pub fn transform_pseudo_instructions(
    items: Vec<Item>,
    constants: &HashMap<String, i64>,
    labels: &mut HashMap<String, u32>,
) -> Result<Vec<Item>, AssemblerError> {
    let env = Environment { constants: constants.clone(), labels: labels.clone() };
    let mut position: u32 = 0;
    let mut out = Vec::new();

    for item in items {
        let size_before = item_size(&item);
        match item {
            Item::Instruction(Instruction::Pseudo(p)) => {
                let expansion = pseudo::expand(p, position, &env)?;
                let size_after: u32 = expansion.iter().map(item_size).sum();
                if size_after < size_before {
                    let shrink = size_before - size_after;
                    for label_pos in labels.values_mut() {
                        if *label_pos > position {
                            *label_pos -= shrink;
                        }
                    }
                }
                position += size_after;
                out.extend(expansion);
            }
            other => {
                position += size_before;
                out.push(other);
            }
        }
    }

    debug!("transform_pseudo_instructions: {} items", out.len());
    Ok(out)
}

/// The output shape the encoder dispatcher consumes: every remaining
/// `Expression` immediate field evaluated against the combined
/// constants+labels environment and replaced with a plain `i64`, alongside
/// each operand's resolved register index.
pub struct ResolvedInstruction {
    pub instruction: Instruction,
    pub rd: Option<u8>,
    pub rs1: Option<u8>,
    pub rs2: Option<u8>,
    pub imm: Option<i64>,
}

pub fn resolve_immediates(
    items: Vec<Item>,
    constants: &HashMap<String, i64>,
    labels: &HashMap<String, u32>,
) -> Result<Vec<ResolvedData>, AssemblerError> {
    let env = Environment { constants: constants.clone(), labels: labels.clone() };
    let mut position: u32 = 0;
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let size = item_size(&item);
        out.push(resolve_item_immediates(item, position, &env)?);
        position += size;
    }

    trace!("resolve_immediates: {} items", out.len());
    Ok(out)
}

/// Every item after immediate resolution: either a resolved instruction
/// ready for encoding, or a data-directive item untouched (its own
/// resolution happens during final lowering).
pub enum ResolvedData {
    Instruction(ResolvedInstruction),
    Data(Item),
}

fn reg_index(op: &RegOperand) -> Option<u8> {
    op.resolved()
}

fn resolve_item_immediates(item: Item, position: u32, env: &Environment) -> Result<ResolvedData, AssemblerError> {
    let Item::Instruction(instr) = item else { return Ok(ResolvedData::Data(item)) };
    let line = instr.line().clone();

    let resolved = match &instr {
        Instruction::R(i) => ResolvedInstruction {
            rd: reg_index(&i.rd),
            rs1: reg_index(&i.rs1),
            rs2: reg_index(&i.rs2),
            imm: None,
            instruction: instr.clone(),
        },
        Instruction::I(i) => ResolvedInstruction {
            rd: reg_index(&i.rd),
            rs1: reg_index(&i.rs1),
            rs2: None,
            imm: Some(i.imm.eval(position, env, &line)?),
            instruction: instr.clone(),
        },
        Instruction::IJalr(i) => {
            let mut imm = i.imm.eval(position, env, &line)?;
            if i.is_auipc_jump {
                imm += 4;
            }
            ResolvedInstruction {
                rd: reg_index(&i.rd),
                rs1: reg_index(&i.rs1),
                rs2: None,
                imm: Some(imm),
                instruction: instr.clone(),
            }
        }
        Instruction::Ie(_) => ResolvedInstruction { rd: None, rs1: None, rs2: None, imm: None, instruction: instr.clone() },
        Instruction::S(i) => ResolvedInstruction {
            rd: None,
            rs1: reg_index(&i.rs1),
            rs2: reg_index(&i.rs2),
            imm: Some(i.imm.eval(position, env, &line)?),
            instruction: instr.clone(),
        },
        Instruction::B(i) => ResolvedInstruction {
            rd: None,
            rs1: reg_index(&i.rs1),
            rs2: reg_index(&i.rs2),
            imm: Some(i.imm.eval(position, env, &line)?),
            instruction: instr.clone(),
        },
        Instruction::U(i) => ResolvedInstruction {
            rd: reg_index(&i.rd),
            rs1: None,
            rs2: None,
            imm: Some(i.imm.eval(position, env, &line)?),
            instruction: instr.clone(),
        },
        Instruction::J(i) => ResolvedInstruction {
            rd: reg_index(&i.rd),
            rs1: None,
            rs2: None,
            imm: Some(i.imm.eval(position, env, &line)?),
            instruction: instr.clone(),
        },
        Instruction::Fence(_) => ResolvedInstruction { rd: None, rs1: None, rs2: None, imm: None, instruction: instr.clone() },
        Instruction::A(i) => ResolvedInstruction {
            rd: reg_index(&i.rd),
            rs1: reg_index(&i.rs1),
            rs2: reg_index(&i.rs2),
            imm: None,
            instruction: instr.clone(),
        },
        Instruction::Al(i) => ResolvedInstruction {
            rd: reg_index(&i.rd),
            rs1: reg_index(&i.rs1),
            rs2: None,
            imm: None,
            instruction: instr.clone(),
        },
        Instruction::Pseudo(_) => {
            return Err(AssemblerError::Syntax { line, reason: "pseudo-instruction survived expansion".to_string() });
        }
        Instruction::Compressed(c) => resolve_compressed_immediates(c, position, env, &line)?,
    };

    Ok(ResolvedData::Instruction(resolved))
}

fn resolve_compressed_immediates(c: &Compressed, position: u32, env: &Environment, line: &crate::line::Line) -> Result<ResolvedInstruction, AssemblerError> {
    let instruction = Instruction::Compressed(c.clone());
    Ok(match c {
        Compressed::Cr { rd_rs1, rs2, .. } => ResolvedInstruction {
            rd: reg_index(rd_rs1),
            rs1: reg_index(rd_rs1),
            rs2: reg_index(rs2),
            imm: None,
            instruction,
        },
        Compressed::Ci { rd_rs1, imm, .. } => ResolvedInstruction {
            rd: reg_index(rd_rs1),
            rs1: reg_index(rd_rs1),
            rs2: None,
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
        Compressed::Cia { imm, .. } => ResolvedInstruction {
            rd: None,
            rs1: None,
            rs2: None,
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
        Compressed::Ciu { rd, imm, .. } => ResolvedInstruction {
            rd: reg_index(rd),
            rs1: None,
            rs2: None,
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
        Compressed::Cil { rd, imm, .. } => ResolvedInstruction {
            rd: reg_index(rd),
            rs1: None,
            rs2: None,
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
        Compressed::Css { rs2, imm, .. } => ResolvedInstruction {
            rd: None,
            rs1: None,
            rs2: reg_index(rs2),
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
        Compressed::Ciw { rd, imm, .. } => ResolvedInstruction {
            rd: reg_index(rd),
            rs1: None,
            rs2: None,
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
        Compressed::Cl { rd, rs1, imm, .. } => ResolvedInstruction {
            rd: reg_index(rd),
            rs1: reg_index(rs1),
            rs2: None,
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
        Compressed::Cs { rs1, rs2, imm, .. } => ResolvedInstruction {
            rd: None,
            rs1: reg_index(rs1),
            rs2: reg_index(rs2),
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
        Compressed::Ca { rd_rs1, rs2, .. } => ResolvedInstruction {
            rd: reg_index(rd_rs1),
            rs1: reg_index(rd_rs1),
            rs2: reg_index(rs2),
            imm: None,
            instruction,
        },
        Compressed::Cb { rd_rs1, imm, .. } => ResolvedInstruction {
            rd: reg_index(rd_rs1),
            rs1: reg_index(rd_rs1),
            rs2: None,
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
        Compressed::Cj { imm, .. } => ResolvedInstruction {
            rd: None,
            rs1: None,
            rs2: None,
            imm: Some(imm.eval(position, env, line)?),
            instruction,
        },
    })
}

/// Encodes every resolved instruction and lowers every remaining data
/// directive, then concatenates the whole stream into the final flat
/// binary.
pub fn resolve_and_concatenate(items: Vec<ResolvedData>) -> Result<Vec<u8>, AssemblerError> {
    let mut out = Vec::new();
    let mut position: u32 = 0;

    for item in items {
        let bytes = match item {
            ResolvedData::Instruction(r) => {
                encoder::encode_instruction(&r.instruction, r.rd, r.rs1, r.rs2, r.imm)?
            }
            ResolvedData::Data(Item::String(s)) => s.value,
            ResolvedData::Data(Item::Sequence(seq)) => resolve_sequence(seq)?,
            ResolvedData::Data(Item::ShorthandPack(p)) => resolve_shorthand_pack(p)?,
            ResolvedData::Data(Item::Pack(p)) => resolve_pack(p)?,
            ResolvedData::Data(Item::Align(a)) => resolve_align(a, position)?,
            ResolvedData::Data(Item::Blob(b)) => b.bytes,
            ResolvedData::Data(other) => {
                return Err(AssemblerError::Syntax {
                    line: other.line().clone(),
                    reason: "item left unresolved at final lowering".to_string(),
                });
            }
        };
        position += bytes.len() as u32;
        out.extend(bytes);
    }

    debug!("resolve_and_concatenate: {} total bytes", out.len());
    Ok(out)
}

/// Encodes `value` into `width` bytes, accepting either its signed or
/// unsigned range (so both `-1` and `0xff` are valid `Width::Byte` values)
/// and truncating to the low bits either way.
fn width_bytes(width: Width, value: i64, line: &crate::line::Line) -> Result<Vec<u8>, AssemblerError> {
    let bits = width.bytes() as u32 * 8;
    let (signed_min, unsigned_max) = if bits == 64 {
        (i64::MIN, u64::MAX as i64) // u64::MAX doesn't fit i64; DWord is unchecked below
    } else {
        (-(1i64 << (bits - 1)), (1i64 << bits) - 1)
    };
    if width != Width::DWord && !(signed_min..=unsigned_max).contains(&value) {
        return Err(AssemblerError::RangeViolation {
            line: line.clone(),
            reason: format!("{value} does not fit in a {bits}-bit sequence element"),
        });
    }
    let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let truncated = (value as u64) & mask;
    Ok(truncated.to_le_bytes()[..width.bytes()].to_vec())
}

fn resolve_sequence(seq: Sequence) -> Result<Vec<u8>, AssemblerError> {
    let env = Environment::default();
    let mut out = Vec::new();
    for expr in &seq.values {
        let value = expr.eval(0, &env, &seq.line)?;
        out.extend(width_bytes(seq.width, value, &seq.line)?);
    }
    Ok(out)
}

fn resolve_shorthand_pack(pack: ShorthandPack) -> Result<Vec<u8>, AssemblerError> {
    let env = Environment::default();
    let mut out = Vec::new();
    for expr in &pack.values {
        let value = expr.eval(0, &env, &pack.line)?;
        out.extend(width_bytes(pack.width, value, &pack.line)?);
    }
    Ok(out)
}

fn resolve_pack(pack: Pack) -> Result<Vec<u8>, AssemblerError> {
    let env = Environment::default();
    let mut out = Vec::new();
    for (width, expr) in &pack.elements {
        let value = expr.eval(0, &env, &pack.line)?;
        out.extend(width_bytes(*width, value, &pack.line)?);
    }
    Ok(out)
}

fn resolve_align(align: Align, position: u32) -> Result<Vec<u8>, AssemblerError> {
    if align.boundary == 0 {
        return Err(AssemblerError::RangeViolation { line: align.line, reason: "alignment boundary must be non-zero".to_string() });
    }
    let remainder = position % align.boundary;
    if remainder == 0 {
        Ok(Vec::new())
    } else {
        Ok(vec![0u8; (align.boundary - remainder) as usize])
    }
}
