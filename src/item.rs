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

//! The intermediate representation every pipeline stage reads and rewrites:
//! one `Item` per source line (roughly), flowing from the parser down to the
//! final byte blob. Register operands start out as either an already-known
//! index or a pending alias name (`RegOperand`); everything position- or
//! name-dependent is an [`Expression`] until the relevant resolution pass
//! collapses it to a plain integer.

use crate::expr::Expression;
use crate::line::Line;

/// A register operand as written in source: either a concrete index (from a
/// numeric literal, `xN` form, or ABI name) or a name that must still be
/// looked up in the constants table (resolved once register aliases are
/// known).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegOperand {
    Resolved(u8),
    Alias(String),
}

impl RegOperand {
    pub fn resolved(&self) -> Option<u8> {
        match self {
            RegOperand::Resolved(r) => Some(*r),
            RegOperand::Alias(_) => None,
        }
    }
}

/// Data-directive element width, shared by `Sequence`, `Pack`, and
/// `ShorthandPack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    Half,
    Word,
    DWord,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
            Width::Word => 4,
            Width::DWord => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: String,
    pub expr: Expression,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringItem {
    pub value: Vec<u8>,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub width: Width,
    pub values: Vec<Expression>,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pack {
    pub elements: Vec<(Width, Expression)>,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShorthandPack {
    pub width: Width,
    pub values: Vec<Expression>,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Align {
    pub boundary: u32,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub line: Line,
}

/// `rd, rs1, rs2` register-register base instructions: ADD/SUB/.../AND, and
/// the M-extension MUL/DIV/REM family (same wire format, different opcode
/// table entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RTypeInstruction {
    pub name: &'static str,
    pub rd: RegOperand,
    pub rs1: RegOperand,
    pub rs2: RegOperand,
    pub line: Line,
}

/// `rd, rs1, imm` base instructions: ADDI/SLTI/.../ANDI, SLLI/SRLI/SRAI, and
/// the load family (LB/LH/LW/LBU/LHU) using `imm(rs1)` syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ITypeInstruction {
    pub name: &'static str,
    pub rd: RegOperand,
    pub rs1: RegOperand,
    pub imm: Expression,
    pub line: Line,
}

/// JALR: structurally an I-type, but its computed target clears bit 0, so it
/// gets its own item and its own encoder entry point.
///
/// `is_auipc_jump` marks a `jalr` that was expanded from `call`/`tail` as the
/// second half of an `auipc`+`jalr` pair. Its `imm` is evaluated at its own
/// position (four bytes past the paired `auipc`), so immediate resolution
/// adds 4 back to the result to recover the offset as seen from the `auipc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IJalrInstruction {
    pub rd: RegOperand,
    pub rs1: RegOperand,
    pub imm: Expression,
    pub is_auipc_jump: bool,
    pub line: Line,
}

/// ECALL/EBREAK: no operands, the entire 32-bit word is fixed by the
/// mnemonic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IeTypeInstruction {
    pub name: &'static str,
    pub line: Line,
}

/// `rs2, imm(rs1)` stores: SB/SH/SW.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct STypeInstruction {
    pub name: &'static str,
    pub rs1: RegOperand,
    pub rs2: RegOperand,
    pub imm: Expression,
    pub line: Line,
}

/// `rs1, rs2, target` branches: BEQ/BNE/BLT/BGE/BLTU/BGEU. `imm` is a
/// PC-relative byte offset (usually a label via `%offset`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BTypeInstruction {
    pub name: &'static str,
    pub rs1: RegOperand,
    pub rs2: RegOperand,
    pub imm: Expression,
    pub line: Line,
}

/// `rd, imm` upper-immediate instructions: LUI/AUIPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UTypeInstruction {
    pub name: &'static str,
    pub rd: RegOperand,
    pub imm: Expression,
    pub line: Line,
}

/// `rd, target` JAL. `imm` is a PC-relative byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JTypeInstruction {
    pub rd: RegOperand,
    pub imm: Expression,
    pub line: Line,
}

/// FENCE with explicit predecessor/successor I/O/R/W nibbles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceInstruction {
    pub pred: u8,
    pub succ: u8,
    pub line: Line,
}

/// Atomic read-modify-write: `rd, rs2, (rs1)` with optional `.aq`/`.rl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ATypeInstruction {
    pub name: &'static str,
    pub rd: RegOperand,
    pub rs1: RegOperand,
    pub rs2: RegOperand,
    pub aq: bool,
    pub rl: bool,
    pub line: Line,
}

/// LR.W: `rd, (rs1)` with optional `.aq`/`.rl`, no `rs2` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlTypeInstruction {
    pub rd: RegOperand,
    pub rs1: RegOperand,
    pub aq: bool,
    pub rl: bool,
    pub line: Line,
}

/// A pseudo-instruction as written in source, prior to expansion into the
/// base instructions it stands for. Each variant carries exactly the
/// operands its mnemonic takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pseudo {
    Nop,
    Li { rd: RegOperand, imm: Expression },
    Mv { rd: RegOperand, rs: RegOperand },
    Not { rd: RegOperand, rs: RegOperand },
    Neg { rd: RegOperand, rs: RegOperand },
    Seqz { rd: RegOperand, rs: RegOperand },
    Snez { rd: RegOperand, rs: RegOperand },
    Sltz { rd: RegOperand, rs: RegOperand },
    Sgtz { rd: RegOperand, rs: RegOperand },
    Beqz { rs: RegOperand, target: Expression },
    Bnez { rs: RegOperand, target: Expression },
    Blez { rs: RegOperand, target: Expression },
    Bgez { rs: RegOperand, target: Expression },
    Bltz { rs: RegOperand, target: Expression },
    Bgtz { rs: RegOperand, target: Expression },
    Bgt { rs1: RegOperand, rs2: RegOperand, target: Expression },
    Ble { rs1: RegOperand, rs2: RegOperand, target: Expression },
    Bgtu { rs1: RegOperand, rs2: RegOperand, target: Expression },
    Bleu { rs1: RegOperand, rs2: RegOperand, target: Expression },
    J { target: Expression },
    Jal { target: Expression },
    Jr { rs: RegOperand },
    Jalr { rs: RegOperand },
    Ret,
    Call { target: Expression },
    Tail { target: Expression },
    Fence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoInstruction {
    pub pseudo: Pseudo,
    pub line: Line,
}

/// The twelve structurally distinct 16-bit compressed encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compressed {
    /// `c.mv`, `c.add`, `c.jr`, `c.jalr` — full 5-bit `rd_rs1`/`rs2` fields.
    Cr { name: &'static str, rd_rs1: RegOperand, rs2: RegOperand, line: Line },
    /// `c.addi`, `c.li`, `c.slli` — full 5-bit `rd_rs1`, 6-bit signed imm.
    Ci { name: &'static str, rd_rs1: RegOperand, imm: Expression, line: Line },
    /// `c.addi16sp` — implicit `rd_rs1 = sp`.
    Cia { imm: Expression, line: Line },
    /// `c.lui` — full 5-bit `rd`, `rd` excludes x0/x2.
    Ciu { rd: RegOperand, imm: Expression, line: Line },
    /// `c.lwsp` — implicit `rs1 = sp`.
    Cil { rd: RegOperand, imm: Expression, line: Line },
    /// `c.swsp` — implicit `rs1 = sp`.
    Css { rs2: RegOperand, imm: Expression, line: Line },
    /// `c.addi4spn` — implicit `rs1 = sp`, 3-bit `rd'`.
    Ciw { rd: RegOperand, imm: Expression, line: Line },
    /// `c.lw` — 3-bit `rd'`/`rs1'`.
    Cl { rd: RegOperand, rs1: RegOperand, imm: Expression, line: Line },
    /// `c.sw` — 3-bit `rs1'`/`rs2'`.
    Cs { rs1: RegOperand, rs2: RegOperand, imm: Expression, line: Line },
    /// `c.sub`, `c.xor`, `c.or`, `c.and` — 3-bit `rd_rs1'`/`rs2'`.
    Ca { name: &'static str, rd_rs1: RegOperand, rs2: RegOperand, line: Line },
    /// `c.beqz`, `c.bnez`, `c.srli`, `c.srai`, `c.andi` — 3-bit `rd_rs1'`.
    Cb { name: &'static str, rd_rs1: RegOperand, imm: Expression, line: Line },
    /// `c.j`, `c.jal` — no register operands, 11-bit signed offset.
    Cj { name: &'static str, imm: Expression, line: Line },
}

impl Compressed {
    pub fn line(&self) -> &Line {
        match self {
            Compressed::Cr { line, .. }
            | Compressed::Ci { line, .. }
            | Compressed::Cia { line, .. }
            | Compressed::Ciu { line, .. }
            | Compressed::Cil { line, .. }
            | Compressed::Css { line, .. }
            | Compressed::Ciw { line, .. }
            | Compressed::Cl { line, .. }
            | Compressed::Cs { line, .. }
            | Compressed::Ca { line, .. }
            | Compressed::Cb { line, .. }
            | Compressed::Cj { line, .. } => line,
        }
    }
}

/// Every instruction-shaped item, 32-bit or compressed, including
/// pre-expansion pseudo-instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    R(RTypeInstruction),
    I(ITypeInstruction),
    IJalr(IJalrInstruction),
    Ie(IeTypeInstruction),
    S(STypeInstruction),
    B(BTypeInstruction),
    U(UTypeInstruction),
    J(JTypeInstruction),
    Fence(FenceInstruction),
    A(ATypeInstruction),
    Al(AlTypeInstruction),
    Pseudo(PseudoInstruction),
    Compressed(Compressed),
}

impl Instruction {
    pub fn line(&self) -> &Line {
        match self {
            Instruction::R(i) => &i.line,
            Instruction::I(i) => &i.line,
            Instruction::IJalr(i) => &i.line,
            Instruction::Ie(i) => &i.line,
            Instruction::S(i) => &i.line,
            Instruction::B(i) => &i.line,
            Instruction::U(i) => &i.line,
            Instruction::J(i) => &i.line,
            Instruction::Fence(i) => &i.line,
            Instruction::A(i) => &i.line,
            Instruction::Al(i) => &i.line,
            Instruction::Pseudo(i) => &i.line,
            Instruction::Compressed(c) => c.line(),
        }
    }

    /// Byte size this item occupies before encoding, used by every pass
    /// that tracks position (labels, compression shrink, pseudo-expansion
    /// shrink). Pseudo-instructions are sized pessimistically (their
    /// largest possible expansion); `transform_pseudo_instructions` shrinks
    /// later label positions when the cheaper expansion is actually taken.
    pub fn size(&self) -> u32 {
        match self {
            Instruction::Compressed(_) => 2,
            Instruction::Pseudo(p) => match p.pseudo {
                Pseudo::Li { .. } | Pseudo::Call { .. } | Pseudo::Tail { .. } => 8,
                _ => 4,
            },
            _ => 4,
        }
    }
}

/// The full sum type every pipeline stage operates over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Constant(Constant),
    Label(Label),
    String(StringItem),
    Sequence(Sequence),
    Pack(Pack),
    ShorthandPack(ShorthandPack),
    Align(Align),
    Blob(Blob),
    Instruction(Instruction),
}

impl Item {
    pub fn line(&self) -> &Line {
        match self {
            Item::Constant(c) => &c.line,
            Item::Label(l) => &l.line,
            Item::String(s) => &s.line,
            Item::Sequence(s) => &s.line,
            Item::Pack(p) => &p.line,
            Item::ShorthandPack(p) => &p.line,
            Item::Align(a) => &a.line,
            Item::Blob(b) => &b.line,
            Item::Instruction(i) => i.line(),
        }
    }
}
