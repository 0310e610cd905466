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

//! Top-level pipeline driver. `assemble` runs the twelve stages in order:
//! read, lex, parse, resolve constants, resolve labels, resolve register
//! aliases, transform compressible (optional), expand pseudo-instructions,
//! resolve immediates, encode instructions, resolve data directives,
//! concatenate. The last three are folded into a single
//! `assembler::resolve_and_concatenate` call once every item carries
//! concrete registers and immediates.

pub mod assembler;
pub mod errors;
pub mod expr;
pub mod file_reader;
pub mod item;
pub mod lexer;
pub mod line;
pub mod parser;
pub mod registers;

use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use file_reader::FileReader;

/// Assembles `source_path`'s contents (read through `reader`) into a flat
/// RV32IMAC binary. When `compress` is set, the C-extension transform runs
/// both before and after pseudo-instruction expansion, matching the
/// pipeline order a plain `jal` and an expanded `li`/`call`/`tail` both need
/// a chance to shrink into compressed form.
pub fn assemble<F: FileReader>(source_path: &Path, compress: bool, reader: &F) -> Result<Vec<u8>> {
    info!("assembling {}", source_path.display());

    let source = reader.read_to_string(source_path).with_context(|| format!("failed to read {}", source_path.display()))?;
    let file_name = source_path.to_string_lossy().into_owned();
    let lines = line::read_lines(&file_name, &source);

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(tokens) = lexer::lex_tokens(&line).context("failed during lexing")? {
            items.push(parser::parse_item(tokens).context("failed during parsing")?);
        }
    }

    let (items, constants) = assembler::resolve_constants(items).context("failed during constant resolution")?;
    let (items, mut labels) = assembler::resolve_labels(items);
    let mut items = assembler::resolve_register_aliases(items, &constants).context("failed during register alias resolution")?;

    if compress {
        items = assembler::transform_compressible(items, &constants, &mut labels).context("failed during compression transform")?;
    }
    let mut items = assembler::transform_pseudo_instructions(items, &constants, &mut labels).context("failed during pseudo-instruction expansion")?;
    if compress {
        items = assembler::transform_compressible(items, &constants, &mut labels).context("failed during compression transform")?;
    }

    let resolved = assembler::resolve_immediates(items, &constants, &labels).context("failed during immediate resolution")?;
    let binary = assembler::resolve_and_concatenate(resolved).context("failed during encoding and final lowering")?;

    info!("assembled {} bytes", binary.len());
    Ok(binary)
}
