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

//! The `x0..x31` register file, its ABI aliases, and the numeric-literal /
//! name lookup used everywhere a register operand appears.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Maps every accepted register spelling (numeric string, `xN` form, ABI
/// alias) to its 0..31 index. Built once behind a `OnceLock` and shared
/// across every lookup.
fn register_table() -> &'static HashMap<&'static str, u8> {
    static TABLE: OnceLock<HashMap<&'static str, u8>> = OnceLock::new();
    TABLE.get_or_init(|| {
        const ALIASES: &[(&str, u8)] = &[
            ("zero", 0), ("ra", 1), ("sp", 2), ("gp", 3), ("tp", 4),
            ("t0", 5), ("t1", 6), ("t2", 7),
            ("s0", 8), ("fp", 8), ("s1", 9),
            ("a0", 10), ("a1", 11), ("a2", 12), ("a3", 13), ("a4", 14),
            ("a5", 15), ("a6", 16), ("a7", 17),
            ("s2", 18), ("s3", 19), ("s4", 20), ("s5", 21), ("s6", 22),
            ("s7", 23), ("s8", 24), ("s9", 25), ("s10", 26), ("s11", 27),
            ("t3", 28), ("t4", 29), ("t5", 30), ("t6", 31),
        ];

        let mut table = HashMap::new();
        for n in 0..32u8 {
            table.insert(Box::leak(format!("x{n}").into_boxed_str()) as &str, n);
        }
        for (name, n) in ALIASES {
            table.insert(*name, *n);
        }
        table
    })
}

/// Resolves a register operand (bare integer string, `xN`, or ABI alias) to
/// its `0..31` index. Does not consult the constants environment: alias
/// resolution via constant-named registers (`IP = gp`) happens in a
/// dedicated pass after parsing, not here.
pub fn lookup_register(token: &str) -> Option<u8> {
    if let Ok(n) = parse_int_literal(token) {
        if (0..32).contains(&n) {
            return Some(n as u8);
        }
        return None;
    }
    register_table().get(token.to_ascii_lowercase().as_str()).copied()
}

/// Resolves a register already known to be compressed-eligible (`x8..x15`)
/// into its 3-bit encoding (`reg - 8`). Returns `None` if out of range.
pub fn lookup_compressed_register(reg: u8) -> Option<u8> {
    if (8..=15).contains(&reg) {
        Some(reg - 8)
    } else {
        None
    }
}

/// Parses an integer literal in any of the dialect's base-0 forms:
/// decimal, `0x`/`0X` hex, `0b`/`0B` binary, `0o`/`0O` octal.
pub fn parse_int_literal(token: &str) -> Result<i64, std::num::ParseIntError> {
    let (negative, token) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    let value = if let Some(rest) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        i64::from_str_radix(rest, 16)?
    } else if let Some(rest) = token.strip_prefix("0b").or_else(|| token.strip_prefix("0B")) {
        i64::from_str_radix(rest, 2)?
    } else if let Some(rest) = token.strip_prefix("0o").or_else(|| token.strip_prefix("0O")) {
        i64::from_str_radix(rest, 8)?
    } else {
        token.parse::<i64>()?
    };

    Ok(if negative { -value } else { value })
}
