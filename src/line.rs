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

use std::fmt;
use std::rc::Rc;

/// A single source line, carried through every pipeline stage for error
/// reporting. `file` is shared (`Rc`) rather than cloned per-line since every
/// `Item` produced from a source file ends up holding one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line {
    pub file: Rc<str>,
    pub number: usize,
    pub contents: String,
}

impl Line {
    pub fn new(file: Rc<str>, number: usize, contents: impl Into<String>) -> Self {
        Self {
            file,
            number,
            contents: contents.into(),
        }
    }

    #[cfg(test)]
    pub fn synthetic(contents: impl Into<String>) -> Self {
        Self::new(Rc::from("<string>"), 1, contents)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File \"{}\", line {}: {}", self.file, self.number, self.contents)
    }
}

/// Loads source text into numbered, file-tagged, non-empty lines.
///
/// Blank lines (after trimming) are dropped here so every later stage only
/// ever sees lines with actual content.
pub fn read_lines(file: &str, source: &str) -> Vec<Line> {
    let file: Rc<str> = Rc::from(file);
    source
        .lines()
        .enumerate()
        .filter(|(_, contents)| !contents.trim().is_empty())
        .map(|(i, contents)| Line::new(file.clone(), i + 1, contents))
        .collect()
}
