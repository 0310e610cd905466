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

use thiserror::Error;

use crate::line::Line;

/// Errors raised by any pipeline stage above the encoders. Every variant
/// carries the source `Line` responsible, so a failure can always be
/// reported back to the exact line that caused it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    #[error("{line}\nsyntax error: {reason}")]
    Syntax { line: Line, reason: String },

    #[error("{line}\nunknown name: {reason}")]
    UnknownName { line: Line, reason: String },

    #[error("{line}\nnot an integer: {reason}")]
    NonInteger { line: Line, reason: String },

    #[error("{line}\nconstant shadows register name: {name}")]
    RegisterShadow { line: Line, name: String },

    #[error("{line}\n{reason}")]
    RangeViolation { line: Line, reason: String },

    #[error("{line}\n{reason}")]
    CompressedConstraint { line: Line, reason: String },
}

impl AssemblerError {
    /// Attaches a `Line` to a line-free `EncodeError`, producing the
    /// matching `AssemblerError` variant. Used by the instruction dispatcher
    /// once an encoder has rejected an operand.
    pub fn from_encode_error(line: Line, err: EncodeError) -> Self {
        match err {
            EncodeError::RangeViolation(reason) => AssemblerError::RangeViolation { line, reason },
            EncodeError::CompressedConstraint(reason) => {
                AssemblerError::CompressedConstraint { line, reason }
            }
        }
    }
}

/// Errors raised by the low-level format encoders (`r_type`, `ci_type`, ...).
/// These have no notion of source position; the dispatcher that calls them
/// always holds the `Line` and re-wraps the error via
/// [`AssemblerError::from_encode_error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{0}")]
    RangeViolation(String),

    #[error("{0}")]
    CompressedConstraint(String),
}
