// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the front end

use crate::source::SourceRange;
use thiserror::Error;

/// Result type for front end operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling JavaScript source
#[derive(Debug, Error)]
pub enum Error {
    /// The parser rejected the source text
    #[error("SyntaxError: {message}")]
    Syntax {
        /// What went wrong
        message: String,
        /// Where it went wrong
        range: SourceRange,
    },

    /// Semantic validation recorded errors; details are in the diagnostics
    #[error("validation failed with {errors} error(s)")]
    Validation {
        /// Number of errors recorded by the failed pass
        errors: usize,
    },

    /// Lazy compilation was requested for a function that has no deferred body
    #[error("function '{0}' has no lazy body")]
    NotLazy(String),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the source range of a syntax error.
    pub fn range(&self) -> Option<SourceRange> {
        match self {
            Error::Syntax { range, .. } => Some(*range),
            _ => None,
        }
    }
}
