use thiserror::Error;

use crate::lexer::Line;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to create file: {0}")]
    FileCreate(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Section marker `{expected}` not found ({line})")]
    ExpectedSection { expected: &'static str, line: Line },

    #[error("Expected `{expected}`, found `{token}` ({line})")]
    UnexpectedToken {
        expected: &'static str,
        token: String,
        line: Line,
    },

    #[error("Expected a label ending with `:`, found `{token}` ({line})")]
    ExpectedLabel { token: String, line: Line },

    #[error("Expected {expected}, found end of input ({line})")]
    UnexpectedEof { expected: &'static str, line: Line },

    #[error("Cannot parse `{token}` as a word value ({line})")]
    MalformedNumber { token: String, line: Line },

    #[error("Malformed offset suffix in `{token}` ({line})")]
    MalformedOffset { token: String, line: Line },

    #[error("`{mnemonic}` expects {expected} operand(s), found {found} ({line})")]
    BadOperandCount {
        mnemonic: String,
        expected: usize,
        found: usize,
        line: Line,
    },

    #[error("Memory image exceeds {limit} words ({line})")]
    ImageOverflow { limit: usize, line: Line },

    #[error("Exported symbol `{0}` is not defined")]
    UndefinedExport(String),
}
