pub mod context;
pub mod error;
pub mod expand;
pub mod lexer;
pub mod parser;

pub use context::Context;
pub use error::Error;
