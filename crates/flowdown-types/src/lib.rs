//! Shared types for flowdown: the parser→sink token contract, ANSI style
//! records, and the error hierarchy.

pub mod error;
pub mod style;
pub mod token;

pub use error::{RenderError, ValidateError};
pub use style::{Style, Styles, ANSI_RESET};
pub use token::{Token, TokenKind};
