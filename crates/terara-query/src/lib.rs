//! Query-language lexer for terara.
//!
//! The lexer turns a query string into a flat stream of [`Token`]s. It knows
//! nothing about grammar: `let`, `null`, `true` and `false` are the only
//! words it treats specially.
//!
//! ```
//! use terara_query::{tokenize, TokenKind};
//!
//! let tokens = tokenize("filter(id = $from_id)").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Ident);
//! assert_eq!(tokens[4].value, "from_id");
//! ```

pub mod error;
pub mod lexer;
pub mod token;

pub use error::{LexError, Result};
pub use lexer::{tokenize, Lexer};
pub use token::{Token, TokenKind};
