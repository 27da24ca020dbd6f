/// Errors produced while tokenizing a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// A character that starts no token.
    #[error("unexpected character {ch:?} at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    /// A string literal with no closing quote. `pos` is the opening quote.
    #[error("unterminated string starting at offset {pos}")]
    UnterminatedString { pos: usize },

    /// `$` not followed by an identifier.
    #[error("expected identifier after '$' at offset {pos}")]
    ExpectedParamIdent { pos: usize },
}

impl LexError {
    /// Byte offset of the offending input.
    pub fn pos(&self) -> usize {
        match self {
            LexError::UnexpectedChar { pos, .. }
            | LexError::UnterminatedString { pos }
            | LexError::ExpectedParamIdent { pos } => *pos,
        }
    }
}

pub type Result<T> = std::result::Result<T, LexError>;
