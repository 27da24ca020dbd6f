use crate::error::{LexError, Result};
use crate::token::{Token, TokenKind};

/// On-demand tokenizer over a query string.
///
/// Offsets are byte offsets into the input. Every token starts on an ASCII
/// byte, so slicing at token boundaries never splits a UTF-8 sequence.
#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            done: false,
        }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Produce the next token. At end of input this keeps returning `Eof`.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let Some(b) = self.current() else {
            return Ok(Token::new(TokenKind::Eof, "", self.pos));
        };

        let token = match b {
            b'(' => self.symbol(TokenKind::OpenParen, "("),
            b')' => self.symbol(TokenKind::CloseParen, ")"),
            b'[' => self.symbol(TokenKind::OpenBracket, "["),
            b']' => self.symbol(TokenKind::CloseBracket, "]"),
            b'{' => self.symbol(TokenKind::OpenBrace, "{"),
            b'}' => self.symbol(TokenKind::CloseBrace, "}"),
            b',' => self.symbol(TokenKind::Comma, ","),
            b';' => self.symbol(TokenKind::Semicolon, ";"),
            b'.' => self.symbol(TokenKind::Dot, "."),
            b'%' => self.symbol(TokenKind::Percent, "%"),
            b':' => self.pair(b':', (TokenKind::DoubleColon, "::"), (TokenKind::Colon, ":")),
            b'|' => self.pair(b'|', (TokenKind::Or, "||"), (TokenKind::Pipe, "|")),
            b'+' => self.pair(b'+', (TokenKind::Inc, "++"), (TokenKind::Plus, "+")),
            b'-' => self.pair(b'-', (TokenKind::Dec, "--"), (TokenKind::Minus, "-")),
            b'*' => self.pair(
                b'*',
                (TokenKind::DoubleAsterisk, "**"),
                (TokenKind::Asterisk, "*"),
            ),
            b'/' => self.pair(b'/', (TokenKind::DoubleSlash, "//"), (TokenKind::Slash, "/")),
            b'!' => self.pair(b'=', (TokenKind::NotEqual, "!="), (TokenKind::Bang, "!")),
            b'=' => self.pair(b'=', (TokenKind::Equal, "=="), (TokenKind::Equal, "=")),
            b'<' => self.pair(
                b'=',
                (TokenKind::LessThanEqual, "<="),
                (TokenKind::LessThan, "<"),
            ),
            b'>' => self.pair(
                b'=',
                (TokenKind::GreaterThanEqual, ">="),
                (TokenKind::GreaterThan, ">"),
            ),
            b'&' if self.peek() == Some(b'&') => self.symbol(TokenKind::And, "&&"),
            b'"' | b'\'' => self.string(b)?,
            b'$' => self.param()?,
            b if b.is_ascii_digit() => self.number(),
            b if is_ident_start(b) => self.ident(),
            _ => return Err(self.unexpected()),
        };
        Ok(token)
    }

    fn current(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// The byte after the current one.
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn symbol(&mut self, kind: TokenKind, text: &'static str) -> Token {
        let token = Token::new(kind, text, self.pos);
        self.pos += text.len();
        token
    }

    /// Two-byte operator if the next byte is `second`, else the one-byte one.
    fn pair(
        &mut self,
        second: u8,
        double: (TokenKind, &'static str),
        single: (TokenKind, &'static str),
    ) -> Token {
        let (kind, text) = if self.peek() == Some(second) {
            double
        } else {
            single
        };
        self.symbol(kind, text)
    }

    fn unexpected(&self) -> LexError {
        let ch = self.input[self.pos..].chars().next().unwrap_or('\u{fffd}');
        LexError::UnexpectedChar { ch, pos: self.pos }
    }

    fn string(&mut self, delim: u8) -> Result<Token> {
        let open = self.pos;
        let start = open + 1;
        let bytes = self.input.as_bytes();
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b if b == delim => {
                    let token =
                        Token::new(TokenKind::String, unescape(&self.input[start..i]), start);
                    self.pos = i + 1;
                    return Ok(token);
                }
                b'\\' => i += 2,
                _ => i += 1,
            }
        }
        Err(LexError::UnterminatedString { pos: open })
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        self.skip_digits();
        if self.current() == Some(b'.') {
            self.pos += 1;
            self.skip_digits();
        }
        Token::new(TokenKind::Number, &self.input[start..self.pos], start)
    }

    fn skip_digits(&mut self) {
        while self.current().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn ident(&mut self) -> Token {
        let start = self.pos;
        self.skip_ident();
        let text = &self.input[start..self.pos];
        let kind = match text {
            "null" => TokenKind::Null,
            "true" | "false" => TokenKind::Bool,
            "let" => TokenKind::Let,
            _ => TokenKind::Ident,
        };
        Token::new(kind, text, start)
    }

    fn param(&mut self) -> Result<Token> {
        if !self.peek().is_some_and(is_ident_start) {
            return Err(LexError::ExpectedParamIdent { pos: self.pos });
        }
        self.pos += 1;
        let start = self.pos;
        self.skip_ident();
        Ok(Token::new(TokenKind::Param, &self.input[start..self.pos], start))
    }

    fn skip_ident(&mut self) {
        while self.current().is_some_and(is_ident) {
            self.pos += 1;
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    /// Yields tokens up to, not including, `Eof`. Stops after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.is_eof() => {
                self.done = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Every token of `input`, excluding the final `Eof`.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).collect()
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// Resolve backslash escapes. An unrecognized escape drops both the
/// backslash and the escaped character.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_is_eof() {
        let mut lexer = Lexer::new("   \n\t");
        let token = lexer.next_token().unwrap();
        assert!(token.is_eof());
        assert_eq!(token.pos, 5);
        assert!(lexer.next_token().unwrap().is_eof());
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn single_and_double_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds(": :: | || + ++ - -- * ** / // ! != = == < <= > >= &&"),
            vec![
                Colon, DoubleColon, Pipe, Or, Plus, Inc, Minus, Dec, Asterisk, DoubleAsterisk,
                Slash, DoubleSlash, Bang, NotEqual, Equal, Equal, LessThan, LessThanEqual,
                GreaterThan, GreaterThanEqual, And,
            ]
        );
    }

    #[test]
    fn operators_at_end_of_input() {
        assert_eq!(kinds("a:"), vec![TokenKind::Ident, TokenKind::Colon]);
        assert_eq!(kinds("<"), vec![TokenKind::LessThan]);
    }

    #[test]
    fn adjacent_operators_split_greedily() {
        assert_eq!(kinds("+++"), vec![TokenKind::Inc, TokenKind::Plus]);
        let tokens = tokenize("a<=b").unwrap();
        assert_eq!(tokens[1], Token::new(TokenKind::LessThanEqual, "<=", 1));
        assert_eq!(tokens[2].pos, 3);
    }

    #[test]
    fn brackets_and_punctuation() {
        use TokenKind::*;
        assert_eq!(
            kinds("()[]{},;.%"),
            vec![
                OpenParen, CloseParen, OpenBracket, CloseBracket, OpenBrace, CloseBrace, Comma,
                Semicolon, Dot, Percent,
            ]
        );
    }

    #[test]
    fn numbers() {
        let tokens = tokenize("42 3.14 7.").unwrap();
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["42", "3.14", "7."]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("null true false let _x y2 lettuce"),
            vec![Null, Bool, Bool, Let, Ident, Ident, Ident]
        );
    }

    #[test]
    fn strings_and_escapes() {
        let tokens = tokenize(r#"'amount' "a\"b" 'it\'s' "x\ny\t\\""#).unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::String, "amount", 1));
        assert_eq!(tokens[1].value, "a\"b");
        assert_eq!(tokens[2].value, "it's");
        assert_eq!(tokens[3].value, "x\ny\t\\");
    }

    #[test]
    fn unknown_escape_is_dropped() {
        assert_eq!(tokenize(r"'a\qb'").unwrap()[0].value, "ab");
    }

    #[test]
    fn unterminated_string_fails() {
        assert_eq!(
            tokenize("x = 'open").unwrap_err(),
            LexError::UnterminatedString { pos: 4 }
        );
        assert!(tokenize(r"'ends with escape\'").is_err());
    }

    #[test]
    fn params() {
        let tokens = tokenize("$from_id,$x1").unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::Param, "from_id", 1));
        assert_eq!(tokens[2], Token::new(TokenKind::Param, "x1", 10));
    }

    #[test]
    fn bad_params_fail() {
        assert_eq!(
            tokenize("a $1").unwrap_err(),
            LexError::ExpectedParamIdent { pos: 2 }
        );
        assert_eq!(
            tokenize("$").unwrap_err(),
            LexError::ExpectedParamIdent { pos: 0 }
        );
    }

    #[test]
    fn unexpected_characters_fail() {
        assert_eq!(
            tokenize("a & b").unwrap_err(),
            LexError::UnexpectedChar { ch: '&', pos: 2 }
        );
        assert_eq!(
            tokenize("#").unwrap_err(),
            LexError::UnexpectedChar { ch: '#', pos: 0 }
        );
        assert_eq!(
            tokenize("é").unwrap_err(),
            LexError::UnexpectedChar { ch: 'é', pos: 0 }
        );
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut lexer = Lexer::new("a # b");
        assert!(lexer.next().unwrap().is_ok());
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn transfer_query() {
        let query = r#"
        param($from_id,$to_id,$amount);
        use(ice);
        let balance = colletion::transfers.filter(id = $from_id).select('amount').sum();
        if(balance > $amount).
        then(collection::transfers.insert(
            document::new($from_id,$to_id,$amount).union(
            {'id': uuid(),
                'timestamp': now()})
        ));
        "#;
        let tokens = tokenize(query).unwrap();
        let rendered: Vec<String> = tokens.iter().take(9).map(Token::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "Ident: param",
                "OpenParen: (",
                "Param: from_id",
                "Comma: ,",
                "Param: to_id",
                "Comma: ,",
                "Param: amount",
                "CloseParen: )",
                "Semicolon: ;",
            ]
        );
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::DoubleColon));
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Let).count(), 1);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Semicolon);
    }

    #[test]
    fn token_serializes_to_json() {
        let json = serde_json::to_string(&Token::new(TokenKind::Ident, "x", 0)).unwrap();
        assert_eq!(json, r#"{"kind":"Ident","value":"x","pos":0}"#);
    }

    proptest! {
        #[test]
        fn never_panics(input in "\\PC{0,40}") {
            let _ = tokenize(&input);
        }

        #[test]
        fn identifiers_roundtrip(name in "[a-zA-Z_][a-zA-Z0-9_]{0,12}") {
            let tokens = tokenize(&name).unwrap();
            prop_assert_eq!(tokens.len(), 1);
            prop_assert_eq!(&tokens[0].value, &name);
        }
    }
}
