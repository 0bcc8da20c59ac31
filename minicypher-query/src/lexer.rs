use crate::error::{Error, Result};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    Match,
    Where,
    Return,
    Distinct,
    Order,
    By,
    Asc,
    Desc,
    Skip,
    Limit,
    And,
    Or,
    Not,
    Is,
    In,
    Starts,
    Ends,
    Contains,
    With,
    As,

    // Symbols
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Colon,
    Comma,
    Dot,
    Pipe,

    // Relationships
    LeftArrow,
    RightArrow,
    Dash,

    // Operators
    Equals,
    NotEquals,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Plus,
    Divide,

    // Literals
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,

    Identifier(String),

    // Special
    Asterisk,
    RangeDots,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
    /// Byte range of the token, so the parser can slice source text.
    pub offset: usize,
    pub end: usize,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token {
            token_type: TokenType::Eof,
            line: self.line,
            column: self.column,
            offset: self.offset,
            end: self.offset,
        });
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();

        if self.chars.peek().is_none() {
            return Ok(None);
        }

        let start_line = self.line;
        let start_column = self.column;
        let start_offset = self.offset;
        let char = self.advance().unwrap();

        // Comments
        if char == '/' {
            if let Some(&'/') = self.chars.peek() {
                self.skip_line_comment();
                return self.next_token();
            } else if let Some(&'*') = self.chars.peek() {
                self.skip_block_comment();
                return self.next_token();
            }
        }

        // String literals
        if char == '\'' || char == '"' {
            return Ok(Some(self.read_string(char, start_line, start_column, start_offset)?));
        }

        // Number literals
        if char.is_ascii_digit() {
            return Ok(Some(self.read_number(char, start_line, start_column, start_offset)?));
        }

        // Identifiers and keywords
        if char.is_alphabetic() || char == '_' {
            return Ok(Some(self.read_identifier(char, start_line, start_column, start_offset)));
        }

        // Operators and symbols
        let token_type = match char {
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            ':' => TokenType::Colon,
            ',' => TokenType::Comma,
            '.' => {
                if let Some(&'.') = self.chars.peek() {
                    self.advance();
                    TokenType::RangeDots
                } else {
                    TokenType::Dot
                }
            }
            '|' => TokenType::Pipe,
            '-' => {
                if let Some(&'>') = self.chars.peek() {
                    self.advance();
                    TokenType::RightArrow
                } else {
                    TokenType::Dash
                }
            }
            '<' => {
                if let Some(&'-') = self.chars.peek() {
                    self.advance();
                    TokenType::LeftArrow
                } else if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::LessEqual
                } else if let Some(&'>') = self.chars.peek() {
                    self.advance();
                    TokenType::NotEquals
                } else {
                    TokenType::LessThan
                }
            }
            '>' => {
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::GreaterEqual
                } else {
                    TokenType::GreaterThan
                }
            }
            '=' => {
                // `=` and `==` are the same operator.
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                }
                TokenType::Equals
            }
            '+' => TokenType::Plus,
            '*' => TokenType::Asterisk,
            '/' => TokenType::Divide,
            '!' => {
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::NotEquals
                } else {
                    return Err(Error::parse(
                        start_line,
                        start_column,
                        format!("unexpected character `{char}`"),
                    ));
                }
            }
            _ => {
                return Err(Error::parse(
                    start_line,
                    start_column,
                    format!("unexpected character `{char}`"),
                ));
            }
        };

        Ok(Some(Token {
            token_type,
            line: start_line,
            column: start_column,
            offset: start_offset,
            end: self.offset,
        }))
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        char
    }

    fn skip_whitespace(&mut self) {
        while let Some(&char) = self.chars.peek() {
            if char.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        self.advance(); // consume second '/'
        while let Some(&char) = self.chars.peek() {
            if char == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // consume '*'
        while let Some(char) = self.advance() {
            if char == '*'
                && let Some(&'/') = self.chars.peek()
            {
                self.advance();
                break;
            }
        }
    }

    fn read_string(
        &mut self,
        quote: char,
        line: usize,
        column: usize,
        offset: usize,
    ) -> Result<Token> {
        let mut value = String::new();
        loop {
            let Some(char) = self.advance() else {
                return Err(Error::parse(line, column, "unterminated string literal"));
            };
            if char == quote {
                break;
            }
            if char == '\\' {
                let Some(escaped) = self.advance() else {
                    return Err(Error::parse(line, column, "unterminated string literal"));
                };
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other, // \\ \' \" and anything else pass through
                });
                continue;
            }
            value.push(char);
        }
        Ok(Token {
            token_type: TokenType::String(value),
            line,
            column,
            offset,
            end: self.offset,
        })
    }

    fn read_number(
        &mut self,
        first: char,
        line: usize,
        column: usize,
        offset: usize,
    ) -> Result<Token> {
        let mut value = String::new();
        value.push(first);
        let mut is_float = false;
        while let Some(&char) = self.chars.peek() {
            if char.is_ascii_digit() {
                value.push(char);
                self.advance();
            } else if char == '.' && !is_float {
                // Look ahead: `2..3` is a range, `2.5` is a float.
                let mut chars = self.chars.clone();
                chars.next();
                if let Some(&next_char) = chars.peek()
                    && next_char == '.'
                {
                    break;
                }
                if !chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    break;
                }
                is_float = true;
                value.push(char);
                self.advance();
            } else if char == 'e' || char == 'E' {
                // Scientific notation: 1e5, 2.5e-3.
                let mut chars = self.chars.clone();
                chars.next();
                let mut exp_start = chars.clone();
                let signed = matches!(exp_start.peek(), Some('+') | Some('-'));
                if signed {
                    exp_start.next();
                }
                if !exp_start.peek().is_some_and(|c| c.is_ascii_digit()) {
                    break;
                }
                is_float = true;
                value.push(char);
                self.advance();
                if signed {
                    value.push(self.advance().unwrap());
                }
            } else {
                break;
            }
        }

        let token_type = if is_float {
            let number = value
                .parse::<f64>()
                .map_err(|_| Error::parse(line, column, format!("invalid number `{value}`")))?;
            TokenType::Float(number)
        } else {
            match value.parse::<i64>() {
                Ok(number) => TokenType::Integer(number),
                // Out of i64 range: keep the value as a float.
                Err(_) => {
                    let number = value.parse::<f64>().map_err(|_| {
                        Error::parse(line, column, format!("invalid number `{value}`"))
                    })?;
                    TokenType::Float(number)
                }
            }
        };
        Ok(Token {
            token_type,
            line,
            column,
            offset,
            end: self.offset,
        })
    }

    fn read_identifier(&mut self, first: char, line: usize, column: usize, offset: usize) -> Token {
        let mut value = String::new();
        value.push(first);
        while let Some(&char) = self.chars.peek() {
            if char.is_alphanumeric() || char == '_' {
                value.push(char);
                self.advance();
            } else {
                break;
            }
        }

        let token_type = match value.to_uppercase().as_str() {
            "MATCH" => TokenType::Match,
            "WHERE" => TokenType::Where,
            "RETURN" => TokenType::Return,
            "DISTINCT" => TokenType::Distinct,
            "ORDER" => TokenType::Order,
            "BY" => TokenType::By,
            "ASC" => TokenType::Asc,
            "DESC" => TokenType::Desc,
            "SKIP" => TokenType::Skip,
            "LIMIT" => TokenType::Limit,
            "AND" => TokenType::And,
            "OR" => TokenType::Or,
            "NOT" => TokenType::Not,
            "IS" => TokenType::Is,
            "IN" => TokenType::In,
            "STARTS" => TokenType::Starts,
            "ENDS" => TokenType::Ends,
            "CONTAINS" => TokenType::Contains,
            "WITH" => TokenType::With,
            "AS" => TokenType::As,
            "TRUE" => TokenType::Boolean(true),
            "FALSE" => TokenType::Boolean(false),
            "NULL" => TokenType::Null,
            _ => TokenType::Identifier(value),
        };

        Token {
            token_type,
            line,
            column,
            offset,
            end: self.offset,
        }
    }
}
