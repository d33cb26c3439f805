//! Tokenizer

use crate::error::ScriptError;

/// Operator symbols, longest first so matching is greedy.
const OPERATORS: &[&str] = &[
    "**=", "//=", "**", "//", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=", "*=", "/=", "%=",
    "++", "--", "!!", "->", "+", "-", "*", "/", "%", ">", "<", "=", "!", ":",
];

/// Token categories.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal with escapes resolved
    Str(String),
    /// `.a.b` or `global.a.b`
    Variable {
        /// Whether the path starts at the global scope
        global: bool,
        /// Names along the path
        path: Vec<String>,
    },
    /// Bare word: keyword, built-in name or local variable
    Word(String),
    /// Operator symbol (`else` is reported as `||`)
    Op(&'static str),
    /// `(`, `[` or `{`
    Open(char),
    /// `)`, `]` or `}`
    Close(char),
    /// `,`
    Comma,
    /// `;`
    Semicolon,
}

/// A token and the 0-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Category and payload
    pub kind: TokenKind,
    /// Source line
    pub line: usize,
}

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    source: &'a str,
    line: usize,
    tokens: Vec<Token>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            source,
            line: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ScriptError> {
        while let Some(&(start, c)) = self.chars.peek() {
            let line = self.line;
            let kind = match c {
                '\n' => {
                    self.line += 1;
                    self.chars.next();
                    continue;
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                    continue;
                }
                '#' => {
                    while self.chars.next_if(|&(_, c)| c != '\n').is_some() {}
                    continue;
                }
                '(' | '[' | '{' => {
                    self.chars.next();
                    TokenKind::Open(c)
                }
                ')' | ']' | '}' => {
                    self.chars.next();
                    TokenKind::Close(c)
                }
                ',' => {
                    self.chars.next();
                    TokenKind::Comma
                }
                ';' => {
                    self.chars.next();
                    TokenKind::Semicolon
                }
                '"' | '\'' => self.string(c)?,
                '.' => {
                    self.chars.next();
                    self.variable(false)?
                }
                c if c.is_ascii_digit() => self.number(start)?,
                c if c.is_ascii_alphabetic() || c == '_' => self.word(start)?,
                _ => self.operator(start)?,
            };
            self.tokens.push(Token { kind, line });
        }
        Ok(self.tokens)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::lex(message, self.line)
    }

    /// Consume characters while `pred` holds; returns the end offset.
    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        while self.chars.next_if(|&(_, c)| pred(c)).is_some() {}
        self.chars.peek().map_or(self.source.len(), |&(i, _)| i)
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, ScriptError> {
        let mut end = self.eat_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        let mut lookahead = self.chars.clone();
        if let (Some((_, '.')), Some((_, d))) = (lookahead.next(), lookahead.next()) {
            if d.is_ascii_digit() {
                self.chars.next();
                end = self.eat_while(|c| c.is_ascii_digit());
                is_float = true;
            }
        }
        let text = &self.source[start..end];
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.error(format!("Invalid float '{}'", text)))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| self.error(format!("Integer '{}' is out of range", text)))
        }
    }

    fn word(&mut self, start: usize) -> Result<TokenKind, ScriptError> {
        let end = self.eat_while(is_name_char);
        let word = &self.source[start..end];
        if word == "global" {
            let mut lookahead = self.chars.clone();
            if let (Some((_, '.')), Some((_, c))) = (lookahead.next(), lookahead.next()) {
                if is_name_char(c) {
                    self.chars.next();
                    return self.variable(true);
                }
            }
        }
        Ok(match word {
            "else" => TokenKind::Op("||"),
            _ => TokenKind::Word(word.to_string()),
        })
    }

    /// Lex the path after the leading `.` or `global.`.
    fn variable(&mut self, global: bool) -> Result<TokenKind, ScriptError> {
        let mut path = Vec::new();
        loop {
            let start = self.chars.peek().map_or(self.source.len(), |&(i, _)| i);
            let end = self.eat_while(is_name_char);
            if start == end {
                return Err(self.error("Invalid variable name"));
            }
            path.push(self.source[start..end].to_string());
            // A '.' continues the path only when a name follows it.
            let mut lookahead = self.chars.clone();
            match (lookahead.next(), lookahead.next()) {
                (Some((_, '.')), Some((_, c))) if is_name_char(c) => {
                    self.chars.next();
                }
                _ => break,
            }
        }
        Ok(TokenKind::Variable { global, path })
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, ScriptError> {
        self.chars.next();
        let mut value = String::new();
        loop {
            let Some((_, c)) = self.chars.next() else {
                return Err(self.error("Unterminated string literal"));
            };
            match c {
                c if c == quote => return Ok(TokenKind::Str(value)),
                '\\' => {
                    let escaped = match self.chars.next() {
                        Some((_, c @ ('\\' | '\'' | '"'))) => c,
                        Some((_, 'n')) => '\n',
                        Some((_, 't')) => '\t',
                        Some((_, 'r')) => '\r',
                        Some((_, other)) => {
                            return Err(self.error(format!("Invalid escape '\\{}' in string", other)))
                        }
                        None => return Err(self.error("Unterminated string literal")),
                    };
                    value.push(escaped);
                }
                '\n' => {
                    self.line += 1;
                    value.push(c);
                }
                _ => value.push(c),
            }
        }
    }

    fn operator(&mut self, start: usize) -> Result<TokenKind, ScriptError> {
        let rest = &self.source[start..];
        let Some(&op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            let c = rest.chars().next().unwrap_or(' ');
            return Err(self.error(format!("Unexpected character '{}'", c)));
        };
        for _ in 0..op.len() {
            self.chars.next();
        }
        Ok(TokenKind::Op(op))
    }
}
