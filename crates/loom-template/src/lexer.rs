use crate::error::{SourceLocation, SourceSpan, TemplateError, TemplateSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
    End,
    Range,
    With,
    Define,
    Template,
    Block,
}

fn keyword_for(word: &str) -> Option<Keyword> {
    Some(match word {
        "if" => Keyword::If,
        "else" => Keyword::Else,
        "end" => Keyword::End,
        "range" => Keyword::Range,
        "with" => Keyword::With,
        "define" => Keyword::Define,
        "template" => Keyword::Template,
        "block" => Keyword::Block,
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String),
    ActionOpen,
    ActionClose,
    Keyword(Keyword),
    Pipe,
    LParen,
    RParen,
    Field(Vec<String>),
    Chain(Vec<String>),
    Variable(String),
    Ident(String),
    Str(String),
    Num { value: f64, text: String },
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: SourceSpan,
}

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    source: TemplateSource,
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, source: TemplateSource) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            source,
        }
    }

    fn err(&self, offset: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            loc: SourceLocation::new(SourceSpan::point(offset), self.source.clone()),
            message: message.into(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned>, TemplateError> {
        let mut out = Vec::new();
        loop {
            let text_start = self.pos;
            while self.pos < self.bytes.len() && !self.src[self.pos..].starts_with("{{") {
                self.pos += 1;
            }
            if self.pos > text_start {
                out.push(Spanned {
                    token: Token::Text(self.src[text_start..self.pos].to_string()),
                    span: SourceSpan::new(text_start, self.pos - text_start),
                });
            }
            if self.pos >= self.bytes.len() {
                break;
            }
            let open_at = self.pos;
            self.pos += 2;
            out.push(Spanned {
                token: Token::ActionOpen,
                span: SourceSpan::new(open_at, 2),
            });
            self.lex_action(&mut out)?;
        }
        out.push(Spanned {
            token: Token::Eof,
            span: SourceSpan::point(self.pos),
        });
        Ok(out)
    }

    fn lex_action(&mut self, out: &mut Vec<Spanned>) -> Result<(), TemplateError> {
        loop {
            self.skip_ws();
            if self.pos >= self.bytes.len() {
                return Err(self.err(self.pos, "unterminated action, expected `}}`"));
            }
            if self.src[self.pos..].starts_with("}}") {
                let at = self.pos;
                self.pos += 2;
                out.push(Spanned {
                    token: Token::ActionClose,
                    span: SourceSpan::new(at, 2),
                });
                return Ok(());
            }
            let start = self.pos;
            let c = self.bytes[self.pos];
            match c {
                b'|' => {
                    self.pos += 1;
                    out.push(Spanned {
                        token: Token::Pipe,
                        span: SourceSpan::new(start, 1),
                    });
                }
                b'(' => {
                    self.pos += 1;
                    out.push(Spanned {
                        token: Token::LParen,
                        span: SourceSpan::new(start, 1),
                    });
                }
                b')' => {
                    self.pos += 1;
                    out.push(Spanned {
                        token: Token::RParen,
                        span: SourceSpan::new(start, 1),
                    });
                }
                b'.' => {
                    let path = self.lex_dotted_path();
                    out.push(Spanned {
                        token: Token::Field(path),
                        span: SourceSpan::new(start, self.pos - start),
                    });
                }
                b'$' => {
                    self.pos += 1;
                    if self.peek() == Some(b'.') {
                        let path = self.lex_dotted_path();
                        out.push(Spanned {
                            token: Token::Chain(path),
                            span: SourceSpan::new(start, self.pos - start),
                        });
                    } else if self.peek().map(is_ident_start).unwrap_or(false) {
                        let name = self.lex_word();
                        out.push(Spanned {
                            token: Token::Variable(name),
                            span: SourceSpan::new(start, self.pos - start),
                        });
                    } else {
                        out.push(Spanned {
                            token: Token::Chain(Vec::new()),
                            span: SourceSpan::new(start, self.pos - start),
                        });
                    }
                }
                b'"' | b'\'' => {
                    let value = self.lex_string(c)?;
                    out.push(Spanned {
                        token: Token::Str(value),
                        span: SourceSpan::new(start, self.pos - start),
                    });
                }
                b'0'..=b'9' => {
                    let (value, text) = self.lex_number();
                    out.push(Spanned {
                        token: Token::Num { value, text },
                        span: SourceSpan::new(start, self.pos - start),
                    });
                }
                b'-' if self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit) => {
                    let (value, text) = self.lex_number();
                    out.push(Spanned {
                        token: Token::Num { value, text },
                        span: SourceSpan::new(start, self.pos - start),
                    });
                }
                c if is_ident_start(c) => {
                    let word = self.lex_word();
                    let token = match keyword_for(&word) {
                        Some(kw) => Token::Keyword(kw),
                        None => Token::Ident(word),
                    };
                    out.push(Spanned {
                        token,
                        span: SourceSpan::new(start, self.pos - start),
                    });
                }
                other => {
                    return Err(self.err(
                        start,
                        format!("unexpected character {:?} in action", other as char),
                    ));
                }
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn lex_word(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }

    /// Consumes a `.Foo.Bar` style path. Leaves `pos` just past the last
    /// consumed segment. A lone `.` with nothing identifier-like after it
    /// yields an empty path (the root value itself).
    fn lex_dotted_path(&mut self) -> Vec<String> {
        let mut path = Vec::new();
        loop {
            if self.peek() != Some(b'.') {
                break;
            }
            let after_dot = self.pos + 1;
            if after_dot >= self.bytes.len() || !is_ident_start(self.bytes[after_dot]) {
                self.pos += 1;
                break;
            }
            self.pos = after_dot;
            let seg_start = self.pos;
            while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
                self.pos += 1;
            }
            path.push(self.src[seg_start..self.pos].to_string());
        }
        path
    }

    fn lex_string(&mut self, quote: u8) -> Result<String, TemplateError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            if self.pos >= self.bytes.len() {
                return Err(self.err(start, "unterminated string literal"));
            }
            let c = self.bytes[self.pos];
            if c == quote {
                self.pos += 1;
                break;
            }
            if c == b'\\' && self.pos + 1 < self.bytes.len() {
                let esc = self.bytes[self.pos + 1];
                let replacement = match esc {
                    b'n' => '\n',
                    b't' => '\t',
                    b'"' => '"',
                    b'\'' => '\'',
                    b'\\' => '\\',
                    other => other as char,
                };
                value.push(replacement);
                self.pos += 2;
                continue;
            }
            // Advance by one UTF-8 char, not one byte, to stay on boundaries.
            let ch = self.src[self.pos..].chars().next().unwrap();
            value.push(ch);
            self.pos += ch.len_utf8();
        }
        Ok(value)
    }

    fn lex_number(&mut self) -> (f64, String) {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.peek() == Some(b'.')
            && self
                .bytes
                .get(self.pos + 1)
                .is_some_and(u8::is_ascii_digit)
        {
            self.pos += 1;
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        let text = self.src[start..self.pos].to_string();
        let value = text.parse::<f64>().unwrap_or(0.0);
        (value, text)
    }
}
