use crate::ast::{Arg, Command, Definition, Node, NodeKind, ParsedFile, Pipeline};
use crate::error::{SourceLocation, SourceSpan, TemplateError, TemplateSource};
use crate::lexer::{Keyword, Lexer, Spanned, Token};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Ctx {
    TopLevel,
    Nested,
}

pub fn parse_file(source_text: &str, file_name: &str, base_name: &str) -> Result<ParsedFile, TemplateError> {
    let source = TemplateSource::new(file_name, source_text);
    let tokens = Lexer::new(source_text, source.clone()).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        source,
        definitions: Vec::new(),
    };
    parser.parse_file(base_name)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    source: TemplateSource,
    definitions: Vec<Definition>,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].token
    }

    fn span(&self) -> SourceSpan {
        self.tokens[self.pos].span
    }

    fn advance(&mut self) -> Spanned {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, offset: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            loc: SourceLocation::new(SourceSpan::point(offset), self.source.clone()),
            message: message.into(),
        }
    }

    fn expect_action_open(&mut self) -> Result<(), TemplateError> {
        match self.peek() {
            Token::ActionOpen => {
                self.advance();
                Ok(())
            }
            _ => Err(self.err(self.span().offset, "expected `{{`")),
        }
    }

    fn expect_action_close(&mut self) -> Result<(), TemplateError> {
        match self.peek() {
            Token::ActionClose => {
                self.advance();
                Ok(())
            }
            other => Err(self.err(
                self.span().offset,
                format!("expected `}}}}`, found {:?}", other),
            )),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), TemplateError> {
        match self.peek() {
            Token::RParen => {
                self.advance();
                Ok(())
            }
            other => Err(self.err(self.span().offset, format!("expected `)`, found {:?}", other))),
        }
    }

    fn expect_string(&mut self) -> Result<String, TemplateError> {
        let offset = self.span().offset;
        match self.advance().token {
            Token::Str(s) => Ok(s),
            other => Err(self.err(offset, format!("expected a string literal, found {:?}", other))),
        }
    }

    fn parse_file(&mut self, base_name: &str) -> Result<ParsedFile, TemplateError> {
        let body = self.parse_sequence(Ctx::TopLevel)?;
        let calls = collect_calls(&body);
        let mut defs = std::mem::take(&mut self.definitions);
        defs.insert(
            0,
            Definition {
                name: base_name.to_string(),
                is_block: false,
                body,
                calls,
            },
        );
        Ok(ParsedFile { definitions: defs })
    }

    /// Parses text/action nodes until EOF (top level) or until an
    /// `{{else}}`/`{{end}}` belonging to the enclosing construct is seen;
    /// that terminator is left unconsumed for the caller.
    fn parse_sequence(&mut self, ctx: Ctx) -> Result<Vec<Node>, TemplateError> {
        let mut nodes = Vec::new();
        loop {
            match self.peek() {
                Token::Eof => {
                    if ctx != Ctx::TopLevel {
                        return Err(self.err(self.span().offset, "unterminated block, expected `{{end}}`"));
                    }
                    break;
                }
                Token::Text(_) => {
                    let span = self.span();
                    if let Token::Text(s) = self.advance().token {
                        nodes.push(Node::text(s, span));
                    }
                }
                Token::ActionOpen => match self.peek_at(1) {
                    Token::Keyword(Keyword::End) | Token::Keyword(Keyword::Else) => {
                        if ctx == Ctx::TopLevel {
                            return Err(self.err(self.span().offset, "unexpected `end`/`else` at top level"));
                        }
                        break;
                    }
                    Token::Keyword(Keyword::Define) => {
                        if ctx != Ctx::TopLevel {
                            return Err(self.err(self.span().offset, "`define` is only allowed at top level"));
                        }
                        self.parse_define()?;
                    }
                    _ => {
                        let node = self.parse_control_or_action()?;
                        nodes.push(node);
                    }
                },
                other => {
                    return Err(self.err(self.span().offset, format!("unexpected token {:?}", other)));
                }
            }
        }
        Ok(nodes)
    }

    fn consume_end(&mut self) -> Result<(), TemplateError> {
        self.expect_action_open()?;
        let offset = self.span().offset;
        match self.advance().token {
            Token::Keyword(Keyword::End) => {}
            other => return Err(self.err(offset, format!("expected `end`, found {:?}", other))),
        }
        self.expect_action_close()
    }

    fn parse_define(&mut self) -> Result<(), TemplateError> {
        self.advance(); // ActionOpen
        self.advance(); // Keyword::Define
        let name = self.expect_string()?;
        self.expect_action_close()?;
        let body = self.parse_sequence(Ctx::Nested)?;
        self.consume_end()?;
        let calls = collect_calls(&body);
        self.definitions.push(Definition {
            name,
            is_block: false,
            body,
            calls,
        });
        Ok(())
    }

    fn parse_control_or_action(&mut self) -> Result<Node, TemplateError> {
        let open_span = self.span();
        self.advance(); // ActionOpen
        match self.peek().clone() {
            Token::Keyword(Keyword::If) => {
                self.advance();
                self.parse_if(open_span)
            }
            Token::Keyword(Keyword::Range) => {
                self.advance();
                self.parse_range(open_span)
            }
            Token::Keyword(Keyword::With) => {
                self.advance();
                self.parse_with(open_span)
            }
            Token::Keyword(Keyword::Template) => {
                self.advance();
                self.parse_template_call(open_span)
            }
            Token::Keyword(Keyword::Block) => {
                self.advance();
                self.parse_block(open_span)
            }
            Token::Keyword(other) => Err(self.err(open_span.offset, format!("unexpected keyword {:?} here", other))),
            _ => {
                let pipeline = self.parse_pipeline()?;
                self.expect_action_close()?;
                Ok(Node {
                    kind: NodeKind::Action,
                    pipeline: Some(pipeline),
                    children: Vec::new(),
                    span: open_span,
                })
            }
        }
    }

    fn parse_if(&mut self, open_span: SourceSpan) -> Result<Node, TemplateError> {
        let pipeline = self.parse_pipeline()?;
        self.expect_action_close()?;
        let then_body = self.parse_sequence(Ctx::Nested)?;
        self.expect_action_open()?;
        let offset = self.span().offset;
        match self.advance().token {
            Token::Keyword(Keyword::Else) => {
                self.expect_action_close()?;
                let else_body = self.parse_sequence(Ctx::Nested)?;
                self.consume_end()?;
                let mut children = then_body;
                children.push(Node {
                    kind: NodeKind::Branch,
                    pipeline: None,
                    children: else_body,
                    span: open_span,
                });
                Ok(Node {
                    kind: NodeKind::If,
                    pipeline: Some(pipeline),
                    children,
                    span: open_span,
                })
            }
            Token::Keyword(Keyword::End) => {
                self.expect_action_close()?;
                Ok(Node {
                    kind: NodeKind::If,
                    pipeline: Some(pipeline),
                    children: then_body,
                    span: open_span,
                })
            }
            other => Err(self.err(offset, format!("expected `else` or `end`, found {:?}", other))),
        }
    }

    fn parse_range(&mut self, open_span: SourceSpan) -> Result<Node, TemplateError> {
        let pipeline = self.parse_pipeline()?;
        self.expect_action_close()?;
        let body = self.parse_sequence(Ctx::Nested)?;
        self.expect_action_open()?;
        let offset = self.span().offset;
        match self.advance().token {
            Token::Keyword(Keyword::Else) => {
                self.expect_action_close()?;
                let else_body = self.parse_sequence(Ctx::Nested)?;
                self.consume_end()?;
                let mut children = body;
                children.push(Node {
                    kind: NodeKind::Branch,
                    pipeline: None,
                    children: else_body,
                    span: open_span,
                });
                Ok(Node {
                    kind: NodeKind::Range,
                    pipeline: Some(pipeline),
                    children,
                    span: open_span,
                })
            }
            Token::Keyword(Keyword::End) => {
                self.expect_action_close()?;
                Ok(Node {
                    kind: NodeKind::Range,
                    pipeline: Some(pipeline),
                    children: body,
                    span: open_span,
                })
            }
            other => Err(self.err(offset, format!("expected `else` or `end`, found {:?}", other))),
        }
    }

    fn parse_with(&mut self, open_span: SourceSpan) -> Result<Node, TemplateError> {
        let pipeline = self.parse_pipeline()?;
        self.expect_action_close()?;
        let body = self.parse_sequence(Ctx::Nested)?;
        self.consume_end()?;
        Ok(Node {
            kind: NodeKind::With,
            pipeline: Some(pipeline),
            children: body,
            span: open_span,
        })
    }

    fn parse_template_call(&mut self, open_span: SourceSpan) -> Result<Node, TemplateError> {
        let name = self.expect_string()?;
        let pipeline = if matches!(self.peek(), Token::ActionClose) {
            None
        } else {
            Some(self.parse_pipeline()?)
        };
        self.expect_action_close()?;
        Ok(Node {
            kind: NodeKind::TemplateCall { name },
            pipeline,
            children: Vec::new(),
            span: open_span,
        })
    }

    fn parse_block(&mut self, open_span: SourceSpan) -> Result<Node, TemplateError> {
        let name = self.expect_string()?;
        let pipeline = if matches!(self.peek(), Token::ActionClose) {
            None
        } else {
            Some(self.parse_pipeline()?)
        };
        self.expect_action_close()?;
        let body = self.parse_sequence(Ctx::Nested)?;
        self.consume_end()?;
        let calls = collect_calls(&body);
        self.definitions.push(Definition {
            name: name.clone(),
            is_block: true,
            body: body.clone(),
            calls,
        });
        Ok(Node {
            kind: NodeKind::Block { name },
            pipeline,
            children: body,
            span: open_span,
        })
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, TemplateError> {
        let start = self.span();
        let mut commands = vec![self.parse_command()?];
        while matches!(self.peek(), Token::Pipe) {
            self.advance();
            commands.push(self.parse_command()?);
        }
        Ok(Pipeline { commands, span: start })
    }

    fn parse_command(&mut self) -> Result<Command, TemplateError> {
        let start = self.span();
        let mut args = Vec::new();
        loop {
            match self.peek() {
                Token::Pipe | Token::ActionClose | Token::RParen => break,
                _ => args.push(self.parse_arg()?),
            }
        }
        if args.is_empty() {
            return Err(self.err(start.offset, "expected at least one argument in pipeline command"));
        }
        Ok(Command { args, span: start })
    }

    fn parse_arg(&mut self) -> Result<Arg, TemplateError> {
        let offset = self.span().offset;
        match self.advance().token {
            Token::Field(path) => Ok(Arg::Field { path }),
            Token::Chain(path) => Ok(Arg::Chain { path }),
            Token::Variable(name) => Ok(Arg::Variable { name }),
            Token::Ident(name) => Ok(Arg::Identifier { name }),
            Token::Str(value) => Ok(Arg::StringLiteral { value }),
            Token::Num { value, text } => Ok(Arg::NumberLiteral { value, text }),
            Token::LParen => {
                let pipeline = self.parse_pipeline()?;
                self.expect_rparen()?;
                Ok(Arg::Nested { pipeline })
            }
            other => Err(self.err(offset, format!("unexpected token {:?} in argument position", other))),
        }
    }
}

/// Names referenced by `template`/`block` invocations directly inside
/// `body`, deduplicated, first occurrence order preserved. Does not descend
/// into a `Block` node's own children: those belong to that block's
/// separately registered definition and get their own `calls` list.
pub fn collect_calls(body: &[Node]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    collect_calls_into(body, &mut seen, &mut out);
    out
}

fn collect_calls_into(body: &[Node], seen: &mut std::collections::HashSet<String>, out: &mut Vec<String>) {
    for node in body {
        match &node.kind {
            NodeKind::TemplateCall { name } => {
                if seen.insert(name.clone()) {
                    out.push(name.clone());
                }
            }
            NodeKind::Block { name } => {
                if seen.insert(name.clone()) {
                    out.push(name.clone());
                }
            }
            _ => collect_calls_into(&node.children, seen, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(file: &'a ParsedFile, name: &str) -> &'a Definition {
        file.definitions.iter().find(|d| d.name == name).expect("definition present")
    }

    #[test]
    fn a_nested_blocks_call_does_not_leak_into_the_enclosing_definition() {
        let source = r#"{{template "header"}}{{block "sidebar" .}}{{template "widget"}}{{end}}"#;
        let file = parse_file(source, "page.html", "page").unwrap();

        let page = find(&file, "page");
        assert_eq!(page.calls, vec!["header".to_string(), "sidebar".to_string()]);
        assert!(!page.calls.contains(&"widget".to_string()));

        let sidebar = find(&file, "sidebar");
        assert_eq!(sidebar.calls, vec!["widget".to_string()]);
    }
}
