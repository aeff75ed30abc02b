//! A restricted command language for message and thread content.
//!
//! Scripts are parsed, never executed. Message scripts:
//!
//! ```text
//! text "Deploy *finished*"
//! context "build 42" plain
//! divider
//! section {
//!   text "Release notes"
//!   link "Open" "https://example.com/notes"
//! }
//! ```
//!
//! Thread scripts hold `text "..."`, `message "..."`, and
//! `message { <message script> }` entries. `#` starts a comment. Strings
//! are double-quoted and support `\"`, `\\`, `\n`, and `\t` escapes.

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::builder::{MessageBuilder, ThreadBuilder};
use crate::content::Content;
use crate::error::{Result, SlackLineError};
use crate::message::Message;
use crate::thread::Thread;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Str(String),
    Open,
    Close,
}

#[derive(Debug)]
struct Spanned {
    token: Token,
    line: usize,
}

enum SectionStatement {
    Text { text: String, plain: bool },
    Link { text: String, url: String },
}

/// Parse a message script.
///
/// # Errors
///
/// Returns [`SlackLineError::InvalidArgument`] naming the offending line for
/// syntax errors, unknown commands, or commands used outside their scope,
/// and when the script produces no content.
pub fn parse_message(source: &str) -> Result<Message> {
    let mut parser = Parser::new(source)?;
    let mut builder = MessageBuilder::default();
    parser.message_body(&mut builder, None)?;
    let blocks = builder.finish();
    if blocks.is_empty() {
        return Err(SlackLineError::invalid("Script produced no content."));
    }
    Message::from_blocks(blocks)
}

/// Parse a thread script.
///
/// # Errors
///
/// Returns [`SlackLineError::InvalidArgument`] for syntax errors, a
/// `message` entry with both or neither of a string and a block, or a
/// script with no messages.
pub fn parse_thread(source: &str) -> Result<Thread> {
    let mut parser = Parser::new(source)?;
    let mut builder = ThreadBuilder::default();
    parser.thread_body(&mut builder)?;
    Thread::from_contents(builder.finish()?)
}

struct Parser {
    tokens: Peekable<IntoIter<Spanned>>,
}

impl Parser {
    fn new(source: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(source)?.into_iter().peekable(),
        })
    }

    fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek().map(|s| &s.token)
    }

    fn string_argument(&mut self, command: &str, line: usize) -> Result<String> {
        match self.tokens.next() {
            Some(Spanned {
                token: Token::Str(text),
                ..
            }) => Ok(text),
            _ => Err(syntax(line, format!("`{command}` expects a quoted string"))),
        }
    }

    fn plain_flag(&mut self) -> bool {
        if self.peek() == Some(&Token::Word("plain".to_owned())) {
            self.tokens.next();
            return true;
        }
        false
    }

    fn open_scope(&mut self, command: &str, line: usize) -> Result<()> {
        match self.tokens.next() {
            Some(Spanned {
                token: Token::Open, ..
            }) => Ok(()),
            _ => Err(syntax(line, format!("`{command}` expects `{{`"))),
        }
    }

    /// Parse message statements until EOF, or until `}` when `scope` names
    /// the line the scope was opened on.
    fn message_body(&mut self, builder: &mut MessageBuilder, scope: Option<usize>) -> Result<()> {
        loop {
            let Some(Spanned { token, line }) = self.tokens.next() else {
                return match scope {
                    Some(opened) => Err(syntax(opened, "unterminated `{`")),
                    None => Ok(()),
                };
            };
            match token {
                Token::Close if scope.is_some() => return Ok(()),
                Token::Word(command) => match command.as_str() {
                    "text" => {
                        let text = self.string_argument("text", line)?;
                        if self.plain_flag() {
                            builder.plain_text(text);
                        } else {
                            builder.text(text);
                        }
                    }
                    "context" => {
                        let text = self.string_argument("context", line)?;
                        if self.plain_flag() {
                            builder.plain_context(text);
                        } else {
                            builder.context(text);
                        }
                    }
                    "divider" => {
                        builder.divider();
                    }
                    "section" => {
                        self.open_scope("section", line)?;
                        let statements = self.section_body(line)?;
                        builder.section(|s| {
                            for statement in statements {
                                match statement {
                                    SectionStatement::Text { text, plain: true } => {
                                        s.plain_text(text);
                                    }
                                    SectionStatement::Text { text, plain: false } => {
                                        s.text(text);
                                    }
                                    SectionStatement::Link { text, url } => {
                                        s.link(text, url);
                                    }
                                }
                            }
                        });
                    }
                    "link" => {
                        return Err(syntax(line, "`link` is only valid inside a section"));
                    }
                    other => return Err(syntax(line, format!("unknown command `{other}`"))),
                },
                other => return Err(syntax(line, format!("unexpected {}", describe(&other)))),
            }
        }
    }

    fn section_body(&mut self, opened: usize) -> Result<Vec<SectionStatement>> {
        let mut statements = Vec::new();
        loop {
            let Some(Spanned { token, line }) = self.tokens.next() else {
                return Err(syntax(opened, "unterminated `{`"));
            };
            match token {
                Token::Close => return Ok(statements),
                Token::Word(command) => match command.as_str() {
                    "text" => {
                        let text = self.string_argument("text", line)?;
                        let plain = self.plain_flag();
                        statements.push(SectionStatement::Text { text, plain });
                    }
                    "link" => {
                        let text = self.string_argument("link", line)?;
                        let url = self.string_argument("link", line)?;
                        statements.push(SectionStatement::Link { text, url });
                    }
                    other => {
                        return Err(syntax(
                            line,
                            format!("`{other}` is not valid inside a section"),
                        ))
                    }
                },
                other => return Err(syntax(line, format!("unexpected {}", describe(&other)))),
            }
        }
    }

    fn thread_body(&mut self, builder: &mut ThreadBuilder) -> Result<()> {
        while let Some(Spanned { token, line }) = self.tokens.next() {
            match token {
                Token::Word(command) => match command.as_str() {
                    "text" => {
                        let text = self.string_argument("text", line)?;
                        builder.text(text);
                    }
                    "message" => {
                        let supplied = match self.peek() {
                            Some(Token::Str(_)) => {
                                Some(Content::Text(self.string_argument("message", line)?))
                            }
                            _ => None,
                        };
                        let block = match self.peek() {
                            Some(Token::Open) => {
                                self.tokens.next();
                                let mut message = MessageBuilder::default();
                                self.message_body(&mut message, Some(line))?;
                                let blocks = message.finish();
                                if blocks.is_empty() {
                                    return Err(syntax(line, "Script produced no content."));
                                }
                                Some(blocks)
                            }
                            _ => None,
                        };
                        builder.push(supplied, block);
                    }
                    other => return Err(syntax(line, format!("unknown command `{other}`"))),
                },
                other => return Err(syntax(line, format!("unexpected {}", describe(&other)))),
            }
        }
        Ok(())
    }
}

fn tokenize(source: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line: usize = 1;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line = line.saturating_add(1),
            c if c.is_whitespace() => {}
            '#' => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line = line.saturating_add(1);
                        break;
                    }
                }
            }
            '{' => tokens.push(Spanned {
                token: Token::Open,
                line,
            }),
            '}' => tokens.push(Spanned {
                token: Token::Close,
                line,
            }),
            '"' => {
                let start = line;
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(escaped @ ('"' | '\\')) => text.push(escaped),
                            Some(other) => {
                                return Err(syntax(line, format!("unknown escape `\\{other}`")))
                            }
                            None => break,
                        },
                        '\n' => {
                            line = line.saturating_add(1);
                            text.push('\n');
                        }
                        other => text.push(other),
                    }
                }
                if !closed {
                    return Err(syntax(start, "unterminated string"));
                }
                tokens.push(Spanned {
                    token: Token::Str(text),
                    line: start,
                });
            }
            first => {
                let mut word = String::from(first);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '{' | '}' | '"' | '#') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push(Spanned {
                    token: Token::Word(word),
                    line,
                });
            }
        }
    }

    Ok(tokens)
}

fn describe(token: &Token) -> String {
    match token {
        Token::Word(word) => format!("`{word}`"),
        Token::Str(text) => format!("string {text:?}"),
        Token::Open => "`{`".to_owned(),
        Token::Close => "`}`".to_owned(),
    }
}

fn syntax(line: usize, message: impl AsRef<str>) -> SlackLineError {
    SlackLineError::invalid(format!("script line {line}: {}", message.as_ref()))
}
