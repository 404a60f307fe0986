//! Recursive-descent parser over four precedence levels.
//!
//! From loosest to tightest binding: separators (`;`, `&`, newline) →
//! logicals (`&&`, `||`) → pipes (`|`) → commands and parenthesized groups.
//! Each level is a plain recursive function; there's no intermediate token
//! stream, just a cursor into the original string and the on-demand
//! recognizer in [`crate::lexer`].

use crate::ast::{BinaryOp, Node, RedirectionSet};
use crate::error::ParseError;
use crate::lexer::{self, Token};

/// Parse a full command line.
///
/// Returns `Ok(None)` for input that reduces to nothing parseable (for
/// example a string of only whitespace) - the caller should treat that the
/// same way the executor treats an empty tree: exit 0, nothing to run.
pub fn parse(input: &str) -> Result<Option<Node>, ParseError> {
    let mut parser = Parser { input, pos: 0, depth: 0 };
    let tree = parser.parse_separators()?;
    let pos = lexer::skip_spaces(parser.input, parser.pos, false);
    match char_at(parser.input, pos) {
        None => Ok(tree),
        Some(')') => Err(ParseError::BracketsBalance { pos }),
        Some(c) => Err(ParseError::InvalidOperation { pos, found: c }),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    /// Parenthesis nesting depth. Newline is a separator only at depth 0 -
    /// inside `(...)` it is ordinary whitespace.
    depth: usize,
}

impl<'a> Parser<'a> {
    fn preserve_endline(&self) -> bool {
        self.depth == 0
    }

    fn peek(&self, preserve_endline: bool) -> (Token, usize) {
        lexer::recognize(self.input, self.pos, preserve_endline)
    }

    fn skip_ws(&mut self, preserve_endline: bool) {
        self.pos = lexer::skip_spaces(self.input, self.pos, preserve_endline);
    }

    /// `separators := logicals ((';' | '&' | '\n') logicals?)*`
    fn parse_separators(&mut self) -> Result<Option<Node>, ParseError> {
        let Some(mut tree) = self.parse_logicals()? else {
            return Ok(None);
        };
        loop {
            let save = self.pos;
            let (tok, new_pos) = self.peek(self.preserve_endline());
            let op = match tok {
                Token::Semicolon | Token::EndOfLine => BinaryOp::Sequence,
                Token::Parallel => BinaryOp::Parallel,
                Token::Invalid => {
                    return Err(ParseError::InvalidOperation {
                        pos: new_pos,
                        found: char_at(self.input, new_pos).unwrap_or('\0'),
                    });
                }
                _ => {
                    self.pos = save;
                    return Ok(Some(tree));
                }
            };
            self.pos = new_pos;
            if tok == Token::EndOfLine {
                // Collapse any further blank lines before the next expression.
                self.skip_ws(false);
            }
            let right = self.parse_logicals()?.map(Box::new);
            tree = Node::Binary {
                op,
                left: Box::new(tree),
                right,
            };
        }
    }

    /// `logicals := pipe (('&&' | '||') pipe)*`
    fn parse_logicals(&mut self) -> Result<Option<Node>, ParseError> {
        let Some(mut tree) = self.parse_pipe()? else {
            return Ok(None);
        };
        loop {
            let save = self.pos;
            let (tok, new_pos) = self.peek(self.preserve_endline());
            let op = match tok {
                Token::Conjunction => BinaryOp::Conjunction,
                Token::Disjunction => BinaryOp::Disjunction,
                Token::Invalid => {
                    return Err(ParseError::InvalidOperation {
                        pos: new_pos,
                        found: char_at(self.input, new_pos).unwrap_or('\0'),
                    });
                }
                _ => {
                    self.pos = save;
                    return Ok(Some(tree));
                }
            };
            self.pos = new_pos;
            let right = self
                .parse_pipe()?
                .ok_or(ParseError::NoOperand { pos: self.pos })?;
            tree = Node::Binary {
                op,
                left: Box::new(tree),
                right: Some(Box::new(right)),
            };
        }
    }

    /// `pipe := command ('|' command)*`
    fn parse_pipe(&mut self) -> Result<Option<Node>, ParseError> {
        let Some(mut tree) = self.parse_command()? else {
            return Ok(None);
        };
        loop {
            let save = self.pos;
            let (tok, new_pos) = self.peek(self.preserve_endline());
            match tok {
                Token::Pipe => {}
                Token::Invalid => {
                    return Err(ParseError::InvalidOperation {
                        pos: new_pos,
                        found: char_at(self.input, new_pos).unwrap_or('\0'),
                    });
                }
                _ => {
                    self.pos = save;
                    return Ok(Some(tree));
                }
            }
            self.pos = new_pos;
            let right = self
                .parse_command()?
                .ok_or(ParseError::NoOperand { pos: self.pos })?;
            tree = Node::Binary {
                op: BinaryOp::Pipe,
                left: Box::new(tree),
                right: Some(Box::new(right)),
            };
        }
    }

    /// `command := '(' separators ')' redirects* | word+ redirects*`
    ///
    /// Returns `Ok(None)` when the next token is a recognized operator
    /// rather than a word or `(` - "there is no command here", not an
    /// error. Every other caller treats that as the natural end of its own
    /// recursion.
    fn parse_command(&mut self) -> Result<Option<Node>, ParseError> {
        self.skip_ws(self.preserve_endline());
        if self.input.as_bytes().get(self.pos) == Some(&b'(') {
            self.pos += 1;
            self.depth += 1;
            let inner = self.parse_separators();
            self.depth -= 1;
            let inner = inner?.ok_or(ParseError::NoOperand { pos: self.pos })?;
            self.skip_ws(self.preserve_endline());
            if self.input.as_bytes().get(self.pos) != Some(&b')') {
                return Err(ParseError::BracketsBalance { pos: self.pos });
            }
            self.pos += 1;
            let mut redirections = RedirectionSet::default();
            self.parse_redirections(&mut redirections)?;
            return Ok(Some(Node::Group {
                inner: Box::new(inner),
                redirections,
            }));
        }

        let save = self.pos;
        let (tok, _) = self.peek(self.preserve_endline());
        if tok != Token::Invalid {
            self.pos = save;
            return Ok(None);
        }

        let mut argv = Vec::new();
        let mut redirections = RedirectionSet::default();
        loop {
            let (tok, _) = self.peek(self.preserve_endline());
            if tok != Token::Invalid {
                break;
            }
            self.skip_ws(self.preserve_endline());
            let (word, after) = lexer::scan_word(self.input, self.pos);
            self.pos = after;
            argv.push(word);
            self.parse_redirections(&mut redirections)?;
        }
        Ok(Some(Node::Command { argv, redirections }))
    }

    /// `redirects := (('<' | '>' | '>>') word)*`, last occurrence of each
    /// kind wins.
    fn parse_redirections(&mut self, set: &mut RedirectionSet) -> Result<(), ParseError> {
        loop {
            let save = self.pos;
            let (tok, new_pos) = self.peek(self.preserve_endline());
            let slot = match tok {
                Token::RedirOut => &mut set.out,
                Token::RedirAppend => &mut set.append,
                Token::RedirIn => &mut set.input,
                _ => {
                    self.pos = save;
                    return Ok(());
                }
            };
            self.pos = new_pos;
            let (next, _) = self.peek(self.preserve_endline());
            if next != Token::Invalid {
                return Err(ParseError::NoOperand { pos: self.pos });
            }
            self.skip_ws(self.preserve_endline());
            let (word, after) = lexer::scan_word(self.input, self.pos);
            self.pos = after;
            *slot = Some(word);
        }
    }
}

fn char_at(input: &str, pos: usize) -> Option<char> {
    input[pos.min(input.len())..].chars().next()
}
