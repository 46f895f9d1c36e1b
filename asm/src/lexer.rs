use std::collections::VecDeque;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

// ----------------------------------------------------------------------------
// Token

/// A whitespace-delimited lexeme plus the line on which it ended. The
/// parser compares the lines of consecutive tokens to decide whether
/// they were written on the same source line (variable-arity operand
/// lists, implicit third instruction field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: Line,
}

/// Tokens read from the file carry their 1-based physical line. Tokens
/// injected by the pseudo-instruction expander carry a fresh synthetic
/// tag instead, so adjacency checks see each injected instruction as
/// sitting on its own line and never confuse it with real source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Source(usize),
    Synth(usize),
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Source(n) => write!(f, "line {}", n),
            Line::Synth(_) => write!(f, "expanded code"),
        }
    }
}

// ----------------------------------------------------------------------------
// Tokenizer

/// Splits the source into whitespace-delimited tokens. `/` starts a
/// comment running to the end of the line; a token being accumulated
/// completes before the comment is skipped. CR, LF and CRLF all count
/// as a single line advance.
///
/// Tokens can be pushed back: the pending queue is consulted before the
/// raw character stream, which is how the expander injects primitive
/// tokens "as if typed".
pub struct Tokenizer<'a> {
    iter: Peekable<Chars<'a>>,
    line: usize,
    pending: VecDeque<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            iter: src.chars().peekable(),
            line: 1,
            pending: VecDeque::new(),
        }
    }

    /// The line the cursor currently sits on, for end-of-input errors.
    pub fn line(&self) -> Line {
        Line::Source(self.line)
    }

    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        if let Some(tok) = self.pending.pop_front() {
            return Some(tok);
        }

        let mut buf = String::new();
        while let Some(&c) = self.iter.peek() {
            match c {
                '/' => {
                    // A token in progress completes before the comment
                    // is skipped; the '/' stays put for the next call.
                    if !buf.is_empty() {
                        return Some(self.token(buf, self.line));
                    }
                    self.skip_comment();
                }
                '\r' | '\n' => {
                    let line = self.line;
                    self.consume_line_break();
                    if !buf.is_empty() {
                        return Some(self.token(buf, line));
                    }
                }
                ' ' | '\t' => {
                    self.iter.next();
                    if !buf.is_empty() {
                        return Some(self.token(buf, self.line));
                    }
                }
                _ => {
                    self.iter.next();
                    buf.push(c);
                }
            }
        }

        if buf.is_empty() {
            None
        } else {
            Some(self.token(buf, self.line))
        }
    }

    /// Re-inserts one token at the front of the stream.
    pub fn unread(&mut self, tok: Token) {
        self.pending.push_front(tok);
    }

    /// Injects a run of tokens at the front of the stream, preserving
    /// their order.
    pub fn inject(&mut self, tokens: Vec<Token>) {
        for tok in tokens.into_iter().rev() {
            self.pending.push_front(tok);
        }
    }

    fn token(&self, text: String, line: usize) -> Token {
        Token {
            text,
            line: Line::Source(line),
        }
    }

    /// Skips from a `/` to the next line break, inclusive.
    fn skip_comment(&mut self) {
        self.iter.next();
        while let Some(&c) = self.iter.peek() {
            if c == '\r' || c == '\n' {
                self.consume_line_break();
                return;
            }
            self.iter.next();
        }
    }

    /// Consumes one of CR, LF or CRLF and advances the line counter once.
    fn consume_line_break(&mut self) {
        if self.iter.next() == Some('\r') {
            if self.iter.peek() == Some(&'\n') {
                self.iter.next();
            }
        }
        self.line += 1;
    }
}
