use arch::pseudo::Pseudo;
use arch::Word;
use color_print::cprintln;

use crate::context::Context;
use crate::error::Error;
use crate::expand::{self, TMP, TMP2};
use crate::lexer::{Token, Tokenizer};

/// Parses the three sections of a source file and returns the filled
/// (but not yet resolved) context.
pub fn assemble(src: &str) -> Result<Context, Error> {
    let mut parser = Parser::new(src);
    parser.parse_export()?;
    parser.parse_data()?;
    parser.parse_text()?;
    Ok(parser.ctx)
}

// ----------------------------------------------------------------------------
// Section parser

struct Parser<'a> {
    tokens: Tokenizer<'a>,
    ctx: Context,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            tokens: Tokenizer::new(src),
            ctx: Context::new(),
        }
    }

    /// `.export` followed by bare symbol names, up to the `.data` marker.
    fn parse_export(&mut self) -> Result<(), Error> {
        let head = self.tokens.next_token().ok_or(Error::ExpectedSection {
            expected: ".export",
            line: self.tokens.line(),
        })?;
        if head.text != ".export" {
            return Err(Error::UnexpectedToken {
                expected: ".export",
                token: head.text,
                line: head.line,
            });
        }
        loop {
            let tok = self.next_or_section(".data")?;
            if tok.text == ".data" {
                return Ok(());
            }
            self.ctx.export(&tok.text);
        }
    }

    /// `<label>: <declaration>` entries, up to the `.text` marker.
    fn parse_data(&mut self) -> Result<(), Error> {
        loop {
            let tok = self.next_or_section(".text")?;
            if tok.text == ".text" {
                return Ok(());
            }
            let name = match tok.text.strip_suffix(':') {
                Some(name) => name.to_string(),
                None => {
                    return Err(Error::ExpectedLabel {
                        token: tok.text,
                        line: tok.line,
                    })
                }
            };
            self.define_label(&name, &tok);

            let decl = self.next_or_eof("a data declaration")?;
            match decl.text.as_str() {
                ".array" => {
                    let count = self.next_or_eof("an array size")?;
                    let words = parse_literal(&count)? as usize;
                    self.ctx.reserve(words, count.line)?;
                }
                ".iarray" => {
                    // Values run for as long as each token sits on the
                    // same line as the one before it; the first token on
                    // a new line is the next label.
                    let mut prev = decl.line;
                    while let Some(value) = self.tokens.next_token() {
                        if value.line != prev {
                            self.tokens.unread(value);
                            break;
                        }
                        let word = parse_literal(&value)?;
                        self.ctx.push_word(word, value.line)?;
                        prev = value.line;
                    }
                }
                ".ptr" => {
                    let target = self.next_or_eof("a pointer target")?;
                    self.parse_field(&target)?;
                }
                _ => {
                    let word = parse_literal(&decl)?;
                    self.ctx.push_word(word, decl.line)?;
                }
            }
        }
    }

    /// Labels, primitive three-field instructions and pseudo-instructions,
    /// up to the end of input.
    fn parse_text(&mut self) -> Result<(), Error> {
        while let Some(tok) = self.tokens.next_token() {
            // Label
            if let Some(name) = tok.text.strip_suffix(':') {
                let name = name.to_string();
                self.define_label(&name, &tok);
                if name == "start" {
                    self.ctx.export("start");
                }
                continue;
            }

            // Pseudo-instruction
            if let Ok(pseudo) = tok.text.parse::<Pseudo>() {
                expand::expand(pseudo, &tok, &mut self.tokens, &mut self.ctx)?;
                continue;
            }

            // Primitive instruction: fields A and B, then J either on the
            // same line as B or synthesized as a fall-through to the next
            // word (and marked for relocation).
            self.parse_field(&tok)?;
            let b = self.next_or_eof("an instruction field")?;
            self.parse_field(&b)?;
            match self.tokens.next_token() {
                Some(j) if j.line == b.line => self.parse_field(&j)?,
                next => {
                    if let Some(tok) = next {
                        self.tokens.unread(tok);
                    }
                    let addr = self.ctx.cursor();
                    self.ctx.mark_relative(addr);
                    self.ctx.push_word(addr + 1, b.line)?;
                }
            }
        }

        // Scratch words for the expander, zero-initialized after the code.
        if self.ctx.temps_used() {
            let line = self.tokens.line();
            for name in [TMP, TMP2] {
                let addr = self.ctx.cursor();
                self.ctx.define(name, addr);
                self.ctx.push_word(0, line)?;
            }
        }
        Ok(())
    }

    /// Resolves one instruction field or `.ptr` target at the cursor.
    /// A `0x` literal is absolute and never relocated; anything else is
    /// a symbol (optionally `name+N`), marked for relocation and left
    /// as a pending reference when not yet defined.
    fn parse_field(&mut self, tok: &Token) -> Result<(), Error> {
        if let Some(hex) = tok.text.strip_prefix("0x") {
            let value = Word::from_str_radix(hex, 16).map_err(|_| Error::MalformedNumber {
                token: tok.text.clone(),
                line: tok.line,
            })?;
            return self.ctx.push_word(value, tok.line);
        }

        let (name, offset) = match tok.text.split_once('+') {
            Some((name, off)) => {
                let err = || Error::MalformedOffset {
                    token: tok.text.clone(),
                    line: tok.line,
                };
                let off: i64 = off.parse().map_err(|_| err())?;
                // Same word range as parse_literal; never truncated.
                if off < -(1_i64 << 31) || off > u32::MAX as i64 {
                    return Err(err());
                }
                if name.is_empty() {
                    return Err(err());
                }
                (name, off as Word)
            }
            None => (tok.text.as_str(), 0),
        };

        let addr = self.ctx.cursor();
        self.ctx.mark_relative(addr);
        let value = match self.ctx.symbol(name) {
            Some(sym) => sym.wrapping_add(offset),
            None => {
                self.ctx.reference(name, addr);
                offset
            }
        };
        self.ctx.push_word(value, tok.line)
    }

    fn define_label(&mut self, name: &str, tok: &Token) {
        let addr = self.ctx.cursor();
        if let Some(prev) = self.ctx.define(name, addr) {
            cprintln!(
                "<yellow,bold>warning</>: Re-defined label `{}` ({}); previous address 0x{:04X} is overridden",
                name,
                tok.line,
                prev
            );
        }
    }

    /// Next token inside a section whose terminating marker must still
    /// appear; end of input here means the marker is missing.
    fn next_or_section(&mut self, marker: &'static str) -> Result<Token, Error> {
        self.tokens.next_token().ok_or(Error::ExpectedSection {
            expected: marker,
            line: self.tokens.line(),
        })
    }

    fn next_or_eof(&mut self, expected: &'static str) -> Result<Token, Error> {
        self.tokens.next_token().ok_or(Error::UnexpectedEof {
            expected,
            line: self.tokens.line(),
        })
    }
}

/// Base-aware numeric parsing for data words and array sizes: decimal
/// by default (negative allowed, two's complement), hexadecimal with a
/// `0x` prefix. Out-of-range values are an error, never truncated.
fn parse_literal(tok: &Token) -> Result<Word, Error> {
    let err = || Error::MalformedNumber {
        token: tok.text.clone(),
        line: tok.line,
    };
    if let Some(hex) = tok.text.strip_prefix("0x") {
        return Word::from_str_radix(hex, 16).map_err(|_| err());
    }
    let value: i64 = tok.text.parse().map_err(|_| err())?;
    if value < -(1_i64 << 31) || value > u32::MAX as i64 {
        return Err(err());
    }
    Ok(value as Word)
}
