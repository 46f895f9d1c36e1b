//! Pseudo-instruction lowering.
//!
//! Every mnemonic is rewritten into primitive `A B J` instructions
//! (`mem[A] -= mem[B]`, jump to `J` when the result is <= 0) and pushed
//! back into the token stream for the section parser to consume as
//! ordinary input. Two-field instructions rely on the parser's implicit
//! third field, so every step falls through to the next word and is
//! relocated like hand-written code.
//!
//! The lowerings use the scratch words `$tmp`/`$tmp2` (appended as
//! zero-initialized data after the text section) and fresh `$L<n>`
//! labels for internal branch targets. The recurring prelude
//! `load x` (see [`Expansion::load`]) leaves `mem[x]` in `$tmp2` and
//! `-mem[x]` in `$tmp`:
//!
//! ```text
//! add a b   $tmp-=$tmp; $tmp-=b; a-=$tmp                    a += b
//! sub a b   a-=b                                            a -= b
//! clr a     a-=a                                            a = 0
//! neg a     load a; a-=a; a-=$tmp2                          a = -a
//! mov a b   $tmp-=$tmp; $tmp-=b; a-=a; a-=$tmp              a = b
//! jmp j     $tmp-=$tmp -> j                                 always taken
//! ble a b j load a; $tmp2-=b -> j                           a-b <= 0
//! bge a b j load b; $tmp2-=a -> j                           b-a <= 0
//! bgt a b j load a; $tmp2-=b -> skip; jmp j; skip:
//! blt a b j load b; $tmp2-=a -> skip; jmp j; skip:
//! beq a b j both a-b <= 0 and b-a <= 0
//! bne a b j either a-b > 0 or b-a > 0
//! bt  a j   a > 0, or a <= 0 and -a > 0
//! bf  a j   a <= 0 and -a <= 0
//! ```

use arch::pseudo::Pseudo;

use crate::context::Context;
use crate::error::Error;
use crate::lexer::{Token, Tokenizer};

/// Scratch words available to every expansion. Each lowering zeroes a
/// temporary before reading it, so their values never carry between
/// pseudo-instructions.
pub const TMP: &str = "$tmp";
pub const TMP2: &str = "$tmp2";

/// Consumes the mnemonic's operands (bound by line adjacency) and
/// injects the primitive expansion into the token stream.
pub fn expand(
    pseudo: Pseudo,
    mnemonic: &Token,
    tokens: &mut Tokenizer,
    ctx: &mut Context,
) -> Result<(), Error> {
    let mut ops = Vec::new();
    while let Some(tok) = tokens.next_token() {
        if tok.line == mnemonic.line {
            ops.push(tok);
        } else {
            tokens.unread(tok);
            break;
        }
    }
    if ops.len() != pseudo.arity() {
        return Err(Error::BadOperandCount {
            mnemonic: pseudo.to_string(),
            expected: pseudo.arity(),
            found: ops.len(),
            line: mnemonic.line,
        });
    }
    ctx.note_temps();

    let op = |i: usize| ops[i].text.as_str();
    let mut out = Expansion::new();
    match pseudo {
        Pseudo::Add => {
            let (a, b) = (op(0), op(1));
            out.inst(ctx, &[TMP, TMP]);
            out.inst(ctx, &[TMP, b]);
            out.inst(ctx, &[a, TMP]);
        }
        Pseudo::Sub => out.inst(ctx, &[op(0), op(1)]),
        Pseudo::Clr => out.inst(ctx, &[op(0), op(0)]),
        Pseudo::Neg => {
            let a = op(0);
            out.load(ctx, a);
            out.inst(ctx, &[a, a]);
            out.inst(ctx, &[a, TMP2]);
        }
        Pseudo::Mov => {
            let (a, b) = (op(0), op(1));
            out.inst(ctx, &[TMP, TMP]);
            out.inst(ctx, &[TMP, b]);
            out.inst(ctx, &[a, a]);
            out.inst(ctx, &[a, TMP]);
        }
        Pseudo::Jmp => out.inst(ctx, &[TMP, TMP, op(0)]),
        Pseudo::Ble => {
            let (a, b, j) = (op(0), op(1), op(2));
            out.load(ctx, a);
            out.inst(ctx, &[TMP2, b, j]);
        }
        Pseudo::Bge => {
            let (a, b, j) = (op(0), op(1), op(2));
            out.load(ctx, b);
            out.inst(ctx, &[TMP2, a, j]);
        }
        Pseudo::Bgt => {
            let (a, b, j) = (op(0), op(1), op(2));
            let skip = ctx.fresh_label();
            out.load(ctx, a);
            out.inst(ctx, &[TMP2, b, skip.as_str()]);
            out.inst(ctx, &[TMP, TMP, j]);
            out.label(ctx, &skip);
        }
        Pseudo::Blt => {
            let (a, b, j) = (op(0), op(1), op(2));
            let skip = ctx.fresh_label();
            out.load(ctx, b);
            out.inst(ctx, &[TMP2, a, skip.as_str()]);
            out.inst(ctx, &[TMP, TMP, j]);
            out.label(ctx, &skip);
        }
        Pseudo::Beq => {
            let (a, b, j) = (op(0), op(1), op(2));
            let second = ctx.fresh_label();
            let done = ctx.fresh_label();
            out.load(ctx, a);
            out.inst(ctx, &[TMP2, b, second.as_str()]);
            out.inst(ctx, &[TMP, TMP, done.as_str()]);
            out.label(ctx, &second);
            out.load(ctx, b);
            out.inst(ctx, &[TMP2, a, j]);
            out.label(ctx, &done);
        }
        Pseudo::Bne => {
            let (a, b, j) = (op(0), op(1), op(2));
            let second = ctx.fresh_label();
            let done = ctx.fresh_label();
            out.load(ctx, a);
            out.inst(ctx, &[TMP2, b, second.as_str()]);
            out.inst(ctx, &[TMP, TMP, j]);
            out.label(ctx, &second);
            out.load(ctx, b);
            out.inst(ctx, &[TMP2, a, done.as_str()]);
            out.inst(ctx, &[TMP, TMP, j]);
            out.label(ctx, &done);
        }
        Pseudo::Bt => {
            let (a, j) = (op(0), op(1));
            let negative = ctx.fresh_label();
            let done = ctx.fresh_label();
            out.load(ctx, a);
            out.inst(ctx, &[TMP, TMP]);
            out.inst(ctx, &[TMP2, TMP, negative.as_str()]);
            out.inst(ctx, &[TMP, TMP, j]);
            out.label(ctx, &negative);
            out.inst(ctx, &[TMP, TMP]);
            out.inst(ctx, &[TMP, a]);
            out.inst(ctx, &[TMP2, TMP2]);
            out.inst(ctx, &[TMP, TMP2, done.as_str()]);
            out.inst(ctx, &[TMP2, TMP2, j]);
            out.label(ctx, &done);
        }
        Pseudo::Bf => {
            let (a, j) = (op(0), op(1));
            let negative = ctx.fresh_label();
            let done = ctx.fresh_label();
            out.load(ctx, a);
            out.inst(ctx, &[TMP, TMP]);
            out.inst(ctx, &[TMP2, TMP, negative.as_str()]);
            out.inst(ctx, &[TMP, TMP, done.as_str()]);
            out.label(ctx, &negative);
            out.inst(ctx, &[TMP, TMP]);
            out.inst(ctx, &[TMP, a]);
            out.inst(ctx, &[TMP2, TMP2]);
            out.inst(ctx, &[TMP, TMP2, j]);
            out.label(ctx, &done);
        }
    }
    tokens.inject(out.tokens);
    Ok(())
}

// ----------------------------------------------------------------------------
// Token synthesis

struct Expansion {
    tokens: Vec<Token>,
}

impl Expansion {
    fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// One primitive instruction. All fields share a single synthetic
    /// line, so the parser binds them to one instruction and, for
    /// two-field forms, synthesizes the relocatable fall-through J.
    fn inst(&mut self, ctx: &mut Context, fields: &[&str]) {
        let line = ctx.fresh_synth_line();
        for field in fields {
            self.tokens.push(Token {
                text: (*field).to_string(),
                line,
            });
        }
    }

    fn label(&mut self, ctx: &mut Context, name: &str) {
        let line = ctx.fresh_synth_line();
        self.tokens.push(Token {
            text: format!("{}:", name),
            line,
        });
    }

    /// Copy prelude: leaves `mem[x]` in `$tmp2` and `-mem[x]` in `$tmp`.
    fn load(&mut self, ctx: &mut Context, x: &str) {
        self.inst(ctx, &[TMP, TMP]);
        self.inst(ctx, &[TMP, x]);
        self.inst(ctx, &[TMP2, TMP2]);
        self.inst(ctx, &[TMP2, TMP]);
    }
}
