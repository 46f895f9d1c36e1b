//! Pseudo-instruction lowerings, checked by executing the assembled
//! image on the machine's own semantics: `mem[A] -= mem[B]`, jump to J
//! when the result is <= 0, three words per instruction.

use subleq_asm::{parser, Context};

struct Image {
    ctx: Context,
    mem: Vec<u32>,
}

impl Image {
    fn word(&self, symbol: &str) -> i32 {
        self.mem[self.ctx.symbol(symbol).unwrap() as usize] as i32
    }
}

/// Assembles `src`, checks it is fully local, and runs it from `start`
/// until control falls outside the image.
fn exec(src: &str) -> Image {
    let mut ctx = parser::assemble(src).unwrap();
    ctx.resolve_local();
    assert!(ctx.pending().is_empty(), "unresolved: {:?}", ctx.pending());

    let mut mem = ctx.mem().to_vec();
    let mut pc = ctx.symbol("start").unwrap() as usize;
    let mut steps = 0;
    while pc + 2 < mem.len() {
        let a = mem[pc] as usize;
        let b = mem[pc + 1] as usize;
        let j = mem[pc + 2] as usize;
        let result = mem[a].wrapping_sub(mem[b]);
        mem[a] = result;
        pc = if (result as i32) <= 0 { j } else { pc + 3 };

        steps += 1;
        assert!(steps < 10_000, "program did not halt");
    }
    Image { ctx, mem }
}

#[test]
fn clr_zeroes_a_cell() {
    let image = exec(
        "\
.export
start
.data
a: 5
.text
start:
clr a
",
    );
    assert_eq!(image.word("a"), 0);
    // One primitive instruction plus the two scratch words.
    assert_eq!(image.mem.len(), 1 + 3 + 2);
}

#[test]
fn mov_copies_a_cell() {
    let image = exec(
        "\
.export
start
.data
a: 5
b: 9
.text
start:
mov a b
",
    );
    assert_eq!(image.word("a"), 9);
    assert_eq!(image.word("b"), 9);
}

#[test]
fn add_and_sub() {
    let image = exec(
        "\
.export
start
.data
a: 7
b: 5
c: 10
d: 4
.text
start:
add a b
sub c d
",
    );
    assert_eq!(image.word("a"), 12);
    assert_eq!(image.word("c"), 6);
}

#[test]
fn add_handles_negative_operands() {
    let image = exec(
        "\
.export
start
.data
a: 3
b: -8
.text
start:
add a b
",
    );
    assert_eq!(image.word("a"), -5);
}

#[test]
fn neg_flips_the_sign() {
    let image = exec(
        "\
.export
start
.data
a: 5
b: -7
.text
start:
neg a
neg b
",
    );
    assert_eq!(image.word("a"), -5);
    assert_eq!(image.word("b"), 7);
}

#[test]
fn jmp_is_unconditional() {
    let image = exec(
        "\
.export
start
.data
r: 0
one: 1
.text
start:
jmp end
add r one
end:
",
    );
    assert_eq!(image.word("r"), 0);
}

// ----------------------------------------------------------------------------
// Conditional branches

/// Runs `<op> x y taken`; r ends up 1 when the branch was taken.
fn branch_taken(op: &str, x: i32, y: i32) -> bool {
    let image = exec(&format!(
        "\
.export
start
.data
x: {x}
y: {y}
r: 0
one: 1
.text
start:
{op} x y taken
jmp end
taken:
add r one
end:
"
    ));
    image.word("r") == 1
}

/// Runs `<op> x taken` for the single-operand tests.
fn branch_taken_1(op: &str, x: i32) -> bool {
    let image = exec(&format!(
        "\
.export
start
.data
x: {x}
r: 0
one: 1
.text
start:
{op} x taken
jmp end
taken:
add r one
end:
"
    ));
    image.word("r") == 1
}

#[test]
fn beq_branches_on_equality() {
    assert!(branch_taken("beq", 3, 3));
    assert!(branch_taken("beq", -2, -2));
    assert!(branch_taken("beq", 0, 0));
    assert!(!branch_taken("beq", 3, 4));
    assert!(!branch_taken("beq", 4, 3));
}

#[test]
fn bne_branches_on_inequality() {
    assert!(branch_taken("bne", 3, 4));
    assert!(branch_taken("bne", 4, 3));
    assert!(branch_taken("bne", -1, 1));
    assert!(!branch_taken("bne", 3, 3));
    assert!(!branch_taken("bne", -2, -2));
}

#[test]
fn ble_and_bge() {
    assert!(branch_taken("ble", 3, 4));
    assert!(branch_taken("ble", 4, 4));
    assert!(branch_taken("ble", -5, 3));
    assert!(!branch_taken("ble", 5, 4));

    assert!(branch_taken("bge", 4, 3));
    assert!(branch_taken("bge", 4, 4));
    assert!(branch_taken("bge", 3, -5));
    assert!(!branch_taken("bge", 2, 3));
}

#[test]
fn bgt_and_blt_are_strict() {
    assert!(branch_taken("bgt", 4, 3));
    assert!(!branch_taken("bgt", 3, 3));
    assert!(!branch_taken("bgt", 2, 3));

    assert!(branch_taken("blt", 2, 3));
    assert!(!branch_taken("blt", 3, 3));
    assert!(!branch_taken("blt", 4, 3));
}

#[test]
fn bt_branches_on_nonzero() {
    assert!(branch_taken_1("bt", 5));
    assert!(branch_taken_1("bt", -5));
    assert!(!branch_taken_1("bt", 0));
}

#[test]
fn bf_branches_on_zero() {
    assert!(branch_taken_1("bf", 0));
    assert!(!branch_taken_1("bf", 5));
    assert!(!branch_taken_1("bf", -5));
}

#[test]
fn operand_count_must_match_arity() {
    use subleq_asm::Error;
    assert!(matches!(
        parser::assemble(".export\n.data\na: 0\n.text\nstart:\nclr"),
        Err(Error::BadOperandCount { .. })
    ));
    assert!(matches!(
        parser::assemble(".export\n.data\na: 0\n.text\nstart:\nmov a"),
        Err(Error::BadOperandCount { .. })
    ));
    // The operand on the next line belongs to the next statement.
    assert!(matches!(
        parser::assemble(".export\n.data\na: 0\n.text\nstart:\nclr\na a"),
        Err(Error::BadOperandCount { .. })
    ));
}
