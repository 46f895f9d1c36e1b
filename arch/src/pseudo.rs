use strum::{Display, EnumString};

/// Convenience mnemonics accepted in the text section. None of these
/// exist in the machine; the assembler lowers each into a sequence of
/// primitive `A B J` instructions over the two scratch words `$tmp` and
/// `$tmp2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Pseudo {
    /// `add a b` : a += b
    Add,
    /// `sub a b` : a -= b
    Sub,
    /// `neg a` : a = -a
    Neg,
    /// `clr a` : a = 0
    Clr,
    /// `mov a b` : a = b
    Mov,
    /// `jmp j` : unconditional jump (clobbers $tmp)
    Jmp,
    /// `beq a b j` : jump if a == b
    Beq,
    /// `bne a b j` : jump if a != b
    Bne,
    /// `bge a b j` : jump if a >= b (signed)
    Bge,
    /// `ble a b j` : jump if a <= b (signed)
    Ble,
    /// `bgt a b j` : jump if a > b (signed)
    Bgt,
    /// `blt a b j` : jump if a < b (signed)
    Blt,
    /// `bt a j` : jump if a != 0
    Bt,
    /// `bf a j` : jump if a == 0
    Bf,
}

impl Pseudo {
    /// Number of operand tokens bound to the mnemonic. Operands must sit
    /// on the same source line as the mnemonic itself.
    pub fn arity(self) -> usize {
        match self {
            Pseudo::Neg | Pseudo::Clr | Pseudo::Jmp => 1,
            Pseudo::Add | Pseudo::Sub | Pseudo::Mov | Pseudo::Bt | Pseudo::Bf => 2,
            Pseudo::Beq | Pseudo::Bne | Pseudo::Bge | Pseudo::Ble | Pseudo::Bgt | Pseudo::Blt => 3,
        }
    }
}
