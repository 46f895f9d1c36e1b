pub mod obj;
pub mod pseudo;

/// One machine word. The SUBLEQ machine has a single address space of
/// words; instructions occupy three consecutive words (A, B, J) meaning
/// `mem[A] -= mem[B]; if result <= 0 { jump J }`.
pub type Word = u32;

/// A word index into the address space.
pub type Addr = u32;

/// Address-space size in words. Bounds both code and data of one
/// assembled object.
pub const MEM_WORDS: usize = 0x2000;
