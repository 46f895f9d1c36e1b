//! Relocatable object file format.
//!
//! This is the contract between the assembler and the linker. All
//! integers are little-endian u32, names are NUL-terminated byte
//! strings, and every repeated group is emitted in ascending name or
//! address order so the output is deterministic:
//!
//! ```text
//! u32                      exported_count
//! exported_count times:    name NUL, u32 address
//! u32                      pending_reference_count
//! per pending name:        name NUL, u32 count, count * u32 address
//! u32                      relocation_count
//! relocation_count times:  u32 address
//! u32                      code_word_count
//! code_word_count times:   u32 word
//! ```
//!
//! A relocation entry is the address of a word whose value is relative
//! to this object's own base; the linker shifts it by the base load
//! address. A pending reference is the address of a word still waiting
//! for an external symbol's value to be added in.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read, Write};

use crate::{Addr, Word};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectFile {
    /// Locally defined symbols made visible to other objects.
    pub exported: BTreeMap<String, Addr>,
    /// External symbol -> addresses of words awaiting its value.
    pub references: BTreeMap<String, BTreeSet<Addr>>,
    /// Addresses holding values relative to this object's base.
    pub relatives: BTreeSet<Addr>,
    /// The assembled memory image.
    pub code: Vec<Word>,
}

impl ObjectFile {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32(w, self.exported.len() as u32)?;
        for (name, addr) in &self.exported {
            write_name(w, name)?;
            write_u32(w, *addr)?;
        }

        write_u32(w, self.references.len() as u32)?;
        for (name, addrs) in &self.references {
            write_name(w, name)?;
            write_u32(w, addrs.len() as u32)?;
            for addr in addrs {
                write_u32(w, *addr)?;
            }
        }

        write_u32(w, self.relatives.len() as u32)?;
        for addr in &self.relatives {
            write_u32(w, *addr)?;
        }

        write_u32(w, self.code.len() as u32)?;
        for word in &self.code {
            write_u32(w, *word)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<ObjectFile> {
        let mut obj = ObjectFile::default();

        for _ in 0..read_u32(r)? {
            let name = read_name(r)?;
            let addr = read_u32(r)?;
            obj.exported.insert(name, addr);
        }

        for _ in 0..read_u32(r)? {
            let name = read_name(r)?;
            let count = read_u32(r)?;
            let mut addrs = BTreeSet::new();
            for _ in 0..count {
                addrs.insert(read_u32(r)?);
            }
            obj.references.insert(name, addrs);
        }

        for _ in 0..read_u32(r)? {
            obj.relatives.insert(read_u32(r)?);
        }

        for _ in 0..read_u32(r)? {
            obj.code.push(read_u32(r)?);
        }
        Ok(obj)
    }
}

fn write_u32<W: Write>(w: &mut W, value: u32) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

fn write_name<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    w.write_all(name.as_bytes())?;
    w.write_all(&[0])
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    r.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_name<R: Read>(r: &mut R) -> io::Result<String> {
    let mut bytes = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }
    String::from_utf8(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> ObjectFile {
        let mut obj = ObjectFile::default();
        obj.exported.insert("start".to_string(), 1);
        obj.references
            .insert("ext".to_string(), BTreeSet::from([4, 7]));
        obj.relatives = BTreeSet::from([1, 2, 3]);
        obj.code = vec![0, 0, 4, 0xDEAD];
        obj
    }

    #[test]
    fn round_trip() {
        let obj = sample();
        let mut bytes = Vec::new();
        obj.write_to(&mut bytes).unwrap();
        let back = ObjectFile::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(obj, back);
    }

    #[test]
    fn round_trip_empty() {
        let obj = ObjectFile::default();
        let mut bytes = Vec::new();
        obj.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 16);
        let back = ObjectFile::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(obj, back);
    }

    #[test]
    fn byte_layout() {
        let mut obj = ObjectFile::default();
        obj.exported.insert("s".to_string(), 2);
        obj.references.insert("x".to_string(), BTreeSet::from([5]));
        obj.relatives.insert(3);
        obj.code = vec![7];
        let mut bytes = Vec::new();
        obj.write_to(&mut bytes).unwrap();
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            1, 0, 0, 0,             // exported_count
            b's', 0, 2, 0, 0, 0,    // "s" -> 2
            1, 0, 0, 0,             // pending_reference_count
            b'x', 0,                // "x"
            1, 0, 0, 0,             // reference count
            5, 0, 0, 0,             // address
            1, 0, 0, 0,             // relocation_count
            3, 0, 0, 0,             // address
            1, 0, 0, 0,             // code_word_count
            7, 0, 0, 0,             // word
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn truncated_input_fails() {
        let obj = sample();
        let mut bytes = Vec::new();
        obj.write_to(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(ObjectFile::read_from(&mut Cursor::new(bytes)).is_err());
    }
}
