use std::collections::{BTreeMap, BTreeSet};

use arch::obj::ObjectFile;
use arch::{Addr, Word, MEM_WORDS};
use indexmap::IndexMap;

use crate::error::Error;
use crate::lexer::Line;

/// The full state of one assembly run: memory image, symbol table,
/// export set, pending references and relocation markers. Created
/// empty, filled by the section parser, mutated once by the local
/// resolution pass, then consumed read-only by the emitter.
pub struct Context {
    mem: Vec<Word>,
    symbols: IndexMap<String, Addr>,
    exported: BTreeSet<String>,
    references: BTreeMap<String, BTreeSet<Addr>>,
    relatives: BTreeSet<Addr>,
    synth_lines: usize,
    labels: usize,
    temps_used: bool,
}

impl Context {
    pub fn new() -> Self {
        Self {
            mem: Vec::new(),
            symbols: IndexMap::new(),
            exported: BTreeSet::new(),
            references: BTreeMap::new(),
            relatives: BTreeSet::new(),
            synth_lines: 0,
            labels: 0,
            temps_used: false,
        }
    }

    /// The current write cursor, which is also the address the next
    /// word will be placed at.
    pub fn cursor(&self) -> Addr {
        self.mem.len() as Addr
    }

    pub fn push_word(&mut self, word: Word, line: Line) -> Result<(), Error> {
        if self.mem.len() >= MEM_WORDS {
            return Err(Error::ImageOverflow {
                limit: MEM_WORDS,
                line,
            });
        }
        self.mem.push(word);
        Ok(())
    }

    /// Reserves `count` uninitialized (zero) words.
    pub fn reserve(&mut self, count: usize, line: Line) -> Result<(), Error> {
        if self.mem.len() + count > MEM_WORDS {
            return Err(Error::ImageOverflow {
                limit: MEM_WORDS,
                line,
            });
        }
        self.mem.resize(self.mem.len() + count, 0);
        Ok(())
    }

    /// Binds a symbol, returning the previous address if it was already
    /// defined (last definition wins).
    pub fn define(&mut self, name: &str, addr: Addr) -> Option<Addr> {
        self.symbols.insert(name.to_string(), addr)
    }

    pub fn export(&mut self, name: &str) {
        self.exported.insert(name.to_string());
    }

    /// Records that the word at `addr` still needs `name`'s address
    /// added in.
    pub fn reference(&mut self, name: &str, addr: Addr) {
        self.references.entry(name.to_string()).or_default().insert(addr);
    }

    /// Marks the word at `addr` as holding a locally-relative value.
    pub fn mark_relative(&mut self, addr: Addr) {
        self.relatives.insert(addr);
    }

    pub fn symbol(&self, name: &str) -> Option<Addr> {
        self.symbols.get(name).copied()
    }

    pub fn symbols(&self) -> &IndexMap<String, Addr> {
        &self.symbols
    }

    pub fn pending(&self) -> &BTreeMap<String, BTreeSet<Addr>> {
        &self.references
    }

    pub fn relatives(&self) -> &BTreeSet<Addr> {
        &self.relatives
    }

    pub fn mem(&self) -> &[Word] {
        &self.mem
    }

    // ------------------------------------------------------------------------
    // Expansion support

    /// A fresh line tag, so each injected primitive instruction is seen
    /// as sitting on its own line by the adjacency checks.
    pub fn fresh_synth_line(&mut self) -> Line {
        self.synth_lines += 1;
        Line::Synth(self.synth_lines)
    }

    /// A fresh internal branch-target label for one expansion.
    pub fn fresh_label(&mut self) -> String {
        self.labels += 1;
        format!("$L{}", self.labels)
    }

    /// Called once per expansion; the parser appends the `$tmp`/`$tmp2`
    /// words after the text section when this has been set.
    pub fn note_temps(&mut self) {
        self.temps_used = true;
    }

    pub fn temps_used(&self) -> bool {
        self.temps_used
    }

    // ------------------------------------------------------------------------
    // Resolution and emission

    /// One pass over the pending references: every name now present in
    /// the symbol table has its address added into each waiting word
    /// (added, not stored, so `name+N` offsets survive) and is dropped
    /// from the pending set. Names still unknown are left for the
    /// linker. One pass suffices because the whole file has been
    /// scanned by the time this runs.
    pub fn resolve_local(&mut self) {
        let mut solved = Vec::new();
        for (name, addrs) in &self.references {
            if let Some(&sym) = self.symbols.get(name) {
                solved.push(name.clone());
                for &addr in addrs {
                    let word = &mut self.mem[addr as usize];
                    *word = word.wrapping_add(sym);
                }
            }
        }
        for name in solved {
            self.references.remove(&name);
        }
    }

    /// Final object for the emitter. Exporting a name that was never
    /// defined locally is an error; the legacy behavior silently wrote
    /// address zero.
    pub fn into_object(self) -> Result<ObjectFile, Error> {
        let mut exported = BTreeMap::new();
        for name in &self.exported {
            match self.symbols.get(name) {
                Some(&addr) => {
                    exported.insert(name.clone(), addr);
                }
                None => return Err(Error::UndefinedExport(name.clone())),
            }
        }
        Ok(ObjectFile {
            exported,
            references: self.references,
            relatives: self.relatives,
            code: self.mem,
        })
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
