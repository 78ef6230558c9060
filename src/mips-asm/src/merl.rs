//! MIPS Executable Relocatable Linkable object modules
//!
//! Layout, all words big-endian:
//!
//! ```text
//! 0x10000002          cookie (beq $0, $0, 2 skips the header when run raw)
//! end of module       byte length of the whole module
//! end of code         byte offset where the symbol table starts
//! code words...
//! table entries...
//! ```
//!
//! Locations in table entries are byte offsets from the start of the
//! module, so the first code word lives at [`HEADER_SIZE`].

use crate::error::MerlError;
use crate::types::WORD_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub const MERL_COOKIE: u32 = 0x1000_0002;
pub const HEADER_SIZE: u32 = 3 * WORD_SIZE;

const REL_FORMAT: u32 = 0x01;
const ESR_FORMAT: u32 = 0x11;
const ESD_FORMAT: u32 = 0x05;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    /// The word at `location` holds a module-relative address
    Rel { location: u32 },
    /// The word at `location` wants the address of an imported symbol
    Esr { location: u32, name: String },
    /// `name` is exported at `location`
    Esd { location: u32, name: String },
}

impl Entry {
    pub fn location(&self) -> u32 {
        match self {
            Entry::Rel { location } | Entry::Esr { location, .. } | Entry::Esd { location, .. } => {
                *location
            }
        }
    }

    fn location_mut(&mut self) -> &mut u32 {
        match self {
            Entry::Rel { location } | Entry::Esr { location, .. } | Entry::Esd { location, .. } => {
                location
            }
        }
    }

    /// Size of the entry in words
    fn words(&self) -> u32 {
        match self {
            Entry::Rel { .. } => 2,
            Entry::Esr { name, .. } | Entry::Esd { name, .. } => 3 + name.len() as u32,
        }
    }

    pub(crate) fn shift(&mut self, offset: u32) {
        let location = self.location_mut();
        *location = location.wrapping_add(offset);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerlModule {
    pub code: Vec<u32>,
    pub table: Vec<Entry>,
}

impl MerlModule {
    pub fn new(code: Vec<u32>, table: Vec<Entry>) -> Self {
        Self { code, table }
    }

    pub fn end_code(&self) -> u32 {
        HEADER_SIZE + self.code.len() as u32 * WORD_SIZE
    }

    pub fn end_module(&self) -> u32 {
        self.end_code() + self.table.iter().map(Entry::words).sum::<u32>() * WORD_SIZE
    }

    /// Code index of the word at a module location
    pub fn index_of(&self, location: u32) -> Option<usize> {
        if location < HEADER_SIZE || location % WORD_SIZE != 0 || location >= self.end_code() {
            return None;
        }
        Some(((location - HEADER_SIZE) / WORD_SIZE) as usize)
    }

    pub fn exports(&self) -> BTreeMap<&str, u32> {
        self.table
            .iter()
            .filter_map(|entry| match entry {
                Entry::Esd { location, name } => Some((name.as_str(), *location)),
                _ => None,
            })
            .collect()
    }

    pub fn imports(&self) -> impl Iterator<Item = (&str, u32)> {
        self.table.iter().filter_map(|entry| match entry {
            Entry::Esr { location, name } => Some((name.as_str(), *location)),
            _ => None,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut words = vec![MERL_COOKIE, self.end_module(), self.end_code()];
        words.extend_from_slice(&self.code);
        for entry in &self.table {
            match entry {
                Entry::Rel { location } => words.extend([REL_FORMAT, *location]),
                Entry::Esr { location, name } | Entry::Esd { location, name } => {
                    let format = if matches!(entry, Entry::Esr { .. }) {
                        ESR_FORMAT
                    } else {
                        ESD_FORMAT
                    };
                    words.extend([format, *location, name.len() as u32]);
                    words.extend(name.bytes().map(u32::from));
                }
            }
        }
        words_to_bytes(&words)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MerlError> {
        if bytes.len() % WORD_SIZE as usize != 0 {
            return Err(MerlError::Unaligned(bytes.len()));
        }
        let words: Vec<u32> = bytes
            .chunks_exact(WORD_SIZE as usize)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let &[cookie, end_module, end_code, ..] = words.as_slice() else {
            return Err(MerlError::Truncated);
        };
        if cookie != MERL_COOKIE {
            return Err(MerlError::BadCookie(cookie));
        }
        if end_module as usize != bytes.len()
            || end_code < HEADER_SIZE
            || end_code > end_module
            || end_code % WORD_SIZE != 0
        {
            return Err(MerlError::BadHeader {
                end_code,
                end_module,
                length: bytes.len(),
            });
        }

        let code_end = (end_code / WORD_SIZE) as usize;
        let module = MerlModule::new(words[3..code_end].to_vec(), Vec::new());
        let mut table = Vec::new();
        let mut i = code_end;
        while i < words.len() {
            let at = |k: usize| words.get(i + k).copied().ok_or(MerlError::TruncatedEntry(i * 4));
            let entry = match at(0)? {
                REL_FORMAT => {
                    let location = at(1)?;
                    module.index_of(location).ok_or(MerlError::BadLocation(location))?;
                    Entry::Rel { location }
                }
                format @ (ESR_FORMAT | ESD_FORMAT) => {
                    let location = at(1)?;
                    let length = at(2)? as usize;
                    let mut name = String::with_capacity(length.min(words.len()));
                    for k in 0..length {
                        let c = at(3 + k)?;
                        match u8::try_from(c) {
                            Ok(b) if b.is_ascii() => name.push(b as char),
                            _ => return Err(MerlError::BadName(c)),
                        }
                    }
                    if format == ESR_FORMAT {
                        module.index_of(location).ok_or(MerlError::BadLocation(location))?;
                        Entry::Esr { location, name }
                    } else {
                        if location < HEADER_SIZE || location > end_code {
                            return Err(MerlError::BadLocation(location));
                        }
                        Entry::Esd { location, name }
                    }
                }
                format => {
                    return Err(MerlError::UnknownEntry {
                        format,
                        offset: i * 4,
                    })
                }
            };
            i += entry.words() as usize;
            table.push(entry);
        }

        Ok(MerlModule { table, ..module })
    }

    /// Human-readable listing of the header, code and table
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "cookie      {:#010x}", MERL_COOKIE);
        let _ = writeln!(out, "end module  {:#010x}", self.end_module());
        let _ = writeln!(out, "end code    {:#010x}", self.end_code());
        for (i, word) in self.code.iter().enumerate() {
            let _ = writeln!(out, "{:#010x}  {:#010x}", HEADER_SIZE as usize + i * 4, word);
        }
        for entry in &self.table {
            let _ = match entry {
                Entry::Rel { location } => writeln!(out, "REL {:#010x}", location),
                Entry::Esr { location, name } => writeln!(out, "ESR {:#010x} {}", location, name),
                Entry::Esd { location, name } => writeln!(out, "ESD {:#010x} {}", location, name),
            };
        }
        out
    }
}

pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}
