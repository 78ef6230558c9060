use crate::error::{LinkError, MerlError};
use crate::merl::{Entry, MerlModule};
use crate::types::WORD_SIZE;
use log::debug;
use std::collections::BTreeMap;

/// Combines MERL modules into one, in command-line order
#[derive(Default)]
pub struct Linker;

impl Linker {
    pub fn new() -> Self {
        Self
    }

    /// Links `m1 (m2 (... mn))`, so the first module's code comes first
    pub fn link(&self, modules: Vec<MerlModule>) -> Result<MerlModule, LinkError> {
        let mut modules = modules.into_iter().rev();
        let last = modules.next().ok_or(LinkError::NoModules)?;
        modules.try_fold(last, |linked, module| self.link_pair(module, linked))
    }

    pub fn link_pair(&self, first: MerlModule, second: MerlModule) -> Result<MerlModule, LinkError> {
        let first_exports = first.exports();
        if let Some(name) = second
            .exports()
            .keys()
            .find(|name| first_exports.contains_key(*name))
        {
            return Err(LinkError::DuplicateExport(name.to_string()));
        }

        let offset = (first.code.len() as u32).wrapping_mul(WORD_SIZE);
        let second = relocate(second, offset)?;
        debug!(
            "linking {} words after {} words",
            second.code.len(),
            first.code.len()
        );

        let exports: BTreeMap<String, u32> = first
            .exports()
            .into_iter()
            .chain(second.exports())
            .map(|(name, location)| (name.to_string(), location))
            .collect();

        let mut linked = MerlModule::new(
            first.code.into_iter().chain(second.code).collect(),
            first.table.into_iter().chain(second.table).collect(),
        );

        let mut resolved = Vec::new();
        for (i, entry) in linked.table.iter().enumerate() {
            if let Entry::Esr { location, name } = entry {
                if let Some(&address) = exports.get(name) {
                    let index = linked
                        .index_of(*location)
                        .ok_or(MerlError::BadLocation(*location))?;
                    debug!("{} resolved to {:#x}", name, address);
                    resolved.push((i, index, *location, address));
                }
            }
        }
        for (entry, index, location, address) in resolved {
            linked.code[index] = address;
            linked.table[entry] = Entry::Rel { location };
        }

        Ok(linked)
    }
}

/// Move a module up by `offset` bytes
fn relocate(mut module: MerlModule, offset: u32) -> Result<MerlModule, MerlError> {
    let mut indices = Vec::new();
    for entry in &module.table {
        if let Entry::Rel { location } = entry {
            indices.push(
                module
                    .index_of(*location)
                    .ok_or(MerlError::BadLocation(*location))?,
            );
        }
    }
    for index in indices {
        module.code[index] = module.code[index].wrapping_add(offset);
    }
    for entry in &mut module.table {
        entry.shift(offset);
    }
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::MipsAssembler;
    use crate::types::AssemblerOptions;
    use pretty_assertions::assert_eq;

    fn module(source: &str) -> MerlModule {
        MipsAssembler::new(AssemblerOptions::default())
            .assemble(source)
            .unwrap()
    }

    #[test]
    fn test_link_resolves_both_directions() {
        let main = module(".import f\n.export g\ng: lis $5\n.word f\njr $31");
        let lib = module(".import g\n.export f\nf: jr $31\n.word g");
        let linked = Linker::new().link(vec![main, lib]).unwrap();

        assert_eq!(linked.code.len(), 5);
        // f lands right after the three words of the first module
        assert_eq!(linked.code[1], 12 + 12);
        assert_eq!(linked.code[4], 12);
        assert_eq!(
            linked.table,
            vec![
                Entry::Rel { location: 16 },
                Entry::Esd {
                    location: 12,
                    name: "g".to_string()
                },
                Entry::Rel { location: 28 },
                Entry::Esd {
                    location: 24,
                    name: "f".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_second_module_is_relocated() {
        let first = module("jr $31\njr $31");
        let second = module("lis $5\n.word here\nhere: jr $31");
        let linked = Linker::new().link(vec![first, second]).unwrap();
        assert_eq!(linked.code[3], 12 + 8 + 8);
        assert_eq!(linked.table, vec![Entry::Rel { location: 12 + 8 + 4 }]);
    }

    #[test]
    fn test_unresolved_imports_stay_external() {
        let linked = Linker::new()
            .link(vec![module(".import print\n.word print"), module("jr $31")])
            .unwrap();
        assert_eq!(linked.imports().collect::<Vec<_>>(), vec![("print", 12)]);
    }

    #[test]
    fn test_link_errors() {
        assert_eq!(Linker::new().link(Vec::new()), Err(LinkError::NoModules));
        let a = module(".export f\nf: jr $31");
        assert_eq!(
            Linker::new().link(vec![a.clone(), a]),
            Err(LinkError::DuplicateExport("f".to_string()))
        );
    }

    #[test]
    fn test_three_modules_keep_order() {
        let linked = Linker::new()
            .link(vec![
                module(".export a\na: jr $31"),
                module(".export b\nb: jr $31"),
                module(".import a\n.import b\n.word a\n.word b"),
            ])
            .unwrap();
        assert_eq!(&linked.code[2..], &[12, 16]);
        assert_eq!(linked.exports().get("b"), Some(&16));
    }
}
