//! Declaration containers.
//!
//! A `ModuleBuilder` owns a declaration arena while a source unit is being
//! compiled. Names are reserved (slot allocated, body pending) before their
//! bodies are lowered, so references into a declaration from its own body,
//! or from a sibling declared in the same file, resolve to a stable slot.
//! `finish` checks every slot was filled and hands back an immutable `Module`.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::FrontendError;
use crate::ir::{Decl, DeclRef, Ty, Variant};

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub imports: IndexMap<String, Arc<Module>>,
    decls: IndexMap<String, Decl>,
}

impl Module {
    pub fn get(&self, name: &str) -> Option<&Decl> {
        self.decls.get(name)
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.decls.get_index_of(name)
    }

    pub fn decls(&self) -> impl Iterator<Item = (&str, &Decl)> {
        self.decls.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// The module a reference made from inside `self` points into.
    pub fn owner_of(&self, r: &DeclRef) -> Option<&Module> {
        match &r.module {
            None => Some(self),
            Some(m) => self.imports.get(m).map(|m| m.as_ref()),
        }
    }

    /// Follow a reference made from inside `self` to its declaration, together
    /// with the module that owns it (further references resolve from there).
    pub fn resolve(&self, r: &DeclRef) -> Option<(&Module, &Decl)> {
        let owner = self.owner_of(r)?;
        let (name, decl) = owner.decls.get_index(r.slot)?;
        (name == &r.name).then_some((owner, decl))
    }

    /// Look up `Name` or `module.Name`.
    pub fn lookup(&self, path: &str) -> Option<DeclRef> {
        let (module, name) = match path.split_once('.') {
            Some((m, n)) => (Some(m), n),
            None => (None, path),
        };
        let owner = match module {
            Some(m) => self.imports.get(m)?.as_ref(),
            None => self,
        };
        let slot = owner.slot_of(name)?;
        Some(DeclRef {
            module: module.map(str::to_owned),
            name: name.to_owned(),
            slot,
        })
    }

    /// A `Ty::Ref` for a local declaration.
    pub fn ty(&self, name: &str) -> Option<Ty> {
        self.lookup(name).map(Ty::Ref)
    }

    /// The variant a `VariantOf` tag stands for.
    pub fn variant(&self, parent: &str, index: usize) -> Option<&Variant> {
        match self.decls.get(parent)? {
            Decl::SumType(variants) => variants.get(index),
            _ => None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDER
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug)]
pub struct ModuleBuilder {
    name: String,
    imports: IndexMap<String, Arc<Module>>,
    slots: IndexMap<String, Option<Decl>>, // None = reserved, body pending
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: IndexMap::new(),
            slots: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn import(&mut self, module: Arc<Module>) -> Result<(), FrontendError> {
        if self.imports.contains_key(&module.name) {
            return Err(FrontendError::Duplicate { what: "import", name: module.name.clone() });
        }
        self.imports.insert(module.name.clone(), module);
        Ok(())
    }

    /// Allocate the slot for `name`. The body is filled by `define`.
    pub fn reserve(&mut self, name: &str) -> Result<usize, FrontendError> {
        if self.slots.contains_key(name) {
            return Err(FrontendError::Duplicate { what: "declaration", name: name.to_owned() });
        }
        let (slot, _) = self.slots.insert_full(name.to_owned(), None);
        Ok(slot)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        matches!(self.slots.get(name), Some(None))
    }

    pub fn define(&mut self, name: &str, decl: Decl) -> Result<(), FrontendError> {
        match self.slots.get_mut(name) {
            Some(slot) if slot.is_none() => {
                debug!(module = %self.name, decl = name, kind = decl.kind(), "defined");
                *slot = Some(decl);
                Ok(())
            }
            Some(_) => Err(FrontendError::Duplicate { what: "declaration", name: name.to_owned() }),
            None => Err(FrontendError::unresolved(name)),
        }
    }

    /// Number of slots, used as a rollback mark.
    pub(crate) fn mark(&self) -> usize {
        self.slots.len()
    }

    /// Drop every slot allocated since `mark`.
    pub(crate) fn rollback(&mut self, mark: usize) {
        self.slots.truncate(mark);
    }

    /// Resolve a one- or two-segment path. Deeper paths are not supported.
    pub fn resolve_path(&self, path: &[String]) -> Result<DeclRef, FrontendError> {
        match path {
            [name] => {
                let slot = self.slots.get_index_of(name.as_str())
                    .ok_or_else(|| FrontendError::unresolved(name.as_str()))?;
                Ok(DeclRef { module: None, name: name.clone(), slot })
            }
            [module, name] => {
                let Some(imported) = self.imports.get(module.as_str()) else {
                    return Err(FrontendError::unresolved(format!("{module}.{name}")));
                };
                let slot = imported.slot_of(name)
                    .ok_or_else(|| FrontendError::unresolved(format!("{module}.{name}")))?;
                Ok(DeclRef { module: Some(module.clone()), name: name.clone(), slot })
            }
            _ => Err(FrontendError::Unsupported(format!(
                "reference `{}` goes through more than one import",
                path.join(".")
            ))),
        }
    }

    pub fn finish(self) -> Result<Module, FrontendError> {
        let mut decls = IndexMap::with_capacity(self.slots.len());
        for (name, slot) in self.slots {
            match slot {
                Some(decl) => { decls.insert(name, decl); }
                None => return Err(FrontendError::unresolved(name)),
            }
        }
        let module = Module { name: self.name, imports: self.imports, decls };
        check_alias_cycles(&module)?;
        debug!(module = %module.name, decls = module.len(), "module finished");
        Ok(module)
    }
}

/// An alias must reach a constructor before it reaches itself again.
fn check_alias_cycles(module: &Module) -> Result<(), FrontendError> {
    for (start, decl) in module.decls() {
        let Decl::Alias(ty) = decl else { continue };
        let mut seen = vec![start.to_owned()];
        let mut cur = ty.strip_annot();
        while let Ty::Ref(r) = cur {
            if r.module.is_some() {
                break; // imports were finished already
            }
            if seen.contains(&r.name) {
                return Err(FrontendError::AliasCycle(start.to_owned()));
            }
            seen.push(r.name.clone());
            match module.get(&r.name) {
                Some(Decl::Alias(next)) => cur = next.strip_annot(),
                _ => break,
            }
        }
    }
    Ok(())
}
