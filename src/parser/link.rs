//! Struct reference linking
//!
//! Parsing leaves every struct-typed declaration unresolved. [`StructTable`]
//! indexes the struct definitions of a module and can then fill in each
//! declaration's [`StructReference::resolved`] handle. Nothing in the parser
//! depends on this pass having run.

use crate::parser::ast::*;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Struct definitions of a module, addressed by [`StructId`]
#[derive(Debug, Default)]
pub struct StructTable<'a> {
    structs: Vec<&'a StructNode>,
    by_name: FxHashMap<&'a str, StructId>,
}

impl<'a> StructTable<'a> {
    /// Index every struct defined anywhere in `module`.
    ///
    /// A later definition with an already-seen name shadows the earlier one.
    pub fn collect(module: &'a ModuleNode) -> Self {
        let mut table = Self::default();
        walk(NodeRef::Module(module), &mut |node| {
            if let NodeRef::Struct(definition) = node {
                let id = StructId(table.structs.len());
                table.structs.push(definition);
                table.by_name.insert(definition.name.as_str(), id);
            }
        });
        table
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    pub fn get(&self, id: StructId) -> Option<&'a StructNode> {
        self.structs.get(id.0).copied()
    }

    pub fn lookup(&self, name: &str) -> Option<StructId> {
        self.by_name.get(name).copied()
    }

    /// Resolve the struct references in `module`.
    ///
    /// References that are already resolved keep their handle. Returns the
    /// names that matched no struct, in tree order.
    pub fn link(&self, module: &ModuleNode) -> Vec<String> {
        let mut unresolved = Vec::new();
        let mut linked = 0usize;

        walk(NodeRef::Module(module), &mut |node| {
            let NodeRef::Declaration(declaration) = node else {
                return;
            };
            let Some(reference) = declaration.struct_reference() else {
                return;
            };
            match self.lookup(&reference.name) {
                Some(id) => {
                    // Already-set handles stay as they are
                    let _ = reference.resolved.set(id);
                    linked += 1;
                }
                None => unresolved.push(reference.name.clone()),
            }
        });

        debug!(linked, unresolved = unresolved.len(), "linked struct references");
        unresolved
    }
}

/// Pre-order walk over a node and all of its descendants
fn walk<'a>(node: NodeRef<'a>, visit: &mut impl FnMut(NodeRef<'a>)) {
    visit(node);
    for child in node.children() {
        walk(child, visit);
    }
}
