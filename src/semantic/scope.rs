//! Tabla de símbolos y pila de ámbitos.
//!
//! Los símbolos viven en una arena propiedad de [`SymbolTable`] y se
//! referencian por [`SymbolId`]. Un ámbito es un mapa de nombres a
//! índices de esa arena, por lo que cerrar un ámbito oculta sus
//! nombres sin invalidar los índices ya anotados en el AST.

use std::collections::HashMap;

use super::{Semantic, SemanticError};
use crate::{
    lex::Identifier,
    source::{Located, Location},
    types::Type,
};

/// Índice de un símbolo dentro de la arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,

    /// `defined` es falso mientras solo exista un prototipo.
    Function { defined: bool },
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: Identifier,
    pub kind: SymbolKind,
    pub typ: Type,

    /// Profundidad del ámbito de declaración, 0 para el global.
    pub depth: usize,

    pub location: Location,
}

impl Symbol {
    pub fn is_global(&self) -> bool {
        self.depth == 0
    }
}

/// Prueba de que un ámbito fue abierto y debe cerrarse.
#[must_use]
#[derive(Debug)]
pub struct ScopeHandle {
    depth: usize,
}

#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<HashMap<Identifier, SymbolId>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// Crea una tabla con únicamente el ámbito global.
    pub fn new() -> Self {
        SymbolTable {
            symbols: Vec::new(),
            scopes: vec![HashMap::new()],
        }
    }

    /// Profundidad del ámbito actual.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn enter_scope(&mut self) -> ScopeHandle {
        self.scopes.push(HashMap::new());
        ScopeHandle {
            depth: self.depth(),
        }
    }

    /// Cierra el ámbito más interno.
    ///
    /// Los ámbitos se cierran en orden inverso al de apertura y el
    /// global nunca se cierra.
    pub fn exit_scope(&mut self, handle: ScopeHandle) {
        debug_assert_eq!(handle.depth, self.depth(), "scopes must close in LIFO order");
        if self.depth() > 0 {
            self.scopes.pop();
        }
    }

    /// Declara un nombre en el ámbito actual.
    ///
    /// Sombrear un nombre de un ámbito externo es válido, no así
    /// repetirlo en el mismo ámbito.
    pub fn declare(
        &mut self,
        name: &Located<Identifier>,
        kind: SymbolKind,
        typ: Type,
    ) -> Semantic<SymbolId> {
        let depth = self.depth();
        let scope = self.current_scope();

        if scope.contains_key(name.val()) {
            return Err(Located::at(
                SemanticError::Redeclaration(name.val().clone()),
                name.location().clone(),
            ));
        }

        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            name: name.val().clone(),
            kind,
            typ,
            depth,
            location: name.location().clone(),
        });

        self.current_scope().insert(name.val().clone(), id);
        Ok(id)
    }

    /// Busca la declaración visible más cercana.
    pub fn lookup(&self, name: &Located<Identifier>) -> Semantic<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name.val()).copied())
            .ok_or_else(|| {
                Located::at(
                    SemanticError::Undeclared(name.val().clone()),
                    name.location().clone(),
                )
            })
    }

    /// Busca un nombre únicamente en el ámbito actual.
    pub fn lookup_local(&self, name: &Identifier) -> Option<SymbolId> {
        self.scopes.last().and_then(|scope| scope.get(name).copied())
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    /// Todos los símbolos declarados, incluidos los de ámbitos cerrados.
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (SymbolId(index), symbol))
    }

    fn current_scope(&mut self) -> &mut HashMap<Identifier, SymbolId> {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}
