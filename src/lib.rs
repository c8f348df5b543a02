//! Compilador para uC, un subconjunto de C.
//!
//! # Front end
//! Cada programa deriva de un único archivo de código fuente.
//! Este archivo se somete primero a análisis léxico en [`lex`], de
//! lo cual se obtiene un flujo de tokens. El flujo de tokens se
//! dispone en un AST por medio de análisis sintáctico en [`parse`].
//! El árbol sintáctico es verificado y anotado con tipos y símbolos
//! por análisis semántico en [`semantic`], con base en las reglas de
//! [`types`].
//!
//! # Representación intermedia
//! Un árbol sin errores se traduce en [`ir`] a código de tres
//! direcciones organizado en bloques básicos. La IR es el contrato
//! de salida de este crate; la emisión de código máquina queda a
//! cargo de un back end externo.
//!
//! Las fases se encadenan en [`compile`]. Los errores de usuario se
//! reportan en orden por medio de [`error::Diagnostics`].

#[macro_use]
mod macros;

pub mod compile;
pub mod error;
pub mod ir;
pub mod lex;
pub mod parse;
pub mod semantic;
pub mod source;
pub mod types;
