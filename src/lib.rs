#![warn(clippy::panic)]
#![warn(clippy::expect_used)]

//! Koral translates corpus query languages into one shared, serializable
//! intermediate representation, the KoralQuery graph.
//!
//! Queries can be written in several independent languages: the ANNIS graph
//! query language for linguistic trees and relations ([`annis`]), the COSMAS
//! proximity search language ([`cosmas`]), the standard retrieval language CQL
//! ([`cql`]) and a simplified sequence language ([`simple`]). Each front end
//! consumes a concrete syntax tree produced by an external parser and emits
//! the same canonical graph model ([`koral`]), wrapped into a request
//! envelope. The downstream search engine only ever sees the canonical graph.
//!
//! Lexing and parsing of the raw query text is *not* part of this crate: a
//! grammar-specific parser front end builds the [`cst::CstNode`] tree that the
//! translators walk.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate lazy_static;

pub mod annis;
pub mod cosmas;
pub mod cql;
pub mod cst;
pub mod errors;
pub mod koral;
pub mod reference;
pub mod simple;

pub use crate::koral::QueryRequest;
