//! # clove-syntax
//!
//! A grammar-driven lexical scanner and the TextMate-shaped grammar of the clove language.
//!
//! The pieces, leaf first:
//!
//! - [grammar]: the raw grammar document, its schema, and the compiled [Repository] of rules
//!   that the scanner consults by name.
//! - [scanner]: the line-oriented driver with its matcher, capture resolver and scope stack.
//!   A scan returns scoped tokens plus an end state to resume from.
//! - [clove]: the built-in clove grammar, declared in Rust and serialized as wire JSON.
//! - [snapshot]: renders scans in the tmgrammar-snap text format and checks fixtures
//!   against stored snapshots.
//! - [config]: scanner and snapshot settings, layered over embedded defaults.
//!
//! ## Testing
//!
//! Token-level tests use the fluent assertions in [testing](crate::testing).
//!
//! [Repository]: grammar::Repository

pub mod clove;
pub mod config;
pub mod grammar;
pub mod scanner;
pub mod snapshot;
pub mod testing;

pub use grammar::{GrammarError, RawGrammar, RawRule, Repository};
pub use scanner::{Diagnostic, ScanOutput, Scanner, ScopeStack, Token};
