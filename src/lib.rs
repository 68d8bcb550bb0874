//! ccflow - token-stream and value-flow core for C/C++ static analysis.
//!
//! This library is the engine underneath a static analyzer: it
//! represents a tokenized translation unit as a mutable, bracket-linked
//! stream with stable token handles, matches a compact pattern DSL over
//! it, and attaches and queries value-flow facts (known/possible numeric
//! values, aliases, moved-from states, lifetimes, sizes) on individual
//! tokens. Simplification passes mutate the stream, value-flow passes
//! write facts, and checkers consume both through the query surface.
//!
//! # Architecture
//!
//! - **Token payload** ([`token`]): per-token lexeme, derived
//!   classification, flags, location and symbol back-references
//! - **Token stream** ([`stream`]): the arena-backed doubly-linked list
//!   with O(1) mutators and stable [`TokenId`] handles
//! - **Pattern matcher** ([`pattern`]): the allocation-free pattern DSL
//!   plus bracket-aware traversals
//! - **Expression trees** ([`ast`]): operand links with cycle guards,
//!   range/string queries and the dump formats
//! - **Value flow** ([`valueflow`]): the per-token fact store, merge
//!   rules and bounded queries
//! - **Collaborator seams** ([`symbols`], [`settings`], [`project`]):
//!   opaque symbol handles, the query-capability traits and project-file
//!   persistence
//!
//! # Quick start
//!
//! ```
//! use ccflow::{TokenStream, Value, ValueKind};
//!
//! let mut stream = TokenStream::from_words("int x = 3 ;");
//! let front = stream.front();
//! assert!(stream.pattern_match(front, "int|long %name% = %num% ;", 0)?);
//!
//! let x = stream.tok_at(front.unwrap(), 1).unwrap();
//! stream.add_value(x, Value::new(3).with_kind(ValueKind::Known));
//! assert_eq!(stream.get_value_le(x, 5, None).unwrap().intvalue, 3);
//! # Ok::<(), ccflow::CcflowError>(())
//! ```
//!
//! # Ownership
//!
//! A stream owns its tokens; tokens own their values. Bracket partners,
//! AST links and symbol back-references are non-owning handles. Each
//! stream belongs to exactly one executor; nothing here locks or blocks.

pub mod ast;
pub mod error;
pub mod pattern;
pub mod project;
pub mod settings;
pub mod stream;
pub mod symbols;
pub mod token;
pub mod valueflow;

pub use error::{CcflowError, Result};
pub use project::{ProjectFile, Suppression};
pub use settings::{EnabledGroups, Library, QuerySettings, Settings};
pub use stream::{Insert, TokenId, TokenStream};
pub use symbols::{
    FunctionRef, ScopeKind, ScopeRef, SymbolLookup, SymbolTable, TypeRef, VariableRef,
};
pub use token::{Sign, TokenData, TokenFlags, TokenKind, ValueTypeInfo};
pub use valueflow::{LifetimeKind, LifetimeScope, MoveKind, Value, ValueKind, ValueType};
