//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `position`: per-key two-stream position multiset (C1).
//! - `text`: ASCII cleaning/tokenization pipeline (C2).
//! - `sampler`: random word generation and in/out-of-corpus sampling (C3).
//! - `hash_table`: open-addressed associative array with linear probing (C4).
//! - `ternary`: ternary search tree associative array (C5).
//! - `patricia`: bit-level PATRICIA trie associative array (C6).
//! - `structure`: the shared `AssociativeArray` contract and the
//!   `StructureKind` tagged-variant dispatcher.
//! - `harness`: the experiment protocol (C7) — random, single-text, and
//!   similarity runs.
//! - `corpus`: corpus directory/file loading built on `text`.
//! - `output`: CSV sinks for each experiment type.
//! - `error`: the harness's fallible-boundary error type.
//!
//! Public API kept stable by re-exporting the frequently used types.

pub mod corpus;
pub mod error;
pub mod hash_table;
pub mod harness;
pub mod output;
pub mod patricia;
pub mod position;
pub mod sampler;
pub mod structure;
pub mod ternary;
pub mod text;

pub use error::{HarnessError, Result};
pub use hash_table::HashTable;
pub use patricia::PatriciaTree;
pub use position::PositionMultiset;
pub use structure::{AssociativeArray, StructureKind};
pub use ternary::TernaryTree;
