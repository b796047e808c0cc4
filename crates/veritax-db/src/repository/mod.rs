//! # Repository Implementations
//!
//! One repository per stored document kind:
//!
//! - [`snapshot`] - Imported order snapshots, keyed by internal order id
//! - [`partner_config`] - Partner configuration documents
//!
//! Repositories hold a cloned pool handle (cheap, Arc inside) and expose
//! async document-level operations. SQL stays inside this module; callers
//! see domain types only.

pub mod partner_config;
pub mod snapshot;
