//! docqa-core
//!
//! Domain types, the error enum, collaborator traits, configuration and the
//! paragraph/sentence chunker shared by the rest of the workspace.

#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod error;
pub mod sources;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
