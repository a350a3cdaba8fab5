//! Catalog search with progressive relaxation

mod relaxation;

pub use relaxation::{RelaxationSearch, SearchOutcome};
