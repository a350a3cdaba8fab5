//! Catalog query construction
//!
//! Turns user tags into structured predicates that any catalog can evaluate.

mod predicate;
mod tags;

pub use predicate::{Comparator, Predicate};
pub use tags::{MoodTag, TagTranslator, TranslatedTags};
