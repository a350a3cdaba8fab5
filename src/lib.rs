//! Playlist Curator - mood-driven playlist generation
//!
//! This library builds playlists from a catalog of tracks tagged with mood
//! features (energy, tempo, valence, ...) and a genre. Playlists are
//! generated from symbolic tags through a relaxing catalog search, and can
//! later be nudged toward a mood by the feature optimizer.

pub mod catalog;
pub mod curate;
pub mod error;
pub mod model;
pub mod query;
pub mod search;

pub use curate::{CurateConfig, FeatureOptimizer, OptimizeConfig, PlaylistGenerator};
pub use error::{CurateError, Result};
