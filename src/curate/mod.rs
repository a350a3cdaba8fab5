//! Playlist generation and optimization

pub mod config;
pub mod generator;
pub mod optimizer;

pub use config::{CurateConfig, OptimizeConfig};
pub use generator::PlaylistGenerator;
pub use optimizer::{FeatureOptimizer, OptimizeOutcome, OptimizeStatus};
