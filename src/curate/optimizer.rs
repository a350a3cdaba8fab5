//! Feature optimizer
//!
//! Moves a playlist's average for one feature in a chosen direction by
//! swapping its most extreme member for a random better-fitting catalog
//! track, one replacement per iteration, until the average is sufficient,
//! the replacement budget is spent, or no better candidate exists.

use super::config::OptimizeConfig;
use crate::catalog::{Catalog, PlaylistStore};
use crate::error::Result;
use crate::model::{Direction, Feature, Membership, Playlist, Track, TrackId};
use crate::query::{Comparator, Predicate};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

/// Why the optimizer stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptimizeStatus {
    /// The average meets the feature's threshold
    Sufficient,
    /// The replacement budget was used up first
    BudgetExhausted,
    /// No catalog track would move the average further
    Stalled,
}

/// Result of an optimization run
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeOutcome {
    pub status: OptimizeStatus,
    pub replacements: usize,
    pub budget: usize,
    pub initial_average: f64,
    pub final_average: f64,
    /// Sufficiency after the loop ended
    pub sufficient: bool,
}

/// Iteratively replaces members to push a feature average up or down
pub struct FeatureOptimizer<R: Rng> {
    config: OptimizeConfig,
    rng: R,
}

impl<R: Rng> FeatureOptimizer<R> {
    pub fn new(config: OptimizeConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Optimize `playlist` in place, saving it after every replacement
    pub fn optimize<L>(
        &mut self,
        library: &mut L,
        playlist: &mut Playlist,
        feature: Feature,
        direction: Direction,
    ) -> Result<OptimizeOutcome>
    where
        L: Catalog + PlaylistStore,
    {
        let budget = self.config.budget(playlist.len());
        let initial_average = playlist.average(feature)?;
        let mut replacements = 0;

        log::info!(
            "Optimizing {:?}: {} {:?} from {:.3}, up to {} replacement(s)",
            playlist.name,
            feature,
            direction,
            initial_average,
            budget
        );

        let status = loop {
            if playlist.is_sufficient(feature, direction)? {
                break OptimizeStatus::Sufficient;
            }
            if replacements >= budget {
                break OptimizeStatus::BudgetExhausted;
            }

            let candidates = better_candidates(&*library, playlist, feature, direction)?;
            let Some(pick) = candidates.choose(&mut self.rng) else {
                log::info!("Playlist {:?} is already optimized", playlist.name);
                break OptimizeStatus::Stalled;
            };
            let pick = pick.clone();

            let Some(victim) = weakest_member(playlist, feature, direction) else {
                break OptimizeStatus::Stalled;
            };

            log::debug!(
                "Replacing {} ({:.3}) with {} ({:.3})",
                victim,
                playlist_value(playlist, &victim, feature),
                pick.id,
                pick.feature(feature)
            );
            playlist.add(pick);
            playlist.delete(&victim)?;
            library.save_playlist(playlist)?;
            replacements += 1;
        };

        library.save_playlist(playlist)?;
        let final_average = playlist.average(feature)?;
        let outcome = OptimizeOutcome {
            status,
            replacements,
            budget,
            initial_average,
            final_average,
            sufficient: feature.meets(final_average, direction),
        };

        log::info!(
            "Optimization finished ({:?}): {} replacement(s), {} {:.3} -> {:.3}",
            outcome.status,
            replacements,
            feature,
            initial_average,
            final_average
        );
        Ok(outcome)
    }
}

/// Catalog tracks that would move the average in `direction`
///
/// Limited to the playlist's active genres and to tracks not already in it.
fn better_candidates<C: Catalog + ?Sized>(
    catalog: &C,
    playlist: &Playlist,
    feature: Feature,
    direction: Direction,
) -> Result<Vec<Track>> {
    let average = playlist.average(feature)?;
    let op = match direction {
        Direction::Increase => Comparator::Greater,
        Direction::Decrease => Comparator::Less,
    };
    let genres = playlist.genres();

    let candidates: Vec<Track> = catalog
        .query(&Predicate::compare(feature, op, average))?
        .into_iter()
        .filter(|t| genres.contains(&t.genre) && !playlist.contains(&t.id))
        .collect();
    log::debug!("{} candidate(s) beyond {} {:.3}", candidates.len(), feature, average);
    Ok(candidates)
}

/// Member pulling hardest against `direction`
///
/// Ties go to the earliest stored member when increasing and the latest when
/// decreasing.
fn weakest_member(playlist: &Playlist, feature: Feature, direction: Direction) -> Option<TrackId> {
    let members = playlist.memberships().iter();
    let by_value = |a: &&Membership, b: &&Membership| {
        a.track.feature(feature).total_cmp(&b.track.feature(feature))
    };
    let weakest = match direction {
        Direction::Increase => members.min_by(by_value),
        Direction::Decrease => members.max_by(by_value),
    };
    weakest.map(|m| m.track.id.clone())
}

fn playlist_value(playlist: &Playlist, id: &TrackId, feature: Feature) -> f64 {
    playlist
        .memberships()
        .iter()
        .find(|m| &m.track.id == id)
        .map(|m| m.track.feature(feature))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryLibrary;
    use crate::error::CurateError;
    use crate::model::{Features, Genre};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn track(id: &str, genre: Genre, energy: f64) -> Track {
        Track {
            id: TrackId::new(id),
            title: format!("Song {}", id),
            artist: String::new(),
            genre,
            features: Features {
                energy,
                ..Features::default()
            },
        }
    }

    fn optimizer(percent: f64) -> FeatureOptimizer<StdRng> {
        FeatureOptimizer::new(
            OptimizeConfig::new().with_percent(percent),
            StdRng::seed_from_u64(11),
        )
    }

    /// Eight quiet rock tracks in a playlist, plus `loud` loud tracks in the catalog
    fn setup(loud: usize, loud_genre: Genre) -> (MemoryLibrary, Playlist) {
        let quiet: Vec<Track> = (0..8)
            .map(|i| track(&format!("q{}", i), Genre::Rock, 0.1 + i as f64 * 0.01))
            .collect();
        let mut lib = MemoryLibrary::with_tracks(quiet.clone());
        for i in 0..loud {
            lib.add_track(track(&format!("l{}", i), loud_genre, 0.95));
        }

        let mut playlist = Playlist::new("quiet");
        for t in quiet {
            playlist.add(t);
        }
        lib.save_playlist(&mut playlist).unwrap();
        (lib, playlist)
    }

    #[test]
    fn test_budget_caps_replacements() {
        let (mut lib, mut playlist) = setup(20, Genre::Rock);
        let outcome = optimizer(0.25)
            .optimize(&mut lib, &mut playlist, Feature::Energy, Direction::Increase)
            .unwrap();

        assert_eq!(outcome.budget, 2);
        assert_eq!(outcome.replacements, 2);
        assert_eq!(outcome.status, OptimizeStatus::BudgetExhausted);
        assert!(outcome.final_average > outcome.initial_average);
        assert_eq!(playlist.len(), 8);
        playlist.check_positions().unwrap();

        // the two quietest were swapped out
        assert!(!playlist.contains(&TrackId::new("q0")));
        assert!(!playlist.contains(&TrackId::new("q1")));

        let saved = lib.load_playlist(playlist.id.unwrap()).unwrap().unwrap();
        assert_eq!(saved.len(), 8);
        assert!(!saved.contains(&TrackId::new("q0")));
    }

    #[test]
    fn test_stops_when_sufficient() {
        let (mut lib, mut playlist) = setup(20, Genre::Rock);
        let outcome = optimizer(1.0)
            .optimize(&mut lib, &mut playlist, Feature::Energy, Direction::Increase)
            .unwrap();

        assert_eq!(outcome.status, OptimizeStatus::Sufficient);
        assert!(outcome.sufficient);
        assert!(outcome.replacements <= outcome.budget);
        assert!(playlist.average(Feature::Energy).unwrap() >= 0.6);
    }

    #[test]
    fn test_stalls_without_candidates() {
        let (mut lib, mut playlist) = setup(1, Genre::Rock);
        let outcome = optimizer(1.0)
            .optimize(&mut lib, &mut playlist, Feature::Energy, Direction::Increase)
            .unwrap();

        // one loud track swapped in; after that every better track is a member
        assert_eq!(outcome.status, OptimizeStatus::Stalled);
        assert_eq!(outcome.replacements, 1);
        assert!(!outcome.sufficient);
        assert!(playlist.contains(&TrackId::new("l0")));
    }

    #[test]
    fn test_candidates_limited_to_active_genres() {
        let (mut lib, mut playlist) = setup(10, Genre::Metal);
        playlist.establish_genres([Genre::Rock]);
        let outcome = optimizer(1.0)
            .optimize(&mut lib, &mut playlist, Feature::Energy, Direction::Increase)
            .unwrap();

        // every rock track is already a member
        assert_eq!(outcome.status, OptimizeStatus::Stalled);
        assert_eq!(outcome.replacements, 0);
        assert!(playlist.ordered_tracks().all(|t| t.genre == Genre::Rock));
    }

    #[test]
    fn test_already_sufficient_makes_no_changes() {
        let (mut lib, mut playlist) = setup(5, Genre::Rock);
        let outcome = optimizer(0.5)
            .optimize(&mut lib, &mut playlist, Feature::Energy, Direction::Decrease)
            .unwrap();

        assert_eq!(outcome.status, OptimizeStatus::Sufficient);
        assert_eq!(outcome.replacements, 0);
        assert!(playlist.contains(&TrackId::new("q7")));
    }

    #[test]
    fn test_decrease_removes_loudest() {
        let mut lib = MemoryLibrary::with_tracks([
            track("a", Genre::Pop, 0.9),
            track("b", Genre::Pop, 0.8),
            track("c", Genre::Pop, 0.7),
            track("d", Genre::Pop, 0.1),
            track("e", Genre::Pop, 0.2),
        ]);
        let mut playlist = Playlist::new("loud");
        for id in ["a", "b", "c"] {
            playlist.add(lib.track(&TrackId::new(id)).unwrap().unwrap());
        }

        let outcome = optimizer(0.34)
            .optimize(&mut lib, &mut playlist, Feature::Energy, Direction::Decrease)
            .unwrap();

        assert_eq!(outcome.replacements, 2);
        assert_eq!(outcome.status, OptimizeStatus::Sufficient);
        assert!(playlist.contains(&TrackId::new("d")));
        assert!(playlist.contains(&TrackId::new("e")));
        assert!(!playlist.contains(&TrackId::new("a")));
        assert!(!playlist.contains(&TrackId::new("b")));
    }

    #[test]
    fn test_empty_playlist_is_an_error() {
        let mut lib = MemoryLibrary::new();
        let mut playlist = Playlist::new("empty");
        let err = optimizer(0.25)
            .optimize(&mut lib, &mut playlist, Feature::Energy, Direction::Increase)
            .unwrap_err();
        assert!(matches!(err, CurateError::EmptyPlaylist));
    }
}
