//! Progressive constraint relaxation
//!
//! Starts from the full conjunction of tag predicates and widens it until the
//! catalog yields enough tracks:
//!
//! 1. query with every feature and genre predicate;
//! 2. query again with every feature threshold loosened one step;
//! 3. drop feature predicates, trying every subset of size |F|-1 down to 0
//!    with the genre clause held fixed, halting as soon as the target is met.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::model::{Track, TrackId};
use crate::query::Predicate;
use std::collections::HashSet;

/// Tracks found by a relaxation search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Distinct tracks in order of discovery
    pub tracks: Vec<Track>,

    /// Number of tracks that was asked for
    pub target: usize,

    /// Number of catalog queries issued
    pub queries: usize,
}

impl SearchOutcome {
    pub fn is_satisfied(&self) -> bool {
        self.tracks.len() >= self.target
    }

    /// How many tracks short of the target the search ended
    pub fn shortfall(&self) -> usize {
        self.target.saturating_sub(self.tracks.len())
    }
}

/// Relaxation search over a catalog
pub struct RelaxationSearch<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: Catalog + ?Sized> RelaxationSearch<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Find at least `target` distinct tracks, widening the filter as needed
    pub fn run(
        &self,
        features: &[Predicate],
        genres: &[Predicate],
        target: usize,
    ) -> Result<SearchOutcome> {
        let mut found = Accumulator::default();
        let mut queries = 0;

        let full = Predicate::combine(features, genres);
        self.collect(&full, &mut found, &mut queries)?;
        log::info!("Full query matched {} track(s): {}", found.len(), full);

        if found.len() < target && !features.is_empty() {
            let loosened: Vec<Predicate> = features.iter().map(Predicate::relaxed).collect();
            let widened = Predicate::combine(&loosened, genres);
            self.collect(&widened, &mut found, &mut queries)?;
            log::info!(
                "Loosened thresholds, {} track(s) so far: {}",
                found.len(),
                widened
            );
        }

        if found.len() < target {
            'sizes: for size in (0..features.len()).rev() {
                for subset in Combinations::new(features.len(), size) {
                    let terms: Vec<Predicate> =
                        subset.iter().map(|&i| features[i].clone()).collect();
                    let predicate = Predicate::combine(&terms, genres);
                    self.collect(&predicate, &mut found, &mut queries)?;

                    if found.len() >= target {
                        found.tracks.truncate(target);
                        log::info!(
                            "Reached {} track(s) after dropping to {} feature predicate(s)",
                            target,
                            size
                        );
                        break 'sizes;
                    }
                }
            }
        }

        let outcome = SearchOutcome {
            tracks: found.tracks,
            target,
            queries,
        };
        if !outcome.is_satisfied() {
            log::warn!(
                "Relaxation exhausted: found {} of {} track(s)",
                outcome.tracks.len(),
                target
            );
        }
        Ok(outcome)
    }

    fn collect(
        &self,
        predicate: &Predicate,
        found: &mut Accumulator,
        queries: &mut usize,
    ) -> Result<()> {
        let tracks = self.catalog.query(predicate)?;
        *queries += 1;
        log::debug!("Query #{} matched {}: {}", queries, tracks.len(), predicate);
        found.extend(tracks);
        Ok(())
    }
}

/// Distinct-by-id track collection in discovery order
#[derive(Default)]
struct Accumulator {
    tracks: Vec<Track>,
    seen: HashSet<TrackId>,
}

impl Accumulator {
    fn extend(&mut self, tracks: Vec<Track>) {
        for track in tracks {
            if self.seen.insert(track.id.clone()) {
                self.tracks.push(track);
            }
        }
    }

    fn len(&self) -> usize {
        self.tracks.len()
    }
}

/// Index combinations of `k` out of `n`, in lexicographic order
struct Combinations {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }

        // rightmost index that can still advance
        let mut i = self.k;
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            if self.indices[i] != i + self.n - self.k {
                break;
            }
        }

        self.indices[i] += 1;
        for j in i + 1..self.k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}
