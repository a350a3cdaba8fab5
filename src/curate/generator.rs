//! Playlist assembly from tags

use super::config::CurateConfig;
use crate::catalog::{Catalog, PlaylistStore};
use crate::error::{CurateError, Result};
use crate::model::{Genre, Playlist, Track};
use crate::query::{Predicate, TagTranslator};
use crate::search::RelaxationSearch;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Builds new playlists from tags and saves them
pub struct PlaylistGenerator<R: Rng> {
    config: CurateConfig,
    translator: TagTranslator,
    rng: R,
}

impl<R: Rng> PlaylistGenerator<R> {
    /// Create a new generator drawing randomness from `rng`
    pub fn new(config: CurateConfig, rng: R) -> Self {
        let translator = TagTranslator::new(config.vocabulary.iter().copied());
        Self {
            config,
            translator,
            rng,
        }
    }

    pub fn config(&self) -> &CurateConfig {
        &self.config
    }

    /// Generate and save a playlist of `length` tracks matching `tags`
    ///
    /// With no usable tags this is a uniform sample of the whole catalog.
    /// Fails with [`CurateError::Unsatisfiable`] when nothing matches even
    /// after relaxation; no playlist is created in that case.
    pub fn generate<L, S>(
        &mut self,
        library: &mut L,
        name: &str,
        tags: &[S],
        length: usize,
    ) -> Result<Playlist>
    where
        L: Catalog + PlaylistStore,
        S: AsRef<str>,
    {
        let translated = self.translator.translate(tags);
        if translated.is_empty() {
            if !tags.is_empty() {
                log::warn!("No usable tags, sampling the whole catalog");
            }
            return self.random_playlist(library, name, length);
        }

        log::info!("Generating {:?}: {} track(s) for {}", name, length, translated.predicate());

        let outcome =
            RelaxationSearch::new(&*library).run(&translated.features, &translated.genres, length)?;
        if outcome.tracks.is_empty() {
            return Err(CurateError::Unsatisfiable {
                tags: tags.iter().map(|t| t.as_ref().to_string()).collect(),
            });
        }

        self.assemble(library, name, &outcome.tracks, length, &translated.named_genres)
    }

    /// Generate and save a playlist sampled uniformly from the whole catalog
    pub fn random_playlist<L>(&mut self, library: &mut L, name: &str, length: usize) -> Result<Playlist>
    where
        L: Catalog + PlaylistStore,
    {
        let catalog = library.query(&Predicate::Always)?;
        if catalog.is_empty() {
            return Err(CurateError::Unsatisfiable { tags: Vec::new() });
        }
        log::info!(
            "Generating {:?}: {} random track(s) from {}",
            name,
            length,
            catalog.len()
        );
        self.assemble(library, name, &catalog, length, &[])
    }

    fn assemble<L>(
        &mut self,
        library: &mut L,
        name: &str,
        pool: &[Track],
        length: usize,
        genres: &[Genre],
    ) -> Result<Playlist>
    where
        L: PlaylistStore,
    {
        if pool.len() < length {
            log::warn!(
                "Only {} track(s) available for {:?}, wanted {}",
                pool.len(),
                name,
                length
            );
        }

        let mut playlist = Playlist::new(name);
        for track in pool.choose_multiple(&mut self.rng, length) {
            playlist.add(track.clone());
        }
        playlist.establish_genres(genres.iter().copied());

        let id = library.save_playlist(&mut playlist)?;
        log::info!("Created playlist {} {:?} with {} track(s)", id, name, playlist.len());
        Ok(playlist)
    }
}
