//! SQLite-backed catalog and playlist store

use super::{Catalog, PlaylistStore};
use crate::model::{Feature, Features, Genre, Membership, Playlist, PlaylistId, Track, TrackId};
use crate::query::Predicate;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const BASE_DB_VERSION: usize = 1000;

struct Table {
    name: &'static str,
    schema: &'static str,
    indices: &'static [&'static str],
}

/// V 0
const TRACK_TABLE_V_0: Table = Table {
    name: "track",
    schema: "CREATE TABLE track (id TEXT NOT NULL UNIQUE, title TEXT NOT NULL, artist TEXT NOT NULL DEFAULT '', genre TEXT NOT NULL, acousticness REAL NOT NULL, danceability REAL NOT NULL, energy REAL NOT NULL, instrumentalness REAL NOT NULL, liveness REAL NOT NULL, speechiness REAL NOT NULL, tempo REAL NOT NULL, valence REAL NOT NULL, PRIMARY KEY (id))",
    indices: &["CREATE INDEX track_genre_index ON track (genre);"],
};
const PLAYLIST_TABLE_V_0: Table = Table {
    name: "playlist",
    schema: "CREATE TABLE playlist (id INTEGER, name TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (id))",
    indices: &[],
};
const PLAYLIST_TRACK_TABLE_V_0: Table = Table {
    name: "playlist_track",
    schema: "CREATE TABLE playlist_track (id INTEGER, playlist_id INTEGER NOT NULL, track_id TEXT NOT NULL, position INTEGER NOT NULL, PRIMARY KEY (id), CONSTRAINT playlist_id FOREIGN KEY (playlist_id) REFERENCES playlist (id) ON DELETE CASCADE, CONSTRAINT track_id FOREIGN KEY (track_id) REFERENCES track (id), UNIQUE (playlist_id, position))",
    indices: &["CREATE INDEX playlist_track_playlist_index ON playlist_track (playlist_id);"],
};

const SCHEMA_V_0: &[Table] = &[TRACK_TABLE_V_0, PLAYLIST_TABLE_V_0, PLAYLIST_TRACK_TABLE_V_0];
const SCHEMA_VERSION: usize = 0;

const TRACK_COLUMNS: &str = "track.id, track.title, track.artist, track.genre, track.acousticness, track.danceability, track.energy, track.instrumentalness, track.liveness, track.speechiness, track.tempo, track.valence";

/// Catalog and playlist store backed by a SQLite database
pub struct SqliteLibrary {
    conn: Connection,
}

impl SqliteLibrary {
    /// Open a database file, creating the schema if the file is new
    pub fn open<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new = !path.exists();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;
        Self::init(conn, is_new)
    }

    /// Fresh database that lives only as long as this value
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, true)
    }

    fn init(conn: Connection, is_new: bool) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if is_new {
            Self::create_schema(&conn)?;
        }

        let version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, usize>(0))
            .context("Failed to read database version")?;
        if version != BASE_DB_VERSION + SCHEMA_VERSION {
            bail!("Unsupported database version {}", version);
        }
        Self::validate_schema(&conn)?;

        Ok(Self { conn })
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        for table in SCHEMA_V_0 {
            conn.execute(table.schema, [])
                .with_context(|| format!("Failed to create table {}", table.name))?;
            for index in table.indices {
                conn.execute(index, [])?;
            }
        }
        conn.execute_batch(&format!(
            "PRAGMA user_version = {}",
            BASE_DB_VERSION + SCHEMA_VERSION
        ))?;
        Ok(())
    }

    fn validate_schema(conn: &Connection) -> Result<()> {
        for table in SCHEMA_V_0 {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
            let columns: Vec<String> = stmt
                .query_map([], |row| row.get(1))?
                .collect::<Result<_, _>>()?;
            if columns.is_empty() {
                bail!("Schema validation failed, missing table {}", table.name);
            }
        }
        Ok(())
    }

    /// Insert or replace tracks in one transaction
    pub fn insert_tracks(&mut self, tracks: &[Track]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO track (id, title, artist, genre, acousticness, danceability, energy, instrumentalness, liveness, speechiness, tempo, valence) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT (id) DO UPDATE SET title = excluded.title, artist = excluded.artist, genre = excluded.genre, acousticness = excluded.acousticness, danceability = excluded.danceability, energy = excluded.energy, instrumentalness = excluded.instrumentalness, liveness = excluded.liveness, speechiness = excluded.speechiness, tempo = excluded.tempo, valence = excluded.valence",
            )?;
            for track in tracks {
                let f = &track.features;
                stmt.execute(params![
                    track.id.as_str(),
                    track.title,
                    track.artist,
                    track.genre.name(),
                    f.acousticness,
                    f.danceability,
                    f.energy,
                    f.instrumentalness,
                    f.liveness,
                    f.speechiness,
                    f.tempo,
                    f.valence,
                ])?;
            }
        }
        tx.commit()?;
        Ok(tracks.len())
    }

    fn memberships(&self, playlist_id: PlaylistId) -> Result<Vec<Membership>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, playlist_track.position FROM playlist_track JOIN track ON track.id = playlist_track.track_id WHERE playlist_track.playlist_id = ?1 ORDER BY playlist_track.id",
            TRACK_COLUMNS
        ))?;
        let rows = stmt.query_map([playlist_id], |row| {
            Ok(Membership {
                track: track_from_row(row)?,
                position: row.get(12)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn load_where(&self, clause: &str, param: Value) -> Result<Option<Playlist>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT id, name, created FROM playlist WHERE {}", clause),
                [param],
                |row| {
                    Ok((
                        row.get::<usize, PlaylistId>(0)?,
                        row.get::<usize, String>(1)?,
                        row.get::<usize, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, created)) = row else {
            return Ok(None);
        };
        let created_at = DateTime::<Utc>::from_timestamp(created, 0).unwrap_or_default();
        Ok(Some(Playlist::from_entries(
            id,
            name,
            created_at,
            self.memberships(id)?,
        )))
    }
}

impl Catalog for SqliteLibrary {
    fn query(&self, predicate: &Predicate) -> Result<Vec<Track>> {
        let mut values = Vec::new();
        let clause = render_where(predicate, &mut values);
        log::debug!("SQL filter: {} {:?}", clause, values);

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM track WHERE {} ORDER BY track.rowid",
            TRACK_COLUMNS, clause
        ))?;
        let rows = stmt.query_map(params_from_iter(values), track_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn track(&self, id: &TrackId) -> Result<Option<Track>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM track WHERE track.id = ?1", TRACK_COLUMNS),
                [id.as_str()],
                track_from_row,
            )
            .optional()?)
    }

    fn track_count(&self) -> Result<usize> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM track", [], |row| row.get(0))?)
    }
}

impl PlaylistStore for SqliteLibrary {
    fn save_playlist(&mut self, playlist: &mut Playlist) -> Result<PlaylistId> {
        playlist
            .check_positions()
            .with_context(|| format!("Refusing to save playlist {:?}", playlist.name))?;

        let tx = self.conn.transaction()?;
        let id = match playlist.id {
            Some(id) => {
                tx.execute(
                    "UPDATE playlist SET name = ?1 WHERE id = ?2",
                    params![playlist.name, id],
                )?;
                tx.execute("DELETE FROM playlist_track WHERE playlist_id = ?1", [id])?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO playlist (name, created) VALUES (?1, ?2)",
                    params![playlist.name, playlist.created_at.timestamp()],
                )?;
                tx.last_insert_rowid()
            }
        };

        {
            let mut stmt = tx.prepare(
                "INSERT INTO playlist_track (playlist_id, track_id, position) VALUES (?1, ?2, ?3)",
            )?;
            for entry in playlist.memberships() {
                stmt.execute(params![id, entry.track.id.as_str(), entry.position])
                    .with_context(|| format!("Failed to store track {}", entry.track.id))?;
            }
        }
        tx.commit()?;

        playlist.id = Some(id);
        log::debug!("Saved playlist {} ({} tracks)", id, playlist.len());
        Ok(id)
    }

    fn load_playlist(&self, id: PlaylistId) -> Result<Option<Playlist>> {
        self.load_where("id = ?1", Value::Integer(id))
    }

    fn find_playlist(&self, name: &str) -> Result<Option<Playlist>> {
        self.load_where(
            "name = ?1 ORDER BY id DESC LIMIT 1",
            Value::Text(name.to_string()),
        )
    }

    fn list_playlists(&self) -> Result<Vec<(PlaylistId, String)>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM playlist ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn delete_playlist(&mut self, id: PlaylistId) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM playlist WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }
}

fn track_from_row(row: &Row<'_>) -> rusqlite::Result<Track> {
    let genre: String = row.get(3)?;
    let genre = genre
        .parse::<Genre>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    let mut features = Features::default();
    for (i, feature) in Feature::ALL.into_iter().enumerate() {
        features.set(feature, row.get(4 + i)?);
    }

    Ok(Track {
        id: TrackId::new(row.get::<usize, String>(0)?),
        title: row.get(1)?,
        artist: row.get(2)?,
        genre,
        features,
    })
}

/// Render a predicate as a SQL condition, pushing bound values in order
///
/// Column names come from the closed `Feature` enum; every value is bound
/// as a parameter.
pub(crate) fn render_where(predicate: &Predicate, values: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::Always => "1".to_string(),
        Predicate::Compare { feature, op, value } => {
            values.push(Value::Real(*value));
            format!("track.{} {} ?", feature.name(), op.symbol())
        }
        Predicate::GenreIs(genre) => {
            values.push(Value::Text(genre.name().to_string()));
            "track.genre = ?".to_string()
        }
        Predicate::And(terms) if terms.is_empty() => "1".to_string(),
        Predicate::Or(terms) if terms.is_empty() => "0".to_string(),
        Predicate::And(terms) | Predicate::Or(terms) => {
            let joiner = if matches!(predicate, Predicate::And(_)) {
                " AND "
            } else {
                " OR "
            };
            terms
                .iter()
                .map(|t| format!("({})", render_where(t, values)))
                .collect::<Vec<_>>()
                .join(joiner)
        }
        Predicate::Not(inner) => format!("NOT ({})", render_where(inner, values)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Comparator, TagTranslator};
    use tempfile::TempDir;

    fn track(id: &str, genre: Genre, valence: f64, tempo: f64) -> Track {
        Track {
            id: TrackId::new(id),
            title: format!("Song {}", id),
            artist: "Test Artist".to_string(),
            genre,
            features: Features {
                valence,
                tempo,
                energy: 0.5,
                ..Features::default()
            },
        }
    }

    fn sample_library() -> SqliteLibrary {
        let mut lib = SqliteLibrary::open_in_memory().unwrap();
        lib.insert_tracks(&[
            track("a", Genre::Rock, 0.9, 130.0),
            track("b", Genre::Pop, 0.7, 100.0),
            track("c", Genre::Jazz, 0.2, 128.0),
            track("d", Genre::Rock, 0.3, 90.0),
        ])
        .unwrap();
        lib
    }

    #[test]
    fn test_render_where_binds_values() {
        let predicate = TagTranslator::default()
            .translate(&["happy", "rock", "pop"])
            .predicate();
        let mut values = Vec::new();
        let clause = render_where(&predicate, &mut values);

        assert_eq!(
            clause,
            "(track.valence >= ?) AND ((track.genre = ?) OR (track.genre = ?))"
        );
        assert_eq!(
            values,
            vec![
                Value::Real(0.6),
                Value::Text("rock".to_string()),
                Value::Text("pop".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_matches_memory_semantics() {
        let lib = sample_library();
        let predicate = Predicate::combine(
            &[Predicate::compare(Feature::Valence, Comparator::GreaterOrEqual, 0.6)],
            &[Predicate::genre(Genre::Rock), Predicate::genre(Genre::Pop)],
        );
        let ids: Vec<_> = lib
            .query(&predicate)
            .unwrap()
            .into_iter()
            .map(|t| t.id.0)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(lib.query(&Predicate::Always).unwrap().len(), 4);
        assert_eq!(lib.track_count().unwrap(), 4);
        let c = lib.track(&TrackId::new("c")).unwrap().unwrap();
        assert_eq!(c.genre, Genre::Jazz);
        assert_eq!(c.features.tempo, 128.0);
    }

    #[test]
    fn test_playlist_round_trip_preserves_order() {
        let mut lib = sample_library();
        let mut playlist = Playlist::new("Round trip");
        for id in ["a", "b", "c", "d"] {
            playlist.add(lib.track(&TrackId::new(id)).unwrap().unwrap());
        }
        playlist.move_to(4, 1);
        let id = lib.save_playlist(&mut playlist).unwrap();

        playlist.delete(&TrackId::new("b")).unwrap();
        lib.save_playlist(&mut playlist).unwrap();

        let loaded = lib.load_playlist(id).unwrap().unwrap();
        let order: Vec<_> = loaded.ordered_tracks().map(|t| t.id.0.clone()).collect();
        assert_eq!(order, vec!["d", "a", "c"]);
        loaded.check_positions().unwrap();

        let found = lib.find_playlist("Round trip").unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(lib.list_playlists().unwrap().len(), 1);
        assert!(lib.delete_playlist(id).unwrap());
        assert!(lib.load_playlist(id).unwrap().is_none());
    }

    #[test]
    fn test_reopen_database_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("catalog.db");

        {
            let mut lib = SqliteLibrary::open(&db_path).unwrap();
            lib.insert_tracks(&[track("a", Genre::Blues, 0.5, 110.0)])
                .unwrap();
        }

        let lib = SqliteLibrary::open(&db_path).unwrap();
        assert_eq!(lib.track_count().unwrap(), 1);
    }
}
