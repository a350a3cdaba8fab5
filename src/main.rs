use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use playlist_curator::catalog::{import, Catalog, PlaylistStore, SqliteLibrary};
use playlist_curator::model::{Direction, Feature, Playlist, PlaylistId, TrackId};
use playlist_curator::{CurateConfig, FeatureOptimizer, OptimizeConfig, PlaylistGenerator};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "playlist-curator")]
#[command(about = "Build and refine mood-based playlists from a track catalog", long_about = None)]
struct Args {
    /// Path to the catalog database
    #[arg(
        short = 'd',
        long,
        global = true,
        default_value = "~/.local/share/playlist-curator/catalog.db"
    )]
    database: String,

    /// Seed for reproducible sampling and shuffling
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import tracks from a JSON catalog file
    Import { file: PathBuf },

    /// Generate a playlist from mood and genre tags
    Generate {
        name: String,

        /// Tags such as "happy", "fast" or "jazz"; none samples the whole catalog
        tags: Vec<String>,

        /// Number of tracks (default: 20)
        #[arg(short = 'n', long)]
        length: Option<usize>,
    },

    /// Push a playlist's average for one feature up or down
    Optimize {
        /// Playlist name or id
        playlist: String,

        /// Feature to optimize, e.g. "energy" or "tempo"
        feature: String,

        /// Lower the average instead of raising it
        #[arg(long)]
        decrease: bool,

        /// Largest share of the playlist that may be replaced
        #[arg(long, default_value = "0.25")]
        percent: f64,
    },

    /// Print a playlist with its feature averages
    Show {
        /// Playlist name or id
        playlist: String,

        /// Also print how members split around this feature's thresholds
        #[arg(long)]
        feature: Option<String>,
    },

    /// Move the track at one position to another
    Move { playlist: String, from: u32, to: u32 },

    /// Shuffle a playlist's order
    Shuffle { playlist: String },

    /// Remove a track from a playlist
    Remove { playlist: String, track: String },

    /// List stored playlists
    List,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Expand ~ in paths
    let db_path = PathBuf::from(shellexpand::tilde(&args.database).as_ref());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
    }
    let mut library = SqliteLibrary::open(&db_path)?;
    log::debug!("Opened catalog {:?}", db_path);

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    match args.command {
        Command::Import { file } => {
            let tracks = import::read_tracks(&file)?;
            let count = library.insert_tracks(&tracks)?;
            log::info!(
                "Imported {} tracks, catalog now holds {}",
                count,
                library.track_count()?
            );
        }
        Command::Generate { name, tags, length } => {
            let mut generator = PlaylistGenerator::new(CurateConfig::new(), rng);
            let length = length.unwrap_or(generator.config().default_length);
            let playlist = generator.generate(&mut library, &name, &tags, length)?;
            print_playlist(&playlist);
        }
        Command::Optimize {
            playlist,
            feature,
            decrease,
            percent,
        } => {
            let feature: Feature = feature.parse()?;
            let direction = if decrease {
                Direction::Decrease
            } else {
                Direction::Increase
            };
            let mut playlist = resolve_playlist(&library, &playlist)?;

            let mut optimizer =
                FeatureOptimizer::new(OptimizeConfig::new().with_percent(percent), rng);
            let outcome = optimizer.optimize(&mut library, &mut playlist, feature, direction)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Show { playlist, feature } => {
            let playlist = resolve_playlist(&library, &playlist)?;
            if !playlist.is_empty() {
                println!("{}", serde_json::to_string_pretty(&playlist.summary()?)?);
            }
            if let Some(feature) = feature {
                let feature: Feature = feature.parse()?;
                let split = playlist.distribution(feature);
                println!(
                    "{}: {} positive, {} negative, {} neutral",
                    feature, split.positive, split.negative, split.neutral
                );
            }
            print_playlist(&playlist);
        }
        Command::Move { playlist, from, to } => {
            let mut playlist = resolve_playlist(&library, &playlist)?;
            if !playlist.move_to(from, to) {
                log::warn!(
                    "Nothing moved: positions must differ and lie within 1..={}",
                    playlist.len()
                );
                return Ok(());
            }
            library.save_playlist(&mut playlist)?;
            print_playlist(&playlist);
        }
        Command::Shuffle { playlist } => {
            let mut rng = rng;
            let mut playlist = resolve_playlist(&library, &playlist)?;
            playlist.shuffle(&mut rng);
            library.save_playlist(&mut playlist)?;
            print_playlist(&playlist);
        }
        Command::Remove { playlist, track } => {
            let mut playlist = resolve_playlist(&library, &playlist)?;
            let removed = playlist.delete(&TrackId::new(track))?;
            library.save_playlist(&mut playlist)?;
            log::info!(
                "Removed {:?} from position {}",
                removed.track.title,
                removed.position
            );
        }
        Command::List => {
            for (id, name) in library.list_playlists()? {
                println!("{:>4}  {}", id, name);
            }
        }
    }

    Ok(())
}

/// Look a playlist up by id, falling back to its name
fn resolve_playlist(library: &SqliteLibrary, key: &str) -> Result<Playlist> {
    let found = match key.parse::<PlaylistId>() {
        Ok(id) => library.load_playlist(id)?,
        Err(_) => None,
    };
    let found = match found {
        Some(playlist) => Some(playlist),
        None => library.find_playlist(key)?,
    };
    found.ok_or_else(|| anyhow!("No playlist named {:?}", key))
}

fn print_playlist(playlist: &Playlist) {
    println!("{} ({} tracks)", playlist.name, playlist.len());
    for entry in playlist.ordered_memberships() {
        let track = &entry.track;
        if track.artist.is_empty() {
            println!("{:>4}. {} [{}]", entry.position, track.title, track.genre);
        } else {
            println!(
                "{:>4}. {} - {} [{}]",
                entry.position, track.artist, track.title, track.genre
            );
        }
    }
}
