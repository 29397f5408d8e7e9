use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use library::Catalog;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CATALOG: &str = "library.json";
const SNAPSHOT_NAME: &str = "blaster.json";

const USAGE: &str = "Usage: catalog <command> [args]

Commands:
    generate ROOT [OUT]   Scan ROOT and write a catalog snapshot
                          (default OUT: ROOT/blaster.json).
    artists [CATALOG]     Print every artist in a snapshot.
    albums [CATALOG]      Print every album with its tracks.
    help                  Show this text.

CATALOG defaults to $CATALOG_PATH, then library.json.";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let command = match args.next() {
        Some(command) => command,
        None => {
            eprintln!("catalog: no command given.\n\n{}", USAGE);
            return Ok(());
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command.as_str() {
        "generate" => {
            let root = args.next().ok_or("generate needs a ROOT path")?;
            let root = PathBuf::from(root);
            let target = args
                .next()
                .map(PathBuf::from)
                .unwrap_or_else(|| root.join(SNAPSHOT_NAME));
            let catalog = library::scan(&root)?;
            catalog.save(&target)?;
            info!("Wrote catalog to {:?}", target);
            let stats = catalog.stats();
            writeln!(
                out,
                "Indexed: {} artists, {} albums, {} tracks",
                stats.artists, stats.albums, stats.tracks
            )?;
        }
        "artists" => {
            let catalog = Catalog::load(&catalog_path(args.next()))?;
            print_artists(&catalog, &mut out)?;
        }
        "albums" => {
            let catalog = Catalog::load(&catalog_path(args.next()))?;
            print_albums(&catalog, &mut out)?;
        }
        "help" => writeln!(out, "{}", USAGE)?,
        other => {
            eprintln!("catalog: {} is an invalid command.\n\n{}", other, USAGE);
        }
    }

    Ok(())
}

fn catalog_path(arg: Option<String>) -> PathBuf {
    arg.or_else(|| env::var("CATALOG_PATH").ok())
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(DEFAULT_CATALOG).to_path_buf())
}

fn print_artists(catalog: &Catalog, out: &mut impl Write) -> io::Result<()> {
    for artist in catalog.artists() {
        writeln!(out, "{}", artist.name)?;
    }
    Ok(())
}

fn print_albums(catalog: &Catalog, out: &mut impl Write) -> io::Result<()> {
    for album in catalog.albums() {
        writeln!(out, "{} - {}", album.artist, album.title)?;
        for track in catalog.album_tracks(album) {
            writeln!(out, "\t{} {}", track.track_number, track.title)?;
        }
    }
    Ok(())
}
