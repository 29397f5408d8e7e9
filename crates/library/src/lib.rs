use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use common::{fold_eq, is_supported_extension, or_fallback, Artist, Track, UNKNOWN_ARTIST, UNTITLED};
use metadata::{read_cover, read_tags, MetadataError, TagInfo};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};
use walkdir::WalkDir;

pub use metadata::CoverArt as Artwork;

/// A unique album title. Tracks are held as indices into the owning
/// catalog's flat track list; resolve them with [`Catalog::album_tracks`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Album {
    pub title: String,
    pub artist: String,
    tracks: Vec<usize>,
}

impl Album {
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

/// An album with its tracks resolved, in the persisted `{Title, Artist,
/// Tracks}` shape.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlbumView<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub tracks: Vec<&'a Track>,
}

/// The Artist → Album → Track hierarchy for one scan. Built once and never
/// mutated afterwards.
///
/// Artists and albums are deduplicated by exact string, while every lookup
/// compares case-insensitively, so "Queen" and "queen" are two artists that
/// both answer to a query for "QUEEN".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    artists: Vec<Artist>,
    albums: Vec<Album>,
    tracks: Vec<Track>,
    path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
}

impl Catalog {
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            artists: self.artists.len(),
            albums: self.albums.len(),
            tracks: self.tracks.len(),
        }
    }

    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn artist(&self, name: &str) -> Option<&Artist> {
        self.artists.iter().find(|artist| fold_eq(&artist.name, name))
    }

    pub fn album(&self, title: &str) -> Option<&Album> {
        self.albums.iter().find(|album| fold_eq(&album.title, title))
    }

    pub fn track_by_path(&self, path: &Path) -> Option<&Track> {
        self.tracks.iter().find(|track| track.path == path)
    }

    pub fn album_tracks<'a>(&'a self, album: &'a Album) -> impl Iterator<Item = &'a Track> + 'a {
        album
            .tracks
            .iter()
            .filter_map(move |&index| self.tracks.get(index))
    }

    pub fn album_view<'a>(&'a self, album: &'a Album) -> AlbumView<'a> {
        AlbumView {
            title: &album.title,
            artist: &album.artist,
            tracks: self.album_tracks(album).collect(),
        }
    }

    /// Albums whose recorded artist matches `name`; empty when none do.
    pub fn albums_by_artist(&self, name: &str) -> Vec<&Album> {
        self.albums
            .iter()
            .filter(|album| fold_eq(&album.artist, name))
            .collect()
    }

    /// Like [`Catalog::albums_by_artist`], but reports an unknown artist
    /// name instead of returning an empty list for it.
    pub fn find_albums_by_artist(&self, name: &str) -> Result<Vec<&Album>, NotFound> {
        if self.artist(name).is_none() {
            return Err(NotFound::Artist(name.to_string()));
        }
        Ok(self.albums_by_artist(name))
    }

    /// Tracks whose album title matches `title`; empty when none do.
    pub fn tracks_by_album(&self, title: &str) -> Vec<&Track> {
        self.tracks
            .iter()
            .filter(|track| fold_eq(&track.album, title))
            .collect()
    }

    pub fn find_tracks_by_album(&self, title: &str) -> Result<Vec<&Track>, NotFound> {
        let tracks = self.tracks_by_album(title);
        if tracks.is_empty() {
            return Err(NotFound::Album(title.to_string()));
        }
        Ok(tracks)
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct DiscoveryError {
    pub root: PathBuf,
    pub source: std::io::Error,
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot scan {}: {}", self.root.display(), self.source)
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotFound {
    Artist(String),
    Album(String),
    Track(PathBuf),
    Artwork(PathBuf),
}

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFound::Artist(name) => write!(f, "artist not found: {}", name),
            NotFound::Album(title) => write!(f, "album not found: {}", title),
            NotFound::Track(path) => write!(f, "track not found: {}", path.display()),
            NotFound::Artwork(path) => write!(f, "no artwork found: {}", path.display()),
        }
    }
}

impl std::error::Error for NotFound {}

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Metadata(MetadataError),
    Discovery(DiscoveryError),
    NotFound(NotFound),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Json(err) => write!(f, "json error: {}", err),
            LibraryError::Metadata(err) => write!(f, "metadata error: {}", err),
            LibraryError::Discovery(err) => write!(f, "{}", err),
            LibraryError::NotFound(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::Json(err)
    }
}

impl From<MetadataError> for LibraryError {
    fn from(err: MetadataError) -> Self {
        LibraryError::Metadata(err)
    }
}

impl From<DiscoveryError> for LibraryError {
    fn from(err: DiscoveryError) -> Self {
        LibraryError::Discovery(err)
    }
}

impl From<NotFound> for LibraryError {
    fn from(err: NotFound) -> Self {
        LibraryError::NotFound(err)
    }
}

/// Reads one file into a [`Track`], substituting "Unknown"/"Untitled" for
/// blank artist, title and album.
pub fn extract_track(path: &Path) -> Result<Track, MetadataError> {
    let tags = read_tags(path)?;
    let path = absolute_path(path)?;
    let track = track_from_tags(tags, path);
    info!("Adding: {} - {}", track.artist, track.title);
    Ok(track)
}

/// Walks `root` and extracts every file with a supported extension. Files
/// that fail to parse are logged and left out; only an unreadable root
/// fails the walk.
pub fn discover(root: &Path) -> Result<Vec<Track>, DiscoveryError> {
    let root = canonical_root(root)?;
    Ok(walk(&root))
}

fn walk(root: &Path) -> Vec<Track> {
    let mut tracks = Vec::new();
    let mut skipped = 0usize;
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {:?}: {}", root, err);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() || !is_supported_extension(path) {
            continue;
        }
        // Snapshot paths are JSON strings.
        if path.to_str().is_none() {
            warn!("path is not valid UTF-8: {:?}", path);
            skipped += 1;
            continue;
        }
        match extract_track(path) {
            Ok(track) => tracks.push(track),
            Err(err) => {
                warn!("{}: {:?}", err, path);
                skipped += 1;
            }
        }
    }

    info!(
        "Discovered {} tracks under {:?} ({} skipped)",
        tracks.len(),
        root,
        skipped
    );
    tracks
}

/// Groups tracks into unique artists and albums. An album keeps the artist
/// of the first track seen with its title. Artist and album order is
/// unspecified; track order is preserved.
pub fn build(tracks: Vec<Track>) -> Catalog {
    let mut artists: HashMap<String, Artist> = HashMap::new();
    let mut albums: HashMap<String, Album> = HashMap::new();

    for (index, track) in tracks.iter().enumerate() {
        if !artists.contains_key(&track.artist) {
            artists.insert(
                track.artist.clone(),
                Artist {
                    name: track.artist.clone(),
                },
            );
        }
        albums
            .entry(track.album.clone())
            .or_insert_with(|| Album {
                title: track.album.clone(),
                artist: track.artist.clone(),
                tracks: Vec::new(),
            })
            .tracks
            .push(index);
    }

    Catalog {
        artists: artists.into_values().collect(),
        albums: albums.into_values().collect(),
        tracks,
        path: None,
    }
}

/// Discovers and builds in one go, recording the resolved root.
pub fn scan(root: &Path) -> Result<Catalog, LibraryError> {
    let root = canonical_root(root)?;
    let tracks = walk(&root);
    Ok(build(tracks).with_path(root))
}

/// Loads the catalog snapshot at `catalog_path`, or scans `root` and writes
/// a fresh snapshot when it is missing or `rescan` is set. The flag in the
/// result tells whether a scan ran.
pub fn load_or_scan(
    root: &Path,
    catalog_path: &Path,
    rescan: bool,
) -> Result<(Catalog, bool), LibraryError> {
    if !rescan && catalog_path.exists() {
        let catalog = Catalog::load(catalog_path)?;
        info!("Loaded catalog from {:?}", catalog_path);
        return Ok((catalog, false));
    }

    if rescan {
        info!("Rescanning {:?}", root);
    } else {
        warn!("Catalog missing; scanning {:?}", root);
    }
    let catalog = scan(root)?;
    catalog.save(catalog_path)?;
    info!("Wrote catalog to {:?}", catalog_path);
    Ok((catalog, true))
}

/// Re-reads `path` and returns its embedded picture.
pub fn artwork(path: &Path) -> Result<Artwork, LibraryError> {
    match read_cover(path)? {
        Some(cover) if !cover.data.is_empty() => Ok(cover),
        _ => Err(NotFound::Artwork(path.to_path_buf()).into()),
    }
}

fn track_from_tags(tags: TagInfo, path: PathBuf) -> Track {
    Track {
        file_type: tags.file_type,
        title: or_fallback(tags.title, UNTITLED),
        album: or_fallback(tags.album, UNTITLED),
        artist: or_fallback(tags.artist, UNKNOWN_ARTIST),
        album_artist: tags.album_artist.unwrap_or_default(),
        composer: tags.composer.unwrap_or_default(),
        genre: tags.genre.unwrap_or_default(),
        year: tags.year.unwrap_or(0),
        track_number: tags.track_no.unwrap_or(0),
        track_total: tags.track_total.unwrap_or(0),
        disc_number: tags.disc_no.unwrap_or(0),
        disc_total: tags.disc_total.unwrap_or(0),
        lyrics: tags.lyrics.unwrap_or_default(),
        path,
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf, DiscoveryError> {
    let discovery_error = |source| DiscoveryError {
        root: root.to_path_buf(),
        source,
    };
    let resolved = root.canonicalize().map_err(discovery_error)?;
    if resolved.is_dir() {
        fs::read_dir(&resolved).map_err(discovery_error)?;
    }
    Ok(resolved)
}

fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogRef<'a> {
    artists: &'a [Artist],
    albums: Vec<AlbumView<'a>>,
    tracks: &'a [Track],
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a Path>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogFile {
    #[serde(default)]
    artists: Vec<Artist>,
    #[serde(default)]
    albums: Vec<AlbumFile>,
    #[serde(default)]
    tracks: Vec<Track>,
    #[serde(default)]
    path: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AlbumFile {
    title: String,
    artist: String,
    #[serde(default)]
    tracks: Vec<Track>,
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CatalogRef {
            artists: &self.artists,
            albums: self.albums.iter().map(|album| self.album_view(album)).collect(),
            tracks: &self.tracks,
            path: self.path.as_deref(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let CatalogFile {
            artists,
            albums,
            tracks,
            path,
        } = CatalogFile::deserialize(deserializer)?;

        // Album tracks are stored in full; map each back to its entry in the
        // flat list so albums keep referencing rather than copying.
        let mut by_path: HashMap<&Path, Vec<usize>> = HashMap::new();
        for (index, track) in tracks.iter().enumerate() {
            by_path.entry(track.path.as_path()).or_default().push(index);
        }

        let mut resolved = Vec::with_capacity(albums.len());
        for album in albums {
            let mut indices = Vec::with_capacity(album.tracks.len());
            for record in &album.tracks {
                let index = by_path
                    .get(record.path.as_path())
                    .and_then(|candidates| {
                        candidates
                            .iter()
                            .copied()
                            .find(|&index| tracks[index] == *record)
                    })
                    .ok_or_else(|| {
                        D::Error::custom(format!(
                            "album {:?} lists a track missing from Tracks: {}",
                            album.title,
                            record.path.display()
                        ))
                    })?;
                indices.push(index);
            }
            resolved.push(Album {
                title: album.title,
                artist: album.artist,
                tracks: indices,
            });
        }
        drop(by_path);

        Ok(Catalog {
            artists,
            albums: resolved,
            tracks,
            path,
        })
    }
}
