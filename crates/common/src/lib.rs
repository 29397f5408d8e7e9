use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const UNKNOWN_ARTIST: &str = "Unknown";
pub const UNTITLED: &str = "Untitled";

/// File extensions the scanner hands to the tag reader, compared
/// case-insensitively and without the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "mp4", "m4a", "flac", "aac", "ogg", "ogv", "aiff"];

/// Container kind, stored as an uppercase tag. Tags this build does not
/// know are kept verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Mp3,
    Mp4,
    Flac,
    Ogg,
    Opus,
    Aac,
    Aiff,
    Wav,
    Unknown,
    #[serde(untagged)]
    Other(String),
}

/// One audio file's metadata. `title`, `album` and `artist` are never empty
/// once the extractor has built it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Track {
    pub file_type: FileType,
    pub title: String,
    pub album: String,
    pub artist: String,
    pub album_artist: String,
    pub composer: String,
    pub genre: String,
    pub year: i32,
    pub track_number: u32,
    pub track_total: u32,
    pub disc_number: u32,
    pub disc_total: u32,
    pub lyrics: String,
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Artist {
    pub name: String,
}

pub fn is_supported_extension(path: &Path) -> bool {
    let ext = match path.extension() {
        Some(ext) => ext.to_string_lossy(),
        None => return false,
    };
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

/// Unicode case-insensitive equality, used by every catalog lookup.
pub fn fold_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

pub fn or_fallback(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{fold_eq, is_supported_extension, or_fallback, FileType, Track, UNTITLED};
    use std::path::{Path, PathBuf};

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_supported_extension(Path::new("/music/a.mp3")));
        assert!(is_supported_extension(Path::new("/music/B.FLAC")));
        assert!(is_supported_extension(Path::new("song.Aiff")));
        assert!(!is_supported_extension(Path::new("/music/cover.jpg")));
        assert!(!is_supported_extension(Path::new("/music/mp3")));
    }

    #[test]
    fn fold_eq_matches_across_case() {
        assert!(fold_eq("Queen", "queen"));
        assert!(fold_eq("MÖTLEY CRÜE", "mötley crüe"));
        assert!(!fold_eq("Queen", "Queens"));
    }

    #[test]
    fn fallback_replaces_blank_values() {
        assert_eq!(or_fallback(None, UNTITLED), "Untitled");
        assert_eq!(or_fallback(Some("   ".to_string()), UNTITLED), "Untitled");
        assert_eq!(or_fallback(Some("Innuendo".to_string()), UNTITLED), "Innuendo");
    }

    #[test]
    fn track_uses_pascal_case_keys() {
        let track = Track {
            file_type: FileType::Mp3,
            title: "Bohemian Rhapsody".to_string(),
            album: "A Night at the Opera".to_string(),
            artist: "Queen".to_string(),
            album_artist: String::new(),
            composer: "Freddie Mercury".to_string(),
            genre: "Rock".to_string(),
            year: 1975,
            track_number: 11,
            track_total: 12,
            disc_number: 1,
            disc_total: 1,
            lyrics: String::new(),
            path: PathBuf::from("/music/queen/11.mp3"),
        };
        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(value["FileType"], "MP3");
        assert_eq!(value["TrackNumber"], 11);
        assert_eq!(value["AlbumArtist"], "");
        assert_eq!(value["Path"], "/music/queen/11.mp3");
    }

    #[test]
    fn foreign_file_type_tags_survive_a_round_trip() {
        let file_type: FileType = serde_json::from_str("\"ALAC\"").unwrap();
        assert_eq!(file_type, FileType::Other("ALAC".to_string()));
        assert_eq!(serde_json::to_string(&file_type).unwrap(), "\"ALAC\"");

        let file_type: FileType = serde_json::from_str("\"FLAC\"").unwrap();
        assert_eq!(file_type, FileType::Flac);
        assert_eq!(serde_json::to_string(&FileType::Unknown).unwrap(), "\"UNKNOWN\"");
    }
}
