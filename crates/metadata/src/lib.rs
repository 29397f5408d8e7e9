use std::fs::File;
use std::path::Path;

use common::FileType;
use lofty::error::LoftyError;
use lofty::file::FileType as LoftyFileType;
use lofty::picture::{Picture, PictureType};
use lofty::prelude::{ItemKey, TaggedFileExt};
use lofty::tag::Tag;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

/// Raw tag values as found in the file. Blank strings are already dropped;
/// fallback substitution is left to the caller.
#[derive(Debug, Clone)]
pub struct TagInfo {
    pub file_type: FileType,
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub composer: Option<String>,
    pub genre: Option<String>,
    pub lyrics: Option<String>,
    pub year: Option<i32>,
    pub track_no: Option<u32>,
    pub track_total: Option<u32>,
    pub disc_no: Option<u32>,
    pub disc_total: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime: String,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
    NoTags,
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
            MetadataError::NoTags => write!(f, "no metadata tags found"),
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetadataError::Io(err) => Some(err),
            MetadataError::Lofty(err) => Some(err),
            MetadataError::NoTags => None,
        }
    }
}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

/// Reads the tags of one file. The container is detected from the content,
/// not the extension. A file without any tag block is an error.
pub fn read_tags(path: &Path) -> Result<TagInfo, MetadataError> {
    let mut file = File::open(path)?;
    let tagged_file = lofty::read_from(&mut file)?;
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .ok_or(MetadataError::NoTags)?;

    let (track_no, track_pair_total) = tag_string(tag, ItemKey::TrackNumber)
        .map(|value| parse_number_pair(&value))
        .unwrap_or((None, None));
    let (disc_no, disc_pair_total) = tag_string(tag, ItemKey::DiscNumber)
        .map(|value| parse_number_pair(&value))
        .unwrap_or((None, None));

    Ok(TagInfo {
        file_type: file_type(tagged_file.file_type()),
        title: tag_string(tag, ItemKey::TrackTitle),
        album: tag_string(tag, ItemKey::AlbumTitle),
        artist: tag_string(tag, ItemKey::TrackArtist),
        album_artist: tag_string(tag, ItemKey::AlbumArtist),
        composer: tag_string(tag, ItemKey::Composer),
        genre: tag_string(tag, ItemKey::Genre),
        lyrics: tag_string(tag, ItemKey::Lyrics),
        year: tag_string(tag, ItemKey::Year)
            .or_else(|| tag_string(tag, ItemKey::RecordingDate))
            .and_then(|value| parse_year(&value)),
        track_no,
        track_total: tag_string(tag, ItemKey::TrackTotal)
            .and_then(|value| parse_number_pair(&value).0)
            .or(track_pair_total),
        disc_no,
        disc_total: tag_string(tag, ItemKey::DiscTotal)
            .and_then(|value| parse_number_pair(&value).0)
            .or(disc_pair_total),
    })
}

/// Reads the embedded cover of one file. `Ok(None)` means the file parsed
/// but carries no picture.
pub fn read_cover(path: &Path) -> Result<Option<CoverArt>, MetadataError> {
    let mut file = File::open(path)?;
    let tagged_file = lofty::read_from(&mut file)?;

    // Front cover from any tag block, else the first picture anywhere.
    let mut fallback: Option<&Picture> = None;
    for tag in tagged_file.tags() {
        if let Some(picture) = pick_picture(tag.pictures()) {
            if picture.pic_type() == PictureType::CoverFront {
                return Ok(Some(cover_from_picture(picture)));
            }
            fallback.get_or_insert(picture);
        }
    }

    Ok(fallback.map(cover_from_picture))
}

fn cover_from_picture(picture: &Picture) -> CoverArt {
    let data = picture.data().to_vec();
    let declared = picture
        .mime_type()
        .map(|mime| mime.as_str().trim().to_string())
        .filter(|mime| !mime.is_empty());
    let mime = declared
        .or_else(|| guess_mime(&data))
        .unwrap_or_else(|| "application/octet-stream".to_string());
    CoverArt { data, mime }
}

fn tag_string(tag: &Tag, key: ItemKey) -> Option<String> {
    let value = tag.get_string(&key)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn file_type(kind: LoftyFileType) -> FileType {
    match kind {
        LoftyFileType::Mpeg => FileType::Mp3,
        LoftyFileType::Mp4 => FileType::Mp4,
        LoftyFileType::Flac => FileType::Flac,
        LoftyFileType::Vorbis | LoftyFileType::Speex => FileType::Ogg,
        LoftyFileType::Opus => FileType::Opus,
        LoftyFileType::Aac => FileType::Aac,
        LoftyFileType::Aiff => FileType::Aiff,
        LoftyFileType::Wav => FileType::Wav,
        _ => FileType::Unknown,
    }
}

/// Parses `"3"` or `"3/12"` into number and optional total.
fn parse_number_pair(text: &str) -> (Option<u32>, Option<u32>) {
    let mut parts = text.splitn(2, '/');
    let number = parts.next().and_then(|head| head.trim().parse().ok());
    let total = parts.next().and_then(|tail| tail.trim().parse().ok());
    (number, total)
}

fn parse_year(text: &str) -> Option<i32> {
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            if digits.len() == 4 {
                break;
            }
        } else if !digits.is_empty() {
            break;
        }
    }
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

fn pick_picture(pictures: &[Picture]) -> Option<&Picture> {
    for picture in pictures {
        if picture.pic_type() == PictureType::CoverFront {
            return Some(picture);
        }
    }
    pictures.first()
}

fn guess_mime(bytes: &[u8]) -> Option<String> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg".to_string())
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png".to_string())
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif".to_string())
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{write_mp3, write_untagged_mp3, FixtureTags, PNG_PIXEL};
    use super::{guess_mime, parse_number_pair, parse_year, read_cover, read_tags, MetadataError};
    use common::FileType;

    #[test]
    fn reads_id3_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rhapsody.mp3");
        write_mp3(
            &path,
            &FixtureTags {
                title: Some("Bohemian Rhapsody"),
                artist: Some("Queen"),
                album: Some("A Night at the Opera"),
                album_artist: Some("Queen"),
                composer: Some("Freddie Mercury"),
                genre: Some("Rock"),
                track: Some(11),
                track_total: Some(12),
                ..FixtureTags::default()
            },
        )
        .unwrap();

        let info = read_tags(&path).unwrap();
        assert_eq!(info.file_type, FileType::Mp3);
        assert_eq!(info.title.as_deref(), Some("Bohemian Rhapsody"));
        assert_eq!(info.artist.as_deref(), Some("Queen"));
        assert_eq!(info.album.as_deref(), Some("A Night at the Opera"));
        assert_eq!(info.album_artist.as_deref(), Some("Queen"));
        assert_eq!(info.composer.as_deref(), Some("Freddie Mercury"));
        assert_eq!(info.genre.as_deref(), Some("Rock"));
        assert_eq!(info.track_no, Some(11));
        assert_eq!(info.track_total, Some(12));
        assert_eq!(info.year, None);
    }

    #[test]
    fn file_without_tags_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.mp3");
        write_untagged_mp3(&path).unwrap();

        let err = read_tags(&path).unwrap_err();
        assert!(matches!(err, MetadataError::NoTags));
    }

    #[test]
    fn garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        assert!(read_tags(&path).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_tags(&dir.path().join("gone.mp3")).unwrap_err();
        assert!(matches!(err, MetadataError::Io(_)));
    }

    #[test]
    fn reads_embedded_cover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.mp3");
        write_mp3(
            &path,
            &FixtureTags {
                title: Some("Love of My Life"),
                picture: Some(("image/png", PNG_PIXEL)),
                ..FixtureTags::default()
            },
        )
        .unwrap();

        let cover = read_cover(&path).unwrap().expect("cover");
        assert_eq!(cover.mime, "image/png");
        assert_eq!(cover.data, PNG_PIXEL);
    }

    #[test]
    fn cover_is_absent_without_picture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.mp3");
        write_mp3(
            &path,
            &FixtureTags {
                title: Some("Seaside Rendezvous"),
                ..FixtureTags::default()
            },
        )
        .unwrap();

        assert!(read_cover(&path).unwrap().is_none());
    }

    #[test]
    fn parses_number_pairs() {
        assert_eq!(parse_number_pair("3"), (Some(3), None));
        assert_eq!(parse_number_pair("3/12"), (Some(3), Some(12)));
        assert_eq!(parse_number_pair(" 4 / 9 "), (Some(4), Some(9)));
        assert_eq!(parse_number_pair("side A"), (None, None));
    }

    #[test]
    fn parses_year_prefix() {
        assert_eq!(parse_year("1975"), Some(1975));
        assert_eq!(parse_year("1975-11-21"), Some(1975));
        assert_eq!(parse_year("c. 1991"), Some(1991));
        assert_eq!(parse_year("unknown"), None);
    }

    #[test]
    fn sniffs_common_image_types() {
        assert_eq!(guess_mime(&[0xFF, 0xD8, 0xFF, 0xE0]).as_deref(), Some("image/jpeg"));
        assert_eq!(guess_mime(PNG_PIXEL).as_deref(), Some("image/png"));
        assert_eq!(guess_mime(b"GIF89a").as_deref(), Some("image/gif"));
        assert_eq!(guess_mime(b"\0\0\0"), None);
    }
}
