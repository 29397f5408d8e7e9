//! Writers for tiny MPEG files tagged through lofty, used by tests across
//! the workspace.

use std::fs;
use std::path::Path;

use lofty::config::WriteOptions;
use lofty::error::LoftyError;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::{Accessor, ItemKey, TagExt};
use lofty::probe::Probe;
use lofty::tag::{Tag, TagType};

/// A 1x1 transparent PNG.
pub const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

// MPEG-1 layer III, 128 kbps, 44.1 kHz, no padding.
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x44];
const FRAME_LEN: usize = 417;
const FRAME_COUNT: usize = 8;

#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTags<'a> {
    pub title: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    pub album_artist: Option<&'a str>,
    pub composer: Option<&'a str>,
    pub genre: Option<&'a str>,
    pub track: Option<u32>,
    pub track_total: Option<u32>,
    pub picture: Option<(&'a str, &'a [u8])>,
}

/// Writes an MP3 carrying an ID3v2 tag with the given fields. With no fields
/// set the tag still holds a single genre item, so the file reads as tagged
/// but blank.
pub fn write_mp3(path: &Path, fields: &FixtureTags<'_>) -> Result<(), LoftyError> {
    write_untagged_mp3(path)?;

    let mut tag = Tag::new(TagType::Id3v2);
    if let Some(title) = fields.title {
        tag.set_title(title.to_string());
    }
    if let Some(artist) = fields.artist {
        tag.set_artist(artist.to_string());
    }
    if let Some(album) = fields.album {
        tag.set_album(album.to_string());
    }
    if let Some(genre) = fields.genre {
        tag.set_genre(genre.to_string());
    }
    if let Some(track) = fields.track {
        tag.set_track(track);
    }
    if let Some(total) = fields.track_total {
        tag.set_track_total(total);
    }
    if let Some(album_artist) = fields.album_artist {
        tag.insert_text(ItemKey::AlbumArtist, album_artist.to_string());
    }
    if let Some(composer) = fields.composer {
        tag.insert_text(ItemKey::Composer, composer.to_string());
    }
    if let Some((mime, data)) = fields.picture {
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::from_str(mime)),
            None,
            data.to_vec(),
        ));
    }
    if tag.is_empty() {
        tag.set_genre("Other".to_string());
    }

    let mut tagged_file = Probe::open(path)?.read()?;
    tagged_file.insert_tag(tag);
    tagged_file.save_to_path(path, WriteOptions::default())
}

/// Writes an MP3 with audio frames and no tag block at all.
pub fn write_untagged_mp3(path: &Path) -> Result<(), LoftyError> {
    let mut out = Vec::with_capacity(FRAME_LEN * FRAME_COUNT);
    for _ in 0..FRAME_COUNT {
        out.extend_from_slice(&FRAME_HEADER);
        out.resize(out.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
    }
    fs::write(path, out)?;
    Ok(())
}
