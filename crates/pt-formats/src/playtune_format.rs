//! Playtune bytestream loader.
//!
//! A bytestream may start with a small header:
//!
//! ```text
//! 'P' 't' header_len flags1 flags2 tone_generators
//! ```
//!
//! `header_len` counts the whole header, so the score begins at that offset.
//! In `flags1`, 0x80 means every note-on carries a volume byte and 0x40 means
//! instrument-change commands are present; neither is understood by the
//! interpreter.

use std::io::Cursor;

use binrw::BinRead;
use pt_score::{analyze, ScoreSummary};

use crate::c_array::parse_c_array;
use crate::FormatError;

const MAGIC: &[u8; 2] = b"Pt";
const MIN_HEADER_LEN: usize = 6;

const FLAG_VOLUME_PRESENT: u8 = 0x80;
const FLAG_INSTRUMENTS_PRESENT: u8 = 0x40;
const FLAG_PERCUSSION_PRESENT: u8 = 0x20;

/// The optional Playtune file header.
#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(big, magic = b"Pt")]
pub struct PlaytuneHeader {
    /// Length of the whole header, magic included.
    pub header_len: u8,
    pub flags1: u8,
    pub flags2: u8,
    /// Tone generators the score was written for.
    pub tone_generators: u8,
}

impl PlaytuneHeader {
    pub fn has_volume(&self) -> bool {
        self.flags1 & FLAG_VOLUME_PRESENT != 0
    }

    pub fn has_instruments(&self) -> bool {
        self.flags1 & FLAG_INSTRUMENTS_PRESENT != 0
    }

    pub fn has_percussion(&self) -> bool {
        self.flags1 & FLAG_PERCUSSION_PRESENT != 0
    }
}

/// A checked score ready to hand to a player.
#[derive(Clone, Debug)]
pub struct LoadedScore {
    pub header: Option<PlaytuneHeader>,
    /// Command bytes, header stripped.
    pub bytes: Vec<u8>,
    pub summary: ScoreSummary,
}

/// Load a Playtune bytestream for a player with `channel_count` channels.
///
/// A stream starting with `Pt` is read as having a header. That pair is also
/// a valid 20.6 s wait, which no generator emits as a first command.
pub fn load_score(data: &[u8], channel_count: u8) -> Result<LoadedScore, FormatError> {
    let (header, body) = if data.starts_with(MAGIC) {
        let header = read_header(data)?;
        (Some(header), &data[header.header_len as usize..])
    } else {
        (None, data)
    };

    if let Some(header) = header {
        if header.has_volume() {
            return Err(FormatError::Unsupported("note volume bytes"));
        }
        if header.has_instruments() {
            return Err(FormatError::Unsupported("instrument changes"));
        }
        if header.tone_generators > channel_count {
            log::warn!(
                "score written for {} tone generators, player has {}",
                header.tone_generators,
                channel_count
            );
        }
    }

    let summary = analyze(body, channel_count)?;
    if summary.end_offset < body.len() {
        log::debug!("ignoring {} bytes after the terminator", body.len() - summary.end_offset);
    }

    Ok(LoadedScore {
        header,
        bytes: body.to_vec(),
        summary,
    })
}

/// Load a score from C source containing its byte array.
pub fn load_c_source(source: &str, channel_count: u8) -> Result<LoadedScore, FormatError> {
    let bytes = parse_c_array(source)?;
    load_score(&bytes, channel_count)
}

fn read_header(data: &[u8]) -> Result<PlaytuneHeader, FormatError> {
    if data.len() < MIN_HEADER_LEN {
        return Err(FormatError::UnexpectedEof);
    }
    let header = PlaytuneHeader::read(&mut Cursor::new(data))
        .map_err(|e| FormatError::InvalidHeader(e.to_string()))?;

    let len = header.header_len as usize;
    if len < MIN_HEADER_LEN {
        return Err(FormatError::InvalidHeader(format!("header length {} too short", len)));
    }
    if len > data.len() {
        return Err(FormatError::UnexpectedEof);
    }
    Ok(header)
}
