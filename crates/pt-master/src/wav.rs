//! WAV encoding for 16-bit mono PCM.
//!
//! The synth voices are unpanned, so each frame collapses to one sample.

use pt_engine::Frame;
use std::io::Write;

const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);

/// Most frames a RIFF size field can describe.
pub const MAX_WAV_FRAMES: u64 = (u32::MAX as u64 - 36) / BLOCK_ALIGN as u64;

pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    if frames.len() as u64 > MAX_WAV_FRAMES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "too many frames for a WAV file",
        ));
    }
    let data_size = frames.len() as u32 * BLOCK_ALIGN as u32;

    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&NUM_CHANNELS.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * BLOCK_ALIGN as u32).to_le_bytes())?;
    w.write_all(&BLOCK_ALIGN.to_le_bytes())?;
    w.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for frame in frames {
        w.write_all(&mono_sample(frame).to_le_bytes())?;
    }
    Ok(())
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(44 + frames.len() * BLOCK_ALIGN as usize);
    write_wav(&mut buf, frames, sample_rate)?;
    Ok(buf)
}

fn mono_sample(frame: &Frame) -> i16 {
    ((frame.left as i32 + frame.right as i32) / 2) as i16
}
