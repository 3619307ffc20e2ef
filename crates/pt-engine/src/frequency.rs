//! Note-to-frequency conversion.
//!
//! Two tables cover the 128 MIDI notes: notes below [`TABLE_SPLIT`] fit in a
//! byte, the rest need a word. Entries are twice the pitch in Hz, rounded,
//! which keeps the low octaves accurate without fractional storage.
//! Generated by `round(2 * 440 / 32 * 2^((n - 9) / 12))`.

/// First note served by the word table.
pub const TABLE_SPLIT: u8 = 48;

/// Highest note with a frequency.
pub const MAX_NOTE: u8 = 127;

const LOW_TABLE: [u8; TABLE_SPLIT as usize] = [
    16, 17, 18, 19, 21, 22, 23, 24, 26, 28, 29, 31, 33, 35, 37, 39, 41, 44, 46, 49, 52, 55, 58, 62,
    65, 69, 73, 78, 82, 87, 92, 98, 104, 110, 117, 123, 131, 139, 147, 156, 165, 175, 185, 196,
    208, 220, 233, 247,
];

const HIGH_TABLE: [u16; (MAX_NOTE - TABLE_SPLIT + 1) as usize] = [
    262, 277, 294, 311, 330, 349, 370, 392, 415, 440, 466, 494, 523, 554, 587, 622, 659, 698, 740,
    784, 831, 880, 932, 988, 1047, 1109, 1175, 1245, 1319, 1397, 1480, 1568, 1661, 1760, 1865,
    1976, 2093, 2217, 2349, 2489, 2637, 2794, 2960, 3136, 3322, 3520, 3729, 3951, 4186, 4435,
    4699, 4978, 5274, 5588, 5920, 6272, 6645, 7040, 7459, 7902, 8372, 8870, 9397, 9956, 10548,
    11175, 11840, 12544, 13290, 14080, 14917, 15804, 16744, 17740, 18795, 19912, 21096, 22351,
    23680, 25088,
];

/// Raw table entry (twice the pitch in Hz). `None` above [`MAX_NOTE`].
pub const fn doubled_frequency(note: u8) -> Option<u16> {
    if note > MAX_NOTE {
        None
    } else if note < TABLE_SPLIT {
        Some(LOW_TABLE[note as usize] as u16)
    } else {
        Some(HIGH_TABLE[(note - TABLE_SPLIT) as usize])
    }
}

/// Pitch of a MIDI note in Hz. Notes above 127 have no frequency.
pub fn frequency_of(note: u8) -> Option<f32> {
    doubled_frequency(note).map(|f| f as f32 / 2.0)
}
