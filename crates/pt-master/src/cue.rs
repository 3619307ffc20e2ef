//! Tones scheduled against score time.

use std::fmt;
use std::str::FromStr;

/// A tone to fire `at_ms` milliseconds after the score starts.
///
/// Written as `HZ:MS@AT`, e.g. `880:200@1500`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToneCue {
    pub at_ms: u32,
    pub frequency: u16,
    pub duration_ms: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid tone cue `{0}`, expected HZ:MS@AT (e.g. 880:200@1500)")]
pub struct ParseCueError(String);

impl FromStr for ToneCue {
    type Err = ParseCueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseCueError(s.to_string());
        let (tone, at) = s.split_once('@').ok_or_else(invalid)?;
        let (hz, ms) = tone.split_once(':').ok_or_else(invalid)?;
        Ok(ToneCue {
            at_ms: at.trim().parse().map_err(|_| invalid())?,
            frequency: hz.trim().parse().map_err(|_| invalid())?,
            duration_ms: ms.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for ToneCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.frequency, self.duration_ms, self.at_ms)
    }
}
