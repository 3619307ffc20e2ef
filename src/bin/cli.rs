//! playtune CLI: headless score playback and WAV export.
//!
//! Usage:
//!   pt-cli path/to/score.bin
//!   pt-cli path/to/score.c --wav output.wav --seconds 30
//!   pt-cli path/to/score.bin --tone 880:200@1500 --tone-mutes-score

use anyhow::{Context, Result};
use clap::Parser;
use pt_master::{Controller, ToneCue};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "pt-cli")]
#[command(about = "Play Playtune scores or render them to WAV")]
#[command(version)]
struct Cli {
    /// Score file: Playtune bytestream, or C source with a byte array (.c, .h, .ino)
    score: PathBuf,

    /// Render to this WAV file instead of playing
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Stop after this many seconds (looping scores never end on their own)
    #[arg(long, default_value_t = 60)]
    seconds: u32,

    /// Sample rate for WAV rendering
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Run with sound disabled; notes keep their timing but stay silent
    #[arg(long)]
    mute: bool,

    /// Play a tone of HZ for MS milliseconds, AT ms after the score starts
    #[arg(long = "tone", value_name = "HZ:MS@AT")]
    tones: Vec<ToneCue>,

    /// Let tones silence the score's second channel
    #[arg(long)]
    tone_mutes_score: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut ctrl = Controller::new();
    ctrl.set_sound_enabled(!cli.mute);
    ctrl.set_tone_mutes_score(cli.tone_mutes_score);
    load(&mut ctrl, &cli.score)?;
    for cue in &cli.tones {
        ctrl.add_tone_cue(*cue);
    }

    if let Some(header) = ctrl.header() {
        println!("Header:   {} tone generators", header.tone_generators);
    }
    if let Some(summary) = ctrl.summary() {
        print!("{}", summary);
    }
    println!();

    match &cli.wav {
        Some(wav) => render_to_wav(&ctrl, wav, cli.sample_rate, cli.seconds),
        None => play_audio(&mut ctrl, cli.seconds),
    }
}

fn load(ctrl: &mut Controller, path: &Path) -> Result<()> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let is_source = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "c" | "h" | "cpp" | "ino"));

    let loaded = if is_source {
        let source = String::from_utf8(data)
            .with_context(|| format!("{} is not UTF-8 text", path.display()))?;
        ctrl.load_c_source(&source).map(|_| ())
    } else {
        ctrl.load_score(&data).map(|_| ())
    };
    loaded.with_context(|| format!("failed to load {}", path.display()))
}

fn play_audio(ctrl: &mut Controller, max_seconds: u32) -> Result<()> {
    ctrl.play().context("failed to start playback")?;
    if let Some(rate) = ctrl.sample_rate() {
        log::info!("playing at {} Hz", rate);
    }
    println!("Playing...");

    let cues = ctrl.tone_cues().to_vec();
    let mut pending = cues.iter().peekable();
    let started = Instant::now();
    let limit = Duration::from_secs(max_seconds as u64);
    while (ctrl.is_playing() || ctrl.is_tone_playing() || pending.peek().is_some())
        && started.elapsed() < limit
    {
        let elapsed_ms = started.elapsed().as_millis();
        while let Some(cue) = pending.next_if(|c| u128::from(c.at_ms) <= elapsed_ms) {
            log::info!("tone {}", cue);
            ctrl.tone(cue.frequency, cue.duration_ms).context("failed to play tone")?;
        }
        if let Some(player) = ctrl.player() {
            print!("\rOffset: {:04X} | Wait: {:5} ms", player.cursor(), player.countdown());
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    ctrl.close();
    println!("\rDone.                          ");
    Ok(())
}

fn render_to_wav(ctrl: &Controller, path: &Path, sample_rate: u32, max_seconds: u32) -> Result<()> {
    println!("Rendering to {} at {} Hz...", path.display(), sample_rate);

    let wav = ctrl.render_to_wav(sample_rate, max_seconds)?;
    println!("Rendered {} bytes", wav.len());

    fs::write(path, &wav).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Done.");
    Ok(())
}
