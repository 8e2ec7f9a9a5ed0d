//! Dump the format and cue table of a WAV file.

use anyhow::{bail, Context, Result};

use lectern_core::wav::WavReader;

fn main() -> Result<()> {
    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: cue-inspect <file.wav>");
    };

    let reader = WavReader::open(&path).with_context(|| format!("failed to open {}", path))?;

    let format = reader.format();
    println!("{}", path);
    println!(
        "  format:   {} ch, {} Hz, {}-bit PCM",
        format.channels, format.sample_rate, format.bits_per_sample
    );
    println!("  frames:   {}", reader.frame_count());
    println!("  duration: {:.2}s", reader.duration_seconds());

    if reader.cues().is_empty() {
        println!("  no cue points");
    } else {
        println!("  cues:");
        for cue in reader.cues() {
            println!("    {:>6}  @ frame {}", cue.label, cue.location);
        }
    }

    Ok(())
}
