//! Example: Analyze a single WAV file
//!
//! Decodes a WAV file with `hound`, downmixes it to mono and prints the
//! analysis as the JSON object the analysis service responds with.
//!
//! ```text
//! cargo run --release --example analyze_file -- track.wav
//! RUST_LOG=debug cargo run --example analyze_file -- track.wav
//! ```

use sonority_dsp::{analyze_audio, AnalysisConfig};
use std::path::Path;
use std::process::ExitCode;

/// Decode a WAV file to mono f32 samples in [-1, 1]
fn load_wav(path: &Path) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}

fn main() -> ExitCode {
    // Initialize logger
    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: analyze_file <input.wav>");
        return ExitCode::from(2);
    };

    let (samples, sample_rate) = match load_wav(Path::new(&path)) {
        Ok(decoded) => decoded,
        Err(e) => {
            eprintln!("Could not decode {}: {}", path, e);
            return ExitCode::from(2);
        }
    };

    match analyze_audio(&samples, sample_rate, AnalysisConfig::default()) {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Could not serialize result: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) if e.is_client_error() => {
            eprintln!("Rejected: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
