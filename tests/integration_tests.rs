//! Integration tests for audio analysis engine

use sonority_dsp::{
    analyze_audio, AnalysisConfig, AnalysisError, AnalysisFlag, PitchClass, NO_TEMPO_BPM,
    SILENCE_LUFS,
};
use std::path::Path;

/// Load a WAV file and return (samples, sample_rate)
fn load_wav(path: &Path) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    // Convert to mono if stereo
    let mono_samples = if spec.channels == 2 {
        samples
            .chunks(2)
            .map(|chunk| (chunk[0] + chunk[1]) / 2.0)
            .collect()
    } else {
        samples
    };

    Ok((mono_samples, spec.sample_rate))
}

/// Write mono 16-bit PCM
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}

fn sine(freq: f32, amplitude: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate as f32 * seconds) as usize;
    (0..len)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            amplitude * (2.0 * std::f64::consts::PI * freq as f64 * t).sin() as f32
        })
        .collect()
}

/// Decaying 1 kHz bursts, one per beat
fn click_train(bpm: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate as f32 * seconds) as usize;
    let period = (60.0 * sample_rate as f64 / bpm as f64) as usize;
    let burst = (sample_rate as usize) / 50;
    (0..len)
        .map(|i| {
            let n = i % period;
            if n < burst {
                let t = n as f64 / sample_rate as f64;
                ((-t * 300.0).exp() * (2.0 * std::f64::consts::PI * 1000.0 * t).sin()) as f32
            } else {
                0.0
            }
        })
        .collect()
}

/// Deterministic uniform noise in [-amplitude, amplitude]
fn white_noise(len: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
            amplitude * (2.0 * unit - 1.0)
        })
        .collect()
}

#[test]
fn test_a440_key_and_tuning() {
    let samples = sine(440.0, 0.5, 44100, 5.0);
    let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();

    assert_eq!(result.key, PitchClass::A);
    assert!(
        result.key_confidence >= 0.8,
        "key confidence {:.3}",
        result.key_confidence
    );
    assert!(!result.has_flag(AnalysisFlag::ChromaDisagreement));
    assert!(result.tuning.abs() < 0.02, "tuning {:.4}", result.tuning);
    assert!((result.duration - 5.0).abs() < 1e-6);
}

#[test]
fn test_c5_key_at_48k() {
    let samples = sine(523.25, 0.3, 48000, 3.0);
    let result = analyze_audio(&samples, 48000, AnalysisConfig::default()).unwrap();
    assert_eq!(result.key, PitchClass::C);
    assert_eq!(result.key_name(), "C");
}

/// Equal-tempered frequency of a MIDI note with A4 = 440 Hz
fn midi_frequency(midi: u32) -> f32 {
    440.0 * 2.0f32.powf((midi as f32 - 69.0) / 12.0)
}

#[test]
fn test_semitone_tones_across_octaves_and_rates() {
    // Steps of 5 semitones visit all 12 pitch classes between C2 and C7
    for sample_rate in [22050u32, 44100, 48000] {
        for midi in (36..=96).step_by(5) {
            let samples = sine(midi_frequency(midi), 0.5, sample_rate, 1.5);
            let result = analyze_audio(&samples, sample_rate, AnalysisConfig::default()).unwrap();
            let expected = PitchClass::from_index(midi as usize % 12);

            assert_eq!(result.key, expected, "MIDI {} at {} Hz", midi, sample_rate);
            assert!(
                result.key_confidence >= 0.8,
                "MIDI {} at {} Hz: confidence {:.3}",
                midi,
                sample_rate,
                result.key_confidence
            );
            assert!(
                !result.has_flag(AnalysisFlag::ChromaDisagreement),
                "MIDI {} at {} Hz: chroma methods disagree",
                midi,
                sample_rate
            );
            assert!(
                result.tuning.abs() <= 0.02,
                "MIDI {} at {} Hz: tuning {:.4}",
                midi,
                sample_rate,
                result.tuning
            );
        }
    }
}

#[test]
fn test_every_pitch_class_in_bass_register() {
    // C2..B2, where one 44.1 kHz STFT bin spans two to four semitones
    for midi in 36..48 {
        let samples = sine(midi_frequency(midi), 0.5, 44100, 2.0);
        let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();
        assert_eq!(result.key.index(), midi as usize % 12, "MIDI {}", midi);
        assert!(
            result.key_confidence >= 0.8,
            "MIDI {}: confidence {:.3}",
            midi,
            result.key_confidence
        );
    }
}

#[test]
fn test_sustained_tones_have_no_tempo() {
    for freq in [65.406f32, 146.83, 440.0, 1000.0] {
        let samples = sine(freq, 0.5, 44100, 6.0);
        let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();
        assert_eq!(result.bpm, NO_TEMPO_BPM, "{} Hz reported {:.2} BPM", freq, result.bpm);
        assert!(result.has_flag(AnalysisFlag::NoPeriodicity));
    }
}

#[test]
fn test_detuned_tone_reports_tuning() {
    let freq = 440.0 * 2.0f32.powf(0.3 / 12.0);
    let samples = sine(freq, 0.5, 44100, 3.0);
    let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();

    assert!((result.tuning - 0.3).abs() < 0.03, "tuning {:.4}", result.tuning);
    assert_eq!(result.key, PitchClass::A);
}

#[test]
fn test_120bpm_click_train() {
    let samples = click_train(120.0, 44100, 10.0);
    let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();

    assert!(
        (result.bpm - 120.0).abs() <= 2.0,
        "Expected ~120 BPM, got {:.2}",
        result.bpm
    );
    assert!(!result.has_flag(AnalysisFlag::NoPeriodicity));
}

#[test]
fn test_90bpm_click_train() {
    let samples = click_train(90.0, 44100, 12.0);
    let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();
    assert!(
        (result.bpm - 90.0).abs() <= 2.0,
        "Expected ~90 BPM, got {:.2}",
        result.bpm
    );
}

#[test]
fn test_silence() {
    let samples = vec![0.0f32; 44100 * 2];
    let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();

    assert_eq!(result.bpm, NO_TEMPO_BPM);
    assert_eq!(result.lufs, SILENCE_LUFS);
    assert!(result.key_confidence < 0.01);
    assert!(!result.bpm.is_nan() && !result.key_confidence.is_nan() && !result.lufs.is_nan());
    assert!(result.has_flag(AnalysisFlag::Silent));
    assert!(result.has_flag(AnalysisFlag::NoPeriodicity));
}

#[test]
fn test_duration_matches_length() {
    for (len, sample_rate) in [(44100usize, 44100u32), (12345, 22050), (96000, 48000)] {
        let samples = sine(440.0, 0.2, sample_rate, len as f32 / sample_rate as f32);
        let samples = &samples[..len.min(samples.len())];
        let result = analyze_audio(samples, sample_rate, AnalysisConfig::default()).unwrap();
        let expected = samples.len() as f32 / sample_rate as f32;
        assert!((result.duration - expected).abs() < 1e-6);
    }
}

#[test]
fn test_deterministic() {
    let mut samples = sine(440.0, 0.3, 44100, 4.0);
    for (s, c) in samples.iter_mut().zip(click_train(120.0, 44100, 4.0)) {
        *s += 0.5 * c;
    }
    let config = AnalysisConfig::default();

    let first = analyze_audio(&samples, 44100, config.clone()).unwrap();
    let second = analyze_audio(&samples, 44100, config).unwrap();

    assert_eq!(first.bpm.to_bits(), second.bpm.to_bits());
    assert_eq!(first.key_confidence.to_bits(), second.key_confidence.to_bits());
    assert_eq!(first.lufs.to_bits(), second.lufs.to_bits());
    assert_eq!(first.tuning.to_bits(), second.tuning.to_bits());
    assert_eq!(first, second);
}

#[test]
fn test_empty_and_invalid_input() {
    assert_eq!(
        analyze_audio(&[], 44100, AnalysisConfig::default()).unwrap_err(),
        AnalysisError::EmptyInput
    );
    assert!(matches!(
        analyze_audio(&[0.1; 100], 0, AnalysisConfig::default()),
        Err(AnalysisError::InvalidInput(_))
    ));
}

#[test]
fn test_short_buffers() {
    // Shorter than one STFT window and one loudness block
    let samples = sine(440.0, 0.5, 44100, 0.01);
    let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();
    assert_eq!(result.bpm, NO_TEMPO_BPM);
    assert!(result.lufs.is_finite());

    let result = analyze_audio(&[0.25], 44100, AnalysisConfig::default()).unwrap();
    assert!(!result.key_confidence.is_nan());
}

#[test]
fn test_white_noise_tuning_near_zero() {
    let samples = white_noise(44100 * 3, 0.3, 7);
    let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();
    assert!(result.tuning.abs() < 0.1, "tuning {:.3}", result.tuning);
    assert!(result.lufs.is_finite());
}

#[test]
fn test_low_sample_rate_degrades_without_error() {
    let samples = sine(440.0, 0.5, 8000, 2.0);
    let result = analyze_audio(&samples, 8000, AnalysisConfig::default()).unwrap();
    assert_eq!(result.key, PitchClass::A);
}

#[test]
fn test_wav_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("click_and_tone.wav");

    let mut samples = sine(440.0, 0.2, 44100, 8.0);
    for (s, c) in samples.iter_mut().zip(click_train(120.0, 44100, 8.0)) {
        *s += 0.6 * c;
    }
    write_wav(&path, &samples, 44100).unwrap();

    let (loaded, sample_rate) = load_wav(&path).unwrap();
    assert_eq!(sample_rate, 44100);
    assert_eq!(loaded.len(), samples.len());

    let result = analyze_audio(&loaded, sample_rate, AnalysisConfig::default()).unwrap();
    assert!((result.duration - 8.0).abs() < 1e-6);
    assert!(
        (result.bpm - 120.0).abs() <= 2.0,
        "Expected ~120 BPM, got {:.2}",
        result.bpm
    );
    assert_eq!(result.key, PitchClass::A);
    assert!(result.lufs.is_finite() && result.lufs < 0.0);
}

#[test]
fn test_result_serializes_like_service_response() {
    let samples = sine(440.0, 0.5, 22050, 2.0);
    let result = analyze_audio(&samples, 22050, AnalysisConfig::default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    for field in ["bpm", "key", "key_confidence", "lufs", "duration", "tuning", "flags"] {
        assert!(json.get(field).is_some(), "missing field {}", field);
    }
    assert_eq!(json["key"], "A");
}

#[test]
fn test_tempo_prior_config() {
    let samples = click_train(120.0, 44100, 10.0);
    let config = AnalysisConfig {
        tempo_prior_bpm: Some(60.0),
        ..AnalysisConfig::default()
    };
    let result = analyze_audio(&samples, 44100, config).unwrap();
    assert!(
        (result.bpm - 60.0).abs() <= 2.0,
        "Prior should pull toward 60 BPM, got {:.2}",
        result.bpm
    );
}
