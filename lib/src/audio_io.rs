//! Audio I/O functionality using Symphonia
//!
//! Decodes audio containers into a mono `Signal` for plotting, and writes
//! test signals as WAV files.

use std::error::Error;
#[cfg(not(target_arch = "wasm32"))]
use std::fs::File;
use std::io::Cursor;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::signal::Signal;

/// Audio metadata information
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_samples: usize,
    pub duration_seconds: f64,
}

impl AudioInfo {
    pub fn new(sample_rate: u32, channels: usize, duration_samples: usize) -> Self {
        let duration_seconds = duration_samples as f64 / sample_rate as f64;
        Self {
            sample_rate,
            channels,
            duration_samples,
            duration_seconds,
        }
    }
}

/// Decode the first channel of a MediaSourceStream
fn read_audio_stream(mss: MediaSourceStream) -> Result<(AudioInfo, Signal), Box<dyn Error>> {
    let hint = Hint::new();
    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed =
        symphonia::default::get_probe().format(&hint, mss, &format_opts, &metadata_opts)?;

    let track = probed
        .format
        .default_track()
        .ok_or("No default track found")?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|_| "Unsupported codec")?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or("Sample rate not specified")?;

    let channels = track
        .codec_params
        .channels
        .ok_or("Channels not specified")?
        .count();

    if channels > 1 {
        log::warn!(
            "Source has {} channels, only the first one is used",
            channels
        );
    }

    let mut samples: Vec<f64> = Vec::new();
    let mut format = probed.format;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(err)) => {
                if err.kind() == std::io::ErrorKind::UnexpectedEof {
                    break;
                }
                return Err(Box::new(err));
            }
            Err(err) => return Err(Box::new(err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::IoError(err)) => {
                if err.kind() == std::io::ErrorKind::UnexpectedEof {
                    break;
                }
                return Err(Box::new(err));
            }
            Err(err) => return Err(Box::new(err)),
        };

        let mut buffer = SampleBuffer::<f64>::new(decoded.capacity() as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);
        samples.extend(buffer.samples().iter().step_by(channels.max(1)));
    }

    let info = AudioInfo::new(sample_rate, channels, samples.len());
    Ok((info, Signal::new(samples, sample_rate)))
}

/// Read audio file from filesystem path
#[cfg(not(target_arch = "wasm32"))]
pub fn read_audio_file<P: AsRef<Path>>(path: P) -> Result<(AudioInfo, Signal), Box<dyn Error>> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    read_audio_stream(mss)
}

/// Read audio data from byte buffer
pub fn read_audio_bytes(data: Vec<u8>) -> Result<(AudioInfo, Signal), Box<dyn Error>> {
    let cursor = Cursor::new(data);
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());
    read_audio_stream(mss)
}

fn mono_float_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Write a signal to a 32-bit float mono WAV file
#[cfg(not(target_arch = "wasm32"))]
pub fn write_signal_file<P: AsRef<Path>>(path: P, signal: &Signal) -> Result<(), Box<dyn Error>> {
    let mut writer = WavWriter::create(path, mono_float_spec(signal.sample_rate()))?;
    for &sample in signal.samples() {
        writer.write_sample(sample as f32)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write a signal as 32-bit float mono WAV into memory
pub fn write_signal_bytes(signal: &Signal) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, mono_float_spec(signal.sample_rate()))?;
        for &sample in signal.samples() {
            writer.write_sample(sample as f32)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Sine test tone
pub fn tone(frequency: f64, sample_rate: u32, seconds: f64, amplitude: f64) -> Signal {
    let len = (seconds * sample_rate as f64).round().max(0.0) as usize;
    let step = 2.0 * std::f64::consts::PI * frequency / sample_rate as f64;
    Signal::new(
        (0..len).map(|i| amplitude * (step * i as f64).sin()).collect(),
        sample_rate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_info() {
        let info = AudioInfo::new(44100, 2, 44100);
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 2);
        assert!((info.duration_seconds - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_tone() {
        let signal = tone(1000.0, 48000, 0.5, 0.5);
        assert_eq!(signal.len(), 24000);
        assert_eq!(signal.sample_rate(), 48000);
        assert!(signal.samples().iter().all(|s| s.abs() <= 0.5));
    }

    #[test]
    fn test_write_read_signal_bytes() {
        let signal = tone(440.0, 44100, 0.05, 0.5);

        let wav_bytes = write_signal_bytes(&signal).unwrap();
        assert!(!wav_bytes.is_empty());

        let (info, read) = read_audio_bytes(wav_bytes).unwrap();
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 1);
        assert_eq!(read.len(), signal.len());

        for (i, (&original, &decoded)) in signal.samples().iter().zip(read.samples()).enumerate()
        {
            let diff = (original - decoded).abs();
            assert!(
                diff < 1e-5,
                "Sample {}: {} != {} (diff: {})",
                i,
                original,
                decoded,
                diff
            );
        }
    }
}
