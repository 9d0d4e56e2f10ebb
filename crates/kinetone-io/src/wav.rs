//! WAV file reading and writing.
//!
//! Samples are `f64` in [-1, 1) in memory. Integer files are scaled by `2^(bits-1)` on
//! the way in and clipped on the way out; 32-bit files are IEEE float.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::{AudioBuffer, Error, Result};

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
///
/// # Errors
///
/// [`Error::Wav`] if the file cannot be opened or its header is invalid.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.duration());

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
        format: match spec.sample_format {
            SampleFormat::Float => WavFormat::IeeeFloat,
            SampleFormat::Int => WavFormat::Pcm,
        },
    })
}

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample: 16 or 24 for PCM, 32 for float.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Full-scale value of a signed integer sample with `bits` bits.
fn int_full_scale(bits: u16) -> f64 {
    f64::from(1u32 << (bits - 1))
}

/// Read a mono or stereo WAV file.
///
/// # Errors
///
/// [`Error::UnsupportedChannels`] for files with no channels or more than two,
/// [`Error::UnsupportedBitDepth`] for integer files wider than 32 bits, and
/// [`Error::Wav`] for anything hound rejects.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(AudioBuffer, WavSpec)> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let hound_spec = reader.spec();
    let spec = WavSpec::from(hound_spec);

    if !(1..=2).contains(&spec.channels) {
        return Err(Error::UnsupportedChannels(spec.channels));
    }

    let interleaved: Vec<f64> = match hound_spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            if !(1..=32).contains(&spec.bits_per_sample) {
                return Err(Error::UnsupportedBitDepth(spec.bits_per_sample));
            }
            let full_scale = int_full_scale(spec.bits_per_sample);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / full_scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let buffer = AudioBuffer::from_interleaved(&interleaved, usize::from(spec.channels));
    tracing::info!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = buffer.num_frames(),
        "read WAV file"
    );
    Ok((buffer, spec))
}

/// Write a buffer to a WAV file.
///
/// The channel count comes from `buffer`; `spec` supplies the sample rate and bit depth.
/// Integer output is clipped to full scale.
///
/// # Errors
///
/// [`Error::UnsupportedBitDepth`] unless the depth is 16, 24 or 32,
/// [`Error::UnsupportedChannels`] for an empty buffer or more than two channels, and
/// [`Error::Wav`] for write failures.
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer, spec: WavSpec) -> Result<()> {
    let path = path.as_ref();
    if !matches!(spec.bits_per_sample, 16 | 24 | 32) {
        return Err(Error::UnsupportedBitDepth(spec.bits_per_sample));
    }
    let channels = u16::try_from(buffer.num_channels()).unwrap_or(u16::MAX);
    if !(1..=2).contains(&channels) {
        return Err(Error::UnsupportedChannels(channels));
    }

    let spec = WavSpec { channels, ..spec };
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
    let interleaved = buffer.to_interleaved();

    if spec.bits_per_sample == 32 {
        for &sample in &interleaved {
            writer.write_sample(sample as f32)?;
        }
    } else {
        let full_scale = int_full_scale(spec.bits_per_sample);
        for &sample in &interleaved {
            let scaled = (sample * full_scale).round().clamp(-full_scale, full_scale - 1.0);
            writer.write_sample(scaled as i32)?;
        }
    }
    writer.finalize()?;

    tracing::info!(
        path = %path.display(),
        channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = buffer.num_frames(),
        "wrote WAV file"
    );
    Ok(())
}
