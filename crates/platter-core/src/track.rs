//! WAV track loading
//!
//! Decodes 16-bit PCM WAV files into the engine's in-memory track format:
//! interleaved 32-bit floats normalized to [-1, 1]. Entire tracks are held
//! in RAM; a buffer is immutable once loaded and is replaced wholesale when
//! a new file lands on the deck.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// 16-bit PCM to float scale.
const SCALE: f32 = 1.0 / 32768.0;

/// Errors from opening or decoding a track file.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a RIFF/WAVE file")]
    InvalidFormat,

    #[error("missing required chunk: {0}")]
    MissingChunk(&'static str),

    #[error("unsupported encoding: format tag {0} (expected PCM)")]
    UnsupportedEncoding(u16),

    #[error("unsupported bit depth: {0} (expected 16)")]
    UnsupportedBitDepth(u16),

    #[error("file corrupted: {0}")]
    Corrupted(String),
}

/// Format description from the fmt chunk.
#[derive(Debug, Clone)]
struct WavFormat {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

impl WavFormat {
    fn validate(&self) -> Result<(), TrackError> {
        if self.format_tag != 1 {
            return Err(TrackError::UnsupportedEncoding(self.format_tag));
        }
        if self.bits_per_sample != 16 {
            return Err(TrackError::UnsupportedBitDepth(self.bits_per_sample));
        }
        if self.channels == 0 || self.sample_rate == 0 {
            return Err(TrackError::Corrupted(format!(
                "{} channels at {} Hz",
                self.channels, self.sample_rate
            )));
        }
        Ok(())
    }
}

/// A fully decoded track held in memory.
#[derive(Debug)]
pub struct TrackBuffer {
    /// Source file path.
    pub path: PathBuf,
    /// Interleaved samples, normalized to [-1, 1].
    pub samples: Vec<f32>,
    /// Channel count of the source file.
    pub channels: usize,
    /// Sample rate of the source file. Drives all duration/position math;
    /// playback through a device at a different rate is pitch-shifted.
    pub sample_rate: u32,
}

impl TrackBuffer {
    /// Decode a 16-bit PCM WAV file.
    pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<Self, TrackError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut header = [0u8; 12];
        reader.read_exact(&mut header)?;
        if &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
            return Err(TrackError::InvalidFormat);
        }

        // Walk the chunk list for fmt and data.
        let mut format: Option<WavFormat> = None;
        let mut data_offset: Option<u64> = None;
        let mut data_size: Option<u32> = None;

        loop {
            let mut chunk_id = [0u8; 4];
            if reader.read_exact(&mut chunk_id).is_err() {
                break;
            }
            let mut size_bytes = [0u8; 4];
            reader.read_exact(&mut size_bytes)?;
            let chunk_size = u32::from_le_bytes(size_bytes);

            match &chunk_id {
                b"fmt " => {
                    format = Some(read_fmt_chunk(&mut reader, chunk_size)?);
                }
                b"data" => {
                    data_offset = Some(reader.stream_position()?);
                    data_size = Some(chunk_size);
                    reader.seek(SeekFrom::Current(chunk_size as i64))?;
                }
                _ => {
                    reader.seek(SeekFrom::Current(chunk_size as i64))?;
                }
            }

            // Chunks are word-aligned.
            if chunk_size % 2 != 0 {
                reader.seek(SeekFrom::Current(1))?;
            }
        }

        let format = format.ok_or(TrackError::MissingChunk("fmt"))?;
        let data_offset = data_offset.ok_or(TrackError::MissingChunk("data"))?;
        let data_size = data_size.ok_or(TrackError::MissingChunk("data"))?;
        format.validate()?;

        reader.seek(SeekFrom::Start(data_offset))?;
        let mut raw = vec![0u8; data_size as usize];
        reader.read_exact(&mut raw).map_err(|_| {
            TrackError::Corrupted(format!("data chunk truncated ({} bytes)", data_size))
        })?;

        let samples: Vec<f32> = raw
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 * SCALE)
            .collect();

        log::debug!(
            "decoded {:?}: {} samples, {} ch, {} Hz",
            path,
            samples.len(),
            format.channels,
            format.sample_rate
        );

        Ok(Self {
            path: path.to_path_buf(),
            samples,
            channels: format.channels as usize,
            sample_rate: format.sample_rate,
        })
    }

    /// Track length in seconds (0 for an empty buffer).
    pub fn duration_seconds(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.len() as f64 / self.channels as f64 / self.sample_rate as f64
    }

    /// Scalar samples per second of the interleaved buffer.
    pub fn slot_rate(&self) -> usize {
        self.channels * self.sample_rate as usize
    }
}

fn read_fmt_chunk(reader: &mut BufReader<File>, size: u32) -> Result<WavFormat, TrackError> {
    if size < 16 {
        return Err(TrackError::Corrupted("fmt chunk too small".into()));
    }

    let mut fmt = vec![0u8; size as usize];
    reader.read_exact(&mut fmt)?;

    Ok(WavFormat {
        format_tag: u16::from_le_bytes([fmt[0], fmt[1]]),
        channels: u16::from_le_bytes([fmt[2], fmt[3]]),
        sample_rate: u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]),
        bits_per_sample: u16::from_le_bytes([fmt[14], fmt[15]]),
    })
}
