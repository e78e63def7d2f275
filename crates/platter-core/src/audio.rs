//! Audio device boundary
//!
//! Opens one cpal output stream and hands its callback the audio-thread
//! bundle. The callback owns the engine core outright — no lock sits
//! between the device and the mixer. The engine itself never depends on
//! this module; tests drive [`EngineCore::render`] directly.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use thiserror::Error;

use crate::control::{start_engine, EngineHandle};
use crate::engine::EngineCore;
use crate::types::{FRAMES_PER_BUFFER, MAX_BUFFER_SAMPLES, SAMPLE_RATE};

/// Errors from bringing up the output stream. Fatal to the engine process;
/// there is no fallback device logic beyond the host default.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("failed to query device configs: {0}")]
    Config(String),

    #[error("failed to build audio stream: {0}")]
    StreamBuild(String),

    #[error("failed to start audio stream: {0}")]
    StreamPlay(String),
}

/// Output stream configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Preferred sample rate; the device may impose another.
    pub sample_rate: u32,
    /// Requested buffer size in frames.
    pub buffer_size: u32,
    /// Specific output device by name; None uses the host default.
    pub device_name: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            buffer_size: FRAMES_PER_BUFFER,
            device_name: None,
        }
    }
}

/// Keeps the output stream alive. Drop it to stop audio.
pub struct AudioHandle {
    _stream: Stream,
    sample_rate: u32,
    buffer_size: u32,
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// One-way output latency in milliseconds.
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }
}

/// Start the engine against a real output device.
pub fn start(config: &AudioConfig) -> Result<(AudioHandle, EngineHandle), AudioError> {
    let host = cpal::default_host();
    let device = match &config.device_name {
        Some(name) => host
            .output_devices()
            .map_err(|e| AudioError::Config(e.to_string()))?
            .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
            .ok_or(AudioError::NoDevice)?,
        None => host.default_output_device().ok_or(AudioError::NoDevice)?,
    };
    log::info!(
        "using output device: {}",
        device.name().unwrap_or_else(|_| "unknown".to_string())
    );

    let (stream_config, sample_rate) = pick_output_config(&device, config)?;
    log::info!(
        "output: {} channels at {} Hz, {} frames (~{:.1} ms)",
        stream_config.channels,
        sample_rate,
        config.buffer_size,
        (config.buffer_size as f32 / sample_rate as f32) * 1000.0,
    );

    let (core, handle) = start_engine(sample_rate);
    let stream = build_output_stream(&device, &stream_config, core)?;
    stream
        .play()
        .map_err(|e| AudioError::StreamPlay(e.to_string()))?;
    log::info!("audio stream started");

    Ok((
        AudioHandle {
            _stream: stream,
            sample_rate,
            buffer_size: config.buffer_size,
        },
        handle,
    ))
}

/// Choose an f32 stereo output config, preferring the requested rate.
fn pick_output_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> Result<(StreamConfig, u32), AudioError> {
    let supported: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::Config(e.to_string()))?
        .collect();
    if supported.is_empty() {
        return Err(AudioError::Config("no supported output configs".into()));
    }

    let best = supported
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| c.channels() >= 2)
        .find(|c| {
            config.sample_rate >= c.min_sample_rate().0
                && config.sample_rate <= c.max_sample_rate().0
        })
        .or_else(|| supported.iter().find(|c| c.channels() >= 2))
        .or_else(|| supported.first())
        .ok_or_else(|| AudioError::Config("no usable output config".into()))?;

    let sample_rate = if config.sample_rate >= best.min_sample_rate().0
        && config.sample_rate <= best.max_sample_rate().0
    {
        cpal::SampleRate(config.sample_rate)
    } else {
        let fallback = best.max_sample_rate();
        log::warn!(
            "device does not support {} Hz, falling back to {} Hz",
            config.sample_rate,
            fallback.0
        );
        fallback
    };

    let stream_config = StreamConfig {
        channels: best.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
    };
    Ok((stream_config, sample_rate.0))
}

/// Build the output stream. The callback owns the engine core and a
/// pre-sized stereo scratch buffer; it renders the mix and fans it out
/// onto however many channels the device exposes.
fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut core: EngineCore,
) -> Result<Stream, AudioError> {
    let channels = config.channels as usize;
    let mut mix: Vec<f32> = Vec::with_capacity(MAX_BUFFER_SAMPLES);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                mix.resize(frames * 2, 0.0);
                core.render(&mut mix);

                for (frame, pair) in data.chunks_mut(channels).zip(mix.chunks(2)) {
                    frame[0] = pair[0];
                    if channels > 1 {
                        frame[1] = pair[1];
                    }
                    for extra in frame.iter_mut().skip(2) {
                        *extra = 0.0;
                    }
                }
            },
            move |err| {
                log::error!("audio stream error: {err}");
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

    Ok(stream)
}
