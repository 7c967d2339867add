//! Frame sources and audio output seams
//!
//! Decoding proper lives outside this crate. A [`FrameSource`] hands out
//! decoded frames one at a time and an [`AudioSink`] plays decoded sample
//! buffers. `GifFrames` is the one decoder shipped here, built on the `image`
//! crate's GIF support.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Arc;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, Frames, ImageDecoder};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::{Size, Surface};

/// A decoded mono audio track, signed 16 bit samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub sample_rate: u32,
    pub samples: Arc<[i16]>,
}

impl AudioTrack {
    pub fn new(sample_rate: u32, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            samples: samples.into(),
        }
    }

    /// Reads raw little endian s16 mono PCM. A trailing odd byte is ignored.
    pub fn from_pcm_s16le(sample_rate: u32, bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect::<Vec<_>>();
        Self::new(sample_rate, samples)
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }
}

/// Handle of a track started on an [`AudioSink`].
pub type PlaybackId = u64;

/// Audio output device.
pub trait AudioSink {
    fn play(&mut self, track: &AudioTrack) -> PlaybackId;

    fn stop_all(&mut self);
}

/// Audio sink without a device. Playback requests are logged and counted.
#[derive(Debug, Default)]
pub struct NullAudio {
    next_id: PlaybackId,
    playing: usize,
}

impl NullAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks started since the last `stop_all`
    pub fn playing(&self) -> usize {
        self.playing
    }
}

impl AudioSink for NullAudio {
    fn play(&mut self, track: &AudioTrack) -> PlaybackId {
        self.next_id += 1;
        self.playing += 1;
        debug!(
            id = self.next_id,
            samples = track.samples.len(),
            duration_ms = track.duration_ms(),
            "audio track started (no output device)"
        );
        self.next_id
    }

    fn stop_all(&mut self) {
        if self.playing > 0 {
            debug!(count = self.playing, "audio stopped");
        }
        self.playing = 0;
    }
}

/// Decoded video: a lazy sequence of frames at a fixed rate, with an
/// optional soundtrack. Sources are finite: `next_frame` returns `None` once
/// the stream is exhausted and keeps doing so.
pub trait FrameSource {
    fn fps(&self) -> f64;

    fn size(&self) -> Size;

    fn next_frame(&mut self) -> Option<Surface>;

    fn audio(&self) -> Option<&AudioTrack>;
}

/// Frames already in memory.
pub struct VecFrames {
    frames: VecDeque<Surface>,
    fps: f64,
    size: Size,
    audio: Option<AudioTrack>,
}

impl VecFrames {
    pub fn new(frames: Vec<Surface>, fps: f64) -> Self {
        let size = frames.first().map(Surface::size).unwrap_or_default();
        Self {
            frames: frames.into(),
            fps,
            size,
            audio: None,
        }
    }

    pub fn with_audio(mut self, audio: AudioTrack) -> Self {
        self.audio = Some(audio);
        self
    }
}

impl FrameSource for VecFrames {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn size(&self) -> Size {
        self.size
    }

    fn next_frame(&mut self) -> Option<Surface> {
        self.frames.pop_front()
    }

    fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }
}

/// Animated GIF decoded lazily, one frame per pull.
pub struct GifFrames {
    frames: Frames<'static>,
    fps: f64,
    size: Size,
    audio: Option<AudioTrack>,
    exhausted: bool,
}

impl GifFrames {
    /// Starts decoding `bytes`. Frames are pulled from the buffer as the
    /// video plays, so it is kept alive until the stream is dropped.
    pub fn decode<B>(name: &str, bytes: B, fps: f64) -> Result<Self>
    where
        B: AsRef<[u8]> + 'static,
    {
        let decode_error = |source| Error::Decode {
            name: name.to_string(),
            source,
        };

        let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(decode_error)?;
        let (width, height) = decoder.dimensions();
        info!(name, width, height, fps, "opened video stream");

        Ok(Self {
            frames: decoder.into_frames(),
            fps,
            size: Size::new(width, height),
            audio: None,
            exhausted: false,
        })
    }

    pub fn with_audio(mut self, audio: Option<AudioTrack>) -> Self {
        self.audio = audio;
        self
    }
}

impl FrameSource for GifFrames {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn size(&self) -> Size {
        self.size
    }

    fn next_frame(&mut self) -> Option<Surface> {
        if self.exhausted {
            return None;
        }

        match self.frames.next() {
            Some(Ok(frame)) => {
                let rgba = frame.into_buffer();
                Some(Surface::from_dynamic(&DynamicImage::ImageRgba8(rgba)))
            }
            Some(Err(e)) => {
                warn!("video stream ended on a decode error: {e}");
                self.exhausted = true;
                None
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }
}
