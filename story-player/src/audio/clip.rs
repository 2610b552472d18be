//! Fetched audio payloads and the handles that keep them alive.

use std::io::{self, Cursor};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::{Time, TimeBase};
use thiserror::Error;

/// Container format, detected from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    Unknown,
}

impl AudioFormat {
    pub fn sniff(data: &[u8]) -> Self {
        let mpeg_sync = data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0;
        if data.starts_with(b"ID3") || mpeg_sync {
            Self::Mp3
        } else if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"WAVE" {
            Self::Wav
        } else if data.starts_with(b"OggS") {
            Self::Ogg
        } else {
            Self::Unknown
        }
    }

    /// File extension handed to the demuxer as a format hint.
    fn extension(self) -> Option<&'static str> {
        match self {
            Self::Mp3 => Some("mp3"),
            Self::Wav => Some("wav"),
            Self::Ogg => Some("ogg"),
            Self::Unknown => None,
        }
    }
}

/// Why a payload cannot be played.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty audio payload")]
    Empty,

    #[error("unsupported audio: {0}")]
    Unsupported(String),

    #[error("audio has no playable length")]
    NoDuration,
}

/// A decodable audio payload with its playing length.
#[derive(Debug, Clone)]
pub struct AudioClip {
    bytes: Arc<[u8]>,
    format: AudioFormat,
    duration: Duration,
}

impl AudioClip {
    /// Read a payload's container and measure how long it plays.
    ///
    /// WAV headers are read with hound; everything else (and WAV variants
    /// hound rejects) goes through the symphonia demuxers.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let format = AudioFormat::sniff(&bytes);
        let from_header = match format {
            AudioFormat::Wav => match wav_duration(&bytes) {
                Ok(duration) => Some(duration),
                Err(e) => {
                    log::debug!("WAV header rejected ({}), probing instead", e);
                    None
                }
            },
            _ => None,
        };

        let bytes: Arc<[u8]> = bytes.into();
        let duration = match from_header {
            Some(duration) => duration,
            None => demuxed_duration(Arc::clone(&bytes), format)?,
        };
        if duration.is_zero() {
            return Err(DecodeError::NoDuration);
        }

        Ok(Self {
            bytes,
            format,
            duration,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The payload, shared rather than copied.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn wav_duration(bytes: &[u8]) -> Result<Duration, hound::Error> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return Err(hound::Error::FormatError("zero sample rate"));
    }
    Ok(time_to_duration(
        TimeBase::new(1, sample_rate).calc_time(reader.duration() as u64),
    ))
}

/// Length from the container's frame count, or by walking its packets when
/// the header carries none (e.g. MP3 without a Xing/Info tag).
fn demuxed_duration(bytes: Arc<[u8]>, format: AudioFormat) -> Result<Duration, DecodeError> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    if let Some(extension) = format.extension() {
        hint.with_extension(extension);
    }

    let detected = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;
    let mut reader = detected.format;

    let track = reader
        .default_track()
        .ok_or_else(|| DecodeError::Unsupported("no audio track".into()))?;
    let track_id = track.id;
    let n_frames = track.codec_params.n_frames;
    let time_base = track
        .codec_params
        .time_base
        .or_else(|| track.codec_params.sample_rate.map(|rate| TimeBase::new(1, rate)))
        .ok_or(DecodeError::NoDuration)?;

    if let Some(frames) = n_frames {
        return Ok(time_to_duration(time_base.calc_time(frames)));
    }

    let mut end = 0u64;
    loop {
        match reader.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    end = end.max(packet.ts() + packet.dur());
                }
            }
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(DecodeError::Unsupported(e.to_string())),
        }
    }
    Ok(time_to_duration(time_base.calc_time(end)))
}

fn time_to_duration(time: Time) -> Duration {
    Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac)
}

/// Counts live audio handles so released payloads can be verified.
#[derive(Debug, Clone, Default)]
pub struct HandleLedger {
    live: Arc<AtomicUsize>,
    issued: Arc<AtomicUsize>,
}

impl HandleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, clip: AudioClip) -> AudioHandle {
        let id = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.live.fetch_add(1, Ordering::SeqCst);
        log::debug!("Acquired audio handle {} ({} bytes)", id, clip.len());
        AudioHandle {
            id,
            clip,
            ledger: self.clone(),
        }
    }

    /// Handles not yet dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Handles ever acquired.
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

/// A reference to fetched audio. Dropping it releases the payload.
#[derive(Debug)]
pub struct AudioHandle {
    id: usize,
    clip: AudioClip,
    ledger: HandleLedger,
}

impl AudioHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn clip(&self) -> &AudioClip {
        &self.clip
    }

    pub fn duration(&self) -> Duration {
        self.clip.duration()
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        self.ledger.live.fetch_sub(1, Ordering::SeqCst);
        log::debug!("Released audio handle {}", self.id);
    }
}
