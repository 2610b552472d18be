//! Speaker output through rodio.
//!
//! rodio's output stream cannot leave the thread that opened it, so a
//! dedicated audio thread owns the device and one rodio `Sink` per channel.
//! [`RodioSink`] forwards channel commands to it and never blocks on audio.

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use thiserror::Error;

use super::clip::AudioClip;
use super::sink::{AudioSink, Channel};

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to open audio output: {0}")]
    Device(String),

    #[error("Failed to start audio thread: {0}")]
    Thread(#[from] io::Error),

    #[error("Failed to decode audio: {0}")]
    Decode(#[from] DecoderError),
}

enum Request {
    Start {
        channel: Channel,
        bytes: Arc<[u8]>,
        volume: f32,
        looping: bool,
    },
    Pause(Channel),
    Resume(Channel),
    Stop(Channel),
    Shutdown,
}

/// Plays channels on the default output device.
pub struct RodioSink {
    requests: mpsc::Sender<Request>,
    thread: Option<JoinHandle<()>>,
}

impl RodioSink {
    /// Open the default output device on its own thread.
    pub fn open() -> Result<Self, OutputError> {
        let (requests, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let thread = thread::Builder::new()
            .name("story-player-audio".into())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => {
                        let _ = ready_tx.send(Ok(()));
                        pair
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                Output::new(handle).serve(rx);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::debug!("Audio output ready");
                Ok(Self {
                    requests,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(OutputError::Device(e))
            }
            Err(_) => Err(OutputError::Device("audio thread exited".into())),
        }
    }

    fn send(&self, request: Request) {
        if self.requests.send(request).is_err() {
            log::debug!("Audio thread gone, dropped channel command");
        }
    }
}

impl AudioSink for RodioSink {
    fn start(&mut self, channel: Channel, clip: &AudioClip, volume: f32, looping: bool) {
        self.send(Request::Start {
            channel,
            bytes: clip.shared_bytes(),
            volume,
            looping,
        });
    }

    fn pause(&mut self, channel: Channel) {
        self.send(Request::Pause(channel));
    }

    fn resume(&mut self, channel: Channel) {
        self.send(Request::Resume(channel));
    }

    fn stop(&mut self, channel: Channel) {
        self.send(Request::Stop(channel));
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        self.send(Request::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("Audio thread panicked");
            }
        }
    }
}

/// State owned by the audio thread.
struct Output {
    handle: OutputStreamHandle,
    channels: HashMap<Channel, Sink>,
}

impl Output {
    fn new(handle: OutputStreamHandle) -> Self {
        Self {
            handle,
            channels: HashMap::new(),
        }
    }

    fn serve(mut self, requests: mpsc::Receiver<Request>) {
        while let Ok(request) = requests.recv() {
            match request {
                Request::Start {
                    channel,
                    bytes,
                    volume,
                    looping,
                } => {
                    self.stop(channel);
                    match self.play(bytes, volume, looping) {
                        Ok(sink) => {
                            self.channels.insert(channel, sink);
                        }
                        Err(e) => log::warn!("Cannot play {}: {}", channel, e),
                    }
                }
                Request::Pause(channel) => {
                    if let Some(sink) = self.channels.get(&channel) {
                        sink.pause();
                    }
                }
                Request::Resume(channel) => {
                    if let Some(sink) = self.channels.get(&channel) {
                        sink.play();
                    }
                }
                Request::Stop(channel) => self.stop(channel),
                Request::Shutdown => break,
            }
        }

        for (_, sink) in self.channels.drain() {
            sink.stop();
        }
    }

    fn play(&self, bytes: Arc<[u8]>, volume: f32, looping: bool) -> Result<Sink, OutputError> {
        let sink = Sink::try_new(&self.handle).map_err(|e| OutputError::Device(e.to_string()))?;
        sink.set_volume(volume);
        sink.append(source(bytes, looping)?);
        Ok(sink)
    }

    fn stop(&mut self, channel: Channel) {
        if let Some(sink) = self.channels.remove(&channel) {
            sink.stop();
        }
    }
}

type ChannelSource = Box<dyn Source<Item = i16> + Send>;

/// Decoded samples for a channel; loops repeat until stopped.
fn source(bytes: Arc<[u8]>, looping: bool) -> Result<ChannelSource, DecoderError> {
    let decoder = Decoder::new(Cursor::new(bytes))?;
    Ok(if looping {
        Box::new(decoder.repeat_infinite())
    } else {
        Box::new(decoder)
    })
}
