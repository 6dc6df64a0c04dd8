// Local-file playback through rodio (gated by `audio`)
// Remote urls are handed back as errors; the host decides what to do with them

use super::Playback;
use anyhow::{bail, Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

pub struct AudioPlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    volume: f32, // 0.0 to 1.0
}

impl AudioPlayer {
    pub fn new(volume: f32) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            volume: volume.clamp(0.0, 1.0),
        })
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

impl Playback for AudioPlayer {
    fn play(&mut self, url: &str, name: &str) -> Result<()> {
        if url.starts_with("http://") || url.starts_with("https://") {
            warn!("Cannot stream '{}' from {}", name, url);
            bail!("remote streams are not supported: {}", url);
        }

        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        let file = File::open(path)
            .with_context(|| format!("Failed to open audio file {}", path.display()))?;
        let source = Decoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to decode audio file {}", path.display()))?;

        // Stop current playback
        self.stop();

        let sink = Sink::try_new(&self.stream_handle)?;
        sink.set_volume(self.volume);
        sink.append(source);
        self.sink = Some(sink);

        info!("Playing '{}' from {}", name, path.display());
        Ok(())
    }
}
