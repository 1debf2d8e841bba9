//! Ambient music playback.
//!
//! A looping background track started at most once per session. Autoplay
//! is attempted at launch and again on user interaction; a missing device
//! or file just leaves the page silent.

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

pub struct MusicPlayer {
    // Keeps the output device alive for the sink's lifetime.
    stream: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
    started: bool,
}

impl MusicPlayer {
    pub fn new() -> Self {
        Self {
            stream: None,
            sink: None,
            started: false,
        }
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Attempt to start the loop. No-op once playing; failures are logged
    /// and retried on the next interaction.
    pub fn try_start(&mut self, path: Option<&str>) {
        if self.started {
            return;
        }
        let Some(path) = path else { return };
        match self.start(Path::new(path)) {
            Ok(()) => {
                info!("music started: {path}");
                self.started = true;
            }
            Err(err) => warn!("music unavailable: {err:#}"),
        }
    }

    fn start(&mut self, path: &Path) -> Result<()> {
        let (stream, handle) =
            OutputStream::try_default().context("no audio output device")?;
        let sink = Sink::try_new(&handle)?;
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let source = Decoder::new_looped(BufReader::new(file))?;
        sink.append(source);
        self.stream = Some((stream, handle));
        self.sink = Some(sink);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.stream = None;
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_without_a_track_is_a_no_op() {
        let mut player = MusicPlayer::new();
        player.try_start(None);
        assert!(!player.has_started());
    }

    #[test]
    fn missing_file_leaves_the_player_silent() {
        let mut player = MusicPlayer::new();
        player.try_start(Some("/nonexistent/silent_night.ogg"));
        assert!(!player.has_started());
        // A later interaction may retry.
        player.try_start(Some("/nonexistent/silent_night.ogg"));
        assert!(!player.has_started());
    }
}
