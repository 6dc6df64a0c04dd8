// Host collaborators - things the panel calls out to but does not own
// Playback of a selected track, and the user session that broadcasts the dance flag

#[cfg(feature = "audio")]
pub mod player;

#[cfg(feature = "audio")]
pub use player::AudioPlayer;

use anyhow::Result;
use tracing::info;

/// Playback component of the host application
pub trait Playback {
    fn play(&mut self, url: &str, name: &str) -> Result<()>;
}

/// Current user session; `send_current_update` broadcasts its state
pub trait Session {
    fn set_dance(&mut self, active: bool);
    fn send_current_update(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub url: String,
    pub name: String,
}

/// Playback that only remembers and logs what was asked for
#[derive(Debug, Default)]
pub struct NowPlaying {
    current: Option<PlayRequest>,
    history: Vec<PlayRequest>,
}

impl NowPlaying {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&PlayRequest> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[PlayRequest] {
        &self.history
    }
}

impl Playback for NowPlaying {
    fn play(&mut self, url: &str, name: &str) -> Result<()> {
        info!("Playing '{}' from {}", name, url);
        let request = PlayRequest {
            url: url.to_string(),
            name: name.to_string(),
        };
        self.history.push(request.clone());
        self.current = Some(request);
        Ok(())
    }
}

/// Single-user session kept in-process
#[derive(Debug, Default)]
pub struct LocalSession {
    dance: bool,
    updates_sent: u64,
}

impl LocalSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dancing(&self) -> bool {
        self.dance
    }

    pub fn updates_sent(&self) -> u64 {
        self.updates_sent
    }
}

impl Session for LocalSession {
    fn set_dance(&mut self, active: bool) {
        self.dance = active;
    }

    fn send_current_update(&mut self) -> Result<()> {
        self.updates_sent += 1;
        info!("Session update #{} (dance: {})", self.updates_sent, self.dance);
        Ok(())
    }
}
