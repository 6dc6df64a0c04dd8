// musiclist - collapsible, searchable music list for a plain-text playlist
// Library core is toolkit-free; the terminal UI sits behind the `tui` feature

pub mod browser;   // rows, open/close, search view
pub mod config;    // settings and preferences
pub mod host;      // playback + session collaborators
pub mod library;   // playlist parsing, hierarchy, prefix search
pub mod settings;  // slider / checkbox bindings
#[cfg(feature = "tui")]
pub mod ui;        // terminal interface

// Export the stuff other modules actually use
pub use browser::{Activation, MusicList, Row, RowKind, SearchOutcome, ViewMode};
pub use config::Config;
pub use host::{LocalSession, NowPlaying, Playback, Session};
pub use library::{LibraryError, MusicLibrary, SearchQuery};
pub use settings::SettingsPanel;
