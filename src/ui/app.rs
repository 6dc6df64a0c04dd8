use super::{AppEvent, EventHandler, TerminalManager};
use crate::browser::{Activation, MusicList, Row, RowKind, SearchOutcome, ViewMode};
use crate::config::Config;
use crate::host::{Playback, Session};
use crate::settings::{SettingsItem, SettingsPanel};
use anyhow::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Tabs},
    Frame,
};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Music,
    Settings,
}

/// Terminal-free application state; everything the event loop mutates
pub struct AppState {
    config: Config,
    playback: Box<dyn Playback>,
    session: Box<dyn Session>,

    pub music: MusicList,
    pub settings: SettingsPanel,
    pub current_tab: Tab,

    // one selection per view so clearing a search lands where you left off
    pub tree_state: ListState,
    pub search_state: ListState,

    pub now_playing: Option<String>,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(
        config: Config,
        music: MusicList,
        playback: Box<dyn Playback>,
        session: Box<dyn Session>,
    ) -> Self {
        let settings = SettingsPanel::from_config(&config);

        let mut tree_state = ListState::default();
        if !music.rows().is_empty() {
            tree_state.select(Some(0));
        }

        Self {
            config,
            playback,
            session,
            music,
            settings,
            current_tab: Tab::Music,
            tree_state,
            search_state: ListState::default(),
            now_playing: None,
            status_message: None,
            should_quit: false,
        }
    }

    /// Handle one event, then run whatever it deferred
    pub fn dispatch(&mut self, event: AppEvent) -> Result<()> {
        self.handle_event(event)?;
        self.music.run_deferred();
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Quit => {
                self.should_quit = true;
            }
            AppEvent::Render => {}
            AppEvent::NextTab => {
                self.music.unfocus_search();
                self.current_tab = match self.current_tab {
                    Tab::Music => Tab::Settings,
                    Tab::Settings => Tab::Music,
                };
            }
            AppEvent::Up => match self.current_tab {
                Tab::Music => self.move_selection(-1),
                Tab::Settings => self.settings.focus_prev(),
            },
            AppEvent::Down => match self.current_tab {
                Tab::Music => self.move_selection(1),
                Tab::Settings => self.settings.focus_next(),
            },
            AppEvent::Left => self.adjust_setting(-1),
            AppEvent::Right => self.adjust_setting(1),
            AppEvent::Activate => match self.current_tab {
                Tab::Music => self.activate_selected(),
                Tab::Settings => self.toggle_dance_if_focused(),
            },
            AppEvent::Toggle => match self.current_tab {
                Tab::Music => {
                    if let Some(index) = self.selected() {
                        self.music.toggle(index);
                        self.clamp_selection();
                    }
                }
                Tab::Settings => self.toggle_dance_if_focused(),
            },
            AppEvent::FocusSearch => {
                if self.current_tab == Tab::Music {
                    self.music.focus_search();
                }
            }
            AppEvent::UnfocusSearch => self.music.unfocus_search(),
            AppEvent::SearchInput(c) => self.music.push_search_char(c),
            AppEvent::SearchBackspace => self.music.pop_search_char(),
            AppEvent::SubmitSearch => self.submit_search(),
            AppEvent::ClearSearch => {
                self.music.clear_search();
                self.status_message = None;
                self.clamp_selection();
            }
        }

        Ok(())
    }

    fn submit_search(&mut self) {
        // the bar is refocused empty after a search; Enter then picks a result
        if self.music.is_searching() && self.music.search_bar().text.is_empty() {
            self.activate_selected();
            return;
        }

        match self.music.submit_search() {
            SearchOutcome::Results(count) => {
                self.search_state.select(Some(0));
                self.status_message = Some(format!("{} results", count));
            }
            SearchOutcome::NoMatch => {
                self.status_message = Some("No matches".to_string());
            }
            SearchOutcome::Cleared => {
                self.status_message = None;
            }
        }
        self.clamp_selection();
    }

    fn activate_selected(&mut self) {
        let Some(index) = self.selected() else {
            return;
        };

        match self.music.activate(index, self.playback.as_mut()) {
            Ok(Activation::Played(id)) => {
                self.now_playing = self.music.library().track(id).map(|t| t.name.clone());
                self.status_message = None;
            }
            Ok(_) => {}
            Err(e) => {
                error!("Playback failed: {:#}", e);
                self.status_message = Some(format!("Playback failed: {}", e));
            }
        }
        self.clamp_selection();
    }

    fn adjust_setting(&mut self, steps: i16) {
        if self.current_tab != Tab::Settings {
            return;
        }
        if let Err(e) = self.settings.adjust(steps, &mut self.config) {
            error!("Failed to save settings: {:#}", e);
            self.status_message = Some(format!("Failed to save settings: {}", e));
        }
    }

    fn toggle_dance_if_focused(&mut self) {
        if self.settings.focused() != SettingsItem::Dance {
            return;
        }
        match self.settings.toggle_dance(self.session.as_mut()) {
            Ok(active) => info!("Dance {}", if active { "on" } else { "off" }),
            Err(e) => {
                error!("Session update failed: {:#}", e);
                self.status_message = Some(format!("Session update failed: {}", e));
            }
        }
    }

    fn list_state(&self) -> &ListState {
        match self.music.mode() {
            ViewMode::Tree => &self.tree_state,
            ViewMode::Search => &self.search_state,
        }
    }

    fn list_state_mut(&mut self) -> &mut ListState {
        match self.music.mode() {
            ViewMode::Tree => &mut self.tree_state,
            ViewMode::Search => &mut self.search_state,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state()
            .selected()
            .filter(|index| *index < self.music.rows().len())
    }

    fn move_selection(&mut self, delta: i32) {
        let len = self.music.rows().len();
        if len == 0 {
            return;
        }

        let current = self.list_state().selected().unwrap_or(0);
        let new_index = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            (current + delta as usize).min(len - 1)
        };

        self.list_state_mut().select(Some(new_index));
    }

    fn clamp_selection(&mut self) {
        let len = self.music.rows().len();
        let state = self.list_state_mut();
        match state.selected() {
            _ if len == 0 => state.select(None),
            Some(index) if index >= len => state.select(Some(len - 1)),
            None => state.select(Some(0)),
            Some(_) => {}
        }
    }
}

pub struct App {
    terminal: TerminalManager,
    event_handler: EventHandler,
    state: AppState,
}

impl App {
    pub fn new(state: AppState) -> Result<Self> {
        Ok(Self {
            terminal: TerminalManager::new()?,
            event_handler: EventHandler::new(),
            state,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        // single-threaded: draw, wait for one event, handle it, repeat
        while !self.state.should_quit {
            self.terminal.draw(|f| render_ui(f, &mut self.state))?;

            let search_focused = self.state.music.search_bar().focused;
            if let Some(event) = self.event_handler.next_event(search_focused)? {
                self.state.dispatch(event)?;
            }
        }

        Ok(())
    }
}

fn render_ui(f: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Status
        ])
        .split(f.area());

    render_tabs(f, chunks[0], state.current_tab);

    match state.current_tab {
        Tab::Music => render_music(f, chunks[1], state),
        Tab::Settings => render_settings(f, chunks[1], &state.settings),
    }

    render_status(f, chunks[2], state);
}

fn render_tabs(f: &mut Frame, area: Rect, current: Tab) {
    let selected = match current {
        Tab::Music => 0,
        Tab::Settings => 1,
    };
    let tabs = Tabs::new(vec!["Music", "Settings"])
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title("musiclist"))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    f.render_widget(tabs, area);
}

fn render_music(f: &mut Frame, area: Rect, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    // Search bar
    let bar = state.music.search_bar();
    let (bar_text, bar_style) = if bar.focused {
        (format!("{}_", bar.text), Style::default().fg(Color::Yellow))
    } else {
        (bar.text.clone(), Style::default())
    };
    let search = Paragraph::new(bar_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(bar_style)
            .title("Search  ([section  <subsection  track)"),
    );
    f.render_widget(search, chunks[0]);

    // Rows
    let searching = state.music.is_searching();
    let items: Vec<ListItem> = state
        .music
        .rows()
        .iter()
        .map(|row| ListItem::new(row_line(&state.music, row, searching, state.now_playing.as_deref())))
        .collect();

    let title = if searching {
        "Search results (Esc to clear)"
    } else {
        "Music"
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("► ");

    let list_state = if searching {
        &mut state.search_state
    } else {
        &mut state.tree_state
    };
    f.render_stateful_widget(list, chunks[1], list_state);
}

fn row_line(music: &MusicList, row: &Row, searching: bool, now_playing: Option<&str>) -> Line<'static> {
    let indent = "  ".repeat(row.depth);
    let label = music.label(row).to_string();

    let marker = match &row.kind {
        _ if row.is_group() && searching => "",
        _ if row.is_group() && row.open => "▾ ",
        _ if row.is_group() => "▸ ",
        RowKind::Track(_) => "♪ ",
        _ => "· ",
    };

    let style = match &row.kind {
        RowKind::Section(_) => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        RowKind::Subsection(_) => Style::default().fg(Color::Cyan),
        RowKind::Label(_) => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        RowKind::Track(_) if now_playing == Some(label.as_str()) => {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        }
        RowKind::Track(_) => Style::default(),
    };

    Line::from(vec![
        Span::raw(indent),
        Span::styled(marker, style),
        Span::styled(label, style),
    ])
}

fn render_settings(f: &mut Frame, area: Rect, settings: &SettingsPanel) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transparency
            Constraint::Length(3), // Speed
            Constraint::Length(3), // Dance
            Constraint::Min(0),
        ])
        .split(area);

    let block = |item: SettingsItem| {
        let style = if settings.focused() == item {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(item.label())
    };

    let gauge = |item: SettingsItem, value: u8| {
        Gauge::default()
            .block(block(item))
            .gauge_style(Style::default().fg(Color::Green))
            .percent(u16::from(value))
    };

    for (item, area) in SettingsItem::ALL.into_iter().zip(chunks.iter().copied()) {
        match item {
            SettingsItem::Transparency => f.render_widget(gauge(item, settings.transparency()), area),
            SettingsItem::Speed => f.render_widget(gauge(item, settings.speed()), area),
            SettingsItem::Dance => {
                let checkbox = if settings.dance() { "[x] Dance" } else { "[ ] Dance" };
                f.render_widget(Paragraph::new(checkbox).block(block(item)), area);
            }
        }
    }

    let help = Paragraph::new("↑/↓ select   ←/→ adjust   Space toggle")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[3]);
}

fn render_status(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60), // Now playing / messages
            Constraint::Percentage(40), // Key hints
        ])
        .split(area);

    let info = match (&state.status_message, &state.now_playing) {
        (Some(message), _) => message.clone(),
        (None, Some(name)) => format!("♪ {}", name),
        (None, None) => "No track selected".to_string(),
    };
    let info_widget =
        Paragraph::new(info).block(Block::default().borders(Borders::ALL).title("Now Playing"));
    f.render_widget(info_widget, chunks[0]);

    let hints = Paragraph::new("/ search  Enter select  Tab switch  q quit")
        .block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(hints, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{LocalSession, NowPlaying};
    use crate::library::MusicLibrary;
    use crate::ui::events::key_to_search_event;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    const PLAYLIST: &str = "[Intro]\r\n\
        Theme:http://x/theme.mp3\r\n\
        [Outro]\r\n\
        Credits:http://x/credits.mp3\r\n";

    fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        let music = MusicList::new(MusicLibrary::parse(PLAYLIST).unwrap());
        let state = AppState::new(
            config,
            music,
            Box::new(NowPlaying::new()),
            Box::new(LocalSession::new()),
        );
        (dir, state)
    }

    fn type_query(state: &mut AppState, query: &str) {
        state.dispatch(AppEvent::FocusSearch).unwrap();
        for c in query.chars() {
            state.dispatch(AppEvent::SearchInput(c)).unwrap();
        }
        state.dispatch(AppEvent::SubmitSearch).unwrap();
    }

    #[test]
    fn test_open_and_play() {
        let (_dir, mut state) = state();
        assert_eq!(state.selected(), Some(0));

        state.dispatch(AppEvent::Activate).unwrap(); // open Intro
        state.dispatch(AppEvent::Down).unwrap();
        state.dispatch(AppEvent::Activate).unwrap(); // Theme

        assert_eq!(state.now_playing.as_deref(), Some("Theme"));
    }

    #[test]
    fn test_search_keeps_focus_and_restores_tree() {
        let (_dir, mut state) = state();
        state.dispatch(AppEvent::Down).unwrap();

        type_query(&mut state, "cred");
        assert!(state.music.is_searching());
        assert_eq!(state.music.rows().len(), 2);
        // refocused once the submit event finished
        assert!(state.music.search_bar().focused);
        assert!(state.music.search_bar().text.is_empty());

        state.dispatch(AppEvent::UnfocusSearch).unwrap();
        state.dispatch(AppEvent::ClearSearch).unwrap();
        assert!(!state.music.is_searching());
        assert_eq!(state.selected(), Some(1));
    }

    #[test]
    fn test_enter_on_search_result_plays_it() {
        let (_dir, mut state) = state();
        type_query(&mut state, "cred");
        assert!(state.music.search_bar().focused);

        state.dispatch(AppEvent::Down).unwrap(); // Outro -> Credits
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        let event = key_to_search_event(enter).unwrap();
        state.dispatch(event).unwrap();

        assert!(state.music.is_searching());
        assert_eq!(state.now_playing.as_deref(), Some("Credits"));
    }

    #[test]
    fn test_typed_query_replaces_results() {
        let (_dir, mut state) = state();
        type_query(&mut state, "cred");
        type_query(&mut state, "theme");

        assert!(state.music.is_searching());
        assert_eq!(state.music.rows().len(), 2);
        assert!(state.now_playing.is_none());
    }

    #[test]
    fn test_empty_submit_does_not_search() {
        let (_dir, mut state) = state();
        type_query(&mut state, "");
        assert!(!state.music.is_searching());
        assert_eq!(state.music.rows().len(), 2);
    }

    #[test]
    fn test_settings_tab() {
        let (_dir, mut state) = state();
        state.dispatch(AppEvent::NextTab).unwrap();
        assert_eq!(state.current_tab, Tab::Settings);

        state.dispatch(AppEvent::Right).unwrap();
        assert_eq!(state.settings.transparency(), 65);

        state.dispatch(AppEvent::Up).unwrap(); // wraps to Dance
        state.dispatch(AppEvent::Toggle).unwrap();
        assert!(state.settings.dance());

        // slider keys do nothing on the music tab
        state.dispatch(AppEvent::NextTab).unwrap();
        state.dispatch(AppEvent::Right).unwrap();
        assert_eq!(state.settings.transparency(), 65);
    }
}
