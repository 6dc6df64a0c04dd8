// Music list panel - the browsable view over a MusicLibrary
//
// Two row lists: the hierarchical tree (sections, opened on demand) and the
// flat search results. Only one is visible at a time. The tree rows survive a
// search untouched, so clearing the search shows exactly what was there before.

use anyhow::Result;
use tracing::{debug, info};

use crate::host::Playback;
use crate::library::{
    MusicLibrary, SearchHit, SearchQuery, SectionId, SubsectionEntry, SubsectionId, TrackId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Section(SectionId),
    Subsection(SubsectionId),
    Track(TrackId),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub kind: RowKind,
    pub depth: usize,
    pub open: bool,
}

impl Row {
    fn new(kind: RowKind, depth: usize) -> Self {
        Self {
            kind,
            depth,
            open: false,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, RowKind::Section(_) | RowKind::Subsection(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Tree,
    Search,
}

/// What a row activation ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Opened,
    Closed,
    Played(TrackId),
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Cleared,
    NoMatch,
    Results(usize),
}

/// Work queued during an event and run once after it has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    Refocus,
}

#[derive(Debug, Clone, Default)]
pub struct SearchBar {
    pub text: String,
    pub focused: bool,
}

pub struct MusicList {
    library: MusicLibrary,
    tree: Vec<Row>,
    results: Vec<Row>,
    mode: ViewMode,
    search_bar: SearchBar,
    deferred: Vec<Deferred>,
}

impl MusicList {
    pub fn new(library: MusicLibrary) -> Self {
        // one closed row per section, in file order
        let tree = library
            .sections()
            .map(|(id, _)| Row::new(RowKind::Section(id), 0))
            .collect();

        Self {
            library,
            tree,
            results: Vec::new(),
            mode: ViewMode::Tree,
            search_bar: SearchBar::default(),
            deferred: Vec::new(),
        }
    }

    pub fn library(&self) -> &MusicLibrary {
        &self.library
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_searching(&self) -> bool {
        self.mode == ViewMode::Search
    }

    /// Rows of the visible view
    pub fn rows(&self) -> &[Row] {
        match self.mode {
            ViewMode::Tree => &self.tree,
            ViewMode::Search => &self.results,
        }
    }

    pub fn tree_rows(&self) -> &[Row] {
        &self.tree
    }

    /// Display text for a row; empty if the row points at nothing
    pub fn label<'a>(&'a self, row: &'a Row) -> &'a str {
        match &row.kind {
            RowKind::Section(id) => self.library.section(*id).map_or("", |s| s.name.as_str()),
            RowKind::Subsection(id) => self.library.subsection(*id).map_or("", |s| s.name.as_str()),
            RowKind::Track(id) => self.library.track(*id).map_or("", |t| t.name.as_str()),
            RowKind::Label(text) => text.as_str(),
        }
    }

    /// Open or close a section/subsection row of the tree view
    pub fn toggle(&mut self, index: usize) -> Activation {
        if self.mode != ViewMode::Tree {
            return Activation::Ignored;
        }
        let Some(row) = self.tree.get(index) else {
            return Activation::Ignored;
        };

        if row.open {
            self.close(index);
            return Activation::Closed;
        }

        let Some(children) = self.children_of(&row.kind, row.depth + 1) else {
            return Activation::Ignored;
        };
        debug!("Opening row {} with {} children", index, children.len());
        self.tree.splice(index + 1..index + 1, children);
        self.tree[index].open = true;
        Activation::Opened
    }

    // Drops every row nested below `index`, open descendants included
    fn close(&mut self, index: usize) {
        let depth = self.tree[index].depth;
        let end = self.tree[index + 1..]
            .iter()
            .position(|row| row.depth <= depth)
            .map_or(self.tree.len(), |offset| index + 1 + offset);
        self.tree.drain(index + 1..end);
        self.tree[index].open = false;
    }

    // Fresh child rows each time; nothing is cached between opens
    fn children_of(&self, kind: &RowKind, depth: usize) -> Option<Vec<Row>> {
        match kind {
            RowKind::Section(id) => {
                let section = self.library.section(*id)?;
                let subsections = section
                    .subsections
                    .iter()
                    .map(|sub| Row::new(RowKind::Subsection(*sub), depth));
                let tracks = section
                    .tracks
                    .iter()
                    .map(|track| Row::new(RowKind::Track(*track), depth));
                Some(subsections.chain(tracks).collect())
            }
            RowKind::Subsection(id) => {
                let subsection = self.library.subsection(*id)?;
                let rows = subsection.entries.iter().map(|entry| match entry {
                    SubsectionEntry::Track(track) => Row::new(RowKind::Track(*track), depth),
                    SubsectionEntry::Label(text) => Row::new(RowKind::Label(text.clone()), depth),
                });
                Some(rows.collect())
            }
            RowKind::Track(_) | RowKind::Label(_) => None,
        }
    }

    /// Handle a validated activation (Enter, double-tap, ...) on a visible row.
    /// Tracks are played, groups in the tree toggle, everything else is a no-op.
    pub fn activate(&mut self, index: usize, playback: &mut dyn Playback) -> Result<Activation> {
        let Some(kind) = self.rows().get(index).map(|row| row.kind.clone()) else {
            return Ok(Activation::Ignored);
        };

        match kind {
            RowKind::Track(id) => {
                let Some(track) = self.library.track(id) else {
                    return Ok(Activation::Ignored);
                };
                playback.play(&track.url, &track.name)?;
                Ok(Activation::Played(id))
            }
            RowKind::Section(_) | RowKind::Subsection(_) => Ok(self.toggle(index)),
            RowKind::Label(_) => Ok(Activation::Ignored),
        }
    }

    /// Search for `text`. An empty query clears any active search. A query
    /// with no match leaves whatever view is showing after the implicit clear.
    pub fn search(&mut self, text: &str) -> SearchOutcome {
        let Some(query) = SearchQuery::parse(text) else {
            self.clear_search();
            return SearchOutcome::Cleared;
        };

        if self.is_searching() {
            self.clear_search();
        }
        self.search_bar.text.clear();
        self.deferred.push(Deferred::Refocus);

        let Some(hits) = self.library.search(&query) else {
            debug!("No matches for '{}'", text);
            return SearchOutcome::NoMatch;
        };

        self.results = hits.into_iter().filter_map(|hit| self.hit_row(hit)).collect();
        self.mode = ViewMode::Search;
        info!("Search '{}' -> {} rows", text, self.results.len());
        SearchOutcome::Results(self.results.len())
    }

    fn hit_row(&self, hit: SearchHit) -> Option<Row> {
        let row = match hit {
            SearchHit::Section(id) => Row::new(RowKind::Section(id), 0),
            SearchHit::Subsection(id) => Row::new(RowKind::Subsection(id), 1),
            SearchHit::Track(id) => {
                let depth = if self.library.track(id)?.subsection.is_some() { 2 } else { 1 };
                Row::new(RowKind::Track(id), depth)
            }
        };
        Some(row)
    }

    /// Back to the hierarchical view, exactly as it was before searching
    pub fn clear_search(&mut self) {
        if !self.is_searching() {
            return;
        }
        self.results.clear();
        self.mode = ViewMode::Tree;
    }

    pub fn search_bar(&self) -> &SearchBar {
        &self.search_bar
    }

    pub fn focus_search(&mut self) {
        self.search_bar.focused = true;
    }

    pub fn unfocus_search(&mut self) {
        self.search_bar.focused = false;
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_bar.text.push(c);
    }

    pub fn pop_search_char(&mut self) {
        self.search_bar.text.pop();
    }

    /// Validate the search bar: it loses focus, and the query runs
    pub fn submit_search(&mut self) -> SearchOutcome {
        self.search_bar.focused = false;
        let text = std::mem::take(&mut self.search_bar.text);
        self.search(&text)
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Run work queued by the last event. Call once the event has been handled.
    pub fn run_deferred(&mut self) {
        for action in std::mem::take(&mut self.deferred) {
            match action {
                Deferred::Refocus => self.search_bar.focused = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NowPlaying;

    const PLAYLIST: &str = "[Intro]\r\n\
        Theme:http://x/theme.mp3\r\n\
        <Boss>\r\n\
        \\Phase One\\\r\n\
        Battle:http://x/battle.mp3\r\n\
        [Outro]\r\n\
        Credits:http://x/credits.mp3\r\n";

    fn list() -> MusicList {
        MusicList::new(MusicLibrary::parse(PLAYLIST).unwrap())
    }

    fn labels(list: &MusicList) -> Vec<String> {
        list.rows()
            .iter()
            .map(|row| list.label(row).to_string())
            .collect()
    }

    #[test]
    fn test_closed_view_lists_sections() {
        let list = list();
        assert_eq!(labels(&list), vec!["Intro", "Outro"]);
        assert!(list.rows().iter().all(|row| !row.open && row.depth == 0));
    }

    #[test]
    fn test_open_section_then_subsection() {
        let mut list = list();

        assert_eq!(list.toggle(0), Activation::Opened);
        assert_eq!(labels(&list), vec!["Intro", "Boss", "Theme", "Outro"]);

        assert_eq!(list.toggle(1), Activation::Opened);
        assert_eq!(
            labels(&list),
            vec!["Intro", "Boss", "Phase One", "Battle", "Theme", "Outro"]
        );
        assert_eq!(list.rows()[2].kind, RowKind::Label("Phase One".into()));
        assert_eq!(list.rows()[3].depth, 2);

        // closing the section drops the open subsection's rows too
        assert_eq!(list.toggle(0), Activation::Closed);
        assert_eq!(labels(&list), vec!["Intro", "Outro"]);
    }

    #[test]
    fn test_toggle_twice_is_idempotent() {
        let mut list = list();
        let before = list.rows().to_vec();

        for _ in 0..2 {
            list.toggle(0);
            list.toggle(0);
            assert_eq!(list.rows(), before.as_slice());
        }
    }

    #[test]
    fn test_toggle_ignores_leaves_and_out_of_range() {
        let mut list = list();
        list.toggle(0);
        assert_eq!(list.toggle(2), Activation::Ignored); // Theme
        assert_eq!(list.toggle(99), Activation::Ignored);
    }

    #[test]
    fn test_activate_plays_tracks() {
        let mut list = list();
        let mut player = NowPlaying::new();

        assert_eq!(list.activate(0, &mut player).unwrap(), Activation::Opened);
        let theme = list.library().track_by_name("theme").unwrap();
        assert_eq!(list.activate(2, &mut player).unwrap(), Activation::Played(theme));

        let current = player.current().unwrap();
        assert_eq!(current.name, "Theme");
        assert_eq!(current.url, "http://x/theme.mp3");
    }

    #[test]
    fn test_stale_ids_are_noops() {
        let bigger = MusicLibrary::parse(
            "[A]\r\na:x\r\nb:x\r\nc:x\r\n[B]\r\n[C]\r\n<S1>\r\n<S2>\r\n<S3>\r\nd:x\r\ne:x\r\n",
        )
        .unwrap();
        let stale_track = bigger.track_by_name("e").unwrap();
        let stale_section = bigger.section_by_name("c").unwrap();
        let stale_subsection = bigger.subsection_by_name("s3").unwrap();

        let mut list = list();
        list.tree.push(Row::new(RowKind::Track(stale_track), 0));
        list.tree.push(Row::new(RowKind::Section(stale_section), 0));
        list.tree.push(Row::new(RowKind::Subsection(stale_subsection), 0));
        let before = list.rows().to_vec();
        let mut player = NowPlaying::new();

        for index in 2..5 {
            assert_eq!(list.activate(index, &mut player).unwrap(), Activation::Ignored);
            assert_eq!(list.label(&list.rows()[index]), "");
        }
        assert_eq!(list.rows(), before.as_slice());
        assert!(player.current().is_none());
    }

    #[test]
    fn test_activate_label_is_noop() {
        let mut list = list();
        let mut player = NowPlaying::new();
        list.toggle(0);
        list.toggle(1);

        assert_eq!(list.activate(2, &mut player).unwrap(), Activation::Ignored);
        assert!(player.current().is_none());
    }

    #[test]
    fn test_search_then_clear_restores_tree() {
        let mut list = list();
        list.toggle(0);
        let before = list.rows().to_vec();

        assert_eq!(list.search("bat"), SearchOutcome::Results(3));
        assert_eq!(list.mode(), ViewMode::Search);
        assert_eq!(labels(&list), vec!["Intro", "Boss", "Battle"]);
        assert_eq!(list.rows()[2].depth, 2);

        // the tree is kept aside while results are showing
        assert_eq!(list.tree_rows(), before.as_slice());

        list.clear_search();
        assert_eq!(list.mode(), ViewMode::Tree);
        assert_eq!(list.rows(), before.as_slice());
    }

    #[test]
    fn test_empty_query_is_noop_on_tree() {
        let mut list = MusicList::new(
            MusicLibrary::parse("[Intro]\r\nTheme:http://x/a.mp3\r\n").unwrap(),
        );
        let before = list.rows().to_vec();

        assert_eq!(list.search(""), SearchOutcome::Cleared);
        assert_eq!(list.mode(), ViewMode::Tree);
        assert_eq!(list.rows(), before.as_slice());
        assert!(!list.has_deferred());
    }

    #[test]
    fn test_research_replaces_results() {
        let mut list = list();
        list.search("[intro");
        assert_eq!(labels(&list), vec!["Intro", "Theme", "Boss", "Battle"]);

        list.search("cred");
        assert_eq!(labels(&list), vec!["Outro", "Credits"]);

        // a miss after an active search falls back to the tree
        assert_eq!(list.search("zzz"), SearchOutcome::NoMatch);
        assert_eq!(list.mode(), ViewMode::Tree);
        assert_eq!(labels(&list), vec!["Intro", "Outro"]);
    }

    #[test]
    fn test_search_rows_do_not_toggle() {
        let mut list = list();
        let mut player = NowPlaying::new();
        list.search("<boss>");

        assert_eq!(list.activate(0, &mut player).unwrap(), Activation::Ignored);
        assert_eq!(labels(&list), vec!["Boss", "Battle"]);

        let battle = list.library().track_by_name("battle").unwrap();
        assert_eq!(list.activate(1, &mut player).unwrap(), Activation::Played(battle));
    }

    #[test]
    fn test_submit_refocuses_after_event() {
        let mut list = list();
        list.focus_search();
        for c in "theme".chars() {
            list.push_search_char(c);
        }

        assert_eq!(list.submit_search(), SearchOutcome::Results(2));
        assert!(list.search_bar().text.is_empty());
        assert!(!list.search_bar().focused);

        list.run_deferred();
        assert!(list.search_bar().focused);
        assert!(!list.has_deferred());
    }
}
