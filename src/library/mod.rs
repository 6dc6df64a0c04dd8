// Music library - the parsed playlist hierarchy
// Section -> Subsection -> Track, plus case-insensitive lookups and the search index

pub mod parser;    // line-by-line playlist parsing
pub mod search;    // prefix search over names
pub mod snapshot;  // serializable view of the hierarchy

pub use parser::{parse_line, ParseState, ParsedEntry};
pub use search::{prefix_matches, SearchHit, SearchIndex, SearchQuery, SearchScope};
pub use snapshot::{EntrySnapshot, SectionSnapshot, SubsectionSnapshot};

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default playlist file name, looked up relative to the working directory
pub const DEFAULT_PLAYLIST: &str = "musiclist.txt";

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid {encoding} text", .path.display())]
    Encoding {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("malformed playlist at line {line}: {reason}")]
    Malformed { line: usize, reason: MalformedReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("subsection appears before any section")]
    SubsectionOutsideSection,
    #[error("nested label appears before any subsection")]
    LabelOutsideSubsection,
    #[error("track appears before any section")]
    TrackOutsideSection,
    #[error("track line has no ':' between name and url")]
    MissingUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubsectionId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(usize);

/// Top-level playlist grouping
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub subsections: Vec<SubsectionId>,
    pub tracks: Vec<TrackId>, // tracks listed before the first subsection
}

/// Grouping nested one level under a section
#[derive(Debug, Clone)]
pub struct Subsection {
    pub name: String,
    pub section: SectionId,
    pub entries: Vec<SubsectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsectionEntry {
    Track(TrackId),
    Label(String), // non-playable sub-subsection marker
}

#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    pub url: String,
    pub section: SectionId,
    pub subsection: Option<SubsectionId>,
}

/// The whole parsed playlist. Built once by [`ParseState`], read-only afterwards.
#[derive(Debug, Default)]
pub struct MusicLibrary {
    sections: Vec<Section>,
    subsections: Vec<Subsection>,
    tracks: Vec<Track>,

    // lowercase name -> id, last definition wins
    section_names: HashMap<String, SectionId>,
    subsection_names: HashMap<String, SubsectionId>,
    track_names: HashMap<String, TrackId>,

    index: SearchIndex,
}

impl MusicLibrary {
    /// Load a playlist file. A missing file is not an error: it logs a warning
    /// and yields an empty library.
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Music: {} not found", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(LibraryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let text = decode_text(&bytes).map_err(|encoding| LibraryError::Encoding {
            path: path.to_path_buf(),
            encoding,
        })?;

        let library = Self::parse(&text)?;
        info!(
            "Loaded {} sections, {} subsections, {} tracks from {}",
            library.sections.len(),
            library.subsections.len(),
            library.tracks.len(),
            path.display()
        );
        Ok(library)
    }

    /// Parse playlist text that is already decoded. The first malformed line
    /// rejects the whole input.
    pub fn parse(text: &str) -> Result<Self, LibraryError> {
        let state = text
            .split_inclusive('\n')
            .enumerate()
            .try_fold(ParseState::default(), |state, (i, raw)| {
                match parse_line(raw, i + 1)? {
                    Some(entry) => state.apply(entry, i + 1),
                    None => Ok(state),
                }
            })?;
        Ok(state.finish())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections in file order
    pub fn sections(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, section)| (SectionId(i), section))
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.0)
    }

    pub fn subsection(&self, id: SubsectionId) -> Option<&Subsection> {
        self.subsections.get(id.0)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(id.0)
    }

    pub fn section_by_name(&self, name: &str) -> Option<SectionId> {
        self.section_names.get(&name.to_lowercase()).copied()
    }

    pub fn subsection_by_name(&self, name: &str) -> Option<SubsectionId> {
        self.subsection_names.get(&name.to_lowercase()).copied()
    }

    pub fn track_by_name(&self, name: &str) -> Option<TrackId> {
        self.track_names.get(&name.to_lowercase()).copied()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub(crate) fn add_section(&mut self, name: String) -> SectionId {
        let id = SectionId(self.sections.len());
        self.section_names.insert(name.to_lowercase(), id);
        self.sections.push(Section {
            name,
            subsections: Vec::new(),
            tracks: Vec::new(),
        });
        id
    }

    pub(crate) fn add_subsection(&mut self, name: String, section: SectionId) -> SubsectionId {
        let id = SubsectionId(self.subsections.len());
        self.subsection_names.insert(name.to_lowercase(), id);
        self.subsections.push(Subsection {
            name,
            section,
            entries: Vec::new(),
        });
        self.sections[section.0].subsections.push(id);
        id
    }

    pub(crate) fn add_label(&mut self, subsection: SubsectionId, text: String) {
        self.subsections[subsection.0]
            .entries
            .push(SubsectionEntry::Label(text));
    }

    pub(crate) fn add_track(
        &mut self,
        name: String,
        url: String,
        section: SectionId,
        subsection: Option<SubsectionId>,
    ) -> TrackId {
        let id = TrackId(self.tracks.len());
        if let Some(previous) = self.track_names.insert(name.to_lowercase(), id) {
            debug!(
                "Track '{}' redefined; search now resolves to the later entry (was #{})",
                name, previous.0
            );
        }
        match subsection {
            Some(sub) => self.subsections[sub.0]
                .entries
                .push(SubsectionEntry::Track(id)),
            None => self.sections[section.0].tracks.push(id),
        }
        self.tracks.push(Track {
            name,
            url,
            section,
            subsection,
        });
        id
    }

    // Search space is built once, after the last line has been parsed
    pub(crate) fn build_index(&mut self) {
        self.index = SearchIndex::build(
            self.track_names.keys(),
            self.section_names.keys(),
            self.subsection_names.keys(),
        );
    }
}

/// Decode playlist bytes by byte-order mark: UTF-16LE, UTF-16BE or UTF-8.
/// Without a BOM the file is read as UTF-8. On failure returns the encoding
/// that was attempted.
pub fn decode_text(bytes: &[u8]) -> Result<String, &'static str> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes).ok_or("UTF-16LE"),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes).ok_or("UTF-16BE"),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec()).map_err(|_| "UTF-8"),
        _ => String::from_utf8(bytes.to_vec()).map_err(|_| "UTF-8"),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "[Intro]\r\n\
        Theme:http://x/a.mp3\r\n\
        Overture: http://x/b.mp3 \r\n\
        <Battle>\r\n\
        \\Phase One\\\r\n\
        Clash:http://x/c.mp3\r\n\
        [Ending]\r\n\
        Credits:http://x/d.mp3\r\n";

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_single_section_with_two_tracks() {
        let library = MusicLibrary::parse("[Intro]\r\nA:u1\r\nB:u2\r\n").unwrap();

        let sections: Vec<_> = library.sections().collect();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].1.name, "Intro");
        assert_eq!(sections[0].1.tracks.len(), 2);
        assert!(sections[0].1.subsections.is_empty());
    }

    #[test]
    fn test_hierarchy_shape() {
        let library = MusicLibrary::parse(SAMPLE).unwrap();

        let intro = library.section(library.section_by_name("intro").unwrap()).unwrap();
        assert_eq!(intro.tracks.len(), 2);
        assert_eq!(intro.subsections.len(), 1);

        let battle_id = library.subsection_by_name("BATTLE").unwrap();
        let battle = library.subsection(battle_id).unwrap();
        assert_eq!(battle.section, library.section_by_name("Intro").unwrap());
        assert_eq!(battle.entries.len(), 2);
        assert_eq!(battle.entries[0], SubsectionEntry::Label("Phase One".to_string()));

        let clash = library.track(library.track_by_name("clash").unwrap()).unwrap();
        assert_eq!(clash.url, "http://x/c.mp3");
        assert_eq!(clash.subsection, Some(battle_id));

        // url is trimmed, name keeps its case
        let overture = library.track(library.track_by_name("overture").unwrap()).unwrap();
        assert_eq!(overture.name, "Overture");
        assert_eq!(overture.url, "http://x/b.mp3");
    }

    #[test]
    fn test_duplicate_track_names_keep_distinct_urls() {
        let text = "[One]\r\nSong:http://one\r\n[Two]\r\nsong:http://two\r\n";
        let library = MusicLibrary::parse(text).unwrap();

        // lookup resolves to the last definition
        let found = library.track(library.track_by_name("SONG").unwrap()).unwrap();
        assert_eq!(found.url, "http://two");

        // the first section still owns its own track and url
        let one = library.section(library.section_by_name("one").unwrap()).unwrap();
        let first = library.track(one.tracks[0]).unwrap();
        assert_eq!(first.url, "http://one");
        assert_eq!(library.track_count(), 2);
    }

    #[test]
    fn test_malformed_rejects_whole_file() {
        let err = MusicLibrary::parse("<Orphan>\r\n").unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Malformed {
                line: 1,
                reason: MalformedReason::SubsectionOutsideSection
            }
        ));

        let err = MusicLibrary::parse("[A]\r\nok:u\r\n\r\n\\label\r\n").unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Malformed {
                line: 4,
                reason: MalformedReason::LabelOutsideSubsection
            }
        ));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library = MusicLibrary::load(&dir.path().join(DEFAULT_PLAYLIST)).unwrap();
        assert!(library.is_empty());
        assert!(library.index().tracks().is_empty());
    }

    #[test]
    fn test_load_utf16_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&utf16le_with_bom(SAMPLE)).unwrap();

        let library = MusicLibrary::load(file.path()).unwrap();
        assert_eq!(library.sections().count(), 2);
        assert_eq!(library.track_count(), 4);
        assert!(library.track_by_name("credits").is_some());
    }

    #[test]
    fn test_load_rejects_bad_utf16() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xFE, 0x41]).unwrap();

        let err = MusicLibrary::load(file.path()).unwrap_err();
        assert!(matches!(err, LibraryError::Encoding { encoding: "UTF-16LE", .. }));
    }

    #[test]
    fn test_demo_playlist_parses() {
        let library = MusicLibrary::parse(include_str!("../../demos/musiclist.txt")).unwrap();
        assert_eq!(library.sections().count(), 2);
        assert_eq!(library.index().subsections(), ["investigation", "trial"]);

        let investigation = library
            .subsection(library.subsection_by_name("investigation").unwrap())
            .unwrap();
        let labels = investigation
            .entries
            .iter()
            .filter(|entry| matches!(entry, SubsectionEntry::Label(_)))
            .count();
        assert_eq!(labels, 2);
        assert_eq!(investigation.entries.len(), 5);
    }

    #[test]
    fn test_decode_variants() {
        assert_eq!(decode_text(b"[A]\n").unwrap(), "[A]\n");
        assert_eq!(decode_text(b"\xEF\xBB\xBF[A]\n").unwrap(), "[A]\n");
        assert_eq!(decode_text(&[0xFE, 0xFF, 0x00, 0x5B]).unwrap(), "[");
        assert!(decode_text(&[0xC3, 0x28]).is_err());
    }
}
