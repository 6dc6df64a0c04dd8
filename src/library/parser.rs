// Playlist line parser
//
//   [Section Name]
//   <Subsection Name>
//   \Nested Label\
//   Track Name:url/or/path
//
// Parsing is a fold: each line becomes a ParsedEntry, which ParseState applies
// to the library under construction.

use super::{LibraryError, MalformedReason, MusicLibrary, SectionId, SubsectionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEntry {
    Section(String),
    Subsection(String),
    Label(String),
    Track { name: String, url: String },
}

/// Parse one raw line (line ending included or not). Blank lines yield `None`.
/// `line` is 1-based and only used for error reporting.
pub fn parse_line(raw: &str, line: usize) -> Result<Option<ParsedEntry>, LibraryError> {
    let content = strip_line_ending(raw);
    if content.trim().is_empty() {
        return Ok(None);
    }

    let entry = if let Some(rest) = content.strip_prefix('[') {
        ParsedEntry::Section(strip_closer(rest, ']'))
    } else if let Some(rest) = content.strip_prefix('<') {
        ParsedEntry::Subsection(strip_closer(rest, '>'))
    } else if let Some(rest) = content.strip_prefix('\\') {
        ParsedEntry::Label(strip_closer(rest, '\\'))
    } else {
        let (name, url) = content.split_once(':').ok_or(LibraryError::Malformed {
            line,
            reason: MalformedReason::MissingUrl,
        })?;
        ParsedEntry::Track {
            name: name.to_string(),
            url: url.trim().to_string(),
        }
    };

    Ok(Some(entry))
}

// Drops the trailing \n, then a trailing \r; lines are split on \n only
fn strip_line_ending(raw: &str) -> &str {
    let raw = raw.strip_suffix('\n').unwrap_or(raw);
    raw.strip_suffix('\r').unwrap_or(raw)
}

fn strip_closer(rest: &str, closer: char) -> String {
    rest.strip_suffix(closer).unwrap_or(rest).to_string()
}

/// Accumulator threaded through the lines of one playlist file
#[derive(Debug, Default)]
pub struct ParseState {
    library: MusicLibrary,
    section: Option<SectionId>,
    subsection: Option<SubsectionId>,
}

impl ParseState {
    pub fn apply(mut self, entry: ParsedEntry, line: usize) -> Result<Self, LibraryError> {
        let malformed = |reason| LibraryError::Malformed { line, reason };

        match entry {
            ParsedEntry::Section(name) => {
                self.section = Some(self.library.add_section(name));
                self.subsection = None;
            }
            ParsedEntry::Subsection(name) => {
                let section = self
                    .section
                    .ok_or_else(|| malformed(MalformedReason::SubsectionOutsideSection))?;
                self.subsection = Some(self.library.add_subsection(name, section));
            }
            ParsedEntry::Label(text) => {
                let subsection = self
                    .subsection
                    .ok_or_else(|| malformed(MalformedReason::LabelOutsideSubsection))?;
                self.library.add_label(subsection, text);
            }
            ParsedEntry::Track { name, url } => {
                let section = self
                    .section
                    .ok_or_else(|| malformed(MalformedReason::TrackOutsideSection))?;
                self.library.add_track(name, url, section, self.subsection);
            }
        }

        Ok(self)
    }

    pub fn current_section(&self) -> Option<SectionId> {
        self.section
    }

    pub fn current_subsection(&self) -> Option<SubsectionId> {
        self.subsection
    }

    /// Seal the library and build its search index
    pub fn finish(mut self) -> MusicLibrary {
        self.library.build_index();
        self.library
    }
}
