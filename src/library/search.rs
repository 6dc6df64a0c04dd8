// Prefix search over track, section and subsection names
//
// Each search space is a case-insensitively sorted list of names. A binary
// search finds one entry starting with the query, then a linear scan in both
// directions collects the contiguous block of matches around it.

use std::collections::HashSet;

use super::{MusicLibrary, SectionId, SubsectionEntry, SubsectionId, TrackId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Sections,
    Subsections,
    Tracks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub scope: SearchScope,
    pub needle: String, // lowercase
}

impl SearchQuery {
    /// `[name` searches sections, `<name` subsections, anything else tracks.
    /// An empty query means "no search" and yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }

        let (scope, needle) = if text.starts_with('[') {
            (SearchScope::Sections, text.trim_matches(|c| c == '[' || c == ']'))
        } else if text.starts_with('<') {
            (SearchScope::Subsections, text.trim_matches(|c| c == '<' || c == '>'))
        } else {
            (SearchScope::Tracks, text)
        };

        Some(Self {
            scope,
            needle: needle.to_lowercase(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchHit {
    Section(SectionId),
    Subsection(SubsectionId),
    Track(TrackId),
}

/// Sorted lowercase name lists, built once after loading
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    tracks: Vec<String>,
    sections: Vec<String>,
    subsections: Vec<String>,
}

impl SearchIndex {
    pub fn build<'a>(
        tracks: impl IntoIterator<Item = &'a String>,
        sections: impl IntoIterator<Item = &'a String>,
        subsections: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        Self {
            tracks: sorted_space(tracks),
            sections: sorted_space(sections),
            subsections: sorted_space(subsections),
        }
    }

    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn subsections(&self) -> &[String] {
        &self.subsections
    }

    pub fn space(&self, scope: SearchScope) -> &[String] {
        match scope {
            SearchScope::Sections => &self.sections,
            SearchScope::Subsections => &self.subsections,
            SearchScope::Tracks => &self.tracks,
        }
    }

    pub fn lookup(&self, query: &SearchQuery) -> Option<&[String]> {
        prefix_matches(self.space(query.scope), &query.needle)
    }
}

fn sorted_space<'a>(names: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut space: Vec<String> = names.into_iter().map(|name| name.to_lowercase()).collect();
    space.sort();
    space
}

/// All entries of a case-insensitively sorted `space` that start with
/// `needle` (case-insensitive), in sorted order. `None` when nothing matches.
pub fn prefix_matches<'a>(space: &'a [String], needle: &str) -> Option<&'a [String]> {
    let needle = needle.to_lowercase();
    let matches = |entry: &String| entry.to_lowercase().starts_with(&needle);

    let anchor = find_anchor(space, &needle)?;

    let mut end = anchor + 1;
    while end < space.len() && matches(&space[end]) {
        end += 1;
    }
    let mut start = anchor;
    while start > 0 && matches(&space[start - 1]) {
        start -= 1;
    }

    Some(&space[start..end])
}

// Any index whose entry starts with the needle
fn find_anchor(space: &[String], needle: &str) -> Option<usize> {
    let (mut lo, mut hi) = (0, space.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let entry = space[mid].to_lowercase();
        if entry.starts_with(needle) {
            return Some(mid);
        }
        if entry.as_str() < needle {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    None
}

impl MusicLibrary {
    /// Run a query against the library.
    ///
    /// * sections: each section, its direct tracks, then each subsection with its tracks
    /// * subsections: each subsection with its tracks
    /// * tracks: owning section and subsection (each once per search), then the track
    ///
    /// Nested labels never show up in results. `None` means no match.
    pub fn search(&self, query: &SearchQuery) -> Option<Vec<SearchHit>> {
        let names = self.index.lookup(query)?;
        let mut hits = Vec::new();

        match query.scope {
            SearchScope::Sections => {
                for id in names.iter().filter_map(|name| self.section_names.get(name)) {
                    self.push_section_hits(*id, &mut hits);
                }
            }
            SearchScope::Subsections => {
                for id in names.iter().filter_map(|name| self.subsection_names.get(name)) {
                    self.push_subsection_hits(*id, &mut hits);
                }
            }
            SearchScope::Tracks => {
                let mut seen_sections = HashSet::new();
                let mut seen_subsections = HashSet::new();

                for id in names.iter().filter_map(|name| self.track_names.get(name)) {
                    let Some(track) = self.track(*id) else {
                        continue;
                    };
                    if seen_sections.insert(track.section) {
                        hits.push(SearchHit::Section(track.section));
                    }
                    if let Some(subsection) = track.subsection {
                        if seen_subsections.insert(subsection) {
                            hits.push(SearchHit::Subsection(subsection));
                        }
                    }
                    hits.push(SearchHit::Track(*id));
                }
            }
        }

        Some(hits)
    }

    fn push_section_hits(&self, id: SectionId, hits: &mut Vec<SearchHit>) {
        let Some(section) = self.section(id) else {
            return;
        };
        hits.push(SearchHit::Section(id));
        hits.extend(section.tracks.iter().copied().map(SearchHit::Track));
        for subsection in &section.subsections {
            self.push_subsection_hits(*subsection, hits);
        }
    }

    fn push_subsection_hits(&self, id: SubsectionId, hits: &mut Vec<SearchHit>) {
        let Some(subsection) = self.subsection(id) else {
            return;
        };
        hits.push(SearchHit::Subsection(id));
        hits.extend(subsection.entries.iter().filter_map(|entry| match entry {
            SubsectionEntry::Track(track) => Some(SearchHit::Track(*track)),
            SubsectionEntry::Label(_) => None,
        }));
    }
}
