// Serializable view of the hierarchy, used for `--dump`

use serde::Serialize;

use super::{MusicLibrary, Section, Subsection, SubsectionEntry, TrackId};

#[derive(Debug, Serialize)]
pub struct SectionSnapshot<'a> {
    pub name: &'a str,
    pub tracks: Vec<EntrySnapshot<'a>>,
    pub subsections: Vec<SubsectionSnapshot<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SubsectionSnapshot<'a> {
    pub name: &'a str,
    pub entries: Vec<EntrySnapshot<'a>>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrySnapshot<'a> {
    Track { name: &'a str, url: &'a str },
    Label { text: &'a str },
}

impl MusicLibrary {
    /// Sections in file order with everything nested below them
    pub fn snapshot(&self) -> Vec<SectionSnapshot<'_>> {
        self.sections
            .iter()
            .map(|section| self.section_snapshot(section))
            .collect()
    }

    fn section_snapshot<'a>(&'a self, section: &'a Section) -> SectionSnapshot<'a> {
        SectionSnapshot {
            name: &section.name,
            tracks: section
                .tracks
                .iter()
                .filter_map(|id| self.track_snapshot(*id))
                .collect(),
            subsections: section
                .subsections
                .iter()
                .filter_map(|id| self.subsection(*id))
                .map(|subsection| self.subsection_snapshot(subsection))
                .collect(),
        }
    }

    fn subsection_snapshot<'a>(&'a self, subsection: &'a Subsection) -> SubsectionSnapshot<'a> {
        SubsectionSnapshot {
            name: &subsection.name,
            entries: subsection
                .entries
                .iter()
                .filter_map(|entry| match entry {
                    SubsectionEntry::Track(id) => self.track_snapshot(*id),
                    SubsectionEntry::Label(text) => Some(EntrySnapshot::Label {
                        text: text.as_str(),
                    }),
                })
                .collect(),
        }
    }

    fn track_snapshot(&self, id: TrackId) -> Option<EntrySnapshot<'_>> {
        self.track(id).map(|track| EntrySnapshot::Track {
            name: &track.name,
            url: &track.url,
        })
    }
}
