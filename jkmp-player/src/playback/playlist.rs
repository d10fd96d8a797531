//! Playlist
//!
//! Ordered tracks keyed by id. Insertion order drives the sequential modes.
//! Every track held here has a non-empty id unique within the list.

use crate::error::{Error, Result};
use jkmp_common::events::TrackSummary;
use jkmp_common::{Track, TrackId};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let mut playlist = Self::new();
        playlist.tracks = playlist.ingest(tracks);
        playlist
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn find(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    pub fn index_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn id_at(&self, index: usize) -> Option<&TrackId> {
        self.tracks.get(index).map(|t| &t.id)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.tracks.len().checked_sub(1)
    }

    /// Clamp an index into `0..len`; `None` when empty
    pub fn clamp_index(&self, index: usize) -> Option<usize> {
        self.last_index().map(|last| index.min(last))
    }

    /// Give fresh ids to incoming tracks that lack one or collide with an id
    /// already present (in the list or earlier in the batch)
    pub fn ingest(&self, tracks: Vec<Track>) -> Vec<Track> {
        let mut seen: HashSet<TrackId> = self.tracks.iter().map(|t| t.id.clone()).collect();
        tracks
            .into_iter()
            .map(|mut track| {
                if track.id.is_empty() || seen.contains(&track.id) {
                    let fresh = TrackId::generate();
                    debug!(old = %track.id, new = %fresh, name = %track.name, "Assigned track id");
                    track.id = fresh;
                }
                seen.insert(track.id.clone());
                track
            })
            .collect()
    }

    /// Insert at `at`, clamped to the end. Returns the index actually used.
    pub fn insert_at(&mut self, at: usize, tracks: Vec<Track>) -> usize {
        let at = at.min(self.tracks.len());
        let incoming = self.ingest(tracks);
        self.tracks.splice(at..at, incoming);
        at
    }

    /// Append tracks whose direct source is not already present
    ///
    /// Deferred sources have no comparable URL and are always appended.
    /// Returns the number of tracks added.
    pub fn merge(&mut self, tracks: Vec<Track>) -> usize {
        let fresh: Vec<Track> = tracks
            .into_iter()
            .filter(|t| match t.music_src.as_direct() {
                Some(src) => !self.contains_src(src),
                None => true,
            })
            .collect();
        let added = fresh.len();
        let len = self.tracks.len();
        self.insert_at(len, fresh);
        added
    }

    /// Replace everything; incoming ids are kept unless missing or repeated
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks.clear();
        self.tracks = self.ingest(tracks);
    }

    pub fn remove(&mut self, id: &TrackId) -> Option<(usize, Track)> {
        let index = self.index_of(id)?;
        Some((index, self.tracks.remove(index)))
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Move the track at `from` so it ends up at `to`
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.tracks.len();
        for index in [from, to] {
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
        }
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        Ok(())
    }

    pub fn contains_src(&self, src: &str) -> bool {
        self.tracks
            .iter()
            .any(|t| t.music_src.as_direct() == Some(src))
    }

    pub fn summaries(&self) -> Vec<TrackSummary> {
        self.tracks.iter().map(Track::summary).collect()
    }

    /// Summaries as they will be once `id` is removed
    pub fn summaries_without(&self, id: &TrackId) -> Vec<TrackSummary> {
        self.tracks
            .iter()
            .filter(|t| &t.id != id)
            .map(Track::summary)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jkmp_common::MusicSource;

    fn track(id: &str) -> Track {
        Track::new(id, MusicSource::direct(format!("mem://{}", id))).with_id(id)
    }

    fn ids(playlist: &Playlist) -> Vec<String> {
        playlist.tracks().iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn test_ingest_assigns_missing_and_duplicate_ids() {
        let playlist = Playlist::from_tracks(vec![
            track("a"),
            Track::new("anon", MusicSource::direct("mem://anon")),
            track("a"),
        ]);

        assert_eq!(playlist.len(), 3);
        assert_eq!(playlist.id_at(0), Some(&TrackId::from("a")));
        let unique: HashSet<_> = playlist.tracks().iter().map(|t| t.id.clone()).collect();
        assert_eq!(unique.len(), 3);
        assert!(playlist.tracks().iter().all(|t| !t.id.is_empty()));
    }

    #[test]
    fn test_insert_clamps_to_end() {
        let mut playlist = Playlist::from_tracks(vec![track("a"), track("b")]);
        let at = playlist.insert_at(99, vec![track("c")]);
        assert_eq!(at, 2);
        assert_eq!(ids(&playlist), vec!["a", "b", "c"]);

        playlist.insert_at(1, vec![track("x"), track("y")]);
        assert_eq!(ids(&playlist), vec!["a", "x", "y", "b", "c"]);
    }

    #[test]
    fn test_move_item() {
        let mut playlist = Playlist::from_tracks(vec![track("a"), track("b"), track("c")]);
        playlist.move_item(0, 2).unwrap();
        assert_eq!(ids(&playlist), vec!["b", "c", "a"]);

        let err = playlist.move_item(3, 0).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(ids(&playlist), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_merge_skips_known_sources() {
        let mut playlist = Playlist::from_tracks(vec![track("a"), track("b")]);
        let added = playlist.merge(vec![
            Track::new("again", MusicSource::direct("mem://a")),
            track("c"),
        ]);
        assert_eq!(added, 1);
        assert_eq!(ids(&playlist), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_reports_index() {
        let mut playlist = Playlist::from_tracks(vec![track("a"), track("b"), track("c")]);
        let (index, removed) = playlist.remove(&TrackId::from("b")).unwrap();
        assert_eq!(index, 1);
        assert_eq!(removed.name, "b");
        assert!(playlist.remove(&TrackId::from("b")).is_none());
        assert_eq!(playlist.summaries_without(&TrackId::from("a")).len(), 1);
    }

    #[test]
    fn test_clamp_index() {
        let playlist = Playlist::from_tracks(vec![track("a"), track("b")]);
        assert_eq!(playlist.clamp_index(7), Some(1));
        assert_eq!(Playlist::new().clamp_index(0), None);
    }
}
