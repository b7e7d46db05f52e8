// src/engine/core.rs

//! Pure candidate triage.
//!
//! Decides, from the ignore list and the in-memory view of the persisted
//! sets, whether a discovered recording may go on to the stability check.
//! No IO happens here; the dispatcher keeps [`TrackedSets`] in step with
//! what it writes to disk.

use std::collections::HashSet;
use std::path::Path;

use crate::scan::IgnoreList;

/// In-memory mirror of the `Done` and `InFlight` sets for one run.
#[derive(Debug, Clone, Default)]
pub struct TrackedSets {
    done: HashSet<String>,
    in_flight: HashSet<String>,
}

impl TrackedSets {
    pub fn new<D, F>(done: D, in_flight: F) -> Self
    where
        D: IntoIterator<Item = String>,
        F: IntoIterator<Item = String>,
    {
        Self {
            done: done.into_iter().collect(),
            in_flight: in_flight.into_iter().collect(),
        }
    }

    pub fn is_done(&self, identity: &str) -> bool {
        self.done.contains(identity)
    }

    pub fn is_in_flight(&self, identity: &str) -> bool {
        self.in_flight.contains(identity)
    }

    pub fn mark_in_flight(&mut self, identity: &str) {
        self.in_flight.insert(identity.to_string());
    }

    pub fn clear_in_flight(&mut self, identity: &str) {
        self.in_flight.remove(identity);
    }

    pub fn mark_done(&mut self, identity: &str) {
        self.done.insert(identity.to_string());
    }
}

/// Verdict for one discovered recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triage<'a> {
    /// Matched this ignore entry.
    Ignored(&'a str),
    AlreadyDone,
    InFlight,
    /// Passes every state check; next comes the stability check.
    Eligible,
}

/// Check a recording against the ignore list, then `Done`, then `InFlight`.
///
/// The ignore list is consulted first and wins unconditionally.
pub fn triage<'a>(
    path: &Path,
    identity: &str,
    ignore: &'a IgnoreList,
    sets: &TrackedSets,
) -> Triage<'a> {
    if let Some(pattern) = ignore.matching(path) {
        return Triage::Ignored(pattern);
    }
    if sets.is_done(identity) {
        return Triage::AlreadyDone;
    }
    if sets.is_in_flight(identity) {
        return Triage::InFlight;
    }
    Triage::Eligible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(done: &[&str], in_flight: &[&str]) -> TrackedSets {
        TrackedSets::new(
            done.iter().map(|s| s.to_string()),
            in_flight.iter().map(|s| s.to_string()),
        )
    }

    #[test]
    fn ignore_beats_every_other_state() {
        let ignore = IgnoreList::new(["Shopping"]);
        let id = "/rec/Shopping.ts";
        let tracked = sets(&[id], &[id]);

        assert_eq!(
            triage(Path::new(id), id, &ignore, &tracked),
            Triage::Ignored("Shopping")
        );
    }

    #[test]
    fn done_is_checked_before_in_flight() {
        let ignore = IgnoreList::default();
        let id = "/rec/a.ts";
        assert_eq!(
            triage(Path::new(id), id, &ignore, &sets(&[id], &[id])),
            Triage::AlreadyDone
        );
        assert_eq!(
            triage(Path::new(id), id, &ignore, &sets(&[], &[id])),
            Triage::InFlight
        );
    }

    #[test]
    fn membership_is_exact_not_substring() {
        let ignore = IgnoreList::default();
        let tracked = sets(&["/rec/show.ts.old"], &["/rec/show"]);
        let id = "/rec/show.ts";
        assert_eq!(triage(Path::new(id), id, &ignore, &tracked), Triage::Eligible);
    }

    #[test]
    fn marks_update_the_view() {
        let mut tracked = TrackedSets::default();
        tracked.mark_in_flight("a");
        assert!(tracked.is_in_flight("a"));
        tracked.mark_done("a");
        tracked.clear_in_flight("a");
        assert!(tracked.is_done("a"));
        assert!(!tracked.is_in_flight("a"));
    }
}
