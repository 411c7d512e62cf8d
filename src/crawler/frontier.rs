//! Crawl frontier: the pending queue plus the visited and offline sets
//!
//! The frontier owns every URL seen during one crawl run and guarantees:
//! - a URL is in at most one of pending, visited, offline
//! - a URL is enqueued at most once per run, whichever page links to it
//! - pending URLs come out in the order they were first offered
//!
//! Membership lives in a single map so the three sets cannot drift apart. The
//! queue may hold stale entries for URLs that were resolved while still
//! queued; `next` skips them.

use crate::state::UrlState;
use std::collections::{HashMap, VecDeque};

/// Frontier for a single crawl run
#[derive(Debug, Default)]
pub struct Frontier {
    /// FIFO order of offered URLs
    queue: VecDeque<String>,

    /// Current state of every URL seen this run
    states: HashMap<String, UrlState>,

    pending: usize,
    in_flight: usize,
    visited: usize,
    offline: usize,
}

impl Frontier {
    /// Creates a frontier whose pending queue holds the deduplicated seeds
    ///
    /// Seeds keep their iteration order; later duplicates are dropped.
    pub fn seed<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frontier = Self::default();
        for url in urls {
            frontier.offer(url);
        }
        tracing::debug!("Frontier seeded with {} URLs", frontier.pending);
        frontier
    }

    /// Removes and returns the head of the pending queue
    ///
    /// The returned URL is held in flight until it is marked visited or offline,
    /// so it cannot be offered again in the meantime.
    pub fn next(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            if self.states.get(&url) == Some(&UrlState::Pending) {
                self.transition(&url, UrlState::InFlight);
                return Some(url);
            }
        }
        None
    }

    /// Moves a URL into the visited set. No-op if it is already visited.
    pub fn mark_visited(&mut self, url: &str) {
        if self.states.get(url) != Some(&UrlState::Visited) {
            self.transition(url, UrlState::Visited);
        }
    }

    /// Moves a URL into the offline set. No-op if it is already offline.
    pub fn mark_offline(&mut self, url: &str) {
        if self.states.get(url) != Some(&UrlState::Offline) {
            self.transition(url, UrlState::Offline);
        }
    }

    /// Appends a URL to the pending queue unless it has been seen this run
    ///
    /// Returns true if the URL was enqueued. URLs already pending, in flight,
    /// visited or offline are rejected.
    pub fn offer(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.states.contains_key(&url) {
            return false;
        }

        self.states.insert(url.clone(), UrlState::Pending);
        self.queue.push_back(url);
        self.pending += 1;
        true
    }

    /// Returns true if nothing is left to fetch
    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Returns the state of a URL, or None if it has never been seen this run
    pub fn state_of(&self, url: &str) -> Option<UrlState> {
        self.states.get(url).copied()
    }

    pub fn pending_len(&self) -> usize {
        self.pending
    }

    pub fn visited_len(&self) -> usize {
        self.visited
    }

    pub fn offline_len(&self) -> usize {
        self.offline
    }

    /// URLs handed out by `next` and not yet marked
    pub fn in_flight_len(&self) -> usize {
        self.in_flight
    }

    /// Pending URLs in dequeue order
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.queue
            .iter()
            .filter(|url| self.states.get(url.as_str()) == Some(&UrlState::Pending))
            .map(String::as_str)
    }

    pub fn visited(&self) -> impl Iterator<Item = &str> {
        self.urls_in(UrlState::Visited)
    }

    pub fn offline(&self) -> impl Iterator<Item = &str> {
        self.urls_in(UrlState::Offline)
    }

    fn urls_in(&self, state: UrlState) -> impl Iterator<Item = &str> {
        self.states
            .iter()
            .filter(move |(_, s)| **s == state)
            .map(|(url, _)| url.as_str())
    }

    fn transition(&mut self, url: &str, to: UrlState) {
        let from = match self.states.get_mut(url) {
            Some(current) => Some(std::mem::replace(current, to)),
            None => {
                self.states.insert(url.to_string(), to);
                None
            }
        };

        if let Some(from) = from {
            *self.counter_mut(from) -= 1;
        }
        *self.counter_mut(to) += 1;
    }

    fn counter_mut(&mut self, state: UrlState) -> &mut usize {
        match state {
            UrlState::Pending => &mut self.pending,
            UrlState::Visited => &mut self.visited,
            UrlState::Offline => &mut self.offline,
            UrlState::InFlight => &mut self.in_flight,
        }
    }
}
