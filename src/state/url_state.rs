/// URL membership states for a single crawl run
///
/// Every URL the frontier has seen is in exactly one of these states.
/// Transitions: `Pending -> InFlight -> {Visited | Offline}`, and
/// `Visited <-> Offline` only when a saved page has to be demoted.
use std::fmt;

/// Represents where a URL sits in the frontier during a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Queued and waiting to be fetched
    Pending,

    /// Handed out by the frontier and not yet resolved
    InFlight,

    /// Fetched and persisted at least once this run
    Visited,

    /// Failed to fetch (or to persist) this run; never retried within the run
    Offline,
}

impl UrlState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Visited => "visited",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", UrlState::Pending), "pending");
        assert_eq!(format!("{}", UrlState::InFlight), "in_flight");
        assert_eq!(format!("{}", UrlState::Offline), "offline");
    }
}
