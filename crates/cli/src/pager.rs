//! Pager state for interactive audit browsing
//!
//! A browse session is identified by an opaque token. The state behind it
//! (filter, page size and the cursors of the page last rendered) lives for a
//! fixed TTL after it was last touched. Expired entries are dropped lazily on
//! lookup and in bulk by `sweep`.

use chrono::{DateTime, Duration, Utc};
use obol_core::{AuditFilter, Page, PageRequest};
use std::collections::HashMap;
use uuid::Uuid;

/// Pager sessions expire this long after their last use.
pub const PAGER_TTL_MINUTES: i64 = 10;

/// What the user asked the pager to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    /// Older rows
    Next,
    /// Newer rows
    Prev,
    /// Reload the newest page
    Refresh,
}

impl Nav {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "n" | "next" => Some(Nav::Next),
            "p" | "prev" => Some(Nav::Prev),
            "r" | "refresh" => Some(Nav::Refresh),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerState {
    pub filter: AuditFilter,
    pub limit: u32,
    pub before_id: Option<i64>,
    pub after_id: Option<i64>,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PagerState {
    pub fn new(filter: AuditFilter, limit: u32) -> Self {
        Self {
            filter,
            limit,
            before_id: None,
            after_id: None,
            has_prev: false,
            has_next: false,
        }
    }

    /// Request for `nav`, or `None` when there is nothing that way.
    pub fn request(&self, nav: Nav) -> Option<PageRequest> {
        match nav {
            Nav::Next if self.has_next => self
                .before_id
                .map(|before_id| PageRequest::older(self.limit, before_id)),
            Nav::Prev if self.has_prev => self
                .after_id
                .map(|after_id| PageRequest::newer(self.limit, after_id)),
            Nav::Refresh => Some(PageRequest::first(self.limit)),
            _ => None,
        }
    }

    /// Record the cursors of a freshly rendered page
    pub fn record<T>(&mut self, page: &Page<T>) {
        self.before_id = page.cursor.before_id;
        self.after_id = page.cursor.after_id;
        self.has_prev = page.has_prev;
        self.has_next = page.has_next;
    }
}

struct Entry {
    state: PagerState,
    expires_at: DateTime<Utc>,
}

/// Token → pager state, with expiry
pub struct PagerStates {
    ttl: Duration,
    entries: HashMap<Uuid, Entry>,
}

impl Default for PagerStates {
    fn default() -> Self {
        Self::new(Duration::minutes(PAGER_TTL_MINUTES))
    }
}

impl PagerStates {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Store a new session and return its token
    pub fn put(&mut self, state: PagerState, now: DateTime<Utc>) -> Uuid {
        let token = Uuid::new_v4();
        self.entries.insert(
            token,
            Entry {
                state,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Live state for `token`; an expired entry is removed and `None` returned.
    pub fn get(&mut self, token: &Uuid, now: DateTime<Utc>) -> Option<&PagerState> {
        if self.entries.get(token)?.expires_at <= now {
            self.entries.remove(token);
            return None;
        }
        self.entries.get(token).map(|e| &e.state)
    }

    /// Replace a live session's state and push back its expiry.
    /// Returns `false` if the token is unknown or expired.
    pub fn update(&mut self, token: &Uuid, state: PagerState, now: DateTime<Utc>) -> bool {
        if self.get(token, now).is_none() {
            return false;
        }
        self.entries.insert(
            *token,
            Entry {
                state,
                expires_at: now + self.ttl,
            },
        );
        true
    }

    pub fn remove(&mut self, token: &Uuid) -> Option<PagerState> {
        self.entries.remove(token).map(|e| e.state)
    }

    /// Drop every expired session; returns how many were dropped.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obol_core::Cursor;

    fn state() -> PagerState {
        PagerState::new(AuditFilter::tenant("guild-1"), 5)
    }

    #[test]
    fn test_get_before_and_after_ttl() {
        let now = Utc::now();
        let mut states = PagerStates::default();
        let token = states.put(state(), now);

        assert!(states.get(&token, now + Duration::minutes(9)).is_some());
        assert!(states.get(&token, now + Duration::minutes(10)).is_none());
        // Expired lookups also evict
        assert_eq!(states.len(), 0);
    }

    #[test]
    fn test_update_extends_expiry() {
        let now = Utc::now();
        let mut states = PagerStates::new(Duration::minutes(10));
        let token = states.put(state(), now);

        let later = now + Duration::minutes(8);
        let mut next = state();
        next.before_id = Some(42);
        assert!(states.update(&token, next, later));

        let found = states.get(&token, now + Duration::minutes(15)).cloned();
        assert_eq!(found.and_then(|s| s.before_id), Some(42));

        assert!(!states.update(&Uuid::new_v4(), state(), later));
    }

    #[test]
    fn test_sweep_drops_only_expired() {
        let now = Utc::now();
        let mut states = PagerStates::new(Duration::minutes(10));
        states.put(state(), now - Duration::minutes(11));
        states.put(state(), now - Duration::minutes(20));
        let live = states.put(state(), now);

        assert_eq!(states.sweep(now), 2);
        assert_eq!(states.len(), 1);
        assert!(states.get(&live, now).is_some());
        assert_eq!(states.sweep(now), 0);
    }

    #[test]
    fn test_requests_follow_rendered_page() {
        let mut s = state();
        assert_eq!(s.request(Nav::Next), None);
        assert_eq!(s.request(Nav::Prev), None);
        assert_eq!(s.request(Nav::Refresh), Some(PageRequest::first(5)));

        let page: Page<i64> = Page {
            items: vec![20, 19, 18, 17, 16],
            has_prev: true,
            has_next: true,
            cursor: Cursor {
                before_id: Some(16),
                after_id: Some(20),
            },
        };
        s.record(&page);
        assert_eq!(s.request(Nav::Next), Some(PageRequest::older(5, 16)));
        assert_eq!(s.request(Nav::Prev), Some(PageRequest::newer(5, 20)));
    }

    #[test]
    fn test_nav_parse() {
        assert_eq!(Nav::parse(" N "), Some(Nav::Next));
        assert_eq!(Nav::parse("prev"), Some(Nav::Prev));
        assert_eq!(Nav::parse("r"), Some(Nav::Refresh));
        assert_eq!(Nav::parse("x"), None);
    }
}
