//! # Page Module
//!
//! Keyset pagination over the ledger.
//!
//! Transaction ids are assigned by the store in strictly increasing order, so
//! `id` is both the sort key and the cursor. Pages are always returned newest
//! first (`id DESC`):
//!
//! ```text
//!   newer <──────────────────────────────────────> older
//!   [ id > after_id ]  [ after_id .. before_id ]  [ id < before_id ]
//!     Direction::Newer     rendered page           Direction::Older
//! ```
//!
//! `has_prev` / `has_next` semantics:
//! - the flag in the direction of travel is verified by over-fetching one row;
//! - the opposite flag is set when the request carried a cursor, since that
//!   cursor points at rows already rendered under the same filter and ledger
//!   rows are never deleted;
//! - an empty page reports `has_prev = after_id.is_some()` and
//!   `has_next = before_id.is_some()` and echoes the request cursors.

use crate::transaction::{Transaction, TxAction};
use serde::{Deserialize, Serialize};

/// Upper bound for a page size.
pub const MAX_PAGE_LIMIT: u32 = 50;
/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Filters for an audit query. `tenant` is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    pub tenant: String,
    pub namespace_id: Option<i64>,
    pub target_subject: Option<String>,
    pub action: Option<TxAction>,
}

impl AuditFilter {
    pub fn tenant(tenant: &str) -> Self {
        Self {
            tenant: tenant.to_string(),
            namespace_id: None,
            target_subject: None,
            action: None,
        }
    }

    pub fn namespace(mut self, namespace_id: i64) -> Self {
        self.namespace_id = Some(namespace_id);
        self
    }

    pub fn target(mut self, subject: &str) -> Self {
        self.target_subject = Some(subject.to_string());
        self
    }

    pub fn action(mut self, action: TxAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Direction relative to the previously rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smaller ids (continue with `before_id`)
    Older,
    /// Larger ids (continue with `after_id`)
    Newer,
}

/// What the store must actually scan for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Newest rows, `ORDER BY id DESC`
    Latest,
    /// `id < before_id ORDER BY id DESC`
    OlderThan(i64),
    /// `id > after_id ORDER BY id ASC`
    NewerThan(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u32,
    pub direction: Direction,
    pub before_id: Option<i64>,
    pub after_id: Option<i64>,
}

impl PageRequest {
    /// Newest page.
    pub fn first(limit: u32) -> Self {
        Self {
            limit,
            direction: Direction::Older,
            before_id: None,
            after_id: None,
        }
    }

    pub fn older(limit: u32, before_id: i64) -> Self {
        Self {
            before_id: Some(before_id),
            ..Self::first(limit)
        }
    }

    pub fn newer(limit: u32, after_id: i64) -> Self {
        Self {
            limit,
            direction: Direction::Newer,
            before_id: None,
            after_id: Some(after_id),
        }
    }

    /// Continue from a rendered page in the given direction.
    pub fn from_cursor(limit: u32, direction: Direction, cursor: Cursor) -> Self {
        match direction {
            Direction::Older => Self {
                before_id: cursor.before_id,
                ..Self::first(limit)
            },
            Direction::Newer => Self {
                limit,
                direction,
                before_id: None,
                after_id: cursor.after_id,
            },
        }
    }

    /// Requested limit clamped to `[1, MAX_PAGE_LIMIT]`.
    pub fn limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    /// Rows to fetch: one extra to detect more data in the travel direction.
    pub fn fetch_limit(&self) -> u32 {
        self.limit() + 1
    }

    pub fn scan(&self) -> Scan {
        match (self.direction, self.before_id, self.after_id) {
            (Direction::Older, Some(before_id), _) => Scan::OlderThan(before_id),
            (Direction::Newer, _, Some(after_id)) => Scan::NewerThan(after_id),
            _ => Scan::Latest,
        }
    }
}

/// Bounds of a rendered page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Id of the oldest row shown; continue older with `id < before_id`
    pub before_id: Option<i64>,
    /// Id of the newest row shown; continue newer with `id > after_id`
    pub after_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T = Transaction> {
    /// Always newest first
    pub items: Vec<T>,
    pub has_prev: bool,
    pub has_next: bool,
    pub cursor: Cursor,
}

impl<T> Page<T> {
    /// Builds a page from rows fetched in scan order (at most
    /// `request.fetch_limit()` of them).
    pub fn assemble(mut rows: Vec<T>, request: &PageRequest, id_of: impl Fn(&T) -> i64) -> Self {
        let limit = request.limit() as usize;
        let scan = request.scan();

        let more = rows.len() > limit;
        rows.truncate(limit);
        if let Scan::NewerThan(_) = scan {
            rows.reverse();
        }

        let (first, last) = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (id_of(first), id_of(last)),
            _ => {
                return Self {
                    items: rows,
                    has_prev: request.after_id.is_some(),
                    has_next: request.before_id.is_some(),
                    cursor: Cursor {
                        before_id: request.before_id,
                        after_id: request.after_id,
                    },
                }
            }
        };

        let (has_prev, has_next) = match scan {
            Scan::Latest => (false, more),
            Scan::OlderThan(_) => (true, more),
            Scan::NewerThan(_) => (more, true),
        };

        Self {
            items: rows,
            has_prev,
            has_next,
            cursor: Cursor {
                before_id: Some(last),
                after_id: Some(first),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
