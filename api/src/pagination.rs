//! Cursor-based pagination for list endpoints.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Common pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Opaque cursor from a previous response (base64-encoded offset).
    pub cursor: Option<String>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Decode the cursor to a numeric offset. Returns 0 if the cursor
    /// is absent or invalid.
    pub fn decode_offset(&self) -> u64 {
        self.cursor
            .as_deref()
            .and_then(decode_cursor)
            .unwrap_or(0)
    }
}

/// Encode a numeric offset into an opaque cursor string.
pub fn encode_cursor(offset: u64) -> String {
    BASE64.encode(offset.to_string())
}

/// Decode a cursor string back to a numeric offset.
pub fn decode_cursor(cursor: &str) -> Option<u64> {
    let bytes = BASE64.decode(cursor).ok()?;
    let s = std::str::from_utf8(&bytes).ok()?;
    s.parse::<u64>().ok()
}

/// Take one page out of a full result set, returning the page and the
/// cursor for the next one (`None` at the end).
pub fn paginate<T>(items: Vec<T>, params: &PaginationParams) -> (Vec<T>, Option<String>) {
    let offset = params.decode_offset() as usize;
    let count = params.effective_count() as usize;

    if offset >= items.len() {
        return (Vec::new(), None);
    }
    // Fetch one extra item to know whether another page exists.
    let mut page: Vec<T> = items.into_iter().skip(offset).take(count + 1).collect();
    let next = if page.len() > count {
        page.truncate(count);
        Some(encode_cursor((offset + count) as u64))
    } else {
        None
    };
    (page, next)
}
