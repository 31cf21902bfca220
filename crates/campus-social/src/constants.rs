/// Maximum event title length in characters
pub const EVENT_TITLE_MAX: usize = 80;

/// Maximum event description length in characters
pub const EVENT_DESCRIPTION_MAX: usize = 2000;

/// Maximum display name length in characters
pub const DISPLAY_NAME_MAX: usize = 50;

/// Maximum profile bio length in characters
pub const BIO_MAX: usize = 280;

/// Maximum comment length in characters
pub const COMMENT_TEXT_MAX: usize = 500;

/// Shortest query that triggers a prefix search
pub const SEARCH_MIN_CHARS: usize = 2;

/// Upper bound of the prefix range used for lowercase prefix search
pub const PREFIX_RANGE_END: char = '\u{f8ff}';

/// Default number of events per feed page
pub const DEFAULT_FEED_PAGE_SIZE: usize = 20;

/// Default cap on search results
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Default number of comments per page
pub const DEFAULT_COMMENT_PAGE_SIZE: usize = 20;

/// Default deadline for a single store call, in milliseconds
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 10_000;

/// Default display name for lazily created profiles
pub const FALLBACK_DISPLAY_NAME: &str = "Student";
