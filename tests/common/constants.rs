//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the fixture library changes, update only this file.

// ============================================================================
// Test Library IDs
// ============================================================================

/// Track "Opening" of "First Album"
pub const TRACK_1_ID: i64 = 1;

/// Track "Closing" of "First Album"
pub const TRACK_2_ID: i64 = 2;

/// Video "Holiday"
pub const VIDEO_ID: i64 = 3;

/// Album "First Album"
pub const ALBUM_ID: i64 = 10;

/// Artist "The Test Band"
pub const ARTIST_ID: i64 = 20;

/// Genre "Rock"
pub const GENRE_ID: i64 = 30;

/// Playlist "Road Trip", tracks in reverse order
pub const PLAYLIST_ID: i64 = 40;

/// Video folder "videos"
pub const VIDEO_FOLDER_ID: i64 = 50;

/// Id no fixture uses
pub const MISSING_ID: i64 = 9999;

// ============================================================================
// Test Library Content
// ============================================================================

pub const ALBUM_TITLE: &str = "First Album";
pub const ARTIST_NAME: &str = "The Test Band";
pub const TRACK_1_TITLE: &str = "Opening";
pub const TRACK_2_TITLE: &str = "Closing";

/// Bytes of the first track's file, small enough to compare whole
pub const TRACK_1_CONTENT: &[u8] = b"opening track audio";

// ============================================================================
// Timeouts
// ============================================================================

/// Long-poll wait configured on test servers
pub const LONG_POLL_TIMEOUT_MS: u64 = 300;

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Request timeout for HTTP client (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server readiness (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Maximum wait for a WebSocket message (milliseconds)
pub const WS_MESSAGE_TIMEOUT_MS: u64 = 2000;
