use crate::items::PlayQueueItem;
use serde::{Deserialize, Serialize};

/// State change pushed to remote clients, serialized flat as
/// `{"type": "...", ...fields}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    PlayQueue {
        medias: Vec<PlayQueueItem>,
    },
    NowPlaying(NowPlaying),
    PlayerStatus {
        playing: bool,
    },
    /// Late description of a browsed entry, keyed by its URI.
    BrowserDescription {
        path: String,
        description: String,
    },
    Volume {
        volume: i32,
    },
    /// Reply to a WebSocket message sent before authentication.
    Auth {
        status: String,
        #[serde(rename = "initialMessage")]
        initial_message: String,
    },
    LoginNeeded {
        #[serde(rename = "dialogOpened")]
        dialog_opened: bool,
    },
    MlRefreshNeeded {
        #[serde(rename = "refreshNeeded")]
        refresh_needed: bool,
    },
    PlaybackControlForbidden {
        forbidden: bool,
    },
    NetworkShares {
        shares: Vec<PlayQueueItem>,
    },
}

impl Event {
    /// Wire name of the event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::PlayQueue { .. } => "play-queue",
            Event::NowPlaying(_) => "now-playing",
            Event::PlayerStatus { .. } => "player-status",
            Event::BrowserDescription { .. } => "browser-description",
            Event::Volume { .. } => "volume",
            Event::Auth { .. } => "auth",
            Event::LoginNeeded { .. } => "login-needed",
            Event::MlRefreshNeeded { .. } => "ml-refresh-needed",
            Event::PlaybackControlForbidden { .. } => "playback-control-forbidden",
            Event::NetworkShares { .. } => "network-shares",
        }
    }

    pub fn is_browser_description(&self) -> bool {
        matches!(self, Event::BrowserDescription { .. })
    }

    pub fn forbidden(initial_message: &str) -> Self {
        Event::Auth {
            status: "forbidden".to_string(),
            initial_message: initial_message.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    pub title: String,
    pub artist: String,
    pub playing: bool,
    pub is_video_playing: bool,
    pub progress: i64,
    pub duration: i64,
    pub id: i64,
    #[serde(rename = "artworkURL")]
    pub artwork_url: String,
    pub uri: String,
    pub volume: i32,
    pub speed: f32,
    /// Epoch milliseconds when the sleep timer fires, 0 when unset.
    pub sleep_timer: i64,
    pub wait_for_media_end: bool,
    pub reset_on_interaction: bool,
    pub shuffle: bool,
    /// 0 none, 1 one, 2 all.
    pub repeat: i32,
    pub should_show: bool,
    pub bookmarks: Vec<WsBookmark>,
    pub chapters: Vec<WsChapter>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WsBookmark {
    pub id: i64,
    pub title: String,
    pub time: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WsChapter {
    pub title: String,
    pub time: i64,
}
