use super::PlaybackCommand;
use crate::events::NowPlaying;
use crate::items::PlayQueueItem;
use crate::library::Media;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepeatMode {
    #[default]
    None,
    One,
    All,
}

impl RepeatMode {
    pub fn as_wire(&self) -> i32 {
        match self {
            RepeatMode::None => 0,
            RepeatMode::One => 1,
            RepeatMode::All => 2,
        }
    }
}

/// What to open on the player.
#[derive(Clone, Debug, Default)]
pub struct LoadRequest {
    pub medias: Vec<Media>,
    pub start_index: usize,
    /// Add to the current queue instead of replacing it.
    pub append: bool,
    /// Play videos as audio only.
    pub as_audio: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Started,
    /// The single requested media is already the current one.
    AlreadyCurrent,
    /// Refused, with a reason the client can show.
    Forbidden(String),
}

/// The player side of remote control.
///
/// Implementations are owned by a single control loop, so every method
/// takes `&mut self` and none of them may block.
pub trait PlaybackEngine: Send + 'static {
    /// Returns whether the command was accepted.
    fn execute(&mut self, command: PlaybackCommand) -> bool;

    fn load(&mut self, request: LoadRequest) -> LoadOutcome;

    /// Answer a pending "resume from saved position?" question. Returns
    /// false when nothing was pending.
    fn resume(&mut self, resume: bool, apply_to_playlist: bool) -> bool;

    /// Reload the last audio or video playlist. Returns false when there
    /// is none.
    fn resume_last_playlist(&mut self, audio: bool) -> bool;

    /// Move playback time forward.
    fn advance(&mut self, elapsed: Duration);

    fn play_queue(&self) -> Vec<PlayQueueItem>;

    fn now_playing(&self) -> NowPlaying;

    fn is_playing(&self) -> bool;

    fn volume(&self) -> i32;

    fn current_media(&self) -> Option<Media>;
}
