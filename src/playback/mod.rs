//! Remote playback commands and their dispatch onto the player's control loop.

mod controller;
mod engine;
mod local_player;

pub use controller::{PlayerHandle, PlayerSnapshot};
pub use engine::{LoadOutcome, LoadRequest, PlaybackEngine, RepeatMode};
pub use local_player::LocalPlayer;

use crate::config::FeatureFlags;
use crate::events::{Event, EventBus};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Playback loop is not running")]
    Stopped,
}

/// A command message as sent by the web client, over WebSocket or
/// `/playback-event` query parameters.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    pub message: String,
    pub id: Option<i32>,
    pub float_value: Option<f32>,
    pub long_value: Option<i64>,
    pub string_value: Option<String>,
    pub auth_ticket: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandName {
    Hello,
    Play,
    Pause,
    Previous,
    Next,
    Previous10,
    Next10,
    Shuffle,
    Repeat,
    GetVolume,
    SetVolume,
    SetProgress,
    PlayChapter,
    Speed,
    SleepTimer,
    SleepTimerWait,
    SleepTimerReset,
    AddBookmark,
    DeleteBookmark,
    RenameBookmark,
    PlayMedia,
    DeleteMedia,
    MoveMediaBottom,
    MoveMediaTop,
    Remote,
}

impl CommandName {
    pub fn parse(name: &str) -> Option<Self> {
        let command = match name {
            "hello" => CommandName::Hello,
            "play" => CommandName::Play,
            "pause" => CommandName::Pause,
            "previous" => CommandName::Previous,
            "next" => CommandName::Next,
            "previous10" => CommandName::Previous10,
            "next10" => CommandName::Next10,
            "shuffle" => CommandName::Shuffle,
            "repeat" => CommandName::Repeat,
            "get-volume" => CommandName::GetVolume,
            "set-volume" => CommandName::SetVolume,
            "set-progress" => CommandName::SetProgress,
            "play-chapter" => CommandName::PlayChapter,
            "speed" => CommandName::Speed,
            "sleep-timer" => CommandName::SleepTimer,
            "sleep-timer-wait" => CommandName::SleepTimerWait,
            "sleep-timer-reset" => CommandName::SleepTimerReset,
            "add-bookmark" => CommandName::AddBookmark,
            "delete-bookmark" => CommandName::DeleteBookmark,
            "rename-bookmark" => CommandName::RenameBookmark,
            "play-media" => CommandName::PlayMedia,
            "delete-media" => CommandName::DeleteMedia,
            "move-media-bottom" => CommandName::MoveMediaBottom,
            "move-media-top" => CommandName::MoveMediaTop,
            "remote" => CommandName::Remote,
            _ => return None,
        };
        Some(command)
    }

    /// Commands that change playback need the playback control permission.
    pub fn control_required(&self) -> bool {
        !matches!(self, CommandName::Hello | CommandName::GetVolume)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackCommand {
    Hello,
    Play,
    Pause,
    Previous,
    Next,
    Previous10,
    Next10,
    Shuffle,
    Repeat,
    GetVolume,
    SetVolume(i32),
    SetProgress(i64),
    PlayChapter(i32),
    Speed(f32),
    /// Delay in milliseconds from now.
    SleepTimer(i64),
    SleepTimerWait(bool),
    SleepTimerReset(bool),
    AddBookmark(i64),
    DeleteBookmark(i64),
    RenameBookmark { time: i64, name: String },
    PlayMedia(i32),
    DeleteMedia(i32),
    MoveMediaBottom(i32),
    MoveMediaTop(i32),
    Remote(String),
}

impl PlaybackCommand {
    /// `None` when the argument the command needs is missing, which makes
    /// the message an accepted no-op.
    pub fn from_message(name: CommandName, message: &IncomingMessage) -> Option<Self> {
        let flag = |value: &Option<String>| value.as_deref().map(|v| v == "true");
        let command = match name {
            CommandName::Hello => PlaybackCommand::Hello,
            CommandName::Play => PlaybackCommand::Play,
            CommandName::Pause => PlaybackCommand::Pause,
            CommandName::Previous => PlaybackCommand::Previous,
            CommandName::Next => PlaybackCommand::Next,
            CommandName::Previous10 => PlaybackCommand::Previous10,
            CommandName::Next10 => PlaybackCommand::Next10,
            CommandName::Shuffle => PlaybackCommand::Shuffle,
            CommandName::Repeat => PlaybackCommand::Repeat,
            CommandName::GetVolume => PlaybackCommand::GetVolume,
            CommandName::SetVolume => PlaybackCommand::SetVolume(message.id?),
            CommandName::SetProgress => PlaybackCommand::SetProgress(message.id? as i64),
            CommandName::PlayChapter => PlaybackCommand::PlayChapter(message.id?),
            CommandName::Speed => PlaybackCommand::Speed(message.float_value?),
            CommandName::SleepTimer => PlaybackCommand::SleepTimer(message.long_value?),
            CommandName::SleepTimerWait => {
                PlaybackCommand::SleepTimerWait(flag(&message.string_value)?)
            }
            CommandName::SleepTimerReset => {
                PlaybackCommand::SleepTimerReset(flag(&message.string_value)?)
            }
            CommandName::AddBookmark => PlaybackCommand::AddBookmark(message.long_value?),
            CommandName::DeleteBookmark => PlaybackCommand::DeleteBookmark(message.long_value?),
            CommandName::RenameBookmark => PlaybackCommand::RenameBookmark {
                time: message.long_value?,
                name: message.string_value.clone()?,
            },
            CommandName::PlayMedia => PlaybackCommand::PlayMedia(message.id?),
            CommandName::DeleteMedia => PlaybackCommand::DeleteMedia(message.id?),
            CommandName::MoveMediaBottom => PlaybackCommand::MoveMediaBottom(message.id?),
            CommandName::MoveMediaTop => PlaybackCommand::MoveMediaTop(message.id?),
            CommandName::Remote => PlaybackCommand::Remote(message.string_value.clone()?),
        };
        Some(command)
    }
}

/// Run one client message against the player.
///
/// Returns whether the command was accepted. Unknown commands are rejected,
/// and so are control commands while playback control is disabled, in
/// which case every client is told through a `playback-control-forbidden`
/// event.
pub async fn dispatch(
    player: &PlayerHandle,
    bus: &EventBus,
    features: &FeatureFlags,
    message: &IncomingMessage,
) -> Result<bool, PlayerError> {
    let name = CommandName::parse(&message.message)
        .ok_or_else(|| PlayerError::UnknownCommand(message.message.clone()))?;

    if name.control_required() && !features.playback_control {
        debug!("Playback control disabled, rejecting {}", message.message);
        bus.publish(Event::PlaybackControlForbidden { forbidden: true });
        return Ok(false);
    }

    match PlaybackCommand::from_message(name, message) {
        Some(command) => player.execute(command).await,
        None => {
            warn!("Missing argument for {}, ignoring", message.message);
            Ok(true)
        }
    }
}
