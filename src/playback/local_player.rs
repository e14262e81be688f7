//! A playback engine that keeps the whole player state in memory and moves
//! time forward without decoding anything.

use super::{LoadOutcome, LoadRequest, PlaybackCommand, PlaybackEngine, RepeatMode};
use crate::events::{NowPlaying, WsBookmark, WsChapter};
use crate::items::{normalize, Entity, PlayQueueItem};
use crate::library::{Media, MediaKind};
use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

const SEEK_STEP_MS: i64 = 10_000;
/// Past this position `previous` restarts the current media.
const RESTART_THRESHOLD_MS: i64 = 3_000;
const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;
const MAX_VOLUME: i32 = 100;
/// A week.
const MAX_SLEEP_TIMER_MS: i64 = 7 * 24 * 60 * 60 * 1000;

const VIDEO_UNAVAILABLE: &str = "Video playback is not available on the player";

#[derive(Clone, Debug)]
struct Bookmark {
    id: i64,
    title: String,
    time: i64,
}

pub struct LocalPlayer {
    queue: Vec<Media>,
    current: Option<usize>,
    position_ms: i64,
    playing: bool,
    as_audio: bool,
    shuffle: bool,
    repeat: RepeatMode,
    volume: i32,
    speed: f32,

    /// Epoch milliseconds, 0 when no timer is set.
    sleep_timer_at: i64,
    sleep_interval_ms: i64,
    wait_for_media_end: bool,
    reset_on_interaction: bool,
    /// The timer fired and playback stops at the end of the current media.
    stop_at_media_end: bool,

    bookmarks: HashMap<i64, Vec<Bookmark>>,
    next_bookmark_id: i64,

    video_output: bool,
    pending_resume: Option<usize>,
    resume_policy: Option<bool>,
    last_audio: Vec<Media>,
    last_video: Vec<Media>,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn format_time(ms: i64) -> String {
    let seconds = ms.max(0) / 1000;
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

impl LocalPlayer {
    pub fn new(video_output: bool) -> Self {
        Self {
            queue: Vec::new(),
            current: None,
            position_ms: 0,
            playing: false,
            as_audio: false,
            shuffle: false,
            repeat: RepeatMode::None,
            volume: MAX_VOLUME,
            speed: 1.0,
            sleep_timer_at: 0,
            sleep_interval_ms: 0,
            wait_for_media_end: false,
            reset_on_interaction: false,
            stop_at_media_end: false,
            bookmarks: HashMap::new(),
            next_bookmark_id: 1,
            video_output,
            pending_resume: None,
            resume_policy: None,
            last_audio: Vec::new(),
            last_video: Vec::new(),
        }
    }

    pub fn position(&self) -> i64 {
        self.position_ms
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn is_waiting_for_resume(&self) -> bool {
        self.pending_resume.is_some()
    }

    fn current_ref(&self) -> Option<&Media> {
        self.current.and_then(|i| self.queue.get(i))
    }

    fn duration(&self) -> i64 {
        self.current_ref().map(|m| m.duration_ms).unwrap_or(0)
    }

    /// Start the media at `index`, asking whether to resume when it has a
    /// saved position and no policy was chosen yet.
    fn open_index(&mut self, index: usize) {
        let Some(media) = self.queue.get(index) else {
            return;
        };
        let saved = media.progress_ms;
        self.current = Some(index);
        self.position_ms = 0;
        self.pending_resume = None;
        self.playing = true;
        if saved > 0 {
            match self.resume_policy {
                Some(true) => self.position_ms = saved,
                Some(false) => {}
                None => {
                    self.pending_resume = Some(index);
                    self.playing = false;
                }
            }
        }
    }

    fn next_index(&self) -> Option<usize> {
        let current = self.current?;
        let len = self.queue.len();
        if self.shuffle && len > 1 {
            let mut rng = rand::rng();
            loop {
                let candidate = rng.random_range(0..len);
                if candidate != current {
                    return Some(candidate);
                }
            }
        }
        if current + 1 < len {
            Some(current + 1)
        } else if self.repeat == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    fn swap_items(&mut self, a: usize, b: usize) {
        self.queue.swap(a, b);
        if self.current == Some(a) {
            self.current = Some(b);
        } else if self.current == Some(b) {
            self.current = Some(a);
        }
    }

    fn remove_item(&mut self, index: usize) {
        self.queue.remove(index);
        match self.current {
            Some(current) if current == index => {
                if self.queue.is_empty() {
                    self.current = None;
                    self.playing = false;
                    self.position_ms = 0;
                } else {
                    let was_playing = self.playing;
                    self.open_index(index.min(self.queue.len() - 1));
                    self.playing = was_playing && self.pending_resume.is_none();
                }
            }
            Some(current) if current > index => self.current = Some(current - 1),
            _ => {}
        }
    }

    fn cycle_repeat(&mut self) {
        self.repeat = match self.repeat {
            RepeatMode::None => RepeatMode::One,
            RepeatMode::One if self.queue.len() > 1 => RepeatMode::All,
            RepeatMode::One => RepeatMode::None,
            RepeatMode::All => RepeatMode::None,
        };
    }

    fn current_bookmarks(&mut self) -> Option<&mut Vec<Bookmark>> {
        let id = self.current_ref()?.id;
        Some(self.bookmarks.entry(id).or_default())
    }

    fn on_media_end(&mut self) {
        if let Some(index) = self.current {
            if let Some(media) = self.queue.get_mut(index) {
                media.seen = true;
                media.progress_ms = 0;
            }
        }
        if self.stop_at_media_end {
            self.stop_at_media_end = false;
            self.playing = false;
            self.position_ms = self.duration();
            info!("Sleep timer stopped playback at media end");
            return;
        }
        if self.repeat == RepeatMode::One {
            self.position_ms = 0;
            return;
        }
        match self.next_index() {
            Some(next) => self.open_index(next),
            None => {
                self.playing = false;
                self.position_ms = self.duration();
            }
        }
    }

    fn check_sleep_timer(&mut self) {
        if self.sleep_timer_at == 0 || now_ms() < self.sleep_timer_at {
            return;
        }
        self.sleep_timer_at = 0;
        if self.wait_for_media_end && self.playing {
            self.stop_at_media_end = true;
        } else {
            self.playing = false;
            info!("Sleep timer paused playback");
        }
    }

    fn run(&mut self, command: PlaybackCommand) -> bool {
        match command {
            PlaybackCommand::Hello | PlaybackCommand::GetVolume => true,
            PlaybackCommand::Shuffle => {
                self.shuffle = !self.shuffle;
                true
            }
            PlaybackCommand::Repeat => {
                self.cycle_repeat();
                true
            }
            PlaybackCommand::SetVolume(volume) => {
                self.volume = volume.clamp(0, MAX_VOLUME);
                true
            }
            PlaybackCommand::SleepTimer(delay) if delay > MAX_SLEEP_TIMER_MS => {
                debug!("Sleep timer of {} ms refused", delay);
                false
            }
            PlaybackCommand::SleepTimer(delay) => {
                if delay > 0 {
                    self.sleep_timer_at = now_ms().saturating_add(delay);
                    self.sleep_interval_ms = delay;
                } else {
                    self.sleep_timer_at = 0;
                    self.sleep_interval_ms = 0;
                }
                self.stop_at_media_end = false;
                true
            }
            PlaybackCommand::SleepTimerWait(wait) => {
                self.wait_for_media_end = wait;
                true
            }
            PlaybackCommand::SleepTimerReset(reset) => {
                self.reset_on_interaction = reset;
                true
            }
            PlaybackCommand::Remote(action) => {
                debug!("Remote action {}", action);
                true
            }
            // Everything below needs a current media
            _ if self.current.is_none() => false,
            PlaybackCommand::Play => {
                self.playing = true;
                true
            }
            PlaybackCommand::Pause => {
                self.playing = false;
                true
            }
            PlaybackCommand::Previous => {
                match self.current {
                    Some(index) if index > 0 && self.position_ms <= RESTART_THRESHOLD_MS => {
                        self.open_index(index - 1)
                    }
                    _ => self.position_ms = 0,
                }
                true
            }
            PlaybackCommand::Next => {
                if let Some(next) = self.next_index() {
                    self.open_index(next);
                }
                true
            }
            PlaybackCommand::Previous10 => {
                self.position_ms = (self.position_ms - SEEK_STEP_MS).max(0);
                true
            }
            PlaybackCommand::Next10 => {
                let target = self.position_ms + SEEK_STEP_MS;
                let duration = self.duration();
                self.position_ms = if duration > 0 {
                    target.min(duration)
                } else {
                    target
                };
                true
            }
            PlaybackCommand::SetProgress(time) => {
                let duration = self.duration();
                self.position_ms = if duration > 0 {
                    time.clamp(0, duration)
                } else {
                    time.max(0)
                };
                true
            }
            PlaybackCommand::PlayChapter(index) => {
                let chapter_time = self
                    .current_ref()
                    .and_then(|m| usize::try_from(index).ok().and_then(|i| m.chapters.get(i)))
                    .map(|(_, time)| *time);
                match chapter_time {
                    Some(time) => {
                        self.position_ms = time;
                        true
                    }
                    None => false,
                }
            }
            PlaybackCommand::Speed(speed) => {
                if !speed.is_finite() || speed <= 0.0 {
                    return false;
                }
                self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
                true
            }
            PlaybackCommand::AddBookmark(time) => {
                let id = self.next_bookmark_id;
                self.next_bookmark_id += 1;
                let title = format!("Bookmark {}", format_time(time));
                if let Some(bookmarks) = self.current_bookmarks() {
                    bookmarks.push(Bookmark { id, title, time });
                    bookmarks.sort_by_key(|b| b.time);
                }
                true
            }
            PlaybackCommand::DeleteBookmark(time) => {
                if let Some(bookmarks) = self.current_bookmarks() {
                    bookmarks.retain(|b| b.time != time);
                }
                true
            }
            PlaybackCommand::RenameBookmark { time, name } => self
                .current_bookmarks()
                .and_then(|bookmarks| bookmarks.iter_mut().find(|b| b.time == time))
                .map(|bookmark| bookmark.title = name)
                .is_some(),
            PlaybackCommand::PlayMedia(index) => match usize::try_from(index) {
                Ok(index) if index < self.queue.len() => {
                    self.open_index(index);
                    true
                }
                _ => false,
            },
            PlaybackCommand::DeleteMedia(index) => match usize::try_from(index) {
                Ok(index) if index < self.queue.len() => {
                    self.remove_item(index);
                    true
                }
                _ => false,
            },
            PlaybackCommand::MoveMediaBottom(index) => match usize::try_from(index) {
                Ok(index) if index < self.queue.len() => {
                    if index + 1 < self.queue.len() {
                        self.swap_items(index, index + 1);
                    }
                    true
                }
                _ => false,
            },
            PlaybackCommand::MoveMediaTop(index) => match usize::try_from(index) {
                Ok(index) if index < self.queue.len() => {
                    if index > 0 {
                        self.swap_items(index, index - 1);
                    }
                    true
                }
                _ => false,
            },
        }
    }
}

impl PlaybackEngine for LocalPlayer {
    fn execute(&mut self, command: PlaybackCommand) -> bool {
        let touches_timer = matches!(
            command,
            PlaybackCommand::SleepTimer(_)
                | PlaybackCommand::SleepTimerWait(_)
                | PlaybackCommand::SleepTimerReset(_)
        );
        let accepted = self.run(command);
        if accepted && !touches_timer && self.reset_on_interaction && self.sleep_timer_at > 0 {
            self.sleep_timer_at = now_ms().saturating_add(self.sleep_interval_ms);
        }
        accepted
    }

    fn load(&mut self, request: LoadRequest) -> LoadOutcome {
        let LoadRequest {
            medias,
            start_index,
            append,
            as_audio,
        } = request;
        let Some(first) = medias.get(start_index.min(medias.len().saturating_sub(1))) else {
            return LoadOutcome::Forbidden("Nothing to play".to_string());
        };

        if medias.len() == 1 {
            if let Some(current) = self.current_ref() {
                if current.id == first.id && current.uri == first.uri {
                    return LoadOutcome::AlreadyCurrent;
                }
            }
        }
        if first.kind == MediaKind::Video && !as_audio && !self.video_output {
            return LoadOutcome::Forbidden(VIDEO_UNAVAILABLE.to_string());
        }
        let audio_playlist = as_audio || first.kind != MediaKind::Video;

        if append && self.current.is_some() {
            self.queue.extend(medias);
        } else {
            let start = start_index.min(medias.len() - 1);
            self.queue = medias;
            self.as_audio = as_audio;
            self.resume_policy = None;
            self.open_index(start);
        }

        if audio_playlist {
            self.last_audio = self.queue.clone();
        } else {
            self.last_video = self.queue.clone();
        }
        info!("Loaded {} media in the play queue", self.queue.len());
        LoadOutcome::Started
    }

    fn resume(&mut self, resume: bool, apply_to_playlist: bool) -> bool {
        let Some(index) = self.pending_resume.take() else {
            return false;
        };
        if apply_to_playlist {
            self.resume_policy = Some(resume);
        }
        self.position_ms = if resume {
            self.queue.get(index).map(|m| m.progress_ms).unwrap_or(0)
        } else {
            0
        };
        self.playing = true;
        true
    }

    fn resume_last_playlist(&mut self, audio: bool) -> bool {
        let playlist = if audio {
            self.last_audio.clone()
        } else {
            self.last_video.clone()
        };
        if playlist.is_empty() {
            return false;
        }
        self.queue = playlist;
        self.as_audio = audio;
        self.open_index(0);
        true
    }

    fn advance(&mut self, elapsed: Duration) {
        self.check_sleep_timer();
        if !self.playing || self.current.is_none() {
            return;
        }
        self.position_ms += (elapsed.as_millis() as f64 * self.speed as f64) as i64;
        let duration = self.duration();
        if duration > 0 && self.position_ms >= duration {
            self.on_media_end();
        }
    }

    fn play_queue(&self) -> Vec<PlayQueueItem> {
        self.queue
            .iter()
            .enumerate()
            .map(|(index, media)| PlayQueueItem {
                playing: self.current == Some(index),
                ..normalize(Entity::Media {
                    media,
                    default_artist: "",
                })
            })
            .collect()
    }

    fn now_playing(&self) -> NowPlaying {
        let mut now_playing = NowPlaying {
            playing: self.playing,
            progress: self.position_ms,
            volume: self.volume,
            speed: self.speed,
            sleep_timer: self.sleep_timer_at,
            wait_for_media_end: self.wait_for_media_end,
            reset_on_interaction: self.reset_on_interaction,
            shuffle: self.shuffle,
            repeat: self.repeat.as_wire(),
            should_show: self.current.is_some(),
            ..Default::default()
        };
        if let Some(media) = self.current_ref() {
            now_playing.title = media.title.clone();
            now_playing.artist = media.artist.clone().unwrap_or_default();
            now_playing.is_video_playing =
                self.playing && media.kind == MediaKind::Video && !self.as_audio;
            now_playing.duration = media.duration_ms;
            now_playing.id = media.id;
            now_playing.artwork_url = media.artwork.clone().unwrap_or_default();
            now_playing.uri = media.uri.clone();
            now_playing.chapters = media
                .chapters
                .iter()
                .map(|(title, time)| WsChapter {
                    title: title.clone(),
                    time: *time,
                })
                .collect();
            now_playing.bookmarks = self
                .bookmarks
                .get(&media.id)
                .map(|bookmarks| {
                    bookmarks
                        .iter()
                        .map(|b| WsBookmark {
                            id: b.id,
                            title: b.title.clone(),
                            time: b.time,
                        })
                        .collect()
                })
                .unwrap_or_default();
        }
        now_playing
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn volume(&self) -> i32 {
        self.volume
    }

    fn current_media(&self) -> Option<Media> {
        self.current_ref().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64, duration_ms: i64) -> Media {
        let mut media = Media::new(
            id,
            &format!("Track {}", id),
            &format!("file:///music/{}.mp3", id),
            MediaKind::Audio,
        );
        media.duration_ms = duration_ms;
        media
    }

    fn video(id: i64) -> Media {
        let mut media = Media::new(id, "Clip", "file:///videos/clip.mp4", MediaKind::Video);
        media.duration_ms = 60_000;
        media
    }

    fn loaded(count: i64) -> LocalPlayer {
        let mut player = LocalPlayer::new(true);
        let medias = (1..=count).map(|id| track(id, 120_000)).collect();
        assert_eq!(
            player.load(LoadRequest {
                medias,
                ..Default::default()
            }),
            LoadOutcome::Started
        );
        player
    }

    fn titles(player: &LocalPlayer) -> Vec<String> {
        player.play_queue().into_iter().map(|i| i.title).collect()
    }

    #[test]
    fn commands_needing_media_are_rejected_on_empty_queue() {
        let mut player = LocalPlayer::new(true);
        assert!(!player.execute(PlaybackCommand::Play));
        assert!(!player.execute(PlaybackCommand::Next10));
        assert!(!player.execute(PlaybackCommand::PlayMedia(0)));
        assert!(player.execute(PlaybackCommand::Hello));
        assert!(player.execute(PlaybackCommand::SetVolume(30)));
        assert_eq!(player.volume(), 30);
    }

    #[test]
    fn load_starts_first_media_and_marks_it_playing() {
        let player = loaded(3);
        assert!(player.is_playing());
        let queue = player.play_queue();
        assert_eq!(queue.len(), 3);
        assert!(queue[0].playing);
        assert!(!queue[1].playing);
        assert_eq!(player.now_playing().title, "Track 1");
    }

    #[test]
    fn loading_the_current_media_again_is_a_no_op() {
        let mut player = loaded(1);
        let outcome = player.load(LoadRequest {
            medias: vec![track(1, 120_000)],
            ..Default::default()
        });
        assert_eq!(outcome, LoadOutcome::AlreadyCurrent);
    }

    #[test]
    fn videos_are_refused_without_video_output_unless_played_as_audio() {
        let mut player = LocalPlayer::new(false);
        let outcome = player.load(LoadRequest {
            medias: vec![video(5)],
            ..Default::default()
        });
        assert_eq!(outcome, LoadOutcome::Forbidden(VIDEO_UNAVAILABLE.to_string()));

        let outcome = player.load(LoadRequest {
            medias: vec![video(5)],
            as_audio: true,
            ..Default::default()
        });
        assert_eq!(outcome, LoadOutcome::Started);
        assert!(!player.now_playing().is_video_playing);
    }

    #[test]
    fn append_keeps_current_media() {
        let mut player = loaded(1);
        player.load(LoadRequest {
            medias: vec![track(9, 1000)],
            append: true,
            ..Default::default()
        });
        assert_eq!(titles(&player), vec!["Track 1", "Track 9"]);
        assert_eq!(player.current_index(), Some(0));
    }

    #[test]
    fn seeking_by_ten_seconds_is_clamped() {
        let mut player = loaded(1);
        assert!(player.execute(PlaybackCommand::Previous10));
        assert_eq!(player.position(), 0);

        assert!(player.execute(PlaybackCommand::SetProgress(115_000)));
        assert!(player.execute(PlaybackCommand::Next10));
        assert_eq!(player.position(), 120_000);

        assert!(player.execute(PlaybackCommand::Previous10));
        assert_eq!(player.position(), 110_000);
    }

    #[test]
    fn repeat_cycles_through_all_only_with_a_playlist() {
        let mut single = loaded(1);
        single.execute(PlaybackCommand::Repeat);
        assert_eq!(single.repeat(), RepeatMode::One);
        single.execute(PlaybackCommand::Repeat);
        assert_eq!(single.repeat(), RepeatMode::None);

        let mut many = loaded(2);
        many.execute(PlaybackCommand::Repeat);
        many.execute(PlaybackCommand::Repeat);
        assert_eq!(many.repeat(), RepeatMode::All);
        assert_eq!(many.now_playing().repeat, 2);
        many.execute(PlaybackCommand::Repeat);
        assert_eq!(many.repeat(), RepeatMode::None);
    }

    #[test]
    fn moving_items_follows_the_current_media() {
        let mut player = loaded(3);
        assert!(player.execute(PlaybackCommand::MoveMediaBottom(0)));
        assert_eq!(titles(&player), vec!["Track 2", "Track 1", "Track 3"]);
        assert_eq!(player.current_index(), Some(1));

        // Last item cannot move further down
        assert!(player.execute(PlaybackCommand::MoveMediaBottom(2)));
        assert_eq!(titles(&player), vec!["Track 2", "Track 1", "Track 3"]);

        assert!(player.execute(PlaybackCommand::MoveMediaTop(2)));
        assert_eq!(titles(&player), vec!["Track 2", "Track 3", "Track 1"]);
        assert_eq!(player.current_index(), Some(2));

        assert!(player.execute(PlaybackCommand::MoveMediaTop(0)));
        assert!(!player.execute(PlaybackCommand::MoveMediaTop(7)));
    }

    #[test]
    fn deleting_the_current_media_moves_to_the_next_one() {
        let mut player = loaded(3);
        assert!(player.execute(PlaybackCommand::DeleteMedia(0)));
        assert_eq!(player.now_playing().title, "Track 2");
        assert!(player.execute(PlaybackCommand::DeleteMedia(1)));
        assert!(player.execute(PlaybackCommand::DeleteMedia(0)));
        assert!(player.play_queue().is_empty());
        assert!(!player.is_playing());
        assert!(!player.execute(PlaybackCommand::DeleteMedia(0)));
    }

    #[test]
    fn previous_restarts_after_threshold() {
        let mut player = loaded(2);
        player.execute(PlaybackCommand::PlayMedia(1));
        player.execute(PlaybackCommand::SetProgress(10_000));
        player.execute(PlaybackCommand::Previous);
        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.position(), 0);
        player.execute(PlaybackCommand::Previous);
        assert_eq!(player.current_index(), Some(0));
    }

    #[test]
    fn advance_moves_to_next_media_at_end() {
        let mut player = LocalPlayer::new(true);
        player.load(LoadRequest {
            medias: vec![track(1, 1_000), track(2, 1_000)],
            ..Default::default()
        });
        player.advance(Duration::from_millis(600));
        assert_eq!(player.position(), 600);
        player.advance(Duration::from_millis(600));
        assert_eq!(player.current_index(), Some(1));
        player.advance(Duration::from_millis(1_500));
        assert!(!player.is_playing());
    }

    #[test]
    fn speed_scales_time_and_is_validated() {
        let mut player = loaded(1);
        assert!(player.execute(PlaybackCommand::Speed(2.0)));
        player.advance(Duration::from_millis(500));
        assert_eq!(player.position(), 1_000);
        assert!(!player.execute(PlaybackCommand::Speed(0.0)));
        assert!(player.execute(PlaybackCommand::Speed(10.0)));
        assert_eq!(player.now_playing().speed, MAX_SPEED);
    }

    #[test]
    fn bookmarks_can_be_added_renamed_and_deleted() {
        let mut player = loaded(1);
        assert!(player.execute(PlaybackCommand::AddBookmark(65_000)));
        let bookmarks = player.now_playing().bookmarks;
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].title, "Bookmark 01:05");

        assert!(player.execute(PlaybackCommand::RenameBookmark {
            time: 65_000,
            name: "Chorus".to_string()
        }));
        assert_eq!(player.now_playing().bookmarks[0].title, "Chorus");
        assert!(!player.execute(PlaybackCommand::RenameBookmark {
            time: 1,
            name: "x".to_string()
        }));

        assert!(player.execute(PlaybackCommand::DeleteBookmark(65_000)));
        assert!(player.now_playing().bookmarks.is_empty());
    }

    #[test]
    fn chapters_jump_to_their_start() {
        let mut player = LocalPlayer::new(true);
        let mut media = track(1, 100_000);
        media.chapters = vec![("Intro".to_string(), 0), ("Main".to_string(), 30_000)];
        player.load(LoadRequest {
            medias: vec![media],
            ..Default::default()
        });
        assert!(player.execute(PlaybackCommand::PlayChapter(1)));
        assert_eq!(player.position(), 30_000);
        assert!(!player.execute(PlaybackCommand::PlayChapter(5)));
        assert_eq!(player.now_playing().chapters.len(), 2);
    }

    #[test]
    fn saved_position_waits_for_confirmation() {
        let mut player = LocalPlayer::new(true);
        let mut first = track(1, 100_000);
        first.progress_ms = 40_000;
        let mut second = track(2, 100_000);
        second.progress_ms = 20_000;
        player.load(LoadRequest {
            medias: vec![first, second],
            ..Default::default()
        });
        assert!(player.is_waiting_for_resume());
        assert!(!player.is_playing());

        assert!(player.resume(true, true));
        assert_eq!(player.position(), 40_000);
        assert!(player.is_playing());
        assert!(!player.resume(true, true));

        // The choice now applies to the rest of the playlist
        player.execute(PlaybackCommand::Next);
        assert!(!player.is_waiting_for_resume());
        assert_eq!(player.position(), 20_000);
    }

    #[test]
    fn last_playlists_are_remembered_per_kind() {
        let mut player = LocalPlayer::new(true);
        assert!(!player.resume_last_playlist(true));
        player.load(LoadRequest {
            medias: vec![track(1, 1000)],
            ..Default::default()
        });
        player.load(LoadRequest {
            medias: vec![video(2)],
            ..Default::default()
        });
        assert!(player.resume_last_playlist(true));
        assert_eq!(player.now_playing().title, "Track 1");
        assert!(player.resume_last_playlist(false));
        assert_eq!(player.now_playing().title, "Clip");
    }

    #[test]
    fn sleep_timer_pauses_when_due() {
        let mut player = loaded(1);
        assert!(player.execute(PlaybackCommand::SleepTimer(1)));
        assert!(player.now_playing().sleep_timer > 0);
        std::thread::sleep(Duration::from_millis(5));
        player.advance(Duration::from_millis(10));
        assert!(!player.is_playing());
        assert_eq!(player.now_playing().sleep_timer, 0);
    }

    #[test]
    fn sleep_timer_can_wait_for_media_end() {
        let mut player = LocalPlayer::new(true);
        player.load(LoadRequest {
            medias: vec![track(1, 1_000), track(2, 1_000)],
            ..Default::default()
        });
        player.execute(PlaybackCommand::SleepTimerWait(true));
        player.execute(PlaybackCommand::SleepTimer(1));
        std::thread::sleep(Duration::from_millis(5));
        player.advance(Duration::from_millis(100));
        assert!(player.is_playing());
        player.advance(Duration::from_millis(1_000));
        assert!(!player.is_playing());
        assert_eq!(player.current_index(), Some(0));
    }

    #[test]
    fn sleep_timer_refuses_absurd_delays() {
        let mut player = loaded(1);
        assert!(!player.execute(PlaybackCommand::SleepTimer(i64::MAX)));
        assert_eq!(player.now_playing().sleep_timer, 0);

        assert!(player.execute(PlaybackCommand::SleepTimer(MAX_SLEEP_TIMER_MS)));
        let armed = player.now_playing().sleep_timer;
        assert!(armed > now_ms());

        // Interaction rearms the longest timer without wrapping
        player.execute(PlaybackCommand::SleepTimerReset(true));
        assert!(player.execute(PlaybackCommand::Pause));
        assert!(player.now_playing().sleep_timer >= armed);
    }
}
