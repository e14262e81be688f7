use super::{LoadOutcome, LoadRequest, PlaybackCommand, PlaybackEngine, PlayerError};
use crate::events::{Event, EventBus, NowPlaying};
use crate::items::PlayQueueItem;
use crate::library::Media;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

const TICK: Duration = Duration::from_secs(1);
const REQUEST_BUFFER: usize = 64;

/// Requests sent to the control loop.
enum PlayerRequest {
    Command {
        command: PlaybackCommand,
        response: oneshot::Sender<bool>,
    },
    Load {
        request: LoadRequest,
        response: oneshot::Sender<LoadOutcome>,
    },
    Resume {
        resume: bool,
        apply_to_playlist: bool,
        response: oneshot::Sender<bool>,
    },
    ResumeLast {
        audio: bool,
        response: oneshot::Sender<bool>,
    },
    Snapshot {
        response: oneshot::Sender<PlayerSnapshot>,
    },
}

/// Player state at one instant.
#[derive(Clone, Debug)]
pub struct PlayerSnapshot {
    pub play_queue: Vec<PlayQueueItem>,
    pub now_playing: NowPlaying,
    pub playing: bool,
    pub current_media: Option<Media>,
}

impl PlayerSnapshot {
    /// The events that bring a freshly connected client up to date.
    pub fn events(&self) -> Vec<Event> {
        vec![
            Event::PlayQueue {
                medias: self.play_queue.clone(),
            },
            Event::PlayerStatus {
                playing: self.playing,
            },
            Event::NowPlaying(self.now_playing.clone()),
        ]
    }
}

/// Handle to the control loop owning the playback engine.
///
/// Every mutation of player state happens on that loop, in the order
/// requests arrive.
#[derive(Clone)]
pub struct PlayerHandle {
    request_tx: mpsc::Sender<PlayerRequest>,
}

impl PlayerHandle {
    pub fn spawn<E: PlaybackEngine>(engine: E, bus: EventBus) -> Self {
        Self::spawn_with_tick(engine, bus, TICK)
    }

    pub(crate) fn spawn_with_tick<E: PlaybackEngine>(
        engine: E,
        bus: EventBus,
        tick: Duration,
    ) -> Self {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let control_loop = ControlLoop {
            last_queue: engine.play_queue(),
            last_now_playing: Some(engine.now_playing()),
            last_playing: engine.is_playing(),
            engine,
            bus,
        };
        tokio::spawn(control_loop.run(request_rx, tick));
        Self { request_tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> PlayerRequest,
    ) -> Result<T, PlayerError> {
        let (response, receiver) = oneshot::channel();
        self.request_tx
            .send(build(response))
            .await
            .map_err(|_| PlayerError::Stopped)?;
        receiver.await.map_err(|_| PlayerError::Stopped)
    }

    pub async fn execute(&self, command: PlaybackCommand) -> Result<bool, PlayerError> {
        self.request(|response| PlayerRequest::Command { command, response })
            .await
    }

    pub async fn load(&self, request: LoadRequest) -> Result<LoadOutcome, PlayerError> {
        self.request(|response| PlayerRequest::Load { request, response })
            .await
    }

    pub async fn resume(&self, resume: bool, apply_to_playlist: bool) -> Result<bool, PlayerError> {
        self.request(|response| PlayerRequest::Resume {
            resume,
            apply_to_playlist,
            response,
        })
        .await
    }

    pub async fn resume_last_playlist(&self, audio: bool) -> Result<bool, PlayerError> {
        self.request(|response| PlayerRequest::ResumeLast { audio, response })
            .await
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot, PlayerError> {
        self.request(|response| PlayerRequest::Snapshot { response })
            .await
    }
}

struct ControlLoop<E> {
    engine: E,
    bus: EventBus,
    last_queue: Vec<PlayQueueItem>,
    last_now_playing: Option<NowPlaying>,
    last_playing: bool,
}

impl<E: PlaybackEngine> ControlLoop<E> {
    async fn run(mut self, mut request_rx: mpsc::Receiver<PlayerRequest>, tick: Duration) {
        info!("Player control loop started");
        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        let mut last_tick = ticker.tick().await;

        loop {
            tokio::select! {
                request = request_rx.recv() => {
                    match request {
                        Some(request) => self.handle(request),
                        None => break,
                    }
                }
                now = ticker.tick() => {
                    self.engine.advance(now.duration_since(last_tick));
                    last_tick = now;
                    self.publish_changes(false);
                }
            }
        }
        info!("Player control loop stopped");
    }

    fn handle(&mut self, request: PlayerRequest) {
        match request {
            PlayerRequest::Command { command, response } => {
                debug!("Player command {:?}", command);
                let announce_all = command == PlaybackCommand::Hello;
                let volume_requested = command == PlaybackCommand::GetVolume;
                let accepted = self.engine.execute(command);
                if volume_requested {
                    self.bus.publish(Event::Volume {
                        volume: self.engine.volume(),
                    });
                }
                self.publish_changes(announce_all);
                let _ = response.send(accepted);
            }
            PlayerRequest::Load { request, response } => {
                let outcome = self.engine.load(request);
                self.publish_changes(false);
                let _ = response.send(outcome);
            }
            PlayerRequest::Resume {
                resume,
                apply_to_playlist,
                response,
            } => {
                let resumed = self.engine.resume(resume, apply_to_playlist);
                self.publish_changes(false);
                let _ = response.send(resumed);
            }
            PlayerRequest::ResumeLast { audio, response } => {
                let resumed = self.engine.resume_last_playlist(audio);
                self.publish_changes(false);
                let _ = response.send(resumed);
            }
            PlayerRequest::Snapshot { response } => {
                let _ = response.send(PlayerSnapshot {
                    play_queue: self.engine.play_queue(),
                    now_playing: self.engine.now_playing(),
                    playing: self.engine.is_playing(),
                    current_media: self.engine.current_media(),
                });
            }
        }
    }

    /// Publish whatever differs from what clients last saw. Now-playing
    /// goes out on every tick while playing since the position moves.
    fn publish_changes(&mut self, force: bool) {
        let queue = self.engine.play_queue();
        if force || queue != self.last_queue {
            self.bus.publish(Event::PlayQueue {
                medias: queue.clone(),
            });
            self.last_queue = queue;
        }

        let playing = self.engine.is_playing();
        if force || playing != self.last_playing {
            self.bus.publish(Event::PlayerStatus { playing });
            self.last_playing = playing;
        }

        let now_playing = self.engine.now_playing();
        if force || playing || self.last_now_playing.as_ref() != Some(&now_playing) {
            self.bus.publish(Event::NowPlaying(now_playing.clone()));
            self.last_now_playing = Some(now_playing);
        }
    }
}
