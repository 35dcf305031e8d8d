use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Status reported by the underlying player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    Idle,
    Buffering,
    Ready,
    Ended,
}

/// Playback state advertised to the rest of the system (lock screen,
/// headset buttons, notifications).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    None,
    Playing { position_ms: u64 },
    Paused { position_ms: u64 },
}

/// Transport controls the session accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportAction {
    Play,
    Pause,
    PlayPause,
    /// Restarts the excerpt from the beginning.
    SkipToPrevious,
}

/// Audio player the host plugs in. Decoding and output are its business.
pub trait Player {
    fn prepare(&mut self, uri: &str);
    fn set_play_when_ready(&mut self, play: bool);
    fn play_when_ready(&self) -> bool;
    fn seek_to(&mut self, position_ms: u64);
    fn position_ms(&self) -> u64;
    fn stop(&mut self);
}

/// Keeps the advertised session state in sync with a [`Player`] and routes
/// transport actions back to it.
#[derive(Debug)]
pub struct MediaSession<P> {
    player: P,
    state: SessionState,
    active: bool,
}

impl<P: Player> MediaSession<P> {
    pub fn new(player: P) -> Self {
        Self {
            player,
            state: SessionState::None,
            active: false,
        }
    }

    /// Activates the session and starts playing `uri` as soon as it is ready.
    pub fn load(&mut self, uri: &str) {
        self.active = true;
        self.state = SessionState::None;
        self.player.prepare(uri);
        self.player.set_play_when_ready(true);
        info!(uri, "loaded excerpt");
    }

    /// Mirrors a player state change into the session. Only a ready player
    /// changes the advertised state.
    pub fn on_player_state_changed(
        &mut self,
        play_when_ready: bool,
        status: PlayerStatus,
    ) -> SessionState {
        if status == PlayerStatus::Ready {
            let position_ms = self.player.position_ms();
            self.state = if play_when_ready {
                SessionState::Playing { position_ms }
            } else {
                SessionState::Paused { position_ms }
            };
        }
        debug!(?status, play_when_ready, state = ?self.state, "player state changed");
        self.state
    }

    /// Applies a transport action. Ignored once the session is released.
    pub fn handle(&mut self, action: TransportAction) {
        if !self.active {
            return;
        }
        match action {
            TransportAction::Play => self.player.set_play_when_ready(true),
            TransportAction::Pause => self.player.set_play_when_ready(false),
            TransportAction::PlayPause => {
                let play = !self.player.play_when_ready();
                self.player.set_play_when_ready(play);
            }
            TransportAction::SkipToPrevious => self.player.seek_to(0),
        }
        debug!(?action, "handled transport action");
    }

    /// Toggle a notification would offer for the current state.
    pub fn primary_action(&self) -> TransportAction {
        match self.state {
            SessionState::Playing { .. } => TransportAction::Pause,
            _ => TransportAction::Play,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    /// Stops playback and deactivates the session.
    pub fn release(&mut self) {
        self.player.stop();
        self.active = false;
        self.state = SessionState::None;
    }
}

/// Command recorded by [`LoggingPlayer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    Prepare(String),
    PlayWhenReady(bool),
    SeekTo(u64),
    Stop,
}

/// Player without audio output that logs and records what it is asked to do.
/// Used by hosts that cannot play sound, such as a terminal.
#[derive(Debug, Default, Clone)]
pub struct LoggingPlayer {
    commands: Vec<PlayerCommand>,
    play_when_ready: bool,
    position_ms: u64,
}

impl LoggingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PlayerCommand] {
        &self.commands
    }

    /// Moves the simulated play head forward.
    pub fn advance(&mut self, millis: u64) {
        if self.play_when_ready {
            self.position_ms += millis;
        }
    }
}

impl Player for LoggingPlayer {
    fn prepare(&mut self, uri: &str) {
        info!(uri, "prepare");
        self.position_ms = 0;
        self.commands.push(PlayerCommand::Prepare(uri.to_string()));
    }

    fn set_play_when_ready(&mut self, play: bool) {
        info!(play, "play when ready");
        self.play_when_ready = play;
        self.commands.push(PlayerCommand::PlayWhenReady(play));
    }

    fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    fn seek_to(&mut self, position_ms: u64) {
        info!(position_ms, "seek");
        self.position_ms = position_ms;
        self.commands.push(PlayerCommand::SeekTo(position_ms));
    }

    fn position_ms(&self) -> u64 {
        self.position_ms
    }

    fn stop(&mut self) {
        info!("stop");
        self.play_when_ready = false;
        self.commands.push(PlayerCommand::Stop);
    }
}
