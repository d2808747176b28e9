use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// An observed change of the playback state. Every transition is published,
/// no matter whether a local action or an inbound frame caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Playing,
    Paused,
}

/// The media-element surface. `SyncClient` drives playback exclusively
/// through this trait.
pub trait Playback {
    fn set_source(&mut self, url: &str);
    fn load(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
}

/// In-memory player. Holds the current source and playing/paused flag and
/// publishes transitions on a channel; actual decoding and output belong to
/// the host media engine and are out of scope.
pub struct LocalPlayer {
    source: String,
    state: PlaybackState,
    loads: u32,
    transitions: mpsc::UnboundedSender<Transition>,
}

impl LocalPlayer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Transition>) {
        let (transitions, rx) = mpsc::unbounded_channel();
        let player = Self {
            source: String::new(),
            state: PlaybackState::Paused,
            loads: 0,
            transitions,
        };
        (player, rx)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// How many times the source has been (re)loaded.
    pub fn loads(&self) -> u32 {
        self.loads
    }

    fn transition(&mut self, state: PlaybackState) {
        if self.state == state {
            // a media element only fires play/pause on actual transitions
            return;
        }

        self.state = state;
        let transition = match state {
            PlaybackState::Playing => Transition::Playing,
            PlaybackState::Paused => Transition::Paused,
        };
        let _ = self.transitions.send(transition);
    }
}

impl Playback for LocalPlayer {
    fn set_source(&mut self, url: &str) {
        self.source = url.to_owned();
    }

    fn load(&mut self) {
        self.loads += 1;
        // loading interrupts playback, which the element reports as a pause
        self.transition(PlaybackState::Paused);
    }

    fn play(&mut self) {
        self.transition(PlaybackState::Playing);
    }

    fn pause(&mut self) {
        self.transition(PlaybackState::Paused);
    }
}
