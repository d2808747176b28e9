use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::events::{self, Decoded, Event};
use crate::player::{Playback, Transition};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected")]
    NotConnected,
    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),
}

/// A command issued through the local user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand {
    Play(String),
    Pause,
    Resume,
}

/// Owns one transport connection and one playback, and translates between
/// them: inbound event frames become playback actions, observed playback
/// transitions become outbound event frames.
pub struct SyncClient<P> {
    endpoint: String,
    playback: P,
    outbound: Option<SplitSink<WsStream, tungstenite::Message>>,
    inbound: Option<SplitStream<WsStream>>,
}

impl<P: Playback> SyncClient<P> {
    /// `endpoint` is the server base address, e.g. `ws://localhost:8000`.
    pub fn new(endpoint: impl Into<String>, playback: P) -> Self {
        Self {
            endpoint: endpoint.into(),
            playback,
            outbound: None,
            inbound: None,
        }
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    /// Connects to `{endpoint}/ws/{identity}`. The identity is embedded
    /// verbatim, unescaped and unvalidated; an empty one is accepted. A
    /// previously held connection is closed before the replacement is
    /// established.
    pub async fn connect(&mut self, identity: &str) -> Result<(), ClientError> {
        self.close().await;

        let address = format!("{}/ws/{}", self.endpoint, identity);
        let (stream, _) = connect_async(address).await?;
        let (outbound, inbound) = stream.split();
        self.outbound = Some(outbound);
        self.inbound = Some(inbound);
        info!(identity, "connected");
        Ok(())
    }

    /// Disposes of the held connection, if any.
    pub async fn close(&mut self) {
        self.inbound = None;
        if let Some(mut outbound) = self.outbound.take() {
            let _ = outbound.close().await;
        }
    }

    /// Decodes one inbound frame and dispatches it onto the playback:
    /// `play` switches the source, reloads and starts playback; `pause`
    /// pauses; `resume` resumes without reloading. Notifications and
    /// unrecognized types touch nothing, malformed frames are dropped.
    /// The decode outcome is returned so callers can tell the cases apart.
    pub fn apply_frame(&mut self, frame: &str) -> Decoded {
        let decoded = events::decode(frame);
        match &decoded {
            Decoded::Event(Event::Play { url }) => {
                self.playback.set_source(url);
                self.playback.load();
                self.playback.play();
            }
            Decoded::Event(Event::Pause) => self.playback.pause(),
            Decoded::Event(Event::Resume) => self.playback.play(),
            Decoded::Event(Event::Notification { .. }) => {}
            Decoded::UnknownType(kind) => debug!(kind = %kind, "ignoring unrecognized frame type"),
            Decoded::Malformed => debug!(frame, "dropping malformed frame"),
        }
        decoded
    }

    /// Writes one `play` frame for `url`. The url is not validated.
    pub async fn send_play(&mut self, url: &str) -> Result<(), ClientError> {
        self.send_event(&Event::Play { url: url.to_owned() }).await
    }

    async fn send_event(&mut self, event: &Event) -> Result<(), ClientError> {
        let outbound = self.outbound.as_mut().ok_or(ClientError::NotConnected)?;
        outbound
            .send(tungstenite::Message::Text(events::encode(event)))
            .await?;
        Ok(())
    }

    /// Drives the client until the server closes the connection or a
    /// transport error occurs. Selects over three sources: inbound frames
    /// (logged and applied to the playback), observed playback transitions
    /// (each re-published as exactly one outbound frame, including
    /// transitions that an inbound frame caused), and local commands.
    pub async fn run(
        mut self,
        mut transitions: mpsc::UnboundedReceiver<Transition>,
        mut commands: mpsc::UnboundedReceiver<LocalCommand>,
    ) -> Result<(), ClientError> {
        let mut inbound = self.inbound.take().ok_or(ClientError::NotConnected)?;

        loop {
            tokio::select! {
                frame = inbound.next() => match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        info!(frame = %text, "frame received");
                        self.apply_frame(&text);
                    }
                    Some(Ok(tungstenite::Message::Close(_))) | None => {
                        info!("server closed the connection");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                },
                transition = transitions.recv() => match transition {
                    Some(transition) => self.send_event(&Event::from(transition)).await?,
                    None => return Ok(()),
                },
                command = commands.recv() => match command {
                    Some(LocalCommand::Play(url)) => self.send_play(&url).await?,
                    Some(LocalCommand::Pause) => self.playback.pause(),
                    Some(LocalCommand::Resume) => self.playback.play(),
                    None => return Ok(()),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{LocalPlayer, PlaybackState};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn client() -> (SyncClient<LocalPlayer>, UnboundedReceiver<Transition>) {
        let (player, transitions) = LocalPlayer::new();
        (SyncClient::new("ws://localhost:8000", player), transitions)
    }

    #[test]
    fn play_frame_sets_source_and_starts_playback() {
        let (mut client, _rx) = client();
        let decoded = client.apply_frame(r#"{"type":"play","url":"http://x/a.mp3"}"#);

        assert!(matches!(decoded, Decoded::Event(Event::Play { .. })));
        assert_eq!(client.playback().source(), "http://x/a.mp3");
        assert_eq!(client.playback().state(), PlaybackState::Playing);
        assert_eq!(client.playback().loads(), 1);
    }

    #[test]
    fn pause_frame_keeps_the_source() {
        let (mut client, _rx) = client();
        client.apply_frame(r#"{"type":"play","url":"http://x/a.mp3"}"#);
        client.apply_frame(r#"{"type":"pause"}"#);

        assert_eq!(client.playback().state(), PlaybackState::Paused);
        assert_eq!(client.playback().source(), "http://x/a.mp3");
    }

    #[test]
    fn resume_frame_does_not_reload() {
        let (mut client, _rx) = client();
        client.apply_frame(r#"{"type":"play","url":"http://x/a.mp3"}"#);
        client.apply_frame(r#"{"type":"pause"}"#);
        client.apply_frame(r#"{"type":"resume"}"#);

        assert_eq!(client.playback().state(), PlaybackState::Playing);
        assert_eq!(client.playback().loads(), 1);
    }

    #[test]
    fn unrecognized_type_changes_nothing() {
        let (mut client, _rx) = client();
        client.apply_frame(r#"{"type":"play","url":"http://x/a.mp3"}"#);

        let decoded = client.apply_frame(r#"{"type":"stop"}"#);
        assert_eq!(decoded, Decoded::UnknownType("stop".into()));
        assert_eq!(client.playback().state(), PlaybackState::Playing);
        assert_eq!(client.playback().source(), "http://x/a.mp3");
    }

    #[test]
    fn malformed_frame_changes_nothing() {
        let (mut client, _rx) = client();
        let decoded = client.apply_frame("garbage");
        assert_eq!(decoded, Decoded::Malformed);
        assert_eq!(client.playback().state(), PlaybackState::Paused);
    }

    #[test]
    fn notification_frame_is_applied_without_playback_action() {
        let (mut client, mut rx) = client();
        let decoded = client.apply_frame(r#"{"type":"notification","message":"hi"}"#);
        assert!(matches!(decoded, Decoded::Event(Event::Notification { .. })));
        assert_eq!(client.playback().state(), PlaybackState::Paused);
        assert!(rx.try_recv().is_err());
    }

    // the echo source: an inbound frame that changes playback state leaves
    // exactly one transition behind for run() to re-publish
    #[test]
    fn inbound_play_leaves_one_transition() {
        let (mut client, mut rx) = client();
        client.apply_frame(r#"{"type":"play","url":"http://x/a.mp3"}"#);

        assert_eq!(rx.try_recv().unwrap(), Transition::Playing);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn inbound_pause_leaves_one_transition() {
        let (mut client, mut rx) = client();
        client.apply_frame(r#"{"type":"play","url":"http://x/a.mp3"}"#);
        rx.try_recv().unwrap();

        client.apply_frame(r#"{"type":"pause"}"#);
        assert_eq!(rx.try_recv().unwrap(), Transition::Paused);
        assert!(rx.try_recv().is_err());
    }

    // a client receiving its own relayed echo is already in the described
    // state, so the feedback terminates
    #[test]
    fn echo_of_own_state_is_inert() {
        let (mut client, mut rx) = client();
        client.apply_frame(r#"{"type":"play","url":"http://x/a.mp3"}"#);
        rx.try_recv().unwrap();

        client.apply_frame(r#"{"type":"resume"}"#);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn sending_while_disconnected_fails() {
        let (mut client, _rx) = client();
        let err = client.send_play("http://x/a.mp3").await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
    }
}
