//! Ways frames travel between the host and a [`crate::CommandChannel`].
//!
//! Inbound frames are command JSON text. Outbound events are handed over as
//! values and each transport encodes them the way its host expects.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use protocol::{BridgeEvent, Command, ProtocolError, decode_event, encode_command, encode_event};
use tracing::{debug, warn};

pub trait Transport {
    /// Next inbound command frame, if one is waiting.
    fn receive(&mut self) -> Option<String> {
        None
    }

    fn send(&mut self, event: &BridgeEvent);
}

/// Direct invocation: the host calls the channel itself and gets events
/// through a callback.
pub struct CallbackTransport<F: FnMut(&BridgeEvent)> {
    on_event: F,
}

impl<F: FnMut(&BridgeEvent)> CallbackTransport<F> {
    pub fn new(on_event: F) -> Self {
        Self { on_event }
    }
}

impl<F: FnMut(&BridgeEvent)> Transport for CallbackTransport<F> {
    fn send(&mut self, event: &BridgeEvent) {
        (self.on_event)(event);
    }
}

/// In-process message passing over a pair of channels.
pub struct MessageRelay {
    commands: Receiver<String>,
    events: Sender<String>,
}

/// The host's side of a [`MessageRelay`].
pub struct HostPort {
    commands: Sender<String>,
    events: Receiver<String>,
}

impl MessageRelay {
    pub fn pair() -> (MessageRelay, HostPort) {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        (
            MessageRelay {
                commands: command_rx,
                events: event_tx,
            },
            HostPort {
                commands: command_tx,
                events: event_rx,
            },
        )
    }
}

impl Transport for MessageRelay {
    fn receive(&mut self) -> Option<String> {
        match self.commands.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                debug!("host port closed");
                None
            }
        }
    }

    fn send(&mut self, event: &BridgeEvent) {
        if self.events.send(encode_event(event)).is_err() {
            debug!(?event, "host port closed; event dropped");
        }
    }
}

impl HostPort {
    /// Posts a raw frame. Returns `false` if the bridge end is gone.
    pub fn post(&self, frame: impl Into<String>) -> bool {
        self.commands.send(frame.into()).is_ok()
    }

    pub fn post_command(&self, command: &Command) -> bool {
        self.post(encode_command(command))
    }

    /// Every event frame received so far, decoded.
    pub fn take_events(&self) -> Result<Vec<BridgeEvent>, ProtocolError> {
        self.events.try_iter().map(|f| decode_event(&f)).collect()
    }
}

/// A DOM-like element the attribute relay is attached to.
pub trait AttributeHost {
    fn read_attribute(&self, name: &str) -> Option<String>;
    fn write_attribute(&mut self, name: &str, value: &str);
    fn remove_attribute(&mut self, name: &str);
    /// Fires a notification named `event` at the element's listeners.
    fn dispatch_event(&mut self, event: &str);
}

/// Relays frames through attributes of a shared element.
///
/// The host writes a command frame, or a JSON array of frames, into
/// [`AttributeRelay::COMMAND_ATTR`] and fires [`AttributeRelay::COMMAND_EVENT`].
/// The bridge consumes the attribute. Each outbound event is written to
/// [`AttributeRelay::EVENT_ATTR`] followed by [`AttributeRelay::EVENT_EVENT`];
/// listeners read it synchronously before the next event overwrites it.
pub struct AttributeRelay<H: AttributeHost> {
    host: H,
    pending: VecDeque<String>,
}

impl<H: AttributeHost> AttributeRelay<H> {
    pub const COMMAND_ATTR: &'static str = "data-bridge-command";
    pub const EVENT_ATTR: &'static str = "data-bridge-event";
    pub const COMMAND_EVENT: &'static str = "bridge-command";
    pub const EVENT_EVENT: &'static str = "bridge-event";

    pub fn new(host: H) -> Self {
        Self {
            host,
            pending: VecDeque::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn collect(&mut self) {
        let Some(text) = self.host.read_attribute(Self::COMMAND_ATTR) else {
            return;
        };
        self.host.remove_attribute(Self::COMMAND_ATTR);
        if text.trim().is_empty() {
            return;
        }
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(serde_json::Value::Array(frames)) => {
                self.pending
                    .extend(frames.into_iter().map(|f| f.to_string()));
            }
            // A single frame, or garbage the channel will reject and log.
            Ok(_) | Err(_) => self.pending.push_back(text),
        }
    }
}

impl<H: AttributeHost> Transport for AttributeRelay<H> {
    fn receive(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            self.collect();
        }
        self.pending.pop_front()
    }

    fn send(&mut self, event: &BridgeEvent) {
        let frame = encode_event(event);
        if frame.is_empty() {
            warn!(?event, "event could not be encoded");
            return;
        }
        self.host.write_attribute(Self::EVENT_ATTR, &frame);
        self.host.dispatch_event(Self::EVENT_EVENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::RelayElement;
    use pretty_assertions::assert_eq;

    #[test]
    fn callback_sees_every_event() {
        let mut seen = Vec::new();
        {
            let mut transport = CallbackTransport::new(|e: &BridgeEvent| seen.push(e.clone()));
            assert_eq!(transport.receive(), None);
            transport.send(&BridgeEvent::OverlayStatus { enabled: true });
        }
        assert_eq!(seen, vec![BridgeEvent::OverlayStatus { enabled: true }]);
    }

    #[test]
    fn message_relay_carries_both_ways() {
        let (mut relay, host) = MessageRelay::pair();
        assert!(host.post_command(&Command::Dispose));
        assert_eq!(relay.receive().as_deref(), Some(r#"{"op":"dispose"}"#));
        assert_eq!(relay.receive(), None);

        relay.send(&BridgeEvent::MarkerTapped { id: "w1".into() });
        assert_eq!(
            host.take_events().unwrap(),
            vec![BridgeEvent::MarkerTapped { id: "w1".into() }]
        );
    }

    #[test]
    fn message_relay_survives_closed_host() {
        let (mut relay, host) = MessageRelay::pair();
        drop(host);
        assert_eq!(relay.receive(), None);
        relay.send(&BridgeEvent::OverlayStatus { enabled: false });
    }

    #[test]
    fn attribute_relay_splits_batches_and_consumes_attribute() {
        let mut element = RelayElement::default();
        element.write_attribute(
            AttributeRelay::<RelayElement>::COMMAND_ATTR,
            r#"[{"op":"dispose"},{"op":"invalidateSize"}]"#,
        );
        let mut relay = AttributeRelay::new(element);

        assert_eq!(relay.receive().as_deref(), Some(r#"{"op":"dispose"}"#));
        assert_eq!(relay.receive().as_deref(), Some(r#"{"op":"invalidateSize"}"#));
        assert_eq!(relay.receive(), None);
        assert_eq!(
            relay
                .host()
                .read_attribute(AttributeRelay::<RelayElement>::COMMAND_ATTR),
            None
        );
    }

    #[test]
    fn attribute_relay_passes_single_frame_through() {
        let mut element = RelayElement::default();
        element.write_attribute("data-bridge-command", "not json");
        let mut relay = AttributeRelay::new(element);
        assert_eq!(relay.receive().as_deref(), Some("not json"));
    }

    #[test]
    fn attribute_relay_fires_one_event_per_send() {
        let mut relay = AttributeRelay::new(RelayElement::default());
        relay.send(&BridgeEvent::MapTapped { lat: 1.0, lng: 2.0 });
        relay.send(&BridgeEvent::OverlayStatus { enabled: true });
        assert_eq!(
            relay.host().dispatched,
            vec![
                (
                    "bridge-event".to_string(),
                    Some(r#"{"event":"mapTapped","lat":1.0,"lng":2.0}"#.to_string())
                ),
                (
                    "bridge-event".to_string(),
                    Some(r#"{"event":"overlayStatus","enabled":true}"#.to_string())
                ),
            ]
        );
    }
}
