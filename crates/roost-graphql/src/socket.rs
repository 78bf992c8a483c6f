//! Duplex socket transport speaking `graphql-transport-ws`.
//!
//! The connection is lazy: nothing is dialed until the first subscription
//! is issued. A single driver task owns the socket, multiplexes every
//! active subscription over it, and reconnects with capped exponential
//! backoff when the connection drops, replaying the subscribe frames for
//! whatever is still active. Reconnect exhaustion does not exist as a
//! concept; the driver keeps trying while anyone is listening.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_tungstenite::tokio::connect_async;
use async_tungstenite::tungstenite::Message;
use async_tungstenite::tungstenite::client::IntoClientRequest;
use async_tungstenite::tungstenite::http::{HeaderValue, header};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{GraphqlError, GraphqlResult};
use crate::operation::{Operation, OperationRequest, WireError, WireResponse};

const SUBPROTOCOL: &str = "graphql-transport-ws";
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Lazily-connected subscription transport bound to one bearer credential.
pub struct SocketTransport {
    endpoint: Url,
    bearer: String,
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
}

impl SocketTransport {
    /// Build a transport for `endpoint` authenticating as `bearer`.
    ///
    /// No connection is opened here; dialing happens on the first
    /// subscription.
    #[must_use]
    pub fn new(endpoint: Url, bearer: impl Into<String>) -> Self {
        Self {
            endpoint,
            bearer: bearer.into(),
            commands: Mutex::new(None),
        }
    }

    /// Register a subscription and return its event stream.
    ///
    /// # Errors
    ///
    /// Returns a socket error if the connection driver cannot accept new
    /// subscriptions.
    pub fn subscribe(&self, operation: &Operation) -> GraphqlResult<SubscriptionStream> {
        let commands = self.driver_handle();
        let id = Uuid::new_v4().to_string();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        commands
            .send(Command::Subscribe {
                id: id.clone(),
                request: operation.request(),
                events: events_tx,
            })
            .map_err(|_| GraphqlError::Socket {
                operation: "socket.subscribe",
                detail: "connection driver is gone".to_string(),
            })?;
        Ok(SubscriptionStream {
            id,
            operation_name: operation.name(),
            events: events_rx,
            commands,
        })
    }

    /// Hand out the command channel, spawning the driver task on first use
    /// (or again if a previous driver has wound down).
    ///
    /// # Panics
    ///
    /// Panics if the command-handle mutex has been poisoned.
    fn driver_handle(&self) -> mpsc::UnboundedSender<Command> {
        let mut slot = self.commands.lock().expect("socket mutex poisoned");
        if let Some(handle) = slot.as_ref()
            && !handle.is_closed()
        {
            return handle.clone();
        }
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drive(self.endpoint.clone(), self.bearer.clone(), rx));
        *slot = Some(tx.clone());
        tx
    }
}

/// Server-push stream for one subscription.
///
/// Yields the `data` payload of each event; ends when the server completes
/// the subscription. Dropping the stream unsubscribes.
pub struct SubscriptionStream {
    id: String,
    operation_name: &'static str,
    events: mpsc::UnboundedReceiver<SocketEvent>,
    commands: mpsc::UnboundedSender<Command>,
}

impl SubscriptionStream {
    /// Receive the next event, `None` once the subscription completed.
    pub async fn next(&mut self) -> Option<GraphqlResult<Value>> {
        match self.events.recv().await? {
            SocketEvent::Next(envelope) => Some(envelope.into_data(self.operation_name)),
            SocketEvent::Failed(errors) => Some(Err(GraphqlError::Rejected {
                operation_name: self.operation_name,
                errors,
            })),
        }
    }

    /// Identifier used for this subscription on the wire.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for SubscriptionStream {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Stop {
            id: self.id.clone(),
        });
    }
}

enum Command {
    Subscribe {
        id: String,
        request: OperationRequest,
        events: mpsc::UnboundedSender<SocketEvent>,
    },
    Stop {
        id: String,
    },
}

enum SocketEvent {
    Next(WireResponse),
    Failed(Vec<WireError>),
}

struct SubEntry {
    request: OperationRequest,
    events: mpsc::UnboundedSender<SocketEvent>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame<'a> {
    ConnectionInit { payload: Value },
    Subscribe { id: &'a str, payload: &'a OperationRequest },
    Complete { id: &'a str },
    Pong,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    ConnectionAck {},
    Ping {},
    Pong {},
    Next { id: String, payload: WireResponse },
    Error { id: String, payload: Value },
    Complete { id: String },
}

enum Outcome {
    /// Every command handle is gone; the driver can wind down.
    Detached,
    /// The connection dropped; reconnect if anything is still active.
    Lost,
}

async fn drive(endpoint: Url, bearer: String, mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut subscriptions: HashMap<String, SubEntry> = HashMap::new();
    let mut backoff = INITIAL_BACKOFF;
    loop {
        // Stay idle (and unconnected) until something wants the socket.
        while subscriptions.is_empty() {
            match commands.recv().await {
                Some(Command::Subscribe {
                    id,
                    request,
                    events,
                }) => {
                    subscriptions.insert(id, SubEntry { request, events });
                }
                Some(Command::Stop { id }) => {
                    subscriptions.remove(&id);
                }
                None => return,
            }
        }
        match run_connection(
            &endpoint,
            &bearer,
            &mut commands,
            &mut subscriptions,
            &mut backoff,
        )
        .await
        {
            Outcome::Detached => return,
            Outcome::Lost => {
                if subscriptions.is_empty() {
                    continue;
                }
                warn!(
                    delay_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    active = subscriptions.len(),
                    "socket connection lost; reconnecting"
                );
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

async fn run_connection(
    endpoint: &Url,
    bearer: &str,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    subscriptions: &mut HashMap<String, SubEntry>,
    backoff: &mut Duration,
) -> Outcome {
    let mut request = match endpoint.as_str().into_client_request() {
        Ok(request) => request,
        Err(error) => {
            warn!(%error, "socket endpoint rejected");
            return Outcome::Lost;
        }
    };
    request.headers_mut().insert(
        header::SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_static(SUBPROTOCOL),
    );
    match HeaderValue::from_str(&format!("Bearer {bearer}")) {
        Ok(value) => {
            request.headers_mut().insert(header::AUTHORIZATION, value);
        }
        Err(error) => {
            warn!(%error, "bearer credential is not a valid header value");
            return Outcome::Lost;
        }
    }

    let (socket, _response) = match connect_async(request).await {
        Ok(pair) => pair,
        Err(error) => {
            warn!(%error, "socket connect failed");
            return Outcome::Lost;
        }
    };
    let (mut sink, mut stream) = socket.split();

    // The server expects connection parameters in the same shape the HTTP
    // transport sends its auth header.
    let init = ClientFrame::ConnectionInit {
        payload: json!({"headers": {"authorization": format!("Bearer {bearer}")}}),
    };
    if send_frame(&mut sink, &init).await.is_err() {
        return Outcome::Lost;
    }
    if wait_for_ack(&mut sink, &mut stream).await.is_err() {
        return Outcome::Lost;
    }
    *backoff = INITIAL_BACKOFF;
    debug!(active = subscriptions.len(), "socket session established");

    for (id, entry) in subscriptions.iter() {
        let frame = ClientFrame::Subscribe {
            id,
            payload: &entry.request,
        };
        if send_frame(&mut sink, &frame).await.is_err() {
            return Outcome::Lost;
        }
    }

    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if handle_server_frame(text.as_str(), &mut sink, subscriptions).await.is_err() {
                        return Outcome::Lost;
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Outcome::Lost,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    warn!(%error, "socket read failed");
                    return Outcome::Lost;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Subscribe { id, request, events }) => {
                    let frame_result = {
                        let entry = subscriptions.entry(id.clone()).insert_entry(SubEntry { request, events });
                        send_frame(&mut sink, &ClientFrame::Subscribe {
                            id: &id,
                            payload: &entry.get().request,
                        }).await
                    };
                    if frame_result.is_err() {
                        return Outcome::Lost;
                    }
                }
                Some(Command::Stop { id }) => {
                    if subscriptions.remove(&id).is_some()
                        && send_frame(&mut sink, &ClientFrame::Complete { id: &id }).await.is_err()
                    {
                        return Outcome::Lost;
                    }
                }
                None => return Outcome::Detached,
            },
        }
    }
}

async fn wait_for_ack<Si, St>(sink: &mut Si, stream: &mut St) -> Result<(), ()>
where
    Si: Sink<Message> + Unpin,
    Si::Error: std::fmt::Display,
    St: Stream<Item = Result<Message, async_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str(text.as_str()) {
                Ok(ServerFrame::ConnectionAck {}) => return Ok(()),
                Ok(ServerFrame::Ping {}) => send_frame(sink, &ClientFrame::Pong).await?,
                Ok(_) | Err(_) => {}
            },
            Some(Ok(Message::Close(_))) | None => return Err(()),
            Some(Ok(_)) => {}
            Some(Err(error)) => {
                warn!(%error, "socket failed before ack");
                return Err(());
            }
        }
    }
}

async fn handle_server_frame<Si>(
    text: &str,
    sink: &mut Si,
    subscriptions: &mut HashMap<String, SubEntry>,
) -> Result<(), ()>
where
    Si: Sink<Message> + Unpin,
    Si::Error: std::fmt::Display,
{
    let frame = match serde_json::from_str::<ServerFrame>(text) {
        Ok(frame) => frame,
        Err(error) => {
            debug!(%error, "ignoring unrecognised socket frame");
            return Ok(());
        }
    };
    match frame {
        ServerFrame::Ping {} => send_frame(sink, &ClientFrame::Pong).await?,
        ServerFrame::Next { id, payload } => {
            let forwarded = subscriptions
                .get(&id)
                .is_none_or(|entry| entry.events.send(SocketEvent::Next(payload)).is_ok());
            if !forwarded {
                // Listener is gone; release the server side too.
                subscriptions.remove(&id);
                send_frame(sink, &ClientFrame::Complete { id: &id }).await?;
            }
        }
        ServerFrame::Error { id, payload } => {
            if let Some(entry) = subscriptions.remove(&id) {
                let errors = serde_json::from_value::<Vec<WireError>>(payload.clone())
                    .unwrap_or_else(|_| {
                        vec![WireError {
                            message: payload.to_string(),
                            extensions: None,
                        }]
                    });
                let _ = entry.events.send(SocketEvent::Failed(errors));
            }
        }
        ServerFrame::Complete { id } => {
            // Dropping the entry closes the event channel, ending the stream.
            subscriptions.remove(&id);
        }
        ServerFrame::ConnectionAck {} | ServerFrame::Pong {} => {}
    }
    Ok(())
}

async fn send_frame<Si>(sink: &mut Si, frame: &ClientFrame<'_>) -> Result<(), ()>
where
    Si: Sink<Message> + Unpin,
    Si::Error: std::fmt::Display,
{
    let payload =
        serde_json::to_string(frame).expect("client frames are plain data and serialize");
    match sink.send(Message::text(payload)).await {
        Ok(()) => Ok(()),
        Err(error) => {
            warn!(%error, "socket write failed");
            Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn client_frames_match_the_protocol() {
        let init = ClientFrame::ConnectionInit {
            payload: json!({"headers": {"authorization": "Bearer t"}}),
        };
        let frame = serde_json::to_value(&init).expect("serializes");
        assert_eq!(frame["type"], json!("connection_init"));
        assert_eq!(
            frame["payload"]["headers"]["authorization"],
            json!("Bearer t")
        );

        let request = Operation::subscription("watch", "subscription watch { … }", json!({}))
            .request();
        let subscribe = ClientFrame::Subscribe {
            id: "sub-1",
            payload: &request,
        };
        let frame = serde_json::to_value(&subscribe).expect("serializes");
        assert_eq!(frame["type"], json!("subscribe"));
        assert_eq!(frame["id"], json!("sub-1"));
        assert_eq!(frame["payload"]["operationName"], json!("watch"));

        assert_eq!(
            serde_json::to_value(&ClientFrame::Pong).expect("serializes"),
            json!({"type": "pong"})
        );
    }

    #[test]
    fn server_frames_parse() {
        let next: ServerFrame = serde_json::from_str(
            r#"{"type":"next","id":"sub-1","payload":{"data":{"likes":1}}}"#,
        )
        .expect("parses");
        match next {
            ServerFrame::Next { id, payload } => {
                assert_eq!(id, "sub-1");
                assert_eq!(payload.data, Some(json!({"likes": 1})));
            }
            _ => panic!("expected a next frame"),
        }

        assert!(matches!(
            serde_json::from_str(r#"{"type":"connection_ack","payload":{}}"#),
            Ok(ServerFrame::ConnectionAck {})
        ));
        assert!(matches!(
            serde_json::from_str(r#"{"type":"complete","id":"sub-1"}"#),
            Ok(ServerFrame::Complete { .. })
        ));
        assert!(serde_json::from_str::<ServerFrame>(r#"{"type":"wat"}"#).is_err());
    }

    #[tokio::test]
    async fn streams_decode_events_and_end_on_completion() {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, mut commands_rx) = mpsc::unbounded_channel();
        let mut stream = SubscriptionStream {
            id: "sub-1".to_string(),
            operation_name: "watch",
            events: events_rx,
            commands: commands_tx,
        };

        events_tx
            .send(SocketEvent::Next(
                serde_json::from_value(json!({"data": {"likes": 2}})).expect("envelope"),
            ))
            .expect("send");
        let event = stream.next().await.expect("event").expect("data");
        assert_eq!(event, json!({"likes": 2}));

        events_tx
            .send(SocketEvent::Failed(vec![WireError {
                message: "boom".to_string(),
                extensions: None,
            }]))
            .expect("send");
        let failure = stream.next().await.expect("event").expect_err("failure");
        assert!(matches!(
            failure,
            GraphqlError::Rejected { operation_name: "watch", .. }
        ));

        drop(events_tx);
        assert!(stream.next().await.is_none());

        drop(stream);
        assert!(matches!(
            commands_rx.recv().await,
            Some(Command::Stop { id }) if id == "sub-1"
        ));
    }

    #[tokio::test]
    async fn transports_stay_lazy_until_subscribed() {
        let transport = SocketTransport::new(
            Url::parse("wss://api.example.com/v1/graphql").expect("url"),
            "token",
        );
        // Construction must not dial or spawn anything.
        assert!(
            transport
                .commands
                .lock()
                .expect("socket mutex poisoned")
                .is_none()
        );
    }
}
