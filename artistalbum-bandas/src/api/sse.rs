//! Server-Sent Events stream of change notifications
//!
//! Subscribers of `GET /v1/updates` receive every event published on the
//! updates topic. Event name is the action, data is the JSON event.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use artistalbum_common::events::{TopicMessage, UPDATES_TOPIC};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::AppState;

/// GET /v1/updates
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    let rx = state.event_bus.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(message) => to_sse_event(&message).map(Ok),
            Err(e) => {
                // Lagged: the client missed events, keep streaming
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// SSE frame for a bus message, or None if it belongs to another topic
fn to_sse_event(message: &TopicMessage) -> Option<Event> {
    if message.topic != UPDATES_TOPIC {
        return None;
    }

    match serde_json::to_string(&message.event) {
        Ok(json) => Some(Event::default().event(message.event.action.as_str()).data(json)),
        Err(e) => {
            warn!("Failed to serialize change event: {}", e);
            None
        }
    }
}
