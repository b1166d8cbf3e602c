// Chunked newline-delimited JSON streaming for stopwatch ticks
use crate::domain::flight_timer::{format_time, FormattedTime};
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickLine {
    pub elapsed_seconds: u64,
    pub display: String,
    pub formatted: FormattedTime,
}

impl TickLine {
    pub fn new(elapsed_seconds: u64) -> Self {
        let formatted = format_time(elapsed_seconds);
        Self {
            elapsed_seconds,
            display: formatted.to_string(),
            formatted,
        }
    }
}

/// Current value first, then every change until the sender goes away.
pub fn elapsed_updates(mut rx: watch::Receiver<u64>) -> impl Stream<Item = u64> + Send + 'static {
    async_stream::stream! {
        let current = *rx.borrow_and_update();
        yield current;
        while rx.changed().await.is_ok() {
            let next = *rx.borrow_and_update();
            yield next;
        }
    }
}

fn encode_line(elapsed_seconds: u64) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(&TickLine::new(elapsed_seconds))?;
    let mut line = BytesMut::with_capacity(json.len() + 1);
    line.put_slice(&json);
    line.put_u8(b'\n');
    Ok(line.freeze())
}

/// Stream elapsed-seconds updates as `application/x-ndjson`, one line per tick.
pub fn ndjson_tick_stream(rx: watch::Receiver<u64>) -> Result<Response<Body>, StatusCode> {
    let byte_stream = async_stream::stream! {
        for await elapsed in elapsed_updates(rx) {
            yield encode_line(elapsed);
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream))
        .map_err(|e| {
            tracing::error!("Stream response build error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
