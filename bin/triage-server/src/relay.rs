//! Token relay between the inference backend and the browser.
//!
//! The backend answers `POST /graph/chat/stream` with newline-delimited
//! `data: {json}` events.  This module reassembles those lines from the raw
//! byte stream (chunk boundaries fall anywhere, including inside a line),
//! re-encodes reply fragments into the frontend's `0:`/`d:` frame protocol
//! and, once the upstream closes cleanly, persists the assembled assistant
//! reply.
//!
//! Frames on the wire:
//!
//! ```text
//! 0:"Hi"\n            reply fragment, JSON-encoded string
//! d:{"type":"node"}\n debug event, whole upstream object (debug mode only)
//! ```

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::entities::{ChatStore, MessageRecord, SqliteStore};
use crate::error::ServerError;

/// Outbound frame channel depth; the producer blocks (backpressure) when the
/// client consumes slower than the backend produces.
const CHANNEL_CAPACITY: usize = 100;

/// Role tag stored for relayed assistant replies.
pub const ROLE_ASSISTANT: &str = "ASSISTANT";
/// Role tag stored for user turns.
pub const ROLE_USER: &str = "USER";

// ── Line reassembly ───────────────────────────────────────────────────────────

/// Reassembles complete lines from an arbitrarily-chunked byte stream.
///
/// Bytes after the last newline stay buffered until a later chunk completes
/// the line; [`LineScanner::finish`] flushes a final unterminated line.
#[derive(Debug, Default)]
pub struct LineScanner {
    buffer: Vec<u8>,
}

impl LineScanner {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed one chunk; returns every line the chunk completed, trimmed of
    /// surrounding whitespace (which also strips `\r` from CRLF input).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let line_end = start + pos;
            lines.push(
                String::from_utf8_lossy(&self.buffer[start..line_end])
                    .trim()
                    .to_string(),
            );
            start = line_end + 1;
        }
        // Keep remaining bytes for the next chunk.
        self.buffer.drain(0..start);
        lines
    }

    /// Flush the trailing line left when the stream ends without a newline.
    pub fn finish(self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.buffer).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

// ── Frame encoding ────────────────────────────────────────────────────────────

/// Turns scanned upstream lines into outbound frames while accumulating the
/// full assistant reply.
#[derive(Debug)]
pub struct FrameEncoder {
    debug: bool,
    reply: String,
}

impl FrameEncoder {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            reply: String::new(),
        }
    }

    /// Encode the outbound frames for one line.  Lines without the `data: `
    /// prefix and lines whose payload fails to decode produce nothing; the
    /// stream carries on.
    ///
    /// One upstream object can yield both a `0:` and a `d:` frame: the
    /// fragment check and the debug check are independent.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        let Some(payload) = line.strip_prefix("data: ") else {
            return Vec::new();
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) else {
            return Vec::new();
        };
        let mut frames = Vec::new();
        if let Some(text) = value.get("content").and_then(|v| v.as_str()) {
            if !text.is_empty() {
                self.reply.push_str(text);
                frames.push(format!(
                    "0:{}\n",
                    serde_json::Value::String(text.to_string())
                ));
            }
        }
        if self.debug && value.get("type").is_some() {
            frames.push(format!("d:{value}\n"));
        }
        frames
    }

    /// The reply assembled so far.
    pub fn reply(&self) -> &str {
        &self.reply
    }

    pub fn into_reply(self) -> String {
        self.reply
    }
}

// ── Producer task ─────────────────────────────────────────────────────────────

/// Once the upstream closes cleanly, append the assembled reply to this chat.
pub struct PersistReply {
    pub store: Arc<SqliteStore>,
    pub chat_id: String,
}

/// Spawn the relay task: pump `upstream` through the line scanner, send
/// encoded frames into the returned channel, and persist the reply at clean
/// end-of-stream.
///
/// Error handling:
/// * upstream transport error mid-stream: one `Err` frame is sent (erroring
///   the outbound body) and nothing is persisted;
/// * receiver dropped (client disconnected): the task stops reading, which
///   drops `upstream` and aborts the backend transfer; nothing is persisted.
pub fn spawn_relay<S, E>(
    upstream: S,
    debug: bool,
    persist: Option<PersistReply>,
) -> mpsc::Receiver<Result<String, ServerError>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Result<String, ServerError>>(CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let mut upstream = std::pin::pin!(upstream);
        let mut scanner = LineScanner::new();
        let mut encoder = FrameEncoder::new(debug);

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(chunk) => {
                    for line in scanner.push(&chunk) {
                        for frame in encoder.handle_line(&line) {
                            if tx.send(Ok(frame)).await.is_err() {
                                // Client disconnected.
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "backend stream failed mid-relay");
                    let _ = tx
                        .send(Err(ServerError::Upstream(format!(
                            "backend stream failed: {e}"
                        ))))
                        .await;
                    return;
                }
            }
        }

        // A final line without a trailing newline gets the same handling.
        if let Some(line) = scanner.finish() {
            for frame in encoder.handle_line(&line) {
                if tx.send(Ok(frame)).await.is_err() {
                    return;
                }
            }
        }

        let reply = encoder.into_reply();
        if let Some(p) = persist {
            if !reply.is_empty() {
                let msg = MessageRecord {
                    id: Uuid::new_v4().to_string(),
                    chat_id: p.chat_id,
                    role: ROLE_ASSISTANT.to_string(),
                    content: reply,
                    created_at: Utc::now(),
                };
                if let Err(e) = p.store.append_message(msg).await {
                    tracing::warn!(error = %e, "failed to persist assistant reply");
                }
            }
        }
    });
    rx
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use futures::stream;

    use crate::entities::{ChatRecord, UserRecord, UserStore};

    use super::*;

    // LineScanner

    #[test]
    fn scanner_reassembles_lines_split_across_chunks() {
        let mut scanner = LineScanner::new();
        assert!(scanner.push(b"data: {\"cont").is_empty());
        let lines = scanner.push(b"ent\": \"Hi\"}\ndata: ");
        assert_eq!(lines, vec!["data: {\"content\": \"Hi\"}".to_string()]);
        let lines = scanner.push(b"{\"content\": \" there\"}\n");
        assert_eq!(lines, vec!["data: {\"content\": \" there\"}".to_string()]);
        assert!(scanner.finish().is_none());
    }

    #[test]
    fn scanner_returns_multiple_lines_from_one_chunk() {
        let mut scanner = LineScanner::new();
        let lines = scanner.push(b"a\nb\nc");
        assert_eq!(lines, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(scanner.finish(), Some("c".to_string()));
    }

    #[test]
    fn scanner_strips_carriage_returns() {
        let mut scanner = LineScanner::new();
        let lines = scanner.push(b"data: {}\r\n\r\n");
        assert_eq!(lines, vec!["data: {}".to_string(), String::new()]);
    }

    #[test]
    fn scanner_keeps_multibyte_characters_intact_across_chunks() {
        let text = "data: {\"content\": \"불량\"}\n";
        let bytes = text.as_bytes();
        // Split inside the first multibyte character.
        let mut scanner = LineScanner::new();
        assert!(scanner.push(&bytes[..20]).is_empty());
        let lines = scanner.push(&bytes[20..]);
        assert_eq!(lines, vec!["data: {\"content\": \"불량\"}".to_string()]);
    }

    // FrameEncoder

    #[test]
    fn encoder_emits_fragment_frames_and_accumulates() {
        let mut enc = FrameEncoder::new(false);
        let frames = enc.handle_line("data: {\"content\": \"Hi\"}");
        assert_eq!(frames, vec!["0:\"Hi\"\n".to_string()]);
        let frames = enc.handle_line("data: {\"content\": \" there\"}");
        assert_eq!(frames, vec!["0:\" there\"\n".to_string()]);
        assert_eq!(enc.reply(), "Hi there");
    }

    #[test]
    fn encoder_escapes_fragments_as_json_strings() {
        let mut enc = FrameEncoder::new(false);
        let frames = enc.handle_line("data: {\"content\": \"line\\nbreak \\\"q\\\"\"}");
        assert_eq!(frames, vec!["0:\"line\\nbreak \\\"q\\\"\"\n".to_string()]);
        assert_eq!(enc.reply(), "line\nbreak \"q\"");
    }

    #[test]
    fn encoder_skips_empty_fragments_and_non_data_lines() {
        let mut enc = FrameEncoder::new(false);
        assert!(enc.handle_line("data: {\"content\": \"\"}").is_empty());
        assert!(enc.handle_line("").is_empty());
        assert!(enc.handle_line(": comment").is_empty());
        assert!(enc.handle_line("data: not json").is_empty());
        assert!(
            enc.handle_line("data: {\"done\": true, \"full_response\": \"x\"}")
                .is_empty()
        );
        assert_eq!(enc.reply(), "");
    }

    #[test]
    fn encoder_forwards_debug_objects_only_in_debug_mode() {
        let mut plain = FrameEncoder::new(false);
        assert!(plain.handle_line("data: {\"type\": \"node_start\"}").is_empty());

        let mut debug = FrameEncoder::new(true);
        let frames = debug.handle_line("data: {\"type\": \"node_start\"}");
        assert_eq!(frames, vec!["d:{\"type\":\"node_start\"}\n".to_string()]);
    }

    #[test]
    fn encoder_can_emit_fragment_and_debug_frame_for_one_object() {
        let mut enc = FrameEncoder::new(true);
        let frames = enc.handle_line("data: {\"content\": \"x\", \"type\": \"token\"}");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], "0:\"x\"\n");
        assert!(frames[1].starts_with("d:{"));
        assert_eq!(enc.reply(), "x");
    }

    // spawn_relay

    type ChunkResult = Result<Bytes, std::io::Error>;

    fn ok(bytes: &str) -> ChunkResult {
        Ok(Bytes::copy_from_slice(bytes.as_bytes()))
    }

    async fn collect(mut rx: mpsc::Receiver<Result<String, ServerError>>) -> (String, bool) {
        let mut body = String::new();
        let mut errored = false;
        while let Some(item) = rx.recv().await {
            match item {
                Ok(frame) => body.push_str(&frame),
                Err(_) => errored = true,
            }
        }
        (body, errored)
    }

    async fn store_with_chat(chat_id: &str) -> Arc<SqliteStore> {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store
            .create_user(UserRecord {
                id: "u-1".to_string(),
                email: "analyst@example.com".to_string(),
                name: None,
                password_hash: "x".to_string(),
                role: "USER".to_string(),
                is_active: true,
                group_id: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        store
            .create_chat(ChatRecord {
                id: chat_id.to_string(),
                title: "New chat".to_string(),
                user_id: "u-1".to_string(),
                model_name: "qwen3:32b".to_string(),
                group_id: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn relay_reframes_and_persists_the_full_reply() {
        let store = store_with_chat("c-1").await;
        // Chunk boundaries deliberately misaligned with lines.
        let chunks = vec![
            ok("data: {\"content\": \"Hi\"}\ndata: {\"cont"),
            ok("ent\": \" there\"}\n"),
            ok("data: {\"done\": true, \"full_response\": \"ignored\"}"),
        ];
        let rx = spawn_relay(
            stream::iter(chunks),
            false,
            Some(PersistReply {
                store: store.clone(),
                chat_id: "c-1".to_string(),
            }),
        );
        let (body, errored) = collect(rx).await;
        assert!(!errored);
        assert_eq!(body, "0:\"Hi\"\n0:\" there\"\n");

        let messages = store.list_messages("c-1").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "ASSISTANT");
        assert_eq!(messages[0].content, "Hi there");
    }

    #[tokio::test]
    async fn relay_handles_trailing_line_without_newline() {
        let rx = spawn_relay(
            stream::iter(vec![ok("data: {\"content\": \"tail\"}")]),
            false,
            None,
        );
        let (body, errored) = collect(rx).await;
        assert!(!errored);
        assert_eq!(body, "0:\"tail\"\n");
    }

    #[tokio::test]
    async fn relay_discards_reply_on_midstream_error() {
        let store = store_with_chat("c-1").await;
        let chunks = vec![
            ok("data: {\"content\": \"partial\"}\n"),
            Err(std::io::Error::other("connection reset")),
        ];
        let rx = spawn_relay(
            stream::iter(chunks),
            false,
            Some(PersistReply {
                store: store.clone(),
                chat_id: "c-1".to_string(),
            }),
        );
        let (body, errored) = collect(rx).await;
        assert_eq!(body, "0:\"partial\"\n");
        assert!(errored);

        assert!(store.list_messages("c-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn relay_without_reply_persists_nothing() {
        let store = store_with_chat("c-1").await;
        let rx = spawn_relay(
            stream::iter(vec![ok("data: {\"done\": true}\n")]),
            false,
            Some(PersistReply {
                store: store.clone(),
                chat_id: "c-1".to_string(),
            }),
        );
        let (body, _) = collect(rx).await;
        assert!(body.is_empty());
        assert!(store.list_messages("c-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn relay_stops_when_the_receiver_is_dropped() {
        let store = store_with_chat("c-1").await;
        let many: Vec<ChunkResult> = (0..500)
            .map(|i| ok(&format!("data: {{\"content\": \"t{i}\"}}\n")))
            .collect();
        let rx = spawn_relay(
            stream::iter(many),
            false,
            Some(PersistReply {
                store: store.clone(),
                chat_id: "c-1".to_string(),
            }),
        );
        drop(rx);
        // Give the producer a moment to observe the closed channel.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(store.list_messages("c-1").await.unwrap().is_empty());
    }
}
