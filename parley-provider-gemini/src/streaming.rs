//! SSE streaming support for `streamGenerateContent?alt=sse`.
//!
//! Gemini sends one `data:` line per chunk, each a full
//! `GenerateContentResponse` JSON object, separated by blank lines:
//!
//! ```text
//! data: {"candidates":[{"content":{"parts":[{"text":"Hel"}],"role":"model"}}]}
//!
//! data: {"candidates":[{"content":{"parts":[{"text":"lo"}],"role":"model"},"finishReason":"STOP"}]}
//! ```

use bytes::Bytes;
use futures::{Stream, StreamExt};
use parley_provider::{FragmentStream, ProviderError};
use reqwest::Response;

use crate::error::map_reqwest_error;
use crate::types::GenerateContentResponse;

/// Wrap an HTTP response body into a [`FragmentStream`] of text deltas.
///
/// `on_complete` receives the assembled reply once the body ends without
/// error. It is never called for a failed stream.
pub(crate) fn stream_reply(
    response: Response,
    on_complete: impl FnOnce(String) + Send + 'static,
) -> FragmentStream {
    let byte_stream = response.bytes_stream();
    FragmentStream::new(parse_sse_stream(byte_stream, on_complete))
}

/// Parse a raw byte stream into text deltas.
fn parse_sse_stream(
    byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    on_complete: impl FnOnce(String) + Send + 'static,
) -> impl Stream<Item = Result<String, ProviderError>> + Send + 'static {
    async_stream::stream! {
        let mut parser = SseParser::default();
        let mut bytes_stream = std::pin::pin!(byte_stream);
        let mut reply = String::new();

        while let Some(chunk_result) = bytes_stream.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield Err(map_reqwest_error(e));
                    return;
                }
            };

            let events = match parser.feed(&chunk) {
                Ok(events) => events,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for data in events {
                match decode_chunk(&data) {
                    Ok(Some(text)) => {
                        reply.push_str(&text);
                        yield Ok(text);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        let tail = match parser.finish() {
            Ok(events) => events,
            Err(e) => {
                yield Err(e);
                return;
            }
        };
        for data in tail {
            match decode_chunk(&data) {
                Ok(Some(text)) => {
                    reply.push_str(&text);
                    yield Ok(text);
                }
                Ok(None) => {}
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        tracing::debug!(chars = reply.len(), "gemini stream complete");
        on_complete(reply);
    }
}

/// Decode one SSE data payload into its text delta.
///
/// `Ok(None)` for chunks that carry no answer text (usage-only chunks,
/// the final `finishReason` chunk, thought-only chunks).
pub(crate) fn decode_chunk(data: &str) -> Result<Option<String>, ProviderError> {
    if data == "[DONE]" {
        return Ok(None);
    }
    let chunk: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| ProviderError::InvalidResponse(format!("JSON parse error in SSE: {e}")))?;

    if let Some(error) = chunk.error {
        let status = error.status.unwrap_or_else(|| "UNKNOWN".into());
        return Err(match error.code {
            Some(429) => ProviderError::RateLimited,
            Some(401) | Some(403) => ProviderError::AuthFailed(error.message),
            _ => ProviderError::RequestFailed(format!("{status}: {}", error.message)),
        });
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ProviderError::Blocked(reason));
    }

    let text: String = chunk
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.answer_text())
        .unwrap_or_default();

    if let Some(reason) = chunk.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
        tracing::debug!(finish_reason = reason, "gemini candidate finished");
    }

    Ok((!text.is_empty()).then_some(text))
}

/// Splits a byte stream into SSE `data` payloads.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
struct SseParser {
    buf: Vec<u8>,
    data: String,
}

impl SseParser {
    /// Feed one network chunk; returns every event it completed.
    fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, ProviderError> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline_pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=newline_pos).collect();
            let line = decode_line(&raw)?;
            if let Some(event) = self.process_line(line.trim_end_matches(['\r', '\n'])) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Flush whatever is left once the body has ended.
    fn finish(&mut self) -> Result<Vec<String>, ProviderError> {
        let raw = std::mem::take(&mut self.buf);
        let mut events = Vec::new();
        let line = decode_line(&raw)?;
        let line = line.trim();
        if !line.is_empty() {
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events.extend(self.dispatch());
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            // Blank line: dispatch the accumulated event
            return self.dispatch();
        }
        if let Some(data) = line.strip_prefix("data:") {
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(data.strip_prefix(' ').unwrap_or(data));
        }
        // Ignore comments (':') and event/id/retry fields
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.data))
        }
    }
}

fn decode_line(raw: &[u8]) -> Result<String, ProviderError> {
    String::from_utf8(raw.to_vec())
        .map_err(|e| ProviderError::InvalidResponse(format!("UTF-8 decode error: {e}")))
}
