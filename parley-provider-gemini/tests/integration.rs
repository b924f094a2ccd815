//! Integration tests for the Gemini provider using wiremock.

use futures::StreamExt;
use parley_provider::{Chat, ChatConfig, Provider, ProviderError};
use parley_provider_gemini::Gemini;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STREAM_PATH: &str = "/v1beta/models/gemini-2.5-flash:streamGenerateContent";

fn text_chunk(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
    .to_string()
}

fn sse_body(data_lines: &[String]) -> String {
    let mut body = String::new();
    for line in data_lines {
        body.push_str(&format!("data: {line}\r\n\r\n"));
    }
    body
}

fn reply_body(deltas: &[&str]) -> String {
    let mut lines: Vec<String> = deltas.iter().map(|d| text_chunk(d)).collect();
    lines.push(
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":""}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":4,"candidatesTokenCount":2}}"#
            .to_string(),
    );
    sse_body(&lines)
}

fn sse_response(deltas: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(reply_body(deltas), "text/event-stream")
}

async fn drain(chat: &impl Chat, prompt: &str) -> Result<Vec<String>, ProviderError> {
    let stream = chat.send_message_stream(prompt.to_string()).await?;
    stream.receiver.collect::<Vec<_>>().await.into_iter().collect()
}

#[tokio::test]
async fn stream_sends_key_and_yields_deltas() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(sse_response(&["Hel", "lo"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = Gemini::new("test-api-key").base_url(mock_server.uri());
    let chat = provider.start_chat(&ChatConfig::default()).unwrap();

    let deltas = drain(&chat, "hi").await.unwrap();
    assert_eq!(deltas, ["Hel", "lo"]);
    assert_eq!(chat.history_len(), 2);
}

#[tokio::test]
async fn request_carries_system_instruction_and_user_turn() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(body_partial_json(serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
            "systemInstruction": {"parts": [{"text": "Answer in haiku."}]}
        })))
        .respond_with(sse_response(&["ok"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = Gemini::new("k").base_url(mock_server.uri());
    let chat = provider
        .start_chat(&ChatConfig::default().system_instruction("Answer in haiku."))
        .unwrap();

    assert_eq!(drain(&chat, "hi").await.unwrap(), ["ok"]);
}

#[tokio::test]
async fn completed_turns_are_sent_as_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(sse_response(&["Hi ", "there"]))
        .expect(2)
        .mount(&mock_server)
        .await;

    let provider = Gemini::new("k").base_url(mock_server.uri());
    let chat = provider.start_chat(&ChatConfig::default()).unwrap();

    drain(&chat, "first").await.unwrap();
    drain(&chat, "second").await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let second: serde_json::Value = requests[1].body_json().unwrap();
    assert_eq!(
        second["contents"],
        serde_json::json!([
            {"role": "user", "parts": [{"text": "first"}]},
            {"role": "model", "parts": [{"text": "Hi there"}]},
            {"role": "user", "parts": [{"text": "second"}]}
        ])
    );
    assert_eq!(chat.history_len(), 4);
}

#[tokio::test]
async fn failed_turn_is_not_retained() {
    let mock_server = MockServer::start().await;

    let failing = sse_body(&[
        text_chunk("par"),
        r#"{"error":{"code":500,"message":"internal","status":"INTERNAL"}}"#.to_string(),
    ]);
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(failing, "text/event-stream"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(sse_response(&["fine"]))
        .mount(&mock_server)
        .await;

    let provider = Gemini::new("k").base_url(mock_server.uri());
    let chat = provider.start_chat(&ChatConfig::default()).unwrap();

    let err = drain(&chat, "lost").await.unwrap_err();
    assert!(matches!(err, ProviderError::RequestFailed(m) if m.contains("internal")));
    assert_eq!(chat.history_len(), 0);

    drain(&chat, "retry").await.unwrap();
    let requests = mock_server.received_requests().await.unwrap();
    let second: serde_json::Value = requests[1].body_json().unwrap();
    assert_eq!(second["contents"].as_array().unwrap().len(), 1);
    assert_eq!(second["contents"][0]["parts"][0]["text"], "retry");
}

#[tokio::test]
async fn blocked_prompt_ends_stream_with_error() {
    let mock_server = MockServer::start().await;

    let body = sse_body(&[r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#.to_string()]);
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let provider = Gemini::new("k").base_url(mock_server.uri());
    let chat = provider.start_chat(&ChatConfig::default()).unwrap();

    let err = drain(&chat, "x").await.unwrap_err();
    assert!(matches!(err, ProviderError::Blocked(r) if r == "SAFETY"));
}

#[tokio::test]
async fn non_success_status_fails_before_streaming() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&mock_server)
        .await;

    let provider = Gemini::new("bad").base_url(mock_server.uri());
    let chat = provider.start_chat(&ChatConfig::default()).unwrap();

    let err = chat.send_message_stream("x".into()).await.unwrap_err();
    assert!(matches!(err, ProviderError::RequestFailed(m) if m.contains("API key not valid")));
}

#[tokio::test]
async fn rate_limit_status_maps_to_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let provider = Gemini::new("k").base_url(mock_server.uri());
    let chat = provider.start_chat(&ChatConfig::default()).unwrap();

    let err = chat.send_message_stream("x".into()).await.unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited));
}
