//! Chat-completions contract tests for the quote generator.
//!
//! These tests verify the generator against a mock provider:
//! - Request body and bearer header match the chat-completions format
//! - Successful responses yield the trimmed message content
//! - Every failure mode maps to a typed error and a fallback quote

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use datenote::config::{GeneratorConfig, Variety};
use datenote::generator::prompts::{FALLBACK_QUOTES, SYSTEM_PROMPT, USER_PROMPTS};
use datenote::generator::{GenerationError, QuoteGenerator, QuoteSource};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

fn config_for(server: &MockServer) -> GeneratorConfig {
    GeneratorConfig {
        api_key: "test-key".to_owned(),
        endpoint: format!("{}{COMPLETIONS_PATH}", server.uri()),
        model: "gpt-4o-mini".to_owned(),
        ..GeneratorConfig::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Request format
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn request_carries_model_prompts_and_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 100,
            "temperature": 0.8,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": USER_PROMPTS[0]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Go stargazing.")))
        .expect(1)
        .mount(&server)
        .await;

    let generator = QuoteGenerator::new(config_for(&server));
    assert_eq!(generator.request_quote().await.unwrap(), "Go stargazing.");
}

#[tokio::test]
async fn random_variety_sends_a_pool_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(3)
        .mount(&server)
        .await;

    let config = GeneratorConfig {
        prompt_variety: Variety::Random,
        ..config_for(&server)
    };
    let generator = QuoteGenerator::new(config);
    for _ in 0..3 {
        generator.request_quote().await.unwrap();
    }

    for request in server.received_requests().await.unwrap() {
        let body: serde_json::Value = request.body_json().unwrap();
        let prompt = body["messages"][1]["content"].as_str().unwrap();
        assert!(USER_PROMPTS.contains(&prompt), "unexpected prompt {prompt}");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Response handling
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn success_content_is_trimmed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("\n  Cook a new recipe together tonight.  \n")),
        )
        .mount(&server)
        .await;

    let generator = QuoteGenerator::new(config_for(&server));
    assert_eq!(
        generator.generate().await,
        "Cook a new recipe together tonight."
    );
}

#[tokio::test]
async fn server_error_maps_to_status_and_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "upstream exploded", "type": "server_error"}
        })))
        .mount(&server)
        .await;

    let generator = QuoteGenerator::new(config_for(&server));
    match generator.request_quote().await {
        Err(GenerationError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
    assert_eq!(generator.generate().await, FALLBACK_QUOTES[0]);
}

#[tokio::test]
async fn unauthorized_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let generator = QuoteGenerator::new(config_for(&server));
    match generator.request_quote().await {
        Err(GenerationError::Status { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
    assert_eq!(generator.generate().await, FALLBACK_QUOTES[0]);
}

#[tokio::test]
async fn malformed_bodies_fall_back() {
    for body in [
        json!({"choices": []}),
        json!({"object": "chat.completion"}),
        json!({"choices": [{"message": {"role": "assistant", "content": null}}]}),
        json!({"choices": [{"message": {"role": "assistant", "content": "   "}}]}),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let generator = QuoteGenerator::new(config_for(&server));
        assert!(
            matches!(
                generator.request_quote().await,
                Err(GenerationError::MalformedResponse(_))
            ),
            "accepted {body}"
        );
        assert_eq!(generator.generate().await, FALLBACK_QUOTES[0]);
    }
}

#[tokio::test]
async fn non_json_success_body_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let generator = QuoteGenerator::new(config_for(&server));
    assert!(matches!(
        generator.request_quote().await,
        Err(GenerationError::MalformedResponse(_))
    ));
    assert_eq!(generator.generate().await, FALLBACK_QUOTES[0]);
}

#[tokio::test]
async fn slow_provider_times_out_and_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = GeneratorConfig {
        timeout_secs: 1,
        ..config_for(&server)
    };
    let generator = QuoteGenerator::new(config);
    assert_eq!(
        generator.request_quote().await,
        Err(GenerationError::Timeout(Duration::from_secs(1)))
    );
    assert_eq!(generator.generate().await, FALLBACK_QUOTES[0]);
}

#[tokio::test]
async fn random_fallback_comes_from_pool() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = GeneratorConfig {
        fallback_variety: Variety::Random,
        ..config_for(&server)
    };
    let generator = QuoteGenerator::new(config);
    for _ in 0..5 {
        let quote = generator.generate().await;
        assert!(FALLBACK_QUOTES.contains(&quote.as_str()), "{quote}");
    }
}
