use anyhow::Result;
use test_utils::gemini_reply_fixture;
use test_utils::primer_instruction_fixture;
use test_utils::primer_reply_fixture;

use super::Content;
use super::Gemini;
use crate::domain::models::Backend;
use crate::domain::models::BackendHandle;
use crate::domain::models::Primer;

impl Gemini {
    fn with_url(url: String) -> Gemini {
        return Gemini {
            url,
            token: "abc".to_string(),
            model: "models/model-1".to_string(),
            timeout: "200".to_string(),
        };
    }
}

fn primer() -> Primer {
    return Primer::new(primer_instruction_fixture(), primer_reply_fixture()).unwrap();
}

fn primed_handle() -> Result<BackendHandle> {
    let contents = vec![
        Content::new("user", primer_instruction_fixture()),
        Content::new("model", primer_reply_fixture()),
    ];
    return Ok(BackendHandle::new(serde_json::to_string(&contents)?));
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1beta/models/model-1?key=abc")
        .with_status(200)
        .create();

    let backend = Gemini::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_successfully_health_checks_with_official_api() {
    let token = match std::env::var("CHATTY_GEMINI_TOKEN") {
        Ok(token) => token,
        Err(_) => {
            println!("There is no token in environment defined, skipping test");
            return;
        }
    };
    let backend = Gemini {
        url: "https://generativelanguage.googleapis.com".to_string(),
        token,
        model: "models/gemini-1.5-pro-latest".to_string(),
        timeout: "500".to_string(),
    };

    let res = backend.health_check().await;
    assert!(res.is_ok());
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1beta/models/model-1?key=abc")
        .with_status(500)
        .create();

    let backend = Gemini::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks_without_a_token() {
    let mut backend = Gemini::with_url("http://localhost:1".to_string());
    backend.token = "".to_string();

    let res = backend.health_check().await;
    assert_eq!(res.unwrap_err().to_string(), "Gemini token is not defined");
}

#[tokio::test]
async fn it_opens_a_primed_conversation() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1beta/models/model-1?key=abc")
        .with_status(200)
        .create();

    let backend = Gemini::with_url(server.url());
    let handle = backend.open(&primer()).await?;
    mock.assert();

    let contents: Vec<Content> = serde_json::from_str(&handle.context)?;
    assert_eq!(
        contents,
        vec![
            Content::new("user", primer_instruction_fixture()),
            Content::new("model", primer_reply_fixture()),
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_open_when_unreachable() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1beta/models/model-1?key=abc")
        .with_status(403)
        .create();

    let backend = Gemini::with_url(server.url());
    let res = backend.open(&primer()).await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_exchanges_messages() -> Result<()> {
    let mut handle = primed_handle()?;
    let expected_request = serde_json::json!({
        "contents": [
            { "role": "user", "parts": [{ "text": primer_instruction_fixture() }] },
            { "role": "model", "parts": [{ "text": primer_reply_fixture() }] },
            { "role": "user", "parts": [{ "text": "Hallo" }] },
        ]
    });

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:generateContent?key=abc")
        .match_body(mockito::Matcher::Json(expected_request))
        .with_status(200)
        .with_body(gemini_reply_fixture("Hi there"))
        .create();

    let backend = Gemini::with_url(server.url());
    let reply = backend.exchange(&mut handle, "Hallo").await?;
    mock.assert();

    assert_eq!(reply, "Hi there");
    let contents: Vec<Content> = serde_json::from_str(&handle.context)?;
    assert_eq!(contents.len(), 4);
    assert_eq!(contents[2], Content::new("user", "Hallo"));
    assert_eq!(contents[3], Content::new("model", "Hi there"));

    return Ok(());
}

#[tokio::test]
async fn it_keeps_the_context_when_an_exchange_fails() -> Result<()> {
    let mut handle = primed_handle()?;
    let context = handle.context.to_string();

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:generateContent?key=abc")
        .with_status(400)
        .with_body(r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#)
        .create();

    let backend = Gemini::with_url(server.url());
    let res = backend.exchange(&mut handle, "Hallo").await;
    mock.assert();

    assert_eq!(
        res.unwrap_err().to_string(),
        "Failed to make completion request to Gemini, 400: API key not valid."
    );
    assert_eq!(handle.context, context);

    return Ok(());
}

#[tokio::test]
async fn it_fails_on_responses_without_candidates() -> Result<()> {
    let mut handle = primed_handle()?;
    let context = handle.context.to_string();

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:generateContent?key=abc")
        .with_status(200)
        .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
        .create();

    let backend = Gemini::with_url(server.url());
    let res = backend.exchange(&mut handle, "Hallo").await;
    mock.assert();

    assert_eq!(res.unwrap_err().to_string(), "Gemini returned no candidates");
    assert_eq!(handle.context, context);

    return Ok(());
}

#[tokio::test]
async fn it_does_not_record_empty_replies() -> Result<()> {
    let mut handle = primed_handle()?;
    let context = handle.context.to_string();

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:generateContent?key=abc")
        .with_status(200)
        .with_body(gemini_reply_fixture(""))
        .create();

    let backend = Gemini::with_url(server.url());
    let reply = backend.exchange(&mut handle, "Hallo").await?;
    mock.assert();

    assert_eq!(reply, "");
    assert_eq!(handle.context, context);

    return Ok(());
}
