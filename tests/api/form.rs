//! Drives the signup form against a running app.
use std::time::Duration;

use anyhow::Result;
use newsletter_relay::form::{
    FormSession, FormState, SubmitAction, SubscribeClient, CONFIRMATION_WINDOW,
};
use serde_json::json;
use wiremock::{matchers::any, Mock, ResponseTemplate};

use crate::helpers::TestApp;

fn form_session(app: &TestApp) -> Result<FormSession> {
    let client = SubscribeClient::new(app.newsletter_url())?;
    Ok(FormSession::new(client).with_confirmation_window(Duration::from_millis(300)))
}

#[test]
fn confirmation_window_is_five_seconds() {
    assert_eq!(CONFIRMATION_WINDOW, Duration::from_secs(5));
}

#[tokio::test]
async fn form_success_shows_confirmation_then_reverts() -> Result<()> {
    let app = TestApp::spawn().await?;
    let form = form_session(&app)?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    form.set_email("a@b.com").await;
    let action = form.submit().await;

    assert_eq!(action, SubmitAction::Send("a@b.com".to_string()));
    assert_eq!(form.state().await, FormState::Success);
    assert_eq!(form.email().await, "");

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(form.state().await, FormState::Idle);
    assert_eq!(form.email().await, "");

    Ok(())
}

#[tokio::test]
async fn form_invalid_email_never_reaches_the_endpoint() -> Result<()> {
    let app = TestApp::spawn().await?;
    let form = form_session(&app)?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider_server)
        .await;

    form.set_email("not-an-email").await;

    assert_eq!(form.submit().await, SubmitAction::Invalid);
    assert!(matches!(form.state().await, FormState::Error(_)));

    form.set_email("not-an-email@").await;
    assert_eq!(form.state().await, FormState::Idle);

    Ok(())
}

#[tokio::test]
async fn form_shows_server_error() -> Result<()> {
    let app = TestApp::spawn().await?;
    let form = form_session(&app)?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "title": "Invalid Resource",
            "detail": "a@b.com looks fake or invalid, please enter a real email address."
        })))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    form.set_email("a@b.com").await;
    form.submit().await;

    assert_eq!(
        form.state().await,
        FormState::Error(
            "a@b.com looks fake or invalid, please enter a real email address.".to_string()
        )
    );
    assert_eq!(form.email().await, "a@b.com");

    Ok(())
}

#[tokio::test]
async fn form_submit_while_in_flight_is_ignored() -> Result<()> {
    let app = TestApp::spawn().await?;
    let form = form_session(&app)?;

    // Slow enough to observe the in-flight state, faster than the provider timeout.
    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "1" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&app.provider_server)
        .await;

    form.set_email("a@b.com").await;

    let first = tokio::spawn({
        let form = form.clone();
        async move { form.submit().await }
    });

    // Wait for the first submission to take the form.
    while form.state().await != FormState::Submitting {
        tokio::task::yield_now().await;
    }
    assert!(!form.is_submit_enabled().await);
    assert_eq!(form.submit().await, SubmitAction::Ignored);

    assert_eq!(first.await?, SubmitAction::Send("a@b.com".to_string()));
    assert_eq!(form.state().await, FormState::Success);

    Ok(())
}

#[tokio::test]
async fn form_unreachable_endpoint_shows_network_error() -> Result<()> {
    // Nothing listens on port 9 of localhost.
    let client = SubscribeClient::new("http://127.0.0.1:9/api/newsletter")?;
    let form = FormSession::new(client);

    form.set_email("a@b.com").await;
    form.submit().await;

    assert_eq!(
        form.state().await,
        FormState::Error(newsletter_relay::form::NETWORK_ERROR_MSG.to_string())
    );

    Ok(())
}
