use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::{
    matchers::{any, body_json, header, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{TestApp, TEST_API_KEY};

async fn status_and_body(res: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = res.status();
    let body = res.json::<Value>().await?;
    Ok((status, body))
}

#[tokio::test]
async fn newsletter_subscribe_created() -> Result<()> {
    let app = TestApp::spawn().await?;

    let auth = format!(
        "Basic {}",
        base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            format!("anystring:{TEST_API_KEY}")
        )
    );
    Mock::given(path(TestApp::members_path()))
        .and(method("POST"))
        .and(header("Authorization", auth.as_str()))
        .and(body_json(json!({
            "email_address": "a@b.com",
            "status": "subscribed",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let res = app.post_newsletter(&json!({ "email": "a@b.com" })).await?;
    let (status, body) = status_and_body(res).await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "message": "Successfully subscribed!" }));

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_invalid_email_400_without_provider_call() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider_server)
        .await;

    let cases = [
        (json!({ "email": "not-an-email" }), "Missing '@'"),
        (json!({ "email": "" }), "Empty email"),
        (json!({ "email": null }), "Null email"),
        (json!({}), "Missing email"),
    ];

    for (request, description) in cases {
        let res = app.post_newsletter(&request).await?;
        let (status, body) = status_and_body(res).await?;

        assert_eq!(
            status,
            StatusCode::BAD_REQUEST,
            "The API did not return a 400 BAD REQUEST when the payload was: {description}"
        );
        assert_eq!(
            body,
            json!({ "error": "Valid email is required" }),
            "{description}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_already_subscribed_200_for_any_provider_status() -> Result<()> {
    for provider_status in [400u16, 409, 422] {
        let app = TestApp::spawn().await?;

        Mock::given(path(TestApp::members_path()))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(provider_status).set_body_json(json!({
                "title": "Member Exists",
                "status": provider_status,
                "detail": "a@b.com is already a list member. Use PUT to insert or update list members."
            })))
            .expect(1)
            .mount(&app.provider_server)
            .await;

        let res = app.post_newsletter(&json!({ "email": "a@b.com" })).await?;
        let (status, body) = status_and_body(res).await?;

        assert_eq!(
            status,
            StatusCode::OK,
            "provider answered {provider_status}"
        );
        assert_eq!(
            body,
            json!({ "message": "You are already subscribed!" }),
            "provider answered {provider_status}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_provider_failure_propagates_status_and_detail() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "title": "Forbidden",
            "status": 403,
            "detail": "a@b.com was permanently deleted and cannot be re-imported."
        })))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let res = app.post_newsletter(&json!({ "email": "a@b.com" })).await?;
    let (status, body) = status_and_body(res).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({ "error": "a@b.com was permanently deleted and cannot be re-imported." })
    );

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_provider_failure_without_detail_uses_fallback() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "title": "API Key Invalid" })),
        )
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let res = app.post_newsletter(&json!({ "email": "a@b.com" })).await?;
    let (status, body) = status_and_body(res).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Failed to subscribe" }));

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_missing_config_500_without_provider_call() -> Result<()> {
    let cases: [(fn(&mut newsletter_relay::config::AppConfig), &str); 3] = [
        (|c| c.provider_config.api_key = None, "api key"),
        (|c| c.provider_config.server_prefix = None, "server prefix"),
        (|c| c.provider_config.audience_id = None, "audience id"),
    ];

    for (strip, description) in cases {
        let app = TestApp::spawn_with(strip).await?;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&app.provider_server)
            .await;

        let res = app.post_newsletter(&json!({ "email": "a@b.com" })).await?;
        let (status, body) = status_and_body(res).await?;

        assert_eq!(
            status,
            StatusCode::INTERNAL_SERVER_ERROR,
            "missing {description}"
        );
        assert_eq!(
            body,
            json!({ "error": "Newsletter service configuration error" }),
            "missing {description}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_invalid_email_wins_over_missing_config() -> Result<()> {
    let app = TestApp::spawn_with(|c| c.provider_config.audience_id = None).await?;

    let res = app.post_newsletter(&json!({ "email": "not-an-email" })).await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_provider_unreachable_500() -> Result<()> {
    let app = TestApp::spawn().await?;

    // Slower than the 200ms provider timeout.
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(5)))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let res = app.post_newsletter(&json!({ "email": "a@b.com" })).await?;
    let request_id = res.headers().get("x-request-id").cloned();
    let (status, body) = status_and_body(res).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));
    assert!(request_id.is_some(), "Missing request id on a mapped error");

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_provider_non_json_error_500() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let res = app.post_newsletter(&json!({ "email": "a@b.com" })).await?;
    let (status, body) = status_and_body(res).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_malformed_body_500_without_provider_call() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider_server)
        .await;

    for payload in ["{ not json", "", "null", r#"{ "email": 42 }"#] {
        let res = app
            .http_client
            .post(app.newsletter_url())
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await?;
        let (status, body) = status_and_body(res).await?;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "payload: {payload}");
        assert_eq!(
            body,
            json!({ "error": "Internal server error" }),
            "payload: {payload}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_provider_non_json_success_500() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let res = app.post_newsletter(&json!({ "email": "a@b.com" })).await?;
    let (status, body) = status_and_body(res).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_ignores_request_content_type() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path(TestApp::members_path()))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
        .expect(2)
        .mount(&app.provider_server)
        .await;

    let cases = [None, Some("text/plain")];

    for content_type in cases {
        let mut req = app
            .http_client
            .post(app.newsletter_url())
            .body(r#"{"email":"a@b.com"}"#);
        if let Some(content_type) = content_type {
            req = req.header("Content-Type", content_type);
        }
        let (status, body) = status_and_body(req.send().await?).await?;

        assert_eq!(status, StatusCode::CREATED, "content type: {content_type:?}");
        assert_eq!(
            body,
            json!({ "message": "Successfully subscribed!" }),
            "content type: {content_type:?}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn newsletter_subscribe_non_object_body_400_without_provider_call() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider_server)
        .await;

    for request in [json!("a@b.com"), json!(["a@b.com"]), json!(42)] {
        let res = app.post_newsletter(&request).await?;
        let (status, body) = status_and_body(res).await?;

        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {request}");
        assert_eq!(
            body,
            json!({ "error": "Valid email is required" }),
            "payload: {request}"
        );
    }

    Ok(())
}
