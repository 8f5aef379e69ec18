//! Login flow integration tests.
//!
//! The provider's token endpoint is a wiremock server; the proxy runs on a
//! real socket.

mod common;

use anyhow::Result;
use axum_extra::extract::cookie::Cookie;
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{TOKEN_PATH, TestGateway};
use tollgate_server::SessionCredential;

#[tokio::test]
async fn test_callback_exchanges_code_and_sets_cookie() -> Result<()> {
    let gateway = TestGateway::start().await?;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "client_id": "test-client",
            "client_secret": "test-secret",
            "code": "abc123",
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("access_token=gho_token&scope=repo&token_type=bearer"),
        )
        .expect(1)
        .mount(&gateway.upstream)
        .await;

    let resp = gateway
        .request(Method::GET, "/login-callback?code=abc123")
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 302);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "http://localhost:4200/select-repo"
    );

    let set_cookie = resp
        .headers()
        .get("set-cookie")
        .expect("session cookie should be set")
        .to_str()?
        .to_string();
    let cookie = Cookie::parse_encoded(set_cookie)?;
    assert_eq!(cookie.name(), "GITHUB_TOKEN");
    assert_eq!(cookie.http_only(), Some(true));

    let plaintext = gateway.cipher.decrypt(cookie.value())?;
    assert_eq!(plaintext, "abc123*|*gho_token*|*abc123");

    let credential = SessionCredential::open(cookie.value(), &gateway.cipher)?;
    assert_eq!(credential.code(), "abc123");
    assert_eq!(credential.access_token(), "gho_token");

    Ok(())
}

#[tokio::test]
async fn test_issued_cookie_authorizes_forwarding() -> Result<()> {
    let gateway = TestGateway::start().await?;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("access_token=gho_live"))
        .mount(&gateway.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer gho_live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .expect(1)
        .mount(&gateway.upstream)
        .await;

    let login = gateway
        .request(Method::GET, "/login-callback?code=xyz")
        .send()
        .await?;
    let set_cookie = login.headers().get("set-cookie").unwrap().to_str()?;
    let pair = set_cookie.split(';').next().unwrap().to_string();

    let is_auth = gateway
        .request(Method::GET, "/is-auth")
        .header("Cookie", &pair)
        .send()
        .await?;
    assert_eq!(is_auth.text().await?, "true");

    let resp = gateway
        .request(Method::GET, "/user")
        .header("Cookie", &pair)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["login"], "octocat");

    Ok(())
}

#[tokio::test]
async fn test_provider_error_status_fails_login() -> Result<()> {
    let gateway = TestGateway::start().await?;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad client"))
        .mount(&gateway.upstream)
        .await;

    let resp = gateway
        .request(Method::GET, "/login-callback?code=abc123")
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 500);
    assert!(resp.headers().get("set-cookie").is_none());
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body, json!({"error": "Failed retrieving token"}));

    Ok(())
}

#[tokio::test]
async fn test_provider_redirect_status_fails_login() -> Result<()> {
    let gateway = TestGateway::start().await?;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(304))
        .mount(&gateway.upstream)
        .await;

    let resp = gateway
        .request(Method::GET, "/login-callback?code=abc123")
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 500);
    assert!(resp.headers().get("set-cookie").is_none());

    Ok(())
}

#[tokio::test]
async fn test_bad_verification_code_fails_login() -> Result<()> {
    let gateway = TestGateway::start().await?;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "error=bad_verification_code&error_description=The+code+passed+is+incorrect",
        ))
        .mount(&gateway.upstream)
        .await;

    let resp = gateway
        .request(Method::GET, "/login-callback?code=stale")
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 500);
    assert!(resp.headers().get("set-cookie").is_none());
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "Failed retrieving token");

    Ok(())
}

#[tokio::test]
async fn test_cancelled_login_never_calls_provider() -> Result<()> {
    let gateway = TestGateway::start().await?;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("access_token=unused"))
        .expect(0)
        .mount(&gateway.upstream)
        .await;

    let resp = gateway
        .request(Method::GET, "/login-callback?error=access_denied")
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 302);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "http://localhost:4200/login?canceled=1"
    );

    Ok(())
}

#[tokio::test]
async fn test_login_is_stateless() -> Result<()> {
    let gateway = TestGateway::start().await?;

    let first = gateway.request(Method::GET, "/login").send().await?;
    let second = gateway.request(Method::GET, "/login").send().await?;

    assert_eq!(first.status().as_u16(), 302);
    assert!(first.headers().get("set-cookie").is_none());
    assert_eq!(
        first.headers().get("location"),
        second.headers().get("location")
    );

    Ok(())
}

#[tokio::test]
async fn test_repeated_code_uses_last_value() -> Result<()> {
    let gateway = TestGateway::start().await?;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_json(json!({
            "client_id": "test-client",
            "client_secret": "test-secret",
            "code": "second",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("access_token=gho_dup"))
        .expect(1)
        .mount(&gateway.upstream)
        .await;

    let resp = gateway
        .request(Method::GET, "/login-callback?code=first&code=second")
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 302);
    let set_cookie = resp.headers().get("set-cookie").unwrap().to_str()?.to_string();
    let cookie = Cookie::parse_encoded(set_cookie)?;
    let credential = SessionCredential::open(cookie.value(), &gateway.cipher)?;
    assert_eq!(credential.code(), "second");
    assert_eq!(credential.access_token(), "gho_dup");

    Ok(())
}
