use relay_engine::{HttpPageSession, LoginCredentials, PageSession, ScrapeError, SessionSettings};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> LoginCredentials {
    LoginCredentials {
        email: "user@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

#[tokio::test]
async fn open_returns_decoded_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let session = HttpPageSession::new(SessionSettings::default()).unwrap();
    let snapshot = session.open(&format!("{}/post", server.uri())).await.unwrap();
    assert_eq!(snapshot.html, "<html>ok</html>");
    assert!(snapshot.final_url.ends_with("/post"));
}

#[tokio::test]
async fn open_surfaces_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let session = HttpPageSession::new(SessionSettings::default()).unwrap();
    let err = session
        .open(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::HttpStatus(404)));
}

#[tokio::test]
async fn login_cookies_are_replayed_on_later_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("email=user%40example.com"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sid=abc123; Path=/; HttpOnly")
                .set_body_string("ok"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .and(header("cookie", "sid=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>in</html>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let session = HttpPageSession::new(SessionSettings::default()).unwrap();
    session
        .submit_login(&format!("{}/login", server.uri()), &credentials())
        .await
        .unwrap();

    let snapshot = session.open(&format!("{}/post", server.uri())).await.unwrap();
    assert_eq!(snapshot.html, "<html>in</html>");
}

#[tokio::test]
async fn auth_state_round_trips_through_export_and_restore() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .and(header("cookie", "sid=restored"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>in</html>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let session = HttpPageSession::new(SessionSettings::default()).unwrap();
    assert_eq!(session.export_auth_state(), None);

    session.restore_auth_state(&json!({ "cookies": "sid=restored" }));
    assert_eq!(
        session.export_auth_state(),
        Some(json!({ "cookies": "sid=restored" }))
    );

    session.open(&format!("{}/post", server.uri())).await.unwrap();
}
