//! HTTP surface tests driving the router directly

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, HeaderMap, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use keyword_alert_server::auth::AuthService;
    use keyword_alert_server::build_router;
    use keyword_alert_server::config::AuthConfig;
    use keyword_alert_server::models::AuthLevel;
    use keyword_alert_server::state::{AppState, CookieSettings};
    use keyword_alert_server::store::MemoryStore;

    fn setup_app() -> (Router, MemoryStore) {
        let store = MemoryStore::new();
        let service = AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            AuthConfig::new("api-test-secret").with_bcrypt_cost(10),
        );
        let state = AppState::new(
            Arc::new(service),
            CookieSettings {
                secure: true,
                max_age_seconds: 604800,
            },
        );
        (build_router(state, None), store)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn bearer_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn refresh_request(cookie_value: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/user/v1/token/refresh")
            .header(header::COOKIE, format!("refresh_token={}", cookie_value))
            .body(Body::empty())
            .unwrap()
    }

    /// Value of the refresh cookie from a `Set-Cookie` header
    fn refresh_cookie_value(headers: &HeaderMap) -> String {
        let set_cookie = headers
            .get(header::SET_COOKIE)
            .expect("response should set the refresh cookie")
            .to_str()
            .unwrap();
        let pair = set_cookie.split(';').next().unwrap();
        pair.strip_prefix("refresh_token=").unwrap().to_string()
    }

    async fn register(app: &Router, email: &str, nickname: &str) -> Uuid {
        let (status, _, body) = send(
            app,
            json_request(
                "POST",
                "/api/user/v1/",
                json!({"email": email, "password": "correct-horse", "nickname": nickname}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    async fn login(app: &Router, email: &str) -> (String, String) {
        let (status, headers, body) = send(
            app,
            json_request(
                "POST",
                "/api/user/v1/login",
                json!({"email": email, "password": "correct-horse"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["access_token"].as_str().unwrap().to_string(),
            refresh_cookie_value(&headers),
        )
    }

    #[tokio::test]
    async fn test_health_reports_in_memory_store() {
        let (app, _) = setup_app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "in-memory");
    }

    #[tokio::test]
    async fn test_register_returns_created_profile() {
        let (app, _) = setup_app();

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/user/v1/",
                json!({"email": "a@x.com", "password": "correct-horse", "nickname": "alice"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["auth_level"], 1);
        assert_eq!(body["is_active"], true);
        assert!(body.get("hashed_password").is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input_and_duplicates() {
        let (app, _) = setup_app();

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/user/v1/",
                json!({"email": "not-an-email", "password": "correct-horse", "nickname": "alice"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _, _) = send(
            &app,
            json_request(
                "POST",
                "/api/user/v1/",
                json!({"email": "a@x.com", "password": "short", "nickname": "alice"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        register(&app, "a@x.com", "alice").await;
        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/user/v1/",
                json!({"email": "a@x.com", "password": "correct-horse", "nickname": "bob"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_login_sets_refresh_cookie_and_no_store() {
        let (app, _) = setup_app();
        let user_id = register(&app, "a@x.com", "alice").await;

        let (status, headers, body) = send(
            &app,
            json_request(
                "POST",
                "/api/user/v1/login",
                json!({"email": "a@x.com", "password": "correct-horse"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], user_id.to_string());
        assert!(body["access_token"].as_str().unwrap().split('.').count() == 3);
        assert_eq!(body.as_object().unwrap().len(), 2);

        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");

        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("refresh_token="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Secure"));
        assert!(set_cookie.contains("SameSite=None"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("Max-Age=604800"));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_unauthorized() {
        let (app, _) = setup_app();
        register(&app, "a@x.com", "alice").await;

        let (status, headers, body) = send(
            &app,
            json_request(
                "POST",
                "/api/user/v1/login",
                json!({"email": "a@x.com", "password": "wrong-horse"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert!(headers.get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_me_requires_valid_bearer_token() {
        let (app, _) = setup_app();
        let user_id = register(&app, "a@x.com", "alice").await;
        let (access_token, _) = login(&app, "a@x.com").await;

        let (status, _, body) = send(
            &app,
            bearer_request("GET", "/api/user/v1/me", &access_token, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], user_id.to_string());
        assert_eq!(body["nickname"], "alice");

        let request = Request::builder()
            .uri("/api/user/v1/me")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "MISSING_TOKEN");

        let (status, _, body) = send(
            &app,
            bearer_request("GET", "/api/user/v1/me", "garbage", None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_refresh_rotates_cookie() {
        let (app, _) = setup_app();
        let user_id = register(&app, "a@x.com", "alice").await;
        let (_, first) = login(&app, "a@x.com").await;

        let (status, headers, body) = send(&app, refresh_request(&first)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], user_id.to_string());
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");

        let second = refresh_cookie_value(&headers);
        assert_ne!(first, second);

        let (status, _, _) = send(&app, refresh_request(&first)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(&app, refresh_request(&second)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refresh_without_cookie_is_unauthorized() {
        let (app, _) = setup_app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/user/v1/token/refresh")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie_and_revokes_refresh() {
        let (app, _) = setup_app();
        register(&app, "a@x.com", "alice").await;
        let (access_token, refresh) = login(&app, "a@x.com").await;

        let (status, headers, body) = send(
            &app,
            bearer_request("POST", "/api/user/v1/logout", &access_token, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());

        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("refresh_token="));
        assert!(set_cookie.contains("Max-Age=0"));

        let (status, _, _) = send(&app, refresh_request(&refresh)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_set_active_status_requires_admin() {
        let (app, store) = setup_app();
        let admin_id = register(&app, "admin@x.com", "admin").await;
        let target_id = register(&app, "b@x.com", "bob").await;
        let uri = format!("/api/user/v1/{}/active", target_id);

        let (user_token, _) = login(&app, "b@x.com").await;
        let (status, _, body) = send(
            &app,
            bearer_request("PATCH", &uri, &user_token, Some(json!({"is_active": false}))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        assert!(store.set_auth_level(admin_id, AuthLevel::ADMIN).await);
        let (admin_token, _) = login(&app, "admin@x.com").await;

        let (status, _, _) = send(
            &app,
            bearer_request("PATCH", &uri, &admin_token, Some(json!({"is_active": false}))),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // The deactivated user's live token stops working
        let (status, _, body) = send(
            &app,
            bearer_request("GET", "/api/user/v1/me", &user_token, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "ACCOUNT_INACTIVE");

        let unknown = format!("/api/user/v1/{}/active", Uuid::new_v4());
        let (status, _, _) = send(
            &app,
            bearer_request("PATCH", &unknown, &admin_token, Some(json!({"is_active": true}))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
