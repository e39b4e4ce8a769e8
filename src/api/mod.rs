// src/api/mod.rs
pub mod health;
pub mod leaderboard;
pub mod scores;
pub mod telegram_auth;
pub mod users;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::crypto::InitDataValidator;
use crate::db::{ScoreStore, UserStore};

pub use telegram_auth::TelegramAuth;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub validator: Arc<InitDataValidator>,
    pub users: Arc<dyn UserStore>,
    pub scores: Arc<dyn ScoreStore>,
}

impl AppState {
    /// Builds the shared state. Fails when the bot token is missing, so a
    /// misconfigured process never serves the authenticated routes.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        scores: Arc<dyn ScoreStore>,
    ) -> anyhow::Result<Self> {
        let validator = InitDataValidator::new(&config.telegram_bot_token)?;
        Ok(Self {
            config,
            validator: Arc::new(validator),
            users,
            scores,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        .route("/api", get(health::root))
        .route("/api/", get(health::root))
        .route("/api/health", get(health::health_check))
        // Users (writes require Telegram init data)
        .route("/api/users", post(users::create_user))
        .route(
            "/api/users/{user_id}",
            get(users::get_user).put(users::update_user),
        )
        .route(
            "/api/users/telegram/{telegram_id}",
            get(users::get_user_by_telegram_id),
        )
        // Scores
        .route("/api/scores", post(scores::submit_score))
        .route("/api/scores/user/{user_id}", get(scores::get_user_scores))
        // Leaderboard & stats
        .route("/api/leaderboard", get(leaderboard::get_leaderboard))
        .route("/api/stats/user/{user_id}", get(leaderboard::get_user_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        if !config.is_development() {
            tracing::warn!("Permissive CORS outside development");
        }
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::DEFAULT_PORT,
        db::{InMemoryScoreStore, InMemoryUserStore},
        error::INVALID_INIT_DATA_MESSAGE,
    };
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const BOT_TOKEN: &str = "123456:test-bot-token";

    fn test_config(bot_token: &str) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            telegram_bot_token: bot_token.to_string(),
            cors_allowed_origins: "*".to_string(),
        }
    }

    fn state_with(config: Config) -> anyhow::Result<AppState> {
        AppState::new(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryScoreStore::new()),
        )
    }

    fn test_state() -> AppState {
        state_with(test_config(BOT_TOKEN)).unwrap()
    }

    fn init_data_for(state: &AppState, user_json: &str) -> String {
        let user = urlencoding::encode(user_json).into_owned();
        let data_check_string = format!("auth_date=1700000000\nuser={user}");
        let hash = state.validator.sign(&data_check_string);
        format!("user={user}&auth_date=1700000000&hash={hash}")
    }

    fn json_request(method: &str, uri: &str, init_data: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(init_data) = init_data {
            builder = builder.header("X-Telegram-Init-Data", init_data);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn create_user_request(init_data: Option<&str>, body: &str) -> Request<Body> {
        json_request("POST", "/api/users", init_data, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    /// Provisions telegram user `telegram_id` through the router and returns
    /// its init data and player id.
    async fn signed_in_player(app: &Router, state: &AppState, telegram_id: i64) -> (String, String) {
        let init_data = init_data_for(
            state,
            &format!(r#"{{"id":{telegram_id},"first_name":"P{telegram_id}"}}"#),
        );
        let response = app
            .clone()
            .oneshot(create_user_request(
                Some(&init_data),
                &format!(r#"{{"telegram_id":{telegram_id}}}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let user_id = body["data"]["id"].as_str().unwrap().to_string();
        (init_data, user_id)
    }

    async fn submit(app: &Router, init_data: &str, user_id: &str, score: i64) -> StatusCode {
        let body = format!(r#"{{"user_id":"{user_id}","score":{score},"game_duration":60}}"#);
        app.clone()
            .oneshot(json_request("POST", "/api/scores", Some(init_data), &body))
            .await
            .unwrap()
            .status()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn app_state_requires_bot_token() {
        assert!(state_with(test_config("")).is_err());
    }

    #[tokio::test]
    async fn root_reports_running() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Block Blast Game API is running!");
    }

    #[tokio::test]
    async fn health_reports_connected_store() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
        assert_eq!(body["users"], 0);
    }

    #[tokio::test]
    async fn create_user_without_init_data_is_unauthorized() {
        let app = build_router(test_state());
        let response = app
            .oneshot(create_user_request(None, r#"{"telegram_id":1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "AUTH_ERROR");
    }

    #[tokio::test]
    async fn create_user_with_valid_init_data_is_idempotent() {
        let state = test_state();
        let init_data = init_data_for(&state, r#"{"id":42,"first_name":"A","username":"blaster"}"#);
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(create_user_request(Some(&init_data), r#"{"telegram_id":42}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let first = json_body(response).await;
        assert_eq!(first["success"], true);
        assert_eq!(first["data"]["telegram_id"], 42);
        assert_eq!(first["data"]["username"], "blaster");
        assert_eq!(first["data"]["best_score"], 0);

        let response = app
            .oneshot(create_user_request(Some(&init_data), r#"{"telegram_id":42}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let second = json_body(response).await;
        assert_eq!(second["data"]["id"], first["data"]["id"]);
        assert_eq!(state.users.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_user_for_someone_else_is_forbidden() {
        let state = test_state();
        let init_data = init_data_for(&state, r#"{"id":42,"first_name":"A"}"#);
        let app = build_router(state);

        let response = app
            .oneshot(create_user_request(Some(&init_data), r#"{"telegram_id":43}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn rejection_does_not_reveal_failing_check() {
        let state = test_state();
        let valid = init_data_for(&state, r#"{"id":42,"first_name":"A"}"#);
        let tampered = valid.replace("auth_date=1700000000", "auth_date=1700000001");
        let app = build_router(state);

        let mut messages = Vec::new();
        for init_data in [tampered.as_str(), "auth_date=1", "garbage", "user=x&hash=00"] {
            let response = app
                .clone()
                .oneshot(create_user_request(Some(init_data), r#"{"telegram_id":42}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = json_body(response).await;
            messages.push(body["error"]["message"].as_str().unwrap().to_string());
        }

        assert!(messages.iter().all(|m| m == INVALID_INIT_DATA_MESSAGE));
    }

    #[tokio::test]
    async fn get_user_by_id_and_telegram_id() {
        let state = test_state();
        let app = build_router(state.clone());
        let (_, user_id) = signed_in_player(&app, &state, 42).await;

        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/users/{user_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["telegram_id"], 42);

        let response = app
            .clone()
            .oneshot(get_request("/api/users/telegram/42"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["id"], user_id.as_str());

        let response = app
            .oneshot(get_request("/api/users/telegram/999"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_user_id_is_not_found() {
        let app = build_router(test_state());
        let response = app
            .oneshot(get_request("/api/users/no-such-user"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_user_requires_owner() {
        let state = test_state();
        let app = build_router(state.clone());
        let (init_data, user_id) = signed_in_player(&app, &state, 42).await;
        let (other_init_data, _) = signed_in_player(&app, &state, 43).await;
        let uri = format!("/api/users/{user_id}");
        let body = r#"{"first_name":"Updated","last_name":"TestUser"}"#;

        let response = app
            .clone()
            .oneshot(json_request("PUT", &uri, None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(json_request("PUT", &uri, Some(&other_init_data), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(json_request("PUT", &uri, Some(&init_data), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = json_body(response).await;
        assert_eq!(updated["data"]["first_name"], "Updated");
        assert_eq!(updated["data"]["last_name"], "TestUser");
    }

    #[tokio::test]
    async fn submit_score_updates_stats_and_history() {
        let state = test_state();
        let app = build_router(state.clone());
        let (init_data, user_id) = signed_in_player(&app, &state, 42).await;

        assert_eq!(submit(&app, &init_data, &user_id, 5000).await, StatusCode::OK);
        assert_eq!(submit(&app, &init_data, &user_id, 1200).await, StatusCode::OK);
        assert_eq!(submit(&app, &init_data, "no-such-user", 10).await, StatusCode::NOT_FOUND);

        let user = state.users.get_user(&user_id).await.unwrap().unwrap();
        assert_eq!(user.games_played, 2);
        assert_eq!(user.total_score, 6200);
        assert_eq!(user.best_score, 5000);

        let response = app
            .oneshot(get_request(&format!("/api/scores/user/{user_id}?limit=1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history = json_body(response).await;
        let scores = history["data"].as_array().unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0]["score"], 1200);
    }

    #[tokio::test]
    async fn submit_score_rejects_missing_init_data_and_foreign_player() {
        let state = test_state();
        let app = build_router(state.clone());
        let (_, user_id) = signed_in_player(&app, &state, 42).await;
        let (other_init_data, _) = signed_in_player(&app, &state, 43).await;

        let body = format!(r#"{{"user_id":"{user_id}","score":10}}"#);
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/scores", None, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(submit(&app, &other_init_data, &user_id, 10).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn leaderboard_lists_scorers_in_rank_order() {
        let state = test_state();
        let app = build_router(state.clone());
        for (telegram_id, score) in [(1, 300), (2, 900), (3, 0)] {
            let (init_data, user_id) = signed_in_player(&app, &state, telegram_id).await;
            if score > 0 {
                assert_eq!(submit(&app, &init_data, &user_id, score).await, StatusCode::OK);
            }
        }

        let response = app
            .clone()
            .oneshot(get_request("/api/leaderboard"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let board = json_body(response).await;
        let entries = board["data"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["rank"], 1);
        assert_eq!(entries[0]["best_score"], 900);
        assert_eq!(entries[1]["rank"], 2);
        assert_eq!(entries[1]["best_score"], 300);

        let response = app
            .clone()
            .oneshot(get_request("/api/leaderboard?limit=1"))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["data"].as_array().unwrap().len(), 1);

        let response = app
            .oneshot(get_request("/api/leaderboard?limit=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn user_stats_reports_rank_and_recent_scores() {
        let state = test_state();
        let app = build_router(state.clone());
        let (leader_init, leader_id) = signed_in_player(&app, &state, 1).await;
        let (init_data, user_id) = signed_in_player(&app, &state, 2).await;
        assert_eq!(submit(&app, &leader_init, &leader_id, 1000).await, StatusCode::OK);
        for score in [100, 200, 300, 400, 500, 600] {
            assert_eq!(submit(&app, &init_data, &user_id, score).await, StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/stats/user/{user_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stats = json_body(response).await;
        assert_eq!(stats["data"]["rank"], 2);
        assert_eq!(stats["data"]["user"]["games_played"], 6);
        assert_eq!(stats["data"]["recent_scores"].as_array().unwrap().len(), 5);

        let response = app
            .oneshot(get_request("/api/stats/user/no-such-user"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/users")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn cors_echoes_only_listed_origins() {
        let mut config = test_config(BOT_TOKEN);
        config.cors_allowed_origins = "https://game.example, https://t.me".to_string();
        let app = build_router(state_with(config).unwrap());

        let response = app.clone().oneshot(preflight("https://t.me")).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("https://t.me")
        );

        let response = app.oneshot(preflight("https://evil.example")).await.unwrap();
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }
}
