// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{convert::Infallible, path::Path, sync::Arc};

use http_body_util::{BodyExt, Full, combinators::UnsyncBoxBody};
use hyper::{
    Method, Request, Response, StatusCode, Uri,
    body::Bytes,
    header::{CONTENT_TYPE, HeaderValue},
};
use serde::Serialize;
use tdhctf_catalog::{Challenge, assembler::DEFAULT_FILES_URL_PREFIX};
use tower::ServiceExt;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
};

use crate::{
    host::{HostInputs, HostStrategy, resolve_host},
    store::CatalogStore,
};

pub type ApiBody = UnsyncBoxBody<Bytes, std::io::Error>;

pub struct AppState {
    pub store: CatalogStore,
    pub public_host: Option<String>,
    pub server_hostname: Option<String>,
    pub host_strategies: Vec<HostStrategy>,
    pub files_url_prefix: String,
    files: ServeDir,
}

impl AppState {
    pub fn new(
        store: CatalogStore,
        files_dir: &Path,
        public_host: Option<String>,
        server_hostname: Option<String>,
    ) -> Self {
        Self {
            store,
            public_host,
            server_hostname,
            host_strategies: HostStrategy::DEFAULT_ORDER.to_vec(),
            files_url_prefix: DEFAULT_FILES_URL_PREFIX.to_string(),
            files: ServeDir::new(files_dir).append_index_html_on_directories(false),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Health,
    ListChallenges,
    GetChallenge(&'a str),
    File(&'a str),
    NotFound,
}

fn route<'a>(path: &'a str, files_url_prefix: &str) -> Route<'a> {
    if let Some(file) = path
        .strip_prefix(files_url_prefix)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        return Route::File(file);
    }
    match path.trim_end_matches('/') {
        "/api/health" => Route::Health,
        "/api/challenges" => Route::ListChallenges,
        other => match other.strip_prefix("/api/challenges/") {
            Some(slug) if !slug.is_empty() && !slug.contains('/') => Route::GetChallenge(slug),
            _ => Route::NotFound,
        },
    }
}

#[derive(Serialize)]
struct ChallengesResponse {
    challenges: Vec<Challenge>,
}

#[derive(Serialize)]
struct ChallengeResponse {
    challenge: Challenge,
}

#[derive(Serialize)]
struct MessageResponse<'a> {
    message: &'a str,
}

pub async fn handle<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<ApiBody>, Infallible>
where
    B: Send + 'static,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let host = request_host(&req, &state);

    let response = match (&method, route(&path, &state.files_url_prefix)) {
        (_, Route::File(file)) => serve_file(req, file, &state).await,
        (&Method::GET, Route::Health) => {
            json_response(StatusCode::OK, &serde_json::json!({ "status": "ok" }))
        }
        (&Method::GET, Route::ListChallenges) => list_challenges(&host, &state).await,
        (&Method::GET, Route::GetChallenge(slug)) => get_challenge(&host, slug, &state).await,
        (_, Route::NotFound) => message(StatusCode::NOT_FOUND, "Not found"),
        _ => message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    };

    tracing::info!("{} {} {}", method, path, response.status().as_u16());
    Ok(response)
}

async fn list_challenges(host: &str, state: &AppState) -> Response<ApiBody> {
    match state.store.list().await {
        Ok(challenges) => {
            let challenges = challenges.into_iter().map(|c| c.with_host(host)).collect();
            json_response(StatusCode::OK, &ChallengesResponse { challenges })
        }
        Err(e) => internal_error(e),
    }
}

async fn get_challenge(host: &str, slug: &str, state: &AppState) -> Response<ApiBody> {
    match state.store.get(slug).await {
        Ok(Some(challenge)) => json_response(
            StatusCode::OK,
            &ChallengeResponse {
                challenge: challenge.with_host(host),
            },
        ),
        Ok(None) => message(StatusCode::NOT_FOUND, "Challenge not found"),
        Err(e) => internal_error(e),
    }
}

/// Resolved for every request, the right answer depends on how the client reached us.
fn request_host<B>(req: &Request<B>, state: &AppState) -> String {
    let inputs = HostInputs::from_request(
        state.public_host.as_deref(),
        state.server_hostname.as_deref(),
        req.headers(),
        req.uri(),
    );
    resolve_host(&state.host_strategies, &inputs)
}

async fn serve_file<B>(req: Request<B>, file: &str, state: &AppState) -> Response<ApiBody>
where
    B: Send + 'static,
{
    let (mut parts, body) = req.into_parts();
    parts.uri = match Uri::builder().path_and_query(format!("/{file}")).build() {
        Ok(uri) => uri,
        Err(_) => return message(StatusCode::BAD_REQUEST, "Invalid path"),
    };
    match state
        .files
        .clone()
        .oneshot(Request::from_parts(parts, body))
        .await
    {
        Ok(response) => response.map(BodyExt::boxed_unsync),
        Err(never) => match never {},
    }
}

fn full(bytes: impl Into<Bytes>) -> ApiBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

fn json_response(status: StatusCode, body: &impl Serialize) -> Response<ApiBody> {
    match serde_json::to_vec(body) {
        Ok(json) => {
            let mut resp = Response::new(full(json));
            *resp.status_mut() = status;
            resp.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            resp
        }
        Err(e) => internal_error(e),
    }
}

fn message(status: StatusCode, message: &str) -> Response<ApiBody> {
    json_response(status, &MessageResponse { message })
}

fn internal_error(e: impl std::fmt::Display) -> Response<ApiBody> {
    tracing::error!("Error handling request: {e}");
    let mut resp = Response::new(full(r#"{"message":"Unexpected server error"}"#));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

/// Cross-origin access for the landing page; any origin unless one is configured.
pub fn cors_layer(client_origin: Option<&str>) -> CorsLayer {
    let allow_origin = match client_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid CLIENT_ORIGIN, allowing any origin: {e}");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use http_body_util::Empty;
    use tdhctf_catalog::Assembler;

    use super::*;
    use crate::store::{ChallengeRepository, StoreError, tests::MemoryRepository};

    struct UnavailableRepository;

    #[async_trait::async_trait]
    impl ChallengeRepository for UnavailableRepository {
        async fn count(&self) -> Result<i64, StoreError> {
            Err(StoreError::Pool("postgres://catalog:hunter2@db/catalog".to_string()))
        }

        async fn insert_missing(&self, _challenges: &[Challenge]) -> Result<usize, StoreError> {
            Err(StoreError::Pool("postgres://catalog:hunter2@db/catalog".to_string()))
        }

        async fn list(&self) -> Result<Vec<Challenge>, StoreError> {
            Err(StoreError::Pool("postgres://catalog:hunter2@db/catalog".to_string()))
        }

        async fn get(&self, _slug: &str) -> Result<Option<Challenge>, StoreError> {
            Err(StoreError::Pool("postgres://catalog:hunter2@db/catalog".to_string()))
        }
    }

    struct Fixture {
        _temp_dir: tempfile::TempDir,
        state: Arc<AppState>,
    }

    fn fixture(public_host: Option<&str>) -> Fixture {
        let temp_dir = tempfile::tempdir().unwrap();
        let files_dir = temp_dir.path().join("files");
        let sc = files_dir.join("sc-01");
        std::fs::create_dir_all(&sc).unwrap();
        std::fs::write(sc.join("notes.txt"), b"intern notes").unwrap();
        std::fs::write(temp_dir.path().join("secret.txt"), b"do not serve").unwrap();

        let store = CatalogStore::Filesystem(Assembler::new(&files_dir));
        let state = AppState::new(
            store,
            &files_dir,
            public_host.map(str::to_string),
            None,
        );
        Fixture {
            _temp_dir: temp_dir,
            state: Arc::new(state),
        }
    }

    async fn call(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        host: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = call_raw(state, method, uri, host).await;
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn call_raw(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        host: Option<&str>,
    ) -> (StatusCode, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(host) = host {
            builder = builder.header("host", host);
        }
        let req = builder.body(Empty::<Bytes>::new()).unwrap();
        let resp = handle(req, state.clone()).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, bytes)
    }

    #[test]
    fn test_route_matching() {
        let prefix = DEFAULT_FILES_URL_PREFIX;
        assert_eq!(route("/api/health", prefix), Route::Health);
        assert_eq!(route("/api/challenges/", prefix), Route::ListChallenges);
        assert_eq!(
            route("/api/challenges/sc-01", prefix),
            Route::GetChallenge("sc-01")
        );
        assert_eq!(route("/api/challenges/a/b", prefix), Route::NotFound);
        assert_eq!(
            route("/static/challenge-files/sc-01/notes.txt", prefix),
            Route::File("sc-01/notes.txt")
        );
        assert_eq!(route("/static/challenge-filesX/a", prefix), Route::NotFound);
    }

    #[tokio::test]
    async fn test_health() {
        let f = fixture(None);
        let (status, body) = call(&f.state, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_unknown_challenge_is_404() {
        let f = fixture(None);
        let (status, body) =
            call(&f.state, Method::GET, "/api/challenges/does-not-exist", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Challenge not found");
    }

    #[tokio::test]
    async fn test_get_challenge() {
        let f = fixture(None);
        let (status, body) = call(&f.state, Method::GET, "/api/challenges/sc-01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["challenge"]["slug"], "sc-01");
        assert_eq!(body["challenge"]["files"][0]["name"], "notes.txt");
        assert_eq!(body["challenge"]["available"], true);
    }

    #[tokio::test]
    async fn test_request_host_is_substituted() {
        let f = fixture(None);
        let (status, body) = call(
            &f.state,
            Method::GET,
            "/api/challenges/re-01-confession-app",
            Some("10.0.0.5:4000"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["challenge"]["sshCredentials"]["host"], "10.0.0.5");
        assert_eq!(body["challenge"]["sshCredentials"]["port"], 2222);

        let (_, body) = call(&f.state, Method::GET, "/api/challenges/ai-01-artemis", None).await;
        assert_eq!(body["challenge"]["platformUrl"]["host"], "localhost");
    }

    #[tokio::test]
    async fn test_configured_host_wins_in_list() {
        let f = fixture(Some("ctf.example.org"));
        let (status, body) =
            call(&f.state, Method::GET, "/api/challenges", Some("10.0.0.5:4000")).await;
        assert_eq!(status, StatusCode::OK);
        let challenges = body["challenges"].as_array().unwrap();
        let with_endpoints: Vec<&serde_json::Value> = challenges
            .iter()
            .filter(|c| c.get("sshCredentials").is_some() || c.get("platformUrl").is_some())
            .collect();
        assert_eq!(with_endpoints.len(), 7);
        for c in with_endpoints {
            let endpoint = c.get("sshCredentials").or_else(|| c.get("platformUrl")).unwrap();
            assert_eq!(endpoint["host"], "ctf.example.org");
        }
    }

    #[tokio::test]
    async fn test_hosts_are_not_cached_between_requests() {
        let f = fixture(None);
        let uri = "/api/challenges/web-03-safehouse";
        let (_, first) = call(&f.state, Method::GET, uri, Some("10.0.0.5:4000")).await;
        let (_, second) = call(&f.state, Method::GET, uri, Some("ctf.lan")).await;
        assert_eq!(first["challenge"]["platformUrl"]["host"], "10.0.0.5");
        assert_eq!(second["challenge"]["platformUrl"]["host"], "ctf.lan");
    }

    #[tokio::test]
    async fn test_list_order_is_stable() {
        let f = fixture(None);
        let (_, first) = call_raw(&f.state, Method::GET, "/api/challenges", None).await;
        let (_, second) = call_raw(&f.state, Method::GET, "/api/challenges", None).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_persisted_store_through_api() {
        let temp_dir = tempfile::tempdir().unwrap();
        let assembler = Assembler::new(temp_dir.path());
        let store = CatalogStore::persisted(Arc::new(MemoryRepository::default()), &assembler)
            .await
            .unwrap();
        let state = Arc::new(AppState::new(store, temp_dir.path(), None, None));

        let (status, body) = call(&state, Method::GET, "/api/challenges/mob-02", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["challenge"]["points"], 500);
        let (status, _) = call(&state, Method::GET, "/api/challenges/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::Persisted(Arc::new(UnavailableRepository));
        let state = Arc::new(AppState::new(store, temp_dir.path(), None, None));

        for uri in ["/api/challenges", "/api/challenges/sc-01"] {
            let (status, bytes) = call_raw(&state, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body, serde_json::json!({ "message": "Unexpected server error" }));
            let text = String::from_utf8_lossy(&bytes);
            assert!(!text.contains("hunter2"));
            assert!(!text.contains("postgres://"));
        }
    }

    #[tokio::test]
    async fn test_static_file() {
        let f = fixture(None);
        let (status, bytes) = call_raw(
            &f.state,
            Method::GET,
            "/static/challenge-files/sc-01/notes.txt",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..], b"intern notes");
    }

    #[tokio::test]
    async fn test_static_traversal_is_rejected() {
        let f = fixture(None);
        let (status, bytes) = call_raw(
            &f.state,
            Method::GET,
            "/static/challenge-files/../secret.txt",
            None,
        )
        .await;
        assert_ne!(status, StatusCode::OK);
        assert_ne!(&bytes[..], b"do not serve");
    }

    #[tokio::test]
    async fn test_unknown_route_and_method() {
        let f = fixture(None);
        let (status, _) = call(&f.state, Method::GET, "/api/nothing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&f.state, Method::POST, "/api/challenges", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let f = fixture(None);
        let state = f.state.clone();
        let service = tower::ServiceBuilder::new()
            .layer(cors_layer(Some("https://ctf.example.org")))
            .service_fn(move |req: Request<Empty<Bytes>>| handle(req, state.clone()));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/challenges")
            .header("origin", "https://ctf.example.org")
            .header("access-control-request-method", "GET")
            .body(Empty::<Bytes>::new())
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "https://ctf.example.org"
        );
    }
}
