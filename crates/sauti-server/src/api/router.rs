use axum::{extract::Request, middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::api::request_context::attach_request_context;
use crate::state::AppState;

/// Create the main API router.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            correlation_id = %request_id
        )
    });

    Router::new()
        .merge(crate::api::internal::router())
        .merge(crate::api::tts::router())
        .merge(crate::api::audio::router())
        .layer(trace_layer)
        .layer(middleware::from_fn(attach_request_context))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    struct TestServer {
        router: Router,
        // Keeps the storage dirs alive for the test's duration.
        _dir: tempfile::TempDir,
        temp_root: std::path::PathBuf,
        audio_root: std::path::PathBuf,
    }

    fn test_server() -> TestServer {
        let dir = tempfile::tempdir().expect("tempdir");
        let temp_root = dir.path().join("tmp");
        let audio_root = dir.path().join("audio");
        crate::storage::ensure_storage_dirs(&temp_root, &audio_root).expect("storage dirs");
        let state = AppState::new(temp_root.clone(), audio_root.clone());
        TestServer {
            router: create_router(state),
            _dir: dir,
            temp_root,
            audio_root,
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn dir_is_empty(dir: &std::path::Path) -> bool {
        std::fs::read_dir(dir).expect("read_dir").next().is_none()
    }

    // What the stand-in engine writes in place of real speech audio.
    #[cfg(unix)]
    const STUB_AUDIO: &[u8] = b"ID3 stub audio payload";

    /// A shell script that honors the engine's CLI contract: swallow the
    /// text on stdin and write a fixed payload to the `-o` destination.
    #[cfg(unix)]
    fn stub_engine(dir: &std::path::Path) -> sauti_core::SynthesisEngine {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("stub-tts.sh");
        std::fs::write(
            &script,
            concat!(
                "#!/bin/sh\n",
                "out=\"\"\n",
                "while [ \"$#\" -gt 0 ]; do\n",
                "  if [ \"$1\" = \"-o\" ]; then out=\"$2\"; shift; fi\n",
                "  shift\n",
                "done\n",
                "cat > /dev/null\n",
                "printf 'ID3 stub audio payload' > \"$out\"\n",
            ),
        )
        .expect("write stub engine");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("make stub executable");
        sauti_core::SynthesisEngine::new(script)
    }

    /// A server whose engine is the stub script and whose transcoder
    /// points at binaries that do not exist, so mp3 requests succeed and
    /// the duration probe takes its fallback.
    #[cfg(unix)]
    fn stubbed_server() -> TestServer {
        let dir = tempfile::tempdir().expect("tempdir");
        let temp_root = dir.path().join("tmp");
        let audio_root = dir.path().join("audio");
        crate::storage::ensure_storage_dirs(&temp_root, &audio_root).expect("storage dirs");
        let engine = stub_engine(dir.path());
        let transcoder = sauti_core::Transcoder::new("ffmpeg-unavailable", "ffprobe-unavailable");
        let state = AppState::with_engine(engine, transcoder, temp_root.clone(), audio_root.clone());
        TestServer {
            router: create_router(state),
            _dir: dir,
            temp_root,
            audio_root,
        }
    }

    #[tokio::test]
    async fn health_reports_ok_with_a_timestamp() {
        let server = test_server();
        let response = server.router.oneshot(get("/health")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body["time"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn languages_listing_contains_full_names_and_codes() {
        let server = test_server();
        let response = server
            .router
            .oneshot(get("/api/tts/languages"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["supported_languages"]["english"]["code"], "en");
        assert_eq!(body["supported_languages"]["hi"]["name"], "Hindi");
    }

    #[tokio::test]
    async fn empty_text_is_rejected_without_touching_disk() {
        let server = test_server();
        let response = server
            .router
            .oneshot(post_json("/api/tts", serde_json::json!({ "text": "   " })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid text");
        assert!(dir_is_empty(&server.temp_root));
        assert!(dir_is_empty(&server.audio_root));
    }

    #[tokio::test]
    async fn unsupported_language_is_a_400() {
        let server = test_server();
        let response = server
            .router
            .oneshot(post_json(
                "/api/tts",
                serde_json::json!({ "text": "Hello", "lang": "klingon" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Unsupported language");
        assert!(dir_is_empty(&server.temp_root));
    }

    #[tokio::test]
    async fn oversized_text_is_a_400() {
        let server = test_server();
        let response = server
            .router
            .oneshot(post_json(
                "/api/tts/complete",
                serde_json::json!({ "text": "x".repeat(5001) }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Text too long");
    }

    #[tokio::test]
    async fn duration_of_a_missing_file_is_a_404() {
        let server = test_server();
        let response = server
            .router
            .oneshot(get("/api/duration/nonexistent.mp3"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "File not found");
    }

    #[tokio::test]
    async fn saved_audio_round_trips_with_the_right_content_type() {
        let server = test_server();
        let saved = server.audio_root.join("speech_1.wav");
        std::fs::write(&saved, b"RIFF....WAVE").expect("write saved audio");

        let response = server
            .router
            .oneshot(get("/audio/speech_1.wav"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("audio/wav")
        );
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        assert_eq!(bytes.as_ref(), b"RIFF....WAVE");
    }

    #[tokio::test]
    async fn missing_saved_audio_is_a_404() {
        let server = test_server();
        let response = server
            .router
            .oneshot(get("/audio/nonexistent.mp3"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn path_traversal_in_audio_lookups_reads_as_missing() {
        let server = test_server();
        let response = server
            .router
            .oneshot(get("/audio/..%2Fescape.mp3"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn request_id_is_echoed_on_the_response() {
        let server = test_server();
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "corr-123")
            .body(Body::empty())
            .expect("request");

        let response = server.router.oneshot(request).await.expect("response");
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("corr-123")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn streamed_synthesis_returns_audio_and_reclaims_scratch_files() {
        let server = stubbed_server();
        let response = server
            .router
            .oneshot(post_json("/api/tts", serde_json::json!({ "text": "Hello" })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(
            headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("audio/mpeg")
        );
        assert_eq!(
            headers.get("X-Filename").and_then(|v| v.to_str().ok()),
            Some("speech_1.mp3")
        );
        assert_eq!(
            headers.get("X-File-Index").and_then(|v| v.to_str().ok()),
            Some("1")
        );
        // No ffprobe, so the fallback duration is reported.
        assert_eq!(
            headers.get("X-Audio-Duration").and_then(|v| v.to_str().ok()),
            Some("5.00")
        );

        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        assert_eq!(bytes.as_ref(), STUB_AUDIO);

        // The body has been consumed, so the scratch files are on the
        // grace-delayed deletion schedule.
        tokio::time::sleep(sauti_core::GRACE_DELAY + std::time::Duration::from_millis(400)).await;
        assert!(dir_is_empty(&server.temp_root));
        assert!(dir_is_empty(&server.audio_root));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn json_envelope_carries_the_audio_as_base64() {
        use base64::Engine as _;

        let server = stubbed_server();
        let response = server
            .router
            .oneshot(post_json(
                "/api/tts/complete",
                serde_json::json!({ "text": "Namaste", "lang": "hindi" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["file_info"]["filename"], "speech_1.mp3");
        assert_eq!(body["file_info"]["language"], "hi");
        assert_eq!(body["file_info"]["format"], "mp3");
        assert_eq!(body["file_info"]["size"], STUB_AUDIO.len() as u64);
        assert_eq!(body["audio"]["content_type"], "audio/mpeg");

        let data = body["audio"]["data"].as_str().expect("base64 audio");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(data)
            .expect("decode audio");
        assert_eq!(decoded, STUB_AUDIO);

        // The envelope handler releases its scratch files before replying.
        assert!(dir_is_empty(&server.temp_root));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_persists_the_artifact_for_later_fetching() {
        let server = stubbed_server();
        let response = server
            .router
            .clone()
            .oneshot(post_json(
                "/api/tts/save",
                serde_json::json!({ "text": "Hello" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["url"], "/audio/speech_1.mp3");

        let fetched = server
            .router
            .oneshot(get("/audio/speech_1.mp3"))
            .await
            .expect("response");
        assert_eq!(fetched.status(), StatusCode::OK);
        let bytes = fetched
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        assert_eq!(bytes.as_ref(), STUB_AUDIO);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn duration_of_a_saved_file_without_ffprobe_is_a_500() {
        let server = stubbed_server();
        std::fs::write(server.audio_root.join("speech_9.mp3"), STUB_AUDIO)
            .expect("write saved audio");

        let response = server
            .router
            .oneshot(get("/api/duration/speech_9.mp3"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Tool unavailable");
    }
}
