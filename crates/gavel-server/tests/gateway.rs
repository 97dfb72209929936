// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! End-to-end coverage of the Gateway's HTTP surface, built against a real
//! router (no mocked handlers) but a [`FakeSandbox`] standing in for the
//! Blast Box's container runtime.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use gavel_core::AsyncControlPlane;
use gavel_sandbox::{BlastBox, FakeSandbox, SandboxConfig, SandboxRuntime};
use gavel_server::config::GatewayConfig;
use gavel_server::identities::IdentityAllowList;
use gavel_server::router::create_router;
use gavel_server::state::AppState;

const ACTOR: &str = "agent:coder";

fn identities(dir: &std::path::Path) -> IdentityAllowList {
    let path = dir.join("identities.json");
    std::fs::write(&path, format!(r#"{{"actors": ["{ACTOR}"]}}"#)).unwrap();
    IdentityAllowList::load(path.to_str().unwrap()).unwrap()
}

fn build_state(dir: &std::path::Path, sandbox: Arc<dyn SandboxRuntime>) -> AppState {
    let storage = gavel_storage::FileStorage::open(dir.join("ledger.json")).unwrap();
    let control_plane = AsyncControlPlane::new(storage);

    let blast_box = BlastBox::new(SandboxConfig {
        workspace: dir.join("workspace").to_string_lossy().into_owned(),
        timeout_seconds: 5,
        ..SandboxConfig::default()
    });
    std::fs::create_dir_all(dir.join("workspace")).unwrap();

    let mut config = GatewayConfig::default();
    config.human_api_key = "operator-secret".into();

    AppState::new(control_plane, blast_box, sandbox, identities(dir), &config)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn benign_read_is_approved_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(dir.path(), Arc::new(FakeSandbox::succeeding("")));
    let app = create_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/propose",
            json!({"actor_id": ACTOR, "action_type": "file_read", "content": "src/main.py"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["decision"], "APPROVED");
}

#[tokio::test]
async fn hard_denial_is_rejected_with_violations() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(dir.path(), Arc::new(FakeSandbox::succeeding("")));
    let app = create_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/propose",
            json!({"actor_id": ACTOR, "action_type": "bash", "content": "sudo rm -rf /"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert!(body["violations"].as_array().unwrap().iter().any(|v| v["rule"] == "NO_SUDO"));
}

#[tokio::test]
async fn unknown_actor_is_unauthenticated() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(dir.path(), Arc::new(FakeSandbox::succeeding("")));
    let app = create_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/propose",
            json!({"actor_id": "agent:mallory", "action_type": "file_read", "content": "x"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn escalation_then_approve_then_execute_runs_the_sandbox() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(dir.path(), Arc::new(FakeSandbox::succeeding("kubectl output")));
    let app = create_router(state);

    let propose_response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/propose",
            json!({
                "actor_id": ACTOR,
                "action_type": "bash",
                "content": "kubectl scale deployment web --replicas=3",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(propose_response.status(), StatusCode::ACCEPTED);
    let proposal = body_json(propose_response).await;
    let intent_event_id = proposal["intent_event_id"].clone();
    let policy_event_id = proposal["policy_event_id"].clone();

    let mut approve_req = json_request(
        "POST",
        "/approve",
        json!({"intent_event_id": intent_event_id, "policy_event_id": policy_event_id}),
    );
    approve_req
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer operator-secret".parse().unwrap());
    let approve_response = app.clone().oneshot(approve_req).await.unwrap();
    assert_eq!(approve_response.status(), StatusCode::OK);

    let resubmit_response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/propose",
            json!({
                "actor_id": ACTOR,
                "action_type": "bash",
                "content": "kubectl scale deployment web --replicas=3",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resubmit_response.status(), StatusCode::OK);
    let resubmitted = body_json(resubmit_response).await;
    assert_eq!(resubmitted["decision"], "APPROVED");
    let proposal_id = resubmitted["intent_event_id"].as_str().unwrap().to_string();

    let execute_response = app
        .clone()
        .oneshot(json_request("POST", "/execute", json!({"proposal_id": proposal_id})))
        .await
        .unwrap();
    assert_eq!(execute_response.status(), StatusCode::OK);
    let evidence = body_json(execute_response).await;
    assert_eq!(evidence["evidence_packet"]["stdout"], "kubectl output");
}

#[tokio::test]
async fn deny_blocks_execution_and_approve_requires_bearer() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(dir.path(), Arc::new(FakeSandbox::succeeding("")));
    let app = create_router(state);

    let propose_response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/propose",
            json!({"actor_id": ACTOR, "action_type": "bash", "content": "terraform apply -auto-approve"}),
        ))
        .await
        .unwrap();
    assert_eq!(propose_response.status(), StatusCode::ACCEPTED);
    let proposal = body_json(propose_response).await;

    // No bearer header at all: unauthenticated before any ledger state changes.
    let unauthed = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/deny",
            json!({
                "intent_event_id": proposal["intent_event_id"],
                "policy_event_id": proposal["policy_event_id"],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(unauthed.status(), StatusCode::UNAUTHORIZED);

    let mut deny_req = json_request(
        "POST",
        "/deny",
        json!({
            "intent_event_id": proposal["intent_event_id"],
            "policy_event_id": proposal["policy_event_id"],
            "reason": "not now",
        }),
    );
    deny_req
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer operator-secret".parse().unwrap());
    let deny_response = app.clone().oneshot(deny_req).await.unwrap();
    assert_eq!(deny_response.status(), StatusCode::OK);

    let execute_response = app
        .oneshot(json_request(
            "POST",
            "/execute",
            json!({"proposal_id": proposal["intent_event_id"]}),
        ))
        .await
        .unwrap();
    assert_eq!(execute_response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn unavailable_sandbox_surfaces_as_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(dir.path(), Arc::new(FakeSandbox::unavailable()));
    let app = create_router(state);

    let propose_response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/propose",
            json!({"actor_id": ACTOR, "action_type": "file_read", "content": "src/main.py"}),
        ))
        .await
        .unwrap();
    let proposal = body_json(propose_response).await;

    let execute_response = app
        .oneshot(json_request(
            "POST",
            "/execute",
            json!({"proposal_id": proposal["intent_event_id"]}),
        ))
        .await
        .unwrap();
    assert_eq!(execute_response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn health_reports_a_valid_chain() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(dir.path(), Arc::new(FakeSandbox::succeeding("")));
    let app = create_router(state);

    app.clone()
        .oneshot(json_request(
            "POST",
            "/propose",
            json!({"actor_id": ACTOR, "action_type": "file_read", "content": "src/main.py"}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["chain"]["chain_valid"], true);
    assert!(body["chain"]["total_events"].as_u64().unwrap() >= 2);
}
