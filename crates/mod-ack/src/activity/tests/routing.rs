use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::activity::domain::{AckSubmission, InstanceId};
use crate::activity::form::AckForm;
use crate::activity::router::{self, AckApi};
use crate::activity::service::AckModule;
use crate::activity::strings::{KeyScheme, StringKey};
use crate::config::ModuleConfig;

fn json_request(method: &str, uri: &str, payload: &impl serde::Serialize) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn add_route_creates_instances() {
    let (module, repository, _, _) = build_module();
    let router = router_with_module(module);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/ack/instances",
            &url_submission(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["id"], json!(1));
    assert!(repository.stored(InstanceId(1)).is_some());
}

#[tokio::test]
async fn add_route_accepts_prefixed_field_names() {
    let (module, repository, _, _) = build_module();
    let router = router_with_module(module);
    let payload = json!({
        "course": 3,
        "coursemodule": 24,
        "ackname": "Fire drill",
        "acktype": 3,
        "acktypeurl": "www.example.com/drill",
        "ackaccepttext": "Understood"
    });

    let response = router
        .oneshot(json_request("POST", "/api/v1/ack/instances", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = repository.stored(InstanceId(1)).expect("row");
    assert_eq!(stored.name, "Fire drill");
    assert_eq!(stored.accepttext, "Understood");
}

/// URL submission keyed by the field names the settings form publishes.
fn url_payload_from_form(module: &AckModule<MemoryRepository, MemoryFiles>) -> Value {
    let form = AckForm::new(module.strings(), module.config());
    let definition = form.definition();
    let group = definition
        .element(&form.field(StringKey::Parameters))
        .expect("parameter group");
    let (name_field, value_field) = match group.children.as_slice() {
        [name, value] => (name.name.clone(), value.name.clone()),
        other => panic!("expected two parameter fields, got {other:?}"),
    };

    let row = |name: &str, value: &str| {
        let mut pair = serde_json::Map::new();
        pair.insert(name_field.clone(), json!(name));
        pair.insert(value_field.clone(), json!(value));
        Value::Object(pair)
    };

    let mut payload = serde_json::Map::new();
    payload.insert("course".to_string(), json!(3));
    payload.insert("coursemodule".to_string(), json!(25));
    payload.insert(form.field(StringKey::Name), json!("Visitor policy"));
    payload.insert(form.field(StringKey::Type), json!(3));
    payload.insert(
        form.field(StringKey::TypeUrlField),
        json!("www.example.com/visitors"),
    );
    payload.insert(
        group.name.clone(),
        json!([row("lang", "en"), row("debug", "0"), row("", "orphan")]),
    );
    Value::Object(payload)
}

async fn post_form_parameters(scheme: KeyScheme) -> std::collections::BTreeMap<String, String> {
    let repository = Arc::new(MemoryRepository::default());
    let module = AckModule::with_clock(
        repository.clone(),
        Arc::new(MemoryFiles::default()),
        ModuleConfig {
            string_keys: scheme,
            ..module_config()
        },
        Arc::new(FixedClock::new(NOW)),
    );
    let payload = url_payload_from_form(&module);

    let response = router_with_module(module)
        .oneshot(json_request("POST", "/api/v1/ack/instances", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = repository.stored(InstanceId(1)).expect("row");
    assert_eq!(stored.name, "Visitor policy");
    parameters_of(&stored)
}

#[tokio::test]
async fn add_route_keeps_parameters_posted_under_form_field_names() {
    for scheme in [KeyScheme::Plain, KeyScheme::Prefixed] {
        let parameters = post_form_parameters(scheme).await;
        assert_eq!(
            parameters.into_iter().collect::<Vec<_>>(),
            vec![
                ("debug".to_string(), "0".to_string()),
                ("lang".to_string(), "en".to_string()),
            ],
            "{scheme:?}"
        );
    }
}

#[tokio::test]
async fn add_route_accepts_prefixed_parameter_group() {
    let (module, repository, _, _) = build_module();
    let router = router_with_module(module);
    let payload = json!({
        "course": 3,
        "coursemodule": 26,
        "ackname": "Lab portal",
        "acktype": 3,
        "acktypeurl": "www.example.com/lab",
        "ackparameters": [{"parameter": "lang", "variable": "en"}]
    });

    let response = router
        .oneshot(json_request("POST", "/api/v1/ack/instances", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = repository.stored(InstanceId(1)).expect("row");
    assert_eq!(parameters_of(&stored).get("lang").map(String::as_str), Some("en"));
}

#[tokio::test]
async fn add_route_rejects_invalid_submissions() {
    let (module, repository, _, _) = build_module();
    let router = router_with_module(module);
    let mut submission = url_submission();
    submission.name = "   ".to_string();
    submission.typeurl = Some("http://exa mple.com".to_string());

    let response = router
        .oneshot(json_request("POST", "/api/v1/ack/instances", &submission))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["errors"]["name"], "You must supply a value here.");
    assert_eq!(payload["errors"]["typeurl"], "Entered URL is invalid");
    assert_eq!(repository.len(), 0);
}

#[tokio::test]
async fn get_route_returns_stored_row() {
    let (module, _, _, _) = build_module();
    let id = module.add_instance(text_submission()).expect("stored");
    let router = router_with_module(module);

    let response = router
        .oneshot(empty_request("GET", &format!("/api/v1/ack/instances/{id}")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["type"], json!(1));
    assert_eq!(payload["content"], "<p>Always wear goggles.</p>");
    assert_eq!(payload["timecreated"], json!(NOW));
}

#[tokio::test]
async fn get_route_returns_not_found_for_unknown_instance() {
    let (module, _, _, _) = build_module();
    let router = router_with_module(module);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/ack/instances/77"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["id"], json!(77));
}

#[tokio::test]
async fn update_route_uses_path_instance() {
    let (module, repository, _, clock) = build_module();
    let id = module.add_instance(file_submission()).expect("stored");
    clock.advance(30);
    let router = router_with_module(module);

    let mut submission = file_submission();
    submission.name = "Employee handbook v2".to_string();
    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/ack/instances/{id}"),
            &submission,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["updated"], json!(true));
    let stored = repository.stored(id).expect("row");
    assert_eq!(stored.name, "Employee handbook v2");
    assert_eq!(stored.timemodified, NOW + 30);
}

#[tokio::test]
async fn update_route_returns_not_found_for_missing_row() {
    let (module, _, _, _) = build_module();
    let router = router_with_module(module);

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/ack/instances/5",
            &file_submission(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_route_reports_outcome() {
    let (module, repository, _, _) = build_module();
    let id = module.add_instance(file_submission()).expect("stored");
    let router = router_with_module(module);

    let response = router
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/v1/ack/instances/{id}")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(repository.len(), 0);

    let response = router
        .oneshot(empty_request("DELETE", &format!("/api/v1/ack/instances/{id}")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_route_returns_form_values() {
    let (module, _, _, _) = build_module();
    let id = module.add_instance(url_submission()).expect("stored");
    let router = router_with_module(module);

    let response = router
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/ack/instances/{id}/edit"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let submission: AckSubmission =
        serde_json::from_value(read_json_body(response).await).expect("submission payload");
    assert_eq!(submission.instance, Some(id));
    assert_eq!(submission.typeurl.as_deref(), Some("https://example.com/privacy"));
    assert_eq!(submission.parameters.len(), 2);
}

#[tokio::test]
async fn form_route_describes_settings() {
    let (module, _, _, _) = build_module();
    let router = router_with_module(module);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/ack/form"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["component"], "mod_ack");
    let names: Vec<&str> = payload["elements"]
        .as_array()
        .expect("elements")
        .iter()
        .filter_map(|element| element["name"].as_str())
        .collect();
    for expected in ["name", "type", "typetext", "typefile", "typeurl", "accepttext"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
}

#[tokio::test]
async fn url_validation_route_reports_messages() {
    let (module, _, _, _) = build_module();
    let router = router_with_module(module);

    let cases = [
        ("https://example.com/a?b=c#d", true),
        ("/local/page.php", true),
        ("www.example.com", true),
        ("http://exa mple.com", false),
    ];
    for (url, valid) in cases {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/ack/url/validate",
                &json!({ "url": url }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["valid"], json!(valid), "{url}");
        if !valid {
            assert_eq!(payload["error"], "Entered URL is invalid");
        } else {
            assert_eq!(payload["error"], Value::Null);
        }
    }
}

#[tokio::test]
async fn supports_route_answers_feature_queries() {
    let response = router::supports_handler(Path("mod_intro".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["supported"], json!(true));

    let response = router::supports_handler(Path("groups".to_string())).await;
    let payload = read_json_body(response).await;
    assert_eq!(payload["feature"], "groups");
    assert_eq!(payload["supported"], Value::Null);
}

#[tokio::test]
async fn pluginfile_route_serves_nothing() {
    let (module, _, _, _) = build_module();
    let router = router_with_module(module);

    let response = router
        .clone()
        .oneshot(empty_request(
            "GET",
            "/api/v1/ack/pluginfile/1021/70/3/21/content/0/manual.pdf",
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(empty_request(
            "GET",
            "/api/v1/ack/pluginfile/1021/50/3/21/content/0/manual.pdf",
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pluginfile_route_enforces_login() {
    let (module, _, _, _) = build_module();
    let router = crate::activity::ack_router(Arc::new(module), Arc::new(DenyAccess));

    let response = router
        .oneshot(empty_request(
            "GET",
            "/api/v1/ack/pluginfile/1021/70/3/21/content/0/manual.pdf",
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("message")
        .contains("not enrolled"));
}

#[tokio::test]
async fn add_handler_returns_internal_error_on_repository_failure() {
    let api = AckApi {
        module: Arc::new(AckModule::new(
            Arc::new(UnavailableRepository),
            Arc::new(MemoryFiles::default()),
            module_config(),
        )),
        guard: Arc::new(AllowAccess),
    };

    let response = router::add_handler::<UnavailableRepository, MemoryFiles>(
        State(api),
        axum::Json(file_submission()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "repository unavailable: database offline");
}

#[tokio::test]
async fn add_handler_reports_file_storage_failures() {
    let api = AckApi {
        module: Arc::new(AckModule::new(
            Arc::new(MemoryRepository::default()),
            Arc::new(FailingFiles),
            module_config(),
        )),
        guard: Arc::new(AllowAccess),
    };

    let response = router::add_handler::<MemoryRepository, FailingFiles>(
        State(api),
        axum::Json(text_submission()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
