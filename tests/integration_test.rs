use http::StatusCode;
use resource_engine::actions::ActionName;
use resource_engine::config::{Environment, ResponderConfig};
use resource_engine::lifecycle::{setup_tracing, ResourceSystem};
use resource_engine::model::{is_primary_key, Attributes};
use resource_engine::resource::Resource;
use resource_engine::responders::{Format, Response};
use serde_json::{json, Value};

fn params(value: Value) -> Attributes {
    value.as_object().cloned().expect("params must be an object")
}

fn json_body(response: Response) -> (StatusCode, Value) {
    match response {
        Response::Json { status, body } => (status, body),
        other => panic!("expected JSON response, got {other:?}"),
    }
}

fn programs() -> Resource {
    Resource::new("programs")
        .slugged(["name"])
        .permit(["name", "slug", "user"])
        .require(["name"])
}

/// Full round trip through real actors: create, look up by slug and by id,
/// update the slug, destroy.
#[tokio::test]
async fn test_full_resource_lifecycle_over_json() {
    setup_tracing();
    let system = ResourceSystem::start(vec![programs()], ResponderConfig::new(Environment::Test));
    let controller = system.controller("programs").expect("programs are registered");

    // Create
    let (status, body) = json_body(
        controller
            .handle(
                ActionName::Create,
                Format::Json,
                &params(json!({ "program": { "name": "CLU" } })),
            )
            .await,
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["slug"], "clu");
    let id = body["data"]["id"].as_str().expect("generated id").to_string();
    assert!(is_primary_key(&id));

    // Show by slug and by primary key, in either case
    let upper_id = id.to_uppercase();
    for identifier in ["clu", id.as_str(), upper_id.as_str()] {
        let (status, body) = json_body(
            controller
                .handle(ActionName::Show, Format::Json, &params(json!({ "id": identifier })))
                .await,
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id.as_str());
    }

    // Update with a custom slug, then without a slug key, then with a blank slug
    let (_, body) = json_body(
        controller
            .handle(
                ActionName::Update,
                Format::Json,
                &params(json!({ "id": "clu", "program": { "slug": "custom-slug" } })),
            )
            .await,
    );
    assert_eq!(body["data"]["slug"], "custom-slug");

    let (_, body) = json_body(
        controller
            .handle(
                ActionName::Update,
                Format::Json,
                &params(json!({
                    "id": "custom-slug",
                    "program": { "name": "Codified Likeness Utility" },
                })),
            )
            .await,
    );
    assert_eq!(body["data"]["slug"], "custom-slug");

    let (_, body) = json_body(
        controller
            .handle(
                ActionName::Update,
                Format::Json,
                &params(json!({ "id": id, "program": { "slug": "" } })),
            )
            .await,
    );
    assert_eq!(body["data"]["slug"], "codified-likeness-utility");

    // Index
    let (status, body) = json_body(
        controller
            .handle(ActionName::Index, Format::Json, &Attributes::new())
            .await,
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    // Destroy, then the entity is gone
    let (status, _) = json_body(
        controller
            .handle(
                ActionName::Destroy,
                Format::Json,
                &params(json!({ "id": "codified-likeness-utility" })),
            )
            .await,
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = json_body(
        controller
            .handle(ActionName::Show, Format::Json, &params(json!({ "id": id })))
            .await,
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["data"]["attribute_name"], "id");

    system.shutdown().await.expect("clean shutdown");
}

#[tokio::test]
async fn test_json_failures() {
    let config = ResponderConfig::new(Environment::Production);
    let system = ResourceSystem::start(vec![programs()], config);
    let controller = system.controller("programs").expect("programs are registered");

    let (status, body) = json_body(
        controller
            .handle(
                ActionName::Create,
                Format::Json,
                &params(json!({ "program": { "name": "", "slug": "nameless" } })),
            )
            .await,
    );
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["type"], "resource_engine.errors.failed_validation");

    let (status, _) = json_body(
        controller
            .handle(ActionName::Create, Format::Json, &params(json!({ "name": "CLU" })))
            .await,
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = json_body(
        controller
            .handle(ActionName::Show, Format::Json, &params(json!({ "id": "missing" })))
            .await,
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["data"]["attribute_value"], "missing");

    system.shutdown().await.expect("clean shutdown");
}

/// Concurrent creates of the same name race on the slug; the actor admits one.
#[tokio::test]
async fn test_concurrent_creates_cannot_duplicate_a_slug() {
    let system = ResourceSystem::start(vec![programs()], ResponderConfig::default());
    let controller = system.controller("programs").expect("programs are registered");
    let create = params(json!({ "program": { "name": "Tron" } }));

    let (first, second) = tokio::join!(
        controller.handle(ActionName::Create, Format::Json, &create),
        controller.handle(ActionName::Create, Format::Json, &create),
    );
    let mut statuses = vec![first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::UNPROCESSABLE_ENTITY]);

    let (_, body) = json_body(
        controller
            .handle(ActionName::Index, Format::Json, &Attributes::new())
            .await,
    );
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    system.shutdown().await.expect("clean shutdown");
}

#[tokio::test]
async fn test_html_create_and_destroy() {
    let system = ResourceSystem::start(vec![programs()], ResponderConfig::default());
    let controller = system.controller("programs").expect("programs are registered");

    match controller
        .handle(
            ActionName::Create,
            Format::Html,
            &params(json!({ "program": { "name": "Ram" } })),
        )
        .await
    {
        Response::Redirect(directive) => {
            assert_eq!(directive.path, "/programs/ram");
            assert_eq!(directive.status, StatusCode::FOUND);
        }
        other => panic!("expected redirect, got {other:?}"),
    }

    match controller
        .handle(
            ActionName::Create,
            Format::Html,
            &params(json!({ "program": { "name": " ", "slug": "blank" } })),
        )
        .await
    {
        Response::Render(directive) => {
            assert_eq!(directive.component, "Views::Resources::New");
            assert_eq!(directive.status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(directive.assigns["program"], json!({ "name": " ", "slug": "blank" }));
        }
        other => panic!("expected render, got {other:?}"),
    }

    match controller
        .handle(ActionName::Show, Format::Html, &params(json!({ "id": "ram" })))
        .await
    {
        Response::Render(directive) => {
            assert_eq!(directive.component, "Views::Resources::Show");
            assert_eq!(directive.assigns["program"]["name"], "Ram");
            assert_eq!(directive.layout.as_deref(), Some("page"));
        }
        other => panic!("expected render, got {other:?}"),
    }

    match controller
        .handle(ActionName::Destroy, Format::Html, &params(json!({ "id": "ram" })))
        .await
    {
        Response::Redirect(directive) => assert_eq!(directive.path, "/programs"),
        other => panic!("expected redirect, got {other:?}"),
    }

    match controller
        .handle(ActionName::Destroy, Format::Html, &params(json!({ "id": "ram" })))
        .await
    {
        Response::Render(directive) => {
            assert_eq!(directive.component, "Views::Pages::Missing");
            assert_eq!(directive.status, StatusCode::NOT_FOUND);
        }
        other => panic!("expected render, got {other:?}"),
    }

    system.shutdown().await.expect("clean shutdown");
}
