//! Integration tests for common Skeleto workflows.
//!
//! These tests wire the container the way an application would: a loader,
//! a set of scanned declarations and handlers invoked through the registry.

use serde_json::json;
use skeleto::error::BoxError;
use skeleto::prelude::*;
use skeleto_testing::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Db {
    url: String,
}

struct UserRepo {
    db: Arc<Db>,
}

impl UserRepo {
    fn find(&self, id: &str) -> serde_json::Value {
        json!({ "id": id, "source": self.db.url })
    }
}

fn app_loader(counter: Arc<AtomicUsize>) -> StaticLoader {
    StaticLoader::new()
        .register_value("connect", || Db { url: "memory://users".to_string() })
        .register("makeRepo", |deps: Dependencies| async move {
            let db = deps.by_name::<Db>("Db").ok_or("Db missing")?;
            let repo: Instance = Arc::new(UserRepo { db });
            Ok::<Instance, BoxError>(repo)
        })
        .register("makeGetUser", |deps: Dependencies| async move {
            let repo = deps.by_name::<UserRepo>("UserRepo").ok_or("UserRepo missing")?;
            let handler = action(move |_ctx, req| {
                let repo = repo.clone();
                async move {
                    let id = req["id"].as_str().unwrap_or_default().to_string();
                    Ok::<_, BoxError>(repo.find(&id))
                }
            });
            let instance: Instance = Arc::new(handler);
            Ok::<Instance, BoxError>(instance)
        })
        .register_value("counting", move || {
            let counter = counter.clone();
            Interceptor::for_actions(move |handler, _| {
                let counter = counter.clone();
                action(move |ctx, req| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    handler(ctx, req)
                })
            })
        })
        .register_value("logging", Interceptor::logging)
}

fn app_declarations() -> Vec<Declaration> {
    vec![
        Declaration::new("makeGetUser", "GetUser")
            .param("UserRepo")
            .doc("@Handler\n@Route /users/:id"),
        Declaration::new("counting", "Counting").doc("@Interceptor {\"ordinal\": 1}"),
        Declaration::new("makeRepo", "UserRepo").param("Db").doc("Users table access.\n@Factory"),
        Declaration::new("connect", "Db").doc("@Factory"),
        Declaration::new("logging", "Logging").doc("@Interceptor {\"ordinal\": 0}"),
    ]
}

// =============================================================================
// Application Wiring Tests
// =============================================================================

#[tokio::test]
async fn test_application_wiring() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = Container::new(Arc::new(app_loader(counter.clone())))
        .start(app_declarations())
        .await
        .unwrap();

    assert_complete(&registry);
    assert_warning_count(&registry, 0);

    let order: Vec<String> = registry.names().into_iter().map(String::from).collect();
    assert_precedes(&order, "Db", "UserRepo");
    assert_precedes(&order, "UserRepo", "GetUser");
    assert_precedes(&order, "Logging", "GetUser");

    let route = registry.descriptor("GetUser").and_then(|d| d.annotation("Route")).unwrap();
    assert_eq!(route.text(), Some("/users/:id"));

    let get_user = registry.get_as::<ActionHandler>("GetUser").unwrap();
    let res = get_user(Context::new(), json!({ "id": "42" })).await.unwrap();
    assert_eq!(res, json!({ "id": "42", "source": "memory://users" }));

    get_user(Context::new(), json!({ "id": "7" })).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_registry_queries() {
    let registry = Container::new(Arc::new(app_loader(Arc::new(AtomicUsize::new(0)))))
        .start(app_declarations())
        .await
        .unwrap();

    assert_eq!(registry.of_kind(Kind::Factory).count(), 2);
    assert_eq!(registry.of_kind(Kind::Interceptor).count(), 2);
    assert_eq!(registry.handlers().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["GetUser"]);
    assert_eq!(registry.get_as::<Db>("Db").unwrap().url, "memory://users");
    assert!(registry.get_as::<Db>("UserRepo").is_none());
}

#[tokio::test]
async fn test_missing_dependency_is_reported_before_instantiation() {
    let loader = MockLoader::new();
    let err = Container::new(Arc::new(loader.clone()))
        .start(vec![
            DeclarationBuilder::factory("Db").build(),
            DeclarationBuilder::handler("GetUser").param("UserRepo").build(),
        ])
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Component GetUser cannot be resolved because it depends on UserRepo which is not defined"
    );
    assert_eq!(loader.call_count(), 0);
}

#[tokio::test]
async fn test_cycle_is_rejected() {
    let err = Container::new(Arc::new(MockLoader::new()))
        .start(vec![
            DeclarationBuilder::factory("A").param("B").build(),
            DeclarationBuilder::factory("B").param("A").build(),
        ])
        .await
        .unwrap_err();

    match err {
        Error::CircularDependency { path } => assert_eq!(path, vec!["A", "B", "A"]),
        other => panic!("expected a cycle, got {:?}", other),
    }
}

#[tokio::test]
async fn test_restart_into_same_registry() {
    let container = Container::new(Arc::new(app_loader(Arc::new(AtomicUsize::new(0)))));
    let mut registry = InstanceRegistry::new();

    container.start_into(app_declarations(), &mut registry).await.unwrap();
    assert_eq!(registry.len(), 5);

    container
        .start_into(
            vec![
                Declaration::new("connect", "Db").doc("@Factory"),
                Declaration::new("makeRepo", "UserRepo").param("Db").doc("@Factory"),
            ],
            &mut registry,
        )
        .await
        .unwrap();

    assert_complete(&registry);
    assert_order(&registry, &["Db", "UserRepo"]);
    assert!(registry.get("GetUser").is_none());
}

// =============================================================================
// Declaration Extraction Tests
// =============================================================================

#[tokio::test]
async fn test_untagged_declarations_are_ignored() {
    let loader = MockLoader::new();
    let registry = Container::new(Arc::new(loader.clone()))
        .start(vec![
            DeclarationBuilder::new("Helper").build(),
            DeclarationBuilder::factory("Db").build(),
        ])
        .await
        .unwrap();

    assert_order(&registry, &["Db"]);
    assert!(!loader.was_called("implHelper"));
}

#[tokio::test]
async fn test_custom_kind_tags() {
    let options = ContainerOptions::new().tags(skeleto::KindTags {
        factory: "Provider".to_string(),
        interceptor: "Around".to_string(),
        handler: "Endpoint".to_string(),
    });

    let registry = Container::new(Arc::new(MockLoader::new()))
        .with_options(options)
        .start(vec![
            Declaration::new("implDb", "Db").doc("@Provider"),
            Declaration::new("implPing", "Ping").param("Db").doc("@Endpoint"),
            Declaration::new("implOld", "Old").doc("@Factory"),
        ])
        .await
        .unwrap();

    assert_order(&registry, &["Db", "Ping"]);
    assert!(registry.descriptor("Ping").unwrap().is_handler());
}

#[tokio::test]
async fn test_mock_loader_sees_dependency_order() {
    let loader = MockLoader::new();
    let declarations = vec![
        DeclarationBuilder::factory("Service").param("Repo").param("Mailer").build(),
        DeclarationBuilder::factory("Mailer").build(),
        DeclarationBuilder::factory("Repo").param("Db").build(),
        DeclarationBuilder::factory("Db").build(),
    ];

    let registry = Container::new(Arc::new(loader.clone()))
        .start(declarations.clone())
        .await
        .unwrap();

    let extracted = Container::new(Arc::new(MockLoader::new()))
        .extract(declarations)
        .unwrap();
    let descriptors: Vec<ComponentDescriptor> = extracted.descriptors().cloned().collect();
    let order: Vec<String> = registry.names().into_iter().map(String::from).collect();
    assert_topological(&order, &descriptors);

    let service = loader.calls().into_iter().find(|c| c.declaration == "implService").unwrap();
    assert_eq!(service.dependencies, vec!["Repo", "Mailer"]);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[cfg(feature = "config")]
#[tokio::test]
async fn test_container_from_config() {
    use skeleto::skeleto_config::{ConfigBuilder, FileFormat};

    let config = ConfigBuilder::new()
        .source(
            FileFormat::Toml,
            r#"
            [container]
            duplicates = "fail"
            "#,
        )
        .unwrap()
        .build()
        .unwrap();

    let err = Container::new(Arc::new(MockLoader::new()))
        .with_options(config.container)
        .start(vec![
            DeclarationBuilder::factory("Db").build(),
            DeclarationBuilder::factory("Db").named("otherDb").build(),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateIdentity { .. }));
}
