//! Import-to-state behavior end to end
//!
//! Each test registers a mock provider, runs an import through `Importer`,
//! and checks both the report and the resulting state store.

mod common;

use common::{provider_config, MockProvider};
use import_graph::addrs::AbsResourceInstance;
use import_graph::configs::Config;
use import_graph::providers::{ImportedResource, RefreshResponse, ResourceTypeSchema};
use import_graph::states::ResourceInstanceObject;
use import_graph::{ImportError, ImportTarget, Importer, ProviderRegistry, StateStore, WalkConfig};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn addr(s: &str) -> AbsResourceInstance {
    s.parse().unwrap()
}

fn instance(id: &str) -> ImportedResource {
    ImportedResource::new("aws_instance", json!({ "id": id }))
}

fn importer_with(provider: Arc<MockProvider>) -> Importer {
    let providers = ProviderRegistry::new();
    providers.register(provider_config(&[], "aws"), provider);
    Importer::new(Some(Config::default()), providers)
}

fn names(addrs: &[AbsResourceInstance]) -> Vec<String> {
    addrs.iter().map(|a| a.to_string()).collect()
}

/// One discovered object lands at the requested address with the refreshed attributes
#[tokio::test]
async fn test_import_single_object() {
    let provider = Arc::new(
        MockProvider::with_types(&["aws_instance"])
            .discovers("i-123", vec![instance("i-123")])
            .refreshes_to("aws_instance.web", json!({"id": "i-123", "ami": "ami-1"})),
    );
    let state = StateStore::new();

    let report = importer_with(provider)
        .import(&state, &[ImportTarget::new(addr("aws_instance.web"), "i-123")])
        .await
        .unwrap();

    assert!(report.success(), "{}", report.diagnostics);
    assert_eq!(state.len().await, 1);
    let entry = state.resource_instance(&addr("aws_instance.web")).await.unwrap();
    assert_eq!(entry.current.value, json!({"id": "i-123", "ami": "ami-1"}));
    assert_eq!(entry.provider, provider_config(&[], "aws"));
}

/// Several objects for one id get suffixed names in discovery order
#[tokio::test]
async fn test_import_cluster_suffixes_names() {
    let provider = Arc::new(MockProvider::with_types(&["aws_instance"]).discovers(
        "i-cluster",
        vec![instance("i-a"), instance("i-b"), instance("i-c")],
    ));
    let state = StateStore::new();

    let report = importer_with(provider)
        .import(&state, &[ImportTarget::new(addr("aws_instance.web"), "i-cluster")])
        .await
        .unwrap();

    assert!(report.success(), "{}", report.diagnostics);
    assert_eq!(
        names(&report.imported),
        vec!["aws_instance.web", "aws_instance.web-1", "aws_instance.web-2"]
    );
    for (address, id) in [
        ("aws_instance.web", "i-a"),
        ("aws_instance.web-1", "i-b"),
        ("aws_instance.web-2", "i-c"),
    ] {
        let entry = state.resource_instance(&addr(address)).await.unwrap();
        assert_eq!(entry.current.value, json!({ "id": id }));
        assert_eq!(entry.provider, provider_config(&[], "aws"));
    }
}

/// A discovered type name overrides the type in the target address
#[tokio::test]
async fn test_import_type_override() {
    let provider = Arc::new(
        MockProvider::with_types(&["aws_security_group", "aws_security_group_rule"]).discovers(
            "sg-1",
            vec![
                ImportedResource::new("aws_security_group", json!({"id": "sg-1"})),
                ImportedResource::new("aws_security_group_rule", json!({"id": "sgr-1"})),
                ImportedResource::new("aws_security_group_rule", json!({"id": "sgr-2"})),
            ],
        ),
    );
    let state = StateStore::new();

    let report = importer_with(provider)
        .import(&state, &[ImportTarget::new(addr("aws_security_group.sg"), "sg-1")])
        .await
        .unwrap();

    assert!(report.success(), "{}", report.diagnostics);
    assert_eq!(
        names(&state.addresses().await),
        vec![
            "aws_security_group.sg",
            "aws_security_group_rule.sg",
            "aws_security_group_rule.sg-1",
        ]
    );
}

/// Any collision aborts the whole batch, names every colliding address and writes nothing
#[tokio::test]
async fn test_conflicts_abort_batch_and_are_all_reported() {
    let provider = Arc::new(MockProvider::with_types(&["aws_instance"]).discovers(
        "i-cluster",
        vec![instance("i-a"), instance("i-b"), instance("i-c")],
    ));
    let state = StateStore::new();
    for existing in ["aws_instance.web", "aws_instance.web-2"] {
        state
            .set_resource_instance_current(
                &addr(existing),
                ResourceInstanceObject::ready(json!({"id": "old"})),
                &provider_config(&[], "aws"),
            )
            .await;
    }
    let before = state.snapshot().await;

    let report = importer_with(provider.clone())
        .import(&state, &[ImportTarget::new(addr("aws_instance.web"), "i-cluster")])
        .await
        .unwrap();

    assert!(!report.success());
    assert_eq!(
        report.diagnostics.iter().cloned().collect::<Vec<_>>(),
        vec![
            ImportError::state_conflict("aws_instance.web"),
            ImportError::state_conflict("aws_instance.web-2"),
        ]
    );
    assert!(report.imported.is_empty());
    assert_eq!(state.snapshot().await, before);
    assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 0);
    assert!(!state.is_claimed(&addr("aws_instance.web-1")).await);
}

/// An object without a type never reaches state; its siblings still do
#[tokio::test]
async fn test_missing_type_fails_only_that_object() {
    let provider = Arc::new(MockProvider::with_types(&["aws_instance"]).discovers(
        "i-cluster",
        vec![
            instance("i-a"),
            ImportedResource::new("", json!({"id": "i-b"})),
            instance("i-c"),
        ],
    ));
    let state = StateStore::new();

    let report = importer_with(provider.clone())
        .import(&state, &[ImportTarget::new(addr("aws_instance.web"), "i-cluster")])
        .await
        .unwrap();

    assert_eq!(
        report.diagnostics.iter().cloned().collect::<Vec<_>>(),
        vec![ImportError::ImportTypeMissing {
            address: "aws_instance.web-1".to_string()
        }]
    );
    assert_eq!(names(&report.imported), vec!["aws_instance.web", "aws_instance.web-2"]);
    assert!(!state.contains(&addr("aws_instance.web-1")).await);
    assert!(!state.is_claimed(&addr("aws_instance.web-1")).await);
    // the typeless object never reaches the provider
    assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 2);
}

/// An object that vanished before refresh is withheld; siblings commit
#[tokio::test]
async fn test_null_refresh_fails_verification() {
    let provider = Arc::new(
        MockProvider::with_types(&["aws_instance"])
            .discovers("i-cluster", vec![instance("i-a"), instance("i-b")])
            .refresh_response("aws_instance.web-1", RefreshResponse::found(serde_json::Value::Null)),
    );
    let state = StateStore::new();

    let report = importer_with(provider)
        .import(&state, &[ImportTarget::new(addr("aws_instance.web"), "i-cluster")])
        .await
        .unwrap();

    assert_eq!(
        report.diagnostics.iter().cloned().collect::<Vec<_>>(),
        vec![ImportError::ImportVerify {
            address: "aws_instance.web-1".to_string()
        }]
    );
    assert_eq!(names(&state.addresses().await), vec!["aws_instance.web"]);
}

/// Refresh failures are provider call errors confined to one object
#[tokio::test]
async fn test_refresh_error_is_per_object() {
    let provider = Arc::new(
        MockProvider::with_types(&["aws_instance"])
            .discovers("i-cluster", vec![instance("i-a"), instance("i-b")])
            .refresh_fails("aws_instance.web", "throttled"),
    );
    let state = StateStore::new();

    let report = importer_with(provider)
        .import(&state, &[ImportTarget::new(addr("aws_instance.web"), "i-cluster")])
        .await
        .unwrap();

    let errors: Vec<_> = report.diagnostics.iter().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        &ImportError::ProviderCall {
            operation: "refresh".to_string(),
            address: "aws_instance.web".to_string(),
            message: "throttled".to_string(),
        }
    );
    assert_eq!(names(&report.imported), vec!["aws_instance.web-1"]);
}

/// Importing the same thing twice fails every object the second time
#[tokio::test]
async fn test_reimport_fails_with_conflicts() {
    let provider = Arc::new(
        MockProvider::with_types(&["aws_instance"])
            .discovers("i-cluster", vec![instance("i-a"), instance("i-b")]),
    );
    let importer = importer_with(provider);
    let state = StateStore::new();
    let targets = [ImportTarget::new(addr("aws_instance.web"), "i-cluster")];

    let first = importer.import(&state, &targets).await.unwrap();
    assert!(first.success(), "{}", first.diagnostics);
    let serial = state.serial().await;

    let second = importer.import(&state, &targets).await.unwrap();
    assert_eq!(second.diagnostics.of_category("state_conflict").count(), 2);
    assert_eq!(second.diagnostics.len(), 2);
    assert!(second.imported.is_empty());
    assert_eq!(state.serial().await, serial);
}

/// A failing discovery only affects its own request
#[tokio::test]
async fn test_discovery_failure_is_isolated() {
    let provider = Arc::new(
        MockProvider::with_types(&["aws_instance"])
            .discovers("i-good", vec![instance("i-good")])
            .discover_fails("i-bad", "access denied"),
    );
    let state = StateStore::new();

    let report = importer_with(provider)
        .import(
            &state,
            &[
                ImportTarget::new(addr("aws_instance.bad"), "i-bad"),
                ImportTarget::new(addr("aws_instance.good"), "i-good"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(
        report.diagnostics.iter().cloned().collect::<Vec<_>>(),
        vec![ImportError::ProviderCall {
            operation: "discover".to_string(),
            address: "aws_instance.bad".to_string(),
            message: "access denied".to_string(),
        }]
    );
    assert_eq!(names(&report.imported), vec!["aws_instance.good"]);
    assert_eq!(report.batch_failures().count(), 1);
}

/// Types missing from the provider schema are rejected before refresh
#[tokio::test]
async fn test_unsupported_resource_type() {
    let provider = Arc::new(MockProvider::with_types(&["aws_instance"]).discovers(
        "vol-1",
        vec![ImportedResource::new("aws_ebs_volume", json!({"id": "vol-1"}))],
    ));
    let state = StateStore::new();

    let report = importer_with(provider.clone())
        .import(&state, &[ImportTarget::new(addr("aws_instance.web"), "vol-1")])
        .await
        .unwrap();

    assert_eq!(
        report.diagnostics.iter().cloned().collect::<Vec<_>>(),
        vec![ImportError::UnsupportedResourceType {
            provider: provider_config(&[], "aws").to_string(),
            type_name: "aws_ebs_volume".to_string(),
        }]
    );
    assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 0);
    assert!(state.is_empty().await);
}

/// Refreshed attributes are checked against the resource schema unless disabled
#[tokio::test]
async fn test_schema_validation() {
    let schema = ResourceTypeSchema::new(
        2,
        json!({
            "type": "object",
            "properties": { "ami": { "type": "string" } },
            "required": ["ami"]
        }),
    );
    let make_provider = || {
        Arc::new(
            MockProvider::default()
                .with_schema("aws_instance", schema.clone())
                .discovers("i-1", vec![instance("i-1")])
                .refreshes_to("aws_instance.web", json!({"id": "i-1", "ami": 5})),
        )
    };
    let targets = [ImportTarget::new(addr("aws_instance.web"), "i-1")];

    let state = StateStore::new();
    let report = importer_with(make_provider()).import(&state, &targets).await.unwrap();
    assert_eq!(report.diagnostics.of_category("schema_violation").count(), 1);
    assert!(state.is_empty().await);

    let state = StateStore::new();
    let lenient = WalkConfig::builder().validate_schemas(false).build().unwrap();
    let report = importer_with(make_provider())
        .with_walk_config(lenient)
        .import(&state, &targets)
        .await
        .unwrap();
    assert!(report.success(), "{}", report.diagnostics);
    let entry = state.resource_instance(&addr("aws_instance.web")).await.unwrap();
    assert_eq!(entry.current.schema_version, 2);
}

/// Private data survives refresh unless the provider replaces it
#[tokio::test]
async fn test_private_data_is_kept() {
    let provider = Arc::new(
        MockProvider::with_types(&["aws_instance"])
            .discovers(
                "i-cluster",
                vec![
                    instance("i-a").with_private(b"from-discovery".to_vec()),
                    instance("i-b").with_private(b"from-discovery".to_vec()),
                ],
            )
            .refresh_response(
                "aws_instance.web-1",
                RefreshResponse {
                    new_state: Some(json!({"id": "i-b"})),
                    private: Some(b"from-refresh".to_vec()),
                    warnings: vec!["deprecated attribute".to_string()],
                },
            ),
    );
    let state = StateStore::new();

    let report = importer_with(provider)
        .import(&state, &[ImportTarget::new(addr("aws_instance.web"), "i-cluster")])
        .await
        .unwrap();
    assert!(report.success(), "{}", report.diagnostics);

    let first = state.resource_instance(&addr("aws_instance.web")).await.unwrap();
    assert_eq!(first.current.private, b"from-discovery".to_vec());
    let second = state.resource_instance(&addr("aws_instance.web-1")).await.unwrap();
    assert_eq!(second.current.private, b"from-refresh".to_vec());
}

/// No discovered objects means nothing to import and nothing to report
#[tokio::test]
async fn test_empty_discovery() {
    let provider = Arc::new(MockProvider::with_types(&["aws_instance"]).discovers("i-none", vec![]));
    let state = StateStore::new();

    let report = importer_with(provider)
        .import(&state, &[ImportTarget::new(addr("aws_instance.web"), "i-none")])
        .await
        .unwrap();

    assert!(report.success());
    assert!(report.imported.is_empty());
    assert!(state.is_empty().await);
}
