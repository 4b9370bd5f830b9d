//! End-to-end project construction, immutability and save against the in-memory backend

use async_trait::async_trait;
use entitykit::{
    initialize, Backend, BackendError, Entity, EntityContext, EntityError, Lifecycle, MemoryBackend,
    ModelsConfig, Project, ProjectField, Record,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn demo_payload() -> Value {
    json!({
        "id": "p1",
        "parent": null,
        "original_parent": null,
        "category": "catX",
        "language": "langY",
        "author": "userZ",
        "name": "Demo",
        "description": "d",
        "tags": ["a", "b"],
        "is_dubbed": false,
        "is_edited": false,
        "resolution_x": 1920,
        "resolution_y": 1080,
        "slide_ordering_sequence": [0, 1],
        "slides": []
    })
}

async fn seeded_backend() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert(Record::new("Category", "catX").with_field("name", "Science")).await;
    backend.insert(Record::new("Language", "langY").with_field("name", "English")).await;
    backend.insert(Record::new("User", "userZ")).await;
    backend
}

fn context(backend: Arc<MemoryBackend>) -> EntityContext {
    EntityContext::new(backend, Arc::new(ModelsConfig::default()))
}

async fn construct(payload: &Value) -> (Result<Project, EntityError>, Arc<MemoryBackend>) {
    let backend = seeded_backend().await;
    let ctx = context(Arc::clone(&backend));
    let result = initialize::<Project>(payload.to_string(), &ctx).await;
    (result, backend)
}

#[tokio::test]
async fn demo_payload_constructs() {
    init_tracing();
    let (result, _) = construct(&demo_payload()).await;
    let project = result.unwrap();

    assert_eq!(project.id(), "p1");
    assert_eq!(project.parent(), None);
    assert_eq!(project.original_parent(), None);
    assert_eq!(project.category(), Some("catX"));
    assert_eq!(project.language(), Some("langY"));
    assert_eq!(project.author(), Some("userZ"));
    assert_eq!(project.name(), "Demo");
    assert_eq!(project.description(), "d");
    assert_eq!(project.tags().len(), 2);
    assert_eq!(project.tags(), ["a".to_string(), "b".to_string()]);
    assert!(!project.is_dubbed());
    assert!(!project.is_edited());
    assert_eq!(project.resolution_x(), 1920);
    assert_eq!(project.resolution_y(), 1080);
    assert_eq!(project.slide_ordering_sequence(), [0i64, 1]);
    assert!(project.slides().is_empty());
    assert_eq!(project.lifecycle(), Lifecycle::Validated);
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let mut payload = demo_payload();
    payload["category"] = json!("doesNotExist");

    let (result, backend) = construct(&payload).await;
    match result.unwrap_err() {
        EntityError::ReferenceNotFound { id, class_name } => {
            assert_eq!(id, "doesNotExist");
            assert_eq!(class_name, "Category");
        }
        other => panic!("unexpected error: {other}"),
    }
    // chain stops at the category; language and author are never looked up
    assert_eq!(backend.lookup_count(), 1);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (result, backend) = construct(&json!(null)).await;
    assert!(matches!(result, Err(EntityError::InvalidJson)));

    let ctx = context(Arc::clone(&backend));
    let err = initialize::<Project>("{not valid", &ctx).await.unwrap_err();
    assert!(matches!(err, EntityError::InvalidJson));
    assert_eq!(backend.lookup_count(), 0);
}

#[tokio::test]
async fn every_missing_required_field_is_named() {
    for field in ProjectField::VALIDATION_ORDER {
        if field == ProjectField::Slides {
            continue;
        }
        let name = ModelsConfig::default().project.field(field.role());
        let mut payload = demo_payload();
        payload.as_object_mut().unwrap().remove(&name);

        let (result, _) = construct(&payload).await;
        match result.unwrap_err() {
            EntityError::FieldNotPresent { field: missing, class_name } => {
                assert_eq!(missing, name);
                assert_eq!(class_name, "Project");
            }
            other => panic!("removing {name} gave unexpected error: {other}"),
        }
    }
}

#[tokio::test]
async fn wrong_types_name_field_and_types() {
    let cases = [
        ("id", json!(7), "number", "string"),
        ("name", json!(null), "null", "string"),
        ("description", json!(["d"]), "array", "string"),
        ("tags", json!(5), "number", "array of string"),
        ("tags", json!(["a", false]), "array containing boolean", "array of string"),
        ("is_dubbed", json!("no"), "string", "boolean"),
        ("is_edited", json!(0), "number", "boolean"),
        ("resolution_x", json!("1920"), "string", "integer"),
        ("resolution_y", json!(1080.5), "number", "integer"),
        ("resolution_x", json!(9_223_372_036_854_775_809u64), "number", "integer"),
        ("slide_ordering_sequence", json!([0, u64::MAX]), "array containing number", "array of integer"),
        ("slide_ordering_sequence", json!({}), "object", "array of integer"),
        ("slide_ordering_sequence", json!([0, "1"]), "array containing string", "array of integer"),
    ];

    for (name, value, found_type, expected_type) in cases {
        let mut payload = demo_payload();
        payload[name] = value;

        let (result, _) = construct(&payload).await;
        match result.unwrap_err() {
            EntityError::TypeMismatch { field, found, expected, .. } => {
                assert_eq!(field, name);
                assert_eq!(found, found_type, "found type for {name}");
                assert_eq!(expected, expected_type, "expected type for {name}");
            }
            other => panic!("{name} gave unexpected error: {other}"),
        }
    }
}

#[tokio::test]
async fn non_string_reference_makes_no_lookup() {
    let mut payload = demo_payload();
    payload["category"] = json!(42);

    let (result, backend) = construct(&payload).await;
    assert!(matches!(
        result,
        Err(EntityError::TypeMismatch { ref field, .. }) if field == "category"
    ));
    assert_eq!(backend.lookup_count(), 0);
}

#[tokio::test]
async fn null_references_are_accepted() {
    let mut payload = demo_payload();
    for name in ["parent", "original_parent", "category", "language", "author"] {
        payload[name] = Value::Null;
    }

    let (result, backend) = construct(&payload).await;
    let project = result.unwrap();
    assert_eq!(project.category(), None);
    assert_eq!(project.language(), None);
    assert_eq!(project.author(), None);
    assert_eq!(backend.lookup_count(), 0);
}

#[tokio::test]
async fn parent_resolves_against_projects() {
    let backend = seeded_backend().await;
    backend.insert(Record::new("Project", "p0")).await;
    let ctx = context(Arc::clone(&backend));

    let mut payload = demo_payload();
    payload["parent"] = json!("p0");
    payload["original_parent"] = json!("p0");
    let project = initialize::<Project>(payload.to_string(), &ctx).await.unwrap();
    assert_eq!(project.parent(), Some("p0"));
    assert_eq!(project.original_parent(), Some("p0"));

    payload["parent"] = json!("ghost");
    let err = initialize::<Project>(payload.to_string(), &ctx).await.unwrap_err();
    assert!(matches!(err, EntityError::ReferenceNotFound { ref class_name, .. } if class_name == "Project"));
}

#[tokio::test]
async fn first_failure_wins() {
    let mut payload = demo_payload();
    payload["language"] = json!("nowhere");
    payload.as_object_mut().unwrap().remove("name");
    payload["tags"] = json!(3);

    let (result, _) = construct(&payload).await;
    assert!(matches!(
        result,
        Err(EntityError::ReferenceNotFound { ref id, .. }) if id == "nowhere"
    ));
}

#[tokio::test]
async fn construction_is_idempotent() {
    let backend = seeded_backend().await;
    let ctx = context(backend);
    let payload = demo_payload().to_string();

    let first = initialize::<Project>(payload.as_str(), &ctx).await.unwrap();
    let second = initialize::<Project>(payload.as_str(), &ctx).await.unwrap();

    for field in ProjectField::ALL {
        assert_eq!(first.value_of(field), second.value_of(field), "{:?}", field);
    }
    assert_eq!(first.serialize_with_ids(), second.serialize_with_ids());
}

#[tokio::test]
async fn every_property_is_immutable() {
    let (result, _) = construct(&demo_payload()).await;
    let mut project = result.unwrap();

    for field in ProjectField::ALL {
        let before = project.value_of(field);
        match project.assign(field, json!("changed")) {
            Err(EntityError::ImmutableWrite { class_name, property }) => {
                assert_eq!(class_name, "Project");
                assert_eq!(property, field.property_name());
            }
            other => panic!("{:?} assignment gave {:?}", field, other),
        }
        assert_eq!(project.value_of(field), before);
    }
}

#[tokio::test]
async fn save_writes_every_field_and_reloads() {
    let backend = seeded_backend().await;
    let ctx = context(Arc::clone(&backend));
    let mut project = initialize::<Project>(demo_payload().to_string(), &ctx).await.unwrap();

    let saved = project.save(backend.as_ref()).await.unwrap();
    assert_eq!(project.lifecycle(), Lifecycle::Saved);
    assert!(saved.is_saved());
    assert_eq!(saved.class_name(), "Project");
    assert_eq!(Value::Object(saved.fields().clone()), demo_payload());

    let stored = backend.lookup_by_id("Project", "p1").await.unwrap();
    let reloaded = initialize::<Project>(stored, &ctx).await.unwrap();
    for field in ProjectField::ALL {
        assert_eq!(reloaded.value_of(field), project.value_of(field), "{:?}", field);
    }
    // records are trusted, so references come back unresolved
    assert!(reloaded.reference(ProjectField::Category).unwrap().target().is_none());
}

#[tokio::test]
async fn serialized_ids_round_trip_through_validation() {
    let backend = seeded_backend().await;
    let ctx = context(backend);
    let project = initialize::<Project>(demo_payload().to_string(), &ctx).await.unwrap();

    assert_eq!(project.serialize_with_ids(), demo_payload());
    let again = initialize::<Project>(project.serialize_with_ids().to_string(), &ctx).await.unwrap();
    assert_eq!(again.serialize_with_ids(), project.serialize_with_ids());
}

#[tokio::test]
async fn serialized_objects_expand_resolved_references() {
    let (result, _) = construct(&demo_payload()).await;
    let project = result.unwrap();

    let expanded = project.serialize_with_objects();
    assert_eq!(expanded["category"]["class_name"], "Category");
    assert_eq!(expanded["category"]["fields"]["name"], "Science");
    assert_eq!(expanded["language"]["id"], "langY");
    assert_eq!(expanded["parent"], Value::Null);
    assert_eq!(expanded["name"], "Demo");
}

#[tokio::test]
async fn renamed_fields_follow_configuration() {
    let mut models = ModelsConfig::default();
    models.project.fields.insert("NAME_FIELD".to_string(), "title".to_string());
    let backend = seeded_backend().await;
    let ctx = EntityContext::new(backend, Arc::new(models));

    let mut payload = demo_payload();
    let name = payload.as_object_mut().unwrap().remove("name").unwrap();
    payload["title"] = name;

    let project = initialize::<Project>(payload.to_string(), &ctx).await.unwrap();
    assert_eq!(project.name(), "Demo");
    assert_eq!(project.serialize_with_ids()["title"], "Demo");
}

#[derive(Debug)]
struct ReadOnlyBackend {
    inner: MemoryBackend,
}

#[async_trait]
impl Backend for ReadOnlyBackend {
    async fn lookup_by_id(&self, class_name: &str, id: &str) -> Result<Record, BackendError> {
        self.inner.lookup_by_id(class_name, id).await
    }

    async fn save(&self, _record: &Record) -> Result<Record, BackendError> {
        Err(BackendError::Other("read-only replica".to_string()))
    }
}

#[tokio::test]
async fn failed_save_surfaces_backend_error() {
    let inner = MemoryBackend::new();
    inner.insert(Record::new("Category", "catX")).await;
    inner.insert(Record::new("Language", "langY")).await;
    inner.insert(Record::new("User", "userZ")).await;
    let backend = Arc::new(ReadOnlyBackend { inner });
    let ctx = EntityContext::new(backend.clone(), Arc::new(ModelsConfig::default()));

    let mut project = initialize::<Project>(demo_payload().to_string(), &ctx).await.unwrap();
    let err = project.save(backend.as_ref()).await.unwrap_err();

    assert!(matches!(err, EntityError::Backend(BackendError::Other(_))));
    assert_eq!(project.lifecycle(), Lifecycle::Validated);
}

#[test]
fn projects_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Project>();
    assert_send_sync::<EntityContext>();
}
