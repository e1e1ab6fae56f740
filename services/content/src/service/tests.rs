use super::*;
use crate::message::memory::{ChannelPublisher, PublishedEvent, StaticUserDirectory};
use crate::message::{BusError, DisabledBus};
use crate::store::memory::InMemoryStore;
use tokio::sync::mpsc::UnboundedReceiver;

const CREATOR: &str = "a@b.org";

struct Harness {
    service: ContentService,
    store: Arc<InMemoryStore>,
    events: UnboundedReceiver<PublishedEvent>,
}

fn harness_with(directory: StaticUserDirectory, config: ServiceConfig) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let (publisher, events) = ChannelPublisher::new();
    let service = ContentService::new(
        config,
        store.clone(),
        Arc::new(directory),
        Arc::new(publisher),
    )
    .expect("service");
    Harness {
        service,
        store,
        events,
    }
}

fn harness() -> Harness {
    harness_with(
        StaticUserDirectory::new([CREATOR]),
        ServiceConfig::new("http://localhost:9560"),
    )
}

fn new_attributes(namespace: &str, name: &str) -> NewContentAttributes {
    NewContentAttributes {
        name: name.into(),
        namespace: namespace.into(),
        created_by: CREATOR.into(),
        content: r#"{"text":"hello"}"#.into(),
    }
}

async fn next_event(events: &mut UnboundedReceiver<PublishedEvent>) -> PublishedEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("event in time")
        .expect("channel open")
}

#[test]
fn config_validation_rejects_incomplete_settings() {
    let mut config = ServiceConfig::new("http://api");
    assert!(config.validate().is_ok());

    config.topics.update = String::new();
    assert!(matches!(
        config.validate(),
        Err(ServiceError::InvalidArgument(_))
    ));

    let mut config = ServiceConfig::new("");
    assert!(config.validate().is_err());
    config.base_url = "http://api".into();
    config.user_lookup_timeout = Duration::ZERO;
    assert!(config.validate().is_err());
}

#[tokio::test]
async fn construction_fails_fast_on_bad_config() {
    let result = ContentService::new(
        ServiceConfig::new(" "),
        Arc::new(InMemoryStore::new()),
        Arc::new(DisabledBus),
        Arc::new(DisabledBus),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn store_returns_envelope_and_publishes_create() {
    let mut h = harness();
    let envelope = h
        .service
        .store_content(new_attributes("dsc", "catalog"))
        .await
        .expect("store");

    let attributes = &envelope.data.attributes;
    assert_eq!(envelope.data.resource_type, "contents");
    assert_eq!(attributes.slug, "dsc-catalog");
    assert_eq!(attributes.updated_by, CREATOR);
    assert_eq!(attributes.created_at, attributes.updated_at);
    let checked_at = chrono::Utc::now();
    assert!(attributes.created_at <= checked_at);
    assert!(attributes.updated_at <= checked_at);
    assert_eq!(
        envelope.links.self_link,
        format!("http://localhost:9560/contents/{}", envelope.data.id)
    );

    let event = next_event(&mut h.events).await;
    assert_eq!(event.subject, "ContentService.Create");
    assert_eq!(event.event, envelope);
}

#[tokio::test]
async fn stored_content_is_readable_by_id_and_slug() {
    let h = harness();
    let created = h
        .service
        .store_content(new_attributes("dsc", "catalog"))
        .await
        .expect("store");
    let by_id = h.service.get_content(created.data.id).await.expect("by id");
    let by_slug = h
        .service
        .get_content_by_slug("dsc-catalog")
        .await
        .expect("by slug");
    assert_eq!(by_id, created);
    assert_eq!(by_slug, created);
}

#[tokio::test]
async fn duplicate_store_conflicts() {
    let h = harness();
    h.service
        .store_content(new_attributes("dsc", "catalog"))
        .await
        .expect("store");
    let err = h
        .service
        .store_content(new_attributes("DSC", "Catalog"))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn invalid_store_is_rejected_before_lookup() {
    // The directory would time out if it were consulted.
    let h = harness_with(
        StaticUserDirectory::new([CREATOR]).with_delay(Duration::from_secs(30)),
        ServiceConfig::new("http://api"),
    );
    let mut attributes = new_attributes("dsc", "catalog");
    attributes.created_by = "not-an-email".into();
    let err = h.service.store_content(attributes).await.expect_err("invalid");
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[tokio::test]
async fn store_rejects_names_that_slug_to_nothing() {
    let h = harness();
    let err = h
        .service
        .store_content(new_attributes("!!", "??"))
        .await
        .expect_err("empty slug");
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[tokio::test]
async fn unknown_creator_is_not_found_and_writes_nothing() {
    let h = harness();
    let mut attributes = new_attributes("dsc", "catalog");
    attributes.created_by = "stranger@b.org".into();
    let err = h.service.store_content(attributes).await.expect_err("unknown");
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(h.store.get_by_slug("dsc-catalog").await.expect("get").is_none());
}

#[tokio::test]
async fn directory_timeout_is_unavailable_and_writes_nothing() {
    let mut config = ServiceConfig::new("http://api");
    config.user_lookup_timeout = Duration::from_millis(50);
    let h = harness_with(
        StaticUserDirectory::new([CREATOR]).with_delay(Duration::from_secs(30)),
        config,
    );
    let err = h
        .service
        .store_content(new_attributes("dsc", "catalog"))
        .await
        .expect_err("timeout");
    match err {
        ServiceError::Unavailable(message) => assert!(message.contains("deadline exceeded")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.store.get_by_slug("dsc-catalog").await.expect("get").is_none());
}

#[tokio::test]
async fn directory_status_reply_is_unavailable() {
    let h = harness_with(
        StaticUserDirectory::failing(14, "user db down"),
        ServiceConfig::new("http://api"),
    );
    let err = h
        .service
        .store_content(new_attributes("dsc", "catalog"))
        .await
        .expect_err("upstream");
    assert!(matches!(err, ServiceError::Unavailable(_)));
}

#[tokio::test]
async fn disabled_bus_refuses_store() {
    let service = ContentService::new(
        ServiceConfig::new("http://api"),
        Arc::new(InMemoryStore::new()),
        Arc::new(DisabledBus),
        Arc::new(DisabledBus),
    )
    .expect("service");
    let err = service
        .store_content(new_attributes("dsc", "catalog"))
        .await
        .expect_err("disabled");
    assert!(matches!(err, ServiceError::Unavailable(_)));
    assert!(matches!(
        ServiceError::from(BusError::Disabled),
        ServiceError::Unavailable(_)
    ));
}

#[tokio::test]
async fn update_changes_payload_and_publishes() {
    let mut h = harness();
    let created = h
        .service
        .store_content(new_attributes("dsc", "catalog"))
        .await
        .expect("store");
    let _ = next_event(&mut h.events).await;

    let updated = h
        .service
        .update_content(
            created.data.id,
            ExistingContentAttributes {
                updated_by: "p@p.com".into(),
                content: r#"{"text":"jack"}"#.into(),
            },
        )
        .await
        .expect("update");
    let attributes = &updated.data.attributes;
    assert_eq!(attributes.content, r#"{"text":"jack"}"#);
    assert_eq!(attributes.updated_by, "p@p.com");
    assert_eq!(attributes.slug, created.data.attributes.slug);
    assert_eq!(attributes.created_by, CREATOR);
    assert!(attributes.updated_at > attributes.created_at);
    assert!(attributes.updated_at <= chrono::Utc::now());

    let event = next_event(&mut h.events).await;
    assert_eq!(event.subject, "ContentService.Update");
    assert_eq!(event.event, updated);
}

#[tokio::test]
async fn update_of_missing_id_is_not_found() {
    let h = harness();
    let err = h
        .service
        .update_content(
            99,
            ExistingContentAttributes {
                updated_by: "p@p.com".into(),
                content: "x".into(),
            },
        )
        .await
        .expect_err("missing");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn delete_removes_and_publishes() {
    let mut h = harness();
    let created = h
        .service
        .store_content(new_attributes("dsc", "catalog"))
        .await
        .expect("store");
    let _ = next_event(&mut h.events).await;

    h.service
        .delete_content(created.data.id)
        .await
        .expect("delete");
    let event = next_event(&mut h.events).await;
    assert_eq!(event.subject, "ContentService.Delete");
    assert_eq!(event.event.data.id, created.data.id);

    assert!(matches!(
        h.service.get_content(created.data.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        h.service.delete_content(created.data.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn publish_failure_does_not_fail_writes() {
    let (publisher, _events) = ChannelPublisher::failing();
    let service = ContentService::new(
        ServiceConfig::new("http://api"),
        Arc::new(InMemoryStore::new()),
        Arc::new(StaticUserDirectory::new([CREATOR])),
        Arc::new(publisher),
    )
    .expect("service");
    let created = service
        .store_content(new_attributes("dsc", "catalog"))
        .await
        .expect("store despite publish failure");
    service
        .update_content(
            created.data.id,
            ExistingContentAttributes {
                updated_by: CREATOR.into(),
                content: "v2".into(),
            },
        )
        .await
        .expect("update despite publish failure");
    service
        .delete_content(created.data.id)
        .await
        .expect("delete despite publish failure");
}

#[tokio::test]
async fn missing_slug_is_not_found() {
    let h = harness();
    assert!(matches!(
        h.service.get_content_by_slug("nope").await,
        Err(ServiceError::NotFound(_))
    ));
}
