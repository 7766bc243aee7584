use std::path::Path;

use sema::{
    Id, MetaQueryApi, MetaValue, MetadataApi, OwnerRef, SemaConfig, SemaResult, SemaStore,
};
use serde_json::json;
use tempfile::tempdir;

async fn open(base: &Path) -> SemaResult<SemaStore> {
    let config = SemaConfig::default_sqlite(base.join("sema.sqlite").to_string_lossy());
    SemaStore::connect(&config, base).await
}

/// Two "note" owners: one red/medium, one blue/medium.
async fn seed(store: &SemaStore) -> SemaResult<(OwnerRef, OwnerRef)> {
    let red = OwnerRef::new("note", Id::new());
    let blue = OwnerRef::new("note", Id::new());
    store.set_meta(&red, "color", MetaValue::from("red")).await?;
    store.set_meta(&red, "size", MetaValue::from("M")).await?;
    store.set_meta(&blue, "color", MetaValue::from("blue")).await?;
    store.set_meta(&blue, "size", MetaValue::from("M")).await?;
    Ok((red, blue))
}

fn contains(ids: &[Id], owner: &OwnerRef) -> bool {
    ids.contains(&owner.owner_id)
}

#[tokio::test]
async fn and_relation_requires_every_predicate() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let (red, blue) = seed(&store).await?;

    let filters = vec![
        json!({"key": "color", "value": "red"}),
        json!({"key": "size", "value": "M"}),
    ];
    let ids = store.find_owner_ids("note", &filters, "AND").await?;
    assert!(contains(&ids, &red));
    assert!(!contains(&ids, &blue));

    let none = store
        .find_owner_ids("note", &[json!({"key": "color", "value": "green"})], "AND")
        .await?;
    assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn or_relation_matches_any_predicate() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let (red, blue) = seed(&store).await?;

    // Red has no blue color but matches on size alone.
    let filters = vec![
        json!({"key": "color", "value": "blue"}),
        json!({"key": "size", "value": "M"}),
    ];
    let ids = store.find_owner_ids("note", &filters, "OR").await?;
    assert!(contains(&ids, &red));
    assert!(contains(&ids, &blue));
    Ok(())
}

#[tokio::test]
async fn single_predicate_or_behaves_as_and() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let (red, blue) = seed(&store).await?;

    let filters = vec![json!({"key": "color", "value": "red"})];
    let with_or = store.find_owner_ids("note", &filters, "OR").await?;
    let with_and = store.find_owner_ids("note", &filters, "AND").await?;
    assert_eq!(with_or, with_and);
    assert!(contains(&with_or, &red));
    assert!(!contains(&with_or, &blue));
    Ok(())
}

#[tokio::test]
async fn unknown_relation_token_behaves_as_and() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let (red, blue) = seed(&store).await?;

    let filters = vec![
        json!({"key": "color", "value": "red"}),
        json!({"key": "size", "value": "M"}),
    ];
    let ids = store.find_owner_ids("note", &filters, "XOR").await?;
    assert!(contains(&ids, &red));
    assert!(!contains(&ids, &blue));
    Ok(())
}

#[tokio::test]
async fn empty_filter_list_matches_every_owner_of_the_type() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let (red, blue) = seed(&store).await?;
    let other = OwnerRef::new("task", Id::new());
    store.set_meta(&other, "color", MetaValue::from("red")).await?;

    let ids = store.find_owner_ids("note", &[], "AND").await?;
    assert_eq!(ids.len(), 2);
    assert!(contains(&ids, &red));
    assert!(contains(&ids, &blue));
    assert!(!contains(&ids, &other));
    Ok(())
}

#[tokio::test]
async fn malformed_items_do_not_affect_the_result() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let (red, blue) = seed(&store).await?;

    let filters = vec![
        json!({"key": "color", "value": "red"}),
        json!({"bad": "item"}),
        json!("stray"),
    ];
    let ids = store.find_owner_ids("note", &filters, "AND").await?;
    assert!(contains(&ids, &red));
    assert!(!contains(&ids, &blue));
    Ok(())
}

#[tokio::test]
async fn not_equal_comparator_excludes_the_match() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let (red, blue) = seed(&store).await?;

    let filters = vec![json!({"key": "color", "value": "red", "comparator": "!="})];
    let ids = store.find_owner_ids("note", &filters, "AND").await?;
    assert!(!contains(&ids, &red));
    assert!(contains(&ids, &blue));
    Ok(())
}

#[tokio::test]
async fn ordering_comparators_follow_text_collation() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let low = OwnerRef::new("note", Id::new());
    let high = OwnerRef::new("note", Id::new());
    store.set_meta(&low, "rank", MetaValue::from("a")).await?;
    store.set_meta(&high, "rank", MetaValue::from("c")).await?;

    let below = store
        .find_owner_ids("note", &[json!({"key": "rank", "value": "b", "comparator": "<"})], "AND")
        .await?;
    assert!(contains(&below, &low));
    assert!(!contains(&below, &high));

    let at_least = store
        .find_owner_ids("note", &[json!({"key": "rank", "value": "a", "comparator": ">="})], "AND")
        .await?;
    assert_eq!(at_least.len(), 2);
    Ok(())
}

#[tokio::test]
async fn owner_type_scopes_the_search() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let note = OwnerRef::new("note", Id::new());
    let task = OwnerRef::new("task", Id::new());
    store.set_meta(&note, "color", MetaValue::from("red")).await?;
    store.set_meta(&task, "color", MetaValue::from("red")).await?;

    let filters = vec![json!({"key": "color", "value": "red"})];
    let ids = store.find_owner_ids("task", &filters, "AND").await?;
    assert!(contains(&ids, &task));
    assert!(!contains(&ids, &note));
    Ok(())
}
