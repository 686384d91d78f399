use dynamo_onetable::{
    ConfigError, DispatchError, Error, ExecuteOptions, Generation, Marshall, Operation,
    StoreErrorKind, TableAttribute,
};
use serde_json::json;

mod common;

use common::{item, table_with, MockClient, TABLE_NAME};

#[tokio::test]
async fn test_put_item_if_absent() {
    common::init_logger();
    let client = MockClient::new(Generation::Modern);
    let table = table_with(client.clone());

    table
        .put_item(
            item(&[("pk", "u1"), ("sk", "User")]),
            &ExecuteOptions::default().exists(false),
        )
        .await
        .unwrap();

    let (operation, sent) = client.last_call().unwrap();
    assert_eq!(operation, Operation::Put);
    assert_eq!(sent["TableName"], json!(TABLE_NAME));
    assert_eq!(sent["ConditionExpression"], json!("attribute_not_exists(#_0)"));
    assert_eq!(sent["ExpressionAttributeNames"], json!({"#_0": "pk"}));
    assert_eq!(sent["Item"]["pk"], json!({"S": "u1"}));
}

#[tokio::test]
async fn test_put_item_clash_is_a_conflict() {
    let client = MockClient::new(Generation::Modern);
    client.fail(StoreErrorKind::ConditionalCheckFailed, "PutItem");
    let table = table_with(client.clone());

    let err = assert_err!(
        table
            .put_item(item(&[("pk", "u1")]), &ExecuteOptions::default().exists(false))
            .await
    );

    assert!(matches!(err, Error::Dispatch(DispatchError::Conflict { .. })));
}

#[tokio::test]
async fn test_suppressed_put_failure_is_not_a_write() {
    let client = MockClient::new(Generation::Modern);
    client.fail(StoreErrorKind::Transport, "PutItem");
    let table = table_with(client.clone());
    let options = ExecuteOptions::default().throw(false);

    assert_none!(table
        .put_item(item(&[("pk", "a"), ("sk", "b")]), &options)
        .await
        .unwrap());
    assert_eq!(client.call_count(), 1);

    // The next put succeeds with an empty response
    let written = table
        .put_item(item(&[("pk", "a"), ("sk", "b")]), &options)
        .await
        .unwrap()
        .expect("item should be written");
    assert_eq!(written["sk"], TableAttribute::from("b"));
}

#[tokio::test]
async fn test_put_item_applies_context() {
    let client = MockClient::new(Generation::Modern);
    let mut table = table_with(client.clone());
    table.set_context(item(&[("tenant", "acme"), ("region", "eu")]));

    let written = table
        .put_item(
            item(&[("pk", "u1"), ("region", "us")]),
            &ExecuteOptions::default(),
        )
        .await
        .unwrap()
        .expect("item should be written");

    assert_eq!(written["tenant"], TableAttribute::from("acme"));
    assert_eq!(written["region"], TableAttribute::from("us"));

    let (_, sent) = client.last_call().unwrap();
    assert_eq!(sent["Item"]["tenant"], json!({"S": "acme"}));
    assert!(!sent.contains_key("ConditionExpression"));
}

#[tokio::test]
async fn test_child_table_layers_context() {
    let client = MockClient::new(Generation::Modern);
    let mut parent = table_with(client.clone());
    parent.set_context(item(&[("tenant", "acme")]));

    let child = parent.child(item(&[("user", "ada")]));
    parent.clear_context();

    assert!(parent.context().is_empty());
    assert_eq!(child.context().get("tenant"), Some(&TableAttribute::from("acme")));
    assert_eq!(child.context().get("user"), Some(&TableAttribute::from("ada")));

    let written = child
        .put_item(item(&[("pk", "u1")]), &ExecuteOptions::default())
        .await
        .unwrap()
        .expect("item should be written");
    assert_eq!(written.len(), 3);
}

#[tokio::test]
async fn test_get_item() {
    let client = MockClient::new(Generation::Modern);
    let table = table_with(client.clone());

    let stored = table
        .marshall(Marshall::One(&item(&[("pk", "u1"), ("name", "Ada")])))
        .unwrap();
    client.respond(Ok(json!({ "Item": stored })));

    let found = table
        .get_item(item(&[("pk", "u1")]), &ExecuteOptions::default().consistent(true))
        .await
        .unwrap()
        .expect("item should be found");
    assert_eq!(found["name"], TableAttribute::from("Ada"));

    let (_, sent) = client.last_call().unwrap();
    assert_eq!(sent["ConsistentRead"], json!(true));
    assert_eq!(sent["Key"], json!({"pk": {"S": "u1"}}));

    assert_none!(table
        .get_item(item(&[("pk", "missing")]), &ExecuteOptions::default())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_query_items_on_secondary_index() {
    let client = MockClient::new(Generation::Modern);
    let table = table_with(client.clone());

    let stored = table
        .marshall(Marshall::Many(&[
            item(&[("pk", "u1"), ("gs1pk", "team")]),
            item(&[("pk", "u2"), ("gs1pk", "team")]),
        ]))
        .unwrap();
    client.respond(Ok(json!({ "Items": stored })));

    let found = table
        .query_items("gs1", "team", &ExecuteOptions::default().limit(10))
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    let (operation, sent) = client.last_call().unwrap();
    assert_eq!(operation, Operation::Find);
    assert_eq!(sent["IndexName"], json!("gs1"));
    assert_eq!(sent["KeyConditionExpression"], json!("#_0 = :_0"));
    assert_eq!(sent["ExpressionAttributeNames"], json!({"#_0": "gs1pk"}));
    assert_eq!(sent["ExpressionAttributeValues"], json!({":_0": {"S": "team"}}));
    assert_eq!(sent["Limit"], json!(10));
}

#[tokio::test]
async fn test_query_items_on_primary_omits_index_name() {
    let client = MockClient::new(Generation::Modern);
    let table = table_with(client.clone());

    let found = table
        .query_items("primary", "u1", &ExecuteOptions::default())
        .await
        .unwrap();
    assert!(found.is_empty());

    let (_, sent) = client.last_call().unwrap();
    assert!(!sent.contains_key("IndexName"));
    assert_eq!(sent["ExpressionAttributeNames"], json!({"#_0": "pk"}));
}

#[tokio::test]
async fn test_query_items_unknown_index() {
    let client = MockClient::new(Generation::Modern);
    let table = table_with(client.clone());

    let err = assert_err!(
        table
            .query_items("gs9", "x", &ExecuteOptions::default())
            .await
    );

    assert!(matches!(err, Error::Config(ConfigError::UnknownIndex(name)) if name == "gs9"));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_scan_and_delete() {
    let client = MockClient::new(Generation::Modern);
    let table = table_with(client.clone());

    table
        .scan_items(&ExecuteOptions::default().index("gs1").limit(5))
        .await
        .unwrap();
    let (operation, sent) = client.last_call().unwrap();
    assert_eq!(operation, Operation::Scan);
    assert_eq!(sent["IndexName"], json!("gs1"));
    assert_eq!(sent["Limit"], json!(5));

    table
        .delete_item(item(&[("pk", "u1"), ("sk", "User")]), &ExecuteOptions::default())
        .await
        .unwrap();
    let (operation, sent) = client.last_call().unwrap();
    assert_eq!(operation, Operation::Delete);
    assert_eq!(sent["Key"]["sk"], json!({"S": "User"}));
}

#[tokio::test]
async fn test_legacy_generation_sends_documents() {
    let client = MockClient::new(Generation::Legacy);
    let table = table_with(client.clone());

    let mut row = item(&[("pk", "u1")]);
    row.insert("tags".into(), TableAttribute::string_set(["a", "b"]));
    row.insert("age".into(), TableAttribute::number(42));

    table
        .put_item(row, &ExecuteOptions::default())
        .await
        .unwrap();

    let (_, sent) = client.last_call().unwrap();
    assert_eq!(sent["Item"]["pk"], json!("u1"));
    assert_eq!(sent["Item"]["age"], json!(42));
    assert_eq!(sent["Item"]["tags"]["wrapperName"], json!("Set"));
    assert_eq!(sent["Item"]["tags"]["type"], json!("String"));
}

#[tokio::test]
async fn test_merge_and_uuid_helpers() {
    let table = table_with(MockClient::new(Generation::Modern));

    let mut dest = item(&[("name", "Ada")]);
    table
        .merge(&mut dest, &item(&[("role", "admin")]))
        .unwrap();
    assert_eq!(dest.len(), 2);

    let id = table.uuid();
    assert_eq!(id.len(), 36);
    assert_ne!(id, table.uuid());
}

#[test]
fn test_model_factory() {
    let mut table = table_with(MockClient::new(Generation::Modern));

    assert_eq!(table.list_models(), ["Post", "User", "_Generic", "_Unique"]);
    assert_eq!(table.get_model("User").unwrap().name(), "User");
    assert!(matches!(
        table.get_model("Order"),
        Err(ConfigError::UnknownModel(name)) if name == "Order"
    ));

    table.set_schema(dynamo_onetable::schema::TableSchema::new(
        table.schema().indexes().clone(),
    ));
    assert_eq!(table.list_models(), ["_Generic", "_Unique"]);
}
