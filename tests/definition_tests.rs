use dynamo_onetable::{
    schema::TableSchema,
    table::{definition::ProjectionType, DELETE_CONFIRMATION},
    ConfigError, Error, Generation, TableConfig, Throughput,
};
use serde_json::json;

mod common;

use common::{table_with, MockClient, TABLE_NAME};

#[test]
fn test_definition_from_schema() {
    let table = table_with(MockClient::new(Generation::Modern));
    let definition = table.table_definition(None).unwrap();

    assert_eq!(definition.table_name, TABLE_NAME);
    assert_eq!(definition.billing_mode.as_deref(), Some("PAY_PER_REQUEST"));

    let names: Vec<_> = definition
        .attribute_definitions
        .iter()
        .map(|attr| attr.attribute_name.as_str())
        .collect();
    assert_eq!(names, ["pk", "sk", "gs1pk", "gs1sk"]);

    assert_eq!(definition.global_secondary_indexes.len(), 1);
    let gs1 = &definition.global_secondary_indexes[0];
    assert_eq!(gs1.index_name, "gs1");
    assert_eq!(gs1.projection.projection_type, ProjectionType::KeysOnly);
    assert!(gs1.provisioned_throughput.is_none());
}

#[test]
fn test_definition_serializes_like_create_table() {
    let table = table_with(MockClient::new(Generation::Modern));
    let definition = table.table_definition(Some(Throughput::new(5, 2))).unwrap();
    let json = serde_json::to_value(&definition).unwrap();

    assert_eq!(
        json["KeySchema"],
        json!([
            {"AttributeName": "pk", "KeyType": "HASH"},
            {"AttributeName": "sk", "KeyType": "RANGE"},
        ])
    );
    assert_eq!(
        json["ProvisionedThroughput"],
        json!({"ReadCapacityUnits": 5, "WriteCapacityUnits": 2})
    );
    assert_eq!(
        json["GlobalSecondaryIndexes"][0]["ProvisionedThroughput"],
        json["ProvisionedThroughput"]
    );
    assert!(json.get("BillingMode").is_none());
    assert!(json.get("LocalSecondaryIndexes").is_none());
}

#[test]
fn test_local_index_projection_is_rejected() {
    // Sharing the primary hash makes ls1 a local index
    let schema = TableSchema::from_json(json!({
        "primary": {"hash": "pk", "sort": "sk"},
        "ls1": {"hash": "pk", "sort": "created", "project": ["name"]},
    }))
    .unwrap();

    let table = TableConfig::builder()
        .name(TABLE_NAME)
        .shared_client(MockClient::new(Generation::Modern))
        .schema(schema)
        .build()
        .unwrap();

    let err = assert_err!(table.table_definition(None));
    assert_eq!(err, ConfigError::LocalIndexProjection("ls1".into()));
}

#[tokio::test]
async fn test_create_table_reaches_client() {
    let client = MockClient::new(Generation::Modern);
    let table = table_with(client.clone());

    assert!(!table.exists().await.unwrap());
    table.create_table(None).await.unwrap();

    assert_eq!(client.created.lock().len(), 1);
    assert!(table.exists().await.unwrap());
    assert_eq!(table.list_tables().await.unwrap(), [TABLE_NAME]);

    let described = table.describe_table().await.unwrap();
    assert_eq!(described["Table"]["TableName"], json!(TABLE_NAME));
}

#[tokio::test]
async fn test_delete_table_requires_confirmation() {
    let client = MockClient::new(Generation::Modern);
    let table = table_with(client.clone());

    let err = assert_err!(table.delete_table("yes please").await);
    assert!(matches!(
        err,
        Error::Config(ConfigError::ConfirmationRequired(DELETE_CONFIRMATION))
    ));
    assert!(client.deleted.lock().is_empty());

    table.delete_table(DELETE_CONFIRMATION).await.unwrap();
    assert_eq!(*client.deleted.lock(), [TABLE_NAME]);
}
