use super::{
    wire::{self, CommandReader},
    Command, Generation, Operation, StoreClient,
};
use crate::{
    errors::{StoreError, StoreErrorKind},
    table::definition::{self, TableDefinition},
};
use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{
        self as aws, ConditionCheck, Delete, DeleteRequest, Get, KeysAndAttributes, Put,
        PutRequest, TransactGetItem, TransactWriteItem, Update, WriteRequest,
    },
    Client,
};
use log::debug;
use serde_json::{json, Map, Value};
use std::{collections::HashMap, fmt::Debug};

/// Store client for the current `aws-sdk-dynamodb` generation.
///
/// Commands are read as attribute-value JSON and every call is awaited directly.
#[derive(Debug, Clone)]
pub struct DynamoClient {
    client: Client,
}

impl DynamoClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

impl From<Client> for DynamoClient {
    fn from(client: Client) -> Self {
        Self::new(client)
    }
}

fn classify<E, R>(operation: &'static str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug,
{
    let kind = match &err {
        SdkError::ServiceError(_) => {
            match err.as_service_error().and_then(ProvideErrorMetadata::code) {
                Some("ConditionalCheckFailedException") => StoreErrorKind::ConditionalCheckFailed,
                Some("TransactionCanceledException") => StoreErrorKind::TransactionCanceled,
                Some(
                    "ProvisionedThroughputExceededException"
                    | "ThrottlingException"
                    | "RequestLimitExceeded",
                ) => StoreErrorKind::Throttled,
                Some("ResourceNotFoundException") => StoreErrorKind::ResourceNotFound,
                Some("ValidationException") => StoreErrorKind::Validation,
                _ => StoreErrorKind::Service,
            }
        }
        SdkError::ConstructionFailure(_) => StoreErrorKind::Validation,
        _ => StoreErrorKind::Transport,
    };

    StoreError::new(kind, operation, DisplayErrorContext(&err).to_string())
}

fn build_failed(operation: &'static str) -> impl Fn(BuildError) -> StoreError {
    move |e| StoreError::validation(operation, e.to_string())
}

fn insert(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value);
    }
}

fn capacities(capacity: &Option<Vec<aws::ConsumedCapacity>>) -> Option<Value> {
    capacity.as_ref().map(|c| {
        Value::Array(c.iter().map(wire::from_consumed_capacity).collect())
    })
}

fn write_request(operation: &'static str, request: &Value) -> Result<WriteRequest, StoreError> {
    let reader = CommandReader::nested(request, operation)?;
    let mut builder = WriteRequest::builder();

    if let Some(put) = reader.get("PutRequest") {
        let put = CommandReader::nested(put, operation)?;
        builder = builder.put_request(
            PutRequest::builder()
                .set_item(Some(put.required_item("Item")?))
                .build()
                .map_err(build_failed(operation))?,
        );
    }
    if let Some(delete) = reader.get("DeleteRequest") {
        let delete = CommandReader::nested(delete, operation)?;
        builder = builder.delete_request(
            DeleteRequest::builder()
                .set_key(Some(delete.required_item("Key")?))
                .build()
                .map_err(build_failed(operation))?,
        );
    }

    Ok(builder.build())
}

fn from_write_request(request: &WriteRequest) -> Value {
    let mut out = Map::new();

    insert(
        &mut out,
        "PutRequest",
        request
            .put_request
            .as_ref()
            .map(|put| json!({ "Item": wire::from_item(&put.item) })),
    );
    insert(
        &mut out,
        "DeleteRequest",
        request
            .delete_request
            .as_ref()
            .map(|delete| json!({ "Key": wire::from_item(&delete.key) })),
    );

    Value::Object(out)
}

fn transact_write_item(
    operation: &'static str,
    entry: &Value,
) -> Result<TransactWriteItem, StoreError> {
    let entry = CommandReader::nested(entry, operation)?;
    let mut builder = TransactWriteItem::builder();

    if let Some(put) = entry.get("Put") {
        let put = CommandReader::nested(put, operation)?;
        builder = builder.put(
            Put::builder()
                .set_table_name(put.string("TableName")?)
                .set_item(put.item("Item")?)
                .set_condition_expression(put.string("ConditionExpression")?)
                .set_expression_attribute_names(put.names("ExpressionAttributeNames")?)
                .set_expression_attribute_values(put.item("ExpressionAttributeValues")?)
                .build()
                .map_err(build_failed(operation))?,
        );
    }
    if let Some(update) = entry.get("Update") {
        let update = CommandReader::nested(update, operation)?;
        builder = builder.update(
            Update::builder()
                .set_table_name(update.string("TableName")?)
                .set_key(update.item("Key")?)
                .set_update_expression(update.string("UpdateExpression")?)
                .set_condition_expression(update.string("ConditionExpression")?)
                .set_expression_attribute_names(update.names("ExpressionAttributeNames")?)
                .set_expression_attribute_values(update.item("ExpressionAttributeValues")?)
                .build()
                .map_err(build_failed(operation))?,
        );
    }
    if let Some(delete) = entry.get("Delete") {
        let delete = CommandReader::nested(delete, operation)?;
        builder = builder.delete(
            Delete::builder()
                .set_table_name(delete.string("TableName")?)
                .set_key(delete.item("Key")?)
                .set_condition_expression(delete.string("ConditionExpression")?)
                .set_expression_attribute_names(delete.names("ExpressionAttributeNames")?)
                .set_expression_attribute_values(delete.item("ExpressionAttributeValues")?)
                .build()
                .map_err(build_failed(operation))?,
        );
    }
    if let Some(check) = entry.get("ConditionCheck") {
        let check = CommandReader::nested(check, operation)?;
        builder = builder.condition_check(
            ConditionCheck::builder()
                .set_table_name(check.string("TableName")?)
                .set_key(check.item("Key")?)
                .set_condition_expression(check.string("ConditionExpression")?)
                .set_expression_attribute_names(check.names("ExpressionAttributeNames")?)
                .set_expression_attribute_values(check.item("ExpressionAttributeValues")?)
                .build()
                .map_err(build_failed(operation))?,
        );
    }

    Ok(builder.build())
}

fn key_schema(
    operation: &'static str,
    keys: &[definition::KeySchemaElement],
) -> Result<Vec<aws::KeySchemaElement>, StoreError> {
    keys.iter()
        .map(|key| {
            aws::KeySchemaElement::builder()
                .attribute_name(&key.attribute_name)
                .key_type(aws::KeyType::from(key.key_type.as_str()))
                .build()
                .map_err(build_failed(operation))
        })
        .collect()
}

fn throughput(
    operation: &'static str,
    throughput: &Option<definition::Throughput>,
) -> Result<Option<aws::ProvisionedThroughput>, StoreError> {
    throughput
        .as_ref()
        .map(|t| {
            aws::ProvisionedThroughput::builder()
                .read_capacity_units(t.read_capacity_units)
                .write_capacity_units(t.write_capacity_units)
                .build()
                .map_err(build_failed(operation))
        })
        .transpose()
}

fn projection(projection: &definition::ProjectionDefinition) -> aws::Projection {
    let non_key_attributes = if projection.non_key_attributes.is_empty() {
        None
    } else {
        Some(projection.non_key_attributes.clone())
    };

    aws::Projection::builder()
        .projection_type(aws::ProjectionType::from(
            projection.projection_type.as_str(),
        ))
        .set_non_key_attributes(non_key_attributes)
        .build()
}

fn describe(table: &aws::TableDescription) -> Value {
    let key_schema = table.key_schema.as_ref().map(|keys| {
        keys.iter()
            .map(|k| json!({ "AttributeName": k.attribute_name, "KeyType": k.key_type.as_str() }))
            .collect::<Vec<_>>()
    });
    let attribute_definitions = table.attribute_definitions.as_ref().map(|attrs| {
        attrs
            .iter()
            .map(|a| {
                json!({ "AttributeName": a.attribute_name, "AttributeType": a.attribute_type.as_str() })
            })
            .collect::<Vec<_>>()
    });
    let global = table.global_secondary_indexes.as_ref().map(|indexes| {
        indexes
            .iter()
            .map(|i| json!({ "IndexName": i.index_name }))
            .collect::<Vec<_>>()
    });
    let local = table.local_secondary_indexes.as_ref().map(|indexes| {
        indexes
            .iter()
            .map(|i| json!({ "IndexName": i.index_name }))
            .collect::<Vec<_>>()
    });

    let mut out = Map::new();
    insert(&mut out, "TableName", table.table_name.as_ref().map(|n| json!(n)));
    insert(
        &mut out,
        "TableStatus",
        table.table_status.as_ref().map(|s| json!(s.as_str())),
    );
    insert(&mut out, "ItemCount", table.item_count.map(|c| json!(c)));
    insert(&mut out, "KeySchema", key_schema.map(Value::from));
    insert(
        &mut out,
        "AttributeDefinitions",
        attribute_definitions.map(Value::from),
    );
    insert(&mut out, "GlobalSecondaryIndexes", global.map(Value::from));
    insert(&mut out, "LocalSecondaryIndexes", local.map(Value::from));

    json!({ "Table": out })
}

#[async_trait]
impl StoreClient for DynamoClient {
    fn generation(&self) -> Generation {
        Generation::Modern
    }

    async fn get(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::Get.api_name();
        let cmd = CommandReader::new(&command, op);

        let output = self
            .client
            .get_item()
            .set_table_name(cmd.string("TableName")?)
            .set_key(cmd.item("Key")?)
            .set_consistent_read(cmd.bool("ConsistentRead")?)
            .set_projection_expression(cmd.string("ProjectionExpression")?)
            .set_expression_attribute_names(cmd.names("ExpressionAttributeNames")?)
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let mut out = Map::new();
        insert(&mut out, "Item", output.item.as_ref().map(wire::from_item));
        insert(
            &mut out,
            "ConsumedCapacity",
            output.consumed_capacity.as_ref().map(wire::from_consumed_capacity),
        );

        Ok(Value::Object(out))
    }

    async fn put(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::Put.api_name();
        let cmd = CommandReader::new(&command, op);

        let output = self
            .client
            .put_item()
            .set_table_name(cmd.string("TableName")?)
            .set_item(cmd.item("Item")?)
            .set_condition_expression(cmd.string("ConditionExpression")?)
            .set_expression_attribute_names(cmd.names("ExpressionAttributeNames")?)
            .set_expression_attribute_values(cmd.item("ExpressionAttributeValues")?)
            .set_return_values(cmd.enumeration("ReturnValues")?)
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .set_return_item_collection_metrics(cmd.enumeration("ReturnItemCollectionMetrics")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let mut out = Map::new();
        insert(&mut out, "Attributes", output.attributes.as_ref().map(wire::from_item));
        insert(
            &mut out,
            "ConsumedCapacity",
            output.consumed_capacity.as_ref().map(wire::from_consumed_capacity),
        );
        insert(
            &mut out,
            "ItemCollectionMetrics",
            output
                .item_collection_metrics
                .as_ref()
                .map(wire::from_item_collection_metrics),
        );

        Ok(Value::Object(out))
    }

    async fn update(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::Update.api_name();
        let cmd = CommandReader::new(&command, op);

        let output = self
            .client
            .update_item()
            .set_table_name(cmd.string("TableName")?)
            .set_key(cmd.item("Key")?)
            .set_update_expression(cmd.string("UpdateExpression")?)
            .set_condition_expression(cmd.string("ConditionExpression")?)
            .set_expression_attribute_names(cmd.names("ExpressionAttributeNames")?)
            .set_expression_attribute_values(cmd.item("ExpressionAttributeValues")?)
            .set_return_values(cmd.enumeration("ReturnValues")?)
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .set_return_item_collection_metrics(cmd.enumeration("ReturnItemCollectionMetrics")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let mut out = Map::new();
        insert(&mut out, "Attributes", output.attributes.as_ref().map(wire::from_item));
        insert(
            &mut out,
            "ConsumedCapacity",
            output.consumed_capacity.as_ref().map(wire::from_consumed_capacity),
        );
        insert(
            &mut out,
            "ItemCollectionMetrics",
            output
                .item_collection_metrics
                .as_ref()
                .map(wire::from_item_collection_metrics),
        );

        Ok(Value::Object(out))
    }

    async fn delete(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::Delete.api_name();
        let cmd = CommandReader::new(&command, op);

        let output = self
            .client
            .delete_item()
            .set_table_name(cmd.string("TableName")?)
            .set_key(cmd.item("Key")?)
            .set_condition_expression(cmd.string("ConditionExpression")?)
            .set_expression_attribute_names(cmd.names("ExpressionAttributeNames")?)
            .set_expression_attribute_values(cmd.item("ExpressionAttributeValues")?)
            .set_return_values(cmd.enumeration("ReturnValues")?)
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .set_return_item_collection_metrics(cmd.enumeration("ReturnItemCollectionMetrics")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let mut out = Map::new();
        insert(&mut out, "Attributes", output.attributes.as_ref().map(wire::from_item));
        insert(
            &mut out,
            "ConsumedCapacity",
            output.consumed_capacity.as_ref().map(wire::from_consumed_capacity),
        );
        insert(
            &mut out,
            "ItemCollectionMetrics",
            output
                .item_collection_metrics
                .as_ref()
                .map(wire::from_item_collection_metrics),
        );

        Ok(Value::Object(out))
    }

    async fn find(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::Find.api_name();
        let cmd = CommandReader::new(&command, op);

        let output = self
            .client
            .query()
            .set_table_name(cmd.string("TableName")?)
            .set_index_name(cmd.string("IndexName")?)
            .set_key_condition_expression(cmd.string("KeyConditionExpression")?)
            .set_filter_expression(cmd.string("FilterExpression")?)
            .set_projection_expression(cmd.string("ProjectionExpression")?)
            .set_expression_attribute_names(cmd.names("ExpressionAttributeNames")?)
            .set_expression_attribute_values(cmd.item("ExpressionAttributeValues")?)
            .set_exclusive_start_key(cmd.item("ExclusiveStartKey")?)
            .set_limit(cmd.int("Limit")?)
            .set_scan_index_forward(cmd.bool("ScanIndexForward")?)
            .set_consistent_read(cmd.bool("ConsistentRead")?)
            .set_select(cmd.enumeration("Select")?)
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let mut out = Map::new();
        out.insert(
            "Items".into(),
            wire::from_items(output.items.iter().flatten()),
        );
        out.insert("Count".into(), json!(output.count));
        out.insert("ScannedCount".into(), json!(output.scanned_count));
        insert(
            &mut out,
            "LastEvaluatedKey",
            output.last_evaluated_key.as_ref().map(wire::from_item),
        );
        insert(
            &mut out,
            "ConsumedCapacity",
            output.consumed_capacity.as_ref().map(wire::from_consumed_capacity),
        );

        Ok(Value::Object(out))
    }

    async fn scan(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::Scan.api_name();
        let cmd = CommandReader::new(&command, op);

        let output = self
            .client
            .scan()
            .set_table_name(cmd.string("TableName")?)
            .set_index_name(cmd.string("IndexName")?)
            .set_filter_expression(cmd.string("FilterExpression")?)
            .set_projection_expression(cmd.string("ProjectionExpression")?)
            .set_expression_attribute_names(cmd.names("ExpressionAttributeNames")?)
            .set_expression_attribute_values(cmd.item("ExpressionAttributeValues")?)
            .set_exclusive_start_key(cmd.item("ExclusiveStartKey")?)
            .set_limit(cmd.int("Limit")?)
            .set_segment(cmd.int("Segment")?)
            .set_total_segments(cmd.int("TotalSegments")?)
            .set_consistent_read(cmd.bool("ConsistentRead")?)
            .set_select(cmd.enumeration("Select")?)
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let mut out = Map::new();
        out.insert(
            "Items".into(),
            wire::from_items(output.items.iter().flatten()),
        );
        out.insert("Count".into(), json!(output.count));
        out.insert("ScannedCount".into(), json!(output.scanned_count));
        insert(
            &mut out,
            "LastEvaluatedKey",
            output.last_evaluated_key.as_ref().map(wire::from_item),
        );
        insert(
            &mut out,
            "ConsumedCapacity",
            output.consumed_capacity.as_ref().map(wire::from_consumed_capacity),
        );

        Ok(Value::Object(out))
    }

    async fn batch_get(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::BatchGet.api_name();
        let cmd = CommandReader::new(&command, op);

        let mut request_items = HashMap::new();
        for (table, entry) in cmd.object("RequestItems")?.into_iter().flatten() {
            let entry = CommandReader::nested(entry, op)?;
            let keys = KeysAndAttributes::builder()
                .set_keys(Some(entry.items("Keys")?))
                .set_consistent_read(entry.bool("ConsistentRead")?)
                .set_projection_expression(entry.string("ProjectionExpression")?)
                .set_expression_attribute_names(entry.names("ExpressionAttributeNames")?)
                .build()
                .map_err(build_failed(op))?;

            request_items.insert(table.clone(), keys);
        }

        let output = self
            .client
            .batch_get_item()
            .set_request_items(Some(request_items))
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let responses: Map<String, Value> = output
            .responses
            .iter()
            .flatten()
            .map(|(table, items)| (table.clone(), wire::from_items(items)))
            .collect();
        let unprocessed: Map<String, Value> = output
            .unprocessed_keys
            .iter()
            .flatten()
            .map(|(table, keys)| (table.clone(), json!({ "Keys": wire::from_items(&keys.keys) })))
            .collect();

        let mut out = Map::new();
        out.insert("Responses".into(), Value::Object(responses));
        out.insert("UnprocessedKeys".into(), Value::Object(unprocessed));
        insert(&mut out, "ConsumedCapacity", capacities(&output.consumed_capacity));

        Ok(Value::Object(out))
    }

    async fn batch_write(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::BatchWrite.api_name();
        let cmd = CommandReader::new(&command, op);

        let mut request_items = HashMap::new();
        for (table, requests) in cmd.object("RequestItems")?.into_iter().flatten() {
            let requests = requests
                .as_array()
                .ok_or_else(|| StoreError::validation(op, "RequestItems entries must be lists"))?
                .iter()
                .map(|request| write_request(op, request))
                .collect::<Result<Vec<_>, _>>()?;

            request_items.insert(table.clone(), requests);
        }

        let output = self
            .client
            .batch_write_item()
            .set_request_items(Some(request_items))
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .set_return_item_collection_metrics(cmd.enumeration("ReturnItemCollectionMetrics")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let unprocessed: Map<String, Value> = output
            .unprocessed_items
            .iter()
            .flatten()
            .map(|(table, requests)| {
                (
                    table.clone(),
                    Value::Array(requests.iter().map(from_write_request).collect()),
                )
            })
            .collect();

        let mut out = Map::new();
        out.insert("UnprocessedItems".into(), Value::Object(unprocessed));
        insert(&mut out, "ConsumedCapacity", capacities(&output.consumed_capacity));

        Ok(Value::Object(out))
    }

    async fn transact_get(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::TransactGet.api_name();
        let cmd = CommandReader::new(&command, op);

        let items = cmd
            .array("TransactItems")?
            .iter()
            .map(|entry| {
                let entry = CommandReader::nested(entry, op)?;
                let get = entry
                    .get("Get")
                    .ok_or_else(|| StoreError::validation(op, "TransactItems entries need Get"))?;
                let get = CommandReader::nested(get, op)?;

                Ok(TransactGetItem::builder()
                    .get(
                        Get::builder()
                            .set_table_name(get.string("TableName")?)
                            .set_key(get.item("Key")?)
                            .set_projection_expression(get.string("ProjectionExpression")?)
                            .set_expression_attribute_names(
                                get.names("ExpressionAttributeNames")?,
                            )
                            .build()
                            .map_err(build_failed(op))?,
                    )
                    .build())
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let output = self
            .client
            .transact_get_items()
            .set_transact_items(Some(items))
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let responses = output
            .responses
            .iter()
            .flatten()
            .map(|response| {
                let mut entry = Map::new();
                insert(&mut entry, "Item", response.item.as_ref().map(wire::from_item));
                Value::Object(entry)
            })
            .collect();

        let mut out = Map::new();
        out.insert("Responses".into(), Value::Array(responses));
        insert(&mut out, "ConsumedCapacity", capacities(&output.consumed_capacity));

        Ok(Value::Object(out))
    }

    async fn transact_write(&self, command: Command) -> Result<Value, StoreError> {
        let op = Operation::TransactWrite.api_name();
        let cmd = CommandReader::new(&command, op);

        let items = cmd
            .array("TransactItems")?
            .iter()
            .map(|entry| transact_write_item(op, entry))
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .transact_write_items()
            .set_transact_items(Some(items))
            .set_client_request_token(cmd.string("ClientRequestToken")?)
            .set_return_consumed_capacity(cmd.enumeration("ReturnConsumedCapacity")?)
            .set_return_item_collection_metrics(cmd.enumeration("ReturnItemCollectionMetrics")?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        let mut out = Map::new();
        insert(&mut out, "ConsumedCapacity", capacities(&output.consumed_capacity));

        Ok(Value::Object(out))
    }

    async fn create_table(&self, definition: &TableDefinition) -> Result<Value, StoreError> {
        let op = "CreateTable";

        let attribute_definitions = definition
            .attribute_definitions
            .iter()
            .map(|attr| {
                aws::AttributeDefinition::builder()
                    .attribute_name(&attr.attribute_name)
                    .attribute_type(aws::ScalarAttributeType::from(attr.attribute_type.as_str()))
                    .build()
                    .map_err(build_failed(op))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let local = definition
            .local_secondary_indexes
            .iter()
            .map(|index| {
                aws::LocalSecondaryIndex::builder()
                    .index_name(&index.index_name)
                    .set_key_schema(Some(key_schema(op, &index.key_schema)?))
                    .projection(projection(&index.projection))
                    .build()
                    .map_err(build_failed(op))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let global = definition
            .global_secondary_indexes
            .iter()
            .map(|index| {
                aws::GlobalSecondaryIndex::builder()
                    .index_name(&index.index_name)
                    .set_key_schema(Some(key_schema(op, &index.key_schema)?))
                    .projection(projection(&index.projection))
                    .set_provisioned_throughput(throughput(op, &index.provisioned_throughput)?)
                    .build()
                    .map_err(build_failed(op))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Creating table {}", definition.table_name);

        let output = self
            .client
            .create_table()
            .table_name(&definition.table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema(op, &definition.key_schema)?))
            .set_local_secondary_indexes((!local.is_empty()).then_some(local))
            .set_global_secondary_indexes((!global.is_empty()).then_some(global))
            .set_billing_mode(definition.billing_mode.as_deref().map(aws::BillingMode::from))
            .set_provisioned_throughput(throughput(op, &definition.provisioned_throughput)?)
            .send()
            .await
            .map_err(|e| classify(op, e))?;

        Ok(output
            .table_description
            .as_ref()
            .map(describe)
            .unwrap_or_else(|| json!({})))
    }

    async fn delete_table(&self, table_name: &str) -> Result<(), StoreError> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| classify("DeleteTable", e))?;

        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> Result<Value, StoreError> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| classify("DescribeTable", e))?;

        Ok(output
            .table
            .as_ref()
            .map(describe)
            .unwrap_or_else(|| json!({})))
    }

    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let output = self
            .client
            .list_tables()
            .send()
            .await
            .map_err(|e| classify("ListTables", e))?;

        Ok(output.table_names.unwrap_or_default())
    }
}
