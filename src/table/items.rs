//! Schema-less item access through the generic model.
use super::{ExecuteOptions, Table};
use crate::{
    client::{Command, Operation},
    errors::{ConfigError, Error},
    format::{self, Marshall},
    schema::PRIMARY_INDEX,
    Item, TableAttribute,
};
use serde_json::{json, Value};

impl Table {
    fn command(&self) -> Command {
        let mut command = Command::new();
        command.insert("TableName".into(), json!(self.name));
        command
    }

    fn marshall_item(&self, item: &Item) -> Result<Value, Error> {
        Ok(format::marshall(
            self.client.as_ref(),
            Marshall::One(item),
            &self.marshall_options,
        )?)
    }

    fn read_item(
        &self,
        operation: Operation,
        item: Item,
        properties: &Item,
        options: &ExecuteOptions,
    ) -> Item {
        match self.schema.model(self.schema.generic_model()) {
            Some(model) => model.transform_read_item(operation, item, properties, options),
            None => item,
        }
    }

    pub async fn get_item(
        &self,
        key: Item,
        options: &ExecuteOptions,
    ) -> Result<Option<Item>, Error> {
        let mut command = self.command();
        command.insert("Key".into(), self.marshall_item(&key)?);
        if options.consistent {
            command.insert("ConsistentRead".into(), json!(true));
        }

        let result = self
            .execute(self.schema.generic_model(), Operation::Get, command, options, &key)
            .await?;

        match result.get("Item") {
            Some(item) if !item.is_null() => {
                let item = format::unmarshall(self.client.as_ref(), item)?;
                Ok(Some(self.read_item(Operation::Get, item, &key, options)))
            }
            _ => Ok(None),
        }
    }

    /// Write `item` with the table context merged in and return what was written.
    ///
    /// With `options.exists == Some(false)` the write is conditional on no item existing
    /// under the same primary key. A clash surfaces as
    /// [`DispatchError::Conflict`](crate::DispatchError::Conflict).
    ///
    /// `None` means the write failed and `options.throw` was `false`.
    pub async fn put_item(
        &self,
        mut item: Item,
        options: &ExecuteOptions,
    ) -> Result<Option<Item>, Error> {
        self.context.apply_to(&mut item);

        let mut command = self.command();
        command.insert("Item".into(), self.marshall_item(&item)?);

        if let Some(exists) = options.exists {
            let hash = &self.schema.primary_index()?.hash;
            let condition = if exists {
                "attribute_exists(#_0)"
            } else {
                "attribute_not_exists(#_0)"
            };
            command.insert("ConditionExpression".into(), json!(condition));
            command.insert("ExpressionAttributeNames".into(), json!({ "#_0": hash }));
        }

        let written = self
            .dispatch(self.schema.generic_model(), Operation::Put, command, options, &item)
            .await?;

        Ok(written.map(|_| item))
    }

    pub async fn delete_item(&self, key: Item, options: &ExecuteOptions) -> Result<(), Error> {
        let mut command = self.command();
        command.insert("Key".into(), self.marshall_item(&key)?);

        self.execute(self.schema.generic_model(), Operation::Delete, command, options, &key)
            .await?;

        Ok(())
    }

    pub async fn scan_items(&self, options: &ExecuteOptions) -> Result<Vec<Item>, Error> {
        let mut command = self.command();
        if let Some(limit) = options.limit {
            command.insert("Limit".into(), json!(limit));
        }
        if let Some(index) = &options.index {
            command.insert("IndexName".into(), json!(index));
        }

        let properties = Item::new();
        let result = self
            .execute(self.schema.generic_model(), Operation::Scan, command, options, &properties)
            .await?;

        Ok(format::unmarshall_all(self.client.as_ref(), &result["Items"])?
            .into_iter()
            .map(|item| self.read_item(Operation::Scan, item, &properties, options))
            .collect())
    }

    /// All items whose hash attribute on `index` equals `hash_value`.
    pub async fn query_items(
        &self,
        index: &str,
        hash_value: impl Into<TableAttribute>,
        options: &ExecuteOptions,
    ) -> Result<Vec<Item>, Error> {
        let definition = self
            .schema
            .indexes()
            .get(index)
            .ok_or_else(|| ConfigError::UnknownIndex(index.to_string()))?;

        let properties: Item = [(definition.hash.clone(), hash_value.into())]
            .into_iter()
            .collect();
        let values: Item = properties
            .values()
            .map(|value| (":_0".to_string(), value.clone()))
            .collect();

        let mut command = self.command();
        if index != PRIMARY_INDEX {
            command.insert("IndexName".into(), json!(index));
        }
        command.insert("KeyConditionExpression".into(), json!("#_0 = :_0"));
        command.insert(
            "ExpressionAttributeNames".into(),
            json!({ "#_0": definition.hash }),
        );
        command.insert("ExpressionAttributeValues".into(), self.marshall_item(&values)?);
        if let Some(limit) = options.limit {
            command.insert("Limit".into(), json!(limit));
        }
        if options.consistent {
            command.insert("ConsistentRead".into(), json!(true));
        }

        let result = self
            .execute(self.schema.generic_model(), Operation::Find, command, options, &properties)
            .await?;

        Ok(format::unmarshall_all(self.client.as_ref(), &result["Items"])?
            .into_iter()
            .map(|item| self.read_item(Operation::Find, item, &properties, options))
            .collect())
    }
}
