use super::{Context, Table};
use crate::{
    crypto::{Cipher, CryptoConfig, ProfileSettings, PRIMARY_PROFILE},
    errors::ConfigError,
    format::MarshallOptions,
    metrics::Metrics,
    schema::Schema,
    Crypto, Item, StoreClient,
};
use log::info;
use std::{env, sync::Arc};

pub const TABLE_NAME_ENV: &str = "ONETABLE_TABLE_NAME";
pub const CRYPTO_PASSWORD_ENV: &str = "ONETABLE_CRYPTO_PASSWORD";
pub const CRYPTO_CIPHER_ENV: &str = "ONETABLE_CRYPTO_CIPHER";

/// Builder for a [`Table`].
///
/// ```no_run
/// # use dynamo_onetable::{TableConfig, DynamoClient, schema::TableSchema};
/// # async fn example(schema: TableSchema) -> Result<(), Box<dyn std::error::Error>> {
/// let config = aws_config::load_from_env().await;
/// let table = TableConfig::builder()
///     .name("MyTable")
///     .client(DynamoClient::new(aws_sdk_dynamodb::Client::new(&config)))
///     .schema(schema)
///     .with_env()
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct TableConfig {
    name: Option<String>,
    client: Option<Arc<dyn StoreClient>>,
    schema: Option<Arc<dyn Schema>>,
    crypto: CryptoConfig,
    metrics: Option<Arc<dyn Metrics>>,
    marshall_options: MarshallOptions,
    context: Item,
}

impl TableConfig {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn client(self, client: impl StoreClient + 'static) -> Self {
        self.shared_client(Arc::new(client))
    }

    pub fn shared_client(mut self, client: Arc<dyn StoreClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    pub fn crypto(mut self, crypto: CryptoConfig) -> Self {
        self.crypto = crypto;
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn marshall_options(mut self, options: MarshallOptions) -> Self {
        self.marshall_options = options;
        self
    }

    pub fn context(mut self, context: Item) -> Self {
        self.context = context;
        self
    }

    /// Override settings from `ONETABLE_*` environment variables when they are set.
    ///
    /// `ONETABLE_CRYPTO_PASSWORD` installs the `primary` profile using
    /// `ONETABLE_CRYPTO_CIPHER`, or `aes-256-gcm` when that is unset.
    pub fn with_env(mut self) -> Self {
        if let Ok(name) = env::var(TABLE_NAME_ENV) {
            self.name = Some(name);
        }

        if let Ok(password) = env::var(CRYPTO_PASSWORD_ENV) {
            let cipher = env::var(CRYPTO_CIPHER_ENV)
                .unwrap_or_else(|_| Cipher::default().as_str().to_string());
            self.crypto.insert(
                PRIMARY_PROFILE.to_string(),
                ProfileSettings::new(cipher, password),
            );
        }

        self
    }

    pub fn build(self) -> Result<Table, ConfigError> {
        let name = self.name.ok_or(ConfigError::Missing("name"))?;
        let client = self.client.ok_or(ConfigError::Missing("client"))?;
        let schema = self.schema.ok_or(ConfigError::Missing("schema"))?;
        let crypto = Crypto::new(&self.crypto)?;

        info!("Initializing table \"{name}\"");

        Ok(Table {
            name,
            client,
            schema,
            crypto: Arc::new(crypto),
            metrics: self.metrics,
            marshall_options: self.marshall_options,
            context: Context::new(self.context),
        })
    }
}
