//! AWS SDK client setup.

use aws_sdk_dynamodb::Client;

pub const DEFAULT_TABLE_NAME: &str = "devices";
pub const DEFAULT_REGION: &str = "us-east-1";

/// DynamoDB connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbConfig {
    pub table_name: String,
    pub region: String,
    /// Custom endpoint URL (for local DynamoDB).
    pub endpoint_url: Option<String>,
}

impl Default for DynamoDbConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
        }
    }
}

impl DynamoDbConfig {
    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({})", url),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

/// Creates a DynamoDB client with the given configuration.
///
/// Credentials come from the default AWS provider chain.
pub async fn create_client(config: &DynamoDbConfig) -> Client {
    let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
    }

    let sdk_config = sdk_config_loader.load().await;
    Client::new(&sdk_config)
}
