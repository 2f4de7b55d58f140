use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

use crate::{config::MidtransConfig, dto::payments::GatewayNotification};

/// Midtrans caps item names at 50 characters.
const MAX_ITEM_NAME_LEN: usize = 50;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SnapRequest {
    pub transaction_details: TransactionDetails,
    pub customer_details: CustomerDetails,
    pub item_details: Vec<ItemDetails>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransactionDetails {
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemDetails {
    pub id: String,
    pub price: i64,
    pub quantity: i32,
    pub name: String,
}

impl ItemDetails {
    pub fn new(id: impl Into<String>, price: i64, quantity: i32, name: &str) -> Self {
        Self {
            id: id.into(),
            price,
            quantity,
            name: name.chars().take(MAX_ITEM_NAME_LEN).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SnapTransaction {
    pub token: String,
    pub redirect_url: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway is not configured")]
    NotConfigured,

    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway rejected transaction ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Hosted checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_transaction(&self, request: &SnapRequest)
    -> Result<SnapTransaction, GatewayError>;
}

#[derive(Clone)]
pub struct MidtransGateway {
    client: Client,
    config: MidtransConfig,
}

impl MidtransGateway {
    pub fn new(config: MidtransConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, config })
    }

    fn auth_header(&self) -> String {
        let credentials = format!("{}:", self.config.server_key);
        format!("Basic {}", general_purpose::STANDARD.encode(credentials))
    }
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    async fn create_transaction(
        &self,
        request: &SnapRequest,
    ) -> Result<SnapTransaction, GatewayError> {
        if self.config.server_key.is_empty() {
            return Err(GatewayError::NotConfigured);
        }

        let response = self
            .client
            .post(self.config.snap_url())
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let transaction: SnapTransaction = response.json().await?;
        tracing::info!(
            order_id = %request.transaction_details.order_id,
            "snap transaction created"
        );
        Ok(transaction)
    }
}

/// `sha512(order_id + status_code + gross_amount + server_key)`, hex encoded.
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether a notification carries a signature matching `server_key`.
/// A notification without signature fields never verifies.
pub fn verify_notification(notification: &GatewayNotification, server_key: &str) -> bool {
    let (Some(signature), Some(status_code), Some(gross_amount)) = (
        notification.signature_key.as_deref(),
        notification.status_code.as_deref(),
        notification.gross_amount.as_deref(),
    ) else {
        return false;
    };

    let expected =
        notification_signature(&notification.order_id, status_code, gross_amount, server_key);
    expected.eq_ignore_ascii_case(signature)
}
