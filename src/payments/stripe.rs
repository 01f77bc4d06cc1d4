use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{PaymentError, PaymentGateway, PaymentIntent};

/// Minimal Stripe client: creates payment intents over the REST API.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, secret_key)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    fn intent_form(amount: i64, currency: &str, metadata: &BTreeMap<String, String>) -> Vec<(String, String)> {
        let mut form = vec![("amount".to_string(), amount.to_string()), ("currency".to_string(), currency.to_lowercase())];
        form.extend(metadata.iter().map(|(k, v)| (format!("metadata[{k}]"), v.clone())));
        form
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[tracing::instrument(skip(self, metadata))]
    async fn create_intent(&self, amount: i64, currency: &str, metadata: &BTreeMap<String, String>) -> Result<PaymentIntent, PaymentError> {
        let res = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&Self::intent_form(amount, currency, metadata))
            .send()
            .await?;

        let status = res.status();
        tracing::debug!(stripe_status = ?status);

        if status.is_success() {
            return Ok(res.json::<PaymentIntent>().await?);
        }

        let message = match res.json::<StripeErrorBody>().await {
            Ok(body) => body.error.message.unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        };
        tracing::warn!(%status, %message, "stripe_intent_err");
        Err(PaymentError::Rejected(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_form() {
        let mut metadata = BTreeMap::new();
        metadata.insert("username".to_string(), "ann".to_string());
        let form = StripeClient::intent_form(1650, "USD", &metadata);
        assert_eq!(form, vec![
            ("amount".to_string(), "1650".to_string()),
            ("currency".to_string(), "usd".to_string()),
            ("metadata[username]".to_string(), "ann".to_string()),
        ]);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = StripeClient::new("https://api.stripe.com/", "sk_test");
        assert_eq!(client.base_url, "https://api.stripe.com");
    }
}
