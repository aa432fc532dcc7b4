use crate::model::IdentityRecord;
use serde::Deserialize;

/// Read access to the external identity provider's user records.
///
/// The production implementation reads the local mirror kept up to date by
/// provider webhooks; tests substitute a map-backed fake.
pub trait IdentityProvider {
    fn fetch(&self, user_id: &str) -> anyhow::Result<Option<IdentityRecord>>;
}

/// Provider webhook payload, as delivered by the (out-of-scope) HTTP layer.
/// Signature verification happens before the event reaches us.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookUser {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

impl WebhookUser {
    pub fn into_record(self) -> IdentityRecord {
        IdentityRecord {
            user_id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            image_url: self.image_url,
        }
    }
}
