use std::rc::Rc;

use chrono::Utc;

use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::identity::{IdentityProvider, WebhookPayload};
use crate::model::{Profile, Role};
use crate::store::{ProfilePatch, ProfileStore};

/// Maps external authenticated identities onto internal profiles.
pub struct ProfileService {
    store: Rc<dyn ProfileStore>,
    provider: Rc<dyn IdentityProvider>,
    allow_role_change: bool,
}

impl ProfileService {
    pub fn new(
        store: Rc<dyn ProfileStore>,
        provider: Rc<dyn IdentityProvider>,
        allow_role_change: bool,
    ) -> Self {
        Self {
            store,
            provider,
            allow_role_change,
        }
    }

    /// Returns the existing profile, or lazily creates one with the default
    /// student role and display data copied from the identity provider.
    pub fn resolve_profile(&self, identity: &str) -> ServiceResult<Profile> {
        if let Some(existing) = self.store.get_profile(identity)? {
            return Ok(existing);
        }

        let record = match self.provider.fetch(identity) {
            Ok(rec) => rec,
            Err(e) => {
                // The profile is still usable without display data.
                tracing::warn!(identity, "identity provider lookup failed: {e}");
                None
            }
        };

        let now = Utc::now();
        let profile = Profile {
            user_id: identity.to_string(),
            role: Role::Student,
            first_name: record.as_ref().and_then(|r| r.first_name.clone()),
            last_name: record.as_ref().and_then(|r| r.last_name.clone()),
            avatar_url: record.as_ref().and_then(|r| r.image_url.clone()),
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_profile(&profile) {
            Ok(()) => Ok(profile),
            // Lost a race against a concurrent first resolution; the row
            // that won is the profile.
            Err(StoreError::Conflict(_)) => self
                .store
                .get_profile(identity)?
                .ok_or(ServiceError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_role(&self, identity: &str) -> ServiceResult<Role> {
        Ok(self.resolve_profile(identity)?.role)
    }

    /// Overwrites name/avatar from the provider's current record. Role is
    /// never touched. Reports failure as `false` rather than an error.
    pub fn sync_from_identity_provider(&self, identity: &str) -> bool {
        let record = match self.provider.fetch(identity) {
            Ok(Some(rec)) => rec,
            Ok(None) => {
                tracing::warn!(identity, "identity provider has no record to sync");
                return false;
            }
            Err(e) => {
                tracing::warn!(identity, "identity sync failed: {e}");
                return false;
            }
        };

        // Full overwrite: the provider record is authoritative, including
        // fields it no longer carries.
        let patch = ProfilePatch {
            first_name: record.first_name,
            last_name: record.last_name,
            avatar_url: record.image_url,
        };
        match self.store.replace_display(identity, &patch) {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(identity, "identity sync write failed: {e}");
                false
            }
        }
    }

    /// Owner-only display update. Partial: fields the patch leaves `None`
    /// keep their current values.
    pub fn update_profile(&self, identity: &str, patch: &ProfilePatch) -> ServiceResult<bool> {
        Ok(self.store.update_display(identity, patch)?)
    }

    /// Role self-service, kept behind an explicit workspace flag. Off by
    /// default; deployments that want the development affordance opt in.
    pub fn set_role(&self, identity: &str, role: Role) -> ServiceResult<Profile> {
        if !self.allow_role_change {
            return Err(ServiceError::Validation(
                "role change is disabled for this workspace".to_string(),
            ));
        }
        // Make sure there is a row to update before flipping the role.
        self.resolve_profile(identity)?;
        self.store.set_role(identity, role)?;
        self.store
            .get_profile(identity)?
            .ok_or(ServiceError::NotFound)
    }

    /// Consumes one identity-provider webhook event. `user.created` seeds a
    /// profile exactly once; `user.updated` refreshes the mirror only.
    /// Returns whether a profile was created.
    pub fn handle_webhook(&self, payload: WebhookPayload) -> ServiceResult<bool> {
        let event_type = payload.event_type;
        let record = payload.data.into_record();
        self.store.record_identity(&record)?;

        if event_type != "user.created" {
            return Ok(false);
        }

        let now = Utc::now();
        let profile = Profile {
            user_id: record.user_id.clone(),
            role: Role::Student,
            first_name: record.first_name,
            last_name: record.last_name,
            avatar_url: record.image_url,
            created_at: now,
            updated_at: now,
        };
        match self.store.insert_profile(&profile) {
            Ok(()) => Ok(true),
            // Redelivered webhook; the profile already exists.
            Err(StoreError::Conflict(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
