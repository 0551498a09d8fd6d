//! Fire-and-forget activity telemetry
//!
//! Tracking must never get in the way of the action being tracked: every
//! method reports success as a `bool` and swallows (after logging) any
//! failure.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, warn};

use promptly_core::activity::{
    ActivityResult, ActivityType, ActivityUser, LlmPlatform, TrackActivityRequest,
};

use crate::api::ApiClient;
use crate::{ClientError, Result};

/// Activity tracking service
///
/// Construct one per process and share it behind an `Arc`.
pub struct ActivityTracker {
    api: Arc<ApiClient>,
    enabled: AtomicBool,
}

impl ActivityTracker {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Report one activity.
    ///
    /// Returns `true` when the event was delivered or tracking is disabled,
    /// `false` when the user can't be identified or delivery failed.
    pub async fn track(
        &self,
        user: &ActivityUser,
        activity_type: ActivityType,
        activity_result: ActivityResult,
        activity_details: BTreeMap<String, String>,
    ) -> bool {
        if !self.is_enabled() {
            debug!("Activity tracking is disabled");
            return true;
        }

        match self
            .try_track(user, activity_type, activity_result, activity_details)
            .await
        {
            Ok(()) => true,
            Err(ClientError::MissingIdentity(reason)) => {
                warn!(
                    activity = %activity_type,
                    "Activity tracking skipped: {}", reason
                );
                false
            }
            Err(e) => {
                error!(activity = %activity_type, "Failed to track activity: {}", e);
                false
            }
        }
    }

    async fn try_track(
        &self,
        user: &ActivityUser,
        activity_type: ActivityType,
        activity_result: ActivityResult,
        activity_details: BTreeMap<String, String>,
    ) -> Result<()> {
        let user_id = user
            .identifier()
            .ok_or_else(|| ClientError::MissingIdentity("no user identifier".to_string()))?;
        let email = user
            .email()
            .ok_or_else(|| ClientError::MissingIdentity("no email".to_string()))?;

        let request = TrackActivityRequest {
            user_id: user_id.to_string(),
            email: email.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            activity_type,
            activity_result,
            activity_details,
        };

        self.api.track_activity(&request).await?;
        debug!(activity = %activity_type, "Activity tracked");
        Ok(())
    }

    pub async fn track_login(&self, user: &ActivityUser) -> bool {
        self.track(
            user,
            ActivityType::Login,
            ActivityResult::Success,
            BTreeMap::new(),
        )
        .await
    }

    pub async fn track_logout(&self, user: &ActivityUser, result: ActivityResult) -> bool {
        self.track(user, ActivityType::Logout, result, BTreeMap::new())
            .await
    }

    pub async fn track_profile_created(
        &self,
        user: &ActivityUser,
        profile_id: Option<&str>,
    ) -> bool {
        self.track_success(
            user,
            ActivityType::ProfileCreated,
            details([("profile_id", profile_id)]),
        )
        .await
    }

    pub async fn track_profile_updated(
        &self,
        user: &ActivityUser,
        profile_id: Option<&str>,
    ) -> bool {
        self.track_success(
            user,
            ActivityType::ProfileUpdated,
            details([("profile_id", profile_id)]),
        )
        .await
    }

    pub async fn track_persona_created(
        &self,
        user: &ActivityUser,
        persona_id: Option<&str>,
        profile_id: Option<&str>,
    ) -> bool {
        self.track_success(
            user,
            ActivityType::PersonaCreated,
            details([("persona_id", persona_id), ("profile_id", profile_id)]),
        )
        .await
    }

    pub async fn track_persona_updated(
        &self,
        user: &ActivityUser,
        persona_id: Option<&str>,
        profile_id: Option<&str>,
    ) -> bool {
        self.track_success(
            user,
            ActivityType::PersonaUpdated,
            details([("persona_id", persona_id), ("profile_id", profile_id)]),
        )
        .await
    }

    pub async fn track_template_created(
        &self,
        user: &ActivityUser,
        template_id: Option<&str>,
        profile_id: Option<&str>,
    ) -> bool {
        self.track_success(
            user,
            ActivityType::TemplateCreated,
            details([("template_id", template_id), ("profile_id", profile_id)]),
        )
        .await
    }

    pub async fn track_template_updated(
        &self,
        user: &ActivityUser,
        template_id: Option<&str>,
        profile_id: Option<&str>,
    ) -> bool {
        self.track_success(
            user,
            ActivityType::TemplateUpdated,
            details([("template_id", template_id), ("profile_id", profile_id)]),
        )
        .await
    }

    pub async fn track_prompt_created(
        &self,
        user: &ActivityUser,
        prompt_id: Option<&str>,
        profile_id: Option<&str>,
    ) -> bool {
        self.track_success(
            user,
            ActivityType::PromptCreated,
            details([("prompt_id", prompt_id), ("profile_id", profile_id)]),
        )
        .await
    }

    pub async fn track_prompt_executed(
        &self,
        user: &ActivityUser,
        platform: LlmPlatform,
        prompt_id: Option<&str>,
    ) -> bool {
        self.track_success(
            user,
            platform.executed_activity(),
            details([("llm_platform", Some(platform.as_str())), ("prompt_id", prompt_id)]),
        )
        .await
    }

    /// Report a failed action. `extra` entries override `error_message`.
    pub async fn track_error(
        &self,
        user: &ActivityUser,
        activity_type: ActivityType,
        error_message: &str,
        extra: BTreeMap<String, String>,
    ) -> bool {
        let mut activity_details = BTreeMap::from([(
            "error_message".to_string(),
            error_message.to_string(),
        )]);
        activity_details.extend(extra);

        self.track(user, activity_type, ActivityResult::Failure, activity_details)
            .await
    }

    async fn track_success(
        &self,
        user: &ActivityUser,
        activity_type: ActivityType,
        activity_details: BTreeMap<String, String>,
    ) -> bool {
        self.track(user, activity_type, ActivityResult::Success, activity_details)
            .await
    }
}

/// Detail map from the entries that have a non-empty value
fn details<const N: usize>(entries: [(&str, Option<&str>); N]) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| (key.to_string(), v.to_string()))
        })
        .collect()
}
