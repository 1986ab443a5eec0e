// src/auth_manager.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser_host::{BrowserHost, PageProbe};
use crate::error::AppError;
use crate::portal_types::SessionCredentials;
use crate::storage::{keys, KeyValueStore};

pub const CSRF_COOKIE_NAME: &str = "CSRF_TOKEN";

static HR_PORTAL_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^hrportal\d+$").expect("valid tenant pattern"));

/// Tenant id from a portal page URL, e.g. `hrportal10234` from
/// `https://people.zoho.com/hrportal10234/zp#home`. The page must live on
/// `portal_origin`.
pub fn hr_id_from_page_url(page_url: &Url, portal_origin: &Url) -> Option<String> {
    if page_url.origin() != portal_origin.origin() {
        return None;
    }
    let first = page_url.path_segments()?.next()?;
    HR_PORTAL_SEGMENT
        .is_match(first)
        .then(|| first.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub struct AuthManager {
    host: Arc<dyn BrowserHost>,
    store: Arc<dyn KeyValueStore>,
    portal_origin: Url,
}

impl AuthManager {
    pub fn new(
        host: Arc<dyn BrowserHost>,
        store: Arc<dyn KeyValueStore>,
        portal_origin: Url,
    ) -> Self {
        Self {
            host,
            store,
            portal_origin,
        }
    }

    /// Stored credentials when all three are present, otherwise discovered
    /// from the host page and persisted.
    pub async fn get_credentials(&self) -> Result<SessionCredentials, AppError> {
        if let Some(stored) = self.stored_credentials().await? {
            debug!("Using stored session for {}", stored.hr_id);
            return Ok(stored);
        }
        self.fetch_credentials().await
    }

    async fn stored_credentials(&self) -> Result<Option<SessionCredentials>, AppError> {
        let found = self
            .store
            .get_many(&[keys::HR_ID, keys::CSRF_TOKEN, keys::USER_ID])
            .await?;
        let text = |key: &str| {
            non_empty(found.get(key).and_then(Value::as_str).map(str::to_string))
        };
        Ok(match (text(keys::HR_ID), text(keys::CSRF_TOKEN), text(keys::USER_ID)) {
            (Some(hr_id), Some(csrf_token), Some(user_id)) => Some(SessionCredentials {
                hr_id,
                csrf_token,
                user_id,
            }),
            _ => None,
        })
    }

    pub async fn fetch_credentials(&self) -> Result<SessionCredentials, AppError> {
        let tab_url = self.host.active_tab_url().await?;
        let origin = tab_url.origin().ascii_serialization();

        let csrf_token = self
            .host
            .cookie(&origin, CSRF_COOKIE_NAME)
            .await?
            .map(|cookie| cookie.value)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::CredentialsMissing("CSRF token not found".to_string()))?;

        let page_href = non_empty(self.host.evaluate_in_page(PageProbe::LocationHref).await?);
        let hr_id = page_href
            .as_deref()
            .and_then(|href| Url::parse(href).ok())
            .and_then(|page_url| hr_id_from_page_url(&page_url, &self.portal_origin))
            .ok_or_else(|| AppError::CredentialsMissing("HR ID not found".to_string()))?;

        let user_id = non_empty(self.host.evaluate_in_page(PageProbe::EmployeeId).await?)
            .ok_or_else(|| AppError::CredentialsMissing("User ID not found".to_string()))?;

        let credentials = SessionCredentials {
            hr_id,
            csrf_token,
            user_id,
        };

        let mut entries = Map::new();
        entries.insert(keys::HR_ID.to_string(), Value::from(credentials.hr_id.clone()));
        entries.insert(
            keys::CSRF_TOKEN.to_string(),
            Value::from(credentials.csrf_token.clone()),
        );
        entries.insert(keys::USER_ID.to_string(), Value::from(credentials.user_id.clone()));
        match non_empty(self.host.evaluate_in_page(PageProbe::LoginUserZuid).await?) {
            Some(zuid) => {
                entries.insert(keys::LOGIN_USER_ZUID.to_string(), Value::from(zuid));
            }
            None => warn!("Login user ZUID not found on page"),
        }
        self.store.set(entries).await?;

        info!(
            "Discovered session for tenant {} (employee {})",
            credentials.hr_id, credentials.user_id
        );
        Ok(credentials)
    }
}
