// src/browser_host.rs
//
// The page the user is signed in on. The terminal front end has no real
// browser, so `SessionHost` answers from configured values.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;
use url::Url;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("No active tab")]
    NoActiveTab,

    #[error("URL parsing error")]
    UrlParse(#[from] url::ParseError),
}

/// Values read from inside the active page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageProbe {
    LocationHref,
    /// `empid` attribute of the signed-in user's avatar.
    EmployeeId,
    LoginUserZuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

#[async_trait]
pub trait BrowserHost: Send + Sync {
    async fn active_tab_url(&self) -> Result<Url, HostError>;

    async fn cookie(&self, origin: &str, name: &str) -> Result<Option<Cookie>, HostError>;

    /// `None` when the page has no such value.
    async fn evaluate_in_page(&self, probe: PageProbe) -> Result<Option<String>, HostError>;

    async fn reload_active_tab(&self) -> Result<(), HostError>;

    async fn navigate_active_tab(&self, url: &str) -> Result<(), HostError>;
}

/// Parses a raw `Cookie` header into its pairs.
pub fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Cookie {
                name: name.to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SessionHostSettings {
    /// URL of the portal page the user has open.
    pub page_url: Option<String>,
    pub cookie_header: Option<String>,
    pub employee_id: Option<String>,
    pub login_user_zuid: Option<String>,
}

/// Host backed by the session values the user exported from the browser.
/// Navigation only moves the recorded URL and reports it.
#[derive(Debug)]
pub struct SessionHost {
    settings: SessionHostSettings,
    current_url: Mutex<Option<String>>,
    cookies: Vec<Cookie>,
}

impl SessionHost {
    pub fn new(settings: SessionHostSettings) -> Self {
        let cookies = settings
            .cookie_header
            .as_deref()
            .map(parse_cookie_header)
            .unwrap_or_default();
        Self {
            current_url: Mutex::new(settings.page_url.clone()),
            settings,
            cookies,
        }
    }
}

#[async_trait]
impl BrowserHost for SessionHost {
    async fn active_tab_url(&self) -> Result<Url, HostError> {
        let current = self.current_url.lock().await;
        let url = current.as_deref().ok_or(HostError::NoActiveTab)?;
        Ok(Url::parse(url)?)
    }

    async fn cookie(&self, _origin: &str, name: &str) -> Result<Option<Cookie>, HostError> {
        Ok(self.cookies.iter().find(|cookie| cookie.name == name).cloned())
    }

    async fn evaluate_in_page(&self, probe: PageProbe) -> Result<Option<String>, HostError> {
        Ok(match probe {
            PageProbe::LocationHref => self.current_url.lock().await.clone(),
            PageProbe::EmployeeId => self.settings.employee_id.clone(),
            PageProbe::LoginUserZuid => self.settings.login_user_zuid.clone(),
        })
    }

    async fn reload_active_tab(&self) -> Result<(), HostError> {
        info!("Session reset; sign in again in the browser and re-export the session");
        Ok(())
    }

    async fn navigate_active_tab(&self, url: &str) -> Result<(), HostError> {
        Url::parse(url)?;
        info!("Open {} to continue", url);
        *self.current_url.lock().await = Some(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::runtime::Runtime;

    #[test]
    fn cookie_header_pairs_are_trimmed() {
        let cookies = parse_cookie_header(" CSRF_TOKEN=abc ; JSESSIONID=x=y;;broken");
        assert_eq!(
            cookies,
            vec![
                Cookie {
                    name: "CSRF_TOKEN".to_string(),
                    value: "abc".to_string()
                },
                Cookie {
                    name: "JSESSIONID".to_string(),
                    value: "x=y".to_string()
                },
            ]
        );
    }

    #[test]
    fn session_host_answers_from_settings() {
        let rt = Runtime::new().unwrap();
        let host = SessionHost::new(SessionHostSettings {
            page_url: Some("https://people.zoho.com/hrportal1/zp#home".to_string()),
            cookie_header: Some("CSRF_TOKEN=abc".to_string()),
            employee_id: Some("4711".to_string()),
            login_user_zuid: None,
        });

        rt.block_on(async {
            let url = host.active_tab_url().await.unwrap();
            assert_eq!(url.host_str(), Some("people.zoho.com"));
            let origin = url.origin().ascii_serialization();
            let csrf = host.cookie(&origin, "CSRF_TOKEN").await.unwrap();
            assert_eq!(csrf.unwrap().value, "abc");
            assert_eq!(
                host.evaluate_in_page(PageProbe::EmployeeId).await.unwrap(),
                Some("4711".to_string())
            );
            assert_eq!(
                host.evaluate_in_page(PageProbe::LoginUserZuid).await.unwrap(),
                None
            );

            host.navigate_active_tab("https://accounts.zoho.com/signin")
                .await
                .unwrap();
            assert_eq!(
                host.evaluate_in_page(PageProbe::LocationHref).await.unwrap(),
                Some("https://accounts.zoho.com/signin".to_string())
            );
        });
    }

    #[test]
    fn session_host_without_page_has_no_tab() {
        let rt = Runtime::new().unwrap();
        let host = SessionHost::new(SessionHostSettings::default());
        let result = rt.block_on(host.active_tab_url());
        assert!(matches!(result, Err(HostError::NoActiveTab)));
    }
}
