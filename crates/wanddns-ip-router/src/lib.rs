// # Router IP Resolver
//
// This crate provides an `IpResolver` that reads the WAN IP from the router's
// own web interface.
//
// ## Architecture
//
// Each resolution opens a fresh WebDriver session against a headless Chrome
// (usually `chromedriver` on port 9515), logs into the router, loads the status
// page and scans its table cells for the first IPv4-shaped value. The session
// is closed before the call returns, whatever happened in between.
//
// ## Supported Firmware
//
// The login form ids (`txt_Username`, `txt_Password`, `loginbutton`) and the
// post-login landing page (`index.asp`) match Huawei HG8247Q-style ONT
// firmware. The status page path is configurable.

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use scraper::{Html, Selector};
use std::time::Duration;
use wanddns_core::config::RouterConfig;
use wanddns_core::traits::IpResolver;
use wanddns_core::{Error, Result, WanIp};

/// Bounded wait for the login form to render
const LOGIN_FORM_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed delay after submitting the login form
const LOGIN_SETTLE_DELAY: Duration = Duration::from_secs(3);

const USERNAME_FIELD_ID: &str = "txt_Username";
const PASSWORD_FIELD_ID: &str = "txt_Password";
const LOGIN_BUTTON_ID: &str = "loginbutton";

/// Fragment of the URL the router redirects to after a successful login
const LOGGED_IN_URL_MARKER: &str = "index.asp";

/// Resolver scraping the router's status page through a headless browser
pub struct RouterResolver {
    config: RouterConfig,
    settle_delay: Duration,
}

impl RouterResolver {
    /// Create a new router resolver
    pub fn new(config: RouterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            settle_delay: LOGIN_SETTLE_DELAY,
        })
    }

    /// Open a headless Chrome session through the WebDriver endpoint
    async fn connect(&self) -> Result<Client> {
        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".to_string(), chrome_options());

        ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.config.webdriver_url)
            .await
            .map_err(|e| {
                Error::ip_source(format!(
                    "Failed to start browser session at {}: {e}",
                    self.config.webdriver_url
                ))
            })
    }

    /// Log in and return the status page source
    async fn fetch_status_page(&self, client: &Client) -> Result<String> {
        client
            .goto(&self.config.login_url())
            .await
            .map_err(|e| Error::ip_source(format!("Failed to load login page: {e}")))?;

        let username = client
            .wait()
            .at_most(LOGIN_FORM_TIMEOUT)
            .for_element(Locator::Id(USERNAME_FIELD_ID))
            .await
            .map_err(|e| Error::ip_source(format!("Login form did not appear: {e}")))?;
        username
            .send_keys(&self.config.username)
            .await
            .map_err(|e| Error::ip_source(format!("Failed to enter username: {e}")))?;

        client
            .find(Locator::Id(PASSWORD_FIELD_ID))
            .await
            .map_err(|e| Error::ip_source(format!("Password field not found: {e}")))?
            .send_keys(&self.config.password)
            .await
            .map_err(|e| Error::ip_source(format!("Failed to enter password: {e}")))?;

        client
            .find(Locator::Id(LOGIN_BUTTON_ID))
            .await
            .map_err(|e| Error::ip_source(format!("Login button not found: {e}")))?
            .click()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to submit login form: {e}")))?;

        tokio::time::sleep(self.settle_delay).await;

        let landed = client
            .current_url()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read current URL: {e}")))?;
        if !login_succeeded(landed.as_str()) {
            return Err(Error::auth(format!(
                "Router login rejected (landed on {landed})"
            )));
        }
        tracing::info!("Router login successful");

        client
            .goto(&self.config.status_url())
            .await
            .map_err(|e| Error::ip_source(format!("Failed to load status page: {e}")))?;

        client
            .source()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read status page: {e}")))
    }
}

impl std::fmt::Debug for RouterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterResolver")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl IpResolver for RouterResolver {
    async fn resolve_wan_ip(&self) -> Result<WanIp> {
        let client = self.connect().await?;

        let page = self.fetch_status_page(&client).await;

        if let Err(e) = client.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }

        let page = page?;
        match find_wan_ip(&page) {
            Some(ip) => {
                tracing::info!("Public IP: {}", ip);
                Ok(ip)
            }
            None => Err(Error::ip_source("Could not find public IP on status page")),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "router"
    }
}

/// Chrome flags for an invisible fixed-size window
fn chrome_options() -> serde_json::Value {
    serde_json::json!({
        "args": ["--headless", "--disable-gpu", "--window-size=1920,1080"]
    })
}

/// True when the post-login URL is the router's landing page
pub fn login_succeeded(current_url: &str) -> bool {
    current_url.contains(LOGGED_IN_URL_MARKER)
}

/// Return the first `<td>` whose trimmed text is IPv4-shaped
///
/// Cells are visited in document order and their text includes all nested
/// elements.
pub fn find_wan_ip(html: &str) -> Option<WanIp> {
    let document = Html::parse_document(html);
    let cells = Selector::parse("td").ok()?;

    document
        .select(&cells)
        .map(|cell| cell.text().collect::<String>())
        .find_map(|text| WanIp::from_ipv4_shaped(&text))
}
