//! SSO login and the authenticated HTTP session.
//!
//! The portal sits behind a form-based single sign-on with a fixed
//! three-request handshake:
//!
//! 1. `GET` the login URL. Redirects land on the SSO login form, whose
//!    hidden inputs are collected.
//! 2. `POST` those fields plus the credentials (`IDToken1`/`IDToken2`) to
//!    the URL the redirects ended on.
//! 3. The reply carries an auto-submit form named `Response`. Its hidden
//!    inputs are `POST`ed to its `action` URL, which sets the portal cookies.
//!
//! Any deviation from that page shape is a [`RunnerError::Auth`]. The final
//! `POST` is not checked beyond transport success.

use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::error::RunnerError;

/// Form field carrying the SSO identity.
pub const IDENTITY_FIELD: &str = "IDToken1";

/// Form field carrying the SSO password.
pub const SECRET_FIELD: &str = "IDToken2";

/// `name` attribute of the SSO response form.
pub const RESPONSE_FORM_NAME: &str = "Response";

const HIDDEN_INPUT_SELECTOR: &str = r#"input[type="hidden"]"#;

/// An HTTP client carrying the portal's session cookies.
///
/// Created by [`login`], used for the listing fetch and released with
/// [`AuthenticatedSession::close`] at the end of a run.
#[derive(Debug)]
pub struct AuthenticatedSession {
    client: Client,
}

impl AuthenticatedSession {
    /// Fetch `url` with the session cookies and return the body.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Fetch`] on transport failure or a non-2xx
    /// status.
    pub async fn fetch_page(&self, url: &str) -> Result<String, RunnerError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RunnerError::Fetch(format!("GET {url} failed: {e}")))?
            .error_for_status()
            .map_err(|e| RunnerError::Fetch(format!("GET {url} returned error: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| RunnerError::Fetch(format!("reading {url} failed: {e}")))?;

        debug!(url, bytes = body.len(), "fetched page");
        Ok(body)
    }

    /// Release the session and its cookies.
    pub fn close(self) {
        drop(self.client);
        info!("closed portal session");
    }
}

/// Log in through the SSO handshake.
///
/// # Errors
///
/// Returns [`RunnerError::Auth`] if a page is missing its hidden fields or
/// the `Response` form, and [`RunnerError::Fetch`] on transport failure.
pub async fn login(
    login_url: &str,
    identity: &str,
    secret: &str,
) -> Result<AuthenticatedSession, RunnerError> {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .map_err(|e| RunnerError::Fetch(format!("failed to build HTTP client: {e}")))?;

    // Step 1: follow the login URL to the SSO form
    let response = client
        .get(login_url)
        .send()
        .await
        .map_err(|e| RunnerError::Fetch(format!("GET {login_url} failed: {e}")))?;
    let form_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| RunnerError::Fetch(format!("reading {form_url} failed: {e}")))?;

    let mut form = HiddenForm::from_html(&body)?;
    form.set(IDENTITY_FIELD, identity);
    form.set(SECRET_FIELD, secret);
    debug!(url = %form_url, fields = form.len(), "submitting SSO credentials");

    // Step 2: submit credentials to the post-redirect URL
    let response = client
        .post(form_url.clone())
        .form(form.fields())
        .send()
        .await
        .map_err(|e| RunnerError::Fetch(format!("POST {form_url} failed: {e}")))?;
    let reply_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| RunnerError::Fetch(format!("reading {reply_url} failed: {e}")))?;

    // Step 3: relay the SSO response form to its target
    let relay = ResponseForm::from_html(&body, &reply_url)?;
    debug!(action = %relay.action, fields = relay.fields.len(), "relaying SSO response");

    client
        .post(relay.action.clone())
        .form(relay.fields.fields())
        .send()
        .await
        .map_err(|e| RunnerError::Fetch(format!("POST {} failed: {e}", relay.action)))?;

    info!("logged in to SSO successfully");
    Ok(AuthenticatedSession { client })
}

/// Hidden `name`/`value` pairs from a page, in document order.
///
/// Setting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenForm {
    fields: Vec<(String, String)>,
}

impl HiddenForm {
    /// Collect every `<input type="hidden">` on the page.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Auth`] if the page has no hidden inputs or an
    /// input lacks a `name` or `value`.
    pub fn from_html(html: &str) -> Result<Self, RunnerError> {
        let document = Html::parse_document(html);
        Self::from_document(&document)
    }

    fn from_document(document: &Html) -> Result<Self, RunnerError> {
        let selector = selector(HIDDEN_INPUT_SELECTOR)?;
        let mut form = Self::default();

        for input in document.select(&selector) {
            let element = input.value();
            let name = element.attr("name").ok_or_else(|| {
                RunnerError::Auth("hidden input without a name attribute".to_owned())
            })?;
            let value = element.attr("value").ok_or_else(|| {
                RunnerError::Auth(format!("hidden input {name:?} has no value attribute"))
            })?;
            form.set(name, value);
        }

        if form.is_empty() {
            return Err(RunnerError::Auth(
                "no hidden form fields found on SSO page".to_owned(),
            ));
        }
        Ok(form)
    }

    /// Set `name` to `value`, replacing any earlier value.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|(n, _)| n == name) {
            value.clone_into(&mut field.1);
        } else {
            self.fields.push((name.to_owned(), value.to_owned()));
        }
    }

    /// Value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All fields in order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Number of fields.
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields.
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The SSO `Response` form: where to post, and what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseForm {
    /// Absolute submission URL.
    pub action: Url,
    /// Hidden fields to submit.
    pub fields: HiddenForm,
}

impl ResponseForm {
    /// Extract the `Response` form from the page served at `page_url`.
    ///
    /// A relative `action` is resolved against `page_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Auth`] if the form, its `action`, or the
    /// page's hidden fields are missing.
    pub fn from_html(html: &str, page_url: &Url) -> Result<Self, RunnerError> {
        let document = Html::parse_document(html);
        let form_selector = selector(&format!(r#"[name="{RESPONSE_FORM_NAME}"]"#))?;

        let form = document.select(&form_selector).next().ok_or_else(|| {
            RunnerError::Auth(format!(
                "SSO reply from {page_url} has no {RESPONSE_FORM_NAME:?} form"
            ))
        })?;
        let action = form.value().attr("action").ok_or_else(|| {
            RunnerError::Auth(format!("{RESPONSE_FORM_NAME:?} form has no action attribute"))
        })?;
        let action = page_url.join(action).map_err(|e| {
            RunnerError::Auth(format!("invalid {RESPONSE_FORM_NAME:?} form action {action:?}: {e}"))
        })?;

        Ok(Self {
            action,
            fields: HiddenForm::from_document(&document)?,
        })
    }
}

/// Compile a built-in CSS selector.
pub(crate) fn selector(css: &str) -> Result<Selector, RunnerError> {
    Selector::parse(css).map_err(|e| RunnerError::Parse(format!("invalid selector {css:?}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SSO_LOGIN_PAGE: &str = r#"
        <html><body>
          <form method="post">
            <input type="hidden" name="goto" value="https://portal.example/students">
            <input type="hidden" name="SunQueryParamsString" value="cmVhbG09L3V0ZXhhcw==">
            <input type="hidden" name="IDToken1" value="">
            <input type="text" name="visible" value="ignored">
          </form>
        </body></html>
    "#;

    const SSO_REPLY_PAGE: &str = r#"
        <html><body onload="document.forms[0].submit()">
          <form name="Response" method="post" action="/sso/relay">
            <input type="hidden" name="SAMLResponse" value="PHNhbWw+">
            <input type="hidden" name="RelayState" value="students">
          </form>
        </body></html>
    "#;

    fn page_url() -> Url {
        Url::parse("https://login.example.edu/idp/login").unwrap()
    }

    #[test]
    fn hidden_fields_are_collected_in_order() {
        let form = HiddenForm::from_html(SSO_LOGIN_PAGE).unwrap();
        let names: Vec<_> = form.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["goto", "SunQueryParamsString", "IDToken1"]);
        assert_eq!(form.get("visible"), None);
    }

    #[test]
    fn credentials_replace_existing_fields() {
        let mut form = HiddenForm::from_html(SSO_LOGIN_PAGE).unwrap();
        form.set(IDENTITY_FIELD, "abc123");
        form.set(SECRET_FIELD, "hunter2");

        assert_eq!(form.len(), 4);
        assert_eq!(form.get(IDENTITY_FIELD), Some("abc123"));
        assert_eq!(form.get(SECRET_FIELD), Some("hunter2"));
    }

    #[test]
    fn repeated_hidden_name_keeps_position_and_last_value() {
        let html = r#"
            <input type="hidden" name="goto" value="/first">
            <input type="hidden" name="realm" value="utexas">
            <input type="hidden" name="goto" value="/second">
        "#;
        let form = HiddenForm::from_html(html).unwrap();

        assert_eq!(form.len(), 2);
        assert!(!form.is_empty());
        assert_eq!(form.get("goto"), Some("/second"));
        assert_eq!(
            form.fields(),
            &[
                ("goto".to_owned(), "/second".to_owned()),
                ("realm".to_owned(), "utexas".to_owned()),
            ]
        );
    }

    #[test]
    fn page_without_hidden_fields_is_auth_error() {
        let result = HiddenForm::from_html("<html><body><p>Maintenance</p></body></html>");
        assert!(matches!(result, Err(RunnerError::Auth(_))));
    }

    #[test]
    fn hidden_input_without_value_is_auth_error() {
        let result = HiddenForm::from_html(r#"<input type="hidden" name="goto">"#);
        assert!(matches!(result, Err(RunnerError::Auth(msg)) if msg.contains("goto")));
    }

    #[test]
    fn response_form_resolves_relative_action() {
        let form = ResponseForm::from_html(SSO_REPLY_PAGE, &page_url()).unwrap();
        assert_eq!(form.action.as_str(), "https://login.example.edu/sso/relay");
        assert_eq!(form.fields.get("SAMLResponse"), Some("PHNhbWw+"));
        assert_eq!(form.fields.len(), 2);
    }

    #[test]
    fn missing_response_form_is_auth_error() {
        let html = r#"<form name="Login"><input type="hidden" name="a" value="b"></form>"#;
        let result = ResponseForm::from_html(html, &page_url());
        assert!(matches!(result, Err(RunnerError::Auth(msg)) if msg.contains("Response")));
    }

    #[test]
    fn response_form_without_action_is_auth_error() {
        let html = r#"<form name="Response"><input type="hidden" name="a" value="b"></form>"#;
        let result = ResponseForm::from_html(html, &page_url());
        assert!(matches!(result, Err(RunnerError::Auth(msg)) if msg.contains("action")));
    }
}
