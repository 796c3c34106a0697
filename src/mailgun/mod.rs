//! Mailgun templates API client.
//!
//! `TemplateApi` is the seam the migration runs against; `MailgunClient` is the
//! reqwest implementation talking to the real REST endpoint.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::*;
use reqwest::multipart::Form;
use reqwest::{Client, Response, Url};
use std::time::Duration;
use tracing::{debug, instrument};

const TIMEOUT: Duration = Duration::from_secs(30);
const API_USER: &str = "api";

/// The four template operations a migration needs.
pub trait TemplateApi {
    /// One page of templates on the source domain, starting after `after`
    /// (or from the beginning when `None`). An empty page ends the listing.
    async fn list_page(&self, after: Option<&str>) -> Result<Vec<TemplateSummary>>;

    /// The active version of a template on the source domain.
    async fn fetch_template(&self, name: &str) -> Result<TemplateDetail>;

    /// Store a template on the destination domain.
    async fn create_template(&self, template: &NewTemplate) -> Result<CreateTemplateResponse>;

    /// Remove a template from the source domain.
    async fn delete_template(&self, name: &str) -> Result<()>;
}

pub struct MailgunClient {
    client: Client,
    base_url: Url,
    old_domain: String,
    new_domain: String,
    api_key: String,
}

impl MailgunClient {
    pub fn new(config: &Config) -> Result<Self> {
        if config.base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Base URL {} cannot hold path segments",
                config.base_url
            )));
        }

        let client = Client::builder().timeout(TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            old_domain: config.old_domain.clone(),
            new_domain: config.new_domain.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// `{base}/{domain}/templates[/{name}]`, with each segment percent-encoded.
    fn templates_url(&self, domain: &str, name: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(domain).push("templates");
            if let Some(name) = name {
                segments.push(name);
            }
        }
        url
    }

    /// Only 200 counts as success for this API.
    async fn check_status(resp: Response) -> Result<Response> {
        match resp.status().as_u16() {
            200 => Ok(resp),
            429 => Err(Error::RateLimited),
            500..=599 => Err(Error::Server(resp.status().to_string())),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(Error::Status { status, body })
            }
        }
    }
}

impl TemplateApi for MailgunClient {
    #[instrument(skip(self))]
    async fn list_page(&self, after: Option<&str>) -> Result<Vec<TemplateSummary>> {
        let mut url = self.templates_url(&self.old_domain, None);
        if let Some(last) = after {
            url.query_pairs_mut()
                .append_pair("page", "next")
                .append_pair("p", last);
        }

        debug!(url = %url, "Listing templates");
        let resp = self.client
            .get(url)
            .basic_auth(API_USER, Some(&self.api_key))
            .send().await?;
        let resp = Self::check_status(resp).await?;

        let page: TemplateListResponse = resp.json().await?;
        debug!(count = page.items.len(), "Received template page");
        Ok(page.items)
    }

    #[instrument(skip(self))]
    async fn fetch_template(&self, name: &str) -> Result<TemplateDetail> {
        let mut url = self.templates_url(&self.old_domain, Some(name));
        url.query_pairs_mut().append_pair("active", "yes");

        debug!(url = %url, "Fetching template");
        let resp = self.client
            .get(url)
            .basic_auth(API_USER, Some(&self.api_key))
            .send().await?;
        let resp = Self::check_status(resp).await?;

        let body: TemplateResponse = resp.json().await?;
        Ok(body.template)
    }

    #[instrument(skip(self, template), fields(name = %template.name))]
    async fn create_template(&self, template: &NewTemplate) -> Result<CreateTemplateResponse> {
        let url = self.templates_url(&self.new_domain, None);
        let headers = serde_json::to_string(&template.headers)?;

        let form = Form::new()
            .text("name", template.name.clone())
            .text("description", template.description.clone())
            .text("template", template.template.clone())
            .text("headers", headers);

        debug!(url = %url, "Creating template");
        let resp = self.client
            .post(url)
            .basic_auth(API_USER, Some(&self.api_key))
            .multipart(form)
            .send().await?;
        let resp = Self::check_status(resp).await?;

        let created: CreateTemplateResponse = resp.json().await?;
        if !created.is_stored() {
            // Any 200 counts as created; the message is informational.
            debug!(message = %created.message, "Create returned an unexpected message");
        }
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn delete_template(&self, name: &str) -> Result<()> {
        let url = self.templates_url(&self.old_domain, Some(name));

        debug!(url = %url, "Deleting template");
        let resp = self.client
            .post(url)
            .basic_auth(API_USER, Some(&self.api_key))
            .send().await?;
        let resp = Self::check_status(resp).await?;

        let body: MessageResponse = resp.json().await?;
        if body.message != DELETED_MESSAGE {
            return Err(Error::UnexpectedMessage {
                expected: DELETED_MESSAGE.into(),
                actual: body.message,
            });
        }
        Ok(())
    }
}
