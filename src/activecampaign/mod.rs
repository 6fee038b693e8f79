//! ActiveCampaign v3 REST client.
//!
//! Listings (contacts, tags, automations, automation enrollments) go through
//! [`pagefetch::Fetcher`] and share one in-flight permit pool per client, so
//! running several listings at once still keeps at most `concurrency`
//! requests open against the account.

pub mod models;

use std::sync::Arc;

use pagefetch::{FetchConfig, FetchError, FetchOutcome, Fetcher, PageRequest, Paginated};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::errors::ClientError;
use crate::http::{HttpPageSource, USER_AGENT, read_json};
use crate::secrets::ActiveCampaignSecrets;

pub use models::{
    Automation, AutomationsPage, Contact, ContactAutomation, ContactAutomationsPage, ContactTag,
    ContactTagResponse, ContactTagsResponse, ContactsPage, Tag, TagsPage,
};

const VENDOR: &str = "ActiveCampaign";

/// Most items ActiveCampaign returns for one listing page.
pub const MAX_PAGE_SIZE: u64 = 100;

pub struct ActiveCampaignClient {
    http: reqwest::Client,
    base_url: String,
    fetch: FetchConfig,
    source: Arc<HttpPageSource>,
    permits: Arc<Semaphore>,
}

impl ActiveCampaignClient {
    pub fn new(secrets: &ActiveCampaignSecrets, fetch: FetchConfig) -> Result<Self, ClientError> {
        fetch.validate()?;
        if fetch.max_page_size > MAX_PAGE_SIZE {
            return Err(FetchError::InvalidConfig(format!(
                "max_page_size {} exceeds the {VENDOR} page cap of {MAX_PAGE_SIZE}",
                fetch.max_page_size
            ))
            .into());
        }

        let mut token = HeaderValue::from_str(secrets.api_key.trim())
            .map_err(|_| ClientError::InvalidApiKey { vendor: VENDOR })?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("Api-Token", token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(fetch.request_timeout)
            .build()
            .map_err(|source| ClientError::Http {
                vendor: VENDOR,
                source,
            })?;

        let base_url = format!("{}/api/3", secrets.url.trim().trim_end_matches('/'));
        let permits = Arc::new(Semaphore::new(fetch.concurrency));

        Ok(Self {
            source: Arc::new(HttpPageSource::new(http.clone())),
            http,
            base_url,
            fetch,
            permits,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Every contact in the account.
    pub async fn list_contacts(&self) -> Result<FetchOutcome<Contact>, ClientError> {
        self.list::<ContactsPage>(PageRequest::new(self.url("contacts")))
            .await
    }

    /// Every tag in the account.
    pub async fn list_tags(&self) -> Result<FetchOutcome<Tag>, ClientError> {
        self.list::<TagsPage>(PageRequest::new(self.url("tags"))).await
    }

    /// Every automation in the account.
    pub async fn list_automations(&self) -> Result<FetchOutcome<Automation>, ClientError> {
        self.list::<AutomationsPage>(PageRequest::new(self.url("automations")))
            .await
    }

    /// Every contact enrollment in one automation.
    pub async fn list_automation_contacts(
        &self,
        automation_id: &str,
    ) -> Result<FetchOutcome<ContactAutomation>, ClientError> {
        let request = PageRequest::new(self.url("contactAutomations"))
            .param("filters[seriesid]", automation_id);
        self.list::<ContactAutomationsPage>(request).await
    }

    async fn list<P: Paginated>(
        &self,
        request: PageRequest,
    ) -> Result<FetchOutcome<P::Item>, ClientError> {
        let fetcher = Fetcher::new(Arc::clone(&self.source), self.fetch.clone())?
            .with_permits(Arc::clone(&self.permits));
        Ok(fetcher.fetch_all::<P>(&request).await?)
    }

    /// Look up a contact by exact email address.
    pub async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>, ClientError> {
        let page: ContactsPage = self
            .get_json(&self.url("contacts"), &[("email", email)])
            .await?;
        let contact = page
            .contacts
            .into_iter()
            .find(|c| c.email.eq_ignore_ascii_case(email));
        debug!(email, found = contact.is_some(), "contact lookup");
        Ok(contact)
    }

    /// Look up a tag by name, case-insensitively.
    pub async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, ClientError> {
        let page: TagsPage = self.get_json(&self.url("tags"), &[("search", name)]).await?;
        Ok(page
            .tags
            .into_iter()
            .find(|t| t.tag.eq_ignore_ascii_case(name)))
    }

    /// Tags currently applied to a contact.
    pub async fn contact_tags(&self, contact_id: &str) -> Result<Vec<ContactTag>, ClientError> {
        let resp: ContactTagsResponse = self
            .get_json(&self.url(&format!("contacts/{contact_id}/contactTags")), &[])
            .await?;
        Ok(resp.contact_tags)
    }

    /// Apply a tag to a contact.
    pub async fn add_tag(&self, contact_id: &str, tag_id: &str) -> Result<ContactTag, ClientError> {
        let body = json!({ "contactTag": { "contact": contact_id, "tag": tag_id } });
        let resp = self
            .http
            .post(self.url("contactTags"))
            .json(&body)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                vendor: VENDOR,
                source,
            })?;
        let created: ContactTagResponse = read_json(VENDOR, resp).await?;
        info!(contact_id, tag_id, "tag added to contact");
        Ok(created.contact_tag)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                vendor: VENDOR,
                source,
            })?;
        read_json(VENDOR, resp).await
    }
}
