//! Client for the service listing available project templates.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const TIMEOUT: Duration = Duration::from_secs(5);

/// A template as listed by the template service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectTemplate {
    /// Display name.
    pub name: String,
    /// npm package holding the template.
    #[serde(rename = "npmName")]
    pub npm_name: String,
    pub version: String,
}

pub struct TemplateClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl TemplateClient {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("eit/", env!("CARGO_PKG_VERSION")))
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Every template the service offers, in service order.
    pub fn list_templates(&self) -> Result<Vec<ProjectTemplate>> {
        debug!("fetching templates from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .with_context(|| format!("Failed to query templates from {}", self.url))?;

        if !response.status().is_success() {
            bail!(
                "Template service {} answered with status {}",
                self.url,
                response.status()
            );
        }

        let templates: Vec<ProjectTemplate> = response
            .json()
            .with_context(|| format!("Failed to parse the template list from {}", self.url))?;
        debug!("{} template(s) available", templates.len());
        Ok(templates)
    }
}
