use reqwest::blocking::{Client, Request};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::cache::RepositorySource;
use crate::credentials::Credentials;

pub const PER_PAGE: u32 = 100;
pub const GITHUB_JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("github-opener-cli/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub html_url: String,
}

/// Blocking client for the two endpoints the refresh needs.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_base: String,
}

impl GithubClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn organizations_request(
        &self,
        credentials: &Credentials,
    ) -> Result<Request, GithubApiError> {
        self.http
            .get(format!("{}/user/orgs", self.api_base))
            .header(AUTHORIZATION, credentials.bearer())
            .header(ACCEPT, GITHUB_JSON_MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .build()
            .map_err(|source| GithubApiError::Transport { source })
    }

    pub fn repositories_request(
        &self,
        credentials: &Credentials,
        org: &str,
        page: u32,
    ) -> Result<Request, GithubApiError> {
        self.http
            .get(format!("{}/orgs/{org}/repos", self.api_base))
            .query(&[("page", page), ("per_page", PER_PAGE)])
            .header(AUTHORIZATION, credentials.bearer())
            .header(ACCEPT, GITHUB_JSON_MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .build()
            .map_err(|source| GithubApiError::Transport { source })
    }

    fn execute(&self, request: Request) -> Result<(u16, String), GithubApiError> {
        let response = self
            .http
            .execute(request)
            .map_err(|source| GithubApiError::Transport { source })?;

        let status_code = response.status().as_u16();
        let body = response
            .text()
            .map_err(|source| GithubApiError::Transport { source })?;

        Ok((status_code, body))
    }
}

impl RepositorySource for GithubClient {
    fn list_user_organizations(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Organization>, GithubApiError> {
        let request = self.organizations_request(credentials)?;
        let (status_code, body) = self.execute(request)?;
        parse_organizations_response(status_code, &body)
    }

    fn list_organization_repositories(
        &self,
        credentials: &Credentials,
        org: &str,
        page: u32,
    ) -> Result<Vec<RepositoryRef>, GithubApiError> {
        let request = self.repositories_request(credentials, org, page)?;
        let (status_code, body) = self.execute(request)?;
        parse_repositories_page(status_code, &body)
    }
}

pub fn parse_organizations_response(
    status_code: u16,
    body: &str,
) -> Result<Vec<Organization>, GithubApiError> {
    if !(200..=299).contains(&status_code) {
        return Err(GithubApiError::Http {
            status: status_code,
            message: error_message_or_status(status_code, body),
        });
    }

    let payload: Vec<OrganizationPayload> =
        serde_json::from_str(body).map_err(GithubApiError::InvalidResponse)?;

    Ok(payload
        .into_iter()
        .map(|org| Organization { login: org.login })
        .collect())
}

/// The status code is deliberately not checked here: any JSON array is taken
/// as repository data. A non-array body (GitHub's error object) aborts the
/// refresh instead of being read as repositories.
pub fn parse_repositories_page(
    status_code: u16,
    body: &str,
) -> Result<Vec<RepositoryRef>, GithubApiError> {
    let value: Value = serde_json::from_str(body).map_err(GithubApiError::InvalidResponse)?;

    if !value.is_array() {
        return Err(GithubApiError::UnexpectedPayload {
            status: status_code,
            message: error_message_or_status(status_code, body),
        });
    }

    let payload: Vec<RepositoryPayload> =
        serde_json::from_value(value).map_err(GithubApiError::InvalidResponse)?;

    Ok(payload
        .into_iter()
        .map(|repo| RepositoryRef {
            html_url: repo.html_url,
        })
        .collect())
}

fn error_message_or_status(status_code: u16, body: &str) -> String {
    extract_error_message(body).unwrap_or_else(|| format!("HTTP {status_code}"))
}

fn extract_error_message(body: &str) -> Option<String> {
    let payload = serde_json::from_str::<ErrorPayload>(body).ok()?;
    let message = payload.message?.trim().to_string();
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}

#[derive(Debug, Error)]
pub enum GithubApiError {
    #[error("github api request failed")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("github api error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("invalid github api response")]
    InvalidResponse(#[source] serde_json::Error),
    #[error("github api returned a non-list payload ({status}): {message}")]
    UnexpectedPayload { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct OrganizationPayload {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
}
