use thiserror::Error;
use tracing::{debug, info};

use crate::credentials::Credentials;
use crate::github_api::{GithubApiError, Organization, RepositoryRef};

/// Endpoints the refresh walks. Implemented by the HTTP client and by fakes.
pub trait RepositorySource {
    fn list_user_organizations(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Organization>, GithubApiError>;

    fn list_organization_repositories(
        &self,
        credentials: &Credentials,
        org: &str,
        page: u32,
    ) -> Result<Vec<RepositoryRef>, GithubApiError>;
}

/// Repository URLs in fetch order. Only ever replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryCache {
    urls: Vec<String>,
}

impl RepositoryCache {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Clears the cache, fetches every organization's repositories, and
    /// installs the result. On failure the cache is left empty.
    pub fn refresh<S>(
        &mut self,
        source: &S,
        credentials: &Credentials,
    ) -> Result<(), RefreshError>
    where
        S: RepositorySource + ?Sized,
    {
        self.urls = Vec::new();
        self.urls = fetch_all_repository_urls(source, credentials)?;
        info!(count = self.urls.len(), "fetched repositories");
        Ok(())
    }
}

pub fn fetch_all_repository_urls<S>(
    source: &S,
    credentials: &Credentials,
) -> Result<Vec<String>, RefreshError>
where
    S: RepositorySource + ?Sized,
{
    let orgs = source
        .list_user_organizations(credentials)
        .map_err(RefreshError::Organizations)?;

    let mut urls = Vec::new();
    for org in &orgs {
        info!(org = %org.login, "fetching repositories");
        let mut page = 1;
        loop {
            let repos = source
                .list_organization_repositories(credentials, &org.login, page)
                .map_err(|source| RefreshError::Repositories {
                    org: org.login.clone(),
                    page,
                    source,
                })?;

            if repos.is_empty() {
                break;
            }

            debug!(org = %org.login, page, count = repos.len(), "fetched page");
            urls.extend(repos.into_iter().map(|repo| repo.html_url));
            page += 1;
        }
    }

    Ok(urls)
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to list organizations: {0}")]
    Organizations(#[source] GithubApiError),
    #[error("failed to list repositories of {org}, page {page}: {source}")]
    Repositories {
        org: String,
        page: u32,
        #[source]
        source: GithubApiError,
    },
}
