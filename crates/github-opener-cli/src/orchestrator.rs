use std::collections::BTreeMap;

use launcher_core::{Feedback, HostEvent};
use thiserror::Error;
use tracing::info;

use crate::action::{Action, ActionError};
use crate::cache::{RefreshError, RepositoryCache, RepositorySource};
use crate::config::API_KEY_PREFERENCE;
use crate::credentials::Credentials;
use crate::feedback;
use crate::matcher::FuzzyMatcher;
use crate::opener::UrlOpener;

/// What the host should do after an event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Render(Feedback),
    Handled,
}

/// Owns the credentials, preferences and repository cache, and reacts to the
/// launcher's lifecycle events. Handlers run one at a time through `&mut self`.
#[derive(Debug)]
pub struct Orchestrator<S, M, O> {
    source: S,
    matcher: M,
    opener: O,
    preferences: BTreeMap<String, String>,
    credentials: Credentials,
    cache: RepositoryCache,
}

impl<S, M, O> Orchestrator<S, M, O>
where
    S: RepositorySource,
    M: FuzzyMatcher,
    O: UrlOpener,
{
    pub fn new(source: S, matcher: M, opener: O) -> Self {
        Self {
            source,
            matcher,
            opener,
            preferences: BTreeMap::new(),
            credentials: Credentials::default(),
            cache: RepositoryCache::default(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn cache(&self) -> &RepositoryCache {
        &self.cache
    }

    pub fn preferences(&self) -> &BTreeMap<String, String> {
        &self.preferences
    }

    pub fn handle(&mut self, event: HostEvent) -> Result<Response, OrchestratorError> {
        match event {
            HostEvent::PreferencesLoaded { preferences } => {
                self.on_preferences_loaded(preferences)?;
                Ok(Response::Handled)
            }
            HostEvent::PreferencesChanged { id, new_value } => {
                self.on_preferences_changed(id, new_value.unwrap_or_default())?;
                Ok(Response::Handled)
            }
            HostEvent::Query { argument } => Ok(Response::Render(
                self.on_query(argument.as_deref().unwrap_or_default()),
            )),
            HostEvent::ItemSelected { data } => {
                self.on_item_selected(&data)?;
                Ok(Response::Handled)
            }
        }
    }

    pub fn on_preferences_loaded(
        &mut self,
        preferences: BTreeMap<String, String>,
    ) -> Result<(), RefreshError> {
        let token = preferences
            .get(API_KEY_PREFERENCE)
            .cloned()
            .unwrap_or_default();
        self.preferences = preferences;
        self.credentials = Credentials::new(token);
        self.refresh()
    }

    pub fn on_preferences_changed(
        &mut self,
        id: String,
        value: String,
    ) -> Result<(), RefreshError> {
        let is_token = id == API_KEY_PREFERENCE;
        self.preferences.insert(id, value.clone());

        if is_token {
            self.credentials = Credentials::new(value);
            self.refresh()?;
        }
        Ok(())
    }

    pub fn on_query(&self, query: &str) -> Feedback {
        feedback::search_feedback(query, &self.cache, &self.matcher)
    }

    pub fn on_item_selected(
        &mut self,
        payload: &BTreeMap<String, String>,
    ) -> Result<(), OrchestratorError> {
        match Action::from_payload(payload)? {
            Action::GenerateReposList => self.refresh()?,
            Action::OpenRepo { url } => {
                info!(%url, "opening repository");
                self.opener.open(&url);
            }
        }
        Ok(())
    }

    pub fn refresh(&mut self) -> Result<(), RefreshError> {
        self.cache.refresh(&self.source, &self.credentials)
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    #[error(transparent)]
    Selection(#[from] ActionError),
}
