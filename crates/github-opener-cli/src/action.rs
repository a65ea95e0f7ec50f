use std::collections::BTreeMap;

use thiserror::Error;

pub const ACTION_VARIABLE: &str = "action";
pub const URL_VARIABLE: &str = "url";
const OPEN_REPO_TAG: &str = "open_repo";
const GENERATE_REPOS_LIST_TAG: &str = "generate_repos_list";

/// Selection payload attached to a rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenRepo { url: String },
    GenerateReposList,
}

impl Action {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::OpenRepo { .. } => OPEN_REPO_TAG,
            Self::GenerateReposList => GENERATE_REPOS_LIST_TAG,
        }
    }

    pub fn to_variables(&self) -> BTreeMap<String, String> {
        let mut variables = BTreeMap::new();
        variables.insert(ACTION_VARIABLE.to_string(), self.tag().to_string());
        if let Self::OpenRepo { url } = self {
            variables.insert(URL_VARIABLE.to_string(), url.clone());
        }
        variables
    }

    pub fn from_payload(payload: &BTreeMap<String, String>) -> Result<Self, ActionError> {
        let tag = payload
            .get(ACTION_VARIABLE)
            .map(|value| value.trim())
            .ok_or(ActionError::MissingAction)?;

        match tag {
            OPEN_REPO_TAG => {
                let url = payload
                    .get(URL_VARIABLE)
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
                    .ok_or(ActionError::MissingUrl)?;
                Ok(Self::OpenRepo {
                    url: url.to_string(),
                })
            }
            GENERATE_REPOS_LIST_TAG => Ok(Self::GenerateReposList),
            other => Err(ActionError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("selection payload has no action")]
    MissingAction,
    #[error("open_repo selection has no url")]
    MissingUrl,
    #[error("unknown selection action: {0}")]
    Unknown(String),
}
