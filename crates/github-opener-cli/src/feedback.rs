use launcher_core::{Feedback, Item, ItemIcon};

use crate::action::Action;
use crate::cache::RepositoryCache;
use crate::matcher::FuzzyMatcher;

const REPO_ICON_PATH: &str = "images/icon.png";
const REPO_SUBTITLE: &str = "Press Enter to open the repository";
const REFRESH_ICON_PATH: &str = "images/refresh.png";
const REFRESH_TITLE: &str = "Generate a list of repositories";
const REFRESH_SUBTITLE: &str = "Type a keyword to search for repositories";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub name: String,
    pub url: String,
}

/// `owner/repo`: the last two `/` segments of the URL.
pub fn display_name(url: &str) -> String {
    let mut segments = url.rsplit('/');
    match (segments.next(), segments.next()) {
        (Some(repo), Some(owner)) => format!("{owner}/{repo}"),
        _ => url.to_string(),
    }
}

pub fn search<M>(query: &str, cache: &RepositoryCache, matcher: &M) -> Vec<SearchResult>
where
    M: FuzzyMatcher + ?Sized,
{
    matcher
        .rank(query, cache.urls())
        .into_iter()
        .map(|url| SearchResult {
            name: display_name(&url),
            url,
        })
        .collect()
}

/// Ranked repository rows for a non-empty query, then the refresh row.
///
/// The query reaches the matcher untrimmed; whitespace alone still matches.
pub fn search_feedback<M>(query: &str, cache: &RepositoryCache, matcher: &M) -> Feedback
where
    M: FuzzyMatcher + ?Sized,
{
    let mut feedback = Feedback::default();

    if !query.is_empty() {
        for result in search(query, cache, matcher) {
            feedback.push(repository_item(&result));
        }
    }

    feedback.push(refresh_item());
    feedback
}

pub fn repository_item(result: &SearchResult) -> Item {
    let action = Action::OpenRepo {
        url: result.url.clone(),
    };

    with_action(
        Item::new(&result.name)
            .with_subtitle(REPO_SUBTITLE)
            .with_arg(&result.url)
            .with_icon(ItemIcon::new(REPO_ICON_PATH)),
        &action,
    )
}

pub fn refresh_item() -> Item {
    with_action(
        Item::new(REFRESH_TITLE)
            .with_subtitle(REFRESH_SUBTITLE)
            .with_icon(ItemIcon::new(REFRESH_ICON_PATH)),
        &Action::GenerateReposList,
    )
}

fn with_action(item: Item, action: &Action) -> Item {
    action
        .to_variables()
        .into_iter()
        .fold(item, |item, (key, value)| item.with_variable(key, value))
}

pub fn is_refresh_item(item: &Item) -> bool {
    Action::from_payload(&item.selection_payload()) == Ok(Action::GenerateReposList)
}
