use std::io;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use github_opener_cli::{
    cache::{RefreshError, RepositoryCache},
    config::{ConfigError, LOG_FILTER_ENV, RuntimeConfig},
    credentials::Credentials,
    feedback,
    github_api::GithubClient,
    host,
    matcher::build_matcher,
    opener::{SystemOpener, UrlOpener},
    orchestrator::Orchestrator,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "GitHub organization repository opener")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh the repository list, fuzzy-match it, and print feedback JSON.
    Search {
        /// Search query text.
        #[arg(long, default_value = "")]
        query: String,
        /// Output mode: workflow-compatible Alfred JSON or service envelope JSON.
        #[arg(long, value_enum, default_value_t = OutputMode::Alfred)]
        mode: OutputMode,
    },
    /// Open a repository URL with the configured launcher.
    Open {
        /// Repository URL.
        #[arg(long)]
        url: String,
    },
    /// Serve launcher events: one JSON event per stdin line, one reply per line.
    Serve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum OutputMode {
    ServiceJson,
    Alfred,
}

impl Cli {
    fn command_name(&self) -> &'static str {
        match &self.command {
            Commands::Search { .. } => "search",
            Commands::Open { .. } => "open",
            Commands::Serve => "serve",
        }
    }

    fn output_mode(&self) -> OutputMode {
        match &self.command {
            Commands::Search { mode, .. } => *mode,
            Commands::Open { .. } | Commands::Serve => OutputMode::Alfred,
        }
    }

    fn default_log_directive(&self) -> &'static str {
        match &self.command {
            Commands::Serve => "github_opener_cli=info",
            _ => "warn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorKind {
    User,
    Runtime,
}

#[derive(Debug, PartialEq, Eq)]
struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    fn user(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::User,
            message: message.into(),
        }
    }

    fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            message: message.into(),
        }
    }

    fn from_config(error: ConfigError) -> Self {
        AppError::user(error.to_string())
    }

    fn from_refresh(error: RefreshError) -> Self {
        AppError::runtime(error.to_string())
    }

    fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::User => 2,
            ErrorKind::Runtime => 1,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            ErrorKind::User => "user",
            ErrorKind::Runtime => "runtime",
        }
    }

    fn code(&self) -> &'static str {
        match self.kind {
            ErrorKind::User => "github.user",
            ErrorKind::Runtime => "github.runtime",
        }
    }
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // stdout carries feedback and host replies; logs go to stderr only.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.default_log_directive());
    let command = cli.command_name();
    let mode = cli.output_mode();

    match run(cli) {
        Ok(Some(output)) => {
            println!("{output}");
        }
        Ok(None) => {}
        Err(error) => {
            match mode {
                OutputMode::ServiceJson => {
                    println!("{}", serialize_service_error(command, &error));
                }
                OutputMode::Alfred => {
                    eprintln!("error: {}", error.message);
                }
            }
            std::process::exit(error.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<Option<String>, AppError> {
    if let Commands::Serve = cli.command {
        let config = RuntimeConfig::from_env().map_err(AppError::from_config)?;
        return serve(&config).map(|()| None);
    }

    run_with(cli, RuntimeConfig::from_env, |config| {
        let client = GithubClient::new(&config.api_base);
        let mut cache = RepositoryCache::default();
        cache.refresh(&client, &Credentials::new(&config.api_key))?;
        Ok(cache)
    })
}

fn serve(config: &RuntimeConfig) -> Result<(), AppError> {
    let mut orchestrator = Orchestrator::new(
        GithubClient::new(&config.api_base),
        build_matcher(config.matcher, &config.fzf_path),
        SystemOpener::new(config.open_command.clone()),
    );

    let stdin = io::stdin();
    host::run_host_loop(stdin.lock(), io::stdout().lock(), &mut orchestrator)
        .map_err(|error| AppError::runtime(format!("host loop failed: {error}")))
}

fn run_with<LoadConfig, FetchCache>(
    cli: Cli,
    load_config: LoadConfig,
    fetch_cache: FetchCache,
) -> Result<Option<String>, AppError>
where
    LoadConfig: Fn() -> Result<RuntimeConfig, ConfigError>,
    FetchCache: Fn(&RuntimeConfig) -> Result<RepositoryCache, RefreshError>,
{
    match cli.command {
        Commands::Search { query, mode } => {
            let config = load_config().map_err(AppError::from_config)?;

            // An empty query renders only the refresh row, so skip the network.
            let cache = if query.is_empty() {
                RepositoryCache::default()
            } else {
                fetch_cache(&config).map_err(AppError::from_refresh)?
            };

            let matcher = build_matcher(config.matcher, &config.fzf_path);
            let payload = feedback::search_feedback(&query, &cache, &matcher);
            render_feedback(mode, "search", payload).map(Some)
        }
        Commands::Open { url } => {
            let url = url.trim();
            if url.is_empty() {
                return Err(AppError::user("url must not be empty"));
            }

            let config = load_config().map_err(AppError::from_config)?;
            SystemOpener::new(config.open_command.clone()).open(url);
            Ok(Some(url.to_string()))
        }
        Commands::Serve => Err(AppError::user("serve reads events from stdin")),
    }
}

#[derive(Debug, Serialize)]
struct ServiceErrorEnvelope {
    code: &'static str,
    message: String,
    details: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ServiceEnvelope {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    result: Option<Value>,
    error: Option<ServiceErrorEnvelope>,
}

fn render_feedback(
    mode: OutputMode,
    command: &'static str,
    payload: launcher_core::Feedback,
) -> Result<String, AppError> {
    match mode {
        OutputMode::Alfred => payload
            .to_json()
            .map_err(|error| AppError::runtime(format!("failed to serialize feedback: {error}"))),
        OutputMode::ServiceJson => {
            let result = serde_json::to_value(payload).map_err(|error| {
                AppError::runtime(format!("failed to serialize feedback: {error}"))
            })?;
            serde_json::to_string(&ServiceEnvelope {
                schema_version: "v1",
                command,
                ok: true,
                result: Some(result),
                error: None,
            })
            .map_err(|error| AppError::runtime(format!("failed to serialize envelope: {error}")))
        }
    }
}

fn serialize_service_error(command: &'static str, error: &AppError) -> String {
    let envelope = ServiceEnvelope {
        schema_version: "v1",
        command,
        ok: false,
        result: None,
        error: Some(ServiceErrorEnvelope {
            code: error.code(),
            message: error.message.clone(),
            details: Some(serde_json::json!({
                "kind": error.kind_name(),
                "exit_code": error.exit_code(),
            })),
        }),
    };

    serde_json::to_string(&envelope).unwrap_or_else(|serialize_error| {
        serde_json::json!({
            "schema_version": "v1",
            "command": command,
            "ok": false,
            "result": Value::Null,
            "error": {
                "code": "internal.serialize",
                "message": format!("failed to serialize service error envelope: {serialize_error}"),
                "details": Value::Null,
            }
        })
        .to_string()
    })
}

#[cfg(test)]
mod tests {
    use github_opener_cli::{
        github_api::GithubApiError,
        matcher::MatcherKind,
    };

    use super::*;

    fn fixture_config() -> RuntimeConfig {
        RuntimeConfig {
            api_key: "demo-token".to_string(),
            api_base: "https://api.github.com".to_string(),
            matcher: MatcherKind::Builtin,
            fzf_path: "fzf".to_string(),
            open_command: Some("/nonexistent/github-opener-open".to_string()),
        }
    }

    fn fixture_cache() -> RepositoryCache {
        RepositoryCache::new(vec![
            "https://github.com/acme/api".to_string(),
            "https://github.com/acme/web".to_string(),
        ])
    }

    #[test]
    fn search_command_outputs_feedback_json_contract() {
        let cli = Cli::parse_from(["github-opener-cli", "search", "--query", "api"]);

        let output = run_with(cli, || Ok(fixture_config()), |_| Ok(fixture_cache()))
            .expect("search should succeed")
            .expect("search should print feedback");

        let json: Value = serde_json::from_str(&output).expect("output must be JSON");
        let items = json
            .get("items")
            .and_then(Value::as_array)
            .expect("items array");
        assert_eq!(items.len(), 2, "one match plus the refresh row");
        assert_eq!(
            items[0].get("title").and_then(Value::as_str),
            Some("acme/api")
        );
        assert_eq!(
            items[0].get("arg").and_then(Value::as_str),
            Some("https://github.com/acme/api")
        );
    }

    #[test]
    fn empty_search_does_not_fetch() {
        let cli = Cli::parse_from(["github-opener-cli", "search", "--query", ""]);

        let output = run_with(
            cli,
            || Ok(fixture_config()),
            |_| panic!("empty query must not refresh"),
        )
        .expect("empty search should succeed")
        .expect("empty search should print feedback");

        let json: Value = serde_json::from_str(&output).expect("output must be JSON");
        assert_eq!(json["items"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn whitespace_search_still_fetches_and_matches() {
        let cli = Cli::parse_from(["github-opener-cli", "search", "--query", "  "]);

        let output = run_with(cli, || Ok(fixture_config()), |_| Ok(fixture_cache()))
            .expect("whitespace search should succeed")
            .expect("whitespace search should print feedback");

        let json: Value = serde_json::from_str(&output).expect("output must be JSON");
        assert_eq!(
            json["items"].as_array().map(Vec::len),
            Some(3),
            "every cached repository plus the refresh row"
        );
    }

    #[test]
    fn search_maps_refresh_failures_to_runtime_error_kind() {
        let cli = Cli::parse_from(["github-opener-cli", "search", "--query", "api"]);

        let err = run_with(
            cli,
            || Ok(fixture_config()),
            |_| {
                Err(RefreshError::Organizations(GithubApiError::Http {
                    status: 401,
                    message: "Bad credentials".to_string(),
                }))
            },
        )
        .expect_err("refresh failure should fail");

        assert_eq!(err.kind, ErrorKind::Runtime);
        assert_eq!(
            err.message,
            "failed to list organizations: github api error (401): Bad credentials"
        );
    }

    #[test]
    fn search_surfaces_config_errors_with_user_exit_kind() {
        let cli = Cli::parse_from(["github-opener-cli", "search", "--query", "api"]);

        let err = run_with(
            cli,
            || Err(ConfigError::InvalidMatcher("skim".to_string())),
            |_| Ok(fixture_cache()),
        )
        .expect_err("config error should fail");

        assert_eq!(err.kind, ErrorKind::User);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn service_json_mode_wraps_feedback_in_envelope() {
        let cli = Cli::parse_from([
            "github-opener-cli",
            "search",
            "--query",
            "web",
            "--mode",
            "service-json",
        ]);

        let output = run_with(cli, || Ok(fixture_config()), |_| Ok(fixture_cache()))
            .expect("search should succeed")
            .expect("search should print envelope");

        let json: Value = serde_json::from_str(&output).expect("output must be JSON");
        assert_eq!(json["schema_version"], "v1");
        assert_eq!(json["command"], "search");
        assert_eq!(json["ok"], true);
        assert_eq!(json["result"]["items"][0]["title"], "acme/web");
    }

    #[test]
    fn open_rejects_empty_url() {
        let cli = Cli::parse_from(["github-opener-cli", "open", "--url", " "]);

        let err = run_with(cli, || Ok(fixture_config()), |_| Ok(fixture_cache()))
            .expect_err("empty url should fail");

        assert_eq!(err.kind, ErrorKind::User);
        assert_eq!(err.message, "url must not be empty");
    }

    #[test]
    fn open_echoes_url_after_launching() {
        let cli = Cli::parse_from([
            "github-opener-cli",
            "open",
            "--url",
            "https://github.com/acme/api",
        ]);

        let output = run_with(cli, || Ok(fixture_config()), |_| Ok(fixture_cache()))
            .expect("open should not fail when the launcher is missing");

        assert_eq!(output.as_deref(), Some("https://github.com/acme/api"));
    }

    #[test]
    fn service_error_envelope_carries_code_and_details() {
        let json: Value = serde_json::from_str(&serialize_service_error(
            "search",
            &AppError::runtime("boom"),
        ))
        .expect("envelope is JSON");

        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["code"], "github.runtime");
        assert_eq!(json["error"]["details"]["exit_code"], 1);
    }

    #[test]
    fn help_flag_is_supported() {
        let help = Cli::try_parse_from(["github-opener-cli", "--help"])
            .expect_err("help should exit through clap error");

        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
