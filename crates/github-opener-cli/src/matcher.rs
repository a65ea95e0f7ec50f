use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    Fzf,
    Builtin,
}

impl MatcherKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fzf" => Some(Self::Fzf),
            "builtin" => Some(Self::Builtin),
            _ => None,
        }
    }
}

/// Ranks candidates against a query: returns the matching subsequence,
/// best match first.
pub trait FuzzyMatcher {
    fn rank(&self, query: &str, candidates: &[String]) -> Vec<String>;
}

impl<M: FuzzyMatcher + ?Sized> FuzzyMatcher for Box<M> {
    fn rank(&self, query: &str, candidates: &[String]) -> Vec<String> {
        (**self).rank(query, candidates)
    }
}

pub fn build_matcher(kind: MatcherKind, fzf_path: &str) -> Box<dyn FuzzyMatcher> {
    match kind {
        MatcherKind::Fzf => Box::new(FzfMatcher::new(fzf_path)),
        MatcherKind::Builtin => Box::new(BuiltinMatcher),
    }
}

/// Delegates to `fzf --filter`, candidates on stdin, ranked lines on stdout.
///
/// Exit status is not inspected: fzf exits non-zero when nothing matches, and
/// a missing binary simply yields no matches.
#[derive(Debug, Clone)]
pub struct FzfMatcher {
    program: String,
}

impl FzfMatcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl FuzzyMatcher for FzfMatcher {
    fn rank(&self, query: &str, candidates: &[String]) -> Vec<String> {
        let mut child = match Command::new(&self.program)
            .arg("--filter")
            .arg(query)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(error) => {
                warn!(program = %self.program, %error, "failed to spawn fuzzy matcher");
                return Vec::new();
            }
        };

        let input = candidates.join("\n");
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                // fzf may exit before draining stdin; a broken pipe is fine.
                let _ = stdin.write_all(input.as_bytes());
            })
        });

        let output = child.wait_with_output();
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        match output {
            Ok(output) => split_ranked_output(&String::from_utf8_lossy(&output.stdout)),
            Err(error) => {
                warn!(program = %self.program, %error, "fuzzy matcher did not complete");
                Vec::new()
            }
        }
    }
}

pub fn split_ranked_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// In-process ranking with the same contract as the fzf delegate.
///
/// The query uses fzf's pattern syntax: whitespace-separated atoms that must
/// all match, case-insensitively. Ties keep candidate order, so a query with
/// no atoms returns every candidate as cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMatcher;

impl FuzzyMatcher for BuiltinMatcher {
    fn rank(&self, query: &str, candidates: &[String]) -> Vec<String> {
        let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
        let mut matcher = Matcher::new(Config::DEFAULT.match_paths());
        let mut buf = Vec::new();

        let mut scored: Vec<(u32, &String)> = candidates
            .iter()
            .filter_map(|candidate| {
                let haystack = Utf32Str::new(candidate, &mut buf);
                pattern
                    .score(haystack, &mut matcher)
                    .map(|score| (score, candidate))
            })
            .collect();

        scored.sort_by(|(left, _), (right, _)| right.cmp(left));
        scored
            .into_iter()
            .map(|(_, candidate)| candidate.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(paths: &[&str]) -> Vec<String> {
        paths
            .iter()
            .map(|path| format!("https://github.com/{path}"))
            .collect()
    }

    #[test]
    fn matcher_kind_parses_known_names() {
        assert_eq!(MatcherKind::parse("FZF"), Some(MatcherKind::Fzf));
        assert_eq!(MatcherKind::parse(" builtin "), Some(MatcherKind::Builtin));
        assert_eq!(MatcherKind::parse("internal"), None);
        assert_eq!(MatcherKind::parse("skim"), None);
    }

    #[test]
    fn builtin_returns_only_matching_candidates() {
        let candidates = urls(&["a/r1", "b/r2", "b/r3"]);
        let ranked = BuiltinMatcher.rank("r2", &candidates);

        assert_eq!(ranked, urls(&["b/r2"]));
    }

    #[test]
    fn builtin_prefers_segment_start_and_consecutive_matches() {
        let candidates = urls(&["acme/rapid-io", "acme/api"]);
        let ranked = BuiltinMatcher.rank("api", &candidates);

        assert_eq!(ranked.first(), Some(&candidates[1]));
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn builtin_is_case_insensitive_and_requires_every_term() {
        let candidates = urls(&["Acme/Billing-API", "acme/billing-ui", "other/api"]);
        let ranked = BuiltinMatcher.rank("acme API", &candidates);

        assert_eq!(ranked, urls(&["Acme/Billing-API"]));
    }

    #[test]
    fn builtin_empty_query_keeps_every_candidate_in_order() {
        let candidates = urls(&["b/z", "a/y"]);

        assert_eq!(BuiltinMatcher.rank("", &candidates), candidates);
        assert_eq!(BuiltinMatcher.rank("   ", &candidates), candidates);
    }

    #[test]
    fn builtin_ranked_output_is_subset_of_candidates() {
        let candidates = urls(&["acme/web", "acme/worker", "zeta/www", "beta/core"]);
        let ranked = BuiltinMatcher.rank("w", &candidates);

        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|url| candidates.contains(url)));
    }

    #[test]
    fn fzf_missing_binary_yields_no_matches() {
        let matcher = FzfMatcher::new("/nonexistent/github-opener-fzf");

        assert!(matcher.rank("api", &urls(&["acme/api"])).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn fzf_receives_filter_argument_and_newline_joined_candidates() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let stdin_copy = dir.path().join("stdin.txt");
        let script = dir.path().join("fake-fzf");
        // Echo argv, then stdin in reverse line order as the "ranking".
        fs::write(
            &script,
            format!(
                "#!/bin/sh\nfor arg in \"$@\"; do printf 'arg:%s\\n' \"$arg\"; done\ncat > '{copy}'\nsed -n '1!G;h;$p' '{copy}'\n",
                copy = stdin_copy.display()
            ),
        )
        .expect("write fake fzf");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod fake fzf");

        let candidates = urls(&["a/x", "b/y", "c/z"]);
        let ranked = FzfMatcher::new(script.display().to_string()).rank("my query", &candidates);

        assert_eq!(
            ranked,
            vec![
                "arg:--filter".to_string(),
                "arg:my query".to_string(),
                "https://github.com/c/z".to_string(),
                "https://github.com/b/y".to_string(),
                "https://github.com/a/x".to_string(),
            ],
            "argv first, then stdout order passed through unchanged"
        );
        assert_eq!(
            fs::read_to_string(&stdin_copy).expect("read captured stdin"),
            candidates.join("\n"),
            "candidates arrive newline-joined on stdin"
        );
    }

    #[test]
    fn split_ranked_output_drops_blank_lines() {
        let lines = split_ranked_output("https://github.com/a/x\n\nhttps://github.com/b/y\n");

        assert_eq!(lines, urls(&["a/x", "b/y"]));
    }

    #[test]
    fn build_matcher_selects_builtin() {
        let matcher = build_matcher(MatcherKind::Builtin, "fzf");

        assert_eq!(matcher.rank("x", &urls(&["a/x"])), urls(&["a/x"]));
    }
}
