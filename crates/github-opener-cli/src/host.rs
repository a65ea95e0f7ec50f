use std::io::{self, BufRead, Write};

use launcher_core::{HostEvent, HostOutput};
use tracing::{error, warn};

use crate::cache::RepositorySource;
use crate::matcher::FuzzyMatcher;
use crate::opener::UrlOpener;
use crate::orchestrator::{Orchestrator, Response};

/// Reads one event per line until EOF and writes one output line per event.
pub fn run_host_loop<R, W, S, M, O>(
    reader: R,
    mut writer: W,
    orchestrator: &mut Orchestrator<S, M, O>,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    S: RepositorySource,
    M: FuzzyMatcher,
    O: UrlOpener,
{
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let output = handle_line(orchestrator, &line);
        let json = output.to_json_line().map_err(io::Error::other)?;
        writeln!(writer, "{json}")?;
        writer.flush()?;
    }

    Ok(())
}

pub fn handle_line<S, M, O>(orchestrator: &mut Orchestrator<S, M, O>, line: &str) -> HostOutput
where
    S: RepositorySource,
    M: FuzzyMatcher,
    O: UrlOpener,
{
    let event = match HostEvent::from_json_line(line) {
        Ok(event) => event,
        Err(parse_error) => {
            warn!(%parse_error, "malformed host event");
            return HostOutput::error(format!("invalid host event: {parse_error}"));
        }
    };

    let ack = HostOutput::ack(&event);
    let name = event.name();
    match orchestrator.handle(event) {
        Ok(Response::Render(feedback)) => HostOutput::render(feedback),
        Ok(Response::Handled) => ack,
        Err(handle_error) => {
            error!(event = name, %handle_error, "host event failed");
            HostOutput::error(handle_error.to_string())
        }
    }
}
