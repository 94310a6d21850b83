//! Request handlers.

use std::io;
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tiny_http::Request;

use super::Shared;
use super::idle::Activity;
use super::order::Ticket;
use super::protocol::{CssQuery, ExtractRequest, Route};
use super::response;
use crate::output::WriteError;
use crate::pipeline;
use crate::registry::{ExtractError, ExtractOutput};
use crate::{debug, log};

/// Places in line for one extraction, taken once its body is complete.
pub struct Tickets {
    /// Turn at the registry.
    pub mutation: Ticket,
    /// Turn at the output directory, in the same order.
    pub write: Ticket,
}

/// Why an `/extract` request failed. Rendered into the `500` body.
#[derive(Debug, Error)]
enum ExtractFailure {
    #[error("failed to read request body")]
    Body(#[from] io::Error),

    #[error("malformed request")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// `outer: inner: root` for an error and its sources.
fn describe(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub fn handle_request(
    request: Request,
    route: Route,
    activity: Option<Activity>,
    shared: &Arc<Shared>,
) -> Result<()> {
    debug!("coordinator"; "{} {}", request.method(), request.url());

    match (route, activity) {
        (Route::Health, _) => response::respond_health(request),
        (Route::Css, _) => handle_css(request, shared),
        (Route::Extract, Some(activity)) => handle_extract(request, activity, shared),
        _ => response::respond_not_found(request),
    }
}

fn handle_extract(mut request: Request, activity: Activity, shared: &Shared) -> Result<()> {
    // A slow upload holds only this worker; no ticket exists until the
    // body is complete and parsed.
    let result = read_extract_request(&mut request)
        .and_then(|extract| run_extract(&extract, shared.issue_tickets(), shared));

    // Writes are done; count the extraction before the client can react.
    drop(activity);

    match result {
        Ok(output) => response::respond_json(request, 200, &output),
        Err(e) => {
            let message = describe(&e);
            log!("error"; "extract failed: {}", message);
            response::respond_error(request, message)
        }
    }
}

fn read_extract_request(request: &mut Request) -> Result<ExtractRequest, ExtractFailure> {
    let body = io::read_to_string(request.as_reader())?;
    Ok(serde_json::from_str(&body)?)
}

/// The registry turn ends before writing, so the next request can mutate
/// while this one writes. Writes still land in ticket order, so an older
/// snapshot never overwrites a newer one.
fn run_extract(
    request: &ExtractRequest,
    tickets: Tickets,
    shared: &Shared,
) -> Result<ExtractOutput, ExtractFailure> {
    let Tickets { mutation, write } = tickets;
    let config = &shared.config;

    let (output, plan) = {
        let _turn = mutation.wait();
        let mut registry = shared.registry.lock();
        pipeline::extract(&mut **registry, config, request)?
    };

    let written = plan.len();
    {
        let _turn = write.wait();
        shared.writer.execute(plan)?;
    }

    log!(
        "extract";
        "{} -> {} ({} write{})",
        request.filename,
        output.css_file.as_deref().unwrap_or("unchanged"),
        written,
        if written == 1 { "" } else { "s" }
    );

    Ok(pipeline::finish(output, config.output.single_css))
}

fn handle_css(request: Request, shared: &Shared) -> Result<()> {
    let query = CssQuery::from_url(request.url());

    if query.wait_for_idle {
        let outcome = shared.idle.wait_for_idle(shared.config.coordinator.max_wait());
        if outcome.is_idle() {
            debug!("css"; "idle after {:?}", outcome.waited());
        } else {
            log!("css"; "still busy after {:?}, serving current css", outcome.waited());
        }
    }

    let css = shared
        .registry
        .lock()
        .get_css(query.file_num, query.import_main_css);
    response::respond_css(request, css)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_walks_sources() {
        let failure = ExtractFailure::from(io::Error::other("connection reset"));
        assert_eq!(describe(&failure), "failed to read request body: connection reset");

        let failure = ExtractFailure::from(ExtractError::syntax("a.tsx", "unbalanced `css(` call"));
        assert_eq!(describe(&failure), "a.tsx: unbalanced `css(` call");
    }
}
