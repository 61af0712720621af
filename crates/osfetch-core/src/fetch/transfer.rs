//! Single HTTP GET via libcurl, streaming the body into a writer.

use std::cell::{Cell, RefCell};
use std::io::{self, Write};

use super::FetchOptions;
use crate::cancel::CancelToken;

/// Canonical success status; anything else is a failed fetch.
const HTTP_OK: u32 = 200;

#[derive(Debug)]
pub(crate) enum TransferError {
    Curl(curl::Error),
    HttpStatus(u32),
    Write(io::Error),
    Cancelled,
}

impl From<curl::Error> for TransferError {
    fn from(e: curl::Error) -> Self {
        TransferError::Curl(e)
    }
}

/// Status code from a header line like `HTTP/1.1 200 OK` or `HTTP/2 404`.
fn parse_status_line(line: &[u8]) -> Option<u32> {
    let line = std::str::from_utf8(line).ok()?;
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

/// GETs `url` and writes the body to `sink`. Returns bytes written.
///
/// Bodies of non-200 responses (including redirect hops) are discarded
/// rather than written. Redirects are followed up to `max_redirections`.
pub(crate) fn http_get(
    url: &str,
    opts: &FetchOptions,
    cancel: Option<&CancelToken>,
    sink: &mut dyn Write,
) -> Result<u64, TransferError> {
    let is_cancelled = || cancel.map_or(false, CancelToken::is_cancelled);
    if is_cancelled() {
        return Err(TransferError::Cancelled);
    }

    let status: Cell<Option<u32>> = Cell::new(None);
    let written = Cell::new(0u64);
    let write_error: RefCell<Option<io::Error>> = RefCell::new(None);

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(opts.max_redirections)?;
    if let Some(t) = opts.connect_timeout {
        easy.connect_timeout(t)?;
    }
    if let Some(t) = opts.timeout {
        easy.timeout(t)?;
    }
    if cancel.is_some() {
        easy.progress(true)?;
    }

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            if let Some(code) = parse_status_line(line) {
                status.set(Some(code));
            }
            true
        })?;
        transfer.write_function(|data| {
            if is_cancelled() {
                return Ok(0); // abort transfer
            }
            if status.get().map_or(false, |code| code != HTTP_OK) {
                return Ok(data.len());
            }
            match sink.write_all(data) {
                Ok(()) => {
                    written.set(written.get() + data.len() as u64);
                    Ok(data.len())
                }
                Err(e) => {
                    *write_error.borrow_mut() = Some(e);
                    Ok(0) // abort transfer
                }
            }
        })?;
        transfer.progress_function(|_, _, _, _| !is_cancelled())?;
        transfer.perform()
    };

    if let Err(e) = performed {
        if is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        if let Some(io_err) = write_error.into_inner() {
            return Err(TransferError::Write(io_err));
        }
        return Err(TransferError::Curl(e));
    }

    let code = easy.response_code()?;
    if code != HTTP_OK {
        return Err(TransferError::HttpStatus(code));
    }
    Ok(written.get())
}
