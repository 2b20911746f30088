//! IMDb List Add-on.
//!
//! A standalone web service that serves a user-configured IMDb list as a
//! Stremio catalog addon. List contents are fetched on demand, cached in
//! memory for a day, and concurrent requests for the same list coalesce
//! into a single upstream fetch.

mod cli;
mod endpoints;
mod logging;
mod server;

fn main() {
    match cli::execute() {
        Ok(()) => std::process::exit(0),
        Err(error) => {
            logging::ensure_log_error(&error);
            std::process::exit(1);
        }
    }
}
