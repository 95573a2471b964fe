use tracing::debug;

use super::dispatcher::Dispatcher;
use super::matcher::{compile, SearchParameters};
use crate::archive::Archive;
use crate::cancel::CancellationToken;
use crate::errors::SearchResult;
use crate::results::SearchResult as SearchOutput;

/// Searches every entry of `archive` for `params`.
///
/// An invalid pattern fails the call before any entry is opened. Otherwise the output always
/// comes back, possibly paired with the first per-entry error in `SearchOutput::error`.
pub fn search<A: Archive + ?Sized>(
    ctx: &CancellationToken,
    params: &SearchParameters,
    archive: &A,
    dispatcher: &Dispatcher,
) -> SearchResult<SearchOutput> {
    let matcher = compile(params)?;
    debug!(
        entries = archive.len(),
        workers = dispatcher.workers(),
        "starting archive search"
    );
    Ok(dispatcher.dispatch(ctx, archive.entries(), &matcher))
}
