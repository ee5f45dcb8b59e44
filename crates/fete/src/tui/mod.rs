mod core;
mod runtime;
mod view;

use fete_core::session::RenderSession;

use crate::store::EventStore;

/// Runs the interactive plan browser until the user quits.
pub async fn run(session: RenderSession, store: &dyn EventStore) -> anyhow::Result<()> {
    runtime::run(session, store).await
}
