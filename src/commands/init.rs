//! `boardwatch init` command.

use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::RunError;
use crate::store::SnapshotStore;

/// Execute the `init` command: create the board's snapshot object if it
/// does not exist yet. Pre-existing state is left untouched.
///
/// # Errors
///
/// Returns an error if the board cannot be resolved or the object store
/// rejects the creation.
pub fn run(ctx: &ServiceContext, config: &Config) -> Result<(), RunError> {
    let board = ctx.source.resolve_board(&config.project_url)?;
    let store = SnapshotStore::new(ctx.store.as_ref(), ctx.clock.as_ref());
    let key = SnapshotStore::key_for(&board.id);
    store.ensure_initialized(&key)?;
    println!("Snapshot object ready for {} ({key}).", board.html_url);
    Ok(())
}
