//! `boardwatch run` command: one poll, diff, and notify cycle.

use crate::comments;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::RunError;
use crate::ports::{Attachment, SinkError, SourceError};
use crate::render;
use crate::snapshot::builder;
use crate::snapshot::diff::diff;
use crate::snapshot::inherit::inherit;
use crate::store::SnapshotStore;

/// Execute the `run` command.
///
/// A rate-limited provider is treated as "nothing to do this time": the
/// run is skipped cleanly with no partial persistence.
///
/// # Errors
///
/// Returns an error on configuration, source, store, or sink failures
/// other than rate limiting.
pub fn run(ctx: &ServiceContext, config: &Config, dry_run: bool) -> Result<(), RunError> {
    match execute(ctx, config, dry_run) {
        Err(RunError::Source(SourceError::RateLimited)) => {
            tracing::warn!("provider rate limit exhausted; skipping this run");
            println!("Rate limited; skipping this run.");
            Ok(())
        }
        result => result,
    }
}

fn execute(ctx: &ServiceContext, config: &Config, dry_run: bool) -> Result<(), RunError> {
    let board = ctx.source.resolve_board(&config.project_url)?;
    tracing::info!(board = %board.html_url, "watching board");

    let store = SnapshotStore::new(ctx.store.as_ref(), ctx.clock.as_ref());
    let key = SnapshotStore::key_for(&board.id);
    if !dry_run {
        store.ensure_initialized(&key)?;
    }
    let last = store.load(&key)?;

    let current =
        builder::build(ctx.source.as_ref(), &board, &config.pivot_field, builder::DEFAULT_PAGE_SIZE)?;
    let mut current = inherit(current, last.as_ref());

    if config.track_comments && !dry_run {
        let batches = comments::sync(
            ctx.source.as_ref(),
            ctx.sink.as_ref(),
            &board,
            &mut current,
            last.as_ref(),
            &config.labels,
            comments::DEFAULT_COMMENTS_PAGE_SIZE,
        )?;
        let posted: usize = batches.values().map(|batch| batch.new.len()).sum();
        let updated: usize = batches.values().map(|batch| batch.updated.len()).sum();
        tracing::info!(posted, updated, "comment synchronization finished");
    }

    // Persist before notifying: the snapshot reflects provider truth
    // independent of notification success.
    if !dry_run {
        store.save(&key, &current)?;
    }

    let Some(last) = last else {
        println!("No previous snapshot found; nothing to compare.");
        return Ok(());
    };

    let events = diff(&current, &last);
    if events.is_empty() {
        println!("No board changes since the last run.");
        return Ok(());
    }

    let footer = render::board_footer(&board);
    let mut first_failure: Option<SinkError> = None;
    for event in &events {
        let line = render::change_line(event);
        if dry_run {
            println!("{line}");
            continue;
        }
        let attachment = Attachment::new(render::state_color(event.item.state), &line, &footer);
        if let Err(err) = ctx.sink.post(&line, &attachment) {
            tracing::error!(item = %event.item.id, error = %err, "change notification failed");
            first_failure.get_or_insert(err);
        }
    }
    println!("{} board change(s) detected.", events.len());

    // Every event was attempted and the snapshot is already persisted;
    // now surface the first delivery failure, if any.
    match first_failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
