//! Channel plumbing: cancellable send/receive, fan-in and fan-out.
//!
//! Queues are rendezvous channels. A queue is closed when its last sender
//! is dropped, so a stage signals completion simply by returning.

use super::context::Context;
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, never, select, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::trace;

/// Default number of workers a fan-out stage starts.
pub const DEFAULT_WORKERS: usize = 25;

/// Sends `item` unless the context is cancelled first.
///
/// Returns false when the item was not delivered, either because of
/// cancellation or because the receiving side is gone.
pub fn send<T>(ctx: &Context, tx: &Sender<T>, item: T) -> bool {
    if ctx.is_cancelled() {
        return false;
    }
    select! {
        send(tx, item) -> res => res.is_ok(),
        recv(ctx.done()) -> _ => false,
    }
}

/// Receives the next item, or `None` once the queue is closed or the
/// context cancelled.
pub fn recv<T>(ctx: &Context, rx: &Receiver<T>) -> Option<T> {
    if ctx.is_cancelled() {
        return None;
    }
    select! {
        recv(rx) -> msg => msg.ok(),
        recv(ctx.done()) -> _ => None,
    }
}

fn spawn<F>(name: &str, f: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .map(drop)
        .map_err(Error::Spawn)
}

/// Runs `produce` on its own thread, feeding the returned queue.
pub fn generate<T, F>(ctx: &Context, produce: F) -> Result<Receiver<T>>
where
    T: Send + 'static,
    F: FnOnce(&Context, &Sender<T>) + Send + 'static,
{
    let (tx, rx) = bounded(0);
    let ctx = ctx.clone();
    spawn("respack-generate", move || produce(&ctx, &tx))?;
    Ok(rx)
}

/// Emits every item of `items`, then closes.
pub fn emit_all<T>(ctx: &Context, items: Vec<T>) -> Result<Receiver<T>>
where
    T: Send + 'static,
{
    generate(ctx, move |ctx, tx| {
        for item in items {
            if !send(ctx, tx, item) {
                return;
            }
        }
    })
}

/// Fans several queues into one.
///
/// The merged queue closes once every source has closed. Arrival order is
/// unspecified; items of one source keep their relative order.
pub fn merge<T>(ctx: &Context, sources: Vec<Receiver<T>>) -> Result<Receiver<T>>
where
    T: Send + 'static,
{
    let (tx, rx) = bounded(0);
    for source in sources {
        let ctx = ctx.clone();
        let tx = tx.clone();
        spawn("respack-merge", move || {
            while let Some(item) = recv(&ctx, &source) {
                if !send(&ctx, &tx, item) {
                    return;
                }
            }
        })?;
    }
    Ok(rx)
}

/// Starts `workers` threads pulling units from `input`.
///
/// Each worker gets its own data and error queues; both are merged before
/// being handed back. `work` returns false to stop its worker early.
pub fn fan_out<I, T, F>(
    ctx: &Context,
    workers: usize,
    input: Receiver<I>,
    work: F,
) -> Result<(Receiver<T>, Receiver<Error>)>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(&Context, I, &Sender<T>, &Sender<Error>) -> bool + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let mut data = Vec::with_capacity(workers);
    let mut errors = Vec::with_capacity(workers);
    for id in 0..workers.max(1) {
        let (tx, rx) = bounded(0);
        let (etx, erx) = bounded(0);
        data.push(rx);
        errors.push(erx);

        let ctx = ctx.clone();
        let input = input.clone();
        let work = Arc::clone(&work);
        spawn(&format!("respack-worker-{}", id), move || {
            while let Some(unit) = recv(&ctx, &input) {
                if !work(&ctx, unit, &tx, &etx) {
                    trace!("worker {} stopping early", id);
                    return;
                }
            }
        })?;
    }
    Ok((merge(ctx, data)?, merge(ctx, errors)?))
}

/// Collects `data` until both queues close.
///
/// The first error cancels the context and is returned; items received
/// before it are dropped.
pub fn drain<T>(ctx: &Context, data: Receiver<T>, errors: Receiver<Error>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    let mut data = Some(data);
    let mut errors = Some(errors);
    while data.is_some() || errors.is_some() {
        let data_rx = data.clone().unwrap_or_else(never);
        let errors_rx = errors.clone().unwrap_or_else(never);
        select! {
            recv(data_rx) -> msg => match msg {
                Ok(item) => out.push(item),
                Err(_) => data = None,
            },
            recv(errors_rx) -> msg => match msg {
                Ok(err) => {
                    ctx.cancel();
                    return Err(err);
                }
                Err(_) => errors = None,
            },
        }
    }
    Ok(out)
}
