// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single writer.
//!
//! One [`Worker`] owns the read-write connection for its whole life. It takes
//! commands off the channel strictly in arrival order and runs each handler
//! to completion before looking at the next one, so handlers never interleave
//! and every caller observes a single serial history.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use steward_config::StewardConfig;
use steward_core::{PasswordHasher, StewardError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::channel::{CommandReceiver, channel};
use crate::command::Command;
use crate::database;
use crate::dispatch::{DispatchTable, HandlerContext};
use crate::facade::UserStore;
use crate::handlers::HandlerError;

/// Store worker: connection, inbound queue, and the handlers it dispatches to.
pub struct Worker {
    conn: tokio_rusqlite::Connection,
    rx: CommandReceiver,
    table: DispatchTable,
    ctx: Arc<HandlerContext>,
}

impl Worker {
    /// Open the database named in `config` and prepare to serve `rx`.
    pub async fn open(
        config: &StewardConfig,
        rx: CommandReceiver,
        table: DispatchTable,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self, StewardError> {
        let path = Path::new(&config.storage.database_path);
        let conn = database::open(path, config.storage.wal_mode).await?;
        info!(path = %path.display(), "store opened");
        Ok(Self {
            conn,
            rx,
            table,
            ctx: Arc::new(HandlerContext::from_config(config, hasher)),
        })
    }

    /// Serve commands until `shutdown` fires, every sender is dropped, or the
    /// connection fails.
    ///
    /// A command already executing when shutdown fires runs to completion.
    /// Commands still queued are resolved with
    /// [`StewardError::StoreUnavailable`] and never executed.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), StewardError> {
        debug!(handlers = self.table.len(), "store worker running");

        let outcome = loop {
            let command = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    debug!("store worker received shutdown");
                    break Ok(());
                }
                next = self.rx.recv() => match next {
                    Some(command) => command,
                    None => {
                        debug!("all store handles dropped");
                        break Ok(());
                    }
                },
            };

            if let Err(fatal) = execute(&self.conn, &self.table, &self.ctx, command).await {
                error!(error = %fatal, "store connection unusable, worker stopping");
                break Err(fatal);
            }
        };

        let abandoned = self.rx.close_and_drain();
        if !abandoned.is_empty() {
            warn!(count = abandoned.len(), "discarding queued commands");
        }
        for command in abandoned {
            let kind = command.kind();
            command.completion.resolve(Err(StewardError::StoreUnavailable {
                reason: format!("worker shut down before `{kind}` ran"),
            }));
        }

        match outcome {
            Ok(()) => {
                database::close(self.conn).await?;
                info!("store closed");
                Ok(())
            }
            Err(fatal) => {
                if let Err(e) = database::close(self.conn).await {
                    debug!(error = %e, "close after fatal error failed");
                }
                Err(fatal)
            }
        }
    }
}

/// Run one command and resolve its completion.
///
/// Returns `Err` only when the connection can no longer be used.
async fn execute(
    conn: &tokio_rusqlite::Connection,
    table: &DispatchTable,
    ctx: &Arc<HandlerContext>,
    command: Command,
) -> Result<(), StewardError> {
    let Command {
        request,
        completion,
    } = command;
    let kind = request.kind();

    let handler = match table.handler(kind) {
        Ok(handler) => handler,
        Err(e) => {
            completion.resolve(Err(e));
            return Ok(());
        }
    };

    let ctx = Arc::clone(ctx);
    let started = Instant::now();
    let result = conn
        .call(move |conn| {
            // A panicking handler fails its own command. Any open transaction
            // rolls back while unwinding, so the connection stays usable.
            panic::catch_unwind(AssertUnwindSafe(|| handler(conn, &ctx, request)))
                .map_err(|payload| StewardError::Handler {
                    kind: kind.to_string(),
                    message: panic_message(payload.as_ref()),
                })
                .and_then(|outcome| outcome.map_err(HandlerError::into_inner))
        })
        .await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(reply) => {
            debug!(%kind, elapsed_ms, "command completed");
            completion.resolve(Ok(reply));
            Ok(())
        }
        Err(tokio_rusqlite::Error::Error(err)) if !err.is_fatal() => {
            match &err {
                StewardError::Conflict { .. } | StewardError::Validation(_) => {
                    debug!(%kind, error = %err, "command rejected");
                }
                _ => warn!(%kind, error = %err, elapsed_ms, "command failed"),
            }
            completion.resolve(Err(err));
            Ok(())
        }
        Err(other) => {
            let fatal = database::map_tr_err(other);
            let reason = match &fatal {
                StewardError::StoreUnavailable { reason } => reason.clone(),
                other => other.to_string(),
            };
            completion.resolve(Err(StewardError::StoreUnavailable { reason }));
            Err(fatal)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Control handle for a spawned worker task.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: CancellationToken,
    join: JoinHandle<Result<(), StewardError>>,
}

impl WorkerHandle {
    /// Token that stops the worker when cancelled. Hand it to a signal handler.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Request shutdown and wait for the worker to close the database.
    pub async fn shutdown(self) -> Result<(), StewardError> {
        self.shutdown.cancel();
        self.join().await
    }

    /// Wait for the worker to stop on its own.
    pub async fn join(self) -> Result<(), StewardError> {
        self.join
            .await
            .map_err(|e| StewardError::Internal(format!("store worker task failed: {e}")))?
    }
}

/// Open the store and spawn its worker with the built-in handlers.
pub async fn spawn_store(
    config: &StewardConfig,
    hasher: Arc<dyn PasswordHasher>,
) -> Result<(UserStore, WorkerHandle), StewardError> {
    spawn_store_with(config, hasher, DispatchTable::standard()).await
}

/// Open the store and spawn its worker with a caller-supplied dispatch table.
pub async fn spawn_store_with(
    config: &StewardConfig,
    hasher: Arc<dyn PasswordHasher>,
    table: DispatchTable,
) -> Result<(UserStore, WorkerHandle), StewardError> {
    let (tx, rx) = channel();
    let worker = Worker::open(config, rx, table, Arc::clone(&hasher)).await?;
    let shutdown = CancellationToken::new();
    let join = tokio::spawn(worker.run(shutdown.clone()));
    Ok((UserStore::new(tx, hasher), WorkerHandle { shutdown, join }))
}
