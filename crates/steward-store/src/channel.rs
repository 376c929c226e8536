// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FIFO command channel between any number of producers and the one worker.

use steward_core::StewardError;
use tokio::sync::mpsc;

use crate::command::Command;

/// Create a connected sender/receiver pair.
///
/// The channel is unbounded: enqueueing never blocks, and commands are
/// received in the order their `send` calls completed.
pub fn channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, CommandReceiver { rx })
}

/// Producer half. Cheap to clone; one per caller is fine.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    /// Enqueue a command. Fails once the worker has stopped receiving.
    pub fn send(&self, command: Command) -> Result<(), StewardError> {
        self.tx.send(command).map_err(|rejected| StewardError::StoreUnavailable {
            reason: format!("worker is not accepting commands (`{}` rejected)", rejected.0.kind()),
        })
    }

    /// True once the receiving worker has shut down.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the worker.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl CommandReceiver {
    /// Next command, or `None` when every sender is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Command> {
        self.rx.recv().await
    }

    /// Refuse further sends and hand back everything still queued.
    pub fn close_and_drain(&mut self) -> Vec<Command> {
        self.rx.close();
        let mut left = Vec::new();
        while let Ok(command) = self.rx.try_recv() {
            left.push(command);
        }
        left
    }
}
