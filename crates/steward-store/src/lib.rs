// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized SQLite store for user accounts.
//!
//! Callers talk to a [`UserStore`]. Every request becomes a [`Command`] on a
//! FIFO [`channel`], and one [`Worker`] task owning the only read-write
//! connection executes them in order through the [`DispatchTable`]. Each
//! caller awaits its own result through a one-shot completion handle.
//!
//! ```text
//! UserStore ──send──▶ channel ──recv──▶ Worker ──dispatch──▶ handler(conn)
//!     ▲                                    │
//!     └──────────── Completion ◀───────────┘
//! ```

pub mod channel;
pub mod command;
pub mod database;
pub mod dispatch;
pub mod facade;
pub mod handlers;
pub mod migrations;
pub mod snapshot;
pub mod worker;

pub use channel::{CommandReceiver, CommandSender, channel};
pub use command::{AddUser, Command, CommandKind, Completion, Pending, Reply, Request};
pub use dispatch::{DispatchTable, Handler, HandlerContext};
pub use facade::UserStore;
pub use handlers::HandlerError;
pub use snapshot::{list_active_users, list_active_users_async};
pub use worker::{Worker, WorkerHandle, spawn_store, spawn_store_with};
