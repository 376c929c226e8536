// SPDX-FileCopyrightText: 2026 Steward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `steward backup`: an online copy taken in queue order by the worker.

use steward_core::StewardError;
use steward_store::UserStore;

pub async fn run(store: &UserStore, note: Option<&str>) -> Result<bool, StewardError> {
    let path = store.backup(note).await?;
    let size_mb = std::fs::metadata(&path)
        .map(|m| m.len() as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0);
    eprintln!("Backup complete: {size_mb:.1} MB");
    println!("{}", path.display());
    Ok(true)
}
