// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Simulated wallet.
//
// Tracks a connected address and a newest-first list of transactions.  New
// transactions start `Pending` and are confirmed after the configured
// confirmation latency by a background task on the current Tokio runtime.
// Nothing here talks to a real chain.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use docurex_core::config::Latency;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
}

#[derive(Debug, Default)]
struct WalletState {
    address: Option<String>,
    transactions: Vec<Transaction>,
}

/// Cheaply cloneable handle; clones share state.
#[derive(Debug, Clone)]
pub struct Wallet {
    state: Arc<Mutex<WalletState>>,
    confirmation: Latency,
}

impl Wallet {
    pub fn new(confirmation: Latency) -> Self {
        Self {
            state: Arc::new(Mutex::new(WalletState::default())),
            confirmation,
        }
    }

    /// Connect with a fresh random address and return it.
    pub fn connect(&self) -> String {
        let address = format!("0x{}", hex::encode(rand::random::<[u8; 20]>()));
        self.state.lock().expect("wallet lock poisoned").address = Some(address.clone());
        info!(%address, "wallet connected");
        address
    }

    pub fn disconnect(&self) {
        self.state.lock().expect("wallet lock poisoned").address = None;
        info!("wallet disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.address().is_some()
    }

    pub fn address(&self) -> Option<String> {
        self.state.lock().expect("wallet lock poisoned").address.clone()
    }

    /// Record a `Pending` transaction at the head of the list and schedule
    /// its confirmation.
    ///
    /// Outside a Tokio runtime there is nothing to schedule on, so the
    /// transaction is confirmed immediately.
    pub fn add_transaction(&self, description: &str) -> Transaction {
        let tx = Transaction {
            id: format!("tx_{}", Uuid::new_v4()),
            description: description.to_owned(),
            timestamp: Utc::now(),
            status: TransactionStatus::Pending,
        };
        self.state
            .lock()
            .expect("wallet lock poisoned")
            .transactions
            .insert(0, tx.clone());
        debug!(id = %tx.id, "transaction pending");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let wallet = self.clone();
                let id = tx.id.clone();
                let delay = self.confirmation.sample();
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    wallet.set_status(&id, TransactionStatus::Confirmed);
                });
            }
            Err(_) => self.set_status(&tx.id, TransactionStatus::Confirmed),
        }

        tx
    }

    /// All transactions, newest first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state
            .lock()
            .expect("wallet lock poisoned")
            .transactions
            .clone()
    }

    fn set_status(&self, id: &str, status: TransactionStatus) {
        let mut state = self.state.lock().expect("wallet lock poisoned");
        if let Some(tx) = state.transactions.iter_mut().find(|t| t.id == id) {
            tx.status = status;
            debug!(%id, ?status, "transaction updated");
        }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new(Latency::None)
    }
}
