// state/mod.rs
// Shared application state and its initialization from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    accrual::AccrualEngine,
    config::AppConfig,
    messaging::{GzappyMessenger, Messenger, SupabaseStager},
    receipt::{ReceiptGenerator, TypstReceipts},
};

mod clients;
mod store;

pub use clients::*;
pub use store::*;

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub clients: ClientBook,
    pub engine: AccrualEngine,
    pub receipts: Arc<dyn ReceiptGenerator>,
    pub messenger: Arc<dyn Messenger>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ClientStore>,
        receipts: Arc<dyn ReceiptGenerator>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let engine = AccrualEngine::new(&config.billing);
        let clients = ClientBook::new(store, config.billing.months.clone());
        Self {
            config: Arc::new(config),
            clients,
            engine,
            receipts,
            messenger,
        }
    }
}

pub async fn init_state(config: AppConfig) -> Result<AppState> {
    tokio::fs::create_dir_all(&config.receipts_dir)
        .await
        .with_context(|| format!("cannot create {}", config.receipts_dir.display()))?;

    let store = Arc::new(JsonFileStore::new(
        config.clients_file.clone(),
        config.billing.months.clone(),
    ));
    let receipts = Arc::new(TypstReceipts::new(&config));

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let stager = Arc::new(SupabaseStager::new(http.clone(), config.storage.clone()));
    let messenger = Arc::new(GzappyMessenger::new(http, config.messaging.clone(), stager));

    let state = AppState::new(config, store, receipts, messenger);
    // rewrite whatever is on disk in the current shape; an unreadable file is left alone
    if let Err(err) = state.clients.normalize().await {
        tracing::error!(error = %err, "clients file left untouched");
    }
    tracing::info!(
        clients_file = %state.config.clients_file.display(),
        accrual = ?state.config.billing.accrual_mode,
        "state initialized"
    );
    Ok(state)
}
