// routes/mod.rs
// Route handlers and the router that wires them.
//
// Endpoints:
// - GET  /                      -> dashboard with month grid and billing form
// - GET  /clientes?q=&aviso=    -> search and manage clients
// - POST /clientes              -> add client
// - POST /clientes/selecao      -> save which clients are selected
// - POST /clientes/lote         -> batch month-status form for selected clients
// - POST /clientes/lote/salvar  -> apply batch month-status edit
// - GET  /clientes/{id}/editar  -> full edit form
// - POST /clientes/{id}/salvar  -> apply full edit
// - POST /cobranca              -> run billing and show the outcome per client
// - GET  /recibos/{arquivo}     -> download a generated receipt

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod billing;
mod clients;
mod helpers;
mod home;
mod receipts;

pub use billing::billing_run;
pub use clients::{
    clients_batch_form, clients_batch_save, clients_create, clients_edit, clients_index,
    clients_selection, clients_update,
};
pub use home::home;
pub use receipts::receipt_file;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/clientes", get(clients_index).post(clients_create))
        .route("/clientes/selecao", post(clients_selection))
        .route("/clientes/lote", post(clients_batch_form))
        .route("/clientes/lote/salvar", post(clients_batch_save))
        .route("/clientes/{id}/editar", get(clients_edit))
        .route("/clientes/{id}/salvar", post(clients_update))
        .route("/cobranca", post(billing_run))
        .route("/recibos/{arquivo}", get(receipt_file))
        .with_state(state)
}
