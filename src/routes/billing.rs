// routes/billing.rs
// Runs billing for the selected clients and shows what happened to each one.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::Html,
};
use chrono::Local;

use crate::{
    billing::{BillingRequest, Outcome, ReceiptOutcome, run_billing},
    state::AppState,
};

use super::helpers::render;

#[derive(Template)]
#[template(path = "cobranca.html")]
struct RunTemplate {
    reference: String,
    mode: &'static str,
    sent: usize,
    skipped: usize,
    failed: usize,
    receipts_missing: usize,
    rows: Vec<OutcomeRow>,
}

struct OutcomeRow {
    name: String,
    class: &'static str,
    result: String,
    amount: String,
    receipt: Option<String>,
}

fn outcome_row(name: String, outcome: Outcome) -> OutcomeRow {
    match outcome {
        Outcome::Sent { amount, receipt } => {
            let (result, file) = match receipt {
                ReceiptOutcome::NotRequested => ("Enviado".to_string(), None),
                ReceiptOutcome::Attached(file) => ("Enviado com recibo".to_string(), Some(file)),
                ReceiptOutcome::Failed(err) => (format!("Enviado sem recibo ({err})"), None),
            };
            OutcomeRow {
                name,
                class: "enviado",
                result,
                amount: amount.unwrap_or_default(),
                receipt: file,
            }
        }
        Outcome::Skipped(reason) => OutcomeRow {
            name,
            class: "pulado",
            result: format!("Não enviado: {}", reason.describe()),
            amount: String::new(),
            receipt: None,
        },
        Outcome::Failed(err) => OutcomeRow {
            name,
            class: "falha",
            result: format!("Falha: {err}"),
            amount: String::new(),
            receipt: None,
        },
    }
}

pub async fn billing_run(
    State(state): State<Arc<AppState>>,
    Form(request): Form<BillingRequest>,
) -> Result<Html<String>, StatusCode> {
    let summary = run_billing(&state, &request, Local::now().date_naive()).await;

    render(RunTemplate {
        reference: summary.reference.clone(),
        mode: summary.mode,
        sent: summary.sent(),
        skipped: summary.skipped(),
        failed: summary.failed(),
        receipts_missing: summary.receipts_missing(),
        rows: summary
            .outcomes
            .into_iter()
            .map(|c| outcome_row(c.name, c.outcome))
            .collect(),
    })
}
