// routes/home.rs
// Dashboard: month grid per client, amount due for the reference month and the billing form.

use std::sync::Arc;

use askama::Template;
use axum::{extract::State, http::StatusCode, response::Html};
use chrono::Local;
use rust_decimal::Decimal;

use crate::{calendar::reference_month, money, state::AppState};

use super::helpers::{render, status_class};

#[derive(Template)]
#[template(path = "index.html")]
struct DashboardTemplate {
    reference: String,
    months: Vec<String>,
    rows: Vec<DashboardRow>,
    total_due: String,
    selected_count: usize,
}

struct StatusCell {
    label: &'static str,
    class: &'static str,
}

struct DashboardRow {
    id: i64,
    name: String,
    phone: String,
    monthly: String,
    active: bool,
    selected: bool,
    cells: Vec<StatusCell>,
    due: String,
    carryover: String,
}

pub async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, StatusCode> {
    let reference = reference_month(Local::now().date_naive());
    let months = state.clients.months();
    let clients = state.clients.list().await;

    let mut total_due = Decimal::ZERO;
    let mut selected_count = 0;
    let rows = clients
        .into_iter()
        .map(|c| {
            let accrual = state.engine.accrue(&c, reference);
            let due = if accrual.is_billable() {
                accrual.total
            } else {
                Decimal::ZERO
            };
            if c.is_active() {
                total_due += due;
            }
            if c.is_selected {
                selected_count += 1;
            }
            DashboardRow {
                id: c.id,
                cells: months
                    .iter()
                    .map(|(_, name)| {
                        let status = c.status_of(name);
                        StatusCell {
                            label: status.as_str(),
                            class: status_class(status),
                        }
                    })
                    .collect(),
                active: c.is_active(),
                selected: c.is_selected,
                due: money::format(due),
                carryover: state.engine.describe(&accrual),
                name: c.name,
                phone: c.phone,
                monthly: c.monthly_amount,
            }
        })
        .collect();

    render(DashboardTemplate {
        reference: months.name(reference).to_string(),
        months: months.names(),
        rows,
        total_due: money::format(total_due),
        selected_count,
    })
}
