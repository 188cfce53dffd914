use askama::Template;
use axum::{http::StatusCode, response::Html};

use crate::models::{AccountStatus, MonthStatus};

pub(super) fn render<T: Template>(tpl: T) -> Result<Html<String>, StatusCode> {
    tpl.render()
        .map(Html)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[derive(Clone)]
pub(super) struct SimpleOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub(super) fn month_status_options(current: MonthStatus) -> Vec<SimpleOption> {
    MonthStatus::ALL
        .iter()
        .map(|s| SimpleOption {
            value: s.as_str().to_string(),
            label: s.as_str().to_string(),
            selected: *s == current,
        })
        .collect()
}

pub(super) fn account_status_options(current: AccountStatus) -> Vec<SimpleOption> {
    [AccountStatus::Active, AccountStatus::Inactive]
        .iter()
        .map(|s| SimpleOption {
            value: s.as_str().to_string(),
            label: s.as_str().to_string(),
            selected: *s == current,
        })
        .collect()
}

pub(super) fn month_options(names: &[String], current: &str) -> Vec<SimpleOption> {
    names
        .iter()
        .map(|n| SimpleOption {
            value: n.clone(),
            label: n.clone(),
            selected: n == current,
        })
        .collect()
}

/// CSS class used for a status cell in the month grids.
pub(super) fn status_class(status: MonthStatus) -> &'static str {
    match status {
        MonthStatus::Open => "aberto",
        MonthStatus::Partial => "parcial",
        MonthStatus::Paid => "pago",
    }
}

/// Confirmation shown after a redirect, keyed by the `aviso` query value.
pub(super) fn notice_text(code: &str) -> Option<&'static str> {
    match code {
        "adicionado" => Some("Cliente adicionado com sucesso!"),
        "selecao" => Some("Seleção salva!"),
        "lote" => Some("Status atualizado em lote."),
        "editado" => Some("Cliente atualizado!"),
        _ => None,
    }
}

/// Ids of every `selecao_<id>` field present in a submitted form.
pub(super) fn selected_ids(fields: &[(String, String)]) -> Vec<i64> {
    fields
        .iter()
        .filter_map(|(key, _)| key.strip_prefix("selecao_"))
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}
