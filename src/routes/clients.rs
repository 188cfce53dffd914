// routes/clients.rs
// Client management: search, add, selection, batch month-status edit and the full edit form.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Local;
use serde::Deserialize;

use crate::{
    calendar::reference_month,
    error::EditError,
    models::{ClientRecord, MonthStatus},
    state::{AppState, ClientEdit, NewClient, parse_id_list},
};

use super::helpers::{
    SimpleOption, account_status_options, month_options, month_status_options, notice_text,
    render, selected_ids, status_class,
};

#[derive(Template)]
#[template(path = "clientes.html")]
struct ManageTemplate {
    query: String,
    reference: String,
    rows: Vec<ClientRow>,
    notice: Option<String>,
    errors: Option<String>,
    new_name: String,
    new_phone: String,
    new_amount: String,
}

struct ClientRow {
    id: i64,
    name: String,
    phone: String,
    monthly: String,
    pending: String,
    account: &'static str,
    active: bool,
    selected: bool,
    reference_status: &'static str,
    reference_class: &'static str,
}

#[derive(Template)]
#[template(path = "lote.html")]
struct BatchTemplate {
    ids: String,
    clients: Vec<BatchRow>,
    month_options: Vec<SimpleOption>,
    status_options: Vec<SimpleOption>,
    errors: Option<String>,
}

struct BatchRow {
    id: i64,
    name: String,
    phone: String,
}

#[derive(Template)]
#[template(path = "editar.html")]
struct EditTemplate {
    id: i64,
    name: String,
    phone: String,
    monthly: String,
    pending: String,
    account_options: Vec<SimpleOption>,
    months: Vec<EditMonthRow>,
    errors: Option<String>,
}

struct EditMonthRow {
    name: String,
    options: Vec<SimpleOption>,
    paid: String,
}

#[derive(Deserialize, Default)]
pub struct ManageQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    aviso: Option<String>,
}

#[derive(Deserialize)]
pub struct NewClientForm {
    #[serde(default)]
    nome_cliente: String,
    #[serde(default)]
    telefone: String,
    #[serde(default)]
    valor_mensalidade: String,
}

#[derive(Deserialize)]
pub struct BatchForm {
    #[serde(default)]
    cliente_ids: String,
    #[serde(default)]
    mes: String,
    #[serde(default)]
    status: String,
}

fn client_row(state: &AppState, c: ClientRecord) -> ClientRow {
    let reference = reference_month(Local::now().date_naive());
    let status = c.status_of(state.clients.months().name(reference));
    ClientRow {
        id: c.id,
        account: c.account_status.as_str(),
        active: c.is_active(),
        selected: c.is_selected,
        reference_status: status.as_str(),
        reference_class: status_class(status),
        name: c.name,
        phone: c.phone,
        monthly: c.monthly_amount,
        pending: c.pending_adjustment,
    }
}

async fn manage_page(
    state: &AppState,
    query: &str,
    notice: Option<String>,
    errors: Option<String>,
    draft: Option<NewClientForm>,
) -> Result<Html<String>, StatusCode> {
    let rows = state
        .clients
        .search(query)
        .await
        .into_iter()
        .map(|c| client_row(state, c))
        .collect();
    let draft = draft.unwrap_or(NewClientForm {
        nome_cliente: String::new(),
        telefone: String::new(),
        valor_mensalidade: String::new(),
    });
    let reference = reference_month(Local::now().date_naive());

    render(ManageTemplate {
        query: query.trim().to_string(),
        reference: state.clients.months().name(reference).to_string(),
        rows,
        notice,
        errors,
        new_name: draft.nome_cliente,
        new_phone: draft.telefone,
        new_amount: draft.valor_mensalidade,
    })
}

fn respond(page: Result<Html<String>, StatusCode>) -> Response {
    page.map(IntoResponse::into_response)
        .unwrap_or_else(|status| status.into_response())
}

pub async fn clients_index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ManageQuery>,
) -> Result<Html<String>, StatusCode> {
    let notice = query
        .aviso
        .as_deref()
        .and_then(notice_text)
        .map(str::to_string);
    manage_page(&state, query.q.as_deref().unwrap_or(""), notice, None, None).await
}

pub async fn clients_create(
    State(state): State<Arc<AppState>>,
    Form(form): Form<NewClientForm>,
) -> Response {
    let input = NewClient {
        name: form.nome_cliente.clone(),
        phone: form.telefone.clone(),
        monthly_amount: form.valor_mensalidade.clone(),
    };
    match state.clients.add_client(input).await {
        Ok(id) => {
            tracing::info!(id, "client added");
            Redirect::to("/clientes?aviso=adicionado").into_response()
        }
        Err(err) if err.is_user_error() => {
            respond(manage_page(&state, "", None, Some(err.to_string()), Some(form)).await)
        }
        Err(err) => {
            tracing::error!(error = %err, "add client failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn clients_selection(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let ids: HashSet<i64> = selected_ids(&fields).into_iter().collect();
    match state.clients.save_selection(&ids).await {
        Ok(count) => {
            tracing::info!(selected = count, "selection saved");
            Redirect::to("/clientes?aviso=selecao").into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "save selection failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn batch_page(clients: &[ClientRecord], state: &AppState, errors: Option<String>) -> Response {
    let ids = clients
        .iter()
        .map(|c| c.id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let reference = reference_month(Local::now().date_naive());
    respond(render(BatchTemplate {
        ids,
        clients: clients
            .iter()
            .map(|c| BatchRow {
                id: c.id,
                name: c.name.clone(),
                phone: c.phone.clone(),
            })
            .collect(),
        month_options: month_options(
            &state.clients.months().names(),
            state.clients.months().name(reference),
        ),
        status_options: month_status_options(MonthStatus::Paid),
        errors,
    }))
}

/// Batch edit form for the selected active clients. Checkboxes submitted along are saved first.
pub async fn clients_batch_form(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    if fields.iter().any(|(k, _)| k.starts_with("selecao_")) {
        let ids: HashSet<i64> = selected_ids(&fields).into_iter().collect();
        if let Err(err) = state.clients.save_selection(&ids).await {
            tracing::error!(error = %err, "save selection failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let clients = state.clients.selected_active().await;
    if clients.is_empty() {
        return respond(
            manage_page(
                &state,
                "",
                None,
                Some("Nenhum cliente ativo selecionado para edição em lote.".into()),
                None,
            )
            .await,
        );
    }
    batch_page(&clients, &state, None)
}

pub async fn clients_batch_save(
    State(state): State<Arc<AppState>>,
    Form(form): Form<BatchForm>,
) -> Response {
    let ids = parse_id_list(&form.cliente_ids);
    match state
        .clients
        .batch_update_status(&ids, &form.mes, &form.status)
        .await
    {
        Ok(changed) => {
            tracing::info!(month = %form.mes, status = %form.status, changed, "batch status update");
            Redirect::to("/clientes?aviso=lote").into_response()
        }
        Err(err) if err.is_user_error() => {
            let wanted: HashSet<i64> = ids.into_iter().collect();
            let clients: Vec<ClientRecord> = state
                .clients
                .list()
                .await
                .into_iter()
                .filter(|c| wanted.contains(&c.id) && c.is_active())
                .collect();
            if clients.is_empty() {
                return respond(manage_page(&state, "", None, Some(err.to_string()), None).await);
            }
            batch_page(&clients, &state, Some(err.to_string()))
        }
        Err(err) => {
            tracing::error!(error = %err, "batch status update failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn edit_page(state: &AppState, client: ClientRecord, errors: Option<String>) -> Response {
    let months = state
        .clients
        .months()
        .iter()
        .map(|(_, name)| EditMonthRow {
            name: name.to_string(),
            options: month_status_options(client.status_of(name)),
            paid: client.partial_paid(name).unwrap_or("").to_string(),
        })
        .collect();
    respond(render(EditTemplate {
        id: client.id,
        account_options: account_status_options(client.account_status),
        months,
        errors,
        name: client.name,
        phone: client.phone,
        monthly: client.monthly_amount,
        pending: client.pending_adjustment,
    }))
}

pub async fn clients_edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    match state.clients.find(id).await {
        Some(client) => edit_page(&state, client, None),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Reads the full edit form: fixed fields plus `status_<MES>` and `valor_pago_<MES>` per month.
fn client_edit_from_fields(fields: Vec<(String, String)>) -> ClientEdit {
    let mut edit = ClientEdit::default();
    let mut statuses = BTreeMap::new();
    let mut partial_paid = BTreeMap::new();
    for (key, value) in fields {
        match key.as_str() {
            "nome_cliente" => edit.name = value,
            "telefone" => edit.phone = value,
            "valor_mensalidade" => edit.monthly_amount = Some(value),
            "pendencia" => edit.pending_adjustment = Some(value),
            "status_cliente" => edit.account_status = Some(value),
            _ => {
                if let Some(month) = key.strip_prefix("status_") {
                    statuses.insert(month.to_string(), value);
                } else if let Some(month) = key.strip_prefix("valor_pago_") {
                    partial_paid.insert(month.to_string(), value);
                }
            }
        }
    }
    edit.statuses = statuses;
    edit.partial_paid = partial_paid;
    edit
}

pub async fn clients_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let edit = client_edit_from_fields(fields);
    match state.clients.update_client(id, edit).await {
        Ok(()) => {
            tracing::info!(id, "client updated");
            Redirect::to("/clientes?aviso=editado").into_response()
        }
        Err(EditError::ClientNotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(err) if err.is_user_error() => match state.clients.find(id).await {
            Some(client) => edit_page(&state, client, Some(err.to_string())),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        Err(err) => {
            tracing::error!(id, error = %err, "client update failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
