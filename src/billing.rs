// billing.rs
// A billing run: pick the message mode, accrue each selected client, attach a receipt, dispatch.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    calendar::BillingPeriod,
    models::{ClientRecord, MonthStatus},
    money,
    receipt::Receipt,
    state::AppState,
};

/// Fields of the billing form. The first non-empty one, in declaration order, decides the mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingRequest {
    #[serde(default)]
    pub msg_aviso: String,
    #[serde(default)]
    pub msg_lembrete: String,
    #[serde(default)]
    pub msg_livre: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageMode {
    /// Notice template, typed text appended.
    Notice(String),
    /// Reminder template, typed text appended.
    Reminder(String),
    /// Typed text only: no receipt, month status ignored.
    FreeText(String),
    Fallback,
}

impl BillingRequest {
    pub fn mode(&self) -> MessageMode {
        let notice = self.msg_aviso.trim();
        let reminder = self.msg_lembrete.trim();
        let free = self.msg_livre.trim();
        if !notice.is_empty() {
            MessageMode::Notice(notice.to_string())
        } else if !reminder.is_empty() {
            MessageMode::Reminder(reminder.to_string())
        } else if !free.is_empty() {
            MessageMode::FreeText(free.to_string())
        } else {
            MessageMode::Fallback
        }
    }
}

impl MessageMode {
    pub fn label(&self) -> &'static str {
        match self {
            MessageMode::Notice(_) => "aviso",
            MessageMode::Reminder(_) => "lembrete",
            MessageMode::FreeText(_) => "mensagem livre",
            MessageMode::Fallback => "padrão",
        }
    }
}

/// Values substituted into a message template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub name: &'a str,
    pub month: &'a str,
    pub amount: &'a str,
    /// Carry-over description, already in parentheses; empty when none.
    pub pending: &'a str,
    pub pix: &'a str,
}

pub fn render_template(template: &str, vars: &TemplateVars<'_>) -> String {
    let pending = if vars.pending.is_empty() {
        String::new()
    } else {
        format!(" {}", vars.pending)
    };
    template
        .replace("{NOME}", vars.name)
        .replace("{MES}", vars.month)
        .replace("{VALOR}", vars.amount)
        .replace("{PENDENCIAS}", &pending)
        .replace("{PIX}", vars.pix)
        .trim()
        .to_string()
}

/// Rendered template followed by the typed text, separated by a blank line.
pub fn compose_message(rendered: &str, typed: Option<&str>) -> String {
    match typed.map(str::trim).filter(|t| !t.is_empty()) {
        Some(typed) => format!("{rendered}\n\n{typed}"),
        None => rendered.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ReferencePaid,
    NothingOwed,
    NoPhone,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::ReferencePaid => "mês de referência pago",
            SkipReason::NothingOwed => "nada a cobrar",
            SkipReason::NoPhone => "sem telefone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptOutcome {
    NotRequested,
    /// File name inside the receipts directory.
    Attached(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Sent {
        amount: Option<String>,
        receipt: ReceiptOutcome,
    },
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ClientOutcome {
    pub id: i64,
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reference: String,
    pub mode: &'static str,
    pub outcomes: Vec<ClientOutcome>,
}

impl RunSummary {
    pub fn sent(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Sent { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    /// Messages that went out without the receipt they should have carried.
    pub fn receipts_missing(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                Outcome::Sent {
                    receipt: ReceiptOutcome::Failed(_),
                    ..
                }
            )
        })
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|c| pred(&c.outcome)).count()
    }
}

/// Runs billing over every selected, active client. One client's failure never stops the run.
pub async fn run_billing(state: &AppState, request: &BillingRequest, today: NaiveDate) -> RunSummary {
    let mode = request.mode();
    let period = BillingPeriod::preceding(today);
    let reference = state.engine.months().name(period.month).to_string();
    let clients = state.clients.selected_active().await;
    tracing::info!(mode = mode.label(), reference = %reference, clients = clients.len(), "billing run started");

    let mut outcomes = Vec::with_capacity(clients.len());
    for client in &clients {
        let outcome = match &mode {
            MessageMode::FreeText(text) => send_free_text(state, client, text).await,
            _ => bill_client(state, client, &mode, &period, today).await,
        };
        outcomes.push(ClientOutcome {
            id: client.id,
            name: client.name.clone(),
            outcome,
        });
    }

    let summary = RunSummary {
        reference,
        mode: mode.label(),
        outcomes,
    };
    tracing::info!(
        sent = summary.sent(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "billing run finished"
    );
    summary
}

async fn send_free_text(state: &AppState, client: &ClientRecord, text: &str) -> Outcome {
    if !client.has_phone(&state.config.billing.no_phone_sentinel) {
        return Outcome::Skipped(SkipReason::NoPhone);
    }
    match state.messenger.send(&client.phone, text, None).await {
        Ok(()) => Outcome::Sent {
            amount: None,
            receipt: ReceiptOutcome::NotRequested,
        },
        Err(err) => {
            tracing::warn!(client = %client.name, error = %err, "free text dispatch failed");
            Outcome::Failed(err.to_string())
        }
    }
}

async fn bill_client(
    state: &AppState,
    client: &ClientRecord,
    mode: &MessageMode,
    period: &BillingPeriod,
    today: NaiveDate,
) -> Outcome {
    let billing = &state.config.billing;
    let accrual = state.engine.accrue(client, period.month);
    if !accrual.is_billable() {
        let reason = if accrual.reference_status == MonthStatus::Paid {
            SkipReason::ReferencePaid
        } else {
            SkipReason::NothingOwed
        };
        return Outcome::Skipped(reason);
    }
    if !client.has_phone(&billing.no_phone_sentinel) {
        return Outcome::Skipped(SkipReason::NoPhone);
    }

    let amount = money::format(accrual.total);
    let month = state.engine.months().name(period.month);

    let receipt = Receipt {
        client_name: client.name.clone(),
        amount_text: amount.clone(),
        period_label: format!("{} de {}", month, period.year),
        issued_on: today,
    };
    let (attachment, receipt_outcome) = match state.receipts.generate(&receipt).await {
        Ok(path) => {
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (Some(path), ReceiptOutcome::Attached(file))
        }
        Err(err) => {
            tracing::warn!(client = %client.name, error = %err, "receipt failed, sending without attachment");
            (None, ReceiptOutcome::Failed(err.to_string()))
        }
    };

    let (template, typed) = match mode {
        MessageMode::Notice(text) => (&billing.templates.notice, Some(text.as_str())),
        MessageMode::Reminder(text) => (&billing.templates.reminder, Some(text.as_str())),
        _ => (&billing.templates.fallback, None),
    };
    let pending = state.engine.describe(&accrual);
    let rendered = render_template(
        template,
        &TemplateVars {
            name: &client.name,
            month,
            amount: &amount,
            pending: &pending,
            pix: &billing.pix_key,
        },
    );
    let message = compose_message(&rendered, typed);

    match state
        .messenger
        .send(&client.phone, &message, attachment.as_deref())
        .await
    {
        Ok(()) => Outcome::Sent {
            amount: Some(amount),
            receipt: receipt_outcome,
        },
        Err(err) => {
            tracing::warn!(client = %client.name, error = %err, "dispatch failed");
            Outcome::Failed(err.to_string())
        }
    }
}
