// models.rs
// Client records as persisted in the clients JSON file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Payment status of one month for one client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MonthStatus {
    #[default]
    #[serde(rename = "EM ABERTO")]
    Open,
    #[serde(rename = "PARCIAL")]
    Partial,
    #[serde(rename = "PAGO")]
    Paid,
}

impl MonthStatus {
    pub const ALL: [MonthStatus; 3] = [MonthStatus::Open, MonthStatus::Partial, MonthStatus::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            MonthStatus::Open => "EM ABERTO",
            MonthStatus::Partial => "PARCIAL",
            MonthStatus::Paid => "PAGO",
        }
    }

    /// Accepts the stored labels and their English names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "EM ABERTO" | "OPEN" => Some(MonthStatus::Open),
            "PARCIAL" | "PARTIAL" => Some(MonthStatus::Partial),
            "PAGO" | "PAID" => Some(MonthStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AccountStatus {
    #[default]
    #[serde(rename = "ATIVO")]
    Active,
    #[serde(rename = "INATIVO")]
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ATIVO",
            AccountStatus::Inactive => "INATIVO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "ATIVO" | "ACTIVE" => Some(AccountStatus::Active),
            "INATIVO" | "INACTIVE" => Some(AccountStatus::Inactive),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

/// One client of the accountant. Field names on disk follow the existing data file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "selecao", default)]
    pub is_selected: bool,
    #[serde(rename = "nome_cliente", default)]
    pub name: String,
    #[serde(rename = "telefone", default)]
    pub phone: String,
    #[serde(rename = "valor_mensalidade", default = "zero_amount")]
    pub monthly_amount: String,
    #[serde(rename = "status_meses", default)]
    pub status_by_month: BTreeMap<String, MonthStatus>,
    #[serde(rename = "pagamentos_parciais", default)]
    pub partial_payments_by_month: BTreeMap<String, String>,
    #[serde(rename = "status_cliente", default)]
    pub account_status: AccountStatus,
    #[serde(rename = "pendencia", default = "zero_amount")]
    pub pending_adjustment: String,
}

pub(crate) fn zero_amount() -> String {
    "0,00".to_string()
}

impl Default for ClientRecord {
    fn default() -> Self {
        Self {
            id: 0,
            is_selected: false,
            name: String::new(),
            phone: String::new(),
            monthly_amount: zero_amount(),
            status_by_month: BTreeMap::new(),
            partial_payments_by_month: BTreeMap::new(),
            account_status: AccountStatus::Active,
            pending_adjustment: zero_amount(),
        }
    }
}

impl ClientRecord {
    /// Status of a month by name; months missing from the map are open.
    pub fn status_of(&self, month: &str) -> MonthStatus {
        self.status_by_month
            .get(month)
            .copied()
            .unwrap_or_default()
    }

    pub fn partial_paid(&self, month: &str) -> Option<&str> {
        self.partial_payments_by_month.get(month).map(String::as_str)
    }

    /// Sets a month's status, dropping the partial amount once the month is no longer partial.
    pub fn set_status(&mut self, month: &str, status: MonthStatus) {
        self.status_by_month.insert(month.to_string(), status);
        if status != MonthStatus::Partial {
            self.partial_payments_by_month.remove(month);
        }
    }

    pub fn is_active(&self) -> bool {
        self.account_status.is_active()
    }

    /// A phone that is blank or equal to the "no number" sentinel cannot receive messages.
    pub fn has_phone(&self, no_phone_sentinel: &str) -> bool {
        let phone = self.phone.trim();
        !phone.is_empty() && phone != no_phone_sentinel
    }
}
