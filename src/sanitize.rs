// sanitize.rs
// Repairs client records loaded from disk so every expected field is present.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{
    calendar::MonthNames,
    models::{AccountStatus, ClientRecord, MonthStatus},
    money,
};

/// Fills the twelve months, drops stale partial payments and clears the selection of
/// inactive clients. Calling it again on its own output changes nothing.
pub fn sanitize(mut record: ClientRecord, months: &MonthNames) -> ClientRecord {
    let mut statuses = BTreeMap::new();
    for (_, name) in months.iter() {
        statuses.insert(name.to_string(), record.status_of(name));
    }
    record.status_by_month = statuses;

    record
        .partial_payments_by_month
        .retain(|month, _| record.status_by_month.get(month) == Some(&MonthStatus::Partial));

    if !record.is_active() {
        record.is_selected = false;
    }
    record
}

fn read_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Amounts written as JSON numbers by older files ("350.5") are not in the localized form.
fn read_amount(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n
            .as_f64()
            .and_then(rust_decimal::Decimal::from_f64_retain)
            .map(money::format),
        _ => None,
    }
}

fn read_id(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Builds a record from one raw JSON entry, defaulting whatever is missing or mistyped.
pub fn from_value(value: &Value, months: &MonthNames) -> ClientRecord {
    let defaults = ClientRecord::default();

    let status_by_month = value
        .get("status_meses")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(month, status)| {
                    let status = status
                        .as_str()
                        .and_then(MonthStatus::parse)
                        .unwrap_or_default();
                    (month.clone(), status)
                })
                .collect()
        })
        .unwrap_or_default();

    let partial_payments_by_month = value
        .get("pagamentos_parciais")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(month, paid)| read_amount(Some(paid)).map(|p| (month.clone(), p)))
                .collect()
        })
        .unwrap_or_default();

    let record = ClientRecord {
        id: read_id(value.get("id")),
        is_selected: value
            .get("selecao")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        name: read_string(value.get("nome_cliente")).unwrap_or(defaults.name),
        phone: read_string(value.get("telefone")).unwrap_or(defaults.phone),
        monthly_amount: read_amount(value.get("valor_mensalidade"))
            .unwrap_or(defaults.monthly_amount),
        status_by_month,
        partial_payments_by_month,
        account_status: value
            .get("status_cliente")
            .and_then(Value::as_str)
            .and_then(AccountStatus::parse)
            .unwrap_or_default(),
        pending_adjustment: read_amount(value.get("pendencia"))
            .unwrap_or(defaults.pending_adjustment),
    };
    sanitize(record, months)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn months() -> MonthNames {
        MonthNames::default()
    }

    #[test]
    fn empty_object_gets_every_default() {
        let record = from_value(&json!({}), &months());
        assert_eq!(record.id, 0);
        assert!(!record.is_selected);
        assert_eq!(record.account_status, AccountStatus::Active);
        assert_eq!(record.monthly_amount, "0,00");
        assert_eq!(record.pending_adjustment, "0,00");
        assert_eq!(record.phone, "");
        assert_eq!(record.name, "");
        assert_eq!(record.status_by_month.len(), 12);
        assert!(record.status_by_month.values().all(|s| *s == MonthStatus::Open));
        assert!(record.partial_payments_by_month.is_empty());
    }

    #[test]
    fn existing_values_are_preserved() {
        let raw = json!({
            "id": "4",
            "nome_cliente": "Oficina Lima",
            "telefone": 5567999990000u64,
            "valor_mensalidade": 350.5,
            "status_meses": {"JANEIRO": "PAGO", "FEVEREIRO": "PARCIAL", "MARCO": "???"},
            "pagamentos_parciais": {"FEVEREIRO": "100,00", "JANEIRO": "10,00"},
            "status_cliente": "ATIVO",
            "selecao": true
        });
        let record = from_value(&raw, &months());
        assert_eq!(record.id, 4);
        assert_eq!(record.phone, "5567999990000");
        assert_eq!(record.monthly_amount, "350,50");
        assert_eq!(record.status_of("JANEIRO"), MonthStatus::Paid);
        assert_eq!(record.status_of("FEVEREIRO"), MonthStatus::Partial);
        assert_eq!(record.status_of("MARCO"), MonthStatus::Open);
        assert_eq!(record.partial_paid("FEVEREIRO"), Some("100,00"));
        // January is paid, so its partial amount is stale
        assert_eq!(record.partial_paid("JANEIRO"), None);
        assert!(record.is_selected);
    }

    #[test]
    fn wrongly_typed_maps_fall_back_to_defaults() {
        let raw = json!({"status_meses": "PAGO", "pagamentos_parciais": [1, 2]});
        let record = from_value(&raw, &months());
        assert_eq!(record.status_by_month.len(), 12);
        assert!(record.partial_payments_by_month.is_empty());
    }

    #[test]
    fn inactive_clients_are_never_selected() {
        let raw = json!({"status_cliente": "INATIVO", "selecao": true});
        let record = from_value(&raw, &months());
        assert!(!record.is_selected);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let raw = json!({
            "id": 2,
            "status_meses": {"MAIO": "PARCIAL", "JUNHO": "PAGO", "XYZ": "PAGO"},
            "pagamentos_parciais": {"MAIO": "5,00", "JUNHO": "1,00"},
        });
        let once = from_value(&raw, &months());
        let twice = sanitize(once.clone(), &months());
        assert_eq!(once, twice);
        assert!(!once.status_by_month.contains_key("XYZ"));
    }
}
