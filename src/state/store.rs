use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;
use tokio::fs;

use crate::{
    calendar::MonthNames,
    error::StoreError,
    models::{AccountStatus, ClientRecord, MonthStatus},
    sanitize::{from_value, sanitize},
};

/// Whole-collection persistence for client records.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Strict read used before any write. A missing source is an empty collection;
    /// an unreadable or malformed one is an error, so it is never overwritten.
    async fn try_load(&self) -> Result<Vec<ClientRecord>, StoreError>;

    async fn save(&self, clients: &[ClientRecord]) -> Result<(), StoreError>;

    /// Lenient read for views: any failure is logged and shows as an empty collection.
    async fn load(&self) -> Vec<ClientRecord> {
        self.try_load().await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "cannot load clients");
            Vec::new()
        })
    }
}

// Month-keyed map written in calendar order; keys that are not month names follow.
struct InCalendarOrder<'a, V> {
    months: &'a MonthNames,
    map: &'a BTreeMap<String, V>,
}

impl<V: Serialize> Serialize for InCalendarOrder<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.map.len()))?;
        for (_, name) in self.months.iter() {
            if let Some(value) = self.map.get(name) {
                out.serialize_entry(name, value)?;
            }
        }
        for (key, value) in self.map {
            if self.months.parse(key).is_none() {
                out.serialize_entry(key, value)?;
            }
        }
        out.end()
    }
}

/// On-disk shape of one client; same keys as `ClientRecord`, months in calendar order.
#[derive(Serialize)]
struct StoredClient<'a> {
    id: i64,
    selecao: bool,
    nome_cliente: &'a str,
    telefone: &'a str,
    valor_mensalidade: &'a str,
    status_meses: InCalendarOrder<'a, MonthStatus>,
    pagamentos_parciais: InCalendarOrder<'a, String>,
    status_cliente: AccountStatus,
    pendencia: &'a str,
}

impl<'a> StoredClient<'a> {
    fn new(client: &'a ClientRecord, months: &'a MonthNames) -> Self {
        Self {
            id: client.id,
            selecao: client.is_selected,
            nome_cliente: &client.name,
            telefone: &client.phone,
            valor_mensalidade: &client.monthly_amount,
            status_meses: InCalendarOrder {
                months,
                map: &client.status_by_month,
            },
            pagamentos_parciais: InCalendarOrder {
                months,
                map: &client.partial_payments_by_month,
            },
            status_cliente: client.account_status,
            pendencia: &client.pending_adjustment,
        }
    }
}

/// Clients kept as a pretty-printed JSON array on disk.
pub struct JsonFileStore {
    path: PathBuf,
    months: MonthNames,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, months: MonthNames) -> Self {
        Self {
            path: path.into(),
            months,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ClientStore for JsonFileStore {
    async fn try_load(&self) -> Result<Vec<ClientRecord>, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        let entries: Vec<Value> =
            serde_json::from_str(&contents).map_err(|source| StoreError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        Ok(entries
            .iter()
            .map(|entry| from_value(entry, &self.months))
            .collect())
    }

    async fn save(&self, clients: &[ClientRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let sanitized: Vec<ClientRecord> = clients
            .iter()
            .cloned()
            .map(|c| sanitize(c, &self.months))
            .collect();
        let stored: Vec<StoredClient<'_>> = sanitized
            .iter()
            .map(|c| StoredClient::new(c, &self.months))
            .collect();
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }
}
