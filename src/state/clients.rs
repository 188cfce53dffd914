use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use tokio::sync::Mutex;

use crate::{
    calendar::MonthNames,
    error::{EditError, StoreError},
    models::{AccountStatus, ClientRecord, MonthStatus, zero_amount},
    money,
    sanitize::sanitize,
};

use super::store::ClientStore;

/// Input of the "add client" form.
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    pub monthly_amount: String,
}

/// Input of the full edit form. Blank optional fields keep or reset values as documented per field.
#[derive(Debug, Clone, Default)]
pub struct ClientEdit {
    pub name: String,
    pub phone: String,
    /// Blank keeps the current amount.
    pub monthly_amount: Option<String>,
    /// Blank resets to zero.
    pub pending_adjustment: Option<String>,
    pub account_status: Option<String>,
    /// Month name -> submitted status label. Months not listed keep their status.
    pub statuses: BTreeMap<String, String>,
    /// Month name -> amount paid. Blank or missing removes the entry.
    pub partial_paid: BTreeMap<String, String>,
}

/// Client collection with serialized read-modify-write access to the store.
pub struct ClientBook {
    store: Arc<dyn ClientStore>,
    months: MonthNames,
    writer: Mutex<()>,
}

/// Parses "1, 2,x,3" into the valid ids, in order.
pub fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

impl ClientBook {
    pub fn new(store: Arc<dyn ClientStore>, months: MonthNames) -> Self {
        Self {
            store,
            months,
            writer: Mutex::new(()),
        }
    }

    pub fn months(&self) -> &MonthNames {
        &self.months
    }

    pub async fn list(&self) -> Vec<ClientRecord> {
        self.store.load().await
    }

    pub async fn find(&self, id: i64) -> Option<ClientRecord> {
        self.list().await.into_iter().find(|c| c.id == id)
    }

    /// Case-insensitive match on name or phone; a blank query returns everyone.
    pub async fn search(&self, query: &str) -> Vec<ClientRecord> {
        let needle = query.trim().to_lowercase();
        let clients = self.list().await;
        if needle.is_empty() {
            return clients;
        }
        clients
            .into_iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle) || c.phone.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub async fn selected_active(&self) -> Vec<ClientRecord> {
        self.list()
            .await
            .into_iter()
            .filter(|c| c.is_selected && c.is_active())
            .collect()
    }

    // Runs `change` on the freshly loaded collection and persists only if it succeeds.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<ClientRecord>) -> Result<T, EditError>,
    ) -> Result<T, EditError> {
        let _guard = self.writer.lock().await;
        let mut clients = self.store.try_load().await?;
        let out = change(&mut clients)?;
        self.store.save(&clients).await?;
        Ok(out)
    }

    /// Rewrites the file with every record sanitized.
    pub async fn normalize(&self) -> Result<(), StoreError> {
        match self.mutate(|_| Ok(())).await {
            Ok(()) => Ok(()),
            Err(EditError::Store(err)) => Err(err),
            Err(_) => Ok(()),
        }
    }

    pub async fn add_client(&self, input: NewClient) -> Result<i64, EditError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(EditError::NameRequired);
        }
        let months = self.months.clone();
        self.mutate(move |clients| {
            let id = clients.iter().map(|c| c.id).max().unwrap_or(0) + 1;
            let mut record = ClientRecord {
                id,
                name,
                phone: input.phone.trim().to_string(),
                monthly_amount: money::normalize(&input.monthly_amount),
                ..ClientRecord::default()
            };
            for (_, month) in months.iter() {
                record.set_status(month, MonthStatus::Open);
            }
            clients.push(record);
            Ok(id)
        })
        .await
    }

    /// Marks exactly the given ids as selected. Inactive clients stay unselected.
    pub async fn save_selection(&self, ids: &HashSet<i64>) -> Result<usize, EditError> {
        self.mutate(|clients| {
            let mut selected = 0;
            for client in clients.iter_mut() {
                client.is_selected = client.is_active() && ids.contains(&client.id);
                if client.is_selected {
                    selected += 1;
                }
            }
            Ok(selected)
        })
        .await
    }

    /// Sets one month's status on every active client among `ids`. Returns how many changed.
    pub async fn batch_update_status(
        &self,
        ids: &[i64],
        month: &str,
        status: &str,
    ) -> Result<usize, EditError> {
        if month.trim().is_empty() {
            return Err(EditError::MissingField("mes"));
        }
        if status.trim().is_empty() {
            return Err(EditError::MissingField("status"));
        }
        if ids.is_empty() {
            return Err(EditError::EmptySelection);
        }
        let month = self
            .months
            .parse(month)
            .map(|m| self.months.name(m).to_string())
            .ok_or_else(|| EditError::UnknownMonth(month.to_string()))?;
        let status =
            MonthStatus::parse(status).ok_or_else(|| EditError::UnknownStatus(status.to_string()))?;

        let wanted: HashSet<i64> = ids.iter().copied().collect();
        self.mutate(|clients| {
            let mut changed = 0;
            for client in clients
                .iter_mut()
                .filter(|c| c.is_active() && wanted.contains(&c.id))
            {
                client.set_status(&month, status);
                changed += 1;
            }
            Ok(changed)
        })
        .await
    }

    pub async fn update_client(&self, id: i64, edit: ClientEdit) -> Result<(), EditError> {
        let name = edit.name.trim().to_string();
        if name.is_empty() {
            return Err(EditError::NameRequired);
        }
        let account_status = match edit.account_status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                AccountStatus::parse(raw).ok_or_else(|| EditError::UnknownStatus(raw.to_string()))?,
            ),
        };
        let mut statuses = Vec::new();
        for (month, raw) in &edit.statuses {
            let Some(m) = self.months.parse(month) else {
                return Err(EditError::UnknownMonth(month.clone()));
            };
            let status = if raw.trim().is_empty() {
                MonthStatus::Open
            } else {
                MonthStatus::parse(raw).ok_or_else(|| EditError::UnknownStatus(raw.clone()))?
            };
            statuses.push((self.months.name(m).to_string(), status));
        }

        let months = self.months.clone();
        self.mutate(move |clients| {
            let client = clients
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(EditError::ClientNotFound(id))?;

            client.name = name;
            client.phone = edit.phone.trim().to_string();
            if let Some(amount) = edit.monthly_amount.filter(|a| !a.trim().is_empty()) {
                client.monthly_amount = money::normalize(&amount);
            }
            client.pending_adjustment = edit
                .pending_adjustment
                .filter(|a| !a.trim().is_empty())
                .map(|a| money::normalize(&a))
                .unwrap_or_else(zero_amount);
            if let Some(status) = account_status {
                client.account_status = status;
            }

            for (month, status) in statuses {
                client.status_by_month.insert(month, status);
            }
            for (_, month) in months.iter() {
                match edit.partial_paid.get(month).map(|v| v.trim()) {
                    Some(paid) if !paid.is_empty() => {
                        client
                            .partial_payments_by_month
                            .insert(month.to_string(), money::normalize(paid));
                    }
                    _ => {
                        client.partial_payments_by_month.remove(month);
                    }
                }
            }

            *client = sanitize(client.clone(), &months);
            Ok(())
        })
        .await
    }
}
