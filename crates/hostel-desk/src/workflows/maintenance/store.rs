//! Normalized request table.
//!
//! Every maintenance record lives exactly once, keyed by id. Role specific
//! lists are derived from the table (see [`super::views`]) instead of being
//! kept as parallel copies. Multi-record writes go through a staging area so a
//! batch is either confirmed as a whole or rolled back.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::domain::{MaintenanceRequest, RequestId};
use super::repository::{MaintenanceRepository, RepositoryError};
use super::views::ViewScope;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTable {
    confirmed: BTreeMap<RequestId, MaintenanceRequest>,
    staged: BTreeMap<RequestId, MaintenanceRequest>,
}

/// State changes the table understands.
#[derive(Debug, Clone)]
pub enum TableAction {
    /// Replace the whole table.
    Loaded(Vec<MaintenanceRequest>),
    Upserted(MaintenanceRequest),
    /// Hold tentative copies next to the confirmed records.
    Staged(Vec<MaintenanceRequest>),
    Confirmed(Vec<RequestId>),
    RolledBack(Vec<RequestId>),
}

/// Pure reducer: consumes a table and returns the next one.
pub fn reduce(mut table: RequestTable, action: TableAction) -> RequestTable {
    match action {
        TableAction::Loaded(records) => {
            table.staged.clear();
            table.confirmed = records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect();
        }
        TableAction::Upserted(record) => {
            table.staged.remove(&record.id);
            table.confirmed.insert(record.id.clone(), record);
        }
        TableAction::Staged(records) => {
            for record in records {
                table.staged.insert(record.id.clone(), record);
            }
        }
        TableAction::Confirmed(ids) => {
            for id in ids {
                if let Some(record) = table.staged.remove(&id) {
                    table.confirmed.insert(id, record);
                }
            }
        }
        TableAction::RolledBack(ids) => {
            for id in ids {
                table.staged.remove(&id);
            }
        }
    }
    table
}

impl RequestTable {
    pub fn apply(&mut self, action: TableAction) {
        let table = std::mem::take(self);
        *self = reduce(table, action);
    }

    /// Confirmed record for `id`.
    pub fn get(&self, id: &RequestId) -> Option<&MaintenanceRequest> {
        self.confirmed.get(id)
    }

    /// Tentative copy if one is staged, otherwise the confirmed record.
    pub fn current(&self, id: &RequestId) -> Option<&MaintenanceRequest> {
        self.staged.get(id).or_else(|| self.confirmed.get(id))
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.confirmed.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.confirmed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &MaintenanceRequest> {
        self.confirmed.values()
    }

    pub fn staged_ids(&self) -> Vec<RequestId> {
        self.staged.keys().cloned().collect()
    }
}

/// Repository backed by a [`RequestTable`] behind a mutex.
#[derive(Debug, Default)]
pub struct TableRepository {
    table: Mutex<RequestTable>,
}

impl TableRepository {
    pub fn new(table: RequestTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }

    pub fn snapshot(&self) -> Result<RequestTable, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, RequestTable>, RepositoryError> {
        self.table
            .lock()
            .map_err(|_| RepositoryError::Unavailable("request table lock poisoned".to_string()))
    }
}

fn check_version(
    table: &RequestTable,
    record: &MaintenanceRequest,
) -> Result<(), RepositoryError> {
    let stored = table
        .get(&record.id)
        .ok_or_else(|| RepositoryError::NotFound(record.id.clone()))?;
    let expected = record.version.saturating_sub(1);
    if stored.version != expected {
        return Err(RepositoryError::StaleVersion {
            id: record.id.clone(),
            expected,
            found: stored.version,
        });
    }
    Ok(())
}

impl MaintenanceRepository for TableRepository {
    fn insert(&self, record: MaintenanceRequest) -> Result<MaintenanceRequest, RepositoryError> {
        let mut table = self.lock()?;
        if table.contains(&record.id) {
            return Err(RepositoryError::Conflict(record.id.clone()));
        }
        table.apply(TableAction::Upserted(record.clone()));
        Ok(record)
    }

    fn update(&self, record: MaintenanceRequest) -> Result<(), RepositoryError> {
        let mut table = self.lock()?;
        check_version(&table, &record)?;
        table.apply(TableAction::Upserted(record));
        Ok(())
    }

    fn update_batch(&self, records: Vec<MaintenanceRequest>) -> Result<(), RepositoryError> {
        let mut table = self.lock()?;
        let ids: Vec<RequestId> = records.iter().map(|record| record.id.clone()).collect();
        table.apply(TableAction::Staged(records));

        let failure = ids.iter().find_map(|id| {
            table
                .current(id)
                .and_then(|staged| check_version(&table, staged).err())
        });

        match failure {
            Some(error) => {
                debug!(batch = ids.len(), %error, "rolling back staged batch");
                table.apply(TableAction::RolledBack(ids));
                Err(error)
            }
            None => {
                table.apply(TableAction::Confirmed(ids));
                Ok(())
            }
        }
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn list(&self, scope: &ViewScope) -> Result<Vec<MaintenanceRequest>, RepositoryError> {
        let table = self.lock()?;
        Ok(table
            .records()
            .filter(|record| scope.contains(record))
            .cloned()
            .collect())
    }
}
