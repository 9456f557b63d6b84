//! Durable storage for in-progress drafts.
//!
//! Storage is modeled as an explicit [DraftStore] interface so the builder
//! logic can be tested without a real backend. The production store keeps
//! one serialized draft per admin in SQLite; [DraftSession] adds the
//! write-through mirroring discipline the transaction screen relies on.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{Error, database_id::AdminId, draft::Draft};

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Load the stored draft for `id_admin`, if there is one.
///
/// # Errors
/// This function will return a:
/// - [Error::Json] if the stored payload cannot be deserialized,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn load_draft(id_admin: AdminId, connection: &Connection) -> Result<Option<Draft>, Error> {
    let payload: Option<String> = connection
        .prepare("SELECT payload FROM draft WHERE id_admin = :id_admin")?
        .query_one(&[(":id_admin", &id_admin)], |row| row.get(0))
        .map(Some)
        .or_else(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            error => Err(error),
        })?;

    match payload {
        Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
        None => Ok(None),
    }
}

/// Persist the draft for `id_admin`, replacing any previous one.
///
/// # Errors
/// This function will return a:
/// - [Error::Json] if the draft cannot be serialized,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn save_draft(id_admin: AdminId, draft: &Draft, connection: &Connection) -> Result<(), Error> {
    let payload = serde_json::to_string(draft)?;
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO draft (id_admin, payload, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(id_admin) DO UPDATE SET payload = ?2, updated_at = ?3",
        (id_admin, payload, now),
    )?;

    Ok(())
}

/// Discard the stored draft for `id_admin`. Discarding a draft that does
/// not exist is a no-op.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn clear_draft(id_admin: AdminId, connection: &Connection) -> Result<(), Error> {
    connection.execute("DELETE FROM draft WHERE id_admin = ?1", [id_admin])?;

    Ok(())
}

/// Create the draft table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_draft_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS draft (
                id_admin INTEGER PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

// ============================================================================
// STORE INTERFACE
// ============================================================================

/// Durable storage for one draft per admin.
pub trait DraftStore {
    /// Load the stored draft, if there is one.
    fn load(&self, id_admin: AdminId) -> Result<Option<Draft>, Error>;

    /// Persist the draft, replacing any previous one.
    fn save(&self, id_admin: AdminId, draft: &Draft) -> Result<(), Error>;

    /// Discard the stored draft.
    fn clear(&self, id_admin: AdminId) -> Result<(), Error>;
}

impl<S: DraftStore> DraftStore for &S {
    fn load(&self, id_admin: AdminId) -> Result<Option<Draft>, Error> {
        (**self).load(id_admin)
    }

    fn save(&self, id_admin: AdminId, draft: &Draft) -> Result<(), Error> {
        (**self).save(id_admin, draft)
    }

    fn clear(&self, id_admin: AdminId) -> Result<(), Error> {
        (**self).clear(id_admin)
    }
}

/// The production [DraftStore] backed by the application database.
#[derive(Debug, Clone)]
pub struct SqliteDraftStore {
    db_connection: Arc<Mutex<Connection>>,
}

impl SqliteDraftStore {
    /// Create a store over `db_connection`. The draft table must already
    /// exist.
    pub fn new(db_connection: Arc<Mutex<Connection>>) -> Self {
        Self { db_connection }
    }
}

impl DraftStore for SqliteDraftStore {
    fn load(&self, id_admin: AdminId) -> Result<Option<Draft>, Error> {
        let connection = self.db_connection.lock().unwrap();
        load_draft(id_admin, &connection)
    }

    fn save(&self, id_admin: AdminId, draft: &Draft) -> Result<(), Error> {
        let connection = self.db_connection.lock().unwrap();
        save_draft(id_admin, draft, &connection)
    }

    fn clear(&self, id_admin: AdminId) -> Result<(), Error> {
        let connection = self.db_connection.lock().unwrap();
        clear_draft(id_admin, &connection)
    }
}

/// An in-memory [DraftStore] for tests.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<AdminId, Draft>>,
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, id_admin: AdminId) -> Result<Option<Draft>, Error> {
        Ok(self.drafts.lock().unwrap().get(&id_admin).cloned())
    }

    fn save(&self, id_admin: AdminId, draft: &Draft) -> Result<(), Error> {
        self.drafts.lock().unwrap().insert(id_admin, draft.clone());
        Ok(())
    }

    fn clear(&self, id_admin: AdminId) -> Result<(), Error> {
        self.drafts.lock().unwrap().remove(&id_admin);
        Ok(())
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// One admin's working draft with write-through mirroring.
///
/// Every change is mirrored to the store so a page reload does not lose
/// in-progress work, but mirroring stays suspended until the initial load
/// has completed. Without that gate, a screen that initializes with an
/// empty draft and saves on its first change event would overwrite the
/// stored draft before ever reading it.
#[derive(Debug)]
pub struct DraftSession<S: DraftStore> {
    store: S,
    id_admin: AdminId,
    draft: Draft,
    loaded: bool,
}

impl<S: DraftStore> DraftSession<S> {
    /// Create a session for `id_admin`. The draft starts empty and
    /// read-only until [DraftSession::load] is called.
    pub fn new(store: S, id_admin: AdminId) -> Self {
        Self {
            store,
            id_admin,
            draft: Draft::default(),
            loaded: false,
        }
    }

    /// Load the stored draft, or keep the empty one if nothing is stored.
    /// Enables mirroring.
    pub fn load(&mut self) -> Result<&Draft, Error> {
        if let Some(draft) = self.store.load(self.id_admin)? {
            self.draft = draft;
        }
        self.loaded = true;

        Ok(&self.draft)
    }

    /// The current draft state.
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Apply a change to the draft and mirror the result to the store.
    ///
    /// # Errors
    /// Returns an [Error::DraftNotLoaded] if called before
    /// [DraftSession::load]; the change is not applied.
    pub fn update(&mut self, change: impl FnOnce(&mut Draft)) -> Result<&Draft, Error> {
        if !self.loaded {
            return Err(Error::DraftNotLoaded);
        }

        change(&mut self.draft);
        self.store.save(self.id_admin, &self.draft)?;

        Ok(&self.draft)
    }

    /// Reset the draft and discard the stored copy, as done after a
    /// successful commit.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.draft = Draft::default();
        self.store.clear(self.id_admin)
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod session_tests {
    use crate::{Error, draft::DraftLayanan};

    use super::{DraftSession, DraftStore, MemoryDraftStore};

    #[test]
    fn update_before_load_is_rejected() {
        let store = MemoryDraftStore::default();
        store
            .save(
                1,
                &crate::draft::Draft {
                    nama_pasien: "Budi Santoso".to_owned(),
                    ..Default::default()
                },
            )
            .unwrap();
        let mut session = DraftSession::new(store, 1);

        let result = session.update(|draft| draft.bayar = 50_000.0);

        assert!(matches!(result, Err(Error::DraftNotLoaded)));
        // The stored draft was not overwritten with empty state.
        assert_eq!(
            session.store.load(1).unwrap().unwrap().nama_pasien,
            "Budi Santoso"
        );
    }

    #[test]
    fn update_after_load_writes_through() {
        let mut session = DraftSession::new(MemoryDraftStore::default(), 1);
        session.load().unwrap();

        session
            .update(|draft| {
                draft.nama_pasien = "Siti Aminah".to_owned();
                draft.tambah_layanan(DraftLayanan {
                    id_layanan: 1,
                    nama_layanan: "Konsultasi Dokter Umum".to_owned(),
                    total_harga: 50_000.0,
                });
            })
            .unwrap();

        let stored = session.store.load(1).unwrap().unwrap();
        assert_eq!(stored.nama_pasien, "Siti Aminah");
        assert_eq!(stored.layanan.len(), 1);
    }

    #[test]
    fn load_restores_previous_work() {
        let store = MemoryDraftStore::default();
        {
            let mut session = DraftSession::new(&store, 1);
            session.load().unwrap();
            session
                .update(|draft| draft.nama_pasien = "Budi Santoso".to_owned())
                .unwrap();
        }

        // A fresh session, as after a page reload.
        let mut session = DraftSession::new(&store, 1);
        let draft = session.load().unwrap();

        assert_eq!(draft.nama_pasien, "Budi Santoso");
    }

    #[test]
    fn clear_resets_draft_and_store() {
        let mut session = DraftSession::new(MemoryDraftStore::default(), 1);
        session.load().unwrap();
        session
            .update(|draft| draft.nama_pasien = "Budi Santoso".to_owned())
            .unwrap();

        session.clear().unwrap();

        assert_eq!(session.draft().nama_pasien, "");
        assert_eq!(session.store.load(1).unwrap(), None);
    }
}
