//! The in-progress billing draft (transaction builder).
//!
//! A draft accumulates a prospective transaction before it is committed:
//! the patient name, an optional bound patient record, the selected
//! services, and the amount tendered. Derived totals (change due, remaining
//! balance) are recomputed on every read, never cached. The draft is
//! mirrored to durable storage on every change so a page reload does not
//! lose in-progress work.

mod core;
mod endpoint;
mod store;

pub use core::{Amendment, Draft, DraftLayanan, Settlement};
pub use endpoint::{delete_draft_endpoint, get_draft_endpoint, put_draft_endpoint};
pub use store::{
    DraftSession, DraftStore, MemoryDraftStore, SqliteDraftStore, clear_draft, create_draft_table,
    load_draft, save_draft,
};
