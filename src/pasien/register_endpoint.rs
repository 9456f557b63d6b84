//! Defines the endpoint for registering a new patient.
//!
//! The registration desk can register a walk-in patient directly from the
//! transaction screen, so this lives with the billing workflow even though
//! the full patient management screens are an external collaborator.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    pasien::{Nik, Pasien, create_pasien},
};

/// The state needed to register a patient.
#[derive(Debug, Clone)]
pub struct RegisterPasienState {
    /// The database connection for the patient directory.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegisterPasienState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for registering a patient.
///
/// The NIK arrives as a raw string so length validation produces the
/// field-level [Error::InvalidNik] response instead of a deserialization
/// failure.
#[derive(Debug, Deserialize)]
pub struct RegisterPasienForm {
    /// The 16 character national identity number.
    pub nik: String,
    /// The patient's full name.
    pub nama: String,
    /// The patient's home address.
    pub alamat: String,
}

/// A route handler that registers a new patient and returns the created
/// record.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn register_pasien_endpoint(
    State(state): State<RegisterPasienState>,
    Json(form): Json<RegisterPasienForm>,
) -> Response {
    let pasien = match validate_form(form) {
        Ok(pasien) => pasien,
        Err(error) => return error.into_response(),
    };

    let connection = state.db_connection.lock().unwrap();

    match create_pasien(&pasien, &connection) {
        Ok(pasien) => {
            tracing::info!("Registered patient {}", pasien.nik);
            (StatusCode::CREATED, Json(pasien)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

fn validate_form(form: RegisterPasienForm) -> Result<Pasien, Error> {
    let nik = Nik::new(&form.nik)?;

    let nama = form.nama.trim();
    if nama.is_empty() {
        return Err(Error::EmptyField("nama"));
    }

    let alamat = form.alamat.trim();
    if alamat.is_empty() {
        return Err(Error::EmptyField("alamat"));
    }

    Ok(Pasien {
        nik,
        nama: nama.to_owned(),
        alamat: alamat.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::State,
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        pasien::{Nik, get_pasien},
    };

    use super::{RegisterPasienForm, RegisterPasienState, register_pasien_endpoint};

    fn get_test_state() -> RegisterPasienState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        RegisterPasienState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn registers_patient() {
        let state = get_test_state();
        let form = RegisterPasienForm {
            nik: "3201234567890001".to_owned(),
            nama: "Budi Santoso".to_owned(),
            alamat: "Jl. Merdeka No. 1".to_owned(),
        };

        let response = register_pasien_endpoint(State(state.clone()), Json(form)).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let connection = state.db_connection.lock().unwrap();
        let pasien = get_pasien(&Nik::new_unchecked("3201234567890001"), &connection).unwrap();
        assert_eq!(pasien.nama, "Budi Santoso");
    }

    #[tokio::test]
    async fn rejects_short_nik() {
        let state = get_test_state();
        let form = RegisterPasienForm {
            nik: "12345".to_owned(),
            nama: "Budi Santoso".to_owned(),
            alamat: "Jl. Merdeka No. 1".to_owned(),
        };

        let response = register_pasien_endpoint(State(state), Json(form)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn rejects_empty_name() {
        let state = get_test_state();
        let form = RegisterPasienForm {
            nik: "3201234567890001".to_owned(),
            nama: "  ".to_owned(),
            alamat: "Jl. Merdeka No. 1".to_owned(),
        };

        let response = register_pasien_endpoint(State(state.clone()), Json(form)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let connection = state.db_connection.lock().unwrap();
        let result = get_pasien(&Nik::new_unchecked("3201234567890001"), &connection);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn duplicate_nik_is_rejected() {
        let state = get_test_state();
        let form = || RegisterPasienForm {
            nik: "3201234567890001".to_owned(),
            nama: "Budi Santoso".to_owned(),
            alamat: "Jl. Merdeka No. 1".to_owned(),
        };
        register_pasien_endpoint(State(state.clone()), Json(form())).await;

        let response = register_pasien_endpoint(State(state), Json(form())).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
