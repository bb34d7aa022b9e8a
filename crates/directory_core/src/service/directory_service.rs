//! Directory use-case service.
//!
//! # Responsibility
//! - Provide caller-facing entry points over a [`ClientRepository`].
//! - Turn zero affected-row counts into explicit outcomes where callers need
//!   confirmation.
//! - Emit metadata-only log events for every mutation.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Log lines never contain names, emails or phone numbers.

use crate::model::client::{Client, ClientData, ClientFilter, ClientId, ClientMatch};
use crate::model::phone::{PhoneRecord, Phones};
use crate::repo::client_repo::{ClientRepository, RepoError, RepoResult};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for directory use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Target client does not exist.
    ClientNotFound(ClientId),
    /// Persistence-layer failure, including constraint violations.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientNotFound(client_id) => write!(f, "client not found: {client_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::ClientNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for directory operations.
pub struct DirectoryService<R: ClientRepository> {
    repo: R,
}

impl<R: ClientRepository> DirectoryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a client with zero, one or many phones.
    ///
    /// # Contract
    /// - Returns the engine-assigned client id.
    /// - A duplicate email or phone rejects the whole call; nothing is stored.
    pub fn add_client(
        &mut self,
        client: &ClientData,
        phones: impl Into<Phones>,
    ) -> ServiceResult<ClientId> {
        let phones = phones.into();
        let started_at = Instant::now();
        let result = self.repo.add_client(client, &phones);
        if let Ok(client_id) = &result {
            info!(
                "event=client_add module=directory status=ok client_id={client_id} phones={}",
                phones.len()
            );
        }
        log_failure("client_add", started_at, result)
    }

    /// Attaches phones to an existing client and returns how many were stored.
    ///
    /// A missing client surfaces as a foreign-key constraint violation.
    pub fn add_phone(
        &mut self,
        client_id: ClientId,
        phones: impl Into<Phones>,
    ) -> ServiceResult<usize> {
        let phones = phones.into();
        let started_at = Instant::now();
        let result = self.repo.add_phone(client_id, &phones);
        if let Ok(inserted) = &result {
            info!("event=phone_add module=directory status=ok client_id={client_id} inserted={inserted}");
        }
        log_failure("phone_add", started_at, result)
    }

    /// Overwrites every field of an existing client.
    ///
    /// # Errors
    /// - [`ServiceError::ClientNotFound`] when no row matched `client_id`.
    pub fn update_client(&self, client_id: ClientId, client: &ClientData) -> ServiceResult<()> {
        let started_at = Instant::now();
        let changed = log_failure(
            "client_update",
            started_at,
            self.repo.change_client(client_id, client),
        )?;
        if changed == 0 {
            info!("event=client_update module=directory status=not_found client_id={client_id}");
            return Err(ServiceError::ClientNotFound(client_id));
        }

        info!("event=client_update module=directory status=ok client_id={client_id}");
        Ok(())
    }

    /// Removes one phone from a client. Returns `false` when nothing matched.
    pub fn remove_phone(&self, client_id: ClientId, phone: &str) -> ServiceResult<bool> {
        let started_at = Instant::now();
        let changed = log_failure(
            "phone_delete",
            started_at,
            self.repo.delete_phone(client_id, phone),
        )?;
        info!("event=phone_delete module=directory status=ok client_id={client_id} deleted={changed}");
        Ok(changed > 0)
    }

    /// Removes a client and all of its phones. Returns `false` when nothing matched.
    pub fn remove_client(&self, client_id: ClientId) -> ServiceResult<bool> {
        let started_at = Instant::now();
        let changed = log_failure(
            "client_delete",
            started_at,
            self.repo.delete_client(client_id),
        )?;
        info!("event=client_delete module=directory status=ok client_id={client_id} deleted={changed}");
        Ok(changed > 0)
    }

    /// Searches clients; see [`ClientRepository::find_clients`] for join semantics.
    pub fn find_clients(&self, filter: &ClientFilter) -> ServiceResult<Vec<ClientMatch>> {
        Ok(self.repo.find_clients(filter)?)
    }

    pub fn get_client(&self, client_id: ClientId) -> ServiceResult<Option<Client>> {
        Ok(self.repo.get_client(client_id)?)
    }

    pub fn list_phones(&self, client_id: ClientId) -> ServiceResult<Vec<PhoneRecord>> {
        Ok(self.repo.list_phones(client_id)?)
    }
}

fn log_failure<T>(event: &str, started_at: Instant, result: RepoResult<T>) -> ServiceResult<T> {
    result.map_err(|err| {
        let error_code = match err.constraint_kind() {
            Some(_) => "constraint_violation",
            None => "repo_failed",
        };
        error!(
            "event={event} module=directory status=error duration_ms={} error_code={error_code}",
            started_at.elapsed().as_millis()
        );
        ServiceError::from(err)
    })
}
