//! Patient data held by PHSA: organ donor registration and diagnostic imaging.

use std::sync::Arc;

use gateway_core::Hdid;
use gateway_core::health::{PatientDataResponse, PatientDataType, PatientFile};
use uuid::Uuid;

use crate::delegates::{PatientRepository, UpstreamError};

#[derive(Clone)]
pub struct PatientDataService {
    repository: Arc<dyn PatientRepository>,
}

impl PatientDataService {
    pub fn new(repository: Arc<dyn PatientRepository>) -> Self {
        Self { repository }
    }

    /// Patient data of the requested `types`. A patient without a PHSA
    /// account has no data.
    pub async fn query(
        &self,
        hdid: &Hdid,
        types: &[PatientDataType],
    ) -> Result<PatientDataResponse, UpstreamError> {
        let Some(pid) = self.pid(hdid).await? else {
            return Ok(PatientDataResponse::default());
        };

        let items = self.repository.query(pid, types).await?;
        tracing::debug!(count = items.len(), "Patient data retrieved");
        Ok(PatientDataResponse { items })
    }

    /// A patient document, `None` when the account or file does not exist.
    pub async fn query_file(
        &self,
        hdid: &Hdid,
        file_id: &str,
    ) -> Result<Option<PatientFile>, UpstreamError> {
        let Some(pid) = self.pid(hdid).await? else {
            return Ok(None);
        };
        self.repository.get_file(pid, file_id).await
    }

    async fn pid(&self, hdid: &Hdid) -> Result<Option<Uuid>, UpstreamError> {
        let pid = self.repository.get_pid(hdid).await?;
        if pid.is_none() {
            tracing::info!("No PHSA personal account for patient");
        }
        Ok(pid)
    }
}
