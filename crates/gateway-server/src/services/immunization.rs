//! Immunization records.

use std::sync::Arc;

use gateway_core::health::{ImmunizationEvent, ImmunizationResult};
use gateway_core::{Hdid, RequestResult};

use crate::delegates::ImmunizationDelegate;

#[derive(Clone)]
pub struct ImmunizationService {
    delegate: Arc<dyn ImmunizationDelegate>,
}

impl ImmunizationService {
    pub fn new(delegate: Arc<dyn ImmunizationDelegate>) -> Self {
        Self { delegate }
    }

    /// Immunizations of `hdid` with the PHSA load state.
    ///
    /// Status, paging and error are copied from the delegate result. The
    /// payload is only built on success.
    pub async fn get_immunizations(
        &self,
        hdid: &Hdid,
        page_index: i64,
    ) -> RequestResult<ImmunizationResult> {
        let result = self.delegate.get_immunizations(hdid, page_index).await;
        if !result.is_success() {
            return result.without_payload();
        }

        result.map(|phsa| ImmunizationResult {
            load_state: phsa.load_state,
            immunizations: phsa
                .result
                .unwrap_or_default()
                .into_iter()
                .map(ImmunizationEvent::from)
                .collect(),
        })
    }
}
