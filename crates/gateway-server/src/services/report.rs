//! Reports rendered by CDOGS from docx templates.

use std::path::PathBuf;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use gateway_core::health::{
    CdogsOptions, CdogsRequest, CdogsTemplateModel, ReportModel, ReportRequest, ReportTemplate,
};
use gateway_core::{ErrorType, RequestResult, ServiceType};

use crate::delegates::CdogsDelegate;

#[derive(Clone)]
pub struct ReportService {
    cdogs: Arc<dyn CdogsDelegate>,
    template_dir: PathBuf,
}

impl ReportService {
    /// Templates are read from `template_dir` as `<Template>Report.docx`.
    pub fn new(cdogs: Arc<dyn CdogsDelegate>, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            cdogs,
            template_dir: template_dir.into(),
        }
    }

    pub async fn get_report(&self, request: &ReportRequest) -> RequestResult<ReportModel> {
        let template = match self.load_template(request.template).await {
            Ok(template) => template,
            Err(e) => {
                tracing::error!(template = request.template.name(), error = %e, "Unable to read report template");
                return RequestResult::error(
                    ErrorType::InvalidState,
                    format!("Report template {} is not available", request.template.name()),
                );
            }
        };

        let extension = request.format.extension();
        let cdogs_request = CdogsRequest {
            data: request.data.clone(),
            options: CdogsOptions {
                convert_to: extension.to_string(),
                report_name: request.template.name().to_string(),
                overwrite: true,
            },
            template: CdogsTemplateModel::new(BASE64.encode(template)),
        };

        match self.cdogs.render(&cdogs_request).await {
            Ok(document) => {
                tracing::debug!(
                    template = request.template.name(),
                    format = extension,
                    bytes = document.len(),
                    "Report rendered"
                );
                RequestResult::success(ReportModel {
                    file_name: format!("{}.{}", request.template.name(), extension),
                    data: BASE64.encode(document),
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "CDOGS failed to render report");
                RequestResult::service_error(
                    ErrorType::CommunicationExternal,
                    ServiceType::Cdogs,
                    "Error while generating report",
                )
            }
        }
    }

    async fn load_template(&self, template: ReportTemplate) -> std::io::Result<Vec<u8>> {
        let path = self
            .template_dir
            .join(format!("{}Report.docx", template.name()));
        tokio::fs::read(path).await
    }
}
