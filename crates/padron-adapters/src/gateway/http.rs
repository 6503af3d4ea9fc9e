use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use padron_ports::error::GatewayError;
use padron_ports::outbound::VerificationGateway;
use padron_ports::types::{CodeCheck, CodeDispatch, CredentialIssue, CredentialReceipt};

/// Response envelope shared by the three collaborator endpoints.
#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    detail: Option<String>,
    reference_id: Option<String>,
}

/// `VerificationGateway` against the backend's HTTP endpoints. The wire
/// format is owned by the other side; this adapter only knows the shared
/// envelope and maps everything else onto `GatewayError`.
pub struct HttpVerificationGateway {
    client: Client,
    base_url: String,
}

impl HttpVerificationGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Envelope, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // rejections come back as the same envelope with a reason
            let reason = match response.json::<Envelope>().await {
                Ok(envelope) => envelope
                    .detail
                    .unwrap_or_else(|| format!("status {status}")),
                Err(_) => format!("status {status}"),
            };
            tracing::warn!(url = %url, status = %status, reason = %reason, "collaborator rejected the call");
            return Err(GatewayError::Rejected { reason });
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        if !envelope.ok {
            return Err(GatewayError::Rejected {
                reason: envelope.detail.unwrap_or_else(|| "rejected".into()),
            });
        }
        Ok(envelope)
    }
}

#[async_trait]
impl VerificationGateway for HttpVerificationGateway {
    async fn send_code(&self, dispatch: &CodeDispatch) -> Result<(), GatewayError> {
        self.post("/verification/send-code", dispatch).await?;
        Ok(())
    }

    async fn confirm_code(&self, check: &CodeCheck) -> Result<(), GatewayError> {
        self.post("/verification/confirm-code", check).await?;
        Ok(())
    }

    async fn issue_credentials(
        &self,
        issue: &CredentialIssue,
    ) -> Result<CredentialReceipt, GatewayError> {
        let envelope = self.post("/credentials/issue", issue).await?;
        Ok(CredentialReceipt {
            reference_id: envelope.reference_id,
        })
    }
}
