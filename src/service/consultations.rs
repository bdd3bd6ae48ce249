use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::NewConsultationDto;
use crate::error::StoreError;
use crate::gateway::ListingGateway;
use crate::models::Consultation;

/// Submits consultation requests from property and project detail pages.
pub struct ConsultationService {
    gateway: Arc<dyn ListingGateway>,
}

impl ConsultationService {
    pub fn new(gateway: Arc<dyn ListingGateway>) -> Self {
        ConsultationService { gateway }
    }

    /// Validates the request, persists it with a generated id and a
    /// "pending" status, and returns the stored record. Validation
    /// failures never reach the gateway.
    pub async fn submit(&self, dto: NewConsultationDto) -> Result<Consultation, StoreError> {
        dto.validate()
            .map_err(|e| StoreError::Validation(e.to_string()))?;

        let now = Utc::now();
        let consultation = Consultation {
            id: Uuid::new_v4().to_string(),
            full_name: dto.full_name,
            phone: dto.phone,
            email: dto.email,
            message: dto.message,
            property_id: dto.property_id,
            project_id: dto.project_id,
            status: "pending".to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let row = json!({
            "id": consultation.id,
            "full_name": consultation.full_name,
            "phone": consultation.phone,
            "email": consultation.email,
            "message": consultation.message,
            "property_id": consultation.property_id.clone().unwrap_or_default(),
            "project_id": consultation.project_id.clone().unwrap_or_default(),
            "status": consultation.status,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        self.gateway.submit_consultation(row).await?;
        info!("Consultation {} submitted", consultation.id);
        Ok(consultation)
    }
}
