use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct NewConsultationDto {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,

    pub property_id: Option<String>,
    pub project_id: Option<String>,
}
