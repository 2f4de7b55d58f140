use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by the bearer token issued by the hosted auth service.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}
