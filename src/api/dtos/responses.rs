use serde::Serialize;

/// The api_secret is returned exactly once, at creation time; the Business
/// model itself never serializes it.
#[derive(Serialize)]
pub struct BusinessCreatedResponse {
    pub business_id: String,
    pub slug: String,
    pub api_secret: String,
}

#[derive(Serialize)]
pub struct CheckAvailabilityResponse {
    pub available: bool,
    pub timeslot: String,
    pub alternates: Vec<String>,
}

#[derive(Serialize)]
pub struct BroadcastResponse {
    pub offers_created: usize,
}
