use serde_json::{json, Value};

/// Canned Regulon responses for consistent test data
pub struct TestFixtures;

impl TestFixtures {
    pub fn screening_submitted() -> Value {
        json!({
            "individual_screenings": [{
                "id": "40bdc96e-3a2a-451c-91db-bd85278e33cd",
                "full_name": "John Doe",
                "status": "pending"
            }]
        })
    }

    pub fn screening_status() -> Value {
        json!({
            "id": "40bdc96e-3a2a-451c-91db-bd85278e33cd",
            "status": "completed",
            "peps_status": "no_match",
            "sanctions_status": "no_match",
            "adverse_medias_status": "potential_match"
        })
    }

    pub fn company_search() -> Value {
        json!({
            "companies": [
                { "name": "PEPSICO INTERNATIONAL LIMITED", "registration_number": "00436945", "country": "uk" },
                { "name": "PEPSI-COLA UK LIMITED", "registration_number": "02470773", "country": "uk" }
            ],
            "page_number": 1,
            "per_page": 10,
            "total": 2
        })
    }

    pub fn monitoring_updated() -> Value {
        json!({ "id": "517b2242-2f48-4a06-ab36-5694a4066cee", "monitoring": true })
    }

    pub fn unauthorized() -> Value {
        json!({ "error": "Unauthorized", "message": "Invalid or missing API token" })
    }
}
