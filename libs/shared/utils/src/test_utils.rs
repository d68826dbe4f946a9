use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::user::{ClinicUser, UserRole};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub store_timeout_seconds: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            store_timeout_seconds: 2,
        }
    }
}

impl TestConfig {
    /// Config pointing at a wiremock server (or any other base URL).
    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            store_timeout_seconds: self.store_timeout_seconds,
            ..AppConfig::default()
        }
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub role: UserRole,
}

impl TestUser {
    pub fn new(role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
        }
    }

    pub fn doctor() -> Self {
        Self::new(UserRole::Doctor)
    }

    pub fn patient() -> Self {
        Self::new(UserRole::Patient)
    }

    pub fn admin() -> Self {
        Self::new(UserRole::Admin)
    }

    pub fn to_user(&self) -> ClinicUser {
        ClinicUser::new(self.id, self.role)
    }
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("test date must be YYYY-MM-DD")
}

pub fn time(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").expect("test time must be HH:MM")
}

/// PostgREST-shaped rows for wiremock responses.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_response(user: &TestUser) -> Value {
        json!({
            "id": user.id,
            "role": user.role.to_string()
        })
    }

    pub fn schedule_response(doctor_id: Uuid, day_of_week: &str, start: &str, end: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "day_of_week": day_of_week,
            "start_time": format!("{}:00", start),
            "end_time": format!("{}:00", end)
        })
    }

    pub fn slot_response(slot_id: Uuid, doctor_id: Uuid, slot_date: &str, start: &str, end: &str, is_booked: bool) -> Value {
        json!({
            "id": slot_id,
            "doctor_id": doctor_id,
            "slot_date": slot_date,
            "start_time": format!("{}:00", start),
            "end_time": format!("{}:00", end),
            "is_booked": is_booked
        })
    }

    pub fn appointment_response(
        appointment_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
        slot_id: Uuid,
        status: &str,
    ) -> Value {
        json!({
            "id": appointment_id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "slot_id": slot_id,
            "appointment_date": "2030-01-07",
            "start_time": "09:00:00",
            "end_time": "09:30:00",
            "status": status,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        })
    }

    pub fn error_response(code: &str, message: &str) -> Value {
        json!({
            "code": code,
            "message": message,
            "details": null,
            "hint": null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_config_creation() {
        let app_config = TestConfig::with_url("http://127.0.0.1:9999").to_app_config();

        assert_eq!(app_config.supabase_url, "http://127.0.0.1:9999");
        assert!(app_config.is_configured());
        assert_eq!(app_config.store_timeout_seconds, 2);
    }

    #[test]
    fn test_user_creation() {
        let doctor = TestUser::doctor();
        let user = doctor.to_user();

        assert_eq!(user.id, doctor.id);
        assert!(user.is_doctor());
        assert_matches!(TestUser::patient().to_user().role, UserRole::Patient);
    }

    #[test]
    fn test_slot_response_shape() {
        let row = MockSupabaseResponses::slot_response(Uuid::nil(), Uuid::nil(), "2030-01-07", "09:00", "09:30", false);

        assert_eq!(row["start_time"], "09:00:00");
        assert_eq!(row["is_booked"], false);
    }
}
