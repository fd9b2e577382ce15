use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// a trip member; feeds the payer picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub profile_id: i64,
    pub display_name: String,
    pub created_at: NaiveDateTime,
}
