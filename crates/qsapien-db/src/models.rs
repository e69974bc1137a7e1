/// Database row types. These map directly to SQLite rows.
/// Distinct from qsapien-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email_id: String,
    pub username: String,
    pub password: String,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub contact_no: Option<String>,
    pub profile_image_url: Option<String>,
    pub credit_points: i64,
}

/// Fields supplied at signup. `password` is already hashed.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email_id: String,
    pub username: String,
    pub password: String,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub contact_no: Option<String>,
}

pub struct SessionRow {
    pub id: String,
    pub token: Option<String>,
}
