//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const SPOTS: &str = "climbing_spot";
    pub const USERS: &str = "users";
    /// Unique-email index: one document per lower-cased email
    pub const USER_EMAILS: &str = "user_emails";
    pub const USER_GEAR: &str = "User_Materiel";
    pub const GEAR_SPECS: &str = "Materiel_Specs";
}
