// Identifiers handed out by the stores are UUIDv7 strings. They sort by
// creation time, which keeps `users` and `movies` listings stable without a
// separate sequence column.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a new user identifier as an opaque string.
pub fn new_user_id() -> String {
    uuidv7().simple().to_string()
}
