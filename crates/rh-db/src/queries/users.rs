//! User CRUD operations.

use rusqlite::{Connection, OptionalExtension};
use rh_core::{Error, Result, UserId};

use super::now_timestamp;
use crate::models::User;

const COLS: &str = "id, username, password_hash, role, created_at";

/// Create a new user and return it.
pub fn create_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: &str,
) -> Result<User> {
    let id = UserId::new();
    let created_at = now_timestamp();

    conn.execute(
        "INSERT INTO users (id, username, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id.to_string(), username, password_hash, role, created_at],
    )
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            Error::Conflict(format!("Username '{username}' already exists"))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(User {
        id,
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        role: role.to_string(),
        created_at,
    })
}

/// Get a user by primary key.
pub fn get_user_by_id(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE id = ?1");
    conn.query_row(&q, [id.to_string()], User::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Get a user by username.
pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE username = ?1");
    conn.query_row(&q, [username], User::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Create the user if missing, otherwise bring its hash and role in line.
///
/// Used at startup to seed the configured admin account.
pub fn ensure_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: &str,
) -> Result<User> {
    match get_user_by_username(conn, username)? {
        Some(mut user) => {
            if user.password_hash != password_hash || user.role != role {
                conn.execute(
                    "UPDATE users SET password_hash = ?1, role = ?2 WHERE id = ?3",
                    rusqlite::params![password_hash, role, user.id.to_string()],
                )
                .map_err(|e| Error::database(e.to_string()))?;
                user.password_hash = password_hash.to_string();
                user.role = role.to_string();
            }
            Ok(user)
        }
        None => create_user(conn, username, password_hash, role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn create_and_lookup() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let user = create_user(&conn, "alice", "hash", "admin").unwrap();
        assert!(user.is_admin());

        let by_id = get_user_by_id(&conn, user.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_name = get_user_by_username(&conn, "alice").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        assert!(get_user_by_username(&conn, "bob").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_conflicts() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        create_user(&conn, "dup", "hash", "user").unwrap();
        let err = create_user(&conn, "dup", "hash", "user").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn ensure_user_is_idempotent_and_updates() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let first = ensure_user(&conn, "admin", "h1", "admin").unwrap();
        let second = ensure_user(&conn, "admin", "h1", "admin").unwrap();
        assert_eq!(first.id, second.id);

        let third = ensure_user(&conn, "admin", "h2", "admin").unwrap();
        assert_eq!(third.id, first.id);
        assert_eq!(
            get_user_by_id(&conn, first.id).unwrap().unwrap().password_hash,
            "h2"
        );
    }
}
