//! Durable, append-only conversation history.
//!
//! One SQLite table of turns, WAL journaling, a single connection behind a
//! mutex. Trimming is a read-time view (`recent`), never a delete.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use tracing::debug;

use crate::error::RelayError;
use crate::types::{ConversationTurn, TurnRole};

/// Append-only log of per-user conversation turns.
///
/// All access goes through one `Mutex<Connection>`, which serializes
/// conflicting writes across concurrently running account sessions.
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

/// Run a store operation on the blocking thread pool.
///
/// SQLite calls are synchronous; account tasks must not stall the runtime
/// on them. A turn pair that is mid-write when its task is cancelled still
/// completes, because the blocking closure keeps running to the end.
pub async fn call_blocking<T, F>(store: Arc<HistoryStore>, f: F) -> Result<T, RelayError>
where
    T: Send + 'static,
    F: FnOnce(&HistoryStore) -> Result<T, RelayError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| RelayError::Transport(format!("store task join error: {e}")))?
}

impl HistoryStore {
    /// Open (or create) the store at `db_path`, creating parent
    /// directories as needed.
    pub fn open(db_path: &Path) -> Result<Self, RelayError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init_schema(&conn)?;

        Ok(HistoryStore {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests and the console mode's `--ephemeral`.
    pub fn open_in_memory() -> Result<Self, RelayError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(HistoryStore {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), RelayError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_turns_user_id
                ON turns(user_id, id);",
        )?;
        Ok(())
    }

    /// Durably record one turn. Returns the assigned monotonic id.
    pub fn append(
        &self,
        user_id: &str,
        role: TurnRole,
        content: &str,
    ) -> Result<i64, RelayError> {
        let conn = self.conn.lock().expect("history store lock poisoned");
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO turns (user_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, role.as_str(), content, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record a completed exchange — the user turn then the model turn —
    /// in one transaction. Either both rows commit or neither does.
    pub fn append_exchange(
        &self,
        user_id: &str,
        user_content: &str,
        model_content: &str,
    ) -> Result<(), RelayError> {
        let mut conn = self.conn.lock().expect("history store lock poisoned");
        let now = chrono::Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO turns (user_id, role, content, created_at)
             VALUES (?1, 'user', ?2, ?3)",
            params![user_id, user_content, now],
        )?;
        tx.execute(
            "INSERT INTO turns (user_id, role, content, created_at)
             VALUES (?1, 'model', ?2, ?3)",
            params![user_id, model_content, now],
        )?;
        tx.commit()?;

        debug!(user_id = %user_id, "persisted turn pair");
        Ok(())
    }

    /// At most `limit` most-recent turns for `user_id`, oldest-first.
    /// Empty vec if the user has no history.
    pub fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>, RelayError> {
        let conn = self.conn.lock().expect("history store lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, user_id, role, content, created_at
             FROM turns
             WHERE user_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;

        let mut turns: Vec<ConversationTurn> = stmt
            .query_map(params![user_id, limit as i64], |row| {
                let role_str: String = row.get(2)?;
                Ok(ConversationTurn {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    role: TurnRole::parse(&role_str).unwrap_or(TurnRole::User),
                    content: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<_, _>>()?;

        // Newest-first from the query; chronological for the caller.
        turns.reverse();
        Ok(turns)
    }

    /// Total number of turns stored for a user (diagnostics).
    pub fn turn_count(&self, user_id: &str) -> Result<u64, RelayError> {
        let conn = self.conn.lock().expect("history store lock poisoned");
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM turns WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> HistoryStore {
        HistoryStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_recent_empty_for_unknown_user() {
        let store = make_store();
        let turns = store.recent("nobody", 10).unwrap();
        assert!(turns.is_empty());
    }

    #[test]
    fn test_append_and_recent_order() {
        let store = make_store();
        store.append("u1", TurnRole::User, "hello").unwrap();
        store.append("u1", TurnRole::Model, "hi there").unwrap();

        let turns = store.recent("u1", 10).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[0].content, "hello");
        assert_eq!(turns[1].role, TurnRole::Model);
        assert!(turns[0].id < turns[1].id);
    }

    #[test]
    fn test_recent_returns_last_n_chronological() {
        let store = make_store();
        for i in 0..12 {
            store
                .append("u1", TurnRole::User, &format!("msg {i}"))
                .unwrap();
        }

        let turns = store.recent("u1", 10).unwrap();
        assert_eq!(turns.len(), 10);
        // The two oldest are trimmed; what remains is oldest-first.
        assert_eq!(turns[0].content, "msg 2");
        assert_eq!(turns[9].content, "msg 11");
    }

    #[test]
    fn test_recent_never_exceeds_limit() {
        let store = make_store();
        for i in 0..30 {
            store
                .append("u1", TurnRole::User, &format!("m{i}"))
                .unwrap();
        }
        assert_eq!(store.recent("u1", 10).unwrap().len(), 10);
        assert_eq!(store.turn_count("u1").unwrap(), 30);
    }

    #[test]
    fn test_users_are_isolated() {
        let store = make_store();
        store.append("a", TurnRole::User, "from a").unwrap();
        store.append("b", TurnRole::User, "from b").unwrap();
        store.append("b", TurnRole::Model, "to b").unwrap();

        assert_eq!(store.recent("a", 10).unwrap().len(), 1);
        assert_eq!(store.recent("b", 10).unwrap().len(), 2);
    }

    #[test]
    fn test_append_exchange_writes_pair() {
        let store = make_store();
        store.append_exchange("u1", "What's 2+2?", "4").unwrap();

        let turns = store.recent("u1", 10).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[0].content, "What's 2+2?");
        assert_eq!(turns[1].role, TurnRole::Model);
        assert_eq!(turns[1].content, "4");
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = HistoryStore::open(&path).unwrap();
            store.append_exchange("u1", "hi", "hello").unwrap();
        }

        let store = HistoryStore::open(&path).unwrap();
        let turns = store.recent("u1", 10).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "hello");
    }

    #[test]
    fn test_ids_are_monotonic_across_users() {
        let store = make_store();
        let a = store.append("a", TurnRole::User, "1").unwrap();
        let b = store.append("b", TurnRole::User, "2").unwrap();
        let c = store.append("a", TurnRole::Model, "3").unwrap();
        assert!(a < b && b < c);
    }

    #[tokio::test]
    async fn test_call_blocking_round_trip() {
        let store = Arc::new(make_store());
        call_blocking(store.clone(), |s| {
            s.append_exchange("u1", "q", "a")
        })
        .await
        .unwrap();

        let turns = call_blocking(store, |s| s.recent("u1", 10)).await.unwrap();
        assert_eq!(turns.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_corrupt() {
        let store = Arc::new(make_store());

        let mut handles = Vec::new();
        for w in 0..4 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..10 {
                    let user = format!("user-{w}");
                    let store = store.clone();
                    call_blocking(store, move |s| {
                        s.append_exchange(&user, &format!("q{i}"), &format!("a{i}"))
                    })
                    .await
                    .unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        for w in 0..4 {
            let user = format!("user-{w}");
            assert_eq!(store.turn_count(&user).unwrap(), 20);
            let turns = store.recent(&user, 10).unwrap();
            assert_eq!(turns.len(), 10);
            // Chronological order preserved per user.
            for pair in turns.windows(2) {
                assert!(pair[0].id < pair[1].id);
            }
        }
    }
}
