//! Record stores for posts.
//!
//! [`PostStore`] is the whole persistence contract the API relies on. Every
//! call is one scoped session: it acquires the store, does its work, commits
//! explicitly, and releases on every exit path when the session guard drops.
//!
//! Two implementations ship:
//!
//! | Store | Backing | Use |
//! |---|---|---|
//! | [`SqliteStore`] | SQLite file or `:memory:` via rusqlite | default |
//! | [`MemoryStore`] | ordered map behind a mutex | tests, throwaway runs |

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, Transaction, params, params_from_iter};
use thiserror::Error;

use crate::filter::PostFilter;
use crate::post::{NewPost, Post};

/// Failures originating in the store. Never shown to clients.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Persistence for posts. Ids are assigned by the store and never reused.
pub trait PostStore: Send + Sync {
    fn insert(&self, new: &NewPost) -> Result<Post, StoreError>;

    fn get(&self, id: i64) -> Result<Option<Post>, StoreError>;

    /// Removes the post with `id` and returns it as it was. `None` if no such
    /// post exists. Lookup and removal happen in one session, so of two
    /// concurrent deletes of the same id only one gets `Some`.
    fn delete(&self, id: i64) -> Result<Option<Post>, StoreError>;

    /// Posts matching `filter`, ordered by ascending id.
    fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError>;
}

// ── SQLite ────────────────────────────────────────────────────────────────────

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    body  TEXT NOT NULL
);
"#;

/// SQLite-backed store.
///
/// One connection guarded by a mutex; each operation runs inside its own
/// transaction. `AUTOINCREMENT` keeps deleted ids from being handed out again.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::initialize(Connection::open(path)?)
    }

    /// Private in-memory database, gone when the store drops.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Runs `f` in a transaction and commits it. On error the transaction is
    /// dropped uncommitted, which rolls it back; the lock is released either way.
    fn session<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post { id: row.get(0)?, title: row.get(1)?, body: row.get(2)? })
    }
}

/// `SELECT ... WHERE instr(col, ?1) > 0 AND ... ORDER BY id`.
///
/// `instr` is case-sensitive and treats `%` and `_` literally, so the SQL
/// agrees with [`PostFilter::matches`].
fn list_sql(filter: &PostFilter) -> String {
    let mut sql = String::from("SELECT id, title, body FROM posts");
    for (i, clause) in filter.clauses().iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&format!("instr({}, ?{}) > 0", clause.field.column(), i + 1));
    }
    sql.push_str(" ORDER BY id ASC");
    sql
}

impl PostStore for SqliteStore {
    fn insert(&self, new: &NewPost) -> Result<Post, StoreError> {
        self.session(|tx| {
            tx.execute(
                "INSERT INTO posts (title, body) VALUES (?1, ?2)",
                params![new.title, new.body],
            )?;
            Ok(Post {
                id: tx.last_insert_rowid(),
                title: new.title.clone(),
                body: new.body.clone(),
            })
        })
    }

    fn get(&self, id: i64) -> Result<Option<Post>, StoreError> {
        self.session(|tx| {
            tx.query_row(
                "SELECT id, title, body FROM posts WHERE id = ?1",
                [id],
                Self::row_to_post,
            )
            .optional()
        })
    }

    fn delete(&self, id: i64) -> Result<Option<Post>, StoreError> {
        self.session(|tx| {
            let post = tx
                .query_row(
                    "SELECT id, title, body FROM posts WHERE id = ?1",
                    [id],
                    Self::row_to_post,
                )
                .optional()?;
            if post.is_some() {
                tx.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            }
            Ok(post)
        })
    }

    fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        let sql = list_sql(filter);
        self.session(|tx| {
            let mut stmt = tx.prepare(&sql)?;
            let needles = filter.clauses().iter().map(|c| c.needle.as_str());
            let posts = stmt
                .query_map(params_from_iter(needles), Self::row_to_post)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(posts)
        })
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    posts: BTreeMap<i64, Post>,
    last_id: i64,
}

/// In-process store. Evaluates filters with [`PostFilter::apply`].
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn session<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> Result<T, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut state))
    }
}

impl PostStore for MemoryStore {
    fn insert(&self, new: &NewPost) -> Result<Post, StoreError> {
        self.session(|state| {
            state.last_id += 1;
            let post = Post { id: state.last_id, title: new.title.clone(), body: new.body.clone() };
            state.posts.insert(post.id, post.clone());
            post
        })
    }

    fn get(&self, id: i64) -> Result<Option<Post>, StoreError> {
        self.session(|state| state.posts.get(&id).cloned())
    }

    fn delete(&self, id: i64) -> Result<Option<Post>, StoreError> {
        self.session(|state| state.posts.remove(&id))
    }

    fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        self.session(|state| filter.apply(state.posts.values().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::filter::Field;

    fn seed(store: &dyn PostStore) -> Vec<Post> {
        [
            ("Post with bells", "Just a test"),
            ("Post with whistles", "Still a test"),
            ("Post with bells and whistles", "Another test"),
        ]
        .into_iter()
        .map(|(t, b)| store.insert(&NewPost::new(t, b)).unwrap())
        .collect()
    }

    fn stores() -> Vec<Box<dyn PostStore>> {
        vec![Box::new(SqliteStore::in_memory().unwrap()), Box::new(MemoryStore::new())]
    }

    #[test]
    fn ids_are_assigned_in_insert_order() {
        for store in stores() {
            let posts = seed(store.as_ref());
            let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
            assert_eq!(ids, [1, 2, 3]);
        }
    }

    #[test]
    fn get_returns_inserted_fields() {
        for store in stores() {
            let posts = seed(store.as_ref());
            assert_eq!(store.get(posts[1].id).unwrap().as_ref(), Some(&posts[1]));
            assert_eq!(store.get(999).unwrap(), None);
        }
    }

    #[test]
    fn delete_removes_and_ids_are_not_reused() {
        for store in stores() {
            let posts = seed(store.as_ref());
            assert_eq!(store.delete(posts[2].id).unwrap().as_ref(), Some(&posts[2]));
            assert_eq!(store.get(posts[2].id).unwrap(), None);
            assert_eq!(store.delete(posts[2].id).unwrap(), None);

            let next = store.insert(&NewPost::new("Fresh", "Body")).unwrap();
            assert_eq!(next.id, 4);
        }
    }

    #[test]
    fn list_filters_agree_across_stores() {
        let cases = [
            PostFilter::default(),
            PostFilter::default().contains(Field::Title, "whistles"),
            PostFilter::default().contains(Field::Title, "bells").contains(Field::Body, "Just"),
            PostFilter::default().contains(Field::Body, "TEST"),
            PostFilter::default().contains(Field::Title, "%"),
        ];
        let expected: [&[i64]; 5] = [&[1, 2, 3], &[2, 3], &[1], &[], &[]];

        for store in stores() {
            seed(store.as_ref());
            for (filter, want) in cases.iter().zip(expected) {
                let ids: Vec<i64> = store.list(filter).unwrap().iter().map(|p| p.id).collect();
                assert_eq!(ids, want, "filter {filter:?}");
            }
        }
    }

    #[test]
    fn concurrent_deletes_hand_out_the_post_once() {
        for store in stores() {
            let store: Arc<dyn PostStore> = store.into();
            let id = seed(store.as_ref())[0].id;

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = Arc::clone(&store);
                    std::thread::spawn(move || store.delete(id).unwrap())
                })
                .collect();
            let removed = handles.into_iter().filter_map(|h| h.join().unwrap()).count();
            assert_eq!(removed, 1);
        }
    }

    #[test]
    fn list_sql_numbers_placeholders() {
        let filter = PostFilter::default().contains(Field::Title, "a").contains(Field::Body, "b");
        assert_eq!(
            list_sql(&filter),
            "SELECT id, title, body FROM posts WHERE instr(title, ?1) > 0 AND instr(body, ?2) > 0 ORDER BY id ASC"
        );
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.db");

        let id = SqliteStore::open(&path).unwrap().insert(&NewPost::new("Kept", "On disk")).unwrap().id;

        let reopened = SqliteStore::open(&path).unwrap();
        let post = reopened.get(id).unwrap().unwrap();
        assert_eq!(post.title, "Kept");
    }
}
