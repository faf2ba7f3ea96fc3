//! Sessions and the connection/session manager
//!
//! A [`Session`] owns one connection and at most one explicit transaction.
//! It is single-threaded (`!Send`, built on `Rc`) and strictly sequential:
//! a call made while another one holds the connection fails with
//! `SessionBusy` instead of waiting.

mod manager;

pub use manager::SessionManager;

use rowmap_core::errors::PersistenceError;
use rowmap_core::{log_op_end, log_op_error, log_op_start, Registry};
use rowmap_core_types::SessionId;
use rusqlite::{Connection, Transaction};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Instant;

use crate::config::StoreConfig;
use crate::entity::Entity;
use crate::errors::{from_rusqlite, Result};
use crate::repo::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No explicit transaction; each write commits on its own
    Idle,
    InTransaction,
    Closed,
}

pub(crate) struct SessionCore {
    id: SessionId,
    conn: RefCell<Option<Connection>>,
    state: Cell<SessionState>,
    registry: Arc<Registry>,
    config: Arc<StoreConfig>,
    eager_depth: Cell<usize>,
}

impl SessionCore {
    fn shutdown(&self) -> Result<()> {
        if self.state.get() == SessionState::Closed {
            return Err(PersistenceError::SessionClosed);
        }
        let mut guard = self
            .conn
            .try_borrow_mut()
            .map_err(|_| PersistenceError::SessionBusy)?;
        let rollback = match (self.state.get(), guard.as_ref()) {
            (SessionState::InTransaction, Some(conn)) => {
                conn.execute_batch("ROLLBACK").map_err(from_rusqlite)
            }
            _ => Ok(()),
        };
        self.state.set(SessionState::Closed);
        let closed = match guard.take() {
            Some(conn) => conn.close().map_err(|(_, err)| from_rusqlite(err)),
            None => Ok(()),
        };
        rollback.and(closed)
    }
}

impl Drop for SessionCore {
    fn drop(&mut self) {
        if self.state.get() != SessionState::Closed {
            if let Err(err) = self.shutdown() {
                tracing::warn!(
                    session_id = self.id.as_str(),
                    error = %err,
                    "session close on drop failed"
                );
            }
        }
    }
}

/// One connection plus its transaction state
///
/// Dropping a session closes it, rolling back an open transaction.
pub struct Session {
    core: Rc<SessionCore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.core.id)
            .field("state", &self.core.state.get())
            .finish()
    }
}

impl Session {
    pub(crate) fn new(conn: Connection, registry: Arc<Registry>, config: Arc<StoreConfig>) -> Self {
        Self {
            core: Rc::new(SessionCore {
                id: SessionId::new(),
                conn: RefCell::new(Some(conn)),
                state: Cell::new(SessionState::Idle),
                registry,
                config,
                eager_depth: Cell::new(0),
            }),
        }
    }

    /// Re-enter a session from a weak handle held by a cursor
    pub(crate) fn upgrade(handle: &Weak<SessionCore>) -> Option<Self> {
        handle
            .upgrade()
            .filter(|core| core.state.get() != SessionState::Closed)
            .map(|core| Self { core })
    }

    pub(crate) fn downgrade(&self) -> Weak<SessionCore> {
        Rc::downgrade(&self.core)
    }

    pub fn id(&self) -> &SessionId {
        &self.core.id
    }

    pub fn state(&self) -> SessionState {
        self.core.state.get()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.core.registry
    }

    pub fn config(&self) -> &StoreConfig {
        &self.core.config
    }

    /// Repository for `E`, using this session's save policy and page size
    ///
    /// # Errors
    ///
    /// `UnregisteredEntity` when `E` is not in the registry.
    pub fn repository<E: Entity>(&self) -> Result<Repository<E>> {
        Ok(Repository::new(&self.core.registry, self.core.config.save_policy)?
            .with_page_size(self.core.config.page_size))
    }

    /// Start an explicit transaction
    ///
    /// # Errors
    ///
    /// `TransactionActive` when one is already open, `SessionClosed`.
    pub fn begin(&self) -> Result<()> {
        self.transition("begin", SessionState::Idle, SessionState::InTransaction, |conn| {
            conn.execute_batch(self.core.config.transaction_behavior.begin_sql())
        })
    }

    /// # Errors
    ///
    /// `NoTransaction` when idle, `SessionClosed`, or the commit failure.
    pub fn commit(&self) -> Result<()> {
        self.transition("commit", SessionState::InTransaction, SessionState::Idle, |conn| {
            conn.execute_batch("COMMIT")
        })
    }

    /// # Errors
    ///
    /// `NoTransaction` when idle, `SessionClosed`.
    pub fn rollback(&self) -> Result<()> {
        self.transition("rollback", SessionState::InTransaction, SessionState::Idle, |conn| {
            conn.execute_batch("ROLLBACK")
        })
    }

    /// Close the session, rolling back an open transaction first
    ///
    /// Cursors created from this session report `StaleCursor` afterwards.
    ///
    /// # Errors
    ///
    /// `SessionClosed` when already closed, `SessionBusy`.
    pub fn close(&self) -> Result<()> {
        let start = Instant::now();
        log_op_start!("close", session_id = self.id().as_str());
        let result = self.core.shutdown();
        self.log_result("close", start, &result);
        result
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`
    ///
    /// # Errors
    ///
    /// Errors of `begin`/`commit`, or the error returned by `f`.
    pub fn transaction<R, E>(&self, f: impl FnOnce(&Session) -> std::result::Result<R, E>) -> std::result::Result<R, E>
    where
        E: From<PersistenceError>,
    {
        self.begin()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback() {
                    tracing::warn!(
                        session_id = self.id().as_str(),
                        error = %rollback_err,
                        "rollback after failed transaction body failed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Run a raw SQL script
    ///
    /// # Errors
    ///
    /// `SessionClosed`, `SessionBusy`, or the store failure.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.with_conn(|conn| conn.execute_batch(sql).map_err(from_rusqlite))
    }

    /// Direct access to the underlying connection
    ///
    /// Session operations issued from inside `f` fail with `SessionBusy`.
    ///
    /// # Errors
    ///
    /// `SessionClosed`, `SessionBusy`.
    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> R) -> Result<R> {
        self.with_conn(|conn| Ok(f(conn)))
    }

    pub(crate) fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        if self.is_closed() {
            return Err(PersistenceError::SessionClosed);
        }
        let guard = self
            .core
            .conn
            .try_borrow_mut()
            .map_err(|_| PersistenceError::SessionBusy)?;
        let conn = guard.as_ref().ok_or(PersistenceError::SessionClosed)?;
        f(conn)
    }

    /// Run a write in the current transaction, or in an implicit one that
    /// commits on success and rolls back on error
    pub(crate) fn write<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let behavior = self.core.config.transaction_behavior.behavior();
        match self.state() {
            SessionState::InTransaction => self.with_conn(f),
            SessionState::Idle => self.with_conn(|conn| {
                let tx = Transaction::new_unchecked(conn, behavior).map_err(from_rusqlite)?;
                let value = f(&tx)?;
                tx.commit().map_err(from_rusqlite)?;
                Ok(value)
            }),
            SessionState::Closed => Err(PersistenceError::SessionClosed),
        }
    }

    /// Run `f` with eager relation resolution disabled for nested loads
    ///
    /// Returns `None` without calling `f` when already inside such a scope.
    pub(crate) fn eager_scope<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let depth = &self.core.eager_depth;
        if depth.get() > 0 {
            return None;
        }
        depth.set(depth.get() + 1);
        let _scope = EagerScope(depth);
        Some(f())
    }

    fn transition(
        &self,
        op: &'static str,
        from: SessionState,
        to: SessionState,
        f: impl FnOnce(&Connection) -> rusqlite::Result<()>,
    ) -> Result<()> {
        let start = Instant::now();
        log_op_start!(op, session_id = self.id().as_str());

        let result = match self.state() {
            SessionState::Closed => Err(PersistenceError::SessionClosed),
            state if state != from => Err(match from {
                SessionState::Idle => PersistenceError::TransactionActive,
                _ => PersistenceError::NoTransaction,
            }),
            _ => self
                .with_conn(|conn| f(conn).map_err(from_rusqlite))
                .map(|()| self.core.state.set(to)),
        };

        self.log_result(op, start, &result);
        result
    }

    fn log_result(&self, op: &'static str, start: Instant, result: &Result<()>) {
        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(()) => {
                log_op_end!(op, duration_ms = duration_ms, session_id = self.id().as_str());
            }
            Err(err) => {
                log_op_error!(op, err, duration_ms = duration_ms, session_id = self.id().as_str());
            }
        }
    }
}

/// Leaves the eager scope on drop, unwinding included
struct EagerScope<'a>(&'a Cell<usize>);

impl Drop for EagerScope<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn open_session() -> Session {
        SessionManager::new(StoreConfig::in_memory(), Arc::new(Registry::default()))
            .open()
            .unwrap()
    }

    #[test]
    fn test_eager_scope_does_not_nest() {
        let session = open_session();
        let inner = session.eager_scope(|| session.eager_scope(|| ()));
        assert_eq!(inner, Some(None));
        assert_eq!(session.eager_scope(|| 7), Some(7));
    }

    #[test]
    fn test_eager_scope_reopens_after_panic() {
        let session = open_session();
        let unwound = catch_unwind(AssertUnwindSafe(|| {
            session.eager_scope(|| panic!("row conversion failed"))
        }));
        assert!(unwound.is_err());
        assert_eq!(session.eager_scope(|| 7), Some(7));
    }
}
