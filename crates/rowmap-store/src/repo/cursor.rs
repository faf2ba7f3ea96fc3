use rowmap_core::errors::PersistenceError;
use rowmap_core::{EntityModel, Value};
use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::rc::Weak;
use std::sync::Arc;

use super::bind::{bind_params, query_rows, Page};
use super::repository::materialize;
use crate::entity::Entity;
use crate::errors::{for_entity, Result};
use crate::session::{Session, SessionCore};

/// Which rows a cursor walks
#[derive(Debug, Clone)]
pub(crate) enum Scan {
    All,
    ForeignKey { column: String, value: Value },
}

/// Lazy, key-ordered iteration over query results
///
/// Rows are fetched in keyset pages of the repository's page size, so
/// rows inserted behind the cursor's position are never revisited. The
/// cursor does not keep its session alive: once the session is closed or
/// dropped, the next call yields `StaleCursor` and the cursor ends.
pub struct Cursor<E: Entity> {
    session: Weak<SessionCore>,
    model: Arc<EntityModel>,
    scan: Scan,
    page_size: usize,
    buffer: VecDeque<Vec<Value>>,
    after: Value,
    exhausted: bool,
    finished: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> fmt::Debug for Cursor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("entity", &self.model.entity())
            .field("scan", &self.scan)
            .field("after", &self.after)
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .finish()
    }
}

impl<E: Entity> Cursor<E> {
    pub(crate) fn new(session: &Session, model: Arc<EntityModel>, scan: Scan, page_size: usize) -> Self {
        Self {
            session: session.downgrade(),
            model,
            scan,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            after: Value::Null,
            exhausted: false,
            finished: false,
            _entity: PhantomData,
        }
    }

    fn stale(&self) -> PersistenceError {
        PersistenceError::StaleCursor {
            entity: self.model.entity().to_string(),
        }
    }

    fn fetch_page(&mut self, session: &Session) -> Result<()> {
        let statements = self.model.statements();
        let (template, filter) = match &self.scan {
            Scan::All => (&statements.select_all, Value::Null),
            Scan::ForeignKey { column, value } => {
                let template = statements.by_foreign_key(column).ok_or_else(|| {
                    PersistenceError::UnknownForeignKey {
                        entity: self.model.entity().to_string(),
                        column: column.clone(),
                    }
                })?;
                (template, value.clone())
            }
        };

        let page = Page {
            after: &self.after,
            limit: self.page_size,
        };
        let params = bind_params(template, |_| filter.clone(), Some(page));
        let rows = session.with_conn(|conn| {
            query_rows(conn, template.sql(), params)
                .map_err(for_entity(self.model.entity(), "fetch_page"))
        })?;

        tracing::debug!(
            entity = self.model.entity(),
            session_id = session.id().as_str(),
            rows = rows.len(),
            after = %self.after,
            "cursor page fetched"
        );

        if rows.len() < self.page_size {
            self.exhausted = true;
        }
        let key_index = self.model.metamodel().primary_key_index();
        if let Some(last) = rows.last() {
            self.after = last.get(key_index).cloned().unwrap_or(Value::Null);
        }
        self.buffer.extend(rows);
        Ok(())
    }

    fn advance(&mut self) -> Option<Result<E>> {
        let Some(session) = Session::upgrade(&self.session) else {
            return Some(Err(self.stale()));
        };

        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page(&session) {
                return Some(Err(err));
            }
        }

        let row = self.buffer.pop_front()?;
        Some(materialize::<E>(&self.model, &session, row))
    }
}

impl<E: Entity> Iterator for Cursor<E> {
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.advance();
        if matches!(item, None | Some(Err(_))) {
            self.finished = true;
        }
        item
    }
}

impl<E: Entity> FusedIterator for Cursor<E> {}
