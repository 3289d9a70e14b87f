//! Scripted [`QueryExecutor`] for reader tests

use std::sync::Mutex;

use futures::StreamExt;

use crate::data::filters::SqlStatement;
use crate::data::traits::{QueryExecutor, RowStream};
use crate::data::types::RawRow;

pub enum FakeResult {
    Rows(Vec<RawRow>),
    Fail(String),
    /// Never yields; the caller must cancel or time out
    Pending,
}

type Handler = Box<dyn Fn(&SqlStatement) -> FakeResult + Send + Sync>;

pub struct FakeExecutor {
    handler: Handler,
    statements: Mutex<Vec<SqlStatement>>,
}

impl FakeExecutor {
    pub fn new(handler: impl Fn(&SqlStatement) -> FakeResult + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn rows(rows: Vec<RawRow>) -> Self {
        Self::new(move |_| FakeResult::Rows(rows.clone()))
    }

    /// Statements received so far, in order
    pub fn statements(&self) -> Vec<SqlStatement> {
        self.statements.lock().unwrap().clone()
    }
}

impl QueryExecutor for FakeExecutor {
    fn fetch<'a>(&'a self, statement: &'a SqlStatement) -> RowStream<'a> {
        self.statements.lock().unwrap().push(statement.clone());
        match (self.handler)(statement) {
            FakeResult::Rows(rows) => futures::stream::iter(rows.into_iter().map(Ok)).boxed(),
            FakeResult::Fail(message) => {
                futures::stream::once(async move { Err(sqlx::Error::Protocol(message)) }).boxed()
            }
            FakeResult::Pending => futures::stream::pending().boxed(),
        }
    }
}
