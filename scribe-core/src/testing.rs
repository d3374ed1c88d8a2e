//! In-memory driver for exercising the gateway without a database
//!
//! Replies are scripted in order; every driver call is recorded in a journal
//! that tests can inspect afterwards.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::executor::{Connection, Connector, Outcome};
use crate::{Error, Result, Row, Value};

/// A driver call observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connect,
    Begin,
    Execute { sql: String, args: Vec<Value> },
    Fetch { sql: String, args: Vec<Value> },
    Commit,
    Rollback,
    Close,
}

/// A scripted answer for the next `execute` or `fetch_all`
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Affected { rows_affected: u64, last_insert_id: u64 },
    Rows(Vec<Row>),
    Fail(String),
}

impl Reply {
    pub fn affected(rows_affected: u64, last_insert_id: u64) -> Self {
        Reply::Affected {
            rows_affected,
            last_insert_id,
        }
    }

    pub fn rows(rows: Vec<Row>) -> Self {
        Reply::Rows(rows)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Reply::Fail(message.into())
    }
}

/// Build a [`Row`] from a JSON object literal; anything else yields an empty row
pub fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Row::new(),
    }
}

#[derive(Debug, Default)]
struct State {
    replies: VecDeque<Reply>,
    events: Vec<Event>,
    refuse_connections: bool,
}

/// Connector handing out in-memory connections that share one script
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<State>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next statement
    pub fn reply(&self, reply: Reply) -> &Self {
        self.lock().replies.push_back(reply);
        self
    }

    /// Make every following `connect` fail
    pub fn refuse_connections(&self) {
        self.lock().refuse_connections = true;
    }

    /// Every driver call so far, in order
    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// The SQL text of every executed or fetched statement
    pub fn statements(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Execute { sql, .. } | Event::Fetch { sql, .. } => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// Replies queued but never consumed
    pub fn pending(&self) -> usize {
        self.lock().replies.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self) -> Result<Self::Connection> {
        let mut state = self.lock();
        if state.refuse_connections {
            return Err(Error::execution("connection refused"));
        }
        state.events.push(Event::Connect);
        Ok(MockConnection {
            state: Arc::clone(&self.state),
        })
    }
}

/// One in-memory connection
#[derive(Debug)]
pub struct MockConnection {
    state: Arc<Mutex<State>>,
}

impl MockConnection {
    fn record(&self, event: Event) {
        lock(&self.state).events.push(event);
    }

    fn next_reply(&self) -> Option<Reply> {
        lock(&self.state).replies.pop_front()
    }
}

impl Connection for MockConnection {
    async fn begin(&mut self) -> Result<()> {
        self.record(Event::Begin);
        Ok(())
    }

    async fn execute(&mut self, sql: &str, args: &[Value]) -> Result<Outcome> {
        self.record(Event::Execute {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        match self.next_reply() {
            None => Ok(Outcome::default()),
            Some(Reply::Affected {
                rows_affected,
                last_insert_id,
            }) => Ok(Outcome {
                rows_affected,
                last_insert_id,
            }),
            Some(Reply::Fail(message)) => Err(Error::execution(message)),
            Some(Reply::Rows(_)) => Err(Error::execution("scripted rows for a modifying statement")),
        }
    }

    async fn fetch_all(&mut self, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
        self.record(Event::Fetch {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        match self.next_reply() {
            None => Ok(Vec::new()),
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(Error::execution(message)),
            Some(Reply::Affected { .. }) => {
                Err(Error::execution("scripted row count for a fetching statement"))
            }
        }
    }

    async fn commit(&mut self) -> Result<()> {
        self.record(Event::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.record(Event::Rollback);
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.record(Event::Close);
        Ok(())
    }
}
