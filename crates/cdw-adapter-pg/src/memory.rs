//! In-memory warehouse for tests and offline runs.
//!
//! Responses are matched by substring against the submitted SQL, first
//! registered match wins. Unmatched statements return no columns.

use crate::connector::{RowSink, WarehouseConnector, WarehouseSession};
use crate::error::GatewayError;
use crate::format::Row;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
enum Response {
    Rows { columns: Vec<String>, rows: Vec<Row> },
    Error(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    responses: Vec<(String, Response)>,
    refuse_connections: Option<String>,
    opened: usize,
    closed: usize,
    executed: Vec<String>,
}

/// A [`WarehouseConnector`] backed by canned responses.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer statements containing `pattern` with these rows.
    pub fn with_rows<C, S>(self, pattern: &str, columns: C, rows: Vec<Row>) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.state()
            .responses
            .push((pattern.to_string(), Response::Rows { columns, rows }));
        self
    }

    /// Fail statements containing `pattern` with this driver message.
    pub fn with_error(self, pattern: &str, message: &str) -> Self {
        self.state()
            .responses
            .push((pattern.to_string(), Response::Error(message.to_string())));
        self
    }

    /// Refuse every connection attempt.
    pub fn refusing(self, message: &str) -> Self {
        self.state().refuse_connections = Some(message.to_string());
        self
    }

    /// Sessions opened so far.
    pub fn opened(&self) -> usize {
        self.state().opened
    }

    /// Sessions closed so far.
    pub fn closed(&self) -> usize {
        self.state().closed
    }

    /// Statements run so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }
}

#[async_trait]
impl WarehouseConnector for MemoryConnector {
    async fn connect(&self) -> Result<Box<dyn WarehouseSession>, GatewayError> {
        let mut state = self.state();
        if let Some(message) = &state.refuse_connections {
            return Err(GatewayError::connection(self.target(), message.clone()));
        }
        state.opened += 1;
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
        }))
    }

    fn target(&self) -> String {
        "memory".to_string()
    }
}

struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl WarehouseSession for MemorySession {
    async fn run(
        &mut self,
        sql: &str,
        max_rows: u64,
        batch_size: usize,
        sink: &mut (dyn RowSink + Send),
    ) -> Result<u64, GatewayError> {
        let response = {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            state.executed.push(sql.to_string());
            state
                .responses
                .iter()
                .find(|(pattern, _)| sql.contains(pattern.as_str()))
                .map(|(_, response)| response.clone())
        };

        let (columns, rows) = match response {
            None => (Vec::new(), Vec::new()),
            Some(Response::Error(message)) => return Err(GatewayError::execution(message)),
            Some(Response::Rows { columns, rows }) => (columns, rows),
        };

        sink.columns(&columns)?;
        let take = usize::try_from(max_rows).unwrap_or(usize::MAX);
        let bounded: Vec<Row> = rows.into_iter().take(take).collect();
        let delivered = bounded.len() as u64;
        let mut pending = bounded.into_iter().peekable();
        while pending.peek().is_some() {
            let batch: Vec<Row> = pending.by_ref().take(batch_size.max(1)).collect();
            sink.rows(batch)?;
        }
        Ok(delivered)
    }

    async fn close(self: Box<Self>) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.closed += 1;
        Ok(())
    }
}
