//! In-memory statement service for testing.
//!
//! Responses are scripted by SQL substring; the first matching rule wins and
//! anything unmatched finishes successfully after one `STARTED` poll with no
//! rows.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RedshiftError;
use crate::service::StatementService;
use crate::statement::{Row, StatementDescription, StatementHandle, StatementStatus};

/// How the mock treats statements matching a rule.
#[derive(Debug, Clone)]
pub struct MockResponse {
    polls_before_terminal: usize,
    terminal: StatementStatus,
    error: Option<String>,
    rows: Vec<Row>,
    rejection: Option<String>,
}

impl MockResponse {
    pub fn finished() -> Self {
        Self {
            polls_before_terminal: 1,
            terminal: StatementStatus::Finished,
            error: None,
            rows: Vec::new(),
            rejection: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            terminal: StatementStatus::Failed,
            error: Some(error.into()),
            ..Self::finished()
        }
    }

    pub fn aborted() -> Self {
        Self {
            terminal: StatementStatus::Aborted,
            ..Self::finished()
        }
    }

    /// `execute_statement` itself errors; nothing is recorded as submitted.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            rejection: Some(error.into()),
            ..Self::finished()
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Number of non-terminal (`STARTED`) observations before the terminal one.
    pub fn after_polls(mut self, polls: usize) -> Self {
        self.polls_before_terminal = polls;
        self
    }
}

struct TrackedStatement {
    response: MockResponse,
    describes: usize,
}

#[derive(Default)]
struct MockState {
    statements: HashMap<String, TrackedStatement>,
    submitted: Vec<String>,
    result_requests: Vec<String>,
}

/// A [`StatementService`] that never leaves the process.
#[derive(Default)]
pub struct MockStatementService {
    rules: Vec<(String, MockResponse)>,
    state: Mutex<MockState>,
}

impl MockStatementService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `response` to every statement whose SQL contains `pattern`.
    pub fn on(mut self, pattern: impl Into<String>, response: MockResponse) -> Self {
        self.rules.push((pattern.into(), response));
        self
    }

    /// SQL of every accepted submission, in submission order.
    pub fn submitted(&self) -> Vec<String> {
        self.state().submitted.clone()
    }

    /// Accepted submissions whose SQL contains `pattern`.
    pub fn submitted_matching(&self, pattern: &str) -> Vec<String> {
        self.state()
            .submitted
            .iter()
            .filter(|sql| sql.contains(pattern))
            .cloned()
            .collect()
    }

    pub fn describe_count(&self, handle: &StatementHandle) -> usize {
        self.state()
            .statements
            .get(&handle.id)
            .map(|s| s.describes)
            .unwrap_or(0)
    }

    /// Statement IDs passed to `get_statement_result`.
    pub fn result_requests(&self) -> Vec<String> {
        self.state().result_requests.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn response_for(&self, sql: &str) -> MockResponse {
        self.rules
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(MockResponse::finished)
    }
}

#[async_trait]
impl StatementService for MockStatementService {
    async fn execute_statement(&self, sql: &str) -> Result<StatementHandle, RedshiftError> {
        let response = self.response_for(sql);
        if let Some(reason) = &response.rejection {
            return Err(RedshiftError::AwsSdk(reason.clone()));
        }

        let handle = StatementHandle::new(Uuid::new_v4().to_string());
        let mut state = self.state();
        state.submitted.push(sql.to_string());
        state.statements.insert(
            handle.id.clone(),
            TrackedStatement {
                response,
                describes: 0,
            },
        );
        Ok(handle)
    }

    async fn describe_statement(
        &self,
        handle: &StatementHandle,
    ) -> Result<StatementDescription, RedshiftError> {
        let mut state = self.state();
        let statement = state
            .statements
            .get_mut(&handle.id)
            .ok_or_else(|| RedshiftError::AwsSdk(format!("statement {handle} not found")))?;

        statement.describes += 1;
        if statement.describes <= statement.response.polls_before_terminal {
            return Ok(StatementDescription::new(StatementStatus::Started));
        }

        Ok(StatementDescription {
            status: statement.response.terminal,
            error: statement.response.error.clone(),
        })
    }

    async fn get_statement_result(
        &self,
        handle: &StatementHandle,
    ) -> Result<Vec<Row>, RedshiftError> {
        let mut state = self.state();
        state.result_requests.push(handle.id.clone());
        state
            .statements
            .get(&handle.id)
            .map(|s| s.response.rows.clone())
            .ok_or_else(|| RedshiftError::AwsSdk(format!("statement {handle} not found")))
    }
}
