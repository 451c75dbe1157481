//! # Perception Bridge
//!
//! Request/response contract with the perception service. A query either returns scene data or
//! fails, either because the service returned the failure sentinel or because the data did not
//! pass a structural check. Both kinds of failure are soft: the caller re-issues the query on a
//! later cycle once its [`PerceptionRetry`] backoff has elapsed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};

use comms_if::eqpt::perception::{PerceptionService, PerceptionTag, PERCEPTION_FAILURE};
use util::time::Cooldown;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Query side of the bridge, counting the queries made through it.
#[derive(Debug, Default)]
pub struct PerceptionBridge {
    num_queries: u64,
    num_failures: u64,
}

/// Fields of a successful perception response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneData {
    fields: Vec<String>,
}

/// Backoff gate for a query which may fail.
#[derive(Debug, Clone)]
pub struct PerceptionRetry {
    gate: Cooldown,
    consecutive_failures: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PerceptionError {
    #[error("The perception service could not provide data")]
    Unavailable,

    #[error("Invalid perception data: {0}")]
    InvalidData(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PerceptionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query the service for the given tag.
    pub fn query(
        &mut self,
        service: &mut dyn PerceptionService,
        tag: PerceptionTag,
    ) -> Result<SceneData, PerceptionError> {
        self.num_queries += 1;

        let response = service.query(tag.wire_tag());
        debug!("Perception {} -> {:?}", tag, response);

        if response.trim() == PERCEPTION_FAILURE {
            self.num_failures += 1;
            return Err(PerceptionError::Unavailable);
        }

        Ok(SceneData::parse(&response))
    }

    /// Record that a response was rejected by the caller's own validation.
    pub fn record_invalid(&mut self) {
        self.num_failures += 1;
    }

    /// Total number of queries made.
    pub fn num_queries(&self) -> u64 {
        self.num_queries
    }

    /// Number of queries which returned the sentinel or were rejected as invalid.
    pub fn num_failures(&self) -> u64 {
        self.num_failures
    }
}

impl SceneData {
    /// Split a raw response into its trimmed comma separated fields.
    ///
    /// An empty response has no fields.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        let fields = if raw.is_empty() {
            vec![]
        } else {
            raw.split(',').map(|f| f.trim().to_string()).collect()
        };

        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Require exactly `n` fields.
    pub fn expect_len(self, n: usize) -> Result<Self, PerceptionError> {
        if self.fields.len() != n {
            return Err(PerceptionError::InvalidData(format!(
                "expected {} fields, got {}",
                n,
                self.fields.len()
            )));
        }
        Ok(self)
    }

    /// Require at least `n` fields.
    pub fn expect_min_len(self, n: usize) -> Result<Self, PerceptionError> {
        if self.fields.len() < n {
            return Err(PerceptionError::InvalidData(format!(
                "expected at least {} fields, got {}",
                n,
                self.fields.len()
            )));
        }
        Ok(self)
    }

    /// Parse every field as an integer.
    pub fn ints(&self) -> Result<Vec<i32>, PerceptionError> {
        self.fields
            .iter()
            .map(|f| {
                f.parse::<i32>()
                    .map_err(|_| PerceptionError::InvalidData(format!("{:?} is not an integer", f)))
            })
            .collect()
    }
}

impl PerceptionRetry {
    pub fn new(backoff_s: f64) -> Self {
        Self {
            gate: Cooldown::new(backoff_s),
            consecutive_failures: 0,
        }
    }

    /// True if the query may be (re)issued at `now_s`.
    pub fn is_ready(&self, now_s: f64) -> bool {
        self.gate.is_ready(now_s)
    }

    /// Record a failed query, arming the default backoff.
    pub fn fail(&mut self, now_s: f64, err: &PerceptionError) {
        let backoff_s = self.gate.period_s;
        self.fail_for(now_s, err, backoff_s);
    }

    /// Record a failed query, or a response rejected by the game, arming a specific backoff.
    pub fn fail_for<E: std::fmt::Display>(&mut self, now_s: f64, err: &E, backoff_s: f64) {
        self.consecutive_failures += 1;
        warn!(
            "Perception query failed ({}), retrying in {:.1} s (failure {})",
            err, backoff_s, self.consecutive_failures
        );
        self.gate.hold(now_s, backoff_s);
    }

    /// Record a successful query.
    pub fn succeed(&mut self) {
        self.consecutive_failures = 0;
        self.gate.reset();
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
