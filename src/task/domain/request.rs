//! Optimisation request accepted by `submit`.

use serde::{Deserialize, Serialize};

/// One schema statement of the source database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlStatement {
    /// SQL text.
    pub statement: String,
}

/// One workload query with its observed usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadQuery {
    /// Caller-chosen identifier, echoed in the artefact.
    pub queryid: String,
    /// SQL text.
    pub query: String,
    /// Number of observed executions.
    pub runquantity: u64,
    /// Observed execution time, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executiontime: Option<u64>,
}

/// Schema and workload to optimise.
///
/// # Examples
///
/// ```
/// use sqlagent::task::domain::OptimizationRequest;
///
/// let request = OptimizationRequest::new("jdbc:trino://host:8080/hive")
///     .with_ddl("CREATE TABLE hive.sales.orders (order_id BIGINT)")
///     .with_query("q1", "SELECT order_id FROM hive.sales.orders", 12);
/// assert_eq!(request.query_ids(), vec!["q1".to_owned()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    /// Connection descriptor of the source database.
    pub url: String,
    /// Schema statements in order.
    pub ddl: Vec<DdlStatement>,
    /// Workload queries in order.
    pub queries: Vec<WorkloadQuery>,
}

impl OptimizationRequest {
    /// Creates an empty request for a connection descriptor.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ddl: Vec::new(),
            queries: Vec::new(),
        }
    }

    /// Appends a schema statement.
    #[must_use]
    pub fn with_ddl(mut self, statement: impl Into<String>) -> Self {
        self.ddl.push(DdlStatement {
            statement: statement.into(),
        });
        self
    }

    /// Appends a workload query.
    #[must_use]
    pub fn with_query(
        mut self,
        queryid: impl Into<String>,
        query: impl Into<String>,
        runquantity: u64,
    ) -> Self {
        self.queries.push(WorkloadQuery {
            queryid: queryid.into(),
            query: query.into(),
            runquantity,
            executiontime: None,
        });
        self
    }

    /// Returns the query ids in request order.
    #[must_use]
    pub fn query_ids(&self) -> Vec<String> {
        self.queries.iter().map(|query| query.queryid.clone()).collect()
    }
}
