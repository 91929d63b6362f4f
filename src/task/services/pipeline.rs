//! Per-task optimisation pipeline.
//!
//! One run turns a request into a validated artefact: describe the source
//! tables, pick the target location, gather statistics, negotiate a layout
//! strategy, render the target schema, rewrite the workload against it and
//! assemble the result.

use std::sync::Arc;

use crate::advisor::{
    domain::{CancellationSignal, QuerySummary, StrategyContext},
    ports::{StatisticsSource, StrategyAdvisor},
    services::{NegotiationError, StatisticsCollector, StrategyNegotiator, summarise_tables},
};
use crate::artifact::{
    domain::{AssemblyError, OptimizationResult, RewrittenQuery},
    services::{
        ArtifactAssembler, render_migrations, render_target_ddl, resolve_catalog,
        target_schema_name,
    },
};
use crate::config::EngineConfig;
use crate::health::domain::ErrorCategory;
use crate::rewrite::{
    domain::{TableCatalog, TargetLocation},
    services::{QueryRewriter, build_catalog},
};
use crate::task::domain::{OptimizationRequest, WorkloadQuery};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Errors that fail one pipeline run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// No usable strategy was negotiated.
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// The assembled artefact failed validation.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// The request could not be fingerprinted for schema naming.
    #[error("request fingerprint failed: {0}")]
    Fingerprint(String),

    /// A query rewrite did not run to completion.
    #[error("rewrite of query {queryid} did not finish: {reason}")]
    Rewrite {
        /// Query whose rewrite failed.
        queryid: String,
        /// Underlying failure.
        reason: String,
    },
}

impl PipelineError {
    /// Returns the task failure category for this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Negotiation(NegotiationError::Exhausted { .. }) => {
                ErrorCategory::UpstreamCallFailure
            }
            Self::Negotiation(NegotiationError::Unreachable { .. }) => {
                ErrorCategory::ConnectivityFailure
            }
            Self::Negotiation(NegotiationError::Cancelled) => ErrorCategory::Timeout,
            Self::Assembly(err) => err.category(),
            Self::Negotiation(NegotiationError::Prompt(_))
            | Self::Fingerprint(_)
            | Self::Rewrite { .. } => ErrorCategory::Unknown,
        }
    }
}

/// Runs requests through the optimisation stages.
pub struct OptimizationPipeline<A, S>
where
    A: StrategyAdvisor + 'static,
    S: StatisticsSource,
{
    negotiator: StrategyNegotiator<A>,
    collector: StatisticsCollector<S>,
    row_limit: u64,
    rewrite_parallelism: usize,
    default_catalog: String,
}

impl<A, S> OptimizationPipeline<A, S>
where
    A: StrategyAdvisor + 'static,
    S: StatisticsSource,
{
    /// Creates a pipeline from its collaborators and the engine settings.
    #[must_use]
    pub fn new(advisor: Arc<A>, statistics: Arc<S>, config: &EngineConfig) -> Self {
        Self {
            negotiator: StrategyNegotiator::new(
                advisor,
                config.advisor_max_attempts,
                config.advisor_timeout(),
            ),
            collector: StatisticsCollector::new(statistics, config.statistics_timeout()),
            row_limit: config.default_row_limit,
            rewrite_parallelism: config.rewrite_parallelism.max(1),
            default_catalog: config.default_catalog.clone(),
        }
    }

    /// Produces the artefact for one request.
    ///
    /// `submitted_at` and the request contents name the target schema, so a
    /// rerun of the same submission targets the same schema.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when negotiation fails, the artefact fails
    /// validation or a rewrite worker dies.
    pub async fn run(
        &self,
        request: &OptimizationRequest,
        submitted_at: DateTime<Utc>,
        cancel: CancellationSignal,
    ) -> Result<OptimizationResult, PipelineError> {
        let report = build_catalog(request.ddl.iter().map(|ddl| ddl.statement.as_str()));
        if !report.degraded().is_empty() {
            warn!(
                statements = ?report.degraded(),
                "parse degraded: schema statements described by pattern tier"
            );
        }
        let source = report.into_catalog();

        let fingerprint =
            serde_json::to_vec(request).map_err(|err| PipelineError::Fingerprint(err.to_string()))?;
        let target = TargetLocation::new(
            resolve_catalog(&request.url, &source, &self.default_catalog),
            target_schema_name(submitted_at, &fingerprint),
        );
        debug!(target = %target, tables = source.len(), "target location chosen");

        let statistics = self.collector.collect(&source).await;
        let context = Arc::new(StrategyContext {
            target: target.to_string(),
            tables: summarise_tables(&source, &statistics),
            queries: request.queries.iter().map(summarise_query).collect(),
        });
        let strategy = self
            .negotiator
            .negotiate(context, &source, &target, cancel)
            .await?;

        let ddl = render_target_ddl(&source, &strategy, &target);
        let rewritten = self
            .rewrite_queries(Arc::new(target_catalog(&source, &ddl)), &target, &request.queries)
            .await?;
        let migrations = render_migrations(&source, &strategy, &target);

        Ok(ArtifactAssembler::new(target).assemble(
            ddl,
            migrations,
            rewritten,
            &request.query_ids(),
        )?)
    }

    async fn rewrite_queries(
        &self,
        catalog: Arc<TableCatalog>,
        target: &TargetLocation,
        queries: &[WorkloadQuery],
    ) -> Result<Vec<RewrittenQuery>, PipelineError> {
        let rewriter =
            Arc::new(QueryRewriter::new(catalog, target.clone()).with_row_limit(self.row_limit));
        let permits = Arc::new(Semaphore::new(self.rewrite_parallelism));
        let mut pending = Vec::with_capacity(queries.len());
        for query in queries {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|err| PipelineError::Rewrite {
                    queryid: query.queryid.clone(),
                    reason: err.to_string(),
                })?;
            let worker = Arc::clone(&rewriter);
            let sql = query.query.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                worker.rewrite(&sql)
            });
            pending.push((query.queryid.clone(), handle));
        }

        let mut rewritten = Vec::with_capacity(pending.len());
        for (queryid, handle) in pending {
            let outcome = handle.await.map_err(|err| PipelineError::Rewrite {
                queryid: queryid.clone(),
                reason: err.to_string(),
            })?;
            debug!(
                queryid = %queryid,
                tier = outcome.tier().as_str(),
                notes = outcome.notes().len(),
                "query rewritten"
            );
            rewritten.push(RewrittenQuery {
                queryid,
                query: outcome.into_statement(),
            });
        }
        Ok(rewritten)
    }
}

fn summarise_query(query: &WorkloadQuery) -> QuerySummary {
    QuerySummary {
        queryid: query.queryid.clone(),
        query: query.query.clone(),
        runquantity: query.runquantity,
        executiontime: query.executiontime,
    }
}

/// Source catalog with each table replaced by the layout its generated
/// target DDL declares.
fn target_catalog(source: &TableCatalog, ddl: &[String]) -> TableCatalog {
    let mut catalog = source.clone();
    let derived = build_catalog(ddl.iter().skip(1).map(String::as_str));
    for table in derived.catalog().iter() {
        catalog.insert(table.clone());
    }
    catalog
}
