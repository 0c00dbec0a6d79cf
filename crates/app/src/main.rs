//! Tinybird batch query runner.
//!
//! Runs a set of named SQL queries as one batch and prints each outcome.
//!
//! ```text
//! tinybird-batch total='SELECT count() FROM events' recent='SELECT 1'
//! ```
//!
//! With no arguments a small demo batch runs, including one query that is
//! expected to fail, to show that failures stay isolated per key.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use tinybird_application::{IndexMap, RequestCoordinator};
use tinybird_domain::{ApiRequest, BatchResult, JsonObject};
use tinybird_infrastructure::{EnvConfig, ReqwestTransport};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_QUERIES: [(&str, &str); 3] = [
    ("valid_query", "SELECT 1 AS result"),
    ("invalid_query", "SELECT * FROM this_table_does_not_exist_xyz"),
    ("another_valid", "SELECT 2 AS result"),
];

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let queries = parse_queries(std::env::args().skip(1))?;

    let options = EnvConfig::from_env()?;
    if !options.has_token() {
        tracing::warn!("{} is not set, requests are unauthenticated", EnvConfig::TOKEN);
    }
    tracing::info!(base_url = %options.base_url, queries = queries.len(), "running batch");

    let transport = ReqwestTransport::new(&options)?;
    let coordinator = RequestCoordinator::new(&options, Arc::new(transport));

    let requests: IndexMap<String, ApiRequest> = queries
        .into_iter()
        .map(|(name, sql)| (name, ApiRequest::get("sql").with_query_param("q", sql)))
        .collect();

    let started = Instant::now();
    let results = coordinator.batch(requests).await;
    println!(
        "Completed {} queries in {}ms\n",
        results.len(),
        started.elapsed().as_millis()
    );

    for (name, result) in &results {
        println!("  {}", describe(name, result));
    }

    let failed = results.values().filter(|r| r.is_failure()).count();
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Parses `name=SQL` arguments, falling back to the demo batch.
fn parse_queries(
    args: impl Iterator<Item = String>,
) -> Result<Vec<(String, String)>, String> {
    let mut queries = Vec::new();
    for arg in args {
        let Some((name, sql)) = arg.split_once('=') else {
            return Err(format!("expected name=SQL, got {arg:?}"));
        };
        let (name, sql) = (name.trim(), sql.trim());
        if name.is_empty() || sql.is_empty() {
            return Err(format!("expected name=SQL, got {arg:?}"));
        }
        if queries.iter().any(|(existing, _)| existing == name) {
            return Err(format!("duplicate query name {name:?}"));
        }
        queries.push((name.to_string(), sql.to_string()));
    }

    if queries.is_empty() {
        queries = DEMO_QUERIES
            .iter()
            .map(|(name, sql)| ((*name).to_string(), (*sql).to_string()))
            .collect();
    }
    Ok(queries)
}

fn describe(name: &str, result: &BatchResult<JsonObject>) -> String {
    match result {
        BatchResult::Success(data) => {
            let rows = data
                .get("rows")
                .map_or_else(|| "?".to_string(), ToString::to_string);
            let elapsed = data
                .get("statistics")
                .and_then(|s| s.get("elapsed"))
                .map_or_else(|| "?".to_string(), ToString::to_string);
            format!("ok     {name}: {rows} rows (elapsed: {elapsed}s)")
        }
        BatchResult::Failure(error) => format!("FAILED {name}: {error}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tinybird_domain::ServiceError;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|v| (*v).to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_queries() {
        let queries = parse_queries(args(&["total=SELECT count() FROM t WHERE a = 1"])).unwrap();
        assert_eq!(
            queries,
            vec![(
                "total".to_string(),
                "SELECT count() FROM t WHERE a = 1".to_string()
            )]
        );
    }

    #[test]
    fn test_parse_queries_defaults_to_demo() {
        let queries = parse_queries(args(&[])).unwrap();
        assert_eq!(queries.len(), DEMO_QUERIES.len());
        assert_eq!(queries[1].0, "invalid_query");
    }

    #[test]
    fn test_parse_queries_rejects_malformed() {
        assert!(parse_queries(args(&["no-separator"])).is_err());
        assert!(parse_queries(args(&["=SELECT 1"])).is_err());
        assert!(parse_queries(args(&["a=SELECT 1", "a=SELECT 2"])).is_err());
    }

    #[test]
    fn test_describe() {
        let mut data = JsonObject::new();
        data.insert("rows".to_string(), json!(3));
        data.insert("statistics".to_string(), json!({"elapsed": 0.002}));

        assert_eq!(
            describe("q", &BatchResult::success(data)),
            "ok     q: 3 rows (elapsed: 0.002s)"
        );
        assert_eq!(
            describe("q", &BatchResult::failure(ServiceError::api(400, "bad query"))),
            "FAILED q: bad query"
        );
    }
}
