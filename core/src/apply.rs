//! C9 Applier: executes a `Plan` against a live database with fingerprint
//! drift detection, an advisory-lock total order over concurrent appliers,
//! and single-transaction atomicity with caller-configured timeouts.
//!
//! Follows `config::drivers::tokio_postgres`'s `connect`/`push` shape (one
//! connection, connection future spawned, errors mapped into typed errors,
//! masked-credential messages), generalized into a seven-step protocol:
//! re-inspect, re-fingerprint, drift check, optional temp-schema dry run,
//! transaction-with-timeouts, execute-in-order, commit.

use std::time::{Duration, Instant};

use tokio_postgres::Client;
use uuid::Uuid;

use crate::error::ApplyError;
use crate::fingerprint::fingerprint;
use crate::ignore::IgnoreConfig;
use crate::inspect::build_ir;
use crate::normalize::normalize;
use crate::options::JobOptions;
use crate::plan::Plan;

/// One executed operation's outcome, in plan order.
#[derive(Debug, Clone)]
pub struct ExecutedStatement {
    pub identity: String,
    pub sql: String,
    pub duration: Duration,
}

/// Returned on a successful `apply`, once the transaction has committed.
#[derive(Debug, Clone)]
pub struct ApplyReport {
    pub executed: Vec<ExecutedStatement>,
    pub total_duration: Duration,
    pub new_fingerprint: String,
}

/// A stable advisory-lock key for a schema name. Postgres advisory locks
/// key on a single `bigint`; `hashtext` run server-side would work too, but
/// hashing here keeps the key independent of any one connection's locale.
fn lock_key(schema_name: &str) -> i64 {
    // FNV-1a, truncated to i64: deterministic across processes, which is
    // the only property an advisory-lock key needs.
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in schema_name.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash as i64
}

async fn with_statement_timeout<F, T>(duration: Duration, fut: F) -> Result<T, ApplyError>
where
    F: std::future::Future<Output = Result<T, tokio_postgres::Error>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ApplyError::Exec {
            stmt: String::new(),
            cause: e.to_string(),
        }),
        Err(_) => Err(ApplyError::Timeout(format!(
            "statement did not complete within {duration:?}"
        ))),
    }
}

/// Acquire the schema's session-level advisory lock; only one applier may
/// hold it at a time. Held for the
/// lifetime of the connection; callers that create a short-lived `Client`
/// per apply get lock release for free on disconnect, but `apply` also
/// unlocks explicitly on every exit path.
async fn acquire_advisory_lock(
    client: &Client,
    schema_name: &str,
    lock_timeout: Duration,
) -> Result<(), ApplyError> {
    client
        .batch_execute(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            lock_timeout.as_millis()
        ))
        .await
        .map_err(|e| ApplyError::Exec {
            stmt: "SET LOCAL lock_timeout".into(),
            cause: e.to_string(),
        })?;

    let key = lock_key(schema_name);
    with_statement_timeout(
        lock_timeout,
        client.execute("SELECT pg_advisory_lock($1)", &[&key]),
    )
    .await?;
    Ok(())
}

async fn release_advisory_lock(client: &Client, schema_name: &str) {
    let key = lock_key(schema_name);
    let _ = client.execute("SELECT pg_advisory_unlock($1)", &[&key]).await;
}

/// `Apply(ctx, plan, opts) -> Report`. `client` must be freshly connected
/// (not mid-transaction); this function owns the connection's transactional
/// state for its entire duration.
pub async fn apply(
    client: &mut Client,
    plan: &Plan,
    opts: &JobOptions,
) -> Result<ApplyReport, ApplyError> {
    let schema_name = &opts.connect.schema;

    acquire_advisory_lock(client, schema_name, opts.lock_timeout).await?;
    let result = apply_locked(client, plan, opts).await;
    release_advisory_lock(client, schema_name).await;
    result
}

async fn apply_locked(
    client: &mut Client,
    plan: &Plan,
    opts: &JobOptions,
) -> Result<ApplyReport, ApplyError> {
    let schema_name = &opts.connect.schema;

    // Re-inspect, re-fingerprint, drift check. Ignored objects never
    // contribute, so the same normalize+filter pipeline planning used must
    // run again here.
    let live_ir = build_ir(client, schema_name).await?;
    let live_ir = normalize(live_ir, schema_name);
    let live_ir = crate::ignore::filter(live_ir, &opts.ignore);
    let live_fingerprint = fingerprint(&live_ir, schema_name);

    if live_fingerprint != plan.source_fingerprint {
        return Err(ApplyError::Drift {
            planned: plan.source_fingerprint.clone(),
            live: live_fingerprint,
        });
    }

    if opts.validate_in_temp_schema {
        validate_in_temp_schema(client, plan, schema_name).await?;
    }

    let started = Instant::now();
    let mut executed = Vec::with_capacity(plan.diff.len());

    let txn = client.transaction().await.map_err(|e| ApplyError::Exec {
        stmt: "BEGIN".into(),
        cause: e.to_string(),
    })?;

    txn.batch_execute(&format!(
        "SET LOCAL lock_timeout = '{}ms'; SET LOCAL statement_timeout = '{}ms'",
        opts.lock_timeout.as_millis(),
        opts.statement_timeout.as_millis(),
    ))
    .await
    .map_err(|e| ApplyError::Exec {
        stmt: "SET LOCAL timeouts".into(),
        cause: e.to_string(),
    })?;

    // Executes the plan's already-rendered `diff` entries rather than
    // re-rendering `plan.operations`: `operations` is `#[serde(skip)]`'d
    // and comes back empty from a plan loaded via `--plan <path>`, but
    // `diff` survives the round-trip and is what made it into `plan.json`
    // in the first place.
    for entry in &plan.diff {
        let sql = entry.sql.clone();
        let stmt_started = Instant::now();

        let outcome = tokio::time::timeout(opts.statement_timeout, txn.batch_execute(&sql)).await;
        match outcome {
            Ok(Ok(())) => {
                executed.push(ExecutedStatement {
                    identity: format!("{}:{}", entry.kind, entry.identity),
                    sql,
                    duration: stmt_started.elapsed(),
                });
            }
            Ok(Err(e)) => {
                // Transaction aborts implicitly on rollback-of-scope below.
                return Err(ApplyError::Exec {
                    stmt: sql,
                    cause: e.to_string(),
                });
            }
            Err(_) => {
                return Err(ApplyError::Timeout(format!(
                    "statement exceeded {:?}: {sql}",
                    opts.statement_timeout
                )));
            }
        }
    }

    txn.commit().await.map_err(|e| ApplyError::Exec {
        stmt: "COMMIT".into(),
        cause: e.to_string(),
    })?;

    // Step 7: re-fingerprint post-commit for the report. A fresh build is
    // cheap relative to the DDL just executed and avoids hand-simulating
    // the post-apply IR from the plan's operations.
    let new_ir = build_ir(client, schema_name).await?;
    let new_ir = normalize(new_ir, schema_name);
    let new_ir = crate::ignore::filter(new_ir, &opts.ignore);
    let new_fingerprint = fingerprint(&new_ir, schema_name);

    Ok(ApplyReport {
        executed,
        total_duration: started.elapsed(),
        new_fingerprint,
    })
}

/// Create a uniquely named schema, load the plan's
/// rendered SQL into it with same-schema qualifiers remapped to the
/// temporary name, then drop it — all inside a single rolled-back
/// sub-transaction so nothing of the dry run persists regardless of
/// outcome.
async fn validate_in_temp_schema(
    client: &Client,
    plan: &Plan,
    schema_name: &str,
) -> Result<(), ApplyError> {
    let nonce = Uuid::new_v4().simple().to_string();
    let temp_schema = format!("pgschema_tmp_{nonce}");

    let mut body = String::new();
    body.push_str(&format!("CREATE SCHEMA \"{temp_schema}\";\n"));
    for entry in &plan.diff {
        body.push_str(&crate::normalize::strip_qualifier(&entry.sql, schema_name).replacen(
            schema_name,
            &temp_schema,
            1,
        ));
        body.push('\n');
    }

    let outcome = client.batch_execute(&body).await;
    let _ = client
        .batch_execute(&format!("DROP SCHEMA IF EXISTS \"{temp_schema}\" CASCADE"))
        .await;

    outcome.map_err(|e| ApplyError::Exec {
        stmt: "temp-schema validation".into(),
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_key_is_deterministic() {
        assert_eq!(lock_key("public"), lock_key("public"));
        assert_ne!(lock_key("public"), lock_key("other"));
    }
}
