//! Versioned schema migrations for the ledger database.
//!
//! Each schema version `NN` has a pair of files in this directory: `migration_NN_up.sql` moves
//! the schema from `NN-1` to `NN` and `migration_NN_down.sql` moves it back. The current version is
//! kept as the single row of the `schema_version` table.

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::error::Res;

/// The schema version that this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = 1;

struct Migration {
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// One SQL script to run and the version the schema is at once it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    sql: &'static str,
    version_after: i32,
}

/// Moves the schema from version `from` to version `to`, one migration at a time. Every step runs
/// in its own SQL transaction together with the `schema_version` update, and the whole plan is
/// checked before any step runs.
pub(crate) async fn run(pool: &SqlitePool, from: i32, to: i32) -> Res<()> {
    let steps = plan(from, to)?;
    if steps.is_empty() {
        debug!("Schema is at version {to}, nothing to migrate");
        return Ok(());
    }
    for step in steps {
        debug!("Migrating schema to version {:02}", step.version_after);
        apply(pool, step).await.with_context(|| {
            format!("Migration to schema version {} failed", step.version_after)
        })?;
    }
    debug!("Schema migrated from version {from} to {to}");
    Ok(())
}

/// The ordered steps that take the schema from `from` to `to`.
fn plan(from: i32, to: i32) -> Res<Vec<Step>> {
    let find = |version: i32| -> Res<&'static Migration> {
        match MIGRATIONS.iter().find(|m| m.version == version) {
            Some(m) => Ok(m),
            None => bail!(
                "Migration {version} is missing but required to migrate from version {from} to {to}"
            ),
        }
    };

    let mut steps = Vec::new();
    if from < to {
        for version in (from + 1)..=to {
            steps.push(Step {
                sql: find(version)?.up_sql,
                version_after: version,
            });
        }
    } else {
        for version in ((to + 1)..=from).rev() {
            steps.push(Step {
                sql: find(version)?.down_sql,
                version_after: version - 1,
            });
        }
    }
    Ok(steps)
}

async fn apply(pool: &SqlitePool, step: Step) -> Res<()> {
    let mut tx = pool.begin().await.context("Unable to begin transaction")?;
    tx.execute(step.sql)
        .await
        .context("Unable to execute migration SQL")?;
    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(step.version_after)
        .execute(&mut *tx)
        .await?;
    tx.commit().await.context("Unable to commit migration")?;
    Ok(())
}
