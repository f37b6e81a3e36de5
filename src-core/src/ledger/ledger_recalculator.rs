//! Recompute-from-scratch aggregate maintenance.
//!
//! Aggregates are never adjusted incrementally: every recalculation rescans
//! the affected entity's transactions and rewrites the stored value. The
//! O(n) scan per write is acceptable at personal-finance volumes and keeps
//! the stored aggregates trivially correct.
//!
//! These functions take a raw connection so callers can compose them into a
//! write-actor job, making "mutate transaction + rewrite aggregates" a
//! single atomic unit.

use diesel::dsl::sum;
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::errors::Result;
use crate::schema::{accounts, categories, transactions};

/// Recomputes `activity` for the category as the sum of amounts of all
/// transactions referencing it, then rewrites
/// `available = assigned - activity`.
///
/// A category that no longer exists (deleted concurrently) is a no-op.
pub fn recalculate_category(conn: &mut SqliteConnection, category_id: &str) -> Result<()> {
    let assigned: Option<f64> = categories::table
        .find(category_id)
        .select(categories::assigned)
        .first(conn)
        .optional()?;
    let Some(assigned) = assigned else {
        return Ok(());
    };

    let activity: Option<f64> = transactions::table
        .filter(transactions::category_id.eq(category_id))
        .select(sum(transactions::amount))
        .first(conn)?;
    let activity = activity.unwrap_or(0.0);

    let now = chrono::Utc::now().to_rfc3339();
    diesel::update(categories::table.find(category_id))
        .set((
            categories::activity.eq(activity),
            categories::available.eq(assigned - activity),
            categories::updated_at.eq(now),
        ))
        .execute(conn)?;

    Ok(())
}

/// Recomputes `cleared_balance` for the account as the sum of amounts of
/// all its transactions. All statuses are counted, a deliberate
/// simplification over summing only cleared transactions.
///
/// An account that no longer exists is a no-op.
pub fn recalculate_account(conn: &mut SqliteConnection, account_id: &str) -> Result<()> {
    let exists: Option<String> = accounts::table
        .find(account_id)
        .select(accounts::id)
        .first(conn)
        .optional()?;
    if exists.is_none() {
        return Ok(());
    }

    let balance: Option<f64> = transactions::table
        .filter(transactions::account_id.eq(account_id))
        .select(sum(transactions::amount))
        .first(conn)?;

    let now = chrono::Utc::now().to_rfc3339();
    diesel::update(accounts::table.find(account_id))
        .set((
            accounts::cleared_balance.eq(balance.unwrap_or(0.0)),
            accounts::updated_at.eq(now),
        ))
        .execute(conn)?;

    Ok(())
}
