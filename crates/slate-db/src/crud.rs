//! Row operations: select, get, count, sum, insert, update, delete,
//! truncate and table listing.

use slate_sql_core::clause::{Limit, Where};
use slate_sql_core::query::{self, QuerySpec};
use slate_sql_core::value::{Scalar, Values};

use crate::backend::Backend;
use crate::connection::Database;
use crate::error::Result;
use crate::record::Record;

impl<B: Backend> Database<B> {
    /// Runs a SELECT and decodes every row.
    ///
    /// Records the unlimited total in [`Database::last_total`]: the row
    /// count when no limit applies, otherwise the result of a companion
    /// `COUNT(*)` with the same joins and filter.
    ///
    /// # Errors
    ///
    /// Build errors for unusable identifiers or values, otherwise the
    /// errors of [`Database::query`].
    pub async fn select(&mut self, query: &QuerySpec) -> Result<Vec<Record>> {
        let dialect = B::dialect();
        let sql = query.select_sql(dialect)?;

        // counted first so the select stays the last query
        let counted = if query.limit.is_some() {
            let rows = self.query(&query.count_sql(dialect)?).await?;
            Some(
                rows.first()
                    .and_then(Record::first)
                    .and_then(Scalar::as_i64)
                    .and_then(|n| u64::try_from(n).ok()),
            )
        } else {
            None
        };
        let rows = self.query(&sql).await?;
        let total = counted.unwrap_or_else(|| u64::try_from(rows.len()).ok());
        self.set_last_total(total);
        Ok(rows)
    }

    /// First row matching `filter`, if any, in no particular order.
    ///
    /// # Errors
    ///
    /// Same as [`Database::select`].
    pub async fn get<S: AsRef<str>>(
        &mut self,
        table: &str,
        columns: &[S],
        filter: &Where,
    ) -> Result<Option<Record>> {
        let query = QuerySpec::new(table)
            .columns(columns.iter().map(|c| c.as_ref().to_string()))
            .filter(filter.clone());
        self.first(query).await
    }

    /// First row of `query`, limited to one row.
    ///
    /// Unlike [`Database::select`], a query without an explicit order is
    /// sent unordered. [`Database::last_total`] reports every matching
    /// row.
    ///
    /// # Errors
    ///
    /// Same as [`Database::select`].
    pub async fn first(&mut self, query: QuerySpec) -> Result<Option<Record>> {
        let query = if query.order_by.is_none() {
            query.unordered()
        } else {
            query
        };
        let rows = self.select(&query.limit(Limit::Count(1))).await?;
        Ok(rows.into_iter().next())
    }

    /// Number of rows matching `filter`; `None` if the engine returned a
    /// non-numeric result.
    ///
    /// # Errors
    ///
    /// Same as [`Database::select`].
    pub async fn count(&mut self, table: &str, filter: &Where) -> Result<Option<u64>> {
        let sql = query::count_sql(table, filter, B::dialect())?;
        let rows = self.query(&sql).await?;
        Ok(rows
            .first()
            .and_then(Record::first)
            .and_then(Scalar::as_i64)
            .and_then(|n| u64::try_from(n).ok()))
    }

    /// Sum of `column` over the rows matching `filter`; `None` when no
    /// row matches.
    ///
    /// # Errors
    ///
    /// Same as [`Database::select`].
    pub async fn sum(&mut self, table: &str, column: &str, filter: &Where) -> Result<Option<f64>> {
        let sql = query::sum_sql(table, column, filter, B::dialect())?;
        let rows = self.query(&sql).await?;
        Ok(rows.first().and_then(Record::first).and_then(Scalar::as_f64))
    }

    /// Whether any row matches `filter`; `None` if the count was not
    /// numeric.
    ///
    /// # Errors
    ///
    /// Same as [`Database::select`].
    pub async fn has(&mut self, table: &str, filter: &Where) -> Result<Option<bool>> {
        Ok(self.count(table, filter).await?.map(|n| n > 0))
    }

    /// Inserts a row and returns its id.
    ///
    /// Without an `id` value a time-ordered UUID (v7) is generated, so
    /// ids sort by creation time and are known before the insert.
    ///
    /// # Errors
    ///
    /// Build errors for unusable identifiers, otherwise the errors of
    /// [`Database::execute`], e.g. a duplicate id.
    pub async fn insert(&mut self, table: &str, values: Values) -> Result<String> {
        let mut values = values;
        let id = match values.get("id") {
            Some(id) => id.to_string(),
            None => {
                let id = uuid::Uuid::now_v7().to_string();
                values.prepend("id", id.as_str());
                id
            }
        };
        let sql = query::insert_sql(table, &values, B::dialect())?;
        self.execute(&sql).await?;
        Ok(id)
    }

    /// Updates the rows matching `filter`; returns the affected count.
    ///
    /// # Errors
    ///
    /// Returns a build error when `values` is empty, otherwise the errors
    /// of [`Database::execute`].
    pub async fn update(&mut self, table: &str, values: &Values, filter: &Where) -> Result<u64> {
        let sql = query::update_sql(table, values, filter, B::dialect())?;
        self.execute(&sql).await
    }

    /// Deletes the rows matching `filter`; returns the affected count.
    ///
    /// # Errors
    ///
    /// Same as [`Database::execute`].
    pub async fn delete(&mut self, table: &str, filter: &Where) -> Result<u64> {
        let sql = query::delete_sql(table, filter, B::dialect())?;
        self.execute(&sql).await
    }

    /// Removes every row of `table`.
    ///
    /// # Errors
    ///
    /// Same as [`Database::execute`].
    pub async fn truncate(&mut self, table: &str) -> Result<()> {
        let sql = query::truncate_sql(table, B::dialect())?;
        self.execute(&sql).await?;
        Ok(())
    }

    /// Names of the tables in the current database.
    ///
    /// # Errors
    ///
    /// Same as [`Database::query`].
    pub async fn tables(&mut self) -> Result<Vec<String>> {
        let rows = self.query(B::TABLES_SQL).await?;
        Ok(rows
            .iter()
            .filter_map(|r| r.first().map(ToString::to_string))
            .collect())
    }
}
