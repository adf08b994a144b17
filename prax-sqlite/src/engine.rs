//! Filtered finds with select-in population over one SQLite connection.

use std::sync::Arc;

use rusqlite::params_from_iter;
use tokio_rusqlite::Connection;
use tracing::{debug, instrument};

use prax_filter::populate::{PopulationQuery, attach_empty};
use prax_filter::sql::{DatabaseType, SqlBuilder};
use prax_filter::{
    CompileOptions, ConditionTree, EntityRegistry, FindOptions, QueryError, Record, SelectQuery,
};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::SqliteResult;
use crate::types::{filter_value_to_sqlite, json_to_sqlite, row_to_record};

/// SQLite query engine bound to an entity registry.
#[derive(Clone)]
pub struct SqliteEngine {
    conn: Connection,
    registry: Arc<EntityRegistry>,
    options: CompileOptions,
}

impl SqliteEngine {
    /// Open a connection and apply the configured pragmas.
    #[instrument(skip(registry), fields(memory = config.path.is_memory()))]
    pub async fn open(config: SqliteConfig, registry: Arc<EntityRegistry>) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory().await?,
            DatabasePath::File(path) => Connection::open(path.clone()).await?,
        };

        let init = config.init_sql();
        conn.call(move |conn| {
            conn.execute_batch(&init)?;
            Ok(())
        })
        .await?;

        debug!("SQLite connection opened");
        Ok(Self {
            conn,
            registry,
            options: CompileOptions::default(),
        })
    }

    /// Replace the compile options.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Entity metadata used to build queries.
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Compile options in effect.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Run one or more statements without parameters, typically DDL.
    #[instrument(skip(self, sql))]
    pub async fn execute_batch(&self, sql: &str) -> SqliteResult<()> {
        let sql = sql.to_string();
        self.conn
            .call(move |conn| {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Insert a record keyed by column name into the entity's table and
    /// return the new row id.
    #[instrument(skip(self, record), fields(columns = record.len()))]
    pub async fn insert(&self, entity: &str, record: &Record) -> SqliteResult<i64> {
        let meta = self.registry.entity(entity)?;
        if record.is_empty() {
            return Err(QueryError::invalid_filter(entity, "Cannot insert an empty record").into());
        }

        let mut builder = SqlBuilder::sqlite();
        builder.push("INSERT INTO ").push_identifier(meta.table()).push(" (");
        for (i, column) in record.keys().enumerate() {
            if i > 0 {
                builder.push_sep(", ");
            }
            builder.push_identifier(column);
        }
        builder.push(") VALUES (");
        for i in 0..record.len() {
            if i > 0 {
                builder.push_sep(", ");
            }
            builder.push(DatabaseType::SQLite.placeholder(i + 1));
        }
        builder.push(")");

        let sql = builder.sql();
        let params = record
            .iter()
            .map(|(column, value)| json_to_sqlite(column, value))
            .collect::<SqliteResult<Vec<_>>>()?;
        debug!(sql = %sql, "Executing insert");

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(&sql, params_from_iter(params.iter()))?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Find rows of `entity` matching `tree` and the active filters, then
    /// populate the requested relations.
    #[instrument(skip(self, tree, options), fields(populate = ?options.populate))]
    pub async fn find(
        &self,
        entity: &str,
        tree: &ConditionTree,
        options: &FindOptions,
    ) -> SqliteResult<Vec<Record>> {
        let primary = SelectQuery::find(&self.registry, entity, tree, &options.filters, &self.options)?;
        let mut rows = self.query(&primary).await?;

        for relation in &options.populate {
            let plan = PopulationQuery::plan(
                &self.registry,
                entity,
                relation,
                &rows,
                &options.filters,
                &self.options,
            )?;
            match plan {
                Some(plan) => {
                    let children = self.query(plan.query()).await?;
                    debug!(relation = %relation, children = children.len(), "Populated relation");
                    plan.attach(&mut rows, &children);
                }
                None => {
                    let spec = self
                        .registry
                        .entity(entity)?
                        .relation_spec(relation)
                        .ok_or_else(|| QueryError::invalid_populate(entity, relation.as_str()))?;
                    attach_empty(spec, &mut rows);
                }
            }
        }

        Ok(rows)
    }

    /// Run a compiled select and return its rows.
    #[instrument(skip(self, query), fields(entity = query.entity()))]
    pub async fn query(&self, query: &SelectQuery) -> SqliteResult<Vec<Record>> {
        let (sql, params) = query.to_sql(DatabaseType::SQLite);
        let params: Vec<_> = params.iter().map(filter_value_to_sqlite).collect();
        debug!(sql = %sql, params = params.len(), "Executing select");

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
                let rows = stmt.query_map(params_from_iter(params.iter()), |row| row_to_record(row, &columns))?;
                let records: Result<Vec<_>, _> = rows.collect();
                Ok(records?)
            })
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prax_filter::{ActiveFilterSet, EntityMeta, FilterDefinition, FilterValue, RelationSpec};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Record::new(),
        }
    }

    async fn engine() -> SqliteEngine {
        let registry = EntityRegistry::new()
            .register(
                EntityMeta::new("Author", "author")
                    .scalar("name")
                    .column("bannedAt", "banned_at", true)
                    .filter(FilterDefinition::constant(
                        "active",
                        ConditionTree::new().value("bannedAt", FilterValue::Null),
                    )),
            )
            .register(
                EntityMeta::new("Post", "post")
                    .scalar("title")
                    .relation(RelationSpec::many_to_one("author", "Author", "author_id")),
            );
        let engine = SqliteEngine::open(SqliteConfig::memory(), Arc::new(registry)).await.unwrap();
        engine
            .execute_batch(
                "CREATE TABLE author (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, banned_at TEXT);
                 CREATE TABLE post (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL,
                     author_id INTEGER REFERENCES author (id));",
            )
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let engine = engine().await;
        let id = engine.insert("Author", &record(json!({ "name": "Ann" }))).await.unwrap();
        assert_eq!(id, 1);

        let rows = engine.find("Author", &ConditionTree::new(), &FindOptions::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Ann"));
    }

    #[tokio::test]
    async fn test_population_respects_related_filters() {
        let engine = engine().await;
        let ann = engine.insert("Author", &record(json!({ "name": "Ann" }))).await.unwrap();
        let bob = engine
            .insert("Author", &record(json!({ "name": "Bob", "banned_at": "2024-01-01" })))
            .await
            .unwrap();
        engine.insert("Post", &record(json!({ "title": "a", "author_id": ann }))).await.unwrap();
        engine.insert("Post", &record(json!({ "title": "b", "author_id": bob }))).await.unwrap();
        engine.insert("Post", &record(json!({ "title": "c", "author_id": null }))).await.unwrap();

        let options = FindOptions::new()
            .filters(ActiveFilterSet::new().enable("active"))
            .populate("author");
        let rows = engine.find("Post", &ConditionTree::new(), &options).await.unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["author"]["name"], json!("Ann"));
        assert!(rows[1]["author"].is_null());
        assert!(rows[2]["author"].is_null());
    }

    #[tokio::test]
    async fn test_populate_without_keys_sets_null() {
        let engine = engine().await;
        engine.insert("Post", &record(json!({ "title": "c" }))).await.unwrap();

        let rows = engine
            .find("Post", &ConditionTree::new(), &FindOptions::new().populate("author"))
            .await
            .unwrap();
        assert!(rows[0]["author"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_filter_is_reported() {
        let engine = engine().await;
        let options = FindOptions::new().filters(ActiveFilterSet::new().enable("nope"));
        let err = engine.find("Post", &ConditionTree::new(), &options).await.unwrap_err();
        let err: QueryError = err.into();
        assert!(err.is_configuration_error());
    }

    #[tokio::test]
    async fn test_insert_into_missing_table_fails() {
        let engine = SqliteEngine::open(SqliteConfig::memory(), Arc::new(EntityRegistry::new().register(EntityMeta::new("Ghost", "ghost"))))
            .await
            .unwrap();
        let err = engine.insert("Ghost", &record(json!({ "id": 1 }))).await.unwrap_err();
        assert!(matches!(err, crate::error::SqliteError::Sqlite(_)));
    }
}
