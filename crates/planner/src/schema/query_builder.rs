//! Plan query builder using SeaQuery.
//!
//! Renders a [`QueryPlan`] into SQL with support for:
//! - sparse projections
//! - equality filters
//! - inner joins on filtered relationship subqueries
//! - ordering
//! - preload statements, flattened by relationship path

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use sea_query::{
    Alias, Asterisk, Expr, ExprTrait, MysqlQueryBuilder, Order, PostgresQueryBuilder, Query,
    SelectStatement, SqliteQueryBuilder, Values,
};
use serde::{Deserialize, Serialize};

use super::types::{Preload, QueryPlan};
use crate::plan::SortDirection;

/// SQL dialect to render for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::Mysql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => bail!("unknown SQL dialect '{other}'"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
        })
    }
}

/// A plan rendered to SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedQuery {
    /// Primary statement.
    pub sql: String,

    /// Preload statements, parents before children.
    pub preloads: Vec<RenderedPreload>,
}

/// One preload statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPreload {
    /// Dotted relationship path from the primary resource (`comments.user`).
    pub path: String,
    pub owner_key: String,
    pub related_key: String,
    pub sql: String,
}

/// Query builder for plans.
pub struct PlanQueryBuilder<'a> {
    plan: &'a QueryPlan,
}

impl<'a> PlanQueryBuilder<'a> {
    pub fn new(plan: &'a QueryPlan) -> Self {
        Self { plan }
    }

    /// Build the primary SELECT statement.
    pub fn statement(&self) -> SelectStatement {
        let mut query = Query::select();

        // SELECT fields
        self.add_select_fields(&mut query);

        // FROM base table
        query.from(Alias::new(&self.plan.table));

        // JOINs
        self.add_joins(&mut query);

        // WHERE conditions
        self.add_filters(&mut query);

        // ORDER BY
        self.add_sorts(&mut query);

        query
    }

    /// Render the primary statement with inlined values.
    pub fn build(&self, dialect: Dialect) -> String {
        let query = self.statement();
        match dialect {
            Dialect::Postgres => query.to_string(PostgresQueryBuilder),
            Dialect::Mysql => query.to_string(MysqlQueryBuilder),
            Dialect::Sqlite => query.to_string(SqliteQueryBuilder),
        }
    }

    /// Render the primary statement with placeholders and bound values.
    pub fn build_parameterized(&self, dialect: Dialect) -> (String, Values) {
        let query = self.statement();
        match dialect {
            Dialect::Postgres => query.build(PostgresQueryBuilder),
            Dialect::Mysql => query.build(MysqlQueryBuilder),
            Dialect::Sqlite => query.build(SqliteQueryBuilder),
        }
    }

    /// Render the primary statement and every preload beneath it.
    pub fn render(&self, dialect: Dialect) -> RenderedQuery {
        let mut preloads = Vec::new();
        collect_preloads(&self.plan.preloads, "", dialect, &mut preloads);
        RenderedQuery {
            sql: self.build(dialect),
            preloads,
        }
    }

    fn add_select_fields(&self, query: &mut SelectStatement) {
        if self.plan.columns.is_empty() {
            query.column((Alias::new(&self.plan.table), Asterisk));
        } else {
            for column in &self.plan.columns {
                query.column((Alias::new(&self.plan.table), Alias::new(column)));
            }
        }
    }

    fn add_joins(&self, query: &mut SelectStatement) {
        for join in &self.plan.joins {
            let on_condition = Expr::col((
                Alias::new(&self.plan.table),
                Alias::new(&join.owner_key),
            ))
            .equals((Alias::new(&join.alias), Alias::new(&join.related_key)));

            let mut subquery = PlanQueryBuilder::new(&join.plan).statement();
            if join.distinct {
                subquery.distinct();
            }

            query.join_subquery(
                sea_query::JoinType::InnerJoin,
                subquery,
                Alias::new(&join.alias),
                on_condition,
            );
        }
    }

    fn add_filters(&self, query: &mut SelectStatement) {
        for filter in &self.plan.filters {
            query.and_where(
                Expr::col((Alias::new(&self.plan.table), Alias::new(&filter.field)))
                    .eq(filter.value.as_str()),
            );
        }
    }

    fn add_sorts(&self, query: &mut SelectStatement) {
        for sort in &self.plan.sorts {
            let order = match sort.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            query.order_by(
                (Alias::new(&self.plan.table), Alias::new(&sort.field)),
                order,
            );
        }
    }
}

fn collect_preloads(
    preloads: &[Preload],
    parent_path: &str,
    dialect: Dialect,
    out: &mut Vec<RenderedPreload>,
) {
    for preload in preloads {
        let path = if parent_path.is_empty() {
            preload.name.clone()
        } else {
            format!("{parent_path}.{}", preload.name)
        };
        out.push(RenderedPreload {
            path: path.clone(),
            owner_key: preload.owner_key.clone(),
            related_key: preload.related_key.clone(),
            sql: PlanQueryBuilder::new(&preload.plan).build(dialect),
        });
        collect_preloads(&preload.plan.preloads, &path, dialect, out);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::types::{PlanJoin, PlanSort};

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn empty_projection_selects_all() {
        let sql = PlanQueryBuilder::new(&QueryPlan::new("articles")).build(Dialect::Postgres);
        assert_eq!(sql, r#"SELECT "articles".* FROM "articles""#);
    }

    #[test]
    fn projection_and_filters() {
        let plan = QueryPlan::new("articles")
            .with_columns(columns(&["id", "title"]))
            .with_filter("tag", "animals");
        let sql = PlanQueryBuilder::new(&plan).build(Dialect::Postgres);

        assert!(sql.contains(r#"SELECT "articles"."id", "articles"."title""#));
        assert!(sql.contains(r#"WHERE "articles"."tag" = 'animals'"#));
    }

    #[test]
    fn sorts_keep_order() {
        let plan = QueryPlan::new("articles").with_sorts(vec![
            PlanSort {
                field: "category".to_string(),
                direction: SortDirection::Asc,
            },
            PlanSort {
                field: "published".to_string(),
                direction: SortDirection::Desc,
            },
        ]);
        let sql = PlanQueryBuilder::new(&plan).build(Dialect::Postgres);
        assert!(
            sql.contains(r#"ORDER BY "articles"."category" ASC, "articles"."published" DESC"#),
            "unexpected sql: {sql}"
        );
    }

    #[test]
    fn join_uses_filtered_subquery() {
        let author = QueryPlan::new("people").with_filter("has_bio", "1");
        let plan = QueryPlan::new("articles").with_join(PlanJoin {
            alias: "author".to_string(),
            owner_key: "author_id".to_string(),
            related_key: "id".to_string(),
            distinct: false,
            plan: author,
        });
        let sql = PlanQueryBuilder::new(&plan).build(Dialect::Postgres);

        assert!(sql.contains(r#"INNER JOIN (SELECT "people".*"#), "unexpected sql: {sql}");
        assert!(sql.contains(r#"WHERE "people"."has_bio" = '1') AS "author""#));
        assert!(sql.contains(r#"ON "articles"."author_id" = "author"."id""#));
    }

    #[test]
    fn distinct_join_subquery() {
        let comments = QueryPlan::new("comments")
            .with_columns(columns(&["article_id"]))
            .with_filter("body", "Great");
        let plan = QueryPlan::new("articles").with_join(PlanJoin {
            alias: "comments".to_string(),
            owner_key: "id".to_string(),
            related_key: "article_id".to_string(),
            distinct: true,
            plan: comments,
        });
        let sql = PlanQueryBuilder::new(&plan).build(Dialect::Postgres);

        assert!(
            sql.contains(r#"INNER JOIN (SELECT DISTINCT "comments"."article_id" FROM "comments""#),
            "unexpected sql: {sql}"
        );
    }

    #[test]
    fn parameterized_build_binds_values() {
        let plan = QueryPlan::new("articles").with_filter("tag", "animals");
        let (sql, values) = PlanQueryBuilder::new(&plan).build_parameterized(Dialect::Postgres);
        assert!(sql.contains("$1"));
        assert_eq!(values.0.len(), 1);
    }

    #[test]
    fn mysql_quotes_with_backticks() {
        let sql = PlanQueryBuilder::new(&QueryPlan::new("articles")).build(Dialect::Mysql);
        assert_eq!(sql, "SELECT `articles`.* FROM `articles`");
    }

    #[test]
    fn preloads_flatten_with_paths() {
        let user = QueryPlan::new("people");
        let comments = QueryPlan::new("comments").with_preload(Preload {
            name: "user".to_string(),
            owner_key: "user_id".to_string(),
            related_key: "id".to_string(),
            plan: user,
        });
        let plan = QueryPlan::new("articles").with_preload(Preload {
            name: "comments".to_string(),
            owner_key: "id".to_string(),
            related_key: "article_id".to_string(),
            plan: comments,
        });

        let rendered = PlanQueryBuilder::new(&plan).render(Dialect::Postgres);
        let paths: Vec<&str> = rendered.preloads.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["comments", "comments.user"]);
        assert!(rendered.preloads[1].sql.contains(r#"FROM "people""#));
    }

    #[test]
    fn dialect_parsing() {
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!(" MySQL ".parse::<Dialect>().unwrap(), Dialect::Mysql);
        assert!("oracle".parse::<Dialect>().is_err());
        assert_eq!(Dialect::Sqlite.to_string(), "sqlite");
    }
}
