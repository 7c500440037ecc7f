//! Parameterized statement construction.
//!
//! Identifiers reaching this module have already been resolved against the
//! live schema (or validated as new names); values are always bound, except
//! `NULL`, which is written inline so no untyped parameter is sent.

use crate::coerce::TypedValue;
use crate::ddl::ColumnSpec;
use crate::dialect::{Dialect, SelectParts, SqlDialect};
use crate::join::JoinSpec;
use crate::schema::ColumnInfo;

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<TypedValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<TypedValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// An equality filter on a resolved column.
#[derive(Debug, Clone, Copy)]
pub struct Filter<'a> {
    pub column: &'a ColumnInfo,
    pub value: &'a TypedValue,
}

/// Parameter list under construction, numbering slots as it goes.
struct Params<'d> {
    dialect: &'d dyn SqlDialect,
    values: Vec<TypedValue>,
}

impl<'d> Params<'d> {
    fn new(dialect: &'d dyn SqlDialect) -> Self {
        Self {
            dialect,
            values: Vec::new(),
        }
    }

    /// Marker for a value headed for `column`, or `NULL` inline.
    fn slot(&mut self, value: &TypedValue, column: &ColumnInfo) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        self.values.push(value.clone());
        self.dialect
            .value_slot(self.values.len(), column.data_type.as_deref())
    }

    /// Marker for an untyped text value.
    fn text(&mut self, value: String) -> String {
        self.values.push(TypedValue::Text(value));
        self.dialect.placeholder(self.values.len())
    }
}

/// Builds statements for one dialect.
#[derive(Clone, Copy)]
pub struct SqlBuilder {
    dialect: &'static dyn SqlDialect,
}

impl SqlBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect: dialect.sql(),
        }
    }

    pub fn quote(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }

    fn filter_sql(&self, filter: &Filter<'_>, params: &mut Params<'_>) -> String {
        let column = self.quote(&filter.column.name);
        if filter.value.is_null() {
            format!("{column} IS NULL")
        } else {
            format!("{column} = {}", params.slot(filter.value, filter.column))
        }
    }

    pub fn count(&self, table: &str, filter: Option<&Filter<'_>>) -> Statement {
        let mut params = Params::new(self.dialect);
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.quote(table));
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filter_sql(filter, &mut params));
        }
        Statement::with_params(sql, params.values)
    }

    /// First `limit` rows of a table, optionally filtered.
    pub fn page(&self, table: &str, filter: Option<&Filter<'_>>, limit: u32) -> Statement {
        let mut params = Params::new(self.dialect);
        let from = self.quote(table);
        let filter = filter.map(|f| self.filter_sql(f, &mut params));
        let sql = self.dialect.paginate(
            &SelectParts {
                projection: "*",
                from: &from,
                filter: filter.as_deref(),
            },
            limit,
        );
        Statement::with_params(sql, params.values)
    }

    /// Rows whose `column`, read as text, contains `needle`.
    pub fn search(&self, table: &str, column: &ColumnInfo, needle: &str, limit: u32) -> Statement {
        let mut params = Params::new(self.dialect);
        let from = self.quote(table);
        let target = self.dialect.like_target(&self.quote(&column.name));
        let filter = format!("{target} LIKE {}", params.text(format!("%{needle}%")));
        let sql = self.dialect.paginate(
            &SelectParts {
                projection: "*",
                from: &from,
                filter: Some(&filter),
            },
            limit,
        );
        Statement::with_params(sql, params.values)
    }

    pub fn insert(&self, table: &str, values: &[(&ColumnInfo, &TypedValue)]) -> Statement {
        let mut params = Params::new(self.dialect);
        let columns: Vec<String> = values.iter().map(|(c, _)| self.quote(&c.name)).collect();
        let slots: Vec<String> = values.iter().map(|(c, v)| params.slot(v, c)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote(table),
            columns.join(", "),
            slots.join(", ")
        );
        Statement::with_params(sql, params.values)
    }

    pub fn update(&self, table: &str, assignments: &[(&ColumnInfo, &TypedValue)], filter: &Filter<'_>) -> Statement {
        let mut params = Params::new(self.dialect);
        let set: Vec<String> = assignments
            .iter()
            .map(|(c, v)| format!("{} = {}", self.quote(&c.name), params.slot(v, c)))
            .collect();
        let condition = self.filter_sql(filter, &mut params);
        let sql = format!("UPDATE {} SET {} WHERE {condition}", self.quote(table), set.join(", "));
        Statement::with_params(sql, params.values)
    }

    pub fn delete(&self, table: &str, filter: &Filter<'_>) -> Statement {
        let mut params = Params::new(self.dialect);
        let condition = self.filter_sql(filter, &mut params);
        let sql = format!("DELETE FROM {} WHERE {condition}", self.quote(table));
        Statement::with_params(sql, params.values)
    }

    /// `SELECT t1.*, t2.*` over an equi-join, at most `limit` rows.
    pub fn join(&self, spec: &JoinSpec, kind: JoinKind, limit: u32) -> Statement {
        let from = format!(
            "{} t1 {} {} t2 ON t1.{} = t2.{}",
            self.quote(&spec.left_table),
            kind.keyword(),
            self.quote(&spec.right_table),
            self.quote(&spec.left_key),
            self.quote(&spec.right_key)
        );
        let sql = self.dialect.paginate(
            &SelectParts {
                projection: "t1.*, t2.*",
                from: &from,
                filter: None,
            },
            limit,
        );
        Statement::new(sql)
    }

    pub fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> Statement {
        let definitions: Vec<String> = columns.iter().map(|c| c.definition(self.dialect)).collect();
        Statement::new(format!(
            "CREATE TABLE {} ({})",
            self.quote(table),
            definitions.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::parse_column_specs;

    fn column(name: &str, data_type: Option<&str>) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.map(str::to_string),
        }
    }

    #[test]
    fn insert_binds_values_and_inlines_null() {
        let name = column("name", None);
        let age = column("age", None);
        let note = column("note", None);
        let alice = TypedValue::Text("Alice".into());
        let thirty = TypedValue::Integer(30);
        let statement = SqlBuilder::new(Dialect::Sqlite).insert(
            "users",
            &[(&name, &alice), (&age, &thirty), (&note, &TypedValue::Null)],
        );
        assert_eq!(
            statement.sql,
            "INSERT INTO \"users\" (\"name\", \"age\", \"note\") VALUES (?, ?, NULL)"
        );
        assert_eq!(statement.params, vec![alice, thirty]);
    }

    #[test]
    fn postgres_slots_are_numbered_and_cast() {
        let grade = column("grade", Some("numeric"));
        let id = column("id", Some("int4"));
        let value = TypedValue::Float(9.5);
        let key = TypedValue::Integer(5);
        let statement = SqlBuilder::new(Dialect::PostgreSql).update(
            "students",
            &[(&grade, &value)],
            &Filter { column: &id, value: &key },
        );
        assert_eq!(
            statement.sql,
            "UPDATE \"students\" SET \"grade\" = CAST($1 AS \"numeric\") WHERE \"id\" = CAST($2 AS \"int4\")"
        );
        assert_eq!(statement.params, vec![value, key]);
    }

    #[test]
    fn null_condition_uses_is_null() {
        let email = column("email", None);
        let statement = SqlBuilder::new(Dialect::MySql).delete(
            "users",
            &Filter { column: &email, value: &TypedValue::Null },
        );
        assert_eq!(statement.sql, "DELETE FROM `users` WHERE `email` IS NULL");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn search_binds_wrapped_needle() {
        let name = column("name", Some("varchar"));
        let statement = SqlBuilder::new(Dialect::PostgreSql).search("users", &name, "li", 20);
        assert_eq!(
            statement.sql,
            "SELECT * FROM \"users\" WHERE CAST(\"name\" AS TEXT) LIKE $1 LIMIT 20"
        );
        assert_eq!(statement.params, vec![TypedValue::Text("%li%".into())]);

        let oracle = SqlBuilder::new(Dialect::Oracle).search("USERS", &name, "li", 20);
        assert_eq!(
            oracle.sql,
            "SELECT * FROM \"USERS\" WHERE (\"name\" LIKE :1) AND ROWNUM <= 20"
        );
    }

    #[test]
    fn filtered_page_and_count() {
        let id = column("id", None);
        let key = TypedValue::Integer(3);
        let filter = Filter { column: &id, value: &key };
        let builder = SqlBuilder::new(Dialect::SqlServer);
        assert_eq!(
            builder.page("t", Some(&filter), 5).sql,
            "SELECT TOP 5 * FROM [t] WHERE [id] = @P1"
        );
        assert_eq!(
            builder.count("t", Some(&filter)).sql,
            "SELECT COUNT(*) FROM [t] WHERE [id] = @P1"
        );
        assert_eq!(builder.count("t", None).sql, "SELECT COUNT(*) FROM [t]");
    }

    #[test]
    fn join_statement_uses_aliases() {
        let spec = JoinSpec {
            left_table: "students".into(),
            left_key: "course_id".into(),
            right_table: "courses".into(),
            right_key: "id".into(),
        };
        assert_eq!(
            SqlBuilder::new(Dialect::Sqlite).join(&spec, JoinKind::Inner, 20).sql,
            "SELECT t1.*, t2.* FROM \"students\" t1 INNER JOIN \"courses\" t2 ON t1.\"course_id\" = t2.\"id\" LIMIT 20"
        );
        assert_eq!(
            SqlBuilder::new(Dialect::SqlServer).join(&spec, JoinKind::Left, 20).sql,
            "SELECT TOP 20 t1.*, t2.* FROM [students] t1 LEFT JOIN [courses] t2 ON t1.[course_id] = t2.[id]"
        );
    }

    #[test]
    fn create_table_maps_types() {
        let columns = parse_column_specs("id:id,name:text,active:bool,price:money").unwrap();
        assert_eq!(
            SqlBuilder::new(Dialect::MySql).create_table("products", &columns).sql,
            "CREATE TABLE `products` (`id` INT AUTO_INCREMENT PRIMARY KEY, `name` VARCHAR(255), `active` BOOLEAN, `price` DECIMAL(10,2))"
        );
    }
}
