/*!
 * SQL predicates used by the query composer.
 *
 * Conditions render into SQL text with positional `?` placeholders and
 * append their bound values in the same order the placeholders appear.
 */

use rusqlite::types::Value as SqlValue;

use crate::database::definitions::{ACTIVE_KEY, LOCALE_KEY};
use crate::database::schema::quote_ident;

/// Qualified, quoted column reference: `"table"."column"`
pub fn column(table: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(table), quote_ident(name))
}

/// A boolean SQL expression with its bound values
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = ?`
    Eq { column: String, value: SqlValue },
    /// `column IN (?, ...)`; an empty list matches nothing
    In { column: String, values: Vec<SqlValue> },
    /// Every condition holds; an empty list matches everything
    All(Vec<Condition>),
    /// At least one condition holds; an empty list matches nothing
    Any(Vec<Condition>),
    /// Raw SQL fragment with its own placeholders
    Raw { sql: String, params: Vec<SqlValue> },
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Condition::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn is_in(column: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Condition::In {
            column: column.into(),
            values,
        }
    }

    pub fn raw(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            params,
        }
    }

    /// `EXISTS (SELECT 1 FROM table WHERE condition)`
    pub fn exists(table: &str, condition: Condition) -> Self {
        let mut params = Vec::new();
        let mut sql = format!("EXISTS (SELECT 1 FROM {} WHERE ", quote_ident(table));
        condition.render(&mut sql, &mut params);
        sql.push(')');
        Condition::Raw { sql, params }
    }

    /// Render the condition, appending bound values to `params`
    pub fn render(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        match self {
            Condition::Eq { column, value } => {
                sql.push_str(column);
                sql.push_str(" = ?");
                params.push(value.clone());
            }
            Condition::In { column, values } => {
                if values.is_empty() {
                    sql.push_str("0 = 1");
                    return;
                }
                sql.push_str(column);
                sql.push_str(" IN (");
                sql.push_str(&vec!["?"; values.len()].join(", "));
                sql.push(')');
                params.extend(values.iter().cloned());
            }
            Condition::All(conditions) => render_group(conditions, " AND ", "1 = 1", sql, params),
            Condition::Any(conditions) => render_group(conditions, " OR ", "0 = 1", sql, params),
            Condition::Raw { sql: fragment, params: bound } => {
                sql.push_str(fragment);
                params.extend(bound.iter().cloned());
            }
        }
    }

    /// Render into a fresh string
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.render(&mut sql, &mut params);
        (sql, params)
    }
}

fn render_group(
    conditions: &[Condition],
    separator: &str,
    empty: &str,
    sql: &mut String,
    params: &mut Vec<SqlValue>,
) {
    if conditions.is_empty() {
        sql.push_str(empty);
        return;
    }

    sql.push('(');
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            sql.push_str(separator);
        }
        condition.render(sql, params);
    }
    sql.push(')');
}

/// Rows that are published in `locale`, or that are in the fallback locale
///
/// The fallback branch does not look at the active flag.
pub fn active_translation(table: &str, locale: &str, fallback: Option<&str>) -> Condition {
    let exact = Condition::All(vec![
        Condition::eq(column(table, ACTIVE_KEY), 1_i64),
        Condition::eq(column(table, LOCALE_KEY), locale.to_string()),
    ]);

    match fallback {
        Some(fallback) => Condition::Any(vec![
            exact,
            Condition::eq(column(table, LOCALE_KEY), fallback.to_string()),
        ]),
        None => exact,
    }
}
