/*!
 * Composable, locale-aware queries over the base records of one model.
 *
 * A `RecordQuery` is only a description: every method returns the query so
 * calls can be chained, and nothing touches the database until the query
 * is handed to `Repository::get`, `first` or `count`.
 */

use log::debug;
use rusqlite::types::Value as SqlValue;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::condition::{self, Condition, column};
use crate::database::definitions::{LOCALE_KEY, ModelDefinition};
use crate::database::schema::quote_ident;
use crate::errors::{QueryError, StoreError};
use crate::locale::LocaleRegistry;

/// Alias given to the translation table by grouped orderings
pub const GROUPED_TRANSLATION_ALIAS: &str = "t";

/// Sort direction for orderings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(QueryError::InvalidDirection(s.to_string())),
        }
    }
}

/// Which translation rows are attached to the returned records
#[derive(Debug, Clone, PartialEq)]
pub enum EagerLoad {
    /// Every translation row of each record
    All,
    /// Only rows matching the condition, written against the translation table
    Matching(Condition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
struct Join {
    sql: String,
    params: Vec<SqlValue>,
}

/// A chainable query over one model's base table
#[derive(Debug, Clone)]
pub struct RecordQuery {
    model: Arc<ModelDefinition>,
    locales: LocaleRegistry,
    joins: Vec<Join>,
    wheres: Vec<(Connective, Condition)>,
    groups: Vec<String>,
    orders: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    eager: Option<EagerLoad>,
}

impl RecordQuery {
    /// Start a query selecting every record of the model
    pub fn new(model: Arc<ModelDefinition>, locales: LocaleRegistry) -> Self {
        Self {
            model,
            locales,
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            eager: None,
        }
    }

    /// Model this query reads
    pub fn model(&self) -> &Arc<ModelDefinition> {
        &self.model
    }

    /// Translation rows to attach to each result
    pub fn eager_load(&self) -> Option<&EagerLoad> {
        self.eager.as_ref()
    }

    /// Keep records with a published translation in `locale`
    ///
    /// With fallback enabled, a row in the fallback locale also qualifies,
    /// published or not. The matching rows, and only those, are attached to
    /// the results. Models without translations are left untouched.
    pub fn with_active_translations(mut self, locale: Option<&str>) -> Self {
        let Some(translation) = self.model.translation() else {
            debug!(
                "Model {} has no translations; with_active_translations is a no-op",
                self.model.name
            );
            return self;
        };

        let target = self.locales.resolve_locale(locale);
        let fallback = self.locales.active_fallback();
        let matching = condition::active_translation(&translation.table, &target, fallback);

        debug!(
            "Filtering {} on active translations for '{}' (fallback: {:?})",
            self.model.name, target, fallback
        );

        let relation = Condition::All(vec![
            Condition::raw(
                format!(
                    "{} = {}",
                    column(&translation.table, &translation.foreign_key),
                    column(&self.model.table, &self.model.key_name)
                ),
                Vec::new(),
            ),
            matching.clone(),
        ]);

        self.wheres
            .push((Connective::And, Condition::exists(&translation.table, relation)));
        self.eager = Some(EagerLoad::Matching(matching));
        self
    }

    /// Order records by a translated field
    ///
    /// The join pairs each record with its row in the *current* locale while
    /// the filter keeps rows in the *target* locale, so with a target other
    /// than the current locale nothing matches. All translations are attached.
    pub fn order_by_translation(
        mut self,
        field: &str,
        direction: SortDirection,
        locale: Option<&str>,
    ) -> Result<Self, StoreError> {
        let translation = self.model.require_translation()?;
        translation.require_attribute(field)?;

        let target = self.locales.resolve_locale(locale);
        let current = self.locales.current_locale();

        let join = Join {
            sql: format!(
                "INNER JOIN {tt} ON {fk} = {key} AND {locale} = ?",
                tt = quote_ident(&translation.table),
                fk = column(&translation.table, &translation.foreign_key),
                key = column(&self.model.table, &self.model.key_name),
                locale = column(&translation.table, LOCALE_KEY),
            ),
            params: vec![SqlValue::Text(current)],
        };
        let filter = Condition::eq(column(&translation.table, LOCALE_KEY), target);
        let order = format!("{} {}", column(&translation.table, field), direction);

        self.joins.push(join);
        self.wheres.push((Connective::And, filter));
        self.orders.push(order);
        self.eager = Some(EagerLoad::All);
        Ok(self)
    }

    /// Join translations in `locale`, group by record and a translated field,
    /// then order by a raw SQL expression
    ///
    /// The translation table is aliased `t` so the raw expression can refer
    /// to it. All translations are attached.
    pub fn order_by_raw_grouped_by_translation(
        mut self,
        raw_order: &str,
        group_field: &str,
        locale: Option<&str>,
    ) -> Result<Self, StoreError> {
        let translation = self.model.require_translation()?;
        translation.require_attribute(group_field)?;

        let target = self.locales.resolve_locale(locale);
        let alias = GROUPED_TRANSLATION_ALIAS;

        let join = Join {
            sql: format!(
                "INNER JOIN {tt} AS {alias} ON {fk} = {key}",
                tt = quote_ident(&translation.table),
                alias = quote_ident(alias),
                fk = column(alias, &translation.foreign_key),
                key = column(&self.model.table, &self.model.key_name),
            ),
            params: Vec::new(),
        };

        self.joins.push(join);
        self.wheres
            .push((Connective::And, Condition::eq(column(alias, LOCALE_KEY), target)));
        self.groups
            .push(column(&self.model.table, &self.model.key_name));
        self.groups.push(column(alias, group_field));
        self.orders.push(raw_order.to_string());
        self.eager = Some(EagerLoad::All);
        Ok(self)
    }

    /// Attach all translations to the results
    pub fn with_translations(mut self) -> Self {
        self.eager = Some(EagerLoad::All);
        self
    }

    /// `AND column = value` on a base column
    pub fn where_eq(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self, StoreError> {
        self.model.require_attribute(field)?;
        let condition = Condition::eq(column(&self.model.table, field), value);
        self.wheres.push((Connective::And, condition));
        Ok(self)
    }

    /// `OR column = value` on a base column
    pub fn or_where_eq(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self, StoreError> {
        self.model.require_attribute(field)?;
        let condition = Condition::eq(column(&self.model.table, field), value);
        self.wheres.push((Connective::Or, condition));
        Ok(self)
    }

    /// `AND column IN (values)` on a base column
    pub fn where_in(mut self, field: &str, values: Vec<SqlValue>) -> Result<Self, StoreError> {
        self.model.require_attribute(field)?;
        let condition = Condition::is_in(column(&self.model.table, field), values);
        self.wheres.push((Connective::And, condition));
        Ok(self)
    }

    /// `AND condition` with a caller-built condition
    pub fn where_condition(mut self, condition: Condition) -> Self {
        self.wheres.push((Connective::And, condition));
        self
    }

    /// Order by a base column
    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Result<Self, StoreError> {
        self.model.require_attribute(field)?;
        self.orders
            .push(format!("{} {}", column(&self.model.table, field), direction));
        Ok(self)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// SQL text and bound values selecting the base columns
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let table = quote_ident(&self.model.table);
        let mut sql = format!("SELECT {}.* FROM {}", table, table);
        let mut params = Vec::new();

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.sql);
            params.extend(join.params.iter().cloned());
        }

        for (i, (connective, condition)) in self.wheres.iter().enumerate() {
            sql.push_str(match (i, connective) {
                (0, _) => " WHERE ",
                (_, Connective::And) => " AND ",
                (_, Connective::Or) => " OR ",
            });
            condition.render(&mut sql, &mut params);
        }

        if !self.groups.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.groups.join(", "));
        }

        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.orders.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        (sql, params)
    }

    /// SQL counting the rows this query returns
    pub fn to_count_sql(&self) -> (String, Vec<SqlValue>) {
        let (sql, params) = self.to_sql();
        (format!("SELECT COUNT(*) FROM ({})", sql), params)
    }
}
