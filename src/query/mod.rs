/*!
 * Locale-aware query composition.
 *
 * - `condition`: SQL predicates with bound values
 * - `builder`: the chainable `RecordQuery` with translation filters,
 *   joins and orderings
 */

pub use self::builder::{EagerLoad, RecordQuery, SortDirection};
pub use self::condition::Condition;

pub mod builder;
pub mod condition;
