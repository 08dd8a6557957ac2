/*!
 * Locale configuration and lookup.
 *
 * - `registry`: the configured locale list, fallback settings and the
 *   current request locale, passed explicitly to everything that needs them
 */

pub mod registry;

pub use self::registry::{FixedLocale, LocaleConfig, LocaleContext, LocaleRegistry};
