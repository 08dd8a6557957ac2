/*!
 * Translation lookup and resolution for base records.
 *
 * - `store`: fetching and memoizing a record's translation rows, and
 *   active-translation checks
 * - `resolver`: translated views with fallback, per-locale attribute maps
 *   and the languages a record is available in
 */

pub use self::resolver::{ActiveLanguage, TranslatedView, TranslationResolver};
pub use self::store::{TranslationSource, TranslationStore};

pub mod resolver;
pub mod store;
