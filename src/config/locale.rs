//! System locale lookup for choosing a connectivity probe URL.

use std::env;

/// Variables consulted in order; the first non-empty one wins.
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Locale of the running process, e.g. `zh_CN.UTF-8`.
///
/// `C` and `POSIX` carry no language and are treated as unset.
#[must_use]
pub fn current_locale() -> Option<String> {
    locale_from_env_values(LOCALE_VARS.iter().map(|name| env::var(name).ok()))
}

/// Pick the locale from candidate variable values in priority order.
pub fn locale_from_env_values<I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    values
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .filter(|value| value != "C" && value != "POSIX" && !value.starts_with("C."))
}
