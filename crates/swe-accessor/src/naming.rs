//! Implicit mapping from accessor method names to component names.
//!
//! A method maps to a root-level component when the two names are equal
//! ignoring ASCII case and underscores, either as written or after dropping
//! the verb prefix. The full name is tried first so `num_samples` finds a
//! field of that name before the `samples` array. Collection methods
//! (`add_*`, element getters) also match the plural form, so `add_sample`
//! finds an array named `samples`.

use swe_common::DataComponent;

/// Verb prefixes, longest first so `set_num_` wins over `set_`.
const PREFIXES: &[&str] = &["set_num_", "get_num_", "num_", "get_", "set_", "add_", "is_"];

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// The method name without its verb prefix.
pub fn strip_verb(method: &str) -> &str {
    PREFIXES
        .iter()
        .find_map(|prefix| method.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(method)
}

/// Path of the root-level component `method` refers to.
///
/// A scalar root is addressed by its own name and resolves to the empty
/// path.
pub fn implicit_path(root: &DataComponent, method: &str) -> Option<String> {
    let exact = normalize(method);
    let wanted = normalize(strip_verb(method));
    if root.is_scalar() {
        let name = normalize(root.name());
        return (name == exact || name == wanted).then(String::new);
    }

    let children = root.children();
    let plural = format!("{}s", wanted);
    let found = [exact.as_str(), wanted.as_str(), plural.as_str()]
        .into_iter()
        .find_map(|candidate| children.iter().find(|c| normalize(c.name()) == candidate))
        .map(|c| c.name().to_string());
    found
}
