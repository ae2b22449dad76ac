//! Deterministic identifier and path transforms.
//!
//! # Examples
//!
//! ```
//! use protoforge_codegen::naming;
//!
//! assert_eq!(naming::to_snake_case("UserProfile"), "user_profile");
//! assert_eq!(naming::to_pascal_case("created_at"), "CreatedAt");
//! assert_eq!(naming::table_name("UserCategory"), "user_categories");
//! ```

/// Converts `CamelCase` or `camelCase` to `snake_case`.
///
/// Runs of capitals are treated as one word, so `HTTPServer` becomes
/// `http_server`.
///
/// # Examples
///
/// ```
/// use protoforge_codegen::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("HTTPServer"), "http_server");
/// assert_eq!(to_snake_case("userID"), "user_id");
/// assert_eq!(to_snake_case("already_snake"), "already_snake");
/// ```
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if (prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower))
                && prev != '_'
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Converts `snake_case` (or `camelCase`) to `PascalCase`.
///
/// # Examples
///
/// ```
/// use protoforge_codegen::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("user_name"), "UserName");
/// assert_eq!(to_pascal_case("userName"), "UserName");
/// assert_eq!(to_pascal_case("id"), "Id");
/// ```
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    s.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// Converts to `camelCase` (lower first letter).
#[must_use]
pub fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

/// Pluralizes an English word with simple suffix rules.
///
/// # Examples
///
/// ```
/// use protoforge_codegen::naming::pluralize;
///
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("day"), "days");
/// assert_eq!(pluralize("box"), "boxes");
/// assert_eq!(pluralize("leaf"), "leaves");
/// assert_eq!(pluralize("user"), "users");
/// ```
#[must_use]
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let before_last = word.chars().rev().nth(1);
    if let Some(stem) = word.strip_suffix('y')
        && !before_last.is_some_and(|c| "aeiou".contains(c.to_ascii_lowercase()))
    {
        return format!("{stem}ies");
    }
    if ["s", "x", "z", "sh", "ch"].iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix("fe") {
        return format!("{stem}ves");
    }
    if let Some(stem) = word.strip_suffix('f') {
        return format!("{stem}ves");
    }
    format!("{word}s")
}

/// Derives a table name: `snake_case` with the last word pluralized.
///
/// # Examples
///
/// ```
/// use protoforge_codegen::naming::table_name;
///
/// assert_eq!(table_name("User"), "users");
/// assert_eq!(table_name("OrderItem"), "order_items");
/// ```
#[must_use]
pub fn table_name(raw_name: &str) -> String {
    let snake = to_snake_case(raw_name);
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{head}_{}", pluralize(last)),
        None => pluralize(&snake),
    }
}

/// Strips each suffix in turn.
///
/// # Examples
///
/// ```
/// use protoforge_codegen::naming::trim_suffixes;
///
/// assert_eq!(trim_suffixes("LoginReq", &["Request", "Req"]), "Login");
/// assert_eq!(trim_suffixes("UserModel", &["Model"]), "User");
/// ```
#[must_use]
pub fn trim_suffixes<'a>(name: &'a str, suffixes: &[&str]) -> &'a str {
    suffixes
        .iter()
        .fold(name, |acc, suffix| acc.strip_suffix(suffix).unwrap_or(acc))
}

/// Last segment of a slash-separated package path.
///
/// # Examples
///
/// ```
/// use protoforge_codegen::naming::package_base;
///
/// assert_eq!(package_base("example.com/app/models/auth"), "auth");
/// assert_eq!(package_base("models"), "models");
/// ```
#[must_use]
pub fn package_base(import_path: &str) -> &str {
    import_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(import_path)
}

/// Joins path segments with `/`, skipping empty and `.` segments.
///
/// # Examples
///
/// ```
/// use protoforge_codegen::naming::join_path;
///
/// assert_eq!(join_path(&["app", "", "models", "."]), "app/models");
/// ```
#[must_use]
pub fn join_path(segments: &[&str]) -> String {
    segments
        .iter()
        .flat_map(|s| s.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_variants() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("UserModel"), "user_model");
        assert_eq!(to_snake_case("APIKey"), "api_key");
        assert_eq!(to_snake_case("getHTTPResponse"), "get_http_response");
        assert_eq!(to_snake_case("Oauth2Token"), "oauth2_token");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn test_pascal_and_camel() {
        assert_eq!(to_pascal_case("deleted_at"), "DeletedAt");
        assert_eq!(to_pascal_case("__x__y"), "XY");
        assert_eq!(to_camel_case("user_name"), "userName");
        assert_eq!(to_camel_case("UserName"), "userName");
    }

    #[test]
    fn test_pluralize_rules() {
        assert_eq!(pluralize("knife"), "knives");
        assert_eq!(pluralize("bus"), "buses");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("dish"), "dishes");
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize(""), "");
    }

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("Category"), "categories");
        assert_eq!(table_name("UserAddress"), "user_addresses");
    }

    #[test]
    fn test_trim_suffixes_is_sequential() {
        assert_eq!(trim_suffixes("LoginRequest", &["Request", "Req"]), "Login");
        assert_eq!(trim_suffixes("Plain", &["Model"]), "Plain");
    }

    #[test]
    fn test_join_path_flattens_nested_segments() {
        assert_eq!(join_path(&["a/b", "c/", "/d"]), "a/b/c/d");
        assert_eq!(join_path(&[".", ""]), "");
    }
}
