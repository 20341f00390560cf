//! Identifier case conversion and singularization

/// Convert camelCase, snake_case or kebab-case to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper_next = true;

    for ch in s.chars() {
        if ch == '_' || ch == '-' || ch == ' ' || ch == '.' {
            upper_next = true;
        } else if upper_next {
            result.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            result.push(ch);
        }
    }

    result
}

/// Convert PascalCase or camelCase to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            // Break before an uppercase letter that follows a lowercase letter or digit,
            // or that starts a new word inside an acronym (HTTPServer -> http_server)
            let should_add_underscore = i > 0
                && (chars[i - 1].is_lowercase()
                    || chars[i - 1].is_ascii_digit()
                    || (i + 1 < chars.len() && chars[i + 1].is_lowercase()));

            if should_add_underscore && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else if ch == '-' || ch == ' ' || ch == '.' || ch == '/' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
        } else {
            result.push(ch);
        }
    }

    while result.contains("__") {
        result = result.replace("__", "_");
    }

    result.trim_matches('_').to_string()
}

/// Best-effort English singular of a segment name
///
/// Only the plural forms common in REST resource names are handled.
pub fn singularize(s: &str) -> String {
    let lower = s.to_lowercase();

    if lower.ends_with("ies") && s.len() > 3 {
        return format!("{}y", &s[..s.len() - 3]);
    }
    if (lower.ends_with("sses") || lower.ends_with("xes") || lower.ends_with("ches"))
        && s.len() > 3
    {
        return s[..s.len() - 2].to_string();
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && s.len() > 1 {
        return s[..s.len() - 1].to_string();
    }

    s.to_string()
}

/// Return `base`, or `base` followed by the first free numeric suffix
pub fn unique_name<F>(base: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !taken(base) {
        return base.to_string();
    }

    let mut index = 1;
    loop {
        let candidate = format!("{}{}", base, index);
        if !taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}
