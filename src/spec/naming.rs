//! Identifier helpers shared by the parser, validator and templates.

/// Regular English plural of a kind, lower-cased (`Policy` → `policies`).
pub fn regular_plural(kind: &str) -> String {
    let lower = kind.to_lowercase();
    if lower.is_empty() {
        return lower;
    }
    if let Some(stem) = lower.strip_suffix('y') {
        let before = stem.chars().last();
        if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u') | None) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        return format!("{lower}es");
    }
    format!("{lower}s")
}

/// Convert `WidgetSet` or `widget-set` to `widget_set`.
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '.' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            continue;
        }
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).map(|n| n.is_ascii_lowercase()).unwrap_or(false);
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            if !out.is_empty() && !out.ends_with('_') && (prev_lower || (prev_upper && next_lower)) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert `max-size`, `max_size` or `maxSize` to `MaxSize`.
pub fn to_upper_camel(s: &str) -> String {
    s.split(['_', '-', ' ', '.'])
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Convert `max-size` or `MaxSize` to `maxSize`.
pub fn to_lower_camel(s: &str) -> String {
    let upper = to_upper_camel(s);
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub fn is_upper_camel(s: &str) -> bool {
    matches!(s.chars().next(), Some('A'..='Z')) && s.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn is_lower_camel(s: &str) -> bool {
    matches!(s.chars().next(), Some('a'..='z')) && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// RFC 1123 label: lower-case alphanumerics and `-`, not starting or ending with `-`.
pub fn is_dns_label(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 63
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

/// Kubernetes API version such as `v1`, `v2beta1` or `v1alpha3`.
pub fn is_kube_version(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('v') else {
        return false;
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.starts_with('0') {
        return false;
    }
    let tail = &rest[digits.len()..];
    if tail.is_empty() {
        return true;
    }
    let Some(n) = tail
        .strip_prefix("alpha")
        .or_else(|| tail.strip_prefix("beta"))
    else {
        return false;
    };
    !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) && !n.starts_with('0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_forms() {
        assert_eq!(regular_plural("Widget"), "widgets");
        assert_eq!(regular_plural("Policy"), "policies");
        assert_eq!(regular_plural("Gateway"), "gateways");
        assert_eq!(regular_plural("Ingress"), "ingresses");
        assert_eq!(regular_plural("Box"), "boxes");
        assert_eq!(regular_plural("Patch"), "patches");
    }

    #[test]
    fn snake_case() {
        assert_eq!(to_snake_case("Widget"), "widget");
        assert_eq!(to_snake_case("WidgetSet"), "widget_set");
        assert_eq!(to_snake_case("HTTPRoute"), "http_route");
        assert_eq!(to_snake_case("widget-set"), "widget_set");
    }

    #[test]
    fn camel_case() {
        assert_eq!(to_upper_camel("max-size"), "MaxSize");
        assert_eq!(to_upper_camel("replicas"), "Replicas");
        assert_eq!(to_upper_camel("maxSize"), "MaxSize");
        assert_eq!(to_lower_camel("max_size"), "maxSize");
        assert_eq!(to_lower_camel("Image"), "image");
    }

    #[test]
    fn versions() {
        assert!(is_kube_version("v1"));
        assert!(is_kube_version("v2beta1"));
        assert!(is_kube_version("v1alpha3"));
        assert!(!is_kube_version("1"));
        assert!(!is_kube_version("v0"));
        assert!(!is_kube_version("v1gamma1"));
        assert!(!is_kube_version("v1beta"));
    }

    #[test]
    fn dns_labels() {
        assert!(is_dns_label("apps"));
        assert!(is_dns_label("web-tier"));
        assert!(!is_dns_label("Apps"));
        assert!(!is_dns_label("-apps"));
        assert!(!is_dns_label(""));
    }
}
