//! Identifier derivation for projects.
//!
//! The slug is the join key between a registry record, its plugin entry, its
//! navbar item, and its sidebar file, so every derivation here must be
//! deterministic.

/// Lower-case the title, collapse every run of characters outside
/// `[a-z0-9]` into a single `-`, and strip leading/trailing hyphens.
///
/// ```
/// assert_eq!(docupilot::slug::generate_slug("Tesla RHBme"), "tesla-rhbme");
/// ```
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// camelCase the hyphen-separated words of a slug and append `Sidebar`.
pub fn sidebar_id(slug: &str) -> String {
    let mut id = String::with_capacity(slug.len() + 7);
    for (i, word) in slug.split('-').enumerate() {
        if i == 0 {
            id.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            id.extend(first.to_uppercase());
            id.push_str(chars.as_str());
        }
    }
    id.push_str("Sidebar");
    id
}

/// Best-effort display title for a slug with no registry record.
pub fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_examples() {
        assert_eq!(generate_slug("Tesla RHBme"), "tesla-rhbme");
        assert_eq!(generate_slug("UBEDA AFB"), "ubeda-afb");
        assert_eq!(generate_slug("My Cool Project"), "my-cool-project");
    }

    #[test]
    fn test_slug_collapses_and_trims() {
        assert_eq!(generate_slug("  --Hello,   World!!  "), "hello-world");
        assert_eq!(generate_slug("a__b..c"), "a-b-c");
        assert_eq!(generate_slug("Try Test 1"), "try-test-1");
    }

    #[test]
    fn test_slug_drops_non_ascii() {
        assert_eq!(generate_slug("Café Déjà"), "caf-d-j");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_sidebar_id() {
        assert_eq!(sidebar_id("tesla-rhbme"), "teslaRhbmeSidebar");
        assert_eq!(sidebar_id("ubeda-afb"), "ubedaAfbSidebar");
        assert_eq!(sidebar_id("try-test-1"), "tryTest1Sidebar");
        assert_eq!(sidebar_id("solo"), "soloSidebar");
    }

    #[test]
    fn test_title_from_slug() {
        assert_eq!(title_from_slug("my-cool-project"), "My Cool Project");
        assert_eq!(title_from_slug("x"), "X");
    }
}
