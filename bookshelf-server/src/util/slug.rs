const FALLBACK_SLUG: &str = "user";

/// Turns an account name or e-mail address into a lowercase, URL-safe slug.
///
/// ASCII letters and digits are kept, every other run of characters becomes a
/// single `-`, and the result never starts or ends with `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn lowercases_and_keeps_alphanumerics() {
        assert_eq!(slugify("OctoCat42"), "octocat42");
    }

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("jane.doe@example.com"), "jane-doe-example-com");
        assert_eq!(slugify("  Mary   Shelley__"), "mary-shelley");
        assert_eq!(slugify("--a--b--"), "a-b");
    }

    #[test]
    fn drops_non_ascii() {
        assert_eq!(slugify("Zoë Brontë"), "zo-bront");
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(slugify(""), "user");
        assert_eq!(slugify("!!!"), "user");
    }
}
