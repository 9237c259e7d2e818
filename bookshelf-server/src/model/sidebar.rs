use regex::Regex;

use bookshelf_config::SidebarLinkConfig;

use crate::Error;

/// One navigation entry. `matcher` is always anchored at both ends, so a link
/// is active only when the whole path matches.
#[derive(Debug, Clone)]
pub struct SidebarLink {
    pub href: String,
    pub label: String,
    pub description: String,
    pub icon: String,
    matcher: Regex,
}

impl SidebarLink {
    /// # Errors
    ///
    /// Returns [`Error::InvalidSidebarPattern`] when the match pattern does not
    /// compile.
    pub fn from_config(link: &SidebarLinkConfig) -> Result<Self, Error> {
        let pattern = link
            .pattern
            .as_deref()
            .map_or_else(|| regex::escape(&link.href), str::to_string);

        let matcher = Regex::new(&anchored(&pattern)).map_err(|inner| {
            Error::InvalidSidebarPattern {
                href: link.href.clone(),
                pattern,
                inner,
            }
        })?;

        Ok(Self {
            href: link.href.clone(),
            label: link.label.clone(),
            description: link.description.clone(),
            icon: link.icon.clone(),
            matcher,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    #[must_use]
    pub fn is_active(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

// Always wrapped: `^/|/books$` anchors each alternative at one end only.
fn anchored(pattern: &str) -> String {
    format!("^(?:{pattern})$")
}

/// A link prepared for rendering against one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry<'a> {
    pub href: &'a str,
    pub label: &'a str,
    pub description: &'a str,
    pub icon: &'a str,
    pub active: bool,
}

/// The ordered navigation list, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    links: Vec<SidebarLink>,
}

impl Sidebar {
    /// # Errors
    ///
    /// Fails on the first link whose pattern does not compile.
    pub fn from_config(links: &[SidebarLinkConfig]) -> Result<Self, Error> {
        let links = links
            .iter()
            .map(SidebarLink::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { links })
    }

    #[must_use]
    pub fn links(&self) -> &[SidebarLink] {
        &self.links
    }

    #[must_use]
    pub fn active(&self, path: &str) -> Option<&SidebarLink> {
        self.links.iter().find(|link| link.is_active(path))
    }

    #[must_use]
    pub fn entries(&self, path: &str) -> Vec<NavEntry<'_>> {
        self.links
            .iter()
            .map(|link| NavEntry {
                href: &link.href,
                label: &link.label,
                description: &link.description,
                icon: &link.icon,
                active: link.is_active(path),
            })
            .collect()
    }
}
