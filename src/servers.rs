//! IMAP server discovery from mailbox domains.
//!
//! The watcher only needs a hostname to connect to; most users only know
//! their email address. This module maps the domain of a mailbox address to
//! the provider's IMAP hostname, with a `imap.{domain}` fallback for domains
//! it has never heard of.
//!
//! # Example
//!
//! ```
//! use otp_watch::servers::ServerRegistry;
//!
//! let registry = ServerRegistry::with_defaults();
//! assert_eq!(registry.discover("user@gmail.com"), "imap.gmail.com");
//!
//! // Corporate overrides win over the built-in table
//! let mut registry = ServerRegistry::with_defaults();
//! registry.register("mycompany.com", "mail.internal.mycompany.com");
//! assert_eq!(registry.discover("user@mycompany.com"), "mail.internal.mycompany.com");
//! ```

use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;

/// Built-in domain to IMAP hostname table for common providers.
static DEFAULT_SERVERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("gmail.com", "imap.gmail.com"),
        ("googlemail.com", "imap.gmail.com"),
        ("yahoo.com", "imap.mail.yahoo.com"),
        ("hotmail.com", "imap-mail.outlook.com"),
        ("outlook.com", "imap-mail.outlook.com"),
        ("live.com", "imap-mail.outlook.com"),
        ("aol.com", "imap.aol.com"),
        ("icloud.com", "imap.mail.me.com"),
        ("me.com", "imap.mail.me.com"),
        ("mac.com", "imap.mail.me.com"),
        ("gmx.de", "imap.gmx.net"),
        ("gmx.net", "imap.gmx.net"),
        ("gmx.com", "imap.gmx.net"),
        ("web.de", "imap.web.de"),
        ("mail.ru", "imap.mail.ru"),
        ("yandex.ru", "imap.yandex.ru"),
        ("yandex.com", "imap.yandex.ru"),
    ])
});

/// A customizable registry mapping mailbox domains to IMAP hostnames.
///
/// Resolution order is custom mappings first, then the built-in table (if
/// enabled), then the `imap.{domain}` fallback. Domain lookups are
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    custom: HashMap<String, String>,
    use_defaults: bool,
}

impl ServerRegistry {
    /// Creates an empty registry without the built-in table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that includes the built-in provider table.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            custom: HashMap::new(),
            use_defaults: true,
        }
    }

    /// Registers a custom domain mapping, overriding any built-in entry.
    pub fn register(&mut self, domain: impl Into<String>, imap_host: impl Into<String>) {
        self.custom
            .insert(domain.into().to_lowercase(), imap_host.into());
    }

    /// Registers several domain mappings at once.
    pub fn register_many<I, D, H>(&mut self, mappings: I)
    where
        I: IntoIterator<Item = (D, H)>,
        D: Into<String>,
        H: Into<String>,
    {
        for (domain, host) in mappings {
            self.register(domain, host);
        }
    }

    /// Resolves the IMAP hostname for a mailbox address.
    #[must_use]
    pub fn discover(&self, mailbox: &str) -> Cow<'_, str> {
        let domain = mailbox.split('@').nth(1).unwrap_or(mailbox).to_lowercase();

        if let Some(host) = self.custom.get(&domain) {
            return Cow::Borrowed(host);
        }

        if self.use_defaults {
            if let Some(&host) = DEFAULT_SERVERS.get(domain.as_str()) {
                return Cow::Borrowed(host);
            }
        }

        Cow::Owned(format!("imap.{domain}"))
    }

    /// Returns `true` if the domain resolves without the fallback.
    #[must_use]
    pub fn is_known(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.custom.contains_key(&domain)
            || (self.use_defaults && DEFAULT_SERVERS.contains_key(domain.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_providers() {
        let registry = ServerRegistry::with_defaults();
        assert_eq!(registry.discover("user@gmail.com"), "imap.gmail.com");
        assert_eq!(registry.discover("user@hotmail.com"), "imap-mail.outlook.com");
        assert_eq!(registry.discover("user@icloud.com"), "imap.mail.me.com");
    }

    #[test]
    fn test_unknown_domain_fallback() {
        let registry = ServerRegistry::with_defaults();
        assert_eq!(registry.discover("user@example.org"), "imap.example.org");
    }

    #[test]
    fn test_empty_registry_fallback() {
        let registry = ServerRegistry::new();
        assert!(!registry.is_known("gmail.com"));
        assert_eq!(registry.discover("user@gmail.com"), "imap.gmail.com");
    }

    #[test]
    fn test_custom_mapping_overrides_builtin() {
        let mut registry = ServerRegistry::with_defaults();
        registry.register("gmail.com", "gmail-proxy.internal");
        assert_eq!(registry.discover("user@gmail.com"), "gmail-proxy.internal");
    }

    #[test]
    fn test_register_many() {
        let mut registry = ServerRegistry::new();
        registry.register_many([
            ("corp.com", "mail.corp.internal"),
            ("partner.org", "imap.partner.org"),
        ]);
        assert_eq!(registry.discover("a@corp.com"), "mail.corp.internal");
        assert_eq!(registry.discover("b@partner.org"), "imap.partner.org");
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut registry = ServerRegistry::new();
        registry.register("MyCompany.COM", "mail.mycompany.com");
        assert!(registry.is_known("MYCOMPANY.com"));
        assert_eq!(registry.discover("user@MyCompany.com"), "mail.mycompany.com");
    }
}
