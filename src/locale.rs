//! Localisation as an explicit dependency of text flows.
//!
//! Flows never read a global "current locale". They receive a [`Localiser`]
//! on every update and learn about locale switches through a
//! [`LocaleSubscription`] obtained from the [`LocaleNotifier`] that owns the
//! locale.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Text that may need translating before layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocalisableText {
    Literal(String),
    Key { key: String, fallback: String },
}

impl LocalisableText {
    pub fn key(key: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self::Key {
            key: key.into(),
            fallback: fallback.into(),
        }
    }

    /// Resolves through `localiser`, using the fallback for unknown keys.
    pub fn resolve(&self, localiser: &dyn Localiser) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Key { key, fallback } => {
                localiser.resolve(key).unwrap_or_else(|| fallback.clone())
            }
        }
    }
}

impl From<String> for LocalisableText {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl From<&str> for LocalisableText {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_owned())
    }
}

/// Looks up translated strings for the current locale.
pub trait Localiser {
    fn resolve(&self, key: &str) -> Option<String>;
}

/// Localiser that never translates anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLocalisation;

impl Localiser for NoLocalisation {
    fn resolve(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Table-backed localiser keyed by locale name.
#[derive(Clone, Debug, Default)]
pub struct MapLocaliser {
    locale: String,
    strings: HashMap<(String, String), String, fxhash::FxBuildHasher>,
    notifier: LocaleNotifier,
}

impl MapLocaliser {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ..Default::default()
        }
    }

    pub fn insert(&mut self, locale: &str, key: &str, text: impl Into<String>) {
        self.strings
            .insert((locale.to_owned(), key.to_owned()), text.into());
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Switches locale and notifies subscribers if it actually changed.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        let locale = locale.into();
        if self.locale != locale {
            log::debug!("locale changed from {} to {}", self.locale, locale);
            self.locale = locale;
            self.notifier.notify();
        }
    }

    pub fn notifier(&self) -> &LocaleNotifier {
        &self.notifier
    }
}

impl Localiser for MapLocaliser {
    fn resolve(&self, key: &str) -> Option<String> {
        self.strings
            .get(&(self.locale.clone(), key.to_owned()))
            .cloned()
    }
}

/// Broadcasts locale switches to any number of subscriptions.
#[derive(Clone, Debug, Default)]
pub struct LocaleNotifier {
    generation: Arc<AtomicU64>,
}

impl LocaleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }

    pub fn subscribe(&self) -> LocaleSubscription {
        LocaleSubscription {
            generation: Arc::clone(&self.generation),
            seen: self.generation.load(Ordering::Acquire),
        }
    }
}

/// Receiving end of a [`LocaleNotifier`].
#[derive(Debug)]
pub struct LocaleSubscription {
    generation: Arc<AtomicU64>,
    seen: u64,
}

impl LocaleSubscription {
    /// Returns `true` once per batch of notifications since the last call.
    pub fn take_changed(&mut self) -> bool {
        let current = self.generation.load(Ordering::Acquire);
        std::mem::replace(&mut self.seen, current) != current
    }
}
