//! Navigation

use std::{fmt, str::FromStr};

use thiserror::Error;
use tracing::debug;

use crate::recommendations::{ProductEntry, RecommendationSession};

/// Unknown route
#[derive(Debug, Error, PartialEq, Eq)]
#[error("No screen at path {0}")]
pub struct UnknownPath(pub String);

/// A logical screen of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Sign-in form
    Login,

    /// Registration form
    SignUp,

    /// Product entry and browsing
    Home,

    /// Cart contents
    Cart,

    /// Budget, spending and impact overview
    Dashboard,

    /// Favorites
    Saved,

    /// Sustainability tips
    Tips,
}

/// Screens linked from the sidebar, in display order.
pub const SIDEBAR: [(Screen, &str); 3] = [
    (Screen::Home, "Home"),
    (Screen::Dashboard, "Dashboard"),
    (Screen::Tips, "Sustainability Tips"),
];

impl Screen {
    /// Every screen.
    pub const ALL: [Self; 7] = [
        Self::Login,
        Self::SignUp,
        Self::Home,
        Self::Cart,
        Self::Dashboard,
        Self::Saved,
        Self::Tips,
    ];

    /// Route path.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::SignUp => "/signup",
            Self::Home => "/",
            Self::Cart => "/cart",
            Self::Dashboard => "/dashboard",
            Self::Saved => "/saved",
            Self::Tips => "/tips",
        }
    }

    /// Screen for a route path.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|screen| screen.path() == path)
    }

    /// Whether the sidebar is shown alongside this screen.
    pub const fn shows_sidebar(self) -> bool {
        !matches!(self, Self::Login | Self::SignUp)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Screen {
    type Err = UnknownPath;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        Self::from_path(path).ok_or_else(|| UnknownPath(path.to_string()))
    }
}

/// Current screen plus the transient state owned by Home.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Screen,
    entry: ProductEntry,
    session: RecommendationSession,
}

impl Navigator {
    /// Start on `screen`.
    pub fn new(screen: Screen) -> Self {
        Self {
            current: screen,
            entry: ProductEntry::default(),
            session: RecommendationSession::default(),
        }
    }

    /// Screen on show
    pub fn current(&self) -> Screen {
        self.current
    }

    /// Move to `to`. Leaving Home drops its inputs, results and pending
    /// lookups; replies that arrive afterwards are discarded.
    pub fn go(&mut self, to: Screen) -> Screen {
        if self.current == Screen::Home && to != Screen::Home {
            self.entry.reset();
            self.session.leave();
        }

        debug!(from = %self.current, %to, "navigated");

        self.current = to;

        to
    }

    /// Product-entry flow on Home
    pub fn entry(&self) -> &ProductEntry {
        &self.entry
    }

    /// Mutable product-entry flow on Home
    pub fn entry_mut(&mut self) -> &mut ProductEntry {
        &mut self.entry
    }

    /// Browsing session on Home
    pub fn session(&self) -> &RecommendationSession {
        &self.session
    }

    /// Mutable browsing session on Home
    pub fn session_mut(&mut self) -> &mut RecommendationSession {
        &mut self.session
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Screen::Login)
    }
}
