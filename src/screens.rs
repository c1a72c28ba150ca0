use std::{collections::BTreeMap, path::Path};

use crate::{config::ConfigError, models::RouteClass};

/// ScreenTable
///
/// Static mapping from screen name to the route class that gates it. This is
/// configuration, not session state: the guard reads it, nothing writes it after startup.
///
/// The default table mirrors the mobile app's navigation: the login screen and the
/// guest-browsable tabs are public, the marketplace and "more" tabs need a member
/// session, and everything under `executive/` needs an executive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenTable {
    screens: BTreeMap<String, RouteClass>,
}

impl Default for ScreenTable {
    fn default() -> Self {
        Self::from_pairs([
            ("auth/login", RouteClass::Public),
            ("home", RouteClass::Public),
            ("events", RouteClass::Public),
            ("clubs", RouteClass::Public),
            ("marketplace", RouteClass::Member),
            ("more", RouteClass::Member),
            ("executive/dashboard", RouteClass::Executive),
            ("executive/cheque-requisition", RouteClass::Executive),
            ("executive/document-uploads", RouteClass::Executive),
            ("executive/voting", RouteClass::Executive),
            ("executive/room-booking", RouteClass::Executive),
            ("executive/admin-panel", RouteClass::Executive),
        ])
    }
}

impl ScreenTable {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, RouteClass)>) -> Self {
        Self {
            screens: pairs
                .into_iter()
                .map(|(screen, class)| (normalize(screen), class))
                .collect(),
        }
    }

    /// from_json_file
    ///
    /// Loads a table from a JSON object of `"screen": "route_class"` pairs. An unknown
    /// route class name is rejected by serde at load time.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let screens: BTreeMap<String, RouteClass> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            screens: screens
                .into_iter()
                .map(|(screen, class)| (normalize(&screen), class))
                .collect(),
        })
    }

    pub fn class_of(&self, screen: &str) -> Option<RouteClass> {
        self.screens.get(&normalize(screen)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RouteClass)> {
        self.screens.iter().map(|(screen, class)| (screen.as_str(), *class))
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

// "/executive/voting/" and "executive/voting" name the same screen.
fn normalize(screen: &str) -> String {
    screen.trim().trim_matches('/').to_string()
}
