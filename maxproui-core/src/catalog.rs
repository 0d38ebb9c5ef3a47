//! Special menu catalog
//!
//! Entries keep their declaration order for paging. Lookup goes through a
//! map from the normalized key (`<name>`, lowercased) to the entry index;
//! a later declaration with the same key takes over the lookup slot while
//! the earlier one stays listed.

use alloc::string::String;
use heapless::FnvIndexMap;
use maxproui_protocol::{truncate_label, FULL_LABEL_LEN};

use crate::config::MenuItemConfig;

/// Maximum special menu entries
pub const MAX_MENU_ENTRIES: usize = 32;

/// Maximum normalized key length, angle brackets included
pub const MAX_MENU_KEY_LEN: usize = 48;

/// Selecting this key opens the special menu
pub const SPECIAL_MENU_KEY: &str = "<special_menu>";

/// Selecting this key leaves the special menu
pub const EXIT_KEY: &str = "<exit>";

/// Label shown next to [`SPECIAL_MENU_KEY`] in the storage listing
pub const SPECIAL_MENU_LABEL: &str = "Special Menu";

/// Normalized lookup key
pub type MenuKey = heapless::String<MAX_MENU_KEY_LEN>;

/// Catalog construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// More than [`MAX_MENU_ENTRIES`] entries
    TooManyEntries,
    /// Name does not fit in a [`MenuKey`]
    NameTooLong,
    /// Name is empty or whitespace
    EmptyName,
}

impl core::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CatalogError::TooManyEntries => {
                write!(f, "more than {} menu entries", MAX_MENU_ENTRIES)
            }
            CatalogError::NameTooLong => write!(f, "menu name too long"),
            CatalogError::EmptyName => write!(f, "menu name is empty"),
        }
    }
}

/// Built-in navigation selections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Navigation {
    EnterSpecialMenu,
    ExitSpecialMenu,
}

impl Navigation {
    /// Recognize a reserved key (case-insensitive)
    pub fn from_key(key: &str) -> Option<Self> {
        if key.eq_ignore_ascii_case(SPECIAL_MENU_KEY) {
            Some(Navigation::EnterSpecialMenu)
        } else if key.eq_ignore_ascii_case(EXIT_KEY) {
            Some(Navigation::ExitSpecialMenu)
        } else {
            None
        }
    }
}

/// Build the lookup key for a display name: `<name>`, lowercased, with
/// surrounding whitespace removed
pub fn normalize_key(name: &str) -> Result<MenuKey, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }

    let mut key = MenuKey::new();
    key.push('<').map_err(|_| CatalogError::NameTooLong)?;
    for c in name.chars().flat_map(char::to_lowercase) {
        key.push(c).map_err(|_| CatalogError::NameTooLong)?;
    }
    key.push('>').map_err(|_| CatalogError::NameTooLong)?;
    Ok(key)
}

/// One special menu entry
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    name: String,
    key: MenuKey,
    script: Option<String>,
    stay_on_page: bool,
    show_last_page: bool,
}

impl MenuEntry {
    /// Build an entry from its configuration
    pub fn from_config(item: &MenuItemConfig) -> Result<Self, CatalogError> {
        Ok(Self {
            key: normalize_key(&item.name)?,
            name: String::from(item.name.trim()),
            script: item
                .gcode
                .as_ref()
                .filter(|g| !g.trim().is_empty())
                .cloned(),
            stay_on_page: item.stay_on_page,
            show_last_page: item.show_last_page,
        })
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized lookup key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Script to run on confirmation
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn stay_on_page(&self) -> bool {
        self.stay_on_page
    }

    pub fn show_last_page(&self) -> bool {
        self.show_last_page
    }

    /// Built-in navigation this entry's key maps to, if any
    pub fn navigation(&self) -> Option<Navigation> {
        Navigation::from_key(&self.key)
    }
}

/// Ordered, keyed collection of special menu entries
#[derive(Debug, Clone, Default)]
pub struct MenuCatalog {
    entries: heapless::Vec<MenuEntry, MAX_MENU_ENTRIES>,
    lookup: FnvIndexMap<MenuKey, usize, MAX_MENU_ENTRIES>,
    /// Indices of entries whose key a later declaration took over
    shadowed: heapless::Vec<usize, MAX_MENU_ENTRIES>,
}

impl MenuCatalog {
    /// Build the catalog from configuration, in declaration order
    pub fn build<'a, I>(items: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = &'a MenuItemConfig>,
    {
        let mut catalog = Self::default();
        for item in items {
            let entry = MenuEntry::from_config(item)?;
            let index = catalog.entries.len();
            let key = entry.key.clone();
            catalog
                .entries
                .push(entry)
                .map_err(|_| CatalogError::TooManyEntries)?;
            // Capacity matches `entries`, so the insert cannot overflow
            if let Ok(Some(previous)) = catalog.lookup.insert(key, index) {
                let _ = catalog.shadowed.push(previous);
            }
        }
        Ok(catalog)
    }

    /// Look up an entry by key (case-insensitive)
    ///
    /// List rows carry keys cut to [`FULL_LABEL_LEN`], and the panel echoes
    /// the cut text back. A key that misses exactly is matched against the
    /// cut form of longer keys; the latest declaration wins.
    pub fn resolve(&self, key: &str) -> Option<&MenuEntry> {
        let mut normalized = MenuKey::new();
        for c in key.trim().chars().flat_map(char::to_lowercase) {
            normalized.push(c).ok()?;
        }
        if let Some(&index) = self.lookup.get(&normalized) {
            return self.entries.get(index);
        }

        let index = self
            .lookup
            .iter()
            .filter(|(full, _)| {
                full.len() > normalized.len()
                    && truncate_label::<FULL_LABEL_LEN>(full) == normalized.as_str()
            })
            .map(|(_, &index)| index)
            .max()?;
        self.entries.get(index)
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&MenuEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries listed but unreachable by key
    pub fn shadowed(&self) -> impl Iterator<Item = &MenuEntry> + '_ {
        self.shadowed.iter().filter_map(|&i| self.entries.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn items(names: &[(&str, Option<&str>)]) -> Vec<MenuItemConfig> {
        names
            .iter()
            .map(|(name, gcode)| MenuItemConfig::new(name, *gcode))
            .collect()
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Level Bed").unwrap().as_str(), "<level bed>");
        assert_eq!(normalize_key("  Home ").unwrap().as_str(), "<home>");
        assert_eq!(normalize_key("   "), Err(CatalogError::EmptyName));
    }

    #[test]
    fn test_normalize_key_too_long() {
        let name: String = core::iter::repeat('n').take(MAX_MENU_KEY_LEN).collect();
        assert_eq!(normalize_key(&name), Err(CatalogError::NameTooLong));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let catalog = MenuCatalog::build(&items(&[("Menu1", Some("G28"))])).unwrap();
        assert_eq!(catalog.resolve("<menu1>").unwrap().script(), Some("G28"));
        assert_eq!(catalog.resolve("<MENU1>").unwrap().name(), "Menu1");
        assert!(catalog.resolve("<menu2>").is_none());
    }

    #[test]
    fn test_later_declaration_wins_lookup() {
        let catalog = MenuCatalog::build(&items(&[
            ("level", Some("Z_TILT_ADJUST")),
            ("other", None),
            ("Level", Some("SCREWS_TILT_CALCULATE")),
        ]))
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.resolve("<level>").unwrap().script(),
            Some("SCREWS_TILT_CALCULATE")
        );
        let shadowed: Vec<&str> = catalog.shadowed().map(|e| e.script().unwrap()).collect();
        assert_eq!(shadowed, vec!["Z_TILT_ADJUST"]);
    }

    #[test]
    fn test_resolve_by_cut_row_label() {
        let catalog = MenuCatalog::build(&items(&[
            ("Calibrate Bed Mesh Quickly", Some("BED_MESH_CALIBRATE")),
            ("Home", Some("G28")),
        ]))
        .unwrap();
        let label = truncate_label::<FULL_LABEL_LEN>(catalog.entries()[0].key());
        assert_eq!(label.as_str(), "<calibrate bed mesh quickl");
        assert_eq!(
            catalog.resolve(&label).unwrap().script(),
            Some("BED_MESH_CALIBRATE")
        );
        // A prefix that is not a full row label does not match
        assert!(catalog.resolve("<calibrate").is_none());
    }

    #[test]
    fn test_cut_label_prefers_latest_declaration() {
        let catalog = MenuCatalog::build(&items(&[
            ("Calibrate Bed Mesh Quickly", Some("FIRST")),
            ("Calibrate Bed Mesh Quicklier", Some("SECOND")),
        ]))
        .unwrap();
        assert_eq!(
            catalog.resolve("<calibrate bed mesh quickl").unwrap().script(),
            Some("SECOND")
        );
    }

    #[test]
    fn test_blank_script_is_none() {
        let catalog = MenuCatalog::build(&items(&[("noop", Some("  "))])).unwrap();
        assert_eq!(catalog.entries()[0].script(), None);
    }

    #[test]
    fn test_too_many_entries() {
        let names: Vec<String> = (0..=MAX_MENU_ENTRIES)
            .map(|i| alloc::format!("item{}", i))
            .collect();
        let configs: Vec<MenuItemConfig> =
            names.iter().map(|n| MenuItemConfig::new(n, None)).collect();
        assert_eq!(
            MenuCatalog::build(&configs).unwrap_err(),
            CatalogError::TooManyEntries
        );
    }

    #[test]
    fn test_reserved_keys() {
        assert_eq!(
            Navigation::from_key("<special_menu>"),
            Some(Navigation::EnterSpecialMenu)
        );
        assert_eq!(Navigation::from_key("<EXIT>"), Some(Navigation::ExitSpecialMenu));
        assert_eq!(Navigation::from_key("<menu1>"), None);

        let catalog = MenuCatalog::build(&items(&[("Exit", None)])).unwrap();
        assert_eq!(
            catalog.entries()[0].navigation(),
            Some(Navigation::ExitSpecialMenu)
        );
    }
}
