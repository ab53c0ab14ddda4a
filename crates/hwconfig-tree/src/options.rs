//! Tree construction and query parameters

use std::collections::BTreeMap;

/// Properties that link one node to another, in precedence order
pub const DEFAULT_LINK_PROPERTIES: &[&str] =
    &["shares", "whitelabel", "touch-type", "audio-type", "bcs-type"];

/// Installation directory for each file-valued property
pub const DEFAULT_TARGET_DIRS: &[(&str, &str)] = &[
    ("volume", "/etc/cras"),
    ("dsp-ini", "/etc/cras"),
    ("hifi-conf", "/usr/share/alsa/ucm"),
    ("alsa-conf", "/usr/share/alsa/ucm"),
    ("topology-bin", "/lib/firmware"),
    ("firmware-bin", "/opt/google/touch/firmware"),
    ("firmware-symlink", "/lib/firmware"),
    ("dptf-dv", "/etc/dptf"),
    ("hw-features", "/etc"),
];

/// Options fixed at tree construction
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Link properties followed by share resolution, first present wins
    pub link_properties: Vec<String>,
    /// Property name -> absolute install directory
    pub target_dirs: BTreeMap<String, String>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            link_properties: DEFAULT_LINK_PROPERTIES.iter().map(|s| s.to_string()).collect(),
            target_dirs: DEFAULT_TARGET_DIRS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl TreeOptions {
    pub fn target_dir(&self, property: &str) -> Option<&str> {
        self.target_dirs.get(property).map(String::as_str)
    }
}

/// Where BSP tarballs and in-tree BSP files live
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BspDirs {
    /// Directory holding downloaded tarballs
    pub distdir: Option<String>,
    /// Directory holding files shipped alongside the build recipe
    pub filesdir: Option<String>,
}

/// Restricts firmware queries to one firmware name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirmwareFilter {
    pub name: Option<String>,
}

impl FirmwareFilter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Whether the firmware keyed `key` passes.
    pub fn allows(&self, key: &str) -> bool {
        self.name.as_deref().is_none_or(|name| name == key)
    }
}
