//! Fleet-level query interface
//!
//! Consumers (the build tooling and the CLI) go through [`ConfigSource`]
//! rather than walking nodes. Every list is sorted and deduplicated.

use crate::file_tree::PathComponent;
use crate::files::{BaseFile, TouchFile};
use crate::firmware::FirmwareInfo;
use crate::options::{BspDirs, FirmwareFilter};
use crate::property::PropertyValue;
use crate::tree::ConfigTree;
use crate::{Error, Result};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

/// Firmware target combinations, keyed by the `coreboot` target name
pub type BuildCombinations = BTreeMap<String, Vec<Option<String>>>;

/// Read-only queries over a resolved configuration.
pub trait ConfigSource {
    /// Model names, sorted.
    fn model_list(&self) -> Vec<String>;

    /// Property `name` at `path` within `model`, with share and default
    /// fallback.
    fn model_property(&self, model: &str, path: &str, name: &str) -> Option<PropertyValue>;

    fn firmware_uris(&self) -> Vec<String>;

    fn touch_firmware_files(&self, dirs: &BspDirs) -> Result<Vec<TouchFile>>;

    fn bsp_tar_files(&self, dirs: &BspDirs) -> Result<Vec<String>>;

    /// URIs of every BSP tarball, for the build recipe to download.
    fn bsp_uris(&self, dirs: &BspDirs) -> Result<Vec<String>>;

    fn arc_files(&self) -> Result<Vec<BaseFile>>;

    fn audio_files(&self) -> Result<Vec<BaseFile>>;

    fn thermal_files(&self) -> Result<Vec<BaseFile>>;

    /// Build targets of `target_type` across models. Asking for `ec` also
    /// reports `cr50` targets.
    fn firmware_build_targets(&self, target_type: &str, filter: &FirmwareFilter) -> Vec<String>;

    /// Targets for each of `components`, per firmware name.
    fn firmware_build_combinations(
        &self,
        components: &[&str],
        filter: &FirmwareFilter,
    ) -> Result<BuildCombinations>;

    /// Firmware info of every model, in model-name order.
    fn firmware_info(&self) -> IndexMap<String, FirmwareInfo>;

    /// Every installed destination path, as a tree.
    fn file_tree(&self, dirs: &BspDirs) -> Result<PathComponent>;
}

impl ConfigTree {
    fn collect_models<T, F>(&self, mut per_model: F) -> Result<BTreeSet<T>>
    where
        T: Ord,
        F: FnMut(crate::NodeId) -> Result<Vec<T>>,
    {
        let mut all = BTreeSet::new();
        for (_, model) in self.models() {
            all.extend(per_model(model)?);
        }
        Ok(all)
    }
}

impl ConfigSource for ConfigTree {
    fn model_list(&self) -> Vec<String> {
        ConfigTree::model_list(self)
    }

    fn model_property(&self, model: &str, path: &str, name: &str) -> Option<PropertyValue> {
        let model = self.model(model)?;
        self.path_property(model, path, name).cloned()
    }

    fn firmware_uris(&self) -> Vec<String> {
        self.models()
            .flat_map(|(_, model)| self.model_firmware_uris(model))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn touch_firmware_files(&self, dirs: &BspDirs) -> Result<Vec<TouchFile>> {
        let files = self.collect_models(|model| {
            Ok(self.model_touch_firmware_files(model, dirs)?.into_values().collect())
        })?;
        Ok(files.into_iter().collect())
    }

    fn bsp_tar_files(&self, dirs: &BspDirs) -> Result<Vec<String>> {
        let files = self.collect_models(|model| {
            Ok(self.model_bsp_tar_files(model, dirs)?.into_values().collect())
        })?;
        Ok(files.into_iter().collect())
    }

    fn bsp_uris(&self, dirs: &BspDirs) -> Result<Vec<String>> {
        let uris = self.collect_models(|model| {
            Ok(self.model_touch_bsp_uris(model, dirs)?.into_values().collect())
        })?;
        Ok(uris.into_iter().collect())
    }

    fn arc_files(&self) -> Result<Vec<BaseFile>> {
        let files = self.collect_models(|model| Ok(self.model_arc_files(model)?.into_values().collect()))?;
        Ok(files.into_iter().collect())
    }

    fn audio_files(&self) -> Result<Vec<BaseFile>> {
        let files = self.collect_models(|model| Ok(self.model_audio_files(model)?.into_values().collect()))?;
        Ok(files.into_iter().collect())
    }

    fn thermal_files(&self) -> Result<Vec<BaseFile>> {
        let files =
            self.collect_models(|model| Ok(self.model_thermal_files(model)?.into_values().collect()))?;
        Ok(files.into_iter().collect())
    }

    fn firmware_build_targets(&self, target_type: &str, filter: &FirmwareFilter) -> Vec<String> {
        let mut targets = BTreeSet::new();
        for (_, model) in self.models() {
            let Some(node) = self.path_node(model, "/firmware/build-targets") else {
                continue;
            };
            let props = self.node(node).properties();
            if !filter.allows(props.get_str("coreboot")) {
                continue;
            }
            let target = props.get_str(target_type);
            if !target.is_empty() {
                targets.insert(target.to_string());
            }
            if target_type == "ec" {
                let cr50 = props.get_str("cr50");
                if !cr50.is_empty() {
                    targets.insert(cr50.to_string());
                }
            }
        }
        targets.into_iter().collect()
    }

    fn firmware_build_combinations(
        &self,
        components: &[&str],
        filter: &FirmwareFilter,
    ) -> Result<BuildCombinations> {
        let mut combos = BuildCombinations::new();
        for (_, model) in self.models() {
            let Some(node) = self.path_node(model, "/firmware/build-targets") else {
                continue;
            };
            let props = self.node(node).properties();
            let key = props.get_str("coreboot");
            if !filter.allows(key) {
                continue;
            }
            let targets: Vec<Option<String>> = components
                .iter()
                .map(|c| props.get(c).map(PropertyValue::to_string))
                .collect();

            match combos.get(key) {
                Some(existing) if *existing != targets => {
                    return Err(Error::CollidingFirmwareCombination {
                        key: key.to_string(),
                        first: existing.clone(),
                        second: targets,
                    });
                }
                _ => {
                    combos.insert(key.to_string(), targets);
                }
            }
        }
        Ok(combos)
    }

    fn firmware_info(&self) -> IndexMap<String, FirmwareInfo> {
        let mut info = IndexMap::new();
        for name in ConfigTree::model_list(self) {
            if let Some(model) = self.model(&name) {
                info.extend(self.model_firmware_info(model));
            }
        }
        info
    }

    fn file_tree(&self, dirs: &BspDirs) -> Result<PathComponent> {
        let mut paths = BTreeSet::new();
        for file in self.audio_files()? {
            paths.insert(file.dest);
        }
        for file in self.touch_firmware_files(dirs)? {
            paths.insert(file.dest);
            paths.insert(file.symlink);
        }

        let mut root = PathComponent::new("");
        for path in &paths {
            root.add_path(path.trim_start_matches('/'));
        }
        Ok(root)
    }
}
