//! Installed-file queries for a single model
//!
//! Each query returns the files one model needs, keyed by what produced
//! them. Fleet-wide, deduplicated lists are built from these by
//! [`ConfigSource`](crate::ConfigSource).

use crate::filename::{format_filename, prop_filename};
use crate::node::NodeId;
use crate::options::BspDirs;
use crate::property::PropertyValue;
use crate::tree::ConfigTree;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A touch firmware file to install
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TouchFile {
    /// Where the file is found: below `filesdir`, or inside the unpacked
    /// BSP tarball
    pub source: String,
    /// Install path in the root filesystem
    pub dest: String,
    /// Symlink the kernel loads the firmware through
    pub symlink: String,
}

/// A file copied from the build tree into the root filesystem
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BaseFile {
    pub source: String,
    pub dest: String,
}

/// Join path parts; an absolute part discards everything before it.
pub fn join_path(parts: &[&str]) -> String {
    let mut path = PathBuf::new();
    for part in parts {
        path.push(part);
    }
    path.to_string_lossy().into_owned()
}

fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Binary component server URI for `path` within `overlay`.
///
/// Returns `None` unless `overlay` starts with `overlay`.
///
/// ```
/// use hwconfig_tree::files::bcs_uri;
///
/// assert_eq!(
///     bcs_uri("overlay-reef-private", "chromeos-base/touch.tbz2").as_deref(),
///     Some("gs://chromeos-binaries/HOME/bcs-reef-private/overlay-reef-private/chromeos-base/touch.tbz2"),
/// );
/// assert_eq!(bcs_uri("reef-private", "x"), None);
/// ```
pub fn bcs_uri(overlay: &str, path: &str) -> Option<String> {
    if !overlay.starts_with("overlay") {
        return None;
    }
    let bcs = overlay.get(8..).unwrap_or_default();
    Some(format!("gs://chromeos-binaries/HOME/bcs-{bcs}/overlay-{bcs}/{path}"))
}

/// Property values rendered as template text.
pub(crate) fn text_props(props: &BTreeMap<String, PropertyValue>) -> BTreeMap<String, String> {
    props.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
}

pub(crate) struct TouchBspInfo {
    device: String,
    props: BTreeMap<String, String>,
    dir: String,
    tarball: Option<String>,
}

impl ConfigTree {
    fn model_props(&self, model: NodeId, props: &mut BTreeMap<String, String>) {
        let name = self.node(model).name();
        props.insert("model".to_string(), name.to_string());
        props.insert("MODEL".to_string(), name.to_uppercase());
    }

    fn target_dir_for(&self, node: &str, property: &str) -> Result<&str> {
        self.options()
            .target_dir(property)
            .ok_or_else(|| Error::MissingTargetDir {
                node: node.to_string(),
                property: property.to_string(),
            })
    }

    /// Touch devices of `model` with their merged properties and where
    /// their files come from.
    pub(crate) fn touch_bsp_info(
        &self,
        model: NodeId,
        dirs: &BspDirs,
        need_filesdir: bool,
    ) -> Result<Vec<TouchBspInfo>> {
        let distdir = dirs.distdir.as_deref().ok_or(Error::MissingBspDir {
            variable: "DISTDIR",
            purpose: "tar files",
        })?;
        let filesdir = dirs.filesdir.as_deref();
        if filesdir.is_none() && need_filesdir {
            return Err(Error::MissingBspDir {
                variable: "FILESDIR",
                purpose: "BSP files",
            });
        }

        let Some(touch) = self.path_node(model, "/touch") else {
            return Ok(Vec::new());
        };
        let touch_path = self.node(touch).path();

        let mut infos = Vec::new();
        for (name, device) in self.node(touch).children() {
            let mut merged = self.merged_properties(model, device, "touch-type");
            let touch_type = self.follow_link(device, "touch-type");
            let bcs = self
                .follow_link(device, "bcs-type")
                .or_else(|| touch_type.and_then(|t| self.follow_link(t, "bcs-type")));

            if let Some(bcs) = bcs {
                self.merge_into(&mut merged, Some(bcs), "");
                let mut props = text_props(&merged);
                self.model_props(model, &mut props);
                let tarball = prop_filename(touch_path, &props, "tarball")?;
                infos.push(TouchBspInfo {
                    device: name.to_string(),
                    props,
                    dir: distdir.to_string(),
                    tarball: Some(tarball),
                });
            } else if let Some(filesdir) = filesdir {
                let mut props = text_props(&merged);
                self.model_props(model, &mut props);
                infos.push(TouchBspInfo {
                    device: name.to_string(),
                    props,
                    dir: filesdir.to_string(),
                    tarball: None,
                });
            }
        }
        Ok(infos)
    }

    /// Touch firmware files of `model`, keyed by touch device.
    pub fn model_touch_firmware_files(&self, model: NodeId, dirs: &BspDirs) -> Result<IndexMap<String, TouchFile>> {
        let model_path = self.node(model).path();
        let mut files = IndexMap::new();

        for info in self.touch_bsp_info(model, dirs, true)? {
            let fw_target_dir = self.target_dir_for(&info.device, "firmware-bin")?;
            let sym_target_dir = self.target_dir_for(&info.device, "firmware-symlink")?;

            let dest = prop_filename(model_path, &info.props, "firmware-bin")?;
            let symlink = prop_filename(model_path, &info.props, "firmware-symlink")?;
            let source = match &info.tarball {
                Some(tarball) => {
                    let root = Path::new(basename(tarball))
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or_default();
                    let src_dir = join_path(&[root, fw_target_dir.trim_start_matches('/')]);
                    join_path(&[&src_dir, basename(&dest)])
                }
                None => join_path(&[&info.dir, &dest]),
            };

            files.insert(
                info.device,
                TouchFile {
                    source,
                    dest: join_path(&[fw_target_dir, &dest]),
                    symlink: join_path(&[sym_target_dir, &symlink]),
                },
            );
        }
        Ok(files)
    }

    /// BSP tarballs `model` needs, as paths below `distdir`.
    pub fn model_bsp_tar_files(&self, model: NodeId, dirs: &BspDirs) -> Result<IndexMap<String, String>> {
        let mut files = IndexMap::new();
        for info in self.touch_bsp_info(model, dirs, false)? {
            if let Some(tarball) = &info.tarball {
                files.insert(info.device.clone(), join_path(&[&info.dir, basename(tarball)]));
            }
        }
        Ok(files)
    }

    /// Download URIs of the BSP tarballs `model` needs.
    pub fn model_touch_bsp_uris(&self, model: NodeId, dirs: &BspDirs) -> Result<IndexMap<String, String>> {
        let mut uris = IndexMap::new();
        for info in self.touch_bsp_info(model, dirs, false)? {
            let Some(tarball) = &info.tarball else {
                continue;
            };
            let overlay = info
                .props
                .get("overlay")
                .ok_or_else(|| Error::missing_property(&info.device, "overlay"))?;
            if let Some(uri) = bcs_uri(overlay, tarball) {
                uris.insert(info.device.clone(), uri);
            }
        }
        Ok(uris)
    }

    /// The ARC++ hardware-features file of `model`, if it has one.
    pub fn model_arc_files(&self, model: NodeId) -> Result<IndexMap<String, BaseFile>> {
        const PROP: &str = "hw-features";
        let mut files = IndexMap::new();
        if let Some(arc) = self.path_node(model, "/arc") {
            let arc_path = self.node(arc).path();
            let value = self
                .node(arc)
                .properties()
                .get(PROP)
                .ok_or_else(|| Error::missing_property(arc_path, PROP))?
                .to_string();
            let target_dir = self.target_dir_for(arc_path, PROP)?;
            files.insert(
                "base".to_string(),
                BaseFile {
                    dest: join_path(&[target_dir, &value]),
                    source: value,
                },
            );
        }
        Ok(files)
    }

    /// Thermal files of `model` and its submodels, keyed by (sub)model name.
    pub fn model_thermal_files(&self, model: NodeId) -> Result<IndexMap<String, BaseFile>> {
        const PROP: &str = "dptf-dv";
        let mut files = IndexMap::new();
        for (name, thermal) in self.all_path_nodes(model, "/thermal") {
            let thermal_path = self.node(thermal).path();
            let value = self
                .node(thermal)
                .properties()
                .get(PROP)
                .ok_or_else(|| Error::missing_property(thermal_path, PROP))?
                .to_string();
            let target_dir = self.target_dir_for(thermal_path, PROP)?;
            files.insert(
                name,
                BaseFile {
                    dest: join_path(&[target_dir, &value]),
                    source: value,
                },
            );
        }
        Ok(files)
    }

    /// Audio files of `model` and its submodels, keyed by ((sub)model,
    /// property).
    ///
    /// Every audio card needs `cras-config-dir`. Volume and DSP files are
    /// installed per cras directory; UCM files per `{card}.{ucm-suffix}`.
    pub fn model_audio_files(&self, model: NodeId) -> Result<IndexMap<(String, String), BaseFile>> {
        let model_path = self.node(model).path();
        let mut files = IndexMap::new();

        for (name, audio) in self.all_path_nodes(model, "/audio") {
            for (_, card) in self.node(audio).children() {
                let card_path = self.node(card).path();
                let mut props = text_props(&self.merged_properties(model, card, "audio-type"));
                self.model_props(model, &mut props);

                let cras_dir = props
                    .get("cras-config-dir")
                    .cloned()
                    .ok_or_else(|| Error::missing_property(card_path, "cras-config-dir"))?;

                let mut add = |prop: &str, dest_template: &str, dirname: &str| -> Result<()> {
                    if !props.contains_key(prop) {
                        return Ok(());
                    }
                    let target_dir = self.target_dir_for(card_path, prop)?;
                    let source = prop_filename(model_path, &props, prop)?;
                    let dest = format_filename(model_path, &props, dest_template)?;
                    files.insert(
                        (name.clone(), prop.to_string()),
                        BaseFile {
                            source,
                            dest: join_path(&[target_dir, dirname, &dest]),
                        },
                    );
                    Ok(())
                };

                add("volume", "{card}", &cras_dir)?;
                add("dsp-ini", "dsp.ini", &cras_dir)?;
                if let Some(hifi) = props.get("hifi-conf") {
                    add("hifi-conf", &format!("{{card}}.{{ucm-suffix}}/{}", basename(hifi)), "")?;
                }
                add("alsa-conf", "{card}.{ucm-suffix}/{card}.{ucm-suffix}.conf", "")?;
                if let Some(topology) = props.get("topology-bin") {
                    add("topology-bin", basename(topology), "")?;
                }
            }
        }
        Ok(files)
    }
}
