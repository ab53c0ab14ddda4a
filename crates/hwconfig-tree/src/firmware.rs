//! Firmware queries for a single model

use crate::node::NodeId;
use crate::tree::ConfigTree;
use indexmap::IndexMap;
use serde::Serialize;

/// Signature id used when the signature is read from VPD at runtime
pub const SIG_ID_IN_CUSTOMIZATION_ID: &str = "sig-id-in-customization-id";

/// What is needed to build, pack and sign firmware for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirmwareInfo {
    pub model: String,
    /// Node holding the shared firmware images, if not the model's own
    pub shared_model: Option<String>,
    pub key_id: String,
    /// False for zero-touch whitelabels that never report this model
    pub have_image: bool,
    pub bios_build_target: Option<String>,
    pub ec_build_target: Option<String>,
    pub main_image_uri: String,
    pub main_rw_image_uri: String,
    pub ec_image_uri: String,
    pub pd_image_uri: String,
    pub extra: Vec<String>,
    pub create_bios_rw_image: bool,
    pub tools: Vec<String>,
    pub sig_id: String,
}

impl ConfigTree {
    /// Firmware image URIs of `model`, sorted.
    ///
    /// Images are properties ending in `-image` with a `bcs://` value,
    /// fetched from the model's `bcs-overlay`.
    pub fn model_firmware_uris(&self, model: NodeId) -> Vec<String> {
        let Some(firmware) = self.path_node(model, "/firmware") else {
            return Vec::new();
        };
        if self.node(firmware).properties().get_bool("no-firmware") {
            return Vec::new();
        }

        let props = self.merged_properties(model, firmware, "shares");
        let Some(overlay) = props.get("bcs-overlay").and_then(|v| v.as_str()) else {
            return Vec::new();
        };
        let bcs = overlay.strip_prefix("overlay-").unwrap_or(overlay);
        let ebuild = bcs.split('-').next().unwrap_or(bcs);

        let mut uris: Vec<String> = props
            .iter()
            .filter(|(name, _)| name.ends_with("-image"))
            .filter_map(|(_, value)| value.as_str()?.strip_prefix("bcs://"))
            .map(|fname| {
                format!(
                    "gs://chromeos-binaries/HOME/bcs-{bcs}/overlay-{bcs}/chromeos-base/chromeos-firmware-{ebuild}/{fname}"
                )
            })
            .collect();
        uris.sort();
        uris
    }

    /// Firmware info of `model`, plus one derived entry per whitelabel
    /// listed under its `whitelabels` node.
    ///
    /// Models without a firmware node, or marked `no-firmware`, have none.
    pub fn model_firmware_info(&self, model: NodeId) -> IndexMap<String, FirmwareInfo> {
        let mut result = IndexMap::new();
        let name = self.node(model).name().to_string();

        let whitelabel = self.follow_link(model, "whitelabel");
        let base_model = whitelabel.unwrap_or(model);
        let Some(firmware) = self.path_node(model, "/firmware") else {
            return result;
        };
        let Some(base_firmware) = self.path_node(base_model, "/firmware") else {
            return result;
        };

        let firmware_props = self.node(firmware).properties();
        if firmware_props.get_bool("no-firmware") {
            return result;
        }
        let key_id = firmware_props.get_str("key-id").to_string();

        let (image_node, shared_model) = match self.follow_link(base_firmware, "shares") {
            Some(shared) => (shared, Some(self.node(shared).name().to_string())),
            None => (base_firmware, None),
        };

        let have_image = !(whitelabel.is_some()
            && self
                .node(base_firmware)
                .properties()
                .get_bool(SIG_ID_IN_CUSTOMIZATION_ID));

        let (bios_build_target, ec_build_target) = match self.path_node(image_node, "build-targets") {
            Some(targets) => {
                let props = self.node(targets).properties();
                (
                    non_empty(props.get_str("coreboot")),
                    non_empty(props.get_str("ec")),
                )
            }
            None => (None, None),
        };

        let whitelabels = self.path_node(model, "/whitelabels");
        let sig_id = if whitelabels.is_some() || firmware_props.get_bool(SIG_ID_IN_CUSTOMIZATION_ID) {
            SIG_ID_IN_CUSTOMIZATION_ID.to_string()
        } else {
            name.clone()
        };

        let image = self.node(image_node).properties();
        let info = FirmwareInfo {
            model: name.clone(),
            shared_model,
            key_id,
            have_image,
            bios_build_target,
            ec_build_target,
            main_image_uri: image.get_str("main-image").to_string(),
            main_rw_image_uri: image.get_str("main-rw-image").to_string(),
            ec_image_uri: image.get_str("ec-image").to_string(),
            pd_image_uri: image.get_str("pd-image").to_string(),
            extra: image.get_str_list("extra"),
            create_bios_rw_image: image.get_bool("create-bios-rw-image"),
            tools: image.get_str_list("tools"),
            sig_id,
        };

        if let Some(whitelabels) = whitelabels {
            let base_name = self.node(base_model).name();
            let derived: Vec<(String, FirmwareInfo)> = self
                .node(whitelabels)
                .children()
                .map(|(tag, node)| {
                    let model = format!("{base_name}-{tag}");
                    let entry = FirmwareInfo {
                        model: model.clone(),
                        key_id: self.node(node).properties().get_str("key-id").to_string(),
                        have_image: false,
                        sig_id: model.clone(),
                        ..info.clone()
                    };
                    (model, entry)
                })
                .collect();
            result.insert(name, info);
            result.extend(derived);
        } else {
            result.insert(name, info);
        }
        result
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
