//! End-to-end tests for the compile then query pipeline
//!
//! Authored sources are compiled, and the compiled document is loaded back
//! as a query tree the way a build would consume it.

use hwconfig_schema::{CompileOptions, Compiler, FsLoader, MemoryLoader};
use hwconfig_test_utils::dir::FixtureDir;
use hwconfig_test_utils::fixtures::FLEET_SOURCES;
use hwconfig_tree::{ConfigSource, ConfigTree, FirmwareFilter, PropertyValue, TreeOptions};
use pretty_assertions::assert_eq;

fn compile_fleet(options: CompileOptions) -> ConfigTree {
    let mut loader = MemoryLoader::new();
    for (path, text) in FLEET_SOURCES {
        loader.insert(path, *text);
    }
    let compiled = Compiler::new(&loader, options)
        .compile(&["fleet.yaml", "overlay.yaml"])
        .unwrap();
    ConfigTree::from_document(compiled.output(), TreeOptions::default()).unwrap()
}

#[test]
fn test_compiled_records_become_models() {
    let tree = compile_fleet(CompileOptions::default());
    assert_eq!(tree.model_list(), vec!["basking", "electro", "nami"]);
}

#[test]
fn test_whitelabels_carry_branding() {
    let tree = compile_fleet(CompileOptions::default());
    let brand = tree.model_property("electro", "/whitelabels/red", "brand-code");
    assert_eq!(brand.as_ref().and_then(PropertyValue::as_str), Some("REDD"));
    let key = tree.model_property("electro", "/whitelabels/blue", "key-id");
    assert_eq!(key.as_ref().and_then(PropertyValue::as_str), Some("ELECTRO_BLUE"));
}

#[test]
fn test_firmware_info_derives_whitelabel_entries() {
    let tree = compile_fleet(CompileOptions::default());
    let info = tree.firmware_info();
    assert_eq!(
        info.keys().collect::<Vec<_>>(),
        vec!["basking", "electro", "electro-blue", "electro-red"]
    );

    assert_eq!(info["basking"].sig_id, "basking");
    assert_eq!(info["basking"].bios_build_target.as_deref(), Some("reef"));
    assert_eq!(info["electro"].sig_id, "sig-id-in-customization-id");

    let red = &info["electro-red"];
    assert_eq!(red.key_id, "ELECTRO_RED");
    assert_eq!(red.sig_id, "electro-red");
    assert!(!red.have_image);
    assert_eq!(red.main_image_uri, "bcs://Reef.9042.50.0.tbz2");
}

#[test]
fn test_shared_firmware_is_fetched_once() {
    let tree = compile_fleet(CompileOptions::default());
    let uris = tree.firmware_uris();
    assert_eq!(uris.len(), 3);
    assert!(uris.iter().all(|u| u.starts_with(
        "gs://chromeos-binaries/HOME/bcs-reef-private/overlay-reef-private/chromeos-base/chromeos-firmware-reef/"
    )));

    assert_eq!(
        tree.firmware_build_targets("ec", &FirmwareFilter::default()),
        vec!["reef"]
    );
    let combos = tree
        .firmware_build_combinations(&["coreboot", "depthcharge"], &FirmwareFilter::default())
        .unwrap();
    assert_eq!(combos.len(), 1);
    assert_eq!(combos["reef"], vec![Some("reef".to_string()), Some("reef".to_string())]);
}

#[test]
fn test_overlay_files_are_installed() {
    let tree = compile_fleet(CompileOptions::default());
    let audio: Vec<String> = tree.audio_files().unwrap().into_iter().map(|f| f.dest).collect();
    assert_eq!(audio, vec!["/etc/cras/basking/dsp.ini"]);

    let thermal: Vec<String> = tree.thermal_files().unwrap().into_iter().map(|f| f.dest).collect();
    assert_eq!(thermal, vec!["/etc/dptf/basking/dptf.dv"]);
}

#[test]
fn test_filtered_output_has_no_firmware() {
    let tree = compile_fleet(CompileOptions {
        filter_build_elements: true,
        ..CompileOptions::default()
    });
    assert!(tree.firmware_uris().is_empty());
    assert!(tree.firmware_info().is_empty());
}

#[test]
fn test_disk_sources_match_query_results() {
    let dir = FixtureDir::with_fleet();
    let compiled = Compiler::new(&FsLoader, CompileOptions::default())
        .compile(&[dir.path("fleet.yaml"), dir.path("overlay.yaml")])
        .unwrap();
    let tree = ConfigTree::from_document(compiled.output(), TreeOptions::default()).unwrap();
    assert_eq!(tree.firmware_info(), compile_fleet(CompileOptions::default()).firmware_info());
}
