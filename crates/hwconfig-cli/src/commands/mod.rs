//! Command implementations for hwconfig-cli

pub mod compile;
pub mod query;

pub use compile::run_compile;
pub use query::{
    run_arc_files, run_audio_files, run_bsp_tar_files, run_bsp_uris, run_build_combinations,
    run_build_targets, run_file_tree, run_firmware_info, run_firmware_uris, run_get,
    run_list_models, run_thermal_files, run_touch_files,
};
