//! Query subcommands over a compiled or raw configuration
//!
//! List output is one entry per line; structured output is pretty JSON.

use crate::error::{CliError, Result};
use colored::Colorize;
use hwconfig_schema::loader::{Format, parse_source};
use hwconfig_tree::{BaseFile, BspDirs, ConfigSource, ConfigTree, FirmwareFilter, TreeOptions};
use std::io::Write;
use std::path::Path;

/// Build the tree for the config file at `path`.
pub fn load_tree(path: &Path) -> Result<ConfigTree> {
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::user(format!("Cannot read config {}: {e}", path.display())))?;
    let doc = parse_source(path, format, &text)?;
    Ok(ConfigTree::from_document(&doc, TreeOptions::default())?)
}

fn write_lines<I, S>(out: &mut dyn Write, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    Ok(())
}

fn write_base_files(out: &mut dyn Write, files: &[BaseFile]) -> Result<()> {
    write_lines(out, files.iter().map(|f| format!("{} {}", f.source, f.dest)))
}

pub fn run_list_models(config: &Path, out: &mut dyn Write) -> Result<()> {
    let tree = load_tree(config)?;
    write_lines(out, ConfigSource::model_list(&tree))
}

/// Print one property; prints nothing when the model lacks it.
pub fn run_get(config: &Path, model: &str, path: &str, property: &str, out: &mut dyn Write) -> Result<()> {
    let tree = load_tree(config)?;
    if tree.model(model).is_none() {
        return Err(CliError::user(format!("Unknown model '{model}'")));
    }
    if let Some(value) = tree.model_property(model, path, property) {
        writeln!(out, "{value}")?;
    }
    Ok(())
}

pub fn run_firmware_uris(config: &Path, out: &mut dyn Write) -> Result<()> {
    write_lines(out, load_tree(config)?.firmware_uris())
}

pub fn run_touch_files(config: &Path, dirs: &BspDirs, out: &mut dyn Write) -> Result<()> {
    let files = load_tree(config)?.touch_firmware_files(dirs)?;
    write_lines(
        out,
        files
            .iter()
            .map(|f| format!("{} {} {}", f.source, f.dest, f.symlink)),
    )
}

pub fn run_audio_files(config: &Path, out: &mut dyn Write) -> Result<()> {
    write_base_files(out, &load_tree(config)?.audio_files()?)
}

pub fn run_thermal_files(config: &Path, out: &mut dyn Write) -> Result<()> {
    write_base_files(out, &load_tree(config)?.thermal_files()?)
}

pub fn run_arc_files(config: &Path, out: &mut dyn Write) -> Result<()> {
    write_base_files(out, &load_tree(config)?.arc_files()?)
}

pub fn run_bsp_tar_files(config: &Path, dirs: &BspDirs, out: &mut dyn Write) -> Result<()> {
    write_lines(out, load_tree(config)?.bsp_tar_files(dirs)?)
}

pub fn run_bsp_uris(config: &Path, dirs: &BspDirs, out: &mut dyn Write) -> Result<()> {
    write_lines(out, load_tree(config)?.bsp_uris(dirs)?)
}

pub fn run_build_targets(
    config: &Path,
    target_type: &str,
    filter: &FirmwareFilter,
    out: &mut dyn Write,
) -> Result<()> {
    write_lines(out, load_tree(config)?.firmware_build_targets(target_type, filter))
}

pub fn run_build_combinations(
    config: &Path,
    components: &[String],
    filter: &FirmwareFilter,
    out: &mut dyn Write,
) -> Result<()> {
    let components: Vec<&str> = components.iter().map(String::as_str).collect();
    let combos = load_tree(config)?.firmware_build_combinations(&components, filter)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&combos)?)?;
    Ok(())
}

pub fn run_firmware_info(config: &Path, out: &mut dyn Write) -> Result<()> {
    let info = load_tree(config)?.firmware_info();
    writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?;
    Ok(())
}

/// Print installed paths as an indented tree.
///
/// With `root`, each file is annotated with its size below `root`, or
/// flagged when missing.
pub fn run_file_tree(config: &Path, dirs: &BspDirs, root: Option<&Path>, out: &mut dyn Write) -> Result<()> {
    let tree = load_tree(config)?.file_tree(dirs)?;
    let mut result = Ok(());
    tree.walk(&mut |path, depth, node| {
        if depth == 0 || result.is_err() {
            return;
        }
        let indent = "   ".repeat(depth - 1);
        let line = match (node.is_leaf(), root) {
            (false, _) => format!("{indent}{}/", node.name),
            (true, None) => format!("{indent}{}", node.name),
            (true, Some(root)) => match std::fs::metadata(root.join(path)) {
                Ok(meta) => format!("{indent}{} ({} bytes)", node.name, meta.len()),
                Err(_) => format!("{indent}{} {}", node.name, "missing".red()),
            },
        };
        result = writeln!(out, "{line}");
    });
    Ok(result?)
}
