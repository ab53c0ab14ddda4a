//! `hwconfig compile`

use crate::cli::CompileArgs;
use crate::error::{CliError, Result};
use crate::io::write_atomic;
use crate::schema::JsonSchemaValidator;
use colored::Colorize;
use hwconfig_schema::loader::{Format, parse_source};
use hwconfig_schema::{CompileOptions, Compiler, FsLoader};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::Path;

/// Read a JSON or YAML schema, chosen by extension.
fn read_schema(path: &Path) -> Result<Value> {
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::user(format!("Cannot read schema {}: {e}", path.display())))?;
    Ok(parse_source(path, format, &text)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    write_atomic(path, text.as_bytes())
}

/// Compile the sources in `args`, writing the document to `-o` or `out`.
pub fn run_compile(args: &CompileArgs, out: &mut dyn Write) -> Result<()> {
    let options = CompileOptions {
        name_filter: args.model_filter.clone(),
        filter_build_elements: args.filter,
        max_template_passes: args.max_template_passes,
        ..CompileOptions::default()
    };

    let schema = args.schema.as_deref().map(read_schema).transpose()?;
    let loader = FsLoader;
    let mut compiler = Compiler::new(&loader, options);
    if let Some(schema) = &schema {
        compiler = compiler.with_schema(schema, &JsonSchemaValidator);
    }

    let compiled = compiler.compile(&args.configs)?;
    let mut json = compiled.to_json()?;
    json.push('\n');

    match &args.output {
        Some(path) => {
            write_atomic(path, json.as_bytes())?;
            eprintln!(
                "{} {} configs to {}",
                "Wrote".green().bold(),
                compiled.records()?.len(),
                path.display()
            );
        }
        None => out.write_all(json.as_bytes())?,
    }

    if let Some(path) = &args.identity_table {
        write_json(path, &compiled.identity_table()?)?;
    }
    if let Some(path) = &args.ec_table {
        write_json(path, &compiled.ec_feature_table()?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwconfig_test_utils::dir::FixtureDir;

    fn args(dir: &FixtureDir) -> CompileArgs {
        CompileArgs {
            configs: vec![dir.path("fleet.yaml"), dir.path("overlay.yaml")],
            schema: Some(dir.path("schema.json")),
            output: None,
            filter: false,
            model_filter: None,
            max_template_passes: None,
            identity_table: None,
            ec_table: None,
        }
    }

    #[test]
    fn test_compile_to_writer() {
        let dir = FixtureDir::with_fleet();
        let mut out = Vec::<u8>::new();
        run_compile(&args(&dir), &mut out).unwrap();

        let doc: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["chromeos"]["configs"].as_array().unwrap().len(), 5);
        assert!(out.ends_with(b"}\n"));
    }

    #[test]
    fn test_compile_writes_tables() {
        let dir = FixtureDir::with_fleet();
        let mut args = args(&dir);
        args.output = Some(dir.path("out/config.json"));
        args.identity_table = Some(dir.path("out/identity.json"));
        args.ec_table = Some(dir.path("out/ec.json"));

        let mut out = Vec::<u8>::new();
        run_compile(&args, &mut out).unwrap();
        assert!(out.is_empty());

        let identity: Value = serde_json::from_str(&dir.read("out/identity.json")).unwrap();
        assert_eq!(identity.as_array().unwrap().len(), 5);
        let ec: Value = serde_json::from_str(&dir.read("out/ec.json")).unwrap();
        assert_eq!(ec["flags"][0], "has_base_accelerometer");
    }

    #[test]
    fn test_schema_violation_is_reported() {
        let dir = FixtureDir::with_fleet();
        dir.write("bad.yaml", "chromeos:\n  configs:\n    - name: X\n");
        let mut args = args(&dir);
        args.configs = vec![dir.path("bad.yaml")];

        let err = run_compile(&args, &mut Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().starts_with("Schema validation failed at '/chromeos/configs/0/name'"));
    }

    #[test]
    fn test_yaml_schema_is_accepted() {
        let dir = FixtureDir::with_fleet();
        dir.write("schema.yaml", NAME_PATTERN_SCHEMA_YAML);
        dir.write("bad.yaml", "chromeos:\n  configs:\n    - name: X\n");
        let mut args = args(&dir);
        args.schema = Some(dir.path("schema.yaml"));

        run_compile(&args, &mut Vec::<u8>::new()).unwrap();

        args.configs = vec![dir.path("bad.yaml")];
        let err = run_compile(&args, &mut Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().starts_with("Schema validation failed at '/chromeos/configs/0/name'"));
    }

    const NAME_PATTERN_SCHEMA_YAML: &str = r#"
type: object
properties:
  chromeos:
    type: object
    properties:
      configs:
        type: array
        items:
          type: object
          properties:
            name:
              type: string
              pattern: "^[_a-z0-9]{3,}$"
"#;
}
