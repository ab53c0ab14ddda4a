//! CLI argument parsing using clap derive

use clap::{Args, Parser, Subcommand};
use hwconfig_tree::{BspDirs, FirmwareFilter};
use std::path::PathBuf;

/// hwconfig - compile and query hardware configuration
#[derive(Parser, Debug)]
#[command(name = "hwconfig")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// The compiled (or raw) configuration a query reads
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SourceArgs {
    /// Configuration file, JSON or YAML
    #[arg(short, long)]
    pub config: PathBuf,
}

/// Locations of BSP files
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct BspArgs {
    /// Directory holding downloaded tarballs
    #[arg(long, env = "DISTDIR")]
    pub distdir: Option<String>,

    /// Directory holding files shipped with the build recipe
    #[arg(long, env = "FILESDIR")]
    pub filesdir: Option<String>,
}

impl BspArgs {
    pub fn dirs(&self) -> BspDirs {
        BspDirs {
            distdir: self.distdir.clone(),
            filesdir: self.filesdir.clone(),
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FirmwareArgs {
    /// Only report firmware with this name
    #[arg(long, env = "FW_NAME")]
    pub fw_name: Option<String>,
}

impl FirmwareArgs {
    pub fn filter(&self) -> FirmwareFilter {
        FirmwareFilter {
            name: self.fw_name.clone(),
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CompileArgs {
    /// Authored sources; the first is the base, later ones are overlays
    #[arg(short, long = "config", required = true, num_args = 1..)]
    pub configs: Vec<PathBuf>,

    /// JSON Schema the merged document must satisfy
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Strip build-only elements from the output
    #[arg(long)]
    pub filter: bool,

    /// Only keep configs whose name matches this regex
    #[arg(long)]
    pub model_filter: Option<String>,

    /// Cap on template fixed-point passes
    #[arg(long)]
    pub max_template_passes: Option<usize>,

    /// Also write the identity table as JSON
    #[arg(long)]
    pub identity_table: Option<PathBuf>,

    /// Also write the EC feature table as JSON
    #[arg(long)]
    pub ec_table: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Expand, merge and validate authored sources into one JSON document
    ///
    /// Examples:
    ///   hwconfig compile -c fleet.yaml                     # Print to stdout
    ///   hwconfig compile -c fleet.yaml -c overlay.yaml -o config.json
    ///   hwconfig compile -c fleet.yaml -s schema.json --filter
    Compile(CompileArgs),

    /// List model names
    ListModels {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print one property of a model
    Get {
        #[command(flatten)]
        source: SourceArgs,

        /// Model name
        model: String,

        /// Node path within the model, e.g. /audio/main
        path: String,

        /// Property name
        property: String,
    },

    /// List firmware image URIs
    FirmwareUris {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List touch firmware files as source, dest and symlink
    TouchFiles {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        bsp: BspArgs,
    },

    /// List audio files as source and dest
    AudioFiles {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List thermal files as source and dest
    ThermalFiles {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List ARC++ hardware-feature files as source and dest
    ArcFiles {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List BSP tarballs the build needs
    BspTarFiles {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        bsp: BspArgs,
    },

    /// List download URIs of BSP tarballs
    BspUris {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        bsp: BspArgs,
    },

    /// List firmware build targets of one type (coreboot, ec, ...)
    BuildTargets {
        #[command(flatten)]
        source: SourceArgs,

        /// Target type
        target_type: String,

        #[command(flatten)]
        fw: FirmwareArgs,
    },

    /// List build target combinations per firmware name
    BuildCombinations {
        #[command(flatten)]
        source: SourceArgs,

        /// Target types, in output order
        #[arg(required = true)]
        components: Vec<String>,

        #[command(flatten)]
        fw: FirmwareArgs,
    },

    /// Print firmware info of every model as JSON
    FirmwareInfo {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the tree of installed files
    FileTree {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        bsp: BspArgs,

        /// Build root to check file sizes against
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compile_collects_configs() {
        let cli = Cli::parse_from([
            "hwconfig", "compile", "-c", "a.yaml", "-c", "b.yaml", "--filter", "-o", "out.json",
        ]);
        let Commands::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.configs, vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]);
        assert!(args.filter);
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_get_positionals() {
        let cli = Cli::parse_from([
            "hwconfig", "get", "-c", "config.json", "reef", "/audio/main", "card",
        ]);
        assert_eq!(
            cli.command,
            Commands::Get {
                source: SourceArgs {
                    config: PathBuf::from("config.json"),
                },
                model: "reef".to_string(),
                path: "/audio/main".to_string(),
                property: "card".to_string(),
            }
        );
    }

    #[test]
    fn test_build_combinations_components() {
        let cli = Cli::parse_from([
            "hwconfig", "--verbose", "build-combinations", "-c", "c.json", "coreboot", "ec",
            "--fw-name", "reef",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::BuildCombinations { components, fw, .. } => {
                assert_eq!(components, vec!["coreboot", "ec"]);
                assert_eq!(fw.fw_name.as_deref(), Some("reef"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
