use crate::export::ExportFormat;
use crate::mapper::FlowDirection;
use crate::util::require_non_blank;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "iceberg",
    version,
    about = "Method dependency mapper for C# source trees",
    after_help = r#"Examples:
  iceberg map --path . --class OrderService --method Submit --flow upstream
  iceberg map --path . --class OrderService --flow d --distance 2 --format json --output orders.json
  iceberg entry-points --path . --class OrderService --project Orders.Api

Environment:
  ICEBERG_LOG                    tracing filter (default iceberg=info)
  ICEBERG_NAMESPACE_SPECIFICITY  namespace components per DGML category (default 2)
  ICEBERG_OUTPUT                 default output file (default dependency_map.gen.dgml)
  ICEBERG_DOWNSTREAM_EXCLUDE     skip caller projects containing this (default Test)
  ICEBERG_PARSE_THREADS          parser threads, 0 for automatic
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Map the dependencies of matching methods and export the graph.
    Map {
        #[command(flatten)]
        target: TargetArgs,
        /// Direction to follow: upstream|u (callees) or downstream|d (callers).
        #[arg(long, value_enum, ignore_case = true)]
        flow: FlowDirection,
        /// Maximum number of hops from each entry point.
        #[arg(long, value_parser = parse_distance)]
        distance: Option<usize>,
        /// Output file; defaults to ICEBERG_OUTPUT.
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, ignore_case = true, default_value_t = ExportFormat::Dgml)]
        format: ExportFormat,
    },
    /// List methods matching a class (and optionally a method) name.
    EntryPoints {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TargetArgs {
    /// Root of the C# source tree.
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    /// Class declaring the entry points (case-insensitive).
    #[arg(long, value_parser = parse_class)]
    pub class: String,
    /// Method name (case-insensitive); every method of the class when omitted.
    #[arg(long, value_parser = parse_method)]
    pub method: Option<String>,
    /// Only search this project for entry points.
    #[arg(long, value_parser = parse_project)]
    pub project: Option<String>,
    /// Include files ignored by .gitignore.
    #[arg(long)]
    pub no_ignore: bool,
}

impl TargetArgs {
    /// `Class` or `Class.Method`, used to title the exported map.
    pub fn map_name(&self) -> String {
        match &self.method {
            Some(method) => format!("{}.{method}", self.class),
            None => self.class.clone(),
        }
    }
}

fn parse_class(value: &str) -> Result<String, String> {
    require_non_blank(value, "class name")
}

fn parse_method(value: &str) -> Result<String, String> {
    require_non_blank(value, "method name")
}

fn parse_project(value: &str) -> Result<String, String> {
    require_non_blank(value, "project name")
}

fn parse_distance(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("The distance must be at least 1.".to_string()),
        Ok(distance) => Ok(distance),
        Err(err) => Err(format!("Invalid distance {value}: {err}")),
    }
}
