/*!
This binary rewrites and merges `decision diagrams` given as fact files.

# Decision diagrams
A `decision diagram` is a rooted, directed graph whose inner nodes test attributes of an instance
and whose leaves carry a classification. Each input file holds one diagram as a set of facts
`root/1`, `innernode/1`, `leafnode/2`, `conditionaledge/5` and `elseedge/2`, e.g.
```prolog
root(temp).
innernode(temp).
leafnode(yes,"swim").
leafnode(no,"stay").
conditionaledge(temp,yes,"temperature",">=","25").
elseedge(temp,no).
```

The named operator is applied to all input diagrams, and every resulting diagram is printed,
separated by blank lines. Run `dd-merge --list` to see all operators.

# Usage
```plain
Usage: dd-merge [OPTIONS] [OPERATOR] [INPUT]...

Arguments:
  [OPERATOR]  Name of the operator to apply
  [INPUT]...  Input files, one diagram each

Options:
  -p, --param <KEY=VALUE>    Operator parameter, may be given multiple times
  -f, --format <FORMAT>      Output format [default: facts] [possible values: facts, answerset, dot, json]
      --solver <SOLVER>      Command of the external solver used by the asp operator [default: dlv]
      --list                 Print all operators with a short description
      --rust_log <RUST_LOG>  Sets the verbosity to 'warn', 'info', 'debug' or 'trace' if -v and -q are not use [env: RUST_LOG=]
  -v...                      Sets log verbosity (multiple times means more verbose)
  -q                         Sets log verbosity to only errors
  -h, --help                 Print help
  -V, --version              Print version
```
 */

#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences
)]

use std::path::{Path, PathBuf};

use clap::{
    builder::{PossibleValuesParser, TypedValueParser},
    Parser,
};
use dd_merge::{
    diagram::Diagram,
    error::DiagramError,
    facts::{self, Fact},
    operator::{Operator, Parameters},
    parser::parse_facts,
    solver::CommandSolver,
};
use strum::{EnumString, EnumVariantNames, VariantNames};

/// How result diagrams are printed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString, EnumVariantNames)]
#[strum(serialize_all = "lowercase")]
enum Format {
    /// One fact per line.
    Facts,
    /// All facts of a diagram as one answer set `{...}`.
    AnswerSet,
    /// Graphviz DOT.
    Dot,
    /// The fact list as JSON.
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "dd-merge", author, version, about)]
struct App {
    /// Name of the operator to apply
    #[arg(required_unless_present = "list")]
    operator: Option<String>,
    /// Input files, one diagram each
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,
    /// Operator parameter, may be given multiple times
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = Parameters::parse_pair)]
    params: Vec<(String, String)>,
    /// Output format
    #[arg(
        short,
        long,
        default_value = "facts",
        value_parser = PossibleValuesParser::new(Format::VARIANTS.iter().copied())
            .try_map(|name| name.parse::<Format>())
    )]
    format: Format,
    /// Command of the external solver used by the asp operator [default: dlv]
    #[arg(long)]
    solver: Option<String>,
    /// Print all operators with a short description
    #[arg(long)]
    list: bool,
    /// Sets the verbosity to 'warn', 'info', 'debug' or 'trace' if -v and -q are not use
    #[arg(long = "rust_log", env)]
    rust_log: Option<String>,
    /// Sets log verbosity (multiple times means more verbose)
    #[arg(short, action = clap::ArgAction::Count, group = "verbosity")]
    verbose: u8,
    /// Sets log verbosity to only errors
    #[arg(short, group = "verbosity")]
    quiet: bool,
}

impl App {
    fn init_logging(&self) {
        let filter_level = match self.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            3..=u8::MAX => log::LevelFilter::Trace,
            _ => {
                if self.quiet {
                    log::LevelFilter::Error
                } else if let Some(rust_log) = self.rust_log.clone() {
                    match rust_log.as_str() {
                        "error" => log::LevelFilter::Error,
                        "info" => log::LevelFilter::Info,
                        "debug" => log::LevelFilter::Debug,
                        "trace" => log::LevelFilter::Trace,
                        _ => log::LevelFilter::Warn,
                    }
                } else {
                    log::LevelFilter::Warn
                }
            }
        };
        env_logger::builder().filter_level(filter_level).init();
        log::info!("Version: {}", clap::crate_version!());
    }

    fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.list {
            for operator in Operator::all() {
                println!("{} ({})\n    {}", operator, operator.arity(), operator.usage());
            }
            return Ok(());
        }
        let operator = match self.operator.as_deref() {
            Some(name) => Operator::from_name(name)?,
            None => return Err(DiagramError::UnknownOperator(String::new()).into()),
        };
        let diagrams = self
            .inputs
            .iter()
            .map(|path| read_diagram(path))
            .collect::<Result<Vec<_>, _>>()?;
        let params: Parameters = self.params.iter().cloned().collect();
        let solver = self
            .solver
            .as_deref()
            .map_or_else(CommandSolver::default, CommandSolver::new);

        let results = operator.apply_with(&diagrams, &params, &solver)?;
        log::info!("[Done] {}: {} result(s)", operator, results.len());
        let rendered = results
            .iter()
            .map(|diagram| self.render(diagram))
            .collect::<Result<Vec<_>, _>>()?;
        print!("{}", rendered.join("\n"));
        Ok(())
    }

    fn render(&self, diagram: &Diagram) -> Result<String, Box<dyn std::error::Error>> {
        let facts = facts::encode(diagram)?;
        Ok(match self.format {
            Format::Facts => facts.iter().map(|fact| format!("{}\n", fact)).collect(),
            Format::AnswerSet => format!(
                "{{{}}}\n",
                facts.iter().map(Fact::atom).collect::<Vec<_>>().join(", ")
            ),
            Format::Dot => diagram.to_dot()?,
            Format::Json => format!("{}\n", serde_json::to_string_pretty(&facts)?),
        })
    }
}

fn read_diagram(path: &Path) -> Result<Diagram, DiagramError> {
    log::info!("[Start] reading {}", path.display());
    let input = std::fs::read_to_string(path)
        .map_err(|err| DiagramError::Io(format!("{}: {}", path.display(), err)))?;
    let atoms = parse_facts(&input)?;
    let diagram = facts::decode_atoms(&atoms)?;
    log::info!(
        "[Done] reading {}: {} nodes, {} edges",
        path.display(),
        diagram.node_count(),
        diagram.edge_count()
    );
    Ok(diagram)
}

fn main() {
    let app = App::parse();
    app.init_logging();
    if let Err(err) = app.run() {
        log::error!("{}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
