/*!
Merging by an external logic-program solver.

All input diagrams are encoded in the indexed fact vocabulary (see [facts][crate::facts]),
a user program is appended, and the result is handed to a [Solver].
Every answer set the solver returns is decoded with the plain vocabulary into one output diagram.
 */
use std::{
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

use crate::{
    diagram::Diagram,
    error::{DiagramError, Result},
    facts::{self, Atom},
    parser,
};

/// Predicates the solver is asked to report.
pub const OUTPUT_PREDICATES: [&str; 5] = [
    "root",
    "innernode",
    "leafnode",
    "conditionaledge",
    "elseedge",
];

/// Something that computes the answer sets of a logic program.
pub trait Solver {
    /// Returns all answer sets of `program`.
    /// `maxint` bounds the integers the solver has to consider, if given.
    fn solve(&self, program: &str, maxint: Option<u64>) -> Result<Vec<Vec<Atom>>>;
}

/// A solver running as a child process, reading the program from stdin and printing
/// answer sets `{atom, ...}`, one per line, like `dlv -silent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSolver {
    program: String,
    args: Vec<String>,
}

impl Default for CommandSolver {
    fn default() -> Self {
        Self::new("dlv")
    }
}

impl CommandSolver {
    /// A `dlv` compatible solver at `program`, reporting the diagram vocabulary only.
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self::with_args(
            program,
            vec![
                "-silent".to_string(),
                format!("-filter={}", OUTPUT_PREDICATES.join(",")),
            ],
        )
    }

    /// A solver at `program` with custom arguments.
    /// `-N=<maxint>` and `--` (read from stdin) are appended to them.
    pub fn with_args<S: Into<String>>(program: S, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The command to run.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn arguments(&self, maxint: Option<u64>) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(maxint) = maxint {
            args.push(format!("-N={}", maxint));
        }
        args.push("--".to_string());
        args
    }
}

impl Solver for CommandSolver {
    fn solve(&self, program: &str, maxint: Option<u64>) -> Result<Vec<Vec<Atom>>> {
        let failure = |reason: String| {
            DiagramError::ExternalSolverFailure(format!("{}: {}", self.program, reason))
        };
        let args = self.arguments(maxint);
        log::debug!("run {} {}", self.program, args.join(" "));
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| failure(err.to_string()))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(program.as_bytes())
                .map_err(|err| failure(err.to_string()))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|err| failure(err.to_string()))?;
        if !output.status.success() {
            return Err(failure(format!(
                "{} ({})",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parser::parse_answer_sets(&stdout).map_err(|err| failure(err.to_string()))
    }
}

/// Parameters of the solver step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AspParams {
    /// Program text appended to the encoded diagrams.
    pub program: Option<String>,
    /// File whose content is appended to the encoded diagrams.
    pub file: Option<PathBuf>,
    /// Integer bound passed to the solver.
    pub maxint: Option<u64>,
}

/// The logic program handed to the solver: the indexed encoding of the diagrams and the user program.
pub fn program_text(diagrams: &[Diagram], params: &AspParams) -> Result<String> {
    let mut text: String = facts::encode_indexed(diagrams)?
        .iter()
        .map(|fact| format!("{}\n", fact))
        .collect();
    if let Some(program) = &params.program {
        text.push_str(program);
        text.push('\n');
    }
    if let Some(file) = &params.file {
        text.push_str(&std::fs::read_to_string(file)?);
        text.push('\n');
    }
    Ok(text)
}

/// Runs the solver on the diagrams and the user program; returns one diagram per answer set.
pub fn asp<S: Solver + ?Sized>(
    solver: &S,
    diagrams: &[Diagram],
    params: &AspParams,
) -> Result<Vec<Diagram>> {
    log::info!("[Start] asp on {} diagrams", diagrams.len());
    let text = program_text(diagrams, params)?;
    log::trace!("solver input:\n{}", text);
    let answer_sets = solver.solve(&text, params.maxint)?;
    let result = answer_sets
        .iter()
        .map(|atoms| facts::decode_atoms(atoms))
        .collect::<Result<Vec<_>>>()?;
    log::info!("[Done] asp: {} answer set(s)", result.len());
    Ok(result)
}
