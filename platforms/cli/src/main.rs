use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use turr::{
    analyze, Project, ProgramManager, ProjectLoader, Simulation, SimulationStatus, Step, Tape,
    TurrError, DEFAULT_EMPTY_CHARACTER, DEFAULT_MAX_STEPS,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  turr-cli --project ./adder --machine main --input 11+111
  turr-cli --builtin 'Submachine call' --debug
  echo 1001 | turr-cli --builtin 'Even ones'")]
struct Cli {
    /// Directory containing the project's .turr machine files
    #[clap(short, long, conflicts_with = "builtin")]
    project: Option<PathBuf>,

    /// Name of a built-in program to run instead of a project directory
    #[clap(short, long)]
    builtin: Option<String>,

    /// The machine to start in
    #[clap(short, long)]
    machine: Option<String>,

    /// The initial tape contents. Read from stdin when omitted and stdin is piped
    #[clap(short, long)]
    input: Option<String>,

    /// The empty character of the tape
    #[clap(long, default_value_t = DEFAULT_EMPTY_CHARACTER)]
    blank: char,

    /// Stop after this many steps (0 runs without a bound)
    #[clap(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Report project issues before running
    #[clap(long)]
    check: bool,

    /// List the built-in programs and exit
    #[clap(long)]
    list: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, TurrError> {
    if cli.list {
        for name in ProgramManager::list_program_names() {
            println!("{}", name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let (project, default_machine, default_input) = load(cli)?;
    debug!(
        machines = project.machine_count(),
        default_machine = default_machine.as_str(),
        "project loaded"
    );

    if cli.check {
        let issues = analyze(&project);
        for issue in &issues {
            let error: TurrError = issue.clone().into();
            eprintln!("warning: {}", error);
        }
    }

    let machine = cli.machine.clone().unwrap_or(default_machine);
    let input = match &cli.input {
        Some(input) => input.clone(),
        None if atty::isnt(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| TurrError::FileError(format!("Failed to read from stdin: {}", e)))?;
            buffer.trim_end_matches(['\n', '\r']).to_string()
        }
        None => default_input,
    };

    let mut simulation = Simulation::new(&project, &machine, Tape::new(&input, cli.blank))?;

    let status = if cli.debug {
        print_state(&simulation);
        loop {
            if cli.max_steps != 0 && simulation.step_count() >= cli.max_steps {
                break simulation.status();
            }
            match simulation.step()? {
                Step::Continue => print_state(&simulation),
                Step::Halt(status) => break status,
            }
        }
    } else if cli.max_steps == 0 {
        simulation.run()?
    } else {
        simulation.run_for(cli.max_steps)?
    };

    let outcome = match status {
        SimulationStatus::Accepted => "accepted",
        SimulationStatus::Rejected => "rejected",
        SimulationStatus::Running => "step limit reached",
    };
    println!(
        "{} after {} steps in {}/{}",
        outcome,
        simulation.step_count(),
        simulation.machine().name(),
        simulation.state().name()
    );
    println!("{}", simulation.tape().contents());

    Ok(if status == SimulationStatus::Accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Loads the project to run, with the machine and input it defaults to.
fn load(cli: &Cli) -> Result<(Project, String, String), TurrError> {
    match (&cli.project, &cli.builtin) {
        (Some(directory), _) => Ok((
            ProjectLoader::load_project(directory)?,
            "main".to_string(),
            String::new(),
        )),
        (None, Some(name)) => {
            let program = ProgramManager::get_program_by_name(name)?;
            Ok((program.project, program.machine, program.input))
        }
        (None, None) => Err(TurrError::ValidationError(
            "Provide --project or --builtin".to_string(),
        )),
    }
}

fn print_state(simulation: &Simulation) {
    let path = simulation
        .frames()
        .map(|frame| format!("{}/{}", frame.machine().name(), frame.state().name()))
        .collect::<Vec<_>>()
        .join(" > ");

    println!(
        "Step: {}, Frames: {}, Head: {}, Tape: [{}]",
        simulation.step_count(),
        path,
        simulation.head().position(),
        simulation.tape().contents()
    );
}
