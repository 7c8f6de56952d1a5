use std::{
    env,
    fs::File,
    io::{BufRead, BufReader},
};

use anyhow::{anyhow, Context as _};
use cell_lisp::{
    config::{Command, Config, HELP_MSG},
    logger,
    repl::{LispHelper, Repl},
    Interpreter,
};
use colored::Colorize;
use log::{debug, info, warn};
use rustyline::error::ReadlineError;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env().map_err(|err| anyhow!(err))?;
    let config = match config.with_args(env::args().skip(1)).map_err(|err| anyhow!(err))? {
        Command::Help => {
            println!("{HELP_MSG}");
            return Ok(());
        }
        Command::Run(config) => config,
    };
    logger::init(config.log_level)?;

    let interpreter = Interpreter::new(&config);
    info!("case folding: {:?}", config.case_fold);
    match &config.script {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            let lines = BufReader::new(file).lines();
            run_lines(&interpreter, lines)
        }
        None => run_repl(&interpreter, &config),
    }
}

/// Prints the value of each form on the line as soon as it is evaluated.
fn report(interpreter: &Interpreter, line: &str, more: impl FnMut() -> Option<String>) {
    let result = interpreter.read(line, more).and_then(|exprs| {
        exprs.iter().try_for_each(|expr| {
            println!("{}", interpreter.eval(expr)?);
            Ok(())
        })
    });
    if let Err(err) = result {
        debug!("evaluation of `{}` failed", line.trim());
        println!("{}", err.to_string().red());
    }
}

fn run_lines<I>(interpreter: &Interpreter, mut lines: I) -> anyhow::Result<()>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    while let Some(line) = lines.next() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        // A read failure on a continuation line ends the expression like EOF.
        report(interpreter, &line, || lines.next().and_then(Result::ok));
    }
    Ok(())
}

fn run_repl(interpreter: &Interpreter, config: &Config) -> anyhow::Result<()> {
    let mut editor = Repl::new()?;
    editor.set_helper(Some(LispHelper));

    loop {
        let line = match editor.readline(&config.prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        editor.add_history_entry(line.as_str())?;

        report(interpreter, &line, || {
            let next = editor.readline(&config.continuation_prompt).ok()?;
            if let Err(err) = editor.add_history_entry(next.as_str()) {
                warn!("failed to record history: {err}");
            }
            Some(next)
        });
    }
    Ok(())
}
