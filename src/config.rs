use std::{env, path::PathBuf, str::FromStr};

use log::LevelFilter;

/// How symbol names are normalized when they are read and when the root
/// namespace is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFold {
    #[default]
    Lower,
    Upper,
    Preserve,
}

impl CaseFold {
    pub fn apply(self, name: &str) -> String {
        match self {
            CaseFold::Lower => name.to_lowercase(),
            CaseFold::Upper => name.to_uppercase(),
            CaseFold::Preserve => name.to_owned(),
        }
    }
}

impl FromStr for CaseFold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lower" => Ok(CaseFold::Lower),
            "upper" => Ok(CaseFold::Upper),
            "preserve" | "none" => Ok(CaseFold::Preserve),
            other => Err(format!("unknown case folding `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub case_fold: CaseFold,
    pub prompt: String,
    pub continuation_prompt: String,
    pub log_level: LevelFilter,
    /// Script to run instead of the interactive loop.
    pub script: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            case_fold: CaseFold::default(),
            prompt: "> ".to_string(),
            continuation_prompt: "... ".to_string(),
            log_level: LevelFilter::Warn,
            script: None,
        }
    }
}

pub const CASE_VAR: &str = "CELL_LISP_CASE";
pub const LOG_VAR: &str = "CELL_LISP_LOG";

pub const HELP_MSG: &str = r#"Usage: cell_lisp [FILE] [--case lower|upper|preserve] [--log LEVEL] [--help|-h]

  FILE  Script to evaluate line by line instead of starting the prompt

Options:
  --case   Case folding applied to symbol names (default: lower)
  --log    Log level: off, error, warn, info, debug, trace (default: warn)
  -h, --help  Print this message

Environment:
  CELL_LISP_CASE, CELL_LISP_LOG  Defaults for --case and --log"#;

/// What the command line asked for.
#[derive(Debug)]
pub enum Command {
    Run(Config),
    Help,
}

impl Config {
    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();
        if let Ok(case) = env::var(CASE_VAR) {
            config.case_fold = case.parse()?;
        }
        if let Ok(level) = env::var(LOG_VAR) {
            config.log_level = parse_level(&level)?;
        }
        Ok(config)
    }

    /// Applies command line arguments (without the executable's name) on top
    /// of `self`.
    pub fn with_args<I>(mut self, args: I) -> Result<Command, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                "--case" => {
                    let value = args.next().ok_or("--case needs a value")?;
                    self.case_fold = value.parse()?;
                }
                "--log" => {
                    let value = args.next().ok_or("--log needs a value")?;
                    self.log_level = parse_level(&value)?;
                }
                flag if flag.starts_with("--") => return Err(format!("unknown option `{flag}`")),
                file => {
                    if self.script.is_some() {
                        return Err(format!("unexpected argument `{file}`"));
                    }
                    self.script = Some(PathBuf::from(file));
                }
            }
        }
        Ok(Command::Run(self))
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("unknown log level `{level}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_case_fold() {
        assert_eq!(CaseFold::Lower.apply("CaDdR"), "caddr");
        assert_eq!(CaseFold::Upper.apply("car"), "CAR");
        assert_eq!(CaseFold::Preserve.apply("Car"), "Car");
        assert_eq!("UPPER".parse::<CaseFold>(), Ok(CaseFold::Upper));
        assert!("sideways".parse::<CaseFold>().is_err());
    }

    #[test]
    fn test_args() {
        let Ok(Command::Run(config)) =
            Config::default().with_args(args(&["--case", "upper", "--log", "debug", "x.lisp"]))
        else {
            panic!("expected a run command");
        };
        assert_eq!(config.case_fold, CaseFold::Upper);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.script, Some(PathBuf::from("x.lisp")));

        assert!(matches!(
            Config::default().with_args(args(&["-h"])),
            Ok(Command::Help)
        ));
        assert!(Config::default().with_args(args(&["--case"])).is_err());
        assert!(Config::default().with_args(args(&["--bogus"])).is_err());
    }
}
