use clap::{builder::ValueParser, Arg, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("DTG_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(level: &str) -> Result<Option<u8>, clap::Error> {
        temp_env::with_var("DTG_LOG_LEVEL", Some(level), || {
            let command = with_args(Command::new("test"));
            let matches = command.try_get_matches_from(vec!["test"])?;
            Ok(matches.get_one::<u8>(ARG_VERBOSITY).copied())
        })
    }

    #[test]
    fn log_level_env_parses_names_and_numbers() {
        for (input, expected) in [
            ("error", 0u8),
            ("WARN", 1),
            ("info", 2),
            ("Debug", 3),
            ("trace", 4),
            ("3", 3),
        ] {
            assert_eq!(parse(input).ok().flatten(), Some(expected), "input {input}");
        }

        assert!(parse("loud").is_err());
    }

    #[test]
    fn repeated_flag_counts() {
        let command = with_args(Command::new("test"));
        let matches = command.get_matches_from(vec!["test", "-vvv"]);
        assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(3));
    }
}
