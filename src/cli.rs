use crate::data::index::build_index;
use crate::data::merge::{self, PipelineConfig};
use crate::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Validate,
    Build,
    Watch,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("validate") => Some(Command::Validate),
        Some("build") => Some(Command::Build),
        Some("watch") => Some(Command::Watch),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Validate) => handle_validate(),
        Some(Command::Build) => handle_build(),
        Some(Command::Watch) => handle_watch(),
        None => {
            eprintln!("usage: vitrine <validate|build|watch>");
            2
        }
    }
}

pub fn handle_validate() -> i32 {
    let config = PipelineConfig::from_env();
    match merge::validate_all(&config) {
        Ok(outcome) => {
            println!(
                "OK: validated {} dataset file(s), {} project(s).",
                outcome.files.len(),
                outcome.projects.len()
            );
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

pub fn handle_build() -> i32 {
    let config = PipelineConfig::from_env();
    match build_index(&config) {
        Ok(summary) => {
            println!(
                "Wrote {} project(s) from {} dataset file(s) to:\n- {}\n- {}",
                summary.project_count,
                summary.dataset_count,
                summary.index_path.display(),
                summary.meta_path.display()
            );
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

pub fn handle_watch() -> i32 {
    let config = PipelineConfig::from_env();
    match watch::run_watch(&config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("watch error: {err}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command};

    #[test]
    fn known_subcommands_parse() {
        let args = |cmd: &str| vec!["vitrine".to_string(), cmd.to_string()];
        assert_eq!(parse_command(&args("validate")), Some(Command::Validate));
        assert_eq!(parse_command(&args("build")), Some(Command::Build));
        assert_eq!(parse_command(&args("watch")), Some(Command::Watch));
    }

    #[test]
    fn unknown_or_missing_subcommand_is_rejected() {
        assert_eq!(parse_command(&["vitrine".to_string()]), None);
        assert_eq!(
            parse_command(&["vitrine".to_string(), "serve".to_string()]),
            None
        );
    }
}
