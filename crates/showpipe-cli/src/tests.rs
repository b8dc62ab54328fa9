use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["showpipe-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["showpipe-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["showpipe-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn run_without_years_leaves_default_to_pipeline() {
    let cli = Cli::try_parse_from(["showpipe-cli", "run"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Run { years: None })));
}

#[test]
fn run_parses_years() {
    let cli = Cli::try_parse_from(["showpipe-cli", "run", "--years", "5"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Run { years: Some(5) })));
}

#[test]
fn run_accepts_negative_years_for_validation_downstream() {
    let cli = Cli::try_parse_from(["showpipe-cli", "run", "--years", "-1"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Run { years: Some(-1) })));
}

#[test]
fn run_rejects_non_numeric_years() {
    let result = Cli::try_parse_from(["showpipe-cli", "run", "--years", "ten"]);
    assert!(result.is_err());
}

#[test]
fn status_parses_run_id() {
    let id = "6f1c2f4e-8a4b-4c1e-9a57-0d6a3c1b2e90";
    let cli = Cli::try_parse_from(["showpipe-cli", "status", id]).unwrap();
    match cli.command {
        Some(Commands::Status { run_id }) => assert_eq!(run_id.to_string(), id),
        other => panic!("expected status command, got {other:?}"),
    }
}

#[test]
fn status_rejects_malformed_run_id() {
    let result = Cli::try_parse_from(["showpipe-cli", "status", "not-a-uuid"]);
    assert!(result.is_err());
}

#[test]
fn top_defaults_limit_to_ten() {
    let cli = Cli::try_parse_from(["showpipe-cli", "top"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Top { limit: 10 })));
}

#[test]
fn top_parses_limit() {
    let cli = Cli::try_parse_from(["showpipe-cli", "top", "--limit", "3"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Top { limit: 3 })));
}

#[test]
fn parses_actors_command() {
    let cli = Cli::try_parse_from(["showpipe-cli", "actors"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Actors)));
}
