use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["homealert-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["homealert-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn alerts_check_defaults_to_configured_window() {
    let cli =
        Cli::try_parse_from(["homealert-cli", "alerts", "check"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Alerts {
            command: AlertCommands::Check {
                hours_back: None,
                dry_run: false
            }
        })
    ));
}

#[test]
fn alerts_check_accepts_window_and_dry_run() {
    let cli = Cli::try_parse_from([
        "homealert-cli",
        "alerts",
        "check",
        "--hours-back",
        "48",
        "--dry-run",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Alerts {
            command: AlertCommands::Check {
                hours_back: Some(48),
                dry_run: true
            }
        })
    ));
}

#[test]
fn alerts_check_rejects_negative_window() {
    let result = Cli::try_parse_from(["homealert-cli", "alerts", "check", "--hours-back", "-3"]);
    assert!(result.is_err());
}

#[test]
fn searches_preview_parses_id_and_limit() {
    let id = Uuid::new_v4();
    let id_arg = id.to_string();
    let cli = Cli::try_parse_from([
        "homealert-cli",
        "searches",
        "preview",
        id_arg.as_str(),
        "--limit",
        "5",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Searches {
            command: SearchCommands::Preview { public_id, limit },
        }) => {
            assert_eq!(public_id, id);
            assert_eq!(limit, 5);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn searches_show_rejects_malformed_id() {
    let result = Cli::try_parse_from(["homealert-cli", "searches", "show", "not-a-uuid"]);
    assert!(result.is_err());
}

#[test]
fn searches_list_takes_owner_email() {
    let cli = Cli::try_parse_from(["homealert-cli", "searches", "list", "amina@example.com"])
        .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Searches {
            command: SearchCommands::List { email },
        }) => assert_eq!(email, "amina@example.com"),
        other => panic!("unexpected command: {other:?}"),
    }
}
