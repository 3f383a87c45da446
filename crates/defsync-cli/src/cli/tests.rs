//! CLI parse tests.

use super::{AlgoArg, Cli, CliCommand};
use clap::Parser;
use std::path::Path;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_no_subcommand_defaults_to_update() {
    let cli = parse(&["defsync"]);
    assert!(cli.command.is_none());
    assert!(cli.config.is_none());
}

#[test]
fn cli_parse_update() {
    match parse(&["defsync", "update"]).command {
        Some(CliCommand::Update { no_settle }) => assert!(!no_settle),
        other => panic!("expected Update, got {other:?}"),
    }
    match parse(&["defsync", "update", "--no-settle"]).command {
        Some(CliCommand::Update { no_settle }) => assert!(no_settle),
        other => panic!("expected Update --no-settle, got {other:?}"),
    }
}

#[test]
fn cli_parse_check_with_global_overrides() {
    let cli = parse(&[
        "defsync",
        "check",
        "--catalog-url",
        "http://mirror.local/defs",
        "--tool",
        "/opt/vipre/scanner",
        "--workspace",
        "/srv/defsync",
    ]);
    assert!(matches!(cli.command, Some(CliCommand::Check)));
    assert_eq!(cli.catalog_url.as_deref(), Some("http://mirror.local/defs"));
    assert_eq!(cli.tool_path.as_deref(), Some(Path::new("/opt/vipre/scanner")));
    assert_eq!(cli.workspace.as_deref(), Some(Path::new("/srv/defsync")));
}

#[test]
fn cli_parse_config_before_subcommand() {
    let cli = parse(&["defsync", "--config", "/etc/defsync.toml", "update"]);
    assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/defsync.toml")));
}

#[test]
fn cli_parse_checksum() {
    match parse(&["defsync", "checksum", "/tmp/sigs.sgnx"]).command {
        Some(CliCommand::Checksum { path, algo }) => {
            assert_eq!(path, Path::new("/tmp/sigs.sgnx"));
            assert_eq!(algo, AlgoArg::Md5);
        }
        other => panic!("expected Checksum, got {other:?}"),
    }
    match parse(&["defsync", "checksum", "x", "--algo", "sha256"]).command {
        Some(CliCommand::Checksum { algo, .. }) => assert_eq!(algo, AlgoArg::Sha256),
        other => panic!("expected Checksum --algo sha256, got {other:?}"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["defsync", "completions", "bash"]).command {
        Some(CliCommand::Completions { shell }) => {
            assert_eq!(shell, clap_complete::Shell::Bash)
        }
        other => panic!("expected Completions, got {other:?}"),
    }
}

#[test]
fn cli_rejects_unknown_algo_and_missing_path() {
    assert!(Cli::try_parse_from(["defsync", "checksum", "x", "--algo", "crc32"]).is_err());
    assert!(Cli::try_parse_from(["defsync", "checksum"]).is_err());
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
