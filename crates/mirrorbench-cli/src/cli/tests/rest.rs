//! Tests for list and completions.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use clap_complete::Shell;

#[test]
fn cli_parse_list() {
    match parse(&["mirrorbench", "list"]) {
        CliCommand::List { catalog } => {
            assert!(catalog.countries.is_empty());
            assert!(catalog.catalog_file.is_none());
        }
        _ => panic!("expected List"),
    }
}

#[test]
fn cli_parse_list_country() {
    match parse(&["mirrorbench", "list", "--country", "SE"]) {
        CliCommand::List { catalog } => assert_eq!(catalog.countries, vec!["SE".to_string()]),
        _ => panic!("expected List"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["mirrorbench", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn cli_requires_a_subcommand() {
    assert!(Cli::try_parse_from(["mirrorbench"]).is_err());
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
