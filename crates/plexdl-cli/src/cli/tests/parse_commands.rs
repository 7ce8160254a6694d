//! Tests for download, status, discard.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_download_defaults() {
    match parse(&["plexdl", "download"]) {
        CliCommand::Download {
            new,
            resume,
            job_file,
        } => {
            assert!(!new);
            assert!(!resume);
            assert!(job_file.is_none());
        }
        _ => panic!("expected Download"),
    }
}

#[test]
fn cli_parse_download_resume_with_job_file() {
    match parse(&["plexdl", "download", "--resume", "--job-file", "/tmp/job.json"]) {
        CliCommand::Download {
            new,
            resume,
            job_file,
        } => {
            assert!(!new);
            assert!(resume);
            assert_eq!(job_file, Some(PathBuf::from("/tmp/job.json")));
        }
        _ => panic!("expected Download"),
    }
}

#[test]
fn cli_parse_download_new_and_resume_conflict() {
    assert!(Cli::try_parse_from(["plexdl", "download", "--new", "--resume"]).is_err());
}

#[test]
fn cli_parse_status() {
    match parse(&["plexdl", "status"]) {
        CliCommand::Status { job_file } => assert!(job_file.is_none()),
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_discard_with_job_file() {
    match parse(&["plexdl", "discard", "--job-file", "j.json"]) {
        CliCommand::Discard { job_file } => {
            assert_eq!(job_file, Some(PathBuf::from("j.json")))
        }
        _ => panic!("expected Discard"),
    }
}

#[test]
fn cli_parse_unknown_command_fails() {
    assert!(Cli::try_parse_from(["plexdl", "add", "x"]).is_err());
}
