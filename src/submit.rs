//! Upload of the submission file to the competition bucket with the MinIO
//! client (`mc`).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_TEAM_FILE: &str = "response_1723016820162.json";
pub const DEFAULT_SUBMISSION_PATH: &str = "data/submission.csv";
pub const DEFAULT_ENDPOINT: &str = "https://s3.opensky-network.org/";
pub const DEFAULT_ALIAS: &str = "dc24";

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("cannot read team file {}: {source}", .path.display())]
    TeamFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("team file {} is malformed: {source}", .path.display())]
    MalformedTeamFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "submission file {} does not exist, save the submission there and try again",
        .0.display()
    )]
    MissingSubmission(PathBuf),

    #[error("submission not possible, is the MinIO client (mc) installed and configured?")]
    Setup,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamInfo {
    pub team_id: String,
    pub team_name: String,
}

impl TeamInfo {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SubmitError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SubmitError::TeamFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            SubmitError::MalformedTeamFile {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Remote object name, `<team_name>_v<version>_<team_id>.csv`.
    pub fn submission_name(&self, version: u32) -> String {
        format!("{}_v{}_{}.csv", self.team_name, version, self.team_id)
    }
}

/// Runs an external program to completion.
pub trait CommandRunner {
    /// `Err` carries a description of what went wrong, for logging only.
    fn run(&mut self, program: &str, args: &[String]) -> Result<(), String>;
}

/// Runs commands as child processes, inheriting stdio.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, program: &str, args: &[String]) -> Result<(), String> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| format!("failed to start {program}: {e}"))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{program} exited with {status}"))
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub team_file: PathBuf,
    pub submission_path: PathBuf,
    pub client: String,
    pub alias: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
}

impl SubmitConfig {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            team_file: PathBuf::from(DEFAULT_TEAM_FILE),
            submission_path: PathBuf::from(DEFAULT_SUBMISSION_PATH),
            client: "mc".to_string(),
            alias: DEFAULT_ALIAS.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Argument lists of the `mc` invocations, in order.
    fn commands(&self, remote_name: &str) -> Vec<Vec<String>> {
        vec![
            vec![
                "alias".into(),
                "set".into(),
                self.alias.clone(),
                self.endpoint.clone(),
                self.access_key.clone(),
                self.secret_key.clone(),
            ],
            vec!["alias".into(), "list".into()],
            vec![
                "cp".into(),
                self.submission_path.display().to_string(),
                format!("{}/submission/{}", self.alias, remote_name),
            ],
        ]
    }
}

/// Uploads the submission file as version `version` of the team's entry.
/// Returns the remote object name.
///
/// Nothing is executed when the local submission file is missing. Any
/// failure of the client collapses into [`SubmitError::Setup`].
pub fn submit_solution<R: CommandRunner>(
    config: &SubmitConfig,
    version: u32,
    runner: &mut R,
) -> Result<String, SubmitError> {
    let team = TeamInfo::from_file(&config.team_file)?;
    let remote_name = team.submission_name(version);

    if !config.submission_path.exists() {
        return Err(SubmitError::MissingSubmission(config.submission_path.clone()));
    }

    for args in config.commands(&remote_name) {
        if let Err(cause) = runner.run(&config.client, &args) {
            debug!(%cause, "submission command failed");
            return Err(SubmitError::Setup);
        }
    }

    info!(remote = %remote_name, "submission uploaded");
    Ok(remote_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(String, Vec<String>)>,
        fail_at: Option<usize>,
    }

    impl CommandRunner for Recorder {
        fn run(&mut self, program: &str, args: &[String]) -> Result<(), String> {
            self.calls.push((program.to_string(), args.to_vec()));
            match self.fail_at {
                Some(i) if i + 1 == self.calls.len() => Err("exit status: 1".into()),
                _ => Ok(()),
            }
        }
    }

    fn setup(with_submission: bool) -> (tempfile::TempDir, SubmitConfig) {
        let dir = tempfile::tempdir().unwrap();
        let team_file = dir.path().join("team.json");
        std::fs::write(&team_file, r#"{"team_id": "a1b2", "team_name": "team_tow"}"#).unwrap();

        let submission_path = dir.path().join("submission.csv");
        if with_submission {
            std::fs::write(&submission_path, "flight_id,tow\n1,60000\n").unwrap();
        }

        let config = SubmitConfig {
            team_file,
            submission_path,
            ..SubmitConfig::new("access", "secret")
        };
        (dir, config)
    }

    #[test]
    fn test_submission_name() {
        let team = TeamInfo {
            team_id: "a1b2".into(),
            team_name: "team_tow".into(),
        };
        assert_eq!(team.submission_name(3), "team_tow_v3_a1b2.csv");
    }

    #[test]
    fn test_missing_submission_runs_nothing() {
        let (_dir, config) = setup(false);
        let mut runner = Recorder::default();

        let err = submit_solution(&config, 0, &mut runner).unwrap_err();
        assert!(matches!(err, SubmitError::MissingSubmission(_)));
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn test_runs_alias_then_copy() {
        let (_dir, config) = setup(true);
        let mut runner = Recorder::default();

        let name = submit_solution(&config, 2, &mut runner).unwrap();
        assert_eq!(name, "team_tow_v2_a1b2.csv");
        assert_eq!(runner.calls.len(), 3);
        assert!(runner.calls.iter().all(|(p, _)| p == "mc"));
        assert_eq!(runner.calls[0].1[..2], ["alias", "set"]);
        assert_eq!(runner.calls[1].1, ["alias", "list"]);
        assert_eq!(runner.calls[2].1[2], "dc24/submission/team_tow_v2_a1b2.csv");
    }

    #[test]
    fn test_command_failure_is_generic() {
        let (_dir, config) = setup(true);
        let mut runner = Recorder {
            fail_at: Some(1),
            ..Recorder::default()
        };

        let err = submit_solution(&config, 0, &mut runner).unwrap_err();
        assert!(matches!(err, SubmitError::Setup));
        assert_eq!(runner.calls.len(), 2);
    }

    #[test]
    fn test_malformed_team_file() {
        let (dir, mut config) = setup(true);
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"team_id": "a1b2"}"#).unwrap();
        config.team_file = bad;

        let err = submit_solution(&config, 0, &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, SubmitError::MalformedTeamFile { .. }));
    }

    #[test]
    fn test_process_runner_reports_missing_binary() {
        let mut runner = ProcessRunner;
        assert!(runner
            .run("definitely-not-an-installed-binary-7c1f", &[])
            .is_err());
    }
}
