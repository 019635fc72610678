//! Command line surface of `cwlog-minder`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log_minder_core::contract::{validate_retention_days, MinderRequest, DEFAULT_RETENTION_DAYS};
use log_minder_core::retry::DEFAULT_MAX_ATTEMPTS;
use log_minder_core::streams::Emptiness;

use crate::adapters::connection::ConnectionOptions;
use crate::handlers::Operation;
use crate::settings::{DEFAULT_RETENTION_ENV, MAX_ATTEMPTS_ENV};

#[derive(Debug, Parser)]
#[command(
    name = "cwlog-minder",
    about = "Keeps CloudWatch Logs retention set and removes empty streams and groups"
)]
pub struct Cli {
    /// Only log what would change
    #[arg(long, global = true)]
    pub dry_run: bool,
    /// AWS region, overriding the default provider chain
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,
    /// Named profile from the shared AWS config files
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,
    /// Attempts per call when the service throttles
    #[arg(
        long,
        global = true,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set a retention policy on log groups that have none
    SetLogRetention {
        /// Retention in days
        #[arg(
            long,
            env = DEFAULT_RETENTION_ENV,
            default_value_t = DEFAULT_RETENTION_DAYS,
            value_parser = parse_retention_days
        )]
        days: u32,
        /// Also replace retention policies that differ
        #[arg(long)]
        overwrite: bool,
        #[command(flatten)]
        filter: GroupFilter,
    },
    /// Delete log streams whose events have all expired
    DeleteEmptyLogStreams {
        /// Delete expired streams even when they still hold events
        #[arg(long)]
        purge_non_empty: bool,
        /// How an expired stream is checked for remaining events
        #[arg(long, value_enum, default_value_t = EmptinessArg::Probe)]
        emptiness: EmptinessArg,
        #[command(flatten)]
        filter: GroupFilter,
    },
    /// Delete log groups with a retention policy and no streams
    DeleteEmptyLogGroups {
        #[command(flatten)]
        filter: GroupFilter,
    },
}

#[derive(Debug, Clone, Args)]
pub struct GroupFilter {
    /// Only visit log groups whose name starts with this prefix
    #[arg(long)]
    pub log_group_name_prefix: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmptinessArg {
    /// Fetch the most recent events of the stream
    Probe,
    /// Trust the stored bytes counter
    StoredBytes,
}

impl From<EmptinessArg> for Emptiness {
    fn from(value: EmptinessArg) -> Self {
        match value {
            EmptinessArg::Probe => Self::Probe,
            EmptinessArg::StoredBytes => Self::StoredBytes,
        }
    }
}

fn parse_retention_days(value: &str) -> Result<u32, String> {
    let days = value
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("'{value}' is not an integer value"))?;
    validate_retention_days(days).map_err(|error| error.to_string())?;
    Ok(days)
}

impl Cli {
    pub fn connection(&self) -> ConnectionOptions {
        ConnectionOptions {
            region: self.region.clone(),
            profile: self.profile.clone(),
        }
    }

    /// The operation to run and its request, as a Lambda would receive it.
    pub fn invocation(&self) -> (Operation, MinderRequest) {
        let mut request = MinderRequest::new(DEFAULT_RETENTION_DAYS);
        request.dry_run = self.dry_run;

        let (operation, filter) = match &self.command {
            Command::SetLogRetention {
                days,
                overwrite,
                filter,
            } => {
                request.days = *days;
                request.overwrite = *overwrite;
                (Operation::SetLogRetention, filter)
            }
            Command::DeleteEmptyLogStreams {
                purge_non_empty,
                emptiness,
                filter,
            } => {
                request.purge_non_empty = *purge_non_empty;
                request.emptiness = (*emptiness).into();
                (Operation::DeleteEmptyLogStreams, filter)
            }
            Command::DeleteEmptyLogGroups { filter } => (Operation::DeleteEmptyLogGroups, filter),
        };
        request.log_group_name_prefix = filter
            .log_group_name_prefix
            .clone()
            .filter(|prefix| !prefix.is_empty());
        (operation, request)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv = std::iter::once("cwlog-minder").chain(args.iter().copied());
        Cli::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn retention_flags_build_the_request() {
        let cli = parse(&[
            "set-log-retention",
            "--days",
            "14",
            "--overwrite",
            "--log-group-name-prefix",
            "/aws/lambda/",
            "--dry-run",
        ]);

        let (operation, request) = cli.invocation();
        assert_eq!(operation, Operation::SetLogRetention);
        assert_eq!(request.days, 14);
        assert!(request.overwrite);
        assert!(request.dry_run);
        assert_eq!(request.name_prefix(), Some("/aws/lambda/"));
    }

    #[test]
    fn stream_pruning_flags_build_the_request() {
        let cli = parse(&[
            "--dry-run",
            "delete-empty-log-streams",
            "--purge-non-empty",
            "--emptiness",
            "stored-bytes",
        ]);

        let (operation, request) = cli.invocation();
        assert_eq!(operation, Operation::DeleteEmptyLogStreams);
        assert!(request.purge_non_empty);
        assert!(request.dry_run);
        assert_eq!(request.emptiness, Emptiness::StoredBytes);
        assert_eq!(request.name_prefix(), None);
    }

    #[test]
    fn unsupported_retention_is_rejected() {
        let error = Cli::try_parse_from(["cwlog-minder", "set-log-retention", "--days", "31"])
            .expect_err("31 is not a CloudWatch retention value");
        assert!(error.to_string().contains("31"));
    }

    #[test]
    fn empty_prefix_means_every_group() {
        let cli = parse(&["delete-empty-log-groups", "--log-group-name-prefix", ""]);
        assert_eq!(cli.invocation().1.name_prefix(), None);
    }
}
