use std::ffi::OsString;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use shiftwrap::Error;
use shiftwrap::checkpoint;
use shiftwrap::graph;
use shiftwrap::runner;
use shiftwrap::score::{self, BuildScores, HttpPageSource};

const LOG_ENV: &str = "SHIFTWRAP_LOG";
const DEFAULT_VERSION_PREFIX: &str = "4.3";

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch candidate release builds from the upstream graph and score them by CI success
    FetchReleases {
        /// URL or local path of the release graph
        #[arg(short = 'u', long, default_value = graph::DEFAULT_GRAPH_URL)]
        url: String,
        /// Version prefix candidate builds must match
        #[arg(short = 'V', long = "version", default_value = DEFAULT_VERSION_PREFIX)]
        version_prefix: String,
        /// Do not compute build scores (no CI status pages fetched)
        #[arg(short = 'S', long)]
        skip_scores: bool,
        /// Show only the best scored build
        #[arg(short = 'B', long)]
        best: bool,
    },
    /// Run openshift-install pinned to the active checkpoint's release image
    Run {
        /// Arguments passed through to openshift-install
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
}

fn main() {
    init_logging();
    let args = Args::parse();
    let code = match args.cmd {
        Command::FetchReleases {
            url,
            version_prefix,
            skip_scores,
            best,
        } => cmd_fetch_releases(&url, &version_prefix, skip_scores, best),
        Command::Run { args } => cmd_run(&args),
    };
    std::process::exit(code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_fetch_releases(url: &str, prefix: &str, skip_scores: bool, best: bool) -> i32 {
    if best && skip_scores {
        eprintln!("no scores available");
        return 0;
    }

    let builds = match graph::builds_from_location(url, prefix) {
        Ok(builds) => builds,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let scores = if skip_scores {
        BuildScores::new()
    } else {
        score::score_builds(&builds, &HttpPageSource::default())
    };

    if best {
        match score::best_build(&builds, &scores) {
            Some(build) => print_build(build, &scores),
            None => {
                eprintln!("no build scored above zero for prefix '{prefix}'");
                return 3;
            }
        }
    } else {
        for build in &builds {
            print_build(build, &scores);
        }
    }
    0
}

fn print_build(build: &graph::BuildInfo, scores: &BuildScores) {
    println!(
        "{:<42} {:<96} {}",
        build.version,
        build.payload,
        scores.get(&build.version).copied().unwrap_or(0)
    );
}

fn cmd_run(args: &[OsString]) -> i32 {
    debug!("shiftwrap run start");

    let path = match runner::find_in_path(checkpoint::INSTALLER_BIN) {
        Some(path) => path,
        None => {
            eprintln!(
                "{}",
                Error::InstallerNotFound(checkpoint::INSTALLER_BIN.to_string())
            );
            return 1;
        }
    };
    debug!(installer = %path.display(), "installer found");

    // Sanity probe; the parsed identity is informational for now.
    match checkpoint::probe_installer(&path) {
        Ok(info) => debug!(
            version = %info.installer.version,
            commit = %info.installer.build_commit,
            "probed installer"
        ),
        Err(e) => {
            eprintln!("{e}");
            return 2;
        }
    }

    let location = checkpoint::checkpoints_location();
    let cp = match checkpoint::active_from_location(&location) {
        Ok(cp) => cp,
        Err(e) => {
            eprintln!("{e}");
            return 4;
        }
    };
    if !cp.is_valid() {
        eprintln!("{}", Error::InvalidCheckpoint(format!("{cp:?}")));
        return 8;
    }

    match runner::run_installer(&path, args, &cp.release_image_url) {
        Ok(code) => {
            if code != 0 {
                eprintln!("{} exited with code {code}", checkpoint::INSTALLER_BIN);
            }
            debug!("shiftwrap run done");
            code
        }
        Err(e) => {
            eprintln!("{e}");
            runner::SENTINEL_EXIT_CODE
        }
    }
}
