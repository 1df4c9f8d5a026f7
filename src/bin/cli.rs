use std::path::PathBuf;

use colored::Colorize;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use riak_search::cli::base::Matcher;
use riak_search::cli::search::SearchCommand;
use riak_search::cluster::Cluster;
use riak_search::config::{ClusterConfig, ClustersFile};
use riak_search::error::ConfigError;

static HEADER: &str = r#"
--- Riak Search Command Line Interface ---
"#;

#[derive(StructOpt, Debug)]
struct GlobalOpts {
    /// Configuration file declaring named clusters (TOML, JSON or YAML)
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Name of the cluster to use from the configuration file
    #[structopt(long, default_value = "default")]
    cluster: String,
}

#[derive(StructOpt, Debug)]
#[structopt(about = "CLI to search Riak buckets")]
struct Cli {
    #[structopt(flatten)]
    global: GlobalOpts,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt, Debug)]
enum Command {
    Search(SearchCommand),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::from_args();

    let cluster = match setup_cluster(&cli.global) {
        Ok(cluster) => cluster,
        Err(e) => {
            eprintln!("\n{} {}\n", "Error:".red().bold(), e);
            std::process::exit(exitcode::CONFIG);
        }
    };

    if atty::is(atty::Stream::Stdout) {
        println!("{}", HEADER.bold());
    }

    let code = match cli.cmd {
        Command::Search(command) => command.process(&cluster),
    };

    std::process::exit(code);
}

// A configuration file takes precedence. Without one, the cluster is read
// from the RIAK_* environment variables.
fn setup_cluster(opts: &GlobalOpts) -> Result<Cluster, ConfigError> {
    match &opts.config {
        Some(path) => ClustersFile::from_path(path)?
            .cluster(&opts.cluster)?
            .build(),
        None => ClusterConfig::from_env()?.build(),
    }
}
