//! The `search` command.

use structopt::StructOpt;
use tokio::runtime::Runtime;

use crate::cli::base::{evaluate_and_print_response, print_error, Matcher};
use crate::cluster::{Bucket, Cluster};
use crate::search_api::query::Query;
use crate::search_api::search::SearchClient;

/// Search a bucket of the configured cluster
#[derive(StructOpt, Debug)]
#[structopt(about = "Search a Riak bucket")]
pub struct SearchCommand {
    /// The bucket to search in.
    #[structopt(short, long, help = "The bucket to search in")]
    pub bucket: String,

    #[structopt(flatten)]
    pub query: Query,
}

impl Matcher for SearchCommand {
    /// Sends the query with the default search client and prints the response.
    fn process(self, cluster: &Cluster) -> exitcode::ExitCode {
        let runtime = match Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                print_error(format!("Failed to start runtime: {}", e));
                return exitcode::OSERR;
            }
        };

        let client = SearchClient::default();
        let bucket = Bucket::new(self.bucket);
        let result = runtime.block_on(client.search(cluster, &bucket, self.query));

        evaluate_and_print_response(result)
    }
}
