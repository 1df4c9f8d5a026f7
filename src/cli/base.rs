//! Base functionality for the Riak Search CLI
//!
//! This module provides core utilities and traits used across the CLI including:
//! - Response handling and printing
//! - Common traits for command processing

use atty::Stream;
use colored::Colorize;
use colored_json::prelude::*;

use crate::cluster::Cluster;
use crate::error::SearchError;
use crate::search_api::response::Response;

/// Evaluates a search result, prints it and returns the process exit code
///
/// # Arguments
/// * `result` - The outcome of a search
pub fn evaluate_and_print_response(result: Result<Response, SearchError>) -> exitcode::ExitCode {
    match result {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(json) => {
                redirect_stream(&json);
                exitcode::OK
            }
            Err(e) => {
                print_error(e.to_string());
                exitcode::SOFTWARE
            }
        },
        Err(SearchError::Unavailable) => {
            print_error(SearchError::Unavailable.to_string());
            exitcode::UNAVAILABLE
        }
    }
}

/// Redirects output to appropriate stream based on context
///
/// If users are redirecting the output to a file, we don't want to print
/// the success message but only the JSON response to ensure that the output
/// is clean and can be used in other scripts
fn redirect_stream(json_str: &str) {
    if atty::is(Stream::Stdout) {
        println!("{}", success_message());
        match json_str.to_colored_json_auto() {
            Ok(colored) => println!("{}\n", colored),
            Err(_) => println!("{}\n", json_str),
        }
    } else {
        println!("{}", json_str);
    }
}

fn success_message() -> String {
    format!(
        "{} {} - Received the following response: \n",
        "└── ".bold(),
        "Success!".green().bold()
    )
}

pub(crate) fn print_error(error: String) {
    eprintln!("\n{} {}\n", "Error:".red().bold(), error);
}

/// Trait for processing CLI subcommands
///
/// Implementors define how to handle their specific subcommand variant
/// against the configured cluster.
pub trait Matcher {
    /// Process this subcommand and return the exit code
    ///
    /// # Arguments
    /// * `cluster` - The cluster to send requests to
    fn process(self, cluster: &Cluster) -> exitcode::ExitCode;
}
