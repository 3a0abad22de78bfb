#![deny(missing_docs)]

pub use clap::Parser;

/// Version automatically generated from git
pub const VERSION: &str = git_version::git_version!(
    args = ["--tags", "--always", "--dirty=-modified"],
    fallback = "unknown"
);

/// Downloads user's Kattis statistics
#[derive(Parser, Debug)]
#[command(author, version = VERSION)]
pub struct App {
    /// Email address used for Kattis account
    #[arg(value_name = "kattis_email")]
    pub email: String,

    /// Sets the level of verbosity
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Checks that the address looks like an email address.
pub fn check_email(email: &str) -> bool {
    let re = regex::Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap();
    re.is_match(email)
}
