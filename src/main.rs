mod app;
mod config;
mod export;
mod kattis;
mod output;

use config::{KattisRc, SearchPath};
use kattis::{Agent, Endpoints, Kattis};
use log::{error, info};
use std::process::exit;

const OUTPUT_NAME: &str = "kattis";

// Log an error and everything that caused it, then give up.
fn fail<E: std::error::Error>(what: &str, e: E) -> ! {
    error!("{}: {}", what, e);
    let mut cause = e.source();
    while let Some(c) = cause {
        error!("caused by: {}", c);
        cause = c.source();
    }
    exit(1);
}

fn main() {
    use app::Parser;
    let args = app::App::parse();
    let v = usize::from(args.verbose).saturating_add(1);
    let modules = &[module_path!(), "reqwest"];
    stderrlog::new()
        .modules(modules.iter().cloned())
        .verbosity(v)
        .init()
        .unwrap();

    info!("this is kattis-fetch, {}", app::VERSION);

    if !app::check_email(&args.email) {
        error!("please enter a valid Kattis account email address");
        exit(1);
    }

    let rc = KattisRc::load(&SearchPath::default_paths()).unwrap_or_else(|e| {
        error!("{}", e);
        exit(1);
    });

    let credential = rc.credential().unwrap_or_else(|e| {
        error!("{}", e);
        exit(1);
    });

    let endpoints = Endpoints::from_config(&rc)
        .unwrap_or_else(|e| fail("can not build Kattis URLs", e));

    let agent = Agent::new(&args.email).unwrap_or_else(|e| fail("can not set up HTTP", e));

    let session = Kattis::new(agent, endpoints)
        .login(&rc.user.username, &credential)
        .unwrap_or_else(|e| fail("login failed", e));

    let path = output::json_path(OUTPUT_NAME);
    let n = export::export(&session, export::DEFAULT_MAX_PAGES, &path)
        .unwrap_or_else(|e| fail("export failed", e));

    info!("{} solved problems written to {}", n, path.display());
}
