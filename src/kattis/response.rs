use reqwest::StatusCode;
use url::Url;

mod error {
    error_chain::error_chain! {}
}

use error::*;
use error_chain::bail;

// What we were doing when the server answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Login,
    Submissions,
    Profile,
}

impl Stage {
    fn failed(&self) -> &'static str {
        match self {
            Stage::Login => "login failed",
            Stage::Submissions => "fetching submissions failed",
            Stage::Profile => "fetching profile failed",
        }
    }

    fn forbidden(&self) -> &'static str {
        match self {
            Stage::Login => "incorrect username or password/token (403)",
            Stage::Submissions | Stage::Profile => "access denied (403)",
        }
    }

    fn not_found(&self) -> &'static str {
        match self {
            Stage::Login => "incorrect login URL (404)",
            Stage::Submissions => "incorrect submissions URL (404)",
            Stage::Profile => "incorrect profile URL (404)",
        }
    }
}

pub fn check_status(stage: Stage, status: StatusCode) -> Result<()> {
    let why = match status {
        StatusCode::OK => return Ok(()),
        StatusCode::FORBIDDEN => stage.forbidden().to_owned(),
        StatusCode::NOT_FOUND => stage.not_found().to_owned(),
        s => format!("status code: {}", s.as_u16()),
    };
    bail!("{}: {}", stage.failed(), why)
}

pub enum Response {
    Content(String),
    Redirection(Url),
}

impl Response {
    pub fn wrap(stage: Stage, resp: reqwest::blocking::Response) -> Result<Response> {
        if resp.status().is_redirection() {
            if let Some(loc) = resp.headers().get(reqwest::header::LOCATION) {
                let loc = loc.to_str().chain_err(|| "can not parse LOCATION")?;
                // LOCATION may be relative to the page we asked for.
                let u = resp
                    .url()
                    .join(loc)
                    .chain_err(|| "can not parse LOCATION as URL")?;
                return Ok(Self::Redirection(u));
            }
        }

        check_status(stage, resp.status())?;
        Ok(Self::Content(
            resp.text().chain_err(|| "cannot read response body")?,
        ))
    }
}
