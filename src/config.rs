use config::{Config, File, FileFormat};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SYSTEM_CONFIG: &str = "/usr/local/etc/kattisrc";
const USER_CONFIG: &str = ".kattisrc";

const MISSING_MSG: &str = "\
I failed to read in a config file from your home directory or from the
same directory as this program. To download a .kattisrc file please visit
https://<kattis>/download/kattisrc
The file should look something like this:
[user]
username: yourusername
token: *********
[kattis]
hostname: <kattis>
loginurl: https://<kattis>/login
submissionurl: https://<kattis>/submit
submissionsurl: https://<kattis>/submissions";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}", MISSING_MSG)]
    NotFound,
    #[error("can not parse {0}: {1}")]
    Parse(String, config::ConfigError),
    #[error("it looks like the .kattisrc file appears to be corrupted: {0}")]
    Corrupted(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Deserialize, Debug)]
pub struct User {
    pub username: String,
    pub password: Option<String>,
    pub token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Kattis {
    pub hostname: String,
    pub loginurl: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct KattisRc {
    pub user: User,
    pub kattis: Kattis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Password(String),
    Token(String),
}

/// Where to look for `.kattisrc`.  The system file is optional, at least
/// one of the user files must exist.
pub struct SearchPath {
    pub system: PathBuf,
    pub user: Vec<PathBuf>,
}

impl SearchPath {
    pub fn default_paths() -> Self {
        let mut user = vec![];
        match directories::BaseDirs::new() {
            Some(dirs) => user.push(dirs.home_dir().join(USER_CONFIG)),
            None => debug!("can not locate the home directory"),
        }
        if let Some(dir) = std::env::current_exe()
            .ok()
            .as_deref()
            .and_then(Path::parent)
        {
            user.push(dir.join(USER_CONFIG));
        }

        SearchPath {
            system: PathBuf::from(SYSTEM_CONFIG),
            user,
        }
    }
}

fn ini_source(p: &Path) -> impl config::Source + Send + Sync + 'static {
    File::from(p).format(FileFormat::Ini).required(true)
}

impl KattisRc {
    pub fn load(search: &SearchPath) -> Result<Self> {
        let mut builder = Config::builder();
        let mut sources = vec![];

        if search.system.is_file() {
            debug!("reading system config {}", search.system.display());
            builder = builder.add_source(ini_source(&search.system));
            sources.push(search.system.clone());
        }

        let mut found_user = false;
        for p in search.user.iter().filter(|p| p.is_file()) {
            debug!("reading user config {}", p.display());
            builder = builder.add_source(ini_source(p));
            sources.push(p.clone());
            found_user = true;
        }

        if !found_user {
            return Err(Error::NotFound);
        }

        let cfg = builder.build().map_err(|e| {
            let names = sources
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Error::Parse(names, e)
        })?;
        cfg.try_deserialize()
            .map_err(|e| Error::Corrupted(e.to_string()))
    }

    #[cfg(test)]
    pub fn from_ini_str(s: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(s, FileFormat::Ini))
            .build()
            .map_err(|e| Error::Parse("<string>".into(), e))?
            .try_deserialize()
            .map_err(|e| Error::Corrupted(e.to_string()))
    }

    /// The login secret.  Exactly one of password and token must be set.
    pub fn credential(&self) -> Result<Credential> {
        match (&self.user.password, &self.user.token) {
            (Some(p), None) => Ok(Credential::Password(p.clone())),
            (None, Some(t)) => Ok(Credential::Token(t.clone())),
            (None, None) => Err(Error::Corrupted(
                "neither password nor token is set in [user]".into(),
            )),
            (Some(_), Some(_)) => Err(Error::Corrupted(
                "both password and token are set in [user]".into(),
            )),
        }
    }
}
