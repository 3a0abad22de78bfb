pub mod response;
pub mod scrape;

use crate::config::{Credential, KattisRc};
use cookie_store::CookieStore;
use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{COOKIE, FROM, SET_COOKIE, USER_AGENT};
use reqwest::redirect::Policy;
use response::{Response, Stage};
use url::Url;

mod error {
    error_chain::error_chain! {}
}

pub use error::{Error, Result};
use error::ResultExt;
use error_chain::bail;

const MAX_REDIRECTS: usize = 10;

// Shared by every request of a run.  The headers tell the site operator who
// to contact about the traffic.
pub struct Agent {
    client: Client,
    user_agent: String,
    from: String,
}

impl Agent {
    pub fn new(email: &str) -> Result<Self> {
        // We don't use redirection following feature of reqwest.  It will
        // throw set-cookie in the header of the login response.
        let client = Client::builder()
            .gzip(true)
            .redirect(Policy::none())
            .build()
            .chain_err(|| "can not build HTTP client")?;
        Ok(Agent {
            client,
            user_agent: format!("kattis-accepted-fetch by {}", email),
            from: email.to_owned(),
        })
    }

    fn add_header(&self, b: RequestBuilder) -> RequestBuilder {
        b.header(USER_AGENT, &self.user_agent)
            .header(FROM, &self.from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: Url,
    pub profile: Url,
    pub problems: Url,
}

impl Endpoints {
    pub fn from_config(rc: &KattisRc) -> Result<Self> {
        let base = Url::parse(&format!("https://{}/", rc.kattis.hostname))
            .chain_err(|| format!("bad hostname {}", rc.kattis.hostname))?;
        let join = |p: &str| {
            base.join(p)
                .chain_err(|| format!("can not build a URL from {}", p))
        };

        let login = match &rc.kattis.loginurl {
            Some(u) => Url::parse(u).chain_err(|| format!("bad loginurl {}", u))?,
            None => join("login")?,
        };

        Ok(Endpoints {
            login,
            profile: join(&format!("users/{}", rc.user.username))?,
            problems: join("problems")?,
        })
    }

    pub fn problems_page(&self, page: u32) -> Url {
        let mut u = self.problems.clone();
        u.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("show_solved", "on")
            .append_pair("show_tried", "off")
            .append_pair("show_untried", "off");
        u
    }
}

pub struct Kattis {
    agent: Agent,
    endpoints: Endpoints,
}

// The cookies are fixed once the login succeeds.
pub struct Session {
    agent: Agent,
    endpoints: Endpoints,
    cookies: CookieStore,
}

pub trait Source {
    fn problems_page(&self, page: u32) -> Result<String>;
    fn profile(&self) -> Result<String>;
}

impl Kattis {
    pub fn new(agent: Agent, endpoints: Endpoints) -> Self {
        Kattis { agent, endpoints }
    }

    pub fn login(self, username: &str, credential: &Credential) -> Result<Session> {
        let mut form = vec![("user", username), ("script", "true")];
        match credential {
            Credential::Password(p) => form.push(("password", p.as_str())),
            Credential::Token(t) => form.push(("token", t.as_str())),
        }

        debug!("posting credential to {}", self.endpoints.login);
        let resp = self
            .agent
            .add_header(self.agent.client.post(self.endpoints.login.clone()))
            .form(&form)
            .send()
            .chain_err(|| "login connection failed")?;
        response::check_status(Stage::Login, resp.status()).chain_err(|| "login rejected")?;

        let mut cookies = CookieStore::default();
        let u = resp.url().clone();
        for val in resp.headers().get_all(SET_COOKIE) {
            let s = val.to_str().chain_err(|| "bad cookie string")?;
            cookies
                .parse(s, &u)
                .map_err(|e| Error::from(format!("ill-formed cookie string: {}", e)))?;
        }

        info!("logged in as {}", username);
        Ok(Session {
            agent: self.agent,
            endpoints: self.endpoints,
            cookies,
        })
    }
}

impl Session {
    fn cookie_header(&self, u: &Url) -> String {
        self.cookies
            .get_request_values(u)
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn request(&self, u: &Url) -> RequestBuilder {
        let b = self.agent.add_header(self.agent.client.get(u.clone()));
        let cookie = self.cookie_header(u);
        if cookie.is_empty() {
            b
        } else {
            b.header(COOKIE, cookie)
        }
    }

    // Redirections are followed by hand so each hop gets the cookies for
    // its own URL.
    fn get(&self, stage: Stage, mut u: Url) -> Result<String> {
        for _ in 0..=MAX_REDIRECTS {
            debug!("GET {}", u);
            let resp = self
                .request(&u)
                .send()
                .chain_err(|| format!("connection to {} failed", u))?;
            match Response::wrap(stage, resp).chain_err(|| format!("bad response from {}", u))? {
                Response::Content(s) => return Ok(s),
                Response::Redirection(next) => {
                    info!("redirected from {} to {}", u, next);
                    u = next;
                }
            }
        }
        bail!("too many redirections, last one to {}", u)
    }
}

impl Source for Session {
    fn problems_page(&self, page: u32) -> Result<String> {
        self.get(Stage::Submissions, self.endpoints.problems_page(page))
    }

    fn profile(&self) -> Result<String> {
        self.get(Stage::Profile, self.endpoints.profile.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    fn session(base: &str, cookies: CookieStore) -> Session {
        let base = Url::parse(base).unwrap();
        Session {
            agent: Agent::new("a@b.co").unwrap(),
            endpoints: Endpoints {
                login: base.join("login").unwrap(),
                profile: base.join("users/alice").unwrap(),
                problems: base.join("problems").unwrap(),
            },
            cookies,
        }
    }

    // Answer one connection per reply, returning the request heads seen.
    fn serve(replies: Vec<String>) -> (String, std::thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let mut heads = vec![];
            for reply in replies {
                let (mut stream, _) = listener.accept().unwrap();
                let mut rd = BufReader::new(stream.try_clone().unwrap());
                let mut head = String::new();
                loop {
                    let mut line = String::new();
                    if rd.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                        break;
                    }
                    head += &line.to_lowercase();
                }
                heads.push(head);
                stream.write_all(reply.as_bytes()).unwrap();
            }
            heads
        });
        (base, handle)
    }

    fn reply(status: &str, extra: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            extra,
            body.len(),
            body
        )
    }

    #[test]
    fn test_follow_redirection() {
        let (base, server) = serve(vec![
            reply("301 Moved Permanently", "Location: /problems2\r\n", ""),
            reply("200 OK", "Content-Type: text/html\r\n", "<p>listing</p>"),
        ]);
        let s = session(&base, CookieStore::default());

        assert_eq!(s.problems_page(0).unwrap(), "<p>listing</p>");

        let heads = server.join().unwrap();
        assert!(heads[0].starts_with("get /problems?page=0&show_solved=on"));
        assert!(heads[1].starts_with("get /problems2 "));
        assert!(heads.iter().all(|h| !h.contains("\ncookie:")));
        assert!(heads[1].contains("\nfrom: a@b.co"));
    }

    #[test]
    fn test_redirection_to_failure() {
        let (base, server) = serve(vec![
            reply("302 Found", "Location: /login\r\n", ""),
            reply("403 Forbidden", "", ""),
        ]);
        let s = session(&base, CookieStore::default());

        let e = s.profile().unwrap_err();
        let chain = e.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        assert!(chain
            .iter()
            .any(|m| m == "fetching profile failed: access denied (403)"));
        server.join().unwrap();
    }

    #[test]
    fn test_cookie_header() {
        let s = session("https://open.kattis.com/", CookieStore::default());
        let u = Url::parse("https://open.kattis.com/problems").unwrap();
        let req = s.request(&u).build().unwrap();
        assert!(req.headers().get(COOKIE).is_none());

        let mut cookies = CookieStore::default();
        cookies
            .parse("sid=abc", &Url::parse("https://open.kattis.com/login").unwrap())
            .unwrap();
        let s = session("https://open.kattis.com/", cookies);
        let req = s.request(&u).build().unwrap();
        assert_eq!(req.headers()[COOKIE], "sid=abc");
    }

    #[test]
    fn test_endpoints() {
        let rc = KattisRc::from_ini_str(
            "[user]\nusername: alice\ntoken: t\n[kattis]\nhostname: open.kattis.com\n",
        )
        .unwrap();
        let e = Endpoints::from_config(&rc).unwrap();
        assert_eq!(e.login.as_str(), "https://open.kattis.com/login");
        assert_eq!(e.profile.as_str(), "https://open.kattis.com/users/alice");
        assert_eq!(
            e.problems_page(3).as_str(),
            "https://open.kattis.com/problems?page=3&show_solved=on&show_tried=off&show_untried=off"
        );
    }

    #[test]
    fn test_login_url_override() {
        let rc = KattisRc::from_ini_str(
            "[user]\nusername: alice\ntoken: t\n[kattis]\nhostname: open.kattis.com\n\
             loginurl: https://login.example.com/auth\n",
        )
        .unwrap();
        let e = Endpoints::from_config(&rc).unwrap();
        assert_eq!(e.login.as_str(), "https://login.example.com/auth");
    }

    #[test]
    fn test_agent_headers() {
        let agent = Agent::new("a@b.co").unwrap();
        let req = agent
            .add_header(agent.client.get("https://open.kattis.com/"))
            .build()
            .unwrap();
        assert_eq!(
            req.headers()[USER_AGENT],
            "kattis-accepted-fetch by a@b.co"
        );
        assert_eq!(req.headers()[FROM], "a@b.co");
    }
}
