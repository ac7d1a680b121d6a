use failure::{Error, ResultExt};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{StatusCode, Url};
use sec::Secret;

/// Something which can retrieve the raw body behind a URL.
pub trait Fetch {
    fn get(&self, url: &Url) -> Result<Vec<u8>, Error>;
}

impl<'a, F: Fetch + ?Sized> Fetch for &'a F {
    fn get(&self, url: &Url) -> Result<Vec<u8>, Error> {
        (**self).get(url)
    }
}

/// A blocking HTTP client which authenticates every request using HTTP
/// Basic auth.
pub struct HttpClient {
    client: Client,
    credential: Secret<String>,
}

impl HttpClient {
    pub const AGENT: &'static str = "azdo-changes";

    pub fn new(credential: Secret<String>) -> HttpClient {
        HttpClient {
            client: Client::new(),
            credential,
        }
    }
}

impl Fetch for HttpClient {
    fn get(&self, url: &Url) -> Result<Vec<u8>, Error> {
        debug!("Sending request to {}", url);

        let request = self
            .client
            .get(url.clone())
            .header(USER_AGENT, HttpClient::AGENT)
            .header(ACCEPT, "application/json")
            .header(
                AUTHORIZATION,
                format!("Basic {}", self.credential.reveal_str()),
            )
            .build()
            .context("Generated invalid request. This is a bug.")?;

        if log_enabled!(log::Level::Trace) {
            let redacted_header = format!("Request Headers {:#?}", request.headers())
                .replace(self.credential.reveal_str(), "XXXXXXXXXX");

            for line in redacted_header.lines() {
                trace!("{}", line);
            }
        }

        let response = self
            .client
            .execute(request)
            .context("Unable to send request")?;

        let status = response.status();
        debug!("Received response ({})", status);

        if status != StatusCode::OK {
            warn!("Request failed with {}", status);

            let err = FailedRequest {
                status,
                url: url.to_string(),
            };

            return Err(err.into());
        }

        let body = response
            .bytes()
            .context("Unable to read the response body")?;
        trace!("Received {} bytes", body.len());

        Ok(body.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Request to {} failed with {}", url, status)]
pub struct FailedRequest {
    pub status: StatusCode,
    pub url: String,
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// A `Fetch` which serves canned responses and remembers every URL it
    /// was asked for.
    #[derive(Debug, Default)]
    pub(crate) struct Canned {
        responses: HashMap<String, Result<String, StatusCode>>,
        pub(crate) requested: RefCell<Vec<Url>>,
    }

    impl Canned {
        /// Serve `body` for requests to `path` (e.g.
        /// `/org/proj/_apis/git/repositories`). Commit requests also need
        /// the branch, written as `path@branch`.
        pub(crate) fn ok(mut self, key: &str, body: &str) -> Self {
            self.responses.insert(key.to_string(), Ok(body.to_string()));
            self
        }

        pub(crate) fn status(mut self, key: &str, status: StatusCode) -> Self {
            self.responses.insert(key.to_string(), Err(status));
            self
        }

        pub(crate) fn paths(&self) -> Vec<String> {
            self.requested.borrow().iter().map(key_for).collect()
        }
    }

    fn key_for(url: &Url) -> String {
        let branch = url
            .query_pairs()
            .find(|(k, _)| k == "searchCriteria.itemVersion.version")
            .map(|(_, v)| v.into_owned());

        match branch {
            Some(branch) => format!("{}@{}", url.path(), branch),
            None => url.path().to_string(),
        }
    }

    impl Fetch for Canned {
        fn get(&self, url: &Url) -> Result<Vec<u8>, Error> {
            self.requested.borrow_mut().push(url.clone());

            match self.responses.get(&key_for(url)) {
                Some(Ok(body)) => Ok(body.clone().into_bytes()),
                Some(Err(status)) => Err(FailedRequest {
                    status: *status,
                    url: url.to_string(),
                }
                .into()),
                None => Err(FailedRequest {
                    status: StatusCode::NOT_FOUND,
                    url: url.to_string(),
                }
                .into()),
            }
        }
    }
}
