use failure::{Error, ResultExt};
use reqwest::Url;
use std::fmt::{self, Debug, Formatter};

use crate::config::AzureConfig;
use crate::utils::Fetch;

const HEADS_PREFIX: &str = "refs/heads/";

/// An interface to the git repositories of a single Azure DevOps project.
pub struct AzureDevOps<F> {
    cfg: AzureConfig,
    fetcher: F,
}

impl<F: Fetch> AzureDevOps<F> {
    pub fn new(cfg: AzureConfig, fetcher: F) -> AzureDevOps<F> {
        AzureDevOps { cfg, fetcher }
    }

    pub fn repositories(&self) -> Result<Listing<Repository>, Error> {
        debug!("Fetching repositories");

        let url = self.endpoint(&[], &[])?;
        let body = self.fetcher.get(&url)?;
        let repos: Listing<Repository> = serde_json::from_slice(&body)
            .context("Error parsing repositories response")?;

        debug!("{} repositories", repos.count);
        Ok(repos)
    }

    /// The branches (`refs/heads/*`) of a repository.
    pub fn branches(&self, repo: &str) -> Result<Listing<Branch>, Error> {
        debug!("Fetching branches for {}", repo);

        let url = self.endpoint(&[repo, "refs"], &[("filter", "heads/")])?;
        let body = self.fetcher.get(&url)?;
        let branches: Listing<Branch> = serde_json::from_slice(&body)
            .context("Error parsing branches response")?;

        debug!("{} has {} branches", repo, branches.count);
        Ok(branches)
    }

    /// Commits on `branch` which were authored on or after `since`.
    pub fn commits(
        &self,
        repo: &str,
        branch: &str,
        since: &str,
    ) -> Result<Listing<Commit>, Error> {
        debug!("Fetching commits for {} on {} since {}", repo, branch, since);

        let url = self.endpoint(
            &[repo, "commits"],
            &[
                ("searchCriteria.itemVersion.version", branch),
                ("searchCriteria.fromDate", since),
            ],
        )?;
        let body = self.fetcher.get(&url)?;
        let commits: Listing<Commit> = serde_json::from_slice(&body)
            .context("Error parsing commits response")?;

        trace!("{} commits on {}/{}", commits.count, repo, branch);
        Ok(commits)
    }

    /// Build `{host}/{org}/{project}/_apis/git/repositories/{segments...}`.
    /// Every segment and query value gets percent-encoded, and the
    /// `api-version` always goes last.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = Url::parse(&self.cfg.host)
            .with_context(|_| format!("\"{}\" isn't a valid host", self.cfg.host))?;

        url.path_segments_mut()
            .map_err(|_| CannotBeABase {
                host: self.cfg.host.clone(),
            })?
            .pop_if_empty()
            .push(&self.cfg.organization)
            .push(&self.cfg.project)
            .extend(&["_apis", "git", "repositories"])
            .extend(segments);

        url.query_pairs_mut()
            .extend_pairs(query)
            .append_pair("api-version", &self.cfg.api_version);

        Ok(url)
    }
}

impl<F> Debug for AzureDevOps<F> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("AzureDevOps")
            .field("organization", &self.cfg.organization)
            .field("project", &self.cfg.project)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "\"{}\" can't be used as a base URL", host)]
pub struct CannotBeABase {
    host: String,
}

/// Strip the `refs/heads/` prefix from a ref name.
pub fn branch_name(reference: &str) -> &str {
    if reference.starts_with(HEADS_PREFIX) {
        &reference[HEADS_PREFIX.len()..]
    } else {
        reference
    }
}

/// The `{count, value}` envelope wrapped around every list response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Listing<T> {
    pub count: usize,
    pub value: Vec<T>,
}

impl<T> Default for Listing<T> {
    fn default() -> Listing<T> {
        Listing {
            count: 0,
            value: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Branch {
    /// The full ref, e.g. `refs/heads/main`.
    pub name: String,
}

impl Branch {
    pub fn short_name(&self) -> &str {
        branch_name(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Commit {
    pub commit_id: String,
    pub author: CommitAuthor,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommitAuthor {
    pub name: String,
    /// Left exactly as the server formatted it.
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::Canned;
    use crate::utils::FailedRequest;
    use reqwest::StatusCode;

    const REPOS: &str = "/org/proj/_apis/git/repositories";

    fn cfg() -> AzureConfig {
        AzureConfig {
            organization: String::from("org"),
            project: String::from("proj"),
            ..Default::default()
        }
    }

    #[test]
    fn strip_the_heads_prefix() {
        assert_eq!(branch_name("refs/heads/main"), "main");
        assert_eq!(branch_name("refs/heads/feature/x"), "feature/x");
        assert_eq!(branch_name("main"), "main");
        assert_eq!(branch_name("refs/tags/v1"), "refs/tags/v1");
    }

    #[test]
    fn repository_url() {
        let azure = AzureDevOps::new(cfg(), Canned::default());

        let got = azure.endpoint(&[], &[]).unwrap();

        assert_eq!(
            got.as_str(),
            "https://dev.azure.com/org/proj/_apis/git/repositories?api-version=6.0"
        );
    }

    #[test]
    fn branch_url_filters_to_heads() {
        let azure = AzureDevOps::new(cfg(), Canned::default());

        let got = azure
            .endpoint(&["repoA", "refs"], &[("filter", "heads/")])
            .unwrap();

        assert_eq!(got.path(), "/org/proj/_apis/git/repositories/repoA/refs");
        let pairs: Vec<(String, String)> = got.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                (String::from("filter"), String::from("heads/")),
                (String::from("api-version"), String::from("6.0")),
            ]
        );
    }

    #[test]
    fn awkward_names_and_dates_are_encoded() {
        let fetch = Canned::default();
        let azure = AzureDevOps::new(cfg(), &fetch);

        let _ = azure.commits("my repo", "main", "2024-01-01T00:00:00+10:00");

        let requested = fetch.requested.borrow();
        let url = &requested[0];
        assert_eq!(
            url.path(),
            "/org/proj/_apis/git/repositories/my%20repo/commits"
        );
        let since = url
            .query_pairs()
            .find(|(k, _)| k == "searchCriteria.fromDate")
            .map(|(_, v)| v.into_owned());
        assert_eq!(since.as_deref(), Some("2024-01-01T00:00:00+10:00"));
    }

    #[test]
    fn decode_repositories() {
        let fetch = Canned::default().ok(
            REPOS,
            r#"{"count":2,"value":[{"name":"repoA","id":"x"},{"name":"repoB"}]}"#,
        );
        let azure = AzureDevOps::new(cfg(), fetch);

        let got = azure.repositories().unwrap();

        assert_eq!(got.count, 2);
        let names: Vec<_> = got.value.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["repoA", "repoB"]);
    }

    #[test]
    fn decode_commits() {
        let fetch = Canned::default().ok(
            "/org/proj/_apis/git/repositories/repoA/commits@main",
            r#"{"count":1,"value":[{"commitId":"abc123","author":{"name":"Jane","email":"jane@example.com","date":"2024-01-01T00:00:00Z"},"comment":"fix bug"}]}"#,
        );
        let azure = AzureDevOps::new(cfg(), fetch);

        let got = azure
            .commits("repoA", "main", "2023-12-31T00:00:00Z")
            .unwrap();

        let should_be = Commit {
            commit_id: String::from("abc123"),
            author: CommitAuthor {
                name: String::from("Jane"),
                date: String::from("2024-01-01T00:00:00Z"),
            },
            comment: String::from("fix bug"),
        };
        assert_eq!(got.count, 1);
        assert_eq!(got.value, vec![should_be]);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let fetch = Canned::default().ok(REPOS, "{}");
        let azure = AzureDevOps::new(cfg(), fetch);

        let got = azure.repositories().unwrap();

        assert_eq!(got, Listing::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let fetch = Canned::default().ok(REPOS, r#"{"count": 1, "value": ["#);
        let azure = AzureDevOps::new(cfg(), fetch);

        let err = azure.repositories().unwrap_err();

        assert_eq!(err.to_string(), "Error parsing repositories response");
    }

    #[test]
    fn http_failures_are_propagated() {
        let fetch = Canned::default().status(REPOS, StatusCode::UNAUTHORIZED);
        let azure = AzureDevOps::new(cfg(), fetch);

        let err = azure.repositories().unwrap_err();

        let failed = err
            .iter_chain()
            .filter_map(|cause| cause.downcast_ref::<FailedRequest>())
            .next()
            .unwrap();
        assert_eq!(failed.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn invalid_host() {
        let cfg = AzureConfig {
            host: String::from("not a url"),
            ..cfg()
        };
        let azure = AzureDevOps::new(cfg, Canned::default());

        assert!(azure.repositories().is_err());
    }
}
