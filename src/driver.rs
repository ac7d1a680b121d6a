use chrono::{DateTime, Duration, FixedOffset, Local, SecondsFormat};
use failure::{Error, ResultExt};

use crate::auth;
use crate::azure::AzureDevOps;
use crate::config::Config;
use crate::report::{BranchReport, Report, RepositoryReport};
use crate::utils::{Fetch, HttpClient};

/// The trailing period commits are searched in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Window {
    pub since: DateTime<FixedOffset>,
    pub until: DateTime<FixedOffset>,
}

impl Window {
    /// The `days` leading up to `now`.
    pub fn trailing(now: DateTime<FixedOffset>, days: u32) -> Result<Window, Error> {
        let since = now
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or(TooFarBack { days })?;

        Ok(Window { since, until: now })
    }

    pub fn since_rfc3339(&self) -> String {
        self.since.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn until_rfc3339(&self) -> String {
        self.until.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Fail)]
#[fail(display = "days = {} reaches too far back", days)]
pub struct TooFarBack {
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Driver {
    config: Config,
}

impl Driver {
    pub fn with_config(config: Config) -> Driver {
        Driver { config }
    }

    /// Query Azure DevOps for everything that changed over the last few
    /// days.
    pub fn run(&self) -> Result<Report, Error> {
        let token = auth::load_token(&self.config.general.token_file)
            .context("Unable to load the access token")?;
        let client = HttpClient::new(auth::basic_credential(&token));
        let azure = AzureDevOps::new(self.config.azure.clone(), client);

        let window = Window::trailing(Local::now().into(), self.config.general.days)
            .context("Invalid search window")?;

        self.collect(&azure, &window)
    }

    /// Walk every repository, branch, and commit in `window`. The first
    /// error ends the walk.
    pub fn collect<F: Fetch>(
        &self,
        azure: &AzureDevOps<F>,
        window: &Window,
    ) -> Result<Report, Error> {
        let since = window.since_rfc3339();
        let until = window.until_rfc3339();
        info!("Looking for commits between {} and {}", since, until);

        let repos = azure
            .repositories()
            .context("Unable to fetch repositories")?;
        info!("Found {} repositories", repos.count);

        let mut repositories = Vec::new();

        for repo in repos.value {
            let found = self
                .collect_repository(azure, &repo.name, &since)
                .with_context(|_| format!("Unable to inspect {}", repo.name))?;
            repositories.push(found);
        }

        Ok(Report {
            since,
            until,
            count: repos.count,
            repositories,
        })
    }

    fn collect_repository<F: Fetch>(
        &self,
        azure: &AzureDevOps<F>,
        name: &str,
        since: &str,
    ) -> Result<RepositoryReport, Error> {
        debug!("Inspecting {}", name);

        let listing = azure
            .branches(name)
            .context("Unable to fetch branches")?;

        let mut branches = Vec::new();

        for branch in &listing.value {
            let short_name = branch.short_name();
            let commits = azure
                .commits(name, short_name, since)
                .with_context(|_| format!("Unable to fetch commits on {}", short_name))?;

            if commits.count > 0 {
                info!("{} commits on {}/{}", commits.count, name, short_name);
            }

            branches.push(BranchReport {
                name: short_name.to_string(),
                commit_count: commits.count,
                commits: commits.value,
            });
        }

        Ok(RepositoryReport {
            name: name.to_string(),
            branch_count: listing.count,
            branches,
        })
    }
}
