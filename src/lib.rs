//! Report the commits made recently across every branch of every
//! repository in an Azure DevOps project.
//!
//! The [`Driver`] walks repositories, then their head branches, then the
//! commits on each branch, collecting everything into a [`Report`] which
//! can be rendered once the whole walk succeeded.

#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

mod auth;
mod azure;
mod config;
mod driver;
mod report;
mod utils;

pub use crate::auth::{basic_credential, load_token};
pub use crate::azure::{
    branch_name, AzureDevOps, Branch, CannotBeABase, Commit, CommitAuthor, Listing, Repository,
};
pub use crate::config::{AzureConfig, Config, General};
pub use crate::driver::{Driver, TooFarBack, Window};
pub use crate::report::{BranchReport, Report, RepositoryReport};
pub use crate::utils::{FailedRequest, Fetch, HttpClient};
