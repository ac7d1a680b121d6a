use failure::Error;
use std::io::Write;

use crate::azure::Commit;

/// Everything found during a run, in the order the server returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub since: String,
    pub until: String,
    /// The repository count reported by the server.
    pub count: usize,
    pub repositories: Vec<RepositoryReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryReport {
    pub name: String,
    /// The branch count reported by the server.
    pub branch_count: usize,
    pub branches: Vec<BranchReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchReport {
    /// The branch name, without its `refs/heads/` prefix.
    pub name: String,
    pub commit_count: usize,
    pub commits: Vec<Commit>,
}

impl Report {
    pub fn render<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writeln!(
            writer,
            "Returning results between the dates: {} through Today: {}",
            self.since, self.until
        )?;
        writeln!(writer, "Azure DevOps REPOSITORY Count: {}", self.count)?;

        for (i, repo) in self.repositories.iter().enumerate() {
            writeln!(writer, "Repository {}: {}", i + 1, repo.name)?;
            repo.render(writer)?;
        }

        writeln!(writer, "Azure DevOps check complete. ✔️")?;
        Ok(())
    }
}

impl RepositoryReport {
    fn render<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writeln!(
            writer,
            "Repository {} has {} {}",
            self.name,
            self.branch_count,
            if self.branch_count == 1 {
                "branch"
            } else {
                "branches"
            }
        )?;

        for branch in &self.branches {
            branch.render(writer)?;
        }

        Ok(())
    }
}

impl BranchReport {
    fn render<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        if self.commit_count == 0 {
            return Ok(());
        }

        writeln!(writer, "   From branch: {}", self.name)?;

        for commit in &self.commits {
            writeln!(writer, "\tCommit ID: {}", commit.commit_id)?;
            writeln!(writer, "\tAuthor:    {}", commit.author.name)?;
            writeln!(writer, "\tDate:      {}", commit.author.date)?;
            writeln!(writer, "\tComment:   {}", commit.comment)?;
            writeln!(writer, "\t-----")?;
        }

        Ok(())
    }
}
