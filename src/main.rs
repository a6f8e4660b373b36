//! repo-codegen: index a repository and turn task descriptions into pull requests.

use anyhow::Result;

fn main() -> Result<()> {
    repo_codegen::cli::run()
}
