//! Output rendering (pull request title and body)

pub mod pr_description;

pub use pr_description::{render_pr_description, render_pr_title};
