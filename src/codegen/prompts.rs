//! Prompt text for planning and per-file synthesis.

use std::collections::BTreeSet;

const NO_CONTEXT: &str = "No context provided";

fn list_or_none<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let joined = items.into_iter().collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined
    }
}

fn context_or_default(context: &str) -> &str {
    if context.trim().is_empty() {
        NO_CONTEXT
    } else {
        context
    }
}

pub fn planning_prompt(
    description: &str,
    existing_files: &BTreeSet<String>,
    context: &str,
) -> String {
    format!(
        "Given the following task description and code context, create a detailed plan for \
implementing the changes.

Important Guidelines:
1. Consider the complete dependency chain - identify ALL files that need to be created or modified
2. Order changes from most fundamental to dependent (e.g., types/interfaces before their \
implementations)
3. Consider shared utilities, helpers, or types that might be needed
4. Think about where new code best fits in the existing structure
5. Consider configuration changes if needed (e.g., new dependencies, environment variables)
6. IMPORTANT: Check if files already exist before creating new ones
   Existing files: {existing}

Task Description:
{description}

Relevant Code Context:
{context}

Provide your response in the following format:
1. List all required files in order:
   FILE: <file_path>
   ACTION: create|modify
   PURPOSE: <why this file is needed>
   DEPENDS_ON: <any files this depends on>
   CHANGES: <for modify actions, describe what needs to change>

2. Additional context or considerations
",
        existing = list_or_none(existing_files.iter().map(String::as_str)),
        context = context_or_default(context),
    )
}

/// Inputs for one synthesis request.
pub struct SynthesisPrompt<'a> {
    pub path: &'a str,
    pub action: &'a str,
    pub existing_content: Option<&'a str>,
    pub created: &'a [String],
    pub remaining: &'a [String],
    pub existing_files: &'a BTreeSet<String>,
    pub plan: &'a str,
    pub context: &'a str,
}

impl SynthesisPrompt<'_> {
    pub fn render(&self) -> String {
        format!(
            "Based on the implementation plan and code context, generate the next file change.

File to change: {path}
Action: {action}
Existing content: {existing_content}

Files already created: {created}
Files still needed: {remaining}
Existing repository files: {existing_files}

Implementation Plan:
{plan}

Code Context:
{context}

Important Guidelines:
1. Generate complete, self-contained code that handles all dependencies
2. If this file requires new dependencies:
   - Create/modify any necessary configuration files
   - Add required package dependencies
   - Create any shared types, utilities, or helpers needed
3. Follow the existing codebase patterns and style
4. Include all necessary imports and references
5. Consider error handling and edge cases
6. Add appropriate documentation and comments
7. For existing files, only generate the specific changes needed

For new files, provide complete file content.
For existing files, provide only the new/modified content and where to insert it \
(INSERT_AFTER_LINE is a 0-based line index into the existing content).

Provide your response in the following format:
FILE: <file_path>
ACTION: create|modify
INSERT_AFTER_LINE: <line number, only for modify>
CONTENT:
<content>
END_CONTENT
",
            path = self.path,
            action = self.action,
            existing_content = self.existing_content.unwrap_or("New file"),
            created = list_or_none(self.created.iter().map(String::as_str)),
            remaining = list_or_none(self.remaining.iter().map(String::as_str)),
            existing_files = list_or_none(self.existing_files.iter().map(String::as_str)),
            plan = self.plan,
            context = context_or_default(self.context),
        )
    }
}
