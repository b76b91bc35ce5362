use crate::config::hackathon::DEFAULT_PROJECT_CATEGORY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

const SUBMISSION_MARKER: &str = "[submission]";
const SECTION_MARKER: &str = "### ";
/// What the issue form writes into an optional field left blank.
const NO_RESPONSE: &str = "_No response_";

#[derive(Debug, Clone, Deserialize)]
pub struct IssueUser {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueLabel {
    pub name: Option<String>,
}

/// An issue as returned by the tracker's REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
    pub user: Option<IssueUser>,
    #[serde(default)]
    pub labels: Vec<IssueLabel>,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub team_members: Vec<String>,
    pub repo_url: String,
    pub demo_url: Option<String>,
    pub tech_stack: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_login: String,
    pub author_avatar_url: String,
    pub issue_number: u64,
    pub issue_url: String,
    pub body_raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionWithVotes {
    #[serde(flatten)]
    pub submission: Submission,
    pub upvote_count: u64,
    pub has_upvoted: bool,
}

/// Map a submission issue to a project record. Never fails: every missing
/// section falls back to a default.
pub fn normalize(issue: &RawIssue) -> Submission {
    let title = strip_submission_marker(&issue.title);
    let body = issue.body.clone().unwrap_or_default();
    let sections = extract_sections(&body);

    let project_name = section(&sections, "Project Name").unwrap_or(title);
    let description = section(&sections, "Description").unwrap_or(&body);
    let category = section(&sections, "Category").unwrap_or(DEFAULT_PROJECT_CATEGORY);
    let repo_url = section(&sections, "GitHub Repository").unwrap_or_default();
    let demo_url = optional_section(&sections, "Demo URL")
        .filter(|url| !url.is_empty())
        .map(str::to_string);
    let team_members = split_list(optional_section(&sections, "Team Members"));
    let tech_stack = split_list(optional_section(&sections, "Technical Stack"));

    let (author_login, author_avatar_url) = match &issue.user {
        Some(user) => (user.login.clone(), user.avatar_url.clone()),
        None => ("unknown".to_string(), String::new()),
    };

    Submission {
        id: issue.id,
        slug: format!("{}-{}", slugify(project_name), issue.number),
        title: project_name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        team_members,
        repo_url: repo_url.to_string(),
        demo_url,
        tech_stack,
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        author_login,
        author_avatar_url,
        issue_number: issue.number,
        issue_url: issue.html_url.clone(),
        body_raw: body.clone(),
    }
}

fn strip_submission_marker(title: &str) -> &str {
    match title.get(..SUBMISSION_MARKER.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(SUBMISSION_MARKER) => {
            title[SUBMISSION_MARKER.len()..].trim_start()
        }
        _ => title,
    }
}

/// Split a body on `### ` headings into name -> text. The last occurrence of
/// a repeated heading wins.
fn extract_sections(body: &str) -> HashMap<String, String> {
    let mut sections = HashMap::new();

    for block in split_blocks(body) {
        let trimmed = block.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (name, content) = match trimmed.split_once('\n') {
            Some((name, content)) => (name.trim(), content.trim()),
            None => (trimmed, ""),
        };

        if sections
            .insert(name.to_string(), content.to_string())
            .is_some()
        {
            tracing::warn!(section = name, "duplicate submission section, keeping the last one");
        }
    }

    sections
}

/// Blocks between heading markers; a marker only counts at the start of a line.
fn split_blocks(body: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;
    let mut line_start = 0;

    while line_start <= body.len() {
        let rest = &body[line_start..];
        if rest.starts_with(SECTION_MARKER) {
            blocks.push(&body[start..line_start]);
            start = line_start + SECTION_MARKER.len();
        }
        match rest.find('\n') {
            Some(offset) => line_start += offset + 1,
            None => break,
        }
    }
    blocks.push(&body[start..]);
    blocks
}

fn section<'a>(sections: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    sections.get(name).map(String::as_str)
}

fn optional_section<'a>(sections: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    section(sections, name).filter(|value| *value != NO_RESPONSE)
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercase ASCII slug; runs of anything else collapse into one `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProjectSort {
    #[default]
    Votes,
    Newest,
    Oldest,
}

pub fn sort_projects(projects: &mut [SubmissionWithVotes], mode: ProjectSort) {
    match mode {
        ProjectSort::Votes => projects.sort_by(|a, b| {
            b.upvote_count
                .cmp(&a.upvote_count)
                .then_with(|| b.submission.created_at.cmp(&a.submission.created_at))
        }),
        ProjectSort::Newest => {
            projects.sort_by(|a, b| b.submission.created_at.cmp(&a.submission.created_at))
        }
        ProjectSort::Oldest => {
            projects.sort_by(|a, b| a.submission.created_at.cmp(&b.submission.created_at))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issue(number: u64, title: &str, body: Option<&str>) -> RawIssue {
        let ts = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
        RawIssue {
            id: number * 1000,
            number,
            title: title.to_string(),
            body: body.map(str::to_string),
            created_at: ts,
            updated_at: ts,
            html_url: format!("https://github.com/uniswap/uniswap-ai/issues/{number}"),
            user: Some(IssueUser {
                login: "alice".to_string(),
                avatar_url: "https://avatars.example/alice".to_string(),
            }),
            labels: vec![],
            pull_request: None,
        }
    }

    const FULL_BODY: &str = "### Project Name\nSwap Pilot\n\n### Description\nAn agent that routes swaps.\n\n### Category\nDeveloper Tooling\n\n### Team Members\nalice, bob , ,carol\n\n### GitHub Repository\nhttps://github.com/alice/swap-pilot\n\n### Demo URL\nhttps://swap-pilot.example\n\n### Technical Stack\nRust, Uniswap SDK";

    #[test]
    fn category_only_body_falls_back_for_the_rest() {
        let body = "### Category\nDeFi Automation";
        let s = normalize(&issue(7, "[SUBMISSION] Foo Bar", Some(body)));
        assert_eq!(s.title, "Foo Bar");
        assert_eq!(s.category, "DeFi Automation");
        assert_eq!(s.description, body);
        assert_eq!(s.slug, "foo-bar-7");
    }

    #[test]
    fn full_body_is_parsed() {
        let s = normalize(&issue(12, "[Submission] ignored", Some(FULL_BODY)));
        assert_eq!(s.title, "Swap Pilot");
        assert_eq!(s.slug, "swap-pilot-12");
        assert_eq!(s.description, "An agent that routes swaps.");
        assert_eq!(s.category, "Developer Tooling");
        assert_eq!(s.team_members, vec!["alice", "bob", "carol"]);
        assert_eq!(s.repo_url, "https://github.com/alice/swap-pilot");
        assert_eq!(s.demo_url.as_deref(), Some("https://swap-pilot.example"));
        assert_eq!(s.tech_stack, vec!["Rust", "Uniswap SDK"]);
        assert_eq!(s.author_login, "alice");
        assert_eq!(s.issue_number, 12);
        assert_eq!(s.body_raw, FULL_BODY);
    }

    #[test]
    fn body_without_headings_uses_defaults() {
        let s = normalize(&issue(3, "Plain idea", Some("just some text\nover two lines")));
        assert_eq!(s.title, "Plain idea");
        assert_eq!(s.description, "just some text\nover two lines");
        assert_eq!(s.category, DEFAULT_PROJECT_CATEGORY);
        assert!(s.team_members.is_empty());
        assert!(s.tech_stack.is_empty());
        assert_eq!(s.repo_url, "");
        assert_eq!(s.demo_url, None);
    }

    #[test]
    fn missing_body_and_author() {
        let mut raw = issue(4, "[submission]   Spaced", None);
        raw.user = None;
        let s = normalize(&raw);
        assert_eq!(s.title, "Spaced");
        assert_eq!(s.description, "");
        assert_eq!(s.author_login, "unknown");
        assert_eq!(s.author_avatar_url, "");
    }

    #[test]
    fn no_response_placeholder_is_absent() {
        let body = "### Demo URL\n_No response_\n\n### Technical Stack\n_No response_";
        let s = normalize(&issue(5, "X", Some(body)));
        assert_eq!(s.demo_url, None);
        assert!(s.tech_stack.is_empty());
    }

    #[test]
    fn duplicate_heading_last_wins() {
        let body = "### Category\nIdeation\n### Category\nDeveloper Tooling";
        let s = normalize(&issue(6, "X", Some(body)));
        assert_eq!(s.category, "Developer Tooling");
    }

    #[test]
    fn heading_marker_mid_line_is_not_a_section() {
        let body = "### Description\nuse ### carefully\n### Category\nOther";
        let s = normalize(&issue(8, "X", Some(body)));
        assert_eq!(s.description, "use ### carefully");
        assert_eq!(s.category, "Other");
    }

    #[test]
    fn heading_without_content_maps_to_empty() {
        let body = "### Category";
        let s = normalize(&issue(9, "X", Some(body)));
        assert_eq!(s.category, "");
    }

    #[test]
    fn title_without_marker_is_kept() {
        assert_eq!(strip_submission_marker("My [SUBMISSION]"), "My [SUBMISSION]");
        assert_eq!(strip_submission_marker("[SUB"), "[SUB");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  --AI  Agent v2--  "), "ai-agent-v2");
        assert_eq!(slugify("Ünïcode Name"), "n-code-name");
        assert_eq!(slugify("!!!"), "");
    }

    fn with_votes(number: u64, day: u32, votes: u64) -> SubmissionWithVotes {
        let mut raw = issue(number, "P", None);
        raw.created_at = Utc.with_ymd_and_hms(2026, 2, day, 0, 0, 0).unwrap();
        SubmissionWithVotes {
            submission: normalize(&raw),
            upvote_count: votes,
            has_upvoted: false,
        }
    }

    #[test]
    fn sort_by_votes_breaks_ties_by_newest() {
        let mut projects = vec![with_votes(1, 10, 2), with_votes(2, 12, 5), with_votes(3, 11, 2)];
        sort_projects(&mut projects, ProjectSort::Votes);
        let order: Vec<u64> = projects.iter().map(|p| p.submission.issue_number).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn sort_by_age() {
        let mut projects = vec![with_votes(1, 10, 0), with_votes(2, 12, 0), with_votes(3, 11, 0)];
        sort_projects(&mut projects, ProjectSort::Oldest);
        let order: Vec<u64> = projects.iter().map(|p| p.submission.issue_number).collect();
        assert_eq!(order, vec![1, 3, 2]);
        sort_projects(&mut projects, ProjectSort::Newest);
        let order: Vec<u64> = projects.iter().map(|p| p.submission.issue_number).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
