//! GitHub boundary: changed-file listing and review submission.

use kestrel_core::{KestrelError, PullRequestFile, ReviewComment, Verdict};

const PER_PAGE: usize = 100;

/// GitHub Pull Request client for listing changed files and posting reviews.
///
/// # Examples
///
/// ```
/// use kestrel_review::github::parse_pr_reference;
///
/// let (owner, repo, number) = parse_pr_reference("rust-lang/rust#12345").unwrap();
/// assert_eq!(owner, "rust-lang");
/// assert_eq!(repo, "rust");
/// assert_eq!(number, 12345);
/// ```
pub struct GithubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl GithubClient {
    /// Create a client against the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Github`] if the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kestrel_review::github::GithubClient;
    ///
    /// let client = GithubClient::new("ghp_xxxx").unwrap();
    /// ```
    pub fn new(token: &str) -> Result<Self, KestrelError> {
        Self::with_base_url(token, "https://api.github.com")
    }

    /// Create a client against a custom API root, e.g. a test server.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Github`] if the client cannot be built.
    pub fn with_base_url(token: &str, base_url: impl Into<String>) -> Result<Self, KestrelError> {
        let base_url = base_url.into();
        let octocrab = octocrab::Octocrab::builder()
            .base_uri(base_url.as_str())
            .map_err(|e| KestrelError::Github(format!("invalid API base URL: {e}")))?
            .personal_token(token.to_string())
            .build()
            .map_err(|e| KestrelError::Github(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            http: reqwest::Client::new(),
            token: token.to_string(),
            base_url,
        })
    }

    /// List the files changed by a pull request.
    ///
    /// Pages through the listing 100 files at a time until a short page,
    /// preserving the order GitHub returns.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Github`] on network or API errors.
    pub async fn list_changed_files(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<PullRequestFile>, KestrelError> {
        let mut files = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/repos/{owner}/{repo}/pulls/{pr_number}/files?per_page={PER_PAGE}&page={page}",
                self.base_url,
            );

            let response = self
                .http
                .get(&url)
                .header("Accept", "application/vnd.github+json")
                .header("Authorization", format!("Bearer {}", self.token))
                .header("User-Agent", "kestrel")
                .send()
                .await
                .map_err(|e| KestrelError::Github(format!("failed to list changed files: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(KestrelError::Github(format!(
                    "GitHub API error {status}: {body}"
                )));
            }

            let batch: Vec<PullRequestFile> = response
                .json()
                .await
                .map_err(|e| KestrelError::Github(format!("failed to parse changed files: {e}")))?;

            let last_page = batch.len() < PER_PAGE;
            files.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }

        Ok(files)
    }

    /// Submit a single review carrying the verdict, summary, and the full
    /// structured comment list.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Github`] on API errors.
    pub async fn submit_review(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        verdict: Verdict,
        summary: &str,
        comments: &[ReviewComment],
    ) -> Result<(), KestrelError> {
        let route = format!("/repos/{owner}/{repo}/pulls/{pr_number}/reviews");
        let body = serde_json::json!({
            "event": verdict.as_event(),
            "body": summary,
            "comments": comments,
        });

        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&body))
            .await
            .map_err(|e| KestrelError::Github(format!("failed to post review: {e}")))?;

        Ok(())
    }
}

/// Decide the review verdict and summary from the aggregated comments.
///
/// No comments means an approving review; any comment downgrades to a
/// neutral commenting review with the issue count in the summary.
///
/// # Examples
///
/// ```
/// use kestrel_core::Verdict;
/// use kestrel_review::github::decide_verdict;
///
/// let (verdict, summary) = decide_verdict(&[]);
/// assert_eq!(verdict, Verdict::Approve);
/// assert!(summary.contains("No issues found"));
/// ```
pub fn decide_verdict(comments: &[ReviewComment]) -> (Verdict, String) {
    if comments.is_empty() {
        (
            Verdict::Approve,
            "\u{2705} AI Review: No issues found. LGTM!".to_string(),
        )
    } else {
        (
            Verdict::Comment,
            format!(
                "\u{1f50d} AI Review: Found {} issue(s) to address.",
                comments.len()
            ),
        )
    }
}

/// Parse a PR reference string (`owner/repo#number`) into its components.
///
/// # Errors
///
/// Returns [`KestrelError::Config`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use kestrel_review::github::parse_pr_reference;
///
/// let (owner, repo, num) = parse_pr_reference("octocat/hello-world#42").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// assert_eq!(num, 42);
/// ```
pub fn parse_pr_reference(pr_ref: &str) -> Result<(String, String, u64), KestrelError> {
    let Some((owner_repo, number_str)) = pr_ref.split_once('#') else {
        return Err(KestrelError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    let Some((owner, repo)) = owner_repo.split_once('/') else {
        return Err(KestrelError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    let number: u64 = number_str
        .parse()
        .map_err(|_| KestrelError::Config(format!("invalid PR number: {number_str}")))?;
    Ok((owner.to_string(), repo.to_string(), number))
}

/// Extract the pull-request number from a CI event payload.
///
/// Returns `None` for events that do not concern a pull request.
///
/// # Examples
///
/// ```
/// use kestrel_review::github::pull_request_number;
///
/// let event = serde_json::json!({"pull_request": {"number": 7}});
/// assert_eq!(pull_request_number(&event), Some(7));
///
/// let push = serde_json::json!({"ref": "refs/heads/main"});
/// assert_eq!(pull_request_number(&push), None);
/// ```
pub fn pull_request_number(event: &serde_json::Value) -> Option<u64> {
    event.get("pull_request")?.get("number")?.as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::Side;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn comment(path: &str, line: u64) -> ReviewComment {
        ReviewComment {
            path: path.into(),
            line,
            side: Side::Right,
            body: "issue".into(),
        }
    }

    #[test]
    fn parse_valid_pr_reference() {
        let (owner, repo, num) = parse_pr_reference("rust-lang/rust#12345").unwrap();
        assert_eq!(owner, "rust-lang");
        assert_eq!(repo, "rust");
        assert_eq!(num, 12345);
    }

    #[test]
    fn parse_pr_reference_missing_hash() {
        assert!(parse_pr_reference("owner/repo").is_err());
    }

    #[test]
    fn parse_pr_reference_missing_slash() {
        assert!(parse_pr_reference("repo#123").is_err());
    }

    #[test]
    fn parse_pr_reference_invalid_number() {
        assert!(parse_pr_reference("owner/repo#abc").is_err());
    }

    #[test]
    fn empty_comments_approve() {
        let (verdict, summary) = decide_verdict(&[]);
        assert_eq!(verdict, Verdict::Approve);
        assert!(summary.contains("No issues found"));
    }

    #[test]
    fn comments_downgrade_to_comment_verdict_with_count() {
        let comments = vec![comment("a.rs", 1), comment("b.rs", 2), comment("b.rs", 9)];
        let (verdict, summary) = decide_verdict(&comments);
        assert_eq!(verdict, Verdict::Comment);
        assert!(summary.contains("3 issue(s)"));
    }

    #[test]
    fn event_payload_number_extraction() {
        let event = serde_json::json!({"action": "opened", "pull_request": {"number": 42}});
        assert_eq!(pull_request_number(&event), Some(42));

        let push = serde_json::json!({"ref": "refs/heads/main", "commits": []});
        assert_eq!(pull_request_number(&push), None);

        let odd = serde_json::json!({"pull_request": {"number": "42"}});
        assert_eq!(pull_request_number(&odd), None);
    }

    #[tokio::test]
    async fn list_changed_files_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/pulls/1/files"))
            .and(header("Authorization", "Bearer ghs_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"filename": "src/app.ts", "patch": "@@ +1 @@", "status": "modified"},
                {"filename": "logo.png", "status": "added"},
            ])))
            .mount(&server)
            .await;

        let client = GithubClient::with_base_url("ghs_test", server.uri()).unwrap();
        let files = client.list_changed_files("octo", "demo", 1).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "src/app.ts");
        assert!(files[1].patch.is_none());
    }

    #[tokio::test]
    async fn list_changed_files_follows_full_pages() {
        let server = MockServer::start().await;
        let full_page: Vec<serde_json::Value> = (0..PER_PAGE)
            .map(|i| {
                serde_json::json!({
                    "filename": format!("file{i}.rs"),
                    "patch": "@@ +1 @@",
                    "status": "modified",
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/pulls/1/files"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&full_page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/pulls/1/files"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"filename": "last.rs", "patch": "@@ +1 @@", "status": "added"},
            ])))
            .mount(&server)
            .await;

        let client = GithubClient::with_base_url("ghs_test", server.uri()).unwrap();
        let files = client.list_changed_files("octo", "demo", 1).await.unwrap();
        assert_eq!(files.len(), PER_PAGE + 1);
        assert_eq!(files.last().unwrap().filename, "last.rs");
    }

    #[tokio::test]
    async fn list_changed_files_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/pulls/1/files"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let client = GithubClient::with_base_url("ghs_test", server.uri()).unwrap();
        let err = client
            .list_changed_files("octo", "demo", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, KestrelError::Github(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn submit_review_posts_verdict_and_comments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/demo/pulls/1/reviews"))
            .and(body_partial_json(serde_json::json!({
                "event": "COMMENT",
                "body": "summary text",
                "comments": [
                    {"path": "a.rs", "line": 1, "side": "RIGHT", "body": "issue"},
                ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 99})))
            .mount(&server)
            .await;

        let client = GithubClient::with_base_url("ghs_test", server.uri()).unwrap();
        client
            .submit_review(
                "octo",
                "demo",
                1,
                Verdict::Comment,
                "summary text",
                &[comment("a.rs", 1)],
            )
            .await
            .unwrap();
    }
}
