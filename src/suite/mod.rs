//! Conformance groups run against a Todo collection endpoint.
//!
//! Groups run one after another; inside a group every case issues its
//! requests and awaits them before the next case starts. A failed setup
//! request fails every case of its group.

pub mod expect;

use std::fmt;

use anyhow::bail;
use reqwest::{Method, StatusCode};
use serde_json::json;
use tracing::{info, warn};

use crate::client::{ApiResponse, TodoClient};
use crate::config::CheckConfig;
use crate::models::NewTodo;
use expect::{CheckError, CheckResult};

/// Title posted by every group that needs an item.
pub const SAMPLE_TITLE: &str = "Test the API using nodejs";

pub const CORS_HEADERS: [&str; 3] = [
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
];

#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub group: &'static str,
    pub case: &'static str,
    pub result: CheckResult,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    outcomes: Vec<CaseOutcome>,
}

impl Report {
    fn record(&mut self, group: &'static str, case: &'static str, result: CheckResult) {
        match &result {
            Ok(()) => info!(group, case, "passed"),
            Err(err) => warn!(group, case, %err, "failed"),
        }
        self.outcomes.push(CaseOutcome {
            group,
            case,
            result,
        });
    }

    pub fn outcomes(&self) -> &[CaseOutcome] {
        &self.outcomes
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Fails with a summary when any case failed.
    pub fn ensure_success(&self) -> anyhow::Result<()> {
        let failed = self.failures().count();
        if failed > 0 {
            bail!("{failed} conformance case(s) failed");
        }
        Ok(())
    }
}

/// Runs every group as configured by the `check` command.
pub async fn check(config: &CheckConfig) -> anyhow::Result<Report> {
    let client = TodoClient::new(config.timeout())?;
    let report = Suite::new(client, &config.url)
        .with_origin(&config.origin)
        .run()
        .await;
    Ok(report)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut group = "";
        for outcome in &self.outcomes {
            if outcome.group != group {
                group = outcome.group;
                writeln!(f, "{group}")?;
            }
            match &outcome.result {
                Ok(()) => writeln!(f, "  ok   {}", outcome.case)?,
                Err(err) => writeln!(f, "  FAIL {}: {err}", outcome.case)?,
            }
        }
        let failed = self.outcomes.len() - self.passed();
        write!(f, "{} passing, {} failing", self.passed(), failed)
    }
}

/// Runs every group against one collection URL.
#[derive(Debug, Clone)]
pub struct Suite {
    client: TodoClient,
    url: String,
    origin: String,
}

impl Suite {
    pub fn new(client: TodoClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            origin: "http://test.com".to_string(),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub async fn run(&self) -> Report {
        let mut report = Report::default();
        self.cross_origin(&mut report).await;
        self.create(&mut report).await;
        self.update(&mut report).await;
        self.delete(&mut report).await;
        report
    }

    pub async fn cross_origin(&self, report: &mut Report) {
        const GROUP: &str = "Cross Origin Request";
        let result = self.client.options(&self.url, &self.origin).await;

        report.record(
            GROUP,
            "should return the correct CORS headers",
            expect::settled(&result).and_then(|res| expect::header_keys(res, &CORS_HEADERS)),
        );
        report.record(
            GROUP,
            "should allow all origins",
            expect::settled(&result)
                .and_then(|res| expect::header_eq(res, "access-control-allow-origin", "*")),
        );
    }

    pub async fn create(&self, report: &mut Report) {
        const GROUP: &str = "Create Todo item";
        let result = self.client.post(&self.url, &NewTodo::new(SAMPLE_TITLE)).await;

        report.record(
            GROUP,
            "should return 201 CREATED response",
            expect::settled(&result).and_then(|res| expect::status(res, StatusCode::CREATED)),
        );
        report.record(
            GROUP,
            "should receive location hyperlink",
            expect::settled(&result).and_then(|res| {
                expect::header_matches(res, "location", expect::location_regex())
            }),
        );
        let created = match expect::settled(&result) {
            Ok(res) => self.fetch_location(res).await,
            Err(err) => Err(err),
        };
        report.record(GROUP, "should create item", created);

        self.teardown(GROUP).await;
    }

    async fn fetch_location(&self, created: &ApiResponse) -> CheckResult {
        let location = expect::header(created, "location")?;
        let item = self.client.get(location).await?;
        expect::field_eq(&item, "title", SAMPLE_TITLE)
    }

    pub async fn update(&self, report: &mut Report) {
        const GROUP: &str = "Update Todo item";
        for (case, method) in [
            ("should have set completed as true - PUT request", Method::PUT),
            ("should have set completed as true - PATCH request", Method::PATCH),
        ] {
            let result = match self.seed().await {
                Ok(location) => self.mark_completed(&location, method).await,
                Err(err) => Err(err),
            };
            report.record(GROUP, case, result);
        }

        self.teardown(GROUP).await;
    }

    async fn mark_completed(&self, location: &str, method: Method) -> CheckResult {
        let result = self
            .client
            .update(location, method, &json!({ "completed": true }))
            .await?;
        expect::field_eq(&result, "completed", true)
    }

    pub async fn delete(&self, report: &mut Report) {
        const GROUP: &str = "Delete Todo item";

        let result = match self.seed().await {
            Ok(location) => match self.client.del(&location).await {
                Ok(res) => expect::status(&res, StatusCode::NO_CONTENT)
                    .and_then(|()| expect::empty_body(&res)),
                Err(err) => Err(err.into()),
            },
            Err(err) => Err(err),
        };
        report.record(GROUP, "should return 204 NO CONTENT response", result);

        let result = match self.seed().await {
            Ok(location) => match self.client.del(&location).await {
                Ok(_) => expect::rejected_with(&self.client.get(&location).await, "Not Found"),
                Err(err) => Err(err.into()),
            },
            Err(err) => Err(err),
        };
        report.record(GROUP, "should delete item", result);
    }

    // before-each hook: creates an item and returns its location
    async fn seed(&self) -> Result<String, CheckError> {
        let created = self.client.post(&self.url, &NewTodo::new(SAMPLE_TITLE)).await?;
        expect::header(&created, "location").map(str::to_string)
    }

    // after hook: clears the collection
    async fn teardown(&self, group: &str) {
        if let Err(err) = self.client.del(&self.url).await {
            warn!(group, %err, "teardown failed");
        }
    }
}
