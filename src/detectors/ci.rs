//! CI system detector.
//!
//! Detection runs in two phases: a cheap "is this CI at all" check, then
//! provider identification in a fixed priority order. Pull-request context
//! is read from provider-specific variables.

use serde::{Deserialize, Serialize};

use crate::detector::Detector;
use crate::probe::{is_truthy, Probes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CiProvider {
    GithubActions,
    GitlabCi,
    TravisCi,
    Circleci,
    Jenkins,
    AzurePipelines,
    BitbucketPipelines,
    Teamcity,
    Appveyor,
    AwsCodebuild,
    Buildkite,
    Unknown,
}

/// Provider marker variables in priority order. First match wins.
const PROVIDER_VARS: &[(&str, CiProvider)] = &[
    ("GITHUB_ACTIONS", CiProvider::GithubActions),
    ("GITLAB_CI", CiProvider::GitlabCi),
    ("TRAVIS", CiProvider::TravisCi),
    ("CIRCLECI", CiProvider::Circleci),
    ("JENKINS_URL", CiProvider::Jenkins),
    ("TF_BUILD", CiProvider::AzurePipelines),
    ("BITBUCKET_BUILD_NUMBER", CiProvider::BitbucketPipelines),
    ("TEAMCITY_VERSION", CiProvider::Teamcity),
    ("APPVEYOR", CiProvider::Appveyor),
    ("CODEBUILD_BUILD_ID", CiProvider::AwsCodebuild),
    ("BUILDKITE", CiProvider::Buildkite),
];

/// Generic variables that only need to be present.
const GENERIC_CI_VARS: &[&str] = &["BUILD_NUMBER", "RUN_ID"];

/// Generic variables that must hold a truthy value.
const GENERIC_CI_FLAGS: &[&str] = &["CI", "CONTINUOUS_INTEGRATION"];

/// Fallback pull-request indicators for providers without their own rule.
const GENERIC_PR_VARS: &[&str] = &["CI_PULL_REQUEST", "PULL_REQUEST_ID", "PR_NUMBER"];

impl CiProvider {
    pub fn display_name(&self) -> Option<&'static str> {
        let name = match self {
            CiProvider::GithubActions => "GitHub Actions",
            CiProvider::GitlabCi => "GitLab CI",
            CiProvider::TravisCi => "Travis CI",
            CiProvider::Circleci => "CircleCI",
            CiProvider::Jenkins => "Jenkins",
            CiProvider::AzurePipelines => "Azure Pipelines",
            CiProvider::BitbucketPipelines => "Bitbucket Pipelines",
            CiProvider::Teamcity => "TeamCity",
            CiProvider::Appveyor => "AppVeyor",
            CiProvider::AwsCodebuild => "AWS CodeBuild",
            CiProvider::Buildkite => "Buildkite",
            CiProvider::Unknown => return None,
        };
        Some(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiInfo {
    pub is_ci: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<CiProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pr: Option<bool>,
}

impl CiInfo {
    /// Not running under CI. All details are left unset.
    pub fn none() -> Self {
        Self {
            is_ci: false,
            name: None,
            provider: None,
            is_pr: None,
        }
    }
}

/// Detects CI systems from environment variables.
pub struct CiDetector {
    probes: Probes,
}

impl CiDetector {
    pub fn new(probes: Probes) -> Self {
        Self { probes }
    }

    pub fn is_ci(&self) -> bool {
        GENERIC_CI_FLAGS
            .iter()
            .any(|key| is_truthy(self.probes.var(key).as_deref()))
            || GENERIC_CI_VARS.iter().any(|key| self.probes.has_var(key))
            || PROVIDER_VARS.iter().any(|(key, _)| self.probes.has_var(key))
    }

    pub fn provider(&self) -> CiProvider {
        PROVIDER_VARS
            .iter()
            .find(|(key, _)| self.probes.has_var(key))
            .map_or(CiProvider::Unknown, |(_, provider)| *provider)
    }

    fn display_name(&self, provider: CiProvider) -> String {
        provider
            .display_name()
            .map(str::to_string)
            .or_else(|| self.probes.var("CI_NAME"))
            .unwrap_or_else(|| "Unknown CI".to_string())
    }

    /// Set and not the literal `"false"`.
    fn set_and_not_false(&self, key: &str) -> bool {
        self.probes.var(key).is_some_and(|v| v != "false")
    }

    pub fn is_pull_request(&self, provider: CiProvider) -> bool {
        let probes = &self.probes;
        match provider {
            CiProvider::GithubActions => {
                probes.var("GITHUB_EVENT_NAME").as_deref() == Some("pull_request")
            }
            CiProvider::GitlabCi => probes.has_var("CI_MERGE_REQUEST_ID"),
            CiProvider::TravisCi => self.set_and_not_false("TRAVIS_PULL_REQUEST"),
            CiProvider::Circleci => probes.has_var("CIRCLE_PULL_REQUEST"),
            CiProvider::Jenkins => probes.has_var("CHANGE_ID"),
            CiProvider::AzurePipelines => probes.has_var("SYSTEM_PULLREQUEST_PULLREQUESTID"),
            CiProvider::BitbucketPipelines => probes.has_var("BITBUCKET_PR_ID"),
            CiProvider::Appveyor => probes.has_var("APPVEYOR_PULL_REQUEST_NUMBER"),
            CiProvider::AwsCodebuild => probes
                .var("CODEBUILD_WEBHOOK_HEAD_REF")
                .is_some_and(|r| r.starts_with("refs/pull/")),
            CiProvider::Buildkite => self.set_and_not_false("BUILDKITE_PULL_REQUEST"),
            CiProvider::Teamcity | CiProvider::Unknown => {
                GENERIC_PR_VARS.iter().any(|key| probes.has_var(key))
            }
        }
    }
}

impl Detector for CiDetector {
    type Output = CiInfo;

    fn name(&self) -> &'static str {
        "ci"
    }

    fn detect(&self) -> CiInfo {
        if !self.is_ci() {
            return CiInfo::none();
        }

        let provider = self.provider();
        tracing::debug!(?provider, "CI detected");

        CiInfo {
            is_ci: true,
            name: Some(self.display_name(provider)),
            provider: Some(provider),
            is_pr: Some(self.is_pull_request(provider)),
        }
    }
}
