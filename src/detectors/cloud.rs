//! Cloud platform detector.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detector::Detector;
use crate::probe::{is_truthy, Probes};

const HYPERVISOR_UUID: &str = "/sys/hypervisor/uuid";
const WORKERS_USER_AGENT: &str = "Cloudflare-Workers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloudProvider {
    AwsLambda,
    GoogleCloudFunctions,
    AzureFunctions,
    Vercel,
    Netlify,
    CloudflareWorkers,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::AwsLambda => "aws-lambda",
            CloudProvider::GoogleCloudFunctions => "google-cloud-functions",
            CloudProvider::AzureFunctions => "azure-functions",
            CloudProvider::Vercel => "vercel",
            CloudProvider::Netlify => "netlify",
            CloudProvider::CloudflareWorkers => "cloudflare-workers",
        }
    }
}

impl std::fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudInfo {
    pub is_cloud: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<CloudProvider>,
    pub is_serverless: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Detects serverless and PaaS platforms.
pub struct CloudDetector {
    probes: Probes,
}

impl CloudDetector {
    pub fn new(probes: Probes) -> Self {
        Self { probes }
    }

    fn any_var(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.probes.has_var(key))
    }

    pub fn provider(&self) -> Option<CloudProvider> {
        if self.any_var(&["AWS_LAMBDA_FUNCTION_NAME", "AWS_LAMBDA_FUNCTION_VERSION"]) {
            return Some(CloudProvider::AwsLambda);
        }
        if self.any_var(&["FUNCTION_TARGET", "FUNCTION_NAME", "K_SERVICE"]) {
            return Some(CloudProvider::GoogleCloudFunctions);
        }
        if self.any_var(&["FUNCTIONS_WORKER_RUNTIME", "AZURE_FUNCTIONS_ENVIRONMENT"]) {
            return Some(CloudProvider::AzureFunctions);
        }
        if self.any_var(&["VERCEL", "VERCEL_ENV"]) {
            return Some(CloudProvider::Vercel);
        }
        if self.any_var(&["NETLIFY"]) {
            return Some(CloudProvider::Netlify);
        }
        if self.any_var(&["CF_PAGES", "CF_WORKER"]) || self.probe_workers_runtime() {
            return Some(CloudProvider::CloudflareWorkers);
        }
        if self.looks_like_aws() {
            tracing::debug!("broad AWS heuristic matched");
            return Some(CloudProvider::AwsLambda);
        }
        None
    }

    /// Execution-environment variables, ECS metadata or an EC2 hypervisor.
    fn looks_like_aws(&self) -> bool {
        self.any_var(&[
            "AWS_EXECUTION_ENV",
            "AWS_LAMBDA_RUNTIME_API",
            "_HANDLER",
            "LAMBDA_TASK_ROOT",
            "LAMBDA_RUNTIME_DIR",
        ]) || self.any_var(&["ECS_CONTAINER_METADATA_URI", "ECS_CONTAINER_METADATA_URI_V4"])
            || self
                .probes
                .fs
                .read_to_string(Path::new(HYPERVISOR_UUID))
                .is_some_and(|uuid| uuid.trim().to_ascii_lowercase().starts_with("ec2"))
    }

    /// Look for traces of the Workers runtime. A panic while probing counts
    /// as "not Workers".
    fn probe_workers_runtime(&self) -> bool {
        let probe = AssertUnwindSafe(|| {
            cfg!(target_arch = "wasm32")
                || self
                    .probes
                    .first_var(&["HTTP_USER_AGENT", "USER_AGENT"])
                    .is_some_and(|ua| ua.contains(WORKERS_USER_AGENT))
        });
        panic::catch_unwind(probe).unwrap_or(false)
    }

    pub fn is_serverless(&self, provider: Option<CloudProvider>) -> bool {
        match provider {
            Some(
                CloudProvider::AwsLambda
                | CloudProvider::GoogleCloudFunctions
                | CloudProvider::AzureFunctions
                | CloudProvider::CloudflareWorkers,
            ) => true,
            Some(CloudProvider::Vercel) => self.any_var(&["VERCEL_REGION", "NOW_REGION"]),
            Some(CloudProvider::Netlify) => {
                is_truthy(self.probes.var("NETLIFY_DEV").as_deref())
                    || self.probes.has_var("NETLIFY_FUNCTIONS_PORT")
            }
            None => false,
        }
    }

    pub fn function_name(&self, provider: CloudProvider) -> Option<String> {
        let keys: &[&str] = match provider {
            CloudProvider::AwsLambda => &["AWS_LAMBDA_FUNCTION_NAME"],
            CloudProvider::GoogleCloudFunctions => {
                &["FUNCTION_NAME", "FUNCTION_TARGET", "K_SERVICE"]
            }
            CloudProvider::AzureFunctions => &["WEBSITE_SITE_NAME"],
            CloudProvider::Vercel => &["VERCEL_PROJECT_NAME"],
            CloudProvider::Netlify => &["SITE_NAME"],
            CloudProvider::CloudflareWorkers => &["CF_WORKER_NAME"],
        };
        self.probes.first_var(keys)
    }

    pub fn region(&self, provider: CloudProvider) -> Option<String> {
        let keys: &[&str] = match provider {
            CloudProvider::AwsLambda => &["AWS_REGION", "AWS_DEFAULT_REGION"],
            CloudProvider::GoogleCloudFunctions => &["FUNCTION_REGION", "GOOGLE_CLOUD_REGION"],
            CloudProvider::AzureFunctions => &["REGION_NAME"],
            CloudProvider::Vercel => &["VERCEL_REGION", "NOW_REGION"],
            CloudProvider::Netlify => &["AWS_REGION"],
            CloudProvider::CloudflareWorkers => &[],
        };
        self.probes.first_var(keys)
    }
}

impl Detector for CloudDetector {
    type Output = CloudInfo;

    fn name(&self) -> &'static str {
        "cloud"
    }

    fn detect(&self) -> CloudInfo {
        let provider = self.provider();
        if let Some(provider) = provider {
            tracing::debug!(?provider, "cloud platform detected");
        }

        CloudInfo {
            is_cloud: provider.is_some(),
            provider,
            is_serverless: self.is_serverless(provider),
            function_name: provider.and_then(|p| self.function_name(p)),
            region: provider.and_then(|p| self.region(p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::stub::{MapEnv, RootedFs};
    use tempfile::TempDir;

    fn detect_with(env: MapEnv, fs: RootedFs) -> CloudInfo {
        let probes = Probes::system(std::time::Duration::from_secs(1))
            .with_env(env)
            .with_fs(fs);
        CloudDetector::new(probes).detect()
    }

    fn detect(env: MapEnv) -> CloudInfo {
        let tmp = TempDir::new().unwrap();
        detect_with(env, RootedFs::new(tmp.path()))
    }

    #[test]
    fn test_no_cloud() {
        let info = detect(MapEnv::new());

        assert!(!info.is_cloud);
        assert!(!info.is_serverless);
        assert_eq!(info.provider, None);
        assert_eq!(info.function_name, None);
    }

    #[test]
    fn test_aws_lambda_region_fallback() {
        let info = detect(
            MapEnv::new()
                .with("AWS_LAMBDA_FUNCTION_NAME", "thumbnailer")
                .with("AWS_DEFAULT_REGION", "eu-west-1"),
        );

        assert_eq!(info.provider, Some(CloudProvider::AwsLambda));
        assert!(info.is_serverless);
        assert_eq!(info.function_name.as_deref(), Some("thumbnailer"));
        assert_eq!(info.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_aws_region_preferred_over_default() {
        let info = detect(
            MapEnv::new()
                .with("AWS_LAMBDA_FUNCTION_NAME", "f")
                .with("AWS_REGION", "us-east-1")
                .with("AWS_DEFAULT_REGION", "eu-west-1"),
        );
        assert_eq!(info.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_google_cloud_run() {
        let info = detect(MapEnv::new().with("K_SERVICE", "api"));

        assert_eq!(info.provider, Some(CloudProvider::GoogleCloudFunctions));
        assert_eq!(info.function_name.as_deref(), Some("api"));
        assert!(info.is_serverless);
    }

    #[test]
    fn test_function_name_and_region_chains() {
        let cases = [
            (
                MapEnv::new()
                    .with("FUNCTIONS_WORKER_RUNTIME", "dotnet")
                    .with("WEBSITE_SITE_NAME", "orders-api")
                    .with("REGION_NAME", "West Europe"),
                CloudProvider::AzureFunctions,
                Some("orders-api"),
                Some("West Europe"),
            ),
            (
                MapEnv::new()
                    .with("FUNCTION_TARGET", "handleEvent")
                    .with("FUNCTION_REGION", "us-central1")
                    .with("GOOGLE_CLOUD_REGION", "europe-west1"),
                CloudProvider::GoogleCloudFunctions,
                Some("handleEvent"),
                Some("us-central1"),
            ),
            (
                MapEnv::new()
                    .with("K_SERVICE", "api")
                    .with("GOOGLE_CLOUD_REGION", "europe-west1"),
                CloudProvider::GoogleCloudFunctions,
                Some("api"),
                Some("europe-west1"),
            ),
            (
                MapEnv::new()
                    .with("CF_WORKER", "1")
                    .with("CF_WORKER_NAME", "edge-router")
                    .with("AWS_REGION", "us-east-1"),
                CloudProvider::CloudflareWorkers,
                Some("edge-router"),
                None,
            ),
        ];

        for (env, provider, function_name, region) in cases {
            let info = detect(env);
            assert_eq!(info.provider, Some(provider));
            assert!(info.is_serverless, "{provider}");
            assert_eq!(info.function_name.as_deref(), function_name, "{provider}");
            assert_eq!(info.region.as_deref(), region, "{provider}");
        }
    }

    #[test]
    fn test_vercel_serverless_needs_region() {
        let static_deploy = detect(MapEnv::new().with("VERCEL", "1"));
        assert!(static_deploy.is_cloud);
        assert!(!static_deploy.is_serverless);

        let function = detect(
            MapEnv::new()
                .with("VERCEL", "1")
                .with("VERCEL_REGION", "iad1"),
        );
        assert!(function.is_serverless);
        assert_eq!(function.region.as_deref(), Some("iad1"));
    }

    #[test]
    fn test_netlify_dev_mode_is_serverless() {
        let build = detect(MapEnv::new().with("NETLIFY", "true"));
        assert_eq!(build.provider, Some(CloudProvider::Netlify));
        assert!(!build.is_serverless);

        let dev = detect(MapEnv::new().with("NETLIFY", "true").with("NETLIFY_DEV", "true"));
        assert!(dev.is_serverless);
    }

    #[test]
    fn test_workers_user_agent() {
        let info = detect(MapEnv::new().with("HTTP_USER_AGENT", "Cloudflare-Workers"));

        assert_eq!(info.provider, Some(CloudProvider::CloudflareWorkers));
        assert!(info.is_serverless);
    }

    #[test]
    fn test_provider_order() {
        let info = detect(
            MapEnv::new()
                .with("NETLIFY", "true")
                .with("AWS_LAMBDA_FUNCTION_NAME", "handler"),
        );
        assert_eq!(info.provider, Some(CloudProvider::AwsLambda));
    }

    #[test]
    fn test_ecs_metadata_reported_as_aws() {
        let info = detect(
            MapEnv::new().with("ECS_CONTAINER_METADATA_URI_V4", "http://169.254.170.2/v4"),
        );
        assert_eq!(info.provider, Some(CloudProvider::AwsLambda));
    }

    #[test]
    fn test_ec2_hypervisor_uuid() {
        let tmp = TempDir::new().unwrap();
        let fs = RootedFs::new(tmp.path());
        fs.write(HYPERVISOR_UUID, "ec2e1916-9099-7caf-fd21-012345abcdef\n").unwrap();

        let info = detect_with(MapEnv::new(), fs);
        assert_eq!(info.provider, Some(CloudProvider::AwsLambda));
    }

    #[test]
    fn test_non_ec2_hypervisor_uuid() {
        let tmp = TempDir::new().unwrap();
        let fs = RootedFs::new(tmp.path());
        fs.write(HYPERVISOR_UUID, "4b9a1c1e-0000-0000-0000-000000000000\n").unwrap();

        assert!(!detect_with(MapEnv::new(), fs).is_cloud);
    }

    #[test]
    fn test_provider_names_match_serde() {
        for provider in [
            CloudProvider::AwsLambda,
            CloudProvider::GoogleCloudFunctions,
            CloudProvider::AzureFunctions,
            CloudProvider::Vercel,
            CloudProvider::Netlify,
            CloudProvider::CloudflareWorkers,
        ] {
            let json = serde_json::to_value(provider).unwrap();
            assert_eq!(json.as_str(), Some(provider.as_str()));
        }
    }

    #[test]
    fn test_serverless_implies_cloud() {
        let envs = [
            MapEnv::new(),
            MapEnv::new().with("AWS_LAMBDA_FUNCTION_NAME", "f"),
            MapEnv::new().with("FUNCTION_TARGET", "f"),
            MapEnv::new().with("FUNCTIONS_WORKER_RUNTIME", "node"),
            MapEnv::new().with("VERCEL", "1").with("NOW_REGION", "sfo1"),
            MapEnv::new().with("NETLIFY", "true").with("NETLIFY_FUNCTIONS_PORT", "34567"),
            MapEnv::new().with("CF_PAGES", "1"),
            MapEnv::new().with("LAMBDA_TASK_ROOT", "/var/task"),
        ];

        for env in envs {
            let info = detect(env);
            assert!(!info.is_serverless || info.is_cloud, "{info:?}");
        }
    }
}
