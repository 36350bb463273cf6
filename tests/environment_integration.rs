use std::sync::Arc;
use std::time::Duration;

use envscope::cache::{ManualClock, TimedCache};
use envscope::detector::{CachedDetector, DetectorOptions};
use envscope::detectors::{
    CiDetector, CiInfo, CiProvider, ContainerInfo, ContainerType, EnvironmentMode,
    DEFAULT_MODE_VARIABLE,
};
use envscope::environment::Environment;
use envscope::probe::stub::{self, MapEnv, RootedFs, StubHost};
use envscope::probe::Probes;
use tempfile::TempDir;

fn environment(probes: Probes) -> Environment {
    Environment::with_probes(
        probes,
        Arc::new(TimedCache::new()),
        DetectorOptions::default(),
        DEFAULT_MODE_VARIABLE,
    )
}

#[test]
fn dockerenv_only_is_docker_container() {
    let tmp = TempDir::new().unwrap();
    RootedFs::new(tmp.path()).write("/.dockerenv", "").unwrap();

    let info = environment(stub::isolated(tmp.path())).snapshot();

    assert_eq!(
        info.container,
        ContainerInfo {
            is_container: true,
            is_docker: true,
            is_wsl: false,
            is_kubernetes: false,
            container_type: Some(ContainerType::Docker),
            wsl_version: None,
            wsl_distro: None,
        }
    );
}

#[test]
fn docker_inside_wsl_reports_docker() {
    let tmp = TempDir::new().unwrap();
    let fs = RootedFs::new(tmp.path());
    fs.write("/proc/self/cgroup", "0::/docker/4f1c2a").unwrap();
    fs.write("/proc/version", "Linux version 4.4.0-19041-Microsoft").unwrap();

    let info = environment(stub::isolated(tmp.path())).snapshot();

    assert!(info.container.is_docker);
    assert!(info.container.is_wsl);
    assert_eq!(info.container.container_type, Some(ContainerType::Docker));
    assert_eq!(info.container.wsl_version, Some(1));
}

#[test]
fn clean_linux_host() {
    let tmp = TempDir::new().unwrap();
    let env = environment(stub::isolated(tmp.path()));
    let info = env.snapshot();

    assert_eq!(info.mode.mode, EnvironmentMode::Development);
    assert!(!info.ci.is_ci);
    assert!(!info.cloud.is_cloud);
    assert_eq!(env.summary(), "linux");
}

#[test]
fn github_pull_request() {
    let tmp = TempDir::new().unwrap();
    let probes = stub::isolated(tmp.path()).with_env(
        MapEnv::new()
            .with("GITHUB_ACTIONS", "true")
            .with("GITHUB_EVENT_NAME", "pull_request"),
    );

    let info = environment(probes).snapshot();

    assert_eq!(
        info.ci,
        CiInfo {
            is_ci: true,
            name: Some("GitHub Actions".to_string()),
            provider: Some(CiProvider::GithubActions),
            is_pr: Some(true),
        }
    );
}

#[test]
fn kubernetes_service_account_detected() {
    let tmp = TempDir::new().unwrap();
    let fs = RootedFs::new(tmp.path());
    fs.write("/var/run/secrets/kubernetes.io/serviceaccount/token", "eyJ")
        .unwrap();
    let probes = stub::isolated(tmp.path())
        .with_host(StubHost::linux().with_hostname("api-7d9f8b6c5-x2x4z"));

    let env = environment(probes);

    assert!(env.is_kubernetes());
    assert_eq!(env.summary(), "linux+kubernetes");
}

#[test]
fn cached_result_expires_after_ttl() {
    let tmp = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(TimedCache::with_clock(clock.clone()));
    let options = DetectorOptions::default().with_ttl(Duration::from_millis(100));

    let quiet = CachedDetector::new(
        CiDetector::new(stub::isolated(tmp.path())),
        Arc::clone(&cache),
        options,
    );
    assert!(!quiet.detect_sync().is_ci);

    // Same cache, different environment: the stale value is served until expiry
    let in_ci = CachedDetector::new(
        CiDetector::new(stub::isolated(tmp.path()).with_env(MapEnv::new().with("CI", "true"))),
        Arc::clone(&cache),
        options,
    );
    assert!(!in_ci.detect_sync().is_ci);

    clock.advance(Duration::from_millis(101));
    assert!(in_ci.detect_sync().is_ci);
}

#[test]
fn reset_forces_recompute() {
    let tmp = TempDir::new().unwrap();
    let cache = Arc::new(TimedCache::new());
    let quiet = CachedDetector::new(
        CiDetector::new(stub::isolated(tmp.path())),
        Arc::clone(&cache),
        DetectorOptions::default(),
    );
    let in_ci = CachedDetector::new(
        CiDetector::new(stub::isolated(tmp.path()).with_env(MapEnv::new().with("CI", "1"))),
        Arc::clone(&cache),
        DetectorOptions::default(),
    );

    assert!(!quiet.detect_sync().is_ci);
    assert!(!in_ci.detect_sync().is_ci);

    in_ci.reset();
    assert!(in_ci.detect_sync().is_ci);
}

#[test]
fn cache_option_off_skips_writes() {
    let tmp = TempDir::new().unwrap();
    let cache = Arc::new(TimedCache::new());
    let options = DetectorOptions::default().with_cache(false);

    let quiet = CachedDetector::new(
        CiDetector::new(stub::isolated(tmp.path())),
        Arc::clone(&cache),
        options,
    );
    quiet.detect_sync();

    assert!(cache.is_empty());
}

#[tokio::test]
async fn async_and_sync_snapshots_agree() {
    let tmp = TempDir::new().unwrap();
    let fs = RootedFs::new(tmp.path());
    fs.write("/proc/1/cgroup", "12:pids:/kubepods/containerd/abc").unwrap();
    let probes = stub::isolated(tmp.path()).with_env(
        MapEnv::new()
            .with("TRAVIS", "true")
            .with("TRAVIS_PULL_REQUEST", "false")
            .with("VERCEL", "1")
            .with("APP_ENV", "test"),
    );

    let sync = environment(probes.clone()).snapshot();
    let deferred = environment(probes).snapshot_async().await;

    assert_eq!(sync, deferred);
    assert_eq!(sync.mode.mode, EnvironmentMode::Test);
}

#[tokio::test]
async fn asynchronous_option_defers_detection() {
    let tmp = TempDir::new().unwrap();
    let detector = CachedDetector::new(
        CiDetector::new(stub::isolated(tmp.path())),
        Arc::new(TimedCache::new()),
        DetectorOptions::default().with_asynchronous(true),
    );

    let detection = detector.detect();
    assert!(detection.is_deferred());
    assert!(!detection.await.is_ci);
}

#[test]
fn snapshot_json_omits_unset_fields() {
    let tmp = TempDir::new().unwrap();
    let info = environment(stub::isolated(tmp.path())).snapshot();
    let json = serde_json::to_value(&info).unwrap();

    assert_eq!(json["ci"], serde_json::json!({ "is_ci": false }));
    assert!(json["cloud"].get("provider").is_none());
    assert!(json["container"].get("container_type").is_none());
    assert_eq!(json["os"]["os_type"], "linux");
}
