//! Unit tests for the provisioning state machine and per-run context.

use std::path::PathBuf;

use session_provisioner::models::identity::SessionIdentity;
use session_provisioner::orchestrator::{ProvisionContext, ProvisionState};
use session_provisioner::{AppError, GlobalConfig};

const ORDER: [ProvisionState; 9] = [
    ProvisionState::ResolveIdentity,
    ProvisionState::PrepareNamespace,
    ProvisionState::FetchTemplate,
    ProvisionState::Materialize,
    ProvisionState::WriteConfig,
    ProvisionState::InstallDependencies,
    ProvisionState::CleanupCredentials,
    ProvisionState::StartRuntime,
    ProvisionState::Running,
];

#[test]
fn happy_path_is_strictly_sequential() {
    for pair in ORDER.windows(2) {
        assert_eq!(pair[0].next(), Some(pair[1]));
        assert!(pair[0].can_transition_to(pair[1]));
    }
}

#[test]
fn states_cannot_be_skipped() {
    for (i, from) in ORDER.iter().enumerate() {
        for to in ORDER.iter().skip(i + 2) {
            assert!(!from.can_transition_to(*to), "{from:?} -> {to:?}");
        }
    }
}

#[test]
fn states_cannot_be_retried() {
    for state in ORDER {
        assert!(!state.can_transition_to(state), "{state:?} retried");
    }
}

#[test]
fn every_active_state_may_fail() {
    for state in &ORDER[..ORDER.len() - 1] {
        assert!(state.can_transition_to(ProvisionState::Failed));
    }
}

#[test]
fn terminals_are_final() {
    for terminal in [ProvisionState::Running, ProvisionState::Failed] {
        assert!(terminal.is_terminal());
        assert_eq!(terminal.next(), None);
        assert!(!terminal.can_transition_to(ProvisionState::Failed));
        assert!(!terminal.can_transition_to(ProvisionState::ResolveIdentity));
    }
}

#[test]
fn state_names_are_snake_case() {
    assert_eq!(ProvisionState::ResolveIdentity.as_str(), "resolve_identity");
    assert_eq!(ProvisionState::InstallDependencies.as_str(), "install_dependencies");
}

fn config() -> GlobalConfig {
    GlobalConfig {
        instances_root: PathBuf::from("/srv/instances"),
        staging_root: PathBuf::from("/tmp/staging"),
        credentials_dir: PathBuf::from("/run/creds"),
        ..GlobalConfig::default()
    }
}

#[test]
fn context_derives_all_paths_from_slug() {
    let identity =
        SessionIdentity::validated("kord_ai-abc123xyz", "+234 801 234 5678").expect("valid");

    let ctx = ProvisionContext::new(&config(), identity).expect("context");

    assert_eq!(ctx.slug, "abc123xyz");
    assert_eq!(ctx.instance_dir, PathBuf::from("/srv/instances/instance-abc123xyz"));
    assert_eq!(ctx.staging_dir, PathBuf::from("/tmp/staging/staging-abc123xyz"));
    assert_eq!(ctx.credential_file, PathBuf::from("/run/creds/creds-abc123xyz.json"));
    assert_eq!(ctx.lock_file, PathBuf::from("/tmp/staging/abc123xyz.lock"));
    assert_eq!(ctx.identity.owner_number(), "2348012345678");
}

#[test]
fn context_rejects_empty_slug() {
    let identity = SessionIdentity::trusted("kord_ai-!!!".into(), "2348012345678".into());

    let result = ProvisionContext::new(&config(), identity);

    assert!(matches!(result, Err(AppError::Format(_))));
}
