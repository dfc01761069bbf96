//! Integration test to verify the workspace compiles correctly.

#![allow(clippy::no_effect_underscore_binding)]

#[test]
fn domain_crate_compiles() {
    // Verify domain types are accessible
    let _token = authgate_domain::AuthToken::new("Test");
    let _outcome = authgate_domain::AuthOutcome::succeeded();
    let _payload = authgate_domain::AuthPayload::empty();
}

#[test]
fn application_crate_compiles() {
    // Verify application types are accessible
    let _error = authgate_application::ApplicationError::UnregisteredProvider("Test".to_string());
    let _registry = authgate_application::ProviderRegistry::new();
}

#[test]
fn infrastructure_crate_compiles() {
    // Verify infrastructure adapters are accessible
    use authgate_application::ports::Clock;
    let clock = authgate_infrastructure::adapters::SystemClock::new();
    let _now = clock.now();
    let _settings = authgate_infrastructure::AuthSettings::default();
}
