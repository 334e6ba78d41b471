//! Unit tests for identity resolution: preloaded records and prompting.

use std::fs;
use std::io::Cursor;

use session_provisioner::credentials::prompt::{LinePrompter, Prompter, Tone};
use session_provisioner::credentials::{
    preloaded, prompt_identity, resolve_identity, session_file, IdentityOrigin,
};
use session_provisioner::models::identity::SessionIdentity;
use session_provisioner::AppError;

fn prompter(input: &str) -> LinePrompter<Cursor<Vec<u8>>, Vec<u8>> {
    LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), false)
}

fn output(prompter: LinePrompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8(prompter.into_output()).expect("utf8 output")
}

// ── Interactive path ────────────────────────────────────────────────

#[test]
fn prompts_for_both_values() {
    let mut p = prompter("kord_ai-abc123xyz\n+234 801 234 5678\n");

    let identity = prompt_identity(&mut p).expect("resolved");

    assert_eq!(identity.session_token(), "kord_ai-abc123xyz");
    assert_eq!(identity.owner_number(), "2348012345678");
    let out = output(p);
    assert!(out.contains("SESSION_ID: "));
    assert!(out.contains("OWNER_NUMBER: "));
    assert!(out.contains("Session ID accepted"));
    assert!(out.contains("Owner number accepted"));
}

#[test]
fn reprompts_until_token_is_valid() {
    let mut p = prompter("foo-bar\n\nkord_ai-ok\n2348012345678\n");

    let identity = prompt_identity(&mut p).expect("resolved");

    assert_eq!(identity.session_token(), "kord_ai-ok");
    let out = output(p);
    assert_eq!(out.matches("SESSION_ID: ").count(), 3);
    assert_eq!(out.matches("Error: must start with \"kord_ai-\"").count(), 2);
    assert_eq!(out.matches("Example: kord_ai-abc123xyz").count(), 2);
}

#[test]
fn reprompts_until_number_is_valid() {
    let mut p = prompter("kord_ai-ok\n12345\n12345678901234567\n234-801-234-5678\n");

    let identity = prompt_identity(&mut p).expect("resolved");

    assert_eq!(identity.owner_number(), "2348012345678");
    let out = output(p);
    assert_eq!(out.matches("OWNER_NUMBER: ").count(), 3);
    assert_eq!(out.matches("Error: must be 10-15 digits").count(), 2);
    assert_eq!(out.matches("Example: 234XXXXXXXXXX").count(), 2);
}

#[test]
fn accepts_windows_line_endings() {
    let mut p = prompter("kord_ai-abc\r\n2348012345678\r\n");
    let identity = prompt_identity(&mut p).expect("resolved");
    assert_eq!(identity.session_token(), "kord_ai-abc");
}

#[test]
fn end_of_input_is_an_io_error() {
    let mut p = prompter("foo-bar\n");
    let result = prompt_identity(&mut p);
    assert!(matches!(result, Err(AppError::Io(_))));
}

#[test]
fn colors_are_applied_when_enabled() {
    let mut p = LinePrompter::new(Cursor::new(Vec::new()), Vec::new(), true);
    p.say(Tone::Error, "Error: x").expect("say");
    let out = String::from_utf8(p.into_output()).expect("utf8");
    assert_eq!(out, "\x1b[31mError: x\x1b[0m\n");
}

#[test]
fn plain_tone_is_never_colored() {
    let mut p = LinePrompter::new(Cursor::new(Vec::new()), Vec::new(), true);
    p.say(Tone::Plain, "Cloning repository...").expect("say");
    let out = String::from_utf8(p.into_output()).expect("utf8");
    assert_eq!(out, "Cloning repository...\n");
}

#[test]
fn closed_prompter_refuses_to_read() {
    let mut p = prompter("kord_ai-abc\n");
    p.close();
    p.close();
    assert!(p.is_closed());
    assert!(matches!(p.ask("SESSION_ID: "), Err(AppError::Io(_))));
}

// ── Preloaded path ──────────────────────────────────────────────────

#[test]
fn preloaded_record_is_used_and_deleted() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("preloaded.json");
    fs::write(&path, r#"{"session":"kord_ai-pre","owner":"2348012345678"}"#).expect("write");

    let identity = preloaded::consume(&path).expect("record used");

    assert_eq!(identity.session_token(), "kord_ai-pre");
    assert!(!path.exists(), "record must be deleted after reading");
}

#[test]
fn preloaded_values_are_not_revalidated() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("preloaded.json");
    fs::write(&path, r#"{"session":"external-token","owner":"+1 555"}"#).expect("write");

    let identity = preloaded::consume(&path).expect("record used");

    assert_eq!(identity.session_token(), "external-token");
    assert_eq!(identity.owner_number(), "+1 555");
}

#[test]
fn malformed_record_is_deleted_and_ignored() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("preloaded.json");
    fs::write(&path, "not json").expect("write");

    assert!(preloaded::consume(&path).is_none());
    assert!(!path.exists(), "malformed record must still be deleted");
}

#[test]
fn record_missing_fields_is_ignored() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("preloaded.json");
    fs::write(&path, r#"{"session":"kord_ai-pre"}"#).expect("write");

    assert!(preloaded::consume(&path).is_none());
    assert!(!path.exists());
}

#[test]
fn record_with_blank_fields_is_ignored() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("preloaded.json");
    fs::write(&path, r#"{"session":"  ","owner":"2348012345678"}"#).expect("write");

    assert!(preloaded::consume(&path).is_none());
}

#[test]
fn absent_record_yields_none() {
    let temp = tempfile::tempdir().expect("tempdir");
    assert!(preloaded::consume(&temp.path().join("absent.json")).is_none());
}

// ── Resolver ────────────────────────────────────────────────────────

#[test]
fn resolver_prefers_preloaded_and_never_prompts() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("preloaded.json");
    fs::write(&path, r#"{"session":"kord_ai-pre","owner":"2348012345678"}"#).expect("write");
    let mut p = prompter("");

    let resolved = resolve_identity(&path, &mut p).expect("resolved");

    assert_eq!(resolved.origin, IdentityOrigin::Preloaded);
    assert!(p.is_closed(), "channel closed after resolution");
    assert_eq!(output(p), "", "channel must not be queried");
}

#[test]
fn resolver_falls_back_to_prompt_on_bad_record() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("preloaded.json");
    fs::write(&path, "{").expect("write");
    let mut p = prompter("kord_ai-live\n2348012345678\n");

    let resolved = resolve_identity(&path, &mut p).expect("resolved");

    assert_eq!(resolved.origin, IdentityOrigin::Interactive);
    assert_eq!(resolved.identity.session_token(), "kord_ai-live");
    assert!(p.is_closed());
}

#[test]
fn resolver_closes_channel_on_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut p = prompter("");

    let result = resolve_identity(&temp.path().join("absent.json"), &mut p);

    assert!(result.is_err());
    assert!(p.is_closed());
}

// ── Per-session credential file ─────────────────────────────────────

#[test]
fn session_file_round_trips_through_preloaded_reader() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("creds").join("creds-abc.json");
    let identity = SessionIdentity::trusted("kord_ai-abc".into(), "2348012345678".into());

    session_file::write(&path, &identity).expect("write");

    assert!(path.exists());
    assert_eq!(preloaded::consume(&path), Some(identity));
}

#[cfg(unix)]
#[test]
fn session_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("creds-abc.json");
    let identity = SessionIdentity::trusted("kord_ai-abc".into(), "2348012345678".into());

    session_file::write(&path, &identity).expect("write");

    let mode = fs::metadata(&path).expect("meta").permissions().mode();
    assert_eq!(mode & 0o077, 0, "group/other must have no access");
}
