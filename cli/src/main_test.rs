use super::*;

// =============================================================================
// Argument parsing
// =============================================================================

#[test]
fn parses_login_with_defaults() {
    let cli = Cli::try_parse_from(["critzone", "login", "--email", "a@b.co", "--password", "pw"]).expect("parse");
    assert_eq!(cli.base_url, DEFAULT_API_URL);
    let Command::Login(args) = cli.command else {
        panic!("expected login");
    };
    let form = LoginForm::from(args);
    assert_eq!(form.email, "a@b.co");
    assert_eq!(form.password, "pw");
}

#[test]
fn parses_verify_code_positionally() {
    let cli = Cli::try_parse_from(["critzone", "verify-otp", "123456"]).expect("parse");
    assert!(matches!(cli.command, Command::VerifyOtp { code } if code == "123456"));
}

#[test]
fn host_commands_are_kebab_case() {
    assert!(Cli::try_parse_from(["critzone", "host-login", "--email", "a@b.co", "--password", "pw"]).is_ok());
    assert!(Cli::try_parse_from(["critzone", "resend-otp"]).is_ok());
}

#[test]
fn signup_confirmation_defaults_to_password() {
    let args = SignupArgs {
        username: "ace".to_owned(),
        email: "ace@example.com".to_owned(),
        phone: "+1 555 123 4567".to_owned(),
        password: "pw".to_owned(),
        confirm_password: None,
    };
    let form = SignupForm::from(args);
    assert_eq!(form.confirm_password, "pw");
}

#[test]
fn signup_explicit_confirmation_is_kept() {
    let args = SignupArgs {
        username: "ace".to_owned(),
        email: "ace@example.com".to_owned(),
        phone: "+1 555 123 4567".to_owned(),
        password: "pw".to_owned(),
        confirm_password: Some("other".to_owned()),
    };
    assert_eq!(SignupForm::from(args).confirm_password, "other");
}

// =============================================================================
// Output helpers
// =============================================================================

#[test]
fn export_line_quotes_header() {
    assert_eq!(export_line("a=1; b=2"), "export CRITZONE_SESSION_COOKIE='a=1; b=2'");
}

#[test]
fn export_line_escapes_single_quotes() {
    assert_eq!(export_line("a='x'"), "export CRITZONE_SESSION_COOKIE='a='\\''x'\\'''");
}

#[test]
fn or_default_uses_fallback_for_blank() {
    assert_eq!(or_default("", "ok"), "ok");
    assert_eq!(or_default("API is healthy", "ok"), "API is healthy");
}

#[test]
fn auth_errors_render_user_message() {
    let err = CliError::from(AuthError::from(ApiError::Rejected { status: 401, message: "Invalid credentials".to_owned() }));
    assert_eq!(err.to_string(), "Invalid credentials");
}
