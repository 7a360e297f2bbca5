use super::*;

#[test]
fn reads_never_carry_csrf() {
    let jar = CookieJar::parse("csrf_access_token=tok");
    assert_eq!(csrf_token(&jar, &Method::GET, paths::ME), None);
}

#[test]
fn writes_echo_access_csrf() {
    let jar = CookieJar::parse("csrf_access_token=tok; csrf_refresh_token=rtok");
    assert_eq!(csrf_token(&jar, &Method::POST, paths::LOGOUT), Some("tok"));
    assert_eq!(csrf_token(&jar, &Method::POST, paths::VERIFY_OTP), Some("tok"));
}

#[test]
fn refresh_echoes_refresh_csrf() {
    let jar = CookieJar::parse("csrf_access_token=tok; csrf_refresh_token=rtok");
    assert_eq!(csrf_token(&jar, &Method::POST, paths::REFRESH), Some("rtok"));
}

#[test]
fn missing_csrf_cookie_sends_nothing() {
    let jar = CookieJar::default();
    assert_eq!(csrf_token(&jar, &Method::POST, paths::LOGOUT), None);
}

#[test]
fn new_rejects_unprintable_api_key() {
    let config = ApiConfig::new("http://127.0.0.1:5000", "bad\nkey").expect("config");
    assert!(matches!(HttpAuthApi::new(config, CookieJar::default()), Err(CliError::InvalidHeader(_))));
}

#[test]
fn new_seeds_cookie_header_from_jar() {
    let config = ApiConfig::new("http://127.0.0.1:5000", "key").expect("config");
    let api = HttpAuthApi::new(config, CookieJar::parse("access_token_cookie=abc")).expect("api");
    assert_eq!(api.cookie_header().as_deref(), Some("access_token_cookie=abc"));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let config = ApiConfig::new("http://127.0.0.1:9", "key").expect("config");
    let api = HttpAuthApi::new(config, CookieJar::default()).expect("api");
    assert!(matches!(api.health().await, Err(ApiError::Network(_))));
}
