use chrono::{TimeZone, Utc};
use dataclaro_lib::{
    core::config::SupabaseConfig,
    remote::{
        airtable::{parse_records, slug_formula, snippet, SNIPPET_LEN},
        supabase::{parse_row, parse_rows, parse_session, SupabaseClient},
    },
};
use serde_json::json;

#[test]
fn session_expiry_is_derived_from_expires_in() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let body = json!({
        "access_token": "at",
        "refresh_token": "rt",
        "expires_in": 3600,
        "user": {"id": "user-1", "email": "a@example.com"}
    });
    let session = parse_session(&body, now).expect("session");
    assert_eq!(session.expires_at, Some(now.timestamp() + 3600));
    assert_eq!(session.user.email.as_deref(), Some("a@example.com"));

    let body = json!({
        "access_token": "at",
        "refresh_token": "rt",
        "expires_at": 42,
        "expires_in": 3600,
        "user": {"id": "user-1"}
    });
    assert_eq!(parse_session(&body, now).expect("session").expires_at, Some(42));
}

#[test]
fn incomplete_session_is_a_store_error() {
    let now = Utc::now();
    let err = parse_session(&json!({"access_token": "at", "user": {"id": "u"}}), now)
        .expect_err("no refresh token");
    assert_eq!(err.code(), "STORE_ERROR");
    let err = parse_session(&json!({"access_token": "at", "refresh_token": "rt"}), now)
        .expect_err("no user");
    assert!(err.to_string().contains("user"));
}

#[test]
fn rows_accept_numeric_ids_and_legacy_payloads() {
    let row = json!({
        "id": 17,
        "user_id": "user-1",
        "pdf_name": "report.pdf",
        "created_at": "2024-03-01T10:00:00.123456+00:00",
        "analysis_result": {
            "summary": {"text": "legacy", "page": 2},
            "key_insights": [],
            "key_statistics": [],
            "takeaways": [{"text": "t", "page": 1}]
        }
    });
    let record = parse_row(&row).expect("row");
    assert_eq!(record.id, "17");
    assert_eq!(record.analysis_result.summary.page, 2);
    assert_eq!(record.analysis_result.action_items.len(), 1);
    assert!(record.pdf_checksum.is_none());

    let versioned = json!([{
        "id": "uuid-1",
        "user_id": "user-1",
        "pdf_name": "v2.pdf",
        "created_at": "2024-03-02T10:00:00Z",
        "analysis_result": {"schema_version": 2, "result": {"summary": {"text": "new", "page": 1}}}
    }]);
    let records = parse_rows(&versioned).expect("rows");
    assert_eq!(records[0].analysis_result.summary.text, "new");
}

#[test]
fn bad_rows_are_rejected() {
    assert!(parse_rows(&json!({"message": "oops"})).is_err());
    let err = parse_row(&json!({"id": "x", "user_id": "u", "pdf_name": "p", "created_at": "yesterday"}))
        .expect_err("bad timestamp");
    assert!(err.to_string().contains("created_at"));
}

#[test]
fn authorize_url_encodes_redirect() {
    let client = SupabaseClient::new(&SupabaseConfig {
        url: "https://abc.supabase.co".to_string(),
        anon_key: "anon".to_string(),
    })
    .expect("client");
    let url = client
        .authorize_url("google", "https://claropdf.com/user-dashboard")
        .expect("url");
    assert!(url.starts_with("https://abc.supabase.co/auth/v1/authorize?provider=google"));
    assert!(url.contains("redirect_to=https%3A%2F%2Fclaropdf.com%2Fuser-dashboard"));
}

#[test]
fn slug_formula_escapes_quotes() {
    assert_eq!(slug_formula("hello-world"), "{Slug} = 'hello-world'");
    assert_eq!(slug_formula("it's"), r"{Slug} = 'it\'s'");
    assert_eq!(slug_formula(r"a\b"), r"{Slug} = 'a\\b'");
}

#[test]
fn blog_records_are_parsed_with_tag_variants() {
    let page = json!({
        "records": [
            {"id": "rec1", "fields": {"Title": "One", "Slug": "one", "Tags": ["a", "b"], "PublishDate": "2024-01-01"}},
            {"id": "rec2", "fields": {"Title": "Two", "Slug": "two", "Tags": "solo"}},
            {"id": "rec3", "fields": {"Title": "Three", "Slug": "three"}},
            {"fields": {"Title": "No id"}}
        ],
        "offset": "itr123"
    });
    let posts = parse_records(&page).expect("records");
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].tags, vec!["a", "b"]);
    assert_eq!(posts[0].publish_date, "2024-01-01");
    assert_eq!(posts[1].tags, vec!["solo"]);
    assert!(posts[2].tags.is_empty());
    assert_eq!(posts[2].author, "");

    assert!(parse_records(&json!({"error": "NOT_FOUND"})).is_err());
}

#[test]
fn snippet_strips_markup_and_truncates() {
    assert_eq!(snippet("<p>Fish &amp; chips</p>", SNIPPET_LEN), "Fish & chips");
    let long = format!("<div>{}</div>", "x".repeat(200));
    let cut = snippet(&long, SNIPPET_LEN);
    assert_eq!(cut, format!("{}...", "x".repeat(150)));
    assert_eq!(snippet("short", 5), "short");
}
