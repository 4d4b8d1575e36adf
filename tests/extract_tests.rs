use std::path::Path;

use dataclaro_lib::extract::{
    read_transcript,
    reader::{checksum_bytes, clean_page, detect_kind, transcript_from_bytes},
    UploadKind,
};

#[test]
fn upload_kind_comes_from_mime_then_extension() {
    let pdf = Path::new("report.PDF");
    assert_eq!(detect_kind(pdf, None).expect("pdf"), UploadKind::Pdf);
    assert_eq!(
        detect_kind(Path::new("upload.bin"), Some("application/pdf")).expect("mime pdf"),
        UploadKind::Pdf
    );
    assert_eq!(detect_kind(Path::new("sales.csv"), None).expect("csv"), UploadKind::Csv);
    assert_eq!(
        detect_kind(Path::new("notes.txt"), None).expect("txt"),
        UploadKind::PlainText
    );
}

#[test]
fn unsupported_uploads_are_rejected() {
    let err = detect_kind(Path::new("slides.pptx"), None).expect_err("pptx rejected");
    assert_eq!(err.code(), "INVALID_INPUT");
    assert!(err.to_string().contains("unsupported file type"));

    let err = detect_kind(Path::new("README.md"), None).expect_err("markdown rejected");
    assert!(err.to_string().contains("PDF, CSV or plain-text (.txt)"));

    let err = detect_kind(Path::new("photo.pdf"), Some("image/png")).expect_err("mime wins");
    assert_eq!(err.code(), "INVALID_INPUT");
}

#[test]
fn blank_lines_are_collapsed() {
    assert_eq!(clean_page("a\n\n\nb"), "a\n\nb");
    assert_eq!(clean_page("\n\n  title  \nbody   \n\n\n"), "  title\nbody");
    assert_eq!(clean_page(""), "");
}

#[test]
fn csv_upload_is_one_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sales.csv");
    std::fs::write(&path, "region,revenue\nnorth,10\nsouth,12\n").expect("write csv");

    let transcript = read_transcript(&path, None).expect("csv transcript");
    assert_eq!(transcript.name, "sales.csv");
    assert_eq!(transcript.kind, UploadKind::Csv);
    assert_eq!(transcript.page_count(), 1);
    assert_eq!(transcript.text(), "region,revenue\nnorth,10\nsouth,12");
    assert_eq!(
        transcript.checksum,
        checksum_bytes(b"region,revenue\nnorth,10\nsouth,12\n")
    );
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = read_transcript(&dir.path().join("gone.pdf"), None).expect_err("missing");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn empty_uploads_are_rejected() {
    let err = transcript_from_bytes("empty.txt".to_string(), UploadKind::PlainText, b" \n\n ")
        .expect_err("empty text");
    assert!(err.to_string().contains("no text"));

    let err = transcript_from_bytes("bad.txt".to_string(), UploadKind::PlainText, &[0xff, 0xfe])
        .expect_err("not utf-8");
    assert_eq!(err.code(), "INVALID_INPUT");
}

#[test]
fn garbage_pdf_is_an_extraction_error() {
    let err = transcript_from_bytes(
        "broken.pdf".to_string(),
        UploadKind::Pdf,
        b"%PDF-1.4 this is not really a pdf",
    )
    .expect_err("garbage pdf");
    assert!(
        matches!(err.code(), "EXTRACTION_FAILED" | "INVALID_INPUT"),
        "{err}"
    );
}

#[test]
fn pages_join_with_newlines() {
    let transcript = dataclaro_lib::extract::Transcript {
        name: "doc.pdf".to_string(),
        kind: UploadKind::Pdf,
        checksum: checksum_bytes(b"x"),
        pages: vec!["one".to_string(), "two".to_string(), "three".to_string()],
    };
    assert_eq!(transcript.text(), "one\ntwo\nthree");
    assert_eq!(transcript.char_count(), 11);
    assert_eq!(UploadKind::Pdf.mime(), "application/pdf");
}
