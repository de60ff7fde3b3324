use std::fs;
use std::path::PathBuf;

use crate::errors::ParserError;
use crate::parse_track_table;

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

#[test]
fn parses_sample_track_table() {
    let content = fixture("tracks_sample.csv");
    let df = parse_track_table(&content).expect("sample parse failed");

    assert_eq!(df.height(), 4);
    assert_eq!(df.width(), 27);
    assert_eq!(df.get_column_names()[0].as_str(), "Track");
    assert_eq!(df.get_column_names()[26].as_str(), "Explicit.Track");

    let streams = df.column("Spotify.Streams").unwrap().str().unwrap();
    assert_eq!(streams.get(0), Some("390,470,936"));
    assert_eq!(streams.get(3), Some("500"));

    let tiktok = df.column("TikTok.Views").unwrap().str().unwrap();
    assert_eq!(tiktok.get(1), Some("-1"));
    assert_eq!(tiktok.get(2), None);
}

#[test]
fn trims_cells_and_pads_short_rows() {
    let content = fixture("tracks_sample.csv");
    let df = parse_track_table(&content).expect("sample parse failed");

    let track = df.column("Track").unwrap().str().unwrap();
    assert_eq!(track.get(3), Some("Padded Row"));

    let explicit = df.column("Explicit.Track").unwrap().str().unwrap();
    assert_eq!(explicit.get(3), None);
    assert_eq!(explicit.get(1), Some("1"));
}

#[test]
fn strips_byte_order_mark() {
    let content = "\u{feff}Release.Date,Explicit.Track\n2015-01-01,1\n";
    let df = parse_track_table(content).expect("parse with BOM");

    assert_eq!(df.get_column_names()[0].as_str(), "Release.Date");
    assert_eq!(df.height(), 1);
}

#[test]
fn header_only_input_yields_empty_table() {
    let df = parse_track_table("Release.Date,Spotify.Streams\n").expect("header only");

    assert_eq!(df.height(), 0);
    assert_eq!(df.width(), 2);
}

#[test]
fn empty_input_is_rejected() {
    let err = parse_track_table("").unwrap_err();
    assert!(matches!(err, ParserError::EmptyInput));
}

#[test]
fn duplicate_header_is_rejected() {
    let err = parse_track_table("Track,Track\na,b\n").unwrap_err();
    match err {
        ParserError::InvalidHeader { index, message } => {
            assert_eq!(index, 1);
            assert!(message.contains("duplicate"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn overlong_row_reports_line() {
    let err = parse_track_table("Track,Artist\na,b\nc,d,e\n").unwrap_err();
    match err {
        ParserError::DataRow { line_index, .. } => assert_eq!(line_index, 3),
        other => panic!("unexpected error: {other}"),
    }
}
