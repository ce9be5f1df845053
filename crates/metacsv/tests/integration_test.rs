//! Integration tests for MetaCSV.

use std::io::Write;
use tempfile::NamedTempFile;

use metacsv::io::to_csv_string;
use metacsv::table::{Parser, WriterConfig};
use metacsv::{
    read_csv, read_csv_from_reader, read_csv_from_str, read_header, read_series, write_csv,
    write_header, Assertions, CoordinateDeclaration, DataFrame, Expectation, Materialized,
    MetaCsvError, Metadata, MetadataContainer, ReadOptions, Tabular, Value, WriteOptions,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn decl(text: &str) -> CoordinateDeclaration {
    let value: serde_yaml::Value = serde_yaml::from_str(text).expect("valid YAML");
    CoordinateDeclaration::from_yaml(&value).expect("valid declaration")
}

const TEST6: &str = "---\n\
                     author: test author\n\
                     contact: my.email@isp.net\n\
                     version: test6.2016-05-01.01\n\
                     coords:\n  \
                       ind: null\n  \
                       ind2: null\n  \
                       ind3: ind2\n\
                     variables:\n  \
                       col1:\n    \
                         description: my first column\n    \
                         unit: wigits\n  \
                       col2:\n    \
                         description: my second column\n    \
                         unit: digits\n\
                     ...\n\
                     ind,ind2,ind3,col1,col2\n\
                     a,1,x,0.25,1\n\
                     a,2,y,0.5,2\n\
                     b,1,x,0.75,3\n\
                     b,2,y,1.0,4\n";

// =============================================================================
// Reading
// =============================================================================

#[test]
fn test_read_headered_file() {
    let file = create_test_file(TEST6);
    let container = read_csv(file.path(), &ReadOptions::default()).expect("Read failed");

    assert_eq!(container.table().index().named_levels(), vec!["ind", "ind2", "ind3"]);
    assert_eq!(container.table().column_names(), vec!["col1", "col2"]);
    assert_eq!(container.base_coords(), ["ind", "ind2"]);
    assert_eq!(
        container.attrs().keys().collect::<Vec<_>>(),
        vec!["author", "contact", "version"]
    );
}

#[test]
fn test_headered_and_plain_bodies_agree() {
    let plain = TEST6.split("...\n").nth(1).expect("body");
    let headered = read_csv_from_str(TEST6, &ReadOptions::default()).expect("headered");
    let bare = read_csv_from_str(plain, &ReadOptions::default()).expect("plain");

    assert_eq!(
        headered.table().column("col1"),
        Some(&[Value::Float(0.25), Value::Float(0.5), Value::Float(0.75), Value::Float(1.0)][..])
    );
    assert_eq!(headered.table().len(), bare.table().len());
}

#[test]
fn test_plain_file_has_empty_metadata() {
    let container =
        read_csv_from_str("\n\na,b\n1,2\n3,4\n", &ReadOptions::default()).expect("Read failed");

    assert!(container.attrs().is_empty());
    assert!(container.variables().is_empty());
    assert!(container.coords().is_none());
    assert_eq!(container.table().len(), 2);

    // Writing back produces no block and the same body
    let text = to_csv_string(&container, &WriterConfig::default()).expect("Write failed");
    assert_eq!(text, "a,b\n1,2\n3,4\n");
}

#[test]
fn test_read_from_reader() {
    let container = read_csv_from_reader(TEST6.as_bytes(), &ReadOptions::default())
        .expect("Read failed");
    assert_eq!(container.table().len(), 4);
}

#[test]
fn test_unterminated_block_is_error() {
    let result = read_csv_from_str("---\nauthor: me\na,b\n1,2\n", &ReadOptions::default());
    assert!(matches!(result, Err(MetaCsvError::MalformedHeader(_))));
}

#[test]
fn test_declared_coordinate_missing_from_table() {
    let text = "---\ncoords: [ind, missing]\n...\nind,v\na,1\n";
    let result = read_csv_from_str(text, &ReadOptions::default());
    assert!(matches!(result, Err(MetaCsvError::CoordinateMismatch { .. })));
}

#[test]
fn test_cyclic_header_coordinates() {
    let text = "---\ncoords: {a: b, b: a}\n...\na,b,v\n1,2,3\n";
    let result = read_csv_from_str(text, &ReadOptions::default());
    assert!(matches!(result, Err(MetaCsvError::CyclicGraph { .. })));
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_write_and_read_equivalency() {
    let mut original = read_csv_from_str(TEST6, &ReadOptions::default()).expect("Read failed");
    original
        .attrs_mut()
        .insert("other stuff", "this should show up after write");

    let out = NamedTempFile::new().expect("Failed to create temp file");
    write_csv(&original, out.path(), &WriteOptions::default()).expect("Write failed");
    let reread = read_csv(out.path(), &ReadOptions::default()).expect("Reread failed");

    assert_eq!(reread.attrs(), original.attrs());
    assert_eq!(reread.coords(), original.coords());
    assert_eq!(reread.variables(), original.variables());
    assert_eq!(reread, original);
}

#[test]
fn test_round_trip_within_precision() {
    let df = DataFrame::new(vec![
        ("id".into(), vec![Value::from("a"), Value::from("b")]),
        ("x".into(), vec![Value::Float(1.0 / 3.0), Value::Float(2.0 / 3.0)]),
    ])
    .expect("frame");
    let mut container = MetadataContainer::new(df);
    container.set_coordinates(&"id".into()).expect("coords");
    container.attrs_mut().insert("author", "me");

    let config = WriterConfig {
        float_precision: Some(6),
        ..Default::default()
    };
    let text = to_csv_string(&container, &config).expect("Write failed");
    let reread = read_csv_from_str(&text, &ReadOptions::default()).expect("Reread failed");

    let before = container.table().column("x").expect("x");
    let after = reread.table().column("x").expect("x");
    for (a, b) in before.iter().zip(after) {
        let (a, b) = (a.as_f64().expect("float"), b.as_f64().expect("float"));
        assert!((a - b).abs() < 1e-6);
    }
    assert_eq!(reread.coords(), container.coords());
}

#[test]
fn test_encoding_is_idempotent() {
    let container = read_csv_from_str(TEST6, &ReadOptions::default()).expect("Read failed");
    let first = to_csv_string(&container, &WriterConfig::default()).expect("Write failed");
    let second = to_csv_string(&container, &WriterConfig::default()).expect("Write failed");
    assert_eq!(first, second);

    let reread = read_csv_from_str(&first, &ReadOptions::default()).expect("Reread failed");
    let third = to_csv_string(&reread, &WriterConfig::default()).expect("Write failed");
    assert_eq!(first, third);
}

#[test]
fn test_write_header_to_separate_file() {
    let container = read_csv_from_str(TEST6, &ReadOptions::default()).expect("Read failed");
    let body = NamedTempFile::new().expect("body file");
    let header = NamedTempFile::new().expect("header file");

    let options = WriteOptions {
        header_file: Some(header.path().to_path_buf()),
        ..Default::default()
    };
    write_csv(&container, body.path(), &options).expect("Write failed");

    let body_text = std::fs::read_to_string(body.path()).expect("read body");
    assert!(body_text.starts_with("ind,ind2,ind3,col1,col2\n"));

    let read_options = ReadOptions {
        header_file: Some(header.path().to_path_buf()),
        ..Default::default()
    };
    let reread = read_csv(body.path(), &read_options).expect("Reread failed");
    assert_eq!(reread.metadata(), container.metadata());
}

#[test]
fn test_marker_lines_inside_attributes_survive_round_trip() {
    let mut original = read_csv_from_str(TEST6, &ReadOptions::default()).expect("Read failed");
    original
        .attrs_mut()
        .insert("notes", "line one\n...\nline three");
    original
        .attrs_mut()
        .insert("divider", "above\n---\nbelow");

    let out = NamedTempFile::new().expect("Failed to create temp file");
    write_csv(&original, out.path(), &WriteOptions::default()).expect("Write failed");
    let reread = read_csv(out.path(), &ReadOptions::default()).expect("Reread failed");

    assert_eq!(
        reread.attrs().get("notes"),
        Some(&serde_yaml::Value::from("line one\n...\nline three"))
    );
    assert_eq!(reread.coords(), original.coords());
    assert_eq!(reread.table().column_names(), vec!["col1", "col2"]);
    assert_eq!(reread, original);
}

#[test]
fn test_reserved_attribute_key_is_not_written() {
    let df = Parser::new().parse_str("a,b\n1,2\n").expect("parse");
    let mut container = MetadataContainer::new(df);
    container.attrs_mut().insert("coords", "not really");

    let result = to_csv_string(&container, &WriterConfig::default());
    assert!(matches!(result, Err(MetaCsvError::MalformedHeader(_))));
}

#[test]
fn test_zero_precision_floats_read_back_as_floats() {
    let df = DataFrame::new(vec![("x".into(), vec![Value::Float(3.0), Value::Float(4.0)])])
        .expect("frame");
    let container = MetadataContainer::new(df);

    let config = WriterConfig {
        float_precision: Some(0),
        ..Default::default()
    };
    let text = to_csv_string(&container, &config).expect("Write failed");
    assert_eq!(text, "x\n3.0\n4.0\n");

    let reread = read_csv_from_str(&text, &ReadOptions::default()).expect("Reread failed");
    assert_eq!(reread, container);
}

// =============================================================================
// Header Files
// =============================================================================

#[test]
fn test_header_writer() {
    let mut metadata = Metadata::new();
    metadata.attrs.insert("author", "test author");
    metadata.attrs.insert("contact", "my.email@isp.net");
    metadata
        .set_coords(&decl("{ind1: null, ind2: null, ind3: ind2}"))
        .expect("coords");
    let col1: serde_yaml::Value =
        serde_yaml::from_str("{description: my first column}").expect("valid YAML");
    metadata.variables.insert("col1", col1);

    let header = NamedTempFile::new().expect("header file");
    write_header(header.path(), &metadata).expect("Write failed");
    assert_eq!(read_header(header.path()).expect("Read failed"), metadata);

    let data = create_test_file("ind1,ind2,ind3,col1\n1,a,x,0.5\n2,b,y,0.25\n");
    let options = ReadOptions {
        header_file: Some(header.path().to_path_buf()),
        ..Default::default()
    };
    let container = read_csv(data.path(), &options).expect("Read failed");

    assert_eq!(container.attrs(), &metadata.attrs);
    assert_eq!(container.coords(), metadata.coords());
    assert_eq!(container.variables(), &metadata.variables);
}

#[test]
fn test_inline_header_wins_over_header_file() {
    let header = create_test_file("author: external\nlicense: MIT\n");
    let data = create_test_file("---\nauthor: inline\n...\na\n1\n");

    let options = ReadOptions {
        header_file: Some(header.path().to_path_buf()),
        ..Default::default()
    };
    let container = read_csv(data.path(), &options).expect("Read failed");

    assert_eq!(
        container.attrs().get("author"),
        Some(&serde_yaml::Value::from("inline"))
    );
    assert_eq!(
        container.attrs().get("license"),
        Some(&serde_yaml::Value::from("MIT"))
    );
}

// =============================================================================
// Coordinates
// =============================================================================

#[test]
fn test_column_promotion_scenario() {
    let df = Parser::new()
        .parse_str("region,year,value\nnorth,2000,1\nsouth,2000,2\n")
        .expect("Parse failed");
    let mut container = MetadataContainer::new(df);
    container
        .set_coordinates(&decl("{region: null, year: null}"))
        .expect("coords");

    assert_eq!(container.table().index().named_levels(), vec!["region", "year"]);
    assert_eq!(container.table().column_names(), vec!["value"]);
}

#[test]
fn test_borrowed_table_is_restructured() {
    let mut df = Parser::new()
        .parse_str("region,value\nnorth,1\n")
        .expect("Parse failed");
    {
        let mut container = MetadataContainer::new(&mut df);
        container.set_coordinates(&"region".into()).expect("coords");
    }
    assert_eq!(df.index().named_levels(), vec!["region"]);
}

// =============================================================================
// Variables and Assertions
// =============================================================================

const TEST7: &str = "---\n\
                     author: series creator\n\
                     version: test5.2016-05-01.01\n\
                     coords: ind\n\
                     variables:\n  \
                       col1: The first column [wigits]\n  \
                       col2: The second column [digits]\n\
                     ...\n\
                     ind,col1,col2\n\
                     1,0.5,2\n\
                     2,0.25,3\n";

#[test]
fn test_parse_vars() {
    let options = ReadOptions {
        parse_vars: true,
        ..Default::default()
    };
    let container = read_csv_from_str(TEST7, &options).expect("Read failed");
    let col1 = container.variables().field_attrs("col1").expect("col1");
    assert_eq!(col1["description"], serde_yaml::Value::from("The first column"));
    assert_eq!(col1["unit"], serde_yaml::Value::from("wigits"));
}

#[test]
fn test_assertions() {
    let passing = [
        Assertions::new().expect(
            "attrs",
            Expectation::nested([("version", Expectation::equals("test5.2016-05-01.01"))]),
        ),
        Assertions::new().expect(
            "attrs",
            Expectation::nested([(
                "version",
                Expectation::predicate(|v| v.as_str().is_some_and(|s| s > "test5.2016-05-01.00")),
            )]),
        ),
        Assertions::new().expect(
            "variables",
            Expectation::nested([(
                "col2",
                Expectation::nested([("unit", Expectation::equals("digits"))]),
            )]),
        ),
    ];

    for assertions in passing {
        let options = ReadOptions {
            parse_vars: true,
            assertions: Some(assertions),
            ..Default::default()
        };
        read_csv_from_str(TEST7, &options).expect("assertions should hold");
    }

    let failing = ReadOptions {
        assertions: Some(Assertions::new().expect("version", Expectation::equals("other"))),
        ..Default::default()
    };
    assert!(matches!(
        read_csv_from_str(TEST7, &failing),
        Err(MetaCsvError::AssertionFailed { .. })
    ));
}

// =============================================================================
// Materialization
// =============================================================================

#[test]
fn test_variable_attributes_persist_into_dataset() {
    let container = read_csv_from_str(TEST6, &ReadOptions::default()).expect("Read failed");
    let ds = match container.to_xarray().expect("Materialize failed") {
        Materialized::Dataset(ds) => ds,
        other => panic!("expected Dataset, got {:?}", other),
    };

    assert_eq!(ds.get("col1").expect("col1").attrs()["unit"], serde_yaml::Value::from("wigits"));
    assert_eq!(ds.attrs()["author"], serde_yaml::Value::from("test author"));
    assert_eq!(ds.dims().len(), 2);
    assert_eq!(ds.coord("ind3").expect("ind3").dims(), ["ind2"]);
    assert!(ds.get("col1").expect("col1").data().iter().all(|v| !v.is_null()));
}

#[test]
fn test_region_country_scenario() {
    let text = "---\n\
                coords: {region: null, year: null, country: region}\n\
                ...\n\
                region,year,country,value\n\
                north,2000,NO,1.5\n\
                north,2001,NO,1.7\n\
                south,2000,SE,2.5\n\
                south,2001,SE,2.9\n\
                east,2000,FI,0.5\n";
    let container = read_csv_from_str(text, &ReadOptions::default()).expect("Read failed");
    let ds = container.to_dataset().expect("Materialize failed");

    assert_eq!(ds.dims().keys().collect::<Vec<_>>(), vec!["region", "year"]);
    let country = ds.coord("country").expect("country");
    assert_eq!(country.dims(), ["region"]);
    assert_eq!(country.shape(), [3]);
}

#[test]
fn test_squeezed_series_to_dataarray() {
    let file = create_test_file("---\nauthor: series creator\ncoords: ind\n...\nind,col1\na,1\nb,2\n");
    let series = read_series(file.path(), &ReadOptions::default()).expect("Read failed");

    assert_eq!(series.table().ndim(), 1);
    assert_eq!(
        series.attrs().get("author"),
        Some(&serde_yaml::Value::from("series creator"))
    );

    let da = series.to_dataarray().expect("Materialize failed");
    assert_eq!(da.name(), Some("col1"));
    assert_eq!(da.dims(), ["ind"]);
}
