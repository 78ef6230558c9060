//! The text interchange between the filters, run in-process

use pretty_assertions::assert_eq;
use wlp4_codegen::CodegenOptions;
use wlp4_common::ErrorKind;
use wlp4_driver::Pipeline;

const PROGRAM: &str = "\
int twice(int x) { return x + x; }
int wain(int* a, int n) {
    int i = 0;
    int s = 0;
    while (i < n) {
        s = s + twice(*(a + i));
        i = i + 1;
    }
    println(s);
    return s;
}
";

fn pipeline() -> Pipeline {
    Pipeline::wlp4().unwrap()
}

#[test]
fn test_staged_filters_match_direct_compile() {
    let pipeline = pipeline();
    let options = CodegenOptions::default();

    let listing = pipeline.scan(PROGRAM).unwrap();
    let tree = pipeline.parse(&listing).unwrap();
    let checked = pipeline.check(&tree).unwrap();
    let staged = pipeline.generate(&checked, &options).unwrap();

    assert_eq!(staged, pipeline.compile(PROGRAM, &options).unwrap());
}

#[test]
fn test_scan_listing_format() {
    let listing = pipeline().scan("int wain(int a, int b) { return 0; }").unwrap();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines[..4], ["INT int", "WAIN wain", "LPAREN (", "INT int"]);
    assert_eq!(lines.last(), Some(&"RBRACE }"));
}

#[test]
fn test_parse_output_starts_with_the_start_rule() {
    let pipeline = pipeline();
    let tree = pipeline
        .parse(&pipeline.scan("int wain(int a, int b) { return a; }").unwrap())
        .unwrap();
    assert_eq!(tree.lines().next(), Some("start BOF procedures EOF"));
}

#[test]
fn test_written_table_reloads() {
    let table = pipeline().grammar().to_lr1();
    let reloaded = Pipeline::from_lr1(&table).unwrap();
    let options = CodegenOptions { comments: false };
    assert_eq!(
        reloaded.compile(PROGRAM, &options).unwrap(),
        pipeline().compile(PROGRAM, &options).unwrap()
    );
}

#[test]
fn test_diagnostics() {
    let pipeline = pipeline();
    let options = CodegenOptions::default();

    let err = pipeline.scan("int wain(int a, int b) { return a # b; }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ScanningFailure);
    assert!(err.diagnostic().starts_with("ERROR: ScanningFailure"));

    let listing = pipeline.scan("int wain(int a, int b) { return a b; }").unwrap();
    let err = pipeline.parse(&listing).unwrap_err();
    assert_eq!(err.diagnostic(), "ERROR at 13");

    let err = pipeline
        .compile("int wain(int* a, int b) { int* c = NULL; return a + c; }", &options)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeDerivation);

    // wain's second parameter is checked before its body
    let err = pipeline
        .compile("int wain(int* a, int* b) { return a + b; }", &options)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeCorrectness);

    let err = Pipeline::from_lr1("not a table").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Grammar);
}

#[test]
fn test_compile_to_merl() {
    let bytes = pipeline()
        .compile_to_merl(PROGRAM, &CodegenOptions::default())
        .unwrap();
    assert_eq!(&bytes[..4], &[0x10, 0x00, 0x00, 0x02]);
    let module = mips_asm::MerlModule::from_bytes(&bytes).unwrap();
    assert!(module.imports().any(|(name, _)| name == "print"));
}
