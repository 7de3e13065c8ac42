use super::cli::*;
use crate::test_utils::argv;
use std::path::PathBuf;

#[test]
fn define_without_value() {
    assert_eq!(parse_define("DEBUG"), Ok(("DEBUG", None)));
}

#[test]
fn define_with_value() {
    assert_eq!(parse_define("FOO=1"), Ok(("FOO", Some("1"))));
    assert_eq!(parse_define("MAX_LEN=4096"), Ok(("MAX_LEN", Some("4096"))));
}

#[test]
fn define_with_empty_value() {
    assert_eq!(parse_define("FOO="), Ok(("FOO", Some(""))));
}

#[test]
fn define_with_two_equal_signs_fails() {
    assert_eq!(
        parse_define("key=value=extra"),
        Err(DefineError::DuplicateEquals("key=value=extra".to_string()))
    );
    assert!(parse_define("a==b").is_err());
}

#[test]
fn define_with_invalid_chars_fails() {
    for bad in ["FOO BAR", "FOO-1", "x=\"str\"", "a.b", "é"] {
        assert_eq!(
            parse_define(bad),
            Err(DefineError::InvalidChar(bad.to_string())),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn define_without_name_fails() {
    assert_eq!(parse_define("=1"), Err(DefineError::EmptyName("=1".to_string())));
    assert!(parse_define("").is_err());
}

#[test]
fn define_length_limit() {
    let longest = "A".repeat(MAX_DEFINE_LEN);
    assert_eq!(parse_define(&longest), Ok((longest.as_str(), None)));

    let split = format!("{}={}", "K".repeat(512), "V".repeat(512));
    assert!(parse_define(&split).is_ok());

    let too_long = "A".repeat(MAX_DEFINE_LEN + 1);
    assert_eq!(parse_define(&too_long), Err(DefineError::TooLong));
}

#[test]
fn define_does_not_touch_input() {
    let arg = String::from("FOO=1");
    let (key, value) = parse_define(&arg).unwrap();
    assert_eq!((key, value), ("FOO", Some("1")));
    assert_eq!(arg, "FOO=1");
}

#[test]
fn partition_at_separator() {
    let partition = ArgPartition::split(&argv(&["-q", "prog.c", "--", "a", "b"]));
    insta::assert_debug_snapshot!(partition, @r#"
    ArgPartition {
        driver: [
            "-q",
            "prog.c",
        ],
        program: [
            "a",
            "b",
        ],
        separator: Some(
            3,
        ),
    }
    "#);
}

#[test]
fn partition_without_separator() {
    let partition = ArgPartition::split(&argv(&["prog.c", "a"]));
    assert_eq!(partition.driver, vec!["prog.c", "a"]);
    assert!(partition.program.is_empty());
    assert_eq!(partition.separator, None);
}

#[test]
fn partition_splits_at_first_separator_only() {
    let partition = ArgPartition::split(&argv(&["prog.c", "--", "--", "-x"]));
    assert_eq!(partition.driver, vec!["prog.c"]);
    assert_eq!(partition.program, vec!["--", "-x"]);
    assert_eq!(partition.separator, Some(2));
}

#[test]
fn partition_with_trailing_separator() {
    let partition = ArgPartition::split(&argv(&["prog.c", "--"]));
    assert_eq!(partition.driver, vec!["prog.c"]);
    assert!(partition.program.is_empty());
    assert_eq!(partition.separator, Some(2));
}

#[test]
fn parse_all_short_flags() {
    let parsed = parse_args(&argv(&[
        "-q", "-D", "FOO=1", "-DBAR", "-C", "-O2 -Wall", "-I", "inc", "-l", "m", "-L", "lib", "-e", "start", "-p",
        "run.pid", "-o", "out", "a.c", "-", "b.o",
    ]))
    .unwrap();
    let cli = parsed.cli;
    assert!(cli.quiet);
    assert_eq!(cli.defines, vec!["FOO=1", "BAR"]);
    assert_eq!(cli.cflags, vec!["-O2 -Wall"]);
    assert_eq!(cli.include_paths, vec![PathBuf::from("inc")]);
    assert_eq!(cli.libraries, vec!["m"]);
    assert_eq!(cli.library_paths, vec![PathBuf::from("lib")]);
    assert_eq!(cli.entry.as_deref(), Some("start"));
    assert_eq!(cli.pid_file, Some(PathBuf::from("run.pid")));
    assert_eq!(cli.output, Some(PathBuf::from("out")));
    assert!(!cli.compile_only);
    assert_eq!(cli.files, vec!["a.c", "-", "b.o"]);
    assert!(parsed.skipped.is_empty());
}

#[test]
fn parse_long_options() {
    let parsed = parse_args(&argv(&["--temp", "--live", "--xtgz", "bundle.tar.gz"])).unwrap();
    assert!(parsed.cli.temp);
    assert!(parsed.cli.live);
    assert_eq!(parsed.cli.xtgz, Some(PathBuf::from("bundle.tar.gz")));
}

#[test]
fn options_after_separator_are_not_parsed() {
    let parsed = parse_args(&argv(&["prog.c", "--", "-q", "-D", "X"])).unwrap();
    assert!(!parsed.cli.quiet);
    assert!(parsed.cli.defines.is_empty());
    assert_eq!(parsed.cli.files, vec!["prog.c"]);
    assert_eq!(parsed.partition.program, vec!["-q", "-D", "X"]);
}

#[test]
fn unknown_option_is_skipped() {
    let parsed = parse_args(&argv(&["-Z", "prog.c"])).unwrap();
    assert_eq!(parsed.cli.files, vec!["prog.c"]);
    assert_eq!(parsed.skipped, vec!["-Z"]);
}

#[test]
fn unknown_long_option_is_skipped() {
    let parsed = parse_args(&argv(&["--frobnicate", "-q", "prog.c"])).unwrap();
    assert!(parsed.cli.quiet);
    assert_eq!(parsed.cli.files, vec!["prog.c"]);
    assert_eq!(parsed.skipped, vec!["--frobnicate"]);
}

#[test]
fn missing_value_is_skipped() {
    let parsed = parse_args(&argv(&["prog.c", "-I"])).unwrap();
    assert!(parsed.cli.include_paths.is_empty());
    assert_eq!(parsed.cli.files, vec!["prog.c"]);
    assert_eq!(parsed.skipped, vec!["-I"]);
}

#[test]
fn toolchain_flags_are_tolerated() {
    let parsed = parse_args(&argv(&["-O2", "-Wall", "-g", "-fPIC", "-m64", "prog.c"])).unwrap();
    assert_eq!(parsed.cli.files, vec!["prog.c"]);
    assert_eq!(parsed.cli.tolerated, vec!["2", "all", "PIC", "64"]);
    assert_eq!(parsed.cli.tolerated_switches, 1);
    assert!(parsed.skipped.is_empty());
}

#[test]
fn repeated_single_value_options_keep_the_last() {
    let parsed = parse_args(&argv(&["-e", "first", "-e", "second", "prog.c"])).unwrap();
    assert_eq!(parsed.cli.entry.as_deref(), Some("second"));
}

#[test]
fn help_is_reported_to_the_caller() {
    let err = parse_args(&argv(&["-h"])).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    let err = parse_args(&argv(&["--help"])).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

#[test]
fn help_lists_driver_options() {
    use clap::CommandFactory;
    let help = Cli::command().render_help().to_string();
    for flag in ["-q", "-v", "-D", "-C", "-I", "-l", "-L", "-e", "-p", "-c", "-o", "--temp", "--xtgz", "--live"] {
        assert!(help.contains(flag), "help should mention {flag}");
    }
    assert!(help.contains("files(*) -- app arguments"));
    assert!(!help.contains("-W"));
}

#[test]
fn unknown_option_does_not_take_a_neighbour_with_it() {
    let parsed = parse_args(&argv(&["-d", "-lpthread", "prog.c"])).unwrap();
    assert_eq!(parsed.cli.libraries, vec!["pthread"]);
    assert_eq!(parsed.skipped, vec!["-d"]);

    let parsed = parse_args(&argv(&["-X", "-DX", "prog.c"])).unwrap();
    assert_eq!(parsed.cli.defines, vec!["X"]);
    assert_eq!(parsed.skipped, vec!["-X"]);
    assert_eq!(parsed.cli.files, vec!["prog.c"]);
}

#[test]
fn unknown_letter_in_switch_cluster_drops_the_cluster() {
    let parsed = parse_args(&argv(&["-qd", "-lm", "prog.c"])).unwrap();
    assert_eq!(parsed.skipped, vec!["-qd"]);
    assert_eq!(parsed.cli.libraries, vec!["m"]);
}

#[test]
fn value_given_to_switch_is_skipped() {
    let parsed = parse_args(&argv(&["--live=1", "prog.c"])).unwrap();
    assert!(!parsed.cli.live);
    assert_eq!(parsed.cli.files, vec!["prog.c"]);
    assert_eq!(parsed.skipped, vec!["--live=1"]);

    let parsed = parse_args(&argv(&["--temp=x", "-q"])).unwrap();
    assert!(!parsed.cli.temp);
    assert!(parsed.cli.quiet);
}

#[cfg(unix)]
#[test]
fn non_utf8_arguments_survive_parsing() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let cafe = OsString::from_vec(b"caf\xe9".to_vec());
    let source = OsString::from_vec(b"r\xe9sum\xe9.c".to_vec());
    let args = vec![OsString::from("cjit"), source.clone(), OsString::from("--"), cafe.clone()];
    let parsed = parse_args(&args).unwrap();
    assert_eq!(parsed.cli.files, vec![source]);
    assert_eq!(parsed.partition.program, vec![cafe]);
}
