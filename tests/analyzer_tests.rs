use anyhow::Result;
use goheader::analyzer::Analyzer;
use goheader::diagnostic::{Diagnostic, FindingKind};
use goheader::git::FsModYear;
use goheader::settings::Settings;
use goheader::source::Target;
use goheader::templates::CommentStyle;
use goheader::value::{Value, ValueSet};

const TEMPLATE: &str = "A {{YEAR}}\nB";

fn analyzer_with(template: &str, configure: impl FnOnce(&mut Settings)) -> Analyzer {
  let mut settings = Settings {
    values: ValueSet::builtin(2020),
    ..Settings::new(template)
  };
  configure(&mut settings);
  Analyzer::new(settings, Box::new(FsModYear)).expect("valid settings")
}

fn analyzer(template: &str) -> Analyzer {
  analyzer_with(template, |_| {})
}

fn check(analyzer: &Analyzer, content: &str) -> Option<Diagnostic> {
  let target = Target::parse("a.go", content).expect("parse");
  analyzer.check(&target).expect("check")
}

/// Applies the suggested fix of `diagnostic` to `content`.
fn apply_fix(diagnostic: &Diagnostic, content: &str) -> String {
  diagnostic.fix.as_ref().expect("fix").edit.apply(content)
}

#[test]
fn test_matching_header_has_no_diagnostic() {
  let analyzer = analyzer(TEMPLATE);
  assert!(check(&analyzer, "// A 2020\n// B\npackage a\n").is_none());
  assert!(check(&analyzer, "/* A 2020\nB */\npackage a\n").is_none());
  assert!(check(&analyzer, "/*\n * A 2020\n * B\n */\n\npackage a\n").is_none());
}

#[test]
fn test_mismatch_reports_year_difference() {
  let analyzer = analyzer(TEMPLATE);
  let content = "// A 2021\n// B\npackage a\n";
  let diagnostic = check(&analyzer, content).expect("mismatch");

  assert_eq!(diagnostic.kind, FindingKind::TemplateMismatch);
  assert_eq!(diagnostic.message, "template doesn't match");
  assert_eq!((diagnostic.start.line, diagnostic.start.column), (1, 9));
  assert_eq!((diagnostic.end.line, diagnostic.end.column), (2, 5));

  let fix = diagnostic.fix.as_ref().expect("fix");
  assert_eq!(fix.actual, vec!["A 2021", "B"]);
  assert_eq!(fix.expected, vec!["A 2020", "B"]);
  assert_eq!(fix.edit.start, 0);
  assert_eq!(fix.edit.end, 15);
  assert_eq!(fix.edit.new_text, "// A 2020\n// B\n\n");

  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(fixed, "// A 2020\n// B\n\npackage a\n");
  assert!(check(&analyzer, &fixed).is_none());
}

#[test]
fn test_missing_header_gets_insertion() {
  let analyzer = analyzer(TEMPLATE);
  let content = "package a\n";
  let diagnostic = check(&analyzer, content).expect("missing");

  assert_eq!(diagnostic.kind, FindingKind::MissingHeader);
  assert_eq!(diagnostic.message, "missed copyright header");
  assert_eq!((diagnostic.start.line, diagnostic.start.column), (1, 1));

  let fix = diagnostic.fix.as_ref().expect("fix");
  assert!(fix.actual.is_empty());
  assert_eq!((fix.edit.start, fix.edit.end), (0, 0));

  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(fixed, "// A 2020\n// B\n\npackage a\n");
  assert!(check(&analyzer, &fixed).is_none());
}

#[test]
fn test_empty_comment_counts_as_missing() {
  let analyzer = analyzer(TEMPLATE);
  let diagnostic = check(&analyzer, "//\npackage a\n").expect("missing");
  assert_eq!(diagnostic.kind, FindingKind::MissingHeader);
}

#[test]
fn test_header_after_build_directives() {
  let analyzer = analyzer(TEMPLATE);
  let content = "//go:build linux\n// +build linux\n\n// A 2021\n// B\n\npackage a\n";
  let diagnostic = check(&analyzer, content).expect("mismatch");

  assert_eq!(diagnostic.kind, FindingKind::TemplateMismatch);
  assert_eq!((diagnostic.start.line, diagnostic.start.column), (4, 9));
  assert_eq!(diagnostic.start.offset, 42);

  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(
    fixed,
    "//go:build linux\n// +build linux\n\n// A 2020\n// B\n\npackage a\n"
  );
  assert!(check(&analyzer, &fixed).is_none());
}

#[test]
fn test_directives_are_not_the_header() {
  let analyzer = analyzer(TEMPLATE);
  let content = "//go:build linux\n\npackage a\n";
  let diagnostic = check(&analyzer, content).expect("missing");
  assert_eq!(diagnostic.kind, FindingKind::MissingHeader);

  let fixed = apply_fix(&diagnostic, content);
  assert!(fixed.contains("//go:build linux\n"));
  assert!(check(&analyzer, &fixed).is_none());
}

#[test]
fn test_cgo_preamble_is_skipped_when_enabled() {
  let with_cgo = analyzer_with(TEMPLATE, |settings| settings.cgo = true);
  let preamble_first = "/*\n#cgo LDFLAGS: -lm\n#include <math.h>\n*/\n// A 2020\n// B\n\npackage a\n";
  assert!(check(&with_cgo, preamble_first).is_none());
  let without_cgo = analyzer(TEMPLATE);
  assert!(check(&without_cgo, preamble_first).is_some());
}

#[test]
fn test_generator_banner_is_preserved() {
  let analyzer = analyzer(TEMPLATE);
  let content = "// Code generated by stringer. DO NOT EDIT.\n\npackage a\n";
  let diagnostic = check(&analyzer, content).expect("missing");
  assert_eq!(diagnostic.kind, FindingKind::MissingHeader);
  assert_eq!(diagnostic.start.line, 2);

  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(
    fixed,
    "// Code generated by stringer. DO NOT EDIT.\n\n// A 2020\n// B\n\npackage a\n"
  );
  assert!(check(&analyzer, &fixed).is_none());
}

#[test]
fn test_fix_keeps_line_comment_style() {
  let analyzer = analyzer_with(TEMPLATE, |settings| {
    settings.comment_style = CommentStyle::BlockStarAligned;
  });
  let diagnostic = check(&analyzer, "// A 1999\n// B\n\npackage a\n").expect("mismatch");
  let new_text = &diagnostic.fix.as_ref().expect("fix").edit.new_text;

  assert!(!new_text.contains("/*"));
  assert!(new_text.lines().all(|line| line.starts_with("//")));
}

#[test]
fn test_fix_keeps_star_block_style() {
  let analyzer = analyzer(TEMPLATE);
  let content = "/*\n * A 2021\n * B\n */\npackage a\n";
  let diagnostic = check(&analyzer, content).expect("mismatch");

  assert_eq!(
    diagnostic.fix.as_ref().expect("fix").edit.new_text,
    "/*\n * A 2020\n * B\n */\n\n"
  );
  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(fixed, "/*\n * A 2020\n * B\n */\n\npackage a\n");
  assert!(check(&analyzer, &fixed).is_none());
}

#[test]
fn test_fix_keeps_plain_block_style() {
  let analyzer = analyzer(TEMPLATE);
  let content = "/*\nA 2021\nB\n*/\n\npackage a\n";
  let diagnostic = check(&analyzer, content).expect("mismatch");

  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(fixed, "/*\nA 2020\nB\n*/\n\npackage a\n");
  assert!(check(&analyzer, &fixed).is_none());
}

#[test]
fn test_fixes_round_trip() {
  let templates = [
    "Copyright {{ YEAR }} Acme Inc.",
    "Copyright (c) {{YEAR_RANGE}} The Authors.\n\nLicensed under the MIT license. [see LICENSE]",
    "{{ PROJECT }} - (C) {{ YEAR }}\nAll rights reserved.",
  ];
  let files = [
    "package a\n",
    "// Old header\n\npackage a\n",
    "/*\n * Old header\n * spanning lines\n */\npackage a\n",
    "//go:build ignore\n\n// stale\npackage a\n",
  ];

  for template in templates {
    let analyzer = analyzer_with(template, |settings| {
      settings.values.insert(Value::constant("PROJECT", "Gizmo"));
    });
    for content in files {
      let diagnostic = check(&analyzer, content).expect("finding");
      let fixed = apply_fix(&diagnostic, content);
      assert!(
        check(&analyzer, &fixed).is_none(),
        "fix for {template:?} on {content:?} did not round-trip:\n{fixed}"
      );
    }
  }
}

#[test]
fn test_fix_keeps_lines_that_look_like_pragmas() {
  let analyzer = analyzer("Copyright {{YEAR}} Acme\nexternal contributions welcome\nexported symbols are stable");
  let content = "package a\n";
  let diagnostic = check(&analyzer, content).expect("missing");

  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(
    fixed,
    "// Copyright 2020 Acme\n// external contributions welcome\n// exported symbols are stable\n\npackage a\n"
  );
  assert!(check(&analyzer, &fixed).is_none(), "fixed file still reported:\n{fixed}");
}

#[test]
fn test_template_trailing_whitespace_round_trips() {
  let analyzer = analyzer("Copyright {{YEAR}} Acme \nAll rights reserved\t");
  let content = "package a\n";
  let diagnostic = check(&analyzer, content).expect("missing");

  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(fixed, "// Copyright 2020 Acme\n// All rights reserved\n\npackage a\n");
  assert!(check(&analyzer, &fixed).is_none(), "fixed file still reported:\n{fixed}");
  assert!(check(&analyzer, "// Copyright 2020 Acme   \n// All rights reserved\npackage a\n").is_none());
}

#[test]
fn test_block_insertion_keeps_build_constraint_first() {
  let content = "//go:build linux\n\npackage a\n";

  let block = analyzer_with(TEMPLATE, |settings| settings.comment_style = CommentStyle::Block);
  let diagnostic = check(&block, content).expect("missing");
  assert_eq!(diagnostic.start.line, 2);
  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(fixed, "//go:build linux\n\n/*\nA 2020\nB\n*/\n\npackage a\n");
  assert!(check(&block, &fixed).is_none(), "fixed file still reported:\n{fixed}");

  let line = analyzer(TEMPLATE);
  let fixed = apply_fix(&check(&line, content).expect("missing"), content);
  assert_eq!(fixed, "// A 2020\n// B\n\n//go:build linux\n\npackage a\n");
  assert!(check(&line, &fixed).is_none());
}

#[test]
fn test_regexp_value_without_example_reports_without_fix() {
  let analyzer = analyzer_with("Copyright {{YEAR}} {{AUTHOR}}", |settings| {
    settings.values.insert(Value::regexp("AUTHOR", "[A-Z][a-z]+ (Inc|Ltd)"));
  });

  assert!(check(&analyzer, "// Copyright 2020 Acme Inc\npackage a\n").is_none());

  let diagnostic = check(&analyzer, "// Copyright 2020 acme\npackage a\n").expect("mismatch");
  assert_eq!(diagnostic.kind, FindingKind::TemplateMismatch);
  assert!(diagnostic.fix.is_none());
  let reason = diagnostic.fix_error.expect("reason");
  assert!(reason.to_lowercase().contains("author"), "{reason}");
}

#[test]
fn test_regexp_value_with_example_offers_fix() {
  let analyzer = analyzer_with("Copyright {{YEAR}} {{AUTHOR}}", |settings| {
    settings
      .values
      .insert(Value::regexp_with_example("AUTHOR", "[A-Z][a-z]+ (Inc|Ltd)", "Acme Inc"));
  });

  let content = "// Copyright 2020 acme\npackage a\n";
  let diagnostic = check(&analyzer, content).expect("mismatch");
  let fixed = apply_fix(&diagnostic, content);
  assert_eq!(fixed, "// Copyright 2020 Acme Inc\n\npackage a\n");
}

#[test]
fn test_invalid_configuration_is_rejected_up_front() -> Result<()> {
  let mut cyclic = Settings {
    values: ValueSet::builtin(2020),
    ..Settings::new("{{first}}")
  };
  cyclic.values.insert(Value::constant("first", "{{second}}"));
  cyclic.values.insert(Value::constant("second", "{{first}}"));
  let err = Analyzer::new(cyclic, Box::new(FsModYear)).expect_err("cycle");
  let message = err.to_string();
  assert!(message.contains("first") && message.contains("second"), "{message}");

  assert!(Analyzer::new(Settings::new("Copyright {{ YEAR"), Box::new(FsModYear)).is_err());
  assert!(Analyzer::new(Settings::new("Copyright {{ OWNER }}"), Box::new(FsModYear)).is_err());

  let mut broken = Settings::new("{{ broken }}");
  broken.values.insert(Value::regexp("broken", "(unclosed"));
  assert!(Analyzer::new(broken, Box::new(FsModYear)).is_err());
  Ok(())
}

#[test]
fn test_no_template_disables_checks() {
  let analyzer = Analyzer::new(Settings::default(), Box::new(FsModYear)).expect("valid");
  assert!(!analyzer.is_enabled());
  assert!(check(&analyzer, "package a\n").is_none());
}
