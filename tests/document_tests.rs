use haml_jsp::{
    CompileError, Compiler, Config, ErrorKind, Format, Generator, HamlParser, JspGenerator, LineKind, Parser, compile,
};

fn render(source: &str) -> String {
    match compile(source, &Config::default()) {
        Ok(output) => output,
        Err(err) => panic!("compile failed:{}", err.render(source, "test.haml")),
    }
}

fn error(source: &str) -> CompileError {
    compile(source, &Config::default()).expect_err("expected a compile error")
}

#[test]
fn test_shorthand_and_hash_classes_and_ids() {
    assert_eq!(
        render("%div.a.b#x#y{:class => 'c', :id => 'z'}"),
        "<div class='c a b' id='y_z'></div>"
    );
}

#[test]
fn test_self_closing_rules() {
    assert_eq!(render("%br"), "<br />");
    assert_eq!(render("%br content"), "<br>content</br>");
    assert_eq!(render("%custom/"), "<custom />");
    assert_eq!(error("%custom/ content").kind, ErrorKind::SelfClosingWithContent);
}

#[test]
fn test_multiline_if_is_restructured() {
    assert_eq!(render("- if x > 1\n  foo()"), "<% if (x > 1) { %>\n  foo()\n<% } %>");
}

#[test]
fn test_nested_scriptlet_blocks() {
    let source = "- for (String s : names)\n  - if s != null\n    %li= s";
    let expected = "<% for (String s : names) { %>\n  <% if (s != null) { %>\n    <li><%= s %></li>\n  <% } %>\n<% } %>";
    assert_eq!(render(source), expected);
}

#[test]
fn test_blank_lines_produce_no_output() {
    assert_eq!(render("%p a\n\n\n%p b\n"), "<p>a</p>\n<p>b</p>");
    assert_eq!(render(""), "");
    assert_eq!(render("\n  \n"), "");
}

#[test]
fn test_windows_line_endings() {
    assert_eq!(render("%ul\r\n  %li a\r\n"), "<ul>\n  <li>a</li>\n</ul>");
}

#[test]
fn test_first_indent_sets_unit() {
    assert_eq!(render("%a\n   %b\n      %c"), "<a>\n  <b>\n    <c></c>\n  </b>\n</a>");
    assert_eq!(error("%a\n   %b\n  %c").kind, ErrorKind::InconsistentIndentation);
}

#[test]
fn test_mixed_indentation_characters() {
    assert_eq!(error("%a\n \t%b").kind, ErrorKind::InconsistentIndentation);
    assert_eq!(error("%a\n\t%b\n  %c").kind, ErrorKind::InconsistentIndentation);
}

#[test]
fn test_error_spans_point_at_the_line() {
    let err = error("%div\n  %p\n  %p{:a => 09}");
    assert_eq!(err.kind, ErrorKind::LiteralFormat);
    assert_eq!(err.span.start.line, 2);

    let rendered = err.render("%div\n  %p\n  %p{:a => 09}", "page.haml");
    assert!(rendered.contains("page.haml:3:"));
    assert!(rendered.contains(" 3 |   %p{:a => 09}"));
}

#[test]
fn test_filters() {
    let config = Config::new().with_filter("upcase", |text: &str| text.to_uppercase());
    let output = compile("%div\n  :upcase\n    hello\n      world\n  %p done", &config).unwrap();
    assert_eq!(output, "<div>\n  HELLO\n    WORLD\n  <p>done</p>\n</div>");

    let err = compile(":upcase\n  x", &Config::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndefinedFilter);
}

#[test]
fn test_filter_body_is_not_parsed() {
    let config = Config::new().with_filter("plain", |text: &str| text.to_string());
    let output = compile(":plain\n  %p{:broken =>\n  - not code", &config).unwrap();
    assert_eq!(output, "%p{:broken =>\n- not code");
}

#[test]
fn test_html5_booleans() {
    let config = Config::new().with_format(Format::Html5);
    let output = compile("%input{:type => 'checkbox', :checked => true}", &config).unwrap();
    assert_eq!(output, "<input type='checkbox' checked />");
}

#[test]
fn test_parser_and_generator_separately() {
    let document = HamlParser::new().parse("%p\n  hi").unwrap();
    assert_eq!(document.lines.len(), 1);
    assert!(matches!(document.lines[0].kind, LineKind::Element(_)));
    assert_eq!(&*document.source, "%p\n  hi");

    let config = Config::default();
    let output = JspGenerator::new(&config).generate(&document).unwrap();
    assert_eq!(output, "<p>\n  hi\n</p>");
}

#[test]
fn test_compiler_is_reusable() {
    let config = Config::default();
    let compiler = Compiler::new(&config);
    // a failure leaves no state behind for the next document
    assert!(compiler.compile("%a\n  %b\n   %c").is_err());
    assert_eq!(compiler.compile("%a\n    %b").unwrap(), "<a>\n  <b></b>\n</a>");
}

#[test]
fn test_multibyte_character_after_element_head() {
    let err = error("%pé");
    assert_eq!(err.kind, ErrorKind::IllegalTag);
    assert!(err.render("%pé", "page.haml").contains("page.haml:1:3"));

    assert_eq!(error("%p{:a => 1}→x").kind, ErrorKind::IllegalTag);
    assert_eq!(render("%p é"), "<p>é</p>");
}

#[test]
fn test_conditional_comment_keeps_text_as_written() {
    assert_eq!(render("/[if IE] hi"), "<!--[if IE]> hi<![endif]-->");
}
