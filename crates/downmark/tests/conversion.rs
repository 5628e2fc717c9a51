//! Whole-document conversions

use downmark::{convert_text, parse_html, ConversionOptions, Converter, HeadingStyle};

fn convert(html: &str) -> String {
    convert_text(html, &ConversionOptions::default()).unwrap()
}

#[test]
fn test_article() {
    let html = r#"<!DOCTYPE html>
<html>
  <head><title>Ignored</title><style>body { color: red }</style></head>
  <body>
    <h1>Release notes</h1>
    <p>This release adds <em>tolerant</em> parsing and <a href="/docs">new docs</a>.</p>
    <h2>Changes</h2>
    <ul>
      <li>Faster <code>tokenize()</code></li>
      <li>Fixed a crash on <b>empty</b> input</li>
    </ul>
    <blockquote><p>Upgrade at your own pace.</p></blockquote>
  </body>
</html>"#;

    insta::assert_snapshot!(convert(html), @r"
    # Release notes

    This release adds *tolerant* parsing and [new docs](/docs).

    ## Changes

    - Faster `tokenize()`
    - Fixed a crash on **empty** input

    > Upgrade at your own pace.
    ");
}

#[test]
fn test_nested_lists() {
    let html = "<ul>
        <li>Fruit
          <ol><li>Apple</li><li>Pear</li></ol>
        </li>
        <li>Vegetables
          <ol start=\"3\"><li>Leek</li></ol>
        </li>
      </ul>";

    insta::assert_snapshot!(convert(html), @r"
    - Fruit
      1. Apple
      2. Pear
    - Vegetables
      3. Leek
    ");
}

#[test]
fn test_code_and_table() {
    let html = r#"<pre><code class="language-python">def f(x):
    return x * 2
</code></pre>
<table>
  <thead><tr><th>Name</th><th style="text-align: center">Count</th></tr></thead>
  <tbody>
    <tr><td>alpha</td><td>1</td></tr>
    <tr><td>beta</td><td>22</td></tr>
  </tbody>
</table>"#;

    insta::assert_snapshot!(convert(html), @r"
    ```python
    def f(x):
        return x * 2
    ```

    | Name  | Count |
    | ----- | :---: |
    | alpha | 1     |
    | beta  | 22    |
    ");
}

#[test]
fn test_compact_document() {
    let html = "<h1>T</h1><p>one</p><p>two</p><ul><li>x</li></ul>";
    let markdown = convert_text(html, &ConversionOptions::compact()).unwrap();
    assert_eq!(markdown, "# T\none\ntwo\n- x\n");
    assert_eq!(convert(html), "# T\n\none\n\ntwo\n\n- x\n");
}

#[test]
fn test_compact_only_changes_separators() {
    let html = "<p>a <b>b</b></p><blockquote>q</blockquote><pre>x\n\ny</pre>";
    let loose = convert(html);
    let compact = convert_text(html, &ConversionOptions::compact()).unwrap();
    assert_eq!(loose, "a **b**\n\n> q\n\n```\nx\n\ny\n```\n");
    assert_eq!(compact, "a **b**\n> q\n```\nx\n\ny\n```\n");
}

#[test]
fn test_tolerant_input_never_fails() {
    let inputs = [
        "<p>unclosed",
        "</div></span>stray",
        "<div><p>a</div>b</p>",
        "<a href=\"x",
        "<!-- unterminated",
        "<<<>>>&&&;;;",
        "&bogus; &#xZZ; &#99999999;",
        "<ul><li><ul><li><ul><li>deep",
        "<table><td>no row",
        "<script>never closed",
    ];
    let converter = Converter::new();
    for html in inputs {
        assert!(converter.convert_text(html).is_ok(), "failed on {html:?}");
    }
}

#[test]
fn test_tolerant_output() {
    assert_eq!(convert("<p>unclosed"), "unclosed\n");
    assert_eq!(convert("</div></span>stray"), "stray\n");
    assert_eq!(convert("<div><p>a</div>b</p>"), "a\n\nb\n");
    assert_eq!(convert("a &bogus; b"), "a &bogus; b\n");
    assert_eq!(convert("<ul><li>one<li>two"), "- one\n- two\n");
}

#[test]
fn test_entities() {
    assert_eq!(convert("<p>&lt;tag&gt; &amp; &#38; &#x26; &copy;</p>"), "\\<tag> & & & ©\n");
}

#[test]
fn test_whitespace_between_inline_elements() {
    assert_eq!(
        convert("<p>\n  <b>bold</b>\n  <i>italic</i>\n</p>"),
        "**bold** *italic*\n"
    );
}

#[test]
fn test_deep_nesting_is_bounded() {
    let html = "<div>".repeat(5000) + "bottom" + &"</div>".repeat(5000);
    assert_eq!(convert(&html), "bottom\n");
}

#[test]
fn test_setext_and_custom_markers() {
    let options = ConversionOptions {
        heading_style: HeadingStyle::Setext,
        bullet_list_marker: '*',
        hr: "---".to_string(),
        ..Default::default()
    };
    let markdown = convert_text("<h1>Top</h1><ul><li>a</li></ul><hr>", &options).unwrap();
    assert_eq!(markdown, "Top\n===\n\n* a\n\n---\n");
}

#[test]
fn test_parse_then_convert_tree() {
    let root = parse_html("<h2>From a tree</h2>").unwrap();
    assert_eq!(root.children()[0].tag_name(), Some("h2"));
    assert_eq!(Converter::new().convert_tree(&root), "## From a tree\n");
}

#[test]
fn test_conversions_are_independent() {
    let converter = Converter::new();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let converter = &converter;
                scope.spawn(move || {
                    converter
                        .convert_text(&format!("<ol><li>item {i}</li></ol>"))
                        .unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!("1. item {i}\n"));
        }
    });
}
