//! Template rendering facade.

pub(crate) mod context;
pub(crate) mod engine;

use crate::error::RenderError;
use crate::parse::Template;
use crate::partial::{NoPartials, PartialResolver};
use crate::value::Value;
use context::Stack;
use engine::Renderer;
use std::io::{self, Write};

impl Template {
    /// Render against `view` into a `String`.
    pub fn render(&self, view: &Value) -> Result<String, RenderError> {
        self.render_with_partials(view, &NoPartials)
    }

    /// Render against `view`, resolving partial names through `partials`.
    pub fn render_with_partials(
        &self,
        view: &Value,
        partials: &dyn PartialResolver,
    ) -> Result<String, RenderError> {
        let mut buf = Vec::new();
        self.render_to_with_partials(&mut buf, view, partials)?;
        String::from_utf8(buf)
            .map_err(|e| RenderError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Render against `view`, writing to `sink` incrementally in token
    /// order.
    pub fn render_to(&self, sink: &mut impl Write, view: &Value) -> Result<(), RenderError> {
        self.render_to_with_partials(sink, view, &NoPartials)
    }

    /// Incremental rendering with partial resolution.
    pub fn render_to_with_partials(
        &self,
        sink: &mut impl Write,
        view: &Value,
        partials: &dyn PartialResolver,
    ) -> Result<(), RenderError> {
        let mut stack = Stack::new(view);
        Renderer::new(partials).render(&self.tokens, &mut stack, sink)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RenderError;
    use crate::parse::{parse, parse_with};
    use crate::value::Value;
    use std::collections::HashMap;

    fn render(template: &str, view: &Value) -> String {
        parse(template).unwrap().render(view).unwrap()
    }

    fn empty_view() -> Value {
        Value::map::<&str, Value, _>([])
    }

    // Round-trip: a template with no tags renders unchanged.
    #[test]
    fn tag_free_template_round_trips() {
        let src = "no tags here, just { braces } and text\n";
        assert_eq!(render(src, &empty_view()), src);
    }

    #[test]
    fn variable_substitution() {
        let view = Value::map([("name", "Chris")]);
        assert_eq!(render("Hello {{name}}!", &view), "Hello Chris!");
        assert_eq!(render("Hello {{ name }}!", &view), "Hello Chris!");
    }

    #[test]
    fn missing_variable_renders_empty() {
        assert_eq!(render("a{{missing}}b", &empty_view()), "ab");
    }

    #[test]
    fn escaped_and_unescaped_variables() {
        let view = Value::map([("x", "<b>")]);
        assert_eq!(render("{{x}}", &view), "&lt;b&gt;");
        assert_eq!(render("{{{x}}}", &view), "<b>");
        assert_eq!(render("{{&x}}", &view), "<b>");
    }

    #[test]
    fn numbers_render_canonically() {
        let view = Value::map([
            ("value", Value::from(10000)),
            ("taxed_value", Value::from(6000.0)),
        ]);
        assert_eq!(
            render("{{value}} ({{taxed_value}} after taxes)", &view),
            "10000 (6000.0 after taxes)"
        );
    }

    #[test]
    fn falsy_sections_skip_body() {
        for view in [
            Value::map([("b", false)]),
            Value::map([("b", "")]),
            empty_view(),
            Value::map([("b", Value::Null)]),
        ] {
            assert_eq!(render("{{#b}}Hi{{/b}}", &view), "");
        }
        assert_eq!(render("{{#b}}Hi{{/b}}", &Value::map([("b", true)])), "Hi");
    }

    #[test]
    fn inverted_section_is_the_exact_complement() {
        let tpl = "{{#v}}S{{/v}}|{{^v}}S{{/v}}";
        assert_eq!(render(tpl, &Value::map([("v", true)])), "S|");
        assert_eq!(render(tpl, &Value::map([("v", false)])), "|S");
        assert_eq!(render(tpl, &empty_view()), "|S");
        assert_eq!(render(tpl, &Value::map([("v", "text")])), "S|");
    }

    #[test]
    fn inverted_section_on_empty_list() {
        let tpl = "{{^v}}none{{/v}}";
        assert_eq!(render(tpl, &Value::map([("v", Value::list(Vec::<Value>::new()))])), "none");
        assert_eq!(render(tpl, &Value::map([("v", Value::list(["a"]))])), "");
    }

    #[test]
    fn truthy_scalar_section_pushes_value() {
        let view = Value::map([("person", Value::map([("name", "Ada")]))]);
        assert_eq!(render("{{#person}}{{name}}{{/person}}", &view), "Ada");
    }

    #[test]
    fn section_body_sees_outer_scope_through_the_stack() {
        // Inner layers fall through to outer bindings.
        let view = Value::map([
            ("greeting", Value::from("hi")),
            ("person", Value::map([("name", "Ada")])),
        ]);
        assert_eq!(
            render("{{#person}}{{greeting}} {{name}}{{/person}}", &view),
            "hi Ada"
        );
    }

    #[test]
    fn iteration_over_scalars() {
        let view = Value::map([("vec", Value::list(["A1", "B2", "C3"]))]);
        assert_eq!(render("{{#vec}}{{.}} {{/vec}}", &view), "A1 B2 C3 ");
    }

    #[test]
    fn iteration_over_rows() {
        let view = Value::map([(
            "data",
            Value::list([
                Value::map([("x", 1), ("y", 2)]),
                Value::map([("x", 2), ("y", 4)]),
            ]),
        )]);
        assert_eq!(
            render("{{#data}}x={{x}}, y={{y}} ... {{/data}}", &view),
            "x=1, y=2 ... x=2, y=4 ... "
        );
    }

    #[test]
    fn separator_idiom_with_end_index() {
        let view = Value::map([("vec", Value::list(["A1", "B2", "C3"]))]);
        assert_eq!(
            render("{{#vec}}{{.}}{{^.[end]}}, {{/.[end]}}{{/vec}}", &view),
            "A1, B2, C3"
        );
    }

    #[test]
    fn positional_index_is_one_based() {
        let view = Value::map([("vec", Value::list(["a", "b", "c"]))]);
        assert_eq!(
            render("{{#vec}}{{#.[1]}}first:{{/.[1]}}{{.}} {{/vec}}", &view),
            "first:a b c "
        );
        assert_eq!(
            render("{{#vec}}{{#.[end]}}last:{{/.[end]}}{{.}} {{/vec}}", &view),
            "a b last:c "
        );
    }

    #[test]
    fn index_outside_iteration_is_falsy() {
        assert_eq!(render("{{#.[1]}}x{{/.[1]}}|{{^.[1]}}y{{/.[1]}}", &empty_view()), "|y");
    }

    #[test]
    fn section_lambda_receives_raw_body() {
        let view = Value::map([("len", Value::lambda(|text| text.len().to_string()))]);
        assert_eq!(render("{{#len}}abcd{{/len}}", &view), "4");
    }

    // `#` hands the lambda the unrendered body, `|` the substituted text.
    #[test]
    fn raw_versus_eager_lambda() {
        let check = Value::lambda(|text| {
            if text == "{{x}}" { "yes" } else { "no" }.to_owned()
        });
        let view = Value::map([
            ("x", Value::from("Error!")),
            ("lambda", check),
        ]);
        assert_eq!(render("<{{#lambda}}{{x}}{{/lambda}}>", &view), "<yes>");
        assert_eq!(render("<{{|lambda}}{{x}}{{/lambda}}>", &view), "<no>");
    }

    #[test]
    fn eager_lambda_formats_rendered_value() {
        let view = Value::map([
            ("value", Value::from(1.23456789)),
            ("fmt", Value::try_lambda(|text| {
                let x: f64 = text.parse()?;
                Ok(format!("<b>{:.2}</b>", x))
            })),
        ]);
        assert_eq!(
            render("{{|fmt}}{{value}}{{/fmt}} dollars.", &view),
            "<b>1.23</b> dollars."
        );
    }

    #[test]
    fn two_argument_lambda_renders_against_current_stack() {
        let view = Value::map([
            ("name", Value::from("Tater")),
            ("bold", Value::lambda_render(|text, render| {
                Ok(format!("<b>{}</b>", render(text)?))
            })),
        ]);
        assert_eq!(
            render("{{#bold}}Hi {{name}}.{{/bold}}", &view),
            "<b>Hi Tater.</b>"
        );
    }

    #[test]
    fn nullary_lambda_is_invoked_on_variable_lookup() {
        let view = Value::map([("b", Value::thunk(|| Value::from("Bea")))]);
        assert_eq!(render("a {{b}} c", &view), "a Bea c");
    }

    #[test]
    fn failing_lambda_surfaces_as_render_error() {
        let view = Value::map([("f", Value::try_lambda(|_| Err("boom".into())))]);
        let err = parse("{{#f}}x{{/f}}").unwrap().render(&view).unwrap_err();
        assert!(matches!(err, RenderError::Lambda { name, .. } if name == "f"));
    }

    #[test]
    fn outermost_lookup_prefers_root_binding() {
        let view = Value::map([
            ("x", Value::from(1)),
            ("inner", Value::map([("x", 3)])),
        ]);
        assert_eq!(render("{{#inner}}{{x}}{{/inner}}", &view), "3");
        assert_eq!(render("{{#inner}}{{~x}}{{/inner}}", &view), "1");
    }

    #[test]
    fn keyword_bindings() {
        let mut map = crate::value::Map::new();
        map.insert_key("b", "bee");
        let view = Value::Map(map);
        assert_eq!(render("a {{:b}} c", &view), "a bee c");
    }

    #[test]
    fn check_section_is_an_existence_test() {
        let tpl = "[{{@v}}present{{/v}}]";
        assert_eq!(render(tpl, &Value::map([("v", "x")])), "[present]");
        // Iterables render the body once; no iteration happens.
        assert_eq!(
            render(tpl, &Value::map([("v", Value::list([1, 2, 3]))])),
            "[present]"
        );
        assert_eq!(render(tpl, &empty_view()), "[]");
        assert_eq!(render(tpl, &Value::map([("v", false)])), "[]");
    }

    #[test]
    fn comments_render_nothing() {
        assert_eq!(
            render("{{! ignore this comment }}This is rendered", &empty_view()),
            "This is rendered"
        );
    }

    #[test]
    fn custom_delimiters() {
        let view = Value::map([("name", "<i>")]);
        let tpl = parse_with("Hi <<name>> and <<{name}>>.", ("<<", ">>")).unwrap();
        assert_eq!(tpl.render(&view).unwrap(), "Hi &lt;i&gt; and <i>.");
    }

    #[test]
    fn delimiter_directive_mid_template() {
        let view = Value::map([("a", "1"), ("b", "2")]);
        assert_eq!(
            render("{{a}} {{=<% %>=}}<%b%> {{a}}", &view),
            "1 2 {{a}}"
        );
    }

    #[test]
    fn partial_resolved_as_variable() {
        let view = Value::map([
            ("partial", Value::from("*{{text}}*")),
            ("text", Value::from("content")),
        ]);
        assert_eq!(render("\"{{>partial}}\"", &view), "\"*content*\"");
    }

    #[test]
    fn raw_partial_is_spliced_verbatim() {
        let view = Value::map([
            ("partial", Value::from("*{{text}}*")),
            ("text", Value::from("content")),
        ]);
        assert_eq!(render("\"{{<partial}}\"", &view), "\"*{{text}}*\"");
    }

    #[test]
    fn partial_inherits_caller_scope() {
        let mut partials = HashMap::new();
        partials.insert("row".to_owned(), "<td>{{.}}</td>".to_owned());
        let view = Value::map([("cells", Value::list(["a", "b"]))]);
        let tpl = parse("{{#cells}}{{>row}}{{/cells}}").unwrap();
        assert_eq!(
            tpl.render_with_partials(&view, &partials).unwrap(),
            "<td>a</td><td>b</td>"
        );
    }

    #[test]
    fn missing_partial_is_an_error() {
        let err = parse("{{>nope}}").unwrap().render(&empty_view()).unwrap_err();
        assert!(matches!(err, RenderError::PartialNotFound(name) if name == "nope"));
    }

    #[test]
    fn cyclic_partial_fails_instead_of_recursing() {
        let view = Value::map([("a", "cycle: {{>a}}")]);
        let err = parse("{{>a}}").unwrap().render(&view).unwrap_err();
        assert!(matches!(err, RenderError::PartialCycle { name } if name == "a"));
    }

    #[test]
    fn rendering_is_repeatable_over_the_same_tokens() {
        let tpl = parse("{{#v}}{{.}}-{{/v}}{{x}}").unwrap();
        let view = Value::map([
            ("v", Value::list([1, 2])),
            ("x", Value::from("end")),
        ]);
        let first = tpl.render(&view).unwrap();
        let second = tpl.render(&view).unwrap();
        assert_eq!(first, "1-2-end");
        assert_eq!(first, second);
    }

    #[test]
    fn render_to_sink_matches_buffered_output() {
        let tpl = parse("{{#v}}{{.}} {{/v}}!").unwrap();
        let view = Value::map([("v", Value::list(["x", "y"]))]);

        let buffered = tpl.render(&view).unwrap();
        let mut sink = Vec::new();
        tpl.render_to(&mut sink, &view).unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), buffered);
        assert_eq!(buffered, "x y !");
    }

    #[test]
    fn concurrent_renders_share_one_template() {
        let tpl = std::sync::Arc::new(parse("{{#v}}{{.}}{{/v}}").unwrap());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tpl = std::sync::Arc::clone(&tpl);
                std::thread::spawn(move || {
                    let view = Value::map([("v", Value::list([i, i + 1]))]);
                    tpl.render(&view).unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let i = i as i64;
            assert_eq!(handle.join().unwrap(), format!("{}{}", i, i + 1));
        }
    }
}
