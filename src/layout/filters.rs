//! Template filters available to every layout

use std::collections::HashMap;
use tera::{Tera, Value};

use crate::config::SiteConfig;
use crate::content::{html_escape, parse_date_string};

/// Register the site filters on a Tera instance
pub fn register(tera: &mut Tera, config: &SiteConfig) {
    tera.register_filter("date_to_string", date_to_string_filter);
    tera.register_filter("date_to_long_string", date_to_long_string_filter);
    tera.register_filter("date_to_xmlschema", date_to_xmlschema_filter);
    tera.register_filter("slugify_path", slugify_path_filter);
    tera.register_filter("strip_html", strip_html_filter);
    tera.register_filter("xml_escape", xml_escape_filter);

    let baseurl = config.baseurl.clone();
    tera.register_filter(
        "relative_url",
        move |value: &Value, _args: &HashMap<String, Value>| {
            let path = tera::try_get_value!("relative_url", "value", String, value);
            Ok(Value::String(relative_url(&baseurl, &path)))
        },
    );

    let baseurl = config.baseurl.clone();
    let url = config.url.clone();
    tera.register_filter(
        "absolute_url",
        move |value: &Value, _args: &HashMap<String, Value>| {
            let path = tera::try_get_value!("absolute_url", "value", String, value);
            Ok(Value::String(format!(
                "{}{}",
                url.trim_end_matches('/'),
                relative_url(&baseurl, &path)
            )))
        },
    );
}

/// Join `baseurl` and a site-relative path with exactly one slash between
pub fn relative_url(baseurl: &str, path: &str) -> String {
    let base = baseurl.trim_end_matches('/');
    let base = if base.is_empty() || base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{}", base)
    };
    format!("{}/{}", base, path.trim_start_matches('/'))
}

fn format_date(name: &str, value: &Value, format: &str) -> tera::Result<Value> {
    let s = tera::try_get_value!(name, "value", String, value);
    match parse_date_string(&s) {
        Some(date) => Ok(Value::String(date.format(format).to_string())),
        None => Err(tera::Error::msg(format!(
            "Filter `{}` received `{}`, which is not a date",
            name, s
        ))),
    }
}

/// Tera filter: `08 Dec 2025`
fn date_to_string_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    format_date("date_to_string", value, "%d %b %Y")
}

/// Tera filter: `08 December 2025`
fn date_to_long_string_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    format_date("date_to_long_string", value, "%d %B %Y")
}

/// Tera filter: `2025-12-08T00:00:00+00:00`
fn date_to_xmlschema_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    format_date("date_to_xmlschema", value, "%Y-%m-%dT%H:%M:%S%:z")
}

/// Tera filter: slugify each `/`-separated segment, e.g. `Type Theory/Lean` -> `type-theory/lean`
fn slugify_path_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("slugify_path", "value", String, value);
    let path = s
        .split('/')
        .map(slug::slugify)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    Ok(Value::String(path))
}

/// Tera filter: strip HTML tags
fn strip_html_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    Ok(Value::String(result))
}

/// Tera filter: escape text for XML and HTML attributes
fn xml_escape_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("xml_escape", "value", String, value);
    Ok(Value::String(html_escape(&s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tera(config: &SiteConfig) -> Tera {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        register(&mut tera, config);
        tera
    }

    fn render(tera: &mut Tera, template: &str, value: Value) -> String {
        let mut context = tera::Context::new();
        context.insert("v", &value);
        tera.render_str(template, &context).unwrap()
    }

    #[test]
    fn test_date_filters() {
        let mut tera = tera(&SiteConfig::default());
        let date = json!("2025-12-08T00:00:00+00:00");
        assert_eq!(render(&mut tera, "{{ v | date_to_string }}", date.clone()), "08 Dec 2025");
        assert_eq!(
            render(&mut tera, "{{ v | date_to_long_string }}", date.clone()),
            "08 December 2025"
        );
        assert_eq!(
            render(&mut tera, "{{ v | date_to_xmlschema }}", date),
            "2025-12-08T00:00:00+00:00"
        );
    }

    #[test]
    fn test_date_filter_rejects_non_dates() {
        let mut tera = tera(&SiteConfig::default());
        let mut context = tera::Context::new();
        context.insert("v", "soon");
        assert!(tera.render_str("{{ v | date_to_string }}", &context).is_err());
    }

    #[test]
    fn test_strip_html_and_escape() {
        let mut tera = tera(&SiteConfig::default());
        assert_eq!(
            render(&mut tera, "{{ v | strip_html }}", json!("<p>Hello <b>world</b></p>")),
            "Hello world"
        );
        assert_eq!(
            render(&mut tera, "{{ v | xml_escape }}", json!("a < b & \"c\"")),
            "a &lt; b &amp; &quot;c&quot;"
        );
    }

    #[test]
    fn test_slugify_path() {
        let mut tera = tera(&SiteConfig::default());
        assert_eq!(
            render(&mut tera, "{{ v | slugify_path }}", json!("Type Theory/Lean 4/")),
            "type-theory/lean-4"
        );
    }

    #[test]
    fn test_url_filters() {
        let config = SiteConfig {
            url: "https://example.org/".to_string(),
            baseurl: "/blog/".to_string(),
            ..Default::default()
        };
        let mut tera = tera(&config);
        assert_eq!(
            render(&mut tera, "{{ v | relative_url }}", json!("/assets/main.css")),
            "/blog/assets/main.css"
        );
        assert_eq!(
            render(&mut tera, "{{ v | absolute_url }}", json!("about.html")),
            "https://example.org/blog/about.html"
        );
    }

    #[test]
    fn test_relative_url_without_baseurl() {
        assert_eq!(relative_url("", "/about.html"), "/about.html");
        assert_eq!(relative_url("blog", "x/"), "/blog/x/");
    }
}
