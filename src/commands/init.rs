//! Initialize a new site

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::CONFIG_FILE;

const CONFIG: &str = r#"# Site
title: My Site
description: ''
author: ''

# URL
url: http://example.com
baseurl: ''
permalink: date

# Build
destination: _site
exclude:
  - Gemfile
  - Gemfile.lock
  - node_modules
  - vendor

# Writing
excerpt_separator: "\n\n"
markdown:
  highlight_theme: base16-ocean.dark
  line_numbers: false
defaults:
  post_layout: post
  page_layout: page
"#;

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{% if page.title %}{{ page.title }} | {% endif %}{{ site.title }}</title>
  <meta name="description" content="{{ site.description | xml_escape }}">
</head>
<body>
  {% include "header.html" %}
  <main>
{{ content }}
  </main>
</body>
</html>
"#;

const POST_LAYOUT: &str = r#"---
layout: default
---
<article class="post">
  <h1>{{ page.title }}</h1>
  <time datetime="{{ page.date | date_to_xmlschema }}">{{ page.date | date_to_string }}</time>
{{ content }}
  <nav class="post-nav">
    {% if page.previous %}<a rel="prev" href="{{ page.previous.url | relative_url }}">{{ page.previous.title }}</a>{% endif %}
    {% if page.next %}<a rel="next" href="{{ page.next.url | relative_url }}">{{ page.next.title }}</a>{% endif %}
  </nav>
</article>
"#;

const PAGE_LAYOUT: &str = r#"---
layout: default
---
<article class="page">
  <h1>{{ page.title }}</h1>
{{ content }}
</article>
"#;

const HOME_LAYOUT: &str = r#"---
layout: default
---
{{ content }}
<ul class="post-list">
{% for post in site.posts %}
  <li>
    <span class="post-meta">{{ post.date | date_to_string }}</span>
    <a href="{{ post.url | relative_url }}">{{ post.title }}</a>
    {{ post.excerpt }}
  </li>
{% endfor %}
</ul>
"#;

const HEADER_INCLUDE: &str = r#"<header class="site-header">
  <a href="{{ "/" | relative_url }}">{{ site.title }}</a>
  {% for p in site.pages %}{% if p.url != "/" %}<a href="{{ p.url | relative_url }}">{{ p.title }}</a>{% endif %}{% endfor %}
</header>
"#;

const ABOUT_PAGE: &str = r#"---
layout: page
title: About
---
This site is built with quire.
"#;

const INDEX_PAGE: &str = r#"---
layout: home
title: Home
---
"#;

/// Scaffold a site in `target_dir`
pub fn init_site(target_dir: &Path) -> Result<()> {
    if target_dir.join(CONFIG_FILE).exists() {
        anyhow::bail!("{:?} already contains a site", target_dir);
    }

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
layout: post
title: Welcome
date: {}
categories: [news]
---
This is your first post. Edit or remove it, then rebuild.

Posts live in `_posts` and are named `YYYY-MM-DD-title.md`:

```sh
$ quire new "My New Post"
$ quire build --watch
```
"#,
        now.format("%Y-%m-%d %H:%M:%S %z")
    );

    let files = [
        (CONFIG_FILE.to_string(), CONFIG.to_string()),
        ("_layouts/default.html".to_string(), DEFAULT_LAYOUT.to_string()),
        ("_layouts/post.html".to_string(), POST_LAYOUT.to_string()),
        ("_layouts/page.html".to_string(), PAGE_LAYOUT.to_string()),
        ("_layouts/home.html".to_string(), HOME_LAYOUT.to_string()),
        ("_includes/header.html".to_string(), HEADER_INCLUDE.to_string()),
        ("about.md".to_string(), ABOUT_PAGE.to_string()),
        ("index.html".to_string(), INDEX_PAGE.to_string()),
        (
            format!("_posts/{}-welcome.md", now.format("%Y-%m-%d")),
            sample_post,
        ),
    ];

    for (relative, content) in files {
        let path = target_dir.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::debug!("Created: {:?}", path);
    }

    Ok(())
}
