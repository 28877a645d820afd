// =============================================================================
// render.rs: ONE PAGE, FIVE SECTIONS
// =============================================================================
//
// Turns a RenderContext into HTML with an embedded Handlebars template. The
// template is compiled once at startup; a typo in it stops the process
// before it ever binds a port.
//
// Every interpolated string goes through Handlebars' HTML escaping. Upstream
// titles are third-party text and get treated as such.
// =============================================================================

use chrono::{SecondsFormat, Utc};
use handlebars::Handlebars;
use serde::Serialize;

use crate::models::{ModelListing, RenderContext, ResultSet, Source};

const PAGE_TEMPLATE_NAME: &str = "dashboard";
const MODEL_PAGE_BASE: &str = "https://huggingface.co/";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>AI Pulse</title>
  <style>
    body { background: #111827; color: #f3f4f6; font-family: system-ui, sans-serif; margin: 0; }
    header { background: #1f2937; padding: 1rem 1.5rem; }
    main { display: grid; gap: 1rem; padding: 1rem; grid-template-columns: repeat(auto-fill, minmax(20rem, 1fr)); }
    section { background: #1f2937; border-radius: 0.5rem; padding: 1rem; }
    h2 { font-size: 1.2rem; margin-top: 0; }
    ul { list-style: none; padding: 0; margin: 0; }
    li { margin: 0.5rem 0; }
    a { color: #818cf8; text-decoration: none; }
    a:hover { text-decoration: underline; }
    footer { color: #9ca3af; font-size: 0.8rem; padding: 0 1.5rem 1rem; }
  </style>
</head>
<body>
  <header><h1>AI Pulse</h1></header>
  <main>
{{#each sections}}
    <section id="{{key}}">
      <h2>{{heading}}</h2>
      <ul>
{{#each items}}
        <li>{{#if href}}<a href="{{href}}" target="_blank" rel="noopener noreferrer">{{label}}</a>{{else}}{{label}}{{/if}}</li>
{{/each}}
      </ul>
    </section>
{{/each}}
  </main>
  <footer>Generated {{generated_at}}</footer>
</body>
</html>
"#;

#[derive(Debug, Serialize)]
struct PageView {
    sections: Vec<SectionView>,
    generated_at: String,
}

#[derive(Debug, Serialize)]
struct SectionView {
    key: &'static str,
    heading: &'static str,
    items: Vec<LinkView>,
}

#[derive(Debug, Serialize, PartialEq)]
struct LinkView {
    label: String,
    href: Option<String>,
}

fn heading(source: Source) -> &'static str {
    match source {
        Source::News => "Top 5 AI News",
        Source::Repos => "Trending GitHub Repos",
        Source::Models => "Top Models",
        Source::Papers => "Latest Research Papers",
        Source::Videos => "Popular AI Videos",
    }
}

/// Compiled page template.
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_template_string(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { registry })
    }

    pub fn render(&self, ctx: &RenderContext) -> Result<String, handlebars::RenderError> {
        let view = PageView {
            sections: Source::ALL
                .iter()
                .map(|&source| SectionView {
                    key: source.key(),
                    heading: heading(source),
                    items: section_links(ctx, source),
                })
                .collect(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        self.registry.render(PAGE_TEMPLATE_NAME, &view)
    }
}

fn section_links(ctx: &RenderContext, source: Source) -> Vec<LinkView> {
    match source {
        Source::News => record_links(&ctx.news),
        Source::Repos => record_links(&ctx.repos),
        Source::Models => model_links(&ctx.models),
        Source::Papers => record_links(&ctx.papers),
        Source::Videos => record_links(&ctx.videos),
    }
}

/// A record with no title is labelled by its URL; with neither it is an
/// empty list item.
fn record_links(records: &ResultSet) -> Vec<LinkView> {
    records
        .iter()
        .map(|record| LinkView {
            label: record
                .title
                .clone()
                .or_else(|| record.url.clone())
                .unwrap_or_default(),
            href: record.url.clone(),
        })
        .collect()
}

/// The model listing arrives raw. An array of objects with a string `id` is
/// the expected shape; anything else renders as nothing.
fn model_links(listing: &ModelListing) -> Vec<LinkView> {
    let Some(models) = listing.as_array() else {
        return Vec::new();
    };

    models
        .iter()
        .filter_map(|model| model.get("id").and_then(|id| id.as_str()))
        .map(|id| LinkView {
            label: id.to_string(),
            href: Some(format!("{}{}", MODEL_PAGE_BASE, id)),
        })
        .collect()
}
