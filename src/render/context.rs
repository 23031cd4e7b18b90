//! Template contexts.
//!
//! Every render receives `site`; content pages add `page`, listings add
//! `page`, `pages`, `paginator`, `section`, `taxonomy` and `term`.
//!
//! ```text
//! site
//! ├── title, author, description, url, language, copyright
//! ├── params      [params] from quire.toml
//! ├── menus       { main: [{identifier, name, url, weight}] }
//! ├── social      [{name, url}]
//! ├── taxonomies  [{name, singular, url, terms: [{name, slug, url, count}]}]
//! ├── sections    [{name, url, count}]
//! ├── pages       [page summary, ...]   listing order
//! └── archive     [{year, pages}]
//! ```

use super::listing::{Listing, archive_url, term_slug, term_url};
use crate::{
    config::SiteConfig,
    content::ContentItem,
    taxonomy::{Taxonomies, YearGroup},
    utils::{
        date::{format_date, to_iso},
        slug::{slugify, url_path},
        value::toml_to_json,
    },
};
use chrono::NaiveDateTime;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Shared, read-only part of every context.
pub struct ContextBuilder<'a> {
    config: &'a SiteConfig,
    site: Value,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(
        config: &'a SiteConfig,
        sorted: &[&ContentItem],
        taxonomies: &Taxonomies<'_>,
        archive: &[YearGroup<'_>],
    ) -> Self {
        let site = json!({
            "title": config.base.title,
            "author": config.base.author,
            "description": config.base.description,
            "url": config.base.url_root(),
            "language": config.base.language,
            "copyright": config.base.copyright,
            "params": params(config),
            "menus": config.menu,
            "social": config.social,
            "taxonomies": taxonomies_value(config, taxonomies),
            "sections": sections_value(config, sorted),
            "pages": sorted.iter().map(|item| summary(config, item)).collect::<Vec<_>>(),
            "archive": archive.iter().map(|group| json!({
                "year": group.year,
                "pages": group.items.iter().map(|item| summary(config, item)).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
            "archive_url": archive_url(config),
        });
        Self { config, site }
    }

    /// Context of a content page.
    pub fn page(
        &self,
        item: &ContentItem,
        newer: Option<&ContentItem>,
        older: Option<&ContentItem>,
    ) -> Value {
        let mut page = summary(self.config, item);
        if let Value::Object(map) = &mut page {
            map.insert("content".into(), Value::String(item.rendered.html.clone()));
            map.insert("raw".into(), Value::String(item.body.clone()));
            map.insert("toc".into(), json!(item.rendered.toc));
            map.insert("newer".into(), newer.map_or(Value::Null, link));
            map.insert("older".into(), older.map_or(Value::Null, link));
        }
        json!({ "site": self.site, "page": page })
    }

    /// Context of a generated listing page.
    pub fn listing(&self, listing: &Listing<'_>) -> Value {
        let config = self.config;
        let taxonomy = listing.taxonomy.as_deref().and_then(|plural| {
            self.site["taxonomies"]
                .as_array()?
                .iter()
                .find(|t| t["name"] == plural)
                .cloned()
        });
        let term = listing.term.as_ref().map(|term| {
            json!({
                "name": term.name,
                "slug": term.slug,
                "url": term.url,
                "permalink": permalink(config, &term.url),
                "count": listing.paginator.total_items,
            })
        });

        json!({
            "site": self.site,
            "page": {
                "kind": listing.kind,
                "title": listing.title,
                "url": listing.url,
                "permalink": permalink(config, &listing.url),
            },
            "pages": listing.pages.iter().map(|item| summary(config, item)).collect::<Vec<_>>(),
            "paginator": listing.paginator,
            "section": listing.section,
            "taxonomy": taxonomy,
            "term": term,
        })
    }
}

/// Everything about an item except its body.
pub fn summary(config: &SiteConfig, item: &ContentItem) -> Value {
    let front = &item.front;
    let taxonomies: Map<String, Value> = item
        .taxonomies
        .iter()
        .map(|(plural, terms)| {
            let terms = terms
                .iter()
                .map(|term| json!({ "name": term, "url": term_url(plural, term, config.build.slug.term) }))
                .collect();
            (plural.clone(), Value::Array(terms))
        })
        .collect();

    json!({
        "kind": "page",
        "title": front.title,
        "url": item.paths.url,
        "permalink": item.paths.permalink,
        "relative_path": item.paths.relative,
        "section": item.section,
        "slug": item.slug,
        "type": front.kind.as_deref().or(item.section.as_deref()).unwrap_or("page"),
        "layout": front.layout,
        "date": item.date.map(to_iso),
        "date_display": display_date(config, item.date),
        "lastmod": item.lastmod.map(to_iso),
        "lastmod_display": display_date(config, item.lastmod),
        "draft": front.draft,
        "summary": item.rendered.summary,
        "truncated": item.rendered.truncated,
        "description": front.description,
        "author": front.author.as_deref().unwrap_or(config.base.author.as_str()),
        "cover": front.cover.as_ref().map(|cover| json!({
            "image": cover.image,
            "alt": cover.alt,
            "caption": cover.caption,
        })),
        "word_count": item.rendered.word_count,
        "reading_time": item.rendered.reading_time,
        "taxonomies": taxonomies,
        "params": front.params,
    })
}

fn link(item: &ContentItem) -> Value {
    json!({ "title": item.front.title, "url": item.paths.url })
}

fn display_date(config: &SiteConfig, date: Option<NaiveDateTime>) -> Value {
    date.map_or(Value::Null, |date| {
        Value::String(format_date(date, &config.build.date_format))
    })
}

fn permalink(config: &SiteConfig, url: &str) -> String {
    format!("{}{url}", config.base.url_root())
}

fn params(config: &SiteConfig) -> Value {
    Value::Object(
        config
            .params
            .iter()
            .map(|(key, value)| (key.clone(), toml_to_json(value)))
            .collect(),
    )
}

fn taxonomies_value(config: &SiteConfig, taxonomies: &Taxonomies<'_>) -> Value {
    let mode = config.build.slug.term;
    taxonomies
        .iter()
        .map(|taxonomy| {
            let url = url_path(&[taxonomy.plural.as_str()]);
            let terms: Vec<_> = taxonomy
                .terms
                .iter()
                .map(|(term, items)| {
                    let url = term_url(&taxonomy.plural, term, mode);
                    json!({
                        "name": term,
                        "slug": term_slug(term, mode),
                        "permalink": permalink(config, &url),
                        "url": url,
                        "count": items.len(),
                    })
                })
                .collect();
            json!({
                "name": taxonomy.plural,
                "singular": taxonomy.singular,
                "permalink": permalink(config, &url),
                "url": url,
                "terms": terms,
            })
        })
        .collect()
}

fn sections_value(config: &SiteConfig, sorted: &[&ContentItem]) -> Value {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for section in sorted.iter().filter_map(|item| item.section.as_deref()) {
        *counts.entry(section).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(name, count)| {
            json!({
                "name": name,
                "url": url_path(&[slugify(name, config.build.slug.path)]),
                "count": count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        content::fixtures::item,
        render::listing::plan,
        taxonomy::{archive, build_taxonomies, chronological},
    };

    fn config() -> SiteConfig {
        SiteConfig::from_str(
            r#"
            [base]
            title = "Blog"
            url = "https://example.com/"
            [[menu.main]]
            name = "Tags"
            url = "/tags/"
            weight = 2
            [[menu.main]]
            name = "About"
            url = "/about/"
            weight = 1
            [params]
            since = 2019-01-01
        "#,
        )
        .unwrap()
    }

    #[test]
    fn test_site_context() {
        let config = config();
        let items = vec![
            item("posts/testing.md", Some("2023-03-01"), &["Testing"]),
            item("posts/devops.md", Some("2023-07-05"), &["DevOps", "Testing"]),
        ];
        let sorted = chronological(&items);
        let taxonomies = build_taxonomies(&items, &config);
        let builder = ContextBuilder::new(&config, &sorted, &taxonomies, &archive(&sorted));
        let site = &builder.site;

        assert_eq!(site["url"], "https://example.com");
        assert_eq!(site["params"]["since"], "2019-01-01");
        assert_eq!(site["menus"]["main"][0]["name"], "About");
        assert_eq!(site["menus"]["main"][1]["identifier"], "tags");
        assert_eq!(site["pages"][0]["slug"], "devops");
        assert_eq!(site["sections"][0], json!({"name": "posts", "url": "/posts/", "count": 2}));
        assert_eq!(site["archive"][0]["year"], 2023);

        let tags = &site["taxonomies"][1];
        assert_eq!(tags["name"], "tags");
        assert_eq!(tags["terms"][1]["name"], "Testing");
        assert_eq!(tags["terms"][1]["count"], 2);
        assert_eq!(tags["terms"][1]["url"], "/tags/testing/");
    }

    #[test]
    fn test_page_context() {
        let config = config();
        let mut items = vec![
            item("posts/testing.md", Some("2023-03-01"), &["Testing"]),
            item("posts/devops.md", Some("2023-07-05"), &[]),
        ];
        items[0].rendered.html = "<p>body</p>".into();
        let sorted = chronological(&items);
        let taxonomies = build_taxonomies(&items, &config);
        let builder = ContextBuilder::new(&config, &sorted, &taxonomies, &[]);

        let ctx = builder.page(&items[0], Some(&items[1]), None);
        let page = &ctx["page"];
        assert_eq!(page["content"], "<p>body</p>");
        assert_eq!(page["date"], "2023-03-01T00:00:00Z");
        assert_eq!(page["date_display"], "2023-03-01");
        assert_eq!(page["type"], "posts");
        assert_eq!(page["author"], config.base.author.as_str());
        assert_eq!(page["newer"]["url"], "/posts/devops/");
        assert_eq!(page["older"], Value::Null);
        assert_eq!(page["taxonomies"]["tags"][0]["url"], "/tags/testing/");
        assert_eq!(ctx["site"]["title"], "Blog");
    }

    #[test]
    fn test_listing_context() {
        let config = config();
        let items = vec![item("posts/devops.md", Some("2023-07-05"), &["DevOps"])];
        let sorted = chronological(&items);
        let taxonomies = build_taxonomies(&items, &config);
        let builder = ContextBuilder::new(&config, &sorted, &taxonomies, &[]);
        let listings = plan(&config, &sorted, &taxonomies);

        let term = listings.iter().find(|l| l.url == "/tags/devops/").unwrap();
        let ctx = builder.listing(term);
        assert_eq!(ctx["page"]["kind"], "term");
        assert_eq!(ctx["page"]["permalink"], "https://example.com/tags/devops/");
        assert_eq!(ctx["term"]["name"], "DevOps");
        assert_eq!(ctx["term"]["count"], 1);
        assert_eq!(ctx["taxonomy"]["singular"], "tag");
        assert_eq!(ctx["pages"][0]["title"], "devops");
        assert_eq!(ctx["paginator"]["current"], 1);
        assert_eq!(ctx["section"], Value::Null);
    }
}
