// 📰 Rendering - index.html, feed.xml, style.css
// Pure string builders plus one writer; only renderable days are emitted.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ChronicleConfig;
use crate::view::{thousands, DisplayDay};

const STYLESHEET: &str = include_str!("../web/style.css");

/// Site-level text shared by the page and the feed
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub title: String,
    pub description: String,
    pub url: String,
    pub repository_url: String,
}

impl SiteInfo {
    pub fn from_config(config: &ChronicleConfig) -> Self {
        SiteInfo {
            title: config.site_title.clone(),
            description: config.site_description(),
            url: config.site_url.clone(),
            repository_url: config.repository_url.clone(),
        }
    }

    fn day_link(&self, day: &DisplayDay) -> String {
        format!("{}#{}", self.url, day.date)
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// ============================================================================
// HTML
// ============================================================================

pub fn render_html(site: &SiteInfo, days: &[DisplayDay]) -> String {
    let title = escape_html(&site.title);
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="style.css">
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css">
    <link rel="alternate" type="application/rss+xml" title="{title} RSS Feed" href="feed.xml">
</head>
<body>
    <div class="header">
        <h1>{title}</h1>
        <p>{description}</p>
        <div class="links">
            <a href="feed.xml" title="RSS Feed" class="header-link">
                <i class="fas fa-rss"></i> RSS Feed
            </a>
            <a href="{repo}" target="_blank" title="GitHub Project" class="header-link">
                <i class="fab fa-github"></i> GitHub
            </a>
        </div>
"#,
        description = escape_html(&site.description),
        repo = escape_html(&site.repository_url),
    );

    if let Some(newest) = days.first() {
        let _ = writeln!(html, r#"        <div class="last-updated">Last updated: {}</div>"#, newest.date);
    }
    html.push_str("    </div>\n");

    for day in days.iter().filter(|d| d.is_renderable()) {
        render_html_day(&mut html, day);
    }

    if days.is_empty() {
        html.push_str(
            r#"
    <div class="no-cards">
        No data available yet.
    </div>
"#,
        );
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_html_day(html: &mut String, day: &DisplayDay) {
    let count = if day.first_run {
        format!("First Run - {} cards", thousands(day.total_cards))
    } else {
        format!("{} new cards", thousands(day.cards.len()))
    };

    let _ = write!(
        html,
        r#"
    <div class="day" id="{date}">
        <div class="day-header">
            <div class="date">{date}</div>
            <div class="count">{count}</div>
        </div>
"#,
        date = day.date,
    );

    if day.first_run {
        let _ = write!(
            html,
            r#"        <div class="first-run">
            Initial data collection - {} cards in database
        </div>
"#,
            thousands(day.total_cards)
        );
    } else {
        html.push_str("        <div class=\"cards\">\n");
        for card in &day.cards {
            let Some(image) = &card.image_url else { continue };
            let name = escape_html(&card.name);
            let _ = write!(
                html,
                r#"            <div class="card">
                <a href="{url}" target="_blank" title="{name}">
                    <img src="{image}" alt="{name}" loading="lazy">
                </a>
            </div>
"#,
                url = escape_html(&card.card_url),
                image = escape_html(image),
            );
        }
        html.push_str("        </div>\n");
    }

    html.push_str("    </div>\n");
}

// ============================================================================
// RSS
// ============================================================================

fn pub_date(day: &DisplayDay) -> String {
    day.date.and_time(NaiveTime::MIN).and_utc().to_rfc2822()
}

pub fn render_rss(site: &SiteInfo, days: &[DisplayDay], built_at: DateTime<Utc>) -> String {
    let mut xml = String::new();

    let _ = write!(
        xml,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
    <channel>
        <title>{title}</title>
        <link>{url}</link>
        <description>{description}</description>
        <language>en-us</language>
        <lastBuildDate>{built}</lastBuildDate>
"#,
        title = escape_html(&site.title),
        url = escape_html(&site.url),
        description = escape_html(&site.description),
        built = built_at.to_rfc2822(),
    );

    for day in days.iter().filter(|d| d.is_renderable()) {
        let title = if day.first_run {
            format!("Initial Collection - {} cards", thousands(day.total_cards))
        } else {
            format!("{} new cards on {}", thousands(day.cards.len()), day.date)
        };

        let body = if day.first_run {
            format!(
                "Initial data collection - {} cards in database",
                thousands(day.total_cards)
            )
        } else {
            day.cards
                .iter()
                .filter_map(|card| {
                    card.image_url.as_ref().map(|image| {
                        let name = escape_html(&card.name);
                        format!(
                            r#"<p><strong>{name}</strong><br/><img src="{image}" alt="{name}" style="max-width:200px;"/></p>"#,
                            image = escape_html(image),
                        )
                    })
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let link = escape_html(&site.day_link(day));
        let _ = write!(
            xml,
            r#"        <item>
            <title>{title}</title>
            <link>{link}</link>
            <guid>{link}</guid>
            <pubDate>{date}</pubDate>
            <description><![CDATA[
{body}
            ]]></description>
        </item>
"#,
            date = pub_date(day),
        );
    }

    xml.push_str("    </channel>\n</rss>\n");
    xml
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Write the site into `out_dir`; returns the written paths
pub fn write_site(
    out_dir: &Path,
    site: &SiteInfo,
    days: &[DisplayDay],
    built_at: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let outputs = [
        ("index.html", render_html(site, days)),
        ("feed.xml", render_rss(site, days, built_at)),
        ("style.css", STYLESHEET.to_string()),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, contents) in outputs {
        let path = out_dir.join(name);
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::DisplayCard;
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn create_test_site() -> SiteInfo {
        SiteInfo::from_config(&ChronicleConfig::default())
    }

    fn create_test_card(name: &str, image: Option<&str>) -> DisplayCard {
        DisplayCard {
            logical_id: format!("o-{}", name),
            printing_id: format!("p-{}", name),
            name: name.to_string(),
            image_url: image.map(str::to_string),
            card_url: format!("https://scryfall.com/card/p-{}", name),
            colors: vec![],
            cmc: 0.0,
        }
    }

    fn create_test_days() -> Vec<DisplayDay> {
        vec![
            DisplayDay {
                date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
                cards: vec![
                    create_test_card("Ajani & Friends", Some("ajani.jpg")),
                    create_test_card("No Image", None),
                ],
                total_cards: 27_001,
                first_run: false,
            },
            DisplayDay {
                date: NaiveDate::from_ymd_opt(2025, 2, 2).unwrap(),
                cards: vec![],
                total_cards: 27_000,
                first_run: false,
            },
            DisplayDay {
                date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                cards: vec![],
                total_cards: 27_000,
                first_run: true,
            },
        ]
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_html_lists_renderable_days() {
        let html = render_html(&create_test_site(), &create_test_days());

        assert!(html.contains("Last updated: 2025-02-03"));
        assert!(html.contains("2 new cards"));
        assert!(html.contains("First Run - 27,000 cards"));
        assert!(html.contains("Ajani &amp; Friends"));
        assert!(html.contains(r#"src="ajani.jpg""#));
        // Cards without images are not shown; empty days are skipped
        assert!(!html.contains("No Image"));
        assert!(!html.contains(r#"id="2025-02-02""#));
        assert!(!html.contains("No data available yet."));
    }

    #[test]
    fn test_html_empty_history() {
        let html = render_html(&create_test_site(), &[]);
        assert!(html.contains("No data available yet."));
        assert!(!html.contains("Last updated"));
    }

    #[test]
    fn test_rss_items() {
        let built = Utc.with_ymd_and_hms(2025, 2, 3, 12, 0, 0).unwrap();
        let xml = render_rss(&create_test_site(), &create_test_days(), built);

        assert!(xml.contains("<title>2 new cards on 2025-02-03</title>"));
        assert!(xml.contains("<title>Initial Collection - 27,000 cards</title>"));
        assert!(xml.contains("<guid>https://mikulas.github.io/brawl-chronicle/#2025-02-03</guid>"));
        assert!(xml.contains("<pubDate>Mon, 03 Feb 2025 00:00:00 +0000</pubDate>"));
        assert!(xml.contains("<lastBuildDate>Mon, 03 Feb 2025 12:00:00 +0000</lastBuildDate>"));
        assert_eq!(xml.matches("<item>").count(), 2);
    }

    #[test]
    fn test_write_site_outputs() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("docs");

        let written = write_site(&out, &create_test_site(), &create_test_days(), Utc::now()).unwrap();

        assert_eq!(written.len(), 3);
        for name in ["index.html", "feed.xml", "style.css"] {
            assert!(out.join(name).is_file(), "{} missing", name);
        }
    }
}
