//! Dashboard module - full page composition
//!
//! Separated into HTML and CSS submodules for maintainability.
//!
//! # Architecture
//! - `html.rs`: Page structure and mount points
//! - `css.rs`: Styling with CSS custom properties
//!
//! The page is static markup: every dynamic region is a mount whose content comes
//! from the [`HtmlDocument`]. A meta refresh keeps a browser view of the output file current.

mod css;
mod html;

use crate::render::HtmlDocument;

const RELOAD_SECS: u32 = 2;

/// Generate the complete dashboard HTML page from the current mount contents
pub fn dashboard_html(doc: &HtmlDocument) -> String {
    let mut body = html::TEMPLATE.to_string();
    for (id, content) in doc.mounts() {
        body = body.replace(&format!("<!--mount:{id}-->"), content);
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta http-equiv="refresh" content="{RELOAD_SECS}">
    <title>Trading Bot Dashboard</title>
    <style>
{css}
    </style>
</head>
<body>
{body}
</body>
</html>"#,
        css = css::STYLES,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Document, mount};

    #[test]
    fn test_every_mount_has_a_slot() {
        for id in mount::ALL {
            assert!(
                html::TEMPLATE.contains(&format!("<!--mount:{id}-->")),
                "template lacks mount {id}"
            );
        }
    }

    #[test]
    fn test_page_contains_mount_content() {
        let mut doc = HtmlDocument::new();
        doc.replace_html(mount::BOT_STATUS, "<b>Active</b>".to_string()).unwrap();
        let page = dashboard_html(&doc);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(r#"<span id="bot_status"><b>Active</b></span>"#));
        assert!(!page.contains("<!--mount:"));
    }
}
