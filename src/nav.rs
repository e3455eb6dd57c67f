//! Shared navigation fragment: fetched once over HTTP, relative targets
//! rewritten to absolute URLs, presented with a one-shot entrance animation.
//!
//! A failed fetch is local: it is logged and the overlay stays empty, nothing
//! else on screen is affected.

use std::time::Instant;

use reqwest::{StatusCode, Url};

/// Location of the fragment under the site's asset root.
const PRESET_DIR: &str = "assets/preset/";
const NAV_FILE: &str = "nav.html";

/// Entrance transition length, seconds.
const ENTRANCE_SECS: f32 = 0.6;

/// The overlay starts this many pixels above its resting place.
const ENTRANCE_RISE: f32 = 20.0;

/// Frames the overlay stays hidden before the transition is armed, so the
/// initial hidden state is committed to screen first.
const WARMUP_FRAMES: u8 = 2;

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("navigation fragment not found at {0} ({1})")]
    Status(Url, StatusCode),
    #[error("bad navigation url: {0}")]
    BadUrl(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

/// The rewritten fragment: hyperlinks resolved against the site root,
/// stylesheets against the fragment's own directory.
#[derive(Clone, Debug, Default)]
pub struct NavFragment {
    pub links: Vec<NavLink>,
    pub stylesheets: Vec<String>,
}

pub async fn fetch(site_root: Url) -> Result<NavFragment, NavError> {
    let preset = join(&site_root, PRESET_DIR)?;
    let nav_url = join(&preset, NAV_FILE)?;

    let response = reqwest::get(nav_url.clone()).await?;
    if !response.status().is_success() {
        return Err(NavError::Status(nav_url, response.status()));
    }

    let html = response.text().await?;
    rewrite(&html, &site_root, &preset)
}

fn join(base: &Url, path: &str) -> Result<Url, NavError> {
    base.join(path)
        .map_err(|err| NavError::BadUrl(format!("{path}: {err}")))
}

/// Resolves the fragment's relative targets so it works regardless of which
/// page depth includes it: anchors against the site root, stylesheet links
/// against the preset directory the fragment lives in.
fn rewrite(html: &str, site_root: &Url, preset: &Url) -> Result<NavFragment, NavError> {
    let mut fragment = NavFragment::default();

    for (tag, body) in tags(html, "a") {
        let Some(href) = attribute(tag, "href") else {
            continue;
        };

        let href = if href.starts_with("http") || href.starts_with('#') {
            href.to_owned()
        } else {
            join(site_root, href)?.to_string()
        };

        fragment.links.push(NavLink {
            label: text_content(body),
            href,
        });
    }

    for (tag, _) in tags(html, "link") {
        if attribute(tag, "rel") != Some("stylesheet") {
            continue;
        }
        let Some(href) = attribute(tag, "href") else {
            continue;
        };

        let href = if href.starts_with("http") {
            href.to_owned()
        } else {
            join(preset, href)?.to_string()
        };
        fragment.stylesheets.push(href);
    }

    Ok(fragment)
}

/// Yields `(tag_contents, inner_html)` for each occurrence of `<name ...>`.
/// `inner_html` runs to the matching close tag, or is empty for void tags.
fn tags<'a>(html: &'a str, name: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
    let open = format!("<{name}");
    let close = format!("</{name}>");

    let mut rest = html;
    std::iter::from_fn(move || loop {
        let start = rest.find(&open)?;
        let after = &rest[start + open.len()..];

        // Reject prefix matches like `<li>` for `<l`.
        if !after.starts_with([' ', '\t', '\n', '>']) {
            rest = after;
            continue;
        }

        let tag_end = after.find('>')?;
        let tag = after[..tag_end].trim();
        let body_start = &after[tag_end + 1..];

        let (body, next) = match body_start.find(&close) {
            Some(end) => (&body_start[..end], &body_start[end + close.len()..]),
            None => ("", body_start),
        };

        rest = next;
        return Some((tag, body));
    })
}

/// Pulls `name="value"` (or single-quoted) out of a tag's attribute list.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = tag;
    loop {
        let at = rest.find(name)?;

        // The name must start its own token; a hit inside a longer attribute
        // like `data-href` does not count.
        let own_token = at == 0 || rest[..at].ends_with(char::is_whitespace);
        let tail = &rest[at + name.len()..];
        rest = tail;
        if !own_token {
            continue;
        }

        let Some(after) = tail.trim_start().strip_prefix('=') else {
            continue;
        };

        let after = after.trim_start();
        let quote = after.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }

        let value = &after[1..];
        return value.find(quote).map(|end| &value[..end]);
    }
}

/// Inner text with any nested markup stripped.
fn text_content(body: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for c in body.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Where the overlay sits during its entrance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntrancePose {
    pub opacity: f32,
    pub offset_y: f32,
}

impl EntrancePose {
    const HIDDEN: Self = Self {
        opacity: 0.0,
        offset_y: -ENTRANCE_RISE,
    };
}

/// One-shot entrance: hidden for two frames so the start state lands on
/// screen, then a timed slide-down/fade-in. Never replays.
pub struct Entrance {
    warmup: u8,
    started: Option<Instant>,
}

impl Default for Entrance {
    fn default() -> Self {
        Self::new()
    }
}

impl Entrance {
    pub fn new() -> Self {
        Self {
            warmup: WARMUP_FRAMES,
            started: None,
        }
    }

    /// Call once per frame while the overlay is shown.
    pub fn tick(&mut self) -> EntrancePose {
        if self.warmup > 0 {
            self.warmup -= 1;
            if self.warmup == 0 {
                self.started = Some(Instant::now());
            }
            return EntrancePose::HIDDEN;
        }

        match self.started {
            Some(start) => pose_at(start.elapsed().as_secs_f32()),
            None => EntrancePose::HIDDEN,
        }
    }
}

/// Opacity ramps linearly; the vertical offset uses an ease-out cubic, close
/// to the site's cubic-bezier(0.22, 1, 0.36, 1).
fn pose_at(elapsed_secs: f32) -> EntrancePose {
    let t = (elapsed_secs / ENTRANCE_SECS).clamp(0.0, 1.0);
    let eased = 1.0 - (1.0 - t).powi(3);

    EntrancePose {
        opacity: t,
        offset_y: -ENTRANCE_RISE * (1.0 - eased),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r##"
        <link rel="stylesheet" href="nav.css">
        <link rel="icon" href="favicon.ico">
        <nav>
          <a href="index.html">Home</a>
          <a href="pages/about.html"><span>About</span> me</a>
          <a href="#top">Top</a>
          <a href="https://example.org/external">Elsewhere</a>
        </nav>
    "##;

    fn roots() -> (Url, Url) {
        let site = Url::parse("https://site.example/").unwrap();
        let preset = site.join(PRESET_DIR).unwrap();
        (site, preset)
    }

    #[test]
    fn relative_anchors_resolve_against_the_site_root() {
        let (site, preset) = roots();
        let fragment = rewrite(FRAGMENT, &site, &preset).unwrap();

        assert_eq!(
            fragment.links,
            vec![
                NavLink {
                    label: "Home".into(),
                    href: "https://site.example/index.html".into(),
                },
                NavLink {
                    label: "About me".into(),
                    href: "https://site.example/pages/about.html".into(),
                },
                NavLink {
                    label: "Top".into(),
                    href: "#top".into(),
                },
                NavLink {
                    label: "Elsewhere".into(),
                    href: "https://example.org/external".into(),
                },
            ]
        );
    }

    #[test]
    fn stylesheets_resolve_against_the_fragment_directory() {
        let (site, preset) = roots();
        let fragment = rewrite(FRAGMENT, &site, &preset).unwrap();

        assert_eq!(
            fragment.stylesheets,
            vec!["https://site.example/assets/preset/nav.css".to_string()]
        );
    }

    #[test]
    fn attribute_handles_both_quote_styles() {
        assert_eq!(attribute(r#"a href="x.html""#, "href"), Some("x.html"));
        assert_eq!(attribute("a href='x.html'", "href"), Some("x.html"));
        assert_eq!(attribute("a class='nav'", "href"), None);
    }

    #[test]
    fn attribute_skips_longer_names_sharing_a_suffix() {
        assert_eq!(
            attribute(r#"a data-href="wrong.html" href="right.html""#, "href"),
            Some("right.html")
        );
        assert_eq!(attribute(r#"a data-href="wrong.html""#, "href"), None);
    }

    #[test]
    fn entrance_starts_hidden_and_settles_at_rest() {
        assert_eq!(pose_at(0.0), EntrancePose::HIDDEN);

        let done = pose_at(ENTRANCE_SECS);
        assert_eq!(done.opacity, 1.0);
        assert_eq!(done.offset_y, 0.0);

        // Over-long elapsed time stays clamped.
        assert_eq!(pose_at(10.0), done);
    }

    #[test]
    fn entrance_is_monotonic() {
        let mut previous = pose_at(0.0);
        for i in 1..=60 {
            let pose = pose_at(i as f32 * 0.01);
            assert!(pose.opacity >= previous.opacity);
            assert!(pose.offset_y >= previous.offset_y);
            previous = pose;
        }
    }

    #[test]
    fn entrance_holds_two_warmup_frames() {
        let mut entrance = Entrance::new();
        assert_eq!(entrance.tick(), EntrancePose::HIDDEN);
        assert_eq!(entrance.tick(), EntrancePose::HIDDEN);

        // Transition armed; from here the pose tracks elapsed time.
        let pose = entrance.tick();
        assert!(pose.opacity >= 0.0);
    }
}
