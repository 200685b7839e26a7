use anyhow::Result;
use serde::Serialize;
use wikipath_search::SearchOutcome;
use wikipath_text::page_slug;

/// Address of a page on the given Wikipedia language edition, without scheme.
pub fn page_url(language: &str, name: &str) -> String {
    format!("{language}.wikipedia.org/wiki/{}", page_slug(name))
}

/// Human-readable route table, one numbered line per page.
pub fn render_route(route: &[String], language: &str) -> String {
    let mut out = String::from("Route:\n");
    for (index, name) in route.iter().enumerate() {
        out.push_str(&format!(
            "{:.<3} {:.<50} {}\n",
            index + 1,
            name,
            page_url(language, name)
        ));
    }
    out
}

#[derive(Debug, Serialize)]
pub struct RouteReport {
    pub route: Vec<RouteStep>,
    pub hops: usize,
    pub pages_fetched: usize,
}

#[derive(Debug, Serialize)]
pub struct RouteStep {
    pub index: usize,
    pub name: String,
    pub url: String,
}

impl RouteReport {
    pub fn new(outcome: &SearchOutcome, language: &str) -> Self {
        let route = outcome
            .route
            .iter()
            .enumerate()
            .map(|(i, name)| RouteStep {
                index: i + 1,
                name: name.clone(),
                url: page_url(language, name),
            })
            .collect();
        Self {
            route,
            hops: outcome.hops,
            pages_fetched: outcome.pages_fetched,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
