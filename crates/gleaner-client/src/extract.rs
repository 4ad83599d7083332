//! Selector-based extraction of records from fetched HTML.
//!
//! Two capture modes share one extractor: `parsed` pulls question, answers
//! and explanation through CSS selectors, `raw` keeps the page verbatim.
//! Table and image extraction run on top of either mode when their
//! selectors are configured.

use std::collections::HashSet;

use gleaner_core::config::{CaptureMode, ScraperConfig, SelectorList};
use gleaner_core::error::AppError;
use gleaner_core::models::{FetchedPage, Record, fields};
use gleaner_core::traits::Extractor;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never counts as visible page text.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Clone)]
struct ParsedSelectors {
    question: String,
    answer: String,
    explanation: String,
}

/// [`Extractor`] backed by the `scraper` HTML parser.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    mode: CaptureMode,
    parsed: Option<ParsedSelectors>,
    raw_include_text: bool,
    table_selectors: Vec<String>,
    image_selectors: Vec<String>,
}

impl HtmlExtractor {
    /// Build an extractor for `mode`.
    ///
    /// Parsed mode needs all three field selectors; a missing one is a
    /// `ConfigError` so the run fails before any request is made.
    pub fn new(mode: CaptureMode, config: &ScraperConfig) -> Result<Self, AppError> {
        let parsed = match mode {
            CaptureMode::Parsed => Some(ParsedSelectors {
                question: ScraperConfig::require(
                    "question_selector",
                    config.question_selector.as_deref(),
                )?
                .to_string(),
                answer: ScraperConfig::require(
                    "answer_selector",
                    config.answer_selector.as_deref(),
                )?
                .to_string(),
                explanation: ScraperConfig::require(
                    "explanation_selector",
                    config.explanation_selector.as_deref(),
                )?
                .to_string(),
            }),
            CaptureMode::Raw => None,
        };

        let owned = |list: &Option<SelectorList>| -> Vec<String> {
            list.as_ref()
                .map(|l| l.selectors().into_iter().map(str::to_string).collect())
                .unwrap_or_default()
        };

        Ok(Self {
            mode,
            parsed,
            raw_include_text: config.raw_include_text,
            table_selectors: owned(&config.table_selectors),
            image_selectors: owned(&config.image_selectors),
        })
    }

    fn extract_parsed(
        &self,
        selectors: &ParsedSelectors,
        document: &Html,
        page: &FetchedPage,
    ) -> Result<Record, AppError> {
        let question_sel = parse_selector(&selectors.question)?;
        let answer_sel = parse_selector(&selectors.answer)?;
        let explanation_sel = parse_selector(&selectors.explanation)?;

        let question = document.select(&question_sel).next().ok_or_else(|| {
            AppError::ScrapeError(format!(
                "Question selector '{}' did not match any elements.",
                selectors.question
            ))
        })?;

        let answers: Vec<String> = document.select(&answer_sel).map(element_text).collect();
        if answers.is_empty() {
            return Err(AppError::ScrapeError(format!(
                "Answer selector '{}' did not match any elements.",
                selectors.answer
            )));
        }

        let explanation = document.select(&explanation_sel).next().ok_or_else(|| {
            AppError::ScrapeError(format!(
                "Explanation selector '{}' did not match any elements.",
                selectors.explanation
            ))
        })?;

        let mut record = Record::new(&page.url);
        record.insert(fields::QUESTION, element_text(question));
        record.insert(fields::ANSWERS, answers);
        record.insert(fields::EXPLANATION, element_text(explanation));
        Ok(record)
    }

    fn extract_raw(&self, document: &Html, page: &FetchedPage) -> Record {
        let mut record = Record::new(&page.url);
        record.insert(fields::STATUS_CODE, page.status_code);
        record.insert(fields::RETRIEVED_AT, page.retrieved_at_iso());
        record.insert(fields::RAW_HTML, page.body.clone());
        if self.raw_include_text {
            record.insert(fields::RAW_TEXT, visible_text(document));
        }
        record
    }

    fn extract_tables(&self, document: &Html) -> Result<Vec<Vec<Vec<String>>>, AppError> {
        let row_sel = parse_selector("tr")?;
        let cell_sel = parse_selector("th, td")?;

        let mut tables = Vec::new();
        for raw in &self.table_selectors {
            let selector = parse_selector(raw)?;
            for table in document.select(&selector) {
                let rows: Vec<Vec<String>> = table
                    .select(&row_sel)
                    .map(|row| row.select(&cell_sel).map(element_text).collect::<Vec<_>>())
                    .filter(|cells| cells.iter().any(|c| !c.is_empty()))
                    .collect();
                if !rows.is_empty() {
                    tables.push(rows);
                }
            }
        }
        Ok(tables)
    }

    fn extract_images(&self, document: &Html, page_url: &str) -> Result<Vec<String>, AppError> {
        let base = Url::parse(page_url).ok();
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for raw in &self.image_selectors {
            let selector = parse_selector(raw)?;
            for element in document.select(&selector) {
                let Some(src) = element.value().attr("src").filter(|s| !s.is_empty()) else {
                    continue;
                };
                let absolute = base
                    .as_ref()
                    .and_then(|b| b.join(src).ok())
                    .map(String::from)
                    .unwrap_or_else(|| src.to_string());
                if seen.insert(absolute.clone()) {
                    images.push(absolute);
                }
            }
        }
        Ok(images)
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, page: &FetchedPage) -> Result<Record, AppError> {
        let document = Html::parse_document(&page.body);

        let mut record = match (&self.mode, &self.parsed) {
            (CaptureMode::Parsed, Some(selectors)) => {
                self.extract_parsed(selectors, &document, page)?
            }
            _ => self.extract_raw(&document, page),
        };

        if !self.table_selectors.is_empty() {
            record.insert(fields::TABLES, self.extract_tables(&document)?);
        }
        if !self.image_selectors.is_empty() {
            record.insert(fields::IMAGES, self.extract_images(&document, &page.url)?);
        }

        tracing::debug!(
            url = %page.url,
            mode = %self.mode,
            fields = record.len(),
            "Extracted record"
        );
        Ok(record)
    }
}

fn parse_selector(raw: &str) -> Result<Selector, AppError> {
    Selector::parse(raw).map_err(|e| AppError::SelectorError {
        selector: raw.to_string(),
        message: e.to_string(),
    })
}

/// Concatenated descendant text of `element`, trimmed.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Every non-blank text node outside hidden elements, trimmed, one per line.
fn visible_text(document: &Html) -> String {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
            });
            let trimmed = text.trim();
            (!hidden && !trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
