use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

use super::billing::BillingTotals;
use super::{ReportKind, ReportRecord};

const WIDTH: u32 = 1200;
const PADDING: u32 = 30;
const HEADER_HEIGHT: u32 = 120;
const ROW_HEIGHT: u32 = 110;
const MIN_HEIGHT: u32 = 580;

const BACKGROUND: &str = "#222222";
const PANE: &str = "#fcfeff";
const NAME_COLOUR: &str = "#22A";
const DETAIL_COLOUR: &str = "#131";
const ALERT_COLOUR: &str = "#E00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub file_name: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write image markup: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Turns a computed report into an image for the destination card.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, record: &ReportRecord, today: NaiveDate) -> Result<RenderedImage, RenderError>;
}

/// Colour band for a vacancy's start date relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StartBand {
    NoStartDate,
    Passed,
    Today,
    WithinWeek,
    WithinTwoWeeks,
    WithinFourWeeks,
    WithinEightWeeks,
    WithinTwelveWeeks,
    WithinSixteenWeeks,
    Later,
}

impl StartBand {
    pub fn classify(start: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(start) = start else {
            return Self::NoStartDate;
        };
        let days = (start - today).num_days();
        match days {
            d if d < 0 => Self::Passed,
            0 => Self::Today,
            1..=7 => Self::WithinWeek,
            8..=14 => Self::WithinTwoWeeks,
            15..=28 => Self::WithinFourWeeks,
            29..=56 => Self::WithinEightWeeks,
            57..=84 => Self::WithinTwelveWeeks,
            85..=112 => Self::WithinSixteenWeeks,
            _ => Self::Later,
        }
    }

    pub const fn colour(self) -> &'static str {
        match self {
            Self::NoStartDate => "#ae017e",
            Self::Passed => "#bd0026",
            Self::Today | Self::WithinWeek => "#990000",
            Self::WithinTwoWeeks => "#d7301f",
            Self::WithinFourWeeks => "#ef6548",
            Self::WithinEightWeeks => "#41ae76",
            Self::WithinTwelveWeeks => "#238b45",
            Self::WithinSixteenWeeks => "#31a354",
            Self::Later => "#005824",
        }
    }
}

fn describe_start(start: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(start) = start else {
        return "No start date".to_string();
    };
    let days = (start - today).num_days();
    match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        d if d > 0 => format!("in {d} days"),
        d => format!("{} days ago", -d),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

struct TextLine {
    text: String,
    x: u32,
    colour: &'static str,
    size: u32,
    /// Drawn on the row's second baseline.
    lower: bool,
}

struct Row {
    lines: Vec<TextLine>,
}

impl Row {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    fn push(mut self, text: String, x: u32, colour: &'static str, size: u32, lower: bool) -> Self {
        self.lines.push(TextLine {
            text,
            x,
            colour,
            size,
            lower,
        });
        self
    }

    fn text(self, text: impl Into<String>, x: u32, colour: &'static str, size: u32) -> Self {
        self.push(text.into(), x, colour, size, false)
    }

    fn detail(self, text: impl Into<String>, x: u32, colour: &'static str, size: u32) -> Self {
        self.push(text.into(), x, colour, size, true)
    }
}

fn billing_rows(totals: &BillingTotals) -> Vec<Row> {
    let on = &totals.on_project;
    let off = &totals.off_project;
    let vacancies = &totals.vacancies;
    let stat = |label: &str, value: usize, indent: u32, colour: &'static str, size: u32| {
        Row::new()
            .text(format!("{label}:"), indent, colour, size)
            .text(value.to_string(), 900, colour, size)
    };

    vec![
        stat("On Project", on.placed, 10, "#2A2", 40),
        stat("Billable", on.billable, 200, NAME_COLOUR, 28),
        stat("Non Billable", on.non_billable, 200, NAME_COLOUR, 28),
        stat("Pending Start", on.pending_start, 200, NAME_COLOUR, 28),
        stat("Contractors", on.contractors, 200, NAME_COLOUR, 28),
        stat("Permanent", on.permanent, 200, NAME_COLOUR, 28),
        stat("Off Project", off.total, 10, ALERT_COLOUR, 40),
        stat("Lab/GCE", off.lab.gce, 200, NAME_COLOUR, 28),
        stat("Lab/Non Academy", off.lab.non_academy, 200, NAME_COLOUR, 28),
        stat("Define", off.define, 200, "#F96", 28),
        stat("Vacancies", vacancies.total, 10, "#000", 40),
        stat("New Business", vacancies.new_business.total, 200, NAME_COLOUR, 32),
        stat("Filled", vacancies.new_business.filled.total, 350, NAME_COLOUR, 28),
        stat("Unfilled", vacancies.new_business.unfilled, 350, "#F96", 28),
        stat("Backfill", vacancies.backfill.total, 200, NAME_COLOUR, 32),
        stat("Filled", vacancies.backfill.filled.total, 350, NAME_COLOUR, 28),
        stat("Unfilled", vacancies.backfill.unfilled, 350, "#F96", 28),
    ]
}

fn rows(record: &ReportRecord, today: NaiveDate) -> Vec<Row> {
    match record {
        ReportRecord::Billing(report) => billing_rows(&report.totals),
        ReportRecord::Vacancies(entries) => entries
            .iter()
            .map(|entry| {
                let band = StartBand::classify(entry.start_date, today);
                let mut row = Row::new()
                    .text(format!("{}:", entry.client), 10, NAME_COLOUR, 40)
                    .text(entry.name.clone(), 500, DETAIL_COLOUR, 40)
                    .detail(describe_start(entry.start_date, today), 900, band.colour(), 28);
                if let Some(filled_by) = &entry.filled_by {
                    row = row.detail(format!("filled by {filled_by}"), 500, "#555", 22);
                }
                row
            })
            .collect(),
        ReportRecord::Starters(entries) => entries
            .iter()
            .map(|entry| {
                Row::new()
                    .text(format!("{}:", entry.name), 10, NAME_COLOUR, 40)
                    .text(entry.to.clone(), 600, DETAIL_COLOUR, 40)
                    .detail(describe_start(Some(entry.date), today), 100, "#191", 28)
            })
            .collect(),
        ReportRecord::Candidates(entries) => entries
            .iter()
            .map(|entry| {
                Row::new()
                    .text(
                        format!(
                            "{}({}) @ {}",
                            entry.name, entry.move_score, entry.current_client
                        ),
                        10,
                        NAME_COLOUR,
                        32,
                    )
                    .detail(entry.reasons.clone(), 100, ALERT_COLOUR, 24)
            })
            .collect(),
        ReportRecord::Moves(entries) => entries
            .iter()
            .map(|entry| {
                Row::new()
                    .text(format!("{}:", entry.name), 10, NAME_COLOUR, 40)
                    .detail(format!("{} --> {}", entry.from, entry.to), 200, "#A2A", 28)
            })
            .collect(),
    }
}

/// Draws reports as standalone SVG documents.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer;

impl SvgRenderer {
    pub fn new() -> Self {
        Self
    }

    fn draw(kind: ReportKind, rows: &[Row]) -> Result<String, RenderError> {
        let row_count = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        let height = HEADER_HEIGHT
            .saturating_add(row_count.saturating_mul(ROW_HEIGHT))
            .saturating_add(PADDING * 2)
            .max(MIN_HEIGHT);

        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}" viewBox="0 0 {WIDTH} {height}">"#
        )?;
        writeln!(
            svg,
            r#"<rect x="0" y="0" width="{WIDTH}" height="{height}" fill="{BACKGROUND}"/>"#
        )?;
        writeln!(
            svg,
            r#"<rect x="{PADDING}" y="{PADDING}" width="{}" height="{}" fill="{PANE}"/>"#,
            WIDTH - PADDING * 2,
            height - PADDING * 2
        )?;
        writeln!(
            svg,
            r##"<text x="{}" y="{}" fill="#000" font-family="Barlow, sans-serif" font-size="56">{}</text>"##,
            PADDING + 10,
            PADDING + 80,
            escape(kind.heading())
        )?;

        for (index, row) in (0u32..).zip(rows) {
            let top = PADDING + HEADER_HEIGHT + index.saturating_mul(ROW_HEIGHT);
            for line in &row.lines {
                let baseline = if line.lower { top + 90 } else { top + 45 };
                writeln!(
                    svg,
                    r#"<text x="{}" y="{baseline}" fill="{}" font-family="Barlow, sans-serif" font-size="{}">{}</text>"#,
                    PADDING + line.x,
                    line.colour,
                    line.size,
                    escape(&line.text)
                )?;
            }
        }
        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

impl ReportRenderer for SvgRenderer {
    fn render(&self, record: &ReportRecord, today: NaiveDate) -> Result<RenderedImage, RenderError> {
        let kind = record.kind();
        let svg = Self::draw(kind, &rows(record, today))?;
        Ok(RenderedImage {
            file_name: format!("generated-report-{}.svg", kind.storage_key()),
            content_type: mime::IMAGE_SVG,
            bytes: svg.into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::board::VacancyType;
    use crate::workflows::reports::{BillingReport, CandidateEntry, VacancyEntry};
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).expect("valid date")
    }

    #[test]
    fn start_bands_follow_day_thresholds() {
        let band = |days: i64| StartBand::classify(Some(today() + Duration::days(days)), today());
        assert_eq!(StartBand::classify(None, today()), StartBand::NoStartDate);
        assert_eq!(band(-1), StartBand::Passed);
        assert_eq!(band(0), StartBand::Today);
        assert_eq!(band(7), StartBand::WithinWeek);
        assert_eq!(band(8), StartBand::WithinTwoWeeks);
        assert_eq!(band(28), StartBand::WithinFourWeeks);
        assert_eq!(band(56), StartBand::WithinEightWeeks);
        assert_eq!(band(84), StartBand::WithinTwelveWeeks);
        assert_eq!(band(112), StartBand::WithinSixteenWeeks);
        assert_eq!(band(113), StartBand::Later);
        assert_eq!(StartBand::NoStartDate.colour(), "#ae017e");
    }

    #[test]
    fn vacancy_rows_are_coloured_by_band() {
        let record = ReportRecord::Vacancies(vec![VacancyEntry {
            name: "Senior <Rust> engineer".to_string(),
            client: "Acme".to_string(),
            start_date: Some(today() + Duration::days(10)),
            vacancy_type: VacancyType::NewBusiness,
            filled_by: None,
        }]);

        let image = SvgRenderer::new().render(&record, today()).expect("renders");
        let svg = String::from_utf8(image.bytes).expect("utf8 svg");
        assert_eq!(image.content_type, mime::IMAGE_SVG);
        assert_eq!(image.file_name, "generated-report-vacancyReport.svg");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Vacancies coming up"));
        assert!(svg.contains("Senior &lt;Rust&gt; engineer"));
        assert!(svg.contains("in 10 days"));
        assert!(svg.contains(StartBand::WithinTwoWeeks.colour()));
    }

    #[test]
    fn billing_image_shows_totals() {
        let record = ReportRecord::Billing(BillingReport::default());
        let image = SvgRenderer::new().render(&record, today()).expect("renders");
        let svg = String::from_utf8(image.bytes).expect("utf8 svg");
        assert!(svg.contains("On Project:"));
        assert!(svg.contains("Lab/Non Academy:"));
    }

    #[test]
    fn long_reports_grow_the_canvas() {
        let entries = (0..10)
            .map(|index| CandidateEntry {
                name: format!("Person {index}"),
                current_client: "Acme".to_string(),
                reasons: "is a new joiner".to_string(),
                move_score: 100,
            })
            .collect();
        let image = SvgRenderer::new()
            .render(&ReportRecord::Candidates(entries), today())
            .expect("renders");
        let svg = String::from_utf8(image.bytes).expect("utf8 svg");
        let expected = HEADER_HEIGHT + 10 * ROW_HEIGHT + PADDING * 2;
        assert!(svg.contains(&format!("height=\"{expected}\"")));
    }
}
