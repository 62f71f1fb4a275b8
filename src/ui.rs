use crate::calendar::{AggregateCalendarView, CalendarRender};
use crate::day_view::{ArticleList, DayDetailView};
use crate::grid::{GridCell, MonthGrid, WEEKDAY_LABELS};
use crate::permalink::PermalinkMode;
use crate::poem_card::{CardState, ContentCard};
use crate::remote::Remote;
use crate::saved_poem::SavedPoemView;
use chrono::{DateTime, NaiveDateTime, Utc};

const CELL_WIDTH: usize = 7;
/// Shade per bucket, lightest first.
const BUCKET_SHADES: [char; 6] = [' ', '.', ':', '-', '=', '#'];

const CARD_TEMPLATE: &str = "== {{TITLE}} ==
{{SUBTITLE}}
{{BODY}}
[{{REGENERATE}}] {{PERMALINK}}
";

pub fn render_cell(cell: &GridCell) -> String {
    let text = match (cell.in_range, cell.day, cell.count, cell.bucket) {
        (false, ..) | (true, None, ..) => String::new(),
        (true, Some(day), Some(count), bucket) => {
            let shade = bucket
                .and_then(|bucket| BUCKET_SHADES.get(usize::from(bucket).saturating_sub(1)))
                .copied()
                .unwrap_or(' ');
            format!("{day:>2} {count:>3}{shade}")
        }
        (true, Some(day), None, _) => format!("{day:>2}   - "),
    };
    format!("{text:<CELL_WIDTH$}")
}

pub fn render_month(grid: &MonthGrid) -> String {
    let mut out = format!("{}\n", grid.title());
    let header: Vec<String> = WEEKDAY_LABELS
        .iter()
        .map(|label| format!("{label:<CELL_WIDTH$}"))
        .collect();
    out.push_str(header.join("|").trim_end());
    out.push('\n');
    for week in &grid.weeks {
        let row: Vec<String> = week.iter().map(render_cell).collect();
        out.push_str(row.join("|").trim_end());
        out.push('\n');
    }
    out
}

pub fn render_calendar(view: &AggregateCalendarView) -> String {
    match view.render() {
        CalendarRender::Failed(message) => format!("{message}\n"),
        CalendarRender::Months(months) => months
            .iter()
            .map(render_month)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn render_day_view(view: &DayDetailView) -> String {
    let mut out = render_month(&view.month_grid());
    out.push_str(&format!("\nDay View {}\n", view.params().label()));
    match view.article_list() {
        ArticleList::Loading => out.push_str("Loading...\n"),
        ArticleList::Empty => out.push_str("There are no articles for this day.\n"),
        ArticleList::Failed(message) => out.push_str(&format!("{message}\n")),
        ArticleList::Articles(articles) => {
            for article in articles {
                let marker = if view.is_expanded(&article.url) { '-' } else { '+' };
                out.push_str(&format!(
                    "[{marker}] {} {} ({})\n",
                    article.published_time(),
                    article.title,
                    article.url
                ));
                if view.is_expanded(&article.url) {
                    for paragraph in &article.paragraphs {
                        out.push_str(&format!("      {paragraph}\n"));
                    }
                }
            }
        }
    }
    out
}

/// "Generated 3 hours ago." relative to `now`; the raw value if it does not parse.
pub fn generated_label(date_generated: &str, now: DateTime<Utc>) -> String {
    let generated = DateTime::parse_from_rfc3339(date_generated)
        .map(|generated| generated.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(date_generated, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|generated| generated.and_utc())
        });
    let Ok(generated) = generated else {
        return format!("Generated {date_generated}.");
    };

    let elapsed = now.signed_duration_since(generated);
    let (amount, unit) = if elapsed.num_days() > 0 {
        (elapsed.num_days(), "day")
    } else if elapsed.num_hours() > 0 {
        (elapsed.num_hours(), "hour")
    } else if elapsed.num_minutes() > 0 {
        (elapsed.num_minutes(), "minute")
    } else {
        return "Generated just now.".to_string();
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("Generated {amount} {unit}{plural} ago.")
}

pub fn render_card(card: &ContentCard, now: DateTime<Utc>) -> String {
    let subtitle = card
        .state()
        .displayed()
        .map(|poem| generated_label(&poem.date_generated, now))
        .unwrap_or_default();
    let body = match card.state() {
        CardState::Loaded(Some(poem)) | CardState::Loading { previous: Some(poem) } => {
            poem.paragraphs.join("\n")
        }
        CardState::Uninitialized | CardState::Loading { previous: None } => {
            "Loading...".to_string()
        }
        CardState::Loaded(None) => "There are currently no poems available.".to_string(),
        CardState::Failed(message) => message.clone(),
    };
    let regenerate = if card.is_loading() { "New (loading)" } else { "New" };
    let permalink = match card.permalink().mode() {
        PermalinkMode::Save { saving: true, .. } => "[Permalink (saving)]".to_string(),
        PermalinkMode::Save { enabled: true, .. } => "[Permalink]".to_string(),
        PermalinkMode::Save { enabled: false, .. } => "[Permalink (disabled)]".to_string(),
        PermalinkMode::Display { hash, copied } => {
            let ack = if copied { " Copied to clipboard!" } else { "" };
            format!("{hash} [Copy URL]{ack}")
        }
    };

    CARD_TEMPLATE
        .replace("{{TITLE}}", card.title())
        .replace("{{SUBTITLE}}", &subtitle)
        .replace("{{BODY}}", &body)
        .replace("{{REGENERATE}}", regenerate)
        .replace("{{PERMALINK}}", &permalink)
}

pub fn render_saved_poem(view: &SavedPoemView) -> String {
    let body = match view.poem() {
        Remote::Pending => "Loading...".to_string(),
        Remote::Failed(message) => message.clone(),
        Remote::Loaded(poem) => poem.paragraphs.join("\n"),
    };
    format!("Saved poem: {}\n---\n{body}\n", view.hash())
}
