use chrono::{Local, Utc};
use rabbit_view::calendar::AggregateCalendarView;
use rabbit_view::day_view::DayDetailView;
use rabbit_view::models::PoemScope;
use rabbit_view::poem_card::ContentCard;
use rabbit_view::saved_poem::SavedPoemView;
use rabbit_view::{ui, ClientConfig, HttpApi, Route, Session};
use std::{env, sync::Arc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    let path = env::args().nth(1).unwrap_or_else(|| "/".to_string());
    let route = Route::parse(&path, Local::now().date_naive())?;
    let api = Arc::new(HttpApi::new(config.api_base.clone(), config.request_timeout)?);

    info!(%path, api = %config.api_base, "rendering view");
    let output = tokio::select! {
        output = render(route, &config, Session::new(api)) => output,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            return Ok(());
        }
    };
    print!("{output}");
    Ok(())
}

async fn render(route: Route, config: &ClientConfig, mut session: Session<HttpApi>) -> String {
    match route {
        Route::Poems => {
            let mut out = String::new();
            for scope in PoemScope::ALL {
                let mut card = ContentCard::new(scope, config.origin.clone());
                session.drive(&mut card).await;
                out.push_str(&ui::render_card(&card, Utc::now()));
                out.push('\n');
            }
            out
        }
        Route::Calendar { year } => {
            let mut view = AggregateCalendarView::new(year);
            session.drive(&mut view).await;
            ui::render_calendar(&view)
        }
        Route::Day(params) => {
            let mut view = DayDetailView::new(params, config.calendar_year);
            session.drive(&mut view).await;
            ui::render_day_view(&view)
        }
        Route::SavedPoem { hash } => {
            let mut view = SavedPoemView::new(&hash);
            session.drive(&mut view).await;
            ui::render_saved_poem(&view)
        }
    }
}
