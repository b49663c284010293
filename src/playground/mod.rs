//! Interactive playground: edit source on the left, watch its tree or
//! rendered Markdown update on the right.

mod app;
mod buffer;
mod debounce;
mod input;
mod view;

use std::io;
use std::time::Instant;

use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use tracing::info;

pub use app::{App, ViewMode};
pub use buffer::{Buffer, Cursor};
pub use debounce::{Debouncer, TimerHandle, Timers};
pub use view::{Split, View};

/// Run the playground until the user quits
pub async fn run(mut app: App) -> io::Result<()> {
    View::setup()?;
    let result = event_loop(&mut app).await;
    // Always restore the terminal, even if the loop failed
    View::teardown()?;
    result
}

async fn event_loop(app: &mut App) -> io::Result<()> {
    let mut view = View::new()?;
    app.set_output_width(view.split().output_width as usize);
    app.refresh();
    view.render(app)?;

    // Event stream for async key reading
    let mut event_stream = EventStream::new();

    while app.running {
        let deadline = app.deadline();
        tokio::select! {
            event = event_stream.next() => {
                match event {
                    Some(Ok(event)) => {
                        if let Event::Resize(width, height) = event {
                            view.resize(width, height);
                            app.set_output_width(view.split().output_width as usize);
                        }
                        input::handle_event(app, event, Instant::now());
                    }
                    Some(Err(err)) => return Err(err),
                    None => break,
                }
            }
            _ = sleep_until(deadline), if deadline.is_some() => {
                app.tick(Instant::now());
            }
        }
        view.render(app)?;
    }

    info!(target: "playground", "playground closed");
    Ok(())
}

async fn sleep_until(deadline: Option<Instant>) {
    if let Some(deadline) = deadline {
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
    }
}
