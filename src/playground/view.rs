use std::io::{self, Write, stdout};

use crossterm::{
    cursor::{Hide, MoveTo, SetCursorStyle, Show},
    execute, queue,
    style::{Print, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use unicode_width::UnicodeWidthStr;

use super::app::App;
use crate::render::terminal::{fit_to_width, queue_line};
use crate::theme::Theme;

const GUTTER_WIDTH: u16 = 4;

/// Column split between the source pane, the divider and the output pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub source_width: u16,
    pub output_x: u16,
    pub output_width: u16,
    pub height: u16,
}

impl Split {
    pub fn new(width: u16, height: u16) -> Self {
        let source_width = width / 2;
        let output_x = (source_width + 1).min(width);
        Self {
            source_width,
            output_x,
            output_width: width.saturating_sub(output_x),
            // Last row is the status line
            height: height.saturating_sub(1),
        }
    }

    /// First source line to show so the cursor stays visible
    pub fn source_scroll(&self, cursor_line: usize) -> usize {
        cursor_line.saturating_sub(self.height.saturating_sub(1) as usize)
    }
}

pub struct View {
    pub width: u16,
    pub height: u16,
}

impl View {
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self { width, height })
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn split(&self) -> Split {
        Split::new(self.width, self.height)
    }

    pub fn setup() -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All)
        )?;
        Ok(())
    }

    pub fn teardown() -> io::Result<()> {
        execute!(
            stdout(),
            SetCursorStyle::DefaultUserShape,
            Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn render(&self, app: &App) -> io::Result<()> {
        let mut stdout = stdout();
        let theme = app.pipeline().theme();
        let split = self.split();

        // Hide cursor during redraw to prevent flicker
        queue!(stdout, Hide)?;
        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;

        self.render_source(&mut stdout, app, &split, theme)?;
        self.render_divider(&mut stdout, &split, theme)?;
        self.render_output(&mut stdout, app, &split, theme)?;
        self.render_status_line(&mut stdout, app, theme)?;
        self.position_cursor(&mut stdout, app, &split)?;

        stdout.flush()
    }

    fn render_source(
        &self,
        stdout: &mut impl Write,
        app: &App,
        split: &Split,
        theme: &Theme,
    ) -> io::Result<()> {
        let buffer = &app.buffer;
        let cursor = buffer.cursor();
        let scroll = split.source_scroll(cursor.line);
        let text_width = split.source_width.saturating_sub(GUTTER_WIDTH) as usize;

        for row in 0..split.height {
            let line_idx = row as usize + scroll;
            queue!(stdout, MoveTo(0, row))?;

            if line_idx < buffer.line_count() {
                let number_color = if line_idx == cursor.line {
                    theme.foreground
                } else {
                    theme.muted
                };
                queue!(stdout, SetForegroundColor(number_color.to_crossterm()))?;
                queue!(stdout, Print(format!("{:>3} ", line_idx + 1)))?;

                let content: String = buffer
                    .line(line_idx)
                    .chars()
                    .filter(|c| *c != '\n' && *c != '\r')
                    .collect();
                queue!(stdout, SetForegroundColor(theme.foreground.to_crossterm()))?;
                queue!(stdout, Print(fit_to_width(&content, text_width)))?;
            } else {
                queue!(stdout, SetForegroundColor(theme.muted.to_crossterm()))?;
                queue!(stdout, Print("  ~ "))?;
                queue!(stdout, Print(" ".repeat(text_width)))?;
            }
        }
        Ok(())
    }

    fn render_divider(&self, stdout: &mut impl Write, split: &Split, theme: &Theme) -> io::Result<()> {
        if split.output_x == split.source_width {
            return Ok(());
        }
        queue!(stdout, SetForegroundColor(theme.table_border.to_crossterm()))?;
        for row in 0..split.height {
            queue!(stdout, MoveTo(split.source_width, row), Print("│"))?;
        }
        Ok(())
    }

    fn render_output(
        &self,
        stdout: &mut impl Write,
        app: &App,
        split: &Split,
        theme: &Theme,
    ) -> io::Result<()> {
        let width = split.output_width as usize;
        for row in 0..split.height {
            queue!(stdout, MoveTo(split.output_x, row))?;
            queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
            queue!(stdout, Print(" ".repeat(width)))?;
            queue!(stdout, MoveTo(split.output_x, row))?;

            if let Some(line) = app.output.get(row as usize + app.scroll) {
                let mut line = line.clone();
                line.truncate(width);
                queue_line(stdout, &line, theme)?;
                queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
            }
        }
        Ok(())
    }

    fn render_status_line(&self, stdout: &mut impl Write, app: &App, theme: &Theme) -> io::Result<()> {
        let status_row = self.height.saturating_sub(1);
        queue!(stdout, MoveTo(0, status_row))?;
        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
        queue!(stdout, Clear(ClearType::CurrentLine))?;

        // Message - show prominently
        if let Some(ref msg) = app.message {
            queue!(stdout, SetForegroundColor(theme.heading.to_crossterm()))?;
            queue!(stdout, Print(msg))?;
            return Ok(());
        }

        let filename = app
            .buffer
            .path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "[No Name]".to_string());
        let cursor = app.buffer.cursor();
        let left = format!(" {} | {} | {} ", app.language, app.view.name(), filename);
        let right = format!(" {}:{} ", cursor.line + 1, cursor.col + 1);
        let padding = (self.width as usize).saturating_sub(left.width() + right.width());

        let status = format!("{}{}{}", left, " ".repeat(padding), right);
        let status = fit_to_width(&status, self.width as usize);

        queue!(stdout, SetForegroundColor(theme.muted.to_crossterm()))?;
        queue!(stdout, Print(status))?;
        Ok(())
    }

    fn position_cursor(&self, stdout: &mut impl Write, app: &App, split: &Split) -> io::Result<()> {
        let cursor = app.buffer.cursor();
        let row = cursor.line - split.source_scroll(cursor.line);
        let before: String = app.buffer.line(cursor.line).chars().take(cursor.col).collect();
        let col = (GUTTER_WIDTH as usize + before.width()).min(split.source_width.saturating_sub(1) as usize);
        queue!(stdout, MoveTo(col as u16, row as u16))?;
        queue!(stdout, SetCursorStyle::BlinkingBar)?;
        queue!(stdout, Show)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_halves_width_and_reserves_status() {
        let split = Split::new(80, 24);
        assert_eq!(split.source_width, 40);
        assert_eq!(split.output_x, 41);
        assert_eq!(split.output_width, 39);
        assert_eq!(split.height, 23);
    }

    #[test]
    fn tiny_terminal_does_not_underflow() {
        let split = Split::new(1, 0);
        assert_eq!(split.source_width, 0);
        assert_eq!(split.output_x, 1);
        assert_eq!(split.output_width, 0);
        assert_eq!(split.height, 0);
    }

    #[test]
    fn source_scroll_follows_cursor() {
        let split = Split::new(80, 11);
        assert_eq!(split.source_scroll(3), 0);
        assert_eq!(split.source_scroll(9), 0);
        assert_eq!(split.source_scroll(10), 1);
        assert_eq!(split.source_scroll(25), 16);
    }
}
