use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use devconsole::channels::validate_channel_name;
use devconsole::transport::SocketClusterTransport;
use devconsole::{ChannelViewer, ChannelViewerBuilder, Config, LogEntry};
use eyre::Result;
use log::info;
use ratatui::{
    style::Stylize,
    symbols::border,
    text::Line,
    widgets::{Block, TableState},
    DefaultTerminal, Frame,
};

use super::state::Focus;
use super::views::bottom_bar::controls_line;
use super::views::inspect::render_inspect_popup;
use super::views::log::{render_log_panel, render_log_placeholder};
use super::widgets::formatters::state_span;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Channel to watch, e.g. `company.<id>` or `api.<credential id>`
    pub channel: String,

    /// Keep at most this many entries, oldest dropped first
    #[arg(long)]
    pub log_limit: Option<usize>,

    /// Seconds to wait for the subscription to be acknowledged, 0 waits forever
    #[arg(long)]
    pub subscribe_timeout: Option<u64>,

    /// Write logs to this file while the screen is open
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub(crate) struct App {
    viewer: ChannelViewer<SocketClusterTransport>,
    exit: bool,
    focus: Focus,
    table_state: TableState,
    /// Keep the newest entry selected as entries arrive.
    follow: bool,
    paused: bool,
    inspected: Option<(usize, LogEntry)>,
    last_render_duration: Duration,
}

impl WatchArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let channel = validate_channel_name(&self.channel)?;

        let subscribe_timeout = match self.subscribe_timeout {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => config.subscribe_timeout,
        };

        let transport = SocketClusterTransport::new(config.socket_url.clone())
            .auth_token(config.token.clone());
        let viewer = ChannelViewerBuilder::new()
            .log_limit(self.log_limit.or(config.log_limit))
            .subscribe_timeout(subscribe_timeout)
            .open(transport, channel);

        let mut app = App {
            viewer,
            exit: false,
            focus: Focus::Log,
            table_state: TableState::default(),
            follow: true,
            paused: false,
            inspected: None,
            last_render_duration: Duration::from_millis(0),
        };

        let mut terminal = ratatui::init();
        let app_result = app.run(&mut terminal);
        ratatui::restore();

        app.viewer.close();
        info!("Stopped watching '{}'", channel);

        app_result.map_err(|e| eyre::eyre!("TUI error: {}", e))
    }
}

impl App {
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        while !self.exit {
            if self.paused {
                self.viewer.check_subscribe_timeout();
            } else {
                self.refresh();
            }

            let render_start = Instant::now();
            terminal.draw(|frame| self.draw(frame))?;
            self.last_render_duration = render_start.elapsed();

            self.handle_events()?;
        }
        Ok(())
    }

    /// Pulls pending transport events into the log. While paused they stay queued.
    fn refresh(&mut self) {
        self.viewer.poll();

        let len = self.viewer.log().len();
        if len == 0 {
            self.table_state.select(None);
        } else if self.follow {
            self.table_state.select(Some(len - 1));
        } else if let Some(selected) = self.table_state.selected() {
            if selected >= len {
                self.table_state.select(Some(len - 1));
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.render_ui(frame);
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    self.handle_key_event(key_event);
                }
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.exit(),
            KeyCode::Char('p') | KeyCode::Char('P') => self.toggle_pause(),
            KeyCode::Char('i') | KeyCode::Char('I') => self.toggle_inspect(),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') => self.close_inspect(),
            KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::End => self.follow_latest(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            _ => {}
        }
    }

    fn select_previous(&mut self) {
        let len = self.viewer.log().len();
        if len > 0 {
            let i = match self.table_state.selected() {
                Some(i) => i.saturating_sub(1),
                None => len - 1,
            };
            self.follow = false;
            self.select(i);
        }
    }

    fn select_next(&mut self) {
        let len = self.viewer.log().len();
        if len > 0 {
            let i = match self.table_state.selected() {
                Some(i) => (i + 1).min(len - 1),
                None => len - 1,
            };
            // Moving onto the newest entry resumes following.
            self.follow = i == len - 1;
            self.select(i);
        }
    }

    fn select(&mut self, i: usize) {
        self.table_state.select(Some(i));

        // Update the inspected entry if the popup is open
        if self.focus == Focus::Inspect {
            if let Some(entry) = self.viewer.log().get(i) {
                self.inspected = Some((i, entry.clone()));
            }
        }
    }

    fn follow_latest(&mut self) {
        self.follow = true;
        let len = self.viewer.log().len();
        if len > 0 {
            self.select(len - 1);
        }
    }

    fn toggle_inspect(&mut self) {
        if self.focus == Focus::Inspect {
            self.close_inspect();
        } else if let Some(selected) = self.table_state.selected() {
            if let Some(entry) = self.viewer.log().get(selected) {
                self.inspected = Some((selected, entry.clone()));
                self.focus = Focus::Inspect;
            }
        }
    }

    fn close_inspect(&mut self) {
        self.inspected = None;
        self.focus = Focus::Log;
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    fn exit(&mut self) {
        self.exit = true;
    }
}

impl App {
    fn render_ui(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let title = Line::from(" Socket Console ".bold());

        let status = if self.paused {
            Some("⏸ PAUSED ".to_string())
        } else if !self.follow {
            Some("⏹ NOT FOLLOWING ".to_string())
        } else {
            None
        };
        let bottom_line = controls_line(self.focus, status);

        #[cfg(feature = "dev")]
        let block = {
            let render_time_ms = self.last_render_duration.as_millis();
            let render_time_text = if render_time_ms < 10 {
                format!("  {}ms ", render_time_ms)
            } else {
                format!(" {}ms ", render_time_ms)
            };

            Block::bordered()
                .title(title.centered())
                .title_bottom(bottom_line.centered())
                .title_bottom(Line::from(render_time_text).cyan().right_aligned())
                .border_set(border::THICK)
        };

        #[cfg(not(feature = "dev"))]
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(bottom_line.centered())
            .border_set(border::THICK);

        let inner_area = block.inner(area);
        frame.render_widget(block, area);

        let log = self.viewer.log();
        let panel_title = Line::from(vec![
            format!(" {} ", self.viewer.channel_name()).bold(),
            state_span(self.viewer.state()),
            format!("{} entries ", log.len()).into(),
        ]);

        if log.is_empty() {
            let message = if self.paused {
                "(refresh paused)"
            } else {
                "(waiting for events)"
            };
            render_log_placeholder(panel_title, message, inner_area, frame);
        } else {
            render_log_panel(
                log,
                panel_title,
                inner_area,
                frame,
                &mut self.table_state,
                self.focus == Focus::Log,
            );
        }

        if self.focus == Focus::Inspect {
            if let Some((index, entry)) = &self.inspected {
                render_inspect_popup(entry, *index, area, frame);
            }
        }
    }
}
